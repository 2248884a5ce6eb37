//! Glob-style key matching with the store's `MATCH` semantics.
//!
//! Supported syntax:
//!
//! - `*` matches any run of bytes, including none.
//! - `?` matches exactly one byte.
//! - `[abc]`, `[a-z]`, `[^a]` match one byte from (or outside) a class.
//! - `\x` matches `x` literally.
//!
//! An unterminated class runs to the end of the pattern. Keys are matched as
//! raw bytes.

/// Whether `key` matches the glob `pattern`.
///
/// Runs in `O(pattern * key)` time: on a mismatch only the most recent `*`
/// is retried, one key byte further along.
pub fn glob_match(pattern: &[u8], key: &[u8]) -> bool {
    let mut pi = 0;
    let mut ki = 0;
    // Pattern index just past the last `*`, and the key index it resumes at.
    let mut backtrack: Option<(usize, usize)> = None;

    while ki < key.len() {
        if pi < pattern.len() && pattern[pi] == b'*' {
            while pi < pattern.len() && pattern[pi] == b'*' {
                pi += 1;
            }
            if pi == pattern.len() {
                return true;
            }
            backtrack = Some((pi, ki));
            continue;
        }

        if pi < pattern.len()
            && let Some(next) = match_one(pattern, pi, key[ki])
        {
            pi = next;
            ki += 1;
            continue;
        }

        match backtrack {
            Some((star_pi, star_ki)) => {
                pi = star_pi;
                ki = star_ki + 1;
                backtrack = Some((star_pi, ki));
            }
            None => return false,
        }
    }

    pattern[pi..].iter().all(|&b| b == b'*')
}

/// Match one key byte against the single-byte element at `pi` (anything but
/// `*`). Returns the pattern index after the element on success.
fn match_one(pattern: &[u8], pi: usize, c: u8) -> Option<usize> {
    match pattern[pi] {
        b'?' => Some(pi + 1),
        b'[' => {
            let (matched, next) = match_class(pattern, pi + 1, c);
            matched.then_some(next)
        }
        b'\\' if pi + 1 < pattern.len() => (pattern[pi + 1] == c).then_some(pi + 2),
        literal => (literal == c).then_some(pi + 1),
    }
}

/// Match one byte against the class starting at `start` (just past `[`).
///
/// Returns whether it matched and the pattern index just past the class.
fn match_class(p: &[u8], start: usize, c: u8) -> (bool, usize) {
    let mut i = start;
    let negate = i < p.len() && p[i] == b'^';
    if negate {
        i += 1;
    }

    let mut matched = false;
    while i < p.len() && p[i] != b']' {
        if p[i] == b'\\' && i + 1 < p.len() {
            i += 1;
            matched |= p[i] == c;
            i += 1;
        } else if i + 2 < p.len() && p[i + 1] == b'-' && p[i + 2] != b']' {
            let (lo, hi) = if p[i] <= p[i + 2] {
                (p[i], p[i + 2])
            } else {
                (p[i + 2], p[i])
            };
            matched |= (lo..=hi).contains(&c);
            i += 3;
        } else {
            matched |= p[i] == c;
            i += 1;
        }
    }

    // Skip the closing bracket when present.
    let next = if i < p.len() { i + 1 } else { i };
    (matched != negate, next)
}
