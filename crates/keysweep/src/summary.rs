//! Result presentation: a delimited block of log lines, one per shard, plus
//! a grand total.

use keysweep_engine::EngineReport;
use tracing::{info, warn};

/// Which operation produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Count,
    Clear,
}

impl Operation {
    fn verb(self) -> &'static str {
        match self {
            Operation::Count => "matched",
            Operation::Clear => "deleted",
        }
    }
}

/// Render a report as summary lines, shards in identity order, total last.
pub fn summary_lines(operation: Operation, report: &EngineReport) -> Vec<String> {
    let verb = operation.verb();
    let mut lines: Vec<String> = report
        .iter()
        .map(|(shard, outcome)| format!("{shard}: {} keys {verb}", outcome.count))
        .collect();
    lines.push(format!(
        "total: {} keys {verb} on {} shard(s)",
        report.total(),
        report.len()
    ));
    lines
}

/// Emit the summary block, warning about every shard that did not complete.
pub fn log_summary(operation: Operation, report: &EngineReport) {
    info!("---------- begin summary ----------");
    for line in summary_lines(operation, report) {
        info!("{line}");
    }
    for (shard, outcome) in report.degraded() {
        warn!(
            %shard,
            status = %outcome.status,
            matched = outcome.matched,
            "shard result is incomplete"
        );
    }
    info!("----------- end summary -----------");
}
