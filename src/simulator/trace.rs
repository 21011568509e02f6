use std::fmt;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const RULE: &str = "---------------------------------------------------------------------------------------------------------------------------------------------------------------";

/// One executed movement, as it appears in the run log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceLine {
    pub at_nanos: i64,
    pub identifier: String,
    pub kind: String,
    pub from: String,
    pub to: String,
    pub notes: Vec<String>,
}

/// A movement that was scheduled past the halt time and never executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoredEvent {
    pub at_nanos: i64,
    pub kind: String,
}

/// The line-oriented record of one run: every executed movement in order,
/// plus the tail of ignored events.
///
/// Two runs of the same scenario with the same seed and a deterministic
/// plugin produce equal traces, line for line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    lines: Vec<TraceLine>,
    ignored: Vec<IgnoredEvent>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, line: TraceLine) {
        self.lines.push(line);
    }

    pub(crate) fn record_ignored(&mut self, at_nanos: i64, kind: String) {
        self.ignored.push(IgnoredEvent { at_nanos, kind });
    }

    pub fn lines(&self) -> &[TraceLine] {
        &self.lines
    }

    pub fn ignored(&self) -> &[IgnoredEvent] {
        &self.ignored
    }

    /// Lines whose movement kind equals `kind`, in execution order.
    pub fn lines_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a TraceLine> {
        self.lines.iter().filter(move |line| line.kind == kind)
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>20}    {:<18}  {:<26}    {:<22} -->  {:<25}  {}",
            "TIME", "IDENTIFIER", "EVENT", "FROM STATE", "TO STATE", "NOTE"
        )?;
        writeln!(f, "{RULE}")?;
        for line in &self.lines {
            writeln!(
                f,
                "{:>20}    {:<18}  {:<26}    {:<22} -->  {:<25}  {}",
                line.at_nanos,
                line.identifier,
                line.kind,
                line.from,
                line.to,
                line.notes.join("; ")
            )?;
        }
        if !self.ignored.is_empty() {
            writeln!(f, "{RULE}")?;
            writeln!(f, "Ignored events were ignored as they were scheduled after termination:")?;
            for event in &self.ignored {
                writeln!(f, "{:>20}    {:<18}  {:<26}", event.at_nanos, "", event.kind)?;
            }
        }
        Ok(())
    }
}

/// One mean-CPU sample across the active replicas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CpuUtilizationSample {
    /// Mean utilization in percent, `occupied / capacity * 100`.
    pub cpu_percent: f64,
    pub calculated_at: DateTime<Utc>,
}

/// CSV-style log of CPU utilization samples, owned by the environment and
/// appended to by the sampling ticktock.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuUtilizationLog {
    samples: Vec<CpuUtilizationSample>,
}

impl CpuUtilizationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, sample: CpuUtilizationSample) {
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[CpuUtilizationSample] {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::from("calculated_at_nanos,cpu_utilization_percent\n");
        for sample in &self.samples {
            let nanos = sample.calculated_at.timestamp_nanos_opt().unwrap_or_default();
            let _ = writeln!(out, "{},{:.4}", nanos, sample.cpu_percent);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_header_rows_and_ignored_tail() {
        let mut trace = Trace::new();
        trace.record(TraceLine {
            at_nanos: 60_000_000_001,
            identifier: "autoscaler".to_string(),
            kind: "autoscaler_tick".to_string(),
            from: "Autoscaler Ticktock".to_string(),
            to: "Autoscaler Ticktock".to_string(),
            notes: vec![],
        });
        trace.record_ignored(3_600_000_000_001, "finish_launching".to_string());

        let rendered = trace.to_string();
        assert!(rendered.contains("IDENTIFIER"));
        assert!(rendered.contains("autoscaler_tick"));
        assert!(rendered.contains("scheduled after termination"));
        assert!(rendered.contains("3600000000001"));
    }

    #[test]
    fn utilization_log_renders_csv() {
        let mut log = CpuUtilizationLog::new();
        log.append(CpuUtilizationSample {
            cpu_percent: 42.5,
            calculated_at: DateTime::<Utc>::UNIX_EPOCH,
        });

        let csv = log.to_csv();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("calculated_at_nanos,cpu_utilization_percent")
        );
        assert_eq!(lines.next(), Some("0,42.5000"));
    }
}
