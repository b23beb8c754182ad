use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::{
    alloc::measure::MemoryStats,
    perf::measure::TrialStats,
    workload::{Params, Tally, WorkloadId},
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "benchmark", derive(clap::ValueEnum))]
pub enum Format {
    #[default]
    Table,
    Json,
}

impl FromStr for Format {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(Format::Table),
            "json" => Ok(Format::Json),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Table => "table",
            Format::Json => "json",
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Completed {
        stats: TrialStats,
        tally: Tally,
        #[serde(skip_serializing_if = "Option::is_none")]
        memory: Option<MemoryStats>,
    },
    Failed {
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct Row {
    pub id: WorkloadId,
    pub params: Params,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub seed: u64,
    pub repetitions: u32,
    pub rows: Vec<Row>,
}

const RULE: &str = "-------------------------------------------------------------";

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "memgrind: allocator stress tests")?;
        writeln!(
            f,
            "Each individual test is run {} times and wall-clock time averaged.",
            self.repetitions
        )?;
        writeln!(f, "All times are expressed in µs (seed {}).", self.seed)?;
        writeln!(f)?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "{:<6}{:>18}{:>18}{:>18}", "test", "mean", "slowest", "total")?;
        writeln!(f, "{RULE}")?;
        for row in &self.rows {
            match &row.outcome {
                Outcome::Completed { stats, .. } => writeln!(
                    f,
                    "{:<6}{:>18.5}{:>18.5}{:>18.5}",
                    row.id,
                    stats.mean_us(),
                    stats.worst_us(),
                    stats.total_us()
                )?,
                Outcome::Failed { reason } => {
                    writeln!(f, "{:<6}{:>18}  ({reason})", row.id, "failed")?
                }
            }
        }
        Ok(())
    }
}

impl Report {
    #[cfg(feature = "benchmark")]
    pub fn to_json(&self) -> String {
        // shouldn't fail: every field is a plain number, string or struct
        serde_json::to_string_pretty(self)
            .unwrap_or_else(|e| unreachable!("cannot serialize report: {e}\ndata: {self:#?}"))
    }

    pub fn render(&self, format: Format) -> String {
        match format {
            Format::Table => self.to_string(),
            #[cfg(feature = "benchmark")]
            Format::Json => self.to_json(),
            #[cfg(not(feature = "benchmark"))]
            Format::Json => self.to_string(),
        }
    }
}
