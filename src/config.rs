use std::collections::{BTreeMap, HashSet};

use derive_builder::Builder;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    report::Format,
    workload::{Params, WorkloadId},
};

pub const DEFAULT_REPETITIONS: u32 = 100;

/// What to run and how often.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct RunConfig {
    /// Trials per workload.
    #[builder(default = "DEFAULT_REPETITIONS")]
    pub repetitions: u32,
    /// Seed of the random generator; drawn at random when absent.
    #[builder(default)]
    pub seed: Option<u64>,
    /// Workloads to run, in order.
    #[builder(default = "WorkloadId::ALL.to_vec()")]
    pub workloads: Vec<WorkloadId>,
    /// Parameter overrides; workloads without one use their defaults.
    #[builder(default)]
    pub params: BTreeMap<WorkloadId, Params>,
    /// Count allocations and report them per workload.
    #[builder(default)]
    pub trace: bool,
    #[builder(default)]
    pub format: Format,
}

impl RunConfig {
    pub fn params(&self, id: WorkloadId) -> Params {
        self.params
            .get(&id)
            .copied()
            .unwrap_or_else(|| id.default_params())
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            repetitions: DEFAULT_REPETITIONS,
            seed: None,
            workloads: WorkloadId::ALL.to_vec(),
            params: BTreeMap::new(),
            trace: false,
            format: Format::default(),
        }
    }
}

impl RunConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.repetitions == Some(0) {
            return Err("repetitions must be at least 1".to_owned());
        }
        if let Some(workloads) = &self.workloads {
            let mut seen = HashSet::new();
            if let Some(dup) = workloads.iter().find(|id| !seen.insert(**id)) {
                return Err(format!("workload `{dup}` is listed more than once"));
            }
        }
        if let Some(params) = &self.params {
            if params.get(&WorkloadId::B).is_some_and(|p| p.third == 0) {
                return Err("workload `b` needs a non-zero batch interval".to_owned());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[cfg(feature = "benchmark")]
    #[error(transparent)]
    Decode(#[from] toml::de::Error),
    #[error(transparent)]
    Workload(#[from] crate::workload::UnknownWorkload),
    #[error("unknown output format `{0}`")]
    Format(String),
    #[error("invalid configuration: {0}")]
    Invalid(#[from] RunConfigBuilderError),
}

/// The on-disk form of a [`RunConfig`]. Every field is optional.
///
/// ```toml
/// repetitions = 100
/// seed = 7
/// workloads = ["a", "c", "f"]
///
/// [params.f]
/// first = 8
/// second = 32
/// third = 5
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub repetitions: Option<u32>,
    pub seed: Option<u64>,
    pub workloads: Option<Vec<String>>,
    #[serde(default)]
    pub params: BTreeMap<String, Params>,
    pub trace: Option<bool>,
    pub format: Option<String>,
}

impl FileConfig {
    #[cfg(feature = "benchmark")]
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Copies every value present in the file into `builder`.
    pub fn apply(self, builder: &mut RunConfigBuilder) -> Result<(), ConfigError> {
        if let Some(repetitions) = self.repetitions {
            builder.repetitions(repetitions);
        }
        if self.seed.is_some() {
            builder.seed(self.seed);
        }
        if let Some(workloads) = self.workloads {
            let ids = workloads
                .iter()
                .map(|w| w.parse())
                .collect::<Result<Vec<WorkloadId>, _>>()?;
            builder.workloads(ids);
        }
        if !self.params.is_empty() {
            let params = self
                .params
                .into_iter()
                .map(|(id, p)| Ok((id.parse::<WorkloadId>()?, p)))
                .collect::<Result<BTreeMap<_, _>, ConfigError>>()?;
            builder.params(params);
        }
        if let Some(trace) = self.trace {
            builder.trace(trace);
        }
        if let Some(format) = self.format {
            builder.format(format.parse().map_err(|_| ConfigError::Format(format))?);
        }
        Ok(())
    }
}
