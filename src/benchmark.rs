use std::path::PathBuf;

use clap::Parser;
use log::debug;

use crate::{
    config::{ConfigError, FileConfig, RunConfig, RunConfigBuilder},
    perf::benchmark::run,
    report::Format,
    workload::WorkloadId,
};

/// Stress tests for memory allocators.
#[derive(Debug, Parser)]
#[command(name = "memgrind", version)]
pub struct Args {
    /// TOML file with the run configuration; flags override its values.
    #[arg(short, long, value_name = "FILE", env = "MEMGRIND_CONFIG")]
    pub config: Option<PathBuf>,
    /// Trials per workload.
    #[arg(short = 'n', long)]
    pub repetitions: Option<u32>,
    /// Seed of the random generator.
    #[arg(short, long)]
    pub seed: Option<u64>,
    /// Workloads to run, in order.
    #[arg(short, long, value_delimiter = ',', value_name = "IDS", value_enum, ignore_case = true)]
    pub workloads: Option<Vec<WorkloadId>>,
    /// Count allocations made by each workload.
    #[arg(short, long)]
    pub trace: bool,
    #[arg(short, long, value_enum)]
    pub format: Option<Format>,
}

impl Args {
    /// Merges the config file, if any, with the command line.
    pub fn into_config(self) -> Result<RunConfig, ConfigError> {
        let mut builder = RunConfigBuilder::default();
        if let Some(path) = &self.config {
            debug!("loading configuration from {path:?}");
            FileConfig::load(path)?.apply(&mut builder)?;
        }
        if let Some(repetitions) = self.repetitions {
            builder.repetitions(repetitions);
        }
        if self.seed.is_some() {
            builder.seed(self.seed);
        }
        if let Some(workloads) = self.workloads {
            builder.workloads(workloads);
        }
        if self.trace {
            builder.trace(true);
        }
        if let Some(format) = self.format {
            builder.format(format);
        }
        Ok(builder.build()?)
    }
}

/// Runs the harness as configured by `args` and renders the report.
pub fn memgrind(args: Args) -> Result<String, ConfigError> {
    let config = args.into_config()?;
    debug!("configuration: {config:?}");
    let report = run(&config);
    Ok(report.render(config.format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workload::Params;
    use std::ffi::OsStr;

    #[test]
    fn command_line() {
        let args = Args::try_parse_from([
            "memgrind", "-n", "3", "--seed", "5", "--workloads", "f,A", "--trace", "-f", "json",
        ])
        .unwrap();
        assert_eq!(args.repetitions, Some(3));
        let c = args.into_config().unwrap();
        assert_eq!(c.repetitions, 3);
        assert_eq!(c.seed, Some(5));
        assert_eq!(c.workloads, [WorkloadId::F, WorkloadId::A]);
        assert!(c.trace);
        assert_eq!(c.format, Format::Json);
    }

    #[test]
    fn bad_command_line() {
        assert!(Args::try_parse_from(["memgrind", "--workloads", "a,x"]).is_err());
        assert!(Args::try_parse_from(["memgrind", "--format", "yaml"]).is_err());
        let args = Args::try_parse_from(["memgrind", "-n", "0"]).unwrap();
        assert!(matches!(args.into_config(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn flags_override_the_file() {
        let path = std::env::temp_dir().join(format!("memgrind-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "repetitions = 7\nseed = 1\nworkloads = [\"e\"]\n[params.e]\nfirst = 2\nsecond = 8\nthird = 0\n",
        )
        .unwrap();
        let args = Args::try_parse_from([
            OsStr::new("memgrind"),
            OsStr::new("--config"),
            path.as_os_str(),
            OsStr::new("--seed"),
            OsStr::new("2"),
        ])
        .unwrap();
        let c = args.into_config().unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(c.repetitions, 7);
        assert_eq!(c.seed, Some(2));
        assert_eq!(c.workloads, [WorkloadId::E]);
        assert_eq!(c.params(WorkloadId::E), Params::new(2, 8, 0));
    }

    #[test]
    fn missing_file() {
        let args = Args::try_parse_from(["memgrind", "--config", "/nonexistent/memgrind.toml"])
            .unwrap();
        assert!(matches!(args.into_config(), Err(ConfigError::IO(_))));
    }

    #[test]
    fn end_to_end() {
        let args =
            Args::try_parse_from(["memgrind", "-n", "2", "-s", "3", "-w", "a,b", "-f", "json"])
                .unwrap();
        let out = memgrind(args).unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["seed"], 3);
        assert_eq!(v["rows"].as_array().unwrap().len(), 2);
        assert_eq!(v["rows"][1]["tally"]["allocated"], 300);
    }
}
