//! Stress tests for memory allocators.
//!
//! Six synthetic workloads, `a` through `f`, drive an [`Allocator`] through
//! different allocation patterns. Each workload is timed over a number of
//! trials and summarized in a [`Report`].
//!
//! ```
//! use memgrind::{config::RunConfigBuilder, perf::benchmark::run, WorkloadId};
//!
//! let config = RunConfigBuilder::default()
//!     .repetitions(2)
//!     .seed(Some(1))
//!     .workloads(vec![WorkloadId::A, WorkloadId::F])
//!     .build()
//!     .unwrap();
//! let report = run(&config);
//! assert_eq!(report.rows.len(), 2);
//! println!("{report}");
//! ```

pub mod alloc;
pub mod config;
pub mod inventory;
pub mod perf;
pub mod random;
pub mod report;
pub mod sequence;
pub mod workload;

pub use alloc::{Allocator, Handle, SystemAllocator};
pub use config::{RunConfig, RunConfigBuilder};
pub use report::{Format, Report};
pub use workload::{Params, Tally, Workload, WorkloadId};

#[cfg(feature = "benchmark")]
mod benchmark;

#[cfg(feature = "benchmark")]
pub use benchmark::*;
