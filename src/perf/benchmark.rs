use log::{debug, info, warn};
use rand::Rng;

use super::measure::bench;
use crate::{
    alloc::{measure::MemoryProbe, Allocator, SystemAllocator},
    config::RunConfig,
    random,
    report::{Outcome, Report, Row},
    workload::{Params, Workload, WorkloadId},
};

/// Runs one workload `repetitions` times, one trial after the other.
///
/// Only the generator call is inside the clock readings; logging and the
/// allocator statistics are handled once all trials are done.
pub fn run_workload<A, R>(
    id: WorkloadId,
    params: Params,
    repetitions: u32,
    allocator: &A,
    rng: &mut R,
) -> Row
where
    A: Allocator + MemoryProbe,
    R: Rng + ?Sized,
{
    let workload = Workload::new(id, params);
    // start counting from zero for this workload
    allocator.take_stats();

    let outcome = match bench(repetitions, || workload.run(allocator, rng)) {
        Ok((stats, tally)) => {
            info!("performance stats for `{id}` {params}: {stats}");
            debug!("workload `{id}`: {tally}");
            let memory = allocator.take_stats();
            if let Some(memory) = &memory {
                info!("memory allocation stats for `{id}`:\n{memory}");
            }
            Outcome::Completed {
                stats,
                tally,
                memory,
            }
        }
        Err(e) => {
            warn!("workload `{id}` {params} failed: {e}");
            allocator.take_stats();
            Outcome::Failed {
                reason: e.to_string(),
            }
        }
    };
    Row {
        id,
        params,
        outcome,
    }
}

/// Runs every configured workload in order. A failing workload does not stop
/// the ones after it.
pub fn run_all<A, R>(config: &RunConfig, allocator: &A, rng: &mut R) -> Vec<Row>
where
    A: Allocator + MemoryProbe,
    R: Rng + ?Sized,
{
    config
        .workloads
        .iter()
        .map(|&id| run_workload(id, config.params(id), config.repetitions, allocator, rng))
        .collect()
}

/// Runs `config` against the platform allocator, counting allocations when
/// `config.trace` is set.
pub fn run(config: &RunConfig) -> Report {
    let seed = config.seed.unwrap_or_else(rand::random);
    info!("seed: {seed}");
    let mut rng = random::seeded(seed);

    let rows = if config.trace {
        run_all(config, &crate::alloc::default_tracing_allocator(), &mut rng)
    } else {
        run_all(config, &SystemAllocator::system(), &mut rng)
    };
    Report {
        seed,
        repetitions: config.repetitions,
        rows,
    }
}
