use std::{fmt, ops::AddAssign};

use serde::{Deserialize, Serialize};

#[cfg(not(target_arch = "wasm32"))]
pub type Instant = std::time::Instant;

#[cfg(target_arch = "wasm32")]
pub type Instant = wasm_instant::Instant;

#[cfg(target_arch = "wasm32")]
pub mod wasm_instant {
    use std::time::Duration;

    use wasm_bindgen::prelude::wasm_bindgen;

    #[wasm_bindgen(inline_js = r#"
export function performance_now() {
  return performance.now();
}"#)]
    extern "C" {
        fn performance_now() -> f64;
    }

    /// Nanoseconds since the page's time origin.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Instant(u64);

    impl Instant {
        pub fn now() -> Self {
            Self((performance_now() * 1_000_000.0) as u64)
        }
        pub fn duration_since(&self, earlier: Instant) -> Duration {
            Duration::from_nanos(self.0.saturating_sub(earlier.0))
        }
    }
}

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Nanoseconds from `before` to `after`, zero if `after` is earlier.
pub fn elapsed_ns(before: Instant, after: Instant) -> u64 {
    let d = after.duration_since(before);
    d.as_secs()
        .saturating_mul(NANOS_PER_SEC)
        .saturating_add(u64::from(d.subsec_nanos()))
}

pub fn ns_to_us(ns: u64) -> f64 {
    ns as f64 / 1_000.0
}

/// Runs `f` between two clock readings. Nothing but `f` is timed.
pub fn duration_of<F: FnOnce() -> O, O>(f: F) -> (O, u64) {
    let then = Instant::now();
    let o = f();
    let now = Instant::now();
    (o, elapsed_ns(then, now))
}

#[derive(Debug, Default)]
pub(crate) struct Stats {
    n: u32,
    total: u64,
    worst: u64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, ns: u64) {
        self.n += 1;
        self.total = self.total.saturating_add(ns);
        self.worst = self.worst.max(ns);
    }
}

/// Aggregate of the trials of one workload, in nanoseconds.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialStats {
    pub repetitions: u32,
    pub mean: u64,
    pub worst: u64,
    pub total: u64,
}

impl From<Stats> for TrialStats {
    fn from(source: Stats) -> Self {
        TrialStats {
            repetitions: source.n,
            mean: source.total.checked_div(u64::from(source.n)).unwrap_or(0),
            worst: source.worst,
            total: source.total,
        }
    }
}

impl TrialStats {
    pub fn mean_us(&self) -> f64 {
        ns_to_us(self.mean)
    }

    pub fn worst_us(&self) -> f64 {
        ns_to_us(self.worst)
    }

    pub fn total_us(&self) -> f64 {
        ns_to_us(self.total)
    }
}

impl fmt::Display for TrialStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mean = {:.5}µs, slowest = {:.5}µs, total = {:.5}µs",
            self.mean_us(),
            self.worst_us(),
            self.total_us()
        )
    }
}

/// Times `repetitions` sequential calls of `trial` and aggregates them.
///
/// Each output is added to a running total after the clock stops and then
/// dropped. The first failing call stops the run and its error is returned.
pub fn bench<T, E, F>(repetitions: u32, mut trial: F) -> Result<(TrialStats, T), E>
where
    T: Default + AddAssign,
    F: FnMut() -> Result<T, E>,
{
    let mut stats = Stats::new();
    let mut total = T::default();
    for _ in 0..repetitions {
        let (output, ns) = duration_of(&mut trial);
        total += output?;
        stats.update(ns);
    }
    Ok((stats.into(), total))
}
