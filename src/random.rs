use rand::{rngs::SmallRng, Rng, SeedableRng};

pub const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789,.-#'?!;";

pub fn seeded(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

/// Uniform integer in `[min, max)`; `min` when the range is empty.
pub fn uniform_int<R: Rng + ?Sized>(rng: &mut R, min: usize, max: usize) -> usize {
    if min >= max {
        min
    } else {
        rng.gen_range(min..max)
    }
}

/// Uniform integer in `[min, max]`.
pub fn uniform_inclusive<R: Rng + ?Sized>(rng: &mut R, min: usize, max: usize) -> usize {
    if min >= max {
        min
    } else {
        rng.gen_range(min..=max)
    }
}

pub fn uniform_bool<R: Rng + ?Sized>(rng: &mut R) -> bool {
    rng.gen_bool(0.5)
}

/// Overwrites `buf` with printable characters from [`CHARSET`].
pub fn fill_printable<R: Rng + ?Sized>(rng: &mut R, buf: &mut [u8]) {
    for b in buf {
        *b = CHARSET[rng.gen_range(0..CHARSET.len())];
    }
}
