use rand::Rng;

use super::{Tally, WorkloadError};
use crate::{alloc::Allocator, random, sequence::GrowableSeq};

/// Sequence lengths observed at the end of each phase of workload `f`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Phases {
    pub filled: usize,
    pub erased: usize,
    pub after_erase: usize,
    pub refilled: usize,
}

/// Allocates a string of `len` random printable bytes and appends it. The
/// string is released again if the sequence cannot grow.
fn push_random<A, R>(
    allocator: &A,
    rng: &mut R,
    seq: &mut GrowableSeq<'_, A>,
    len: usize,
    tally: &mut Tally,
) where
    A: Allocator,
    R: Rng + ?Sized,
{
    let Some(mut string) = tally.allocation(allocator.allocate_bytes(len)) else {
        return;
    };
    random::fill_printable(rng, string.bytes_mut());
    if let Err(string) = seq.push_back(string) {
        allocator.release(string);
        tally.count_release(true);
    }
}

/// Workload `f`: stress a growable sequence of heap strings.
///
/// 1. push `max_len` strings of `1..max_len` characters into a sequence
///    created with room for `initial` elements, forcing it to grow;
/// 2. walk the sequence and erase each element with probability one half;
/// 3. push as many strings of `min_len..max_len` characters as are left;
/// 4. release every string from the back, then the sequence itself.
pub fn growable_strings<A, R>(
    allocator: &A,
    rng: &mut R,
    min_len: usize,
    max_len: usize,
    initial: usize,
) -> Result<(Tally, Phases), WorkloadError>
where
    A: Allocator,
    R: Rng + ?Sized,
{
    let mut seq = GrowableSeq::with_capacity(allocator, initial)?;
    let mut tally = Tally::default();
    let mut phases = Phases::default();

    for _ in 0..max_len {
        let len = random::uniform_int(rng, 1, max_len);
        push_random(allocator, rng, &mut seq, len, &mut tally);
    }
    phases.filled = seq.len();

    let mut i = 0;
    while i < seq.len() {
        if random::uniform_bool(rng) {
            if let Some((string, next)) = seq.erase_at(i) {
                allocator.release(string);
                tally.count_release(true);
                phases.erased += 1;
                i = next;
            }
        } else {
            i += 1;
        }
    }
    phases.after_erase = seq.len();

    for _ in 0..phases.after_erase {
        let len = random::uniform_int(rng, min_len, max_len);
        push_random(allocator, rng, &mut seq, len, &mut tally);
    }
    phases.refilled = seq.len();

    while let Some(string) = seq.pop_back() {
        allocator.release(string);
        tally.count_release(true);
    }
    drop(seq);
    Ok((tally, phases))
}
