//! Candidate generation: single-coordinate decrements of the accepted
//! design point.

use whittle_circuit::{ApproxStream, ABSENT};

/// Degrees at or below the floor are never explored; a rank-1 variant
/// is a degenerate factorization.
pub const DEGREE_FLOOR: i32 = 1;

/// The legal neighbor configurations of `current`: one candidate per
/// existing partition, with that coordinate lowered by exactly one, kept
/// only while the lowered degree stays above [`DEGREE_FLOOR`].
///
/// An empty result is the search's primary termination signal. No
/// deduplication is needed — each candidate differs from `current` in a
/// different coordinate.
pub fn candidates(current: &ApproxStream) -> Vec<ApproxStream> {
    let mut out = Vec::new();
    for (index, degree) in current.iter().enumerate() {
        if degree == ABSENT {
            continue;
        }
        let lowered = degree - 1;
        if lowered > DEGREE_FLOOR {
            out.push(current.with_degree(index, lowered));
        }
    }
    out
}

/// A design point no generation can leave: every coordinate is absent
/// or already floor-adjacent. The hierarchical search uses this as its
/// worker-collapse test.
pub fn is_collapsed(current: &ApproxStream) -> bool {
    candidates(current).is_empty()
}
