//! Selection: lowest area among the candidates that meet the error
//! bound.

use whittle_circuit::EvaluationResult;

/// Index of the lowest-area result with `error <= threshold`. Area ties
/// keep generation order (stable sort). `None` means no candidate in
/// this generation is feasible — the search's secondary termination
/// signal.
pub fn select(results: &[EvaluationResult], threshold: f64) -> Option<usize> {
    let mut order: Vec<usize> = (0..results.len()).collect();
    order.sort_by(|&a, &b| {
        results[a]
            .area
            .partial_cmp(&results[b].area)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order.into_iter().find(|&i| results[i].error <= threshold)
}

/// Index of the lowest-area result regardless of error, ties to the
/// earliest candidate.
pub fn min_area(results: &[EvaluationResult]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, r) in results.iter().enumerate() {
        match best {
            Some(b) if results[b].area <= r.area => {}
            _ => best = Some(i),
        }
    }
    best
}
