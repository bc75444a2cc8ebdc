use crate::par::parallel_map;
use itertools::Itertools;
use std::hash::Hash;

/// Re-solves a model once per decision variable with that variable pinned to
/// true, and keeps the distinct solutions that match the base optimum.
///
/// The base solver returns a single optimum; pinning walks the space of
/// equally-good alternatives. `solve_pinned` gets the variable index and
/// returns `None` for pins that are infeasible or land on a worse objective;
/// those are expected and dropped silently. Every pin builds its own isolated
/// model, so the re-solves run on a bounded worker pool.
pub(crate) fn collect_equal_optima<S, F>(
    variable_count: usize,
    workers: usize,
    solve_pinned: F,
) -> Vec<S>
where
    S: Clone + Eq + Hash + Send,
    F: Fn(usize) -> Option<S> + Sync,
{
    parallel_map(variable_count, workers, solve_pinned)
        .into_iter()
        .flatten()
        .unique()
        .collect()
}
