use crate::data::Timeslot;
use itertools::Itertools;
use log::debug;

/// Precomputed pairwise conflicts over the full timeslot list.
///
/// Built once and reused across every semester; timeslot definitions are
/// semester-independent. A slot is never in its own conflict set.
pub struct ConflictIndex {
    matrix: Vec<Vec<bool>>,
    neighbors: Vec<Vec<usize>>,
}

impl ConflictIndex {
    /// O(T^2) over the timeslot count, which stays small for schedule grids.
    pub fn build(timeslots: &[Timeslot]) -> Self {
        let n = timeslots.len();
        let mut matrix = vec![vec![false; n]; n];
        let mut neighbors = vec![Vec::new(); n];

        for (a, b) in (0..n).tuple_combinations() {
            if timeslots[a].conflicts_with(&timeslots[b]) {
                matrix[a][b] = true;
                matrix[b][a] = true;
                neighbors[a].push(b);
                neighbors[b].push(a);
            }
        }

        let pairs: usize = neighbors.iter().map(Vec::len).sum::<usize>() / 2;
        debug!("conflict index: {} timeslots, {} conflicting pairs", n, pairs);
        Self { matrix, neighbors }
    }

    pub fn conflicting(&self, a: usize, b: usize) -> bool {
        self.matrix[a][b]
    }

    pub fn conflicts_of(&self, slot: usize) -> &[usize] {
        &self.neighbors[slot]
    }

    pub fn len(&self) -> usize {
        self.matrix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }
}
