//! Tournament selection.
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"
//! - Goldberg & Deb (1991), "A Comparative Analysis of Selection Schemes
//!   Used in Genetic Algorithms"

use crate::error::{LayoutError, LayoutResult};
use crate::model::Solution;
use rand::Rng;

/// Picks `k` individuals uniformly with replacement and returns the index of
/// the fittest. Unevaluated solutions rank below every evaluated one.
///
/// Higher `k` = stronger selection pressure.
/// - k=2: light pressure (good for diversity)
/// - k=3-5: moderate pressure (typical default)
///
/// # Complexity
/// O(k) per selection
pub fn tournament_index<R: Rng>(population: &[Solution], k: usize, rng: &mut R) -> LayoutResult<usize> {
    if population.is_empty() {
        return Err(LayoutError::EmptyPopulation);
    }
    let n = population.len();
    let mut best_idx = rng.random_range(0..n);
    for _ in 1..k.max(1) {
        let idx = rng.random_range(0..n);
        if population[idx].rank_fitness() > population[best_idx].rank_fitness() {
            best_idx = idx;
        }
    }
    Ok(best_idx)
}

/// Selects `count` parents, each a deep copy of its tournament winner.
pub fn select_parents<R: Rng>(
    population: &[Solution],
    k: usize,
    count: usize,
    rng: &mut R,
) -> LayoutResult<Vec<Solution>> {
    (0..count)
        .map(|_| tournament_index(population, k, rng).map(|i| population[i].clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Lineage, Origin, Point};
    use crate::random::create_rng;
    use std::collections::BTreeMap;

    fn scored(fitness: Option<f64>) -> Solution {
        let mut positions = BTreeMap::new();
        positions.insert("a".to_string(), Point::new(1.0, 1.0));
        let mut s = Solution::new(positions, Lineage::new(Origin::Random));
        if let Some(f) = fitness {
            s.set_evaluation(f, Default::default());
        }
        s
    }

    #[test]
    fn test_tournament_empty_population() {
        let mut rng = create_rng(1);
        assert_eq!(tournament_index(&[], 3, &mut rng), Err(LayoutError::EmptyPopulation));
    }

    #[test]
    fn test_tournament_prefers_higher_fitness() {
        let population: Vec<Solution> = (0..10).map(|i| scored(Some(i as f64 / 10.0))).collect();
        let mut rng = create_rng(42);
        let mut counts = [0usize; 10];
        for _ in 0..2000 {
            counts[tournament_index(&population, 3, &mut rng).unwrap()] += 1;
        }
        assert!(counts[9] > counts[0] * 5, "best should dominate worst: {counts:?}");
    }

    #[test]
    fn test_unevaluated_ranks_worst() {
        // With 64 draws the evaluated member is drawn in practically every tournament.
        let population = vec![scored(None), scored(Some(-0.4))];
        let mut rng = create_rng(7);
        for _ in 0..200 {
            let i = tournament_index(&population, 64, &mut rng).unwrap();
            assert_eq!(i, 1, "unevaluated solution won a tournament against an evaluated one");
        }
    }

    #[test]
    fn test_select_parents_returns_independent_copies() {
        let population = vec![scored(Some(0.5)), scored(Some(0.6))];
        let mut rng = create_rng(3);
        let mut parents = select_parents(&population, 2, 4, &mut rng).unwrap();
        assert_eq!(parents.len(), 4);
        parents[0].set_position("a", Point::new(9.0, 9.0));
        assert!(population.iter().all(|s| s.position("a") == Some(Point::new(1.0, 1.0))));
    }
}
