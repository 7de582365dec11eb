//! Candidate layouts (the genome shared by SA and GA).

use super::geometry::Point;
use crate::fitness::ObjectiveScores;
use std::collections::BTreeMap;

/// Where a solution came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Origin {
    /// Deterministic grid fallback.
    Naive,
    /// Uniformly random placement.
    Random,
    /// Best-ever state of an annealing chain.
    Annealed { chain: usize },
    /// An annealed solution re-perturbed for GA seeding.
    Perturbed { chain: usize },
    /// Uniform crossover offspring.
    Crossover,
    /// Parent copied through without crossover.
    Copy,
}

/// Lineage metadata carried for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Lineage {
    pub origin: Origin,
    /// GA generation in which the solution was created (0 = initial population).
    pub generation: usize,
    /// Number of mutation operators applied since creation.
    pub mutations: u32,
}

impl Lineage {
    pub fn new(origin: Origin) -> Self {
        Self {
            origin,
            generation: 0,
            mutations: 0,
        }
    }
}

/// A complete candidate layout: one position per building id.
///
/// Fitness is memoized. Every method that changes a position clears the memo,
/// so "fitness present" is the single signal that no evaluation is needed.
/// Operators always work on clones; solutions are never aliased.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Solution {
    positions: BTreeMap<String, Point>,
    fitness: Option<f64>,
    scores: Option<ObjectiveScores>,
    lineage: Lineage,
}

impl Solution {
    pub fn new(positions: BTreeMap<String, Point>, lineage: Lineage) -> Self {
        Self {
            positions,
            fitness: None,
            scores: None,
            lineage,
        }
    }

    pub fn positions(&self) -> &BTreeMap<String, Point> {
        &self.positions
    }

    pub fn position(&self, id: &str) -> Option<Point> {
        self.positions.get(id).copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.positions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Moves a known building. Unknown ids are ignored and return `false`.
    pub fn set_position(&mut self, id: &str, position: Point) -> bool {
        match self.positions.get_mut(id) {
            Some(slot) => {
                *slot = position;
                self.clear_fitness();
                true
            }
            None => false,
        }
    }

    /// Exchanges the positions of two buildings.
    pub fn swap_positions(&mut self, a: &str, b: &str) -> bool {
        let (Some(pa), Some(pb)) = (self.position(a), self.position(b)) else {
            return false;
        };
        self.positions.insert(a.to_string(), pb);
        self.positions.insert(b.to_string(), pa);
        self.clear_fitness();
        true
    }

    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    /// Fitness for ranking; unevaluated solutions rank worst.
    pub fn rank_fitness(&self) -> f64 {
        self.fitness.unwrap_or(f64::NEG_INFINITY)
    }

    pub fn scores(&self) -> Option<&ObjectiveScores> {
        self.scores.as_ref()
    }

    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }

    /// Drops the memoized fitness. Call after any external position edit.
    pub fn clear_fitness(&mut self) {
        self.fitness = None;
        self.scores = None;
    }

    pub(crate) fn set_evaluation(&mut self, fitness: f64, scores: ObjectiveScores) {
        self.fitness = Some(fitness);
        self.scores = Some(scores);
    }

    pub fn lineage(&self) -> &Lineage {
        &self.lineage
    }

    pub fn lineage_mut(&mut self) -> &mut Lineage {
        &mut self.lineage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two() -> Solution {
        let mut positions = BTreeMap::new();
        positions.insert("a".to_string(), Point::new(1.0, 1.0));
        positions.insert("b".to_string(), Point::new(5.0, 5.0));
        Solution::new(positions, Lineage::new(Origin::Random))
    }

    #[test]
    fn test_set_position_clears_memo() {
        let mut s = two();
        s.set_evaluation(0.5, ObjectiveScores::default());
        assert!(s.is_evaluated());
        assert!(s.set_position("a", Point::new(2.0, 2.0)));
        assert!(!s.is_evaluated());
        assert!(s.scores().is_none());
    }

    #[test]
    fn test_unknown_id_is_ignored() {
        let mut s = two();
        s.set_evaluation(0.5, ObjectiveScores::default());
        assert!(!s.set_position("zzz", Point::new(0.0, 0.0)));
        assert_eq!(s.len(), 2);
        assert!(s.is_evaluated(), "no change, memo kept");
    }

    #[test]
    fn test_swap_positions() {
        let mut s = two();
        assert!(s.swap_positions("a", "b"));
        assert_eq!(s.position("a"), Some(Point::new(5.0, 5.0)));
        assert_eq!(s.position("b"), Some(Point::new(1.0, 1.0)));
        assert!(!s.swap_positions("a", "nope"));
    }

    #[test]
    fn test_unevaluated_ranks_worst() {
        let s = two();
        assert_eq!(s.rank_fitness(), f64::NEG_INFINITY);
    }
}
