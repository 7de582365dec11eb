//! Hybrid initial population built from annealing output.

use super::config::GaConfig;
use crate::error::{LayoutError, LayoutResult};
use crate::model::{Lineage, Origin, Solution};
use crate::problem::LayoutProblem;
use rand::Rng;

/// Builds the generation-0 population.
///
/// Composition follows [`GaConfig::mix`]: copies of the seeds (cycled when
/// there are fewer seeds than slots), seeds with every building jittered,
/// and uniformly random layouts for the rest. Without seeds the whole
/// population is random.
///
/// # Errors
/// [`LayoutError::EmptyPopulation`] if `population_size` is zero.
pub fn initial_population<R: Rng>(
    problem: &LayoutProblem,
    seeds: &[Solution],
    config: &GaConfig,
    rng: &mut R,
) -> LayoutResult<Vec<Solution>> {
    let n = config.population_size;
    if n == 0 {
        return Err(LayoutError::EmptyPopulation);
    }

    let (annealed, perturbed) = if seeds.is_empty() {
        log::warn!("no annealing seeds, starting GA from a random population");
        (0, 0)
    } else {
        let annealed = ((n as f64 * config.mix.annealed).round() as usize).min(n);
        let perturbed = ((n as f64 * config.mix.perturbed).round() as usize).min(n - annealed);
        (annealed, perturbed)
    };

    let mut population = Vec::with_capacity(n);
    for i in 0..annealed {
        population.push(seeds[i % seeds.len()].clone());
    }
    let sigma = config.mix.perturbation_scale * problem.bounds().extent();
    for i in 0..perturbed {
        population.push(perturb_all(problem, &seeds[i % seeds.len()], sigma, rng));
    }
    while population.len() < n {
        population.push(problem.random_solution(rng));
    }

    log::debug!(
        "initial population: {annealed} annealed, {perturbed} perturbed, {} random",
        n - annealed - perturbed
    );
    Ok(population)
}

/// Jitters every building of `seed`.
fn perturb_all<R: Rng>(problem: &LayoutProblem, seed: &Solution, sigma: f64, rng: &mut R) -> Solution {
    let chain = match seed.lineage().origin {
        Origin::Annealed { chain } | Origin::Perturbed { chain } => chain,
        _ => 0,
    };
    let mut out = seed.clone();
    for building in problem.buildings() {
        if let Some(p) = seed.position(building.id()) {
            out.set_position(building.id(), problem.jitter(p, sigma, rng));
        }
    }
    *out.lineage_mut() = Lineage::new(Origin::Perturbed { chain });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::fixtures::campus_problem;
    use crate::random::create_rng;

    fn annealed_seed(problem: &LayoutProblem, chain: usize, seed: u64) -> Solution {
        let mut s = problem.random_solution(&mut create_rng(seed));
        s.lineage_mut().origin = Origin::Annealed { chain };
        problem.evaluate(&mut s).unwrap();
        s
    }

    #[test]
    fn test_default_mix_counts() {
        let problem = campus_problem();
        let seeds = vec![annealed_seed(&problem, 0, 1), annealed_seed(&problem, 1, 2)];
        let config = GaConfig::default();
        let mut rng = create_rng(4);
        let population = initial_population(&problem, &seeds, &config, &mut rng).unwrap();
        assert_eq!(population.len(), 50);

        let count = |f: fn(&Origin) -> bool| population.iter().filter(|s| f(&s.lineage().origin)).count();
        assert_eq!(count(|o| matches!(o, Origin::Annealed { .. })), 25);
        assert_eq!(count(|o| matches!(o, Origin::Perturbed { .. })), 15);
        assert_eq!(count(|o| matches!(o, Origin::Random)), 10);
    }

    #[test]
    fn test_perturbed_members_are_fresh_and_in_bounds() {
        let problem = campus_problem();
        let seeds = vec![annealed_seed(&problem, 3, 9)];
        let mut rng = create_rng(6);
        let population = initial_population(&problem, &seeds, &GaConfig::default(), &mut rng).unwrap();
        for s in population.iter().filter(|s| matches!(s.lineage().origin, Origin::Perturbed { .. })) {
            assert_eq!(s.lineage().origin, Origin::Perturbed { chain: 3 });
            assert!(!s.is_evaluated(), "perturbed layouts must be re-evaluated");
            assert!(problem.is_complete(s));
            assert!(s.positions().values().all(|p| problem.bounds().contains(*p)));
        }
        assert!(population[0].is_evaluated(), "seed copies keep their memoized fitness");
    }

    #[test]
    fn test_without_seeds_everything_is_random() {
        let problem = campus_problem();
        let config = GaConfig::default().with_population_size(12);
        let population = initial_population(&problem, &[], &config, &mut create_rng(1)).unwrap();
        assert_eq!(population.len(), 12);
        assert!(population.iter().all(|s| s.lineage().origin == Origin::Random));
    }

    #[test]
    fn test_zero_population_is_error() {
        let problem = campus_problem();
        let config = GaConfig::default().with_population_size(0);
        let result = initial_population(&problem, &[], &config, &mut create_rng(1));
        assert_eq!(result, Err(LayoutError::EmptyPopulation));
    }
}
