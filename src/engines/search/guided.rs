use crate::engines::evaluation::Executor;
use crate::engines::generation::CommandSequence;
use crate::error::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use rayon::ThreadPool;

/// Index of the candidate that replaces the incumbent, if any.
///
/// Only a numeric objective can win, and it must be strictly greater than
/// the incumbent's. Among equal winners the lowest index is kept, so the
/// choice never depends on which candidate finished first.
pub fn select_incumbent(current: Option<f64>, candidates: &[Option<f64>]) -> Option<usize> {
    let mut best = current;
    let mut chosen = None;
    for (i, objective) in candidates.iter().enumerate() {
        let Some(value) = *objective else { continue };
        if best.map_or(true, |b| value > b) {
            best = Some(value);
            chosen = Some(i);
        }
    }
    chosen
}

/// Clone, mutate and execute one candidate per seed.
///
/// Each candidate draws from its own RNG seeded from `seeds`, so a run is
/// reproducible whether it goes through the pool or not. Results come back
/// in seed order.
pub fn evaluate_mutants<E: Executor>(
    incumbent: &CommandSequence,
    seeds: &[u64],
    prob_mutate_substitution: f64,
    executor: &E,
    pool: Option<&ThreadPool>,
) -> Result<Vec<CommandSequence>> {
    let evaluate = |seed: &u64| -> Result<CommandSequence> {
        let mut rng = StdRng::seed_from_u64(*seed);
        let mut candidate = incumbent.clone();
        candidate.mutate(prob_mutate_substitution, &mut rng)?;
        candidate.execute(executor, &mut rng)?;
        Ok(candidate)
    };

    match pool {
        Some(pool) => pool.install(|| seeds.par_iter().map(evaluate).collect()),
        None => seeds.iter().map(evaluate).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_numeric_candidates_win() {
        assert_eq!(select_incumbent(None, &[None, None]), None);
        assert_eq!(select_incumbent(None, &[None, Some(-3.0)]), Some(1));
        assert_eq!(select_incumbent(Some(1.0), &[None, Some(0.5)]), None);
    }

    #[test]
    fn test_ties_keep_incumbent() {
        assert_eq!(select_incumbent(Some(2.0), &[Some(2.0), Some(2.0)]), None);
        assert_eq!(select_incumbent(Some(2.0), &[Some(3.0), Some(3.0)]), Some(0));
        assert_eq!(select_incumbent(None, &[Some(1.0), Some(4.0), Some(4.0)]), Some(1));
    }
}
