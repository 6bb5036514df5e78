use crate::engines::generation::sequence::{CommandBlock, CommandSequence};
use crate::error::{FuzzplanError, Result};
use log::debug;
use rand::{Rng, RngCore};
use std::sync::Arc;

/// The single edit one mutation call applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// One substitution point was regenerated.
    Substitution {
        block: usize,
        command: usize,
        point: usize,
    },
    /// A body block was swapped for a freshly drawn one.
    BlockReplaced { index: usize },
    /// The sequence was empty, so a block was appended.
    BlockAppended,
}

/// Apply exactly one atomic edit to `sequence`.
///
/// With probability `prob_mutate_substitution` one bound substitution point is
/// regenerated: a command owning at least one point is chosen uniformly,
/// then one of its points. Otherwise, or when no command has a bound point,
/// one body block is replaced wholesale. The header and footer blocks are
/// never replaced.
pub fn mutate_sequence(
    sequence: &mut CommandSequence,
    prob_mutate_substitution: f64,
    rng: &mut dyn RngCore,
) -> Result<Mutation> {
    if rng.gen::<f64>() < prob_mutate_substitution {
        let candidates: Vec<(usize, usize)> = sequence
            .blocks()
            .iter()
            .enumerate()
            .flat_map(|(b, block)| {
                block
                    .commands()
                    .iter()
                    .enumerate()
                    .filter(|(_, command)| command.substitution_count() > 0)
                    .map(move |(c, _)| (b, c))
            })
            .collect();

        if !candidates.is_empty() {
            let (block, command) = candidates[rng.gen_range(0..candidates.len())];
            let point = sequence.blocks_mut()[block].commands_mut()[command].mutate(rng)?;
            debug!("mutated substitution {} of command {} in block {}", point, command, block);
            return Ok(Mutation::Substitution {
                block,
                command,
                point,
            });
        }
    }

    let plan = Arc::clone(sequence.plan());
    let blocks = sequence.blocks_mut();
    if blocks.is_empty() {
        blocks.push(CommandBlock::random(&plan, rng)?);
        debug!("appended a block to an empty sequence");
        return Ok(Mutation::BlockAppended);
    }
    if blocks.len() < 3 {
        return Err(FuzzplanError::Generation(
            "sequence has no body block to replace".to_string(),
        ));
    }

    let index = rng.gen_range(1..blocks.len() - 1);
    blocks[index] = CommandBlock::random(&plan, rng)?;
    debug!("replaced body block {}", index);
    Ok(Mutation::BlockReplaced { index })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Plan;
    use crate::types::ParameterSet;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn plan() -> Arc<Plan> {
        Arc::new(Plan::new(
            ParameterSet::new().with("nCommands", 5i64),
            vec!["echo @{alphanumeric len=16}".to_string()],
            vec!["echo END @{numeric}".to_string()],
            vec![
                vec!["echo @{alphanumeric len=24}".to_string(), "true".to_string()],
                vec!["echo @{numeric} @{alpha len=24}".to_string()],
            ],
        ))
    }

    fn snapshot(sequence: &CommandSequence) -> Vec<Vec<String>> {
        sequence
            .blocks()
            .iter()
            .map(|b| b.commands().iter().map(|c| c.output()).collect())
            .collect()
    }

    fn templates(sequence: &CommandSequence) -> Vec<Vec<String>> {
        sequence
            .blocks()
            .iter()
            .map(|b| b.texts().into_iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_unbound_sequence_falls_back_to_block_replacement() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut sequence = CommandSequence::new(plan(), &mut rng).unwrap();
        let mutation = sequence.mutate(1.0, &mut rng).unwrap();
        assert!(matches!(mutation, Mutation::BlockReplaced { index } if (1..=5).contains(&index)));
    }

    #[test]
    fn test_exactly_one_edit_per_call() {
        let mut rng = StdRng::seed_from_u64(17);
        let mut sequence = CommandSequence::new(plan(), &mut rng).unwrap();
        sequence.render(&mut rng).unwrap();

        for _ in 0..300 {
            let before = snapshot(&sequence);
            let before_templates = templates(&sequence);
            let mutation = sequence.mutate(0.5, &mut rng).unwrap();
            let after = snapshot(&sequence);

            match mutation {
                Mutation::Substitution { block, command, .. } => {
                    assert_eq!(templates(&sequence), before_templates);
                    for (b, (old, new)) in before.iter().zip(&after).enumerate() {
                        for (c, (o, n)) in old.iter().zip(new).enumerate() {
                            if (b, c) != (block, command) {
                                assert_eq!(o, n);
                            }
                        }
                    }
                }
                Mutation::BlockReplaced { index } => {
                    assert!(index > 0 && index < sequence.len() - 1);
                    for (b, (old, new)) in before.iter().zip(&after).enumerate() {
                        if b != index {
                            assert_eq!(old, new);
                        }
                    }
                }
                Mutation::BlockAppended => panic!("sequence was never empty"),
            }
            sequence.render(&mut rng).unwrap();
        }
    }

    #[test]
    fn test_header_and_footer_templates_never_change() {
        let mut rng = StdRng::seed_from_u64(23);
        let mut sequence = CommandSequence::new(plan(), &mut rng).unwrap();
        for _ in 0..200 {
            sequence.render(&mut rng).unwrap();
            sequence.mutate(0.3, &mut rng).unwrap();
            let blocks = templates(&sequence);
            assert_eq!(blocks.len(), 7);
            assert_eq!(blocks[0], vec!["echo @{alphanumeric len=16}"]);
            assert_eq!(blocks[6], vec!["echo END @{numeric}"]);
        }
    }

    #[test]
    fn test_empty_sequence_gets_a_block() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut sequence = CommandSequence::from_blocks(plan(), Vec::new());
        assert_eq!(sequence.mutate(0.0, &mut rng).unwrap(), Mutation::BlockAppended);
        assert_eq!(sequence.len(), 1);
    }

    #[test]
    fn test_header_footer_only_sequence_cannot_replace() {
        let mut rng = StdRng::seed_from_u64(5);
        let plan = plan();
        let blocks = vec![
            CommandBlock::from_lines(&plan, plan.header()),
            CommandBlock::from_lines(&plan, plan.footer()),
        ];
        let mut sequence = CommandSequence::from_blocks(Arc::clone(&plan), blocks);
        assert!(matches!(
            sequence.mutate(0.0, &mut rng),
            Err(FuzzplanError::Generation(_))
        ));
    }
}
