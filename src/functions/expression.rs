//! The `expr` generator: a self-mutating binary arithmetic expression.
//!
//! The first call builds a random tree. Every later call edits the persisted
//! tree in place: one node is picked with depth-weighted probability and is
//! replaced by a fresh leaf, a fresh subtree, or a copy of another node.
//! Trees never grow past `maxNodes` nodes.

use crate::engines::generation::ast::{depth_weights, ExprNode};
use crate::engines::generation::template::Template;
use crate::error::{FuzzplanError, Result};
use crate::functions::traits::{Generator, GeneratorCall, SubstitutionState};
use crate::plan::Plan;
use crate::types::ParameterSet;
use log::debug;
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, RngCore};

pub struct Expression;

/// Upper bound accepted for `expr.maxNodes`.
pub const MAX_TREE_NODES: usize = 4096;

/// The three edits a mutation can apply to the selected node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEdit {
    NewLeaf,
    NewSubtree,
    Graft,
}

#[derive(Debug, Clone)]
struct ExprSettings {
    operators: Vec<char>,
    leaves: Vec<String>,
    new_prob_leaf: f64,
    open: String,
    close: String,
    mut_prob_leaf: f64,
    mut_prob_tree: f64,
    child_weight: f64,
    max_nodes: usize,
}

fn probability(params: &ParameterSet, key: &str) -> Result<f64> {
    let value = params.float(key)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(FuzzplanError::Configuration(format!(
            "'expr.{}' must lie in [0, 1], got {}",
            key, value
        )));
    }
    Ok(value)
}

impl ExprSettings {
    fn from_params(params: &ParameterSet) -> Result<Self> {
        let operators: Vec<char> = params
            .string("binaryChars")?
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if operators.is_empty() {
            return Err(FuzzplanError::Configuration(
                "'expr.binaryChars' must name at least one operator".to_string(),
            ));
        }

        let leaves: Vec<String> = params
            .string("leaves")?
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if leaves.is_empty() {
            return Err(FuzzplanError::Configuration(
                "'expr.leaves' must list at least one leaf".to_string(),
            ));
        }

        let new_prob_leaf = probability(params, "newProbLeaf")?;
        if new_prob_leaf <= 0.0 {
            return Err(FuzzplanError::Configuration(
                "'expr.newProbLeaf' must be positive or trees never terminate".to_string(),
            ));
        }

        let child_weight = params.float("childWeight")?;
        if !(child_weight.is_finite() && child_weight > 0.0) {
            return Err(FuzzplanError::Configuration(format!(
                "'expr.childWeight' must be a positive number, got {}",
                child_weight
            )));
        }

        let max_nodes = params.int("maxNodes")?;
        if !(1..=MAX_TREE_NODES as i64).contains(&max_nodes) {
            return Err(FuzzplanError::Configuration(format!(
                "'expr.maxNodes' must lie in [1, {}], got {}",
                MAX_TREE_NODES, max_nodes
            )));
        }

        Ok(Self {
            operators,
            leaves,
            new_prob_leaf,
            open: params.string("left")?,
            close: params.string("right")?,
            mut_prob_leaf: probability(params, "mutProbLeaf")?,
            mut_prob_tree: probability(params, "mutProbTree")?,
            child_weight,
            max_nodes: max_nodes as usize,
        })
    }

    fn new_leaf(&self, plan: &Plan, rng: &mut dyn RngCore) -> Result<ExprNode> {
        let spec = &self.leaves[rng.gen_range(0..self.leaves.len())];
        let mut template = Template::new(spec.as_str());
        template.bind(plan, rng)?;
        Ok(ExprNode::Leaf(template))
    }

    /// Builds a random tree of at most `budget` nodes.
    fn new_tree(&self, plan: &Plan, rng: &mut dyn RngCore, budget: usize) -> Result<ExprNode> {
        let mut remaining = budget.max(1);
        self.grow(plan, rng, &mut remaining)
    }

    // `*remaining` is at least 1 on entry and never underflows.
    fn grow(&self, plan: &Plan, rng: &mut dyn RngCore, remaining: &mut usize) -> Result<ExprNode> {
        if *remaining < 3 || rng.gen::<f64>() < self.new_prob_leaf {
            *remaining -= 1;
            return self.new_leaf(plan, rng);
        }
        // This node plus one slot held back for the right child.
        *remaining -= 2;
        let left = self.grow(plan, rng, remaining)?;
        *remaining += 1;
        let op = self.operators[rng.gen_range(0..self.operators.len())];
        let right = self.grow(plan, rng, remaining)?;
        Ok(ExprNode::internal(left, op, right))
    }

    fn pick_edit(&self, roll: f64) -> TreeEdit {
        if roll < self.mut_prob_leaf {
            TreeEdit::NewLeaf
        } else if roll < self.mut_prob_leaf + self.mut_prob_tree {
            TreeEdit::NewSubtree
        } else {
            TreeEdit::Graft
        }
    }

    fn mutate(&self, tree: &mut ExprNode, plan: &Plan, rng: &mut dyn RngCore) -> Result<TreeEdit> {
        let nodes = tree.enumerate();
        let depths: Vec<usize> = nodes.iter().map(|(_, depth)| *depth).collect();
        let selector = WeightedIndex::new(depth_weights(&depths, self.child_weight))
            .map_err(|e| FuzzplanError::Generation(format!("expr node selection: {}", e)))?;
        let target = &nodes[selector.sample(rng)].0;
        let target_size = tree.node_at(target).map_or(1, ExprNode::size);
        let room = self
            .max_nodes
            .saturating_sub(tree.size() - target_size)
            .max(1);

        let edit = self.pick_edit(rng.gen::<f64>());
        let (edit, replacement) = match edit {
            TreeEdit::NewLeaf => (edit, self.new_leaf(plan, rng)?),
            TreeEdit::NewSubtree => (edit, self.new_tree(plan, rng, room)?),
            TreeEdit::Graft => {
                let source = &nodes[rng.gen_range(0..nodes.len())].0;
                let donor = tree.node_at(source).ok_or_else(|| {
                    FuzzplanError::Generation("expr graft source vanished".to_string())
                })?;
                if donor.size() <= room {
                    (edit, donor.clone())
                } else {
                    debug!("expr graft of {} nodes exceeds room {}", donor.size(), room);
                    (TreeEdit::NewSubtree, self.new_tree(plan, rng, room)?)
                }
            }
        };

        let slot = tree.node_at_mut(target).ok_or_else(|| {
            FuzzplanError::Generation("expr mutation target vanished".to_string())
        })?;
        *slot = replacement;
        debug!("expr {:?} at depth {}, tree size now {}", edit, target.len(), tree.size());
        Ok(edit)
    }
}

impl Generator for Expression {
    fn defaults(&self) -> ParameterSet {
        ParameterSet::new()
            .with("binaryChars", "+-*/")
            .with("leaves", "@{numeric}")
            .with("newProbLeaf", 0.6)
            .with("left", "( ")
            .with("right", " )")
            .with("mutProbLeaf", 0.2)
            .with("mutProbTree", 0.1)
            .with("childWeight", 1.5)
            .with("maxNodes", 256i64)
    }

    fn generate(&self, call: &mut GeneratorCall<'_>) -> Result<String> {
        let settings = ExprSettings::from_params(call.params)?;
        match &mut *call.state {
            SubstitutionState::Tree(tree) => {
                settings.mutate(tree, call.plan, &mut *call.rng)?;
            }
            state => {
                let tree = settings.new_tree(call.plan, &mut *call.rng, settings.max_nodes)?;
                *state = SubstitutionState::Tree(tree);
            }
        }
        let tree = call.state.as_tree().ok_or_else(|| {
            FuzzplanError::Generation("expr state lost its tree".to_string())
        })?;
        Ok(tree.render(&settings.open, &settings.close))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::params;
    use crate::types::ParamValue;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn run(site: ParameterSet, state: &mut SubstitutionState, rng: &mut StdRng) -> Result<String> {
        let plan = Plan::empty();
        let merged = params::resolve("expr", &Expression.defaults(), &site, plan.parameters());
        let mut call = GeneratorCall {
            head: "expr",
            params: &merged,
            plan: &plan,
            last_output: "",
            state,
            rng,
        };
        Expression.generate(&mut call)
    }

    fn constant_leaves() -> ParameterSet {
        ParameterSet::new().with("leaves", "@{numeric min=7 max=7}")
    }

    #[test]
    fn test_leaf_only_trees_have_no_brackets() {
        let mut rng = StdRng::seed_from_u64(21);
        let site = constant_leaves().with("newProbLeaf", 1.0);
        for _ in 0..200 {
            let mut state = SubstitutionState::Empty;
            let out = run(site.clone(), &mut state, &mut rng).unwrap();
            assert_eq!(out, "7");
            assert!(!out.contains('('));
        }
    }

    #[test]
    fn test_mutation_keeps_leaf_only_tree_bare() {
        let mut rng = StdRng::seed_from_u64(2);
        let site = constant_leaves().with("newProbLeaf", 1.0);
        let mut state = SubstitutionState::Empty;
        run(site.clone(), &mut state, &mut rng).unwrap();
        for _ in 0..100 {
            assert_eq!(run(site.clone(), &mut state, &mut rng).unwrap(), "7");
        }
    }

    #[test]
    fn test_rendering_is_balanced_and_uses_operators() {
        let mut rng = StdRng::seed_from_u64(99);
        let site = constant_leaves()
            .with("newProbLeaf", 0.4)
            .with("binaryChars", "+*");
        let mut state = SubstitutionState::Empty;
        for _ in 0..50 {
            let out = run(site.clone(), &mut state, &mut rng).unwrap();
            let tree = state.as_tree().unwrap();
            let internal = (tree.size() - 1) / 2;
            assert_eq!(out.matches("( ").count(), internal);
            assert_eq!(out.matches(" )").count(), internal);
            assert_eq!(out.matches(" + ").count() + out.matches(" * ").count(), internal);
            assert!(!out.contains('-'));
        }
    }

    #[test]
    fn test_state_persists_between_calls() {
        let mut rng = StdRng::seed_from_u64(4);
        let site = constant_leaves().with("newProbLeaf", 0.5);
        let mut state = SubstitutionState::Empty;
        let first = run(site.clone(), &mut state, &mut rng).unwrap();
        let snapshot = state.clone();
        for _ in 0..20 {
            run(site.clone(), &mut state, &mut rng).unwrap();
        }
        assert_eq!(snapshot.as_tree().unwrap().render("( ", " )"), first);
    }

    #[test]
    fn test_graft_only_mutation_reuses_existing_material() {
        let mut rng = StdRng::seed_from_u64(8);
        let settings = ExprSettings::from_params(&Expression.defaults().with("leaves", "x")).unwrap();
        let plan = Plan::empty();
        let tree = ExprNode::internal(
            settings.new_leaf(&plan, &mut rng).unwrap(),
            '-',
            settings.new_leaf(&plan, &mut rng).unwrap(),
        );
        let mut state = SubstitutionState::Tree(tree);
        let site = ParameterSet::new()
            .with("leaves", "y")
            .with("left", "[")
            .with("right", "]")
            .with("mutProbLeaf", 0.0)
            .with("mutProbTree", 0.0);
        for _ in 0..20 {
            let out = run(site.clone(), &mut state, &mut rng).unwrap();
            assert!(out.chars().all(|c| matches!(c, 'x' | '-' | '[' | ']' | ' ')), "{}", out);
        }
    }

    #[test]
    fn test_low_leaf_probability_trees_stay_within_node_limit() {
        let site = constant_leaves().with("newProbLeaf", 0.3);
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut state = SubstitutionState::Empty;
            let out = run(site.clone(), &mut state, &mut rng).unwrap();
            let size = state.as_tree().unwrap().size();
            assert!(size <= 256, "seed {} built {} nodes", seed, size);
            assert_eq!(out.matches("( ").count(), (size - 1) / 2);
        }
    }

    #[test]
    fn test_long_mutation_runs_respect_node_limit() {
        let mut rng = StdRng::seed_from_u64(31);
        let site = constant_leaves()
            .with("newProbLeaf", 0.1)
            .with("maxNodes", 15i64)
            .with("mutProbLeaf", 0.0)
            .with("mutProbTree", 0.5);
        let mut state = SubstitutionState::Empty;
        let mut largest = 0;
        for _ in 0..2_000 {
            run(site.clone(), &mut state, &mut rng).unwrap();
            let size = state.as_tree().unwrap().size();
            assert!(size <= 15, "tree grew to {} nodes", size);
            largest = largest.max(size);
        }
        assert!(largest > 1);
    }

    #[test]
    fn test_single_node_limit_builds_leaves() {
        let mut rng = StdRng::seed_from_u64(6);
        let site = constant_leaves().with("newProbLeaf", 0.01).with("maxNodes", 1i64);
        let mut state = SubstitutionState::Empty;
        for _ in 0..50 {
            assert_eq!(run(site.clone(), &mut state, &mut rng).unwrap(), "7");
        }
    }

    #[test]
    fn test_pick_edit_bands() {
        let settings = ExprSettings::from_params(&Expression.defaults()).unwrap();
        assert_eq!(settings.pick_edit(0.0), TreeEdit::NewLeaf);
        assert_eq!(settings.pick_edit(0.19), TreeEdit::NewLeaf);
        assert_eq!(settings.pick_edit(0.2), TreeEdit::NewSubtree);
        assert_eq!(settings.pick_edit(0.29), TreeEdit::NewSubtree);
        assert_eq!(settings.pick_edit(0.3), TreeEdit::Graft);
        assert_eq!(settings.pick_edit(0.99), TreeEdit::Graft);
    }

    #[test]
    fn test_invalid_settings_are_config_errors() {
        let cases = [
            ("newProbLeaf", ParamValue::Float(0.0)),
            ("newProbLeaf", ParamValue::Float(1.5)),
            ("binaryChars", ParamValue::from("")),
            ("leaves", ParamValue::from(" ; ")),
            ("childWeight", ParamValue::Float(-1.0)),
            ("maxNodes", ParamValue::Integer(0)),
            ("maxNodes", ParamValue::Integer(MAX_TREE_NODES as i64 + 1)),
        ];
        for (key, value) in cases {
            let mut params = Expression.defaults();
            params.insert(key, value);
            assert!(
                matches!(ExprSettings::from_params(&params), Err(FuzzplanError::Configuration(_))),
                "{} should be rejected",
                key
            );
        }
    }

    #[test]
    fn test_plan_scoped_leaves_are_used() {
        let plan = Plan::empty().with_parameter("expr.leaves", ParamValue::from("@{alpha len=3};;"));
        let mut rng = StdRng::seed_from_u64(13);
        let merged = params::resolve(
            "expr",
            &Expression.defaults(),
            &ParameterSet::new().with("newProbLeaf", 1.0),
            plan.parameters(),
        );
        let mut state = SubstitutionState::Empty;
        let mut call = GeneratorCall {
            head: "expr",
            params: &merged,
            plan: &plan,
            last_output: "",
            state: &mut state,
            rng: &mut rng,
        };
        let out = Expression.generate(&mut call).unwrap();
        assert_eq!(out.len(), 3);
        assert!(out.chars().all(|c| c.is_ascii_alphabetic()));
    }
}
