use crate::engines::evaluation::executor::Executor;
use crate::engines::evaluation::objective::ExecutionResult;
use crate::engines::generation::operators::{mutate_sequence, Mutation};
use crate::engines::generation::template::CommandTemplate;
use crate::error::{FuzzplanError, Result};
use crate::plan::Plan;
use log::debug;
use rand::{Rng, RngCore};
use std::sync::Arc;

/// Command templates instantiated together from one catalog entry; always
/// replaced as a whole.
#[derive(Debug, Clone)]
pub struct CommandBlock {
    commands: Vec<CommandTemplate>,
}

impl CommandBlock {
    pub fn from_lines(plan: &Arc<Plan>, lines: &[String]) -> Self {
        Self {
            commands: lines
                .iter()
                .map(|line| CommandTemplate::new(Arc::clone(plan), line.as_str()))
                .collect(),
        }
    }

    /// Instantiate a body block drawn uniformly from the plan's catalog.
    pub fn random(plan: &Arc<Plan>, rng: &mut dyn RngCore) -> Result<Self> {
        let catalog = plan.body_blocks();
        if catalog.is_empty() {
            return Err(FuzzplanError::Configuration(
                "plan has no body blocks to draw from".to_string(),
            ));
        }
        let lines = &catalog[rng.gen_range(0..catalog.len())];
        Ok(Self::from_lines(plan, lines))
    }

    pub fn commands(&self) -> &[CommandTemplate] {
        &self.commands
    }

    pub fn commands_mut(&mut self) -> &mut [CommandTemplate] {
        &mut self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Template strings, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands.iter().map(CommandTemplate::text).collect()
    }
}

/// `[header] + nCommands body blocks + [footer]`, plus the result of its
/// most recent execution.
#[derive(Debug, Clone)]
pub struct CommandSequence {
    plan: Arc<Plan>,
    blocks: Vec<CommandBlock>,
    result: ExecutionResult,
}

impl CommandSequence {
    /// Assemble a fresh sequence. `nCommands` is read here and never again.
    pub fn new(plan: Arc<Plan>, rng: &mut dyn RngCore) -> Result<Self> {
        let n_commands = plan.parameters().int("nCommands")?;
        if n_commands < 0 {
            return Err(FuzzplanError::Configuration(format!(
                "nCommands must not be negative, got {}",
                n_commands
            )));
        }

        let mut blocks = Vec::with_capacity(n_commands as usize + 2);
        blocks.push(CommandBlock::from_lines(&plan, plan.header()));
        for _ in 0..n_commands {
            blocks.push(CommandBlock::random(&plan, rng)?);
        }
        blocks.push(CommandBlock::from_lines(&plan, plan.footer()));
        debug!("assembled sequence of {} blocks", blocks.len());

        Ok(Self::from_blocks(plan, blocks))
    }

    pub fn from_blocks(plan: Arc<Plan>, blocks: Vec<CommandBlock>) -> Self {
        Self {
            plan,
            blocks,
            result: ExecutionResult::default(),
        }
    }

    pub fn plan(&self) -> &Arc<Plan> {
        &self.plan
    }

    pub fn blocks(&self) -> &[CommandBlock] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut Vec<CommandBlock> {
        &mut self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Render every command, binding any substitution point not yet bound.
    pub fn render_lines(&mut self, rng: &mut dyn RngCore) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        for block in &mut self.blocks {
            for command in block.commands_mut() {
                lines.push(command.render(rng)?);
            }
        }
        Ok(lines)
    }

    pub fn render(&mut self, rng: &mut dyn RngCore) -> Result<String> {
        Ok(join_script(self.render_lines(rng)?))
    }

    /// Script text from the current outputs, without binding anything.
    pub fn script(&self) -> String {
        join_script(
            self.blocks
                .iter()
                .flat_map(|block| block.commands().iter().map(CommandTemplate::output))
                .collect(),
        )
    }

    /// Render, run and scrape. The new result replaces the previous one.
    pub fn execute(&mut self, executor: &dyn Executor, rng: &mut dyn RngCore) -> Result<&ExecutionResult> {
        let script = self.render(rng)?;
        let output = executor.run_script(&script)?;
        self.result = ExecutionResult::from_stdout(&output.stdout);
        Ok(&self.result)
    }

    pub fn result(&self) -> &ExecutionResult {
        &self.result
    }

    /// Numeric `OBJECTIVE` of the last execution, if it reported one.
    pub fn objective(&self) -> Option<f64> {
        self.result.objective()
    }

    /// Apply one atomic mutation.
    pub fn mutate(&mut self, prob_mutate_substitution: f64, rng: &mut dyn RngCore) -> Result<Mutation> {
        mutate_sequence(self, prob_mutate_substitution, rng)
    }
}

fn join_script(lines: Vec<String>) -> String {
    let mut script = lines.join("\n");
    script.push('\n');
    script
}
