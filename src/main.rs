use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use fuzzplan::config::load_overrides;
use fuzzplan::engines::search::ConsoleProgressCallback;
use fuzzplan::{AppConfig, ParamValue, Plan, ScriptExecutor, SearchEngine};

#[derive(Parser)]
#[command(author, version, about = "Mutation-driven command sequence fuzzer", long_about = None)]
struct Cli {
    /// Plan file describing header, footer, body blocks and parameters
    plan: PathBuf,

    /// TOML file whose values override the plan's parameters
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Seed for the random number generator
    #[arg(long, short)]
    seed: Option<u64>,

    /// Write a JSON summary of the run to this path
    #[arg(long, short)]
    report: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    dump_config: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut plan = Plan::from_file(&cli.plan)
        .with_context(|| format!("loading plan {}", cli.plan.display()))?;
    if let Some(path) = &cli.config {
        let overrides = load_overrides(path)
            .with_context(|| format!("loading overrides {}", path.display()))?;
        plan = plan.with_overrides(&overrides);
    }
    if let Some(seed) = cli.seed {
        let seed = i64::try_from(seed).context("seed is too large")?;
        plan = plan.with_parameter("seed", ParamValue::Integer(seed));
    }

    let config = AppConfig::from_plan(&plan)?;
    if cli.dump_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    println!("====== Executing fuzzing plan");
    let executor = ScriptExecutor::from_config(&config.execution);
    let mut engine = SearchEngine::new(Arc::new(plan), config, executor)?;
    let outcome = engine.run(ConsoleProgressCallback)?;

    println!("====== Final sequence");
    print!("{}", outcome.sequence.script());
    match outcome.objective {
        Some(objective) => println!("Objective: {}", objective),
        None => println!("Objective: none"),
    }
    if let Some(best) = outcome.best_objective {
        println!("Best objective: {}", best);
    }

    if let Some(path) = &cli.report {
        outcome
            .report()
            .write_json(path)
            .with_context(|| format!("writing report {}", path.display()))?;
    }
    Ok(())
}
