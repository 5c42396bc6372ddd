use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use qtsp::agent::{cosine_ansatz, AnalyticLearner, GradientLearner, LinearEdgeModel};
use qtsp::config::AppConfig;
use qtsp::dataset::Dataset;
use qtsp::training::{EpisodeDriver, TrainingReport};
use qtsp::Learner;

/// Train a Q-learning TSP agent.
#[derive(Parser)]
#[command(name = "train", about = "Train a Q-learning TSP agent")]
struct Cli {
    /// Learner variant: analytic or gradient
    #[arg(long, default_value = "analytic")]
    variant: String,

    /// Path to TOML configuration file
    #[arg(long, default_value = "qtsp.toml")]
    config: PathBuf,

    /// Override number of training episodes
    #[arg(long)]
    episodes: Option<usize>,

    /// Override learning rate
    #[arg(long)]
    lr: Option<f64>,

    /// Override the session RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Persist run artifacts (meta, length histories, parameters)
    #[arg(long)]
    save: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.variant.as_str() {
        "analytic" | "gradient" => {}
        other => bail!("unknown variant '{}' (expected 'analytic' or 'gradient')", other),
    }

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    if let Some(episodes) = cli.episodes {
        config.training.episodes = episodes;
    }
    if let Some(lr) = cli.lr {
        config.agent.learning_rate = lr;
    }
    if let Some(seed) = cli.seed {
        config.training.seed = Some(seed);
    }
    if cli.save {
        config.training.save = true;
    }
    config.validate().context("validating config")?;

    let dataset = Dataset::load(
        &config.problem.data_path,
        config.problem.n_vars,
        config.problem.num_instances,
    )
    .with_context(|| format!("loading dataset from {}", config.problem.data_path.display()))?;

    let report = match cli.variant.as_str() {
        "analytic" => {
            let learner = AnalyticLearner::new(
                cosine_ansatz,
                config.problem.n_vars,
                config.agent.gamma,
                config.agent.learning_rate,
            );
            run(&config, learner, &dataset)?
        }
        "gradient" => {
            let model = LinearEdgeModel::new(config.problem.n_vars);
            let learner = GradientLearner::with_uniform_optimizers(
                model,
                config.agent.learning_rate,
                config.problem.n_vars,
                config.agent.gamma,
            )?;
            run(&config, learner, &dataset)?
        }
        _ => unreachable!(),
    };

    println!(
        "Result: {} episode(s), solved: {}, best tour length {:.4}, final avg ratio {:.4}",
        report.episodes_run, report.solved, report.best_tour_length, report.final_running_average
    );
    Ok(())
}

fn run<L: Learner>(config: &AppConfig, learner: L, dataset: &Dataset) -> Result<TrainingReport> {
    let mut driver = EpisodeDriver::new(config, learner).context("setting up training run")?;
    driver.run(dataset).context("training run failed")
}
