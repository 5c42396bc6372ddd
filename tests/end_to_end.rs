//! End-to-end training runs through the public API, on instances small
//! enough that every tour is checkable by hand.

use qtsp::agent::{AnalyticLearner, CircuitModel, GradientLearner, LinearEdgeModel};
use qtsp::config::AppConfig;
use qtsp::dataset::{Dataset, Instance};
use qtsp::graph::tour_length;
use qtsp::training::{EpisodeDriver, SOLVED_WINDOW};
use qtsp::Learner;

fn triangle_dataset() -> Dataset {
    let nodes = vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
    let optimal_order = vec![0, 1, 2];
    let optimal_length = tour_length(&nodes, &optimal_order);
    Dataset {
        instances: vec![Instance {
            nodes,
            optimal_order,
            optimal_length,
        }],
    }
}

fn config(episodes: usize) -> AppConfig {
    let mut config = AppConfig::default();
    config.problem.n_vars = 3;
    config.training.episodes = episodes;
    config.training.seed = Some(11);
    config.training.log_interval = 10_000;
    config.agent.batch_size = 4;
    config.agent.update_after = 2;
    config.agent.update_target_after = 4;
    config.validate().unwrap();
    config
}

#[test]
fn greedy_episode_builds_the_unique_triangle_tour() {
    // Constant expectations and epsilon 0: the first decision picks the
    // highest weight * expectation, the tour auto-closes, and the one
    // three-node round trip has length 2 + sqrt(2).
    let config = config(1);
    let learner = AnalyticLearner::new(
        |_: &[f64; 2], _, _| 1.0,
        config.problem.n_vars,
        config.agent.gamma,
        config.agent.learning_rate,
    );
    let mut driver = EpisodeDriver::new(&config, learner).unwrap();
    driver.session_mut().policy.set_epsilon(0.0);

    let report = driver.run(&triangle_dataset()).unwrap();

    assert_eq!(report.episodes_run, 1);
    let expected = 2.0 + 2f64.sqrt();
    assert!((report.best_tour_length - expected).abs() < 1e-12);
    // One decision step: the chosen edge plus the auto-closure, recorded as
    // exactly two transitions.
    assert_eq!(driver.session().memory.len(), 2);
}

#[test]
fn analytic_variant_solves_the_triangle() {
    let config = config(SOLVED_WINDOW + 50);
    let learner = AnalyticLearner::new(
        qtsp::agent::cosine_ansatz,
        config.problem.n_vars,
        config.agent.gamma,
        config.agent.learning_rate,
    );
    let mut driver = EpisodeDriver::new(&config, learner).unwrap();
    let report = driver.run(&triangle_dataset()).unwrap();

    // Every triangle tour is optimal, so the first full window converges.
    assert!(report.solved);
    assert_eq!(report.episodes_run, SOLVED_WINDOW);
    assert!((report.final_running_average - 1.0).abs() < 1e-9);
}

#[test]
fn gradient_variant_runs_and_trains() {
    let config = config(60);
    let model = LinearEdgeModel::new(config.problem.n_vars);
    let learner = GradientLearner::with_uniform_optimizers(
        model,
        config.agent.learning_rate,
        config.problem.n_vars,
        config.agent.gamma,
    )
    .unwrap();
    let mut driver = EpisodeDriver::new(&config, learner).unwrap();
    let report = driver.run(&triangle_dataset()).unwrap();

    assert!(report.episodes_run > 0);
    // Training moved the model off its all-ones initialization.
    let params = driver.session().learner.model().parameters();
    assert!(params[0].iter().any(|&w| (w - 1.0).abs() > 1e-9));
}

#[test]
fn saved_run_writes_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(3);
    config.training.save = true;
    config.training.output_dir = dir.path().to_path_buf();
    config.training.run_name = "e2e".into();

    let learner = AnalyticLearner::new(
        qtsp::agent::cosine_ansatz,
        config.problem.n_vars,
        config.agent.gamma,
        config.agent.learning_rate,
    );
    let mut driver = EpisodeDriver::new(&config, learner).unwrap();
    driver.run(&triangle_dataset()).unwrap();

    for suffix in ["meta", "tour_lengths", "optimal_lengths", "params"] {
        let path = dir.path().join(format!("e2e_{suffix}.json"));
        assert!(path.exists(), "missing artifact {}", path.display());
    }
    let lengths: Vec<f64> = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("e2e_tour_lengths.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(lengths.len(), 3);
}
