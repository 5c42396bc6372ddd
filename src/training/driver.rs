//! Episode driver: runs the tour-construction loop, feeds the replay
//! memory, and schedules training, target syncs, epsilon decay, and
//! persistence.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::agent::{DecisionContext, EpsilonGreedy, Learner};
use crate::config::{AgentConfig, AppConfig, RunConfig};
use crate::dataset::{Dataset, Instance};
use crate::env::TourEnv;
use crate::error::TrainingError;
use crate::memory::{ReplayMemory, Transition};
use crate::persist::RunWriter;
use crate::training::metrics::RatioMetrics;

/// Mutable state of one training run: the session RNG (the single random
/// source for action exploration, instance choice, and replay sampling),
/// the exploration policy, the replay memory, and the learner. No globals.
pub struct TrainingSession<L: Learner> {
    pub rng: StdRng,
    pub policy: EpsilonGreedy,
    pub memory: ReplayMemory,
    pub learner: L,
}

impl<L: Learner> TrainingSession<L> {
    pub fn new(config: &AppConfig, learner: L) -> Self {
        let rng = match config.training.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        TrainingSession {
            rng,
            policy: EpsilonGreedy::new(
                config.agent.epsilon,
                config.agent.epsilon_min,
                config.agent.epsilon_decay,
                config.agent.epsilon_schedule,
            ),
            memory: ReplayMemory::new(config.agent.memory_length),
            learner,
        }
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub episodes_run: usize,
    pub solved: bool,
    pub best_tour_length: f64,
    pub final_running_average: f64,
    pub final_epsilon: f64,
}

/// Orchestrates episodes over a loaded dataset.
pub struct EpisodeDriver<L: Learner> {
    session: TrainingSession<L>,
    agent: AgentConfig,
    run: RunConfig,
    writer: Option<RunWriter>,
}

impl<L: Learner> EpisodeDriver<L> {
    pub fn new(config: &AppConfig, learner: L) -> Result<Self, TrainingError> {
        let writer = if config.training.save {
            Some(RunWriter::new(
                &config.training.output_dir,
                &config.training.run_name,
            )?)
        } else {
            None
        };
        Ok(EpisodeDriver {
            session: TrainingSession::new(config, learner),
            agent: config.agent.clone(),
            run: config.training.clone(),
            writer,
        })
    }

    pub fn session(&self) -> &TrainingSession<L> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut TrainingSession<L> {
        &mut self.session
    }

    /// Run episodes until the budget is exhausted or the environment is
    /// solved (windowed mean approximation ratio at or under threshold).
    pub fn run(&mut self, dataset: &Dataset) -> Result<TrainingReport, TrainingError> {
        assert!(!dataset.is_empty(), "dataset must contain instances");
        let mut metrics = RatioMetrics::new(dataset.len());
        let mut solved = false;

        println!(
            "Starting training: {} episodes over {} instance(s)",
            self.run.episodes,
            dataset.len()
        );
        println!("-------------------------------------------");

        for episode in 0..self.run.episodes {
            let instance_ix = if dataset.len() > 1 {
                self.session.rng.random_range(0..dataset.len())
            } else {
                0
            };
            let instance = &dataset.instances[instance_ix];

            let env = self.play_episode(instance);
            metrics.record_episode(
                instance_ix,
                env.tour(),
                env.current_length(),
                instance.optimal_length,
            );

            let mut loss = None;
            if self.session.memory.len() >= self.agent.batch_size {
                if episode % self.agent.update_after == 0 {
                    let batch = self
                        .session
                        .memory
                        .sample(&mut self.session.rng, self.agent.batch_size);
                    loss = Some(self.session.learner.train_step(&batch));
                }
                if episode % self.agent.update_target_after == 0 {
                    self.session.learner.sync_target();
                }
            }

            self.session.policy.decay();

            if let Some(writer) = &self.writer {
                writer.write_run(
                    metrics.meta(),
                    metrics.tour_lengths(),
                    metrics.optimal_lengths(),
                    &self.session.learner.parameter_snapshot(),
                )?;
            }

            if episode % self.run.log_interval == 0 {
                match loss {
                    Some(loss) => println!(
                        "Episode {} | loss {:.6} | running avg {:.4} | eps {:.3}",
                        episode,
                        loss,
                        metrics.running_average(),
                        self.session.policy.epsilon(),
                    ),
                    None => println!(
                        "Episode {} | running avg {:.4} | eps {:.3}",
                        episode,
                        metrics.running_average(),
                        self.session.policy.epsilon(),
                    ),
                }
            }

            if metrics.solved() {
                metrics.mark_solved();
                println!("Environment solved in {} episodes!", episode + 1);
                if let Some(writer) = &self.writer {
                    writer.write_run(
                        metrics.meta(),
                        metrics.tour_lengths(),
                        metrics.optimal_lengths(),
                        &self.session.learner.parameter_snapshot(),
                    )?;
                }
                solved = true;
                break;
            }
        }

        println!("-------------------------------------------");
        println!(
            "Training done: {} episode(s), best tour length {:.4}",
            metrics.episodes(),
            metrics.meta().best_tour_length
        );

        Ok(TrainingReport {
            episodes_run: metrics.episodes(),
            solved,
            best_tour_length: metrics.meta().best_tour_length,
            final_running_average: metrics.running_average(),
            final_epsilon: self.session.policy.epsilon(),
        })
    }

    /// One episode: encode, select, step, push transitions, until the tour
    /// closes. Returns the finished environment.
    fn play_episode(&mut self, instance: &Instance) -> TourEnv {
        let mut env = TourEnv::reset(instance.nodes.clone());
        let session = &mut self.session;

        while !env.is_done() {
            let state = env.encode_state();
            let action = {
                let ctx = DecisionContext {
                    state: &state,
                    tour: env.tour_edges(),
                    weights: env.weights().as_ref(),
                };
                let learner = &session.learner;
                session
                    .policy
                    .select(&mut session.rng, env.available(), || learner.q_values(&ctx))
            };

            let weights = env.weights().clone();
            let (phase, closure) = env.step(action);
            session.memory.push(Transition {
                state: state.clone(),
                action,
                reward: phase.reward,
                next_state: phase.next_state,
                done: phase.done,
                partial_tour: phase.tour_snapshot,
                edge_weights: weights.clone(),
            });
            // Auto-closure produces a second transition for the same
            // decision state: the closing edges' reward, tour complete.
            if let Some(close) = closure {
                session.memory.push(Transition {
                    state,
                    action,
                    reward: close.reward,
                    next_state: close.next_state,
                    done: true,
                    partial_tour: close.tour_snapshot,
                    edge_weights: weights,
                });
            }
        }

        env
    }
}
