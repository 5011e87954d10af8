//! CLI entry point: generate a seeded dataset, trace one model, write JSON.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gd_trace::generate::{DataGenConfig, DataGenConfig2D, NeuronDataConfig};
use gd_trace::neuron::{self, NeuronParams};
use gd_trace::{Activation, LossGridConfig, Result, compute_loss_grid, linear, scalar};

#[derive(Parser)]
#[command(name = "gd-trace")]
#[command(about = "Record every step of gradient descent for visualization")]
#[command(version)]
struct Cli {
    /// Where to write the snapshot array
    #[arg(long, short, global = true, default_value = "output/snapshots.json")]
    out: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Common {
    /// Learning rate
    #[arg(long, default_value_t = 0.01)]
    lr: f64,
    /// Number of gradient descent steps
    #[arg(long, default_value_t = 100)]
    steps: usize,
    /// Number of generated points
    #[arg(long, default_value_t = 20)]
    points: usize,
    /// Seed for dataset generation
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// y = w·x on evenly spaced x
    Scalar {
        #[command(flatten)]
        common: Common,
        /// Initial weight
        #[arg(long, default_value_t = 0.0)]
        w_init: f64,
        /// Uniform noise half-width
        #[arg(long, default_value_t = 0.1)]
        noise: f64,
    },
    /// y = w1·x1 + w2·x2, optionally with a loss grid
    Linear {
        #[command(flatten)]
        common: Common,
        #[arg(long, default_value_t = 0.0)]
        w1_init: f64,
        #[arg(long, default_value_t = 0.0)]
        w2_init: f64,
        /// Uniform noise half-width
        #[arg(long, default_value_t = 0.5)]
        noise: f64,
        /// Also write a loss grid of this resolution over [-1, 4]²
        #[arg(long)]
        grid: Option<usize>,
        /// Where to write the loss grid
        #[arg(long, default_value = "output/loss_grid.json")]
        grid_out: PathBuf,
    },
    /// a = act(w·x + b) on two features in [0, 1]
    Neuron {
        #[command(flatten)]
        common: Common,
        /// identity, sigmoid, relu or tanh
        #[arg(long, default_value = "sigmoid", value_parser = parse_activation)]
        activation: Activation,
        /// Initial weights, comma separated
        #[arg(long, value_delimiter = ',', default_value = "0.1,0.1")]
        w: Vec<f64>,
        /// Initial bias
        #[arg(long, default_value_t = 0.0)]
        b: f64,
        /// Gaussian noise standard deviation
        #[arg(long, default_value_t = 0.05)]
        noise: f64,
    },
}

fn parse_activation(s: &str) -> std::result::Result<Activation, String> {
    s.parse().map_err(|e: gd_trace::Error| e.to_string())
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let steps = match cli.command {
        Commands::Scalar {
            common,
            w_init,
            noise,
        } => {
            let data = DataGenConfig {
                num_points: common.points,
                noise_level: noise,
                seed: common.seed,
                ..Default::default()
            }
            .generate()?;
            let cfg = scalar::TrainingConfig {
                w_init,
                lr: common.lr,
                steps: common.steps,
            };
            let run = scalar::train(&data, &cfg)?;
            run.save_json(&cli.out)?;
            run.len()
        }
        Commands::Linear {
            common,
            w1_init,
            w2_init,
            noise,
            grid,
            grid_out,
        } => {
            let data = DataGenConfig2D {
                num_points: common.points,
                noise_level: noise,
                seed: common.seed,
                ..Default::default()
            }
            .generate()?;
            let cfg = linear::TrainingConfig2D {
                w1_init,
                w2_init,
                lr: common.lr,
                steps: common.steps,
            };
            let run = linear::train(&data, &cfg)?;
            run.save_json(&cli.out)?;

            if let Some(resolution) = grid {
                let grid_cfg = LossGridConfig {
                    resolution,
                    ..Default::default()
                };
                compute_loss_grid(&data, &grid_cfg)?.save_json(&grid_out)?;
                println!("Loss grid written to {}", grid_out.display());
            }
            run.len()
        }
        Commands::Neuron {
            common,
            activation,
            w,
            b,
            noise,
        } => {
            let data = NeuronDataConfig {
                num_points: common.points,
                noise_std: noise,
                seed: common.seed,
                ..Default::default()
            }
            .generate()?;
            let cfg = neuron::TrainingConfig {
                learning_rate: common.lr,
                num_steps: common.steps,
                activation,
            };
            let run = neuron::train(&data, &NeuronParams::new(w, b), &cfg)?;
            run.save_json(&cli.out)?;
            run.len()
        }
    };

    println!("Snapshots written to {} ({steps} steps)", cli.out.display());
    Ok(())
}
