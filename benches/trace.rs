use criterion::{Criterion, black_box, criterion_group, criterion_main};

use gd_trace::generate::{DataGenConfig2D, NeuronDataConfig};
use gd_trace::neuron::{self, NeuronParams};
use gd_trace::{Activation, LossGridConfig, compute_loss_grid, linear};

fn neuron_trace_bench(c: &mut Criterion) {
    let data = NeuronDataConfig {
        num_points: 64,
        ..Default::default()
    }
    .generate()
    .unwrap();
    let init = NeuronParams::new(vec![0.1, 0.1], 0.0);
    let cfg = neuron::TrainingConfig {
        learning_rate: 0.1,
        num_steps: 100,
        activation: Activation::Sigmoid,
    };

    c.bench_function("neuron_sigmoid_64pts_100steps", |b| {
        b.iter(|| {
            let run = neuron::train(black_box(&data), black_box(&init), &cfg).unwrap();
            black_box(run);
        })
    });
}

fn linear_trace_bench(c: &mut Criterion) {
    let data = DataGenConfig2D::default().generate().unwrap();
    let cfg = linear::TrainingConfig2D {
        lr: 0.01,
        steps: 100,
        ..Default::default()
    };

    c.bench_function("linear_20pts_100steps", |b| {
        b.iter(|| {
            let run = linear::train(black_box(&data), &cfg).unwrap();
            black_box(run);
        })
    });
}

fn loss_grid_bench(c: &mut Criterion) {
    let data = DataGenConfig2D::default().generate().unwrap();
    let cfg = LossGridConfig::default();

    c.bench_function("loss_grid_50x50", |b| {
        b.iter(|| {
            let grid = compute_loss_grid(black_box(&data), &cfg).unwrap();
            black_box(grid);
        })
    });
}

criterion_group!(benches, neuron_trace_bench, linear_trace_bench, loss_grid_bench);
criterion_main!(benches);
