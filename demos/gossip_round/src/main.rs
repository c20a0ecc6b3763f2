//! Simulated ring of peers training a linear model and exchanging top-k
//! parameter updates over an in-memory network.

use anyhow::{bail, Context, Result};
use clap::Parser;
use deltashare_core::{DeltaMap, ParameterSet, SharingConfig, WireFormat};
use deltashare_math::ParamArray;
use deltashare_peer::{broadcast, collect, MemoryNetwork, PartialShare};
use deltashare_train::{
    Dataset, DeltaAccumulator, GradientTrainer, Learner, TopKSelector, TrainingConfig,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{info, warn, Level};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Number of peers in the ring
    #[arg(long, default_value_t = 4)]
    peers: usize,

    /// Communication rounds
    #[arg(long, default_value_t = 10)]
    rounds: u64,

    /// Fraction of parameters shared per round
    #[arg(long, default_value_t = 0.25)]
    alpha: f64,

    /// Local epochs per round
    #[arg(long, default_value_t = 1)]
    epochs: usize,

    #[arg(long, default_value_t = 16)]
    batch_size: usize,

    /// Training samples per peer
    #[arg(long, default_value_t = 256)]
    samples: usize,

    /// Input features of the synthetic regression task
    #[arg(long, default_value_t = 8)]
    features: usize,

    /// JSON file with `sharing` and `training` sections; overrides the flags above
    #[arg(long)]
    config: Option<PathBuf>,

    /// Folder for per-round shared-parameter dumps
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Dump on every rank, not only the first few
    #[arg(long)]
    save_shared: bool,

    /// Send plain JSON arrays instead of nested strings
    #[arg(long)]
    flat_wire: bool,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[arg(long, default_value = "info")]
    log_level: Level,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    sharing: SharingConfig,
    training: TrainingConfig,
}

/// `y = w·x + b` with squared loss and SGD.
struct Linear {
    w: Vec<f32>,
    b: f32,
    grad_w: Vec<f32>,
    grad_b: f32,
    lr: f32,
}

impl Linear {
    fn new(features: usize, rng: &mut StdRng) -> Self {
        Self {
            w: (0..features).map(|_| rng.gen_range(-0.5..0.5)).collect(),
            b: 0.0,
            grad_w: vec![0.0; features],
            grad_b: 0.0,
            lr: 0.05,
        }
    }

    fn params(&self) -> ParameterSet {
        ParameterSet::new()
            .with("linear.weight", ParamArray::from_vec(self.w.clone()))
            .with("linear.bias", ParamArray::scalar(self.b))
    }

    fn load(&mut self, params: &ParameterSet) -> Result<()> {
        let w = params.get("linear.weight").context("missing linear.weight")?;
        let b = params.get("linear.bias").context("missing linear.bias")?;
        self.w.copy_from_slice(w.data());
        self.b = b.data()[0];
        Ok(())
    }

    fn loss(&self, samples: &[Sample]) -> f32 {
        let n = samples.len().max(1) as f32;
        samples
            .iter()
            .map(|(x, y)| (self.predict(x) - y).powi(2))
            .sum::<f32>()
            / n
    }

    fn predict(&self, x: &[f32]) -> f32 {
        self.w.iter().zip(x).map(|(w, x)| w * x).sum::<f32>() + self.b
    }
}

type Sample = (Vec<f32>, f32);

impl Learner for Linear {
    type Batch = Vec<Sample>;

    fn backward(&mut self, batch: &Self::Batch) -> f32 {
        self.grad_w.fill(0.0);
        self.grad_b = 0.0;
        let n = batch.len() as f32;
        let mut loss = 0.0;
        for (x, y) in batch {
            let err = self.predict(x) - y;
            loss += err * err / n;
            for (g, xi) in self.grad_w.iter_mut().zip(x) {
                *g += 2.0 * err * xi / n;
            }
            self.grad_b += 2.0 * err / n;
        }
        loss
    }

    fn gradients(&self) -> DeltaMap {
        ParameterSet::new()
            .with("linear.weight", ParamArray::from_vec(self.grad_w.clone()))
            .with("linear.bias", ParamArray::scalar(self.grad_b))
    }

    fn step(&mut self) {
        for (w, g) in self.w.iter_mut().zip(&self.grad_w) {
            *w -= self.lr * g;
        }
        self.b -= self.lr * self.grad_b;
    }
}

struct Samples(Vec<Sample>);

impl Dataset for Samples {
    type Batch = Vec<Sample>;

    fn batches(&self, batch_size: usize) -> impl Iterator<Item = Self::Batch> + '_ {
        self.0.chunks(batch_size).map(<[Sample]>::to_vec)
    }
}

/// Every peer sees noisy samples of the same ground-truth model.
fn synthetic(truth: &[f32], count: usize, rng: &mut StdRng) -> Samples {
    let samples = (0..count)
        .map(|_| {
            let x: Vec<f32> = (0..truth.len()).map(|_| rng.gen_range(-1.0..1.0)).collect();
            let noise: f32 = rng.gen_range(-0.05..0.05);
            let y = truth.iter().zip(&x).map(|(t, x)| t * x).sum::<f32>() + 0.5 + noise;
            (x, y)
        })
        .collect();
    Samples(samples)
}

struct Node {
    learner: Linear,
    data: Samples,
    share: PartialShare<TopKSelector>,
    accumulator: DeltaAccumulator,
}

fn ring_neighbors(rank: usize, peers: usize) -> Vec<usize> {
    let mut neighbors = vec![(rank + 1) % peers, (rank + peers - 1) % peers];
    neighbors.dedup();
    neighbors
}

fn load_config(args: &Args) -> Result<FileConfig> {
    if let Some(path) = &args.config {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        return serde_json::from_str(&text).context("parse config");
    }

    let mut sharing = SharingConfig::with_alpha(args.alpha).context("invalid --alpha")?;
    sharing.log_dir = args.log_dir.clone();
    sharing.save_shared = args.save_shared;
    if args.flat_wire {
        sharing.wire_format = WireFormat::Flat;
    }
    let training = TrainingConfig {
        epochs_per_round: args.epochs,
        batch_size: args.batch_size,
        ..TrainingConfig::default()
    };
    Ok(FileConfig { sharing, training })
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_target(false)
        .init();

    if args.peers < 2 {
        bail!("need at least two peers, got {}", args.peers);
    }
    let FileConfig { sharing, training } = load_config(&args)?;
    let trainer = GradientTrainer::new(training)?;

    let mut rng = StdRng::seed_from_u64(args.seed);
    let truth: Vec<f32> = (0..args.features).map(|_| rng.gen_range(-2.0..2.0)).collect();
    let holdout = synthetic(&truth, 512, &mut rng);

    let mut nodes = (0..args.peers)
        .map(|rank| {
            let learner = Linear::new(args.features, &mut rng);
            let share = PartialShare::top_k(rank, &learner.params(), &sharing)
                .with_context(|| format!("peer {rank}"))?;
            let accumulator = DeltaAccumulator::with_registry(share.indexer().registry().clone());
            Ok(Node {
                learner,
                data: synthetic(&truth, args.samples, &mut rng),
                share,
                accumulator,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    info!(
        peers = args.peers,
        params = nodes[0].share.indexer().len(),
        alpha = sharing.alpha.alpha(),
        fingerprint = %nodes[0].share.indexer().registry().fingerprint(),
        "Starting"
    );

    let net = MemoryNetwork::new(args.peers);
    let n = args.peers;
    let mut messages = 0usize;

    for round in 0..args.rounds {
        for (rank, node) in nodes.iter_mut().enumerate() {
            trainer.train(&mut node.learner, &node.data, &mut node.accumulator)?;
            let neighbors = ring_neighbors(rank, n);
            let mut endpoint = net.endpoint(rank);
            let params = node.learner.params();
            let sent = broadcast(
                &node.share,
                &mut endpoint,
                &neighbors,
                round,
                &params,
                &node.accumulator,
            );
            match sent {
                Ok(reached) => messages += reached,
                Err(e) => warn!(rank, round, error = %e, "Skipping send"),
            }
        }

        for (rank, node) in nodes.iter_mut().enumerate() {
            let mut endpoint = net.endpoint(rank);
            let report = collect(&node.share, &mut endpoint, &node.learner.params())?;
            for dropped in &report.dropped {
                warn!(rank, sender = dropped.sender, error = %dropped.error, "Dropped update");
            }
            node.learner.load(&report.params)?;
        }

        let mean_loss =
            nodes.iter().map(|node| node.learner.loss(&holdout.0)).sum::<f32>() / nodes.len() as f32;
        info!(round, loss = mean_loss, "Round finished");
    }

    info!(messages, "Done");
    Ok(())
}
