use anyhow::{Context, Result};
use log::LevelFilter;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use pseudo_labeller::config::{ModelConfig, ModelType, PseudoLabelConfig};
use pseudo_labeller::io::{read_dataset_csv, write_dataset_csv};
use pseudo_labeller::models::{GbdtModel, Model};
use pseudo_labeller::{Dataset, PseudoLabeller};

/// y = 3 * x0 - x1 + noise
fn synthetic(n: usize, seed: u64, with_target: bool) -> Result<Dataset> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let rows = (0..n)
        .map(|_| {
            let x0: f32 = rng.gen_range(0.0..10.0);
            let x1: f32 = rng.gen_range(-5.0..5.0);
            let noise: f32 = rng.gen_range(-0.5..0.5);
            let mut row = vec![x0, x1];
            if with_target {
                row.push(3.0 * x0 - x1 + noise);
            }
            row
        })
        .collect();
    let columns: &[&str] = if with_target { &["x0", "x1", "y"] } else { &["x0", "x1"] };
    Ok(Dataset::from_rows(columns.iter().copied(), rows)?)
}

fn mean_abs_error(model: &dyn Model, data: &Dataset) -> Result<f32> {
    let predictions = model.predict(&data.select(&["x0", "x1"])?)?;
    let truth = data.column("y")?;
    let total: f32 = truth
        .iter()
        .enumerate()
        .map(|(i, y)| (predictions[(i, 0)] - y).abs())
        .sum();
    Ok(total / truth.len() as f32)
}

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(
            env_logger::Env::default().filter_or("PSEUDO_LABELLER_LOG", "pseudo_labeller=info"),
        )
        .init();

    // Usage: gbdt_pseudo_labelling [labelled.csv unlabelled.csv [combined_out.csv]]
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (labelled, unlabelled) = match args.as_slice() {
        [labelled, unlabelled, ..] => (
            read_dataset_csv(labelled).context("Failed to load labelled data")?,
            read_dataset_csv(unlabelled).context("Failed to load unlabelled data")?,
        ),
        _ => (synthetic(100, 1, true)?, synthetic(500, 2, false)?),
    };
    labelled.log_summary("Labelled data");
    unlabelled.log_summary("Unlabelled data");

    let holdout = synthetic(200, 3, true)?;
    let mut model = GbdtModel::new(ModelConfig::new(
        0.1,
        ModelType::GBDT {
            max_depth: 4,
            num_boost_round: 50,
            debug: false,
            training_optimization_level: 2,
            loss_type: "SquaredError".to_string(),
        },
    ));

    let config = PseudoLabelConfig::new(["x0", "x1"], ["y"]).with_sample_rate(0.4);
    let mut labeller = PseudoLabeller::new(&mut model, &labelled, &unlabelled, config)?;
    for (key, value) in labeller.get_params().to_map() {
        println!("{:>28}: {}", key, value);
    }

    if let Some(out) = args.get(2) {
        let combined = labeller.create_pseudo_labelled_set()?;
        write_dataset_csv(out, &combined)?;
        println!("Wrote {} training rows to {}", combined.len(), out);
    }
    labeller.fit()?;

    println!(
        "Hold-out MAE after pseudo-labelling: {:.3}",
        mean_abs_error(&model, &holdout)?
    );
    Ok(())
}
