use anyhow::Result;
use log::LevelFilter;

use pseudo_labeller::config::{ModelConfig, PseudoLabelConfig};
use pseudo_labeller::models::{build_model, Model};
use pseudo_labeller::{Dataset, PseudoLabeller};

/// Two clusters along a line; only a handful of rows are labelled.
fn two_clusters(offsets: &[f32], with_target: bool) -> Result<Dataset> {
    let rows = offsets
        .iter()
        .flat_map(|&o| [(o, 0.0f32), (10.0 + o, 1.0f32)])
        .map(|(x, label)| if with_target { vec![x, label] } else { vec![x] })
        .collect();
    let columns: &[&str] = if with_target { &["x", "class"] } else { &["x"] };
    Ok(Dataset::from_rows(columns.iter().copied(), rows)?)
}

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(
            env_logger::Env::default().filter_or("PSEUDO_LABELLER_LOG", "pseudo_labeller=debug"),
        )
        .init();

    let labelled = two_clusters(&[0.0, 0.5], true)?;
    let unlabelled = two_clusters(&[-1.0, -0.5, 0.25, 0.75, 1.0, 1.5], false)?;

    let config = match std::env::args().nth(1) {
        Some(path) => PseudoLabelConfig::from_json_file(path)?,
        None => PseudoLabelConfig::new(["x"], ["class"]).with_sample_rate(0.5),
    };
    let mut model = build_model(ModelConfig::new(0.0, "knn".parse().map_err(anyhow::Error::msg)?));

    PseudoLabeller::new(&mut model, &labelled, &unlabelled, config)?.fit()?;

    let probe = Dataset::from_rows(["x"], vec![vec![0.1], vec![9.9]])?;
    let predictions = model.predict(&probe)?;
    println!("class(0.1) = {:.2}, class(9.9) = {:.2}", predictions[(0, 0)], predictions[(1, 0)]);
    Ok(())
}
