// Trains a small network on XOR and prints its predictions.
//
//   cargo run -- [config.json]
//
// The optional argument is a `NetworkConfig` JSON file; set RUST_LOG=debug for
// per-batch logging.
use anyhow::{Context, Result};
use ferrite_evo::{NetworkBuilder, NetworkConfig, Rectifier};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ferrite_evo=info".parse()?),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => NetworkConfig::load_json(&path)
            .with_context(|| format!("failed to load config from {path}"))?,
        None => NetworkConfig {
            rectifier: Rectifier::Sigmoid,
            learning_rate: 0.8,
            ..NetworkConfig::default()
        },
    };

    let mut network = NetworkBuilder::new(&[2, 15, 15, 1])
        .config(config)
        .build()?;

    let inputs = vec![
        vec![0.0, 0.0],
        vec![1.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 1.0],
    ];
    let expected_outputs = vec![
        vec![0.0],
        vec![1.0],
        vec![1.0],
        vec![0.0],
    ];

    for round in 0..10 {
        let cost = network.fit_all(&inputs, &expected_outputs, 2000, 4)?;
        println!("Round {round}: mean cost = {cost:.6}");
    }

    for input in &inputs {
        println!("Input: {:?} -> Output: {:.4}", input, network.predict(input)?[0]);
    }
    Ok(())
}
