use serde_json::json;
use std::sync::mpsc;

use ferrite_evo::{
    CostFunction, Error, Network, NetworkBuilder, NetworkConfig, NetworkEvent, Optimizer,
    Rectifier, Regularizer,
};

fn small(seed: u64) -> Network {
    NetworkBuilder::new(&[2, 3, 1]).learning_rate(0.5).seed(seed).build().unwrap()
}

#[test]
fn predict_is_deterministic_and_caches_every_layer() {
    let mut net = small(1);
    let first = net.predict(&[0.3, -0.7]).unwrap();
    let cached = net.node_values().to_vec();
    let second = net.predict(&[0.3, -0.7]).unwrap();

    assert_eq!(first, second);
    assert_eq!(cached, net.node_values());
    assert_eq!(cached.len(), net.configuration().len());
    assert_eq!(cached[0], vec![0.3, -0.7]);
    assert_eq!(cached[1].len(), 3);
    assert_eq!(cached[2], first);
}

#[test]
fn predict_rejects_wrong_input_width() {
    let mut net = small(2);
    assert!(matches!(net.predict(&[1.0]), Err(Error::ShapeMismatch(_))));
    assert!(net.node_values().is_empty());
}

#[test]
fn fit_checks_shapes_before_mutating() {
    let mut net = small(3);
    let before = net.copy();
    assert!(matches!(net.fit(&[1.0, 0.0], &[1.0, 0.0]), Err(Error::ShapeMismatch(_))));
    assert!(matches!(net.fit(&[1.0], &[1.0]), Err(Error::ShapeMismatch(_))));
    assert_eq!(net.iteration_count(), 0);
    assert!(net.log().is_empty());
    for (a, b) in before.layers().iter().zip(net.layers()) {
        assert_eq!(a.weight, b.weight);
        assert_eq!(a.bias, b.bias);
    }
}

#[test]
fn fit_reduces_cost_on_a_single_example() {
    let mut net = small(4);
    net.fit(&[1.0, 0.0], &[1.0]).unwrap();
    let first = net.log().latest().unwrap().cost;
    for _ in 0..50 {
        net.fit(&[1.0, 0.0], &[1.0]).unwrap();
    }
    let last = net.log().latest().unwrap().cost;
    assert!(last < first, "{last} >= {first}");
    assert_eq!(net.log().latest().unwrap().iteration, 50);
}

#[test]
fn dropout_rescales_inference_output() {
    let mut net = NetworkBuilder::new(&[2, 3, 1])
        .dropout_factor(0.5)
        .seed(5)
        .build()
        .unwrap();
    let out = net.predict(&[1.0, 1.0]).unwrap();
    let activated = net.node_values()[2][0];
    assert!((out[0] - activated / 0.5).abs() < 1e-12);

    // Training with dropout still produces finite output and advances.
    let trained = net.fit(&[1.0, 1.0], &[0.0]).unwrap();
    assert!(trained[0].is_finite());
    assert_eq!(net.iteration_count(), 1);
}

#[test]
fn regularizer_adds_to_logged_cost() {
    let mut plain = small(6);
    let mut penalized = NetworkBuilder::new(&[2, 3, 1])
        .learning_rate(0.5)
        .regularizer(Regularizer::L2, 0.5)
        .seed(6)
        .build()
        .unwrap();

    plain.fit(&[1.0, 1.0], &[0.0]).unwrap();
    penalized.fit(&[1.0, 1.0], &[0.0]).unwrap();
    let p = plain.log().latest().unwrap().cost;
    let r = penalized.log().latest().unwrap().cost;
    assert!(r > p);
}

#[test]
fn learning_rate_decays_and_resets() {
    let mut net = NetworkBuilder::new(&[2, 2, 1])
        .learning_rate(0.8)
        .learning_rate_decay(Optimizer::Sgd, 0.5)
        .mutation_rate(0.4)
        .mutation_rate_decay(Optimizer::Exponential, 0.1)
        .seed(7)
        .build()
        .unwrap();

    let mut previous = net.learning_rate();
    for _ in 0..10 {
        net.fit(&[0.0, 1.0], &[1.0]).unwrap();
        assert!(net.learning_rate() <= previous);
        previous = net.learning_rate();
    }
    assert!((net.learning_rate() - 0.8 / (1.0 + 0.5 * 10.0)).abs() < 1e-12);
    assert!(net.mutation_rate() < 0.4);

    net.reset_learning_rate();
    assert_eq!(net.learning_rate(), 0.8);
    assert!(net.mutation_rate() < 0.4);
    net.reset_mutation_rate();
    assert_eq!(net.mutation_rate(), 0.4);
    assert_eq!(net.iteration_count(), 10);

    net.decrease_rate();
    assert!(net.learning_rate() < 0.8);
    assert_eq!(net.iteration_count(), 11);
}

#[test]
fn events_report_predictions_and_steps() {
    let mut net = small(8);
    let (tx, rx) = mpsc::channel();
    net.set_event_sender(Some(tx));

    net.predict(&[0.0, 1.0]).unwrap();
    net.fit(&[0.0, 1.0], &[1.0]).unwrap();

    assert_eq!(rx.try_recv().unwrap(), NetworkEvent::Predicted);
    match rx.try_recv().unwrap() {
        NetworkEvent::Fitted(stats) => assert_eq!(stats.iteration, 0),
        other => panic!("unexpected event {other:?}"),
    }

    // Copies are detached from the channel.
    let mut copy = net.copy();
    copy.predict(&[0.0, 1.0]).unwrap();
    assert!(rx.try_recv().is_err());

    drop(rx);
    assert!(net.predict(&[0.0, 1.0]).is_ok());
}

#[test]
fn softmax_output_sums_to_one() {
    let mut net = NetworkBuilder::new(&[3, 5, 4])
        .rectifier(Rectifier::Tanh)
        .last_rectifier(Rectifier::Softmax)
        .cost_function(CostFunction::CrossEntropy)
        .learning_rate(0.1)
        .seed(9)
        .build()
        .unwrap();
    let out = net.predict(&[0.2, 0.4, -0.1]).unwrap();
    assert!((out.iter().sum::<f64>() - 1.0).abs() < 1e-9);

    net.fit(&[0.2, 0.4, -0.1], &[0.0, 0.0, 1.0, 0.0]).unwrap();
    let stats = net.log().latest().unwrap();
    assert!(stats.cost.is_finite());
    assert_eq!(net.log().confusion().unwrap().classes(), 4);
}

#[test]
fn json_round_trip_preserves_predictions() {
    let mut net = NetworkBuilder::new(&[2, 4, 2])
        .rectifier(Rectifier::LeakyReLU { alpha: 0.01 })
        .last_rectifier(Rectifier::Sigmoid)
        .log_capacity(5)
        .seed(10)
        .build()
        .unwrap();
    net.fit(&[1.0, 0.5], &[0.0, 1.0]).unwrap();

    let path = std::env::temp_dir().join(format!("ferrite-evo-{}.json", std::process::id()));
    let path = path.to_str().unwrap();
    net.save_json(path).unwrap();
    let mut loaded = Network::load_json(path).unwrap();
    std::fs::remove_file(path).unwrap();

    assert_eq!(loaded.configuration(), net.configuration());
    assert_eq!(loaded.rectifiers(), net.rectifiers());
    assert_eq!(loaded.iteration_count(), 1);
    assert!((loaded.learning_rate() - net.learning_rate()).abs() < 1e-15);
    assert_eq!(loaded.log().capacity(), 5);
    let restored = loaded.predict(&[0.3, 0.3]).unwrap();
    let original = net.predict(&[0.3, 0.3]).unwrap();
    for (a, b) in restored.iter().zip(&original) {
        assert!((a - b).abs() < 1e-12);
    }
}

#[test]
fn config_round_trips_through_json() {
    let mut config = NetworkConfig {
        learning_rate: 0.25,
        cost_function: CostFunction::Huber,
        ..NetworkConfig::default()
    };
    config.layer_rectifiers.insert(0, Rectifier::Elu { alpha: 1.0 });

    let path = std::env::temp_dir().join(format!("ferrite-evo-config-{}.json", std::process::id()));
    let path = path.to_str().unwrap();
    config.save_json(path).unwrap();
    let loaded = NetworkConfig::load_json(path).unwrap();
    std::fs::remove_file(path).unwrap();

    assert_eq!(loaded, config);
}

fn reload_edited(name: &str, edit: impl FnOnce(&mut serde_json::Value)) -> std::io::Result<Network> {
    let net = small(12);
    let path = std::env::temp_dir().join(format!("ferrite-evo-{name}-{}.json", std::process::id()));
    let path = path.to_str().unwrap().to_owned();
    net.save_json(&path).unwrap();

    let mut snapshot: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    edit(&mut snapshot);
    std::fs::write(&path, snapshot.to_string()).unwrap();

    let loaded = Network::load_json(&path);
    std::fs::remove_file(&path).unwrap();
    loaded
}

#[test]
fn untouched_snapshot_loads() {
    let mut net = reload_edited("untouched", |_| {}).unwrap();
    assert!(net.predict(&[0.0, 1.0]).is_ok());
}

#[test]
fn snapshot_with_broken_invariants_is_rejected() {
    let cases: [(&str, fn(&mut serde_json::Value)); 5] = [
        ("empty", |s| {
            s["configuration"] = json!([]);
            s["layers"] = json!([]);
        }),
        ("rows", |s| s["layers"][0]["weight"]["rows"] = json!(5)),
        ("ragged", |s| {
            s["layers"][1]["weight"]["data"][0].as_array_mut().unwrap().push(json!(0.0));
        }),
        ("layer-count", |s| s["configuration"] = json!([2, 3, 3, 1])),
        ("rate", |s| s["learning_rate"]["current"] = json!(7.0)),
    ];
    for (name, edit) in cases {
        let err = reload_edited(name, edit).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData, "{name}: {err}");
    }
}
