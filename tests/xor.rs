use ferrite_evo::{Batch, BatchMode, Initializer, Matrix, Network, NetworkBuilder, Rectifier};

fn xor() -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
    (
        vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]],
        vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]],
    )
}

fn assert_close(a: &Matrix, b: &Matrix) {
    assert!(a.same_shape(b), "{a} vs {b}");
    for (x, y) in a.data.iter().flatten().zip(b.data.iter().flatten()) {
        assert!((x - y).abs() < 1e-12, "{a}\nvs\n{b}");
    }
}

/// Per-example deltas of `network` for every XOR example, without applying them.
fn per_example_deltas(network: &Network) -> Vec<Batch> {
    let (xs, ys) = xor();
    let mut scratch = network.copy();
    xs.iter().zip(&ys)
        .map(|(x, y)| {
            let mut single = Batch::new(BatchMode::Sum);
            scratch.fit_into(x, y, &mut single).unwrap();
            single
        })
        .collect()
}

fn summed(deltas: &[Batch], slot: usize, weight: bool) -> Matrix {
    let mut acc = if weight { deltas[0].weight(slot) } else { deltas[0].bias(slot) }.unwrap();
    for d in &deltas[1..] {
        let next = if weight { d.weight(slot) } else { d.bias(slot) }.unwrap();
        acc.add_assign_checked(&next).unwrap();
    }
    acc
}

fn check_batch_update(mode: BatchMode) {
    let network = NetworkBuilder::new(&[2, 3, 1])
        .learning_rate(0.5)
        .batch_mode(mode)
        .seed(17)
        .build()
        .unwrap();
    let deltas = per_example_deltas(&network);

    let (xs, ys) = xor();
    let mut trained = network.copy();
    let mut batch = trained.new_batch();
    for (x, y) in xs.iter().zip(&ys) {
        trained.fit_into(x, y, &mut batch).unwrap();
    }
    // Accumulating alone never touches the weights.
    for (a, b) in trained.layers().iter().zip(network.layers()) {
        assert_eq!(a.weight, b.weight);
    }
    trained.apply_batch(batch).unwrap();

    let last = network.layers().len() - 1;
    for slot in 0..network.layers().len() {
        let divisor = match mode {
            BatchMode::Mean => 4.0,
            BatchMode::Sum => 1.0,
        };
        let w = summed(&deltas, slot, true).divide_scalar(divisor).unwrap();
        let b = summed(&deltas, slot, false).divide_scalar(divisor).unwrap();

        let original = &network.layers()[last - slot];
        let updated = &trained.layers()[last - slot];
        assert_close(&updated.weight, &original.weight.subtract(&w).unwrap());
        assert_close(&updated.bias, &original.bias.subtract(&b).unwrap());
    }
}

#[test]
fn mean_batch_applies_the_average_delta() {
    check_batch_update(BatchMode::Mean);
}

#[test]
fn sum_batch_applies_the_total_delta() {
    check_batch_update(BatchMode::Sum);
}

#[test]
fn single_fit_is_a_batch_of_one() {
    let mut a = NetworkBuilder::new(&[2, 4, 1]).learning_rate(0.3).seed(8).build().unwrap();
    let mut b = a.copy();

    a.fit(&[1.0, 0.0], &[1.0]).unwrap();
    let mut batch = b.new_batch();
    b.fit_into(&[1.0, 0.0], &[1.0], &mut batch).unwrap();
    b.apply_batch(batch).unwrap();

    for (la, lb) in a.layers().iter().zip(b.layers()) {
        assert_eq!(la.weight, lb.weight);
        assert_eq!(la.bias, lb.bias);
    }
    assert_eq!(a.iteration_count(), 1);
}

/// Trains the `[2, 15, 15, 1]` sigmoid network at learning rate 0.8 and batch
/// size 16. One `fit_all(…, 1000, 16)` call is only 62 full updates and does not
/// reach the 0.3 bound; 40 such calls (40 000 epochs) do.
#[test]
fn xor_converges_with_two_hidden_layers() {
    const ROUNDS: usize = 40;
    let (xs, ys) = xor();
    let mut network = NetworkBuilder::new(&[2, 15, 15, 1])
        .initializer(Initializer::Random)
        .rectifier(Rectifier::Sigmoid)
        .learning_rate(0.8)
        .batch_mode(BatchMode::Mean)
        .seed(1)
        .build()
        .unwrap();

    let mut costs = Vec::with_capacity(ROUNDS);
    for _ in 0..ROUNDS {
        costs.push(network.fit_all(&xs, &ys, 1000, 16).unwrap());
    }
    assert_eq!(network.iteration_count(), (ROUNDS * 1000) as u64);
    assert!(costs[ROUNDS - 1] < costs[0], "{costs:?}");

    for (x, y) in xs.iter().zip(&ys) {
        let out = network.predict(x).unwrap()[0];
        assert!((out - y[0]).abs() < 0.3, "{x:?} -> {out}, expected {}", y[0]);
    }
}
