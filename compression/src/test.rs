#![cfg(test)]

use ndarray::{Array, IxDyn};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{FlatView, ParameterSet, ResidualStore, Tensor, TopKSelector};

const SHAPES: [&[usize]; 4] = [&[8, 4], &[4], &[3, 2, 2], &[1]];

fn random_grads(rng: &mut StdRng) -> Vec<Tensor> {
    SHAPES
        .iter()
        .map(|&shape| Array::from_shape_simple_fn(IxDyn(shape), || rng.random_range(-1.0..1.0)))
        .collect()
}

fn flat(tensors: &[Tensor]) -> Vec<f32> {
    FlatView::new(tensors).iter().collect()
}

#[test]
fn mass_is_conserved_on_every_step() {
    let mut rng = StdRng::seed_from_u64(7);
    let params = ParameterSet::zeros(SHAPES);
    let selector = TopKSelector::for_params(0.1, &params).unwrap();
    let mut residual = ResidualStore::zeros_like(&params);

    for _ in 0..50 {
        let grads = random_grads(&mut rng);
        let before: Vec<f32> = flat(residual.tensors())
            .iter()
            .zip(flat(&grads))
            .map(|(r, g)| r + g)
            .collect();

        let (update, stats) = selector.select(&mut residual, &grads).unwrap();

        let after = flat(residual.tensors());
        let sent = flat(update.tensors());
        for i in 0..before.len() {
            assert_eq!(before[i], after[i] + sent[i], "coordinate {i}");
            // A coordinate is either fully sent or fully kept.
            assert!(after[i] == 0.0 || sent[i] == 0.0, "coordinate {i}");
        }

        assert!(stats.selected >= selector.budget().k());
        assert!(update.nnz() >= selector.budget().k());
    }
}

#[test]
fn non_selected_coordinates_keep_their_accumulated_value() {
    let mut rng = StdRng::seed_from_u64(11);
    let params = ParameterSet::zeros(SHAPES);
    let selector = TopKSelector::for_params(0.05, &params).unwrap();
    let mut residual = ResidualStore::zeros_like(&params);

    for _ in 0..20 {
        let grads = random_grads(&mut rng);
        let before = flat(residual.tensors());
        let (update, stats) = selector.select(&mut residual, &grads).unwrap();
        let threshold = stats.threshold.unwrap();

        let g = flat(&grads);
        let after = flat(residual.tensors());
        let sent = flat(update.tensors());

        for i in 0..after.len() {
            let accumulated = before[i] + g[i];
            if accumulated.abs() < threshold {
                assert_eq!(after[i], accumulated, "coordinate {i}");
                assert_eq!(sent[i], 0.0, "coordinate {i}");
            } else {
                assert_eq!(after[i], 0.0, "coordinate {i}");
                assert_eq!(sent[i], accumulated, "coordinate {i}");
            }
        }
    }
}

#[test]
fn a_starved_coordinate_grows_until_it_is_sent() {
    // Coordinate 0 gets a small, steady push, coordinate 1 a larger one that
    // wins every step until coordinate 0 catches up.
    let params = ParameterSet::zeros([[1_usize]; 4]);
    let selector = TopKSelector::for_params(0.25, &params).unwrap();
    let mut residual = ResidualStore::zeros_like(&params);

    let mut last = 0.0_f32;
    let mut step = 0;
    loop {
        step += 1;
        let grads: Vec<Tensor> = [0.3_f32, 1.0, 0.0, 0.0]
            .iter()
            .map(|&x| Array::from_elem(IxDyn(&[1]), x))
            .collect();

        let (update, _) = selector.select(&mut residual, &grads).unwrap();
        let sent = flat(update.tensors());

        if sent[0] != 0.0 {
            assert!(sent[0] >= 1.0);
            assert_eq!(step, 4);
            break;
        }

        let now = flat(residual.tensors())[0];
        assert!(now >= last, "step {step}: {now} < {last}");
        last = now;

        assert!(step < 100, "coordinate 0 was never sent");
    }
}
