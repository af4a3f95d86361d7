#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use criterion::{Criterion, Throughput};
use cube_field::mesh::{GridAxis, GridMesh};
use cube_field::molecule::Molecule;
use glam::DVec3;
use rand::RngCore;

pub const SAMPLE_SIZE: usize = 20;
pub const WARM_UP: Duration = Duration::from_secs(1);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(2);

pub const BENCH_CHARGE_TYPE: &str = "bench";

pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

pub fn elements_throughput(elements: usize) -> Throughput {
    Throughput::Elements(elements.max(1) as u64)
}

fn rand01(rng: &mut impl RngCore) -> f64 {
    (rng.next_u64() >> 11) as f64 / (1u64 << 53) as f64
}

/// Cubic mesh of `n` points per axis centred on the origin.
pub fn cubic_mesh(n: usize, spacing: f64) -> Arc<GridMesh> {
    let half = (n as f64 - 1.0) * spacing * 0.5;
    Arc::new(GridMesh::new(
        DVec3::splat(-half),
        [
            GridAxis::new([spacing, 0.0, 0.0], n),
            GridAxis::new([0.0, spacing, 0.0], n),
            GridAxis::new([0.0, 0.0, spacing], n),
        ],
    ))
}

/// Carbon atoms scattered in a box of half-width `half_extent`, each with a random charge.
pub fn random_molecule(rng: &mut impl RngCore, atoms: usize, half_extent: f64) -> Molecule {
    let mut molecule = Molecule::with_capacity(atoms);
    for _ in 0..atoms {
        let position = DVec3::new(
            (rand01(rng) * 2.0 - 1.0) * half_extent,
            (rand01(rng) * 2.0 - 1.0) * half_extent,
            (rand01(rng) * 2.0 - 1.0) * half_extent,
        );
        molecule
            .push(6, position)
            .set_charge(BENCH_CHARGE_TYPE, rand01(rng) - 0.5);
    }
    molecule
}
