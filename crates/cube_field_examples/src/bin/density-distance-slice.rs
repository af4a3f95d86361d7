use std::sync::Arc;

use cube_field::prelude::*;
use cube_field_examples::{init_tracing, render_slice_to_png, SliceRenderConfig};
use glam::DVec3;
use rand::rngs::StdRng;
use rand::{Rng as RngCore, SeedableRng};

const ATOM_COUNT: usize = 6;
const BOX_HALF_EXTENT: f64 = 4.0;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut rng = StdRng::seed_from_u64(42);
    let mut molecule = Molecule::new();
    for _ in 0..ATOM_COUNT {
        let position = DVec3::new(
            rand_range(&mut rng, -2.5, 2.5),
            rand_range(&mut rng, -2.5, 2.5),
            rand_range(&mut rng, -1.0, 1.0),
        );
        molecule.push(6, position);
    }

    // Anisotropic spacing: finer in-plane than across slices.
    let mesh = Arc::new(GridMesh::new(
        DVec3::splat(-BOX_HALF_EXTENT),
        [
            GridAxis::new([0.1, 0.0, 0.0], 81),
            GridAxis::new([0.0, 0.1, 0.0], 81),
            GridAxis::new([0.0, 0.0, 0.25], 33),
        ],
    ));

    let density: Vec<f64> = mesh
        .points()
        .map(|point| {
            molecule
                .iter()
                .map(|atom| (-2.0 * point.distance(atom.coords())).exp())
                .sum::<f64>()
        })
        .collect();
    let density = Field::new(mesh.clone(), density, Some(FieldKind::ElectronDensity))?;

    let config = IsosurfaceConfig::default().with_isovalue(0.05);
    let distance = config.distance_transform(&density)?;
    if let Some((min, max)) = distance.finite_range() {
        println!("Distance to isosurface: {:.3} .. {:.3}", min, max);
    }

    let k = mesh.shape()[2] / 2;
    render_slice_to_png(
        &density,
        k,
        &SliceRenderConfig::new(6),
        "density-distance-slice-density.png",
    )?;
    render_slice_to_png(
        &distance,
        k,
        &SliceRenderConfig::new(6).with_colors([250, 250, 250], [30, 60, 140]),
        "density-distance-slice-distance.png",
    )?;

    Ok(())
}

fn rand_range(rng: &mut impl RngCore, min: f64, max: f64) -> f64 {
    let unit = (rng.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
    min + (max - min) * unit
}
