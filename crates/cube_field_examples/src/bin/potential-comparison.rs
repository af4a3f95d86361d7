use std::sync::Arc;

use cube_field::prelude::*;
use cube_field_examples::init_tracing;
use glam::DVec3;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut molecule = water();
    let mesh = Arc::new(GridMesh::new(
        DVec3::splat(-3.05),
        [
            GridAxis::new([0.2, 0.0, 0.0], 31),
            GridAxis::new([0.0, 0.2, 0.0], 31),
            GridAxis::new([0.0, 0.0, 0.2], 31),
        ],
    ));

    let evaluator = FieldEvaluator::new(&molecule);
    let reference = evaluator
        .point_charge_potential(&mesh, "reference")?
        .with_kind(Some(FieldKind::ElectrostaticPotential));

    // Charges rounded to two decimals, rescaled to keep the molecule neutral.
    let rounded = |_: &Field<f64>, molecule: &Molecule| -> Result<Vec<f64>> {
        let mut charges: Vec<f64> = molecule
            .charges("reference")?
            .iter()
            .map(|q| (q * 100.0).round() / 100.0)
            .collect();
        let excess = charges.iter().sum::<f64>() / charges.len() as f64;
        for q in &mut charges {
            *q -= excess;
        }
        Ok(charges)
    };
    molecule.fit_charges(&rounded, &reference, "rounded")?;

    let evaluator = FieldEvaluator::new(&molecule);
    let reproduced = evaluator.point_charge_potential(&mesh, "rounded")?;

    let rms = reproduced.rms_difference(&reference)?;
    println!("RMS of reference potential: {:.6e}", reference.rms());
    println!("RMS difference (rounded charges): {:.6e}", rms);
    println!("Relative RMS: {:.4}", rms / reference.rms());

    for charge_type in ["reference", "rounded"] {
        let dipole = molecule.dipole_moment(charge_type)?;
        println!(
            "{:>9}: total charge {:.4}, dipole ({:.4}, {:.4}, {:.4}) |{:.4}|",
            charge_type,
            molecule.total_charge(charge_type)?,
            dipole.x,
            dipole.y,
            dipole.z,
            dipole.magnitude()
        );
    }
    for atom in &molecule {
        println!("{}", atom.display_with_charge("rounded")?);
    }

    let outputs = [
        ("potential-comparison-esp.cube", &reference, "reference"),
        ("potential-comparison-rep_esp.cube", &reproduced, "rounded"),
    ];
    // Existing outputs are never overwritten; remove them to rerun.
    for (path, field, charge_type) in outputs {
        let options = CubeWriteOptions::new().with_charge_type(charge_type);
        cube_field::cube::write_path(path, field, &molecule, &options)?;
    }

    Ok(())
}

fn water() -> Molecule {
    let mut molecule = Molecule::new();
    molecule
        .push(8, [0.0, 0.0, 0.119262])
        .set_charge("reference", -0.834);
    molecule
        .push(1, [0.0, 0.763239, -0.477047])
        .set_charge("reference", 0.417);
    molecule
        .push(1, [0.0, -0.763239, -0.477047])
        .set_charge("reference", 0.417);
    molecule
}
