//! Section Solver Example - Steel I-section and a composite timber beam
//!
//! Set `RUST_LOG=info` to follow the analysis stages.

use anyhow::{Context, Result};
use section_solver::prelude::*;

fn main() -> Result<()> {
    env_logger::init();

    println!("=== Section Solver Example: 200 deep I-section ===\n");

    //   ___________
    //  |____   ____|   d = 200, b = 100
    //       | |        t_f = 10, t_w = 6
    //   ____| |____
    //  |___________|
    //
    let geometry = CompoundGeometry::from(library::i_section(200.0, 100.0, 10.0, 6.0, Material::default())?);
    let mut section = Section::from_geometry(&geometry, &GridTriangulator::default(), &[4.0])
        .context("meshing the I-section")?;
    println!(
        "Mesh: {} nodes, {} elements\n",
        section.mesh().num_nodes(),
        section.mesh().num_elements()
    );

    section.calculate_geometric_properties()?;
    section.calculate_warping_properties()?;
    section.calculate_plastic_properties()?;

    let (cx, cy) = section.get_c()?;
    let (ixx, iyy, ixy) = section.get_ic()?;
    let (zxx, zyy) = section.get_z()?;
    let (sxx, syy) = section.get_s()?;
    let (sf_xx, _) = section.get_sf()?;
    let (x_sc, y_sc) = section.get_sc()?;

    println!("--- Geometric Properties ---");
    println!("A      = {:>12.1} mm^2", section.get_area()?);
    println!("Perim. = {:>12.1} mm", section.get_perimeter()?);
    println!("(cx, cy) = ({cx:.2}, {cy:.2}) mm");
    println!("Ixx    = {ixx:>12.4e} mm^4");
    println!("Iyy    = {iyy:>12.4e} mm^4");
    println!("Ixy    = {ixy:>12.4e} mm^4");
    println!("Zxx    = {:>12.4e} mm^3", zxx.min());
    println!("Zyy    = {:>12.4e} mm^3", zyy.min());

    println!("\n--- Warping Properties ---");
    println!("J      = {:>12.4e} mm^4", section.get_j()?);
    println!("Iw     = {:>12.4e} mm^6", section.get_iw()?);
    println!("(x_sc, y_sc) = ({x_sc:.2}, {y_sc:.2}) mm");

    println!("\n--- Plastic Properties ---");
    println!("Sxx    = {sxx:>12.4e} mm^3");
    println!("Syy    = {syy:>12.4e} mm^3");
    println!("SFxx   = {:>12.3}", sf_xx.plus);

    let dead = LoadCase::dead().with_mxx(50e6).with_vy(100e3);
    let live = LoadCase::live().with_mxx(30e6).with_vy(60e3);
    let combo = LoadCombination::lrfd_dead_live().combine(&[dead, live])?;
    let stress = section.calculate_stress(&combo)?;
    let (sig_min, sig_max) = stress.sig_zz_range();

    println!("\n--- Stresses: {} ---", combo.name);
    println!("sig_zz = {sig_min:.1} to {sig_max:.1} MPa");
    println!("tau    = {:.1} MPa", stress.max_shear());
    println!("sig_vm = {:.1} MPa", stress.max_von_mises());

    println!("\n=== Composite Example: Timber Beam with Steel Flitch Plate ===\n");

    let timber = CompoundGeometry::from(library::rectangular_section(300.0, 150.0, Material::timber())?);
    let plate = library::rectangular_section(250.0, 12.0, Material::steel())?.shift(69.0, 25.0);
    let beam = timber.union(&CompoundGeometry::from(plate), Precedence::LastWins);

    let mut composite = Section::from_geometry(&beam, &GridTriangulator::default(), &[50.0, 10.0])?;
    let frame = composite.calculate_frame_properties()?;
    let steel = Material::steel();
    let (ixx_s, iyy_s, _) = composite.get_eic(&steel)?;

    println!("--- Frame Properties (modulus weighted) ---");
    println!("{}", serde_json::to_string_pretty(&frame)?);
    println!("\nTransformed to steel:");
    println!("A      = {:>12.1} mm^2", composite.get_ea(&steel)?);
    println!("Ixx    = {ixx_s:>12.4e} mm^4");
    println!("Iyy    = {iyy_s:>12.4e} mm^4");

    let (my_xx, _) = composite.get_my()?;
    println!("My_xx  = {:>12.2} kNm", my_xx / 1e6);

    println!("\n=== Analysis Complete ===");
    Ok(())
}
