mod common;

use approx::assert_relative_eq;
use section_solver::prelude::*;

fn rectangle() -> Section {
    let mut section = common::analysed(&common::rectangle(100.0, 50.0), &[10.0]);
    section.calculate_warping_properties().unwrap();
    section
}

#[test]
fn axial_stress_is_uniform() {
    let section = rectangle();
    let result = section.calculate_stress(&LoadCase::new("N").with_n(10e3)).unwrap();
    let (lo, hi) = result.sig_zz_range();
    assert_relative_eq!(lo, 10e3 / 5000.0, max_relative = 1e-9);
    assert_relative_eq!(hi, 10e3 / 5000.0, max_relative = 1e-9);
}

#[test]
fn bending_stress_is_linear_in_depth() {
    let section = rectangle();
    let (ixx, _, _) = section.get_ic().unwrap();
    let m = 5e6;
    let result = section.calculate_stress(&LoadCase::new("M").with_mxx(m)).unwrap();

    let (lo, hi) = result.sig_zz_range();
    assert_relative_eq!(hi, m * 50.0 / ixx, max_relative = 1e-9);
    assert_relative_eq!(lo, -m * 50.0 / ixx, max_relative = 1e-9);

    let nodes = section.mesh().nodes();
    let group = &result.materials[0];
    for (&n, s) in group.nodes.iter().zip(group.stresses.iter()) {
        let expected = m * (nodes[n].y - 50.0) / ixx;
        assert_relative_eq!(s.sig_zz_mxx, expected, epsilon = 1e-9 * hi);
        assert_relative_eq!(s.sig_vm, expected.abs(), epsilon = 1e-9 * hi);
    }
}

#[test]
fn shear_stress_peaks_at_one_and_a_half_times_mean() {
    let section = rectangle();
    let v = 10e3;
    let result = section.calculate_stress(&LoadCase::new("V").with_vy(v)).unwrap();
    assert_relative_eq!(result.max_shear(), 1.5 * v / 5000.0, max_relative = 0.03);
}

#[test]
fn torsion_stress_matches_thin_rectangle_bound() {
    let section = rectangle();
    let t = 1e6;
    let j = section.get_j().unwrap();
    let result = section.calculate_stress(&LoadCase::new("T").with_mzz(t)).unwrap();

    // tau_max = T t / J for a thin strip; a 2:1 rectangle sits below that
    let tau = result.max_shear();
    assert!(tau > 0.0 && tau < t * 50.0 / j, "tau = {tau}");
}

#[test]
fn stresses_superpose() {
    let section = rectangle();
    let a = LoadCase::new("A").with_n(5e3).with_mxx(2e6).with_vy(3e3);
    let b = LoadCase::new("B").with_myy(1e6).with_mzz(4e5).with_vx(2e3);

    let combined = section.calculate_stress(&(&a + &b)).unwrap();
    let summed = section
        .calculate_stress(&a)
        .unwrap()
        .add(&section.calculate_stress(&b).unwrap())
        .unwrap();

    let c = &combined.materials[0];
    let s = &summed.materials[0];
    assert_eq!(c.nodes, s.nodes);
    let scale = combined.max_von_mises();
    for (x, y) in c.stresses.iter().zip(s.stresses.iter()) {
        assert_relative_eq!(x.sig_zz, y.sig_zz, epsilon = 1e-9 * scale);
        assert_relative_eq!(x.sig_zx, y.sig_zx, epsilon = 1e-9 * scale);
        assert_relative_eq!(x.sig_zy, y.sig_zy, epsilon = 1e-9 * scale);
        assert_relative_eq!(x.sig_vm, y.sig_vm, epsilon = 1e-9 * scale);
    }
}

#[test]
fn load_combination_scales_stress() {
    let section = rectangle();
    let dead = LoadCase::dead().with_mxx(1e6);
    let live = LoadCase::live().with_mxx(2e6);
    let combo = LoadCombination::lrfd_dead_live()
        .combine(&[dead.clone(), live])
        .unwrap();
    assert_eq!(combo.mxx, 1.2 * 1e6 + 1.6 * 2e6);

    let (_, hi) = section.calculate_stress(&combo).unwrap().sig_zz_range();
    let (_, unit) = section.calculate_stress(&dead).unwrap().sig_zz_range();
    assert_relative_eq!(hi, 4.4 * unit, max_relative = 1e-9);
}

#[test]
fn stresses_at_points() {
    let section = rectangle();
    let (ixx, _, _) = section.get_ic().unwrap();
    let load = LoadCase::new("M").with_mxx(5e6);

    let points = [[25.0, 90.0], [12.3, 7.7], [200.0, 50.0], [-1.0, -1.0]];
    let stresses = section.get_stress_at_points(&points, &load).unwrap();
    assert_eq!(stresses.len(), 4);

    let top = stresses[0].expect("inside the section");
    assert_relative_eq!(top.sig_zz, 5e6 * 40.0 / ixx, max_relative = 1e-9);
    let low = stresses[1].expect("inside the section");
    assert_relative_eq!(low.sig_zz, 5e6 * (7.7 - 50.0) / ixx, max_relative = 1e-9);
    assert!(stresses[2].is_none());
    assert!(stresses[3].is_none());
}

#[test]
fn composite_stress_follows_modular_ratio() {
    let section = common::analysed(&common::flitch_beam(Precedence::LastWins), &[50.0, 10.0]);
    let load = LoadCase::new("M").with_mxx(20e6);
    let result = section.calculate_stress(&load).unwrap();

    assert_eq!(result.materials.len(), 2);
    assert!(result.material("Steel").is_some());
    assert!(result.material("Timber").is_some());

    let at = section
        .get_stress_at_points(&[[75.0, 250.0], [30.0, 250.0]], &load)
        .unwrap();
    let steel = at[0].expect("inside the plate").sig_zz;
    let timber = at[1].expect("inside the timber").sig_zz;
    assert_relative_eq!(steel / timber, 200e3 / 8e3, max_relative = 1e-9);
}

#[test]
fn stress_needs_earlier_stages() {
    let mut section = common::mesh(&common::rectangle(100.0, 50.0), &[25.0]);
    let bending = LoadCase::new("M").with_mxx(1e6);
    let torsion = LoadCase::new("T").with_mzz(1e6);

    assert!(matches!(
        section.calculate_stress(&bending),
        Err(SectionError::StageNotComplete { requested: Stage::Stress, missing: Stage::Geometric })
    ));

    section.calculate_geometric_properties().unwrap();
    assert!(section.calculate_stress(&bending).is_ok());
    assert!(matches!(
        section.calculate_stress(&torsion),
        Err(SectionError::StageNotComplete { requested: Stage::Stress, missing: Stage::Warping })
    ));
    assert!(matches!(
        section.get_stress_at_points(&[[10.0, 10.0]], &torsion),
        Err(SectionError::StageNotComplete { missing: Stage::Warping, .. })
    ));
}
