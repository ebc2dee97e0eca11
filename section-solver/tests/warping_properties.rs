mod common;

use std::f64::consts::PI;
use std::time::Duration;

use approx::assert_relative_eq;
use section_solver::prelude::*;

fn warped(geometry: &CompoundGeometry, sizes: &[f64]) -> Section {
    let mut section = common::analysed(geometry, sizes);
    section.calculate_warping_properties().unwrap();
    section
}

#[test]
fn rectangle_torsion_constant() {
    let section = warped(&common::rectangle(100.0, 50.0), &[10.0]);
    let j = section.get_j().unwrap();
    let exact = common::rectangle_torsion_constant(100.0, 50.0);
    assert_relative_eq!(j, exact, max_relative = 0.01);
    // a coarse displacement model is too stiff
    assert!(j >= exact * 0.999);
}

#[test]
fn disc_torsion_constant_is_polar_moment() {
    let r = 50.0;
    let mut section = Section::new(common::disc_mesh(r, 8, 64));
    section.calculate_geometric_properties().unwrap();
    section.calculate_warping_properties().unwrap();

    let (ixx, iyy, _) = section.get_ic().unwrap();
    let j = section.get_j().unwrap();
    assert_relative_eq!(j, ixx + iyy, max_relative = 2e-3);
    assert_relative_eq!(j, PI * r.powi(4) / 2.0, max_relative = 0.01);

    let (x_sc, y_sc) = section.get_sc().unwrap();
    assert!(x_sc.abs() < 1e-6 * r);
    assert!(y_sc.abs() < 1e-6 * r);
}

#[test]
fn rectangle_shear_areas() {
    // nu = 0 for the default material, where the parabolic shear flow is exact
    let section = warped(&common::rectangle(100.0, 50.0), &[10.0]);
    let area = section.get_area().unwrap();
    let (a_sx, a_sy) = section.get_as().unwrap();
    assert_relative_eq!(a_sx, 5.0 / 6.0 * area, max_relative = 0.01);
    assert_relative_eq!(a_sy, 5.0 / 6.0 * area, max_relative = 0.01);

    let (a_s11, a_s22) = section.get_as_p().unwrap();
    assert_relative_eq!(a_s11, a_sx, max_relative = 1e-6);
    assert_relative_eq!(a_s22, a_sy, max_relative = 1e-6);
}

#[test]
fn doubly_symmetric_shear_centre_is_centroid() {
    let section = warped(&common::i_section(), &[10.0]);
    let (cx, cy) = section.get_c().unwrap();
    let (x_se, y_se) = section.get_sc().unwrap();
    let (x_st, y_st) = section.get_sc_t().unwrap();

    assert_relative_eq!(x_se, cx, epsilon = 1e-6);
    assert_relative_eq!(y_se, cy, epsilon = 1e-6);
    assert_relative_eq!(x_st, cx, epsilon = 1e-6);
    assert_relative_eq!(y_st, cy, epsilon = 1e-6);

    let (x11, y22) = section.get_sc_p().unwrap();
    assert!(x11.abs() < 1e-6 && y22.abs() < 1e-6);

    let beta = section.get_beta().unwrap();
    assert!(beta.x.plus.abs() < 1e-6 * 200.0);
    assert!(beta.y.plus.abs() < 1e-6 * 200.0);
}

#[test]
fn i_section_warping_constant() {
    let section = warped(&common::i_section(), &[10.0]);
    // flanges only, thin-walled theory: t_f b^3 h^2 / 24
    let thin_walled = 10.0 * 100.0_f64.powi(3) * 190.0_f64.powi(2) / 24.0;
    assert_relative_eq!(section.get_iw().unwrap(), thin_walled, max_relative = 0.05);
}

#[test]
fn channel_shear_centre_lies_behind_web() {
    let geometry = CompoundGeometry::from(
        library::channel_section(200.0, 75.0, 10.0, 6.0, Material::default()).unwrap(),
    );
    let section = warped(&geometry, &[10.0]);
    let (x_se, y_se) = section.get_sc().unwrap();
    let (x_st, y_st) = section.get_sc_t().unwrap();

    assert!(x_se < 0.0, "shear centre x = {x_se}");
    assert_relative_eq!(y_se, 100.0, epsilon = 1.0);
    // with nu = 0 both approaches solve the same problem
    assert_relative_eq!(x_st, x_se, epsilon = 0.5);
    assert_relative_eq!(y_st, y_se, epsilon = 0.5);

    let beta = section.get_beta().unwrap();
    assert!(beta.y.plus.abs() > 1.0);
    assert_relative_eq!(beta.y.plus, -beta.y.minus, max_relative = 1e-12);
}

#[test]
fn iterative_solver_matches_direct() {
    let direct = warped(&common::i_section(), &[20.0]);
    let mut iterative = common::mesh(&common::i_section(), &[20.0])
        .with_options(AnalysisOptions::iterative(1e-12, 20_000));
    iterative.calculate_geometric_properties().unwrap();
    iterative.calculate_warping_properties().unwrap();

    assert_relative_eq!(iterative.get_j().unwrap(), direct.get_j().unwrap(), max_relative = 1e-6);
    assert_relative_eq!(iterative.get_iw().unwrap(), direct.get_iw().unwrap(), max_relative = 1e-6);
}

#[test]
fn serial_and_parallel_integration_agree() {
    let parallel = warped(&common::i_section(), &[20.0]);
    let mut serial = common::mesh(&common::i_section(), &[20.0])
        .with_options(AnalysisOptions::default().serial());
    serial.calculate_geometric_properties().unwrap();
    serial.calculate_warping_properties().unwrap();

    assert_eq!(serial.get_j().unwrap(), parallel.get_j().unwrap());
}

#[test]
fn frame_properties_match_full_analysis() {
    let mut section = common::mesh(&common::i_section(), &[10.0]);
    let frame = section.calculate_frame_properties().unwrap();
    assert_eq!(section.stage(), SectionState::GeometricDone);

    section.calculate_warping_properties().unwrap();
    let (ixx, iyy, ixy) = section.get_ic().unwrap();
    let (i11, i22) = section.get_ip().unwrap();
    let (cx, cy) = section.get_c().unwrap();
    assert_relative_eq!(frame.ea, section.get_ea(1.0).unwrap());
    assert_relative_eq!(frame.cx, cx);
    assert_relative_eq!(frame.cy, cy);
    assert_relative_eq!(frame.ei11, i11);
    assert_relative_eq!(frame.ei22, i22);
    assert_relative_eq!(frame.eixx, ixx);
    assert_relative_eq!(frame.eiyy, iyy);
    assert_relative_eq!(frame.eixy, ixy);
    assert_relative_eq!(frame.ej, section.get_j().unwrap(), max_relative = 1e-9);
    assert_eq!(frame.phi, section.get_phi().unwrap());
}

#[test]
fn composite_torsion_constant_is_modulus_weighted() {
    let mut section = common::analysed(&common::flitch_beam(Precedence::LastWins), &[100.0, 20.0]);
    section.calculate_warping_properties().unwrap();

    assert!(matches!(section.get_j(), Err(SectionError::CompositeAmbiguity(_))));
    let ej = section.get_ej(1.0).unwrap();
    let steel = Material::steel();
    assert_relative_eq!(section.get_ej(&steel).unwrap(), ej / 200e3, max_relative = 1e-12);

    // bounded by the all-timber and all-steel sections
    let j_box = common::rectangle_torsion_constant(300.0, 150.0);
    assert!(ej > 8e3 * j_box && ej < 200e3 * j_box);
}

#[test]
fn disconnected_mesh_fails_warping() {
    let left = library::rectangular_section(100.0, 50.0, Material::default()).unwrap();
    let right = left.shift(100.0, 0.0);
    let geometry = CompoundGeometry::new(vec![left, right]);
    let mut section = common::analysed(&geometry, &[50.0]);

    assert!(matches!(
        section.calculate_warping_properties(),
        Err(SectionError::MeshValidity(_))
    ));
    assert_eq!(section.stage(), SectionState::GeometricDone);
}

#[test]
fn time_limit_aborts_before_solve() {
    let mut section = common::mesh(&common::i_section(), &[20.0])
        .with_options(AnalysisOptions::default().with_time_limit(Duration::ZERO));
    section.calculate_geometric_properties().unwrap();

    let err = section.calculate_warping_properties().unwrap_err();
    assert!(matches!(err, SectionError::TimeLimitExceeded { stage: Stage::Warping, .. }));
    assert_eq!(section.stage(), SectionState::GeometricDone);
}
