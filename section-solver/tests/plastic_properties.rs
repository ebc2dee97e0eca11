mod common;

use std::f64::consts::PI;
use std::time::Duration;

use approx::assert_relative_eq;
use section_solver::prelude::*;

fn plastic(geometry: &CompoundGeometry, sizes: &[f64]) -> Section {
    let mut section = common::analysed(geometry, sizes);
    section.calculate_plastic_properties().unwrap();
    section
}

#[test]
fn rectangle_plastic_modulus_and_shape_factor() {
    let section = plastic(&common::rectangle(100.0, 50.0), &[25.0]);

    let (sxx, syy) = section.get_s().unwrap();
    assert_relative_eq!(sxx, 50.0 * 100.0 * 100.0 / 4.0, max_relative = 1e-6);
    assert_relative_eq!(syy, 100.0 * 50.0 * 50.0 / 4.0, max_relative = 1e-6);

    let (sf_xx, sf_yy) = section.get_sf().unwrap();
    assert_relative_eq!(sf_xx.plus, 1.5, max_relative = 1e-6);
    assert_relative_eq!(sf_xx.minus, 1.5, max_relative = 1e-6);
    assert_relative_eq!(sf_yy.min(), 1.5, max_relative = 1e-6);

    let (x_pc, y_pc) = section.get_pc().unwrap();
    assert_relative_eq!(x_pc, 25.0, max_relative = 1e-6);
    assert_relative_eq!(y_pc, 50.0, max_relative = 1e-6);
}

#[test]
fn i_section_plastic_modulus() {
    let section = plastic(&common::i_section(), &[10.0]);
    let (sxx, _) = section.get_s().unwrap();
    let expected = 100.0 * 10.0 * 190.0 + 6.0 * 180.0_f64.powi(2) / 4.0;
    assert_relative_eq!(sxx, expected, max_relative = 1e-6);

    let (sf_xx, sf_yy) = section.get_sf().unwrap();
    assert!(sf_xx.min() > 1.0 && sf_xx.min() < 1.2);
    assert!(sf_yy.min() > 1.5);
}

#[test]
fn convex_shape_factors_are_at_least_one() {
    let r = 50.0;
    let mut section = Section::new(common::disc_mesh(r, 8, 64));
    section.calculate_geometric_properties().unwrap();
    section.calculate_plastic_properties().unwrap();

    let (sf_xx, sf_yy) = section.get_sf().unwrap();
    let (sf_11, sf_22) = section.get_sf_p().unwrap();
    for sf in [sf_xx, sf_yy, sf_11, sf_22] {
        assert!(sf.plus >= 1.0 && sf.minus >= 1.0, "{sf:?}");
    }
    // solid circle: 16 / (3 pi)
    assert_relative_eq!(sf_xx.plus, 16.0 / (3.0 * PI), max_relative = 0.01);
    assert_relative_eq!(sf_yy.minus, 16.0 / (3.0 * PI), max_relative = 0.01);
}

#[test]
fn angle_shape_factors_per_side() {
    let geometry = CompoundGeometry::from(
        library::angle_section(150.0, 90.0, 12.0, Material::default()).unwrap(),
    );
    let section = plastic(&geometry, &[10.0]);

    // the leg tip is far from the centroid, the heel close to it
    let (sf_xx, _) = section.get_sf().unwrap();
    assert_relative_eq!(sf_xx.plus, 1.7765786985346, max_relative = 1e-6);
    assert_relative_eq!(sf_xx.minus, 0.9259829725749, max_relative = 1e-6);

    let (s11, s22) = section.get_sp().unwrap();
    assert!(s11 > s22);
    let (x11_pc, y22_pc) = section.get_pc_p().unwrap();
    assert!(x11_pc.is_finite() && y22_pc.is_finite());
}

#[test]
fn asymmetric_plastic_centroid_halves_area() {
    // tee: 100 x 10 flange on a 6 x 90 web, area 1540
    let geometry = CompoundGeometry::from(
        library::tee_section(100.0, 100.0, 10.0, 6.0, Material::default()).unwrap(),
    );
    let section = plastic(&geometry, &[5.0]);
    let (_, y_pc) = section.get_pc().unwrap();

    // the 540 mm^2 web is less than half, so the axis cuts the flange
    assert_relative_eq!(y_pc, 90.0 + (770.0 - 540.0) / 100.0, max_relative = 1e-6);
}

#[test]
fn composite_plastic_moment() {
    let section = plastic(&common::flitch_beam(Precedence::LastWins), &[50.0, 10.0]);

    let (mp_xx, _) = section.get_mp().unwrap();
    let timber = 20.0 * (150.0 * 300.0 * 300.0 / 4.0 - 12.0 * 250.0 * 250.0 / 4.0);
    let steel = 500.0 * 12.0 * 250.0 * 250.0 / 4.0;
    assert_relative_eq!(mp_xx, timber + steel, max_relative = 1e-6);

    let (_, y_pc) = section.get_pc().unwrap();
    assert_relative_eq!(y_pc, 150.0, max_relative = 1e-6);

    assert!(matches!(section.get_s(), Err(SectionError::CompositeAmbiguity(_))));
    assert!(matches!(section.get_sf(), Err(SectionError::CompositeAmbiguity(_))));
}

#[test]
fn geometric_sections_have_no_plastic_moment() {
    let section = plastic(&common::rectangle(100.0, 50.0), &[25.0]);
    assert!(matches!(section.get_mp(), Err(SectionError::CompositeOnly(_))));
}

#[test]
fn root_finder_iteration_cap_is_reported() {
    let geometry = CompoundGeometry::from(
        library::tee_section(100.0, 100.0, 10.0, 6.0, Material::default()).unwrap(),
    );
    let mut section = common::mesh(&geometry, &[20.0])
        .with_options(AnalysisOptions::default().with_plastic_max_iter(1));
    section.calculate_geometric_properties().unwrap();

    assert!(matches!(
        section.calculate_plastic_properties(),
        Err(SectionError::ConvergenceFailed { .. })
    ));
    assert_eq!(section.stage(), SectionState::GeometricDone);
}

#[test]
fn time_limit_aborts_plastic_stage() {
    let mut section = common::mesh(&common::i_section(), &[20.0])
        .with_options(AnalysisOptions::default().with_time_limit(Duration::ZERO));
    section.calculate_geometric_properties().unwrap();

    let err = section.calculate_plastic_properties().unwrap_err();
    assert!(matches!(err, SectionError::TimeLimitExceeded { stage: Stage::Plastic, .. }));
    assert_eq!(section.stage(), SectionState::GeometricDone);
}
