#![allow(dead_code)]

use std::f64::consts::PI;

use section_solver::elements::MaterialRegistry;
use section_solver::prelude::*;

/// Multiplier applied to every test mesh size, `SECTION_TEST_MESH_SCALE`.
/// Values below one refine the meshes.
pub fn mesh_scale() -> f64 {
    std::env::var("SECTION_TEST_MESH_SCALE")
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|&v| v > 0.0)
        .unwrap_or(1.0)
}

pub fn mesh(geometry: &CompoundGeometry, sizes: &[f64]) -> Section {
    let scale = mesh_scale();
    let sizes: Vec<f64> = sizes.iter().map(|s| s * scale).collect();
    Section::from_geometry(geometry, &GridTriangulator::default(), &sizes).unwrap()
}

/// Meshed section with the geometric stage already run
pub fn analysed(geometry: &CompoundGeometry, sizes: &[f64]) -> Section {
    let mut section = mesh(geometry, sizes);
    section.calculate_geometric_properties().unwrap();
    section
}

pub fn rectangle(d: f64, b: f64) -> CompoundGeometry {
    CompoundGeometry::from(library::rectangular_section(d, b, Material::default()).unwrap())
}

pub fn i_section() -> CompoundGeometry {
    CompoundGeometry::from(
        library::i_section(200.0, 100.0, 10.0, 6.0, Material::default()).unwrap(),
    )
}

/// 300 x 150 timber beam with a 250 x 12 steel flitch plate on its axis
pub fn flitch_beam(precedence: Precedence) -> CompoundGeometry {
    let timber = CompoundGeometry::from(
        library::rectangular_section(300.0, 150.0, Material::timber()).unwrap(),
    );
    let plate = library::rectangular_section(250.0, 12.0, Material::steel())
        .unwrap()
        .shift(69.0, 25.0);
    timber.union(&CompoundGeometry::from(plate), precedence)
}

/// Polar mesh of a disc of radius `r` centred on the origin
pub fn disc_mesh(r: f64, rings: usize, segments: usize) -> Mesh {
    let mut nodes = vec![[0.0, 0.0]];
    for k in 1..=rings {
        let radius = r * k as f64 / rings as f64;
        for s in 0..segments {
            let theta = 2.0 * PI * s as f64 / segments as f64;
            nodes.push([radius * theta.cos(), radius * theta.sin()]);
        }
    }
    let at = |k: usize, s: usize| 1 + (k - 1) * segments + s % segments;

    let mut triangles = Vec::new();
    for s in 0..segments {
        triangles.push([0, at(1, s), at(1, s + 1)]);
    }
    for k in 1..rings {
        for s in 0..segments {
            triangles.push([at(k, s), at(k + 1, s), at(k + 1, s + 1)]);
            triangles.push([at(k, s), at(k + 1, s + 1), at(k, s + 1)]);
        }
    }

    let mut materials = MaterialRegistry::new();
    let tag = materials.insert(&Material::default()).unwrap();
    let tags = vec![tag; triangles.len()];
    Mesh::from_triangles(nodes, triangles, tags, materials).unwrap()
}

/// Saint-Venant torsion constant of a solid rectangle
pub fn rectangle_torsion_constant(d: f64, b: f64) -> f64 {
    let (long, short) = (d.max(b), d.min(b));
    let series: f64 = (0..50)
        .map(|i| (2 * i + 1) as f64)
        .map(|n| (n * PI * long / (2.0 * short)).tanh() / n.powi(5))
        .sum();
    short.powi(3) * long / 3.0 * (1.0 - 192.0 * short / (PI.powi(5) * long) * series)
}
