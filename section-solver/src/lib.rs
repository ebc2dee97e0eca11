//! Section Solver - finite element analysis of beam cross-sections
//!
//! This library computes the properties of arbitrary, possibly composite,
//! cross-sections from a mesh of 6-node quadratic triangles:
//! - Geometric properties (area, centroid, second moments, principal axes)
//! - Warping properties (torsion and warping constants, shear centre, shear areas)
//! - Plastic properties (plastic centroids, plastic moduli, shape factors)
//! - Stress recovery for combined axial, bending, torsion and shear actions
//!
//! ## Example
//! ```rust
//! use section_solver::prelude::*;
//!
//! // 100 deep by 50 wide rectangle
//! let geometry = CompoundGeometry::from(
//!     library::rectangular_section(100.0, 50.0, Material::default()).unwrap(),
//! );
//! let mut section = Section::from_geometry(&geometry, &GridTriangulator::default(), &[25.0]).unwrap();
//!
//! section.calculate_geometric_properties().unwrap();
//! section.calculate_warping_properties().unwrap();
//!
//! let (ixx, _, _) = section.get_ic().unwrap();
//! assert!((ixx - 100.0_f64.powi(3) * 50.0 / 12.0).abs() / ixx < 1e-6);
//!
//! let load = LoadCase::new("Bending").with_mxx(1e6);
//! let stress = section.calculate_stress(&load).unwrap();
//! assert!(stress.max_von_mises() > 0.0);
//! ```

pub mod analysis;
pub mod elements;
pub mod error;
pub mod loads;
pub mod math;
pub mod mesh;
pub mod results;
pub mod section;

pub use section::Section;

// Re-export common types
pub mod prelude {
    pub use crate::analysis::stress::{MaterialStress, NodalStress, PointStress, StressResult};
    pub use crate::analysis::{AnalysisOptions, LinearSolver, SectionState, Stage};
    pub use crate::elements::{
        library, CompoundGeometry, Geometry, Material, Node, Polygon, Precedence,
    };
    pub use crate::error::{SectionError, SectionResult};
    pub use crate::loads::{LoadCase, LoadCombination};
    pub use crate::mesh::{GridTriangulator, Mesh, Triangulator};
    pub use crate::results::{
        BySide, FrameProperties, GeometricProperties, Monosymmetry, PlasticProperties,
        WarpingProperties,
    };
    pub use crate::section::{ERef, Section};
}
