//! Section building blocks: materials, regions and the quadratic triangle

mod geometry;
pub mod library;
mod material;
mod node;
mod tri6;

pub use geometry::{CompoundGeometry, Geometry, Polygon, Precedence};
pub use material::{Material, MaterialRegistry, DEFAULT_MATERIAL_NAME};
pub use node::Node;
pub use tri6::{
    AreaIntegrals, ElementActions, ElementConnectivity, ElementStress, StressConstants, Tri6,
    WarpingIntegrals,
};
