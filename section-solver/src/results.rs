//! Property records produced by the analysis stages
//!
//! Each record is immutable once produced. Modulus weighted quantities carry
//! an `e` prefix in the accessor names of [`crate::Section`]; the fields here
//! hold the weighted values.

use serde::{Deserialize, Serialize};

/// A value on the positive and negative side of an axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BySide {
    pub plus: f64,
    pub minus: f64,
}

impl BySide {
    pub fn new(plus: f64, minus: f64) -> Self {
        Self { plus, minus }
    }

    /// Both values divided by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.plus / factor, self.minus / factor)
    }

    /// The smaller of the two sides
    pub fn min(&self) -> f64 {
        self.plus.min(self.minus)
    }
}

/// Results of the geometric stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometricProperties {
    /// Cross-sectional area
    pub area: f64,
    /// Length of the mesh boundary, holes included
    pub perimeter: f64,
    /// Mass per unit length
    pub mass: f64,
    /// Axial rigidity
    pub ea: f64,
    /// Shear rigidity
    pub ga: f64,
    /// Effective elastic modulus, EA / A
    pub e_eff: f64,
    /// Effective shear modulus, GA / A
    pub g_eff: f64,
    /// Effective Poisson's ratio
    pub nu_eff: f64,
    /// First moments of area about the global axes
    pub qx: f64,
    pub qy: f64,
    /// Second moments of area about the global axes
    pub ixx_g: f64,
    pub iyy_g: f64,
    pub ixy_g: f64,
    /// Elastic centroid
    pub cx: f64,
    pub cy: f64,
    /// Second moments of area about the centroidal axes
    pub ixx_c: f64,
    pub iyy_c: f64,
    pub ixy_c: f64,
    /// Elastic section moduli about the centroidal axes
    pub zxx: BySide,
    pub zyy: BySide,
    /// Radii of gyration about the centroidal axes
    pub rx: f64,
    pub ry: f64,
    /// Principal second moments of area
    pub i11_c: f64,
    pub i22_c: f64,
    /// Principal axis angle in degrees
    pub phi: f64,
    /// Elastic section moduli about the principal axes
    pub z11: BySide,
    pub z22: BySide,
    /// Radii of gyration about the principal axes
    pub r11: f64,
    pub r22: f64,
    /// First yield moments about the centroidal and principal axes
    pub my_xx: f64,
    pub my_yy: f64,
    pub my_11: f64,
    pub my_22: f64,
}

/// Monosymmetry constants about the centroidal and principal axes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Monosymmetry {
    pub x: BySide,
    pub y: BySide,
    pub p11: BySide,
    pub p22: BySide,
}

/// Results of the warping stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WarpingProperties {
    /// Torsion constant
    pub j: f64,
    /// Warping function at every node, zero weighted mean
    pub omega: Vec<f64>,
    /// Shear functions at every node
    pub psi_shear: Vec<f64>,
    pub phi_shear: Vec<f64>,
    /// Shear function normalisation, 2 (1 + nu) (Ixx Iyy - Ixy^2)
    pub delta_s: f64,
    /// Shear centre (elasticity approach), global coordinates
    pub x_se: f64,
    pub y_se: f64,
    /// Shear centre (elasticity approach), principal coordinates about the centroid
    pub x11_se: f64,
    pub y22_se: f64,
    /// Shear centre (Trefftz's approach), global coordinates
    pub x_st: f64,
    pub y_st: f64,
    /// Warping constant
    pub gamma: f64,
    /// Shear areas
    pub a_sx: f64,
    pub a_sy: f64,
    pub a_sxy: f64,
    pub a_s11: f64,
    pub a_s22: f64,
    pub beta: Monosymmetry,
}

/// Results of the plastic stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlasticProperties {
    /// Plastic centroid for bending about the global axes
    pub x_pc: f64,
    pub y_pc: f64,
    /// Plastic centroid for bending about the principal axes, principal
    /// coordinates relative to the elastic centroid
    pub x11_pc: f64,
    pub y22_pc: f64,
    /// Plastic section moduli weighted by yield strength
    pub sxx: f64,
    pub syy: f64,
    pub s11: f64,
    pub s22: f64,
    /// Shape factors, only meaningful for non-composite sections
    pub sf_xx: BySide,
    pub sf_yy: BySide,
    pub sf_11: BySide,
    pub sf_22: BySide,
}

/// Stiffness properties for frame analysis
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameProperties {
    pub ea: f64,
    /// Elastic centroid
    pub cx: f64,
    pub cy: f64,
    /// Centroidal flexural rigidities
    pub eixx: f64,
    pub eiyy: f64,
    pub eixy: f64,
    /// Principal flexural rigidities
    pub ei11: f64,
    pub ei22: f64,
    pub ej: f64,
    pub phi: f64,
}
