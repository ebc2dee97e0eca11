//! Load cases: the stress resultants acting on a cross-section

use std::ops::{Add, Mul};

use serde::{Deserialize, Serialize};

/// Generalised actions on a cross-section, all defaulting to zero.
///
/// Moments about the principal axes act in addition to the moments about
/// the global axes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadCase {
    /// Name of the load case
    pub name: String,
    /// Description of the load case
    pub description: Option<String>,
    /// Axial force
    pub n: f64,
    /// Bending moment about the centroidal x-axis
    pub mxx: f64,
    /// Bending moment about the centroidal y-axis
    pub myy: f64,
    /// Bending moment about the 11-axis
    pub m11: f64,
    /// Bending moment about the 22-axis
    pub m22: f64,
    /// Torsion moment
    pub mzz: f64,
    /// Shear force in the x direction
    pub vx: f64,
    /// Shear force in the y direction
    pub vy: f64,
}

impl LoadCase {
    /// Create a new load case with no actions
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Create a load case with description
    pub fn with_description(name: &str, description: &str) -> Self {
        Self {
            description: Some(description.to_string()),
            ..Self::new(name)
        }
    }

    pub fn with_n(mut self, n: f64) -> Self {
        self.n = n;
        self
    }

    pub fn with_mxx(mut self, mxx: f64) -> Self {
        self.mxx = mxx;
        self
    }

    pub fn with_myy(mut self, myy: f64) -> Self {
        self.myy = myy;
        self
    }

    pub fn with_m11(mut self, m11: f64) -> Self {
        self.m11 = m11;
        self
    }

    pub fn with_m22(mut self, m22: f64) -> Self {
        self.m22 = m22;
        self
    }

    pub fn with_mzz(mut self, mzz: f64) -> Self {
        self.mzz = mzz;
        self
    }

    pub fn with_vx(mut self, vx: f64) -> Self {
        self.vx = vx;
        self
    }

    pub fn with_vy(mut self, vy: f64) -> Self {
        self.vy = vy;
        self
    }

    /// Whether recovering this case's stresses needs the warping analysis
    pub fn needs_warping(&self) -> bool {
        self.mzz != 0.0 || self.vx != 0.0 || self.vy != 0.0
    }

    /// Common load case names
    pub fn dead() -> Self {
        Self::with_description("Dead", "Dead loads (self-weight and permanent loads)")
    }

    pub fn live() -> Self {
        Self::with_description("Live", "Live loads (occupancy, furniture, etc.)")
    }

    pub fn wind() -> Self {
        Self::with_description("Wind", "Wind loads")
    }
}

impl Add for &LoadCase {
    type Output = LoadCase;

    fn add(self, o: &LoadCase) -> LoadCase {
        LoadCase {
            name: format!("{} + {}", self.name, o.name),
            description: None,
            n: self.n + o.n,
            mxx: self.mxx + o.mxx,
            myy: self.myy + o.myy,
            m11: self.m11 + o.m11,
            m22: self.m22 + o.m22,
            mzz: self.mzz + o.mzz,
            vx: self.vx + o.vx,
            vy: self.vy + o.vy,
        }
    }
}

impl Add for LoadCase {
    type Output = LoadCase;

    fn add(self, o: LoadCase) -> LoadCase {
        &self + &o
    }
}

impl Mul<f64> for &LoadCase {
    type Output = LoadCase;

    fn mul(self, f: f64) -> LoadCase {
        LoadCase {
            name: format!("{f}{}", self.name),
            description: None,
            n: self.n * f,
            mxx: self.mxx * f,
            myy: self.myy * f,
            m11: self.m11 * f,
            m22: self.m22 * f,
            mzz: self.mzz * f,
            vx: self.vx * f,
            vy: self.vy * f,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_superposition() {
        let a = LoadCase::new("A").with_mxx(2.0).with_vy(1.0);
        let b = LoadCase::new("B").with_mxx(3.0).with_n(-4.0);
        let c = &a + &b;
        assert_eq!(c.mxx, 5.0);
        assert_eq!(c.n, -4.0);
        assert_eq!(c.vy, 1.0);
        assert_eq!(c.name, "A + B");
        assert!(c.needs_warping());
        assert!(!b.needs_warping());
    }

    #[test]
    fn test_scaling() {
        let a = &LoadCase::new("D").with_mzz(2.0) * 1.5;
        assert_eq!(a.mzz, 3.0);
        assert_eq!(a.name, "1.5D");
    }
}
