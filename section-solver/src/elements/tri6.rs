//! 6-node quadratic triangle
//!
//! ```text
//!        2
//!       / \
//!      5   4
//!     /     \
//!    0---3---1
//! ```
//!
//! Every integral is evaluated with the six point rule of
//! [`crate::math::gauss_points`]. Integrals that carry a material weighting
//! are multiplied by the element's elastic modulus; plain geometric
//! integrals are returned unweighted and weighted by the caller.

use std::ops::Add;

use serde::{Deserialize, Serialize};

use crate::elements::Material;
use crate::error::{SectionError, SectionResult};
use crate::math::{
    self, barycentric, clip_half_plane, gauss_points, polygon_area_centroid, principal_coordinate,
    Mat2x6, Mat6, Point, ShapeEval, Vec2, Vec6,
};

/// Connectivity of one element: six node indices and a material index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementConnectivity {
    /// Node indices, corners first then midsides
    pub nodes: [usize; 6],
    /// Index into the section's material registry
    pub material: usize,
}

/// Unweighted area integrals of an element (or a sum of elements)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaIntegrals {
    pub area: f64,
    /// int y dA
    pub qx: f64,
    /// int x dA
    pub qy: f64,
    /// int y^2 dA
    pub ixx: f64,
    /// int x^2 dA
    pub iyy: f64,
    /// int xy dA
    pub ixy: f64,
}

impl AreaIntegrals {
    /// All integrals multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            area: self.area * factor,
            qx: self.qx * factor,
            qy: self.qy * factor,
            ixx: self.ixx * factor,
            iyy: self.iyy * factor,
            ixy: self.ixy * factor,
        }
    }
}

impl Add for AreaIntegrals {
    type Output = Self;

    fn add(self, o: Self) -> Self {
        Self {
            area: self.area + o.area,
            qx: self.qx + o.qx,
            qy: self.qy + o.qy,
            ixx: self.ixx + o.ixx,
            iyy: self.iyy + o.iyy,
            ixy: self.ixy + o.ixy,
        }
    }
}

/// Modulus weighted integrals of the warping function
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WarpingIntegrals {
    pub sc_xint: f64,
    pub sc_yint: f64,
    pub q_omega: f64,
    pub i_omega: f64,
    pub i_xomega: f64,
    pub i_yomega: f64,
}

impl Add for WarpingIntegrals {
    type Output = Self;

    fn add(self, o: Self) -> Self {
        Self {
            sc_xint: self.sc_xint + o.sc_xint,
            sc_yint: self.sc_yint + o.sc_yint,
            q_omega: self.q_omega + o.q_omega,
            i_omega: self.i_omega + o.i_omega,
            i_xomega: self.i_xomega + o.i_xomega,
            i_yomega: self.i_yomega + o.i_yomega,
        }
    }
}

/// Section constants needed to recover element stresses.
/// Second moments are centroidal and modulus weighted.
#[derive(Debug, Clone, Copy)]
pub struct StressConstants {
    pub ea: f64,
    pub ixx: f64,
    pub iyy: f64,
    pub ixy: f64,
    pub i11: f64,
    pub i22: f64,
    pub phi: f64,
    pub j: f64,
    pub nu: f64,
    pub delta_s: f64,
}

/// Element nodal values of a load case, one entry per stress component.
/// Values are stresses (already multiplied by the element modulus).
#[derive(Debug, Clone, Copy)]
pub struct ElementStress {
    pub sig_zz_n: Vec6,
    pub sig_zz_mxx: Vec6,
    pub sig_zz_myy: Vec6,
    pub sig_zz_m11: Vec6,
    pub sig_zz_m22: Vec6,
    pub sig_zx_mzz: Vec6,
    pub sig_zy_mzz: Vec6,
    pub sig_zx_vx: Vec6,
    pub sig_zy_vx: Vec6,
    pub sig_zx_vy: Vec6,
    pub sig_zy_vy: Vec6,
}

impl ElementStress {
    fn zeros() -> Self {
        let z = Vec6::zeros();
        Self {
            sig_zz_n: z,
            sig_zz_mxx: z,
            sig_zz_myy: z,
            sig_zz_m11: z,
            sig_zz_m22: z,
            sig_zx_mzz: z,
            sig_zy_mzz: z,
            sig_zx_vx: z,
            sig_zy_vx: z,
            sig_zx_vy: z,
            sig_zy_vy: z,
        }
    }
}

/// Generalised actions driving an element stress evaluation
#[derive(Debug, Clone, Copy, Default)]
pub struct ElementActions {
    pub n: f64,
    pub mxx: f64,
    pub myy: f64,
    pub m11: f64,
    pub m22: f64,
    pub mzz: f64,
    pub vx: f64,
    pub vy: f64,
}

#[derive(Debug, Clone, Copy)]
struct GaussSample {
    weight: f64,
    shape: ShapeEval,
    point: Point,
}

/// A quadratic triangle with resolved coordinates and material
#[derive(Debug, Clone)]
pub struct Tri6<'a> {
    /// Element index within the mesh
    pub index: usize,
    /// Global node indices
    pub nodes: [usize; 6],
    /// Node coordinates
    pub coords: [Point; 6],
    /// Element material
    pub material: &'a Material,
    samples: [GaussSample; 6],
}

impl<'a> Tri6<'a> {
    /// Create an element, evaluating its shape functions at the Gauss points
    pub fn new(
        index: usize,
        nodes: [usize; 6],
        coords: [Point; 6],
        material: &'a Material,
    ) -> SectionResult<Self> {
        let gps = gauss_points();
        let mut samples = [GaussSample {
            weight: 0.0,
            shape: ShapeEval {
                n: Vec6::zeros(),
                b: Mat2x6::zeros(),
                j: 0.0,
            },
            point: [0.0, 0.0],
        }; 6];

        for (sample, gp) in samples.iter_mut().zip(gps.iter()) {
            let shape = math::shape_function(&coords, gp.coords).ok_or_else(|| {
                SectionError::InvalidMesh {
                    element: index,
                    reason: "singular jacobian".to_string(),
                }
            })?;
            if shape.j <= 0.0 {
                return Err(SectionError::InvalidMesh {
                    element: index,
                    reason: format!("non-positive jacobian {:e}", shape.j),
                });
            }
            *sample = GaussSample {
                weight: gp.weight,
                point: math::interpolate(&shape.n, &coords),
                shape,
            };
        }

        Ok(Self {
            index,
            nodes,
            coords,
            material,
            samples,
        })
    }

    fn e(&self) -> f64 {
        self.material.elastic_modulus
    }

    /// Corner coordinates
    pub fn corners(&self) -> [Point; 3] {
        [self.coords[0], self.coords[1], self.coords[2]]
    }

    /// Element area
    pub fn area(&self) -> f64 {
        self.samples.iter().map(|s| s.weight * s.shape.j).sum()
    }

    /// Unweighted area, first and second moment integrals
    pub fn area_integrals(&self) -> AreaIntegrals {
        let mut out = AreaIntegrals::default();
        for s in &self.samples {
            let [x, y] = s.point;
            let w = s.weight * s.shape.j;
            out.area += w;
            out.qx += w * y;
            out.qy += w * x;
            out.ixx += w * y * y;
            out.iyy += w * x * x;
            out.ixy += w * x * y;
        }
        out
    }

    /// Stiffness matrix and load vector of the torsion (warping) problem
    pub fn torsion_properties(&self) -> (Mat6, Vec6) {
        let mut k = Mat6::zeros();
        let mut f = Vec6::zeros();
        for s in &self.samples {
            let [x, y] = s.point;
            let w = s.weight * s.shape.j * self.e();
            k += w * s.shape.b.transpose() * s.shape.b;
            f += w * s.shape.b.transpose() * Vec2::new(y, -x);
        }
        (k, f)
    }

    /// Modulus weighted integral of the shape functions
    pub fn shape_integral(&self) -> Vec6 {
        self.samples
            .iter()
            .map(|s| s.weight * s.shape.j * self.e() * s.shape.n)
            .fold(Vec6::zeros(), |a, b| a + b)
    }

    /// Load vectors of the two shear function problems
    pub fn shear_load_vectors(&self, ixx: f64, iyy: f64, ixy: f64, nu: f64) -> (Vec6, Vec6) {
        let mut f_psi = Vec6::zeros();
        let mut f_phi = Vec6::zeros();
        for s in &self.samples {
            let [x, y] = s.point;
            let (d, h) = shear_parameters(x, y, ixx, iyy, ixy);
            let w = s.weight * s.shape.j * self.e();
            let bt = s.shape.b.transpose();
            f_psi += w
                * (nu / 2.0 * bt * d + 2.0 * (1.0 + nu) * s.shape.n * (ixx * x - ixy * y));
            f_phi += w
                * (nu / 2.0 * bt * h + 2.0 * (1.0 + nu) * s.shape.n * (iyy * y - ixy * x));
        }
        (f_psi, f_phi)
    }

    /// Shear centre and warping integrals for the element values of omega
    pub fn warping_integrals(&self, ixx: f64, iyy: f64, ixy: f64, omega: &Vec6) -> WarpingIntegrals {
        let mut out = WarpingIntegrals::default();
        for s in &self.samples {
            let [x, y] = s.point;
            let n_omega = s.shape.n.dot(omega);
            let w = s.weight * s.shape.j * self.e();
            let r2 = x * x + y * y;
            out.sc_xint += w * (iyy * x + ixy * y) * r2;
            out.sc_yint += w * (ixx * y + ixy * x) * r2;
            out.q_omega += w * n_omega;
            out.i_omega += w * n_omega * n_omega;
            out.i_xomega += w * x * n_omega;
            out.i_yomega += w * y * n_omega;
        }
        out
    }

    /// Shear deformation coefficients (kappa_x, kappa_y, kappa_xy)
    pub fn shear_coefficients(
        &self,
        ixx: f64,
        iyy: f64,
        ixy: f64,
        psi: &Vec6,
        phi: &Vec6,
        nu: f64,
    ) -> (f64, f64, f64) {
        let mut kx = 0.0;
        let mut ky = 0.0;
        let mut kxy = 0.0;
        for s in &self.samples {
            let [x, y] = s.point;
            let (d, h) = shear_parameters(x, y, ixx, iyy, ixy);
            let w = s.weight * s.shape.j * self.e();
            let gpsi = s.shape.b * psi - nu / 2.0 * d;
            let gphi = s.shape.b * phi - nu / 2.0 * h;
            kx += w * gpsi.dot(&gpsi);
            ky += w * gphi.dot(&gphi);
            kxy += w * gpsi.dot(&gphi);
        }
        (kx, ky, kxy)
    }

    /// Integrals for the monosymmetry constants: (x, y, 11, 22)
    pub fn monosymmetry_integrals(&self, phi: f64) -> [f64; 4] {
        let mut out = [0.0; 4];
        for s in &self.samples {
            let [x, y] = s.point;
            let (x11, y22) = principal_coordinate(phi, x, y);
            let w = s.weight * s.shape.j * self.e();
            out[0] += w * (x * x * y + y * y * y);
            out[1] += w * (y * y * x + x * x * x);
            out[2] += w * (x11 * x11 * y22 + y22 * y22 * y22);
            out[3] += w * (y22 * y22 * x11 + x11 * x11 * x11);
        }
        out
    }

    /// Nodal stresses of the element for the given actions.
    ///
    /// Coordinates must be centroidal. `omega`, `psi` and `phi` are the
    /// element values of the warping and shear functions; they are only
    /// read when the matching action is non-zero. Values are evaluated at
    /// the Gauss points and extrapolated to the nodes with `h_inv`.
    pub fn stress(
        &self,
        actions: &ElementActions,
        c: &StressConstants,
        omega: &Vec6,
        psi: &Vec6,
        phi: &Vec6,
        h_inv: &Mat6,
    ) -> ElementStress {
        let mut gp = ElementStress::zeros();
        let det = c.ixx * c.iyy - c.ixy * c.ixy;

        for (g, s) in self.samples.iter().enumerate() {
            let [x, y] = s.point;
            let (x11, y22) = principal_coordinate(c.phi, x, y);

            gp.sig_zz_n[g] = actions.n / c.ea;
            gp.sig_zz_mxx[g] = -(c.ixy * actions.mxx) / det * x + (c.iyy * actions.mxx) / det * y;
            gp.sig_zz_myy[g] = -(c.ixx * actions.myy) / det * x + (c.ixy * actions.myy) / det * y;
            gp.sig_zz_m11[g] = actions.m11 / c.i11 * y22;
            gp.sig_zz_m22[g] = -actions.m22 / c.i22 * x11;

            if actions.mzz != 0.0 {
                let t = actions.mzz / c.j * (s.shape.b * omega - Vec2::new(y, -x));
                gp.sig_zx_mzz[g] = t[0];
                gp.sig_zy_mzz[g] = t[1];
            }

            if actions.vx != 0.0 || actions.vy != 0.0 {
                let (d, h) = shear_parameters(x, y, c.ixx, c.iyy, c.ixy);
                if actions.vx != 0.0 {
                    let t = actions.vx / c.delta_s * (s.shape.b * psi - c.nu / 2.0 * d);
                    gp.sig_zx_vx[g] = t[0];
                    gp.sig_zy_vx[g] = t[1];
                }
                if actions.vy != 0.0 {
                    let t = actions.vy / c.delta_s * (s.shape.b * phi - c.nu / 2.0 * h);
                    gp.sig_zx_vy[g] = t[0];
                    gp.sig_zy_vy[g] = t[1];
                }
            }
        }

        let e = self.e();
        let nodal = |v: &Vec6| h_inv * v * e;
        ElementStress {
            sig_zz_n: nodal(&gp.sig_zz_n),
            sig_zz_mxx: nodal(&gp.sig_zz_mxx),
            sig_zz_myy: nodal(&gp.sig_zz_myy),
            sig_zz_m11: nodal(&gp.sig_zz_m11),
            sig_zz_m22: nodal(&gp.sig_zz_m22),
            sig_zx_mzz: nodal(&gp.sig_zx_mzz),
            sig_zy_mzz: nodal(&gp.sig_zy_mzz),
            sig_zx_vx: nodal(&gp.sig_zx_vx),
            sig_zy_vx: nodal(&gp.sig_zy_vx),
            sig_zx_vy: nodal(&gp.sig_zx_vy),
            sig_zy_vy: nodal(&gp.sig_zy_vy),
        }
    }

    /// Area coordinates of `p` if it lies within the element (straight sides)
    pub fn local_coordinates(&self, p: Point, tol: f64) -> Option<[f64; 3]> {
        let [a, b, c] = self.corners();
        let l = barycentric(p, a, b, c)?;
        if l.iter().all(|v| *v >= -tol) {
            Some(l)
        } else {
            None
        }
    }

    /// Area and centroid of the part of the element where `normal . p >= offset`
    pub fn clipped_area(&self, normal: Point, offset: f64) -> (f64, Point) {
        let clipped = clip_half_plane(&self.corners(), normal, offset);
        if clipped.len() < 3 {
            return (0.0, [0.0, 0.0]);
        }
        polygon_area_centroid(&clipped)
    }
}

/// The (d1, d2) and (h1, h2) terms of the shear function formulation
fn shear_parameters(x: f64, y: f64, ixx: f64, iyy: f64, ixy: f64) -> (Vec2, Vec2) {
    let r = x * x - y * y;
    let q = 2.0 * x * y;
    let d = Vec2::new(ixx * r - ixy * q, ixy * r + ixx * q);
    let h = Vec2::new(-ixy * r + iyy * q, -iyy * r - ixy * q);
    (d, h)
}
