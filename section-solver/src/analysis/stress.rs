//! Stress recovery for a load case
//!
//! Stresses are evaluated at the Gauss points of every element, extrapolated
//! to the element nodes and averaged over the elements of one material that
//! share a node. A node on the interface of two materials therefore carries
//! one value per material.

use log::debug;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::analysis::{collect_elements, AnalysisOptions, Stage};
use crate::elements::{ElementActions, ElementStress, StressConstants, Tri6};
use crate::error::{SectionError, SectionResult};
use crate::loads::LoadCase;
use crate::math::{extrapolation_matrix, shape_functions, Mat6, Point, Vec6};
use crate::mesh::Mesh;
use crate::results::{GeometricProperties, WarpingProperties};

/// Stress components at one node, per action and combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodalStress {
    pub sig_zz_n: f64,
    pub sig_zz_mxx: f64,
    pub sig_zz_myy: f64,
    pub sig_zz_m11: f64,
    pub sig_zz_m22: f64,
    pub sig_zz_m: f64,
    pub sig_zx_mzz: f64,
    pub sig_zy_mzz: f64,
    pub sig_zxy_mzz: f64,
    pub sig_zx_vx: f64,
    pub sig_zy_vx: f64,
    pub sig_zxy_vx: f64,
    pub sig_zx_vy: f64,
    pub sig_zy_vy: f64,
    pub sig_zxy_vy: f64,
    pub sig_zx_v: f64,
    pub sig_zy_v: f64,
    pub sig_zxy_v: f64,
    pub sig_zz: f64,
    pub sig_zx: f64,
    pub sig_zy: f64,
    pub sig_zxy: f64,
    pub sig_11: f64,
    pub sig_33: f64,
    pub sig_vm: f64,
}

impl NodalStress {
    /// Builds the derived fields from the eleven independent components
    fn from_components(c: [f64; 11]) -> Self {
        let [n, mxx, myy, m11, m22, zx_mzz, zy_mzz, zx_vx, zy_vx, zx_vy, zy_vy] = c;
        let sig_zz_m = mxx + myy + m11 + m22;
        let sig_zx_v = zx_vx + zx_vy;
        let sig_zy_v = zy_vx + zy_vy;
        let sig_zz = n + sig_zz_m;
        let sig_zx = zx_mzz + sig_zx_v;
        let sig_zy = zy_mzz + sig_zy_v;
        let sig_zxy = sig_zx.hypot(sig_zy);

        let half = 0.5 * sig_zz;
        let radius = half.hypot(sig_zxy);
        Self {
            sig_zz_n: n,
            sig_zz_mxx: mxx,
            sig_zz_myy: myy,
            sig_zz_m11: m11,
            sig_zz_m22: m22,
            sig_zz_m,
            sig_zx_mzz: zx_mzz,
            sig_zy_mzz: zy_mzz,
            sig_zxy_mzz: zx_mzz.hypot(zy_mzz),
            sig_zx_vx: zx_vx,
            sig_zy_vx: zy_vx,
            sig_zxy_vx: zx_vx.hypot(zy_vx),
            sig_zx_vy: zx_vy,
            sig_zy_vy: zy_vy,
            sig_zxy_vy: zx_vy.hypot(zy_vy),
            sig_zx_v,
            sig_zy_v,
            sig_zxy_v: sig_zx_v.hypot(sig_zy_v),
            sig_zz,
            sig_zx,
            sig_zy,
            sig_zxy,
            sig_11: half + radius,
            sig_33: half - radius,
            sig_vm: (sig_zz * sig_zz + 3.0 * sig_zxy * sig_zxy).sqrt(),
        }
    }

    fn components(&self) -> [f64; 11] {
        [
            self.sig_zz_n,
            self.sig_zz_mxx,
            self.sig_zz_myy,
            self.sig_zz_m11,
            self.sig_zz_m22,
            self.sig_zx_mzz,
            self.sig_zy_mzz,
            self.sig_zx_vx,
            self.sig_zy_vx,
            self.sig_zx_vy,
            self.sig_zy_vy,
        ]
    }
}

/// Nodal stresses of the elements made of one material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialStress {
    /// Material name
    pub material: String,
    /// Mesh node indices, ascending
    pub nodes: Vec<usize>,
    /// Stress at each entry of `nodes`
    pub stresses: Vec<NodalStress>,
}

/// Stress at an arbitrary point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointStress {
    pub sig_zz: f64,
    pub sig_zx: f64,
    pub sig_zy: f64,
}

/// Stresses of one load case over the whole section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressResult {
    pub load: LoadCase,
    pub materials: Vec<MaterialStress>,
}

impl StressResult {
    /// Node by node sum of two results of the same section
    pub fn add(&self, other: &StressResult) -> SectionResult<StressResult> {
        let same_layout = self.materials.len() == other.materials.len()
            && self
                .materials
                .iter()
                .zip(other.materials.iter())
                .all(|(a, b)| a.material == b.material && a.nodes == b.nodes);
        if !same_layout {
            return Err(SectionError::InvalidInput(
                "stress results belong to different sections".to_string(),
            ));
        }

        let materials = self
            .materials
            .iter()
            .zip(other.materials.iter())
            .map(|(a, b)| MaterialStress {
                material: a.material.clone(),
                nodes: a.nodes.clone(),
                stresses: a
                    .stresses
                    .iter()
                    .zip(b.stresses.iter())
                    .map(|(sa, sb)| {
                        let (ca, cb) = (sa.components(), sb.components());
                        NodalStress::from_components(std::array::from_fn(|i| ca[i] + cb[i]))
                    })
                    .collect(),
            })
            .collect();

        Ok(StressResult {
            load: &self.load + &other.load,
            materials,
        })
    }

    /// Stresses of the material called `name`
    pub fn material(&self, name: &str) -> Option<&MaterialStress> {
        self.materials.iter().find(|m| m.material == name)
    }

    fn all(&self) -> impl Iterator<Item = &NodalStress> {
        self.materials.iter().flat_map(|m| m.stresses.iter())
    }

    /// Largest von Mises stress in the section
    pub fn max_von_mises(&self) -> f64 {
        self.all().map(|s| s.sig_vm).fold(0.0, f64::max)
    }

    /// Smallest and largest normal stress in the section
    pub fn sig_zz_range(&self) -> (f64, f64) {
        self.all().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
            (lo.min(s.sig_zz), hi.max(s.sig_zz))
        })
    }

    /// Largest resultant shear stress in the section
    pub fn max_shear(&self) -> f64 {
        self.all().map(|s| s.sig_zxy).fold(0.0, f64::max)
    }
}

/// Everything needed to evaluate element stresses of one load case
struct Recovery<'a> {
    elements: Vec<Tri6<'a>>,
    constants: StressConstants,
    actions: ElementActions,
    omega: DVector<f64>,
    psi: DVector<f64>,
    phi: DVector<f64>,
    h_inv: Mat6,
}

impl<'a> Recovery<'a> {
    fn new(
        centroidal: &'a Mesh,
        geom: &GeometricProperties,
        warping: Option<&WarpingProperties>,
        load: &LoadCase,
    ) -> SectionResult<Self> {
        if load.needs_warping() && warping.is_none() {
            return Err(SectionError::StageNotComplete {
                requested: Stage::Stress,
                missing: Stage::Warping,
            });
        }
        let h_inv = extrapolation_matrix().ok_or_else(|| {
            SectionError::NumericalFailure("singular extrapolation matrix".to_string())
        })?;

        let nodal = |f: fn(&WarpingProperties) -> &Vec<f64>| match warping {
            Some(w) => DVector::from_column_slice(f(w)),
            None => DVector::zeros(centroidal.num_nodes()),
        };

        Ok(Self {
            elements: centroidal.tri6_elements()?,
            constants: StressConstants {
                ea: geom.ea,
                ixx: geom.ixx_c,
                iyy: geom.iyy_c,
                ixy: geom.ixy_c,
                i11: geom.i11_c,
                i22: geom.i22_c,
                phi: geom.phi,
                j: warping.map_or(0.0, |w| w.j),
                nu: geom.nu_eff,
                delta_s: warping.map_or(0.0, |w| w.delta_s),
            },
            actions: ElementActions {
                n: load.n,
                mxx: load.mxx,
                myy: load.myy,
                m11: load.m11,
                m22: load.m22,
                mzz: load.mzz,
                vx: load.vx,
                vy: load.vy,
            },
            omega: nodal(|w| &w.omega),
            psi: nodal(|w| &w.psi_shear),
            phi: nodal(|w| &w.phi_shear),
            h_inv,
        })
    }

    fn element_stress(&self, idx: usize) -> ElementStress {
        let el = &self.elements[idx];
        let local = |v: &DVector<f64>| Vec6::from_fn(|a, _| v[el.nodes[a]]);
        el.stress(
            &self.actions,
            &self.constants,
            &local(&self.omega),
            &local(&self.psi),
            &local(&self.phi),
            &self.h_inv,
        )
    }
}

fn element_components(s: &ElementStress) -> [Vec6; 11] {
    [
        s.sig_zz_n,
        s.sig_zz_mxx,
        s.sig_zz_myy,
        s.sig_zz_m11,
        s.sig_zz_m22,
        s.sig_zx_mzz,
        s.sig_zy_mzz,
        s.sig_zx_vx,
        s.sig_zy_vx,
        s.sig_zx_vy,
        s.sig_zy_vy,
    ]
}

/// Nodal stresses of every material for `load`
pub(crate) fn calculate(
    mesh: &Mesh,
    geom: &GeometricProperties,
    warping: Option<&WarpingProperties>,
    load: &LoadCase,
    options: &AnalysisOptions,
) -> SectionResult<StressResult> {
    let centroidal = mesh.shifted(-geom.cx, -geom.cy);
    let recovery = Recovery::new(&centroidal, geom, warping, load)?;
    let element_stresses = collect_elements(recovery.elements.len(), options.parallel, |i| {
        recovery.element_stress(i)
    });

    let n_nodes = mesh.num_nodes();
    let mut materials = Vec::with_capacity(mesh.materials().len());
    for (m, material) in mesh.materials().iter().enumerate() {
        let mut sums = vec![[0.0; 11]; n_nodes];
        let mut counts = vec![0usize; n_nodes];

        for (conn, es) in mesh.elements().iter().zip(element_stresses.iter()) {
            if conn.material != m {
                continue;
            }
            let comps = element_components(es);
            for (a, &node) in conn.nodes.iter().enumerate() {
                counts[node] += 1;
                for (sum, comp) in sums[node].iter_mut().zip(comps.iter()) {
                    *sum += comp[a];
                }
            }
        }

        let nodes: Vec<usize> = (0..n_nodes).filter(|&n| counts[n] > 0).collect();
        let stresses = nodes
            .iter()
            .map(|&n| {
                let k = counts[n] as f64;
                NodalStress::from_components(sums[n].map(|v| v / k))
            })
            .collect();
        materials.push(MaterialStress {
            material: material.name.clone(),
            nodes,
            stresses,
        });
    }

    debug!(
        "Stress recovery '{}': {} elements, {} material groups",
        load.name,
        element_stresses.len(),
        materials.len()
    );
    Ok(StressResult {
        load: load.clone(),
        materials,
    })
}

/// Stress at each of `points`; `None` where a point lies outside the mesh
pub(crate) fn at_points(
    mesh: &Mesh,
    geom: &GeometricProperties,
    warping: Option<&WarpingProperties>,
    load: &LoadCase,
    points: &[Point],
) -> SectionResult<Vec<Option<PointStress>>> {
    let centroidal = mesh.shifted(-geom.cx, -geom.cy);
    let recovery = Recovery::new(&centroidal, geom, warping, load)?;

    Ok(points
        .iter()
        .map(|p| {
            let (idx, l) = mesh.locate(*p)?;
            let n = shape_functions(l);
            let c = element_components(&recovery.element_stress(idx));
            let sig_zz: f64 = c[..5].iter().map(|v| n.dot(v)).sum();
            let sig_zx = n.dot(&c[5]) + n.dot(&c[7]) + n.dot(&c[9]);
            let sig_zy = n.dot(&c[6]) + n.dot(&c[8]) + n.dot(&c[10]);
            Some(PointStress {
                sig_zz,
                sig_zx,
                sig_zy,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_derived_stresses() {
        let s = NodalStress::from_components([3.0, 1.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_relative_eq!(s.sig_zz, 4.0);
        assert_relative_eq!(s.sig_zxy, 2.0);
        assert_relative_eq!(s.sig_vm, (16.0_f64 + 12.0).sqrt());
        assert_relative_eq!(s.sig_11 + s.sig_33, s.sig_zz, epsilon = 1e-12);
        assert_relative_eq!(s.sig_11 * s.sig_33, -4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_add_rejects_mismatched_results() {
        let a = StressResult {
            load: LoadCase::new("a"),
            materials: vec![MaterialStress {
                material: "default".to_string(),
                nodes: vec![0, 1],
                stresses: vec![NodalStress::default(); 2],
            }],
        };
        let mut b = a.clone();
        b.materials[0].nodes = vec![0, 2];
        assert!(a.add(&b).is_err());
        assert!(a.add(&a).is_ok());
    }
}
