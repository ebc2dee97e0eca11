//! Cross-section orchestrator
//!
//! A [`Section`] owns a validated mesh and the cached results of each
//! analysis stage. Stages must run in order: geometric first, then warping
//! and plastic in either order. Stress recovery is never cached.
//!
//! ```text
//! Unanalysed -> GeometricDone -> WarpingDone --+
//!                     |                        +-> Complete
//!                     +-------> PlasticDone ---+
//! ```
//!
//! Reassigning a material discards every cached stage.

use std::sync::Arc;

use log::{debug, info};

use crate::analysis::stress::{self, PointStress, StressResult};
use crate::analysis::{
    geometric, plastic, warping, AnalysisOptions, Deadline, SectionState, Stage,
};
use crate::elements::{CompoundGeometry, Material};
use crate::error::{SectionError, SectionResult};
use crate::loads::LoadCase;
use crate::math::Point;
use crate::mesh::{Mesh, Triangulator};
use crate::results::{
    BySide, FrameProperties, GeometricProperties, Monosymmetry, PlasticProperties,
    WarpingProperties,
};

/// Reference elastic modulus used to transform modulus weighted properties
/// back into geometric ones
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ERef(pub f64);

impl Default for ERef {
    fn default() -> Self {
        Self(1.0)
    }
}

impl From<f64> for ERef {
    fn from(e: f64) -> Self {
        Self(e)
    }
}

impl From<&Material> for ERef {
    fn from(m: &Material) -> Self {
        Self(m.elastic_modulus)
    }
}

impl ERef {
    fn value(self) -> SectionResult<f64> {
        if self.0 > 0.0 && self.0.is_finite() {
            Ok(self.0)
        } else {
            Err(SectionError::InvalidInput(format!(
                "reference elastic modulus must be positive, got {}",
                self.0
            )))
        }
    }
}

/// A meshed cross-section and its analysis results
#[derive(Debug, Clone)]
pub struct Section {
    mesh: Mesh,
    options: AnalysisOptions,
    geometric: Option<Arc<GeometricProperties>>,
    warping: Option<Arc<WarpingProperties>>,
    plastic: Option<Arc<PlasticProperties>>,
}

impl Section {
    /// Create a section from an existing mesh
    pub fn new(mesh: Mesh) -> Self {
        Self {
            mesh,
            options: AnalysisOptions::default(),
            geometric: None,
            warping: None,
            plastic: None,
        }
    }

    /// Mesh `geometry` with `triangulator` and create a section from it.
    ///
    /// `mesh_sizes` holds the maximum element area of each region; a single
    /// value applies to every region and zero leaves the region unrefined.
    pub fn from_geometry(
        geometry: &CompoundGeometry,
        triangulator: &dyn Triangulator,
        mesh_sizes: &[f64],
    ) -> SectionResult<Self> {
        let mesh = geometry.create_mesh(triangulator, mesh_sizes)?;
        info!(
            "Meshed section: {} nodes, {} elements, {} materials",
            mesh.num_nodes(),
            mesh.num_elements(),
            mesh.materials().len()
        );
        Ok(Self::new(mesh))
    }

    /// Replace the analysis options. Cached results are kept.
    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = options;
        self
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Whether any element uses a material other than the default one
    pub fn is_composite(&self) -> bool {
        self.mesh.materials().iter().any(|m| !m.is_default())
    }

    /// Which stages have results cached
    pub fn stage(&self) -> SectionState {
        match (
            self.geometric.is_some(),
            self.warping.is_some(),
            self.plastic.is_some(),
        ) {
            (false, _, _) => SectionState::Unanalysed,
            (true, false, false) => SectionState::GeometricDone,
            (true, true, false) => SectionState::WarpingDone,
            (true, false, true) => SectionState::PlasticDone,
            (true, true, true) => SectionState::Complete,
        }
    }

    /// Replace the material called `name` and discard all cached results
    pub fn reassign_material(&mut self, name: &str, material: Material) -> SectionResult<()> {
        self.mesh = self.mesh.with_material(name, material)?;
        self.invalidate();
        Ok(())
    }

    fn invalidate(&mut self) {
        debug!("Discarding cached section results");
        self.geometric = None;
        self.warping = None;
        self.plastic = None;
    }

    // ========================================================================
    // Analysis stages
    // ========================================================================

    /// Area properties, centroid, second moments and principal axes
    pub fn calculate_geometric_properties(&mut self) -> SectionResult<Arc<GeometricProperties>> {
        let props = Arc::new(geometric::calculate(&self.mesh, &self.options)?);
        self.geometric = Some(Arc::clone(&props));
        Ok(props)
    }

    /// Torsion and warping constants, shear centre, shear areas and
    /// monosymmetry constants. Requires the geometric stage.
    pub fn calculate_warping_properties(&mut self) -> SectionResult<Arc<WarpingProperties>> {
        let geom = self.require_geometric(Stage::Warping)?;
        let deadline = Deadline::start(self.options.time_limit);
        let props = Arc::new(warping::calculate(&self.mesh, &geom, &self.options, &deadline)?);
        self.warping = Some(Arc::clone(&props));
        Ok(props)
    }

    /// Plastic centroids, plastic moduli and shape factors. Requires the
    /// geometric stage.
    pub fn calculate_plastic_properties(&mut self) -> SectionResult<Arc<PlasticProperties>> {
        let geom = self.require_geometric(Stage::Plastic)?;
        let deadline = Deadline::start(self.options.time_limit);
        let props = Arc::new(plastic::calculate(
            &self.mesh,
            &geom,
            self.is_composite(),
            &self.options,
            &deadline,
        )?);
        self.plastic = Some(Arc::clone(&props));
        Ok(props)
    }

    /// Stiffness properties for frame analysis.
    ///
    /// Runs the geometric stage when it has not been run and solves only the
    /// torsion problem; the warping cache is left untouched.
    pub fn calculate_frame_properties(&mut self) -> SectionResult<FrameProperties> {
        let geom = match &self.geometric {
            Some(g) => Arc::clone(g),
            None => self.calculate_geometric_properties()?,
        };
        let deadline = Deadline::start(self.options.time_limit);
        let j = match &self.warping {
            Some(w) => w.j,
            None => warping::torsion_constant(&self.mesh, &geom, &self.options, &deadline)?,
        };

        Ok(FrameProperties {
            ea: geom.ea,
            cx: geom.cx,
            cy: geom.cy,
            eixx: geom.ixx_c,
            eiyy: geom.iyy_c,
            eixy: geom.ixy_c,
            ei11: geom.i11_c,
            ei22: geom.i22_c,
            ej: j,
            phi: geom.phi,
        })
    }

    /// Nodal stresses of every material under `load`.
    ///
    /// Requires the geometric stage, and the warping stage as well when the
    /// load carries torsion or shear.
    pub fn calculate_stress(&self, load: &LoadCase) -> SectionResult<StressResult> {
        let geom = self.require_geometric(Stage::Stress)?;
        let warping = self.warping_for(load)?;
        stress::calculate(&self.mesh, &geom, warping, load, &self.options)
    }

    /// Stress at arbitrary points under `load`; `None` for points outside
    /// the section
    pub fn get_stress_at_points(
        &self,
        points: &[Point],
        load: &LoadCase,
    ) -> SectionResult<Vec<Option<PointStress>>> {
        let geom = self.require_geometric(Stage::Stress)?;
        let warping = self.warping_for(load)?;
        stress::at_points(&self.mesh, &geom, warping, load, points)
    }

    fn require_geometric(&self, requested: Stage) -> SectionResult<Arc<GeometricProperties>> {
        self.geometric
            .clone()
            .ok_or(SectionError::StageNotComplete {
                requested,
                missing: Stage::Geometric,
            })
    }

    fn warping_for(&self, load: &LoadCase) -> SectionResult<Option<&WarpingProperties>> {
        match (&self.warping, load.needs_warping()) {
            (Some(w), _) => Ok(Some(w.as_ref())),
            (None, false) => Ok(None),
            (None, true) => Err(SectionError::StageNotComplete {
                requested: Stage::Stress,
                missing: Stage::Warping,
            }),
        }
    }

    // ========================================================================
    // Result access
    // ========================================================================

    fn geom(&self) -> SectionResult<&GeometricProperties> {
        self.geometric
            .as_deref()
            .ok_or(SectionError::StageNotComplete {
                requested: Stage::Geometric,
                missing: Stage::Geometric,
            })
    }

    fn warp(&self) -> SectionResult<&WarpingProperties> {
        self.warping
            .as_deref()
            .ok_or(SectionError::StageNotComplete {
                requested: Stage::Warping,
                missing: Stage::Warping,
            })
    }

    fn plast(&self) -> SectionResult<&PlasticProperties> {
        self.plastic
            .as_deref()
            .ok_or(SectionError::StageNotComplete {
                requested: Stage::Plastic,
                missing: Stage::Plastic,
            })
    }

    /// Fails for composite sections, where `property` is modulus weighted
    fn geometric_only(&self, property: &str, alternative: &str) -> SectionResult<()> {
        if self.is_composite() {
            Err(SectionError::CompositeAmbiguity(format!(
                "{property} is modulus weighted, use {alternative}"
            )))
        } else {
            Ok(())
        }
    }

    /// Fails for geometric-only sections, which carry no material data
    fn composite_only(&self, property: &str, alternative: &str) -> SectionResult<()> {
        if self.is_composite() {
            Ok(())
        } else {
            Err(SectionError::CompositeOnly(format!(
                "{property} needs material properties, consider {alternative}"
            )))
        }
    }

    // ---------------------------------------------------------------- geometric

    pub fn get_area(&self) -> SectionResult<f64> {
        Ok(self.geom()?.area)
    }

    pub fn get_perimeter(&self) -> SectionResult<f64> {
        Ok(self.geom()?.perimeter)
    }

    /// Mass per unit length
    pub fn get_mass(&self) -> SectionResult<f64> {
        Ok(self.geom()?.mass)
    }

    /// Axial rigidity divided by `e_ref`
    pub fn get_ea(&self, e_ref: impl Into<ERef>) -> SectionResult<f64> {
        Ok(self.geom()?.ea / e_ref.into().value()?)
    }

    /// First moments of area (Qx, Qy)
    pub fn get_q(&self) -> SectionResult<(f64, f64)> {
        self.geometric_only("get_q", "get_eq")?;
        self.get_eq(ERef::default())
    }

    pub fn get_eq(&self, e_ref: impl Into<ERef>) -> SectionResult<(f64, f64)> {
        let g = self.geom()?;
        let e = e_ref.into().value()?;
        Ok((g.qx / e, g.qy / e))
    }

    /// Global second moments of area (Ixx, Iyy, Ixy)
    pub fn get_ig(&self) -> SectionResult<(f64, f64, f64)> {
        self.geometric_only("get_ig", "get_eig")?;
        self.get_eig(ERef::default())
    }

    pub fn get_eig(&self, e_ref: impl Into<ERef>) -> SectionResult<(f64, f64, f64)> {
        let g = self.geom()?;
        let e = e_ref.into().value()?;
        Ok((g.ixx_g / e, g.iyy_g / e, g.ixy_g / e))
    }

    /// Elastic centroid
    pub fn get_c(&self) -> SectionResult<(f64, f64)> {
        let g = self.geom()?;
        Ok((g.cx, g.cy))
    }

    /// Centroidal second moments of area (Ixx, Iyy, Ixy)
    pub fn get_ic(&self) -> SectionResult<(f64, f64, f64)> {
        self.geometric_only("get_ic", "get_eic")?;
        self.get_eic(ERef::default())
    }

    pub fn get_eic(&self, e_ref: impl Into<ERef>) -> SectionResult<(f64, f64, f64)> {
        let g = self.geom()?;
        let e = e_ref.into().value()?;
        Ok((g.ixx_c / e, g.iyy_c / e, g.ixy_c / e))
    }

    /// Elastic section moduli (Zxx, Zyy)
    pub fn get_z(&self) -> SectionResult<(BySide, BySide)> {
        self.geometric_only("get_z", "get_ez")?;
        self.get_ez(ERef::default())
    }

    pub fn get_ez(&self, e_ref: impl Into<ERef>) -> SectionResult<(BySide, BySide)> {
        let g = self.geom()?;
        let e = e_ref.into().value()?;
        Ok((g.zxx.scaled(e), g.zyy.scaled(e)))
    }

    /// Radii of gyration about the centroidal axes (rx, ry)
    pub fn get_rc(&self) -> SectionResult<(f64, f64)> {
        let g = self.geom()?;
        Ok((g.rx, g.ry))
    }

    /// Principal second moments of area (I11, I22)
    pub fn get_ip(&self) -> SectionResult<(f64, f64)> {
        self.geometric_only("get_ip", "get_eip")?;
        self.get_eip(ERef::default())
    }

    pub fn get_eip(&self, e_ref: impl Into<ERef>) -> SectionResult<(f64, f64)> {
        let g = self.geom()?;
        let e = e_ref.into().value()?;
        Ok((g.i11_c / e, g.i22_c / e))
    }

    /// Principal axis angle in degrees
    pub fn get_phi(&self) -> SectionResult<f64> {
        Ok(self.geom()?.phi)
    }

    /// Elastic section moduli about the principal axes (Z11, Z22)
    pub fn get_zp(&self) -> SectionResult<(BySide, BySide)> {
        self.geometric_only("get_zp", "get_ezp")?;
        self.get_ezp(ERef::default())
    }

    pub fn get_ezp(&self, e_ref: impl Into<ERef>) -> SectionResult<(BySide, BySide)> {
        let g = self.geom()?;
        let e = e_ref.into().value()?;
        Ok((g.z11.scaled(e), g.z22.scaled(e)))
    }

    /// Radii of gyration about the principal axes (r11, r22)
    pub fn get_rp(&self) -> SectionResult<(f64, f64)> {
        let g = self.geom()?;
        Ok((g.r11, g.r22))
    }

    pub fn get_e_eff(&self) -> SectionResult<f64> {
        self.composite_only("get_e_eff", "get_ea")?;
        Ok(self.geom()?.e_eff)
    }

    pub fn get_g_eff(&self) -> SectionResult<f64> {
        self.composite_only("get_g_eff", "get_ea")?;
        Ok(self.geom()?.g_eff)
    }

    pub fn get_nu_eff(&self) -> SectionResult<f64> {
        self.composite_only("get_nu_eff", "get_ea")?;
        Ok(self.geom()?.nu_eff)
    }

    /// First yield moments about the centroidal axes (My_xx, My_yy)
    pub fn get_my(&self) -> SectionResult<(f64, f64)> {
        self.composite_only("get_my", "get_z")?;
        let g = self.geom()?;
        Ok((g.my_xx, g.my_yy))
    }

    /// First yield moments about the principal axes (My_11, My_22)
    pub fn get_my_p(&self) -> SectionResult<(f64, f64)> {
        self.composite_only("get_my_p", "get_zp")?;
        let g = self.geom()?;
        Ok((g.my_11, g.my_22))
    }

    // ------------------------------------------------------------------ warping

    /// Torsion constant
    pub fn get_j(&self) -> SectionResult<f64> {
        self.geometric_only("get_j", "get_ej")?;
        self.get_ej(ERef::default())
    }

    pub fn get_ej(&self, e_ref: impl Into<ERef>) -> SectionResult<f64> {
        let e = e_ref.into().value()?;
        Ok(self.warp()?.j / e)
    }

    /// Warping constant
    pub fn get_iw(&self) -> SectionResult<f64> {
        self.geometric_only("get_iw", "get_eiw")?;
        self.get_eiw(ERef::default())
    }

    pub fn get_eiw(&self, e_ref: impl Into<ERef>) -> SectionResult<f64> {
        let e = e_ref.into().value()?;
        Ok(self.warp()?.gamma / e)
    }

    /// Shear centre, elasticity approach
    pub fn get_sc(&self) -> SectionResult<(f64, f64)> {
        let w = self.warp()?;
        Ok((w.x_se, w.y_se))
    }

    /// Shear centre in principal coordinates relative to the centroid
    pub fn get_sc_p(&self) -> SectionResult<(f64, f64)> {
        let w = self.warp()?;
        Ok((w.x11_se, w.y22_se))
    }

    /// Shear centre, Trefftz's approach
    pub fn get_sc_t(&self) -> SectionResult<(f64, f64)> {
        let w = self.warp()?;
        Ok((w.x_st, w.y_st))
    }

    /// Shear areas (A_sx, A_sy)
    pub fn get_as(&self) -> SectionResult<(f64, f64)> {
        self.geometric_only("get_as", "get_eas")?;
        self.get_eas(ERef::default())
    }

    pub fn get_eas(&self, e_ref: impl Into<ERef>) -> SectionResult<(f64, f64)> {
        let e = e_ref.into().value()?;
        let w = self.warp()?;
        Ok((w.a_sx / e, w.a_sy / e))
    }

    /// Principal shear areas (A_s11, A_s22)
    pub fn get_as_p(&self) -> SectionResult<(f64, f64)> {
        self.geometric_only("get_as_p", "get_eas_p")?;
        self.get_eas_p(ERef::default())
    }

    pub fn get_eas_p(&self, e_ref: impl Into<ERef>) -> SectionResult<(f64, f64)> {
        let e = e_ref.into().value()?;
        let w = self.warp()?;
        Ok((w.a_s11 / e, w.a_s22 / e))
    }

    /// Monosymmetry constants
    pub fn get_beta(&self) -> SectionResult<Monosymmetry> {
        Ok(self.warp()?.beta)
    }

    // ------------------------------------------------------------------ plastic

    /// Plastic centroid for bending about the global axes
    pub fn get_pc(&self) -> SectionResult<(f64, f64)> {
        let p = self.plast()?;
        Ok((p.x_pc, p.y_pc))
    }

    /// Plastic centroid for bending about the principal axes
    pub fn get_pc_p(&self) -> SectionResult<(f64, f64)> {
        let p = self.plast()?;
        Ok((p.x11_pc, p.y22_pc))
    }

    /// Plastic section moduli (Sxx, Syy)
    pub fn get_s(&self) -> SectionResult<(f64, f64)> {
        self.geometric_only("get_s", "get_mp")?;
        let p = self.plast()?;
        Ok((p.sxx, p.syy))
    }

    /// Plastic section moduli about the principal axes (S11, S22)
    pub fn get_sp(&self) -> SectionResult<(f64, f64)> {
        self.geometric_only("get_sp", "get_mp_p")?;
        let p = self.plast()?;
        Ok((p.s11, p.s22))
    }

    /// Plastic moments (Mp_xx, Mp_yy)
    pub fn get_mp(&self) -> SectionResult<(f64, f64)> {
        self.composite_only("get_mp", "get_s")?;
        let p = self.plast()?;
        Ok((p.sxx, p.syy))
    }

    /// Plastic moments about the principal axes (Mp_11, Mp_22)
    pub fn get_mp_p(&self) -> SectionResult<(f64, f64)> {
        self.composite_only("get_mp_p", "get_sp")?;
        let p = self.plast()?;
        Ok((p.s11, p.s22))
    }

    /// Shape factors (SF_xx, SF_yy)
    pub fn get_sf(&self) -> SectionResult<(BySide, BySide)> {
        self.geometric_only("get_sf", "get_mp and get_my")?;
        let p = self.plast()?;
        Ok((p.sf_xx, p.sf_yy))
    }

    /// Shape factors about the principal axes (SF_11, SF_22)
    pub fn get_sf_p(&self) -> SectionResult<(BySide, BySide)> {
        self.geometric_only("get_sf_p", "get_mp_p and get_my_p")?;
        let p = self.plast()?;
        Ok((p.sf_11, p.sf_22))
    }
}
