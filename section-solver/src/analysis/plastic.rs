//! Plastic neutral axes and plastic section moduli
//!
//! For each bending axis a straight neutral axis is moved along its normal
//! until the yield force on one side balances the other. The root is found
//! with Brent's method, bracketed by the extent of the section along the
//! normal.

use argmin::core::{CostFunction, Executor, State, TerminationReason};
use argmin::solver::brent::BrentRoot;
use log::{debug, info};

use crate::analysis::{map_elements, AnalysisOptions, Deadline, Stage};
use crate::elements::Tri6;
use crate::error::{SectionError, SectionResult};
use crate::math::{polygon_area_centroid, Point};
use crate::mesh::Mesh;
use crate::results::{BySide, GeometricProperties, PlasticProperties};

/// Net yield force across a trial neutral axis `normal . p = offset`,
/// as a fraction of the total yield force
struct ForceBalance<'a> {
    elements: &'a [Tri6<'a>],
    normal: Point,
    total_force: f64,
    parallel: bool,
}

/// Yield force and its first moment on one side of the axis
#[derive(Debug, Clone, Copy, Default)]
struct SideForce {
    above: f64,
    below: f64,
    moment: f64,
}

impl std::ops::Add for SideForce {
    type Output = Self;

    fn add(self, o: Self) -> Self {
        Self {
            above: self.above + o.above,
            below: self.below + o.below,
            moment: self.moment + o.moment,
        }
    }
}

impl<'a> ForceBalance<'a> {
    fn sides(&self, offset: f64) -> SideForce {
        let n = self.normal;
        map_elements(
            self.elements.len(),
            self.parallel,
            SideForce::default(),
            |i| {
                let el = &self.elements[i];
                let fy = el.material.yield_strength;
                let (area, centroid) = polygon_area_centroid(&el.corners());
                let (a1, c1) = el.clipped_area(n, offset);
                let a2 = area - a1;

                let lever = |p: Point| n[0] * p[0] + n[1] * p[1] - offset;
                let mut moment = fy * a1 * lever(c1);
                if a2 > 0.0 {
                    let c2 = [
                        (area * centroid[0] - a1 * c1[0]) / a2,
                        (area * centroid[1] - a1 * c1[1]) / a2,
                    ];
                    moment -= fy * a2 * lever(c2);
                }
                SideForce {
                    above: fy * a1,
                    below: fy * a2,
                    moment,
                }
            },
            |a, b| a + b,
        )
    }
}

impl CostFunction for ForceBalance<'_> {
    type Param = f64;
    type Output = f64;

    fn cost(&self, offset: &f64) -> Result<f64, argmin::core::Error> {
        let s = self.sides(*offset);
        Ok((s.above - s.below) / self.total_force)
    }
}

/// Offset of the plastic neutral axis with normal `normal` and the plastic
/// modulus about it
fn neutral_axis(
    elements: &[Tri6<'_>],
    normal: Point,
    options: &AnalysisOptions,
) -> SectionResult<(f64, f64)> {
    let (lo, hi) = elements
        .iter()
        .flat_map(|el| el.corners())
        .map(|p| normal[0] * p[0] + normal[1] * p[1])
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
            (lo.min(d), hi.max(d))
        });

    let total_force = elements
        .iter()
        .map(|el| el.material.yield_strength * el.area())
        .sum::<f64>();
    let problem = ForceBalance {
        elements,
        normal,
        total_force,
        parallel: options.parallel,
    };

    let tol = options.plastic_tolerance * (hi - lo);
    let solver = BrentRoot::new(lo, hi, tol);
    let res = Executor::new(problem, solver)
        .configure(|state| state.max_iters(options.plastic_max_iterations))
        .run()
        .map_err(|e| SectionError::NumericalFailure(format!("plastic neutral axis: {e}")))?;

    let state = res.state();
    if let Some(TerminationReason::MaxItersReached) = state.get_termination_reason() {
        return Err(SectionError::ConvergenceFailed {
            solver: "Brent root finder (plastic neutral axis)".to_string(),
            iterations: state.get_iter() as usize,
            residual: state.get_cost().abs(),
        });
    }
    let offset = *state.get_best_param().ok_or_else(|| {
        SectionError::NumericalFailure("plastic neutral axis not found".to_string())
    })?;
    debug!(
        "Plastic neutral axis n = ({:.4}, {:.4}): offset {:.6} after {} iterations",
        normal[0],
        normal[1],
        offset,
        state.get_iter()
    );

    let balance = ForceBalance {
        elements,
        normal,
        total_force,
        parallel: options.parallel,
    };
    Ok((offset, balance.sides(offset).moment))
}

/// Runs the plastic stage. Shape factors are only formed for sections made
/// of the default material.
pub(crate) fn calculate(
    mesh: &Mesh,
    geom: &GeometricProperties,
    composite: bool,
    options: &AnalysisOptions,
    deadline: &Deadline,
) -> SectionResult<PlasticProperties> {
    let elements = mesh.tri6_elements()?;
    let (s, c) = geom.phi.to_radians().sin_cos();
    let centroid = [geom.cx, geom.cy];
    let along = |n: Point| n[0] * centroid[0] + n[1] * centroid[1];

    deadline.check(Stage::Plastic)?;
    let (y_pc, sxx) = neutral_axis(&elements, [0.0, 1.0], options)?;
    deadline.check(Stage::Plastic)?;
    let (x_pc, syy) = neutral_axis(&elements, [1.0, 0.0], options)?;

    let n11 = [-s, c];
    let n22 = [c, s];
    deadline.check(Stage::Plastic)?;
    let (d11, s11) = neutral_axis(&elements, n11, options)?;
    deadline.check(Stage::Plastic)?;
    let (d22, s22) = neutral_axis(&elements, n22, options)?;

    let mut props = PlasticProperties {
        x_pc,
        y_pc,
        x11_pc: d22 - along(n22),
        y22_pc: d11 - along(n11),
        sxx,
        syy,
        s11,
        s22,
        ..Default::default()
    };

    if !composite {
        let sf = |s: f64, z: &BySide| BySide::new(s / z.plus, s / z.minus);
        props.sf_xx = sf(sxx, &geom.zxx);
        props.sf_yy = sf(syy, &geom.zyy);
        props.sf_11 = sf(s11, &geom.z11);
        props.sf_22 = sf(s22, &geom.z22);
    }

    info!(
        "Plastic analysis: centroid = ({:.6}, {:.6}), Sxx = {:.6e}, Syy = {:.6e}",
        props.x_pc, props.y_pc, props.sxx, props.syy
    );
    Ok(props)
}
