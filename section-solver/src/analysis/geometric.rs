//! Area properties, centroid and principal axes

use std::ops::Add;

use log::info;

use crate::analysis::{map_elements, AnalysisOptions};
use crate::elements::{AreaIntegrals, Tri6};
use crate::error::{SectionError, SectionResult};
use crate::math::principal_coordinate;
use crate::mesh::Mesh;
use crate::results::{BySide, GeometricProperties};

#[derive(Debug, Clone, Copy, Default)]
struct Sums {
    area: f64,
    mass: f64,
    ga: f64,
    weighted: AreaIntegrals,
}

impl Add for Sums {
    type Output = Self;

    fn add(self, o: Self) -> Self {
        Self {
            area: self.area + o.area,
            mass: self.mass + o.mass,
            ga: self.ga + o.ga,
            weighted: self.weighted + o.weighted,
        }
    }
}

/// Principal second moments and axis angle (degrees) of a centroidal tensor
pub fn principal_axes(ixx: f64, iyy: f64, ixy: f64) -> (f64, f64, f64) {
    let avg = 0.5 * (ixx + iyy);
    let diff = (0.25 * (ixx - iyy).powi(2) + ixy * ixy).sqrt();
    let i11 = avg + diff;
    let i22 = avg - diff;

    let phi = if (ixx - i11).abs() < 1e-12 * i11 {
        0.0
    } else {
        (ixx - i11).atan2(ixy).to_degrees()
    };
    (i11, i22, phi)
}

/// Runs the geometric stage over every element of the mesh
pub(crate) fn calculate(mesh: &Mesh, options: &AnalysisOptions) -> SectionResult<GeometricProperties> {
    let elements = mesh.tri6_elements()?;

    let sums = map_elements(
        elements.len(),
        options.parallel,
        Sums::default(),
        |i| {
            let el = &elements[i];
            let a = el.area_integrals();
            Sums {
                area: a.area,
                mass: a.area * el.material.density,
                ga: a.area * el.material.shear_modulus(),
                weighted: a.scaled(el.material.elastic_modulus),
            }
        },
        |a, b| a + b,
    );

    let w = sums.weighted;
    if !(w.area > 0.0) {
        return Err(SectionError::NumericalFailure(format!(
            "non-positive axial rigidity {:e}",
            w.area
        )));
    }

    let ea = w.area;
    let cx = w.qy / ea;
    let cy = w.qx / ea;
    let ixx_c = w.ixx - w.qx * w.qx / ea;
    let iyy_c = w.iyy - w.qy * w.qy / ea;
    let ixy_c = w.ixy - w.qx * w.qy / ea;
    let (i11_c, i22_c, phi) = principal_axes(ixx_c, iyy_c, ixy_c);

    let e_eff = ea / sums.area;
    let g_eff = sums.ga / sums.area;

    let mut props = GeometricProperties {
        area: sums.area,
        perimeter: mesh.perimeter(),
        mass: sums.mass,
        ea,
        ga: sums.ga,
        e_eff,
        g_eff,
        nu_eff: e_eff / (2.0 * g_eff) - 1.0,
        qx: w.qx,
        qy: w.qy,
        ixx_g: w.ixx,
        iyy_g: w.iyy,
        ixy_g: w.ixy,
        cx,
        cy,
        ixx_c,
        iyy_c,
        ixy_c,
        rx: (ixx_c / ea).sqrt(),
        ry: (iyy_c / ea).sqrt(),
        i11_c,
        i22_c,
        phi,
        r11: (i11_c / ea).sqrt(),
        r22: (i22_c / ea).sqrt(),
        ..Default::default()
    };

    section_moduli(mesh, &mut props);
    yield_moments(&elements, &mut props);

    info!(
        "Geometric analysis: A = {:.6e}, EA = {:.6e}, centroid = ({:.6}, {:.6}), EIxx = {:.6e}, EIyy = {:.6e}, phi = {:.4} deg",
        props.area, props.ea, props.cx, props.cy, props.ixx_c, props.iyy_c, props.phi
    );
    Ok(props)
}

/// Elastic section moduli from the extreme fibres of the mesh
fn section_moduli(mesh: &Mesh, p: &mut GeometricProperties) {
    let mut x = (f64::INFINITY, f64::NEG_INFINITY);
    let mut y = x;
    let mut x11 = x;
    let mut y22 = x;
    for n in mesh.nodes() {
        let (dx, dy) = (n.x - p.cx, n.y - p.cy);
        let (px, py) = principal_coordinate(p.phi, dx, dy);
        x = (x.0.min(dx), x.1.max(dx));
        y = (y.0.min(dy), y.1.max(dy));
        x11 = (x11.0.min(px), x11.1.max(px));
        y22 = (y22.0.min(py), y22.1.max(py));
    }

    p.zxx = BySide::new(p.ixx_c / y.1.abs(), p.ixx_c / y.0.abs());
    p.zyy = BySide::new(p.iyy_c / x.1.abs(), p.iyy_c / x.0.abs());
    p.z11 = BySide::new(p.i11_c / y22.1.abs(), p.i11_c / y22.0.abs());
    p.z22 = BySide::new(p.i22_c / x11.1.abs(), p.i22_c / x11.0.abs());
}

/// First yield moments: the smallest moment that brings any node of any
/// element to the yield strength of that element's material
fn yield_moments(elements: &[Tri6<'_>], p: &mut GeometricProperties) {
    let det = p.ixx_c * p.iyy_c - p.ixy_c * p.ixy_c;
    let mut my = [f64::INFINITY; 4];

    for el in elements {
        let e = el.material.elastic_modulus;
        let fy = el.material.yield_strength;
        for c in &el.coords {
            let (x, y) = (c[0] - p.cx, c[1] - p.cy);
            let (x11, y22) = principal_coordinate(p.phi, x, y);
            // stress per unit moment
            let unit = [
                e * (-p.ixy_c * x + p.iyy_c * y) / det,
                e * (-p.ixx_c * x + p.ixy_c * y) / det,
                e * y22 / p.i11_c,
                -e * x11 / p.i22_c,
            ];
            for (m, s) in my.iter_mut().zip(unit) {
                if s.abs() > 0.0 {
                    *m = m.min(fy / s.abs());
                }
            }
        }
    }

    [p.my_xx, p.my_yy, p.my_11, p.my_22] = my;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_principal_axes_aligned() {
        let (i11, i22, phi) = principal_axes(4.0, 1.0, 0.0);
        assert_relative_eq!(i11, 4.0);
        assert_relative_eq!(i22, 1.0);
        assert_eq!(phi, 0.0);
    }

    #[test]
    fn test_principal_axes_swapped() {
        let (i11, i22, phi) = principal_axes(1.0, 2.0, 0.0);
        assert_relative_eq!(i11, 2.0);
        assert_relative_eq!(i22, 1.0);
        assert_relative_eq!(phi.abs(), 90.0, epsilon = 1e-12);
    }

    #[test]
    fn test_principal_axes_invariants() {
        let (ixx, iyy, ixy) = (3.0, 2.0, -0.7);
        let (i11, i22, phi) = principal_axes(ixx, iyy, ixy);
        assert_relative_eq!(i11 + i22, ixx + iyy, epsilon = 1e-12);
        assert_relative_eq!(i11 * i22, ixx * iyy - ixy * ixy, epsilon = 1e-12);

        // rotating the tensor by phi diagonalises it
        let (s, c) = phi.to_radians().sin_cos();
        let i_uv = (ixx - iyy) * s * c + ixy * (c * c - s * s);
        assert_relative_eq!(i_uv, 0.0, epsilon = 1e-12);
    }
}
