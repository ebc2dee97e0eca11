//! Standard structural shapes
//!
//! Rectilinear shapes have their bottom-left corner at the origin; circular
//! shapes are centred on it. Root and toe radii are not modelled.

use std::f64::consts::PI;

use crate::elements::{CompoundGeometry, Geometry, Material, Polygon};
use crate::error::{SectionError, SectionResult};
use crate::math::Point;

fn positive(name: &str, value: f64) -> SectionResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SectionError::InvalidInput(format!(
            "{name} must be positive, got {value}"
        )))
    }
}

fn less_than(name: &str, value: f64, limit: f64) -> SectionResult<()> {
    if value < limit {
        Ok(())
    } else {
        Err(SectionError::InvalidInput(format!(
            "{name} ({value}) must be less than {limit}"
        )))
    }
}

/// Solid rectangle of depth `d` and width `b`
pub fn rectangular_section(d: f64, b: f64, material: Material) -> SectionResult<Geometry> {
    positive("depth", d)?;
    positive("width", b)?;
    Geometry::from_points(vec![[0.0, 0.0], [b, 0.0], [b, d], [0.0, d]], material)
}

/// Doubly symmetric I-section
pub fn i_section(d: f64, b: f64, t_f: f64, t_w: f64, material: Material) -> SectionResult<Geometry> {
    positive("depth", d)?;
    positive("width", b)?;
    positive("flange thickness", t_f)?;
    positive("web thickness", t_w)?;
    less_than("twice the flange thickness", 2.0 * t_f, d)?;
    less_than("web thickness", t_w, b)?;

    let w0 = 0.5 * (b - t_w);
    let w1 = 0.5 * (b + t_w);
    Geometry::from_points(
        vec![
            [0.0, 0.0],
            [b, 0.0],
            [b, t_f],
            [w1, t_f],
            [w1, d - t_f],
            [b, d - t_f],
            [b, d],
            [0.0, d],
            [0.0, d - t_f],
            [w0, d - t_f],
            [w0, t_f],
            [0.0, t_f],
        ],
        material,
    )
}

/// Parallel flange channel with the web on the left
pub fn channel_section(
    d: f64,
    b: f64,
    t_f: f64,
    t_w: f64,
    material: Material,
) -> SectionResult<Geometry> {
    positive("depth", d)?;
    positive("width", b)?;
    positive("flange thickness", t_f)?;
    positive("web thickness", t_w)?;
    less_than("twice the flange thickness", 2.0 * t_f, d)?;
    less_than("web thickness", t_w, b)?;

    Geometry::from_points(
        vec![
            [0.0, 0.0],
            [b, 0.0],
            [b, t_f],
            [t_w, t_f],
            [t_w, d - t_f],
            [b, d - t_f],
            [b, d],
            [0.0, d],
        ],
        material,
    )
}

/// Tee with the flange at the top
pub fn tee_section(d: f64, b: f64, t_f: f64, t_w: f64, material: Material) -> SectionResult<Geometry> {
    positive("depth", d)?;
    positive("width", b)?;
    positive("flange thickness", t_f)?;
    positive("web thickness", t_w)?;
    less_than("flange thickness", t_f, d)?;
    less_than("web thickness", t_w, b)?;

    let w0 = 0.5 * (b - t_w);
    let w1 = 0.5 * (b + t_w);
    Geometry::from_points(
        vec![
            [w0, 0.0],
            [w1, 0.0],
            [w1, d - t_f],
            [b, d - t_f],
            [b, d],
            [0.0, d],
            [0.0, d - t_f],
            [w0, d - t_f],
        ],
        material,
    )
}

/// Equal or unequal angle with legs along the positive axes
pub fn angle_section(d: f64, b: f64, t: f64, material: Material) -> SectionResult<Geometry> {
    positive("depth", d)?;
    positive("width", b)?;
    positive("thickness", t)?;
    less_than("thickness", t, d.min(b))?;

    Geometry::from_points(
        vec![[0.0, 0.0], [b, 0.0], [b, t], [t, t], [t, d], [0.0, d]],
        material,
    )
}

/// Rectangular hollow section built by subtracting the void from the box
pub fn rectangular_hollow_section(
    d: f64,
    b: f64,
    t: f64,
    material: Material,
) -> SectionResult<CompoundGeometry> {
    positive("thickness", t)?;
    less_than("twice the thickness", 2.0 * t, d.min(b))?;

    let outer = rectangular_section(d, b, material)?;
    let void = Polygon::from_points(vec![[t, t], [b - t, t], [b - t, d - t], [t, d - t]])?;
    Ok(CompoundGeometry::from(outer).subtract(&void))
}

fn circle_points(r: f64, n: usize) -> Vec<Point> {
    (0..n)
        .map(|i| {
            let theta = 2.0 * PI * i as f64 / n as f64;
            [r * theta.cos(), r * theta.sin()]
        })
        .collect()
}

/// Solid circle of diameter `d` approximated by an `n`-sided polygon.
///
/// The polygon edges are not axis-aligned, so [`GridTriangulator`] rejects
/// it; mesh it with another [`Triangulator`] implementation.
///
/// [`GridTriangulator`]: crate::mesh::GridTriangulator
/// [`Triangulator`]: crate::mesh::Triangulator
pub fn circular_section(d: f64, n: usize, material: Material) -> SectionResult<Geometry> {
    positive("diameter", d)?;
    if n < 3 {
        return Err(SectionError::InvalidInput(format!(
            "a circle needs at least 3 sides, got {n}"
        )));
    }
    Geometry::from_points(circle_points(0.5 * d, n), material)
}

/// Circular hollow section of outer diameter `d` and wall thickness `t`.
///
/// Like [`circular_section`] this needs a triangulator other than
/// [`GridTriangulator`](crate::mesh::GridTriangulator).
pub fn circular_hollow_section(
    d: f64,
    t: f64,
    n: usize,
    material: Material,
) -> SectionResult<Geometry> {
    positive("diameter", d)?;
    positive("thickness", t)?;
    less_than("twice the thickness", 2.0 * t, d)?;
    if n < 3 {
        return Err(SectionError::InvalidInput(format!(
            "a circle needs at least 3 sides, got {n}"
        )));
    }
    let outer = circle_points(0.5 * d, n);
    let inner = circle_points(0.5 * d - t, n);
    Geometry::new(Polygon::new(outer, vec![inner])?, material)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_shape_areas() {
        let m = Material::default;
        assert_relative_eq!(rectangular_section(100.0, 50.0, m()).unwrap().area(), 5000.0);
        assert_relative_eq!(
            i_section(200.0, 100.0, 10.0, 6.0, m()).unwrap().area(),
            2.0 * 100.0 * 10.0 + 180.0 * 6.0
        );
        assert_relative_eq!(
            channel_section(200.0, 75.0, 12.0, 6.0, m()).unwrap().area(),
            2.0 * 75.0 * 12.0 + 176.0 * 6.0
        );
        assert_relative_eq!(
            tee_section(200.0, 100.0, 12.0, 8.0, m()).unwrap().area(),
            100.0 * 12.0 + 188.0 * 8.0
        );
        assert_relative_eq!(
            angle_section(100.0, 75.0, 6.0, m()).unwrap().area(),
            100.0 * 6.0 + 69.0 * 6.0
        );
    }

    #[test]
    fn test_i_section_control_point_in_web_or_flange() {
        let g = i_section(200.0, 100.0, 10.0, 6.0, Material::default()).unwrap();
        assert!(g.contains(g.control_point));
    }

    #[test]
    fn test_hollow_sections() {
        let rhs = rectangular_hollow_section(100.0, 50.0, 5.0, Material::steel()).unwrap();
        assert!(rhs.owner_of([25.0, 50.0]).is_none());
        assert_eq!(rhs.owner_of([2.5, 50.0]), Some(0));

        let chs = circular_hollow_section(100.0, 5.0, 64, Material::steel()).unwrap();
        assert!(!chs.contains([0.0, 0.0]));
        assert!(chs.contains(chs.control_point));
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(rectangular_section(-1.0, 1.0, Material::default()).is_err());
        assert!(i_section(10.0, 10.0, 6.0, 1.0, Material::default()).is_err());
        assert!(circular_section(10.0, 2, Material::default()).is_err());
    }
}
