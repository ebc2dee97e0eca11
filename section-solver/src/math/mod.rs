//! Mathematical utilities for cross-section finite element calculations

pub mod sparse;

use nalgebra::{Matrix2, Matrix6, SMatrix, Vector2, Vector6};

// Re-export sparse utilities
pub use sparse::{
    reverse_cuthill_mckee, solve_pcg, solve_symmetric, SparseCholeskySolver, SparseMatrixBuilder,
};

pub type Vec2 = Vector2<f64>;
pub type Mat2 = Matrix2<f64>;

/// 6x6 element matrix for a quadratic triangle
pub type Mat6 = Matrix6<f64>;
/// 6-element vector of nodal values for a quadratic triangle
pub type Vec6 = Vector6<f64>;
/// Shape function derivative matrix, rows d/dx and d/dy
pub type Mat2x6 = SMatrix<f64, 2, 6>;

/// A 2D point `[x, y]`
pub type Point = [f64; 2];

/// Integration point in area coordinates with its weight
#[derive(Debug, Clone, Copy)]
pub struct GaussPoint {
    /// Weight (the weights of a rule sum to one)
    pub weight: f64,
    /// Area coordinates (L1, L2, L3)
    pub coords: [f64; 3],
}

/// Six point triangle rule, exact for polynomials of degree four.
///
/// This integrates the products of quadratic shape functions and their
/// derivatives exactly, which every element integral below relies on.
pub fn gauss_points() -> [GaussPoint; 6] {
    let s = (38.0 - 44.0 * (2.0_f64 / 5.0).sqrt()).sqrt();
    let g1 = (8.0 - 10.0_f64.sqrt() + s) / 18.0;
    let g2 = (8.0 - 10.0_f64.sqrt() - s) / 18.0;
    let r = (213125.0 - 53320.0 * 10.0_f64.sqrt()).sqrt();
    let w1 = (620.0 + r) / 3720.0;
    let w2 = (620.0 - r) / 3720.0;

    [
        GaussPoint { weight: w2, coords: [1.0 - 2.0 * g2, g2, g2] },
        GaussPoint { weight: w2, coords: [g2, 1.0 - 2.0 * g2, g2] },
        GaussPoint { weight: w2, coords: [g2, g2, 1.0 - 2.0 * g2] },
        GaussPoint { weight: w1, coords: [g1, 1.0 - 2.0 * g1, g1] },
        GaussPoint { weight: w1, coords: [1.0 - 2.0 * g1, g1, g1] },
        GaussPoint { weight: w1, coords: [g1, g1, 1.0 - 2.0 * g1] },
    ]
}

/// Quadratic triangle shape functions at area coordinates.
///
/// Node order: corners 0, 1, 2 then midsides 3 (0-1), 4 (1-2), 5 (2-0).
pub fn shape_functions(l: [f64; 3]) -> Vec6 {
    let [l1, l2, l3] = l;
    Vec6::new(
        l1 * (2.0 * l1 - 1.0),
        l2 * (2.0 * l2 - 1.0),
        l3 * (2.0 * l3 - 1.0),
        4.0 * l1 * l2,
        4.0 * l2 * l3,
        4.0 * l3 * l1,
    )
}

/// Derivatives of the shape functions with respect to (xi, eta) = (L2, L3)
fn shape_function_derivatives(l: [f64; 3]) -> SMatrix<f64, 2, 6> {
    let [l1, l2, l3] = l;
    // dN/dL1, dN/dL2, dN/dL3 for each node
    let d = [
        (4.0 * l1 - 1.0, 0.0, 0.0),
        (0.0, 4.0 * l2 - 1.0, 0.0),
        (0.0, 0.0, 4.0 * l3 - 1.0),
        (4.0 * l2, 4.0 * l1, 0.0),
        (0.0, 4.0 * l3, 4.0 * l2),
        (4.0 * l3, 0.0, 4.0 * l1),
    ];

    let mut out = SMatrix::<f64, 2, 6>::zeros();
    for (i, (d1, d2, d3)) in d.iter().enumerate() {
        out[(0, i)] = d2 - d1;
        out[(1, i)] = d3 - d1;
    }
    out
}

/// Shape functions, their global derivatives and the area jacobian at a point
#[derive(Debug, Clone, Copy)]
pub struct ShapeEval {
    /// Shape function values
    pub n: Vec6,
    /// Global derivatives, row 0 = d/dx, row 1 = d/dy
    pub b: Mat2x6,
    /// Half the jacobian determinant, so that the integral is sum(w * f * j)
    pub j: f64,
}

/// Evaluates the quadratic triangle at area coordinates `l`
pub fn shape_function(coords: &[Point; 6], l: [f64; 3]) -> Option<ShapeEval> {
    let n = shape_functions(l);
    let dn = shape_function_derivatives(l);

    let mut jac = Mat2::zeros();
    for (i, c) in coords.iter().enumerate() {
        jac[(0, 0)] += dn[(0, i)] * c[0];
        jac[(0, 1)] += dn[(0, i)] * c[1];
        jac[(1, 0)] += dn[(1, i)] * c[0];
        jac[(1, 1)] += dn[(1, i)] * c[1];
    }

    let det = jac.determinant();
    let inv = jac.try_inverse()?;

    Some(ShapeEval {
        n,
        b: inv * dn,
        j: 0.5 * det,
    })
}

/// Interpolates nodal coordinates at shape function values
#[inline]
pub fn interpolate(n: &Vec6, coords: &[Point; 6]) -> Point {
    let mut p = [0.0, 0.0];
    for (i, c) in coords.iter().enumerate() {
        p[0] += n[i] * c[0];
        p[1] += n[i] * c[1];
    }
    p
}

/// Matrix mapping values at the six Gauss points to the six element nodes
pub fn extrapolation_matrix() -> Option<Mat6> {
    let mut h = Mat6::zeros();
    for (g, gp) in gauss_points().iter().enumerate() {
        let n = shape_functions(gp.coords);
        for i in 0..6 {
            h[(g, i)] = n[i];
        }
    }
    h.try_inverse()
}

/// Coordinates of a point with respect to axes rotated by `phi` degrees
pub fn principal_coordinate(phi: f64, x: f64, y: f64) -> (f64, f64) {
    let (s, c) = phi.to_radians().sin_cos();
    (x * c + y * s, -x * s + y * c)
}

/// Inverse of [`principal_coordinate`]
pub fn global_coordinate(phi: f64, x11: f64, y22: f64) -> (f64, f64) {
    let (s, c) = phi.to_radians().sin_cos();
    (x11 * c - y22 * s, x11 * s + y22 * c)
}

/// Signed area of a closed polygon (counter-clockwise positive)
pub fn polygon_signed_area(pts: &[Point]) -> f64 {
    let n = pts.len();
    if n < 3 {
        return 0.0;
    }
    let mut a = 0.0;
    for i in 0..n {
        let p = pts[i];
        let q = pts[(i + 1) % n];
        a += p[0] * q[1] - q[0] * p[1];
    }
    0.5 * a
}

/// Area (unsigned) and centroid of a simple polygon
pub fn polygon_area_centroid(pts: &[Point]) -> (f64, Point) {
    let n = pts.len();
    let signed = polygon_signed_area(pts);
    if signed.abs() < f64::MIN_POSITIVE {
        return (0.0, [0.0, 0.0]);
    }
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let p = pts[i];
        let q = pts[(i + 1) % n];
        let cross = p[0] * q[1] - q[0] * p[1];
        cx += (p[0] + q[0]) * cross;
        cy += (p[1] + q[1]) * cross;
    }
    (signed.abs(), [cx / (6.0 * signed), cy / (6.0 * signed)])
}

/// Clips a convex polygon to the half-plane `normal . p >= offset`
/// (Sutherland-Hodgman against a single edge)
pub fn clip_half_plane(pts: &[Point], normal: Point, offset: f64) -> Vec<Point> {
    let dist = |p: &Point| normal[0] * p[0] + normal[1] * p[1] - offset;
    let mut out = Vec::with_capacity(pts.len() + 1);

    for i in 0..pts.len() {
        let p = pts[i];
        let q = pts[(i + 1) % pts.len()];
        let dp = dist(&p);
        let dq = dist(&q);

        if dp >= 0.0 {
            out.push(p);
        }
        if (dp >= 0.0) != (dq >= 0.0) {
            let t = dp / (dp - dq);
            out.push([p[0] + t * (q[0] - p[0]), p[1] + t * (q[1] - p[1])]);
        }
    }
    out
}

/// Area coordinates of `p` in the straight-sided triangle `(a, b, c)`
pub fn barycentric(p: Point, a: Point, b: Point, c: Point) -> Option<[f64; 3]> {
    let det = (b[1] - c[1]) * (a[0] - c[0]) + (c[0] - b[0]) * (a[1] - c[1]);
    if det.abs() < f64::MIN_POSITIVE {
        return None;
    }
    let l1 = ((b[1] - c[1]) * (p[0] - c[0]) + (c[0] - b[0]) * (p[1] - c[1])) / det;
    let l2 = ((c[1] - a[1]) * (p[0] - c[0]) + (a[0] - c[0]) * (p[1] - c[1])) / det;
    Some([l1, l2, 1.0 - l1 - l2])
}

/// Distance from `p` to the segment `a`-`b`
pub fn point_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let ab = [b[0] - a[0], b[1] - a[1]];
    let len2 = ab[0] * ab[0] + ab[1] * ab[1];
    let t = if len2 > 0.0 {
        (((p[0] - a[0]) * ab[0] + (p[1] - a[1]) * ab[1]) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let dx = p[0] - (a[0] + t * ab[0]);
    let dy = p[1] - (a[1] + t * ab[1]);
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn straight_tri6(a: Point, b: Point, c: Point) -> [Point; 6] {
        let mid = |p: Point, q: Point| [0.5 * (p[0] + q[0]), 0.5 * (p[1] + q[1])];
        [a, b, c, mid(a, b), mid(b, c), mid(c, a)]
    }

    #[test]
    fn test_gauss_weights_sum_to_one() {
        let sum: f64 = gauss_points().iter().map(|gp| gp.weight).sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
        for gp in gauss_points() {
            assert_relative_eq!(gp.coords.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_integrates_quadratic_exactly() {
        // int x^2 dA over the triangle (0,0), (2,0), (0,3) = 2^3 * 3 / 12
        let coords = straight_tri6([0.0, 0.0], [2.0, 0.0], [0.0, 3.0]);
        let mut area = 0.0;
        let mut ixx = 0.0;
        for gp in gauss_points() {
            let s = shape_function(&coords, gp.coords).unwrap();
            let p = interpolate(&s.n, &coords);
            area += gp.weight * s.j;
            ixx += gp.weight * p[0] * p[0] * s.j;
        }
        assert_relative_eq!(area, 3.0, epsilon = 1e-12);
        assert_relative_eq!(ixx, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_shape_function_derivatives_sum_to_zero() {
        let coords = straight_tri6([1.0, 1.0], [3.0, 1.5], [1.5, 4.0]);
        let s = shape_function(&coords, [0.2, 0.3, 0.5]).unwrap();
        assert_relative_eq!(s.n.sum(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(s.b.row(0).sum(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(s.b.row(1).sum(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_extrapolation_recovers_quadratic_field() {
        let coords = straight_tri6([0.0, 0.0], [1.0, 0.0], [0.0, 1.0]);
        let field = |p: Point| 1.0 + 2.0 * p[0] - p[1] + p[0] * p[1];
        let h_inv = extrapolation_matrix().unwrap();
        let mut gp_vals = Vec6::zeros();
        for (g, gp) in gauss_points().iter().enumerate() {
            let n = shape_functions(gp.coords);
            gp_vals[g] = field(interpolate(&n, &coords));
        }
        let nodal = h_inv * gp_vals;
        for i in 0..6 {
            assert_relative_eq!(nodal[i], field(coords[i]), epsilon = 1e-10);
        }
    }

    #[test]
    fn test_principal_round_trip() {
        let (x11, y22) = principal_coordinate(30.0, 1.0, 2.0);
        let (x, y) = global_coordinate(30.0, x11, y22);
        assert_relative_eq!(x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_clip_half_plane_square() {
        let square = [[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]];
        let upper = clip_half_plane(&square, [0.0, 1.0], 0.5);
        let (area, c) = polygon_area_centroid(&upper);
        assert_relative_eq!(area, 3.0, epsilon = 1e-12);
        assert_relative_eq!(c[1], 1.25, epsilon = 1e-12);
        assert!(clip_half_plane(&square, [0.0, 1.0], 3.0).is_empty());
    }

    #[test]
    fn test_barycentric_outside() {
        let l = barycentric([2.0, 2.0], [0.0, 0.0], [1.0, 0.0], [0.0, 1.0]).unwrap();
        assert!(l.iter().any(|v| *v < 0.0));
    }
}
