//! Planar regions and their combination into a meshable section
//!
//! A [`Geometry`] is one material bound to one polygon. A
//! [`CompoundGeometry`] keeps several of them in priority order: where two
//! regions overlap, the one with the lower index owns the material. The
//! order is set explicitly through [`Precedence`] when compounds are merged.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::elements::{Material, MaterialRegistry, Node};
use crate::error::{SectionError, SectionResult};
use crate::math::{point_segment_distance, polygon_area_centroid, polygon_signed_area, Point};
use crate::mesh::{preflight, Mesh, Region, TriangulationInput, Triangulator};

/// A polygon with optional holes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    /// Outer ring, not closed (first point is not repeated)
    pub exterior: Vec<Point>,
    /// Hole rings
    pub interiors: Vec<Vec<Point>>,
}

impl Polygon {
    /// Create a polygon, rejecting rings with fewer than three points or no area
    pub fn new(exterior: Vec<Point>, interiors: Vec<Vec<Point>>) -> SectionResult<Self> {
        for ring in std::iter::once(&exterior).chain(interiors.iter()) {
            if ring.len() < 3 {
                return Err(SectionError::InvalidInput(format!(
                    "polygon ring needs at least 3 points, got {}",
                    ring.len()
                )));
            }
            if polygon_signed_area(ring).abs() <= f64::EPSILON {
                return Err(SectionError::InvalidInput(
                    "polygon ring has zero area".to_string(),
                ));
            }
        }
        Ok(Self {
            exterior,
            interiors,
        })
    }

    /// Polygon without holes
    pub fn from_points(exterior: Vec<Point>) -> SectionResult<Self> {
        Self::new(exterior, Vec::new())
    }

    /// Iterate over all rings, exterior first
    pub fn rings(&self) -> impl Iterator<Item = &Vec<Point>> {
        std::iter::once(&self.exterior).chain(self.interiors.iter())
    }

    /// Net area (exterior minus holes)
    pub fn area(&self) -> f64 {
        polygon_signed_area(&self.exterior).abs()
            - self
                .interiors
                .iter()
                .map(|r| polygon_signed_area(r).abs())
                .sum::<f64>()
    }

    /// Area centroid of the net region
    pub fn centroid(&self) -> Point {
        let (a0, c0) = polygon_area_centroid(&self.exterior);
        let mut a = a0;
        let mut sx = a0 * c0[0];
        let mut sy = a0 * c0[1];
        for ring in &self.interiors {
            let (ai, ci) = polygon_area_centroid(ring);
            a -= ai;
            sx -= ai * ci[0];
            sy -= ai * ci[1];
        }
        [sx / a, sy / a]
    }

    /// Length of all rings
    pub fn perimeter(&self) -> f64 {
        self.rings().map(|r| ring_length(r)).sum()
    }

    /// Even-odd containment over all rings
    pub fn contains(&self, p: Point) -> bool {
        let mut inside = false;
        for ring in self.rings() {
            if ring_contains(ring, p) {
                inside = !inside;
            }
        }
        inside
    }

    /// Bounding box as (min, max)
    pub fn bounds(&self) -> (Point, Point) {
        bounds_of(self.exterior.iter().copied())
    }

    pub fn shift(&self, dx: f64, dy: f64) -> Self {
        self.map_points(|p| [p[0] + dx, p[1] + dy])
    }

    /// Rotate by `angle` degrees counter-clockwise about `origin`
    pub fn rotate(&self, angle: f64, origin: Point) -> Self {
        let (s, c) = angle.to_radians().sin_cos();
        self.map_points(|p| {
            let dx = p[0] - origin[0];
            let dy = p[1] - origin[1];
            [origin[0] + dx * c - dy * s, origin[1] + dx * s + dy * c]
        })
    }

    fn map_points(&self, f: impl Fn(Point) -> Point + Copy) -> Self {
        Self {
            exterior: self.exterior.iter().map(|p| f(*p)).collect(),
            interiors: self
                .interiors
                .iter()
                .map(|r| r.iter().map(|p| f(*p)).collect())
                .collect(),
        }
    }

    /// A point strictly inside the polygon (outside every hole).
    ///
    /// Casts horizontal scan lines and returns the midpoint of the widest
    /// interior interval found.
    pub fn representative_point(&self) -> SectionResult<Point> {
        let (min, max) = self.bounds();
        let height = max[1] - min[1];
        let mut best: Option<(f64, Point)> = None;

        for frac in [0.5, 0.381_966, 0.618_034, 0.25, 0.75, 0.123_456, 0.876_543] {
            let y = min[1] + frac * height;
            let mut xs: Vec<f64> = Vec::new();
            for ring in self.rings() {
                for (a, b) in ring_edges(ring) {
                    if (a[1] > y) != (b[1] > y) {
                        xs.push(a[0] + (y - a[1]) * (b[0] - a[0]) / (b[1] - a[1]));
                    }
                }
            }
            xs.sort_by(f64::total_cmp);
            for pair in xs.chunks_exact(2) {
                let width = pair[1] - pair[0];
                if best.map_or(true, |(w, _)| width > w) {
                    best = Some((width, [0.5 * (pair[0] + pair[1]), y]));
                }
            }
        }

        match best {
            Some((w, p)) if w > 0.0 && self.contains(p) => Ok(p),
            _ => Err(SectionError::InvalidInput(
                "could not find an interior point of polygon".to_string(),
            )),
        }
    }
}

/// A single-material region with an interior control point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub polygon: Polygon,
    /// Interior point identifying the region to the triangulator
    pub control_point: Point,
    pub material: Material,
    /// Regions removed from this geometry by [`CompoundGeometry::subtract`]
    pub cuts: Vec<Polygon>,
}

impl Geometry {
    /// Create a geometry, placing its control point automatically
    pub fn new(polygon: Polygon, material: Material) -> SectionResult<Self> {
        let control_point = polygon.representative_point()?;
        Ok(Self {
            polygon,
            control_point,
            material,
            cuts: Vec::new(),
        })
    }

    /// Create a geometry from the points of its outer ring
    pub fn from_points(points: Vec<Point>, material: Material) -> SectionResult<Self> {
        Self::new(Polygon::from_points(points)?, material)
    }

    /// Copy of this geometry bound to `material`
    pub fn with_material(&self, material: Material) -> Self {
        Self {
            material,
            ..self.clone()
        }
    }

    /// Copy with a user supplied control point, which must lie in the region
    pub fn with_control_point(&self, control_point: Point) -> SectionResult<Self> {
        if !self.contains(control_point) {
            return Err(SectionError::InvalidInput(format!(
                "control point ({}, {}) is not inside the geometry",
                control_point[0], control_point[1]
            )));
        }
        Ok(Self {
            control_point,
            ..self.clone()
        })
    }

    /// Whether `p` lies in the polygon and outside every cut
    pub fn contains(&self, p: Point) -> bool {
        self.polygon.contains(p) && !self.cuts.iter().any(|c| c.contains(p))
    }

    /// Picks a new control point outside every cut, keeping the old one on failure
    fn relocate_control_point(&mut self) {
        let mut probe = self.polygon.clone();
        probe
            .interiors
            .extend(self.cuts.iter().map(|c| c.exterior.clone()));
        if let Ok(p) = probe.representative_point() {
            if self.contains(p) {
                self.control_point = p;
            }
        }
    }

    /// Area before cuts are applied
    pub fn area(&self) -> f64 {
        self.polygon.area()
    }

    pub fn shift(&self, dx: f64, dy: f64) -> Self {
        Self {
            polygon: self.polygon.shift(dx, dy),
            control_point: [self.control_point[0] + dx, self.control_point[1] + dy],
            material: self.material.clone(),
            cuts: self.cuts.iter().map(|c| c.shift(dx, dy)).collect(),
        }
    }

    /// Rotate by `angle` degrees about `origin`
    pub fn rotate(&self, angle: f64, origin: Point) -> Self {
        Self {
            polygon: self.polygon.rotate(angle, origin),
            control_point: Node::from(self.control_point).rotated(angle, origin).coords(),
            material: self.material.clone(),
            cuts: self.cuts.iter().map(|c| c.rotate(angle, origin)).collect(),
        }
    }
}

/// Which operand owns the material where two compounds overlap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Precedence {
    /// The receiver keeps priority over the argument
    #[default]
    FirstWins,
    /// The argument takes priority over the receiver
    LastWins,
}

/// Ordered collection of geometries; index 0 has the highest priority
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompoundGeometry {
    pub geometries: Vec<Geometry>,
}

impl From<Geometry> for CompoundGeometry {
    fn from(g: Geometry) -> Self {
        Self {
            geometries: vec![g],
        }
    }
}

impl CompoundGeometry {
    pub fn new(geometries: Vec<Geometry>) -> Self {
        Self { geometries }
    }

    /// A new compound with `geometry` appended at the lowest priority
    pub fn add_region(&self, geometry: Geometry) -> Self {
        let mut geometries = self.geometries.clone();
        geometries.push(geometry);
        Self { geometries }
    }

    /// Merge two compounds, ordering them by `precedence`
    pub fn union(&self, other: &CompoundGeometry, precedence: Precedence) -> Self {
        let (first, second) = match precedence {
            Precedence::FirstWins => (self, other),
            Precedence::LastWins => (other, self),
        };
        Self {
            geometries: first
                .geometries
                .iter()
                .chain(second.geometries.iter())
                .cloned()
                .collect(),
        }
    }

    /// Cut `region` out of every geometry currently in the compound
    pub fn subtract(&self, region: &Polygon) -> Self {
        Self {
            geometries: self
                .geometries
                .iter()
                .map(|g| {
                    let mut g = g.clone();
                    g.cuts.push(region.clone());
                    if !g.contains(g.control_point) {
                        g.relocate_control_point();
                    }
                    g
                })
                .collect(),
        }
    }

    pub fn shift(&self, dx: f64, dy: f64) -> Self {
        Self {
            geometries: self.geometries.iter().map(|g| g.shift(dx, dy)).collect(),
        }
    }

    /// Rotate by `angle` degrees about `origin`
    pub fn rotate(&self, angle: f64, origin: Point) -> Self {
        Self {
            geometries: self
                .geometries
                .iter()
                .map(|g| g.rotate(angle, origin))
                .collect(),
        }
    }

    /// Index of the highest priority geometry containing `p`
    pub fn owner_of(&self, p: Point) -> Option<usize> {
        self.geometries.iter().position(|g| g.contains(p))
    }

    /// Bounding box of all geometries
    pub fn bounds(&self) -> (Point, Point) {
        bounds_of(
            self.geometries
                .iter()
                .flat_map(|g| g.polygon.exterior.iter().copied()),
        )
    }

    /// Planar straight-line graph of the compound.
    ///
    /// Vertices closer than a relative tolerance are merged, segments are
    /// split where they cross or touch another vertex and deduplicated. Each
    /// geometry becomes one region whose attribute is its index. `mesh_sizes`
    /// holds one maximum element area for every geometry, or a single value
    /// applied to all; zero leaves the area unconstrained.
    pub fn flatten(&self, mesh_sizes: &[f64]) -> SectionResult<TriangulationInput> {
        if self.geometries.is_empty() {
            return Err(SectionError::InvalidInput(
                "compound geometry is empty".to_string(),
            ));
        }
        if mesh_sizes.len() != 1 && mesh_sizes.len() != self.geometries.len() {
            return Err(SectionError::InvalidInput(format!(
                "expected 1 or {} mesh sizes, got {}",
                self.geometries.len(),
                mesh_sizes.len()
            )));
        }

        let tol = self.merge_tolerance();
        let mut graph = GraphBuilder::new(tol);

        let rings = self.geometries.iter().flat_map(|g| {
            g.polygon
                .rings()
                .chain(g.cuts.iter().flat_map(|c| c.rings()))
        });
        for ring in rings {
            let ids: Vec<usize> = ring.iter().map(|p| graph.vertex(*p)).collect();
            for k in 0..ids.len() {
                graph.segment(ids[k], ids[(k + 1) % ids.len()]);
            }
        }
        graph.split_crossings();
        graph.split_at_vertices();

        // hole markers for holes and cuts not covered by any geometry
        let mut holes = Vec::new();
        for g in &self.geometries {
            for ring in &g.polygon.interiors {
                if let Ok(p) = Polygon::from_points(ring.clone()).and_then(|h| h.representative_point()) {
                    if self.owner_of(p).is_none() {
                        holes.push(p);
                    }
                }
            }
            for cut in &g.cuts {
                if let Ok(p) = cut.representative_point() {
                    if self.owner_of(p).is_none() && !holes.contains(&p) {
                        holes.push(p);
                    }
                }
            }
        }

        let regions = self
            .geometries
            .iter()
            .enumerate()
            .map(|(i, g)| {
                let size = if mesh_sizes.len() == 1 {
                    mesh_sizes[0]
                } else {
                    mesh_sizes[i]
                };
                Region {
                    point: g.control_point,
                    attribute: i,
                    max_area: (size > 0.0).then_some(size),
                }
            })
            .collect();

        Ok(TriangulationInput {
            vertices: graph.vertices,
            segments: graph.segments,
            holes,
            regions,
        })
    }

    /// Triangulate the compound and resolve element materials by precedence.
    ///
    /// Each triangle takes the material of the highest priority geometry
    /// containing its centroid; triangles inside no geometry are dropped.
    pub fn create_mesh(
        &self,
        triangulator: &dyn Triangulator,
        mesh_sizes: &[f64],
    ) -> SectionResult<Mesh> {
        let input = self.flatten(mesh_sizes)?;
        preflight(&input, self.merge_tolerance() * 1e3)?;
        debug!(
            "Triangulating {} vertices, {} segments, {} holes, {} regions",
            input.vertices.len(),
            input.segments.len(),
            input.holes.len(),
            input.regions.len()
        );

        let output = triangulator.triangulate(&input)?;

        let mut registry = MaterialRegistry::new();
        let mut triangles = Vec::with_capacity(output.triangles.len());
        let mut materials = Vec::with_capacity(output.triangles.len());
        let mut mismatched = 0usize;

        for (tri, attribute) in output.triangles.iter().zip(output.attributes.iter()) {
            let mut c = [0.0, 0.0];
            for &n in tri {
                let p = output.nodes.get(n).ok_or_else(|| {
                    SectionError::MeshValidity(format!("triangulator returned bad node index {n}"))
                })?;
                c[0] += p[0] / 3.0;
                c[1] += p[1] / 3.0;
            }
            let Some(owner) = self.owner_of(c) else {
                continue;
            };
            if owner != *attribute {
                mismatched += 1;
            }
            triangles.push(*tri);
            materials.push(registry.insert(&self.geometries[owner].material)?);
        }

        if mismatched > 0 {
            debug!("{mismatched} triangles reassigned from their region attribute by precedence");
        }

        Mesh::from_triangles(output.nodes, triangles, materials, registry)
    }

    fn merge_tolerance(&self) -> f64 {
        let (min, max) = self.bounds();
        let diag = ((max[0] - min[0]).powi(2) + (max[1] - min[1]).powi(2)).sqrt();
        1e-9 * diag.max(1.0)
    }
}

/// Incremental planar graph with vertex merging
struct GraphBuilder {
    tol: f64,
    vertices: Vec<Point>,
    segments: Vec<[usize; 2]>,
}

impl GraphBuilder {
    fn new(tol: f64) -> Self {
        Self {
            tol,
            vertices: Vec::new(),
            segments: Vec::new(),
        }
    }

    fn vertex(&mut self, p: Point) -> usize {
        if let Some(i) = self
            .vertices
            .iter()
            .position(|v| (v[0] - p[0]).abs() <= self.tol && (v[1] - p[1]).abs() <= self.tol)
        {
            return i;
        }
        self.vertices.push(p);
        self.vertices.len() - 1
    }

    fn segment(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let s = [a.min(b), a.max(b)];
        if !self.segments.contains(&s) {
            self.segments.push(s);
        }
    }

    /// Insert a vertex at every proper crossing of two segments
    fn split_crossings(&mut self) {
        let mut crossings = Vec::new();
        for i in 0..self.segments.len() {
            for j in (i + 1)..self.segments.len() {
                let [a, b] = self.segments[i];
                let [c, d] = self.segments[j];
                if let Some(p) = segment_crossing(
                    self.vertices[a],
                    self.vertices[b],
                    self.vertices[c],
                    self.vertices[d],
                ) {
                    crossings.push(p);
                }
            }
        }
        for p in crossings {
            self.vertex(p);
        }
    }

    /// Split every segment at the vertices lying on it
    fn split_at_vertices(&mut self) {
        let old = std::mem::take(&mut self.segments);
        for [a, b] in old {
            let pa = self.vertices[a];
            let pb = self.vertices[b];
            let len2 = (pb[0] - pa[0]).powi(2) + (pb[1] - pa[1]).powi(2);
            let mut on: Vec<(f64, usize)> = self
                .vertices
                .iter()
                .enumerate()
                .filter(|(i, v)| {
                    *i != a && *i != b && point_segment_distance(**v, pa, pb) <= self.tol
                })
                .map(|(i, v)| {
                    let t = ((v[0] - pa[0]) * (pb[0] - pa[0]) + (v[1] - pa[1]) * (pb[1] - pa[1]))
                        / len2;
                    (t, i)
                })
                .collect();
            on.sort_by(|x, y| x.0.total_cmp(&y.0));

            let mut prev = a;
            for (_, i) in on {
                self.segment(prev, i);
                prev = i;
            }
            self.segment(prev, b);
        }
    }
}

/// Proper intersection point of segments p1-p2 and p3-p4 (endpoints excluded)
fn segment_crossing(p1: Point, p2: Point, p3: Point, p4: Point) -> Option<Point> {
    let d = (p2[0] - p1[0]) * (p4[1] - p3[1]) - (p2[1] - p1[1]) * (p4[0] - p3[0]);
    if d.abs() < f64::EPSILON {
        return None;
    }
    let t = ((p3[0] - p1[0]) * (p4[1] - p3[1]) - (p3[1] - p1[1]) * (p4[0] - p3[0])) / d;
    let u = ((p3[0] - p1[0]) * (p2[1] - p1[1]) - (p3[1] - p1[1]) * (p2[0] - p1[0])) / d;
    let eps = 1e-12;
    if t > eps && t < 1.0 - eps && u > eps && u < 1.0 - eps {
        Some([p1[0] + t * (p2[0] - p1[0]), p1[1] + t * (p2[1] - p1[1])])
    } else {
        None
    }
}

fn ring_edges(ring: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    (0..ring.len()).map(move |i| (ring[i], ring[(i + 1) % ring.len()]))
}

fn ring_length(ring: &[Point]) -> f64 {
    ring_edges(ring)
        .map(|(a, b)| ((b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2)).sqrt())
        .sum()
}

fn ring_contains(ring: &[Point], p: Point) -> bool {
    let mut inside = false;
    for (a, b) in ring_edges(ring) {
        if (a[1] > p[1]) != (b[1] > p[1]) {
            let x = a[0] + (p[1] - a[1]) * (b[0] - a[0]) / (b[1] - a[1]);
            if p[0] < x {
                inside = !inside;
            }
        }
    }
    inside
}

fn bounds_of(points: impl Iterator<Item = Point>) -> (Point, Point) {
    let mut min = [f64::INFINITY; 2];
    let mut max = [f64::NEG_INFINITY; 2];
    for p in points {
        min[0] = min[0].min(p[0]);
        min[1] = min[1].min(p[1]);
        max[0] = max[0].max(p[0]);
        max[1] = max[1].max(p[1]);
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(x0: f64, y0: f64, size: f64, material: Material) -> Geometry {
        Geometry::from_points(
            vec![
                [x0, y0],
                [x0 + size, y0],
                [x0 + size, y0 + size],
                [x0, y0 + size],
            ],
            material,
        )
        .unwrap()
    }

    #[test]
    fn test_polygon_with_hole() {
        let p = Polygon::new(
            vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]],
            vec![vec![[1.0, 1.0], [3.0, 1.0], [3.0, 3.0], [1.0, 3.0]]],
        )
        .unwrap();
        assert_relative_eq!(p.area(), 12.0);
        assert!(p.contains([0.5, 0.5]));
        assert!(!p.contains([2.0, 2.0]));
        let rep = p.representative_point().unwrap();
        assert!(p.contains(rep));
        assert_relative_eq!(p.perimeter(), 24.0);
    }

    #[test]
    fn test_degenerate_polygon_rejected() {
        assert!(Polygon::from_points(vec![[0.0, 0.0], [1.0, 1.0]]).is_err());
        assert!(Polygon::from_points(vec![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]).is_err());
    }

    #[test]
    fn test_precedence_controls_overlap_owner() {
        let a = CompoundGeometry::from(square(0.0, 0.0, 2.0, Material::steel()));
        let b = CompoundGeometry::from(square(1.0, 1.0, 2.0, Material::timber()));

        let first = a.union(&b, Precedence::FirstWins);
        let last = a.union(&b, Precedence::LastWins);
        let overlap = [1.5, 1.5];
        assert_eq!(first.geometries[first.owner_of(overlap).unwrap()].material.name, "Steel");
        assert_eq!(last.geometries[last.owner_of(overlap).unwrap()].material.name, "Timber");
    }

    #[test]
    fn test_subtract_only_cuts_existing_geometries() {
        let base = CompoundGeometry::from(square(0.0, 0.0, 4.0, Material::default()));
        let hole = Polygon::from_points(vec![[1.0, 1.0], [3.0, 1.0], [3.0, 3.0], [1.0, 3.0]]).unwrap();
        let cut = base.subtract(&hole);
        assert!(cut.owner_of([2.0, 2.0]).is_none());

        assert!(cut.geometries[0].contains(cut.geometries[0].control_point));

        let refilled = cut.add_region(square(1.5, 1.5, 1.0, Material::steel()));
        assert_eq!(refilled.owner_of([2.0, 2.0]), Some(1));
    }

    #[test]
    fn test_with_material_is_a_new_value() {
        let g = square(0.0, 0.0, 1.0, Material::default());
        let s = g.with_material(Material::steel());
        assert!(g.material.is_default());
        assert_eq!(s.material, Material::steel());
        assert_eq!(s.polygon, g.polygon);
    }

    #[test]
    fn test_flatten_splits_t_junctions() {
        // 2x1 plate sitting on a 4x1 plate: the plate corners land mid-edge
        let bottom = Geometry::from_points(
            vec![[0.0, 0.0], [4.0, 0.0], [4.0, 1.0], [0.0, 1.0]],
            Material::default(),
        )
        .unwrap();
        let top = Geometry::from_points(
            vec![[1.0, 1.0], [3.0, 1.0], [3.0, 2.0], [1.0, 2.0]],
            Material::default(),
        )
        .unwrap();
        let input = CompoundGeometry::new(vec![bottom, top]).flatten(&[0.0]).unwrap();

        assert_eq!(input.vertices.len(), 8);
        // bottom edge 1 + right 1 + top split in 3 + left 1, plus 3 edges of the top plate
        assert_eq!(input.segments.len(), 9);
        assert!(preflight(&input, 1e-6).is_ok());
        assert_eq!(input.regions.len(), 2);
        assert!(input.regions.iter().all(|r| r.max_area.is_none()));
    }
}
