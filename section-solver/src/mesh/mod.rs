//! Quadratic triangle mesh of a cross-section

mod grid;
mod triangulator;

use std::collections::HashMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

pub use grid::GridTriangulator;
pub use triangulator::{preflight, Region, TriangulationInput, TriangulationOutput, Triangulator};

use crate::elements::{ElementConnectivity, Material, MaterialRegistry, Node, Tri6};
use crate::error::{SectionError, SectionResult};
use crate::math::{polygon_signed_area, Point};

/// Elements with an area below this fraction of the mean element area are
/// treated as degenerate
const MIN_RELATIVE_AREA: f64 = 1e-10;

/// Nodes, 6-node elements and the materials they reference.
///
/// Deserialized meshes go through the same checks as [`Mesh::from_tri6`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawMesh")]
pub struct Mesh {
    nodes: Vec<Node>,
    elements: Vec<ElementConnectivity>,
    materials: MaterialRegistry,
}

/// Unchecked serialized form of a [`Mesh`]
#[derive(Deserialize)]
struct RawMesh {
    nodes: Vec<Node>,
    elements: Vec<ElementConnectivity>,
    materials: MaterialRegistry,
}

impl TryFrom<RawMesh> for Mesh {
    type Error = SectionError;

    fn try_from(raw: RawMesh) -> SectionResult<Self> {
        let (elements, tags): (Vec<_>, Vec<_>) = raw.elements.iter().map(|e| (e.nodes, e.material)).unzip();
        Self::from_tri6(
            raw.nodes.iter().map(Node::coords).collect(),
            elements,
            tags,
            raw.materials,
        )
    }
}

impl Mesh {
    /// Builds a quadratic mesh from 3-node triangles.
    ///
    /// A midside node is inserted on every edge and shared by the two
    /// elements adjoining it.
    pub fn from_triangles(
        nodes: Vec<Point>,
        triangles: Vec<[usize; 3]>,
        element_materials: Vec<usize>,
        materials: MaterialRegistry,
    ) -> SectionResult<Self> {
        check_indices(nodes.len(), triangles.iter().map(|t| &t[..]))?;

        let mut nodes = nodes;
        let mut midsides: HashMap<(usize, usize), usize> = HashMap::new();
        let mut elements = Vec::with_capacity(triangles.len());

        for tri in &triangles {
            let [a, b, c] = *tri;
            let mut mid = |p: usize, q: usize| {
                *midsides.entry((p.min(q), p.max(q))).or_insert_with(|| {
                    let (np, nq) = (nodes[p], nodes[q]);
                    nodes.push([0.5 * (np[0] + nq[0]), 0.5 * (np[1] + nq[1])]);
                    nodes.len() - 1
                })
            };
            let ab = mid(a, b);
            let bc = mid(b, c);
            let ca = mid(c, a);
            elements.push([a, b, c, ab, bc, ca]);
        }

        Self::from_tri6(nodes, elements, element_materials, materials)
    }

    /// Builds a mesh from 6-node elements (corners then midsides 0-1, 1-2, 2-0).
    ///
    /// Clockwise elements are re-oriented, degenerate elements rejected and
    /// nodes not referenced by any element dropped.
    pub fn from_tri6(
        nodes: Vec<Point>,
        elements: Vec<[usize; 6]>,
        element_materials: Vec<usize>,
        materials: MaterialRegistry,
    ) -> SectionResult<Self> {
        if elements.is_empty() {
            return Err(SectionError::MeshValidity("mesh has no elements".to_string()));
        }
        if elements.len() != element_materials.len() {
            return Err(SectionError::MeshValidity(format!(
                "{} elements but {} material tags",
                elements.len(),
                element_materials.len()
            )));
        }
        check_indices(nodes.len(), elements.iter().map(|e| &e[..]))?;
        if let Some(bad) = element_materials.iter().position(|&m| m >= materials.len()) {
            return Err(SectionError::InvalidMesh {
                element: bad,
                reason: format!("material index {} out of range", element_materials[bad]),
            });
        }

        let areas: Vec<f64> = elements
            .iter()
            .map(|e| polygon_signed_area(&[nodes[e[0]], nodes[e[1]], nodes[e[2]]]))
            .collect();
        let mean = areas.iter().map(|a| a.abs()).sum::<f64>() / areas.len() as f64;

        let mut flipped = 0usize;
        let mut connectivity = Vec::with_capacity(elements.len());
        for (i, (e, area)) in elements.iter().zip(areas.iter()).enumerate() {
            if area.abs() <= MIN_RELATIVE_AREA * mean {
                return Err(SectionError::InvalidMesh {
                    element: i,
                    reason: format!("zero or near-zero area {area:e}"),
                });
            }
            let nodes = if *area < 0.0 {
                flipped += 1;
                [e[0], e[2], e[1], e[5], e[4], e[3]]
            } else {
                *e
            };
            connectivity.push(ElementConnectivity {
                nodes,
                material: element_materials[i],
            });
        }
        if flipped > 0 {
            warn!("Re-oriented {flipped} clockwise elements");
        }

        let mesh = Self {
            nodes: nodes.into_iter().map(Node::from).collect(),
            elements: connectivity,
            materials,
        }
        .compacted();

        debug!(
            "Mesh: {} nodes, {} elements, {} materials",
            mesh.nodes.len(),
            mesh.elements.len(),
            mesh.materials.len()
        );
        Ok(mesh)
    }

    /// Drops unreferenced nodes and renumbers the rest in first-use order
    fn compacted(self) -> Self {
        let mut map = vec![usize::MAX; self.nodes.len()];
        let mut nodes = Vec::with_capacity(self.nodes.len());
        let mut elements = self.elements;
        for el in elements.iter_mut() {
            for n in el.nodes.iter_mut() {
                if map[*n] == usize::MAX {
                    map[*n] = nodes.len();
                    nodes.push(self.nodes[*n]);
                }
                *n = map[*n];
            }
        }
        Self {
            nodes,
            elements,
            materials: self.materials,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn elements(&self) -> &[ElementConnectivity] {
        &self.elements
    }

    pub fn materials(&self) -> &MaterialRegistry {
        &self.materials
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    /// Material of element `idx`
    pub fn element_material(&self, idx: usize) -> Option<&Material> {
        self.elements
            .get(idx)
            .and_then(|e| self.materials.get(e.material))
    }

    /// Resolves element `idx` into a [`Tri6`] with coordinates and material
    pub fn element(&self, idx: usize) -> SectionResult<Tri6<'_>> {
        let conn = self.elements.get(idx).ok_or_else(|| SectionError::InvalidMesh {
            element: idx,
            reason: "no such element".to_string(),
        })?;
        let material = self
            .materials
            .get(conn.material)
            .ok_or_else(|| SectionError::InvalidMesh {
                element: idx,
                reason: format!("material index {} out of range", conn.material),
            })?;
        let mut coords = [[0.0; 2]; 6];
        for (c, &n) in coords.iter_mut().zip(conn.nodes.iter()) {
            *c = self
                .nodes
                .get(n)
                .ok_or_else(|| SectionError::InvalidMesh {
                    element: idx,
                    reason: format!("node index {n} out of range ({} nodes)", self.nodes.len()),
                })?
                .coords();
        }
        Tri6::new(idx, conn.nodes, coords, material)
    }

    /// Resolves every element, failing on the first invalid one
    pub fn tri6_elements(&self) -> SectionResult<Vec<Tri6<'_>>> {
        (0..self.elements.len()).map(|i| self.element(i)).collect()
    }

    /// Whether every element is reachable from every other through shared nodes
    pub fn check_connectivity(&self) -> SectionResult<()> {
        if self.elements.is_empty() {
            return Err(SectionError::MeshValidity("mesh has no elements".to_string()));
        }
        let mut parent: Vec<usize> = (0..self.nodes.len()).collect();
        fn find(parent: &mut [usize], mut i: usize) -> usize {
            while parent[i] != i {
                parent[i] = parent[parent[i]];
                i = parent[i];
            }
            i
        }
        for el in &self.elements {
            let root = find(&mut parent, el.nodes[0]);
            for &n in &el.nodes[1..] {
                let r = find(&mut parent, n);
                parent[r] = root;
            }
        }

        let root = find(&mut parent, self.elements[0].nodes[0]);
        if let Some(i) = self
            .elements
            .iter()
            .position(|el| find(&mut parent, el.nodes[0]) != root)
        {
            return Err(SectionError::MeshValidity(format!(
                "mesh is not connected: element {i} is isolated from element 0"
            )));
        }
        Ok(())
    }

    /// Copy with the material called `name` replaced
    pub fn with_material(&self, name: &str, material: Material) -> SectionResult<Self> {
        let mut materials = self.materials.clone();
        materials.replace(name, material)?;
        Ok(Self {
            nodes: self.nodes.clone(),
            elements: self.elements.clone(),
            materials,
        })
    }

    /// Copy translated by (dx, dy)
    pub fn shifted(&self, dx: f64, dy: f64) -> Self {
        Self {
            nodes: self.nodes.iter().map(|n| n.shifted(dx, dy)).collect(),
            elements: self.elements.clone(),
            materials: self.materials.clone(),
        }
    }

    /// Copy rotated by `angle` degrees about `origin`
    pub fn rotated(&self, angle: f64, origin: Point) -> Self {
        Self {
            nodes: self.nodes.iter().map(|n| n.rotated(angle, origin)).collect(),
            elements: self.elements.clone(),
            materials: self.materials.clone(),
        }
    }

    /// Bounding box as (min, max)
    pub fn bounds(&self) -> (Point, Point) {
        let mut min = [f64::INFINITY; 2];
        let mut max = [f64::NEG_INFINITY; 2];
        for n in &self.nodes {
            min[0] = min[0].min(n.x);
            min[1] = min[1].min(n.y);
            max[0] = max[0].max(n.x);
            max[1] = max[1].max(n.y);
        }
        (min, max)
    }

    /// Edges used by exactly one element, as (corner, corner, midside)
    pub fn boundary_edges(&self) -> Vec<[usize; 3]> {
        let mut count: HashMap<(usize, usize), ([usize; 3], usize)> = HashMap::new();
        for el in &self.elements {
            let n = el.nodes;
            for edge in [[n[0], n[1], n[3]], [n[1], n[2], n[4]], [n[2], n[0], n[5]]] {
                let key = (edge[0].min(edge[1]), edge[0].max(edge[1]));
                count.entry(key).or_insert((edge, 0)).1 += 1;
            }
        }
        let mut edges: Vec<[usize; 3]> = count
            .into_values()
            .filter(|(_, c)| *c == 1)
            .map(|(e, _)| e)
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Length of the mesh boundary, holes included
    pub fn perimeter(&self) -> f64 {
        self.boundary_edges()
            .iter()
            .map(|[a, b, m]| {
                self.nodes[*a].distance_to(&self.nodes[*m])
                    + self.nodes[*m].distance_to(&self.nodes[*b])
            })
            .sum()
    }

    /// Element containing `p` and the area coordinates of `p` within it
    pub fn locate(&self, p: Point) -> Option<(usize, [f64; 3])> {
        let (min, max) = self.bounds();
        let tol = 1e-9 * ((max[0] - min[0]) + (max[1] - min[1]));

        self.elements.iter().enumerate().find_map(|(i, el)| {
            let c = [el.nodes[0], el.nodes[1], el.nodes[2]].map(|n| self.nodes[n]);
            let inside_box = c.iter().any(|n| n.x <= p[0] + tol)
                && c.iter().any(|n| n.x >= p[0] - tol)
                && c.iter().any(|n| n.y <= p[1] + tol)
                && c.iter().any(|n| n.y >= p[1] - tol);
            if !inside_box {
                return None;
            }
            let l = crate::math::barycentric(p, c[0].coords(), c[1].coords(), c[2].coords())?;
            l.iter().all(|v| *v >= -1e-9).then_some((i, l))
        })
    }
}

fn check_indices<'a>(
    num_nodes: usize,
    elements: impl Iterator<Item = &'a [usize]>,
) -> SectionResult<()> {
    for (i, el) in elements.enumerate() {
        if let Some(&bad) = el.iter().find(|&&n| n >= num_nodes) {
            return Err(SectionError::InvalidMesh {
                element: i,
                reason: format!("node index {bad} out of range ({num_nodes} nodes)"),
            });
        }
    }
    Ok(())
}
