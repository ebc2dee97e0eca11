//! Boundary to the external mesh generator

use serde::{Deserialize, Serialize};

use crate::error::{SectionError, SectionResult};
use crate::math::{point_segment_distance, Point};

/// A region marker: every triangle reachable from `point` without crossing a
/// segment gets `attribute`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub point: Point,
    pub attribute: usize,
    /// Maximum triangle area; `None` leaves it to the triangulator
    pub max_area: Option<f64>,
}

/// Planar straight-line graph handed to a triangulator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangulationInput {
    pub vertices: Vec<Point>,
    pub segments: Vec<[usize; 2]>,
    /// Points inside areas that must not be meshed
    pub holes: Vec<Point>,
    pub regions: Vec<Region>,
}

/// 3-node triangulation with one region attribute per triangle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangulationOutput {
    pub nodes: Vec<Point>,
    pub triangles: Vec<[usize; 3]>,
    pub attributes: Vec<usize>,
}

/// A constrained triangulator
pub trait Triangulator: Send + Sync {
    /// Triangulates the graph, honouring segments, holes and region areas
    fn triangulate(&self, input: &TriangulationInput) -> SectionResult<TriangulationOutput>;
}

/// Validates a graph before it is handed to a triangulator.
///
/// Rejects out-of-range or zero-length segments, vertices closer together
/// than `min_separation` and vertices closer than `min_separation` to a
/// segment they do not belong to.
pub fn preflight(input: &TriangulationInput, min_separation: f64) -> SectionResult<()> {
    let v = &input.vertices;
    if v.len() < 3 || input.segments.len() < 3 {
        return Err(SectionError::MeshValidity(format!(
            "graph too small to enclose an area ({} vertices, {} segments)",
            v.len(),
            input.segments.len()
        )));
    }
    if input.regions.is_empty() {
        return Err(SectionError::MeshValidity("graph has no regions".to_string()));
    }

    for (s, &[a, b]) in input.segments.iter().enumerate() {
        if a >= v.len() || b >= v.len() {
            return Err(SectionError::MeshValidity(format!(
                "segment {s} references a missing vertex"
            )));
        }
        if a == b {
            return Err(SectionError::MeshValidity(format!("segment {s} has zero length")));
        }
    }

    for i in 0..v.len() {
        for j in (i + 1)..v.len() {
            let d = ((v[i][0] - v[j][0]).powi(2) + (v[i][1] - v[j][1]).powi(2)).sqrt();
            if d < min_separation {
                return Err(SectionError::MeshValidity(format!(
                    "vertices {i} and {j} are {d:e} apart, below the minimum separation {min_separation:e}"
                )));
            }
        }
    }

    for (s, &[a, b]) in input.segments.iter().enumerate() {
        for (i, p) in v.iter().enumerate() {
            if i == a || i == b {
                continue;
            }
            let d = point_segment_distance(*p, v[a], v[b]);
            if d < min_separation {
                return Err(SectionError::MeshValidity(format!(
                    "vertex {i} lies {d:e} from segment {s}, below the minimum separation {min_separation:e}"
                )));
            }
        }
    }

    for r in &input.regions {
        if let Some(a) = r.max_area {
            if !(a > 0.0 && a.is_finite()) {
                return Err(SectionError::MeshValidity(format!(
                    "region {} has invalid maximum area {a}",
                    r.attribute
                )));
            }
        }
    }
    Ok(())
}
