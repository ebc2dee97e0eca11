//! Structured triangulator for rectilinear sections
//!
//! Grid lines are placed at every vertex coordinate and subdivided until the
//! cells satisfy the smallest region area. Segments become walls between
//! cells; cells are labelled by flood fill from the frame (exterior), the
//! region markers and the hole markers, then every kept cell is split into
//! two counter-clockwise triangles.

use std::collections::{HashMap, VecDeque};

use log::debug;

use crate::error::{SectionError, SectionResult};
use crate::math::Point;
use crate::mesh::{TriangulationInput, TriangulationOutput, Triangulator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Unset,
    Outside,
    Hole,
    Region(usize),
}

/// Triangulator for graphs whose segments are all horizontal or vertical
#[derive(Debug, Clone, Copy)]
pub struct GridTriangulator {
    /// Upper bound on the number of grid cells
    pub max_cells: usize,
}

impl Default for GridTriangulator {
    fn default() -> Self {
        Self {
            max_cells: 2_000_000,
        }
    }
}

struct Grid {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Wall on line `ys[k]` above/below column `i`: index `i * (ny + 1) + k`
    h_wall: Vec<bool>,
    /// Wall on line `xs[k]` beside row `j`: index `k * ny + j`
    v_wall: Vec<bool>,
    labels: Vec<Label>,
}

impl Grid {
    fn nx(&self) -> usize {
        self.xs.len() - 1
    }

    fn ny(&self) -> usize {
        self.ys.len() - 1
    }

    fn cell(&self, i: usize, j: usize) -> usize {
        i * self.ny() + j
    }

    fn locate(&self, p: Point) -> Option<(usize, usize)> {
        let i = interval(&self.xs, p[0])?;
        let j = interval(&self.ys, p[1])?;
        Some((i, j))
    }

    fn neighbours(&self, i: usize, j: usize) -> Vec<(usize, usize)> {
        let (nx, ny) = (self.nx(), self.ny());
        let mut out = Vec::with_capacity(4);
        if i + 1 < nx && !self.v_wall[(i + 1) * ny + j] {
            out.push((i + 1, j));
        }
        if i > 0 && !self.v_wall[i * ny + j] {
            out.push((i - 1, j));
        }
        if j + 1 < ny && !self.h_wall[i * (ny + 1) + j + 1] {
            out.push((i, j + 1));
        }
        if j > 0 && !self.h_wall[i * (ny + 1) + j] {
            out.push((i, j - 1));
        }
        out
    }

    /// Labels every unset cell reachable from the seeds
    fn flood(&mut self, seeds: Vec<(usize, usize)>, label: Label) {
        let mut queue: VecDeque<(usize, usize)> = seeds.into();
        while let Some((i, j)) = queue.pop_front() {
            let c = self.cell(i, j);
            if self.labels[c] != Label::Unset {
                continue;
            }
            self.labels[c] = label;
            for (ni, nj) in self.neighbours(i, j) {
                if self.labels[self.cell(ni, nj)] == Label::Unset {
                    queue.push_back((ni, nj));
                }
            }
        }
    }
}

impl Triangulator for GridTriangulator {
    fn triangulate(&self, input: &TriangulationInput) -> SectionResult<TriangulationOutput> {
        let v = &input.vertices;
        let (min, max) = v.iter().fold(
            ([f64::INFINITY; 2], [f64::NEG_INFINITY; 2]),
            |(lo, hi), p| {
                (
                    [lo[0].min(p[0]), lo[1].min(p[1])],
                    [hi[0].max(p[0]), hi[1].max(p[1])],
                )
            },
        );
        let tol = 1e-9 * ((max[0] - min[0]) + (max[1] - min[1])).max(1.0);

        for &[a, b] in &input.segments {
            let (pa, pb) = (v[a], v[b]);
            if (pa[0] - pb[0]).abs() > tol && (pa[1] - pb[1]).abs() > tol {
                return Err(SectionError::InvalidInput(format!(
                    "grid triangulator needs axis-aligned segments, got ({}, {}) - ({}, {})",
                    pa[0], pa[1], pb[0], pb[1]
                )));
            }
        }

        let min_area = input
            .regions
            .iter()
            .filter_map(|r| r.max_area)
            .fold(f64::INFINITY, f64::min);
        let h = (2.0 * min_area).sqrt();
        let xs = refine(&unique_sorted(v.iter().map(|p| p[0]), tol), h);
        let ys = refine(&unique_sorted(v.iter().map(|p| p[1]), tol), h);
        if xs.len() < 2 || ys.len() < 2 {
            return Err(SectionError::MeshValidity(
                "graph has no extent in one direction".to_string(),
            ));
        }

        let (nx, ny) = (xs.len() - 1, ys.len() - 1);
        if nx.saturating_mul(ny) > self.max_cells {
            return Err(SectionError::InvalidInput(format!(
                "grid of {nx} x {ny} cells exceeds the limit of {}",
                self.max_cells
            )));
        }

        let mut grid = Grid {
            h_wall: vec![false; nx * (ny + 1)],
            v_wall: vec![false; (nx + 1) * ny],
            labels: vec![Label::Unset; nx * ny],
            xs,
            ys,
        };

        for &[a, b] in &input.segments {
            let (pa, pb) = (v[a], v[b]);
            if (pa[1] - pb[1]).abs() <= tol {
                let k = line_index(&grid.ys, pa[1], tol)?;
                let (lo, hi) = (pa[0].min(pb[0]), pa[0].max(pb[0]));
                for i in 0..nx {
                    if grid.xs[i] >= lo - tol && grid.xs[i + 1] <= hi + tol {
                        grid.h_wall[i * (ny + 1) + k] = true;
                    }
                }
            } else {
                let k = line_index(&grid.xs, pa[0], tol)?;
                let (lo, hi) = (pa[1].min(pb[1]), pa[1].max(pb[1]));
                for j in 0..ny {
                    if grid.ys[j] >= lo - tol && grid.ys[j + 1] <= hi + tol {
                        grid.v_wall[k * ny + j] = true;
                    }
                }
            }
        }

        // cells open to the frame are outside
        let mut frame = Vec::new();
        for i in 0..nx {
            if !grid.h_wall[i * (ny + 1)] {
                frame.push((i, 0));
            }
            if !grid.h_wall[i * (ny + 1) + ny] {
                frame.push((i, ny - 1));
            }
        }
        for j in 0..ny {
            if !grid.v_wall[j] {
                frame.push((0, j));
            }
            if !grid.v_wall[nx * ny + j] {
                frame.push((nx - 1, j));
            }
        }
        grid.flood(frame, Label::Outside);

        for r in &input.regions {
            let cell = grid.locate(r.point).ok_or_else(|| {
                SectionError::MeshValidity(format!(
                    "region {} marker ({}, {}) lies outside the graph",
                    r.attribute, r.point[0], r.point[1]
                ))
            })?;
            grid.flood(vec![cell], Label::Region(r.attribute));
        }
        for p in &input.holes {
            if let Some(cell) = grid.locate(*p) {
                grid.flood(vec![cell], Label::Hole);
            }
        }

        let mut out = TriangulationOutput::default();
        let mut node_ids: HashMap<(usize, usize), usize> = HashMap::new();
        let mut node = |i: usize, j: usize, nodes: &mut Vec<Point>| {
            *node_ids.entry((i, j)).or_insert_with(|| {
                nodes.push([grid.xs[i], grid.ys[j]]);
                nodes.len() - 1
            })
        };

        for i in 0..nx {
            for j in 0..ny {
                let attribute = match grid.labels[i * ny + j] {
                    Label::Outside | Label::Hole => continue,
                    Label::Region(a) => a,
                    Label::Unset => 0,
                };
                let p00 = node(i, j, &mut out.nodes);
                let p10 = node(i + 1, j, &mut out.nodes);
                let p11 = node(i + 1, j + 1, &mut out.nodes);
                let p01 = node(i, j + 1, &mut out.nodes);
                out.triangles.push([p00, p10, p11]);
                out.triangles.push([p00, p11, p01]);
                out.attributes.extend([attribute, attribute]);
            }
        }

        if out.triangles.is_empty() {
            return Err(SectionError::MeshValidity(
                "no cells enclosed by the graph".to_string(),
            ));
        }
        debug!(
            "Grid triangulation: {nx} x {ny} cells, {} triangles, {} nodes",
            out.triangles.len(),
            out.nodes.len()
        );
        Ok(out)
    }
}

fn unique_sorted(values: impl Iterator<Item = f64>, tol: f64) -> Vec<f64> {
    let mut v: Vec<f64> = values.collect();
    v.sort_by(f64::total_cmp);
    v.dedup_by(|a, b| (*a - *b).abs() <= tol);
    v
}

/// Subdivides every interval into equal parts no longer than `h`
fn refine(lines: &[f64], h: f64) -> Vec<f64> {
    if !h.is_finite() || lines.len() < 2 {
        return lines.to_vec();
    }
    let mut out = vec![lines[0]];
    for w in lines.windows(2) {
        let n = ((w[1] - w[0]) / h).ceil().max(1.0) as usize;
        for k in 1..=n {
            out.push(w[0] + (w[1] - w[0]) * k as f64 / n as f64);
        }
    }
    out
}

fn line_index(lines: &[f64], value: f64, tol: f64) -> SectionResult<usize> {
    lines
        .iter()
        .position(|l| (l - value).abs() <= tol)
        .ok_or_else(|| SectionError::NumericalFailure(format!("no grid line at {value}")))
}

/// Index of the interval of `lines` containing `value`
fn interval(lines: &[f64], value: f64) -> Option<usize> {
    let last = lines.len().checked_sub(2)?;
    if value < lines[0] || value > lines[last + 1] {
        return None;
    }
    Some(lines.partition_point(|l| *l <= value).saturating_sub(1).min(last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Region;
    use approx::assert_relative_eq;

    fn area(out: &TriangulationOutput) -> f64 {
        out.triangles
            .iter()
            .map(|t| {
                let [a, b, c] = t.map(|n| out.nodes[n]);
                0.5 * ((b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1]))
            })
            .sum()
    }

    fn l_shape() -> TriangulationInput {
        TriangulationInput {
            vertices: vec![
                [0.0, 0.0],
                [4.0, 0.0],
                [4.0, 1.0],
                [1.0, 1.0],
                [1.0, 3.0],
                [0.0, 3.0],
            ],
            segments: vec![[0, 1], [1, 2], [2, 3], [3, 4], [4, 5], [5, 0]],
            holes: vec![],
            regions: vec![Region {
                point: [0.5, 0.5],
                attribute: 3,
                max_area: Some(0.05),
            }],
        }
    }

    #[test]
    fn test_l_shape_area_and_orientation() {
        let out = GridTriangulator::default().triangulate(&l_shape()).unwrap();
        assert_relative_eq!(area(&out), 6.0, epsilon = 1e-9);
        assert!(out.attributes.iter().all(|a| *a == 3));
        for t in &out.triangles {
            let [a, b, c] = t.map(|n| out.nodes[n]);
            let cross = (b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1]);
            assert!(cross > 0.0);
            assert!(0.5 * cross <= 0.05 + 1e-12);
        }
    }

    #[test]
    fn test_hole_removed() {
        let input = TriangulationInput {
            vertices: vec![
                [0.0, 0.0],
                [3.0, 0.0],
                [3.0, 3.0],
                [0.0, 3.0],
                [1.0, 1.0],
                [2.0, 1.0],
                [2.0, 2.0],
                [1.0, 2.0],
            ],
            segments: vec![
                [0, 1],
                [1, 2],
                [2, 3],
                [3, 0],
                [4, 5],
                [5, 6],
                [6, 7],
                [7, 4],
            ],
            holes: vec![[1.5, 1.5]],
            regions: vec![Region {
                point: [0.5, 0.5],
                attribute: 0,
                max_area: None,
            }],
        };
        let out = GridTriangulator::default().triangulate(&input).unwrap();
        assert_relative_eq!(area(&out), 8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sloped_segment_rejected() {
        let mut input = l_shape();
        input.vertices[1] = [4.0, 0.5];
        assert!(matches!(
            GridTriangulator::default().triangulate(&input),
            Err(SectionError::InvalidInput(_))
        ));
    }
}
