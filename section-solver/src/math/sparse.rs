//! Sparse matrix utilities for the warping and shear function solves
//!
//! The Laplace-type stiffness matrices of a section mesh are overwhelmingly
//! sparse: each node couples only to the nodes of its adjoining elements.

use log::{debug, warn};
use nalgebra::{DMatrix, DVector, SMatrix};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

use crate::analysis::LinearSolver;
use crate::error::{SectionError, SectionResult};

/// Triplet accumulator for the global stiffness matrix of a section mesh
#[derive(Debug, Clone)]
pub struct SparseMatrixBuilder {
    size: usize,
    entries: Vec<(usize, usize, f64)>,
}

impl SparseMatrixBuilder {
    /// Empty `size` x `size` matrix
    pub fn new(size: usize) -> Self {
        // A quadratic triangle node couples to ~20 others
        let estimated_nnz = size * 20;
        Self {
            size,
            entries: Vec::with_capacity(estimated_nnz),
        }
    }

    /// Matrix dimension
    pub fn size(&self) -> usize {
        self.size
    }

    /// Accumulates `value` at (row, col); duplicates are summed on conversion
    #[inline]
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        if value.abs() > 1e-300 {
            self.entries.push((row, col, value));
        }
    }

    /// Scatters an element matrix onto the global node numbering
    pub fn add_element_matrix<const N: usize>(
        &mut self,
        dofs: &[usize; N],
        k_elem: &SMatrix<f64, N, N>,
    ) {
        for (i, &di) in dofs.iter().enumerate() {
            for (j, &dj) in dofs.iter().enumerate() {
                self.add(di, dj, k_elem[(i, j)]);
            }
        }
    }

    /// Drops one row and column, renumbering the remaining dofs.
    ///
    /// Used to pin a single dof of a system that is singular by one rank.
    pub fn without_dof(&self, dof: usize) -> Self {
        let shift = |i: usize| if i > dof { i - 1 } else { i };
        let entries = self
            .entries
            .iter()
            .filter(|&&(r, c, _)| r != dof && c != dof)
            .map(|&(r, c, v)| (shift(r), shift(c), v))
            .collect();
        Self {
            size: self.size.saturating_sub(1),
            entries,
        }
    }

    /// Renumbers rows and columns: entry (r, c) moves to (inv[r], inv[c])
    pub fn permuted(&self, inv: &[usize]) -> Self {
        Self {
            size: self.size,
            entries: self
                .entries
                .iter()
                .map(|&(r, c, v)| (inv[r], inv[c], v))
                .collect(),
        }
    }

    /// Compressed rows, duplicates summed
    pub fn to_csr(&self) -> CsrMatrix<f64> {
        let mut coo = CooMatrix::new(self.size, self.size);

        for &(row, col, val) in &self.entries {
            coo.push(row, col, val);
        }

        CsrMatrix::from(&coo)
    }

    /// Dense copy, for checks on small systems
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut mat = DMatrix::zeros(self.size, self.size);

        for &(row, col, val) in &self.entries {
            mat[(row, col)] += val;
        }

        mat
    }

    /// Stored triplets (duplicates included)
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Fraction of the matrix not covered by stored triplets
    pub fn sparsity(&self) -> f64 {
        let total = self.size * self.size;
        if total == 0 {
            return 1.0;
        }
        1.0 - (self.entries.len() as f64 / total as f64)
    }
}

/// Cholesky factorisation of a symmetric positive definite matrix.
///
/// Skyline (profile) storage, factorised once and reused for every
/// right-hand side of the warping and shear function problems.
pub struct SparseCholeskySolver {
    size: usize,
    // row i holds columns i - heights[i] ..= i
    skyline: Vec<Vec<f64>>,
    heights: Vec<usize>,
}

impl SparseCholeskySolver {
    /// Copies the lower triangle of `csr` into skyline storage
    pub fn new(csr: &CsrMatrix<f64>) -> Self {
        let size = csr.nrows();

        let mut heights = vec![0usize; size];
        for (row, col, _val) in csr.triplet_iter() {
            if col < row {
                let height = row - col;
                if height > heights[row] {
                    heights[row] = height;
                }
            }
        }

        let mut skyline: Vec<Vec<f64>> = Vec::with_capacity(size);
        for &h in &heights {
            skyline.push(vec![0.0; h + 1]);
        }

        for (row, col, &val) in csr.triplet_iter() {
            if col <= row && col >= row - heights[row] {
                let idx = col - (row - heights[row]);
                skyline[row][idx] += val;
            }
        }

        Self {
            size,
            skyline,
            heights,
        }
    }

    /// Number of stored entries in the profile
    pub fn profile_size(&self) -> usize {
        self.skyline.iter().map(|r| r.len()).sum()
    }

    /// In-place factorisation K = L L^T. A pivot that is not clearly
    /// positive means the system is singular.
    pub fn factorize(&mut self) -> SectionResult<()> {
        for i in 0..self.size {
            let hi = self.heights[i];
            let start_i = i - hi;

            for j in start_i..i {
                let hj = self.heights[j];
                let start_j = j - hj;

                let start = start_i.max(start_j);
                let mut sum = 0.0;

                for k in start..j {
                    sum += self.get(i, k) * self.get(j, k);
                }

                let diag_j = self.skyline[j][hj];
                let idx = j - start_i;
                self.skyline[i][idx] = (self.skyline[i][idx] - sum) / diag_j;
            }

            // pivot
            let mut sum = 0.0;
            for j in start_i..i {
                let val = self.get(i, j);
                sum += val * val;
            }

            let diag = self.skyline[i][hi] - sum;
            if diag <= 1e-14 * self.skyline[i][hi].abs().max(f64::MIN_POSITIVE) || !diag.is_finite() {
                return Err(SectionError::SingularMatrix(format!(
                    "non-positive pivot {diag:e} at equation {i} - the mesh may be disconnected"
                )));
            }
            self.skyline[i][hi] = diag.sqrt();
        }

        Ok(())
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> f64 {
        if col > row {
            return self.get(col, row);
        }
        let h = self.heights[row];
        let start = row - h;
        if col < start {
            return 0.0;
        }
        self.skyline[row][col - start]
    }

    /// Forward and back substitution with the factor
    pub fn solve(&self, b: &DVector<f64>) -> DVector<f64> {
        let mut x = b.clone();

        // L y = b
        for i in 0..self.size {
            let hi = self.heights[i];
            let start = i - hi;

            let mut sum = 0.0;
            for j in start..i {
                sum += self.get(i, j) * x[j];
            }

            x[i] = (x[i] - sum) / self.get(i, i);
        }

        // L^T x = y
        for i in (0..self.size).rev() {
            x[i] /= self.get(i, i);

            let hi = self.heights[i];
            let start = i - hi;

            for j in start..i {
                x[j] -= self.get(i, j) * x[i];
            }
        }

        x
    }
}

/// Jacobi preconditioned conjugate gradient. Converged once the residual
/// norm falls below `tol` times the norm of `b`.
pub fn solve_pcg(
    csr: &CsrMatrix<f64>,
    b: &DVector<f64>,
    tol: f64,
    max_iter: usize,
) -> SectionResult<DVector<f64>> {
    let n = csr.nrows();

    let mut diag = DVector::zeros(n);
    for (row, col, &val) in csr.triplet_iter() {
        if row == col {
            diag[row] += val;
        }
    }

    for i in 0..n {
        if diag[i] <= 0.0 {
            return Err(SectionError::SingularMatrix(format!(
                "non-positive diagonal {:e} at equation {i}",
                diag[i]
            )));
        }
    }

    let b_norm = b.norm();
    let mut x = DVector::zeros(n);
    if b_norm == 0.0 {
        return Ok(x);
    }
    let mut r = b.clone();

    let mut z = r.component_div(&diag);
    let mut p = z.clone();
    let mut r_dot_z = r.dot(&z);

    for iter in 0..max_iter {
        let ap = sparse_matvec(csr, &p);
        let p_dot_ap = p.dot(&ap);

        if p_dot_ap <= 0.0 {
            return Err(SectionError::SingularMatrix(format!(
                "conjugate gradient breakdown at iteration {iter}"
            )));
        }

        let alpha = r_dot_z / p_dot_ap;

        x.axpy(alpha, &p, 1.0);
        r.axpy(-alpha, &ap, 1.0);

        let r_norm = r.norm();
        if r_norm < tol * b_norm {
            debug!("pcg converged in {} iterations", iter + 1);
            return Ok(x);
        }

        z = r.component_div(&diag);
        let r_dot_z_new = r.dot(&z);
        let beta = r_dot_z_new / r_dot_z;
        r_dot_z = r_dot_z_new;

        p = &z + beta * &p;
    }

    Err(SectionError::ConvergenceFailed {
        solver: "Preconditioned conjugate gradient".to_string(),
        iterations: max_iter,
        residual: r.norm() / b_norm,
    })
}

/// y = A x
#[inline]
pub(crate) fn sparse_matvec(csr: &CsrMatrix<f64>, x: &DVector<f64>) -> DVector<f64> {
    let n = csr.nrows();
    let mut y = DVector::zeros(n);

    let row_offsets = csr.row_offsets();
    let col_indices = csr.col_indices();
    let values = csr.values();

    for row in 0..n {
        let start = row_offsets[row];
        let end = row_offsets[row + 1];

        let mut sum = 0.0;
        for idx in start..end {
            sum += values[idx] * x[col_indices[idx]];
        }
        y[row] = sum;
    }

    y
}

/// Solves a symmetric positive definite system for several right-hand sides.
///
/// The direct path reorders with reverse Cuthill-McKee and factorises once;
/// the iterative path runs one PCG solve per right-hand side.
pub fn solve_symmetric(
    k: &SparseMatrixBuilder,
    rhs: &[DVector<f64>],
    solver: LinearSolver,
) -> SectionResult<Vec<DVector<f64>>> {
    match solver {
        LinearSolver::Direct => {
            let perm = reverse_cuthill_mckee(&k.to_csr());
            let inv = inverse_permutation(&perm);
            let csr = k.permuted(&inv).to_csr();

            let mut chol = SparseCholeskySolver::new(&csr);
            debug!(
                "skyline cholesky: n = {}, nnz = {}, profile = {}",
                k.size(),
                csr.nnz(),
                chol.profile_size()
            );
            chol.factorize()?;

            Ok(rhs
                .iter()
                .map(|b| {
                    let b_perm = DVector::from_vec(apply_permutation(b.as_slice(), &perm));
                    let x_perm = chol.solve(&b_perm);
                    let mut x = DVector::zeros(b.len());
                    for (new_idx, &old_idx) in perm.iter().enumerate() {
                        x[old_idx] = x_perm[new_idx];
                    }
                    x
                })
                .collect())
        }
        LinearSolver::Iterative {
            tolerance,
            max_iterations,
        } => {
            let csr = k.to_csr();
            rhs.iter()
                .map(|b| solve_pcg(&csr, b, tolerance, max_iterations))
                .collect::<SectionResult<Vec<_>>>()
                .inspect_err(|e| warn!("iterative solve failed: {e}"))
        }
    }
}

/// Reverse Cuthill-McKee ordering; `perm[new] = old`.
///
/// Section meshes come out of the triangulator in no particular order, so
/// the profile of the unordered matrix is close to dense.
pub fn reverse_cuthill_mckee(csr: &CsrMatrix<f64>) -> Vec<usize> {
    let n = csr.nrows();
    if n == 0 {
        return vec![];
    }

    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (row, col, &val) in csr.triplet_iter() {
        if val != 0.0 && row != col {
            adj[row].push(col);
        }
    }

    let degrees: Vec<usize> = adj.iter().map(|v| v.len()).collect();

    // visit low degree neighbours first
    for neighbors in &mut adj {
        neighbors.sort_by_key(|&i| degrees[i]);
        neighbors.dedup();
    }

    let mut visited = vec![false; n];
    let mut result = Vec::with_capacity(n);
    let mut queue = std::collections::VecDeque::new();

    let start = (0..n).min_by_key(|&i| degrees[i]).unwrap_or(0);

    queue.push_back(start);
    visited[start] = true;

    while let Some(node) = queue.pop_front() {
        result.push(node);

        for &neighbor in &adj[node] {
            if !visited[neighbor] {
                visited[neighbor] = true;
                queue.push_back(neighbor);
            }
        }

        // next component
        if queue.is_empty() && result.len() < n {
            if let Some(i) = (0..n).find(|&i| !visited[i]) {
                queue.push_back(i);
                visited[i] = true;
            }
        }
    }

    result.reverse();
    result
}

/// `out[new] = vec[perm[new]]`
pub fn apply_permutation<T: Clone>(vec: &[T], perm: &[usize]) -> Vec<T> {
    perm.iter().map(|&i| vec[i].clone()).collect()
}

/// `inv[old] = new`
pub fn inverse_permutation(perm: &[usize]) -> Vec<usize> {
    let mut inv = vec![0; perm.len()];
    for (new_idx, &old_idx) in perm.iter().enumerate() {
        inv[old_idx] = new_idx;
    }
    inv
}
