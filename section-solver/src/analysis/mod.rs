//! Analysis stages, options and the engines behind them

pub mod geometric;
pub mod plastic;
pub mod stress;
pub mod warping;

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{SectionError, SectionResult};

/// A cached (or transient) stage of a section analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Area, centroid, second moments, principal axes
    Geometric,
    /// Torsion constant, shear functions, shear centre
    Warping,
    /// Plastic centroids and plastic moduli
    Plastic,
    /// Stress recovery for a load case (never cached)
    Stress,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Geometric => "geometric",
            Stage::Warping => "warping",
            Stage::Plastic => "plastic",
            Stage::Stress => "stress",
        };
        write!(f, "{name}")
    }
}

/// State-machine view of the analyses completed on a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionState {
    /// Nothing calculated yet
    Unanalysed,
    /// Geometric properties available
    GeometricDone,
    /// Geometric and warping properties available
    WarpingDone,
    /// Geometric and plastic properties available
    PlasticDone,
    /// Geometric, warping and plastic properties available
    Complete,
}

/// Linear solver used for the warping and shear function systems
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LinearSolver {
    /// Skyline Cholesky factorisation after reverse Cuthill-McKee reordering
    Direct,
    /// Jacobi preconditioned conjugate gradient
    Iterative { tolerance: f64, max_iterations: usize },
}

impl Default for LinearSolver {
    fn default() -> Self {
        Self::Direct
    }
}

/// Options for section analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Solver for the global finite element systems
    pub solver: LinearSolver,
    /// Integrate elements on the rayon pool
    pub parallel: bool,
    /// Abort before issuing a solve once this much time has elapsed
    pub time_limit: Option<Duration>,
    /// Relative tolerance on the plastic force balance
    pub plastic_tolerance: f64,
    /// Maximum root finder iterations per plastic neutral axis
    pub plastic_max_iterations: u64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            solver: LinearSolver::Direct,
            parallel: cfg!(feature = "parallel"),
            time_limit: None,
            plastic_tolerance: 1e-9,
            plastic_max_iterations: 500,
        }
    }
}

impl AnalysisOptions {
    /// Options using the iterative solver
    pub fn iterative(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            solver: LinearSolver::Iterative {
                tolerance,
                max_iterations,
            },
            ..Self::default()
        }
    }

    /// Run element integration serially
    pub fn serial(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set an outer time limit
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Set the plastic root finder tolerance
    pub fn with_plastic_tolerance(mut self, tol: f64) -> Self {
        self.plastic_tolerance = tol;
        self
    }

    /// Set the plastic root finder iteration cap
    pub fn with_plastic_max_iter(mut self, max_iter: u64) -> Self {
        self.plastic_max_iterations = max_iter;
        self
    }
}

/// Tracks the outer time limit of one analysis call
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
    start: Instant,
    limit: Option<Duration>,
}

impl Deadline {
    pub(crate) fn start(limit: Option<Duration>) -> Self {
        Self {
            start: Instant::now(),
            limit,
        }
    }

    /// Fails if the limit has elapsed; called before each non-interruptible solve
    pub(crate) fn check(&self, stage: Stage) -> SectionResult<()> {
        match self.limit {
            Some(limit) if self.start.elapsed() >= limit => Err(SectionError::TimeLimitExceeded {
                stage,
                limit_ms: limit.as_millis(),
            }),
            _ => Ok(()),
        }
    }
}

/// Maps every element index through `map`, on the rayon pool when
/// `parallel` is set. Results are returned in element order.
pub(crate) fn collect_elements<T, M>(n: usize, parallel: bool, map: M) -> Vec<T>
where
    T: Send,
    M: Fn(usize) -> T + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        if parallel {
            use rayon::prelude::*;

            return (0..n).into_par_iter().map(&map).collect();
        }
    }

    let _ = parallel;
    (0..n).map(map).collect()
}

/// Maps every element through `map` and folds the results with `reduce`.
///
/// Partial results are merged serially in element order, so the outcome
/// does not depend on thread scheduling.
pub(crate) fn map_elements<T, M, R>(n: usize, parallel: bool, identity: T, map: M, reduce: R) -> T
where
    T: Send,
    M: Fn(usize) -> T + Sync + Send,
    R: Fn(T, T) -> T,
{
    collect_elements(n, parallel, map)
        .into_iter()
        .fold(identity, reduce)
}
