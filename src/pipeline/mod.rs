// src/pipeline/mod.rs

//! The collaborator a scenario drives to produce its solution.
//!
//! The harness only relies on the four operations of [`Pipeline`]: load a
//! problem description, refine it, assemble and solve, read back the
//! solution. How a pipeline discretizes and solves is its own business.

pub mod fdm_pipeline;

pub use fdm_pipeline::{BoundarySubset, BoxDomain, FdmPipeline, Side};

use crate::HarnessResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A fixed value imposed on every node of a named boundary subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirichletCondition {
    pub subset: String,
    pub value: f64,
}

impl DirichletCondition {
    pub fn new(value: f64, subset: impl Into<String>) -> Self {
        DirichletCondition {
            subset: subset.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinearSolverKind {
    /// LU with partial pivoting.
    Lu,
    /// LU with full pivoting.
    FullPivLu,
}

/// Specifies which solver to use and how strictly to check its answer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    pub solver: LinearSolverKind,
    /// Upper bound on `|A x - b| / |b|` after the solve.
    pub residual_tolerance: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        SolverSettings {
            solver: LinearSolverKind::Lu,
            residual_tolerance: 1e-10,
        }
    }
}

/// Scalar diffusion-reaction problem `-D Δu + r u = 0` with Dirichlet data.
/// Boundary faces without a Dirichlet condition are zero-flux.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemSetup {
    pub diffusion: f64,
    pub reaction: f64,
    pub dirichlet: Vec<DirichletCondition>,
    pub solver_settings: SolverSettings,
}

/// The common interface of every solve pipeline a scenario can drive.
pub trait Pipeline {
    /// Returns the unique name of the pipeline.
    fn name(&self) -> &'static str;

    /// Loads the problem description stored at `grid`.
    fn load_domain(&mut self, grid: &Path) -> HarnessResult<()>;

    /// Applies `num_refs` uniform refinement steps to the loaded domain.
    fn refine(&mut self, num_refs: usize) -> HarnessResult<()>;

    /// Assembles the discrete system for `problem` and solves it.
    fn assemble_and_solve(&mut self, problem: &ProblemSetup) -> HarnessResult<()>;

    /// The solved nodal values in degree-of-freedom order.
    fn solution(&self) -> HarnessResult<Vec<f64>>;
}
