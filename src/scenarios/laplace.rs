// src/scenarios/laplace.rs

//! Laplace testcase: unit diffusion, no reaction, `-1` and `+1` held on two
//! opposite faces of a 3D box.

use crate::framework::{self, FrameworkOptions};
use crate::pipeline::{DirichletCondition, FdmPipeline, Pipeline, ProblemSetup, SolverSettings};
use crate::provenance::{hash_values, ProvenanceChain};
use crate::testcase::Scenario;
use crate::{FixtureIdentity, HarnessResult};

pub const DEFAULT_REFINEMENTS: usize = 2;

/// The problem the stored reference was produced with.
pub fn problem_setup() -> ProblemSetup {
    ProblemSetup {
        diffusion: 1.0,
        reaction: 0.0,
        dirichlet: vec![
            DirichletCondition::new(-1.0, "bndNegative"),
            DirichletCondition::new(1.0, "bndPositive"),
        ],
        solver_settings: SolverSettings::default(),
    }
}

pub struct Laplace<P = FdmPipeline> {
    pipeline: P,
    num_refinements: usize,
    problem: ProblemSetup,
}

impl Laplace<FdmPipeline> {
    pub fn new() -> Self {
        Laplace::with_pipeline(FdmPipeline::new())
    }
}

impl Default for Laplace<FdmPipeline> {
    fn default() -> Self {
        Laplace::new()
    }
}

impl<P: Pipeline> Laplace<P> {
    pub fn with_pipeline(pipeline: P) -> Self {
        Laplace {
            pipeline,
            num_refinements: DEFAULT_REFINEMENTS,
            problem: problem_setup(),
        }
    }

    pub fn with_refinements(mut self, num_refinements: usize) -> Self {
        self.num_refinements = num_refinements;
        self
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub fn problem(&self) -> &ProblemSetup {
        &self.problem
    }
}

impl<P: Pipeline> Scenario for Laplace<P> {
    fn name(&self) -> &str {
        "Laplace"
    }

    fn run(
        &mut self,
        fixture: &FixtureIdentity,
        provenance: &mut ProvenanceChain,
    ) -> HarnessResult<Vec<f64>> {
        framework::init(FrameworkOptions::cpu(3))?;

        // Domain
        self.pipeline.load_domain(fixture.grid())?;
        provenance.add_record(
            "load_domain",
            fixture.grid().to_string_lossy().as_bytes(),
            serde_json::json!({
                "pipeline": self.pipeline.name(),
                "grid": fixture.grid().display().to_string(),
            }),
        )?;

        self.pipeline.refine(self.num_refinements)?;
        provenance.add_record(
            "refine",
            &self.num_refinements.to_le_bytes(),
            serde_json::json!({ "num_refs": self.num_refinements }),
        )?;

        // Discretization and solve
        self.pipeline.assemble_and_solve(&self.problem)?;
        let setup = serde_json::to_vec(&self.problem)?;
        provenance.add_record(
            "assemble_and_solve",
            &setup,
            serde_json::json!({ "solver": self.problem.solver_settings.solver }),
        )?;

        let solution = self.pipeline.solution()?;
        provenance.add_record(
            "extract_solution",
            hash_values(&solution).as_bytes(),
            serde_json::json!({ "values": solution.len() }),
        )?;

        Ok(solution)
    }
}
