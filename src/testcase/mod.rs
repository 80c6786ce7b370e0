// src/testcase/mod.rs

//! The regression testcase: run a scenario once, then compare its result
//! against the reference stored for the fixture.

use crate::compare::{compare_sequences, Comparison, DEFAULT_TOLERANCE};
use crate::provenance::{hash_values, ProvenanceChain, RegressionReport};
use crate::{reference, FixtureIdentity, HarnessError, HarnessResult};
use chrono::Utc;
use std::path::PathBuf;

/// A concrete regression scenario.
///
/// `run` is the hook every scenario overrides. The default implementation
/// fails with [`HarnessError::NotImplemented`].
pub trait Scenario {
    /// Returns the unique name of the scenario.
    fn name(&self) -> &str;

    /// Produces the result sequence for `fixture`, recording each pipeline
    /// stage in `provenance`.
    fn run(
        &mut self,
        fixture: &FixtureIdentity,
        provenance: &mut ProvenanceChain,
    ) -> HarnessResult<Vec<f64>> {
        let _ = (fixture, provenance);
        Err(HarnessError::NotImplemented(self.name().to_string()))
    }
}

impl<S: Scenario + ?Sized> Scenario for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn run(
        &mut self,
        fixture: &FixtureIdentity,
        provenance: &mut ProvenanceChain,
    ) -> HarnessResult<Vec<f64>> {
        (**self).run(fixture, provenance)
    }
}

/// A scenario that never overrides `run`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unimplemented;

impl Scenario for Unimplemented {
    fn name(&self) -> &str {
        "Testcase"
    }
}

/// Owns one fixture, one scenario and everything a run produces.
pub struct Testcase<S> {
    fixture: FixtureIdentity,
    scenario: S,
    tolerance: f64,
    solution: Option<Vec<f64>>,
    reference: Option<Vec<f64>>,
    comparison: Option<Comparison>,
    provenance: ProvenanceChain,
}

impl<S: Scenario> Testcase<S> {
    /// Stores the grid and reference paths verbatim. No I/O happens here.
    pub fn new(grid: impl Into<PathBuf>, reference: impl Into<PathBuf>, scenario: S) -> Self {
        Testcase::from_fixture(FixtureIdentity::new(grid, reference), scenario)
    }

    pub fn from_fixture(fixture: FixtureIdentity, scenario: S) -> Self {
        Testcase {
            fixture,
            scenario,
            tolerance: DEFAULT_TOLERANCE,
            solution: None,
            reference: None,
            comparison: None,
            provenance: ProvenanceChain::new(),
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn fixture(&self) -> &FixtureIdentity {
        &self.fixture
    }

    pub fn scenario(&self) -> &S {
        &self.scenario
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn solution(&self) -> Option<&[f64]> {
        self.solution.as_deref()
    }

    /// Result of the last `compare()`, if any.
    pub fn comparison(&self) -> Option<&Comparison> {
        self.comparison.as_ref()
    }

    pub fn provenance(&self) -> &ProvenanceChain {
        &self.provenance
    }

    /// Runs the scenario and keeps its result sequence. A failed run leaves
    /// no result behind.
    pub fn run(&mut self) -> HarnessResult<()> {
        self.solution = None;
        self.comparison = None;
        self.provenance.drain_records();

        tracing::info!(
            scenario = self.scenario.name(),
            grid = %self.fixture.grid().display(),
            "running testcase"
        );
        let solution = self.scenario.run(&self.fixture, &mut self.provenance)?;
        tracing::info!(scenario = self.scenario.name(), values = solution.len(), "testcase finished");

        self.solution = Some(solution);
        Ok(())
    }

    /// Compares the solution with the reference solution.
    ///
    /// The reference file is read on the first call and kept afterwards.
    /// Returns `Ok(true)` iff both sequences have the same length and every
    /// pair is within tolerance.
    pub fn compare(&mut self) -> HarnessResult<bool> {
        let solution = self.solution.as_deref().ok_or(HarnessError::NotRun)?;

        if self.reference.is_none() {
            self.reference = Some(reference::load(self.fixture.reference())?);
        }
        let expected = self.reference.as_deref().unwrap_or_default();

        let comparison = compare_sequences(solution, expected, self.tolerance);
        if !comparison.passed() {
            tracing::warn!(
                scenario = self.scenario.name(),
                reference = %self.fixture.reference().display(),
                "{}",
                comparison
            );
        }

        self.comparison = Some(comparison);
        Ok(comparison.passed())
    }

    /// Writes the current solution to the fixture's reference path.
    ///
    /// Regenerates a reference; never part of a normal comparison.
    pub fn write_reference(&mut self) -> HarnessResult<()> {
        let solution = self.solution.as_deref().ok_or(HarnessError::NotRun)?;
        reference::save(self.fixture.reference(), solution)?;
        tracing::info!(
            scenario = self.scenario.name(),
            reference = %self.fixture.reference().display(),
            "reference regenerated"
        );
        // Stale once the file changed underneath.
        self.reference = None;
        self.comparison = None;
        Ok(())
    }

    /// Summarizes the last run and comparison.
    pub fn report(&self) -> HarnessResult<RegressionReport> {
        let solution = self.solution.as_deref().ok_or(HarnessError::NotRun)?;
        Ok(RegressionReport {
            scenario: self.scenario.name().to_string(),
            fixture: self.fixture.clone(),
            tolerance: self.tolerance,
            passed: self.comparison.map_or(false, |c| c.passed()),
            comparison: self.comparison,
            result_len: solution.len(),
            result_hash: hash_values(solution),
            reference_hash: self.reference.as_deref().map(hash_values),
            generated_at: Utc::now(),
            software_version: env!("CARGO_PKG_VERSION").to_string(),
            stages: self.provenance.records().to_vec(),
        })
    }
}
