// src/scenarios/mod.rs

//! Registered regression scenarios and the fixtures they run against.

pub mod laplace;

pub use laplace::Laplace;

use crate::framework;
use crate::provenance::RegressionReport;
use crate::testcase::{Scenario, Testcase};
use crate::{HarnessConfig, HarnessError, HarnessResult};

/// A scenario together with the fixture file names it is checked against.
pub struct RegisteredScenario {
    pub name: &'static str,
    pub grid: &'static str,
    pub reference: &'static str,
    build: fn() -> Box<dyn Scenario>,
}

impl RegisteredScenario {
    /// Builds a fresh testcase for this scenario under `config`'s roots.
    pub fn testcase(&self, config: &HarnessConfig) -> Testcase<Box<dyn Scenario>> {
        Testcase::from_fixture(config.fixture(self.grid, self.reference), (self.build)())
            .with_tolerance(config.tolerance)
    }
}

fn build_laplace() -> Box<dyn Scenario> {
    Box::new(Laplace::new())
}

pub struct ScenarioManager {
    scenarios: Vec<RegisteredScenario>,
}

impl ScenarioManager {
    pub fn new() -> Self {
        ScenarioManager {
            scenarios: vec![RegisteredScenario {
                name: "Laplace",
                grid: "laplace_box_3d.json",
                reference: "laplace.txt",
                build: build_laplace,
            }],
        }
    }

    pub fn scenarios(&self) -> &[RegisteredScenario] {
        &self.scenarios
    }

    pub fn get(&self, name: &str) -> HarnessResult<&RegisteredScenario> {
        self.scenarios
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| HarnessError::UnknownScenario(name.to_string()))
    }
}

impl Default for ScenarioManager {
    fn default() -> Self {
        ScenarioManager::new()
    }
}

/// Runs one registered scenario end to end: run, regenerate the reference
/// when blessing, compare, report.
pub fn run_registered(entry: &RegisteredScenario, config: &HarnessConfig) -> HarnessResult<RegressionReport> {
    let mut testcase = entry.testcase(config);
    testcase.run()?;
    if config.bless {
        testcase.write_reference()?;
    }
    testcase.compare()?;
    testcase.report()
}

/// Runs `entries` in order, then tears the framework down after the last.
pub fn run_selected<'a>(
    entries: &[&'a RegisteredScenario],
    config: &HarnessConfig,
) -> Vec<(&'a RegisteredScenario, HarnessResult<RegressionReport>)> {
    let outcomes = entries
        .iter()
        .map(|&entry| (entry, run_registered(entry, config)))
        .collect();
    framework::shutdown();
    outcomes
}
