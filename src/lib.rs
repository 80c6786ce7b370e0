pub mod compare;
pub mod config;
pub mod framework;
pub mod kernel;
pub mod pipeline;
pub mod provenance;
pub mod reference;
pub mod scenarios;
pub mod testcase;

// Re-exporting the harness surface for easier access by tests and the runner.
pub use compare::{approx_equal, compare_sequences, Comparison, DEFAULT_TOLERANCE};
pub use config::HarnessConfig;
pub use kernel::{Matrix, Vector};
pub use provenance::RegressionReport;
pub use testcase::{Scenario, Testcase, Unimplemented};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// --- Errors ---

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("run() of scenario {0} is not implemented")]
    NotImplemented(String),

    #[error("no result sequence available, run() has not completed")]
    NotRun,

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: not a numeric literal: {token:?}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        token: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Solver failed: {0}")]
    SolverFailed(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Scenario not found: {0}")]
    UnknownScenario(String),
}

impl HarnessError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        HarnessError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;

// --- Fixtures ---

/// The pair of files identifying a testcase: the input grid and the stored
/// reference solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureIdentity {
    grid: PathBuf,
    reference: PathBuf,
}

impl FixtureIdentity {
    pub fn new(grid: impl Into<PathBuf>, reference: impl Into<PathBuf>) -> Self {
        FixtureIdentity {
            grid: grid.into(),
            reference: reference.into(),
        }
    }

    pub fn grid(&self) -> &Path {
        &self.grid
    }

    pub fn reference(&self) -> &Path {
        &self.reference
    }
}
