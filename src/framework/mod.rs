// src/framework/mod.rs

//! Process-wide setup shared by all testcases: logging and the numerical
//! context scenarios run in. Initialized once before the first run.

use crate::{HarnessError, HarnessResult};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, OnceLock, PoisonError};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algebra {
    Cpu { blocksize: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkOptions {
    pub dim: usize,
    pub algebra: Algebra,
}

impl FrameworkOptions {
    pub fn cpu(dim: usize) -> Self {
        FrameworkOptions {
            dim,
            algebra: Algebra::Cpu { blocksize: 1 },
        }
    }
}

static CONTEXT: Mutex<Option<FrameworkOptions>> = Mutex::new(None);
static LOGGING: OnceLock<()> = OnceLock::new();

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn install_logging() {
    // Another subscriber may already be installed by the embedding binary.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_test_writer()
        .try_init();
}

/// Sends log lines to stderr instead of the test writer. Binaries call this
/// before [`init`] so logs stay out of their stdout.
pub fn init_stderr_logging() {
    LOGGING.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .try_init();
    });
}

/// Initializes the framework.
///
/// Repeating the call with the same options is a no-op. Asking for different
/// options while initialized is an error; call [`shutdown`] first.
pub fn init(options: FrameworkOptions) -> HarnessResult<()> {
    if !(1..=3).contains(&options.dim) {
        return Err(HarnessError::Config(format!(
            "dimension must be 1, 2 or 3, got {}",
            options.dim
        )));
    }
    let Algebra::Cpu { blocksize } = options.algebra;
    if blocksize == 0 {
        return Err(HarnessError::Config("algebra blocksize must be at least 1".to_string()));
    }

    LOGGING.get_or_init(install_logging);

    let mut context = CONTEXT.lock().unwrap_or_else(PoisonError::into_inner);
    match *context {
        Some(current) if current == options => Ok(()),
        Some(current) => Err(HarnessError::Config(format!(
            "framework already initialized with {:?}, requested {:?}",
            current, options
        ))),
        None => {
            *context = Some(options);
            tracing::info!(dim = options.dim, algebra = ?options.algebra, "framework initialized");
            Ok(())
        }
    }
}

/// Tears the framework down. Logging stays installed for the process.
pub fn shutdown() {
    let mut context = CONTEXT.lock().unwrap_or_else(PoisonError::into_inner);
    if context.take().is_some() {
        tracing::info!("framework shut down");
    }
}

pub fn is_initialized() -> bool {
    current().is_some()
}

pub fn current() -> Option<FrameworkOptions> {
    *CONTEXT.lock().unwrap_or_else(PoisonError::into_inner)
}
