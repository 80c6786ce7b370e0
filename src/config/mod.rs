// src/config/mod.rs

//! Where fixtures live and how strictly results are compared.

use crate::compare::DEFAULT_TOLERANCE;
use crate::{FixtureIdentity, HarnessError, HarnessResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const BLESS_ENV: &str = "REGRESSION_BLESS";
pub const TOLERANCE_ENV: &str = "REGRESSION_TOLERANCE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub grid_root: PathBuf,
    pub reference_root: PathBuf,
    pub tolerance: f64,
    /// Regenerate references from the current results instead of only comparing.
    pub bless: bool,
    pub report_dir: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig::default_paths()
    }
}

impl HarnessConfig {
    /// Fixtures shipped with the crate under `fixtures/`.
    pub fn default_paths() -> Self {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
        HarnessConfig {
            grid_root: root.join("grids"),
            reference_root: root.join("references"),
            tolerance: DEFAULT_TOLERANCE,
            bless: false,
            report_dir: None,
        }
    }

    /// Reads a JSON config. Missing fields keep their defaults; relative
    /// paths are resolved against the config file's directory.
    pub fn from_file(path: &Path) -> HarnessResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        let mut config: HarnessConfig = serde_json::from_str(&text)?;

        if let Some(base) = path.parent() {
            config.grid_root = base.join(&config.grid_root);
            config.reference_root = base.join(&config.reference_root);
            config.report_dir = config.report_dir.map(|dir| base.join(dir));
        }

        config.validate()?;
        Ok(config)
    }

    /// Applies `REGRESSION_BLESS` and `REGRESSION_TOLERANCE` if set.
    pub fn with_env_overrides(self) -> HarnessResult<Self> {
        let bless = std::env::var(BLESS_ENV).ok();
        let tolerance = std::env::var(TOLERANCE_ENV).ok();
        self.apply_overrides(bless.as_deref(), tolerance.as_deref())
    }

    fn apply_overrides(mut self, bless: Option<&str>, tolerance: Option<&str>) -> HarnessResult<Self> {
        if let Some(flag) = bless {
            self.bless = match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                other => {
                    return Err(HarnessError::Config(format!("{}={} is not a boolean", BLESS_ENV, other)))
                }
            };
        }
        if let Some(raw) = tolerance {
            self.tolerance = raw.trim().parse().map_err(|_| {
                HarnessError::Config(format!("{}={} is not a number", TOLERANCE_ENV, raw))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> HarnessResult<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(HarnessError::Config(format!(
                "tolerance must be finite and positive, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }

    /// Resolves fixture file names against the configured roots.
    pub fn fixture(&self, grid: &str, reference: &str) -> FixtureIdentity {
        FixtureIdentity::new(self.grid_root.join(grid), self.reference_root.join(reference))
    }
}
