// src/provenance/mod.rs

//! Tracks what a testcase run did: one hash-linked record per pipeline stage,
//! rolled up into a regression report once the comparison is done.

use crate::{Comparison, FixtureIdentity, HarnessError, HarnessResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Represents a single pipeline stage in the provenance chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub timestamp: DateTime<Utc>,
    pub stage: String,
    pub data_hash: String,
    pub software_version: String,
    pub previous_record_hash: Option<String>,
    pub metadata: serde_json::Value,
}

impl StageRecord {
    pub fn new(
        stage: String,
        data: &[u8],
        previous_record_hash: Option<String>,
        metadata: serde_json::Value,
    ) -> Self {
        StageRecord {
            timestamp: Utc::now(),
            stage,
            data_hash: hash_bytes(data),
            software_version: env!("CARGO_PKG_VERSION").to_string(),
            previous_record_hash,
            metadata,
        }
    }

    /// Calculates the hash of the current record for linking.
    pub fn calculate_record_hash(&self) -> HarnessResult<String> {
        let serialized = serde_json::to_string(self)?;
        Ok(hash_bytes(serialized.as_bytes()))
    }
}

/// SHA-256 of a byte slice, lowercase hex.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// SHA-256 over the little-endian bytes of each value, in order.
pub fn hash_values(values: &[f64]) -> String {
    let mut hasher = Sha256::new();
    for value in values {
        hasher.update(value.to_le_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Ordered, hash-linked stage records of one `run()`.
#[derive(Debug, Default)]
pub struct ProvenanceChain {
    records: Vec<StageRecord>,
}

impl ProvenanceChain {
    pub fn new() -> Self {
        ProvenanceChain { records: Vec::new() }
    }

    /// Appends a record linked to the current tail.
    pub fn add_record(
        &mut self,
        stage: impl Into<String>,
        data: &[u8],
        metadata: serde_json::Value,
    ) -> HarnessResult<()> {
        let previous_record_hash = match self.records.last() {
            Some(last) => Some(last.calculate_record_hash()?),
            None => None,
        };
        let record = StageRecord::new(stage.into(), data, previous_record_hash, metadata);
        tracing::debug!(stage = %record.stage, hash = %record.data_hash, "stage recorded");
        self.records.push(record);
        Ok(())
    }

    pub fn records(&self) -> &[StageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True if every record points at the hash of its predecessor.
    pub fn verify_links(&self) -> HarnessResult<bool> {
        let mut expected: Option<String> = None;
        for record in &self.records {
            if record.previous_record_hash != expected {
                return Ok(false);
            }
            expected = Some(record.calculate_record_hash()?);
        }
        Ok(true)
    }

    pub fn to_json(&self) -> HarnessResult<String> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }

    pub fn from_json(json_str: &str) -> HarnessResult<Self> {
        let records = serde_json::from_str(json_str)?;
        Ok(ProvenanceChain { records })
    }

    /// Drains all records, leaving the chain empty for the next run.
    pub fn drain_records(&mut self) -> Vec<StageRecord> {
        std::mem::take(&mut self.records)
    }
}

/// Everything a reader needs to judge one regression run after the fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionReport {
    pub scenario: String,
    pub fixture: FixtureIdentity,
    pub tolerance: f64,
    pub passed: bool,
    pub comparison: Option<Comparison>,
    pub result_len: usize,
    pub result_hash: String,
    pub reference_hash: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub software_version: String,
    pub stages: Vec<StageRecord>,
}

/// Writes reports as a pretty-printed JSON array.
pub fn write_reports(path: &Path, reports: &[RegressionReport]) -> HarnessResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| HarnessError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(reports)?;
    fs::write(path, json).map_err(|e| HarnessError::io(path, e))
}
