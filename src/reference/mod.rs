// src/reference/mod.rs

//! Reads and writes reference solutions: plain text, one value per line.

use crate::{HarnessError, HarnessResult};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes `values` to `path`, one per line, in sequence order.
///
/// Values use the shortest representation that parses back to the same
/// `f64`, so a saved reference reloads bit for bit. Non-finite values are
/// refused since they can never match within a tolerance.
pub fn save(path: &Path, values: &[f64]) -> HarnessResult<()> {
    if let Some((index, value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(HarnessError::Config(format!(
            "cannot save non-finite value {} at index {} to {}",
            value,
            index,
            path.display()
        )));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| HarnessError::io(parent, e))?;
    }

    let file = fs::File::create(path).map_err(|e| HarnessError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for value in values {
        writeln!(writer, "{:?}", value).map_err(|e| HarnessError::io(path, e))?;
    }
    writer.flush().map_err(|e| HarnessError::io(path, e))?;

    tracing::debug!(path = %path.display(), values = values.len(), "reference written");
    Ok(())
}

/// Loads a reference sequence from `path` in file order.
///
/// Tokens are whitespace-delimited, so a file with several values on a line
/// loads the same as one value per line. Only finite literals are accepted;
/// `nan` and `inf` spellings are parse errors.
pub fn load(path: &Path) -> HarnessResult<Vec<f64>> {
    let contents = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;

    let mut values = Vec::new();
    for (line_idx, line) in contents.lines().enumerate() {
        for token in line.split_whitespace() {
            let value = token
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| HarnessError::Parse {
                    path: path.to_path_buf(),
                    line: line_idx + 1,
                    token: token.to_string(),
                })?;
            values.push(value);
        }
    }

    tracing::debug!(path = %path.display(), values = values.len(), "reference loaded");
    Ok(values)
}
