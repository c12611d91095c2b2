//! Parser configuration
//!
//! Every setting has a default matching current firmware logs, so a config
//! file only needs the keys it changes:
//!
//! ```yaml
//! chunk_size: 65536
//! relaxed_types: [0x80, 0x0A, 0x0B]
//! timestamp_candidates:
//!   - { name: TimeUS, divisor: 1000000.0 }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::format::header::{HEADER_LEN, SCHEMA_TYPE, STARTUP_TYPE};
use crate::registry::ValidationRules;
use crate::timestamp::DEFAULT_WARNING_LIMIT;
use crate::types::TimestampCandidate;
use crate::{DataflashError, Result};

/// Bytes requested from the input per read when nothing else is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Settings of one decoding session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct ParserConfig {
    /// Bytes read from the input per chunk
    pub chunk_size: usize,
    /// Known time field names, tried in order
    pub timestamp_candidates: Vec<TimestampCandidate>,
    /// Type codes validated with relaxed rules
    pub relaxed_types: Vec<u8>,
    /// Detailed time corruption warnings logged before suppression
    pub time_warning_limit: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            timestamp_candidates: TimestampCandidate::defaults(),
            relaxed_types: vec![SCHEMA_TYPE, STARTUP_TYPE],
            time_warning_limit: DEFAULT_WARNING_LIMIT,
        }
    }
}

impl ParserConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml).map_err(|e| {
            DataflashError::invalid_config(format!("YAML parsing failed: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| DataflashError::file_error(path.to_path_buf(), e))?;
        debug!(path = %path.display(), "Loaded parser configuration");
        Self::from_yaml_str(&yaml)
    }

    /// Check that the settings describe a usable session.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size < HEADER_LEN {
            return Err(DataflashError::invalid_config(format!(
                "chunk_size must be at least {} bytes, got {}",
                HEADER_LEN, self.chunk_size
            )));
        }

        if self.timestamp_candidates.is_empty() {
            return Err(DataflashError::invalid_config("at least one timestamp candidate is required"));
        }

        for candidate in &self.timestamp_candidates {
            if candidate.name.is_empty() {
                return Err(DataflashError::invalid_config("timestamp candidate without a name"));
            }
            if !candidate.divisor.is_finite() || candidate.divisor <= 0.0 {
                return Err(DataflashError::invalid_config(format!(
                    "timestamp candidate {} has invalid divisor {}",
                    candidate.name, candidate.divisor
                )));
            }
        }

        Ok(())
    }

    /// Validation rules built from the relaxed type table.
    pub fn rules(&self) -> ValidationRules {
        ValidationRules::new(self.relaxed_types.iter().copied())
    }
}
