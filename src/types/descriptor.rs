//! Record type descriptors and timestamp conventions

use serde::{Deserialize, Serialize};

use super::FieldType;
use crate::format::header::HEADER_LEN;

/// Label used for fields the descriptor has no label for.
pub const PLACEHOLDER_LABEL: &str = "NoLabel";

/// Layout of one record type, as declared by a schema record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct TypeDescriptor {
    /// Record type code, `None` until the schema record has been read
    pub id: Option<u8>,
    /// Total on-wire record length including the 3 byte header
    pub declared_length: usize,
    /// Short type name such as `GPS` or `PARM`
    pub name: String,
    /// One format character per field
    pub format: String,
    /// One label per field
    pub labels: Vec<String>,
    /// Whether a field of the active timestamp is part of the record
    pub has_timestamp: bool,
    /// Position of the timestamp among the decoded values
    pub timestamp_index: usize,
}

impl TypeDescriptor {
    /// Number of bytes following the record header.
    pub fn payload_len(&self) -> usize {
        self.declared_length.saturating_sub(HEADER_LEN)
    }

    /// Rename the first label equal to `old`, if any.
    pub fn rename_label(&mut self, old: &str, new: &str) {
        if let Some(label) = self.labels.iter_mut().find(|label| label.as_str() == old) {
            *label = new.to_string();
        }
    }

    /// Bind the active timestamp to this descriptor if one of its labels carries it.
    ///
    /// Descriptors without the label keep `has_timestamp == false` and get a
    /// synthetic field at registration, see [`Self::with_timestamp_field`].
    pub fn finalize(&mut self, timestamp: &TimestampCandidate) {
        if let Some(index) = self.labels.iter().position(|label| *label == timestamp.name) {
            self.has_timestamp = true;
            self.timestamp_index = index;
        }
    }

    /// Copy of this descriptor with a leading 64-bit timestamp field.
    pub fn with_timestamp_field(&self, timestamp: &TimestampCandidate) -> Self {
        let mut extended = self.clone();
        extended.labels.insert(0, timestamp.name.clone());
        extended.format.insert(0, FieldType::UInt64.code());
        extended.declared_length += FieldType::UInt64.size();
        extended.has_timestamp = true;
        extended.timestamp_index = 0;
        extended
    }

    /// Make the label list exactly as long as the format.
    ///
    /// Missing labels become [`PLACEHOLDER_LABEL`] and surplus labels are
    /// dropped, matching the values [`crate::format::decode_record`] produces.
    /// Returns whether anything changed.
    pub fn align_labels_to_format(&mut self) -> bool {
        let fields = self.field_count();
        if self.labels.len() == fields {
            return false;
        }
        self.labels.resize_with(fields, || PLACEHOLDER_LABEL.to_string());
        true
    }

    /// Label of the field at `index`, or [`PLACEHOLDER_LABEL`] past the end of the labels.
    pub fn label_at(&self, index: usize) -> &str {
        self.labels.get(index).map(String::as_str).unwrap_or(PLACEHOLDER_LABEL)
    }

    /// Number of fields declared by the format string.
    pub fn field_count(&self) -> usize {
        self.format.len()
    }
}

/// A known timestamp field name and its scale to seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct TimestampCandidate {
    pub name: String,
    pub divisor: f64,
}

impl TimestampCandidate {
    pub fn new(name: impl Into<String>, divisor: f64) -> Self {
        Self { name: name.into(), divisor }
    }

    /// Candidates tried in priority order when no configuration overrides them.
    pub fn defaults() -> Vec<Self> {
        vec![Self::new("TimeUS", 1_000_000.0), Self::new("TimeMS", 1_000.0)]
    }
}
