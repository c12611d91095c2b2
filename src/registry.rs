//! Registry of record type descriptors discovered in a log
//!
//! Schema records arrive in the stream before the records they describe, and
//! the time field convention of a log is only known once some schema record
//! names it. Until then descriptors are held back in arrival order; the schema
//! that fixes the active timestamp releases them all, followed by itself.
//!
//! Every committed descriptor is validated, registered once per type code
//! (first occurrence wins) and forwarded to the data sink. Descriptors lacking
//! the active timestamp are forwarded with a synthetic leading `Q` field so that
//! every stored type carries a time column.

use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, warn};

use crate::format::header::{GPS_TYPE_NAME, SCHEMA_TYPE};
use crate::sink::{DataSink, SinkError};
use crate::types::{LoadingStatus, TimestampCandidate, TypeDescriptor};

/// Per type code choice between strict and relaxed descriptor validation.
///
/// Relaxed types are known to appear with inconsistent format and label
/// lists in historical logs; they only need an id, a length and a name.
#[derive(Debug, Clone)]
pub struct ValidationRules {
    relaxed: HashSet<u8>,
}

impl ValidationRules {
    pub fn new(relaxed: impl IntoIterator<Item = u8>) -> Self {
        Self { relaxed: relaxed.into_iter().collect() }
    }

    pub fn is_relaxed(&self, id: u8) -> bool {
        self.relaxed.contains(&id)
    }

    /// Check a descriptor before it is registered.
    pub fn validate(&self, descriptor: &TypeDescriptor) -> bool {
        let Some(id) = descriptor.id else {
            return false;
        };
        if descriptor.declared_length == 0 || descriptor.name.is_empty() {
            return false;
        }

        if self.is_relaxed(id) {
            if descriptor.format.len() != descriptor.labels.len() {
                warn!(
                    name = %descriptor.name,
                    fields = descriptor.format.len(),
                    labels = descriptor.labels.len(),
                    "Corrupt descriptor, known issue in some logs, ignoring"
                );
            }
            return true;
        }

        !descriptor.format.is_empty() && descriptor.format.len() == descriptor.labels.len()
    }
}

/// Owned mapping from type code to descriptor, plus the timestamp binding state.
#[derive(Debug)]
pub struct TypeRegistry {
    rules: ValidationRules,
    candidates: Vec<TimestampCandidate>,
    active: Option<TimestampCandidate>,
    deferred: VecDeque<TypeDescriptor>,
    descriptors: HashMap<u8, TypeDescriptor>,
}

impl TypeRegistry {
    pub fn new(rules: ValidationRules, candidates: Vec<TimestampCandidate>) -> Self {
        Self {
            rules,
            candidates,
            active: None,
            deferred: VecDeque::new(),
            descriptors: HashMap::new(),
        }
    }

    /// Accept a freshly parsed schema descriptor.
    ///
    /// Corrupt or duplicate descriptors are recorded on `status` and dropped.
    /// Only a sink failure is returned as an error.
    pub fn submit<S>(
        &mut self,
        mut descriptor: TypeDescriptor,
        sink: &mut S,
        status: &mut LoadingStatus,
    ) -> Result<(), SinkError>
    where
        S: DataSink + ?Sized,
    {
        // GPS time is in its own units and must not be mistaken for the log clock
        if descriptor.name == GPS_TYPE_NAME {
            descriptor.rename_label("TimeMS", "GPSTimeMS");
        }

        let timestamp = if let Some(active) = self.active.clone() {
            active
        } else {
            let Some(candidate) = self.select_timestamp(&descriptor) else {
                debug!(name = %descriptor.name, "Deferring descriptor until a timestamp is known");
                self.deferred.push_back(descriptor);
                return Ok(());
            };
            debug!(
                timestamp = %candidate.name,
                divisor = candidate.divisor,
                source = %descriptor.name,
                "Active timestamp selected"
            );
            self.active = Some(candidate.clone());

            while let Some(pending) = self.deferred.pop_front() {
                self.commit(pending, &candidate, sink, status)?;
            }
            candidate
        };

        self.commit(descriptor, &timestamp, sink, status)
    }

    /// Descriptor registered for a type code.
    pub fn get(&self, id: u8) -> Option<&TypeDescriptor> {
        self.descriptors.get(&id)
    }

    /// The session's time field convention, once known.
    pub fn active_timestamp(&self) -> Option<&TimestampCandidate> {
        self.active.as_ref()
    }

    /// Number of descriptors waiting for a timestamp.
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    /// Number of registered descriptors.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    fn select_timestamp(&self, descriptor: &TypeDescriptor) -> Option<TimestampCandidate> {
        self.candidates
            .iter()
            .find(|candidate| descriptor.labels.iter().any(|label| *label == candidate.name))
            .cloned()
    }

    fn commit<S>(
        &mut self,
        mut descriptor: TypeDescriptor,
        timestamp: &TimestampCandidate,
        sink: &mut S,
        status: &mut LoadingStatus,
    ) -> Result<(), SinkError>
    where
        S: DataSink + ?Sized,
    {
        let id = match descriptor.id {
            Some(id) if self.rules.validate(&descriptor) => id,
            _ => {
                warn!(id = ?descriptor.id, name = %descriptor.name, "Invalid type descriptor found");
                status.corrupt_schema_read(format!(
                    "{} format data: Corrupt or missing. Message type is: {}",
                    descriptor.name,
                    descriptor.id.map(|id| format!("{id:#04x}")).unwrap_or_else(|| "none".into())
                ));
                return Ok(());
            }
        };

        if self.descriptors.contains_key(&id) {
            warn!(id, name = %descriptor.name, "Descriptor already registered, ignoring the new one");
            status.corrupt_schema_read(format!(
                "{} format data: Doubled entry found. Using the first one.",
                descriptor.name
            ));
            return Ok(());
        }

        // relaxed types may disagree with their labels; rows follow the format
        if descriptor.align_labels_to_format() {
            debug!(name = %descriptor.name, labels = ?descriptor.labels, "Aligned labels to format");
        }
        descriptor.finalize(timestamp);
        self.descriptors.insert(id, descriptor.clone());

        // the schema record's own layout is fixed and never stored
        if id == SCHEMA_TYPE {
            return Ok(());
        }

        let stored = if descriptor.has_timestamp {
            descriptor
        } else {
            descriptor.with_timestamp_field(timestamp)
        };

        debug!(
            name = %stored.name,
            id,
            format = %stored.format,
            length = stored.declared_length,
            "Registering type"
        );
        sink.register_type(
            &stored.name,
            id,
            stored.declared_length,
            &stored.format,
            &stored.labels,
        )?;
        status.type_registered();
        Ok(())
    }
}
