//! Session loading status

use serde::{Deserialize, Serialize};

/// Vehicle class detected from logged parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum VehicleType {
    #[default]
    Generic,
    Quadrotor,
    FixedWing,
    GroundRover,
}

/// Class of a recoverable corruption event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum CorruptionKind {
    Schema,
    Data,
    Time,
}

/// A counted anomaly that did not stop the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct CorruptEvent {
    pub kind: CorruptionKind,
    /// Message index at the time the event was raised
    pub index: u64,
    pub message: String,
}

/// Worst class of corruption seen in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum ParseState {
    Ok,
    CorruptTime,
    CorruptData,
    CorruptSchema,
}

/// How a session ended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum SessionOutcome {
    /// Still running, or never started
    #[default]
    Pending,
    /// Input exhausted and the sink transaction committed
    Finished,
    /// Stopped on request; the status holds a partial result
    Stopped,
    /// Ended by a sink or I/O failure
    Aborted(String),
}

/// Aggregate outcome of one parse.
///
/// Counters only ever grow during a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct LoadingStatus {
    pub corrupt_schema_reads: usize,
    pub corrupt_data_reads: usize,
    pub corrupt_time_reads: usize,
    pub valid_reads: usize,
    /// Bytes skipped while searching for record headers
    pub non_record_bytes: usize,
    pub vehicle_type: VehicleType,
    /// Running count of sink writes (type registrations and rows)
    pub message_index: u64,
    pub events: Vec<CorruptEvent>,
    pub outcome: SessionOutcome,
}

impl LoadingStatus {
    pub fn corrupt_schema_read(&mut self, message: impl Into<String>) {
        self.corrupt_schema_reads += 1;
        self.push_event(CorruptionKind::Schema, message.into());
    }

    pub fn corrupt_data_read(&mut self, message: impl Into<String>) {
        self.corrupt_data_reads += 1;
        self.push_event(CorruptionKind::Data, message.into());
    }

    pub fn corrupt_time_read(&mut self, message: impl Into<String>) {
        self.corrupt_time_reads += 1;
        self.push_event(CorruptionKind::Time, message.into());
    }

    /// Count a row accepted by the sink.
    pub fn valid_data_read(&mut self) {
        self.valid_reads += 1;
        self.message_index += 1;
    }

    /// Count a type registration accepted by the sink.
    pub fn type_registered(&mut self) {
        self.message_index += 1;
    }

    /// Summarise the worst class of corruption recorded so far.
    pub fn state(&self) -> ParseState {
        if self.corrupt_schema_reads > 0 {
            ParseState::CorruptSchema
        } else if self.corrupt_data_reads > 0 {
            ParseState::CorruptData
        } else if self.corrupt_time_reads > 0 {
            ParseState::CorruptTime
        } else {
            ParseState::Ok
        }
    }

    /// Events of one kind, in the order they were raised.
    pub fn events_of(&self, kind: CorruptionKind) -> impl Iterator<Item = &CorruptEvent> {
        self.events.iter().filter(move |event| event.kind == kind)
    }

    fn push_event(&mut self, kind: CorruptionKind, message: String) {
        self.events.push(CorruptEvent { kind, index: self.message_index, message });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_reports_worst_corruption() {
        let mut status = LoadingStatus::default();
        assert_eq!(status.state(), ParseState::Ok);

        status.corrupt_time_read("time");
        assert_eq!(status.state(), ParseState::CorruptTime);

        status.corrupt_data_read("data");
        assert_eq!(status.state(), ParseState::CorruptData);

        status.corrupt_schema_read("schema");
        assert_eq!(status.state(), ParseState::CorruptSchema);
        assert_eq!(status.events.len(), 3);
    }

    #[test]
    fn events_carry_current_message_index() {
        let mut status = LoadingStatus::default();
        status.type_registered();
        status.valid_data_read();
        status.corrupt_data_read("bad float");

        let event = status.events_of(CorruptionKind::Data).next().expect("data event");
        assert_eq!(event.index, 2);
        assert_eq!(status.valid_reads, 1);
        assert_eq!(status.events_of(CorruptionKind::Time).count(), 0);
    }
}
