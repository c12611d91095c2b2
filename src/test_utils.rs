//! Test utilities for synthesising logs and observing sessions
//!
//! Real flight logs are large and vehicle specific, so tests and benchmarks
//! build their input byte by byte with [`LogBuilder`].

#![cfg(any(test, feature = "benchmark"))]

use crate::format::header::{SCHEMA_TYPE, START_BYTE_1, START_BYTE_2};
use crate::format::schema::SCHEMA_PAYLOAD_LEN;
use crate::sink::{DataSink, MemorySink, ProgressObserver, SinkError};
use crate::types::{FieldType, NameValuePair};

const NAME_SIZE: usize = 4;
const FORMAT_SIZE: usize = 16;
const LABELS_SIZE: usize = 64;

/// Install a fmt subscriber for test output; repeated calls are harmless.
#[cfg(test)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// On-wire length of a record with `format`, header included.
///
/// Unknown format codes count as zero bytes.
pub fn record_length(format: &str) -> usize {
    3 + format.bytes().filter_map(FieldType::from_code).map(|field| field.size()).sum::<usize>()
}

/// Schema record payload (everything after the header).
pub fn schema_payload(id: u8, length: u8, name: &str, format: &str, labels: &str) -> Vec<u8> {
    let mut payload = Vec::with_capacity(SCHEMA_PAYLOAD_LEN);
    payload.push(id);
    payload.push(length);
    push_fixed(&mut payload, name.as_bytes(), NAME_SIZE);
    push_fixed(&mut payload, format.as_bytes(), FORMAT_SIZE);
    push_fixed(&mut payload, labels.as_bytes(), LABELS_SIZE);
    payload
}

fn push_fixed(out: &mut Vec<u8>, bytes: &[u8], width: usize) {
    let used = bytes.len().min(width);
    out.extend_from_slice(&bytes[..used]);
    out.resize(out.len() + (width - used), 0);
}

/// Builder for a binary log.
#[derive(Debug, Default, Clone)]
pub struct LogBuilder {
    bytes: Vec<u8>,
}

impl LogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a schema record whose length is derived from `format`.
    pub fn schema(self, id: u8, name: &str, format: &str, labels: &str) -> Self {
        let length = u8::try_from(record_length(format)).unwrap_or(u8::MAX);
        self.schema_with_length(id, length, name, format, labels)
    }

    /// Append a schema record with an explicit declared length.
    pub fn schema_with_length(
        self,
        id: u8,
        length: u8,
        name: &str,
        format: &str,
        labels: &str,
    ) -> Self {
        let payload = schema_payload(id, length, name, format, labels);
        self.record(SCHEMA_TYPE, &payload)
    }

    /// Append a record header followed by `payload`.
    pub fn record(mut self, type_code: u8, payload: &[u8]) -> Self {
        self.bytes.extend_from_slice(&[START_BYTE_1, START_BYTE_2, type_code]);
        self.bytes.extend_from_slice(payload);
        self
    }

    /// Append bytes without a header.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// Builder for a little-endian record payload.
#[derive(Debug, Default, Clone)]
pub struct Payload(Vec<u8>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(mut self, value: u8) -> Self {
        self.0.push(value);
        self
    }

    pub fn i16(mut self, value: i16) -> Self {
        self.0.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn u16(mut self, value: u16) -> Self {
        self.0.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn i32(mut self, value: i32) -> Self {
        self.0.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn u32(mut self, value: u32) -> Self {
        self.0.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn u64(mut self, value: u64) -> Self {
        self.0.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn f32(mut self, value: f32) -> Self {
        self.0.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Text padded with zero bytes to `width`.
    pub fn text(mut self, value: &str, width: usize) -> Self {
        push_fixed(&mut self.0, value.as_bytes(), width);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.0
    }
}

/// Observer that keeps every notification.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    pub progress: Vec<(u64, u64)>,
    pub errors: Vec<String>,
}

impl ProgressObserver for RecordingObserver {
    fn on_progress(&mut self, bytes_read: u64, total_bytes: u64) {
        self.progress.push((bytes_read, total_bytes));
    }

    fn on_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}

/// Sink operation a [`FailingSink`] can be told to reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkOperation {
    Begin,
    Register,
    AddRow,
    End,
}

/// [`MemorySink`] that rejects one kind of call after a number of successes.
#[derive(Debug, Clone)]
pub struct FailingSink {
    pub inner: MemorySink,
    pub fail_on: SinkOperation,
    pub successes_left: usize,
    pub available: bool,
    pub end_calls: usize,
    pub mark_calls: usize,
}

impl FailingSink {
    pub fn new(fail_on: SinkOperation, successes: usize) -> Self {
        Self {
            inner: MemorySink::new(),
            fail_on,
            successes_left: successes,
            available: true,
            end_calls: 0,
            mark_calls: 0,
        }
    }

    /// Sink that reports itself unavailable.
    pub fn unavailable() -> Self {
        Self { available: false, ..Self::new(SinkOperation::Begin, usize::MAX) }
    }

    fn gate(&mut self, operation: SinkOperation) -> Result<(), SinkError> {
        if operation != self.fail_on {
            return Ok(());
        }
        if self.successes_left == 0 {
            return Err(SinkError::new(format!("injected {operation:?} failure")));
        }
        self.successes_left -= 1;
        Ok(())
    }
}

impl DataSink for FailingSink {
    fn is_available(&self) -> bool {
        self.available
    }

    fn begin_transaction(&mut self) -> Result<(), SinkError> {
        self.gate(SinkOperation::Begin)?;
        self.inner.begin_transaction()
    }

    fn register_type(
        &mut self,
        name: &str,
        id: u8,
        length: usize,
        format: &str,
        labels: &[String],
    ) -> Result<(), SinkError> {
        self.gate(SinkOperation::Register)?;
        self.inner.register_type(name, id, length, format, labels)
    }

    fn add_row(
        &mut self,
        type_name: &str,
        values: &[NameValuePair],
        timestamp_field: &str,
    ) -> Result<(), SinkError> {
        self.gate(SinkOperation::AddRow)?;
        self.inner.add_row(type_name, values, timestamp_field)
    }

    fn end_transaction(&mut self) -> Result<(), SinkError> {
        self.end_calls += 1;
        self.gate(SinkOperation::End)?;
        self.inner.end_transaction()
    }

    fn mark_all_rows_timed(&mut self, has_time: bool, timestamp_name: &str, divisor: f64) {
        self.mark_calls += 1;
        self.inner.mark_all_rows_timed(has_time, timestamp_name, divisor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_record_has_fixed_size() {
        let log = LogBuilder::new().schema(0x81, "BARO", "Qf", "TimeUS,Alt").build();
        assert_eq!(log.len(), 3 + SCHEMA_PAYLOAD_LEN);
        assert_eq!(&log[..3], &[START_BYTE_1, START_BYTE_2, SCHEMA_TYPE]);
        assert_eq!(log[3], 0x81);
        assert_eq!(usize::from(log[4]), record_length("Qf"));
    }

    #[test]
    fn long_text_is_truncated_to_region() {
        let payload = schema_payload(0x81, 3, "TOOLONG", "", "");
        assert_eq!(&payload[2..6], b"TOOL");
    }
}
