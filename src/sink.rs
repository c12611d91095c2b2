//! Collaborators a session writes to
//!
//! A [`DataSink`] is the tabular store receiving decoded types and rows under
//! a single transaction. A [`ProgressObserver`] receives per-chunk progress and
//! fatal error messages. Both are traits so that sessions can feed a database,
//! a channel or an in-memory table alike.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::types::{NameValuePair, TimestampCandidate};

/// Failure reported by a data sink; the message is the sink's last error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SinkError {
    pub message: String,
}

impl SinkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Tabular store receiving decoded records.
///
/// Calls arrive in this order: `begin_transaction`, any interleaving of
/// `register_type` and `add_row`, then `end_transaction` exactly once, then
/// `mark_all_rows_timed` if the session finished.
pub trait DataSink {
    /// Whether the sink can accept a session at all.
    fn is_available(&self) -> bool {
        true
    }

    fn begin_transaction(&mut self) -> Result<(), SinkError>;

    /// Declare a record type. `format` and `labels` already include the
    /// synthetic timestamp field where one was injected.
    fn register_type(
        &mut self,
        name: &str,
        id: u8,
        length: usize,
        format: &str,
        labels: &[String],
    ) -> Result<(), SinkError>;

    /// Store one decoded record of a registered type.
    fn add_row(
        &mut self,
        type_name: &str,
        values: &[NameValuePair],
        timestamp_field: &str,
    ) -> Result<(), SinkError>;

    fn end_transaction(&mut self) -> Result<(), SinkError>;

    /// Declare that every stored row carries `timestamp_name`, scaled by `divisor` to seconds.
    fn mark_all_rows_timed(&mut self, has_time: bool, timestamp_name: &str, divisor: f64);
}

impl<T: DataSink + ?Sized> DataSink for &mut T {
    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn begin_transaction(&mut self) -> Result<(), SinkError> {
        (**self).begin_transaction()
    }

    fn register_type(
        &mut self,
        name: &str,
        id: u8,
        length: usize,
        format: &str,
        labels: &[String],
    ) -> Result<(), SinkError> {
        (**self).register_type(name, id, length, format, labels)
    }

    fn add_row(
        &mut self,
        type_name: &str,
        values: &[NameValuePair],
        timestamp_field: &str,
    ) -> Result<(), SinkError> {
        (**self).add_row(type_name, values, timestamp_field)
    }

    fn end_transaction(&mut self) -> Result<(), SinkError> {
        (**self).end_transaction()
    }

    fn mark_all_rows_timed(&mut self, has_time: bool, timestamp_name: &str, divisor: f64) {
        (**self).mark_all_rows_timed(has_time, timestamp_name, divisor)
    }
}

/// Receiver of progress and fatal error notifications.
pub trait ProgressObserver {
    /// Called once per chunk, before it is processed.
    fn on_progress(&mut self, bytes_read: u64, total_bytes: u64);

    /// Called with the sink's error text when a session aborts.
    fn on_error(&mut self, message: &str);
}

impl<T: ProgressObserver + ?Sized> ProgressObserver for &mut T {
    fn on_progress(&mut self, bytes_read: u64, total_bytes: u64) {
        (**self).on_progress(bytes_read, total_bytes)
    }

    fn on_error(&mut self, message: &str) {
        (**self).on_error(message)
    }
}

/// Observer that only emits tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn on_progress(&mut self, bytes_read: u64, total_bytes: u64) {
        debug!(bytes_read, total_bytes, "Import progress");
    }

    fn on_error(&mut self, message: &str) {
        error!(reason = %message, "Log import failed");
    }
}

/// A record type as declared to a sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct RegisteredType {
    pub name: String,
    pub id: u8,
    pub length: usize,
    pub format: String,
    pub labels: Vec<String>,
}

/// A row as stored by a sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct StoredRow {
    pub type_name: String,
    pub values: Vec<NameValuePair>,
    pub timestamp_field: String,
}

impl StoredRow {
    /// Value of the field labelled `name`.
    pub fn get(&self, name: &str) -> Option<&crate::types::Value> {
        self.values.iter().find(|pair| pair.name == name).map(|pair| &pair.value)
    }
}

/// In-memory table store.
///
/// Behaves like a small database: writes outside a transaction fail, and rows
/// must belong to a registered type with a matching column count.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    types: Vec<RegisteredType>,
    rows: Vec<StoredRow>,
    in_transaction: bool,
    committed: bool,
    time_reference: Option<TimestampCandidate>,
    last_error: Option<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn types(&self) -> &[RegisteredType] {
        &self.types
    }

    pub fn rows(&self) -> &[StoredRow] {
        &self.rows
    }

    /// Rows of one type, in insertion order.
    pub fn rows_of<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a StoredRow> + 'a {
        self.rows.iter().filter(move |row| row.type_name == type_name)
    }

    /// Whether a transaction was ended successfully.
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Time column and divisor declared by `mark_all_rows_timed`.
    pub fn time_reference(&self) -> Option<&TimestampCandidate> {
        self.time_reference.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn fail(&mut self, message: String) -> SinkError {
        self.last_error = Some(message.clone());
        SinkError::new(message)
    }

    fn require_transaction(&mut self, operation: &str) -> Result<(), SinkError> {
        if self.in_transaction {
            Ok(())
        } else {
            Err(self.fail(format!("{operation} outside of a transaction")))
        }
    }
}

impl DataSink for MemorySink {
    fn begin_transaction(&mut self) -> Result<(), SinkError> {
        if self.in_transaction {
            return Err(self.fail("transaction already open".to_string()));
        }
        self.in_transaction = true;
        self.committed = false;
        Ok(())
    }

    fn register_type(
        &mut self,
        name: &str,
        id: u8,
        length: usize,
        format: &str,
        labels: &[String],
    ) -> Result<(), SinkError> {
        self.require_transaction("register_type")?;
        if self.types.iter().any(|t| t.name == name) {
            return Err(self.fail(format!("table {name} already exists")));
        }
        self.types.push(RegisteredType {
            name: name.to_string(),
            id,
            length,
            format: format.to_string(),
            labels: labels.to_vec(),
        });
        Ok(())
    }

    fn add_row(
        &mut self,
        type_name: &str,
        values: &[NameValuePair],
        timestamp_field: &str,
    ) -> Result<(), SinkError> {
        self.require_transaction("add_row")?;
        let Some(columns) = self.types.iter().find(|t| t.name == type_name).map(|t| t.labels.len())
        else {
            return Err(self.fail(format!("no such table: {type_name}")));
        };
        if values.len() != columns {
            return Err(self.fail(format!(
                "table {type_name} has {columns} columns but {} values were supplied",
                values.len()
            )));
        }
        self.rows.push(StoredRow {
            type_name: type_name.to_string(),
            values: values.to_vec(),
            timestamp_field: timestamp_field.to_string(),
        });
        Ok(())
    }

    fn end_transaction(&mut self) -> Result<(), SinkError> {
        self.require_transaction("end_transaction")?;
        self.in_transaction = false;
        self.committed = true;
        Ok(())
    }

    fn mark_all_rows_timed(&mut self, has_time: bool, timestamp_name: &str, divisor: f64) {
        self.time_reference = has_time.then(|| TimestampCandidate::new(timestamp_name, divisor));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn memory_sink_requires_transaction() {
        let mut sink = MemorySink::new();
        let err = sink.register_type("IMU", 0x81, 11, "Q", &labels(&["TimeUS"])).unwrap_err();
        assert!(err.message.contains("outside of a transaction"));
        assert_eq!(sink.last_error(), Some(err.message.as_str()));
    }

    #[test]
    fn memory_sink_stores_rows_of_registered_types() {
        let mut sink = MemorySink::new();
        sink.begin_transaction().unwrap();
        sink.register_type("BARO", 0x81, 15, "Qf", &labels(&["TimeUS", "Alt"])).unwrap();

        let row = vec![
            NameValuePair::new("TimeUS", Value::UInt64(10)),
            NameValuePair::new("Alt", Value::Float32(3.5)),
        ];
        sink.add_row("BARO", &row, "TimeUS").unwrap();
        assert!(sink.add_row("GPS", &row, "TimeUS").is_err());
        assert!(sink.add_row("BARO", &row[..1], "TimeUS").is_err());

        sink.end_transaction().unwrap();
        sink.mark_all_rows_timed(true, "TimeUS", 1e6);

        assert!(sink.is_committed());
        assert_eq!(sink.rows_of("BARO").count(), 1);
        assert_eq!(sink.rows()[0].get("Alt"), Some(&Value::Float32(3.5)));
        assert_eq!(sink.time_reference().map(|t| t.divisor), Some(1e6));
    }

    #[test]
    fn duplicate_table_is_rejected() {
        let mut sink = MemorySink::new();
        sink.begin_transaction().unwrap();
        sink.register_type("BARO", 0x81, 15, "Qf", &labels(&["TimeUS", "Alt"])).unwrap();
        assert!(sink.register_type("BARO", 0x82, 15, "Qf", &labels(&["TimeUS", "Alt"])).is_err());
    }
}
