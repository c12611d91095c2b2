//! Decoding session
//!
//! A [`Session`] drives one log from its first byte to a [`LoadingStatus`]. It
//! reads the input in chunks, scans each chunk for record headers and hands
//! schema records to the [`TypeRegistry`] and data records to the decoder. A
//! record that does not fit in the buffered bytes is left untouched until the
//! next chunk arrives.
//!
//! All sink writes happen inside a single transaction. It is ended exactly
//! once on every path out of [`Session::parse`], whether the input ran out,
//! a stop was requested or the sink failed.
//!
//! ```rust
//! use dataflash::{MemorySink, Session, SessionOutcome, TracingObserver};
//!
//! let mut sink = MemorySink::new();
//! let status = Session::new(&mut sink, TracingObserver).parse(std::io::empty(), 0);
//! assert_eq!(status.outcome, SessionOutcome::Finished);
//! assert!(sink.is_committed());
//! ```

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::config::ParserConfig;
use crate::format::header::{PARAMETER_TYPE_NAME, SCHEMA_TYPE};
use crate::format::{
    ByteCursor, HEADER_LEN, HeaderScan, RecordDecode, SCHEMA_PAYLOAD_LEN, decode_record,
    parse_schema_record, scan_header,
};
use crate::registry::TypeRegistry;
use crate::sink::{DataSink, ProgressObserver};
use crate::timestamp::TimestampGuard;
use crate::types::{
    LoadingStatus, NameValuePair, SessionOutcome, TypeDescriptor, Value, VehicleType,
};
use crate::vehicle::classify_parameter;
use crate::{DataflashError, Result};


/// Cloneable handle that asks a running session to stop.
///
/// The session polls it between chunks and between records, so the record
/// being decoded when the stop arrives is still stored in full.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    token: CancellationToken,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle driven by an existing token, e.g. one shared with other tasks.
    pub fn from_token(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Ask the session to stop. Calling this more than once has no further effect.
    pub fn request_stop(&self) {
        self.token.cancel();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Single-use decoder for one log.
pub struct Session<S, P> {
    config: ParserConfig,
    sink: S,
    observer: P,
    cursor: ByteCursor,
    registry: TypeRegistry,
    guard: TimestampGuard,
    status: LoadingStatus,
    skipped_bytes: usize,
    stop: StopHandle,
    source: Option<PathBuf>,
}

impl<S, P> Session<S, P>
where
    S: DataSink,
    P: ProgressObserver,
{
    /// Session with the default configuration.
    pub fn new(sink: S, observer: P) -> Self {
        Self::build(sink, observer, ParserConfig::default())
    }

    /// Session with a custom configuration, validated first.
    pub fn with_config(sink: S, observer: P, config: ParserConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(sink, observer, config))
    }

    fn build(sink: S, observer: P, config: ParserConfig) -> Self {
        let registry = TypeRegistry::new(config.rules(), config.timestamp_candidates.clone());
        let guard = TimestampGuard::new(config.time_warning_limit);
        Self {
            config,
            sink,
            observer,
            cursor: ByteCursor::new(),
            registry,
            guard,
            status: LoadingStatus::default(),
            skipped_bytes: 0,
            stop: StopHandle::default(),
            source: None,
        }
    }

    /// Handle for stopping [`Session::parse`] from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Replace the session's stop handle with one created elsewhere.
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    /// Name the file the reader passed to [`Session::parse`] comes from.
    ///
    /// Read failures are then reported against this path.
    pub fn with_source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    /// Decode a log file. Fails only when the file cannot be opened.
    pub fn parse_file(self, path: impl AsRef<Path>) -> Result<LoadingStatus> {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(|e| DataflashError::file_error(path.to_path_buf(), e))?;
        let total = file.metadata().map(|meta| meta.len()).unwrap_or(0);
        info!(path = %path.display(), bytes = total, "Opened log file");
        Ok(self.with_source_path(path).parse(file, total))
    }

    /// Decode everything `reader` yields. `total_len` is only used for progress.
    ///
    /// Always returns a status; how the session ended is in its `outcome`.
    pub fn parse<R: Read>(mut self, mut reader: R, total_len: u64) -> LoadingStatus {
        debug!(bytes = total_len, "Starting log import");

        if !self.sink.is_available() {
            let message = "No data sink available - parsing stopped".to_string();
            error!(reason = %message, "Log import aborted");
            self.observer.on_error(&message);
            return self.into_status(SessionOutcome::Aborted(message));
        }

        if let Err(e) = self.sink.begin_transaction() {
            error!(error = %e, "Could not begin sink transaction");
            self.observer.on_error(&e.message);
            return self.into_status(SessionOutcome::Aborted(e.message));
        }

        let outcome = match self.read_chunks(&mut reader, total_len) {
            Ok(outcome) => outcome,
            Err(e) => {
                let message = fatal_message(&e, self.source.as_deref());
                error!(error = %e, "Log import aborted");
                // the transaction is ended even though the session failed
                if let Err(end) = self.sink.end_transaction() {
                    warn!(error = %end, "Ending transaction after failure also failed");
                }
                self.observer.on_error(&message);
                return self.into_status(SessionOutcome::Aborted(message));
            }
        };

        if let Err(e) = self.sink.end_transaction() {
            error!(error = %e, "Could not end sink transaction");
            self.observer.on_error(&e.message);
            return self.into_status(SessionOutcome::Aborted(e.message));
        }

        match self.registry.active_timestamp() {
            Some(timestamp) => {
                self.sink.mark_all_rows_timed(true, &timestamp.name, timestamp.divisor)
            }
            None => warn!("No timestamp field found in log, rows are not marked as timed"),
        }

        self.into_status(outcome)
    }

    fn read_chunks<R: Read>(&mut self, reader: &mut R, total_len: u64) -> Result<SessionOutcome> {
        let mut chunk = vec![0u8; self.config.chunk_size];
        let mut bytes_read: u64 = 0;

        loop {
            if self.stop.is_stop_requested() {
                info!(bytes_read, "Log import stopped");
                return Ok(SessionOutcome::Stopped);
            }

            let count = match reader.read(&mut chunk) {
                Ok(0) => return Ok(SessionOutcome::Finished),
                Ok(count) => count,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.read_error(e)),
            };
            bytes_read += count as u64;
            self.observer.on_progress(bytes_read, total_len);

            self.cursor.discard_consumed(HEADER_LEN);
            self.cursor.append(&chunk[..count]);
            trace!(count, unconsumed = self.cursor.remaining(), "Buffered chunk");

            self.scan_records()?;
        }
    }

    fn read_error(&self, source: std::io::Error) -> DataflashError {
        match &self.source {
            Some(path) => DataflashError::file_error(path.clone(), source),
            None => source.into(),
        }
    }

    /// Decode records until the buffer runs short or a stop is requested.
    fn scan_records(&mut self) -> Result<()> {
        while self.cursor.remaining() >= HEADER_LEN && !self.stop.is_stop_requested() {
            let type_code = match scan_header(&mut self.cursor) {
                HeaderScan::Record(type_code) => type_code,
                HeaderScan::NoHeader => {
                    self.skipped_bytes += 1;
                    continue;
                }
                HeaderScan::Incomplete => break,
            };

            let complete = if type_code == SCHEMA_TYPE {
                self.dispatch_schema()?
            } else {
                self.dispatch_data(type_code)?
            };

            if !complete {
                // keep the header so the record is read again with more data
                self.cursor.rewind(HEADER_LEN);
                break;
            }
        }
        Ok(())
    }

    /// Returns false when the schema record is not fully buffered yet.
    fn dispatch_schema(&mut self) -> Result<bool> {
        let Some(descriptor) = parse_schema_record(self.cursor.unconsumed()) else {
            return Ok(false);
        };
        self.cursor.consume(SCHEMA_PAYLOAD_LEN);
        trace!(name = %descriptor.name, "Dispatching schema record");

        self.registry
            .submit(descriptor, &mut self.sink, &mut self.status)
            .map_err(|e| DataflashError::sink_failed("register_type", e.message))?;
        Ok(true)
    }

    /// Returns false when the data record is not fully buffered yet.
    fn dispatch_data(&mut self, type_code: u8) -> Result<bool> {
        let Some(descriptor) = self.registry.get(type_code).cloned() else {
            warn!(type_code, "Record without a format descriptor");
            self.status.corrupt_data_read(format!(
                "Read data without having a valid format descriptor - Message type is {type_code}"
            ));
            return Ok(true);
        };

        match decode_record(&descriptor, self.cursor.unconsumed()) {
            RecordDecode::Incomplete => Ok(false),
            RecordDecode::Corrupt { error, consumed } => {
                self.cursor.consume(consumed);
                warn!(error = %error, "Corrupt data record");
                self.status.corrupt_data_read(error.to_string());
                Ok(true)
            }
            RecordDecode::Decoded { values, consumed } => {
                self.cursor.consume(consumed);
                trace!(name = %descriptor.name, fields = values.len(), "Decoded record");
                if values.is_empty() {
                    warn!(name = %descriptor.name, "No values within data record");
                    self.status.corrupt_data_read("No values within data message");
                } else {
                    self.store_row(&descriptor, values)?;
                }
                Ok(true)
            }
        }
    }

    fn store_row(&mut self, descriptor: &TypeDescriptor, mut values: Vec<NameValuePair>) -> Result<()> {
        let time_name =
            self.registry.active_timestamp().map(|t| t.name.as_str()).unwrap_or_default();

        if descriptor.has_timestamp {
            self.guard.extract_and_clamp(
                &mut values,
                descriptor.timestamp_index,
                &descriptor.name,
                &mut self.status,
            );
        } else {
            values.insert(0, NameValuePair::new(time_name, Value::UInt64(self.guard.last_valid())));
        }

        self.sink
            .add_row(&descriptor.name, &values, time_name)
            .map_err(|e| DataflashError::sink_failed("add_row", e.message))?;
        self.status.valid_data_read();

        if self.status.vehicle_type == VehicleType::Generic && descriptor.name == PARAMETER_TYPE_NAME
        {
            if let Some(vehicle) = classify_parameter(&values) {
                self.status.vehicle_type = vehicle;
            }
        }
        Ok(())
    }

    fn into_status(mut self, outcome: SessionOutcome) -> LoadingStatus {
        if self.skipped_bytes > 0 {
            debug!(
                skipped = self.skipped_bytes,
                "Non record bytes filtered out of the log, it may be corrupt"
            );
        }
        self.status.non_record_bytes = self.skipped_bytes;
        self.status.outcome = outcome;
        info!(
            outcome = ?self.status.outcome,
            valid = self.status.valid_reads,
            corrupt_schema = self.status.corrupt_schema_reads,
            corrupt_data = self.status.corrupt_data_reads,
            corrupt_time = self.status.corrupt_time_reads,
            "Log import ended"
        );
        self.status
    }
}

/// Text forwarded to the observer for a fatal error.
fn fatal_message(error: &DataflashError, source_path: Option<&Path>) -> String {
    match (error, source_path) {
        (DataflashError::Sink { message, .. }, _) => message.clone(),
        (DataflashError::File { source, .. }, Some(path)) => {
            format!("Reading {} failed: {source}", path.display())
        }
        (DataflashError::File { source, .. }, None) => format!("Reading log failed: {source}"),
        (other, _) => other.to_string(),
    }
}
