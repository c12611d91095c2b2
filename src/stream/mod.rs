//! Async streaming surface
//!
//! Decoding is synchronous and CPU bound, so [`LogStream`] runs a [`Session`]
//! on tokio's blocking pool and forwards what it stores as [`LogEvent`]s over a
//! bounded channel. The channel applies backpressure: a slow consumer pauses the
//! decoder instead of buffering the whole log.
//!
//! ```rust,no_run
//! use dataflash::{LogEvent, LogStream, ParserConfig};
//! use futures::StreamExt;
//!
//! # async fn example() -> dataflash::Result<()> {
//! let mut stream = LogStream::open("flight.bin", ParserConfig::default())?;
//! while let Some(event) = stream.next().await {
//!     if let LogEvent::Row(row) = event {
//!         println!("{}: {} fields", row.type_name, row.values.len());
//!     }
//! }
//! let status = stream.finish().await?;
//! println!("{} valid records", status.valid_reads);
//! # Ok(())
//! # }
//! ```

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use pin_project_lite::pin_project;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

use crate::config::ParserConfig;
use crate::session::{Session, StopHandle};
use crate::sink::{DataSink, RegisteredType, SinkError, StoredRow, TracingObserver};
use crate::types::{LoadingStatus, NameValuePair, TimestampCandidate};
use crate::{DataflashError, Result};

/// Events buffered between the decoder and the consumer.
const EVENT_BUFFER: usize = 256;

/// Something a session stored.
#[derive(Debug, Clone, PartialEq)]
pub enum LogEvent {
    /// A record type was declared
    TypeRegistered(RegisteredType),
    /// A record was decoded
    Row(StoredRow),
    /// All rows carry this time field; sent once when the log ends normally
    Timed(TimestampCandidate),
}

/// Data sink that forwards everything to a channel.
///
/// Sending blocks while the channel is full, so it must only be used from a
/// blocking thread. A dropped receiver fails the next write.
#[derive(Debug)]
pub struct ChannelSink {
    events: mpsc::Sender<LogEvent>,
}

impl ChannelSink {
    pub fn new(events: mpsc::Sender<LogEvent>) -> Self {
        Self { events }
    }

    fn send(&self, event: LogEvent) -> Result<(), SinkError> {
        self.events
            .blocking_send(event)
            .map_err(|_| SinkError::new("Log stream receiver was dropped"))
    }
}

impl DataSink for ChannelSink {
    fn is_available(&self) -> bool {
        !self.events.is_closed()
    }

    fn begin_transaction(&mut self) -> Result<(), SinkError> {
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
        self.send(LogEvent::TypeRegistered(RegisteredType {
            name: name.to_string(),
            id,
            length,
            format: format.to_string(),
            labels: labels.to_vec(),
        }))
    }

    fn add_row(
        &mut self,
        type_name: &str,
        values: &[NameValuePair],
        timestamp_field: &str,
    ) -> Result<(), SinkError> {
        self.send(LogEvent::Row(StoredRow {
            type_name: type_name.to_string(),
            values: values.to_vec(),
            timestamp_field: timestamp_field.to_string(),
        }))
    }

    fn end_transaction(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    fn mark_all_rows_timed(&mut self, has_time: bool, timestamp_name: &str, divisor: f64) {
        if !has_time {
            return;
        }
        if self.send(LogEvent::Timed(TimestampCandidate::new(timestamp_name, divisor))).is_err() {
            debug!("Log stream closed before the time reference was sent");
        }
    }
}

pin_project! {
    /// Stream of [`LogEvent`]s decoded on a blocking thread.
    ///
    /// Dropping the stream asks the session to stop.
    pub struct LogStream {
        #[pin]
        events: ReceiverStream<LogEvent>,
        task: Option<JoinHandle<LoadingStatus>>,
        stop: StopHandle,
    }

    impl PinnedDrop for LogStream {
        fn drop(this: Pin<&mut Self>) {
            this.stop.request_stop();
        }
    }
}

impl LogStream {
    /// Start decoding a log file. Must be called within a tokio runtime.
    pub fn open(path: impl AsRef<Path>, config: ParserConfig) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(|e| DataflashError::file_error(path.to_path_buf(), e))?;
        let total = file.metadata().map(|meta| meta.len()).unwrap_or(0);
        Self::spawn(file, total, config, Some(path.to_path_buf()))
    }

    /// Start decoding any reader. Must be called within a tokio runtime.
    pub fn from_reader<R>(reader: R, total_len: u64, config: ParserConfig) -> Result<Self>
    where
        R: Read + Send + 'static,
    {
        Self::spawn(reader, total_len, config, None)
    }

    fn spawn<R>(
        reader: R,
        total_len: u64,
        config: ParserConfig,
        source_path: Option<PathBuf>,
    ) -> Result<Self>
    where
        R: Read + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let mut session = Session::with_config(ChannelSink::new(tx), TracingObserver, config)?;
        if let Some(path) = source_path {
            session = session.with_source_path(path);
        }
        let stop = session.stop_handle();

        let task = tokio::task::spawn_blocking(move || session.parse(reader, total_len));

        Ok(Self { events: ReceiverStream::new(rx), task: Some(task), stop })
    }

    /// Handle for stopping the session without dropping the stream.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Wait for the session and return its status.
    ///
    /// Called after the stream ended, this reports the complete outcome. Called
    /// earlier, it stops the session and reports the partial result.
    pub async fn finish(mut self) -> Result<LoadingStatus> {
        self.stop.request_stop();
        self.events.close();

        let task = self.task.take().ok_or_else(|| DataflashError::Stream {
            details: "Decoding task already collected".to_string(),
        })?;
        task.await.map_err(|e| DataflashError::Stream { details: e.to_string() })
    }
}

impl Stream for LogStream {
    type Item = LogEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().events.poll_next(cx)
    }
}
