//! Streaming decoder for binary dataflash flight logs.
//!
//! Dataflash logs are written by autopilot firmware as a flat sequence of
//! records. The format is self-describing: schema (`FMT`) records in the stream
//! declare the layout of every other record type before it first appears. This
//! crate discovers those layouts on the fly and turns the log into typed, named
//! rows for a storage backend of your choice.
//!
//! # Features
//!
//! - **Chunked decoding**: bounded memory, any [`std::io::Read`] as input
//! - **Corruption tolerant**: garbage bytes, broken schemas, NaN payloads and
//!   clock jumps are counted in a [`LoadingStatus`] instead of ending the import
//! - **Pluggable storage**: implement [`DataSink`] for your database
//! - **Async surface**: [`LogStream`] yields decoded rows as a `futures::Stream`
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use dataflash::{Dataflash, MemorySink};
//!
//! fn main() -> dataflash::Result<()> {
//!     let mut sink = MemorySink::new();
//!     let status = Dataflash::import("flight.bin", &mut sink)?;
//!
//!     println!("{} rows, worst problem: {:?}", status.valid_reads, status.state());
//!     for row in sink.rows_of("GPS") {
//!         println!("{:?}", row.get("Lat"));
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod config;
mod error;
pub mod format;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Decoding pipeline
pub mod registry;
pub mod session;
pub mod sink;
pub mod stream;
pub mod timestamp;
pub mod vehicle;

// Core exports
pub use config::ParserConfig;
pub use error::*;
pub use types::*;

// Pipeline exports
pub use registry::{TypeRegistry, ValidationRules};
pub use session::{Session, StopHandle};
pub use sink::{
    DataSink, MemorySink, ProgressObserver, RegisteredType, SinkError, StoredRow, TracingObserver,
};
pub use stream::{ChannelSink, LogEvent, LogStream};

use std::path::Path;

/// Entry point for the common ways of importing a log.
///
/// # Examples
///
/// ## Synchronous import
/// ```rust,no_run
/// use dataflash::{Dataflash, MemorySink};
///
/// let mut sink = MemorySink::new();
/// let status = Dataflash::import("flight.bin", &mut sink)?;
/// # Ok::<(), dataflash::DataflashError>(())
/// ```
///
/// ## Streaming import
/// ```rust,no_run
/// use dataflash::Dataflash;
/// use futures::StreamExt;
///
/// #[tokio::main]
/// async fn main() -> dataflash::Result<()> {
///     let mut stream = Dataflash::stream("flight.bin")?;
///     while let Some(event) = stream.next().await {
///         println!("{:?}", event);
///     }
///     stream.finish().await?;
///     Ok(())
/// }
/// ```
pub struct Dataflash;

impl Dataflash {
    /// Decode a log file into `sink` with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error only if the file cannot be opened. Sink failures and
    /// corruption are reported through the returned status.
    pub fn import<S: DataSink>(path: impl AsRef<Path>, sink: S) -> Result<LoadingStatus> {
        Session::new(sink, TracingObserver).parse_file(path)
    }

    /// Decode a log file with a custom observer and configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the file cannot be opened.
    pub fn import_with<S, P>(
        path: impl AsRef<Path>,
        sink: S,
        observer: P,
        config: ParserConfig,
    ) -> Result<LoadingStatus>
    where
        S: DataSink,
        P: ProgressObserver,
    {
        Session::with_config(sink, observer, config)?.parse_file(path)
    }

    /// Decode a log file on a blocking thread and stream what it stores.
    ///
    /// Must be called within a tokio runtime.
    pub fn stream(path: impl AsRef<Path>) -> Result<LogStream> {
        LogStream::open(path, ParserConfig::default())
    }
}
