//! Binary dataflash wire format
//!
//! A log is a flat sequence of records. Every record starts with a 3 byte header
//! (two marker bytes and a type code) followed by a payload whose layout is
//! declared earlier in the same stream by a schema (`FMT`) record:
//!
//! 1. **Header** - `0xA3 0x95 <type>`
//! 2. **Schema payload** - type id, length, 4 byte name, 16 byte format, 64 byte labels
//! 3. **Data payload** - fields packed per the format string, little-endian, unpadded
//!
//! Decoding here is pure: functions look at buffered bytes and report how many
//! they consumed, or that more bytes are needed. Consumption is left to the caller.

pub mod cursor;
pub mod header;
pub mod record;
pub mod schema;

pub use cursor::ByteCursor;
pub use header::{HEADER_LEN, HeaderScan, scan_header};
pub use record::{RecordDecode, RecordError, decode_record};
pub use schema::{SCHEMA_PAYLOAD_LEN, parse_schema_record};
