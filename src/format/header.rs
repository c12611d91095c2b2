//! Record header constants and scanning

use super::ByteCursor;
use tracing::trace;

/// First marker byte of every record header
pub const START_BYTE_1: u8 = 0xA3;
/// Second marker byte of every record header
pub const START_BYTE_2: u8 = 0x95;
/// Marker bytes plus the type code
pub const HEADER_LEN: usize = 3;
/// Type code of schema (`FMT`) records
pub const SCHEMA_TYPE: u8 = 0x80;
/// Type code of the legacy startup (`STRT`) record
pub const STARTUP_TYPE: u8 = 0x0A;
/// Type name of parameter records
pub const PARAMETER_TYPE_NAME: &str = "PARM";
/// Type name of GPS records
pub const GPS_TYPE_NAME: &str = "GPS";

/// Result of looking for a record header at the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderScan {
    /// Header found; the cursor sits on the first payload byte
    Record(u8),
    /// No header here; the cursor moved one byte forward
    NoHeader,
    /// Fewer than [`HEADER_LEN`] bytes buffered; nothing consumed
    Incomplete,
}

/// Look for a record header at the cursor.
///
/// A mismatch skips exactly one byte so that a marker starting inside a
/// damaged region is still found on the next attempt.
pub fn scan_header(cursor: &mut ByteCursor) -> HeaderScan {
    let (Some(first), Some(second), Some(type_code)) =
        (cursor.peek(0), cursor.peek(1), cursor.peek(2))
    else {
        return HeaderScan::Incomplete;
    };

    if first == START_BYTE_1 && second == START_BYTE_2 {
        cursor.consume(HEADER_LEN);
        trace!(type_code, offset = cursor.position(), "Record header");
        HeaderScan::Record(type_code)
    } else {
        cursor.consume(1);
        HeaderScan::NoHeader
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_header_and_type() {
        let mut cursor = ByteCursor::new();
        cursor.append(&[START_BYTE_1, START_BYTE_2, 0x80, 0xFF]);
        assert_eq!(scan_header(&mut cursor), HeaderScan::Record(0x80));
        assert_eq!(cursor.unconsumed(), &[0xFF]);
    }

    #[test]
    fn skips_single_garbage_byte() {
        let mut cursor = ByteCursor::new();
        cursor.append(&[0x00, START_BYTE_1, START_BYTE_2, 0x81]);
        assert_eq!(scan_header(&mut cursor), HeaderScan::NoHeader);
        assert_eq!(cursor.position(), 1);
        assert_eq!(scan_header(&mut cursor), HeaderScan::Record(0x81));
    }

    #[test]
    fn half_marker_advances_only_one_byte() {
        // A3 A3 95 : the second byte starts the real header
        let mut cursor = ByteCursor::new();
        cursor.append(&[START_BYTE_1, START_BYTE_1, START_BYTE_2, 0x82]);
        assert_eq!(scan_header(&mut cursor), HeaderScan::NoHeader);
        assert_eq!(scan_header(&mut cursor), HeaderScan::Record(0x82));
    }

    #[test]
    fn short_buffer_is_incomplete() {
        let mut cursor = ByteCursor::new();
        cursor.append(&[START_BYTE_1, START_BYTE_2]);
        assert_eq!(scan_header(&mut cursor), HeaderScan::Incomplete);
        assert_eq!(cursor.position(), 0);
    }
}
