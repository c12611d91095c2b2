//! Schema (`FMT`) record parsing

use crate::types::TypeDescriptor;
use tracing::trace;

const SCHEMA_NAME_SIZE: usize = 4;
const SCHEMA_FORMAT_SIZE: usize = 16;
const SCHEMA_LABELS_SIZE: usize = 64;

/// Bytes following the header of a schema record: id, length, name, format, labels.
pub const SCHEMA_PAYLOAD_LEN: usize =
    2 + SCHEMA_NAME_SIZE + SCHEMA_FORMAT_SIZE + SCHEMA_LABELS_SIZE;

/// Parse the payload of a schema record into an unvalidated descriptor.
///
/// `payload` starts right after the record header. Returns `None` when fewer
/// than [`SCHEMA_PAYLOAD_LEN`] bytes are available; on success exactly
/// [`SCHEMA_PAYLOAD_LEN`] bytes belong to the record.
pub fn parse_schema_record(payload: &[u8]) -> Option<TypeDescriptor> {
    let payload = payload.get(..SCHEMA_PAYLOAD_LEN)?;

    let id = payload[0];
    let declared_length = usize::from(payload[1]);

    let name_start = 2;
    let format_start = name_start + SCHEMA_NAME_SIZE;
    let labels_start = format_start + SCHEMA_FORMAT_SIZE;

    let name = extract_null_terminated_string(&payload[name_start..format_start]);
    let format = extract_null_terminated_string(&payload[format_start..labels_start]);
    let labels_text = extract_null_terminated_string(&payload[labels_start..]);

    let labels = if labels_text.is_empty() {
        Vec::new()
    } else {
        labels_text.split(',').map(str::to_string).collect()
    };

    trace!(id, name = %name, format = %format, length = declared_length, "Schema record");

    Some(TypeDescriptor {
        id: Some(id),
        declared_length,
        name,
        format,
        labels,
        has_timestamp: false,
        timestamp_index: 0,
    })
}

/// Extract null-terminated string from byte slice
fn extract_null_terminated_string(bytes: &[u8]) -> String {
    let null_pos = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..null_pos]).to_string()
}
