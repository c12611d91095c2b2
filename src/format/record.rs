//! Data record decoding
//!
//! Fields are decoded in format order with fixed widths, little-endian and
//! without padding. Scaled integer types are converted to `f64` on the way out.

use thiserror::Error;
use tracing::debug;

use crate::types::{FieldType, NameValuePair, TypeDescriptor, Value};

/// Divisor of the hundredths types (`c`, `C`, `e`, `E`)
const CENTI_DIVISOR: f64 = 100.0;
/// Divisor of latitude/longitude fields (`L`)
const LAT_LON_DIVISOR: f64 = 10_000_000.0;

/// Recoverable corruption found inside a single record.
///
/// The record is dropped, its bytes are still consumed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("Corrupt data element found when decoding {type_name} data (field {label} is NaN)")]
    NotANumber { type_name: String, label: String },

    #[error("Unknown data type: {code} when decoding {type_name}")]
    UnknownFieldType { code: char, type_name: String },

    #[error("{type_name} record is shorter than its format ({needed} > {available} bytes)")]
    Truncated { type_name: String, needed: usize, available: usize },
}

/// Outcome of decoding one data record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordDecode {
    /// Not enough bytes buffered for the declared length; nothing consumed
    Incomplete,
    /// All fields decoded in format order
    Decoded { values: Vec<NameValuePair>, consumed: usize },
    /// The record is corrupt and dropped as a whole
    Corrupt { error: RecordError, consumed: usize },
}

/// Decode the payload of a data record described by `descriptor`.
///
/// `bytes` starts right after the record header. The record spans
/// `declared_length - 3` bytes of it; when fewer are available the result is
/// [`RecordDecode::Incomplete`] and the caller should retry with more data.
pub fn decode_record(descriptor: &TypeDescriptor, bytes: &[u8]) -> RecordDecode {
    let consumed = descriptor.payload_len();
    let Some(payload) = bytes.get(..consumed) else {
        return RecordDecode::Incomplete;
    };

    match decode_fields(descriptor, payload) {
        Ok(values) => RecordDecode::Decoded { values, consumed },
        Err(error) => RecordDecode::Corrupt { error, consumed },
    }
}

fn decode_fields(
    descriptor: &TypeDescriptor,
    payload: &[u8],
) -> Result<Vec<NameValuePair>, RecordError> {
    let mut values = Vec::with_capacity(descriptor.field_count());
    let mut offset = 0;

    for (index, code) in descriptor.format.bytes().enumerate() {
        let Some(field_type) = FieldType::from_code(code) else {
            debug!(code = %(code as char), name = %descriptor.name, "Unknown field type in format");
            return Err(RecordError::UnknownFieldType {
                code: code as char,
                type_name: descriptor.name.clone(),
            });
        };

        let end = offset + field_type.size();
        let raw = payload.get(offset..end).ok_or_else(|| RecordError::Truncated {
            type_name: descriptor.name.clone(),
            needed: end,
            available: payload.len(),
        })?;
        offset = end;

        let value = read_value(field_type, raw);
        if matches!(value, Value::Float32(v) if v.is_nan()) {
            return Err(RecordError::NotANumber {
                type_name: descriptor.name.clone(),
                label: descriptor.label_at(index).to_string(),
            });
        }

        values.push(NameValuePair::new(descriptor.label_at(index), value));
    }

    Ok(values)
}

/// Decode one field; `raw` is exactly `field_type.size()` bytes long.
fn read_value(field_type: FieldType, raw: &[u8]) -> Value {
    match field_type {
        FieldType::Int8 | FieldType::FlightMode => Value::Int8(i8::from_le_bytes(le(raw))),
        FieldType::UInt8 => Value::UInt8(raw[0]),
        FieldType::Int16 => Value::Int16(i16::from_le_bytes(le(raw))),
        FieldType::UInt16 => Value::UInt16(u16::from_le_bytes(le(raw))),
        FieldType::Int32 => Value::Int32(i32::from_le_bytes(le(raw))),
        FieldType::UInt32 => Value::UInt32(u32::from_le_bytes(le(raw))),
        FieldType::Int64 => Value::Int64(i64::from_le_bytes(le(raw))),
        FieldType::UInt64 => Value::UInt64(u64::from_le_bytes(le(raw))),
        FieldType::Float32 => Value::Float32(f32::from_le_bytes(le(raw))),
        FieldType::CentiInt16 => {
            Value::Float64(f64::from(i16::from_le_bytes(le(raw))) / CENTI_DIVISOR)
        }
        FieldType::CentiUInt16 => {
            Value::Float64(f64::from(u16::from_le_bytes(le(raw))) / CENTI_DIVISOR)
        }
        FieldType::CentiInt32 => {
            Value::Float64(f64::from(i32::from_le_bytes(le(raw))) / CENTI_DIVISOR)
        }
        FieldType::CentiUInt32 => {
            Value::Float64(f64::from(u32::from_le_bytes(le(raw))) / CENTI_DIVISOR)
        }
        FieldType::LatLon => {
            Value::Float64(f64::from(i32::from_le_bytes(le(raw))) / LAT_LON_DIVISOR)
        }
        // zero bytes are padding anywhere in the field, not terminators
        FieldType::Char4 | FieldType::Char16 | FieldType::Char64 => {
            Value::Text(raw.iter().filter(|&&b| b != 0).map(|&b| char::from(b)).collect())
        }
    }
}

fn le<const N: usize>(raw: &[u8]) -> [u8; N] {
    let mut bytes = [0u8; N];
    bytes.copy_from_slice(&raw[..N]);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::HEADER_LEN;
    use proptest::prelude::*;

    fn descriptor(name: &str, format: &str, labels: &[&str], payload_len: usize) -> TypeDescriptor {
        TypeDescriptor {
            id: Some(0x90),
            declared_length: payload_len + HEADER_LEN,
            name: name.to_string(),
            format: format.to_string(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            ..Default::default()
        }
    }

    fn decoded(outcome: RecordDecode) -> Vec<NameValuePair> {
        match outcome {
            RecordDecode::Decoded { values, .. } => values,
            other => panic!("expected decoded record, got {other:?}"),
        }
    }

    #[test]
    fn decodes_integers_and_floats() {
        let labels = ["TimeUS", "a", "b", "c", "d", "e", "f", "g", "h"];
        let desc = descriptor("IMU", "QbBhHiIqf", &labels, 34);
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1_000_000u64.to_le_bytes());
        bytes.push(-5i8 as u8);
        bytes.push(200);
        bytes.extend_from_slice(&(-300i16).to_le_bytes());
        bytes.extend_from_slice(&60_000u16.to_le_bytes());
        bytes.extend_from_slice(&(-70_000i32).to_le_bytes());
        bytes.extend_from_slice(&4_000_000_000u32.to_le_bytes());
        bytes.extend_from_slice(&(-9i64).to_le_bytes());
        bytes.extend_from_slice(&1.5f32.to_le_bytes());

        let values = decoded(decode_record(&desc, &bytes));
        let expected = vec![
            Value::UInt64(1_000_000),
            Value::Int8(-5),
            Value::UInt8(200),
            Value::Int16(-300),
            Value::UInt16(60_000),
            Value::Int32(-70_000),
            Value::UInt32(4_000_000_000),
            Value::Int64(-9),
            Value::Float32(1.5),
        ];
        assert_eq!(values.iter().map(|p| p.value.clone()).collect::<Vec<_>>(), expected);
        assert_eq!(values[0].name, "TimeUS");
        assert_eq!(values[8].name, "h");
    }

    #[test]
    fn applies_scale_factors() {
        let desc = descriptor("GPS", "cCeEL", &["c", "C", "e", "E", "Lat"], 16);
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(-1234i16).to_le_bytes());
        bytes.extend_from_slice(&5000u16.to_le_bytes());
        bytes.extend_from_slice(&(-250i32).to_le_bytes());
        bytes.extend_from_slice(&123_456u32.to_le_bytes());
        bytes.extend_from_slice(&(-353_632_610i32).to_le_bytes());

        let values = decoded(decode_record(&desc, &bytes));
        assert_eq!(values[0].value, Value::Float64(-12.34));
        assert_eq!(values[1].value, Value::Float64(50.0));
        assert_eq!(values[2].value, Value::Float64(-2.5));
        assert_eq!(values[3].value, Value::Float64(1234.56));
        assert_eq!(values[4].value, Value::Float64(-35.363261));
    }

    #[test]
    fn text_fields_skip_zero_bytes() {
        let desc = descriptor("MSG", "nNM", &["Id", "Message", "Mode"], 21);
        let mut bytes = vec![b'A', 0, b'B', 0];
        let mut text = [0u8; 16];
        text[..5].copy_from_slice(b"Hello");
        text[7] = b'!';
        bytes.extend_from_slice(&text);
        bytes.push(-3i8 as u8);

        let values = decoded(decode_record(&desc, &bytes));
        assert_eq!(values[0].value, Value::Text("AB".into()));
        assert_eq!(values[1].value, Value::Text("Hello!".into()));
        assert_eq!(values[2].value, Value::Int8(-3));
    }

    #[test]
    fn missing_labels_use_placeholder() {
        let desc = descriptor("RAW", "BB", &["first"], 2);
        let values = decoded(decode_record(&desc, &[1, 2]));
        assert_eq!(values[0].name, "first");
        assert_eq!(values[1].name, crate::types::PLACEHOLDER_LABEL);
    }

    #[test]
    fn nan_discards_whole_record() {
        let desc = descriptor("ATT", "Bff", &["Ok", "Roll", "Pitch"], 9);
        let mut bytes = vec![7];
        bytes.extend_from_slice(&f32::NAN.to_le_bytes());
        bytes.extend_from_slice(&1.0f32.to_le_bytes());

        match decode_record(&desc, &bytes) {
            RecordDecode::Corrupt { error, consumed } => {
                assert_eq!(consumed, 9);
                assert_eq!(
                    error,
                    RecordError::NotANumber { type_name: "ATT".into(), label: "Roll".into() }
                );
            }
            other => panic!("expected corrupt record, got {other:?}"),
        }
    }

    #[test]
    fn unknown_code_is_corrupt() {
        let desc = descriptor("ODD", "Bx", &["a", "b"], 2);
        match decode_record(&desc, &[1, 2]) {
            RecordDecode::Corrupt { error: RecordError::UnknownFieldType { code, .. }, consumed } => {
                assert_eq!(code, 'x');
                assert_eq!(consumed, 2);
            }
            other => panic!("expected unknown field type, got {other:?}"),
        }
    }

    #[test]
    fn format_longer_than_payload_is_truncated() {
        let desc = descriptor("SHRT", "I", &["a"], 2);
        assert!(matches!(
            decode_record(&desc, &[1, 2]),
            RecordDecode::Corrupt { error: RecordError::Truncated { .. }, consumed: 2 }
        ));
    }

    #[test]
    fn incomplete_leaves_input_untouched() {
        let desc = descriptor("BARO", "Qf", &["TimeUS", "Alt"], 12);
        let mut bytes = 5u64.to_le_bytes().to_vec();
        assert_eq!(decode_record(&desc, &bytes), RecordDecode::Incomplete);

        bytes.extend_from_slice(&2.0f32.to_le_bytes());
        let first = decode_record(&desc, &bytes);
        let second = decode_record(&desc, &bytes);
        assert_eq!(first, second);
        assert!(matches!(first, RecordDecode::Decoded { consumed: 12, .. }));
    }

    proptest! {
        #[test]
        fn prop_decodes_declared_field_count(
            codes in prop::collection::vec(
                prop::sample::select(b"bBhHiIqQcCeELnNZM".to_vec()),
                0..12
            ),
            seed in any::<u8>()
        ) {
            let format: String = codes.iter().map(|&c| c as char).collect();
            let payload_len: usize = codes
                .iter()
                .filter_map(|&c| FieldType::from_code(c))
                .map(|t| t.size())
                .sum();
            let labels: Vec<String> = (0..codes.len()).map(|i| format!("F{i}")).collect();
            let desc = TypeDescriptor {
                id: Some(0x91),
                declared_length: payload_len + HEADER_LEN,
                name: "PROP".into(),
                format,
                labels: labels.clone(),
                ..Default::default()
            };
            let bytes: Vec<u8> = (0..payload_len).map(|i| (i as u8).wrapping_add(seed)).collect();

            match decode_record(&desc, &bytes) {
                RecordDecode::Decoded { values, consumed } => {
                    prop_assert_eq!(consumed, payload_len);
                    prop_assert_eq!(values.len(), codes.len());
                    let names: Vec<String> = values.into_iter().map(|p| p.name).collect();
                    prop_assert_eq!(names, labels);
                }
                other => prop_assert!(false, "unexpected outcome {:?}", other),
            }
        }
    }
}
