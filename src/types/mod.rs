//! Core types for decoded flight-log data.
//!
//! ## Architecture
//!
//! - [`FieldType`] is the closed set of format characters a schema record may use
//! - [`Value`] and [`NameValuePair`] carry one decoded field
//! - [`TypeDescriptor`] describes the layout of one record type
//! - [`TimestampCandidate`] names a time field convention and its scale to seconds
//! - [`LoadingStatus`] aggregates everything a session observed
//!
//! ## Usage Example
//!
//! ```rust
//! use dataflash::types::{FieldType, TimestampCandidate, TypeDescriptor};
//!
//! let mut descriptor = TypeDescriptor {
//!     id: Some(0x81),
//!     declared_length: 3 + 8 + 4,
//!     name: "BARO".to_string(),
//!     format: "Qf".to_string(),
//!     labels: vec!["TimeUS".to_string(), "Alt".to_string()],
//!     ..Default::default()
//! };
//!
//! descriptor.finalize(&TimestampCandidate::new("TimeUS", 1e6));
//! assert!(descriptor.has_timestamp);
//! assert_eq!(descriptor.timestamp_index, 0);
//! assert_eq!(FieldType::from_code(b'f'), Some(FieldType::Float32));
//! ```

mod descriptor;
mod field_type;
mod status;

pub use descriptor::{PLACEHOLDER_LABEL, TimestampCandidate, TypeDescriptor};
pub use field_type::{FieldType, NameValuePair, Value};
pub use status::{
    CorruptEvent, CorruptionKind, LoadingStatus, ParseState, SessionOutcome, VehicleType,
};

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    const ALL_CODES: &[u8] = b"bBhHiIqQfcCeELnNZM";

    proptest! {
        #[test]
        fn prop_field_codes_round_trip(code in prop::sample::select(ALL_CODES.to_vec())) {
            let field_type = FieldType::from_code(code).expect("known code");
            prop_assert_eq!(field_type.code(), code as char);
            prop_assert!(field_type.size() >= 1);
            prop_assert!(field_type.size() <= 64);
        }

        #[test]
        fn prop_unknown_codes_are_rejected(code in any::<u8>()) {
            prop_assume!(!ALL_CODES.contains(&code));
            prop_assert!(FieldType::from_code(code).is_none());
        }

        #[test]
        fn prop_label_lookup_never_panics(
            labels in prop::collection::vec("[A-Za-z]{1,8}", 0..6),
            index in 0usize..12
        ) {
            let descriptor = TypeDescriptor { labels: labels.clone(), ..Default::default() };
            let label = descriptor.label_at(index);
            match labels.get(index) {
                Some(expected) => prop_assert_eq!(label, expected.as_str()),
                None => prop_assert_eq!(label, PLACEHOLDER_LABEL),
            }
        }
    }

    #[test]
    fn field_sizes_match_wire_widths() {
        let expected = [
            (b'b', 1),
            (b'M', 1),
            (b'h', 2),
            (b'c', 2),
            (b'C', 2),
            (b'i', 4),
            (b'f', 4),
            (b'e', 4),
            (b'L', 4),
            (b'n', 4),
            (b'Q', 8),
            (b'N', 16),
            (b'Z', 64),
        ];
        for (code, size) in expected {
            assert_eq!(FieldType::from_code(code).map(|t| t.size()), Some(size), "code {}", code as char);
        }
    }

    #[test]
    fn timestamp_field_injection_prepends_u64() {
        let descriptor = TypeDescriptor {
            id: Some(0x90),
            declared_length: 7,
            name: "MODE".into(),
            format: "Mi".into(),
            labels: vec!["Mode".into(), "Rsn".into()],
            ..Default::default()
        };
        let extended = descriptor.with_timestamp_field(&TimestampCandidate::new("TimeMS", 1e3));

        assert_eq!(extended.format, "QMi");
        assert_eq!(extended.labels, vec!["TimeMS", "Mode", "Rsn"]);
        assert_eq!(extended.declared_length, 15);
        assert!(extended.has_timestamp);
        assert_eq!(extended.timestamp_index, 0);
        // the original is untouched
        assert!(!descriptor.has_timestamp);
    }

    #[test]
    fn rename_label_only_touches_matching_label() {
        let mut descriptor = TypeDescriptor {
            labels: vec!["TimeMS".into(), "Status".into()],
            ..Default::default()
        };
        descriptor.rename_label("TimeMS", "GPSTimeMS");
        descriptor.rename_label("Missing", "Other");
        assert_eq!(descriptor.labels, vec!["GPSTimeMS", "Status"]);
    }

    #[test]
    fn value_as_u64() {
        assert_eq!(Value::UInt64(42).as_u64(), Some(42));
        assert_eq!(Value::Int32(-1).as_u64(), None);
        assert_eq!(Value::Float64(12.9).as_u64(), Some(12));
        assert_eq!(Value::Float32(f32::NAN).as_u64(), None);
        assert_eq!(Value::Text("x".into()).as_u64(), None);
    }
}
