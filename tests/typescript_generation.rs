//! TypeScript Generation Tests
//!
//! Validates that decoded log types can be exported to TypeScript
//! when the tauri feature is enabled.

#[cfg(feature = "tauri")]
#[test]
fn test_core_types_implement_specta_type() {
    use specta::Type;

    // If this compiles, all types are properly configured for TypeScript export.
    fn assert_type<T: Type>() {}

    assert_type::<dataflash::LoadingStatus>();
    assert_type::<dataflash::CorruptEvent>();
    assert_type::<dataflash::SessionOutcome>();
    assert_type::<dataflash::VehicleType>();
    assert_type::<dataflash::TypeDescriptor>();
    assert_type::<dataflash::NameValuePair>();
    assert_type::<dataflash::StoredRow>();
    assert_type::<dataflash::RegisteredType>();
    assert_type::<dataflash::ParserConfig>();
}

#[cfg(not(feature = "tauri"))]
#[test]
fn test_tauri_feature_disabled() {
    // Types still compile without specta::Type
    let status = dataflash::LoadingStatus::default();
    assert_eq!(status.vehicle_type, dataflash::VehicleType::Generic);
}
