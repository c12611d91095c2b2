//! Vehicle class detection from logged parameters

use tracing::debug;

use crate::types::{NameValuePair, VehicleType};

/// Name of the parameter record field holding the parameter name.
const PARAMETER_NAME_FIELD: &str = "Name";

/// Parameters that only exist on one class of vehicle.
const MARKER_PARAMETERS: &[(&str, VehicleType)] = &[
    ("RATE_RLL_P", VehicleType::Quadrotor),
    ("H_SWASH_PLATE", VehicleType::Quadrotor),
    ("ATC_RAT_RLL_P", VehicleType::Quadrotor),
    ("PTCH2SRV_P", VehicleType::FixedWing),
    ("SKID_STEER_OUT", VehicleType::GroundRover),
];

/// Vehicle class named by one decoded parameter record, if its parameter is a marker.
///
/// Only the first marker of a log counts; the caller keeps the decided type
/// and stops asking once it is no longer [`VehicleType::Generic`].
pub fn classify_parameter(values: &[NameValuePair]) -> Option<VehicleType> {
    let name = values
        .iter()
        .find(|pair| pair.name == PARAMETER_NAME_FIELD)
        .and_then(|pair| pair.value.as_text())?;

    let (_, vehicle) = MARKER_PARAMETERS.iter().find(|(marker, _)| *marker == name)?;
    debug!(parameter = name, vehicle = ?vehicle, "Parameter identifies vehicle type");
    Some(*vehicle)
}
