use serde::{Deserialize, Serialize};

/// Powertrain category of a registered electric vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VehicleType {
    BatteryElectric,
    PlugInHybrid,
    Other(String),
}

impl std::fmt::Display for VehicleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VehicleType::BatteryElectric => write!(f, "Battery Electric Vehicle (BEV)"),
            VehicleType::PlugInHybrid => write!(f, "Plug-in Hybrid Electric Vehicle (PHEV)"),
            VehicleType::Other(label) => write!(f, "{label}"),
        }
    }
}

impl std::str::FromStr for VehicleType {
    type Err = crate::error::EvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "battery electric vehicle (bev)" | "bev" => Ok(VehicleType::BatteryElectric),
            "plug-in hybrid electric vehicle (phev)" | "phev" => Ok(VehicleType::PlugInHybrid),
            "" => Err(crate::error::EvError::ParseError(
                "Empty electric vehicle type".to_string(),
            )),
            _ => Ok(VehicleType::Other(trimmed.to_string())),
        }
    }
}

/// A single vehicle registration row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvRecord {
    /// Model year of the vehicle
    pub model_year: i32,
    /// County of registration
    pub county: String,
    /// City of registration
    pub city: String,
    /// Manufacturer
    pub make: String,
    /// Model name
    pub model: String,
    /// BEV / PHEV category
    pub vehicle_type: VehicleType,
    /// All-electric range in miles
    pub electric_range: f64,
}
