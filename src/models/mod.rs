mod record;
mod dataset;

pub use record::{EvRecord, VehicleType};
pub use dataset::EvDataset;
