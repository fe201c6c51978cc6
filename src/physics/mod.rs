// src/physics/mod.rs
pub mod detector;
pub mod gateway;
pub mod reciprocal;
pub mod spectrum;

pub use detector::{full_image_addresses, DetectorGeometry, PixelAddress};
pub use gateway::{CrystalModel, DiffuseParams, Exposure, OrientationRandomizer, SimRequest, SimulationGateway};
pub use reciprocal::{MillerReadout, ReciprocalResolver};
pub use spectrum::{SaseGenerator, SpectrumModel, SpectrumShape, SpectrumSource, SpectrumTrigger};
