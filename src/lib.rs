// src/lib.rs
//! Interactive control core for diffraction-simulation viewers: dials, unit
//! cell coupling, stills/rotation modes, beam spectra, image compositing and
//! pixel-to-Miller-index lookup. The simulator itself sits behind
//! [`SimulationGateway`].

pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod physics;
pub mod rendering;
pub mod state;
pub mod utils;

pub use config::Config;
pub use controller::{Action, SessionSetup, SimController};
pub use error::{Result, SimViewError};
pub use physics::gateway::{OrientationRandomizer, SimRequest, SimulationGateway};
pub use state::SessionState;
