// src/physics/gateway.rs
use nalgebra::Matrix3;

use crate::error::Result;
use crate::model::unit_cell::UnitCell;
use crate::physics::detector::{DetectorGeometry, PixelAddress};
use crate::physics::spectrum::SpectrumSample;

/// Crystal orientation (U) and cell shared with the simulator and the
/// orientation randomizer.
#[derive(Debug, Clone, PartialEq)]
pub struct CrystalModel {
    pub u: Matrix3<f64>,
    pub unit_cell: UnitCell,
}

impl CrystalModel {
    pub fn new(unit_cell: UnitCell) -> Self {
        Self { u: Matrix3::identity(), unit_cell }
    }
}

/// Correlated-disorder diffuse scattering terms, one value per lab axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffuseParams {
    pub gamma: [f64; 3],
    pub sigma: [f64; 3],
}

impl DiffuseParams {
    /// Anisotropy stretches the second axis and compresses the third.
    pub fn from_dials(gamma: f64, sigma: f64, aniso: f64) -> Self {
        Self {
            gamma: [gamma, gamma * aniso, gamma / aniso],
            sigma: [sigma, sigma * aniso, sigma / aniso],
        }
    }
}

/// The two call shapes the simulator accepts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Exposure {
    /// Single orientation; missetting angles in radians (X, Y, Z).
    Still { missetting: [f64; 3] },
    /// Phi sweep in degrees; `spindle` is the RotZ offset in degrees.
    Sweep { phi_start: f64, phi_range: f64, spindle: f64 },
}

/// Full parameter snapshot for one simulation.
#[derive(Debug, Clone)]
pub struct SimRequest<'a> {
    pub geometry: &'a DetectorGeometry,
    pub pixels: &'a [PixelAddress],
    pub crystal: &'a CrystalModel,
    /// Scaled unit cell from the a/b/c dials.
    pub unit_cell: UnitCell,
    pub domain_size: [f64; 3],
    pub exposure: Exposure,
    pub spectrum: &'a [SpectrumSample],
    pub mosaic_angle_deg: f64,
    pub diffuse: Option<DiffuseParams>,
    /// Weight spots by |F|; otherwise every reflection has the same amplitude.
    pub structure_factors: bool,
}

/// The diffraction simulator. Returns one intensity per entry of
/// `request.pixels`, in the same order.
pub trait SimulationGateway {
    fn simulate(&mut self, request: &SimRequest<'_>) -> Result<Vec<f64>>;
}

/// Draws a new crystal orientation from a pair of seeds, in place.
pub trait OrientationRandomizer {
    fn randomize(&mut self, crystal: &mut CrystalModel, seed_a: u32, seed_b: u32);
}
