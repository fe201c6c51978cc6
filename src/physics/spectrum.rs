// src/physics/spectrum.rs
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::{LN_2, PI};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SimViewError};

/// hc in eV·Å: wavelength = ENERGY_TO_WAVELENGTH / energy.
pub const ENERGY_TO_WAVELENGTH: f64 = 12398.0;

/// Photons per pulse every spectrum is normalized to.
pub const TOTAL_FLUX: f64 = 1e12;

/// Half-width of the Gaussian energy window, eV.
const GAUSSIAN_HALF_WINDOW: i32 = 50;

pub fn energy_to_wavelength(energy_ev: f64) -> f64 {
    ENERGY_TO_WAVELENGTH / energy_ev
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpectrumShape {
    Gaussian,
    Sase,
    Monochromatic,
}

impl SpectrumShape {
    const CYCLE: [SpectrumShape; 3] =
        [SpectrumShape::Gaussian, SpectrumShape::Sase, SpectrumShape::Monochromatic];

    fn index(self) -> usize {
        match self {
            SpectrumShape::Gaussian => 0,
            SpectrumShape::Sase => 1,
            SpectrumShape::Monochromatic => 2,
        }
    }

    /// Gaussian → SASE → monochromatic → Gaussian.
    pub fn next(self) -> Self {
        Self::CYCLE[(self.index() + 1) % 3]
    }

    /// Exact inverse of `next`.
    pub fn previous(self) -> Self {
        Self::CYCLE[(self.index() + 2) % 3]
    }
}

impl fmt::Display for SpectrumShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpectrumShape::Gaussian => f.write_str("Gaussian"),
            SpectrumShape::Sase => f.write_str("SASE"),
            SpectrumShape::Monochromatic => f.write_str("monochromatic"),
        }
    }
}

impl FromStr for SpectrumShape {
    type Err = SimViewError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Gaussian" => Ok(SpectrumShape::Gaussian),
            "SASE" => Ok(SpectrumShape::Sase),
            "monochromatic" => Ok(SpectrumShape::Monochromatic),
            other => Err(SimViewError::UnknownSpectrumShape(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectrumTrigger {
    /// Energy or bandwidth changed.
    ParameterChange,
    /// Explicit request for a new stochastic pulse.
    NewPulse,
    /// Experiment mode or spectrum shape changed.
    ModeChange,
    Init,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumSample {
    /// Å
    pub wavelength: f64,
    pub flux: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pulse {
    pub samples: Vec<SpectrumSample>,
    pub avg_wavelength: f64,
}

/// Source of stochastic XFEL pulses. Advanced only on explicit request.
pub trait SpectrumSource {
    fn next_pulse(&mut self) -> Result<Pulse>;
}

/// Discretized Gaussian: 101 samples at integer eV offsets within ±50 eV of
/// `energy`, FWHM = `bandwidth_pct` percent of `energy`.
pub fn gaussian_spectrum(energy: f64, bandwidth_pct: f64) -> Vec<SpectrumSample> {
    let fwhm = 0.01 * bandwidth_pct * energy;
    let exponent = 4.0 * LN_2 / (fwhm * fwhm);

    (-GAUSSIAN_HALF_WINDOW..=GAUSSIAN_HALF_WINDOW)
        .map(|offset| {
            let x = offset as f64;
            SpectrumSample {
                wavelength: energy_to_wavelength(energy + x),
                flux: TOTAL_FLUX * (-exponent * x * x).exp(),
            }
        })
        .collect()
}

pub fn monochromatic_spectrum(energy: f64) -> Vec<SpectrumSample> {
    vec![SpectrumSample { wavelength: energy_to_wavelength(energy), flux: TOTAL_FLUX }]
}

/// Synthetic SASE pulses: a jittered Gaussian envelope filled with randomly
/// placed, exponentially weighted spikes.
///
/// The central energy is fixed at construction; the energy and bandwidth
/// dials never reshape these pulses.
pub struct SaseGenerator {
    central_energy: f64,
    rng: StdRng,
    limit: Option<usize>,
    emitted: usize,
}

impl SaseGenerator {
    const GRID_STEP_EV: f64 = 0.5;
    const SPIKE_WIDTH_EV: f64 = 0.7;
    const CENTER_JITTER_EV: f64 = 3.0;
    const BANDWIDTH_EV: f64 = 20.0;

    pub fn new(central_energy: f64, seed: u64) -> Self {
        Self {
            central_energy,
            rng: StdRng::seed_from_u64(seed),
            limit: None,
            emitted: 0,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn normal(&mut self) -> f64 {
        // Box-Muller
        let u1: f64 = 1.0 - self.rng.gen::<f64>();
        let u2: f64 = self.rng.gen();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }
}

impl SpectrumSource for SaseGenerator {
    fn next_pulse(&mut self) -> Result<Pulse> {
        if let Some(limit) = self.limit {
            if self.emitted >= limit {
                return Err(SimViewError::PulsesExhausted(limit));
            }
        }

        let center = self.central_energy + Self::CENTER_JITTER_EV * self.normal();
        let sigma = Self::BANDWIDTH_EV / (8.0 * LN_2).sqrt();
        let n_spikes = self.rng.gen_range(8..=20);
        let spikes: Vec<(f64, f64)> = (0..n_spikes)
            .map(|_| {
                let position = center + sigma * self.normal();
                let weight = -(1.0 - self.rng.gen::<f64>()).ln();
                (position, weight)
            })
            .collect();

        let half_window = 2.5 * Self::BANDWIDTH_EV;
        let n_grid = (2.0 * half_window / Self::GRID_STEP_EV).round() as usize + 1;
        let envelope = 4.0 * LN_2 / (Self::BANDWIDTH_EV * Self::BANDWIDTH_EV);
        let w2 = 2.0 * Self::SPIKE_WIDTH_EV * Self::SPIKE_WIDTH_EV;

        let mut samples: Vec<SpectrumSample> = (0..n_grid)
            .map(|i| {
                let energy = self.central_energy - half_window + i as f64 * Self::GRID_STEP_EV;
                let spiky: f64 = spikes
                    .iter()
                    .map(|(pos, weight)| weight * (-(energy - pos).powi(2) / w2).exp())
                    .sum();
                let flux = (-envelope * (energy - center).powi(2)).exp() * spiky;
                SpectrumSample { wavelength: energy_to_wavelength(energy), flux }
            })
            .collect();

        let total: f64 = samples.iter().map(|s| s.flux).sum();
        if total > 0.0 {
            for s in &mut samples {
                s.flux *= TOTAL_FLUX / total;
            }
        }
        let avg_wavelength = if total > 0.0 {
            samples.iter().map(|s| s.wavelength * s.flux).sum::<f64>() / TOTAL_FLUX
        } else {
            energy_to_wavelength(self.central_energy)
        };

        self.emitted += 1;
        Ok(Pulse { samples, avg_wavelength })
    }
}

/// The beam spectrum handed to the simulation gateway.
pub struct SpectrumModel {
    shape: SpectrumShape,
    toggle_locked: bool,
    source: Box<dyn SpectrumSource>,
    pulse: Option<Pulse>,
    samples: Vec<SpectrumSample>,
}

impl SpectrumModel {
    /// The model is empty until the first `update(SpectrumTrigger::Init, ..)`.
    pub fn new(shape: SpectrumShape, source: Box<dyn SpectrumSource>) -> Self {
        Self { shape, toggle_locked: false, source, pulse: None, samples: Vec::new() }
    }

    pub fn shape(&self) -> SpectrumShape {
        self.shape
    }

    pub fn samples(&self) -> &[SpectrumSample] {
        &self.samples
    }

    pub fn is_locked(&self) -> bool {
        self.toggle_locked
    }

    /// Recomputes the samples for the current shape.
    ///
    /// SASE only draws a new pulse on `NewPulse` or `Init` (or when it has
    /// never drawn one); any other trigger reuses the held pulse.
    pub fn update(&mut self, trigger: SpectrumTrigger, energy: f64, bandwidth_pct: f64) -> Result<()> {
        self.samples = match self.shape {
            SpectrumShape::Gaussian => gaussian_spectrum(energy, bandwidth_pct),
            SpectrumShape::Monochromatic => monochromatic_spectrum(energy),
            SpectrumShape::Sase => {
                let advance = matches!(trigger, SpectrumTrigger::NewPulse | SpectrumTrigger::Init);
                if advance || self.pulse.is_none() {
                    // an exhausted source leaves the held pulse in place
                    let pulse = self.source.next_pulse()?;
                    log::debug!(
                        "New SASE pulse: {} samples, <λ> = {:.5} Å",
                        pulse.samples.len(),
                        pulse.avg_wavelength
                    );
                    self.pulse = Some(pulse);
                }
                self.pulse.as_ref().map(|p| p.samples.clone()).unwrap_or_default()
            }
        };
        Ok(())
    }

    /// Moves one step around the shape cycle. Returns `None` while the toggle
    /// is locked (rotation mode).
    pub fn cycle_shape(&mut self, forward: bool) -> Option<SpectrumShape> {
        if self.toggle_locked {
            log::debug!("Spectrum shape toggle is locked");
            return None;
        }
        self.shape = if forward { self.shape.next() } else { self.shape.previous() };
        log::info!("Spectrum shape: {}", self.shape);
        Some(self.shape)
    }

    /// Rotation sweeps run monochromatic with the toggle disabled.
    pub fn lock_monochromatic(&mut self) {
        self.shape = SpectrumShape::Monochromatic;
        self.toggle_locked = true;
    }

    /// Re-enables the toggle; the shape stays whatever it is.
    pub fn unlock(&mut self) {
        self.toggle_locked = false;
    }
}
