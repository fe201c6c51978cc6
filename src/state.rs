// src/state.rs
use nalgebra::Matrix3;

use crate::error::Result;
use crate::model::dial::{DialKind, DialRegistry};
use crate::model::mode::{ExperimentMode, ModeSwitch};
use crate::model::unit_cell::UnitCellCoupler;
use crate::physics::gateway::{CrystalModel, DiffuseParams, Exposure};
use crate::physics::spectrum::SpectrumModel;
use crate::rendering::compositor::{Compositor, Displayable};
use crate::rendering::image::ImageSet;

/// Everything one interactive session mutates. Owned by a single controller;
/// every mutation goes through `&mut`.
pub struct SessionState {
    pub dials: DialRegistry,
    pub cell: UnitCellCoupler,
    pub mode: ModeSwitch,
    pub spectrum: SpectrumModel,
    pub crystal: CrystalModel,
    pub start_orientation: Matrix3<f64>,
    pub images: ImageSet,
    pub compositor: Compositor,
    pub displayable: Displayable,
    pub diffuse_scattering: bool,
    pub current_dial: DialKind,
}

impl SessionState {
    pub fn experiment_mode(&self) -> ExperimentMode {
        self.mode.mode()
    }

    pub fn structure_factors(&self) -> bool {
        self.dials.stored_value(DialKind::Fhkl).map_or(true, |v| v != 0.0)
    }

    pub fn energy(&self) -> Result<f64> {
        self.dials.require(DialKind::Energy)
    }

    /// Bandwidth is parked in rotation mode; its stored value still feeds the
    /// Gaussian shape so nothing is lost on the way back.
    pub fn bandwidth(&self) -> f64 {
        self.dials.stored_value(DialKind::Bandwidth).unwrap_or(0.0)
    }

    /// Missetting angles in degrees; dials parked by the current mode count as 0.
    pub fn missetting_deg(&self) -> [f64; 3] {
        [DialKind::RotX, DialKind::RotY, DialKind::RotZ].map(|k| self.dials.value(k).unwrap_or(0.0))
    }

    pub fn exposure(&self) -> Result<Exposure> {
        Ok(match self.experiment_mode() {
            ExperimentMode::Stills => {
                let [x, y, z] = self.missetting_deg();
                Exposure::Still { missetting: [x.to_radians(), y.to_radians(), z.to_radians()] }
            }
            ExperimentMode::Rotation => {
                let delta = self.dials.require(DialKind::DeltaPhi)?;
                let image = self.dials.require(DialKind::Image)?;
                Exposure::Sweep {
                    phi_start: (image - 1.0) * delta,
                    phi_range: delta,
                    spindle: self.dials.require(DialKind::RotZ)?,
                }
            }
        })
    }

    pub fn diffuse(&self) -> Result<Option<DiffuseParams>> {
        if !self.diffuse_scattering {
            return Ok(None);
        }
        Ok(Some(DiffuseParams::from_dials(
            self.dials.require(DialKind::DiffGamma)?,
            self.dials.require(DialKind::DiffSigma)?,
            self.dials.require(DialKind::Aniso)?,
        )))
    }

    // --- Dial cursor ---

    /// Moves to the next active dial; stays put at the end of the list.
    pub fn next_dial(&mut self) -> bool {
        let dials = self.dials.active_dials();
        match dials.iter().position(|k| *k == self.current_dial) {
            Some(i) if i + 1 < dials.len() => {
                self.current_dial = dials[i + 1];
                true
            }
            _ => false,
        }
    }

    /// Moves to the previous active dial; stays put at the start of the list.
    pub fn prev_dial(&mut self) -> bool {
        let dials = self.dials.active_dials();
        match dials.iter().position(|k| *k == self.current_dial) {
            Some(i) if i > 0 => {
                self.current_dial = dials[i - 1];
                true
            }
            _ => false,
        }
    }

    pub fn select_dial(&mut self, kind: DialKind) -> bool {
        if self.dials.is_active(kind) && kind != self.current_dial {
            self.current_dial = kind;
            true
        } else {
            false
        }
    }

    /// Puts the cursor back on an active dial after a mode switch.
    pub fn ensure_cursor(&mut self) {
        if !self.dials.is_active(self.current_dial) {
            if let Some(first) = self.dials.active_dials().first() {
                self.current_dial = *first;
            }
        }
    }
}
