// src/model/unit_cell.rs
use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::dial::{DialKind, DialRegistry, DialSpec};
use crate::model::symmetry::{CellCoupling, SymmetryOracle};
use crate::utils::linalg;

/// Cell parameters: lengths in Å, angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitCell {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl UnitCell {
    pub fn new(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        Self { a, b, c, alpha, beta, gamma }
    }

    pub fn with_lengths(&self, a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c, ..*self }
    }

    pub fn lengths(&self) -> [f64; 3] {
        [self.a, self.b, self.c]
    }

    pub fn angles(&self) -> [f64; 3] {
        [self.alpha, self.beta, self.gamma]
    }

    /// B matrix of this cell (see `linalg::reciprocal_matrix`).
    pub fn reciprocal_matrix(&self) -> Option<Matrix3<f64>> {
        linalg::reciprocal_matrix(self.lengths(), self.angles())
    }
}

impl fmt::Display for UnitCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.2}, {:.2}, {:.2}, {:.1}, {:.1}, {:.1})",
            self.a, self.b, self.c, self.alpha, self.beta, self.gamma
        )
    }
}

const CELL_DIALS: [DialKind; 3] = [DialKind::CellA, DialKind::CellB, DialKind::CellC];

/// Keeps the scaled unit cell consistent with the a/b/c dials.
///
/// Coupled lengths are always computed from the nominal cell and the edited
/// dial's relative change, never from the previous scaled value, so repeated
/// edits do not drift.
#[derive(Debug, Clone)]
pub struct UnitCellCoupler {
    nominal: UnitCell,
    scaled: UnitCell,
    coupling: CellCoupling,
}

impl UnitCellCoupler {
    pub fn new(nominal: UnitCell, coupling: CellCoupling) -> Self {
        Self { nominal, scaled: nominal, coupling }
    }

    /// Asks the symmetry oracle about the loaded cell.
    pub fn detect(nominal: UnitCell, oracle: &dyn SymmetryOracle) -> Self {
        Self::new(nominal, CellCoupling::detect(&nominal, oracle))
    }

    /// Dial ranges for a, b, c: the scale range multiplied by each nominal length.
    pub fn dial_specs(&self, scale: &DialSpec) -> Vec<(DialKind, DialSpec)> {
        CELL_DIALS
            .iter()
            .zip(self.nominal.lengths())
            .map(|(kind, length)| (*kind, scale.scaled(length)))
            .collect()
    }

    /// Removes the lengths that symmetry forbids editing directly.
    pub fn prune_dials(&self, registry: &mut DialRegistry) {
        for (axis, kind) in CELL_DIALS.iter().enumerate() {
            if !self.coupling.is_free(axis) {
                registry.remove(*kind);
            }
        }
    }

    pub fn nominal(&self) -> &UnitCell {
        &self.nominal
    }

    pub fn scaled(&self) -> &UnitCell {
        &self.scaled
    }

    /// Applies an edit of one cell length and recomputes the coupled lengths.
    ///
    /// Coupled lengths that still own a dial (only in the b/c case) have their
    /// dial value updated to match.
    pub fn apply(&mut self, kind: DialKind, new_value: f64, registry: &mut DialRegistry) {
        let n = self.nominal;
        let [mut a, mut b, mut c] = self.scaled.lengths();

        match kind {
            DialKind::CellA => {
                a = new_value;
                let scale = new_value / n.a;
                match self.coupling {
                    CellCoupling::AbFree => c = scale * n.c,
                    CellCoupling::AcFree => b = scale * n.b,
                    CellCoupling::AOnly => {
                        b = scale * n.b;
                        c = scale * n.c;
                    }
                    _ => {}
                }
            }
            DialKind::CellB => {
                b = new_value;
                // c follows b when it has no dial of its own, and in the b/c case
                if self.coupling == CellCoupling::BcFree || !self.coupling.is_free(2) {
                    c = (new_value / n.b) * n.c;
                    registry.set_derived(DialKind::CellC, c);
                }
            }
            DialKind::CellC => c = new_value,
            _ => return,
        }

        self.scaled = n.with_lengths(a, b, c);
    }

    pub fn reset(&mut self) {
        self.scaled = self.nominal;
    }

    /// Shared label for the three lengths.
    pub fn label(&self) -> String {
        format!("{:.2}, {:.2}, {:.2}", self.scaled.a, self.scaled.b, self.scaled.c)
    }
}
