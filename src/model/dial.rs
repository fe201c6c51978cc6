// src/model/dial.rs
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SimViewError};

/// Every adjustable parameter of the session.
///
/// The declaration order is the canonical dial order: the active dial list is
/// always a subsequence of `DialKind::ALL`, so next/previous cycling is stable
/// across mode transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DialKind {
    DomainSize,
    MosAngDeg,
    #[serde(rename = "a")]
    CellA,
    #[serde(rename = "b")]
    CellB,
    #[serde(rename = "c")]
    CellC,
    #[serde(rename = "Diff_gamma")]
    DiffGamma,
    #[serde(rename = "Diff_sigma")]
    DiffSigma,
    Aniso,
    Energy,
    Bandwidth,
    RotX,
    RotY,
    RotZ,
    #[serde(rename = "Delta_phi")]
    DeltaPhi,
    Image,
    Fhkl,
    Brightness,
}

impl DialKind {
    pub const ALL: [DialKind; 17] = [
        DialKind::DomainSize,
        DialKind::MosAngDeg,
        DialKind::CellA,
        DialKind::CellB,
        DialKind::CellC,
        DialKind::DiffGamma,
        DialKind::DiffSigma,
        DialKind::Aniso,
        DialKind::Energy,
        DialKind::Bandwidth,
        DialKind::RotX,
        DialKind::RotY,
        DialKind::RotZ,
        DialKind::DeltaPhi,
        DialKind::Image,
        DialKind::Fhkl,
        DialKind::Brightness,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DialKind::DomainSize => "DomainSize",
            DialKind::MosAngDeg => "MosAngDeg",
            DialKind::CellA => "a",
            DialKind::CellB => "b",
            DialKind::CellC => "c",
            DialKind::DiffGamma => "Diff_gamma",
            DialKind::DiffSigma => "Diff_sigma",
            DialKind::Aniso => "Aniso",
            DialKind::Energy => "Energy",
            DialKind::Bandwidth => "Bandwidth",
            DialKind::RotX => "RotX",
            DialKind::RotY => "RotY",
            DialKind::RotZ => "RotZ",
            DialKind::DeltaPhi => "Delta_phi",
            DialKind::Image => "Image",
            DialKind::Fhkl => "Fhkl",
            DialKind::Brightness => "Brightness",
        }
    }

    pub fn is_cell_length(self) -> bool {
        matches!(self, DialKind::CellA | DialKind::CellB | DialKind::CellC)
    }

    /// Display fragment for a value of this dial.
    ///
    /// Returns `None` for the unit-cell lengths: those share one label built
    /// from the scaled cell (see `UnitCellCoupler::label`).
    pub fn format_value(self, value: f64) -> Option<String> {
        let text = match self {
            DialKind::DomainSize => format!("{v}x{v}x{v}", v = value),
            DialKind::MosAngDeg => format!("{:.2}º", value),
            DialKind::CellA | DialKind::CellB | DialKind::CellC => return None,
            DialKind::DiffGamma => format!("{}", value),
            DialKind::DiffSigma | DialKind::Aniso | DialKind::Brightness => format!("{:.2}", value),
            DialKind::Energy => format!("{:.0}", value),
            DialKind::Bandwidth => format!("{:.2}%", value),
            DialKind::RotX | DialKind::RotY | DialKind::RotZ => format!("{:+.2}", value),
            DialKind::DeltaPhi => format!("{:.2}º", value),
            DialKind::Image => format!("{:.0}", value),
            DialKind::Fhkl => format!("SFs {}", if value != 0.0 { "on" } else { "off" }),
        };
        Some(text)
    }
}

impl fmt::Display for DialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DialKind {
    type Err = SimViewError;

    fn from_str(s: &str) -> Result<Self> {
        DialKind::ALL
            .iter()
            .copied()
            .find(|k| k.name() == s)
            .ok_or_else(|| SimViewError::UnknownDial(s.to_string()))
    }
}

/// Configured range and steps of one dial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DialSpec {
    pub min: f64,
    pub max: f64,
    pub small_step: f64,
    pub big_step: f64,
    pub default: f64,
}

impl DialSpec {
    pub const fn new(min: f64, max: f64, small_step: f64, big_step: f64, default: f64) -> Self {
        Self { min, max, small_step, big_step, default }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Same steps and bounds, multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            min: self.min * factor,
            max: self.max * factor,
            small_step: self.small_step * factor,
            big_step: self.big_step * factor,
            default: self.default * factor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    SmallUp,
    SmallDown,
    BigUp,
    BigDown,
}

impl Step {
    fn delta(self, spec: &DialSpec) -> f64 {
        match self {
            Step::SmallUp => spec.small_step,
            Step::SmallDown => -spec.small_step,
            Step::BigUp => spec.big_step,
            Step::BigDown => -spec.big_step,
        }
    }
}

/// Owns dial identities, ranges and current values.
///
/// Values live in one of two stores: `active` (editable in the current mode)
/// or `disabled` (parked by a mode switch, value kept). Dials removed for
/// symmetry reasons live in neither.
#[derive(Debug, Clone)]
pub struct DialRegistry {
    specs: HashMap<DialKind, DialSpec>,
    active: HashMap<DialKind, f64>,
    disabled: HashMap<DialKind, f64>,
}

impl DialRegistry {
    pub fn new(specs: impl IntoIterator<Item = (DialKind, DialSpec)>) -> Self {
        let specs: HashMap<_, _> = specs.into_iter().collect();
        let active = specs.iter().map(|(k, s)| (*k, s.default)).collect();
        Self { specs, active, disabled: HashMap::new() }
    }

    pub fn spec(&self, kind: DialKind) -> Option<&DialSpec> {
        self.specs.get(&kind)
    }

    pub fn is_active(&self, kind: DialKind) -> bool {
        self.active.contains_key(&kind)
    }

    /// Current value of an active dial.
    pub fn value(&self, kind: DialKind) -> Option<f64> {
        self.active.get(&kind).copied()
    }

    /// Current value whether active or parked.
    pub fn stored_value(&self, kind: DialKind) -> Option<f64> {
        self.active.get(&kind).or_else(|| self.disabled.get(&kind)).copied()
    }

    /// Value of an active dial; asking for anything else is a programming error.
    pub fn require(&self, kind: DialKind) -> Result<f64> {
        self.value(kind).ok_or_else(|| SimViewError::InactiveDial(kind.to_string()))
    }

    /// Active dials in canonical order.
    pub fn active_dials(&self) -> Vec<DialKind> {
        DialKind::ALL.iter().copied().filter(|k| self.active.contains_key(k)).collect()
    }

    /// Commits `new_value` if it lies within the dial's range.
    ///
    /// Returns `Ok(false)` (and leaves the dial untouched) for out-of-range values.
    pub fn set_value(&mut self, kind: DialKind, new_value: f64) -> Result<bool> {
        let spec = *self
            .specs
            .get(&kind)
            .ok_or_else(|| SimViewError::UnknownDial(kind.to_string()))?;
        let slot = self
            .active
            .get_mut(&kind)
            .ok_or_else(|| SimViewError::InactiveDial(kind.to_string()))?;

        if !spec.contains(new_value) {
            log::debug!("{} = {} rejected, outside [{}, {}]", kind, new_value, spec.min, spec.max);
            return Ok(false);
        }
        *slot = new_value;
        Ok(true)
    }

    /// Applies one step; returns the committed value, or `None` when the
    /// candidate would leave `[min, max]`.
    pub fn step(&mut self, kind: DialKind, step: Step) -> Result<Option<f64>> {
        let spec = *self
            .specs
            .get(&kind)
            .ok_or_else(|| SimViewError::UnknownDial(kind.to_string()))?;
        let candidate = self.require(kind)? + step.delta(&spec);
        if self.set_value(kind, candidate)? {
            Ok(Some(candidate))
        } else {
            Ok(None)
        }
    }

    /// Writes a value computed by a coupling rule, bypassing range checks.
    pub(crate) fn set_derived(&mut self, kind: DialKind, value: f64) {
        if let Some(slot) = self.active.get_mut(&kind) {
            *slot = value;
        }
    }

    pub fn reset_all(&mut self) {
        for (kind, value) in self.active.iter_mut().chain(self.disabled.iter_mut()) {
            if let Some(spec) = self.specs.get(kind) {
                *value = spec.default;
            }
        }
    }

    /// Drops a dial for the rest of the session (symmetry-derived lengths).
    pub fn remove(&mut self, kind: DialKind) {
        self.active.remove(&kind);
        self.disabled.remove(&kind);
    }

    /// Parks an active dial; its value is kept for `enable`.
    pub fn disable(&mut self, kind: DialKind) {
        if let Some(v) = self.active.remove(&kind) {
            self.disabled.insert(kind, v);
        }
    }

    /// Restores a parked dial, or activates it at its default if it was never set.
    pub fn enable(&mut self, kind: DialKind) {
        if self.active.contains_key(&kind) {
            return;
        }
        let value = match self.disabled.remove(&kind) {
            Some(v) => v,
            None => match self.specs.get(&kind) {
                Some(spec) => spec.default,
                None => return,
            },
        };
        self.active.insert(kind, value);
    }

    /// Label fragment for an active dial.
    pub fn label(&self, kind: DialKind) -> Option<String> {
        self.value(kind).and_then(|v| kind.format_value(v))
    }
}
