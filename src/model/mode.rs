// src/model/mode.rs
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::dial::{DialKind, DialRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperimentMode {
    Stills,
    Rotation,
}

impl ExperimentMode {
    /// Dials that only exist in this mode. RotZ is shared: it is the
    /// missetting angle about the beam in stills and the spindle offset in
    /// rotation sweeps.
    pub fn exclusive_dials(self) -> &'static [DialKind] {
        match self {
            ExperimentMode::Stills => &[DialKind::Bandwidth, DialKind::RotX, DialKind::RotY],
            ExperimentMode::Rotation => &[DialKind::DeltaPhi, DialKind::Image],
        }
    }

    pub fn other(self) -> Self {
        match self {
            ExperimentMode::Stills => ExperimentMode::Rotation,
            ExperimentMode::Rotation => ExperimentMode::Stills,
        }
    }
}

impl fmt::Display for ExperimentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExperimentMode::Stills => f.write_str("stills"),
            ExperimentMode::Rotation => f.write_str("rotation"),
        }
    }
}

/// Two-state switch that moves mode-exclusive dials between the active and
/// disabled stores of a `DialRegistry`.
#[derive(Debug, Clone)]
pub struct ModeSwitch {
    mode: ExperimentMode,
}

impl ModeSwitch {
    /// Starts in `mode`, parking the other mode's dials.
    pub fn new(mode: ExperimentMode, registry: &mut DialRegistry) -> Self {
        for kind in mode.other().exclusive_dials() {
            registry.disable(*kind);
        }
        Self { mode }
    }

    pub fn mode(&self) -> ExperimentMode {
        self.mode
    }

    /// Switches to `target`. Returns `false` if already there.
    pub fn transition(&mut self, target: ExperimentMode, registry: &mut DialRegistry) -> bool {
        if target == self.mode {
            return false;
        }
        for kind in self.mode.exclusive_dials() {
            registry.disable(*kind);
        }
        for kind in target.exclusive_dials() {
            registry.enable(*kind);
        }
        log::info!("Experiment mode: {} -> {}", self.mode, target);
        self.mode = target;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn registry() -> DialRegistry {
        DialRegistry::new(Config::default().dial_specs())
    }

    #[test]
    fn test_initial_stills_parks_rotation_dials() {
        let mut reg = registry();
        let switch = ModeSwitch::new(ExperimentMode::Stills, &mut reg);
        assert_eq!(switch.mode(), ExperimentMode::Stills);
        assert!(!reg.is_active(DialKind::DeltaPhi));
        assert!(!reg.is_active(DialKind::Image));
        assert!(reg.is_active(DialKind::RotX));
        assert!(reg.is_active(DialKind::RotZ));
    }

    #[test]
    fn test_round_trip_preserves_values() {
        let mut reg = registry();
        let mut switch = ModeSwitch::new(ExperimentMode::Stills, &mut reg);
        reg.set_value(DialKind::RotX, 1.25).unwrap();
        reg.set_value(DialKind::Bandwidth, 2.01).unwrap();
        reg.set_value(DialKind::RotZ, -4.0).unwrap();
        let before: Vec<_> = reg.active_dials().iter().map(|k| (*k, reg.value(*k))).collect();

        assert!(switch.transition(ExperimentMode::Rotation, &mut reg));
        assert!(!reg.is_active(DialKind::RotX));
        assert_eq!(reg.value(DialKind::RotZ), Some(-4.0));
        reg.set_value(DialKind::DeltaPhi, 1.0).unwrap();

        assert!(switch.transition(ExperimentMode::Stills, &mut reg));
        let after: Vec<_> = reg.active_dials().iter().map(|k| (*k, reg.value(*k))).collect();
        assert_eq!(before, after);

        switch.transition(ExperimentMode::Rotation, &mut reg);
        assert_eq!(reg.value(DialKind::DeltaPhi), Some(1.0));
    }

    #[test]
    fn test_canonical_order_in_rotation() {
        let mut reg = registry();
        let mut switch = ModeSwitch::new(ExperimentMode::Stills, &mut reg);
        switch.transition(ExperimentMode::Rotation, &mut reg);
        let dials = reg.active_dials();
        let rotz = dials.iter().position(|k| *k == DialKind::RotZ).unwrap();
        assert_eq!(dials[rotz + 1], DialKind::DeltaPhi);
        assert_eq!(dials[rotz + 2], DialKind::Image);
    }

    #[test]
    fn test_same_mode_is_noop() {
        let mut reg = registry();
        let mut switch = ModeSwitch::new(ExperimentMode::Rotation, &mut reg);
        assert!(!switch.transition(ExperimentMode::Rotation, &mut reg));
    }
}
