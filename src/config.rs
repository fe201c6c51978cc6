// src/config.rs

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::error::{Result, SimViewError};
use crate::model::dial::{DialKind, DialSpec};
use crate::model::mode::ExperimentMode;
use crate::physics::spectrum::SpectrumShape;
use crate::rendering::compositor::ImageMode;

// --- Defaults ---
// [min, max, small_step, big_step, default]

fn default_dials() -> BTreeMap<DialKind, DialSpec> {
  use DialKind::*;
  BTreeMap::from([
    (DomainSize, DialSpec::new(6.0, 200.0, 2.0, 10.0, 30.0)),
    (MosAngDeg, DialSpec::new(0.01, 5.0, 0.01, 0.1, 0.1001)),
    (DiffGamma, DialSpec::new(1.0, 1000.0, 1.0, 10.0, 50.0)),
    (DiffSigma, DialSpec::new(0.001, 5.0, 0.1, 1.0, 0.3001)),
    (Aniso, DialSpec::new(0.01, 10.0, 0.01, 0.1, 1.0)),
    (Energy, DialSpec::new(6500.0, 12000.0, 10.0, 30.0, 9500.0)),
    (Bandwidth, DialSpec::new(0.01, 5.01, 0.1, 1.0, 0.31)),
    (RotX, DialSpec::new(-180.0, 180.0, 0.01, 0.1, 0.0)),
    (RotY, DialSpec::new(-180.0, 180.0, 0.01, 0.1, 0.0)),
    (RotZ, DialSpec::new(-180.0, 180.0, 0.01, 0.1, 0.0)),
    (DeltaPhi, DialSpec::new(0.01, 5.0, 0.01, 0.1, 0.5)),
    (Image, DialSpec::new(1.0, 360.0, 1.0, 10.0, 1.0)),
    (Fhkl, DialSpec::new(0.0, 1.0, 1.0, 1.0, 1.0)),
    (Brightness, DialSpec::new(0.0, 2.0, 0.01, 0.1, 0.5)),
  ])
}

fn default_ucell_scale() -> DialSpec {
  DialSpec::new(0.5, 2.0, 0.05, 0.1, 1.0)
}

fn default_spectrum_shape() -> String {
  SpectrumShape::Gaussian.to_string()
}

fn default_pulse_limit() -> usize {
  100
}

fn default_sase_seed() -> u64 {
  4242
}

// --- Main Config Struct ---

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
  /// Ranges of every dial except a/b/c.
  #[serde(default = "default_dials")]
  pub dials: BTreeMap<DialKind, DialSpec>,

  /// Relative range of a/b/c; multiplied by the loaded cell's lengths.
  #[serde(default = "default_ucell_scale")]
  pub ucell_scale: DialSpec,

  /// "Gaussian", "SASE" or "monochromatic".
  #[serde(default = "default_spectrum_shape")]
  pub spectrum_shape: String,

  pub image_mode: ImageMode,
  pub experiment_mode: ExperimentMode,

  #[serde(default = "default_pulse_limit")]
  pub sase_pulse_limit: usize,

  #[serde(default = "default_sase_seed")]
  pub sase_seed: u64,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      dials: default_dials(),
      ucell_scale: default_ucell_scale(),
      spectrum_shape: default_spectrum_shape(),
      image_mode: ImageMode::Overlay,
      experiment_mode: ExperimentMode::Stills,
      sase_pulse_limit: default_pulse_limit(),
      sase_seed: default_sase_seed(),
    }
  }
}

impl Config {
  /// Loads config from standard OS location (e.g., ~/.config/simview/settings.json)
  pub fn load() -> (Self, String) {
    Self::load_from(&Self::get_path())
  }

  /// Saves config to standard OS location
  pub fn save(&self) -> String {
    self.save_to(&Self::get_path())
  }

  /// Falls back to defaults when the file is missing or unreadable.
  pub fn load_from(path: &Path) -> (Self, String) {
    if path.exists() {
      match Self::from_path(path) {
        Ok(cfg) => (cfg, format!("Config loaded from {:?}", path)),
        Err(e) => (Self::default(), format!("Error reading config: {}", e)),
      }
    } else {
      (
        Self::default(),
        "No config found. Using defaults.".to_string(),
      )
    }
  }

  pub fn save_to(&self, path: &Path) -> String {
    match self.to_path(path) {
      Ok(()) => format!("Config saved to {:?}", path),
      Err(e) => format!("Failed to save config: {}", e),
    }
  }

  pub fn from_path(path: &Path) -> Result<Self> {
    let reader = BufReader::new(File::open(path)?);
    let cfg: Self = serde_json::from_reader(reader)?;
    cfg.validate()?;
    Ok(cfg)
  }

  pub fn to_path(&self, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, self)?;
    Ok(())
  }

  /// Rejects tables the dial registry could not honour.
  pub fn validate(&self) -> Result<()> {
    self.spectrum()?;

    let table = self
      .dials
      .iter()
      .map(|(k, s)| (k.to_string(), s))
      .chain(std::iter::once(("ucell_scale".to_string(), &self.ucell_scale)));

    for (name, spec) in table {
      if spec.min > spec.max || !spec.contains(spec.default) {
        return Err(SimViewError::Config(format!(
          "{}: default {} outside [{}, {}]",
          name, spec.default, spec.min, spec.max
        )));
      }
      if spec.small_step <= 0.0 || spec.big_step <= 0.0 {
        return Err(SimViewError::Config(format!("{}: steps must be positive", name)));
      }
    }

    for kind in DialKind::ALL.iter().filter(|k| !k.is_cell_length()) {
      if !self.dials.contains_key(kind) {
        return Err(SimViewError::Config(format!("missing dial {}", kind)));
      }
    }
    Ok(())
  }

  /// Parsed initial spectrum shape; an unknown tag is a configuration error.
  pub fn spectrum(&self) -> Result<SpectrumShape> {
    self.spectrum_shape.parse()
  }

  /// Dial table without the unit-cell lengths.
  pub fn dial_specs(&self) -> Vec<(DialKind, DialSpec)> {
    self
      .dials
      .iter()
      .filter(|(k, _)| !k.is_cell_length())
      .map(|(k, s)| (*k, *s))
      .collect()
  }

  fn get_path() -> PathBuf {
    if let Some(proj) = ProjectDirs::from("org", "simview", "simview") {
      proj.config_dir().join("settings.json")
    } else {
      PathBuf::from("settings.json")
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_is_valid() {
    let cfg = Config::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.spectrum().unwrap(), SpectrumShape::Gaussian);
    assert_eq!(cfg.dial_specs().len(), DialKind::ALL.len() - 3);
  }

  #[test]
  fn test_unknown_spectrum_rejected() {
    let cfg = Config { spectrum_shape: "Lorentzian".to_string(), ..Config::default() };
    assert!(matches!(cfg.validate(), Err(SimViewError::UnknownSpectrumShape(_))));
  }

  #[test]
  fn test_unknown_dial_name_rejected() {
    let json = r#"{
      "dials": { "Wavelength": { "min": 0.0, "max": 1.0, "small_step": 0.1, "big_step": 0.5, "default": 0.5 } },
      "image_mode": "Overlay",
      "experiment_mode": "Stills"
    }"#;
    assert!(serde_json::from_str::<Config>(json).is_err());
  }

  #[test]
  fn test_bad_default_rejected() {
    let mut cfg = Config::default();
    cfg.dials.insert(DialKind::Energy, DialSpec::new(6500.0, 12000.0, 10.0, 30.0, 20000.0));
    assert!(matches!(cfg.validate(), Err(SimViewError::Config(_))));
  }

  #[test]
  fn test_load_status_messages() {
    let dir = std::env::temp_dir().join(format!("simview-load-{}", std::process::id()));
    let path = dir.join("settings.json");

    let (cfg, msg) = Config::load_from(&path);
    assert_eq!(msg, "No config found. Using defaults.");
    assert_eq!(cfg.experiment_mode, ExperimentMode::Stills);

    let saved = Config { image_mode: ImageMode::Greyscale, ..Config::default() };
    assert!(saved.save_to(&path).starts_with("Config saved to"));
    let (cfg, msg) = Config::load_from(&path);
    assert!(msg.starts_with("Config loaded from"));
    assert_eq!(cfg.image_mode, ImageMode::Greyscale);

    fs::write(&path, "{ not json").unwrap();
    let (cfg, msg) = Config::load_from(&path);
    assert!(msg.starts_with("Error reading config"));
    assert_eq!(cfg.image_mode, ImageMode::Overlay);

    let _ = fs::remove_dir_all(&dir);
  }

  #[test]
  fn test_file_round_trip() {
    let path = std::env::temp_dir().join(format!("simview-config-{}.json", std::process::id()));
    let mut cfg = Config::default();
    cfg.experiment_mode = ExperimentMode::Rotation;
    cfg.to_path(&path).unwrap();

    let back = Config::from_path(&path).unwrap();
    assert_eq!(back.experiment_mode, ExperimentMode::Rotation);
    assert_eq!(back.dials.len(), cfg.dials.len());
    assert!((back.dials[&DialKind::Energy].default - 9500.0).abs() < 1e-9);
    let _ = fs::remove_file(&path);
  }
}
