// src/physics/detector.rs
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::utils::linalg;

/// One entry of the flattened (panel, slow, fast) pixel address list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelAddress {
    pub panel: usize,
    pub slow: usize,
    pub fast: usize,
}

/// Every pixel of a `panels × slow × fast` detector, panel-major then row-major.
pub fn full_image_addresses(panels: usize, slow: usize, fast: usize) -> Vec<PixelAddress> {
    let mut out = Vec::with_capacity(panels * slow * fast);
    for panel in 0..panels {
        for s in 0..slow {
            for f in 0..fast {
                out.push(PixelAddress { panel, slow: s, fast: f });
            }
        }
    }
    out
}

/// Flat-panel detector in the lab frame. Distances in mm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorGeometry {
    pub fast_size: usize,
    pub slow_size: usize,
    pub pixel_size: f64,
    /// Lab position of pixel (0, 0).
    pub origin: [f64; 3],
    pub fast_axis: [f64; 3],
    pub slow_axis: [f64; 3],
    /// Unit vector along the incident beam.
    pub s0: [f64; 3],
}

impl DetectorGeometry {
    /// Lab-frame position (mm) of a possibly fractional pixel coordinate.
    pub fn lab_position(&self, fast: f64, slow: f64) -> Vector3<f64> {
        Vector3::from(self.origin)
            + Vector3::from(self.fast_axis) * (fast * self.pixel_size)
            + Vector3::from(self.slow_axis) * (slow * self.pixel_size)
    }

    /// Unit scattering direction from the sample (at the lab origin) to a pixel.
    pub fn scattered_direction(&self, fast: f64, slow: f64) -> Option<Vector3<f64>> {
        linalg::unit(self.lab_position(fast, slow))
    }

    pub fn beam_direction(&self) -> Option<Vector3<f64>> {
        linalg::unit(Vector3::from(self.s0))
    }
}

impl Default for DetectorGeometry {
    /// A 100 mm camera looking down the beam, 1024 × 1024 pixels of 0.1 mm,
    /// beam centre offset towards one corner.
    fn default() -> Self {
        Self {
            fast_size: 1024,
            slow_size: 1024,
            pixel_size: 0.1,
            origin: [-20.0, 24.0, -100.0],
            fast_axis: [1.0, 0.0, 0.0],
            slow_axis: [0.0, -1.0, 0.0],
            s0: [0.0, 0.0, -1.0],
        }
    }
}
