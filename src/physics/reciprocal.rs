// src/physics/reciprocal.rs
use nalgebra::{Matrix3, Vector3};

use crate::error::{Result, SimViewError};
use crate::model::amplitudes::{AmplitudeTable, Hkl};
use crate::physics::detector::DetectorGeometry;
use crate::utils::linalg;

/// Orientation snapshot a pixel query is resolved against.
#[derive(Debug, Clone, Copy)]
pub struct OrientationQuery {
    /// Missetting angles about lab X, Y, Z in degrees.
    pub missetting_deg: [f64; 3],
    /// Crystal orientation matrix.
    pub u: Matrix3<f64>,
    /// Reciprocal orthogonalization matrix of the current cell.
    pub b: Matrix3<f64>,
    /// Å
    pub wavelength: f64,
    pub structure_factors: bool,
}

/// What sits under the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MillerReadout {
    pub hkl_frac: [f64; 3],
    pub hkl: Hkl,
    /// ‖hkl_frac − hkl‖, 0 on an exact Bragg condition.
    pub distance: f64,
    pub amplitude: f64,
}

/// Maps detector pixels to Miller indices. Read-only; safe to call on every
/// pointer motion.
#[derive(Debug, Clone)]
pub struct ReciprocalResolver {
    geometry: DetectorGeometry,
    amplitudes: AmplitudeTable,
}

impl ReciprocalResolver {
    pub fn new(geometry: DetectorGeometry, amplitudes: AmplitudeTable) -> Self {
        Self { geometry, amplitudes }
    }

    pub fn geometry(&self) -> &DetectorGeometry {
        &self.geometry
    }

    /// Resolves pixel (`fast`, `slow`).
    ///
    /// 1. M = Rz·Ry·Rx from the missetting angles
    /// 2. A = (M·U)·B, inverted
    /// 3. q = (s − s0) / λ for the scattered direction s of the pixel
    /// 4. hkl_f = A⁻¹·q, hkl = ceil(hkl_f − ½)
    /// 5. |F| from the table, or the flat default when structure factors are off
    pub fn resolve(&self, fast: f64, slow: f64, query: &OrientationQuery) -> Result<MillerReadout> {
        let [rx, ry, rz] = query.missetting_deg;
        let m = linalg::missetting_rotation(rx, ry, rz);
        let a = (m * query.u) * query.b;
        let a_inv = a.try_inverse().ok_or(SimViewError::SingularOrientation)?;

        let s = self
            .geometry
            .scattered_direction(fast, slow)
            .ok_or(SimViewError::SingularOrientation)?;
        let s0 = self.geometry.beam_direction().ok_or(SimViewError::SingularOrientation)?;
        let q: Vector3<f64> = (s - s0) / query.wavelength;

        let hkl_f = a_inv * q;
        let nearest = hkl_f.map(|x| (x - 0.5).ceil());
        let distance = (hkl_f - nearest).norm();
        let hkl = (nearest.x as i32, nearest.y as i32, nearest.z as i32);

        let amplitude = if query.structure_factors {
            self.amplitudes.lookup(hkl)
        } else {
            self.amplitudes.flat_default()
        };

        Ok(MillerReadout {
            hkl_frac: [hkl_f.x, hkl_f.y, hkl_f.z],
            hkl,
            distance,
            amplitude,
        })
    }
}
