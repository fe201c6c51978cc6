// src/utils/linalg.rs

use nalgebra::{Matrix3, Vector3};

/// Real-space lattice matrix from cell parameters (lengths in Å, angles in degrees).
///
/// Columns are the lattice vectors a, b, c with a along x and b in the xy plane.
///
/// # Formula
/// ```text
/// a = (a, 0, 0)
/// b = (b cosγ, b sinγ, 0)
/// c = (c cosβ, c (cosα - cosβ cosγ) / sinγ, V / (a b sinγ))
/// ```
pub fn lattice_matrix(lengths: [f64; 3], angles_deg: [f64; 3]) -> Matrix3<f64> {
  let [a, b, c] = lengths;
  let (ca, cb, cg) = (
    angles_deg[0].to_radians().cos(),
    angles_deg[1].to_radians().cos(),
    angles_deg[2].to_radians().cos(),
  );
  let sg = angles_deg[2].to_radians().sin();

  let cy = c * (ca - cb * cg) / sg;
  let cz = (c * c - (c * cb).powi(2) - cy * cy).max(0.0).sqrt();

  Matrix3::new(
    a, b * cg, c * cb,
    0.0, b * sg, cy,
    0.0, 0.0, cz,
  )
}

/// Reciprocal-space orthogonalization matrix B, so that `B * hkl` is the
/// reciprocal lattice vector in Å⁻¹ (crystallographic convention, no 2π).
///
/// Returns `None` for a degenerate cell.
///
/// # Formula
/// ```text
/// B = (L⁻¹)ᵀ
/// ```
pub fn reciprocal_matrix(lengths: [f64; 3], angles_deg: [f64; 3]) -> Option<Matrix3<f64>> {
  let lattice = lattice_matrix(lengths, angles_deg);
  lattice.try_inverse().map(|inv| inv.transpose())
}

/// Elemental rotation about the lab x axis.
pub fn rotation_x(deg: f64) -> Matrix3<f64> {
  let (s, c) = deg.to_radians().sin_cos();
  Matrix3::new(
    1.0, 0.0, 0.0,
    0.0, c, -s,
    0.0, s, c,
  )
}

/// Elemental rotation about the lab y axis.
pub fn rotation_y(deg: f64) -> Matrix3<f64> {
  let (s, c) = deg.to_radians().sin_cos();
  Matrix3::new(
    c, 0.0, s,
    0.0, 1.0, 0.0,
    -s, 0.0, c,
  )
}

/// Elemental rotation about the lab z (beam) axis.
pub fn rotation_z(deg: f64) -> Matrix3<f64> {
  let (s, c) = deg.to_radians().sin_cos();
  Matrix3::new(
    c, -s, 0.0,
    s, c, 0.0,
    0.0, 0.0, 1.0,
  )
}

/// Missetting rotation: X is applied first, then Y, then Z.
///
/// # Formula
/// ```text
/// M = Rz(z) × Ry(y) × Rx(x)
/// ```
pub fn missetting_rotation(x_deg: f64, y_deg: f64, z_deg: f64) -> Matrix3<f64> {
  rotation_z(z_deg) * rotation_y(y_deg) * rotation_x(x_deg)
}

/// Unit vector along `v`, or `None` for a zero vector.
pub fn unit(v: Vector3<f64>) -> Option<Vector3<f64>> {
  let n = v.norm();
  if n < 1e-12 {
    None
  } else {
    Some(v / n)
  }
}
