// src/model/amplitudes.rs
use num_complex::Complex64;
use std::cmp::Ordering;
use std::collections::HashMap;

pub type Hkl = (i32, i32, i32);

/// Structure-factor magnitudes keyed by Miller index. Built once at load time.
#[derive(Debug, Clone, Default)]
pub struct AmplitudeTable {
    amplitudes: HashMap<Hkl, f64>,
    flat_default: f64,
}

impl AmplitudeTable {
    /// From complex structure factors; only |F| is kept.
    pub fn from_structure_factors(factors: impl IntoIterator<Item = (Hkl, Complex64)>) -> Self {
        Self::from_amplitudes(factors.into_iter().map(|(hkl, f)| (hkl, f.norm())))
    }

    pub fn from_amplitudes(amplitudes: impl IntoIterator<Item = (Hkl, f64)>) -> Self {
        let amplitudes: HashMap<Hkl, f64> = amplitudes.into_iter().collect();
        let flat_default = median(amplitudes.values().copied().collect());
        Self { amplitudes, flat_default }
    }

    /// |F| at `hkl`, 0 for indices absent from the table.
    pub fn lookup(&self, hkl: Hkl) -> f64 {
        self.amplitudes.get(&hkl).copied().unwrap_or(0.0)
    }

    /// Amplitude reported for every index when structure factors are off.
    pub fn flat_default(&self) -> f64 {
        self.flat_default
    }
}

fn median(mut values: Vec<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        0.5 * (values[mid - 1] + values[mid])
    } else {
        values[mid]
    }
}
