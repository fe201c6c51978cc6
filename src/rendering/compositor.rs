// src/rendering/compositor.rs
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::rendering::image::{DetectorImage, ImageSet};

/// Floor for the normalization threshold so an all-zero image stays finite.
pub const NORMALIZATION_EPSILON: f64 = 1e-50;

/// Brightness dial → clip percentile.
///
/// # Formula
/// ```text
/// percentile = 100 − 10^(2·brightness − 2)
/// ```
/// brightness 0 → 99.99, 0.5 → 99.9, 1 → 99, 2 → 0.
pub fn brightness_to_percentile(brightness: f64) -> f64 {
    100.0 - 10f64.powf(2.0 * brightness - 2.0)
}

/// Linear-interpolated percentile (`p` in [0, 100]); 0 for empty data.
pub fn percentile(data: &[f64], p: f64) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut sorted = data.to_vec();
    sorted.par_sort_unstable_by(|a, b| a.total_cmp(b));

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Scales so the `p`-th percentile maps to 1, then clips at 1.
pub fn normalize(data: &[f64], p: f64) -> Vec<f64> {
    let scale = 1.0 / percentile(data, p).max(NORMALIZATION_EPSILON);
    data.par_iter()
        .map(|v| {
            let scaled = v * scale;
            if scaled > 1.0 { 1.0 } else { scaled }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageMode {
    /// Reference in red, reference + simulated in green, simulated in blue.
    Overlay,
    /// Simulated only, in green and blue.
    Tint,
    /// Simulated only, single channel.
    Greyscale,
}

impl ImageMode {
    pub fn next(self) -> Self {
        match self {
            ImageMode::Overlay => ImageMode::Tint,
            ImageMode::Tint => ImageMode::Greyscale,
            ImageMode::Greyscale => ImageMode::Overlay,
        }
    }
}

/// What the viewer paints. Channel values are in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub enum Displayable {
    Rgb { width: usize, height: usize, pixels: Vec<[f64; 3]> },
    Gray { width: usize, height: usize, pixels: Vec<f64> },
}

impl Displayable {
    pub fn dimensions(&self) -> (usize, usize) {
        match self {
            Displayable::Rgb { width, height, .. } | Displayable::Gray { width, height, .. } => {
                (*width, *height)
            }
        }
    }
}

/// Builds displayable images from the reference/simulated pair.
///
/// The normalized reference channel is cached: it is only recomputed when the
/// caller passes a new reference or the brightness changes.
#[derive(Debug, Clone)]
pub struct Compositor {
    mode: ImageMode,
    percentile: f64,
    reference_channel: Vec<f64>,
}

impl Compositor {
    pub fn new(mode: ImageMode, brightness: f64) -> Self {
        Self { mode, percentile: brightness_to_percentile(brightness), reference_channel: Vec::new() }
    }

    pub fn mode(&self) -> ImageMode {
        self.mode
    }

    pub fn percentile(&self) -> f64 {
        self.percentile
    }

    pub fn cycle_mode(&mut self) -> ImageMode {
        self.mode = self.mode.next();
        self.mode
    }

    /// New percentile from the brightness dial; renormalizes the reference channel.
    pub fn set_brightness(&mut self, brightness: f64, reference: &DetectorImage) {
        self.percentile = brightness_to_percentile(brightness);
        log::debug!("Brightness {:.2} -> percentile {:.4}", brightness, self.percentile);
        self.refresh_reference(reference);
    }

    pub fn refresh_reference(&mut self, reference: &DetectorImage) {
        self.reference_channel = normalize(reference.as_slice(), self.percentile);
    }

    pub fn composite(&self, images: &ImageSet) -> Displayable {
        let width = images.simulated.width();
        let height = images.simulated.height();
        let sim = normalize(images.simulated.as_slice(), self.percentile);

        match self.mode {
            ImageMode::Overlay => {
                let both = normalize(&images.simulated.sum(&images.reference), self.percentile);
                let pixels = self
                    .reference_channel
                    .par_iter()
                    .zip(both.par_iter())
                    .zip(sim.par_iter())
                    .map(|((r, g), b)| [*r, *g, *b])
                    .collect();
                Displayable::Rgb { width, height, pixels }
            }
            ImageMode::Tint => {
                let pixels = sim.par_iter().map(|v| [0.0, *v, *v]).collect();
                Displayable::Rgb { width, height, pixels }
            }
            ImageMode::Greyscale => Displayable::Gray { width, height, pixels: sim },
        }
    }
}
