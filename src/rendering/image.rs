// src/rendering/image.rs
use crate::error::{Result, SimViewError};
use crate::physics::detector::PixelAddress;

/// Intensities of a multi-panel detector stitched into one 2-D image:
/// panels are stacked along the slow axis.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorImage {
    panels: usize,
    slow: usize,
    fast: usize,
    data: Vec<f64>,
}

impl DetectorImage {
    pub fn zeros(panels: usize, slow: usize, fast: usize) -> Self {
        Self { panels, slow, fast, data: vec![0.0; panels * slow * fast] }
    }

    pub fn width(&self) -> usize {
        self.fast
    }

    pub fn height(&self) -> usize {
        self.panels * self.slow
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    fn offset(&self, addr: &PixelAddress) -> Option<usize> {
        if addr.panel < self.panels && addr.slow < self.slow && addr.fast < self.fast {
            Some((addr.panel * self.slow + addr.slow) * self.fast + addr.fast)
        } else {
            None
        }
    }

    pub fn get(&self, addr: &PixelAddress) -> Option<f64> {
        self.offset(addr).map(|i| self.data[i])
    }

    /// Writes `values[i]` at `pixels[i]`. Nothing is written unless both
    /// lists agree in length; addresses outside the image are skipped.
    pub fn scatter(&mut self, pixels: &[PixelAddress], values: &[f64]) -> Result<()> {
        if pixels.len() != values.len() {
            return Err(SimViewError::PixelCountMismatch { expected: pixels.len(), got: values.len() });
        }
        for (addr, v) in pixels.iter().zip(values) {
            if let Some(i) = self.offset(addr) {
                self.data[i] = *v;
            }
        }
        Ok(())
    }

    /// Element-wise sum; both images must have the same shape.
    pub fn sum(&self, other: &DetectorImage) -> Vec<f64> {
        self.data.iter().zip(&other.data).map(|(a, b)| a + b).collect()
    }
}

/// The stable comparison image and the live one.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSet {
    pub reference: DetectorImage,
    pub simulated: DetectorImage,
}

impl ImageSet {
    pub fn new(panels: usize, slow: usize, fast: usize) -> Self {
        Self {
            reference: DetectorImage::zeros(panels, slow, fast),
            simulated: DetectorImage::zeros(panels, slow, fast),
        }
    }

    /// Stores a fresh simulation; the reference only changes when `update_ref`.
    pub fn store(&mut self, pixels: &[PixelAddress], values: &[f64], update_ref: bool) -> Result<()> {
        self.simulated.scatter(pixels, values)?;
        if update_ref {
            self.reference.scatter(pixels, values)?;
        }
        Ok(())
    }
}
