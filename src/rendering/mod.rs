pub mod compositor;
pub mod image;

// Re-export specific items to keep the API clean for the rest of the crate
pub use compositor::{brightness_to_percentile, normalize, percentile, Compositor, Displayable, ImageMode};
pub use image::{DetectorImage, ImageSet};
