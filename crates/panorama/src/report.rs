use panorama_core::{BoundingBox, Homography, StitchResult};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TimingsMs {
    pub load_images: u64,
    pub stitch: u64,
    pub save: u64,
    pub total: u64,
}

/// Serializable summary of one stitch.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StitchReport {
    pub h_im2_from_im1: Homography,
    pub translation: Homography,
    pub bbox_im1: BoundingBox,
    pub bbox_im2: BoundingBox,
    pub union: BoundingBox,
    pub output_width: usize,
    pub output_height: usize,
    pub channels: usize,
    #[serde(default)]
    pub timings_ms: TimingsMs,
}

impl StitchReport {
    pub fn from_result(res: &StitchResult, timings_ms: TimingsMs) -> Self {
        Self {
            h_im2_from_im1: res.h_im2_from_im1,
            translation: res.translation,
            bbox_im1: res.bbox_im1,
            bbox_im2: res.bbox_im2,
            union: res.union,
            output_width: res.panorama.width,
            output_height: res.panorama.height,
            channels: res.panorama.channels,
            timings_ms,
        }
    }

    /// A footprint box moved into canvas coordinates.
    pub fn to_canvas(&self, b: BoundingBox) -> BoundingBox {
        BoundingBox::new(
            b.min_x - self.union.min_x,
            b.min_y - self.union.min_y,
            b.max_x - self.union.min_x,
            b.max_y - self.union.min_y,
        )
    }
}
