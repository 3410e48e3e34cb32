//! Planar homographies and two-view stitching.
//!
//! The crate is purely geometric: it has no file I/O and works on the
//! in-memory [`Image`] type. The pipeline is
//!
//! 1. [`compute_homography`]: 4 correspondences to a 3x3 projective map,
//! 2. [`transformed_bbox`], [`bbox_union`], [`make_translation`]: canvas sizing,
//! 3. [`apply_homography`] / [`apply_homography_fast`]: inverse-mapping warps,
//! 4. [`stitch`]: the composition of the above.
//!
//! ```
//! use panorama_core::{stitch, CorrespondencePair, Image};
//!
//! let left = Image::filled(40, 30, 3, 0.25);
//! let right = Image::filled(40, 30, 3, 0.75);
//! // `left` overlaps `right` by 10 columns
//! let pairs = [(0.0, 0.0), (40.0, 0.0), (40.0, 30.0), (0.0, 30.0)]
//!     .map(|(x, y)| CorrespondencePair::from_coords(x, y, x - 30.0, y));
//!
//! let pano = stitch(&left, &right, &pairs).expect("stitch");
//! assert_eq!((pano.width, pano.height), (70, 30));
//! ```

mod bbox;
mod draw;
mod homography;
mod image;
mod logger;
mod stitch;
mod warp;

pub use bbox::{bbox_union, make_translation, transformed_bbox, BoundingBox, COORD_LIMIT};
pub use draw::draw_bounding_box;
pub use homography::{
    compute_homography, compute_homography_from_slice, CorrespondencePair, Homography,
    HomographyError,
};
pub use image::{sample_bilinear, sample_nearest, Image, ImageError};
pub use stitch::{stitch, stitch_detailed, stitch_with, StitchError, StitchParams, StitchResult};
pub use warp::{apply_homography, apply_homography_fast, Interpolation, WarpError};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
