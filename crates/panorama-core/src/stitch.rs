use serde::{Deserialize, Serialize};

use crate::bbox::{bbox_union, make_translation, transformed_bbox, BoundingBox};
use crate::homography::{compute_homography, CorrespondencePair, HomographyError};
use crate::warp::{apply_homography, apply_homography_fast, Interpolation, WarpError};
use crate::{Homography, Image};

/// Errors returned by the stitcher.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StitchError {
    #[error(transparent)]
    Homography(#[from] HomographyError),
    #[error(transparent)]
    Warp(#[from] WarpError),
    #[error("images have different channel counts ({im1} vs {im2})")]
    ChannelMismatch { im1: usize, im2: usize },
    #[error("the first image does not have a bounded footprint under the estimated homography")]
    UnboundedFootprint,
    #[error("output canvas {width}x{height} exceeds the configured pixel limit")]
    CanvasTooLarge { width: usize, height: usize },
}

/// Configuration for [`stitch_with`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StitchParams {
    /// Sampling method for both warps.
    pub interpolation: Interpolation,
    /// Restrict each warp to the projected footprint of its source.
    pub fast: bool,
    /// Upper bound on `width * height` of the output canvas.
    pub max_output_pixels: usize,
}

impl Default for StitchParams {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::Bilinear,
            fast: true,
            max_output_pixels: 64 * 1024 * 1024,
        }
    }
}

/// A stitched panorama together with the geometry that produced it.
#[derive(Clone, Debug)]
pub struct StitchResult {
    pub panorama: Image,
    /// Maps `im1` pixels into the frame of `im2`.
    pub h_im2_from_im1: Homography,
    /// Maps the frame of `im2` onto the output canvas.
    pub translation: Homography,
    /// Footprint of `im1` in the frame of `im2`.
    pub bbox_im1: BoundingBox,
    pub bbox_im2: BoundingBox,
    /// Union of both footprints; its size is the canvas size.
    pub union: BoundingBox,
}

/// Stitch `im1` onto `im2` with [`StitchParams::default`].
pub fn stitch(
    im1: &Image,
    im2: &Image,
    correspondences: &[CorrespondencePair; 4],
) -> Result<Image, StitchError> {
    stitch_with(im1, im2, correspondences, &StitchParams::default())
}

pub fn stitch_with(
    im1: &Image,
    im2: &Image,
    correspondences: &[CorrespondencePair; 4],
    params: &StitchParams,
) -> Result<Image, StitchError> {
    stitch_detailed(im1, im2, correspondences, params).map(|r| r.panorama)
}

/// Warp `im1` into the frame of `im2` and composite both onto one canvas.
///
/// `correspondences[k].point1` lies in `im1`, `point2` in `im2`. The canvas
/// is the union of both footprints, shifted so its top-left is the origin.
/// `im2` is drawn first and `im1` second, so `im1` wins in the overlap.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        level = "info",
        skip_all,
        fields(im1_w = im1.width, im1_h = im1.height, im2_w = im2.width, im2_h = im2.height)
    )
)]
pub fn stitch_detailed(
    im1: &Image,
    im2: &Image,
    correspondences: &[CorrespondencePair; 4],
    params: &StitchParams,
) -> Result<StitchResult, StitchError> {
    if im1.channels != im2.channels {
        return Err(StitchError::ChannelMismatch {
            im1: im1.channels,
            im2: im2.channels,
        });
    }

    let h = compute_homography(correspondences)?;

    let bbox_im1 =
        transformed_bbox(im1.width, im1.height, &h).ok_or(StitchError::UnboundedFootprint)?;
    let bbox_im2 = BoundingBox::from_size(im2.width, im2.height);
    let union = bbox_union(bbox_im1, bbox_im2);
    let translation = make_translation(union);
    log::debug!(
        "stitch boxes: im1 {:?}, im2 {:?}, union {:?}",
        bbox_im1,
        bbox_im2,
        union
    );

    let (width, height) = (union.width(), union.height());
    if width.saturating_mul(height) > params.max_output_pixels {
        return Err(StitchError::CanvasTooLarge { width, height });
    }

    let mut panorama = Image::new(width, height, im1.channels);
    let warp: fn(&Image, &Homography, &mut Image, Interpolation) -> Result<(), WarpError> =
        if params.fast {
            apply_homography_fast
        } else {
            apply_homography
        };
    warp(im2, &translation, &mut panorama, params.interpolation)?;
    warp(im1, &(translation * h), &mut panorama, params.interpolation)?;

    log::info!(
        "stitched {}x{} + {}x{} into {}x{} canvas",
        im1.width,
        im1.height,
        im2.width,
        im2.height,
        width,
        height
    );

    Ok(StitchResult {
        panorama,
        h_im2_from_im1: h,
        translation,
        bbox_im1,
        bbox_im2,
        union,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    fn square_pairs(dx: f64, dy: f64) -> [CorrespondencePair; 4] {
        [(0.0, 0.0), (8.0, 0.0), (8.0, 6.0), (0.0, 6.0)]
            .map(|(x, y)| CorrespondencePair::from_coords(x, y, x + dx, y + dy))
    }

    #[test]
    fn pure_shift_places_both_images() {
        let im1 = Image::filled(10, 8, 1, 1.0);
        let im2 = Image::filled(12, 8, 1, 0.5);

        // im1 sits 6 px to the left and 2 px above im2
        let res = stitch_detailed(&im1, &im2, &square_pairs(-6.0, -2.0), &StitchParams::default())
            .expect("stitch");

        assert_eq!(res.bbox_im1, BoundingBox::new(-6, -2, 4, 6));
        assert_eq!(res.union, BoundingBox::new(-6, -2, 12, 8));
        assert_eq!((res.panorama.width, res.panorama.height), (18, 10));

        let p = &res.panorama;
        // im1 area (drawn last)
        assert_eq!(p[(1, 1, 0)], 1.0);
        assert_eq!(p[(9, 7, 0)], 1.0);
        // im2 only
        assert_eq!(p[(15, 5, 0)], 0.5);
        // covered by neither
        assert_eq!(p[(17, 0, 0)], 0.0);
        assert_eq!(p[(0, 9, 0)], 0.0);
    }

    #[test]
    fn output_size_matches_union_box() {
        let im1 = Image::filled(40, 30, 3, 0.2);
        let im2 = Image::filled(50, 35, 3, 0.8);
        let pairs = [
            CorrespondencePair::from_coords(0.0, 0.0, 20.0, 5.0),
            CorrespondencePair::from_coords(40.0, 0.0, 62.0, 2.0),
            CorrespondencePair::from_coords(40.0, 30.0, 61.0, 36.0),
            CorrespondencePair::from_coords(0.0, 30.0, 21.0, 33.0),
        ];

        let res = stitch_detailed(&im1, &im2, &pairs, &StitchParams::default()).expect("stitch");
        let expected = bbox_union(
            transformed_bbox(40, 30, &res.h_im2_from_im1).expect("bounded"),
            BoundingBox::from_size(50, 35),
        );
        assert_eq!(res.union, expected);
        assert_eq!(res.panorama.width, expected.width());
        assert_eq!(res.panorama.height, expected.height());
        assert_eq!(res.panorama.channels, 3);

        // im2's origin lands at -union.min in the canvas
        let o = res.translation.apply(Point2::new(0.0, 0.0));
        assert_eq!((o.x, o.y), (-expected.min_x as f64, -expected.min_y as f64));
    }

    #[test]
    fn fast_and_full_stitch_agree() {
        let im1 = Image::from_fn(24, 18, 1, |x, y, _| ((x + 2 * y) % 5) as f32 / 4.0);
        let im2 = Image::from_fn(24, 18, 1, |x, y, _| ((3 * x + y) % 7) as f32 / 6.0);
        let pairs = [
            CorrespondencePair::from_coords(0.0, 0.0, 10.0, 3.0),
            CorrespondencePair::from_coords(24.0, 0.0, 33.0, 1.0),
            CorrespondencePair::from_coords(24.0, 18.0, 35.0, 20.0),
            CorrespondencePair::from_coords(0.0, 18.0, 9.0, 19.0),
        ];
        for interpolation in [Interpolation::Nearest, Interpolation::Bilinear] {
            let fast = StitchParams {
                interpolation,
                fast: true,
                ..StitchParams::default()
            };
            let full = StitchParams {
                fast: false,
                ..fast.clone()
            };
            assert_eq!(
                stitch_with(&im1, &im2, &pairs, &fast).expect("fast"),
                stitch_with(&im1, &im2, &pairs, &full).expect("full")
            );
        }
    }

    #[test]
    fn degenerate_correspondences_fail() {
        let im = Image::new(8, 8, 1);
        let mut pairs = square_pairs(1.0, 1.0);
        pairs[1] = pairs[0];
        assert!(matches!(
            stitch(&im, &im, &pairs),
            Err(StitchError::Homography(HomographyError::Degenerate { .. }))
        ));
    }

    #[test]
    fn billions_wide_footprint_is_rejected_by_size() {
        let im = Image::new(2, 2, 1);
        let pairs = [
            CorrespondencePair::from_coords(0.0, 0.0, -2e9, 0.0),
            CorrespondencePair::from_coords(2.0, 0.0, 2e9, 0.0),
            CorrespondencePair::from_coords(2.0, 2.0, 2e9, 1e6),
            CorrespondencePair::from_coords(0.0, 2.0, -2e9, 1e6),
        ];
        match stitch(&im, &im, &pairs) {
            Err(StitchError::CanvasTooLarge { width, height }) => {
                assert!((4_000_000_000..=4_000_000_002).contains(&width), "{width}");
                assert!((1_000_000..=1_000_002).contains(&height), "{height}");
            }
            other => panic!("expected CanvasTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn channel_mismatch_fails_before_solving() {
        let im1 = Image::new(8, 8, 1);
        let im2 = Image::new(8, 8, 3);
        assert_eq!(
            stitch(&im1, &im2, &square_pairs(0.0, 0.0)),
            Err(StitchError::ChannelMismatch { im1: 1, im2: 3 })
        );
    }

    #[test]
    fn oversized_canvas_is_rejected() {
        let im = Image::new(8, 8, 1);
        let params = StitchParams {
            max_output_pixels: 100,
            ..StitchParams::default()
        };
        assert_eq!(
            stitch_with(&im, &im, &square_pairs(20.0, 0.0), &params),
            Err(StitchError::CanvasTooLarge {
                width: 28,
                height: 8
            })
        );
    }

    #[test]
    fn params_deserialize_with_defaults() {
        let p: StitchParams = serde_json::from_str(r#"{"interpolation": "nearest"}"#).expect("json");
        assert_eq!(p.interpolation, Interpolation::Nearest);
        assert!(p.fast);
        assert_eq!(p.max_output_pixels, StitchParams::default().max_output_pixels);
    }
}
