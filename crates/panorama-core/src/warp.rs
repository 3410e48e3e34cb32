//! Inverse-mapping warps of an [`Image`] through a [`Homography`].
//!
//! Every destination pixel `(x, y)` is mapped back with `H^-1` and sampled
//! from the source only when the result lies in `[0, width) x [0, height)`.
//! All other destination pixels are left as they were, which is what makes
//! compositing several warps onto one canvas work.
//!
//! With the `rayon` feature rows are processed in parallel. Each row is
//! written by exactly one task, so the output does not depend on scheduling.

use std::ops::Range;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::bbox::transformed_bbox;
use crate::image::{sample_bilinear, sample_nearest};
use crate::{Homography, Image};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Sampling method used when reading the source image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Round to the nearest source pixel.
    Nearest,
    /// Weighted average of the four surrounding pixels.
    #[default]
    Bilinear,
}

impl Interpolation {
    pub fn from_bilinear(bilinear: bool) -> Self {
        if bilinear {
            Interpolation::Bilinear
        } else {
            Interpolation::Nearest
        }
    }

    #[inline]
    fn sample(self, src: &Image, x: f64, y: f64, c: usize) -> f32 {
        match self {
            Interpolation::Nearest => sample_nearest(src, x, y, c),
            Interpolation::Bilinear => sample_bilinear(src, x, y, c),
        }
    }
}

/// Errors detected before a warp writes anything.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum WarpError {
    #[error("homography is not invertible")]
    NonInvertible,
    #[error("channel count mismatch (source has {src_channels}, destination has {dst_channels})")]
    ChannelMismatch {
        src_channels: usize,
        dst_channels: usize,
    },
}

fn inverse_for_warp(source: &Image, h: &Homography, out: &Image) -> Result<Homography, WarpError> {
    if source.channels != out.channels {
        return Err(WarpError::ChannelMismatch {
            src_channels: source.channels,
            dst_channels: out.channels,
        });
    }
    h.inverse().ok_or(WarpError::NonInvertible)
}

#[inline]
fn warp_row(
    source: &Image,
    h_inv: &Homography,
    y: usize,
    row: &mut [f32],
    xs: Range<usize>,
    interpolation: Interpolation,
) {
    let channels = source.channels;
    let (w, h) = (source.width as f64, source.height as f64);

    for x in xs {
        let v = h_inv.apply_homogeneous(Vector3::new(x as f64, y as f64, 1.0));
        let sx = v[0] / v[2];
        let sy = v[1] / v[2];

        // half-open source range; NaN falls through as out of range
        if !(sx >= 0.0 && sx < w && sy >= 0.0 && sy < h) {
            continue;
        }

        let px = &mut row[x * channels..(x + 1) * channels];
        for (c, slot) in px.iter_mut().enumerate() {
            *slot = interpolation.sample(source, sx, sy, c);
        }
    }
}

fn warp_region(
    source: &Image,
    h_inv: &Homography,
    out: &mut Image,
    xs: Range<usize>,
    ys: Range<usize>,
    interpolation: Interpolation,
) {
    let stride = out.row_stride();
    if stride == 0 || xs.is_empty() || ys.is_empty() {
        return;
    }

    let y0 = ys.start;
    let rows = &mut out.data[ys.start * stride..ys.end * stride];

    #[cfg(feature = "rayon")]
    rows.par_chunks_mut(stride)
        .enumerate()
        .for_each(|(i, row)| warp_row(source, h_inv, y0 + i, row, xs.clone(), interpolation));

    #[cfg(not(feature = "rayon"))]
    rows.chunks_mut(stride)
        .enumerate()
        .for_each(|(i, row)| warp_row(source, h_inv, y0 + i, row, xs.clone(), interpolation));
}

/// Resample `source` into `out` through the forward map `h` (source to
/// destination), scanning every destination pixel.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        level = "debug",
        skip(source, h, out),
        fields(src_w = source.width, src_h = source.height, dst_w = out.width, dst_h = out.height)
    )
)]
pub fn apply_homography(
    source: &Image,
    h: &Homography,
    out: &mut Image,
    interpolation: Interpolation,
) -> Result<(), WarpError> {
    let h_inv = inverse_for_warp(source, h, out)?;
    let (w, ht) = (out.width, out.height);
    warp_region(source, &h_inv, out, 0..w, 0..ht, interpolation);
    Ok(())
}

/// Same result as [`apply_homography`], but only the destination pixels
/// inside the forward-projected bounding box of the source (padded by one
/// pixel, clipped to `out`) are visited. Nothing outside that box is touched.
///
/// Falls back to the full scan when the source footprint is unbounded.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        level = "debug",
        skip(source, h, out),
        fields(src_w = source.width, src_h = source.height, dst_w = out.width, dst_h = out.height)
    )
)]
pub fn apply_homography_fast(
    source: &Image,
    h: &Homography,
    out: &mut Image,
    interpolation: Interpolation,
) -> Result<(), WarpError> {
    let h_inv = inverse_for_warp(source, h, out)?;

    let Some(bbox) = transformed_bbox(source.width, source.height, h) else {
        log::warn!("source footprint is unbounded under H, falling back to a full scan");
        let (w, ht) = (out.width, out.height);
        warp_region(source, &h_inv, out, 0..w, 0..ht, interpolation);
        return Ok(());
    };

    let clip = |lo: i64, hi: i64, len: usize| -> Range<usize> {
        let lo = (lo - 1).clamp(0, len as i64) as usize;
        let hi = (hi + 1).clamp(0, len as i64) as usize;
        lo..hi.max(lo)
    };
    let xs = clip(bbox.min_x, bbox.max_x, out.width);
    let ys = clip(bbox.min_y, bbox.max_y, out.height);
    log::debug!(
        "fast warp region x={:?} y={:?} (bbox {:?})",
        xs,
        ys,
        bbox
    );

    warp_region(source, &h_inv, out, xs, ys, interpolation);
    Ok(())
}
