//! Debug overlays.

use crate::{BoundingBox, Image};

/// Return a copy of `im` with the outline of `bbox` drawn one pixel wide.
///
/// The right/bottom edges are drawn at `max - 1` (the last pixel inside the
/// half-open box). Parts outside the image are clipped. `color` holds one
/// value per channel; channels it does not cover are drawn as `1.0`.
pub fn draw_bounding_box(im: &Image, bbox: BoundingBox, color: &[f32]) -> Image {
    let mut out = im.clone();
    if bbox.is_empty() {
        return out;
    }

    let (x0, y0) = (bbox.min_x, bbox.min_y);
    let (x1, y1) = (bbox.max_x - 1, bbox.max_y - 1);

    let mut put = |x: i64, y: i64| {
        if x < 0 || y < 0 {
            return;
        }
        for c in 0..out.channels {
            let v = color.get(c).copied().unwrap_or(1.0);
            out.set(x as usize, y as usize, c, v);
        }
    };

    // clip the scan to the image so huge boxes stay cheap
    let (w, h) = (im.width as i64, im.height as i64);
    for x in x0.max(0)..=x1.min(w - 1) {
        put(x, y0);
        put(x, y1);
    }
    for y in y0.max(0)..=y1.min(h - 1) {
        put(x0, y);
        put(x1, y);
    }

    out
}
