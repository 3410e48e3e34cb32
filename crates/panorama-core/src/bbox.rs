use crate::homography::W_EPS;
use crate::Homography;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

const SNAP_EPS: f64 = 1e-9;

/// Finite projected coordinates are clamped to `±COORD_LIMIT`, far past any
/// canvas that could be allocated, so extents never overflow `i64`.
pub const COORD_LIMIT: i64 = 1 << 52;

/// Integer pixel extent `[min_x, max_x) x [min_y, max_y)`.
///
/// Always satisfies `min_x <= max_x` and `min_y <= max_y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: i64,
    pub min_y: i64,
    pub max_x: i64,
    pub max_y: i64,
}

impl BoundingBox {
    /// Build a box from two opposite corners, in any order.
    pub fn new(x0: i64, y0: i64, x1: i64, y1: i64) -> Self {
        Self {
            min_x: x0.min(x1),
            min_y: y0.min(y1),
            max_x: x0.max(x1),
            max_y: y0.max(y1),
        }
    }

    /// The box `(0, 0, width, height)` covering an unwarped image.
    pub fn from_size(width: usize, height: usize) -> Self {
        Self::new(0, 0, width as i64, height as i64)
    }

    pub fn width(&self) -> usize {
        extent(self.min_x, self.max_x)
    }

    pub fn height(&self) -> usize {
        extent(self.min_y, self.max_y)
    }

    pub fn is_empty(&self) -> bool {
        self.min_x == self.max_x || self.min_y == self.max_y
    }

    /// Closed containment test, so a box contains its own corners.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x as f64
            && x <= self.max_x as f64
            && y >= self.min_y as f64
            && y <= self.max_y as f64
    }
}

fn extent(lo: i64, hi: i64) -> usize {
    usize::try_from(hi.saturating_sub(lo)).unwrap_or(usize::MAX)
}

// Absorb solver round-off so that e.g. -6.0000000001 does not floor to -7.
fn snap(v: f64) -> f64 {
    let r = v.round();
    if (v - r).abs() < SNAP_EPS {
        r
    } else {
        v
    }
}

/// Bounding box of a `width x height` image after the forward map `h`.
///
/// The corners `(0,0)`, `(width,0)`, `(0,height)` and `(width,height)` are
/// projected and the tight integer box is returned (mins floored, maxes
/// ceiled). Coordinates may be negative; finite values beyond
/// [`COORD_LIMIT`] are clamped to it.
///
/// Returns `None` when the footprint is unbounded: a corner lands on the
/// line at infinity, or the corners lie on both sides of it.
pub fn transformed_bbox(width: usize, height: usize, h: &Homography) -> Option<BoundingBox> {
    let (w, ht) = (width as f64, height as f64);
    let corners = [(0.0, 0.0), (w, 0.0), (0.0, ht), (w, ht)];

    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    let mut sign = 0.0_f64;

    for (x, y) in corners {
        let v = h.apply_homogeneous(Vector3::new(x, y, 1.0));
        let wz = v[2];
        if wz.abs() < W_EPS || wz * sign < 0.0 {
            return None;
        }
        sign = wz.signum();

        let (px, py) = (snap(v[0] / wz), snap(v[1] / wz));
        min_x = min_x.min(px);
        min_y = min_y.min(py);
        max_x = max_x.max(px);
        max_y = max_y.max(py);
    }

    let limit = COORD_LIMIT as f64;
    let to_i64 = |v: f64| -> Option<i64> { (!v.is_nan()).then(|| v.clamp(-limit, limit) as i64) };

    Some(BoundingBox::new(
        to_i64(min_x.floor())?,
        to_i64(min_y.floor())?,
        to_i64(max_x.ceil())?,
        to_i64(max_y.ceil())?,
    ))
}

/// Smallest box containing both inputs.
pub fn bbox_union(b1: BoundingBox, b2: BoundingBox) -> BoundingBox {
    BoundingBox {
        min_x: b1.min_x.min(b2.min_x),
        min_y: b1.min_y.min(b2.min_y),
        max_x: b1.max_x.max(b2.max_x),
        max_y: b1.max_y.max(b2.max_y),
    }
}

/// Translation that moves the top-left corner of `b` to the origin.
pub fn make_translation(b: BoundingBox) -> Homography {
    Homography::translation(-(b.min_x as f64), -(b.min_y as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix3;

    #[test]
    fn identity_bbox_is_image_extent() {
        let b = transformed_bbox(37, 21, &Homography::identity()).expect("bounded");
        assert_eq!(b, BoundingBox::new(0, 0, 37, 21));
        assert_eq!((b.width(), b.height()), (37, 21));
    }

    #[test]
    fn translated_bbox_can_be_negative() {
        let b = transformed_bbox(10, 8, &Homography::translation(-12.5, 3.25)).expect("bounded");
        assert_eq!(b, BoundingBox::new(-13, 3, -2, 12));
    }

    #[test]
    fn projective_bbox_encloses_all_corners() {
        let h = Homography::new(Matrix3::new(
            0.9, 0.2, 15.0, //
            -0.1, 1.1, -30.0, //
            0.0008, -0.0005, 1.0,
        ));
        let (w, ht) = (120usize, 80usize);
        let b = transformed_bbox(w, ht, &h).expect("bounded");
        for (x, y) in [(0.0, 0.0), (120.0, 0.0), (0.0, 80.0), (120.0, 80.0), (60.0, 40.0)] {
            let p = h.apply(nalgebra::Point2::new(x, y));
            assert!(b.contains(p.x, p.y), "{p:?} outside {b:?}");
        }
    }

    #[test]
    fn footprint_crossing_horizon_is_unbounded() {
        // w = 1 - x / 5 flips sign inside a 10-pixel wide image
        let h = Homography::from_array([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [-0.2, 0.0, 1.0]]);
        assert_eq!(transformed_bbox(10, 10, &h), None);
    }

    #[test]
    fn huge_footprint_is_clamped_not_unbounded() {
        let b = transformed_bbox(4, 3, &Homography::from_array([
            [1e20, 0.0, 0.0],
            [0.0, 1.0, -5e9],
            [0.0, 0.0, 1.0],
        ]))
        .expect("bounded");
        assert_eq!(b, BoundingBox::new(0, -5_000_000_000, COORD_LIMIT, -4_999_999_997));
        assert_eq!(b.width(), COORD_LIMIT as usize);
        assert_eq!(b.height(), 3);
    }

    #[test]
    fn extents_do_not_overflow() {
        let b = BoundingBox::new(-COORD_LIMIT, -COORD_LIMIT, COORD_LIMIT, COORD_LIMIT);
        assert_eq!(b.width(), 2 * COORD_LIMIT as usize);
        assert_eq!(b.height(), 2 * COORD_LIMIT as usize);
    }

    #[test]
    fn union_is_idempotent_and_commutative() {
        let a = BoundingBox::new(-3, 4, 10, 20);
        let b = BoundingBox::new(0, -7, 25, 9);
        assert_eq!(bbox_union(a, a), a);
        assert_eq!(bbox_union(a, b), bbox_union(b, a));

        let u = bbox_union(a, b);
        assert_eq!(u, BoundingBox::new(-3, -7, 25, 20));
        for bx in [a, b] {
            assert!(u.contains(bx.min_x as f64, bx.min_y as f64));
            assert!(u.contains(bx.max_x as f64, bx.max_y as f64));
        }
    }

    #[test]
    fn translation_moves_top_left_to_origin() {
        let b = BoundingBox::new(-14, 6, 30, 40);
        let t = make_translation(b);
        // degenerate 1x1 box sitting at b's top-left corner
        let at_corner = Homography::translation(b.min_x as f64, b.min_y as f64);
        let moved = transformed_bbox(1, 1, &(t * at_corner)).expect("bounded");
        assert_eq!((moved.min_x, moved.min_y), (0, 0));
        assert_eq!(
            transformed_bbox(b.width(), b.height(), &(t * at_corner)),
            Some(BoundingBox::new(0, 0, 44, 34))
        );
    }

    #[test]
    fn new_orders_corners() {
        let b = BoundingBox::new(5, 9, -1, 2);
        assert_eq!(b, BoundingBox::new(-1, 2, 5, 9));
        assert!(b.min_x <= b.max_x && b.min_y <= b.max_y);
    }
}
