use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};
use serde::{Deserialize, Serialize};

/// Homogeneous `w` below this magnitude is treated as a point at infinity.
pub(crate) const W_EPS: f64 = 1e-12;

/// Twice the triangle area (in Hartley-normalized units) below which three
/// points are considered collinear.
const COLLINEAR_EPS: f64 = 1e-9;

/// Errors returned by the 4-point homography solver.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum HomographyError {
    #[error("exactly 4 correspondences are required (got {got})")]
    InvalidCorrespondenceCount { got: usize },
    #[error("degenerate correspondences: {reason}")]
    Degenerate { reason: &'static str },
}

/// A matched pair of points: `point1` in the source image, `point2` in the
/// destination image.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorrespondencePair {
    pub point1: Point2<f64>,
    pub point2: Point2<f64>,
}

impl CorrespondencePair {
    pub fn new(point1: Point2<f64>, point2: Point2<f64>) -> Self {
        Self { point1, point2 }
    }

    pub fn from_coords(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(Point2::new(x1, y1), Point2::new(x2, y2))
    }
}

/// Projective map `dst ~ H * src` in homogeneous pixel coordinates.
///
/// Serialized as a row-major `[[f64; 3]; 3]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[[f64; 3]; 3]", into = "[[f64; 3]; 3]")]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    /// Pure translation by `(tx, ty)`.
    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::new(Matrix3::new(
            1.0, 0.0, tx, //
            0.0, 1.0, ty, //
            0.0, 0.0, 1.0,
        ))
    }

    pub fn from_array(rows: [[f64; 3]; 3]) -> Self {
        Self::new(Matrix3::from_row_slice(&[
            rows[0][0], rows[0][1], rows[0][2], rows[1][0], rows[1][1], rows[1][2], rows[2][0],
            rows[2][1], rows[2][2],
        ]))
    }

    pub fn to_array(&self) -> [[f64; 3]; 3] {
        [
            [self.h[(0, 0)], self.h[(0, 1)], self.h[(0, 2)]],
            [self.h[(1, 0)], self.h[(1, 1)], self.h[(1, 2)]],
            [self.h[(2, 0)], self.h[(2, 1)], self.h[(2, 2)]],
        ]
    }

    #[inline]
    pub fn apply_homogeneous(&self, v: Vector3<f64>) -> Vector3<f64> {
        self.h * v
    }

    /// Map a point, dividing by the homogeneous coordinate.
    ///
    /// Points sent to infinity come back as non-finite coordinates; use
    /// [`Homography::project`] when that case matters.
    #[inline]
    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        let v = self.apply_homogeneous(Vector3::new(p.x, p.y, 1.0));
        Point2::new(v[0] / v[2], v[1] / v[2])
    }

    /// Like [`Homography::apply`] but returns `None` for points at infinity.
    #[inline]
    pub fn project(&self, p: Point2<f64>) -> Option<Point2<f64>> {
        let v = self.apply_homogeneous(Vector3::new(p.x, p.y, 1.0));
        if v[2].abs() < W_EPS {
            return None;
        }
        Some(Point2::new(v[0] / v[2], v[1] / v[2]))
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }

    /// Rescale so that `h[2][2] == 1`. Fails when that entry vanishes.
    pub fn normalized(&self) -> Option<Self> {
        normalize_homography(self.h).map(Self::new)
    }
}

impl Default for Homography {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Homography {
    type Output = Homography;

    /// `(a * b).apply(p) == a.apply(b.apply(p))`
    fn mul(self, rhs: Homography) -> Homography {
        Homography::new(self.h * rhs.h)
    }
}

impl From<[[f64; 3]; 3]> for Homography {
    fn from(rows: [[f64; 3]; 3]) -> Self {
        Self::from_array(rows)
    }
}

impl From<Homography> for [[f64; 3]; 3] {
    fn from(h: Homography) -> Self {
        h.to_array()
    }
}

fn hartley_normalization(cx: f64, cy: f64, mean_dist: f64) -> Matrix3<f64> {
    let s = if mean_dist > 1e-12 {
        (2.0_f64).sqrt() / mean_dist
    } else {
        1.0
    };

    Matrix3::<f64>::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

// Translate to centroid, scale so mean distance = sqrt(2).
fn normalize_points4(pts: &[Point2<f64>; 4]) -> ([Point2<f64>; 4], Matrix3<f64>) {
    let n = 4.0_f64;
    let (cx, cy) = pts
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    let (cx, cy) = (cx / n, cy / n);

    let mean_dist = pts
        .iter()
        .map(|p| ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;

    let t = hartley_normalization(cx, cy, mean_dist);
    let out = pts.map(|p| {
        let v = t * Vector3::new(p.x, p.y, 1.0);
        Point2::new(v[0], v[1])
    });

    (out, t)
}

fn has_collinear_triple(pts: &[Point2<f64>; 4]) -> bool {
    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    TRIPLES.iter().any(|&[i, j, k]| {
        let a = pts[j] - pts[i];
        let b = pts[k] - pts[i];
        (a.x * b.y - a.y * b.x).abs() < COLLINEAR_EPS
    })
}

fn normalize_homography(h: Matrix3<f64>) -> Option<Matrix3<f64>> {
    let s = h[(2, 2)];
    if s.abs() < W_EPS {
        return None;
    }
    Some(h / s)
}

fn denormalize_homography(
    hn: Matrix3<f64>,
    t_src: Matrix3<f64>,
    t_dst: Matrix3<f64>,
) -> Option<Matrix3<f64>> {
    let t_dst_inv = t_dst.try_inverse()?;
    Some(t_dst_inv * hn * t_src)
}

/// Compute H such that `point2 ~ H * point1` from exactly 4 correspondences.
///
/// Each correspondence `(x, y) -> (u, v)` contributes two rows of an 8x8
/// linear system in the unknowns `[h11 h12 h13 h21 h22 h23 h31 h32]`
/// (with `h33 = 1`):
///
/// ```text
/// h11 x + h12 y + h13 - u h31 x - u h32 y = u
/// h21 x + h22 y + h23 - v h31 x - v h32 y = v
/// ```
///
/// Both point sets are Hartley-normalized and the system is solved with an
/// LU decomposition. Three collinear points (which includes a repeated
/// point) in either set make the system singular and are reported as
/// [`HomographyError::Degenerate`].
#[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all))]
pub fn compute_homography(
    correspondences: &[CorrespondencePair; 4],
) -> Result<Homography, HomographyError> {
    let src = correspondences.map(|c| c.point1);
    let dst = correspondences.map(|c| c.point2);

    if src.iter().chain(dst.iter()).any(|p| !p.coords.iter().all(|v| v.is_finite())) {
        return Err(HomographyError::Degenerate {
            reason: "non-finite coordinates",
        });
    }

    let (src_n, t_src) = normalize_points4(&src);
    let (dst_n, t_dst) = normalize_points4(&dst);

    if has_collinear_triple(&src_n) {
        return Err(HomographyError::Degenerate {
            reason: "three source points are collinear",
        });
    }
    if has_collinear_triple(&dst_n) {
        return Err(HomographyError::Degenerate {
            reason: "three destination points are collinear",
        });
    }

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for k in 0..4 {
        let x = src_n[k].x;
        let y = src_n[k].y;
        let u = dst_n[k].x;
        let v = dst_n[k].y;

        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        let r1 = 2 * k + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let x = a.lu().solve(&b).ok_or(HomographyError::Degenerate {
        reason: "singular linear system",
    })?;
    if !x.iter().all(|v| v.is_finite()) {
        return Err(HomographyError::Degenerate {
            reason: "unstable linear solve",
        });
    }

    let hn = Matrix3::<f64>::new(
        x[0], x[1], x[2], //
        x[3], x[4], x[5], //
        x[6], x[7], 1.0,
    );
    if hn.determinant().abs() < COLLINEAR_EPS {
        return Err(HomographyError::Degenerate {
            reason: "solution is not invertible",
        });
    }

    let h = denormalize_homography(hn, t_src, t_dst)
        .and_then(normalize_homography)
        .ok_or(HomographyError::Degenerate {
            reason: "homography maps the origin to infinity",
        })?;

    let h = Homography::new(h);
    log::debug!("homography from 4 correspondences: {:?}", h.to_array());
    Ok(h)
}

/// Slice entry point for untyped input; anything but 4 pairs is rejected
/// before solving.
pub fn compute_homography_from_slice(
    correspondences: &[CorrespondencePair],
) -> Result<Homography, HomographyError> {
    let pairs: &[CorrespondencePair; 4] =
        correspondences
            .try_into()
            .map_err(|_| HomographyError::InvalidCorrespondenceCount {
                got: correspondences.len(),
            })?;
    compute_homography(pairs)
}
