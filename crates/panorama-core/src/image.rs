use std::ops::{Index, IndexMut};

/// Errors from constructing an [`Image`] out of a raw buffer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("invalid image buffer length (expected {expected} values, got {got})")]
    InvalidBufferLength { expected: usize, got: usize },
    #[error("image must have at least one channel")]
    NoChannels,
}

/// Dense `width x height x channels` image of `f32` samples.
///
/// Storage is row-major with interleaved channels:
/// `data[(y * width + x) * channels + c]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub data: Vec<f32>,
}

impl Image {
    /// Zero-filled image.
    pub fn new(width: usize, height: usize, channels: usize) -> Self {
        Self::filled(width, height, channels, 0.0)
    }

    pub fn filled(width: usize, height: usize, channels: usize, value: f32) -> Self {
        Self {
            width,
            height,
            channels,
            data: vec![value; width * height * channels],
        }
    }

    pub fn from_raw(
        width: usize,
        height: usize,
        channels: usize,
        data: Vec<f32>,
    ) -> Result<Self, ImageError> {
        if channels == 0 {
            return Err(ImageError::NoChannels);
        }
        let expected = width * height * channels;
        if data.len() != expected {
            return Err(ImageError::InvalidBufferLength {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Build an image by evaluating `f(x, y, c)` for every sample.
    pub fn from_fn(
        width: usize,
        height: usize,
        channels: usize,
        mut f: impl FnMut(usize, usize, usize) -> f32,
    ) -> Self {
        let mut data = Vec::with_capacity(width * height * channels);
        for y in 0..height {
            for x in 0..width {
                for c in 0..channels {
                    data.push(f(x, y, c));
                }
            }
        }
        Self {
            width,
            height,
            channels,
            data,
        }
    }

    /// Number of `f32` values in one row.
    #[inline]
    pub fn row_stride(&self) -> usize {
        self.width * self.channels
    }

    #[inline]
    fn offset(&self, x: usize, y: usize, c: usize) -> usize {
        (y * self.width + x) * self.channels + c
    }

    #[inline]
    fn contains(&self, x: usize, y: usize, c: usize) -> bool {
        x < self.width && y < self.height && c < self.channels
    }

    /// Bounds-checked read.
    #[inline]
    pub fn get(&self, x: usize, y: usize, c: usize) -> Option<f32> {
        if !self.contains(x, y, c) {
            return None;
        }
        Some(self.data[self.offset(x, y, c)])
    }

    /// Bounds-checked write. Returns `false` (and writes nothing) when out of range.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, c: usize, value: f32) -> bool {
        if !self.contains(x, y, c) {
            return false;
        }
        let idx = self.offset(x, y, c);
        self.data[idx] = value;
        true
    }

    /// Read that tolerates any integer coordinate by clamping it to the
    /// nearest edge pixel. The image must not be empty.
    #[inline]
    pub fn smart_get(&self, x: i64, y: i64, c: usize) -> f32 {
        let xc = x.clamp(0, self.width as i64 - 1) as usize;
        let yc = y.clamp(0, self.height as i64 - 1) as usize;
        self[(xc, yc, c)]
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<&[f32]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = self.offset(x, y, 0);
        Some(&self.data[start..start + self.channels])
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl Index<(usize, usize, usize)> for Image {
    type Output = f32;

    fn index(&self, (x, y, c): (usize, usize, usize)) -> &f32 {
        assert!(
            self.contains(x, y, c),
            "pixel ({x}, {y}, {c}) out of range for {}x{}x{} image",
            self.width,
            self.height,
            self.channels
        );
        &self.data[self.offset(x, y, c)]
    }
}

impl IndexMut<(usize, usize, usize)> for Image {
    fn index_mut(&mut self, (x, y, c): (usize, usize, usize)) -> &mut f32 {
        assert!(
            self.contains(x, y, c),
            "pixel ({x}, {y}, {c}) out of range for {}x{}x{} image",
            self.width,
            self.height,
            self.channels
        );
        let idx = self.offset(x, y, c);
        &mut self.data[idx]
    }
}

/// Bilinear sample of channel `c` at fractional `(x, y)`.
///
/// The four neighbours are read through [`Image::smart_get`], so samples in
/// the last row/column blend with the clamped edge instead of with black.
#[inline]
pub fn sample_bilinear(src: &Image, x: f64, y: f64, c: usize) -> f32 {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = (x - x0) as f32;
    let fy = (y - y0) as f32;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let p00 = src.smart_get(x0, y0, c);
    let p10 = src.smart_get(x0 + 1, y0, c);
    let p01 = src.smart_get(x0, y0 + 1, c);
    let p11 = src.smart_get(x0 + 1, y0 + 1, c);

    let a = p00 + fx * (p10 - p00);
    let b = p01 + fx * (p11 - p01);
    a + fy * (b - a)
}

/// Nearest-neighbour sample of channel `c` at fractional `(x, y)`.
///
/// Rounds half away from zero; coordinates that round past the last
/// row/column are clamped.
#[inline]
pub fn sample_nearest(src: &Image, x: f64, y: f64, c: usize) -> f32 {
    src.smart_get(x.round() as i64, y.round() as i64, c)
}
