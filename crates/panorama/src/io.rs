//! Conversions between `image` crate buffers and the core [`Image`].
//!
//! Samples are stored as `f32` in `[0, 1]`. Gray inputs load as 1 channel,
//! color inputs as 3 (RGB) or 4 (RGBA). Saving clamps to `[0, 1]` and
//! writes 8-bit gray, RGB or RGBA depending on the channel count.

use std::path::Path;

use ::image::{DynamicImage, GrayImage, RgbImage, RgbaImage};
use panorama_core::Image;

#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error(transparent)]
    Image(#[from] ::image::ImageError),
    #[error("cannot encode an image with {channels} channels (expected 1, 3 or 4)")]
    UnsupportedChannels { channels: usize },
    #[error("invalid image dimensions ({width}x{height})")]
    InvalidDimensions { width: usize, height: usize },
}

pub fn from_dynamic(img: &DynamicImage) -> Image {
    let color = img.color();
    let (width, height) = (img.width() as usize, img.height() as usize);
    let (channels, raw) = if !color.has_color() {
        (1, img.to_luma8().into_raw())
    } else if color.has_alpha() {
        (4, img.to_rgba8().into_raw())
    } else {
        (3, img.to_rgb8().into_raw())
    };

    Image {
        width,
        height,
        channels,
        data: raw.into_iter().map(|v| v as f32 / 255.0).collect(),
    }
}

pub fn to_dynamic(img: &Image) -> Result<DynamicImage, IoError> {
    let invalid = || IoError::InvalidDimensions {
        width: img.width,
        height: img.height,
    };
    let w = u32::try_from(img.width).map_err(|_| invalid())?;
    let h = u32::try_from(img.height).map_err(|_| invalid())?;
    let raw: Vec<u8> = img
        .data
        .iter()
        .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect();

    let dynamic = match img.channels {
        1 => DynamicImage::ImageLuma8(GrayImage::from_raw(w, h, raw).ok_or_else(invalid)?),
        3 => DynamicImage::ImageRgb8(RgbImage::from_raw(w, h, raw).ok_or_else(invalid)?),
        4 => DynamicImage::ImageRgba8(RgbaImage::from_raw(w, h, raw).ok_or_else(invalid)?),
        channels => return Err(IoError::UnsupportedChannels { channels }),
    };
    Ok(dynamic)
}

pub fn load_image(path: impl AsRef<Path>) -> Result<Image, IoError> {
    let path = path.as_ref();
    let img = ::image::open(path)?;
    log::debug!(
        "loaded {} ({}x{}, {:?})",
        path.display(),
        img.width(),
        img.height(),
        img.color()
    );
    Ok(from_dynamic(&img))
}

pub fn save_image(path: impl AsRef<Path>, img: &Image) -> Result<(), IoError> {
    let path = path.as_ref();
    to_dynamic(img)?.save(path)?;
    log::debug!("saved {} ({}x{})", path.display(), img.width, img.height);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn gray_round_trips_through_png() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gray.png");
        let img = Image::from_fn(5, 3, 1, |x, y, _| (x + 5 * y) as f32 / 14.0);

        save_image(&path, &img).expect("save");
        let back = load_image(&path).expect("load");

        assert_eq!((back.width, back.height, back.channels), (5, 3, 1));
        for (a, b) in back.data.iter().zip(&img.data) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1.0 / 255.0);
        }
    }

    #[test]
    fn rgb_values_are_clamped_on_save() {
        let img = Image::from_raw(1, 1, 3, vec![-0.5, 0.5, 2.0]).expect("image");
        let dynamic = to_dynamic(&img).expect("encode");
        assert_eq!(dynamic.to_rgb8().into_raw(), vec![0, 128, 255]);
    }

    #[test]
    fn rgba_keeps_alpha_channel() {
        let rgba = RgbaImage::from_raw(1, 1, vec![255, 0, 51, 102]).expect("buffer");
        let img = from_dynamic(&DynamicImage::ImageRgba8(rgba));
        assert_eq!(img.channels, 4);
        assert_abs_diff_eq!(img.data[2], 0.2, epsilon = 1e-6);
        assert_abs_diff_eq!(img.data[3], 0.4, epsilon = 1e-6);
    }

    #[test]
    fn two_channel_images_cannot_be_encoded() {
        let img = Image::new(2, 2, 2);
        assert!(matches!(
            to_dynamic(&img),
            Err(IoError::UnsupportedChannels { channels: 2 })
        ));
    }
}
