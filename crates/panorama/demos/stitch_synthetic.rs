//! Build two overlapping views of a synthetic scene, stitch them back
//! together and write the panorama.
//!
//! `cargo run -p panorama --example stitch_synthetic -- [out.png]`

use std::path::PathBuf;

use log::LevelFilter;
use panorama::core::{init_with_level, stitch_detailed, CorrespondencePair, Image, StitchParams};
use panorama::io::save_image;

fn scene(width: usize, height: usize) -> Image {
    Image::from_fn(width, height, 3, |x, y, c| {
        let checker = ((x / 16 + y / 16) % 2) as f32;
        match c {
            0 => x as f32 / width as f32,
            1 => y as f32 / height as f32,
            _ => 0.3 + 0.5 * checker,
        }
    })
}

fn crop(src: &Image, x0: usize, width: usize) -> Image {
    Image::from_fn(width, src.height, src.channels, |x, y, c| src[(x0 + x, y, c)])
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_with_level(LevelFilter::Info)?;
    let out = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tmpdata/stitch_synthetic.png"));

    let world = scene(320, 160);
    let left = crop(&world, 0, 200);
    let right = crop(&world, 120, 200);

    // left pixel (x, y) is right pixel (x - 120, y)
    let pairs = [(130.0, 10.0), (190.0, 12.0), (185.0, 150.0), (135.0, 140.0)]
        .map(|(x, y)| CorrespondencePair::from_coords(x, y, x - 120.0, y));

    let res = stitch_detailed(&left, &right, &pairs, &StitchParams::default())?;
    log::info!(
        "panorama {}x{}, union {:?}",
        res.panorama.width,
        res.panorama.height,
        res.union
    );

    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)?;
    }
    save_image(&out, &res.panorama)?;
    println!("wrote {}", out.display());
    Ok(())
}
