//! High-level facade for the `panorama-*` workspace.
//!
//! This crate provides:
//! - re-exports of the geometric core (`panorama::core`),
//! - JSON job descriptions for stitching runs (`panorama::config`),
//! - (feature `image`) image-file I/O and an end-to-end job runner,
//! - (feature `cli`) the `panorama` command-line tool.
//!
//! ## Quickstart
//!
//! ```no_run
//! use panorama::core::{stitch, CorrespondencePair};
//! use panorama::io::{load_image, save_image};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let im1 = load_image("left.png")?;
//! let im2 = load_image("right.png")?;
//! let pairs = [
//!     CorrespondencePair::from_coords(210.0, 40.0, 12.0, 38.0),
//!     CorrespondencePair::from_coords(300.0, 45.0, 101.0, 47.0),
//!     CorrespondencePair::from_coords(305.0, 220.0, 108.0, 219.0),
//!     CorrespondencePair::from_coords(205.0, 230.0, 9.0, 226.0),
//! ];
//! let pano = stitch(&im1, &im2, &pairs)?;
//! save_image("pano.png", &pano)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `panorama::core`: homographies, bounding boxes, warps, stitching.
//! - `panorama::config`: [`config::StitchJob`] and [`config::load_job`].
//! - `panorama::report`: serializable summary of a stitch.
//! - `panorama::io` (feature `image`): `image` crate conversions.
//! - `panorama::run` (feature `image`): load, stitch, save in one call.

pub use panorama_core as core;

pub use panorama_core::{
    stitch, CorrespondencePair, Homography, Image, Interpolation, StitchError, StitchParams,
};

pub mod config;
pub mod report;

#[cfg(feature = "image")]
pub mod io;

#[cfg(feature = "image")]
pub mod run;
