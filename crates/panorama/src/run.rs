//! End-to-end job runner: load both images, stitch, write the outputs.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use panorama_core::{draw_bounding_box, stitch_detailed, HomographyError, StitchError};

use crate::config::StitchJob;
use crate::io::{load_image, save_image, IoError};
use crate::report::{StitchReport, TimingsMs};

/// Outline colors for the debug image (RGBA; gray images use the first value).
const IM1_COLOR: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
const IM2_COLOR: [f32; 4] = [0.0, 1.0, 0.0, 1.0];

#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Correspondences(#[from] HomographyError),
    #[error(transparent)]
    Stitch(#[from] StitchError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "info", skip_all, fields(output = %job.output.display()))
)]
pub fn run_job(job: &StitchJob) -> Result<StitchReport, RunError> {
    let t_total = Instant::now();
    let pairs = job.correspondences()?;

    let t0 = Instant::now();
    let im1 = load_image(&job.image1)?;
    let im2 = load_image(&job.image2)?;
    let load_images = t0.elapsed().as_millis() as u64;

    let t0 = Instant::now();
    let res = stitch_detailed(&im1, &im2, &pairs, &job.params)?;
    let stitch = t0.elapsed().as_millis() as u64;

    let t0 = Instant::now();
    if let Some(parent) = job.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| RunError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    save_image(&job.output, &res.panorama)?;
    let save = t0.elapsed().as_millis() as u64;

    let mut report = StitchReport::from_result(&res, TimingsMs::default());

    if let Some(path) = &job.bbox_debug_path {
        let debug = draw_bounding_box(&res.panorama, report.to_canvas(res.bbox_im2), &IM2_COLOR);
        let debug = draw_bounding_box(&debug, report.to_canvas(res.bbox_im1), &IM1_COLOR);
        save_image(path, &debug)?;
    }

    report.timings_ms = TimingsMs {
        load_images,
        stitch,
        save,
        total: t_total.elapsed().as_millis() as u64,
    };
    log::info!(
        "wrote {} ({}x{}) in {} ms",
        job.output.display(),
        report.output_width,
        report.output_height,
        report.timings_ms.total
    );

    if let Some(path) = &job.report_path {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(path, json).map_err(|source| RunError::Write {
            path: path.clone(),
            source,
        })?;
    }

    Ok(report)
}
