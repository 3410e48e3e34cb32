//! JSON job descriptions.
//!
//! ```json
//! {
//!   "image1": "left.png",
//!   "image2": "right.png",
//!   "output": "pano.png",
//!   "correspondences": [
//!     {"point1": [210, 40], "point2": [12, 38]},
//!     {"point1": [300, 45], "point2": [101, 47]},
//!     {"point1": [305, 220], "point2": [108, 219]},
//!     {"point1": [205, 230], "point2": [9, 226]}
//!   ],
//!   "interpolation": "bilinear",
//!   "fast": true
//! }
//! ```
//!
//! Relative paths are resolved against the directory of the job file.

use std::fs;
use std::path::{Path, PathBuf};

use panorama_core::{CorrespondencePair, HomographyError, StitchParams};
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StitchJob {
    /// Image that gets warped (`point1` side of the correspondences).
    pub image1: PathBuf,
    /// Reference image (`point2` side).
    pub image2: PathBuf,
    pub output: PathBuf,
    pub correspondences: Vec<CorrespondencePair>,
    /// Optional copy of the panorama with both footprints outlined.
    #[serde(default)]
    pub bbox_debug_path: Option<PathBuf>,
    /// Optional JSON report path.
    #[serde(default)]
    pub report_path: Option<PathBuf>,
    #[serde(flatten)]
    pub params: StitchParams,
}

impl StitchJob {
    /// The correspondences as the fixed-size array the solver takes.
    pub fn correspondences(&self) -> Result<[CorrespondencePair; 4], HomographyError> {
        self.correspondences.as_slice().try_into().map_err(|_| {
            HomographyError::InvalidCorrespondenceCount {
                got: self.correspondences.len(),
            }
        })
    }

    /// Make every relative path absolute with respect to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let fix = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        fix(&mut self.image1);
        fix(&mut self.image2);
        fix(&mut self.output);
        if let Some(p) = self.bbox_debug_path.as_mut() {
            fix(p);
        }
        if let Some(p) = self.report_path.as_mut() {
            fix(p);
        }
    }
}

/// Read a JSON file holding a list of correspondences.
pub fn load_correspondences(path: &Path) -> Result<Vec<CorrespondencePair>, ConfigError> {
    read_json(path)
}

/// Read a job file and resolve its relative paths.
pub fn load_job(path: &Path) -> Result<StitchJob, ConfigError> {
    let mut job: StitchJob = read_json(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    job.resolve_paths(base);
    log::debug!("loaded job {}: {:?}", path.display(), job);
    Ok(job)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
