//! Loading of ROS-style occupancy maps.
//!
//! A map is a YAML metadata file next to a grayscale raster (usually PGM):
//!
//! ```yaml
//! image: office.pgm
//! resolution: 0.05
//! origin: [-10.0, -10.0, 0.0]
//! occupied_thresh: 0.65
//! free_thresh: 0.196
//! negate: 0
//! ```
//!
//! Dark pixels are walls. A pixel `p` is occupied when `(255 - p) / 255`
//! exceeds `occupied_thresh`, or `p / 255` when `negate` is set. Image row 0
//! is the top of the map; [`crate::pipeline::build_wall`] takes care of
//! flipping it.

use std::fs;
use std::path::{Path, PathBuf};

use image::GrayImage;
use serde::{Deserialize, Deserializer};
use tracing::info;

use crate::error::{Result, WallError};
use crate::grid::{OccupancyGrid, Placement};

/// Default `free_thresh` when the metadata leaves it out.
pub const DEFAULT_FREE_THRESH: f64 = 0.196;

/// Map metadata as found in the YAML file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapMetadata {
    /// Raster filename, relative to the YAML file.
    pub image: PathBuf,

    /// Edge length of one pixel in meters.
    pub resolution: f64,

    /// World pose of the lower-left pixel, `[x, y, theta]`.
    pub origin: [f64; 3],

    /// Pixels with an occupancy above this are walls (0.0 to 1.0).
    pub occupied_thresh: f64,

    /// Pixels with an occupancy below this are free. Read for completeness;
    /// anything not occupied counts as free here.
    #[serde(default = "default_free_thresh")]
    pub free_thresh: f64,

    /// Swap the meaning of dark and light pixels. Accepts `0`/`1` as well
    /// as booleans.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub negate: bool,

    /// Interpretation mode (`trinary`, `scale` or `raw`), if given.
    #[serde(default)]
    pub mode: Option<String>,
}

fn default_free_thresh() -> f64 {
    DEFAULT_FREE_THRESH
}

fn deserialize_flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Int(0) => Ok(false),
        Flag::Int(1) => Ok(true),
        Flag::Int(other) => Err(serde::de::Error::custom(format!(
            "negate must be 0 or 1, got {other}"
        ))),
    }
}

impl MapMetadata {
    /// Parse metadata from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let metadata: Self = serde_yaml::from_str(text)?;
        metadata.validate()?;
        Ok(metadata)
    }

    /// Check that the thresholds are fractions.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.occupied_thresh) {
            return Err(WallError::invalid_param(
                "occupied_thresh",
                self.occupied_thresh,
                "must be in [0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.free_thresh) {
            return Err(WallError::invalid_param(
                "free_thresh",
                self.free_thresh,
                "must be in [0, 1]",
            ));
        }
        Ok(())
    }

    /// Placement of the map grid in the world.
    pub fn placement(&self) -> Placement {
        Placement::from_origin(self.resolution, self.origin)
    }
}

/// Whether an 8-bit grayscale pixel counts as occupied.
#[inline]
pub fn is_occupied_pixel(pixel: u8, threshold: f64, negate: bool) -> bool {
    let value = if negate { pixel } else { 255 - pixel };
    f64::from(value) / 255.0 > threshold
}

/// Threshold a grayscale raster into an occupancy grid.
///
/// Pixel row 0 becomes grid row 0.
///
/// # Example
/// ```
/// use gridwall::map::binarize;
/// use image::{GrayImage, Luma};
///
/// let mut image = GrayImage::from_pixel(3, 2, Luma([254u8]));
/// image.put_pixel(1, 0, Luma([0u8]));
///
/// let grid = binarize(&image, 0.65, false).unwrap();
/// assert_eq!(grid.to_string(), ".#.\n...\n");
/// ```
pub fn binarize(pixels: &GrayImage, threshold: f64, negate: bool) -> Result<OccupancyGrid> {
    let (width, height) = pixels.dimensions();
    OccupancyGrid::from_fn(height as usize, width as usize, |r, c| {
        let [p] = pixels.get_pixel(c as u32, r as u32).0;
        is_occupied_pixel(p, threshold, negate)
    })
}

/// A map read from disk.
#[derive(Debug, Clone)]
pub struct LoadedMap {
    /// The parsed metadata.
    pub metadata: MapMetadata,
    /// The binarized raster, row 0 at the top.
    pub grid: OccupancyGrid,
    /// Where the grid sits in the world.
    pub placement: Placement,
}

/// Read map metadata from a YAML file.
pub fn load_metadata<P: AsRef<Path>>(yaml_path: P) -> Result<MapMetadata> {
    let yaml_path = yaml_path.as_ref();
    let text = fs::read_to_string(yaml_path).map_err(|e| WallError::LoadError {
        path: yaml_path.to_path_buf(),
        message: e.to_string(),
    })?;
    MapMetadata::from_yaml_str(&text)
}

/// Load a map: parse the YAML file, decode the raster it names and
/// binarize it with the map's threshold.
pub fn load_map<P: AsRef<Path>>(yaml_path: P) -> Result<LoadedMap> {
    let yaml_path = yaml_path.as_ref();
    let metadata = load_metadata(yaml_path)?;

    let dir = yaml_path.parent().unwrap_or(Path::new("."));
    let image_path = dir.join(&metadata.image);
    let bytes = fs::read(&image_path).map_err(|e| WallError::LoadError {
        path: image_path.clone(),
        message: e.to_string(),
    })?;
    let pixels = image::load_from_memory(&bytes)?.into_luma8();

    let grid = binarize(&pixels, metadata.occupied_thresh, metadata.negate)?;
    info!(
        path = %image_path.display(),
        rows = grid.rows(),
        cols = grid.cols(),
        occupied = grid.num_occupied(),
        resolution = metadata.resolution,
        "Loaded map"
    );

    let placement = metadata.placement();
    Ok(LoadedMap {
        metadata,
        grid,
        placement,
    })
}
