//! Mesh file export.
//!
//! # Supported Formats
//!
//! | Format | Extension | Notes |
//! |--------|-----------|-------|
//! | COLLADA | `.dae` | What Gazebo model directories reference |
//! | Wavefront OBJ | `.obj` | Polygons kept as-is |
//! | PLY | `.ply` | ASCII, polygons kept as-is |
//! | STL | `.stl` | Binary, polygons ear-clipped into triangles |
//!
//! # Usage
//!
//! ```no_run
//! use gridwall::grid::{OccupancyGrid, Placement};
//! use gridwall::io::save;
//! use gridwall::pipeline::{build_wall, WallModel, WallOptions};
//!
//! let grid: OccupancyGrid = "##\n#.".parse().unwrap();
//! let model: WallModel = build_wall(&grid, &Placement::default(), &WallOptions::default()).unwrap();
//!
//! // Format picked from the extension
//! save(model.mesh(), "walls.dae").unwrap();
//! ```

pub mod dae;
pub mod obj;
pub mod ply;
pub mod stl;

pub(crate) mod xml;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::info;

use crate::error::{Result, WallError};
use crate::mesh::{MeshIndex, PolyMesh};

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// COLLADA 1.4.1.
    #[default]
    Dae,
    /// Wavefront OBJ format.
    Obj,
    /// PLY (Stanford polygon) format.
    Ply,
    /// STL (stereolithography) format.
    Stl,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "dae" => Some(Format::Dae),
            "obj" => Some(Format::Obj),
            "ply" => Some(Format::Ply),
            "stl" => Some(Format::Stl),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }

    /// The file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Dae => "dae",
            Format::Obj => "obj",
            Format::Ply => "ply",
            Format::Stl => "stl",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for Format {
    type Err = WallError;

    fn from_str(s: &str) -> Result<Self> {
        Format::from_extension(s).ok_or_else(|| WallError::UnsupportedFormat {
            extension: s.to_string(),
        })
    }
}

/// Save a mesh to a file in the format given by its extension.
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &PolyMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    let format = Format::from_path(path).ok_or_else(|| WallError::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })?;
    save_as(mesh, path, format)
}

/// Save a mesh in an explicit format, whatever the extension.
pub fn save_as<P: AsRef<Path>, I: MeshIndex>(
    mesh: &PolyMesh<I>,
    path: P,
    format: Format,
) -> Result<()> {
    let path = path.as_ref();
    match format {
        Format::Dae => dae::save(mesh, path)?,
        Format::Obj => obj::save(mesh, path)?,
        Format::Ply => ply::save(mesh, path)?,
        Format::Stl => stl::save(mesh, path)?,
    }
    info!(
        path = %path.display(),
        %format,
        vertices = mesh.num_vertices(),
        faces = mesh.num_faces(),
        "Saved mesh"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{OccupancyGrid, Placement};
    use crate::pipeline::{build_wall, WallModel, WallOptions};

    #[test]
    fn test_format_detection() {
        assert_eq!(Format::from_path("a/b/walls.DAE"), Some(Format::Dae));
        assert_eq!(Format::from_path("walls.stl"), Some(Format::Stl));
        assert_eq!(Format::from_path("walls.gltf"), None);
        assert_eq!(Format::from_path("walls"), None);
        assert_eq!("ply".parse::<Format>().unwrap(), Format::Ply);
        assert!("fbx".parse::<Format>().is_err());
        assert_eq!(Format::default().to_string(), "dae");
    }

    #[test]
    fn test_save_every_format() {
        let grid: OccupancyGrid = "##\n.#".parse().unwrap();
        let model: WallModel =
            build_wall(&grid, &Placement::default(), &WallOptions::default()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        for format in [Format::Dae, Format::Obj, Format::Ply, Format::Stl] {
            let path = dir.path().join(format!("walls.{format}"));
            save(model.mesh(), &path).unwrap();
            assert!(std::fs::metadata(&path).unwrap().len() > 0);
        }
    }

    #[test]
    fn test_unknown_extension() {
        let mesh: PolyMesh = PolyMesh::new();
        let err = save(&mesh, "walls.fbx").unwrap_err();
        assert!(matches!(err, WallError::UnsupportedFormat { extension } if extension == "fbx"));
    }
}
