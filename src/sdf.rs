//! Gazebo model directories.
//!
//! A model directory looks like this:
//!
//! ```text
//! <name>/
//! ├── meshes/
//! │   └── <name>.dae
//! ├── model.config
//! └── model.sdf
//! ```
//!
//! [`create_model_dir`] writes the two XML files and the empty `meshes/`
//! directory; the mesh itself comes from [`crate::io::dae`].

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Result, WallError};
use crate::io::xml::XmlDocument;

/// SDF format version written into both files.
pub const SDF_VERSION: &str = "1.6";

/// Model metadata for `model.config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    /// Model name; also the directory and mesh file name.
    pub name: String,
    /// Model version.
    pub version: String,
    /// Author name.
    pub author: String,
    /// Author email.
    pub email: String,
    /// Free-form description, may be empty.
    pub description: String,
}

impl ModelInfo {
    /// Metadata with default version, author and email.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: "1.0".to_string(),
            author: "Anonymous".to_string(),
            email: "anon@todo.todo".to_string(),
            description: String::new(),
        }
    }

    /// Set the model version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the author name.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Set the author email.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// The name must be usable as a single path component.
    pub fn validate(&self) -> Result<()> {
        let name = self.name.as_str();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(WallError::invalid_param(
                "name",
                name,
                "must be a plain directory name",
            ));
        }
        Ok(())
    }

    /// URI the model files use to reference the mesh.
    pub fn mesh_uri(&self) -> String {
        format!("model://{0}/meshes/{0}.dae", self.name)
    }
}

/// Paths of a created model directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDir {
    /// The model root, `<output_dir>/<name>`.
    pub root: PathBuf,
    /// Where the COLLADA mesh belongs, `<root>/meshes/<name>.dae`.
    pub mesh_path: PathBuf,
}

/// Render `model.config`.
pub fn model_config(info: &ModelInfo) -> Result<String> {
    let mut doc = XmlDocument::new(Path::new("model.config"))?;
    doc.start("model", &[])?;
    doc.text("name", &[], &info.name)?;
    doc.text("version", &[], &info.version)?;
    doc.text("sdf", &[("version", SDF_VERSION)], "model.sdf")?;
    doc.start("author", &[])?;
    doc.text("name", &[], &info.author)?;
    doc.text("email", &[], &info.email)?;
    doc.end("author")?;
    doc.text("description", &[], &info.description)?;
    doc.end("model")?;
    doc.finish()
}

/// Render `model.sdf`: a static model whose collision and visual geometry
/// are both the wall mesh.
pub fn model_sdf(info: &ModelInfo) -> Result<String> {
    let uri = info.mesh_uri();
    let mut doc = XmlDocument::new(Path::new("model.sdf"))?;
    doc.start("sdf", &[("version", SDF_VERSION)])?;
    doc.start("model", &[("name", info.name.as_str())])?;
    doc.text("static", &[], "true")?;
    doc.start("link", &[("name", "link")])?;
    for (tag, name) in [("collision", "collision"), ("visual", "visual")] {
        doc.start(tag, &[("name", name)])?;
        doc.start("geometry", &[])?;
        doc.start("mesh", &[])?;
        doc.text("uri", &[], &uri)?;
        doc.end("mesh")?;
        doc.end("geometry")?;
        doc.end(tag)?;
    }
    doc.end("link")?;
    doc.end("model")?;
    doc.end("sdf")?;
    doc.finish()
}

/// Create `<output_dir>/<name>` with `meshes/`, `model.config` and
/// `model.sdf`.
///
/// Fails with [`WallError::ModelPathIsFile`] when the model path is a
/// regular file, and with [`WallError::ModelExists`] when it is a directory
/// and `overwrite` is false. With `overwrite` the old directory is removed
/// first.
pub fn create_model_dir<P: AsRef<Path>>(
    output_dir: P,
    info: &ModelInfo,
    overwrite: bool,
) -> Result<ModelDir> {
    info.validate()?;
    let root = output_dir.as_ref().join(&info.name);

    if root.is_file() {
        return Err(WallError::ModelPathIsFile { path: root });
    }
    if root.is_dir() {
        if !overwrite {
            return Err(WallError::ModelExists { path: root });
        }
        warn!(path = %root.display(), "Removing existing model directory");
        fs::remove_dir_all(&root)?;
    }

    let meshes = root.join("meshes");
    fs::create_dir_all(&meshes)?;
    fs::write(root.join("model.config"), model_config(info)?)?;
    fs::write(root.join("model.sdf"), model_sdf(info)?)?;

    info!(path = %root.display(), name = %info.name, "Created model directory");

    Ok(ModelDir {
        mesh_path: meshes.join(format!("{}.dae", info.name)),
        root,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let info = ModelInfo::new("office");
        assert_eq!(info.version, "1.0");
        assert_eq!(info.author, "Anonymous");
        assert_eq!(info.email, "anon@todo.todo");
        assert_eq!(info.description, "");
        assert_eq!(info.mesh_uri(), "model://office/meshes/office.dae");
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", "..", "a/b", "a\\b"] {
            assert!(matches!(
                ModelInfo::new(name).validate(),
                Err(WallError::InvalidParameter { name: "name", .. })
            ));
        }
    }

    #[test]
    fn test_model_config() {
        let info = ModelInfo::new("office")
            .with_author("Ada")
            .with_email("ada@example.com");
        let xml = model_config(&info).unwrap();
        let expected = "\
<?xml version=\"1.0\" encoding=\"utf-8\"?>
<model>
  <name>office</name>
  <version>1.0</version>
  <sdf version=\"1.6\">model.sdf</sdf>
  <author>
    <name>Ada</name>
    <email>ada@example.com</email>
  </author>
  <description/>
</model>
";
        assert_eq!(xml, expected);
    }

    #[test]
    fn test_model_sdf() {
        let xml = model_sdf(&ModelInfo::new("office")).unwrap();
        assert!(xml.contains("<sdf version=\"1.6\">"));
        assert!(xml.contains("<model name=\"office\">"));
        assert!(xml.contains("<static>true</static>"));
        assert!(xml.contains("<collision name=\"collision\">"));
        assert!(xml.contains("<visual name=\"visual\">"));
        assert_eq!(xml.matches("<uri>model://office/meshes/office.dae</uri>").count(), 2);
    }

    #[test]
    fn test_create_and_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let info = ModelInfo::new("office");

        let model = create_model_dir(dir.path(), &info, false).unwrap();
        assert_eq!(model.root, dir.path().join("office"));
        assert_eq!(model.mesh_path, dir.path().join("office/meshes/office.dae"));
        assert!(model.root.join("meshes").is_dir());
        assert!(model.root.join("model.config").is_file());
        assert!(model.root.join("model.sdf").is_file());

        let err = create_model_dir(dir.path(), &info, false).unwrap_err();
        assert!(matches!(err, WallError::ModelExists { .. }));

        fs::write(model.root.join("meshes/stale.dae"), "old").unwrap();
        create_model_dir(dir.path(), &info, true).unwrap();
        assert!(!model.root.join("meshes/stale.dae").exists());
    }

    #[test]
    fn test_path_is_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("office"), "not a directory").unwrap();

        for overwrite in [false, true] {
            let err = create_model_dir(dir.path(), &ModelInfo::new("office"), overwrite).unwrap_err();
            assert!(matches!(err, WallError::ModelPathIsFile { .. }));
        }
    }
}
