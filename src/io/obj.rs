//! Wavefront OBJ export.
//!
//! Faces are written as polygons with 1-based indices, exactly as they
//! appear in the mesh.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::mesh::{MeshIndex, PolyMesh};

/// Save a mesh to an OBJ file.
///
/// # Example
///
/// ```no_run
/// use gridwall::io::obj;
/// use gridwall::mesh::PolyMesh;
///
/// let mesh: PolyMesh = PolyMesh::new();
/// obj::save(&mesh, "walls.obj").unwrap();
/// ```
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &PolyMesh<I>, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write(mesh, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a mesh in OBJ syntax to any writer.
pub fn write<W: Write, I: MeshIndex>(mesh: &PolyMesh<I>, writer: &mut W) -> Result<()> {
    writeln!(writer, "# Generated by gridwall")?;
    writeln!(writer, "o walls")?;

    for p in mesh.positions() {
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }

    for (_, face) in mesh.faces() {
        write!(writer, "f")?;
        for v in face.vertices() {
            write!(writer, " {}", v.index() + 1)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn test_polygon_faces() {
        let mesh: PolyMesh = PolyMesh::from_face_vertex(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(2.0, 1.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            &[vec![0, 1, 2, 3, 4]],
        )
        .unwrap();

        let mut out = Vec::new();
        write(&mesh, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 5);
        assert!(text.contains("v 2 1 0\n"));
        assert!(text.contains("\nf 1 2 3 4 5\n"));
    }
}
