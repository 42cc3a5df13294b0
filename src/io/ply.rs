//! PLY (Stanford polygon) export.
//!
//! Writes ASCII PLY with one variable-length vertex list per face, so
//! merged polygons are kept intact.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::mesh::{MeshIndex, PolyMesh};

/// Save a mesh to an ASCII PLY file.
///
/// # Example
///
/// ```no_run
/// use gridwall::io::ply;
/// use gridwall::mesh::PolyMesh;
///
/// let mesh: PolyMesh = PolyMesh::new();
/// ply::save(&mesh, "walls.ply").unwrap();
/// ```
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &PolyMesh<I>, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write(mesh, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a mesh in ASCII PLY syntax to any writer.
pub fn write<W: Write, I: MeshIndex>(mesh: &PolyMesh<I>, writer: &mut W) -> Result<()> {
    // Header
    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "comment Generated by gridwall")?;
    writeln!(writer, "element vertex {}", mesh.num_vertices())?;
    writeln!(writer, "property float x")?;
    writeln!(writer, "property float y")?;
    writeln!(writer, "property float z")?;
    writeln!(writer, "element face {}", mesh.num_faces())?;
    writeln!(writer, "property list uint int vertex_indices")?;
    writeln!(writer, "end_header")?;

    for p in mesh.positions() {
        writeln!(writer, "{} {} {}", p.x, p.y, p.z)?;
    }

    for (_, face) in mesh.faces() {
        write!(writer, "{}", face.len())?;
        for v in face.vertices() {
            write!(writer, " {}", v.index())?;
        }
        writeln!(writer)?;
    }
    Ok(())
}
