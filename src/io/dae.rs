//! COLLADA (`.dae`) export.
//!
//! Simulators such as Gazebo load wall models as COLLADA documents. The
//! mesh is written as one geometry with a `<polylist>`, so merged polygons
//! stay polygons, plus one flat normal per face. The up axis is +z.
//!
//! Timestamps in the asset block are fixed so that the same mesh always
//! produces the same file.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::io::xml::XmlDocument;
use crate::mesh::{MeshIndex, PolyMesh};

const COLLADA_NAMESPACE: &str = "http://www.collada.org/2005/11/COLLADASchema";
const TIMESTAMP: &str = "1970-01-01T00:00:00Z";

/// Save a mesh to a COLLADA file. The geometry is named after the file
/// stem.
///
/// # Example
///
/// ```no_run
/// use gridwall::io::dae;
/// use gridwall::mesh::PolyMesh;
///
/// let mesh: PolyMesh = PolyMesh::new();
/// dae::save(&mesh, "walls.dae").unwrap();
/// ```
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &PolyMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("mesh");
    let document = to_string(mesh, name, path)?;
    fs::write(path, document)?;
    Ok(())
}

/// Render a mesh as a COLLADA document. `target` is only used in error
/// messages.
pub fn to_string<I: MeshIndex>(mesh: &PolyMesh<I>, name: &str, target: &Path) -> Result<String> {
    let geometry_id = format!("{name}-mesh");
    let positions_id = format!("{geometry_id}-positions");
    let normals_id = format!("{geometry_id}-normals");
    let vertices_id = format!("{geometry_id}-vertices");

    let mut doc = XmlDocument::new(target)?;
    doc.start(
        "COLLADA",
        &[("xmlns", COLLADA_NAMESPACE), ("version", "1.4.1")],
    )?;

    doc.start("asset", &[])?;
    doc.start("contributor", &[])?;
    doc.text(
        "authoring_tool",
        &[],
        concat!("gridwall ", env!("CARGO_PKG_VERSION")),
    )?;
    doc.end("contributor")?;
    doc.text("created", &[], TIMESTAMP)?;
    doc.text("modified", &[], TIMESTAMP)?;
    doc.empty("unit", &[("name", "meter"), ("meter", "1")])?;
    doc.text("up_axis", &[], "Z_UP")?;
    doc.end("asset")?;

    doc.start("library_geometries", &[])?;
    doc.start("geometry", &[("id", geometry_id.as_str()), ("name", name)])?;
    doc.start("mesh", &[])?;

    let positions: Vec<[f64; 3]> = mesh.positions().iter().map(|p| [p.x, p.y, p.z]).collect();
    write_source(&mut doc, &positions_id, &positions)?;

    let normals: Vec<[f64; 3]> = mesh
        .face_ids()
        .map(|f| {
            let n = mesh.face_normal(f);
            [n.x, n.y, n.z]
        })
        .collect();
    write_source(&mut doc, &normals_id, &normals)?;

    doc.start("vertices", &[("id", vertices_id.as_str())])?;
    doc.empty(
        "input",
        &[("semantic", "POSITION"), ("source", format!("#{positions_id}").as_str())],
    )?;
    doc.end("vertices")?;

    let count = mesh.num_faces().to_string();
    doc.start("polylist", &[("count", count.as_str())])?;
    doc.empty(
        "input",
        &[
            ("semantic", "VERTEX"),
            ("source", format!("#{vertices_id}").as_str()),
            ("offset", "0"),
        ],
    )?;
    doc.empty(
        "input",
        &[
            ("semantic", "NORMAL"),
            ("source", format!("#{normals_id}").as_str()),
            ("offset", "1"),
        ],
    )?;
    let vcount = join(mesh.faces().map(|(_, face)| face.len()));
    doc.text("vcount", &[], &vcount)?;
    let indices = join(mesh.faces().flat_map(|(fid, face)| {
        face.vertices()
            .iter()
            .flat_map(move |v| [v.index(), fid.index()])
    }));
    doc.text("p", &[], &indices)?;
    doc.end("polylist")?;

    doc.end("mesh")?;
    doc.end("geometry")?;
    doc.end("library_geometries")?;

    doc.start("library_visual_scenes", &[])?;
    doc.start("visual_scene", &[("id", "Scene"), ("name", "Scene")])?;
    doc.start("node", &[("id", name), ("name", name), ("type", "NODE")])?;
    doc.empty(
        "instance_geometry",
        &[("url", format!("#{geometry_id}").as_str()), ("name", name)],
    )?;
    doc.end("node")?;
    doc.end("visual_scene")?;
    doc.end("library_visual_scenes")?;

    doc.start("scene", &[])?;
    doc.empty("instance_visual_scene", &[("url", "#Scene")])?;
    doc.end("scene")?;

    doc.end("COLLADA")?;
    doc.finish()
}

/// A `<source>` of xyz triples with its accessor.
fn write_source(doc: &mut XmlDocument, id: &str, values: &[[f64; 3]]) -> Result<()> {
    let array_id = format!("{id}-array");
    doc.start("source", &[("id", id)])?;
    doc.text(
        "float_array",
        &[("id", array_id.as_str()), ("count", (values.len() * 3).to_string().as_str())],
        &join(values.iter().flatten()),
    )?;
    doc.start("technique_common", &[])?;
    doc.start(
        "accessor",
        &[
            ("source", format!("#{array_id}").as_str()),
            ("count", values.len().to_string().as_str()),
            ("stride", "3"),
        ],
    )?;
    for axis in ["X", "Y", "Z"] {
        doc.empty("param", &[("name", axis), ("type", "float")])?;
    }
    doc.end("accessor")?;
    doc.end("technique_common")?;
    doc.end("source")
}

fn join<T: ToString>(items: impl Iterator<Item = T>) -> String {
    items.map(|x| x.to_string()).collect::<Vec<_>>().join(" ")
}
