//! gridwall CLI - turn ROS occupancy maps into Gazebo wall models.
//!
//! Usage: gridwall <COMMAND> [OPTIONS]
//!
//! Run `gridwall --help` for available commands.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use gridwall::algo::dissolve::DissolveOptions;
use gridwall::io::{self, Format};
use gridwall::map::{load_map, LoadedMap};
use gridwall::pipeline::{build_wall, WallModel, WallOptions, DEFAULT_WALL_HEIGHT};
use gridwall::sdf::{create_model_dir, ModelInfo};

#[derive(Parser)]
#[command(name = "gridwall")]
#[command(author, version, about = "Occupancy map to wall model converter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a wall mesh from a map
    Mesh {
        /// Map metadata file (YAML)
        #[arg(short, long = "input-map-meta")]
        input: PathBuf,

        /// Directory the mesh is written to, named after the map
        #[arg(short, long)]
        output_dir: PathBuf,

        #[command(flatten)]
        wall: WallArgs,

        /// Mesh file format
        #[arg(long, value_enum, default_value = "dae")]
        format: OutputFormat,
    },

    /// Create an empty Gazebo model directory
    Model {
        /// Directory the model directory is created in
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Model name
        #[arg(short, long)]
        name: String,

        /// Replace an existing model directory
        #[arg(short, long)]
        force: bool,

        #[command(flatten)]
        meta: MetaArgs,
    },

    /// Create a model directory and write the wall mesh into it
    Build {
        /// Map metadata file (YAML)
        #[arg(short, long = "input-map-meta")]
        input: PathBuf,

        /// Directory the model directory is created in
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Model name (default: map file stem)
        #[arg(short, long)]
        name: Option<String>,

        /// Replace an existing model directory
        #[arg(short, long)]
        force: bool,

        #[command(flatten)]
        wall: WallArgs,

        #[command(flatten)]
        meta: MetaArgs,
    },

    /// Display map and wall model statistics
    Info {
        /// Map metadata file (YAML)
        #[arg(short, long = "input-map-meta")]
        input: PathBuf,

        #[command(flatten)]
        wall: WallArgs,
    },
}

#[derive(Args)]
struct WallArgs {
    /// Wall height in meters
    #[arg(long, default_value_t = DEFAULT_WALL_HEIGHT)]
    wall_height: f64,

    /// Keep one quad per occupied cell instead of merging them
    #[arg(long)]
    no_dissolve: bool,

    /// Largest angle in degrees between faces that still merge
    #[arg(long, default_value = "5.0")]
    angle_limit: f64,
}

impl WallArgs {
    fn options(&self) -> WallOptions {
        WallOptions::default()
            .with_height(self.wall_height)
            .with_dissolve(!self.no_dissolve)
            .with_dissolve_options(
                DissolveOptions::default().with_angle_limit(self.angle_limit.to_radians()),
            )
    }
}

#[derive(Args)]
struct MetaArgs {
    /// Model version
    #[arg(long = "version", default_value = "1.0")]
    model_version: String,

    /// Author name
    #[arg(long, default_value = "Anonymous")]
    author: String,

    /// Author email
    #[arg(long, default_value = "anon@todo.todo")]
    email: String,

    /// Model description
    #[arg(long, default_value = "")]
    description: String,
}

impl MetaArgs {
    fn info(&self, name: &str) -> ModelInfo {
        ModelInfo::new(name)
            .with_version(&self.model_version)
            .with_author(&self.author)
            .with_email(&self.email)
            .with_description(&self.description)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// COLLADA (what Gazebo model directories use)
    Dae,
    /// Wavefront OBJ
    Obj,
    /// ASCII PLY
    Ply,
    /// Binary STL
    Stl,
}

impl From<OutputFormat> for Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Dae => Format::Dae,
            OutputFormat::Obj => Format::Obj,
            OutputFormat::Ply => Format::Ply,
            OutputFormat::Stl => Format::Stl,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gridwall=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Mesh {
            input,
            output_dir,
            wall,
            format,
        } => {
            cmd_mesh(&input, &output_dir, &wall, format.into())?;
        }

        Commands::Model {
            output_dir,
            name,
            force,
            meta,
        } => {
            let model = create_model_dir(&output_dir, &meta.info(&name), force)?;
            println!("Created model at {}", model.root.display());
        }

        Commands::Build {
            input,
            output_dir,
            name,
            force,
            wall,
            meta,
        } => {
            let name = match name {
                Some(name) => name,
                None => map_stem(&input)?,
            };
            cmd_build(&input, &output_dir, &name, force, &wall, &meta)?;
        }

        Commands::Info { input, wall } => {
            cmd_info(&input, &wall)?;
        }
    }

    Ok(())
}

fn map_stem(input: &Path) -> Result<String, Box<dyn std::error::Error>> {
    input
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| format!("cannot derive a name from {}", input.display()).into())
}

fn load_and_build(input: &Path, wall: &WallArgs) -> Result<(LoadedMap, WallModel), Box<dyn std::error::Error>> {
    let map = load_map(input)?;
    let model: WallModel = build_wall(&map.grid, &map.placement, &wall.options())?;
    Ok((map, model))
}

fn cmd_mesh(
    input: &Path,
    output_dir: &Path,
    wall: &WallArgs,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let (_, model) = load_and_build(input, wall)?;

    std::fs::create_dir_all(output_dir)?;
    let output = output_dir.join(format!("{}.{}", map_stem(input)?, format.extension()));
    io::save_as(model.mesh(), &output, format)?;

    println!(
        "Wrote {} ({} faces) in {:.2?}",
        output.display(),
        model.mesh().num_faces(),
        start.elapsed()
    );
    Ok(())
}

fn cmd_build(
    input: &Path,
    output_dir: &Path,
    name: &str,
    force: bool,
    wall: &WallArgs,
    meta: &MetaArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    // Build first so a bad map never clobbers an existing model.
    let (_, model) = load_and_build(input, wall)?;

    let dir = create_model_dir(output_dir, &meta.info(name), force)?;
    io::save_as(model.mesh(), &dir.mesh_path, Format::Dae)?;

    println!(
        "Created model at {} ({} faces) in {:.2?}",
        dir.root.display(),
        model.mesh().num_faces(),
        start.elapsed()
    );
    Ok(())
}

fn cmd_info(input: &Path, wall: &WallArgs) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let (map, model) = load_and_build(input, wall)?;
    let elapsed = start.elapsed();
    let meta = &map.metadata;

    println!("Map: {}", input.display());
    println!("Image: {}", meta.image.display());
    println!("Grid: {} x {} cells", map.grid.cols(), map.grid.rows());
    println!(
        "Occupied cells: {} ({:.1}%)",
        map.grid.num_occupied(),
        100.0 * map.grid.num_occupied() as f64 / (map.grid.rows() * map.grid.cols()) as f64
    );
    println!("Resolution: {} m/cell", meta.resolution);
    println!(
        "Origin: ({}, {}, {})",
        meta.origin[0], meta.origin[1], meta.origin[2]
    );
    println!(
        "Thresholds: occupied {} free {} negate {}",
        meta.occupied_thresh, meta.free_thresh, meta.negate
    );

    let mesh = model.mesh();
    println!("Wall height: {}", model.height());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Faces: {}", mesh.num_faces());
    println!("Closed: {}", model.is_closed());
    println!("Surface area: {:.6}", mesh.surface_area());

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
        let diag = max - min;
        println!("Dimensions: {:.3} x {:.3} x {:.3}", diag.x, diag.y, diag.z);
    }

    println!("Build time: {:.2?}", elapsed);
    Ok(())
}
