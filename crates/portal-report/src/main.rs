//! Builds a small demonstration level and reports its cells and portals.
//!
//! Usage: `portal-report [config.json]`. Set `RUST_LOG=debug` for per-node
//! build output.

use std::env;
use std::fs;

use nalgebra::Point3;
use portal_bsp::{
    BuildConfig, ConvexPolygon, Diagnostics, Facing, LevelBuilder, Location, MeshRole,
    PortalLevel, TriangleMesh, box_quads,
};

/// Three rooms in a row, joined by two doorways.
fn demo_level(
    config: &BuildConfig,
    diagnostics: &mut Diagnostics,
) -> (Vec<ConvexPolygon>, Vec<ConvexPolygon>) {
    let walls = TriangleMesh::from_quads(&box_quads(
        Point3::new(-6.0, 0.0, -2.0),
        Point3::new(6.0, 3.0, 2.0),
        Facing::Inward,
    ))
    .to_polygons(MeshRole::Occluder { cell: None }, config.epsilon, diagnostics);

    let doors: Vec<[Point3<f32>; 4]> = [-2.0, 2.0]
        .into_iter()
        .map(|x| {
            [
                Point3::new(x, 0.0, -2.0),
                Point3::new(x, 3.0, -2.0),
                Point3::new(x, 3.0, 2.0),
                Point3::new(x, 0.0, 2.0),
            ]
        })
        .collect();
    let mut portals = Vec::new();
    for (portal, door) in doors.iter().enumerate() {
        portals.extend(TriangleMesh::from_quads(std::slice::from_ref(door)).to_polygons(
            MeshRole::Portal { portal },
            config.epsilon,
            diagnostics,
        ));
    }

    (walls, portals)
}

fn report(level: &PortalLevel) {
    let graph = level.graph();
    let tree = level.tree();

    println!(
        "tree: {} nodes, {} leaves, depth {}",
        tree.node_count(),
        tree.leaf_count(),
        tree.depth()
    );
    println!("{} cells, {} portals", graph.cell_count(), graph.portal_count());

    for (id, cell) in graph.cells().iter().enumerate() {
        println!(
            "  cell {id}: {} polygons, portals {:?}, neighbours {:?}",
            level.cell_polygons(id).count(),
            cell.portals(),
            graph.neighbours(id)
        );
    }
    for (id, portal) in graph.portals().iter().enumerate() {
        println!("  portal {id}: cells {:?}", portal.cells());
    }

    for x in [-4.0, 0.0, 4.0, 10.0] {
        let point = Point3::new(x, 1.5, 0.0);
        let location = match level.locate(point) {
            Location::Cell(cell) => format!("cell {cell}"),
            Location::Unassigned => "unassigned".to_string(),
            Location::Solid => "solid".to_string(),
        };
        println!("  {point} -> {location}");
    }

    if !level.diagnostics().is_empty() {
        println!("{} warnings:", level.diagnostics().len());
        for warning in level.diagnostics().warnings() {
            println!("  {warning}");
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let config = match args.len() {
        1 => BuildConfig::default(),
        2 => BuildConfig::from_json_str(&fs::read_to_string(&args[1])?)?,
        _ => {
            eprintln!("Usage: {} [config.json]", args[0]);
            std::process::exit(1);
        }
    };
    log::info!("using {config:?}");

    let mut diagnostics = Diagnostics::new();
    let (walls, portals) = demo_level(&config, &mut diagnostics);
    for warning in diagnostics.warnings() {
        println!("mesh: {warning}");
    }

    let level = LevelBuilder::new(config).build(walls, portals)?;
    report(&level);

    Ok(())
}
