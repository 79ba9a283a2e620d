//! Benchmark for scene validation, payload building and array encoding.
//!
//! Builds a synthetic project of point sets, gridded surfaces and volumes,
//! then times full validation, the first (forced) sync plan and a second
//! plan after a small edit.
//!
//! Usage: bench-scene [config.json]
//!
//! Set `RUST_LOG=geoscene=debug` to see the library's logging.

use std::fs;
use std::time::Instant;

use geoscene::{Handle, Limits, ObjectKind, Scene, SceneConfig, SyncPlan};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

// =============================================================================
// CONFIGURATION
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct BenchConfig {
    seed: u64,
    point_sets: usize,
    points_per_set: usize,
    surfaces: usize,
    grid_cells: usize,
    volumes: usize,
    volume_cells: usize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            point_sets: 20,
            points_per_set: 50_000,
            surfaces: 10,
            grid_cells: 400,
            volumes: 4,
            volume_cells: 60,
        }
    }
}

// =============================================================================
// REPORT
// =============================================================================

#[derive(Debug, Serialize)]
struct Timing {
    stage: &'static str,
    millis: f64,
}

#[derive(Debug, Serialize)]
struct Report {
    objects: usize,
    resources: usize,
    project_bytes: u64,
    first_sync_entries: usize,
    first_sync_binary_bytes: usize,
    edit_sync_entries: usize,
    edit_sync_binary_bytes: usize,
    timings: Vec<Timing>,
}

fn timed<T>(timings: &mut Vec<Timing>, stage: &'static str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let out = f();
    let elapsed = start.elapsed();
    info!(stage, ?elapsed, "stage finished");
    timings.push(Timing {
        stage,
        millis: elapsed.as_secs_f64() * 1000.0,
    });
    out
}

// =============================================================================
// SYNTHETIC SCENE
// =============================================================================

fn random_widths(rng: &mut StdRng, n: usize) -> Vec<f64> {
    (0..n).map(|_| rng.gen_range(0.5..5.0)).collect()
}

fn build_point_set(scene: &mut Scene, rng: &mut StdRng, index: usize, n: usize) -> Handle {
    let vertices: Vec<[f64; 3]> = (0..n)
        .map(|_| {
            [
                rng.gen_range(-1000.0..1000.0),
                rng.gen_range(-1000.0..1000.0),
                rng.gen_range(-200.0..0.0),
            ]
        })
        .collect();
    let depth: Vec<f64> = vertices.iter().map(|v| -v[2]).collect();
    let facies: Vec<i64> = (0..n).map(|_| rng.gen_range(-1..8)).collect();

    scene
        .build(ObjectKind::Point, |p| {
            p.title(&format!("Samples {}", index))
                .mesh(ObjectKind::Mesh0D, |m| m.set("vertices", vertices))
                .data("N", ObjectKind::DataArray, |d| d.title("Depth").set("array", depth))
                .data("N", ObjectKind::DataCategory, |d| {
                    d.title("Facies")
                        .set("array", facies)
                        .set("categories", (0..8).map(|i| format!("F{}", i)).collect::<Vec<_>>())
                })
        })
        .expect("Failed to build point set")
}

fn build_surface(scene: &mut Scene, rng: &mut StdRng, index: usize, cells: usize) -> Handle {
    let side = (cells as f64).sqrt().ceil() as usize;
    let h1 = random_widths(rng, side);
    let h2 = random_widths(rng, side);
    let nodes = (side + 1) * (side + 1);
    let z: Vec<f64> = (0..nodes).map(|_| rng.gen_range(-10.0..10.0)).collect();
    let values: Vec<f64> = (0..side * side).map(|_| rng.gen_range(0.0..100.0)).collect();

    scene
        .build(ObjectKind::Surface, |s| {
            s.title(&format!("Horizon {}", index))
                .mesh(ObjectKind::Mesh2DGrid, |m| {
                    m.set("h1", h1).set("h2", h2).set("Z", z)
                })
                .data("CC", ObjectKind::DataDiscrete, |d| {
                    d.set("array", values).set("end_values", vec![25.0, 50.0, 75.0])
                })
        })
        .expect("Failed to build surface")
}

fn build_volume(scene: &mut Scene, rng: &mut StdRng, index: usize, cells: usize) -> Handle {
    let side = (cells as f64).cbrt().ceil() as usize;
    let values: Vec<f64> = (0..side * side * side).map(|_| rng.gen_range(1.0..3.0)).collect();
    let (h1, h2, h3) = (
        random_widths(rng, side),
        random_widths(rng, side),
        random_widths(rng, side),
    );

    scene
        .build(ObjectKind::Volume, |v| {
            v.title(&format!("Density {}", index))
                .mesh(ObjectKind::Mesh3DGrid, |m| {
                    m.set("h1", h1).set("h2", h2).set("h3", h3)
                })
                .data("CC", ObjectKind::DataArray, |d| d.set("array", values))
        })
        .expect("Failed to build volume")
}

fn build_project(scene: &mut Scene, config: &BenchConfig) -> (Handle, Vec<Handle>) {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut resources = Vec::new();
    for i in 0..config.point_sets {
        resources.push(build_point_set(scene, &mut rng, i, config.points_per_set));
    }
    for i in 0..config.surfaces {
        resources.push(build_surface(scene, &mut rng, i, config.grid_cells));
    }
    for i in 0..config.volumes {
        resources.push(build_volume(scene, &mut rng, i, config.volume_cells));
    }
    let project = scene
        .build(ObjectKind::Project, |p| {
            p.title("Synthetic survey").set("resources", resources.clone())
        })
        .expect("Failed to build project");
    (project, resources)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config: BenchConfig = match std::env::args().nth(1) {
        Some(path) => {
            let text = fs::read_to_string(&path).expect("Failed to read config");
            serde_json::from_str(&text).expect("Failed to parse config")
        }
        None => BenchConfig::default(),
    };
    info!(?config, "building synthetic scene");

    let limits = Limits::with_default_quota();
    let mut scene = Scene::with_config(SceneConfig::new().with_seed(config.seed).with_limits(limits));
    let mut timings = Vec::new();

    let (project, resources) = timed(&mut timings, "build", || build_project(&mut scene, &config));
    timed(&mut timings, "validate", || scene.validate_all(project)).expect("Validation failed");
    let project_bytes = scene.total_byte_size(project).expect("Failed to size project");

    let first: SyncPlan = timed(&mut timings, "plan_first_sync", || scene.plan_sync(project))
        .expect("Failed to plan sync");
    scene.complete_sync(&first).expect("Failed to complete sync");

    if let Some(&resource) = resources.first() {
        scene.set(resource, "title", "Edited samples").expect("Failed to edit title");
    }
    if let Some(&resource) = resources.last() {
        let mesh = scene
            .get(resource, "mesh")
            .expect("Unknown resource")
            .and_then(|v| v.as_object())
            .expect("Resource without mesh");
        scene.set(mesh, "x0", [100.0, 0.0, 0.0]).expect("Failed to move mesh");
    }
    let edit: SyncPlan = timed(&mut timings, "plan_edit_sync", || scene.plan_sync(project))
        .expect("Failed to plan sync");

    let report = Report {
        objects: scene.len(),
        resources: resources.len(),
        project_bytes,
        first_sync_entries: first.len(),
        first_sync_binary_bytes: first.binary_len(),
        edit_sync_entries: edit.len(),
        edit_sync_binary_bytes: edit.binary_len(),
        timings,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&report).expect("Failed to serialize report")
    );
}
