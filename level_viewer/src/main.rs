//! Headless level viewer
//!
//! Builds a small demo level, then drives the render cache through a few
//! editing frames against the recording backend and logs what every frame
//! cost. Pass a `.toml` or `.ron` settings file as the first argument to
//! override the default renderer settings.

use render_cache::foundation::logging;
use render_cache::prelude::*;
use render_cache::render::{BatchSlot, FrameStats};

/// Errors that stop the viewer
#[derive(thiserror::Error, Debug)]
enum ViewerError {
    #[error("Failed to load settings: {0}")]
    Config(#[from] ConfigError),

    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),
}

/// Node ids the edit script refers to
struct DemoLevel {
    scene: Scene,
    crate_stack: NodeId,
    detail_group: NodeId,
}

fn quad(min: Vec3, max: Vec3, texture: &str) -> Face {
    Face::new(vec![
        Vec3::new(min.x, min.y, min.z),
        Vec3::new(max.x, min.y, min.z),
        Vec3::new(max.x, max.y, max.z),
        Vec3::new(min.x, max.y, max.z),
    ])
    .with_texture(texture)
}

fn room(size: f32) -> NodeKind {
    let h = size / 2.0;
    NodeKind::Solid {
        faces: vec![
            quad(Vec3::new(-h, -h, 0.0), Vec3::new(h, h, 0.0), "floor_tile"),
            quad(Vec3::new(-h, -h, 0.0), Vec3::new(-h, h, size), "wall_brick"),
            quad(Vec3::new(h, -h, 0.0), Vec3::new(h, h, size), "wall_brick"),
            quad(Vec3::new(-h, h, size), Vec3::new(h, -h, size), "ceiling"),
        ],
    }
}

fn build_level() -> DemoLevel {
    let mut scene = Scene::new();
    let root = scene.root();
    let barrel = scene.add_model(ModelResource::new(
        "barrel",
        vec![vec![quad(Vec3::new(-8.0, -8.0, 0.0), Vec3::new(8.0, 8.0, 32.0), "barrel_side")]],
    ));

    scene.add_node(root, room(512.0));
    let crate_stack = scene
        .add_node(root, NodeKind::Group)
        .unwrap_or(root);
    for x in [-64.0, 0.0, 64.0] {
        scene.add_node(crate_stack, NodeKind::Solid {
            faces: vec![quad(Vec3::new(x, 0.0, 0.0), Vec3::new(x + 32.0, 32.0, 32.0), "crate")],
        });
    }
    for y in [-128.0, 128.0] {
        scene.add_node(root, NodeKind::Model {
            entity: EntityData::at(Vec3::new(128.0, y, 0.0), 16.0),
            model: barrel,
            hide_distance: 2048.0,
        });
    }
    scene.add_node(root, NodeKind::Entity(EntityData::at(Vec3::new(0.0, 0.0, 64.0), 8.0)));
    scene.add_node(root, NodeKind::Decal {
        entity: EntityData::at(Vec3::new(-255.0, 0.0, 64.0), 4.0),
        geometry: vec![quad(Vec3::new(-255.0, -16.0, 48.0), Vec3::new(-255.0, 16.0, 80.0), "{scorch")],
    });

    let detail_group = scene.add_node(root, NodeKind::Group).unwrap_or(root);
    scene.add_node(detail_group, room(64.0));

    DemoLevel { scene, crate_stack, detail_group }
}

fn log_frame(label: &str, stats: FrameStats) {
    log::info!(
        "{:<28} rebuilt={:<5} batches={} models={} model_bounds={} grid_lines={}",
        label,
        stats.rebuilt,
        stats.batches_submitted,
        stats.models_submitted,
        stats.models_as_bounds,
        stats.grid_lines
    );
}

fn run() -> Result<(), ViewerError> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading renderer settings from {}", path);
            RenderCacheConfig::load_from_file(&path)?
        }
        None => RenderCacheConfig::default(),
    };

    let DemoLevel { mut scene, crate_stack, detail_group } = build_level();
    let mut backend = RecordingBackend::new();
    let mut controller = RenderCacheController::new(config);
    let top = View2D { zoom: 0.25, ..View2D::default() };
    let perspective = View3D {
        style: ViewStyle::Textured,
        camera_position: Vec3::new(0.0, -400.0, 128.0),
        ..View3D::default()
    };

    log_frame("first 2D frame", controller.draw_2d(&scene, &top, &mut backend)?);
    log_frame("first 3D frame", controller.draw_3d(&scene, &perspective, &mut backend)?);
    log_frame("idle 3D frame", controller.draw_3d(&scene, &perspective, &mut backend)?);

    scene.set_selected(crate_stack, true);
    controller.invalidate_nodes(&[crate_stack]);
    log_frame("select crate stack", controller.draw_3d(&scene, &perspective, &mut backend)?);

    for x in [16.0, 32.0, 48.0] {
        controller.set_selection_transform(Mat4::new_translation(&Vec3::new(x, 0.0, 0.0)));
        log_frame("drag selection", controller.draw_2d(&scene, &top, &mut backend)?);
    }

    controller.set_selection_transform(Mat4::identity());
    scene.set_selected(crate_stack, false);
    scene.set_flag(detail_group, NodeFlags::HIDDEN_BY_GROUP, true);
    controller.invalidate();
    controller.invalidate_nodes(&[crate_stack, detail_group]);
    log_frame("commit and hide detail", controller.draw_3d(&scene, &perspective, &mut backend)?);

    let mut settings = controller.config().clone();
    settings.model_rendering = false;
    controller.set_config(settings);
    log_frame("models off", controller.draw_3d(&scene, &perspective, &mut backend)?);

    let far = View3D { camera_position: Vec3::new(0.0, -4096.0, 128.0), ..perspective };
    let mut settings = controller.config().clone();
    settings.model_rendering = true;
    controller.set_config(settings);
    log_frame("models on, far camera", controller.draw_3d(&scene, &far, &mut backend)?);

    log::info!(
        "{} rebuilds, {} batches compiled, {} primitives in the static 3D batch, {} cached models",
        controller.rebuild_count(),
        backend.compile_count(),
        controller
            .batch(BatchSlot::Untransformed3DTextured)
            .map_or(0, |batch| batch.primitives().len()),
        controller.model_cache().len()
    );

    controller.dispose(&mut backend);
    log::info!(
        "Disposed: {} live batches, {} double releases",
        backend.live_batch_count(),
        backend.double_releases()
    );
    Ok(())
}

fn main() {
    logging::init();
    if let Err(error) = run() {
        log::error!("{}", error);
        std::process::exit(1);
    }
}
