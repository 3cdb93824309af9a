use glam::Vec3;
use image::{Rgb, RgbImage};
use tempfile::tempdir;

use tsuchi::gpu::HeadlessBackend;
use tsuchi::render::cache::ResourceCache;
use tsuchi::render::{RenderEngine, RenderEngineInfo, RenderError};
use tsuchi::terrain::{self, Terrain, TerrainInfo, WorldBounds};

fn write_gradient_heightmap(dir: &std::path::Path, name: &str, size: u32) {
    let img = RgbImage::from_fn(size, size, |x, y| {
        let value = (x * size + y) as u8;
        Rgb([value, value, value])
    });
    img.save(dir.join(name)).unwrap();
}

fn terrain_info(tag: &str, heightmap: &str) -> TerrainInfo {
    TerrainInfo {
        tag: tag.to_string(),
        heightmap: heightmap.to_string(),
        level: 25.0,
        square_size: 1.0,
        origin: Vec3::ZERO,
        bounds: None,
    }
}

#[test]
fn manifest_drives_terrain_loading() {
    tsuchi::init_logging();
    let dir = tempdir().unwrap();
    write_gradient_heightmap(dir.path(), "island.png", 8);
    std::fs::write(
        dir.path().join("terrains.json"),
        r#"{"terrains":[{"tag":"island","heightmap":"island.png","level":25.0}]}"#,
    )
    .unwrap();

    let mut engine = RenderEngine::new(&RenderEngineInfo {
        application_path: dir.path().to_str().unwrap().to_string(),
        headless: true,
    })
    .unwrap();
    engine.load_manifest("terrains.json").unwrap();

    let island = engine.terrain("island").expect("terrain not registered");
    assert_eq!(island.grid().width(), 8);
    // 7x7 cells, two triangles each, non-indexed.
    assert_eq!(island.vertex_count(), 6 * 7 * 7);
    assert!(engine.cache().contains_vertex_array("island"));

    engine.render();
    engine.shutdown();
}

#[test]
fn grid_corner_height_round_trips_through_the_pipeline() {
    let dir = tempdir().unwrap();
    write_gradient_heightmap(dir.path(), "corner.png", 8);

    let mut engine = RenderEngine::new(&RenderEngineInfo {
        application_path: dir.path().to_str().unwrap().to_string(),
        headless: true,
    })
    .unwrap();
    engine
        .register_terrain(&terrain_info("corner", "corner.png"))
        .unwrap();

    // Raw sample at (3, 2) is 3*8+2 = 26; leveled by 25 it lands on the mesh
    // corner exactly, so the query must reproduce it.
    let expected = 26.0 / 25.0;
    let sampled = engine.height_at("corner", 3.0, -2.0, 0.0);
    assert!((sampled - expected).abs() < 1e-4);

    // Out of bounds keeps the flat fallback plus offset.
    assert_eq!(engine.height_at("corner", 40.0, -2.0, 1.5), 1.5);
    // Unknown tags fall back the same way.
    assert_eq!(engine.height_at("nowhere", 1.0, -1.0, 0.5), 0.5);
}

#[test]
fn reloading_a_tag_reuses_the_cached_mesh() {
    let dir = tempdir().unwrap();
    write_gradient_heightmap(dir.path(), "reuse.png", 4);
    let path = dir.path().join("reuse.png");

    let mut backend = HeadlessBackend::new();
    let mut cache = ResourceCache::new();
    let info = terrain_info("reuse", "reuse.png");

    Terrain::load(&info, &path, &mut backend, &mut cache).unwrap();
    let after_first = backend.total_allocations();

    // Same tag again: the mesh stage is skipped, nothing new is allocated.
    Terrain::load(&info, &path, &mut backend, &mut cache).unwrap();
    assert_eq!(backend.total_allocations(), after_first);

    cache.unload_all(&mut backend);
    assert_eq!(backend.live_objects(), 0);
}

#[test]
fn bad_heightmaps_abort_registration() {
    let dir = tempdir().unwrap();
    // 100x100 is not a power of two.
    let img = RgbImage::from_pixel(100, 100, Rgb([0, 0, 0]));
    img.save(dir.path().join("bad.png")).unwrap();
    std::fs::write(dir.path().join("garbage.png"), b"never an image").unwrap();

    let mut engine = RenderEngine::new(&RenderEngineInfo {
        application_path: dir.path().to_str().unwrap().to_string(),
        headless: true,
    })
    .unwrap();

    match engine.register_terrain(&terrain_info("bad", "bad.png")) {
        Err(RenderError::Terrain(terrain::Error::Dimensions(e))) => {
            assert_eq!(e.width, 100);
            assert_eq!(e.height, 100);
        }
        other => panic!("expected dimension error, got {:?}", other.map(|_| ())),
    }
    match engine.register_terrain(&terrain_info("garbage", "garbage.png")) {
        Err(RenderError::Terrain(terrain::Error::Decode(_))) => {}
        other => panic!("expected decode error, got {:?}", other.map(|_| ())),
    }
    // Neither failed load left a terrain behind.
    assert!(engine.terrain("bad").is_none());
    assert!(engine.terrain("garbage").is_none());
}

#[test]
fn bounds_are_editable_without_reload() {
    let dir = tempdir().unwrap();
    write_gradient_heightmap(dir.path(), "clamped.png", 4);

    let mut engine = RenderEngine::new(&RenderEngineInfo {
        application_path: dir.path().to_str().unwrap().to_string(),
        headless: true,
    })
    .unwrap();
    let mut info = terrain_info("clamped", "clamped.png");
    info.bounds = Some(WorldBounds {
        min: Vec3::new(0.0, -5.0, -3.0),
        max: Vec3::new(3.0, 5.0, 0.0),
    });
    engine.register_terrain(&info).unwrap();

    let bounds = engine.bounds("clamped").unwrap();
    assert_eq!(
        bounds.clamp(Vec3::new(9.0, 0.0, 1.0)),
        Vec3::new(3.0, 0.0, 0.0)
    );

    // Tighten the bounds in place; no rebuild needed.
    let terrain = engine.terrain_mut("clamped").unwrap();
    terrain.set_bounds(WorldBounds {
        min: Vec3::ZERO,
        max: Vec3::splat(1.0),
    });
    assert_eq!(engine.bounds("clamped").unwrap().max, Vec3::splat(1.0));
}

#[test]
fn manifest_round_trips_through_serde() {
    use tsuchi::render::TerrainManifest;

    let manifest = TerrainManifest {
        terrains: vec![TerrainInfo {
            tag: "island".to_string(),
            heightmap: "island.png".to_string(),
            level: 25.0,
            square_size: 2.0,
            origin: Vec3::new(10.0, 0.0, -4.0),
            bounds: Some(WorldBounds {
                min: Vec3::ZERO,
                max: Vec3::splat(64.0),
            }),
        }],
    };

    let json = serde_json::to_string(&manifest).unwrap();
    let restored: TerrainManifest = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.terrains.len(), 1);
    let info = &restored.terrains[0];
    assert_eq!(info.tag, "island");
    assert_eq!(info.square_size, 2.0);
    assert_eq!(info.origin, Vec3::new(10.0, 0.0, -4.0));
    assert_eq!(info.bounds.unwrap().max, Vec3::splat(64.0));
}
