use std::fs;

use image::Rgba;
use tabletop_core::{Material, MaterialRegistry, Point, Rgb, TileGrid};
use tabletop_render::canvas::block_mean;
use tabletop_render::{Compositor, PngSink, RenderConfig, Scene, Session};
use tabletop_vision::{FogPreset, FogState, LightingEngine};

fn compositor(cell: u32) -> Compositor {
    Compositor::new(&RenderConfig {
        cell_size: cell,
        ..RenderConfig::default()
    })
}

#[test]
fn minimal_map_render() {
    let mut grid = TileGrid::new(2, 1);
    grid.put_tile(Point::new(0, 0), "grass");
    grid.put_tile(Point::new(1, 0), "water");
    let registry = MaterialRegistry::builtin();
    let mut fog = FogState::new(2, 1);
    fog.reveal_all();
    let lighting = LightingEngine::default();
    let scene = Scene {
        grid: &grid,
        registry: &registry,
        fog: Some(&fog),
        lighting: Some(&lighting),
    };

    let img = compositor(16).render_map(&scene, 0);
    assert_eq!(img.dimensions(), (32, 16));
    let left = block_mean(&img, 0, 0, 16, 16);
    let right = block_mean(&img, 16, 0, 16, 16);
    assert!(left[1] - left[0] >= 30.0, "grass {left:?}");
    assert!(right[2] - right[0] >= 40.0, "water {right:?}");
}

#[test]
fn unknown_material_renders_grey() {
    let mut grid = TileGrid::new(2, 1);
    grid.put_tile(Point::new(1, 0), "no-such-material");
    let registry = MaterialRegistry::builtin();
    let img = compositor(8).render_map(&Scene::tiles(&grid, &registry), 0);
    for y in 0..8 {
        for x in 8..16 {
            assert_eq!(img.get_pixel(x, y), &Rgba([128, 128, 128, 255]));
        }
        assert_eq!(img.get_pixel(0, y), &Rgba([0, 0, 0, 255]));
    }
}

#[test]
fn village_overhang_stays_in_its_column() {
    let cell = 8;
    let mut grid = TileGrid::new(3, 5);
    grid.put_tile(Point::new(1, 4), "village");
    let registry = MaterialRegistry::builtin();
    let mut comp = compositor(cell);

    for frame in [0, 37, 120] {
        let img = comp.render_map(&Scene::tiles(&grid, &registry), frame);
        for (x, y, p) in img.enumerate_pixels() {
            let (cx, cy) = (x / cell, y / cell);
            if cx != 1 || !(2..=4).contains(&cy) {
                assert_eq!(p, &Rgba([0, 0, 0, 255]), "pixel ({x}, {y}) at frame {frame}");
            }
        }
        let ground = block_mean(&img, cell, 4 * cell, cell, cell);
        assert!(ground.iter().sum::<f32>() > 60.0);
    }
}

#[test]
fn village_on_top_row_is_clipped() {
    let mut grid = TileGrid::new(1, 1);
    grid.fill("village");
    let registry = MaterialRegistry::builtin();
    let img = compositor(8).render_map(&Scene::tiles(&grid, &registry), 3);
    assert_eq!(img.dimensions(), (8, 8));
}

#[test]
fn session_presents_to_png() {
    let dir = tempfile::tempdir().unwrap();
    let mut grid = TileGrid::new(6, 4);
    grid.fill("sand");
    let config = RenderConfig {
        cell_size: 8,
        display_width: 96,
        display_height: 64,
        present_every: 1,
        ..RenderConfig::default()
    };
    let mut session = Session::new(config, MaterialRegistry::builtin(), grid);
    session.position_slot().publish(Point::new(2, 2));

    let mut sink = PngSink::new(dir.path().join("frame.png"));
    assert!(session.tick(&mut sink).unwrap());
    assert_eq!(sink.presented(), 1);

    let frame = image::open(sink.path()).unwrap().to_rgba8();
    assert_eq!(frame.dimensions(), (96, 64));
    // revealed sand around the player is brighter than fog elsewhere
    let open = block_mean(&frame, 32, 32, 16, 16);
    let hidden = block_mean(&frame, 0, 0, 8, 8);
    assert!(open[0] > hidden[0]);
}

#[test]
fn map_round_trips_through_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("map.json");

    let mut session =
        Session::new(RenderConfig::default(), MaterialRegistry::builtin(), TileGrid::new(5, 4));
    session.grid_mut().fill("grass");
    session
        .add_custom_material("moss", Material::new("Moss", Rgb::new(40, 120, 40)))
        .unwrap();
    session.paint_tile(Point::new(1, 1), "moss");
    session.paint_tile(Point::new(3, 2), "torch");
    session.save_map(&path).unwrap();

    let config = RenderConfig {
        initial_fog: FogPreset::Centre { radius: 1 },
        ..RenderConfig::default()
    };
    let reopened = Session::open(config, MaterialRegistry::builtin(), &path).unwrap();
    assert_eq!(reopened.grid().get(Point::new(1, 1)), Some("moss"));
    assert_eq!(reopened.grid().get(Point::new(0, 0)), Some("grass"));
    assert!(reopened.registry().is_custom("moss"));
    assert_eq!(reopened.lighting().lights(), session.lighting().lights());
    // fog is not part of the map: a loaded map starts from the seed area
    assert_eq!(reopened.fog().revealed_count(), 5);
    assert!(reopened.fog().is_revealed(Point::new(2, 2)));
    assert!(!reopened.fog().is_revealed(Point::new(0, 0)));
}

#[test]
fn failed_load_keeps_current_map() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, r#"{"width": 2, "height": 2, "tiles": [["grass"]]}"#).unwrap();

    let mut grid = TileGrid::new(3, 3);
    grid.fill("snow");
    let mut session =
        Session::new(RenderConfig::default(), MaterialRegistry::builtin(), grid.clone());
    assert!(session.load_map(&path).is_err());
    assert_eq!(session.grid(), &grid);
}

#[test]
fn export_writes_full_map() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.png");
    let mut grid = TileGrid::new(3, 2);
    grid.fill("stone");
    let mut session = Session::new(
        RenderConfig {
            cell_size: 10,
            fog_enabled: false,
            ..RenderConfig::default()
        },
        MaterialRegistry::builtin(),
        grid,
    );
    session.export_png(&path).unwrap();
    let img = image::open(&path).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (30, 20));
}
