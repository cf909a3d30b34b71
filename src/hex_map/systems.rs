use bevy::log::{info, warn};
use bevy::prelude::*;
use bevy_egui::egui;

use super::MapConfig;
use super::cell::{Shape, Terrain};
use super::entities::{MapChunks, MapGrid, MapMesh};
use super::generation::generate;
use super::geometry::MapGeometry;
use super::grid::HexMap;
use super::noise::HexNoise;
use crate::MapFocus;
use crate::triangulation::{MeshData, merge_chunks, triangulate_cells};
use crate::viewer::MapCamera;

// ── Startup ─────────────────────────────────────────────────────────

/// Generates the map, runs the first full pass and spawns the mesh entity.
///
/// A failed pass still spawns the entity with an empty mesh and leaves every
/// cell dirty, so [`retriangulate_dirty`] retries them on the next frame.
pub fn generate_map(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut chunks: ResMut<MapChunks>,
    cfg: Res<MapConfig>,
) {
    let geometry = MapGeometry::new(cfg.grid.point_spacing, &cfg.mesh);
    let mut map = generate(&cfg.grid, geometry);
    let noise = HexNoise::from_settings(&cfg.noise);

    let hexes = map.take_dirty();
    match triangulate_cells(&map, &noise, &hexes) {
        Ok(built) => chunks.chunks.extend(built),
        Err(e) => {
            warn!("initial triangulation failed: {e}");
            map.restore_dirty(&hexes);
        }
    }
    let mesh = merged(&map, &chunks);
    info!(
        "map ready: {} cells, {} triangles",
        map.len(),
        mesh.triangle_count()
    );

    let material = materials.add(StandardMaterial {
        base_color: Color::WHITE,
        perceptual_roughness: 0.9,
        cull_mode: None,
        ..default()
    });

    commands.spawn((
        Name::new("HexMap"),
        MapMesh,
        MapGrid { map, noise },
        Mesh3d(meshes.add(mesh.into_mesh())),
        MeshMaterial3d(material),
        Transform::default(),
        Visibility::default(),
    ));

    commands.spawn((
        Name::new("Sun"),
        DirectionalLight {
            illuminance: 9_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(30.0, 60.0, 20.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

// ── Update: editing ────────────────────────────────────────────────

/// Keyboard brush applied to the focused cell.
///
/// `1`/`2`/`3` set flatlands, hills or mountains, `4` floods the cell,
/// `5` drains it back to grassland and `R` removes its rivers.
pub fn shape_brush(
    keys: Res<ButtonInput<KeyCode>>,
    focus: Res<MapFocus>,
    mut grid_q: Query<&mut MapGrid>,
) {
    let Ok(mut grid) = grid_q.single_mut() else {
        return;
    };
    let hex = focus.hex;
    let map = &mut grid.map;
    if !map.contains(hex) {
        return;
    }

    let result = if keys.just_pressed(KeyCode::Digit1) {
        map.set_shape(hex, Shape::Flatlands)
    } else if keys.just_pressed(KeyCode::Digit2) {
        map.set_shape(hex, Shape::Hills)
    } else if keys.just_pressed(KeyCode::Digit3) {
        map.set_shape(hex, Shape::Mountains)
    } else if keys.just_pressed(KeyCode::Digit4) {
        map.set_terrain(hex, Terrain::ShallowWater)
    } else if keys.just_pressed(KeyCode::Digit5) {
        map.set_terrain(hex, Terrain::Grassland)
    } else if keys.just_pressed(KeyCode::KeyR) {
        map.remove_river(hex);
        Ok(())
    } else {
        return;
    };
    if let Err(e) = result {
        warn!("brush edit at ({}, {}) failed: {e}", hex.x, hex.y);
    }
}

/// Re-triangulates every dirty cell and swaps in the rebuilt mesh.
///
/// On failure the cells go back into the dirty set and the old chunks stay.
pub fn retriangulate_dirty(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut chunks: ResMut<MapChunks>,
    mut grid_q: Query<(Entity, &mut MapGrid), With<MapMesh>>,
) {
    let Ok((entity, mut grid)) = grid_q.single_mut() else {
        return;
    };
    let dirty = grid.map.take_dirty();
    if dirty.is_empty() {
        return;
    }

    match triangulate_cells(&grid.map, &grid.noise, &dirty) {
        Ok(built) => {
            chunks.chunks.extend(built);
            let mesh = merged(&grid.map, &chunks);
            info!(
                "re-triangulated {} cells, {} triangles total",
                dirty.len(),
                mesh.triangle_count()
            );
            commands
                .entity(entity)
                .insert(Mesh3d(meshes.add(mesh.into_mesh())));
        }
        Err(e) => {
            warn!("re-triangulation of {} cells failed: {e}", dirty.len());
            grid.map.restore_dirty(&dirty);
        }
    }
}

/// All chunks concatenated in map order.
fn merged(map: &HexMap, chunks: &MapChunks) -> MeshData {
    merge_chunks(map.hexes().iter().filter_map(|h| chunks.chunks.get(h)))
}

// ── Debug overlay ──────────────────────────────────────────────────

/// Draws coordinate, terrain, elevation and a river mark for cells near the
/// focus as egui labels.
pub fn draw_cell_labels(
    mut egui_ctx: Query<&mut bevy_egui::EguiContext>,
    camera_q: Query<(&Camera, &GlobalTransform), With<MapCamera>>,
    grid_q: Query<&MapGrid>,
    focus: Res<MapFocus>,
    mut ready: Local<bool>,
) {
    // egui is not initialised on the first frame.
    if !*ready {
        *ready = true;
        return;
    }
    let Ok((camera, cam_gt)) = camera_q.single() else {
        return;
    };
    let Ok(grid) = grid_q.single() else {
        return;
    };
    let Ok(mut ctx) = egui_ctx.single_mut() else {
        return;
    };

    let painter = ctx.get_mut().layer_painter(egui::LayerId::background());
    let geometry = grid.map.geometry();
    let rivers = grid.map.rivers();

    for hex in focus.hex.range(4) {
        let Ok(cell) = grid.map.get(hex) else {
            continue;
        };
        let world_pos = geometry.center(hex, cell.elevation());
        if let Ok(viewport) = camera.world_to_viewport(cam_gt, world_pos) {
            let river = if rivers.has_river(hex) { " ~" } else { "" };
            painter.text(
                egui::pos2(viewport.x, viewport.y),
                egui::Align2::CENTER_CENTER,
                format!(
                    "{},{} {:?} e{}{river}",
                    hex.x,
                    hex.y,
                    cell.terrain,
                    cell.elevation()
                ),
                egui::FontId::proportional(11.0),
                egui::Color32::WHITE,
            );
        }
    }
}
