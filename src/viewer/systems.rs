use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::input::mouse::MouseScrollUnit;
use bevy::prelude::*;
use bevy::render::view::Hdr;

use super::ViewerConfig;
use super::entities::{MapCamera, ViewerInput};
use crate::MapFocus;
use crate::hex_map::MapGrid;
use crate::math;

/// Spawns the Camera3d entity looking at the map origin.
pub fn spawn_camera(mut commands: Commands, cfg: Res<ViewerConfig>) {
    let offset = math::orbit_offset(0.0, cfg.pitch, cfg.start_distance);
    commands.spawn((
        Name::new("MapCamera"),
        Camera3d::default(),
        Hdr,
        Tonemapping::TonyMcMapface,
        Transform::from_translation(offset).looking_at(Vec3::ZERO, Vec3::Y),
        MapCamera {
            yaw: 0.0,
            distance: cfg.start_distance,
        },
    ));
}

/// WASD pans the focus in the camera's ground plane, Q/E turn, scroll zooms.
pub fn steer(mut input: ViewerInput, mut cam_q: Query<&mut MapCamera>) {
    let Ok(mut cam) = cam_q.single_mut() else {
        return;
    };
    let dt = input.time.delta_secs();

    if input.keys.pressed(KeyCode::KeyQ) {
        cam.yaw += input.cfg.turn_speed * dt;
    }
    if input.keys.pressed(KeyCode::KeyE) {
        cam.yaw -= input.cfg.turn_speed * dt;
    }

    for ev in input.scroll.read() {
        let lines = match ev.unit {
            MouseScrollUnit::Line => ev.y,
            MouseScrollUnit::Pixel => ev.y / 40.0,
        };
        cam.distance = (cam.distance - lines * input.cfg.scroll_sensitivity)
            .clamp(input.cfg.min_distance, input.cfg.max_distance);
    }

    // Forward points from the camera toward the focus.
    let back = math::orbit_offset(cam.yaw, 0.0, 1.0);
    let forward = Vec3::new(-back.x, 0.0, -back.z);
    let right = Vec3::new(-forward.z, 0.0, forward.x);

    let mut direction = Vec3::ZERO;
    if input.keys.pressed(KeyCode::KeyW) {
        direction += forward;
    }
    if input.keys.pressed(KeyCode::KeyS) {
        direction -= forward;
    }
    if input.keys.pressed(KeyCode::KeyD) {
        direction += right;
    }
    if input.keys.pressed(KeyCode::KeyA) {
        direction -= right;
    }

    if direction != Vec3::ZERO {
        // Pan faster when zoomed out.
        let zoom = cam.distance / input.cfg.start_distance;
        let delta = direction.normalize() * input.cfg.move_speed * zoom * dt;
        input.focus.pos.x += delta.x;
        input.focus.pos.z += delta.z;
    }
}

/// Eases the focus height toward the terrain and records the focused cell.
pub fn follow_terrain(
    grid_q: Query<&MapGrid>,
    mut focus: ResMut<MapFocus>,
    cfg: Res<ViewerConfig>,
) {
    let Ok(grid) = grid_q.single() else {
        return;
    };

    let xz = Vec2::new(focus.pos.x, focus.pos.z);
    let target = grid.map.height_at(xz);
    focus.pos.y += (target - focus.pos.y) * cfg.height_lerp;

    let hex = grid.map.geometry().world_pos_to_hex(xz);
    if hex != focus.hex {
        focus.hex = hex;
    }
}

/// Moves the camera to its orbit position around the focus.
pub fn place_camera(
    focus: Res<MapFocus>,
    cfg: Res<ViewerConfig>,
    mut cam_q: Query<(&MapCamera, &mut Transform)>,
) {
    let Ok((cam, mut transform)) = cam_q.single_mut() else {
        return;
    };
    let eye = focus.pos + math::orbit_offset(cam.yaw, cfg.pitch, cam.distance);
    *transform = Transform::from_translation(eye).looking_at(focus.pos, Vec3::Y);
}
