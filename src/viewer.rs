//! Orbit camera over the map.
//!
//! WASD pans, Q/E turns, scroll zooms. Writes the focus point to
//! [`MapFocus`](crate::MapFocus), which the map brush and labels read.

mod entities;
mod systems;

pub use entities::MapCamera;

use bevy::prelude::*;

use crate::GameState;

/// Per-plugin configuration for the map camera.
#[derive(Resource, Clone, Debug, Reflect)]
pub struct ViewerConfig {
    /// Pan speed in world-units per second at the default zoom.
    pub move_speed: f32,
    /// Turn speed in radians per second.
    pub turn_speed: f32,
    /// Distance change per scroll line.
    pub scroll_sensitivity: f32,
    /// Closest allowed camera distance.
    pub min_distance: f32,
    /// Farthest allowed camera distance.
    pub max_distance: f32,
    /// Camera distance at startup.
    pub start_distance: f32,
    /// Angle above the horizon, in radians.
    pub pitch: f32,
    /// Lerp factor for the focus height following the terrain.
    pub height_lerp: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            move_speed: 25.0,
            turn_speed: 1.5,
            scroll_sensitivity: 4.0,
            min_distance: 8.0,
            max_distance: 160.0,
            start_distance: 60.0,
            pitch: 0.9,
            height_lerp: 0.1,
        }
    }
}

/// Map camera plugin.
pub struct ViewerPlugin(pub ViewerConfig);

impl Plugin for ViewerPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<MapCamera>()
            .register_type::<ViewerConfig>()
            .insert_resource(self.0.clone())
            .add_systems(Startup, systems::spawn_camera)
            .add_systems(
                Update,
                systems::steer.run_if(in_state(GameState::Running)),
            )
            .add_systems(
                Update,
                (systems::follow_terrain, systems::place_camera)
                    .chain()
                    .after(systems::steer),
            );
    }
}
