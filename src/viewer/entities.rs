use bevy::ecs::system::SystemParam;
use bevy::input::mouse::MouseWheel;
use bevy::prelude::*;

use super::ViewerConfig;
use crate::MapFocus;

/// Orbit state of the map camera.
#[derive(Component, Reflect)]
pub struct MapCamera {
    /// Rotation around the focus, in radians.
    pub yaw: f32,
    /// Distance from the focus.
    pub distance: f32,
}

/// Bundled input parameters for [`super::systems::steer`].
#[derive(SystemParam)]
pub struct ViewerInput<'w, 's> {
    /// Frame timing.
    pub time: Res<'w, Time>,
    /// Keyboard state.
    pub keys: Res<'w, ButtonInput<KeyCode>>,
    /// Scroll wheel messages.
    pub scroll: MessageReader<'w, 's, MouseWheel>,
    /// Camera configuration.
    pub cfg: Res<'w, ViewerConfig>,
    /// Focus point the camera orbits.
    pub focus: ResMut<'w, MapFocus>,
}
