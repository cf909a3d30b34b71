#![warn(missing_docs)]
//! Hex map with rivers, terraces and a seam-free triangulation.
//!
//! The map model ([`hex_map`]) and the mesh pass ([`triangulation`]) work
//! without an `App`; [`hex_map::HexMapPlugin`] and [`viewer::ViewerPlugin`]
//! put them on screen.

pub mod error;
pub mod hex_map;
pub mod math;
pub mod triangulation;
pub mod viewer;

use bevy::prelude::*;
use hexx::Hex;

/// Application-wide game state, used for system scheduling.
#[derive(States, Default, Debug, Clone, PartialEq, Eq, Hash, Reflect)]
pub enum GameState {
    /// Camera movement and map editing.
    #[default]
    Running,
    /// Debug overlay active (Tab to toggle).
    Debugging,
}

/// Point the camera orbits. The viewer writes xz, terrain writes y.
#[derive(Resource, Default, Reflect)]
pub struct MapFocus {
    /// World position of the focus.
    pub pos: Vec3,
    /// Cell under the focus.
    pub hex: Hex,
}
