//! Hex map: cells, river topology, geometry, generation and the Bevy plugin.
//!
//! The data model is usable without an `App`; the plugin wraps it in a single
//! [`MapGrid`] entity and keeps its mesh in sync with edits.

mod cell;
mod entities;
pub mod generation;
pub mod geometry;
mod grid;
pub mod noise;
pub mod rivers;
mod systems;

pub use cell::{EdgeType, Feature, HexCell, Shape, Terrain, Vegetation};
pub use entities::{MapChunks, MapGrid, MapMesh};
pub use geometry::{EdgeVertices, MapGeometry};
pub use grid::HexMap;
pub use noise::HexNoise;
pub use rivers::{CellSource, RiverGraph, RiverLinks, RiverRejection};

use bevy::prelude::*;

use crate::GameState;

/// Nested configuration for the map subsystem.
#[derive(Resource, Clone, Debug, Reflect)]
pub struct MapConfig {
    /// Map shape and generation settings.
    pub grid: GridSettings,
    /// Mesh geometry constants.
    pub mesh: MeshSettings,
    /// Vertex perturbation noise.
    pub noise: NoiseSettings,
    /// Background clear color.
    pub clear_color: Color,
}

/// Map shape and generation parameters.
#[derive(Clone, Debug, Reflect)]
pub struct GridSettings {
    /// Number of hex rings around the origin.
    pub radius: u32,
    /// Distance in world-units between adjacent hex centers.
    pub point_spacing: f32,
    /// Seed for terrain noise and river placement.
    pub seed: u32,
    /// Number of rivers to grow.
    pub river_count: usize,
    /// Longest river, in cells.
    pub max_river_length: usize,
    /// Number of octaves for height noise.
    pub height_noise_octaves: usize,
    /// Spatial scale divisor for height noise sampling.
    pub height_noise_scale: f64,
    /// Spatial scale divisor for moisture noise sampling.
    pub moisture_noise_scale: f64,
}

/// Geometry constants of the triangulated mesh.
#[derive(Clone, Debug, Reflect)]
pub struct MeshSettings {
    /// World height of one elevation level.
    pub elevation_step: f32,
    /// Fraction of the hex covered by its flat interior.
    pub solid_factor: f32,
    /// Flat treads per slope; a slope has `2 * n + 1` terrace steps.
    pub terraces_per_slope: u32,
    /// River bed height relative to the surface, in elevation levels.
    pub stream_bed_offset: f32,
    /// River water height relative to the surface, in elevation levels.
    pub river_surface_offset: f32,
    /// Height of overlays above the base geometry.
    pub overlay_lift: f32,
}

/// Seeded noise used to roughen vertex positions.
#[derive(Clone, Debug, Reflect)]
pub struct NoiseSettings {
    /// Noise seed.
    pub seed: u32,
    /// Number of fBm octaves.
    pub octaves: usize,
    /// Spatial scale divisor.
    pub scale: f64,
    /// Maximum horizontal displacement of a vertex.
    pub perturb_strength: f32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            grid: GridSettings {
                radius: 16,
                point_spacing: 4.0,
                seed: 42,
                river_count: 12,
                max_river_length: 40,
                height_noise_octaves: 4,
                height_noise_scale: 60.0,
                moisture_noise_scale: 45.0,
            },
            mesh: MeshSettings::default(),
            noise: NoiseSettings::default(),
            clear_color: Color::srgb(0.55, 0.70, 0.85),
        }
    }
}

impl Default for MeshSettings {
    fn default() -> Self {
        Self {
            elevation_step: 1.2,
            solid_factor: 0.75,
            terraces_per_slope: 2,
            stream_bed_offset: -0.7,
            river_surface_offset: -0.3,
            overlay_lift: 0.03,
        }
    }
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            seed: 7,
            octaves: 3,
            scale: 8.0,
            perturb_strength: 0.35,
        }
    }
}

/// Map plugin: generation and first triangulation at startup, incremental
/// re-triangulation of edited cells afterwards.
pub struct HexMapPlugin(pub MapConfig);

impl Plugin for HexMapPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<MapConfig>()
            .register_type::<MapMesh>()
            .insert_resource(self.0.clone())
            .insert_resource(ClearColor(self.0.clear_color))
            .init_resource::<MapChunks>()
            .add_systems(Startup, systems::generate_map)
            .add_systems(
                Update,
                systems::shape_brush.run_if(in_state(GameState::Running)),
            )
            .add_systems(
                Update,
                systems::retriangulate_dirty
                    .after(systems::shape_brush)
                    .run_if(any_with_component::<MapGrid>),
            );

        app.add_systems(
            Update,
            systems::draw_cell_labels.run_if(in_state(GameState::Debugging)),
        );
    }
}
