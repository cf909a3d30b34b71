use bevy::platform::collections::HashMap;
use bevy::prelude::*;
use hexx::Hex;

use super::grid::HexMap;
use super::noise::HexNoise;
use crate::triangulation::MeshData;

/// Central component holding the editable map.
///
/// Spawned once at startup on the same entity as the [`MapMesh`].
#[derive(Component)]
pub struct MapGrid {
    /// Cells, rivers and layout.
    pub map: HexMap,
    /// Vertex perturbation used by every pass.
    pub noise: HexNoise,
}

/// Last triangulated chunk of every cell.
///
/// A partial pass replaces only the chunks of dirty cells; the render mesh is
/// the concatenation of all chunks in map order.
#[derive(Resource, Default)]
pub struct MapChunks {
    /// Chunk per cell.
    pub chunks: HashMap<Hex, MeshData>,
}

/// Marker on the entity carrying the merged map mesh.
#[derive(Component, Reflect)]
pub struct MapMesh;
