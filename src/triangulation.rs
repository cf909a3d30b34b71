//! Seam-free triangulation of a hex map.
//!
//! Every cell is triangulated independently from a fresh
//! [`CellTriangulationData`] snapshot into its own [`MeshData`] chunk, so any
//! set of cells can be rebuilt in parallel and the chunks merged afterwards.

pub mod context;
pub mod dispatch;
pub mod mesh;
pub mod routines;

pub use context::{CellTriangulationData, NeighborData};
pub use dispatch::{
    CornerCase, EdgeCase, RiverFlow, classify_corner, classify_edge, triangulate_cell,
};
pub use mesh::{MeshBuilder, MeshData};

use bevy::log::info;
use hexx::Hex;
use rayon::prelude::*;

use crate::error::Result;
use crate::hex_map::{HexMap, HexNoise};

/// Triangulates `hexes` in parallel, one chunk per cell, in input order.
///
/// The first dispatch fault aborts the pass.
pub fn triangulate_cells(
    map: &HexMap,
    noise: &HexNoise,
    hexes: &[Hex],
) -> Result<Vec<(Hex, MeshData)>> {
    hexes
        .par_iter()
        .map(|&hex| {
            triangulate_cell(map, map.rivers(), map.geometry(), noise, hex)
                .map(|chunk| (hex, chunk))
        })
        .collect()
}

/// Concatenates chunks in the order given.
pub fn merge_chunks<'a>(chunks: impl IntoIterator<Item = &'a MeshData>) -> MeshData {
    let mut mesh = MeshData::default();
    for chunk in chunks {
        mesh.merge(chunk);
    }
    mesh
}

/// Triangulates the whole map into one buffer.
pub fn triangulate_map(map: &HexMap, noise: &HexNoise) -> Result<MeshData> {
    let chunks = triangulate_cells(map, noise, &map.hexes())?;
    let mesh = merge_chunks(chunks.iter().map(|(_, chunk)| chunk));
    info!(
        "triangulated {} cells into {} triangles",
        chunks.len(),
        mesh.triangle_count()
    );
    Ok(mesh)
}
