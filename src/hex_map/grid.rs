use bevy::log::debug;
use bevy::platform::collections::{HashMap, HashSet};
use bevy::prelude::*;
use hexx::{EdgeDirection, Hex, shapes};

use super::cell::{EdgeType, Feature, HexCell, Shape, Terrain, Vegetation};
use super::geometry::{MapGeometry, hex_key};
use super::rivers::{CellSource, RiverGraph};
use crate::error::{MapError, Result};

/// The editable map: cells, river graph and world layout under one owner.
///
/// Every mutator validates what it touched and marks the cell plus its six
/// neighbours dirty, so a later pass can re-triangulate only those cells.
#[derive(Clone, Debug)]
pub struct HexMap {
    cells: HashMap<Hex, HexCell>,
    rivers: RiverGraph,
    geometry: MapGeometry,
    dirty: HashSet<Hex>,
}

impl CellSource for HexMap {
    fn cell(&self, hex: Hex) -> Option<&HexCell> {
        self.cells.get(&hex)
    }
}

impl HexMap {
    /// Empty map.
    pub fn new(geometry: MapGeometry) -> Self {
        Self {
            cells: HashMap::new(),
            rivers: RiverGraph::new(),
            geometry,
            dirty: HashSet::new(),
        }
    }

    /// Hexagonal map of `radius` rings, each cell produced by `fill`.
    pub fn hexagon(radius: u32, geometry: MapGeometry, fill: impl Fn(Hex) -> HexCell) -> Self {
        let mut map = Self::new(geometry);
        for hex in shapes::hexagon(Hex::ZERO, radius) {
            map.cells.insert(hex, fill(hex));
            map.dirty.insert(hex);
        }
        map
    }

    // ── Access ─────────────────────────────────────────────────────

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when the map has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether `hex` is part of the map.
    pub fn contains(&self, hex: Hex) -> bool {
        self.cells.contains_key(&hex)
    }

    /// All coordinates, sorted so iteration order is reproducible.
    pub fn hexes(&self) -> Vec<Hex> {
        let mut hexes: Vec<Hex> = self.cells.keys().copied().collect();
        hexes.sort_by_key(|&h| hex_key(h));
        hexes
    }

    /// The river graph, read-only. Mutate through the map's river methods.
    pub fn rivers(&self) -> &RiverGraph {
        &self.rivers
    }

    /// World layout and height constants.
    pub fn geometry(&self) -> &MapGeometry {
        &self.geometry
    }

    /// The cell at `hex`, or [`MapError::UnknownCell`].
    pub fn get(&self, hex: Hex) -> Result<&HexCell> {
        self.cells.get(&hex).ok_or(MapError::UnknownCell(hex))
    }

    /// Surface height of the cell under a world-space 2D position, or 0 off the map.
    pub fn height_at(&self, pos: Vec2) -> f32 {
        let hex = self.geometry.world_pos_to_hex(pos);
        self.cells
            .get(&hex)
            .map_or(0.0, |c| self.geometry.surface_y(c.elevation()))
    }

    // ── Cell edits ─────────────────────────────────────────────────

    /// Changes the terrain of `hex`.
    pub fn set_terrain(&mut self, hex: Hex, terrain: Terrain) -> Result<()> {
        self.edit(hex, |c| c.terrain = terrain)
    }

    /// Changes the elevation class of `hex`.
    pub fn set_shape(&mut self, hex: Hex, shape: Shape) -> Result<()> {
        self.edit(hex, |c| c.shape = shape)
    }

    /// Changes the plant cover of `hex`.
    pub fn set_vegetation(&mut self, hex: Hex, vegetation: Vegetation) -> Result<()> {
        self.edit(hex, |c| c.vegetation = vegetation)
    }

    /// Changes the feature placed on `hex`.
    pub fn set_feature(&mut self, hex: Hex, feature: Feature) -> Result<()> {
        self.edit(hex, |c| c.feature = feature)
    }

    fn edit(&mut self, hex: Hex, f: impl FnOnce(&mut HexCell)) -> Result<()> {
        let cell = self.cells.get_mut(&hex).ok_or(MapError::UnknownCell(hex))?;
        f(cell);
        self.validate_cell(hex);
        self.mark_dirty(hex);
        Ok(())
    }

    // ── Roads ──────────────────────────────────────────────────────

    /// Whether a road may cross the edge of `hex` in `direction`.
    pub fn can_add_road(&self, hex: Hex, direction: EdgeDirection) -> bool {
        let (Some(a), Some(b)) = (self.cell(hex), self.neighbor(hex, direction)) else {
            return false;
        };
        !a.is_water() && !b.is_water() && EdgeType::of(a, b) != EdgeType::Cliff
    }

    /// Adds a road across an edge, on both cells. Returns `false` when illegal.
    pub fn add_road(&mut self, hex: Hex, direction: EdgeDirection) -> bool {
        if !self.can_add_road(hex, direction) {
            debug!("road ({}, {}) -> {direction:?} rejected", hex.x, hex.y);
            return false;
        }
        self.set_road(hex, direction, true);
        true
    }

    /// Removes the road across an edge, on both cells.
    pub fn remove_road(&mut self, hex: Hex, direction: EdgeDirection) {
        self.set_road(hex, direction, false);
    }

    fn set_road(&mut self, hex: Hex, direction: EdgeDirection, value: bool) {
        let other = hex.neighbor(direction);
        if let Some(c) = self.cells.get_mut(&hex) {
            c.road_edges[direction.index() as usize] = value;
        }
        if let Some(c) = self.cells.get_mut(&other) {
            c.road_edges[direction.const_neg().index() as usize] = value;
        }
        self.mark_dirty(hex);
        self.mark_dirty(other);
    }

    // ── Rivers ─────────────────────────────────────────────────────

    /// Links a river from `hex` across `direction`; see [`RiverGraph::set_outgoing_river`].
    pub fn set_outgoing_river(&mut self, hex: Hex, direction: EdgeDirection) -> bool {
        let target = hex.neighbor(direction);
        // Partners of any river edge the new one displaces.
        let displaced = [
            self.rivers.outgoing_river_direction(hex).map(|d| hex.neighbor(d)),
            self.rivers.incoming_river_direction(target).map(|d| target.neighbor(d)),
        ];
        let linked = self.rivers.set_outgoing_river(&self.cells, hex, direction);
        if linked {
            self.mark_dirty(hex);
            self.mark_dirty(target);
            for partner in displaced.into_iter().flatten() {
                self.mark_dirty(partner);
            }
        }
        linked
    }

    /// Removes the river leaving `hex`.
    pub fn remove_outgoing_river(&mut self, hex: Hex) {
        if let Some(direction) = self.rivers.outgoing_river_direction(hex) {
            self.rivers.remove_outgoing_river(hex);
            self.mark_dirty(hex);
            self.mark_dirty(hex.neighbor(direction));
        }
    }

    /// Removes the river arriving at `hex`.
    pub fn remove_incoming_river(&mut self, hex: Hex) {
        if let Some(direction) = self.rivers.incoming_river_direction(hex) {
            self.rivers.remove_incoming_river(hex);
            self.mark_dirty(hex);
            self.mark_dirty(hex.neighbor(direction));
        }
    }

    /// Removes both rivers of `hex`.
    pub fn remove_river(&mut self, hex: Hex) {
        self.remove_outgoing_river(hex);
        self.remove_incoming_river(hex);
    }

    // ── Repair ─────────────────────────────────────────────────────

    /// Removes river and road edges of `hex` that its current state no longer allows.
    ///
    /// Returns `true` when anything was removed.
    pub fn validate_cell(&mut self, hex: Hex) -> bool {
        let before = self.rivers.links(hex);
        let mut changed = self.rivers.validate_rivers(&self.cells, hex);
        if changed {
            for direction in [before.incoming, before.outgoing].into_iter().flatten() {
                self.mark_dirty(hex.neighbor(direction));
            }
        }
        for direction in EdgeDirection::ALL_DIRECTIONS {
            let has_road = self
                .cells
                .get(&hex)
                .is_some_and(|c| c.has_road_through_edge(direction));
            if has_road && !self.can_add_road(hex, direction) {
                debug!("removing road ({}, {}) -> {direction:?}", hex.x, hex.y);
                self.set_road(hex, direction, false);
                changed = true;
            }
        }
        changed
    }

    // ── Dirty tracking ─────────────────────────────────────────────

    /// Marks `hex` and its existing neighbours for re-triangulation.
    pub fn mark_dirty(&mut self, hex: Hex) {
        if self.cells.contains_key(&hex) {
            self.dirty.insert(hex);
        }
        for n in hex.all_neighbors() {
            if self.cells.contains_key(&n) {
                self.dirty.insert(n);
            }
        }
    }

    /// Drains the dirty set, sorted.
    pub fn take_dirty(&mut self) -> Vec<Hex> {
        let mut dirty: Vec<Hex> = self.dirty.drain().collect();
        dirty.sort_by_key(|&h| hex_key(h));
        dirty
    }

    /// Puts cells back into the dirty set after a failed pass, without
    /// spreading to their neighbours. Cells no longer on the map are skipped.
    pub fn restore_dirty(&mut self, hexes: &[Hex]) {
        for &hex in hexes {
            if self.cells.contains_key(&hex) {
                self.dirty.insert(hex);
            }
        }
    }
}
