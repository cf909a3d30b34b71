//! Per-cell snapshot read by every dispatcher and routine.

use bevy::prelude::*;
use hexx::{EdgeDirection, Hex};

use crate::error::{MapError, Result};
use crate::hex_map::geometry::{EdgeVertices, MapGeometry, hex_key};
use crate::hex_map::{CellSource, EdgeType, HexCell, RiverGraph, RiverLinks};

/// What the owning cell needs to know about one neighbour.
#[derive(Clone, Debug)]
pub struct NeighborData<'a> {
    /// Neighbour coordinate.
    pub hex: Hex,
    /// Neighbour cell.
    pub cell: &'a HexCell,
    /// Neighbour elevation level.
    pub elevation: i32,
    /// Neighbour vertex colour.
    pub color: LinearRgba,
    /// Neighbour river slots.
    pub rivers: RiverLinks,
    /// Neighbour's solid edge facing the owner, in the owner's point order.
    pub edge: EdgeVertices,
}

/// Read-only snapshot of one cell and its surroundings for one pass.
///
/// Built independently per cell from the grid alone, so any subset of cells
/// can be rebuilt in any order.
///
/// Terrain blending rides on vertex colour: every vertex carries the colour
/// of the cell it belongs to, and bridges and corners interpolate between
/// the colours of their cells step by step. There are no separate blend
/// weights.
#[derive(Clone, Debug)]
pub struct CellTriangulationData<'a> {
    /// Cell coordinate.
    pub hex: Hex,
    /// The cell.
    pub cell: &'a HexCell,
    /// Elevation level.
    pub elevation: i32,
    /// Cell centre at surface height, before perturbation.
    pub center: Vec3,
    /// Vertex colour, which doubles as the terrain blend channel.
    pub color: LinearRgba,
    /// River slots.
    pub rivers: RiverLinks,
    /// Solid edge per direction, indexed by `EdgeDirection::index`.
    pub edges: [EdgeVertices; 6],
    /// Neighbour per direction; `None` at the map boundary.
    pub neighbors: [Option<NeighborData<'a>>; 6],
    /// World layout and height constants.
    pub geometry: &'a MapGeometry,
}

impl<'a> CellTriangulationData<'a> {
    /// Snapshot of `hex`, or [`MapError::UnknownCell`] when it is not on the map.
    pub fn build(
        cells: &'a impl CellSource,
        rivers: &RiverGraph,
        geometry: &'a MapGeometry,
        hex: Hex,
    ) -> Result<Self> {
        let cell = cells.cell(hex).ok_or(MapError::UnknownCell(hex))?;
        let elevation = cell.elevation();
        let links = rivers.links(hex);
        let edges = EdgeDirection::ALL_DIRECTIONS
            .map(|d| solid_edge(geometry, hex, cell, links, d));
        let neighbors = EdgeDirection::ALL_DIRECTIONS.map(|d| {
            let n_hex = hex.neighbor(d);
            cells.cell(n_hex).map(|n| {
                let n_links = rivers.links(n_hex);
                NeighborData {
                    hex: n_hex,
                    cell: n,
                    elevation: n.elevation(),
                    color: n.color(),
                    rivers: n_links,
                    edge: solid_edge(geometry, n_hex, n, n_links, d.const_neg()).reversed(),
                }
            })
        });
        Ok(Self {
            hex,
            cell,
            elevation,
            center: geometry.center(hex, elevation),
            color: cell.color(),
            rivers: links,
            edges,
            neighbors,
            geometry,
        })
    }

    /// Solid edge facing `direction`.
    pub fn edge(&self, direction: EdgeDirection) -> &EdgeVertices {
        &self.edges[direction.index() as usize]
    }

    /// Neighbour across `direction`.
    pub fn neighbor(&self, direction: EdgeDirection) -> Option<&NeighborData<'a>> {
        self.neighbors[direction.index() as usize].as_ref()
    }

    /// Edge type toward `direction`, `None` at the map boundary.
    pub fn edge_type(&self, direction: EdgeDirection) -> Option<EdgeType> {
        self.neighbor(direction)
            .map(|n| EdgeType::between(self.elevation, n.elevation))
    }

    /// Whether the cell has a river.
    pub fn has_river(&self) -> bool {
        self.rivers.has_river()
    }

    /// Whether a river crosses the edge in `direction`.
    pub fn has_river_through_edge(&self, direction: EdgeDirection) -> bool {
        self.rivers.through_edge(direction)
    }

    /// Whether the cell cuts a stream bed: land with a river.
    pub fn carves_river(&self) -> bool {
        self.has_river() && !self.cell.is_water()
    }

    /// Centre used by the interior fan: lowered to the stream bed under a river.
    pub fn fan_center(&self) -> Vec3 {
        if self.carves_river() {
            self.center.with_y(self.geometry.stream_bed_y(self.elevation))
        } else {
            self.center
        }
    }

    /// Whether this cell builds the edge toward `direction`.
    ///
    /// Exactly one of the two cells sharing an edge owns it.
    pub fn owns_edge(direction: EdgeDirection) -> bool {
        direction.index() < direction.const_neg().index()
    }

    /// Whether this cell builds the corner between `direction` and its
    /// clockwise neighbour: both neighbours exist and this cell has the
    /// smallest coordinate of the three.
    pub fn owns_corner(&self, direction: EdgeDirection) -> bool {
        let (Some(a), Some(b)) = (self.neighbor(direction), self.neighbor(direction.clockwise()))
        else {
            return false;
        };
        let own = hex_key(self.hex);
        own < hex_key(a.hex) && own < hex_key(b.hex)
    }
}

/// A cell's solid edge at its surface height, with the middle points
/// lowered to the stream bed when a river crosses it on land.
fn solid_edge(
    geometry: &MapGeometry,
    hex: Hex,
    cell: &HexCell,
    rivers: RiverLinks,
    direction: EdgeDirection,
) -> EdgeVertices {
    let elevation = cell.elevation();
    let mut edge = geometry.inner_edge(hex, direction, geometry.surface_y(elevation));
    if rivers.through_edge(direction) && !cell.is_water() {
        let bed = geometry.stream_bed_y(elevation);
        edge.v2.y = bed;
        edge.v3.y = bed;
    }
    edge
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex_map::{MapConfig, Shape, Terrain};
    use bevy::platform::collections::HashMap;
    use hexx::shapes;

    fn fixture(radius: u32) -> (HashMap<Hex, HexCell>, RiverGraph, MapGeometry) {
        let cfg = MapConfig::default();
        let cells = shapes::hexagon(Hex::ZERO, radius)
            .map(|h| (h, HexCell::new(Terrain::Grassland, Shape::Flatlands)))
            .collect();
        (
            cells,
            RiverGraph::new(),
            MapGeometry::new(cfg.grid.point_spacing, &cfg.mesh),
        )
    }

    #[test]
    fn unknown_cell_is_an_error() {
        let (cells, rivers, geometry) = fixture(1);
        let result = CellTriangulationData::build(&cells, &rivers, &geometry, Hex::new(5, 5));
        assert!(matches!(result, Err(MapError::UnknownCell(_))));
    }

    #[test]
    fn boundary_neighbors_are_absent() {
        let (cells, rivers, geometry) = fixture(1);
        let ctx = CellTriangulationData::build(&cells, &rivers, &geometry, Hex::new(1, 0)).unwrap();
        let present = ctx.neighbors.iter().filter(|n| n.is_some()).count();
        assert_eq!(present, 3);
    }

    #[test]
    fn each_edge_has_one_owner() {
        for d in EdgeDirection::ALL_DIRECTIONS {
            assert_ne!(
                CellTriangulationData::owns_edge(d),
                CellTriangulationData::owns_edge(d.const_neg())
            );
        }
    }

    #[test]
    fn third_corner_cell_is_reached_from_the_first_neighbor() {
        let hex = Hex::new(2, -1);
        for d in EdgeDirection::ALL_DIRECTIONS {
            let across = d.const_neg().counter_clockwise();
            assert_eq!(hex.neighbor(d).neighbor(across), hex.neighbor(d.clockwise()));
        }
    }

    #[test]
    fn neighbor_edges_match_their_own_contexts() {
        let (mut cells, mut rivers, geometry) = fixture(2);
        cells.insert(Hex::ZERO, HexCell::new(Terrain::Grassland, Shape::Hills));
        let d = EdgeDirection::ALL_DIRECTIONS[1];
        assert!(rivers.set_outgoing_river(&cells, Hex::ZERO, d));
        let ctx = CellTriangulationData::build(&cells, &rivers, &geometry, Hex::ZERO).unwrap();
        for dir in EdgeDirection::ALL_DIRECTIONS {
            let n = ctx.neighbor(dir).unwrap();
            let other = CellTriangulationData::build(&cells, &rivers, &geometry, n.hex).unwrap();
            assert_eq!(n.edge, other.edge(dir.const_neg()).reversed(), "{dir:?}");
        }
    }

    #[test]
    fn corner_points_match_across_contexts() {
        let (cells, rivers, geometry) = fixture(2);
        let ctx = CellTriangulationData::build(&cells, &rivers, &geometry, Hex::ZERO).unwrap();
        for d in EdgeDirection::ALL_DIRECTIONS {
            let cw = d.clockwise();
            let a = ctx.neighbor(d).unwrap();
            let b = ctx.neighbor(cw).unwrap();
            let a_ctx = CellTriangulationData::build(&cells, &rivers, &geometry, a.hex).unwrap();
            let b_ctx = CellTriangulationData::build(&cells, &rivers, &geometry, b.hex).unwrap();
            assert_eq!(a.edge.v4, a_ctx.edge(d.const_neg()).v1);
            assert_eq!(b.edge.v1, b_ctx.edge(cw.const_neg()).v4);
        }
    }

    #[test]
    fn river_lowers_middle_points_on_both_sides() {
        let (cells, mut rivers, geometry) = fixture(1);
        let d = EdgeDirection::ALL_DIRECTIONS[0];
        assert!(rivers.set_outgoing_river(&cells, Hex::ZERO, d));
        let ctx = CellTriangulationData::build(&cells, &rivers, &geometry, Hex::ZERO).unwrap();
        let bed = geometry.stream_bed_y(2);
        assert_eq!(ctx.edge(d).v2.y, bed);
        assert_eq!(ctx.neighbor(d).unwrap().edge.v3.y, bed);
        assert_eq!(ctx.edge(d).v1.y, geometry.surface_y(2));
        assert_eq!(ctx.fan_center().y, bed);
    }

    #[test]
    fn water_cells_keep_a_level_edge() {
        let (mut cells, mut rivers, geometry) = fixture(1);
        let d = EdgeDirection::ALL_DIRECTIONS[2];
        cells.insert(Hex::ZERO.neighbor(d), HexCell::new(Terrain::ShallowWater, Shape::Flatlands));
        assert!(rivers.set_outgoing_river(&cells, Hex::ZERO, d));
        let ctx = CellTriangulationData::build(&cells, &rivers, &geometry, Hex::ZERO).unwrap();
        let water = ctx.neighbor(d).unwrap();
        assert_eq!(water.edge.v2.y, geometry.surface_y(1));
        let lake = CellTriangulationData::build(&cells, &rivers, &geometry, water.hex).unwrap();
        assert!(lake.has_river());
        assert!(!lake.carves_river());
        assert_eq!(lake.fan_center(), lake.center);
    }

    #[test]
    fn interior_cell_owns_some_corners() {
        let (cells, rivers, geometry) = fixture(2);
        let ctx = CellTriangulationData::build(&cells, &rivers, &geometry, Hex::ZERO).unwrap();
        let owned = EdgeDirection::ALL_DIRECTIONS
            .into_iter()
            .filter(|&d| ctx.owns_corner(d))
            .count();
        assert!(owned >= 1 && owned <= 5);
    }
}
