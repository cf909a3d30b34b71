//! Edge and corner case selection.
//!
//! Classification is a pure function of cell state and yields a tagged case;
//! [`triangulate_cell`] then hands each case to exactly one routine. A state
//! no case covers is an invariant breach and aborts the pass with a
//! [`MapError`] naming the cell, the direction and the offending state.

use bevy::log::warn;
use bevy::prelude::*;
use hexx::{EdgeDirection, Hex};

use super::context::CellTriangulationData;
use super::mesh::{MeshBuilder, MeshData};
use super::routines;
use crate::error::{MapError, Result};
use crate::hex_map::{
    CellSource, EdgeType, EdgeVertices, HexNoise, MapGeometry, RiverGraph, RiverLinks,
};

// ── Edge cases ─────────────────────────────────────────────────────

/// Geometry family of the bridge between two cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeCase {
    /// Plain quad strip between equal elevations.
    Flat,
    /// Terraced staircase across one elevation level.
    Slope,
    /// Single steep wall, never terraced.
    Cliff,
    /// A river crosses the edge.
    River(RiverEdge),
}

/// River bridge variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RiverEdge {
    /// Trough and water between cells of equal elevation.
    Channel,
    /// Terraced trough with sloping water.
    TerracedChannel,
    /// The upstream cell is the river's source; the water starts at its edge.
    Spring {
        /// Whether the edge is a slope.
        terraced: bool,
    },
    /// The river runs into a water cell.
    Mouth {
        /// Whether the edge is a slope.
        terraced: bool,
    },
}

/// Case for the bridge toward `direction`, or `None` at the map boundary.
pub fn classify_edge(
    ctx: &CellTriangulationData,
    direction: EdgeDirection,
) -> Result<Option<EdgeCase>> {
    let Some(n) = ctx.neighbor(direction) else {
        return Ok(None);
    };
    let edge_type = EdgeType::between(ctx.elevation, n.elevation);
    if !ctx.has_river_through_edge(direction) {
        return Ok(Some(match edge_type {
            EdgeType::Flat => EdgeCase::Flat,
            EdgeType::Slope => EdgeCase::Slope,
            EdgeType::Cliff => EdgeCase::Cliff,
        }));
    }

    let fault = |case: String| MapError::UnmatchedEdge {
        cell: ctx.hex,
        direction,
        case,
    };
    if !n.rivers.through_edge(direction.const_neg()) {
        return Err(fault(format!(
            "river on one side only: {:?} vs {:?}",
            ctx.rivers, n.rivers
        )));
    }
    let downstream_here = ctx.rivers.outgoing == Some(direction);
    let (upstream, downstream_is_water) = if downstream_here {
        (ctx.rivers, n.cell.is_water())
    } else {
        (n.rivers, ctx.cell.is_water())
    };
    let terraced = edge_type == EdgeType::Slope;
    let river = match edge_type {
        EdgeType::Cliff => {
            return Err(fault(format!(
                "river across a cliff ({} vs {})",
                ctx.elevation, n.elevation
            )));
        }
        _ if downstream_is_water => RiverEdge::Mouth { terraced },
        _ if upstream.has_begin_or_end() => RiverEdge::Spring { terraced },
        EdgeType::Slope => RiverEdge::TerracedChannel,
        EdgeType::Flat => RiverEdge::Channel,
    };
    Ok(Some(EdgeCase::River(river)))
}

// ── Corner cases ───────────────────────────────────────────────────

/// Turn of a river through the middle cell of a confluence.
///
/// Corner slots are ordered so that, seen from any slot, the next slot is one
/// `counter_clockwise()` step from the previous one. `CounterClockwise` means
/// the downstream slot is the one after the middle slot, `(middle + 1) % 3`,
/// and the upstream slot the one before it. `Clockwise` is the reverse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RiverFlow {
    /// Downstream is the slot before the middle slot.
    Clockwise,
    /// Downstream is the slot after the middle slot.
    CounterClockwise,
}

impl RiverFlow {
    /// The other orientation.
    pub fn opposite(self) -> Self {
        match self {
            RiverFlow::Clockwise => RiverFlow::CounterClockwise,
            RiverFlow::CounterClockwise => RiverFlow::Clockwise,
        }
    }
}

/// Slots of a corner triangle named by role. Slot indexes refer to
/// `[cell, neighbour across d, neighbour across d.clockwise()]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CornerOrder {
    /// Slot the terraces or the cliff start from.
    pub begin: usize,
    /// Next slot after `begin`.
    pub left: usize,
    /// Last slot.
    pub right: usize,
}

impl CornerOrder {
    fn new(begin: usize, left: usize, right: usize) -> Self {
        Self { begin, left, right }
    }
}

/// Terrain shape of a corner triangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerrainCorner {
    /// All three cells level.
    Flat,
    /// Two slopes meeting a flat edge; both slopes terrace out of `begin`.
    Terraced(CornerOrder),
    /// Two or more cliffs and no slope.
    DoubleCliff,
    /// Terraces from `begin` to `left` collapsing onto the cliff toward `right`.
    TerracesCliff(CornerOrder),
    /// Terraces from `begin` to `right` collapsing onto the cliff toward `left`.
    CliffTerraces(CornerOrder),
}

/// Whether a river endpoint at a corner is a source or a sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RiverEnd {
    /// The river starts in the endpoint cell.
    Spring,
    /// The river ends in the endpoint cell.
    Mouth,
}

/// The single highest cell of an endpoint corner, relative to the endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElevatedSide {
    /// The slot after the endpoint.
    Left,
    /// The slot before the endpoint.
    Right,
    /// The endpoint cell itself.
    Center,
}

/// Terrain around a river endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndpointShape {
    /// A mouth with open water at the corner.
    ShallowWaterDelta,
    /// A cliff at the corner.
    Waterfall,
    /// All three cells level.
    Level,
    /// One cell lower than the other two.
    DoubleTerrace,
    /// One cell higher than the other two.
    FlatTerraceElevated(ElevatedSide),
}

/// River configuration at a corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RiverCorner {
    /// A cell on a corner river edge is where the river begins or ends.
    Endpoint {
        /// Source or sink.
        end: RiverEnd,
        /// Slot of the endpoint cell.
        slot: usize,
        /// Pair carrying the river out of or into `slot`.
        pair: usize,
        /// Terrain around it.
        shape: EndpointShape,
    },
    /// Two or more river edges pass through the corner.
    Confluence {
        /// Slot of the cell both edges belong to.
        middle: usize,
        /// Orientation at `middle`.
        flow: RiverFlow,
    },
    /// One river edge touches the corner.
    Curve {
        /// Index of the pair carrying the river.
        pair: usize,
    },
}

/// Case of a corner triangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CornerCase {
    /// No river edge meets the corner.
    Terrain(TerrainCorner),
    /// At least one river edge meets the corner.
    River {
        /// River configuration.
        river: RiverCorner,
        /// Underlying terrain shape.
        terrain: TerrainCorner,
    },
}

/// Everything corner classification reads, per slot and per pair.
///
/// Pair `k` joins slot `k` and slot `k + 1` (mod 3).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CornerState {
    /// Elevation per slot.
    pub elevations: [i32; 3],
    /// Whether each slot is a water cell.
    pub water: [bool; 3],
    /// Whether each slot is a river begin or end.
    pub begin_or_end: [bool; 3],
    /// River across each pair, as the slot it flows into.
    pub rivers: [Option<usize>; 3],
}

impl CornerState {
    /// Edge type of pair `k`.
    pub fn edge_type(&self, pair: usize) -> EdgeType {
        EdgeType::between(self.elevations[pair], self.elevations[(pair + 1) % 3])
    }

    fn pair_has(pair: usize, slot: usize) -> bool {
        pair == slot || (pair + 1) % 3 == slot
    }

    fn river_pairs(&self) -> impl Iterator<Item = usize> + '_ {
        (0..3).filter(|&k| self.rivers[k].is_some())
    }
}

/// Classifies the terrain of a corner from its three elevations.
pub fn classify_terrain(elevations: [i32; 3]) -> TerrainCorner {
    let [e0, e1, e2] = elevations;
    let (bottom, left, right) = if e0 <= e1 && e0 <= e2 {
        (0, 1, 2)
    } else if e1 <= e2 {
        (1, 2, 0)
    } else {
        (2, 0, 1)
    };
    let edge = |a: usize, b: usize| EdgeType::between(elevations[a], elevations[b]);
    match (edge(bottom, left), edge(bottom, right)) {
        (EdgeType::Slope, EdgeType::Slope) => {
            TerrainCorner::Terraced(CornerOrder::new(bottom, left, right))
        }
        (EdgeType::Slope, EdgeType::Flat) => {
            TerrainCorner::Terraced(CornerOrder::new(left, right, bottom))
        }
        (EdgeType::Slope, EdgeType::Cliff) => {
            TerrainCorner::TerracesCliff(CornerOrder::new(bottom, left, right))
        }
        (EdgeType::Flat, EdgeType::Slope) => {
            TerrainCorner::Terraced(CornerOrder::new(right, bottom, left))
        }
        (_, EdgeType::Slope) => TerrainCorner::CliffTerraces(CornerOrder::new(bottom, left, right)),
        _ if edge(left, right) == EdgeType::Slope => {
            if elevations[left] < elevations[right] {
                TerrainCorner::CliffTerraces(CornerOrder::new(right, bottom, left))
            } else {
                TerrainCorner::TerracesCliff(CornerOrder::new(left, right, bottom))
            }
        }
        (EdgeType::Flat, EdgeType::Flat) => TerrainCorner::Flat,
        _ => TerrainCorner::DoubleCliff,
    }
}

/// Classifies a corner. The error describes the state no case covers.
pub fn classify_corner(state: &CornerState) -> std::result::Result<CornerCase, String> {
    let terrain = classify_terrain(state.elevations);
    let pairs: Vec<usize> = state.river_pairs().collect();
    if pairs.is_empty() {
        return Ok(CornerCase::Terrain(terrain));
    }
    if let Some(&k) = pairs
        .iter()
        .find(|&&k| state.edge_type(k) == EdgeType::Cliff)
    {
        return Err(format!("river across a cliff on pair {k}: {state:?}"));
    }

    let on_river = |slot: usize| pairs.iter().any(|&k| CornerState::pair_has(k, slot));
    let endpoint = (0..3).find(|&s| on_river(s) && state.begin_or_end[s]);
    let river = if let Some(slot) = endpoint {
        let end = endpoint_end(state, slot);
        let pair = pairs
            .iter()
            .copied()
            .find(|&k| CornerState::pair_has(k, slot))
            .unwrap_or(pairs[0]);
        RiverCorner::Endpoint {
            end,
            slot,
            pair,
            shape: endpoint_shape(state, slot, end),
        }
    } else if pairs.len() >= 2 {
        confluence(state, &pairs)?
    } else {
        RiverCorner::Curve { pair: pairs[0] }
    };
    Ok(CornerCase::River { river, terrain })
}

fn endpoint_end(state: &CornerState, slot: usize) -> RiverEnd {
    let flows_out = state
        .river_pairs()
        .filter(|&k| CornerState::pair_has(k, slot))
        .any(|k| state.rivers[k] != Some(slot));
    if flows_out {
        RiverEnd::Spring
    } else {
        RiverEnd::Mouth
    }
}

fn endpoint_shape(state: &CornerState, slot: usize, end: RiverEnd) -> EndpointShape {
    let e = state.elevations;
    if end == RiverEnd::Mouth && state.water.iter().any(|&w| w) {
        return EndpointShape::ShallowWaterDelta;
    }
    if (0..3).any(|k| state.edge_type(k) == EdgeType::Cliff) {
        return EndpointShape::Waterfall;
    }
    let (min, max) = (e[0].min(e[1]).min(e[2]), e[0].max(e[1]).max(e[2]));
    if min == max {
        return EndpointShape::Level;
    }
    if e.iter().filter(|&&x| x == min).count() == 1 {
        return EndpointShape::DoubleTerrace;
    }
    let high = (0..3).find(|&s| e[s] == max).unwrap_or(slot);
    EndpointShape::FlatTerraceElevated(if high == slot {
        ElevatedSide::Center
    } else if high == (slot + 1) % 3 {
        ElevatedSide::Left
    } else {
        ElevatedSide::Right
    })
}

fn confluence(state: &CornerState, pairs: &[usize]) -> std::result::Result<RiverCorner, String> {
    let middle = (0..3)
        .find(|&s| pairs.iter().filter(|&&k| CornerState::pair_has(k, s)).count() >= 2)
        .ok_or_else(|| format!("river pairs without a shared cell: {state:?}"))?;
    let mut inflow = None;
    let mut outflow = None;
    for &k in pairs.iter().filter(|&&k| CornerState::pair_has(k, middle)) {
        let other = if k == middle { (k + 1) % 3 } else { k };
        match state.rivers[k] {
            Some(s) if s == middle => inflow = Some(other),
            Some(s) => outflow = Some(s),
            None => {}
        }
    }
    let (Some(_), Some(downstream)) = (inflow, outflow) else {
        return Err(format!(
            "slot {middle} lacks an incoming or outgoing river: {state:?}"
        ));
    };
    // Seen from any slot, the next slot lies counter-clockwise of the previous one.
    let flow = if downstream == (middle + 1) % 3 {
        RiverFlow::CounterClockwise
    } else {
        RiverFlow::Clockwise
    };
    Ok(RiverCorner::Confluence { middle, flow })
}

// ── Corner view of a context ───────────────────────────────────────

/// One cell of a corner triangle together with its corner point.
#[derive(Clone, Copy, Debug)]
pub struct CornerCell {
    /// Cell coordinate.
    pub hex: Hex,
    /// Elevation level.
    pub elevation: i32,
    /// Vertex colour.
    pub color: LinearRgba,
    /// Whether the cell is water.
    pub water: bool,
    /// River slots of the cell.
    pub rivers: RiverLinks,
    /// The cell's solid corner point, before perturbation.
    pub point: Vec3,
    /// Middle points of the cell's edges toward the next and the previous
    /// slot, whichever lies nearer the corner. Only `x` and `z` are meaningful.
    pub banks: [Vec3; 2],
}

/// The three cells around the corner between `direction` and its clockwise
/// neighbour, in slot order, or `None` when one is off the map.
pub fn corner_cells(
    ctx: &CellTriangulationData,
    direction: EdgeDirection,
) -> Option<[CornerCell; 3]> {
    let n1 = ctx.neighbor(direction)?;
    let n2 = ctx.neighbor(direction.clockwise())?;
    let g = ctx.geometry;
    let across = direction.const_neg().counter_clockwise();
    let points = [ctx.edge(direction).v4, n1.edge.v4, n2.edge.v1];
    let banks = |slot: usize, next: &EdgeVertices, prev: &EdgeVertices| {
        [near_middle(next, points[slot]), near_middle(prev, points[slot])]
    };
    Some([
        CornerCell {
            hex: ctx.hex,
            elevation: ctx.elevation,
            color: ctx.color,
            water: ctx.cell.is_water(),
            rivers: ctx.rivers,
            point: points[0],
            banks: banks(0, ctx.edge(direction), ctx.edge(direction.clockwise())),
        },
        CornerCell {
            hex: n1.hex,
            elevation: n1.elevation,
            color: n1.color,
            water: n1.cell.is_water(),
            rivers: n1.rivers,
            point: points[1],
            banks: banks(1, &g.inner_edge(n1.hex, across, 0.0), &n1.edge),
        },
        CornerCell {
            hex: n2.hex,
            elevation: n2.elevation,
            color: n2.color,
            water: n2.cell.is_water(),
            rivers: n2.rivers,
            point: points[2],
            banks: banks(2, &n2.edge, &g.inner_edge(n2.hex, across.const_neg(), 0.0)),
        },
    ])
}

/// The middle point of `edge` nearer to `corner` in the horizontal plane.
fn near_middle(edge: &EdgeVertices, corner: Vec3) -> Vec3 {
    let (v2, v3) = edge.middle();
    let to = |p: Vec3| p.xz().distance_squared(corner.xz());
    if to(v2) <= to(v3) { v2 } else { v3 }
}

/// Classification input for the corner between `direction` and its
/// clockwise neighbour.
pub fn corner_state(cells: &[CornerCell; 3], direction: EdgeDirection) -> CornerState {
    let cw = direction.clockwise();
    // Direction from the first neighbour to the second.
    let across = direction.const_neg().counter_clockwise();
    let pair = |links: RiverLinks, d: EdgeDirection, here: usize, there: usize| {
        links
            .through_edge(d)
            .then(|| if links.outgoing == Some(d) { there } else { here })
    };
    CornerState {
        elevations: cells.map(|c| c.elevation),
        water: cells.map(|c| c.water),
        begin_or_end: cells.map(|c| c.rivers.has_begin_or_end()),
        rivers: [
            pair(cells[0].rivers, direction, 0, 1),
            pair(cells[1].rivers, across, 1, 2),
            pair(cells[0].rivers, cw, 0, 2),
        ],
    }
}

// ── Per-cell driver ────────────────────────────────────────────────

/// Builds the mesh contribution of one cell: its interior, the edges and
/// corners it owns, and its overlays.
pub fn triangulate_cell(
    cells: &impl CellSource,
    rivers: &RiverGraph,
    geometry: &MapGeometry,
    noise: &HexNoise,
    hex: Hex,
) -> Result<MeshData> {
    let ctx = CellTriangulationData::build(cells, rivers, geometry, hex)?;
    let mut data = MeshData::default();
    let mut builder = MeshBuilder::new(&mut data, noise);

    routines::center(&mut builder, &ctx);
    for direction in EdgeDirection::ALL_DIRECTIONS {
        if CellTriangulationData::owns_edge(direction)
            && let Some(case) = classify_edge(&ctx, direction).inspect_err(|e| warn!("{e}"))?
        {
            routines::edge(&mut builder, &ctx, direction, case);
        }
        if ctx.owns_corner(direction)
            && let Some(corner) = corner_cells(&ctx, direction)
        {
            let state = corner_state(&corner, direction);
            let case = classify_corner(&state).map_err(|case| {
                let e = MapError::UnmatchedCorner {
                    cell: hex,
                    direction,
                    case,
                };
                warn!("{e}");
                e
            })?;
            routines::corner(&mut builder, &ctx, &corner, case);
        }
    }
    routines::overlays(&mut builder, &ctx);
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex_map::{HexCell, MapConfig, Shape, Terrain};
    use bevy::platform::collections::HashMap;
    use hexx::shapes;

    struct Fixture {
        cells: HashMap<Hex, HexCell>,
        rivers: RiverGraph,
        geometry: MapGeometry,
    }

    impl Fixture {
        fn flat(radius: u32) -> Self {
            let cfg = MapConfig::default();
            Self {
                cells: shapes::hexagon(Hex::ZERO, radius)
                    .map(|h| (h, HexCell::new(Terrain::Grassland, Shape::Flatlands)))
                    .collect(),
                rivers: RiverGraph::new(),
                geometry: MapGeometry::new(cfg.grid.point_spacing, &cfg.mesh),
            }
        }

        fn set(&mut self, hex: Hex, terrain: Terrain, shape: Shape) {
            self.cells.insert(hex, HexCell::new(terrain, shape));
        }

        fn river(&mut self, hex: Hex, d: EdgeDirection) {
            assert!(self.rivers.set_outgoing_river(&self.cells, hex, d), "{hex:?} {d:?}");
        }

        fn ctx(&self, hex: Hex) -> CellTriangulationData<'_> {
            CellTriangulationData::build(&self.cells, &self.rivers, &self.geometry, hex).unwrap()
        }

        /// Every owned corner case of the map, keyed by owner and direction.
        fn corner_cases(&self) -> Vec<(Hex, EdgeDirection, Result<CornerCase>)> {
            let mut out = Vec::new();
            for &hex in self.cells.keys() {
                let ctx = self.ctx(hex);
                for d in EdgeDirection::ALL_DIRECTIONS {
                    if !ctx.owns_corner(d) {
                        continue;
                    }
                    let corner = corner_cells(&ctx, d).unwrap();
                    let case = classify_corner(&corner_state(&corner, d)).map_err(|case| {
                        MapError::UnmatchedCorner {
                            cell: hex,
                            direction: d,
                            case,
                        }
                    });
                    out.push((hex, d, case));
                }
            }
            out
        }
    }

    fn dir(i: usize) -> EdgeDirection {
        EdgeDirection::ALL_DIRECTIONS[i]
    }

    fn state(elevations: [i32; 3]) -> CornerState {
        CornerState {
            elevations,
            water: [false; 3],
            begin_or_end: [false; 3],
            rivers: [None; 3],
        }
    }

    // ── Edges ──────────────────────────────────────────────────────

    #[test]
    fn flat_grassland_uses_plain_quads_and_flat_corners() {
        let f = Fixture::flat(2);
        for &hex in f.cells.keys() {
            let ctx = f.ctx(hex);
            for d in EdgeDirection::ALL_DIRECTIONS {
                match classify_edge(&ctx, d).unwrap() {
                    Some(case) => assert_eq!(case, EdgeCase::Flat),
                    None => assert!(ctx.neighbor(d).is_none()),
                }
            }
        }
        for (_, _, case) in f.corner_cases() {
            assert_eq!(case.unwrap(), CornerCase::Terrain(TerrainCorner::Flat));
        }
    }

    #[test]
    fn cliff_rejects_rivers_and_is_a_single_wall() {
        let mut f = Fixture::flat(1);
        let d = dir(0);
        f.set(Hex::ZERO, Terrain::Grassland, Shape::Flatlands);
        f.set(Hex::ZERO.neighbor(d), Terrain::DeepWater, Shape::Flatlands);
        assert!(!f.rivers.set_outgoing_river(&f.cells, Hex::ZERO, d));
        let ctx = f.ctx(Hex::ZERO);
        assert_eq!(classify_edge(&ctx, d).unwrap(), Some(EdgeCase::Cliff));

        let noise = HexNoise::from_settings(&MapConfig::default().noise);
        let mut data = MeshData::default();
        routines::edge(&mut MeshBuilder::new(&mut data, &noise), &ctx, d, EdgeCase::Cliff);
        assert_eq!(data.triangle_count(), 6);
    }

    #[test]
    fn slope_is_a_staircase_and_flat_third_cell_terraces_the_corner() {
        let mut f = Fixture::flat(1);
        let d = dir(1);
        f.set(Hex::ZERO, Terrain::ShallowWater, Shape::Flatlands);
        f.set(Hex::ZERO.neighbor(d), Terrain::DeepWater, Shape::Flatlands);
        f.set(Hex::ZERO.neighbor(d.clockwise()), Terrain::ShallowWater, Shape::Flatlands);
        let ctx = f.ctx(Hex::ZERO);
        assert_eq!(classify_edge(&ctx, d).unwrap(), Some(EdgeCase::Slope));

        let noise = HexNoise::from_settings(&MapConfig::default().noise);
        let mut data = MeshData::default();
        routines::edge(&mut MeshBuilder::new(&mut data, &noise), &ctx, d, EdgeCase::Slope);
        assert_eq!(data.triangle_count(), 6 * f.geometry.terrace_steps as usize);

        let corner = corner_cells(&ctx, d).unwrap();
        let case = classify_corner(&corner_state(&corner, d)).unwrap();
        assert!(matches!(case, CornerCase::Terrain(TerrainCorner::Terraced(_))), "{case:?}");
    }

    #[test]
    fn river_edges_are_classified_by_their_ends() {
        let mut f = Fixture::flat(3);
        let a = Hex::ZERO;
        let b = a.neighbor(dir(0));
        let c = b.neighbor(dir(0));
        f.set(a, Terrain::Grassland, Shape::Hills);
        f.set(c, Terrain::FreshWater, Shape::Flatlands);
        f.river(a, dir(0));
        f.river(b, dir(0));

        let spring = classify_edge(&f.ctx(a), dir(0)).unwrap();
        assert_eq!(spring, Some(EdgeCase::River(RiverEdge::Spring { terraced: true })));
        let mouth = classify_edge(&f.ctx(b), dir(0)).unwrap();
        assert_eq!(mouth, Some(EdgeCase::River(RiverEdge::Mouth { terraced: true })));
        // The same edge seen from downstream.
        let back = classify_edge(&f.ctx(b), dir(0).const_neg()).unwrap();
        assert_eq!(back, spring);
    }

    #[test]
    fn channel_between_two_river_cells() {
        let mut f = Fixture::flat(3);
        let p = Hex::ZERO.neighbor(dir(0).const_neg());
        f.river(p, dir(0));
        f.river(Hex::ZERO, dir(0));
        f.river(Hex::ZERO.neighbor(dir(0)), dir(0));
        let case = classify_edge(&f.ctx(Hex::ZERO), dir(0)).unwrap();
        assert_eq!(case, Some(EdgeCase::River(RiverEdge::Channel)));
    }

    #[test]
    fn river_on_a_cliff_aborts_the_pass() {
        let mut f = Fixture::flat(2);
        let d = dir(2);
        f.river(Hex::ZERO, d);
        // Bypass the edit path: raise the source behind the graph's back.
        f.set(Hex::ZERO, Terrain::Grassland, Shape::Mountains);
        let ctx = f.ctx(Hex::ZERO);
        assert!(matches!(
            classify_edge(&ctx, d),
            Err(MapError::UnmatchedEdge { direction, .. }) if direction == d
        ));
        let noise = HexNoise::from_settings(&MapConfig::default().noise);
        let result = triangulate_cell(&f.cells, &f.rivers, &f.geometry, &noise, Hex::ZERO);
        assert!(result.is_err());
        assert!(f.corner_cases().iter().any(|(_, _, c)| c.is_err()));
    }

    // ── Corners ────────────────────────────────────────────────────

    #[test]
    fn straight_flow_through_three_cells_is_a_confluence() {
        let mut f = Fixture::flat(3);
        let a = Hex::ZERO;
        let b = a.neighbor(dir(0));
        let c = a.neighbor(dir(0).clockwise());
        let b_to_c = dir(0).const_neg().counter_clockwise();
        assert_eq!(b.neighbor(b_to_c), c);

        let upstream = a.neighbor(dir(0).counter_clockwise());
        let d_up = EdgeDirection::ALL_DIRECTIONS
            .into_iter()
            .find(|&d| upstream.neighbor(d) == a)
            .unwrap();
        f.river(upstream, d_up);
        f.river(a, dir(0));
        f.river(b, b_to_c);
        let out = EdgeDirection::ALL_DIRECTIONS
            .into_iter()
            .find(|&d| {
                let n = c.neighbor(d);
                n != a && n != b && f.cells.contains_key(&n) && !f.rivers.has_river(n)
            })
            .unwrap();
        f.river(c, out);

        for hex in [a, b, c] {
            assert!(f.rivers.has_river(hex) && !f.rivers.has_river_begin_or_end(hex));
        }
        let ctx = f.ctx(a);
        let corner = corner_cells(&ctx, dir(0)).unwrap();
        let case = classify_corner(&corner_state(&corner, dir(0))).unwrap();
        assert!(
            matches!(
                case,
                CornerCase::River {
                    river: RiverCorner::Confluence {
                        middle: 1,
                        flow: RiverFlow::CounterClockwise
                    },
                    ..
                }
            ),
            "{case:?}"
        );
        // At the middle cell the river turns one counter-clockwise step.
        let b_links = f.rivers.links(b);
        let from_b = b_links.incoming.unwrap();
        assert_eq!(b.neighbor(from_b), a);
        assert_eq!(b_links.outgoing, Some(from_b.counter_clockwise()));
    }

    #[test]
    fn endpoint_names_the_pair_it_drains() {
        let mut s = state([2, 2, 2]);
        s.rivers = [None, None, Some(0)];
        s.begin_or_end = [false, false, true];
        let case = classify_corner(&s).unwrap();
        assert!(
            matches!(
                case,
                CornerCase::River {
                    river: RiverCorner::Endpoint {
                        slot: 2,
                        pair: 2,
                        end: RiverEnd::Spring,
                        ..
                    },
                    ..
                }
            ),
            "{case:?}"
        );
    }

    #[test]
    fn corner_banks_sit_beside_their_corner_point() {
        let f = Fixture::flat(2);
        let ctx = f.ctx(Hex::ZERO);
        for d in EdgeDirection::ALL_DIRECTIONS {
            let three = corner_cells(&ctx, d).unwrap();
            for k in 0..3 {
                let (here, there) = (&three[k], &three[(k + 1) % 3]);
                // The two banks of a pair face each other across the bridge.
                let gap = here.banks[0].xz().distance(there.banks[1].xz());
                let reach = here.point.xz().distance(there.point.xz());
                assert!(gap < reach * 1.5, "{d:?} pair {k}: {gap} vs {reach}");
                for bank in here.banks {
                    let near = bank.xz().distance(here.point.xz());
                    assert!(near < reach, "{d:?} slot {k}");
                }
            }
        }
    }

    #[test]
    fn confluence_flow_follows_slot_order() {
        let mut s = state([2, 2, 2]);
        s.rivers = [Some(1), Some(2), None];
        let case = classify_corner(&s).unwrap();
        assert_eq!(
            case,
            CornerCase::River {
                river: RiverCorner::Confluence {
                    middle: 1,
                    flow: RiverFlow::CounterClockwise
                },
                terrain: TerrainCorner::Flat
            }
        );
        s.rivers = [Some(0), Some(1), None];
        let CornerCase::River {
            river: RiverCorner::Confluence { flow, .. },
            ..
        } = classify_corner(&s).unwrap()
        else {
            panic!("expected a confluence");
        };
        assert_eq!(flow, RiverFlow::Clockwise);
        assert_eq!(flow.opposite(), RiverFlow::CounterClockwise);
    }

    #[test]
    fn endpoint_shapes() {
        let mut s = state([2, 2, 2]);
        s.rivers = [Some(1), None, None];
        s.begin_or_end = [true, false, false];
        let shape = |s: &CornerState| match classify_corner(s).unwrap() {
            CornerCase::River {
                river: RiverCorner::Endpoint { shape, end, .. },
                ..
            } => (end, shape),
            other => panic!("{other:?}"),
        };
        assert_eq!(shape(&s), (RiverEnd::Spring, EndpointShape::Level));

        s.elevations = [3, 2, 2];
        assert_eq!(
            shape(&s).1,
            EndpointShape::FlatTerraceElevated(ElevatedSide::Center)
        );
        s.elevations = [2, 3, 2];
        assert_eq!(shape(&s).1, EndpointShape::FlatTerraceElevated(ElevatedSide::Left));
        s.elevations = [2, 2, 3];
        assert_eq!(shape(&s).1, EndpointShape::FlatTerraceElevated(ElevatedSide::Right));
        s.elevations = [2, 2, 1];
        assert_eq!(shape(&s).1, EndpointShape::DoubleTerrace);
        s.elevations = [2, 2, 0];
        assert_eq!(shape(&s).1, EndpointShape::Waterfall);

        s.elevations = [2, 1, 1];
        s.begin_or_end = [false, true, false];
        s.water = [false, true, false];
        assert_eq!(shape(&s), (RiverEnd::Mouth, EndpointShape::ShallowWaterDelta));
    }

    #[test]
    fn terrain_corner_decomposition() {
        use TerrainCorner::*;
        assert_eq!(classify_terrain([2, 2, 2]), Flat);
        assert_eq!(classify_terrain([1, 2, 2]), Terraced(CornerOrder::new(0, 1, 2)));
        assert_eq!(classify_terrain([1, 2, 1]), Terraced(CornerOrder::new(1, 2, 0)));
        assert_eq!(classify_terrain([1, 1, 2]), Terraced(CornerOrder::new(2, 0, 1)));
        assert_eq!(classify_terrain([0, 1, 3]), TerracesCliff(CornerOrder::new(0, 1, 2)));
        assert_eq!(classify_terrain([0, 3, 1]), CliffTerraces(CornerOrder::new(0, 1, 2)));
        assert_eq!(classify_terrain([0, 2, 3]), CliffTerraces(CornerOrder::new(2, 0, 1)));
        assert_eq!(classify_terrain([0, 3, 2]), TerracesCliff(CornerOrder::new(1, 2, 0)));
        assert_eq!(classify_terrain([0, 0, 5]), DoubleCliff);
        assert_eq!(classify_terrain([0, 2, 5]), DoubleCliff);
    }

    #[test]
    fn every_corner_state_maps_to_one_case() {
        let options = [None, Some(0), Some(1)];
        for e0 in 0..=6 {
            for e1 in 0..=6 {
                for e2 in 0..=6 {
                    for r0 in options {
                        for r1 in options {
                            for r2 in options {
                                for mask in 0..8u8 {
                                    // Offsets within the pair: 0 = first slot, 1 = second.
                                    let rivers = [
                                        r0.map(|o| o % 3),
                                        r1.map(|o| (1 + o) % 3),
                                        r2.map(|o| (2 + o) % 3),
                                    ];
                                    let s = CornerState {
                                        elevations: [e0, e1, e2],
                                        water: [e0 <= 1, e1 <= 1, e2 <= 1],
                                        begin_or_end: [
                                            mask & 1 != 0,
                                            mask & 2 != 0,
                                            mask & 4 != 0,
                                        ],
                                        rivers,
                                    };
                                    check_corner_state(&s);
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    fn check_corner_state(s: &CornerState) {
        let on_cliff = (0..3).any(|k| s.rivers[k].is_some() && s.edge_type(k) == EdgeType::Cliff);
        // Within the corner, every slot has at most one river in and one out.
        let consistent = (0..3).all(|slot| {
            let touching = (0..3)
                .filter(|&k| s.rivers[k].is_some() && CornerState::pair_has(k, slot));
            let (ins, outs) = touching.fold((0, 0), |(i, o), k| {
                if s.rivers[k] == Some(slot) { (i + 1, o) } else { (i, o + 1) }
            });
            ins <= 1 && outs <= 1
        });
        match classify_corner(s) {
            Ok(CornerCase::Terrain(_)) => assert!(s.rivers.iter().all(Option::is_none)),
            Ok(CornerCase::River { .. }) => assert!(!on_cliff),
            Err(_) => assert!(on_cliff || !consistent, "{s:?}"),
        }
        if on_cliff {
            assert!(classify_corner(s).is_err());
        }
    }

    #[test]
    fn interior_corners_are_owned_once() {
        let f = Fixture::flat(3);
        let mut seen: HashMap<[(i32, i32); 3], usize> = HashMap::default();
        for (hex, d, _) in f.corner_cases() {
            let mut key = [hex, hex.neighbor(d), hex.neighbor(d.clockwise())].map(|h| (h.x, h.y));
            key.sort();
            *seen.entry(key).or_default() += 1;
        }
        assert!(seen.values().all(|&n| n == 1));
        // Triples of mutually adjacent cells in a radius-3 hexagon: 6 * 3².
        assert_eq!(seen.len(), 54);
    }
}
