//! Geometry builders invoked by the dispatcher.
//!
//! Each routine appends triangles for one case and assumes the case was
//! classified correctly. Terrace points between two cells are always
//! interpolated from the lower cell toward the higher one, so an edge bridge
//! and the corner next to it produce bit-identical points even when they are
//! built by different cells.

use bevy::prelude::*;
use hexx::EdgeDirection;

use super::context::CellTriangulationData;
use super::dispatch::{
    CornerCase, CornerCell, CornerOrder, EdgeCase, ElevatedSide, EndpointShape, RiverCorner,
    RiverEdge, RiverEnd, RiverFlow, TerrainCorner,
};
use super::mesh::MeshBuilder;
use crate::hex_map::{EdgeType, EdgeVertices, Feature, Shape, Terrain, Vegetation};
use crate::math;

const RIVER_WATER: LinearRgba = LinearRgba::rgb(0.22, 0.48, 0.70);
const RIVER_BANK: LinearRgba = LinearRgba::rgb(0.30, 0.34, 0.20);
const FOAM: LinearRgba = LinearRgba::rgb(0.90, 0.95, 1.00);
const ROAD: LinearRgba = LinearRgba::rgb(0.42, 0.33, 0.24);
const FLOOD_PLAIN: LinearRgba = LinearRgba::rgb(0.48, 0.58, 0.22);
const FIELD_A: LinearRgba = LinearRgba::rgb(0.70, 0.62, 0.22);
const FIELD_B: LinearRgba = LinearRgba::rgb(0.40, 0.55, 0.18);
const MARSH_WATER: LinearRgba = LinearRgba::rgb(0.25, 0.40, 0.38);
const OASIS_GRASS: LinearRgba = LinearRgba::rgb(0.25, 0.52, 0.16);

// ── Interior ───────────────────────────────────────────────────────

/// Hub-and-spoke fan over the solid interior, plus the river water inside
/// the cell. Sources carry no water in their centre.
pub fn center(b: &mut MeshBuilder, ctx: &CellTriangulationData) {
    let hub = ctx.fan_center();
    for d in EdgeDirection::ALL_DIRECTIONS {
        b.edge_fan(hub, ctx.edge(d), ctx.color);
    }
    if !ctx.carves_river() || ctx.rivers.incoming.is_none() {
        return;
    }
    let y = ctx.geometry.river_surface_y(ctx.elevation);
    let hub = ctx.center.with_y(y);
    for d in EdgeDirection::ALL_DIRECTIONS {
        if ctx.has_river_through_edge(d) {
            let (v2, v3) = ctx.edge(d).middle();
            b.triangle_color([hub, v2.with_y(y), v3.with_y(y)], RIVER_WATER);
        }
    }
}

// ── Edges ──────────────────────────────────────────────────────────

/// One side of an edge bridge.
#[derive(Clone, Copy)]
struct Side<'e> {
    edge: &'e EdgeVertices,
    color: LinearRgba,
    elevation: i32,
}

/// Bridge between the cell and its neighbour across `direction`.
pub fn edge(
    b: &mut MeshBuilder,
    ctx: &CellTriangulationData,
    direction: EdgeDirection,
    case: EdgeCase,
) {
    let Some(n) = ctx.neighbor(direction) else {
        return;
    };
    let near = Side {
        edge: ctx.edge(direction),
        color: ctx.color,
        elevation: ctx.elevation,
    };
    let far = Side {
        edge: &n.edge,
        color: n.color,
        elevation: n.elevation,
    };
    match case {
        EdgeCase::Flat | EdgeCase::Cliff => {
            b.edge_strip(near.edge, near.color, far.edge, far.color)
        }
        EdgeCase::Slope => terraces(b, near, far, ctx.geometry.terrace_steps),
        EdgeCase::River(river) => {
            let (up, down) = if ctx.rivers.outgoing == Some(direction) {
                (near, far)
            } else {
                (far, near)
            };
            river_bridge(b, ctx, up, down, river);
        }
    }
}

/// Terraced strips from the lower side to the higher one.
fn terraces(b: &mut MeshBuilder, s1: Side, s2: Side, steps: u32) {
    let (low, high) = if s1.elevation <= s2.elevation {
        (s1, s2)
    } else {
        (s2, s1)
    };
    let mut prev = (*low.edge, low.color);
    for step in 1..=steps {
        let e = EdgeVertices::terrace_lerp(low.edge, high.edge, step, steps);
        let c = math::terrace_color_lerp(low.color, high.color, step, steps);
        b.edge_strip(&prev.0, prev.1, &e, c);
        prev = (e, c);
    }
}

/// Trough between two river cells and the water running over it.
fn river_bridge(
    b: &mut MeshBuilder,
    ctx: &CellTriangulationData,
    up: Side,
    down: Side,
    river: RiverEdge,
) {
    let g = ctx.geometry;
    match river {
        RiverEdge::TerracedChannel
        | RiverEdge::Spring { terraced: true }
        | RiverEdge::Mouth { terraced: true } => terraces(b, up, down, g.terrace_steps),
        _ => b.edge_strip(up.edge, up.color, down.edge, down.color),
    }

    let up_y = g.river_surface_y(up.elevation);
    let (u2, u3) = up.edge.middle();
    let (d2, d3) = down.edge.middle();
    match river {
        RiverEdge::Channel | RiverEdge::TerracedChannel => {
            let y = g.river_surface_y(down.elevation);
            b.quad(
                [u2.with_y(up_y), u3.with_y(up_y), d2.with_y(y), d3.with_y(y)],
                [RIVER_WATER; 4],
            );
        }
        RiverEdge::Spring { .. } => {
            let y = g.river_surface_y(down.elevation);
            b.triangle_color(
                [up.edge.midpoint().with_y(up_y), d2.with_y(y), d3.with_y(y)],
                RIVER_WATER,
            );
        }
        RiverEdge::Mouth { .. } => {
            let y = g.surface_y(down.elevation) + g.overlay_lift;
            b.quad(
                [u2.with_y(up_y), u3.with_y(up_y), d2.with_y(y), d3.with_y(y)],
                [RIVER_WATER, RIVER_WATER, down.color, down.color],
            );
        }
    }
}

// ── Corners ────────────────────────────────────────────────────────

/// Corner triangle data in slot order.
struct Corner {
    points: [Vec3; 3],
    colors: [LinearRgba; 3],
    elevations: [i32; 3],
    steps: u32,
}

impl Corner {
    fn new(ctx: &CellTriangulationData, cells: &[CornerCell; 3]) -> Self {
        Self {
            points: cells.map(|c| c.point),
            colors: cells.map(|c| c.color),
            elevations: cells.map(|c| c.elevation),
            steps: ctx.geometry.terrace_steps,
        }
    }

    fn terrace_point(&self, a: usize, b: usize, step: u32) -> Vec3 {
        let (p, e, n) = (&self.points, &self.elevations, self.steps);
        if e[a] <= e[b] {
            math::terrace_lerp(p[a], p[b], step, n)
        } else {
            math::terrace_lerp(p[b], p[a], n - step, n)
        }
    }

    fn terrace_color(&self, a: usize, b: usize, step: u32) -> LinearRgba {
        let (c, e, n) = (&self.colors, &self.elevations, self.steps);
        if e[a] <= e[b] {
            math::terrace_color_lerp(c[a], c[b], step, n)
        } else {
            math::terrace_color_lerp(c[b], c[a], n - step, n)
        }
    }

    fn edge_type(&self, a: usize, b: usize) -> EdgeType {
        EdgeType::between(self.elevations[a], self.elevations[b])
    }

    fn centroid(&self) -> Vec3 {
        let [p0, p1, p2] = self.points;
        (p0 + p1 + p2) / 3.0
    }

    fn lowest(&self) -> usize {
        (0..3).min_by_key(|&s| self.elevations[s]).unwrap_or(0)
    }
}

/// River water around a corner.
///
/// Bank points carry the same horizontal position and height as the water
/// of the bridges beside the corner, so patches built here join them.
struct CornerWater {
    /// Per pair `k`, the bank point of slot `k` and of slot `k + 1`.
    banks: [[Vec3; 2]; 3],
    /// Water height per slot.
    levels: [f32; 3],
}

impl CornerWater {
    fn new(ctx: &CellTriangulationData, cells: &[CornerCell; 3]) -> Self {
        let g = ctx.geometry;
        let levels = cells.map(|c| {
            if c.water {
                g.surface_y(c.elevation) + g.overlay_lift
            } else {
                g.river_surface_y(c.elevation)
            }
        });
        let banks = [0, 1, 2].map(|k| {
            let next = (k + 1) % 3;
            [
                cells[k].banks[0].with_y(levels[k]),
                cells[next].banks[1].with_y(levels[next]),
            ]
        });
        Self { banks, levels }
    }

    /// Bank point of `slot` on `pair`.
    fn bank(&self, pair: usize, slot: usize) -> Vec3 {
        self.banks[pair][usize::from(slot != pair)]
    }
}

/// Pair joining two different slots.
fn pair_of(a: usize, b: usize) -> usize {
    if (a + 1) % 3 == b { a } else { b }
}

/// Upstream and downstream slots of a confluence.
fn flow_slots(middle: usize, flow: RiverFlow) -> (usize, usize) {
    match flow {
        RiverFlow::CounterClockwise => ((middle + 2) % 3, (middle + 1) % 3),
        RiverFlow::Clockwise => ((middle + 1) % 3, (middle + 2) % 3),
    }
}

/// Triangle between the cell and the neighbours across `d` and `d.clockwise()`.
pub fn corner(
    b: &mut MeshBuilder,
    ctx: &CellTriangulationData,
    cells: &[CornerCell; 3],
    case: CornerCase,
) {
    let mut corner = Corner::new(ctx, cells);
    let (river, terrain) = match case {
        CornerCase::Terrain(terrain) => {
            terrain_corner(b, &corner, terrain);
            return;
        }
        CornerCase::River { river, terrain } => (river, terrain),
    };
    tint_banks(&mut corner.colors, river);
    let water = CornerWater::new(ctx, cells);
    match (river, terrain) {
        (RiverCorner::Confluence { middle, flow }, TerrainCorner::Flat) => {
            basin(b, ctx, &corner);
            confluence(b, &water, middle, flow);
        }
        (RiverCorner::Confluence { middle, flow }, terrain) => {
            terrain_corner(b, &corner, terrain);
            confluence(b, &water, middle, flow);
        }
        (RiverCorner::Curve { pair }, TerrainCorner::Flat) => {
            basin(b, ctx, &corner);
            bend(b, &corner, &water, pair);
        }
        (RiverCorner::Curve { pair }, terrain) => {
            terrain_corner(b, &corner, terrain);
            bend(b, &corner, &water, pair);
        }
        (
            RiverCorner::Endpoint {
                shape: EndpointShape::Level,
                end,
                slot,
                pair,
            },
            _,
        ) => {
            basin(b, ctx, &corner);
            pool(b, &corner, &water, slot, pair, end);
        }
        (
            RiverCorner::Endpoint {
                shape: EndpointShape::ShallowWaterDelta,
                ..
            },
            terrain,
        ) => {
            terrain_corner(b, &corner, terrain);
            delta(b, ctx, cells);
        }
        (
            RiverCorner::Endpoint {
                shape: EndpointShape::Waterfall,
                pair,
                ..
            },
            terrain,
        ) => {
            terrain_corner(b, &corner, terrain);
            waterfall(b, ctx, &corner, &water, pair);
        }
        (
            RiverCorner::Endpoint {
                shape: EndpointShape::DoubleTerrace,
                pair,
                ..
            },
            terrain,
        ) => {
            terrain_corner(b, &corner, terrain);
            cascade(b, &corner, &water, pair);
        }
        (
            RiverCorner::Endpoint {
                shape: EndpointShape::FlatTerraceElevated(side),
                slot,
                ..
            },
            terrain,
        ) => {
            terrain_corner(b, &corner, terrain);
            tarn(b, ctx, &corner, slot, side);
        }
    }
}

/// Land geometry of a corner without any water.
fn terrain_corner(b: &mut MeshBuilder, c: &Corner, terrain: TerrainCorner) {
    match terrain {
        TerrainCorner::Flat | TerrainCorner::DoubleCliff => b.triangle(c.points, c.colors),
        TerrainCorner::Terraced(o) => corner_terraces(b, c, o),
        TerrainCorner::TerracesCliff(o) => terraces_cliff(b, c, o),
        TerrainCorner::CliffTerraces(o) => cliff_terraces(b, c, o),
    }
}

/// Wet-bank colouring of the cells a river touches at a corner.
fn tint_banks(colors: &mut [LinearRgba; 3], river: RiverCorner) {
    fn tint(c: &mut LinearRgba, t: f32) {
        *c = math::lerp_color(*c, RIVER_BANK, t);
    }
    match river {
        RiverCorner::Endpoint { slot, shape, .. } => {
            tint(&mut colors[slot], 0.35);
            if shape == EndpointShape::Waterfall {
                for c in colors.iter_mut() {
                    *c = math::lerp_color(*c, FOAM, 0.4);
                }
            }
        }
        RiverCorner::Confluence { middle, flow } => {
            let (upstream, downstream) = flow_slots(middle, flow);
            tint(&mut colors[upstream], 0.45);
            tint(&mut colors[middle], 0.35);
            tint(&mut colors[downstream], 0.25);
        }
        RiverCorner::Curve { pair } => {
            tint(&mut colors[pair], 0.3);
            tint(&mut colors[(pair + 1) % 3], 0.3);
        }
    }
}

/// Level corner hollowed toward the stream bed of its lowest cell.
///
/// The outer edges are the plain corner triangle's, so the bridges beside it
/// still meet it exactly.
fn basin(b: &mut MeshBuilder, ctx: &CellTriangulationData, c: &Corner) {
    let bed = ctx.geometry.stream_bed_y(c.elevations[c.lowest()]);
    let hub = c.centroid().with_y(bed);
    for (k, n) in [(0, 1), (1, 2), (2, 0)] {
        b.triangle(
            [c.points[k], c.points[n], hub],
            [c.colors[k], c.colors[n], RIVER_BANK],
        );
    }
}

/// Water joining the two river edges of the middle slot.
///
/// The upstream edge's banks come first, so the winding follows `flow`.
fn confluence(b: &mut MeshBuilder, water: &CornerWater, middle: usize, flow: RiverFlow) {
    let (up, down) = flow_slots(middle, flow);
    let inflow = pair_of(middle, up);
    let outflow = pair_of(middle, down);
    b.quad(
        [
            water.bank(inflow, up),
            water.bank(inflow, middle),
            water.bank(outflow, down),
            water.bank(outflow, middle),
        ],
        [RIVER_WATER; 4],
    );
}

/// Water rounding off a single river edge into the corner.
fn bend(b: &mut MeshBuilder, c: &Corner, water: &CornerWater, pair: usize) {
    let next = (pair + 1) % 3;
    let y = water.levels[pair].min(water.levels[next]);
    let [near, far] = water.banks[pair];
    b.triangle_color([near, far, c.centroid().with_y(y)], RIVER_WATER);
}

/// Still water where a river begins or ends on level ground. A spring wells
/// up in a small round pool, a mouth spreads wider.
fn pool(
    b: &mut MeshBuilder,
    c: &Corner,
    water: &CornerWater,
    slot: usize,
    pair: usize,
    end: RiverEnd,
) {
    let y = water.levels[slot];
    let hub = c.centroid().with_y(y);
    let (reach, color) = match end {
        RiverEnd::Spring => (0.35, math::lerp_color(RIVER_WATER, FOAM, 0.3)),
        RiverEnd::Mouth => (0.6, RIVER_WATER),
    };
    let [near, far] = water.banks[pair];
    b.triangle_color([near, far, hub], color);
    let rim = c.points.map(|p| hub.lerp(p.with_y(y), reach));
    b.triangle_color(rim, color);
}

/// Open water over a river mouth corner, at the level of the lowest water cell.
fn delta(b: &mut MeshBuilder, ctx: &CellTriangulationData, cells: &[CornerCell; 3]) {
    let Some(level) = cells.iter().filter(|c| c.water).map(|c| c.elevation).min() else {
        return;
    };
    let y = ctx.geometry.surface_y(level) + ctx.geometry.overlay_lift;
    b.triangle_color(cells.map(|c| c.point.with_y(y)), RIVER_WATER);
}

/// Foam curtain falling from the river banks to the bed of the lowest cell.
fn waterfall(
    b: &mut MeshBuilder,
    ctx: &CellTriangulationData,
    c: &Corner,
    water: &CornerWater,
    pair: usize,
) {
    let bottom = ctx.geometry.stream_bed_y(c.elevations[c.lowest()]);
    let [near, far] = water.banks[pair];
    b.quad(
        [near, far, near.with_y(bottom), far.with_y(bottom)],
        [FOAM, FOAM, RIVER_WATER, RIVER_WATER],
    );
}

/// Water stepping down the terraces from the banks to the single low cell.
fn cascade(b: &mut MeshBuilder, c: &Corner, water: &CornerWater, pair: usize) {
    let low = c.lowest();
    let foot = c.points[low].with_y(water.levels[low]);
    let [top_near, top_far] = water.banks[pair];
    let (mut near, mut far, mut color) = (top_near, top_far, RIVER_WATER);
    for step in 1..c.steps {
        let next_near = math::terrace_lerp(top_near, foot, step, c.steps);
        let next_far = math::terrace_lerp(top_far, foot, step, c.steps);
        let next_color = math::terrace_color_lerp(RIVER_WATER, FOAM, step, c.steps);
        b.quad([near, far, next_near, next_far], [color, color, next_color, next_color]);
        (near, far, color) = (next_near, next_far, next_color);
    }
    b.triangle([near, far, foot], [color, color, FOAM]);
}

/// Pond at the foot of the single raised cell of a river end, on the two
/// low cells.
fn tarn(
    b: &mut MeshBuilder,
    ctx: &CellTriangulationData,
    c: &Corner,
    slot: usize,
    side: ElevatedSide,
) {
    let high = match side {
        ElevatedSide::Center => slot,
        ElevatedSide::Left => (slot + 1) % 3,
        ElevatedSide::Right => (slot + 2) % 3,
    };
    let (l1, l2) = ((high + 1) % 3, (high + 2) % 3);
    let y = ctx.geometry.surface_y(c.elevations[l1]) + ctx.geometry.overlay_lift;
    let foot = c.points[l1].lerp(c.points[l2], 0.5);
    b.triangle_color(
        [
            c.points[l1].lerp(foot, 0.5).with_y(y),
            c.points[l2].lerp(foot, 0.5).with_y(y),
            foot.lerp(c.points[high], 0.4).with_y(y),
        ],
        RIVER_WATER,
    );
}

/// Both slopes terrace out of `begin` side by side.
fn corner_terraces(b: &mut MeshBuilder, c: &Corner, o: CornerOrder) {
    let mut v3 = c.terrace_point(o.begin, o.left, 1);
    let mut v4 = c.terrace_point(o.begin, o.right, 1);
    let mut c3 = c.terrace_color(o.begin, o.left, 1);
    let mut c4 = c.terrace_color(o.begin, o.right, 1);
    b.triangle([c.points[o.begin], v3, v4], [c.colors[o.begin], c3, c4]);
    for step in 2..=c.steps {
        let (v1, v2, c1, c2) = (v3, v4, c3, c4);
        v3 = c.terrace_point(o.begin, o.left, step);
        v4 = c.terrace_point(o.begin, o.right, step);
        c3 = c.terrace_color(o.begin, o.left, step);
        c4 = c.terrace_color(o.begin, o.right, step);
        b.quad([v1, v2, v3, v4], [c1, c2, c3, c4]);
    }
}

/// Point on the perturbed segment from `from` to `to`, one elevation level
/// away from `from`, where the terraces collapse.
fn collapse_point(b: &MeshBuilder, c: &Corner, from: usize, to: usize) -> (Vec3, LinearRgba) {
    let levels = (c.elevations[to] - c.elevations[from]).abs().max(1);
    let t = 1.0 / levels as f32;
    let p = b.perturb(c.points[from]).lerp(b.perturb(c.points[to]), t);
    (p, math::lerp_color(c.colors[from], c.colors[to], t))
}

fn terraces_cliff(b: &mut MeshBuilder, c: &Corner, o: CornerOrder) {
    let boundary = collapse_point(b, c, o.begin, o.right);
    boundary_triangle(b, c, o.begin, o.left, boundary);
    close_boundary(b, c, o, boundary);
}

fn cliff_terraces(b: &mut MeshBuilder, c: &Corner, o: CornerOrder) {
    let boundary = collapse_point(b, c, o.begin, o.left);
    boundary_triangle(b, c, o.right, o.begin, boundary);
    close_boundary(b, c, o, boundary);
}

fn close_boundary(b: &mut MeshBuilder, c: &Corner, o: CornerOrder, boundary: (Vec3, LinearRgba)) {
    if c.edge_type(o.left, o.right) == EdgeType::Slope {
        boundary_triangle(b, c, o.left, o.right, boundary);
    } else {
        b.triangle_unperturbed(
            [b.perturb(c.points[o.left]), b.perturb(c.points[o.right]), boundary.0],
            [c.colors[o.left], c.colors[o.right], boundary.1],
        );
    }
}

/// Fan from the terrace points between `from` and `to` onto `boundary`.
fn boundary_triangle(
    b: &mut MeshBuilder,
    c: &Corner,
    from: usize,
    to: usize,
    boundary: (Vec3, LinearRgba),
) {
    let (bp, bc) = boundary;
    let mut v2 = b.perturb(c.terrace_point(from, to, 1));
    let mut c2 = c.terrace_color(from, to, 1);
    b.triangle_unperturbed([b.perturb(c.points[from]), v2, bp], [c.colors[from], c2, bc]);
    for step in 2..c.steps {
        let (v1, c1) = (v2, c2);
        v2 = b.perturb(c.terrace_point(from, to, step));
        c2 = c.terrace_color(from, to, step);
        b.triangle_unperturbed([v1, v2, bp], [c1, c2, bc]);
    }
    b.triangle_unperturbed([v2, b.perturb(c.points[to]), bp], [c2, c.colors[to], bc]);
}

// ── Overlays ───────────────────────────────────────────────────────

/// A road leaves the cell across `direction`.
pub fn should_triangulate_road(ctx: &CellTriangulationData, direction: EdgeDirection) -> bool {
    !ctx.cell.is_water() && ctx.cell.has_road_through_edge(direction)
}

/// Dry river valley: flat desert with a river.
pub fn should_triangulate_flood_plain(ctx: &CellTriangulationData) -> bool {
    ctx.cell.terrain == Terrain::Desert && ctx.cell.shape == Shape::Flatlands && ctx.has_river()
}

/// Cultivated fields on land below the mountains.
pub fn should_triangulate_farm(ctx: &CellTriangulationData) -> bool {
    ctx.cell.feature == Feature::Farm && !ctx.cell.is_water() && ctx.cell.shape != Shape::Mountains
}

/// Marsh pools on flat land.
pub fn should_triangulate_marsh(ctx: &CellTriangulationData) -> bool {
    ctx.cell.vegetation == Vegetation::Marsh
        && !ctx.cell.is_water()
        && ctx.cell.shape == Shape::Flatlands
}

/// Oasis pond in a flat desert cell without a river.
pub fn should_triangulate_oasis(ctx: &CellTriangulationData) -> bool {
    ctx.cell.feature == Feature::Oasis
        && ctx.cell.terrain == Terrain::Desert
        && ctx.cell.shape == Shape::Flatlands
        && !ctx.has_river()
}

/// Every overlay whose predicate holds, layered over the base geometry.
pub fn overlays(b: &mut MeshBuilder, ctx: &CellTriangulationData) {
    for d in EdgeDirection::ALL_DIRECTIONS {
        if should_triangulate_road(ctx, d) {
            road(b, ctx, d);
        }
    }
    if should_triangulate_flood_plain(ctx) {
        flood_plain(b, ctx);
    }
    if should_triangulate_farm(ctx) {
        farm(b, ctx);
    }
    if should_triangulate_marsh(ctx) {
        marsh(b, ctx);
    }
    if should_triangulate_oasis(ctx) {
        oasis(b, ctx);
    }
}

fn overlay_y(ctx: &CellTriangulationData) -> f32 {
    ctx.geometry.surface_y(ctx.elevation) + ctx.geometry.overlay_lift
}

/// Road from the centre to the edge, and across the bridge when this cell
/// owns it and the neighbour has the matching road.
fn road(b: &mut MeshBuilder, ctx: &CellTriangulationData, direction: EdgeDirection) {
    let y = overlay_y(ctx);
    let (v2, v3) = ctx.edge(direction).middle();
    let (v2, v3) = (v2.with_y(y), v3.with_y(y));
    b.triangle_color([ctx.center.with_y(y), v2, v3], ROAD);
    if CellTriangulationData::owns_edge(direction)
        && let Some(n) = ctx.neighbor(direction)
        && n.cell.has_road_through_edge(direction.const_neg())
    {
        let ny = ctx.geometry.surface_y(n.elevation) + ctx.geometry.overlay_lift;
        let (n2, n3) = n.edge.middle();
        b.quad([v2, v3, n2.with_y(ny), n3.with_y(ny)], [ROAD; 4]);
    }
}

/// Green band along the outer half of every sector the river does not cross.
fn flood_plain(b: &mut MeshBuilder, ctx: &CellTriangulationData) {
    let y = overlay_y(ctx);
    let hub = ctx.center.with_y(y);
    for d in EdgeDirection::ALL_DIRECTIONS {
        if ctx.has_river_through_edge(d) {
            continue;
        }
        let outer = ctx.edge(d).map(|p| p.with_y(y));
        let inner = outer.map(|p| p.lerp(hub, 0.5));
        b.edge_strip(&outer, FLOOD_PLAIN, &inner, FLOOD_PLAIN);
    }
}

/// One field per dry sector, coloured by the parity of its hash.
fn farm(b: &mut MeshBuilder, ctx: &CellTriangulationData) {
    let y = overlay_y(ctx);
    let hub = ctx.center.with_y(y);
    for d in EdgeDirection::ALL_DIRECTIONS {
        if ctx.has_river_through_edge(d) {
            continue;
        }
        let edge = ctx.edge(d).map(|p| p.with_y(y).lerp(hub, 0.1));
        let (u, _) = b.noise().stable_hash(edge.midpoint());
        let color = if u < 0.5 { FIELD_A } else { FIELD_B };
        b.edge_fan(hub, &edge, color);
    }
}

/// Small hexagonal pools scattered by the stable hash.
fn marsh(b: &mut MeshBuilder, ctx: &CellTriangulationData) {
    let y = overlay_y(ctx);
    let hub = ctx.center.with_y(y);
    for d in EdgeDirection::ALL_DIRECTIONS {
        let mid = ctx.edge(d).midpoint().with_y(y);
        let (u, v) = b.noise().stable_hash(mid);
        if u < 0.4 {
            continue;
        }
        let at = hub.lerp(mid, 0.25 + 0.5 * v);
        let radius = hub.distance(mid) * 0.2;
        let spoke = |k: u32| {
            let angle = (k as f32 + v) * std::f32::consts::FRAC_PI_3;
            at + Vec3::new(angle.cos(), 0.0, angle.sin()) * radius
        };
        for k in 0..6 {
            b.triangle_color([at, spoke(k), spoke(k + 1)], MARSH_WATER);
        }
    }
}

/// Round pond in the middle of the cell with a ring of grass around it.
fn oasis(b: &mut MeshBuilder, ctx: &CellTriangulationData) {
    let y = overlay_y(ctx);
    let hub = ctx.center.with_y(y);
    for d in EdgeDirection::ALL_DIRECTIONS {
        let edge = ctx.edge(d).map(|p| p.with_y(y));
        let pond = edge.map(|p| hub.lerp(p, 0.35));
        let ring = edge.map(|p| hub.lerp(p, 0.6));
        b.edge_fan(hub, &pond, RIVER_WATER);
        b.edge_strip(&pond, OASIS_GRASS, &ring, OASIS_GRASS);
    }
}
