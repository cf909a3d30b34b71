//! Hex corner and edge geometry shared by every triangulation routine.
//!
//! Corners are computed as the centroid of the three cell centres meeting
//! there, summed in a canonical order, and shared edges are subdivided in a
//! canonical orientation. Two cells asking for the same boundary therefore
//! get bit-identical points, which is what keeps the mesh free of cracks.

use bevy::prelude::*;
use hexx::{EdgeDirection, Hex, HexLayout};

use super::MeshSettings;
use crate::math;

/// Four points along one hex edge: the two corners and the points at 1/3 and 2/3.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EdgeVertices {
    /// First corner.
    pub v1: Vec3,
    /// Point at 1/3.
    pub v2: Vec3,
    /// Point at 2/3.
    pub v3: Vec3,
    /// Second corner.
    pub v4: Vec3,
}

impl EdgeVertices {
    /// Subdivides the segment `corner1 → corner2` into thirds.
    pub fn new(corner1: Vec3, corner2: Vec3) -> Self {
        Self {
            v1: corner1,
            v2: corner1.lerp(corner2, 1.0 / 3.0),
            v3: corner1.lerp(corner2, 2.0 / 3.0),
            v4: corner2,
        }
    }

    /// Same points, opposite order.
    pub fn reversed(&self) -> Self {
        Self {
            v1: self.v4,
            v2: self.v3,
            v3: self.v2,
            v4: self.v1,
        }
    }

    /// Points in order `v1..=v4`.
    pub fn points(&self) -> [Vec3; 4] {
        [self.v1, self.v2, self.v3, self.v4]
    }

    /// Builds from an array in order `v1..=v4`.
    pub fn from_points(p: [Vec3; 4]) -> Self {
        Self {
            v1: p[0],
            v2: p[1],
            v3: p[2],
            v4: p[3],
        }
    }

    /// Applies `f` to every point.
    pub fn map(&self, f: impl Fn(Vec3) -> Vec3) -> Self {
        Self::from_points(self.points().map(f))
    }

    /// Terraced interpolation applied to all four points.
    pub fn terrace_lerp(a: &Self, b: &Self, step: u32, total: u32) -> Self {
        Self {
            v1: math::terrace_lerp(a.v1, b.v1, step, total),
            v2: math::terrace_lerp(a.v2, b.v2, step, total),
            v3: math::terrace_lerp(a.v3, b.v3, step, total),
            v4: math::terrace_lerp(a.v4, b.v4, step, total),
        }
    }

    /// The middle third, `v2 → v3`.
    pub fn middle(&self) -> (Vec3, Vec3) {
        (self.v2, self.v3)
    }

    /// Midpoint of the whole edge.
    pub fn midpoint(&self) -> Vec3 {
        (self.v2 + self.v3) * 0.5
    }
}

/// Sort key giving every hex a total order independent of hashing.
pub fn hex_key(hex: Hex) -> (i32, i32) {
    (hex.x, hex.y)
}

/// World-space layout of the map and the height constants of the mesh.
#[derive(Clone, Debug)]
pub struct MapGeometry {
    layout: HexLayout,
    /// World height of one elevation level.
    pub elevation_step: f32,
    /// Fraction of the hex covered by the cell's own flat interior.
    pub solid_factor: f32,
    /// Number of terrace steps across a slope.
    pub terrace_steps: u32,
    /// Stream bed height relative to the surface, in elevation levels.
    pub stream_bed_offset: f32,
    /// River water height relative to the surface, in elevation levels.
    pub river_surface_offset: f32,
    /// Lift applied to overlays so they sit above the base geometry.
    pub overlay_lift: f32,
}

impl MapGeometry {
    /// Layout with cell centres `point_spacing` apart and constants from `mesh`.
    pub fn new(point_spacing: f32, mesh: &MeshSettings) -> Self {
        let layout = HexLayout {
            scale: Vec2::splat(point_spacing),
            ..default()
        };
        Self {
            layout,
            elevation_step: mesh.elevation_step,
            solid_factor: mesh.solid_factor,
            terrace_steps: mesh.terraces_per_slope * 2 + 1,
            stream_bed_offset: mesh.stream_bed_offset,
            river_surface_offset: mesh.river_surface_offset,
            overlay_lift: mesh.overlay_lift,
        }
    }

    // ── Coordinate conversion ──────────────────────────────────────

    /// World-space 2D position of a hex center.
    pub fn hex_to_world_pos(&self, hex: Hex) -> Vec2 {
        self.layout.hex_to_world_pos(hex)
    }

    /// Hex coordinate from a world-space 2D position.
    pub fn world_pos_to_hex(&self, pos: Vec2) -> Hex {
        self.layout.world_pos_to_hex(pos)
    }

    // ── Heights ────────────────────────────────────────────────────

    /// Height of a cell's surface.
    pub fn surface_y(&self, elevation: i32) -> f32 {
        elevation as f32 * self.elevation_step
    }

    /// Height of a river bed in a cell.
    pub fn stream_bed_y(&self, elevation: i32) -> f32 {
        (elevation as f32 + self.stream_bed_offset) * self.elevation_step
    }

    /// Height of river water in a cell.
    pub fn river_surface_y(&self, elevation: i32) -> f32 {
        (elevation as f32 + self.river_surface_offset) * self.elevation_step
    }

    /// Cell centre at the cell's surface height.
    pub fn center(&self, hex: Hex, elevation: i32) -> Vec3 {
        let c = self.hex_to_world_pos(hex);
        Vec3::new(c.x, self.surface_y(elevation), c.y)
    }

    // ── Corners and edges ──────────────────────────────────────────

    /// The grid vertex shared by `hex`, `hex + a` and `hex + b`.
    ///
    /// `a` and `b` must be adjacent directions. The result does not depend on
    /// which of the three cells asks.
    pub fn corner(&self, hex: Hex, a: EdgeDirection, b: EdgeDirection) -> Vec2 {
        let mut cells = [hex, hex.neighbor(a), hex.neighbor(b)];
        cells.sort_by_key(|&h| hex_key(h));
        let [p0, p1, p2] = cells.map(|h| self.hex_to_world_pos(h));
        (p0 + p1 + p2) / 3.0
    }

    /// The full boundary between `hex` and its neighbour across `direction`,
    /// at height zero, ordered from the counter-clockwise corner to the
    /// clockwise corner as seen from `hex`.
    ///
    /// The neighbour's boundary toward `hex` is exactly this value reversed.
    pub fn shared_edge(&self, hex: Hex, direction: EdgeDirection) -> EdgeVertices {
        let c1 = self.corner(hex, direction, direction.counter_clockwise());
        let c4 = self.corner(hex, direction, direction.clockwise());
        let c1 = Vec3::new(c1.x, 0.0, c1.y);
        let c4 = Vec3::new(c4.x, 0.0, c4.y);
        if hex_key(hex) < hex_key(hex.neighbor(direction)) {
            EdgeVertices::new(c1, c4)
        } else {
            EdgeVertices::new(c4, c1).reversed()
        }
    }

    /// The edge of the cell's solid interior facing `direction`, at height `y`.
    pub fn inner_edge(&self, hex: Hex, direction: EdgeDirection, y: f32) -> EdgeVertices {
        let center = self.hex_to_world_pos(hex);
        let center = Vec3::new(center.x, 0.0, center.y);
        let factor = self.solid_factor;
        self.shared_edge(hex, direction).map(|p| {
            let q = center + (p - center) * factor;
            Vec3::new(q.x, y, q.z)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex_map::MapConfig;
    use hexx::shapes;

    fn geometry() -> MapGeometry {
        let cfg = MapConfig::default();
        MapGeometry::new(cfg.grid.point_spacing, &cfg.mesh)
    }

    // ── EdgeVertices ────────────────────────────────────────────────

    #[test]
    fn edge_vertices_subdivide_in_thirds() {
        let e = EdgeVertices::new(Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0));
        assert!((e.v2.x - 1.0).abs() < 1e-6);
        assert!((e.v3.x - 2.0).abs() < 1e-6);
        assert_eq!(e.v4.x, 3.0);
    }

    #[test]
    fn edge_terrace_endpoints() {
        let a = EdgeVertices::new(Vec3::ZERO, Vec3::X);
        let b = EdgeVertices::new(Vec3::new(0.0, 1.0, 2.0), Vec3::new(1.0, 1.0, 2.0));
        assert_eq!(EdgeVertices::terrace_lerp(&a, &b, 0, 5), a);
        assert_eq!(EdgeVertices::terrace_lerp(&a, &b, 5, 5), b);
    }

    // ── seams ───────────────────────────────────────────────────────

    #[test]
    fn shared_edges_are_bit_identical_from_both_sides() {
        let g = geometry();
        for hex in shapes::hexagon(Hex::ZERO, 3) {
            for dir in EdgeDirection::ALL_DIRECTIONS {
                let mine = g.shared_edge(hex, dir);
                let theirs = g.shared_edge(hex.neighbor(dir), dir.const_neg());
                assert_eq!(mine, theirs.reversed(), "{hex:?} {dir:?}");
            }
        }
    }

    fn direction_to(from: Hex, to: Hex) -> EdgeDirection {
        EdgeDirection::ALL_DIRECTIONS
            .into_iter()
            .find(|&d| from.neighbor(d) == to)
            .expect("cells are adjacent")
    }

    #[test]
    fn corner_is_the_same_from_all_three_cells() {
        let g = geometry();
        let hex = Hex::new(1, -2);
        for dir in EdgeDirection::ALL_DIRECTIONS {
            let b = hex.neighbor(dir);
            let c = hex.neighbor(dir.clockwise());
            let from_a = g.corner(hex, dir, dir.clockwise());
            let from_b = g.corner(b, direction_to(b, hex), direction_to(b, c));
            let from_c = g.corner(c, direction_to(c, b), direction_to(c, hex));
            assert_eq!(from_a, from_b, "{dir:?}");
            assert_eq!(from_a, from_c, "{dir:?}");
        }
    }

    #[test]
    fn adjacent_edges_of_a_cell_meet_at_corners() {
        let g = geometry();
        let hex = Hex::new(-1, 2);
        for dir in EdgeDirection::ALL_DIRECTIONS {
            let e = g.inner_edge(hex, dir, 1.5);
            let next = g.inner_edge(hex, dir.clockwise(), 1.5);
            assert_eq!(e.v4, next.v1, "{dir:?}");
        }
    }

    #[test]
    fn shared_edge_corners_are_equidistant_from_center() {
        let g = geometry();
        let hex = Hex::new(2, 0);
        let c = g.hex_to_world_pos(hex);
        let c = Vec3::new(c.x, 0.0, c.y);
        let radii: Vec<f32> = EdgeDirection::ALL_DIRECTIONS
            .iter()
            .map(|&d| g.shared_edge(hex, d).v1.distance(c))
            .collect();
        for r in &radii {
            assert!((r - radii[0]).abs() < 1e-3);
        }
    }

    #[test]
    fn inner_edge_is_inside_shared_edge() {
        let g = geometry();
        let c = g.hex_to_world_pos(Hex::ZERO);
        let c = Vec3::new(c.x, 0.0, c.y);
        for dir in EdgeDirection::ALL_DIRECTIONS {
            let outer = g.shared_edge(Hex::ZERO, dir);
            let inner = g.inner_edge(Hex::ZERO, dir, 0.0);
            assert!(inner.midpoint().distance(c) < outer.midpoint().distance(c));
        }
    }

    // ── heights ─────────────────────────────────────────────────────

    #[test]
    fn river_heights_sit_below_surface() {
        let g = geometry();
        assert!(g.stream_bed_y(2) < g.river_surface_y(2));
        assert!(g.river_surface_y(2) < g.surface_y(2));
    }
}
