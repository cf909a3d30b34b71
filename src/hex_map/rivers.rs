//! River topology: a directed graph over cells with in- and out-degree ≤ 1.
//!
//! Every mutation goes through [`RiverGraph`], which writes both endpoints of
//! a river edge together. A cell never holds half of an edge.

use bevy::log::debug;
use bevy::platform::collections::HashMap;
use hexx::{EdgeDirection, Hex};

use super::cell::{EdgeType, HexCell, Terrain};

/// Read access to cells by coordinate; the grid collaborator seen by the core.
pub trait CellSource {
    /// The cell at `hex`, or `None` outside the map.
    fn cell(&self, hex: Hex) -> Option<&HexCell>;

    /// The neighbour of `hex` across `direction`, or `None` at the map boundary.
    fn neighbor(&self, hex: Hex, direction: EdgeDirection) -> Option<&HexCell> {
        self.cell(hex.neighbor(direction))
    }
}

impl CellSource for HashMap<Hex, HexCell> {
    fn cell(&self, hex: Hex) -> Option<&HexCell> {
        self.get(&hex)
    }
}

/// River slots of one cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RiverLinks {
    /// Direction the river arrives from.
    pub incoming: Option<EdgeDirection>,
    /// Direction the river leaves toward.
    pub outgoing: Option<EdgeDirection>,
}

impl RiverLinks {
    /// Either slot is set.
    pub fn has_river(&self) -> bool {
        self.incoming.is_some() || self.outgoing.is_some()
    }

    /// Exactly one slot is set: a spring or a mouth.
    pub fn has_begin_or_end(&self) -> bool {
        self.incoming.is_some() != self.outgoing.is_some()
    }

    /// A river crosses the edge in `direction`, in either sense.
    pub fn through_edge(&self, direction: EdgeDirection) -> bool {
        self.incoming == Some(direction) || self.outgoing == Some(direction)
    }

    fn is_empty(&self) -> bool {
        !self.has_river()
    }
}

/// Why a river edge is structurally impossible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RiverRejection {
    /// One of the cells is missing (map boundary).
    OffMap,
    /// The edge is a cliff.
    Cliff,
    /// Rivers do not start in water.
    SourceIsWater,
    /// Rivers do not run into the open ocean.
    TargetIsDeepWater,
    /// The target is higher than the source.
    Uphill,
    /// The neighbour already flows back into the source.
    Reversed,
}

/// Directed river graph keyed by cell.
#[derive(Clone, Debug, Default)]
pub struct RiverGraph {
    links: HashMap<Hex, RiverLinks>,
}

impl RiverGraph {
    /// Empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ────────────────────────────────────────────────────

    /// River slots of `hex` (empty when it has no river).
    pub fn links(&self, hex: Hex) -> RiverLinks {
        self.links.get(&hex).copied().unwrap_or_default()
    }

    /// Whether `hex` has any river.
    pub fn has_river(&self, hex: Hex) -> bool {
        self.links(hex).has_river()
    }

    /// Whether a river arrives at `hex`.
    pub fn has_incoming_river(&self, hex: Hex) -> bool {
        self.links(hex).incoming.is_some()
    }

    /// Whether a river leaves `hex`.
    pub fn has_outgoing_river(&self, hex: Hex) -> bool {
        self.links(hex).outgoing.is_some()
    }

    /// Whether a river starts or ends in `hex`.
    pub fn has_river_begin_or_end(&self, hex: Hex) -> bool {
        self.links(hex).has_begin_or_end()
    }

    /// Direction the river arrives from, if any.
    pub fn incoming_river_direction(&self, hex: Hex) -> Option<EdgeDirection> {
        self.links(hex).incoming
    }

    /// Direction the river leaves toward, if any.
    pub fn outgoing_river_direction(&self, hex: Hex) -> Option<EdgeDirection> {
        self.links(hex).outgoing
    }

    /// Whether a river crosses the edge of `hex` in `direction`.
    pub fn has_river_through_edge(&self, hex: Hex, direction: EdgeDirection) -> bool {
        self.links(hex).through_edge(direction)
    }

    /// Iterates over every directed river edge as `(source, direction)`.
    pub fn edges(&self) -> impl Iterator<Item = (Hex, EdgeDirection)> + '_ {
        self.links
            .iter()
            .filter_map(|(&hex, l)| l.outgoing.map(|d| (hex, d)))
    }

    // ── Legality ───────────────────────────────────────────────────

    /// Structural check for a river from `hex` across `direction`,
    /// ignoring whether the slots involved are currently free.
    pub fn check_edge(
        &self,
        cells: &impl CellSource,
        hex: Hex,
        direction: EdgeDirection,
    ) -> Result<(), RiverRejection> {
        let source = cells.cell(hex).ok_or(RiverRejection::OffMap)?;
        let target = cells
            .neighbor(hex, direction)
            .ok_or(RiverRejection::OffMap)?;
        if EdgeType::of(source, target) == EdgeType::Cliff {
            return Err(RiverRejection::Cliff);
        }
        if source.is_water() {
            return Err(RiverRejection::SourceIsWater);
        }
        if target.terrain == Terrain::DeepWater {
            return Err(RiverRejection::TargetIsDeepWater);
        }
        if target.elevation() > source.elevation() {
            return Err(RiverRejection::Uphill);
        }
        if self.outgoing_river_direction(hex.neighbor(direction)) == Some(direction.const_neg()) {
            return Err(RiverRejection::Reversed);
        }
        Ok(())
    }

    /// Whether an outgoing river could be added to `hex` across `direction`
    /// without displacing any existing river edge.
    pub fn can_add_outgoing_river_through_edge(
        &self,
        cells: &impl CellSource,
        hex: Hex,
        direction: EdgeDirection,
    ) -> bool {
        if self.check_edge(cells, hex, direction).is_err() {
            return false;
        }
        let target = hex.neighbor(direction);
        let own = self.links(hex);
        let other = self.links(target);
        own.outgoing.is_none_or(|d| d == direction)
            && own.incoming != Some(direction)
            && other.incoming.is_none_or(|d| d == direction.const_neg())
    }

    /// Whether an incoming river could be added to `hex` from `direction`
    /// without displacing any existing river edge.
    pub fn can_add_incoming_river_through_edge(
        &self,
        cells: &impl CellSource,
        hex: Hex,
        direction: EdgeDirection,
    ) -> bool {
        self.can_add_outgoing_river_through_edge(
            cells,
            hex.neighbor(direction),
            direction.const_neg(),
        )
    }

    // ── Mutation ───────────────────────────────────────────────────

    /// Links a river from `hex` to its neighbour across `direction`.
    ///
    /// Any river edge occupying the source's outgoing slot or the target's
    /// incoming slot is removed first, on both of its endpoints. Returns
    /// `false` without touching state when the edge is structurally illegal.
    pub fn set_outgoing_river(
        &mut self,
        cells: &impl CellSource,
        hex: Hex,
        direction: EdgeDirection,
    ) -> bool {
        if let Err(reason) = self.check_edge(cells, hex, direction) {
            debug!(
                "river ({}, {}) -> {direction:?} rejected: {reason:?}",
                hex.x, hex.y
            );
            return false;
        }
        let target = hex.neighbor(direction);
        if self.outgoing_river_direction(hex) == Some(direction) {
            return true;
        }
        self.remove_outgoing_river(hex);
        self.remove_incoming_river(target);
        self.entry(hex).outgoing = Some(direction);
        self.entry(target).incoming = Some(direction.const_neg());
        true
    }

    /// Removes the river leaving `hex`, and the matching incoming slot downstream.
    pub fn remove_outgoing_river(&mut self, hex: Hex) {
        let Some(direction) = self.outgoing_river_direction(hex) else {
            return;
        };
        self.clear(hex, |l| l.outgoing = None);
        self.clear(hex.neighbor(direction), |l| l.incoming = None);
    }

    /// Removes the river arriving at `hex`, and the matching outgoing slot upstream.
    pub fn remove_incoming_river(&mut self, hex: Hex) {
        let Some(direction) = self.incoming_river_direction(hex) else {
            return;
        };
        self.clear(hex, |l| l.incoming = None);
        self.clear(hex.neighbor(direction), |l| l.outgoing = None);
    }

    /// Removes both river edges of `hex`.
    pub fn remove_river(&mut self, hex: Hex) {
        self.remove_outgoing_river(hex);
        self.remove_incoming_river(hex);
    }

    /// Re-applies the structural rules to the river edges touching `hex` and
    /// removes those that no longer hold. Idempotent.
    ///
    /// Returns `true` when anything was removed.
    pub fn validate_rivers(&mut self, cells: &impl CellSource, hex: Hex) -> bool {
        let mut changed = false;
        if let Some(direction) = self.outgoing_river_direction(hex)
            && self.edge_is_illegal(cells, hex, direction)
        {
            debug!("removing outgoing river of ({}, {})", hex.x, hex.y);
            self.remove_outgoing_river(hex);
            changed = true;
        }
        if let Some(direction) = self.incoming_river_direction(hex) {
            let upstream = hex.neighbor(direction);
            if self.edge_is_illegal(cells, upstream, direction.const_neg()) {
                debug!("removing incoming river of ({}, {})", hex.x, hex.y);
                self.remove_incoming_river(hex);
                changed = true;
            }
        }
        changed
    }

    fn edge_is_illegal(
        &self,
        cells: &impl CellSource,
        hex: Hex,
        direction: EdgeDirection,
    ) -> bool {
        // The reverse-flow rule would flag the edge itself; only the
        // terrain-dependent rules apply to an existing edge.
        match self.check_edge(cells, hex, direction) {
            Ok(()) | Err(RiverRejection::Reversed) => false,
            Err(_) => true,
        }
    }

    fn entry(&mut self, hex: Hex) -> &mut RiverLinks {
        self.links.entry(hex).or_default()
    }

    fn clear(&mut self, hex: Hex, f: impl FnOnce(&mut RiverLinks)) {
        if let Some(links) = self.links.get_mut(&hex) {
            f(links);
            if links.is_empty() {
                self.links.remove(&hex);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex_map::cell::Shape;

    fn flat_map(radius: u32) -> HashMap<Hex, HexCell> {
        hexx::shapes::hexagon(Hex::ZERO, radius)
            .map(|h| (h, HexCell::new(Terrain::Grassland, Shape::Flatlands)))
            .collect()
    }

    fn dir(i: usize) -> EdgeDirection {
        EdgeDirection::ALL_DIRECTIONS[i]
    }

    /// Checks the symmetric ≤1/≤1 invariant over every cell of `cells`.
    fn assert_symmetric(graph: &RiverGraph, cells: &HashMap<Hex, HexCell>) {
        for &hex in cells.keys() {
            let l = graph.links(hex);
            if let Some(d) = l.outgoing {
                assert_eq!(
                    graph.incoming_river_direction(hex.neighbor(d)),
                    Some(d.const_neg()),
                    "dangling outgoing at {hex:?}"
                );
                assert_ne!(l.incoming, Some(d), "in == out at {hex:?}");
            }
            if let Some(d) = l.incoming {
                assert_eq!(
                    graph.outgoing_river_direction(hex.neighbor(d)),
                    Some(d.const_neg()),
                    "dangling incoming at {hex:?}"
                );
            }
        }
    }

    // ── queries ─────────────────────────────────────────────────────

    #[test]
    fn set_outgoing_links_both_ends() {
        let cells = flat_map(2);
        let mut g = RiverGraph::new();
        assert!(g.set_outgoing_river(&cells, Hex::ZERO, dir(0)));
        let n = Hex::ZERO.neighbor(dir(0));
        assert_eq!(g.outgoing_river_direction(Hex::ZERO), Some(dir(0)));
        assert_eq!(g.incoming_river_direction(n), Some(dir(0).const_neg()));
        assert!(g.has_river_begin_or_end(Hex::ZERO));
        assert!(g.has_river_through_edge(n, dir(0).const_neg()));
        assert!(!g.has_river_through_edge(Hex::ZERO, dir(1)));
        assert_symmetric(&g, &cells);
    }

    #[test]
    fn river_through_cell_is_not_begin_or_end() {
        let cells = flat_map(2);
        let mut g = RiverGraph::new();
        let mid = Hex::ZERO.neighbor(dir(0));
        assert!(g.set_outgoing_river(&cells, Hex::ZERO, dir(0)));
        assert!(g.set_outgoing_river(&cells, mid, dir(1)));
        assert!(g.has_river(mid));
        assert!(!g.has_river_begin_or_end(mid));
    }

    // ── legality ────────────────────────────────────────────────────

    #[test]
    fn cliff_edges_reject_rivers() {
        let mut cells = flat_map(1);
        let n = Hex::ZERO.neighbor(dir(2));
        cells.insert(Hex::ZERO, HexCell::new(Terrain::Grassland, Shape::Mountains));
        cells.insert(n, HexCell::new(Terrain::Grassland, Shape::Flatlands));
        let mut g = RiverGraph::new();
        assert_eq!(g.check_edge(&cells, Hex::ZERO, dir(2)), Err(RiverRejection::Cliff));
        assert!(!g.can_add_outgoing_river_through_edge(&cells, Hex::ZERO, dir(2)));
        assert!(!g.set_outgoing_river(&cells, Hex::ZERO, dir(2)));
        assert!(!g.has_river(Hex::ZERO));
        assert!(!g.has_river(n));
    }

    #[test]
    fn boundary_edges_reject_rivers() {
        let cells = flat_map(0);
        let g = RiverGraph::new();
        assert_eq!(g.check_edge(&cells, Hex::ZERO, dir(3)), Err(RiverRejection::OffMap));
        assert!(!g.can_add_incoming_river_through_edge(&cells, Hex::ZERO, dir(3)));
    }

    #[test]
    fn rivers_do_not_run_uphill_or_backwards() {
        let mut cells = flat_map(1);
        let n = Hex::ZERO.neighbor(dir(1));
        cells.insert(n, HexCell::new(Terrain::Grassland, Shape::Hills));
        let mut g = RiverGraph::new();
        assert_eq!(g.check_edge(&cells, Hex::ZERO, dir(1)), Err(RiverRejection::Uphill));
        assert!(g.set_outgoing_river(&cells, n, dir(1).const_neg()));
        assert!(!g.can_add_incoming_river_through_edge(&cells, n, dir(1).const_neg()));
        cells.insert(n, HexCell::new(Terrain::Grassland, Shape::Flatlands));
        assert_eq!(g.check_edge(&cells, Hex::ZERO, dir(1)), Err(RiverRejection::Reversed));
    }

    #[test]
    fn occupied_slots_block_can_add_but_not_set() {
        let cells = flat_map(2);
        let mut g = RiverGraph::new();
        assert!(g.set_outgoing_river(&cells, Hex::ZERO, dir(0)));
        assert!(!g.can_add_outgoing_river_through_edge(&cells, Hex::ZERO, dir(1)));
        assert!(g.can_add_outgoing_river_through_edge(&cells, Hex::ZERO, dir(0)));

        // Overwrite: the old downstream cell loses its incoming slot.
        let old = Hex::ZERO.neighbor(dir(0));
        assert!(g.set_outgoing_river(&cells, Hex::ZERO, dir(1)));
        assert!(!g.has_river(old));
        assert_symmetric(&g, &cells);
    }

    #[test]
    fn rivers_never_merge() {
        let cells = flat_map(2);
        let mut g = RiverGraph::new();
        let target = Hex::ZERO.neighbor(dir(0));
        let a = target.neighbor(dir(1));
        let b = target.neighbor(dir(5));
        assert!(g.set_outgoing_river(&cells, a, dir(1).const_neg()));
        assert!(!g.can_add_outgoing_river_through_edge(&cells, b, dir(5).const_neg()));
        assert!(g.set_outgoing_river(&cells, b, dir(5).const_neg()));
        // The second river displaced the first.
        assert!(!g.has_outgoing_river(a));
        assert_eq!(g.incoming_river_direction(target), Some(dir(5)));
        assert_symmetric(&g, &cells);
    }

    // ── removal ─────────────────────────────────────────────────────

    #[test]
    fn remove_river_clears_both_neighbours() {
        let cells = flat_map(2);
        let mut g = RiverGraph::new();
        let up = Hex::ZERO.neighbor(dir(0).const_neg());
        let down = Hex::ZERO.neighbor(dir(0));
        assert!(g.set_outgoing_river(&cells, up, dir(0)));
        assert!(g.set_outgoing_river(&cells, Hex::ZERO, dir(0)));
        g.remove_river(Hex::ZERO);
        assert!(!g.has_river(Hex::ZERO));
        assert!(!g.has_river(up));
        assert!(!g.has_river(down));
        assert_eq!(g.edges().count(), 0);
    }

    // ── validation ──────────────────────────────────────────────────

    #[test]
    fn validate_removes_river_when_source_becomes_water() {
        let mut cells = flat_map(2);
        let mut g = RiverGraph::new();
        let y = Hex::ZERO.neighbor(dir(0));
        assert!(g.set_outgoing_river(&cells, Hex::ZERO, dir(0)));
        cells.insert(Hex::ZERO, HexCell::new(Terrain::ShallowWater, Shape::Flatlands));
        assert!(g.validate_rivers(&cells, Hex::ZERO));
        assert!(!g.has_outgoing_river(Hex::ZERO));
        assert!(!g.has_incoming_river(y));
    }

    #[test]
    fn validate_is_idempotent() {
        let mut cells = flat_map(2);
        let mut g = RiverGraph::new();
        let up = Hex::ZERO.neighbor(dir(0).const_neg());
        assert!(g.set_outgoing_river(&cells, up, dir(0)));
        assert!(g.set_outgoing_river(&cells, Hex::ZERO, dir(0)));
        cells.insert(Hex::ZERO, HexCell::new(Terrain::Grassland, Shape::Mountains));
        g.validate_rivers(&cells, Hex::ZERO);
        let first: Vec<RiverLinks> = cells.keys().map(|&h| g.links(h)).collect();
        assert!(!g.validate_rivers(&cells, Hex::ZERO));
        let second: Vec<RiverLinks> = cells.keys().map(|&h| g.links(h)).collect();
        assert_eq!(first, second);
        assert_symmetric(&g, &cells);
    }

    #[test]
    fn validate_keeps_legal_rivers() {
        let cells = flat_map(2);
        let mut g = RiverGraph::new();
        assert!(g.set_outgoing_river(&cells, Hex::ZERO, dir(4)));
        assert!(!g.validate_rivers(&cells, Hex::ZERO));
        assert!(g.has_outgoing_river(Hex::ZERO));
    }
}
