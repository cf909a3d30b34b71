//! Per-cell state and the edge classification derived from it.

use bevy::prelude::*;
use hexx::EdgeDirection;

/// Ground cover of a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Reflect)]
pub enum Terrain {
    /// Temperate grass.
    #[default]
    Grassland,
    /// Dry open plains.
    Plains,
    /// Sand and rock.
    Desert,
    /// Cold steppe.
    Tundra,
    /// Permanent snow.
    Snow,
    /// Coastal sea.
    ShallowWater,
    /// Open ocean.
    DeepWater,
    /// Inland lake.
    FreshWater,
}

impl Terrain {
    /// All terrain kinds, in declaration order.
    pub const ALL: [Terrain; 8] = [
        Terrain::Grassland,
        Terrain::Plains,
        Terrain::Desert,
        Terrain::Tundra,
        Terrain::Snow,
        Terrain::ShallowWater,
        Terrain::DeepWater,
        Terrain::FreshWater,
    ];

    /// True for the three water kinds.
    pub fn is_water(self) -> bool {
        matches!(
            self,
            Terrain::ShallowWater | Terrain::DeepWater | Terrain::FreshWater
        )
    }

    /// Base vertex colour for this terrain.
    pub fn color(self) -> LinearRgba {
        match self {
            Terrain::Grassland => LinearRgba::rgb(0.18, 0.42, 0.12),
            Terrain::Plains => LinearRgba::rgb(0.52, 0.50, 0.22),
            Terrain::Desert => LinearRgba::rgb(0.80, 0.68, 0.40),
            Terrain::Tundra => LinearRgba::rgb(0.45, 0.45, 0.38),
            Terrain::Snow => LinearRgba::rgb(0.92, 0.94, 0.97),
            Terrain::ShallowWater => LinearRgba::rgb(0.16, 0.45, 0.60),
            Terrain::DeepWater => LinearRgba::rgb(0.05, 0.15, 0.38),
            Terrain::FreshWater => LinearRgba::rgb(0.20, 0.50, 0.55),
        }
    }
}

/// Elevation class of a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Reflect)]
pub enum Shape {
    /// Level ground.
    #[default]
    Flatlands,
    /// One level above flatlands.
    Hills,
    /// Three levels above flatlands.
    Mountains,
}

/// Plant cover layered over the terrain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Reflect)]
pub enum Vegetation {
    /// Bare terrain.
    #[default]
    None,
    /// Temperate forest.
    Forest,
    /// Tropical jungle.
    Jungle,
    /// Wetland reeds.
    Marsh,
}

impl Vegetation {
    fn tint(self, base: LinearRgba) -> LinearRgba {
        let (r, g, b) = match self {
            Vegetation::None => return base,
            Vegetation::Forest => (0.75, 0.85, 0.75),
            Vegetation::Jungle => (0.60, 0.90, 0.60),
            Vegetation::Marsh => (0.80, 0.90, 0.95),
        };
        LinearRgba::new(base.red * r, base.green * g, base.blue * b, base.alpha)
    }
}

/// Decorative or economic marker independent of terrain and vegetation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Reflect)]
pub enum Feature {
    /// Nothing placed.
    #[default]
    None,
    /// Remains of a city (placed as a prop, no mesh contribution).
    CityRuins,
    /// Cultivated fields.
    Farm,
    /// Desert spring.
    Oasis,
}

/// One cell of the map.
///
/// River links are not stored here: they live in
/// [`RiverGraph`](super::rivers::RiverGraph) so that both endpoints of a
/// river edge are always updated together.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HexCell {
    /// Ground cover.
    pub terrain: Terrain,
    /// Elevation class.
    pub shape: Shape,
    /// Plant cover.
    pub vegetation: Vegetation,
    /// Placed feature.
    pub feature: Feature,
    /// Directions whose edge carries a road. Mirrored on the neighbour.
    pub road_edges: [bool; 6],
}

impl HexCell {
    /// Convenience constructor for a cell with no vegetation, feature or roads.
    pub fn new(terrain: Terrain, shape: Shape) -> Self {
        Self {
            terrain,
            shape,
            ..default()
        }
    }

    /// Integer height level, fully determined by terrain and shape.
    ///
    /// Water ignores shape. Land sits two levels above shallow water so a
    /// beach is a slope and a drop into deep water is a cliff.
    pub fn elevation(&self) -> i32 {
        match self.terrain {
            Terrain::DeepWater => 0,
            Terrain::ShallowWater | Terrain::FreshWater => 1,
            _ => match self.shape {
                Shape::Flatlands => 2,
                Shape::Hills => 3,
                Shape::Mountains => 5,
            },
        }
    }

    /// True when the terrain is one of the water kinds.
    pub fn is_water(&self) -> bool {
        self.terrain.is_water()
    }

    /// Whether a road runs across the edge in `direction`.
    pub fn has_road_through_edge(&self, direction: EdgeDirection) -> bool {
        self.road_edges[direction.index() as usize]
    }

    /// Whether any edge carries a road.
    pub fn has_roads(&self) -> bool {
        self.road_edges.iter().any(|&r| r)
    }

    /// Vertex colour: terrain base with vegetation tint.
    pub fn color(&self) -> LinearRgba {
        self.vegetation.tint(self.terrain.color())
    }
}

/// Classification of the boundary between two adjacent cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeType {
    /// Same elevation.
    Flat,
    /// One level apart; rendered as terraces.
    Slope,
    /// Two or more levels apart; rendered as a wall. Rivers and roads never cross it.
    Cliff,
}

impl EdgeType {
    /// Classifies an elevation pair. Symmetric in its arguments.
    pub fn between(a: i32, b: i32) -> Self {
        match (a - b).abs() {
            0 => EdgeType::Flat,
            1 => EdgeType::Slope,
            _ => EdgeType::Cliff,
        }
    }

    /// Classifies the boundary between two cells.
    pub fn of(a: &HexCell, b: &HexCell) -> Self {
        Self::between(a.elevation(), b.elevation())
    }
}
