//! Noise-driven map generation: terrain, decorations and rivers.

use bevy::log::{info, warn};
use hexx::{EdgeDirection, Hex};
use ::noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::GridSettings;
use super::cell::{Feature, HexCell, Shape, Terrain, Vegetation};
use super::geometry::MapGeometry;
use super::grid::HexMap;
use super::rivers::CellSource;
use crate::math;

/// Generates a hexagonal map from `settings`.
///
/// The same settings always produce the same map.
pub fn generate(settings: &GridSettings, geometry: MapGeometry) -> HexMap {
    let height_fbm: Fbm<Perlin> =
        Fbm::new(settings.seed).set_octaves(settings.height_noise_octaves);
    let moisture_fbm: Fbm<Perlin> = Fbm::new(settings.seed.wrapping_add(1)).set_octaves(3);
    let mut rng = ChaCha8Rng::seed_from_u64(u64::from(settings.seed));

    let layout = geometry.clone();
    let mut map = HexMap::hexagon(settings.radius, geometry, |hex| {
        let pos = layout.hex_to_world_pos(hex);
        let h = height_fbm.get([
            pos.x as f64 / settings.height_noise_scale,
            pos.y as f64 / settings.height_noise_scale,
        ]);
        let m = moisture_fbm.get([
            pos.x as f64 / settings.moisture_noise_scale,
            pos.y as f64 / settings.moisture_noise_scale,
        ]);
        classify(
            math::map_noise_to_range(h, 0.0, 1.0),
            math::map_noise_to_range(m, 0.0, 1.0),
        )
    });

    for hex in map.hexes() {
        decorate(&mut map, hex, &mut rng);
    }
    let rivers = grow_rivers(&mut map, settings, &mut rng);

    info!(
        "generated map: {} cells, {} rivers, {} river edges",
        map.len(),
        rivers,
        map.rivers().edges().count()
    );
    map
}

/// Terrain and shape from height and moisture in `[0, 1]`.
fn classify(height: f32, moisture: f32) -> HexCell {
    if height < 0.32 {
        return HexCell::new(Terrain::DeepWater, Shape::Flatlands);
    }
    if height < 0.42 {
        return HexCell::new(Terrain::ShallowWater, Shape::Flatlands);
    }
    let shape = match height {
        h if h < 0.62 => Shape::Flatlands,
        h if h < 0.76 => Shape::Hills,
        _ => Shape::Mountains,
    };
    let terrain = match (shape, moisture) {
        (Shape::Mountains, _) if height > 0.86 => Terrain::Snow,
        (Shape::Mountains, _) => Terrain::Tundra,
        (Shape::Flatlands, m) if m > 0.82 => Terrain::FreshWater,
        (_, m) if m < 0.30 => Terrain::Desert,
        (_, m) if m < 0.48 => Terrain::Plains,
        _ => Terrain::Grassland,
    };
    let mut cell = HexCell::new(terrain, shape);
    if terrain == Terrain::Grassland {
        cell.vegetation = match moisture {
            m if m > 0.74 => Vegetation::Jungle,
            m if m > 0.62 => Vegetation::Forest,
            _ => Vegetation::None,
        };
    }
    cell
}

/// Seeds marshes, farms, oases and ruins on suitable land.
fn decorate(map: &mut HexMap, hex: Hex, rng: &mut ChaCha8Rng) {
    let Some(cell) = map.cell(hex).cloned() else {
        return;
    };
    if cell.is_water() {
        return;
    }
    let roll: f32 = rng.gen_range(0.0..1.0);
    let flat = cell.shape == Shape::Flatlands;
    let result = match cell.terrain {
        Terrain::Desert if flat && roll < 0.12 => map.set_feature(hex, Feature::Oasis),
        Terrain::Grassland if flat && cell.vegetation == Vegetation::None && roll < 0.08 => {
            map.set_vegetation(hex, Vegetation::Marsh)
        }
        Terrain::Grassland | Terrain::Plains if cell.shape != Shape::Mountains && roll > 0.90 => {
            map.set_feature(hex, Feature::Farm)
        }
        _ if roll > 0.985 => map.set_feature(hex, Feature::CityRuins),
        _ => Ok(()),
    };
    if let Err(e) = result {
        warn!("decoration skipped: {e}");
    }
}

/// Grows up to `river_count` rivers downhill from hill-side sources.
///
/// Returns the number of rivers that got at least one edge.
fn grow_rivers(map: &mut HexMap, settings: &GridSettings, rng: &mut ChaCha8Rng) -> usize {
    let mut sources: Vec<Hex> = map
        .hexes()
        .into_iter()
        .filter(|&h| {
            map.cell(h)
                .is_some_and(|c| !c.is_water() && c.shape == Shape::Hills)
        })
        .collect();
    sources.shuffle(rng);

    let mut grown = 0;
    for source in sources {
        if grown >= settings.river_count {
            break;
        }
        if map.rivers().has_river(source) {
            continue;
        }
        let mut current = source;
        let mut length = 0;
        while length < settings.max_river_length {
            let Some(direction) = pick_downstream(map, current, rng) else {
                break;
            };
            map.set_outgoing_river(current, direction);
            length += 1;
            current = current.neighbor(direction);
            if map.cell(current).is_none_or(HexCell::is_water) {
                break;
            }
        }
        if length > 0 {
            grown += 1;
        }
    }
    grown
}

/// Lowest legal neighbour that has no river yet, ties broken at random.
fn pick_downstream(map: &HexMap, hex: Hex, rng: &mut ChaCha8Rng) -> Option<EdgeDirection> {
    let mut best: Vec<(i32, EdgeDirection)> = EdgeDirection::ALL_DIRECTIONS
        .into_iter()
        .filter(|&d| {
            map.rivers()
                .can_add_outgoing_river_through_edge(map, hex, d)
                && !map.rivers().has_river(hex.neighbor(d))
        })
        .filter_map(|d| map.neighbor(hex, d).map(|c| (c.elevation(), d)))
        .collect();
    let lowest = best.iter().map(|&(e, _)| e).min()?;
    best.retain(|&(e, _)| e == lowest);
    best.choose(rng).map(|&(_, d)| d)
}
