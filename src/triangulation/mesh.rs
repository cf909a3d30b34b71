//! Vertex buffers produced by the triangulation pass.

use bevy::asset::RenderAssetUsages;
use bevy::mesh::Indices;
use bevy::prelude::*;
use bevy::render::render_resource::PrimitiveTopology;

use crate::hex_map::HexNoise;
use crate::hex_map::geometry::EdgeVertices;
use crate::math;

/// Triangle list with per-vertex colour.
///
/// Every triangle owns its three vertices, so normals stay flat and chunks
/// can be concatenated without re-indexing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    /// Vertex positions.
    pub positions: Vec<[f32; 3]>,
    /// Flat, upward-facing normals.
    pub normals: Vec<[f32; 3]>,
    /// Linear RGBA vertex colours.
    pub colors: Vec<[f32; 4]>,
}

impl MeshData {
    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// True when nothing was emitted.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Appends a triangle as given, without perturbation.
    pub fn push_triangle(&mut self, v: [Vec3; 3], c: [LinearRgba; 3]) {
        let n = math::upward_normal(v[0], v[1], v[2]).to_array();
        for (p, c) in v.iter().zip(c) {
            self.positions.push(p.to_array());
            self.normals.push(n);
            self.colors.push(c.to_f32_array());
        }
    }

    /// Appends all of `other`.
    pub fn merge(&mut self, other: &MeshData) {
        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.colors.extend_from_slice(&other.colors);
    }

    /// Iterates over triangles as position triples.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.positions
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]].map(Vec3::from_array))
    }

    /// Converts into a render mesh with position, normal and colour attributes.
    pub fn into_mesh(self) -> Mesh {
        let count = self.positions.len() as u32;
        Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::RENDER_WORLD,
        )
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, self.positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, self.normals)
        .with_inserted_attribute(Mesh::ATTRIBUTE_COLOR, self.colors)
        .with_inserted_indices(Indices::U32((0..count).collect()))
    }
}

/// Appends geometry to a [`MeshData`], perturbing positions through the noise.
pub struct MeshBuilder<'a> {
    data: &'a mut MeshData,
    noise: &'a HexNoise,
}

impl<'a> MeshBuilder<'a> {
    /// Builder writing into `data`.
    pub fn new(data: &'a mut MeshData, noise: &'a HexNoise) -> Self {
        Self { data, noise }
    }

    /// Perturbed copy of a point.
    pub fn perturb(&self, p: Vec3) -> Vec3 {
        self.noise.perturb(p)
    }

    /// The noise collaborator, for decorative placement.
    pub fn noise(&self) -> &HexNoise {
        self.noise
    }

    /// Triangle with perturbed vertices.
    pub fn triangle(&mut self, v: [Vec3; 3], c: [LinearRgba; 3]) {
        let v = v.map(|p| self.noise.perturb(p));
        self.data.push_triangle(v, c);
    }

    /// Triangle with vertices used as given.
    pub fn triangle_unperturbed(&mut self, v: [Vec3; 3], c: [LinearRgba; 3]) {
        self.data.push_triangle(v, c);
    }

    /// Single-colour triangle with perturbed vertices.
    pub fn triangle_color(&mut self, v: [Vec3; 3], c: LinearRgba) {
        self.triangle(v, [c; 3]);
    }

    /// Quad `v1 v2` / `v3 v4`, where `v1 v2` and `v3 v4` are opposite sides.
    pub fn quad(&mut self, v: [Vec3; 4], c: [LinearRgba; 4]) {
        self.triangle([v[0], v[2], v[1]], [c[0], c[2], c[1]]);
        self.triangle([v[1], v[2], v[3]], [c[1], c[2], c[3]]);
    }

    /// Quad between two parallel edges, each side in a single colour.
    pub fn quad_2colors(&mut self, v: [Vec3; 4], c1: LinearRgba, c2: LinearRgba) {
        self.quad(v, [c1, c1, c2, c2]);
    }

    /// Three quads joining the matching points of two edges.
    ///
    /// Each edge is perturbed once up front; the result equals
    /// [`quad_2colors`](Self::quad_2colors) per segment.
    pub fn edge_strip(
        &mut self,
        e1: &EdgeVertices,
        c1: LinearRgba,
        e2: &EdgeVertices,
        c2: LinearRgba,
    ) {
        let a = self.noise.perturb_edge(e1).points();
        let b = self.noise.perturb_edge(e2).points();
        for (s, t) in a.windows(2).zip(b.windows(2)) {
            self.data.push_triangle([s[0], t[0], s[1]], [c1, c2, c1]);
            self.data.push_triangle([s[1], t[0], t[1]], [c1, c2, c2]);
        }
    }

    /// Three triangles joining `center` to the segments of `edge`.
    pub fn edge_fan(&mut self, center: Vec3, edge: &EdgeVertices, color: LinearRgba) {
        let hub = self.noise.perturb(center);
        for s in self.noise.perturb_edge(edge).points().windows(2) {
            self.data.push_triangle([hub, s[0], s[1]], [color; 3]);
        }
    }
}
