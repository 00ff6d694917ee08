use glam::{Vec2, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
}

impl Vertex {
    #[inline]
    pub const fn new(position: Vec3, normal: Vec3) -> Self {
        Self { position, normal }
    }
}

/// A self-contained chunk of triangles, placed in the scene by `offset`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshFragment {
    pub vertices: Vec<Vertex>,
    /// Triangle list, local to `vertices`.
    pub indices: Vec<u32>,
    pub offset: Vec2,
}

impl MeshFragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Index the next pushed vertex will get.
    #[inline]
    pub fn base_index(&self) -> u32 {
        self.vertices.len() as u32
    }

    /// Move `other`'s geometry into this fragment, rebasing its indices.
    pub fn append(&mut self, other: MeshFragment) {
        let base = self.base_index();
        self.vertices.extend(other.vertices);
        self.indices.extend(other.indices.into_iter().map(|i| i + base));
    }

    /// Drop triangles whose first corner coincides with the second or third.
    pub fn remove_degenerate_triangles(&mut self) {
        let vertices = &self.vertices;
        let mut kept = Vec::with_capacity(self.indices.len());

        for tri in self.indices.chunks_exact(3) {
            let p0 = vertices[tri[0] as usize].position;
            let p1 = vertices[tri[1] as usize].position;
            let p2 = vertices[tri[2] as usize].position;

            if p0 == p1 || p0 == p2 {
                continue;
            }

            kept.extend_from_slice(tri);
        }

        self.indices = kept;
    }

    /// Replace normals with the normalized sum of adjacent face normals.
    pub fn compute_normals(&mut self) {
        for v in &mut self.vertices {
            v.normal = Vec3::ZERO;
        }

        for tri in self.indices.chunks_exact(3) {
            let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let p0 = self.vertices[a].position;
            let p1 = self.vertices[b].position;
            let p2 = self.vertices[c].position;

            let n = (p1 - p0).cross(p2 - p0).normalize_or_zero();

            self.vertices[a].normal += n;
            self.vertices[b].normal += n;
            self.vertices[c].normal += n;
        }

        for v in &mut self.vertices {
            v.normal = v.normal.normalize_or_zero();
        }
    }
}
