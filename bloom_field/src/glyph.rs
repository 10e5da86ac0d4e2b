//! Glyph meshes and surface sampling for the text formations.
//!
//! The font backend (`meshtext`) turns a string into an extruded 3-D
//! triangle mesh once; everything downstream consumes a plain triangle
//! soup, so the sampling math is testable without any font on disk.
//!
//! Sampling picks a triangle with probability proportional to its area
//! (a cumulative-distribution walk over the running area sum), then
//! draws a uniform point inside it with folded barycentric
//! coordinates: u, v uniform in [0, 1], reflected to u' = 1 − u,
//! v' = 1 − v whenever u + v > 1 so the point stays inside.

use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::path::Path;

use meshtext::{Face, MeshGenerator, MeshText, TextSection};
use rand::Rng;

use crate::cloud::PointCloud;
use crate::formation::TEXT_WIDTH;

// ════════════════════════════════════════════════════════════════════════════
// FontError
// ════════════════════════════════════════════════════════════════════════════

/// Why a text formation could not be produced.
///
/// Fatal to the text formations only; the rest of the bouquet keeps
/// working without them.
#[derive(Debug)]
pub enum FontError {
    /// The font file could not be read.
    Io(String),
    /// The backend failed to mesh the requested string.
    Mesh(String),
    /// Meshing succeeded but produced no triangles (empty string,
    /// whitespace, or glyphs the font does not cover).
    EmptyOutline,
}

impl fmt::Display for FontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontError::Io(e) => write!(f, "font unreadable: {}", e),
            FontError::Mesh(e) => write!(f, "glyph meshing failed: {}", e),
            FontError::EmptyOutline => write!(f, "string produced no glyph outline"),
        }
    }
}

impl std::error::Error for FontError {}

// ════════════════════════════════════════════════════════════════════════════
// GlyphMesh — triangle soup
// ════════════════════════════════════════════════════════════════════════════

/// One triangle of a glyph surface.
#[derive(Clone, Copy, Debug)]
pub struct Triangle {
    pub a: [f32; 3],
    pub b: [f32; 3],
    pub c: [f32; 3],
}

impl Triangle {
    pub fn area(&self) -> f32 {
        let u = [self.b[0] - self.a[0], self.b[1] - self.a[1], self.b[2] - self.a[2]];
        let v = [self.c[0] - self.a[0], self.c[1] - self.a[1], self.c[2] - self.a[2]];
        let cx = u[1] * v[2] - u[2] * v[1];
        let cy = u[2] * v[0] - u[0] * v[2];
        let cz = u[0] * v[1] - u[1] * v[0];
        0.5 * (cx * cx + cy * cy + cz * cz).sqrt()
    }
}

/// A triangulated glyph surface, centered and scaled to world space.
#[derive(Clone, Debug, Default)]
pub struct GlyphMesh {
    tris: Vec<Triangle>,
}

impl GlyphMesh {
    /// Build from a flat triangle-list vertex buffer (9 floats per
    /// triangle).  Degenerate (zero-area) triangles are dropped so the
    /// sampler never divides by a zero total.
    pub fn from_vertices(flat: &[f32]) -> GlyphMesh {
        let mut tris = Vec::with_capacity(flat.len() / 9);
        for t in flat.chunks_exact(9) {
            let tri = Triangle {
                a: [t[0], t[1], t[2]],
                b: [t[3], t[4], t[5]],
                c: [t[6], t[7], t[8]],
            };
            if tri.area() > 0.0 {
                tris.push(tri);
            }
        }
        GlyphMesh { tris }
    }

    pub fn is_empty(&self) -> bool {
        self.tris.is_empty()
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.tris
    }

    /// Axis-aligned bounds over every vertex.
    pub fn bounds(&self) -> ([f32; 3], [f32; 3]) {
        let mut lo = [f32::MAX; 3];
        let mut hi = [f32::MIN; 3];
        for tri in &self.tris {
            for p in [tri.a, tri.b, tri.c] {
                for k in 0..3 {
                    lo[k] = lo[k].min(p[k]);
                    hi[k] = hi[k].max(p[k]);
                }
            }
        }
        (lo, hi)
    }

    /// Center the mesh on the origin and scale it to the given width.
    pub fn normalized(mut self, width: f32) -> GlyphMesh {
        if self.is_empty() {
            return self;
        }
        let (lo, hi) = self.bounds();
        let span = (hi[0] - lo[0]).max(1e-6);
        let s = width / span;
        let mid = [
            (lo[0] + hi[0]) * 0.5,
            (lo[1] + hi[1]) * 0.5,
            (lo[2] + hi[2]) * 0.5,
        ];
        for tri in &mut self.tris {
            for p in [&mut tri.a, &mut tri.b, &mut tri.c] {
                for k in 0..3 {
                    p[k] = (p[k] - mid[k]) * s;
                }
            }
        }
        self
    }
}

// ════════════════════════════════════════════════════════════════════════════
// sample_surface — area-weighted point sampling
// ════════════════════════════════════════════════════════════════════════════

/// Draw `count` points uniformly over the mesh surface.
pub fn sample_surface(mesh: &GlyphMesh, count: usize) -> PointCloud {
    if mesh.is_empty() {
        return PointCloud::from_vec(Vec::new());
    }

    // Running area sum; a uniform draw over [0, total) lands in each
    // triangle's slot with probability proportional to its area.
    let mut cumulative = Vec::with_capacity(mesh.tris.len());
    let mut total = 0.0f32;
    for tri in &mesh.tris {
        total += tri.area();
        cumulative.push(total);
    }

    let mut rng = rand::thread_rng();
    let mut coords = Vec::with_capacity(count * 3);
    for _ in 0..count {
        let pick = rng.gen_range(0.0..total);
        let idx = cumulative.partition_point(|&c| c <= pick);
        let tri = &mesh.tris[idx.min(mesh.tris.len() - 1)];

        let mut u: f32 = rng.gen();
        let mut v: f32 = rng.gen();
        if u + v > 1.0 {
            u = 1.0 - u;
            v = 1.0 - v;
        }
        for k in 0..3 {
            coords.push(tri.a[k] + u * (tri.b[k] - tri.a[k]) + v * (tri.c[k] - tri.a[k]));
        }
    }
    PointCloud::from_vec(coords)
}

// ════════════════════════════════════════════════════════════════════════════
// GlyphContext — the font boundary
// ════════════════════════════════════════════════════════════════════════════

/// Owned font state: one loaded TTF, meshed strings on demand.
///
/// Created once at startup and passed in explicitly; there is no lazy
/// global behind this.
pub struct GlyphContext {
    generator: RefCell<MeshGenerator<Face<'static>>>,
}

impl GlyphContext {
    /// Load a TTF file from disk.
    pub fn load(path: &Path) -> Result<GlyphContext, FontError> {
        let data = fs::read(path).map_err(|e| FontError::Io(format!("{}: {}", path.display(), e)))?;
        Ok(GlyphContext::from_bytes(data))
    }

    /// Take ownership of raw TTF bytes.
    ///
    /// The mesh generator needs the font data for the whole session,
    /// so the buffer is leaked once here rather than cloned per glyph.
    pub fn from_bytes(data: Vec<u8>) -> GlyphContext {
        let font: &'static [u8] = Box::leak(data.into_boxed_slice());
        GlyphContext {
            generator: RefCell::new(MeshGenerator::new(font)),
        }
    }

    /// Mesh a string into a centered, world-scaled glyph surface.
    pub fn mesh(&self, text: &str) -> Result<GlyphMesh, FontError> {
        let meshed: MeshText = self
            .generator
            .borrow_mut()
            .generate_section(text, false, None)
            .map_err(|e| FontError::Mesh(e.to_string()))?;
        let mesh = GlyphMesh::from_vertices(&meshed.vertices);
        if mesh.is_empty() {
            return Err(FontError::EmptyOutline);
        }
        Ok(mesh.normalized(TEXT_WIDTH))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
