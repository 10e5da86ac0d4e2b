//! The six named formations and their point-cloud generators.
//!
//! Generators are pure functions from a target particle count (plus
//! shape parameters) to a [`PointCloud`] of exactly that many points.
//! Sampling is independent per call; the shapes are visual, not
//! reproducible, so no seeding is exposed.
//!
//! All formations are generated once at startup into a
//! [`FormationSet`]; the interactive loop only ever looks clouds up,
//! it never regenerates them.

use std::collections::HashMap;
use std::f32::consts::TAU;
use std::rc::Rc;

use rand::Rng;

use crate::cloud::PointCloud;
use crate::glyph::{sample_surface, GlyphContext};

// ════════════════════════════════════════════════════════════════════════════
// Shape parameters
// ════════════════════════════════════════════════════════════════════════════

/// Radius of the idle bloom scatter.
pub const BLOOM_RADIUS: f32 = 3.2;
/// Radius of the fist contraction.
pub const CLUSTER_RADIUS: f32 = 0.9;
/// Scale applied to the parametric heart curve (native extent ±16/±17).
pub const HEART_SCALE: f32 = 0.22;
/// Depth jitter that thickens the heart into 3-D.
pub const HEART_DEPTH: f32 = 0.35;
/// Planet body radius and ring band.
pub const PLANET_BODY_RADIUS: f32 = 1.4;
pub const RING_INNER: f32 = 2.4;
pub const RING_OUTER: f32 = 3.6;
/// Vertical jitter that keeps the ring a flattened band, not a line.
pub const RING_Y_JITTER: f32 = 0.15;
/// Fraction of planet points that fill the body; the rest ring it.
const PLANET_BODY_FRACTION: f32 = 0.4;
/// World-space width text formations are scaled to.
pub const TEXT_WIDTH: f32 = 6.0;

// ════════════════════════════════════════════════════════════════════════════
// FormationId
// ════════════════════════════════════════════════════════════════════════════

/// One of the six target shapes.  `Bloom` is the startup default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormationId {
    Bloom,
    Heart,
    Planet,
    Cluster,
    Love,
    Ily,
}

impl FormationId {
    /// Fixed enumeration order, used by the cycle control.
    pub const ALL: [FormationId; 6] = [
        FormationId::Bloom,
        FormationId::Heart,
        FormationId::Planet,
        FormationId::Cluster,
        FormationId::Love,
        FormationId::Ily,
    ];

    /// Next formation in cycle order, wrapping at the end.
    pub fn next(self) -> FormationId {
        let i = Self::ALL.iter().position(|&f| f == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    /// Headline shown while the formation is active.
    pub fn title(self) -> &'static str {
        match self {
            FormationId::Bloom => "Bouquet",
            FormationId::Heart => "Heart",
            FormationId::Planet => "Little Planet",
            FormationId::Cluster => "Bud",
            FormationId::Love => "Love Letters",
            FormationId::Ily => "I Love You",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Generators
// ════════════════════════════════════════════════════════════════════════════

/// Uniform-volume scatter inside a ball.
///
/// Radius is drawn as `R * u^(1/3)`; a plain `R * u` would pile points
/// at the center.
pub fn sphere_scatter(count: usize, radius: f32) -> PointCloud {
    let mut rng = rand::thread_rng();
    let mut coords = Vec::with_capacity(count * 3);
    for _ in 0..count {
        let r = radius * rng.gen::<f32>().cbrt();
        let cos_theta: f32 = rng.gen_range(-1.0..1.0f32);
        let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
        let phi = rng.gen_range(0.0..TAU);
        coords.push(r * sin_theta * phi.cos());
        coords.push(r * cos_theta);
        coords.push(r * sin_theta * phi.sin());
    }
    PointCloud::from_vec(coords)
}

/// The classic parametric heart, sampled at random curve positions and
/// jittered in depth for a 3-D feel.
///
/// x = 16 sin³ t,  y = 13 cos t − 5 cos 2t − 2 cos 3t − cos 4t
pub fn heart(count: usize, scale: f32) -> PointCloud {
    let mut rng = rand::thread_rng();
    let mut coords = Vec::with_capacity(count * 3);
    for _ in 0..count {
        let t = rng.gen_range(0.0..TAU);
        let x = 16.0 * t.sin().powi(3);
        let y = 13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos();
        coords.push(x * scale);
        coords.push(y * scale);
        coords.push(rng.gen_range(-HEART_DEPTH..HEART_DEPTH));
    }
    PointCloud::from_vec(coords)
}

/// A small solid sphere ringed by a flattened band.
///
/// The first ~40% of points fill the body; the remainder scatter along
/// the ring with a randomized radius and slight vertical jitter.
pub fn planet(count: usize, body_radius: f32, ring_inner: f32, ring_outer: f32) -> PointCloud {
    let body_count = (count as f32 * PLANET_BODY_FRACTION) as usize;
    let mut coords = Vec::with_capacity(count * 3);
    coords.extend_from_slice(sphere_scatter(body_count, body_radius).as_slice());

    let mut rng = rand::thread_rng();
    for _ in body_count..count {
        let angle = rng.gen_range(0.0..TAU);
        let r = rng.gen_range(ring_inner..ring_outer);
        coords.push(r * angle.cos());
        coords.push(rng.gen_range(-RING_Y_JITTER..RING_Y_JITTER));
        coords.push(r * angle.sin());
    }
    PointCloud::from_vec(coords)
}

/// Generate the cloud for one formation id, text formations excepted.
///
/// Text needs a live [`GlyphContext`]; callers go through
/// [`FormationSet::build`] for those.
pub fn generate(id: FormationId, count: usize) -> Option<PointCloud> {
    match id {
        FormationId::Bloom => Some(sphere_scatter(count, BLOOM_RADIUS)),
        FormationId::Heart => Some(heart(count, HEART_SCALE)),
        FormationId::Planet => Some(planet(count, PLANET_BODY_RADIUS, RING_INNER, RING_OUTER)),
        FormationId::Cluster => Some(sphere_scatter(count, CLUSTER_RADIUS)),
        FormationId::Love | FormationId::Ily => None,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FormationSet — precomputed clouds, one per formation
// ════════════════════════════════════════════════════════════════════════════

/// All formation clouds, generated once before the interactive loop.
///
/// Text formations are present only when a glyph context was supplied
/// and the string produced a non-empty mesh; everything else is always
/// available.  Lookups hand out `Rc` clones, never copies of the
/// coordinate data.
pub struct FormationSet {
    clouds: HashMap<FormationId, Rc<PointCloud>>,
    count: usize,
}

impl FormationSet {
    pub fn build(
        count: usize,
        glyphs: Option<&GlyphContext>,
        love_text: &str,
        ily_text: &str,
    ) -> FormationSet {
        let mut clouds = HashMap::new();
        for id in FormationId::ALL {
            let cloud = match id {
                FormationId::Love => text_cloud(glyphs, love_text, count),
                FormationId::Ily => text_cloud(glyphs, ily_text, count),
                other => generate(other, count),
            };
            if let Some(c) = cloud {
                // Generators aim for `count` directly; anything with a
                // different natural sample count is wrapped cyclically.
                clouds.insert(id, Rc::new(c.wrapped_to(count)));
            }
        }
        FormationSet { clouds, count }
    }

    pub fn get(&self, id: FormationId) -> Option<Rc<PointCloud>> {
        self.clouds.get(&id).cloned()
    }

    pub fn contains(&self, id: FormationId) -> bool {
        self.clouds.contains_key(&id)
    }

    pub fn particle_count(&self) -> usize {
        self.count
    }
}

fn text_cloud(glyphs: Option<&GlyphContext>, text: &str, count: usize) -> Option<PointCloud> {
    let ctx = glyphs?;
    match ctx.mesh(text) {
        Ok(mesh) => Some(sample_surface(&mesh, count)),
        Err(e) => {
            eprintln!("[formation] no cloud for \"{}\": {}", text, e);
            None
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const N: usize = 5000;

    #[test]
    fn sphere_scatter_exact_length() {
        assert_eq!(sphere_scatter(N, BLOOM_RADIUS).len_floats(), N * 3);
    }

    #[test]
    fn heart_exact_length() {
        assert_eq!(heart(N, HEART_SCALE).len_floats(), N * 3);
    }

    #[test]
    fn planet_exact_length() {
        let c = planet(N, PLANET_BODY_RADIUS, RING_INNER, RING_OUTER);
        assert_eq!(c.len_floats(), N * 3);
    }

    #[test]
    fn sphere_scatter_stays_in_radius() {
        let c = sphere_scatter(N, BLOOM_RADIUS);
        assert!(c.max_radius() <= BLOOM_RADIUS + 1e-4);
    }

    #[test]
    fn cluster_is_compact() {
        let c = sphere_scatter(N, CLUSTER_RADIUS);
        assert!(c.max_radius() <= CLUSTER_RADIUS + 1e-4);
    }

    #[test]
    fn planet_stays_in_outer_radius() {
        let c = planet(N, PLANET_BODY_RADIUS, RING_INNER, RING_OUTER);
        // Outer ring plus its vertical jitter bounds the whole shape.
        let bound = (RING_OUTER * RING_OUTER + RING_Y_JITTER * RING_Y_JITTER).sqrt();
        assert!(c.max_radius() <= bound + 1e-4);
    }

    #[test]
    fn planet_ring_band_is_flat() {
        let c = planet(N, PLANET_BODY_RADIUS, RING_INNER, RING_OUTER);
        let body_count = (N as f32 * 0.4) as usize;
        for i in body_count..N {
            let [x, y, z] = c.point(i);
            let r = (x * x + z * z).sqrt();
            assert!(r >= RING_INNER - 1e-4 && r <= RING_OUTER + 1e-4);
            assert!(y.abs() <= RING_Y_JITTER + 1e-4);
        }
    }

    #[test]
    fn heart_is_symmetric_about_x() {
        let c = heart(N, HEART_SCALE);
        let mut left = 0usize;
        let mut sum_x = 0.0f32;
        for i in 0..N {
            let [x, _, _] = c.point(i);
            if x < 0.0 {
                left += 1;
            }
            sum_x += x;
        }
        let frac = left as f32 / N as f32;
        assert!((frac - 0.5).abs() < 0.1, "left fraction {}", frac);
        assert!((sum_x / N as f32).abs() < 0.3);
    }

    #[test]
    fn heart_lobes_reach_both_sides() {
        let c = heart(N, HEART_SCALE);
        let max_x = (0..N).map(|i| c.point(i)[0]).fold(f32::MIN, f32::max);
        let min_x = (0..N).map(|i| c.point(i)[0]).fold(f32::MAX, f32::min);
        // The curve peaks at |x| = 16 * scale.
        assert!(max_x > 12.0 * HEART_SCALE);
        assert!(min_x < -12.0 * HEART_SCALE);
    }

    #[test]
    fn formation_cycle_visits_all_and_wraps() {
        let mut seen = vec![FormationId::Bloom];
        let mut f = FormationId::Bloom;
        for _ in 0..5 {
            f = f.next();
            seen.push(f);
        }
        assert_eq!(seen, FormationId::ALL.to_vec());
        assert_eq!(f.next(), FormationId::Bloom);
    }

    #[test]
    fn build_without_font_skips_text_only() {
        let set = FormationSet::build(500, None, "LOVE", "I LOVE U");
        assert!(set.contains(FormationId::Bloom));
        assert!(set.contains(FormationId::Heart));
        assert!(set.contains(FormationId::Planet));
        assert!(set.contains(FormationId::Cluster));
        assert!(!set.contains(FormationId::Love));
        assert!(!set.contains(FormationId::Ily));
    }

    #[test]
    fn built_clouds_match_particle_count() {
        let set = FormationSet::build(777, None, "LOVE", "I LOVE U");
        for id in FormationId::ALL {
            if let Some(c) = set.get(id) {
                assert_eq!(c.len_floats(), 777 * 3);
            }
        }
    }

    #[test]
    fn get_shares_not_copies() {
        let set = FormationSet::build(100, None, "LOVE", "I LOVE U");
        let a = set.get(FormationId::Bloom).unwrap();
        let b = set.get(FormationId::Bloom).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
    }
}
