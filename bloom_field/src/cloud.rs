//! Flat point-cloud buffers.
//!
//! A `PointCloud` is `count * 3` floats, `[x, y, z, x, y, z, …]`, in
//! render space.  Formation generators produce one per shape at
//! startup; after that a cloud is immutable and shared into the engine
//! by `Rc` rather than copied.

/// A fixed-length buffer of 3-D target positions.
#[derive(Clone, Debug, PartialEq)]
pub struct PointCloud {
    coords: Vec<f32>,
}

impl PointCloud {
    /// Wrap a coordinate buffer.  The length must be a multiple of 3;
    /// trailing stragglers are dropped rather than misread.
    pub fn from_vec(mut coords: Vec<f32>) -> PointCloud {
        coords.truncate(coords.len() - coords.len() % 3);
        PointCloud { coords }
    }

    pub fn len_points(&self) -> usize {
        self.coords.len() / 3
    }

    pub fn len_floats(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.coords
    }

    pub fn point(&self, i: usize) -> [f32; 3] {
        [self.coords[i * 3], self.coords[i * 3 + 1], self.coords[i * 3 + 2]]
    }

    /// Resize to exactly `count` points by cyclic repetition.
    ///
    /// Formations whose natural sample count differs from the global
    /// particle count are wrapped index-modulo; shapes with few
    /// natural samples simply repeat, which reads fine in a particle
    /// cloud.  An empty cloud stays empty (there is nothing to repeat).
    pub fn wrapped_to(&self, count: usize) -> PointCloud {
        if self.is_empty() || self.len_points() == count {
            return self.clone();
        }
        let n = self.len_points();
        let mut coords = Vec::with_capacity(count * 3);
        for i in 0..count {
            let src = (i % n) * 3;
            coords.extend_from_slice(&self.coords[src..src + 3]);
        }
        PointCloud { coords }
    }

    /// Largest distance from the origin over all points.
    pub fn max_radius(&self) -> f32 {
        (0..self.len_points())
            .map(|i| {
                let [x, y, z] = self.point(i);
                (x * x + y * y + z * z).sqrt()
            })
            .fold(0.0, f32::max)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_vec_drops_stragglers() {
        let c = PointCloud::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(c.len_points(), 1);
        assert_eq!(c.as_slice(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn wrapped_to_repeats_cyclically() {
        let c = PointCloud::from_vec(vec![
            1.0, 1.0, 1.0, // point 0
            2.0, 2.0, 2.0, // point 1
        ]);
        let w = c.wrapped_to(5);
        assert_eq!(w.len_points(), 5);
        assert_eq!(w.point(0), [1.0; 3]);
        assert_eq!(w.point(1), [2.0; 3]);
        assert_eq!(w.point(2), [1.0; 3]);
        assert_eq!(w.point(4), [1.0; 3]);
    }

    #[test]
    fn wrapped_to_can_shrink() {
        let c = PointCloud::from_vec((0..30).map(|i| i as f32).collect());
        let w = c.wrapped_to(4);
        assert_eq!(w.len_floats(), 12);
        assert_eq!(w.point(3), [9.0, 10.0, 11.0]);
    }

    #[test]
    fn wrapped_to_same_count_is_identity() {
        let c = PointCloud::from_vec(vec![1.0, 2.0, 3.0]);
        assert_eq!(c.wrapped_to(1), c);
    }

    #[test]
    fn wrapped_empty_stays_empty() {
        let c = PointCloud::from_vec(vec![]);
        assert!(c.wrapped_to(10).is_empty());
    }

    #[test]
    fn max_radius_finds_farthest() {
        let c = PointCloud::from_vec(vec![0.0, 0.0, 0.0, 3.0, 4.0, 0.0]);
        assert!((c.max_radius() - 5.0).abs() < 1e-6);
    }
}
