//! The particle transition engine.
//!
//! Owns the only mutable particle buffer in the system and advances it
//! once per render frame.  Two influences apply, both per particle and
//! order-independent:
//!
//! 1. **Target blending** — every coordinate moves a fixed fraction of
//!    the remaining distance toward its target (exponential decay,
//!    0.92 of the gap survives each frame; convergence is asymptotic).
//! 2. **Attraction** — an optional point pulls nearby particles along
//!    the unit vector toward it, with force falling off linearly to
//!    zero at the radius boundary.
//!
//! There is no velocity or momentum state.  The blend fraction is per
//! advance call by construction; frame pacing is the window's job.

use std::rc::Rc;

use crate::cloud::PointCloud;
use crate::formation::{sphere_scatter, FormationId};

/// Fraction of the remaining distance covered per frame.
pub const BLEND_FRACTION: f32 = 0.08;
/// Attraction reaches this far; zero force at the boundary.
pub const ATTRACT_RADIUS: f32 = 4.0;
/// Below this distance the pull is dropped entirely, guarding the
/// division by the distance.
pub const ATTRACT_EPSILON: f32 = 0.01;
/// Peak attraction displacement per frame, at the attractor itself.
pub const ATTRACT_STRENGTH: f32 = 0.3;

/// Radius of the scatter particles spawn into before the first target
/// arrives.
const SPAWN_RADIUS: f32 = 6.0;

// ════════════════════════════════════════════════════════════════════════════
// TransitionEngine
// ════════════════════════════════════════════════════════════════════════════

pub struct TransitionEngine {
    positions: Vec<f32>,
    target: Option<(FormationId, Rc<PointCloud>)>,
}

impl TransitionEngine {
    /// Spawn `count` particles in a wide scatter; they drift into the
    /// first formation once a target is set.
    pub fn new(count: usize) -> TransitionEngine {
        TransitionEngine {
            positions: sphere_scatter(count, SPAWN_RADIUS).as_slice().to_vec(),
            target: None,
        }
    }

    pub fn particle_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// The live position buffer, `count * 3` floats.
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn target_id(&self) -> Option<FormationId> {
        self.target.as_ref().map(|(id, _)| *id)
    }

    /// Point the engine at a new formation.
    ///
    /// Live positions stay where they are; the change shows up as a
    /// gradual morph over the following frames.  A cloud whose length
    /// does not match the particle buffer is ignored, as is re-setting
    /// the id that is already active (that would only restart nothing).
    pub fn set_target(&mut self, id: FormationId, cloud: Rc<PointCloud>) {
        if cloud.len_floats() != self.positions.len() {
            return;
        }
        if self.target_id() == Some(id) {
            return;
        }
        self.target = Some((id, cloud));
    }

    /// Advance every particle by one frame.
    pub fn advance(&mut self, attractor: Option<[f32; 3]>) {
        if let Some((_, cloud)) = &self.target {
            let goal = cloud.as_slice();
            for (p, g) in self.positions.iter_mut().zip(goal) {
                *p += (g - *p) * BLEND_FRACTION;
            }
        }

        let a = match attractor {
            Some(a) => a,
            None => return,
        };
        for chunk in self.positions.chunks_exact_mut(3) {
            let dx = a[0] - chunk[0];
            let dy = a[1] - chunk[1];
            let dz = a[2] - chunk[2];
            let dist = (dx * dx + dy * dy + dz * dz).sqrt();
            if dist <= ATTRACT_EPSILON || dist >= ATTRACT_RADIUS {
                continue;
            }
            let pull = ATTRACT_STRENGTH * (1.0 - dist / ATTRACT_RADIUS) / dist;
            chunk[0] += dx * pull;
            chunk[1] += dy * pull;
            chunk[2] += dz * pull;
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
