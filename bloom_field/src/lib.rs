//! # bloom_field
//!
//! The particle side of the digital bouquet: target shapes and the
//! engine that morphs a live point cloud between them.
//!
//! * [`cloud`] — the flat `PointCloud` buffer and its cyclic
//!   wrap-to-count policy.
//! * [`formation`] — the six named formations and their generators
//!   (sphere scatter, parametric heart, planet body + ring, compact
//!   cluster, sampled text glyphs), precomputed once into a
//!   [`formation::FormationSet`].
//! * [`glyph`] — triangle-soup glyph meshes and area-weighted surface
//!   sampling; font loading lives behind this seam so everything else
//!   works without a font.
//! * [`engine`] — [`engine::TransitionEngine`]: per-frame blending of
//!   every particle toward its target plus the fingertip/pointer
//!   attraction force.
//!
//! The blending is an artistic approximation, not a physics
//! simulation: positions decay exponentially toward their targets and
//! there is no velocity state anywhere.

pub mod cloud;
pub mod formation;
pub mod glyph;
pub mod engine;

pub use cloud::PointCloud;
pub use engine::TransitionEngine;
pub use formation::{FormationId, FormationSet};
pub use glyph::{FontError, GlyphContext, GlyphMesh};
