//! Top-level orchestrator and run loop.
//!
//! `BouquetState` owns the precomputed formation clouds, the particle
//! engine and the gesture debouncer.  Each render tick it drains the
//! tracker's frames, resolves the attractor (fingertip first, pointer
//! as fallback), advances the particles, and hands the renderer a
//! position slice plus a small bundle of render parameters.
//!
//! Formation switching is deliberately conservative: the stable label
//! has to differ from the last one processed, map to a formation, and
//! that formation has to differ from the active one.  Everything else
//! is a no-op, so repeated or unknown gestures can never restart a
//! morph in progress.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::time::Instant;

use bloom_field::{FormationId, FormationSet, GlyphContext, TransitionEngine};
use bloom_gesture::{GestureDebouncer, GestureLabel};

use crate::tracker::{HandFrame, SimInput, Tracker};
use crate::visualizer::Visualizer;

/// Extent of the render-space square the normalized detector frame
/// maps onto.
pub const WORLD_SPAN: f32 = 8.0;

/// Idle spin applied every frame on top of any drag input.
const AUTO_ROTATE: f32 = 0.0025;

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Startup configuration for the bouquet.
pub struct AppConfig {
    pub particle_count: usize,
    /// Explicit font path; `None` searches a few common locations.
    pub font_path: Option<PathBuf>,
    pub love_text: String,
    pub ily_text: String,
    /// Base point size handed to the renderer.
    pub point_size: f32,
    /// Device pixel-density scalar handed to the renderer.
    pub pixel_ratio: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            particle_count: 5000,
            font_path: None,
            love_text: "LOVE".to_string(),
            ily_text: "I LOVE U".to_string(),
            point_size: 2.0,
            pixel_ratio: 1.0,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// RenderParams — the per-frame uniform bundle
// ════════════════════════════════════════════════════════════════════════════

/// Everything the renderer needs besides the positions themselves.
#[derive(Clone, Copy, Debug)]
pub struct RenderParams {
    pub elapsed: f32,
    pub point_size: f32,
    pub pixel_ratio: f32,
    pub rotation: f32,
}

// ════════════════════════════════════════════════════════════════════════════
// Gesture → formation map
// ════════════════════════════════════════════════════════════════════════════

/// The fixed gesture vocabulary mapping.  `Open` returns to the idle
/// bouquet, so every gesture stays meaningful.
pub fn formation_for(label: GestureLabel) -> Option<FormationId> {
    match label {
        GestureLabel::IndexUp => Some(FormationId::Love),
        GestureLabel::Peace => Some(FormationId::Heart),
        GestureLabel::Rock => Some(FormationId::Planet),
        GestureLabel::Ily => Some(FormationId::Ily),
        GestureLabel::Open => Some(FormationId::Bloom),
        GestureLabel::Fist => Some(FormationId::Cluster),
        GestureLabel::None => None,
    }
}

/// Map a normalized fingertip into render space.
///
/// x is mirrored so the bouquet tracks the hand like a mirror would;
/// y flips because detector coordinates grow downward.  Detector depth
/// is too noisy to be worth keeping, so the attractor lives on the
/// z = 0 plane.
pub fn fingertip_to_world(tip: [f32; 3]) -> [f32; 3] {
    [(0.5 - tip[0]) * WORLD_SPAN, (0.5 - tip[1]) * WORLD_SPAN, 0.0]
}

// ════════════════════════════════════════════════════════════════════════════
// BouquetState
// ════════════════════════════════════════════════════════════════════════════

pub struct BouquetState {
    formations: FormationSet,
    engine: TransitionEngine,
    debouncer: GestureDebouncer,

    active: FormationId,
    last_processed: GestureLabel,

    // ── attractor inputs ─────────────────────────────────────────────────
    fingertip: Option<[f32; 3]>,
    pointer: Option<[f32; 3]>,
    tracking_active: bool,

    // ── render parameters ────────────────────────────────────────────────
    rotation: f32,
    started: Instant,
    point_size: f32,
    pixel_ratio: f32,

    // ── status text ──────────────────────────────────────────────────────
    pub headline: String,
    pub status: String,
}

impl BouquetState {
    /// Precompute every formation cloud and aim the engine at the idle
    /// bouquet.  All clouds exist before the first frame; text clouds
    /// are absent only when no glyph context was available.
    pub fn new(cfg: &AppConfig, glyphs: Option<&GlyphContext>) -> BouquetState {
        let formations =
            FormationSet::build(cfg.particle_count, glyphs, &cfg.love_text, &cfg.ily_text);
        let mut engine = TransitionEngine::new(cfg.particle_count);
        let active = FormationId::Bloom;
        if let Some(cloud) = formations.get(active) {
            engine.set_target(active, cloud);
        }

        BouquetState {
            formations,
            engine,
            debouncer: GestureDebouncer::new(),
            active,
            last_processed: GestureLabel::None,
            fingertip: None,
            pointer: None,
            tracking_active: false,
            rotation: 0.0,
            started: Instant::now(),
            point_size: cfg.point_size,
            pixel_ratio: cfg.pixel_ratio,
            headline: active.title().to_string(),
            status: "Ready - C starts hand tracking, B cycles formations".to_string(),
        }
    }

    // ── tracker frames ───────────────────────────────────────────────────

    /// Feed the detection frames drained this tick, oldest first.
    ///
    /// Each frame passes through the debouncer exactly once, so one raw
    /// detection can never trigger two switches.  Frames arriving after
    /// the session stopped are discarded.
    pub fn handle_frames(&mut self, frames: &[HandFrame]) {
        if !self.tracking_active {
            return;
        }
        for frame in frames {
            if frame.hand_seen {
                self.fingertip = frame.fingertip.map(fingertip_to_world);
                self.debouncer.observe(frame.raw);
            } else {
                // Dropout: lose the attractor now, keep the gesture.
                self.fingertip = None;
            }
        }

        let stable = self.debouncer.stable();
        if stable != self.last_processed {
            self.last_processed = stable;
            if let Some(id) = formation_for(stable) {
                if self.request_formation(id) {
                    self.status = format!("{} -> {}", stable.name(), id.title());
                }
            }
        }
    }

    // ── formation switching ──────────────────────────────────────────────

    /// Switch the engine target.  Returns true when a switch actually
    /// happened; unknown or unavailable formations and the currently
    /// active one are no-ops.
    pub fn request_formation(&mut self, id: FormationId) -> bool {
        if id == self.active {
            return false;
        }
        let cloud = match self.formations.get(id) {
            Some(c) => c,
            None => {
                self.status = format!("{} needs a font - text formations disabled", id.title());
                return false;
            }
        };
        self.engine.set_target(id, cloud);
        self.active = id;
        self.headline = id.title().to_string();
        true
    }

    /// Advance to the next available formation in enumeration order.
    pub fn cycle_formation(&mut self) {
        let mut id = self.active.next();
        for _ in 0..FormationId::ALL.len() {
            if self.formations.contains(id) && self.request_formation(id) {
                self.status = format!("cycled to {}", id.title());
                return;
            }
            id = id.next();
        }
    }

    // ── session + pointer ────────────────────────────────────────────────

    pub fn set_tracking(&mut self, active: bool) {
        self.tracking_active = active;
        if active {
            self.status = "hand tracking on - hold a pose for 3 frames".to_string();
        } else {
            self.fingertip = None;
            self.status = "hand tracking off".to_string();
        }
    }

    pub fn tracking_active(&self) -> bool {
        self.tracking_active
    }

    pub fn set_pointer(&mut self, pointer: Option<[f32; 3]>) {
        if pointer.is_some() {
            self.pointer = pointer;
        }
    }

    // ── per-frame tick ───────────────────────────────────────────────────

    /// One render tick: resolve the attractor, advance every particle,
    /// accumulate rotation.
    pub fn tick(&mut self, rotation_delta: f32) {
        let attractor = self.attractor();
        self.engine.advance(attractor);
        self.rotation += AUTO_ROTATE + rotation_delta;
    }

    /// Fingertip when a session is live and a hand is visible, else the
    /// last known pointer, else nothing.
    pub fn attractor(&self) -> Option<[f32; 3]> {
        if self.tracking_active {
            self.fingertip.or(self.pointer)
        } else {
            self.pointer
        }
    }

    // ── render access ────────────────────────────────────────────────────

    pub fn positions(&self) -> &[f32] {
        self.engine.positions()
    }

    pub fn render_params(&self) -> RenderParams {
        RenderParams {
            elapsed: self.started.elapsed().as_secs_f32(),
            point_size: self.point_size,
            pixel_ratio: self.pixel_ratio,
            rotation: self.rotation,
        }
    }

    pub fn active_formation(&self) -> FormationId {
        self.active
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Font loading — candidate search with a helpful fallback
// ════════════════════════════════════════════════════════════════════════════

/// Common system font locations tried when no `--font` was given.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Try the explicit path, then the candidate list.  A bouquet without
/// a font still runs; it just has no text formations, and this is the
/// one place that says so.
pub fn load_glyph_context(path: Option<&Path>) -> Option<GlyphContext> {
    let candidates: Vec<PathBuf> = match path {
        Some(p) => vec![p.to_path_buf()],
        None => FONT_CANDIDATES.iter().map(PathBuf::from).collect(),
    };

    for candidate in &candidates {
        match GlyphContext::load(candidate) {
            Ok(ctx) => {
                eprintln!("[font] using {}", candidate.display());
                return Some(ctx);
            }
            Err(e) => {
                if candidate.exists() {
                    eprintln!("[font] {}: {}", candidate.display(), e);
                }
            }
        }
    }

    eprintln!("[font] no usable font found — text formations disabled.");
    eprintln!("[font] pass --font <path-to-ttf>, for example:");
    eprintln!("       • Linux:   /usr/share/fonts/truetype/dejavu/DejaVuSans.ttf");
    eprintln!("       • macOS:   /System/Library/Fonts/Supplemental/Arial.ttf");
    eprintln!("       • Windows: C:\\Windows\\Fonts\\arial.ttf");
    None
}

// ════════════════════════════════════════════════════════════════════════════
// Tracking session startup
// ════════════════════════════════════════════════════════════════════════════

/// Start a tracking session.  In simulation mode the returned sender
/// feeds keyboard poses into the source; hardware mode needs none.
#[cfg(not(feature = "leap"))]
fn start_tracking() -> Result<(Tracker, Option<Sender<SimInput>>), crate::tracker::TrackerError> {
    use crate::tracker::SimLandmarkSource;
    let (tx, rx) = mpsc::channel();
    Ok((Tracker::spawn(SimLandmarkSource::new(rx)), Some(tx)))
}

#[cfg(feature = "leap")]
fn start_tracking() -> Result<(Tracker, Option<Sender<SimInput>>), crate::tracker::TrackerError> {
    use crate::tracker::{DetectorConfig, LeapLandmarkSource};
    let source = LeapLandmarkSource::connect(DetectorConfig::default())?;
    Ok((Tracker::spawn(source), None))
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.  Creates the window, precomputes the
/// formations, and drives the event/render loop at ~60 fps.
pub fn run(cfg: AppConfig) -> Result<(), String> {
    let glyphs = load_glyph_context(cfg.font_path.as_deref());
    let mut app = BouquetState::new(&cfg, glyphs.as_ref());
    let mut vis = Visualizer::new()?;

    let mut tracker: Option<Tracker> = None;
    let mut sim_tx: Option<Sender<SimInput>> = None;

    while vis.is_open() {
        // 1. Window input
        let input = vis.poll_input();
        if input.quit {
            break;
        }
        if input.cycle {
            app.cycle_formation();
        }
        if input.toggle_tracking {
            match tracker.take() {
                Some(t) => {
                    t.stop();
                    sim_tx = None;
                    app.set_tracking(false);
                }
                None => match start_tracking() {
                    Ok((t, tx)) => {
                        tracker = Some(t);
                        sim_tx = tx;
                        app.set_tracking(true);
                    }
                    Err(e) => {
                        eprintln!("[tracker] {}", e);
                        app.status = format!("tracking unavailable: {}", e);
                    }
                },
            }
        }
        if let (Some(tx), Some(sim)) = (&sim_tx, input.sim) {
            let _ = tx.send(sim);
        }
        app.set_pointer(input.pointer.map(|(x, y)| vis.pointer_to_world(x, y)));

        // 2. Latest detection results (never blocks on inference)
        if let Some(t) = &tracker {
            app.handle_frames(&t.drain());
        }

        // 3. Advance particles
        app.tick(input.drag_delta);

        // 4. Render
        vis.render(
            app.positions(),
            &app.render_params(),
            &app.headline,
            &app.status,
            tracker.is_some(),
        );
    }

    if let Some(t) = tracker.take() {
        t.stop();
    }
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::analyze;
    use crate::tracker::{pose_landmarks, SimPose};

    fn frame(pose: SimPose) -> HandFrame {
        analyze(Some(&pose_landmarks(pose)))
    }

    fn no_hand() -> HandFrame {
        analyze(None)
    }

    fn make_app() -> BouquetState {
        let cfg = AppConfig {
            particle_count: 200,
            ..AppConfig::default()
        };
        let mut app = BouquetState::new(&cfg, None);
        app.set_tracking(true);
        app
    }

    #[test]
    fn starts_on_the_idle_bloom() {
        let app = make_app();
        assert_eq!(app.active_formation(), FormationId::Bloom);
        assert_eq!(app.positions().len(), 200 * 3);
    }

    #[test]
    fn gesture_map_covers_every_label() {
        assert_eq!(formation_for(GestureLabel::IndexUp), Some(FormationId::Love));
        assert_eq!(formation_for(GestureLabel::Peace), Some(FormationId::Heart));
        assert_eq!(formation_for(GestureLabel::Rock), Some(FormationId::Planet));
        assert_eq!(formation_for(GestureLabel::Ily), Some(FormationId::Ily));
        assert_eq!(formation_for(GestureLabel::Open), Some(FormationId::Bloom));
        assert_eq!(formation_for(GestureLabel::Fist), Some(FormationId::Cluster));
        assert_eq!(formation_for(GestureLabel::None), None);
    }

    #[test]
    fn switch_happens_on_the_third_frame() {
        let mut app = make_app();
        app.handle_frames(&[frame(SimPose::Peace)]);
        assert_eq!(app.active_formation(), FormationId::Bloom);
        app.handle_frames(&[frame(SimPose::Peace)]);
        assert_eq!(app.active_formation(), FormationId::Bloom);
        app.handle_frames(&[frame(SimPose::Peace)]);
        assert_eq!(app.active_formation(), FormationId::Heart);
    }

    #[test]
    fn one_drain_cannot_switch_twice() {
        let mut app = make_app();
        // Six peace frames then three fist frames in one batch: both
        // gestures became stable at some point, but only the latest
        // stable label is acted on once.
        let mut frames = vec![frame(SimPose::Peace); 6];
        frames.extend(vec![frame(SimPose::Fist); 3]);
        app.handle_frames(&frames);
        assert_eq!(app.active_formation(), FormationId::Cluster);
    }

    #[test]
    fn dropout_keeps_formation_but_clears_fingertip() {
        let mut app = make_app();
        app.handle_frames(&[frame(SimPose::Peace); 3]);
        assert_eq!(app.active_formation(), FormationId::Heart);
        assert!(app.attractor().is_some());

        app.handle_frames(&[no_hand()]);
        assert_eq!(app.active_formation(), FormationId::Heart);
        assert!(app.attractor().is_none());
    }

    #[test]
    fn repeated_stable_label_is_processed_once() {
        let mut app = make_app();
        app.handle_frames(&[frame(SimPose::Rock); 3]);
        assert_eq!(app.active_formation(), FormationId::Planet);
        // Continuing the same gesture must not re-request the target.
        app.handle_frames(&[frame(SimPose::Rock); 30]);
        assert_eq!(app.active_formation(), FormationId::Planet);
    }

    #[test]
    fn text_formation_without_font_is_a_no_op() {
        let mut app = make_app();
        app.handle_frames(&[frame(SimPose::Ily); 3]);
        // No glyph context in tests, so Ily maps to an absent cloud.
        assert_eq!(app.active_formation(), FormationId::Bloom);
    }

    #[test]
    fn open_returns_to_the_bloom() {
        let mut app = make_app();
        app.handle_frames(&[frame(SimPose::Fist); 3]);
        assert_eq!(app.active_formation(), FormationId::Cluster);
        app.handle_frames(&[frame(SimPose::Open); 3]);
        assert_eq!(app.active_formation(), FormationId::Bloom);
    }

    #[test]
    fn cycle_skips_unavailable_text() {
        let mut app = make_app();
        app.cycle_formation();
        assert_eq!(app.active_formation(), FormationId::Heart);
        app.cycle_formation();
        assert_eq!(app.active_formation(), FormationId::Planet);
        app.cycle_formation();
        assert_eq!(app.active_formation(), FormationId::Cluster);
        // Love and Ily have no clouds without a font; straight to Bloom.
        app.cycle_formation();
        assert_eq!(app.active_formation(), FormationId::Bloom);
    }

    #[test]
    fn fingertip_conversion_mirrors_and_flips() {
        let w = fingertip_to_world([0.0, 0.0, 0.0]);
        assert_eq!(w, [WORLD_SPAN / 2.0, WORLD_SPAN / 2.0, 0.0]);
        let c = fingertip_to_world([0.5, 0.5, 0.2]);
        assert_eq!(c, [0.0, 0.0, 0.0]);
        let r = fingertip_to_world([1.0, 1.0, 0.0]);
        assert_eq!(r, [-WORLD_SPAN / 2.0, -WORLD_SPAN / 2.0, 0.0]);
    }

    #[test]
    fn fingertip_wins_over_pointer() {
        let mut app = make_app();
        app.set_pointer(Some([1.0, 0.0, 0.0]));
        app.handle_frames(&[frame(SimPose::IndexUp)]);
        let tip = app.attractor().unwrap();
        assert_ne!(tip, [1.0, 0.0, 0.0]);

        // Hand gone: back to the pointer.
        app.handle_frames(&[no_hand()]);
        assert_eq!(app.attractor(), Some([1.0, 0.0, 0.0]));
    }

    #[test]
    fn pointer_is_the_fallback_when_tracking_is_off() {
        let mut app = make_app();
        app.set_tracking(false);
        assert!(app.attractor().is_none());
        app.set_pointer(Some([0.5, 0.5, 0.0]));
        assert_eq!(app.attractor(), Some([0.5, 0.5, 0.0]));
    }

    #[test]
    fn frames_after_stop_are_discarded() {
        let mut app = make_app();
        app.set_tracking(false);
        app.handle_frames(&[frame(SimPose::Peace); 10]);
        assert_eq!(app.active_formation(), FormationId::Bloom);
    }

    #[test]
    fn tick_converges_toward_active_cloud() {
        let mut app = make_app();
        let target = app.formations.get(FormationId::Bloom).unwrap();
        for _ in 0..300 {
            app.tick(0.0);
        }
        let pos = app.positions();
        let goal = target.as_slice();
        for i in 0..pos.len() {
            assert!((pos[i] - goal[i]).abs() < 1e-2, "index {} off", i);
        }
    }

    #[test]
    fn rotation_accumulates() {
        let mut app = make_app();
        let r0 = app.render_params().rotation;
        app.tick(0.1);
        let r1 = app.render_params().rotation;
        assert!((r1 - r0 - 0.1 - 0.0025).abs() < 1e-6);
    }
}
