//! Hand-tracking sources and the background detection task.
//!
//! A [`LandmarkSource`] runs on its own thread at detector cadence and
//! pushes one analyzed [`HandFrame`] per frame over an `mpsc` channel.
//! The render loop drains the channel non-blockingly; inference
//! latency can therefore never stall a render tick, it only means the
//! previous observation is reused.
//!
//! Stopping is synchronous: [`Tracker::stop`] flips a shared flag and
//! joins the thread, which releases its device on the way out.  Frames
//! still queued after the stop are drained and discarded by the
//! orchestrator, so a late detection can never touch torn-down state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bloom_gesture::landmark::{
    Landmark, INDEX_PIP, INDEX_TIP, MIDDLE_PIP, MIDDLE_TIP, PINKY_PIP, PINKY_TIP, RING_PIP,
    RING_TIP, THUMB_CMC, THUMB_IP, THUMB_MCP, THUMB_TIP, WRIST,
};
use bloom_gesture::{classify, GestureLabel, LandmarkSet};

/// Simulated detector cadence, roughly webcam rate.
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

// ════════════════════════════════════════════════════════════════════════════
// DetectorConfig
// ════════════════════════════════════════════════════════════════════════════

/// Detector tuning knobs.  Fixed constants, never user-exposed.
#[derive(Clone, Copy, Debug)]
pub struct DetectorConfig {
    pub detection_confidence: f32,
    pub tracking_confidence: f32,
    pub model_complexity: u8,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            detection_confidence: 0.7,
            tracking_confidence: 0.7,
            model_complexity: 1,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TrackerError
// ════════════════════════════════════════════════════════════════════════════

/// Failure to start a tracking session.  Recoverable: tracking simply
/// stays off and the status line says why.
#[derive(Debug)]
pub enum TrackerError {
    DeviceAccess(String),
}

impl std::fmt::Display for TrackerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackerError::DeviceAccess(e) => write!(f, "device access failed: {}", e),
        }
    }
}

impl std::error::Error for TrackerError {}

// ════════════════════════════════════════════════════════════════════════════
// HandFrame — one analyzed detection frame
// ════════════════════════════════════════════════════════════════════════════

/// The per-frame handoff from the detection thread to the render loop.
#[derive(Clone, Copy, Debug)]
pub struct HandFrame {
    /// Raw classifier output for this frame (pre-debounce).
    pub raw: GestureLabel,
    /// Index fingertip in normalized detector coordinates.
    pub fingertip: Option<[f32; 3]>,
    /// False when the detector reported zero hands.
    pub hand_seen: bool,
}

/// Classify one detection result into a [`HandFrame`].
pub fn analyze(hand: Option<&LandmarkSet>) -> HandFrame {
    match hand {
        Some(set) => {
            let tip = set.index_tip();
            HandFrame {
                raw: classify(set),
                fingertip: Some([tip.x, tip.y, tip.z]),
                hand_seen: true,
            }
        }
        None => HandFrame {
            raw: GestureLabel::None,
            fingertip: None,
            hand_seen: false,
        },
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSource trait + Tracker handle
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`HandFrame`]s over a channel until told
/// to stop.
pub trait LandmarkSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<HandFrame>, running: Arc<AtomicBool>);
}

/// Handle to a running detection thread.
pub struct Tracker {
    rx: Receiver<HandFrame>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Tracker {
    /// Spawn a source on its own thread.
    pub fn spawn<S: LandmarkSource>(source: S) -> Tracker {
        let (tx, rx) = mpsc::channel();
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let handle = thread::spawn(move || Box::new(source).run(tx, flag));
        Tracker {
            rx,
            running,
            handle: Some(handle),
        }
    }

    /// Drain every frame produced since the last call (non-blocking).
    pub fn drain(&self) -> Vec<HandFrame> {
        let mut out = Vec::new();
        while let Ok(f) = self.rx.try_recv() {
            out.push(f);
        }
        out
    }

    /// Stop the detection loop and wait for the thread to exit.
    pub fn stop(mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimLandmarkSource — keyboard poses, always available
// ════════════════════════════════════════════════════════════════════════════

/// A pose the simulator can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimPose {
    IndexUp,
    Peace,
    Rock,
    Ily,
    Open,
    Fist,
}

/// Raw input events from the window, forwarded into the simulator.
#[derive(Clone, Copy, Debug)]
pub enum SimInput {
    /// Hold this pose until further notice.
    Pose(SimPose),
    /// The simulated hand left the frame.
    HandGone,
}

/// Simulated detector: synthesizes a landmark set for the held pose at
/// camera cadence, so the real classifier and debouncer run unchanged.
pub struct SimLandmarkSource {
    rx: Receiver<SimInput>,
}

impl SimLandmarkSource {
    pub fn new(rx: Receiver<SimInput>) -> Self {
        SimLandmarkSource { rx }
    }
}

impl LandmarkSource for SimLandmarkSource {
    fn run(self: Box<Self>, tx: Sender<HandFrame>, running: Arc<AtomicBool>) {
        let mut held: Option<SimPose> = None;
        while running.load(Ordering::Relaxed) {
            loop {
                match self.rx.try_recv() {
                    Ok(SimInput::Pose(p)) => held = Some(p),
                    Ok(SimInput::HandGone) => held = None,
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return,
                }
            }
            let set = held.map(pose_landmarks);
            if tx.send(analyze(set.as_ref())).is_err() {
                return;
            }
            thread::sleep(FRAME_INTERVAL);
        }
    }
}

/// Synthesize the landmark set for a simulated pose.
///
/// Geometry is schematic but anatomically ordered: palm around
/// (0.5, 0.6), extended tips above their PIP joints, the thumb driven
/// laterally past the 1.2x spread ratio when extended.
pub fn pose_landmarks(pose: SimPose) -> LandmarkSet {
    let (thumb, index, middle, ring, pinky) = match pose {
        SimPose::IndexUp => (false, true, false, false, false),
        SimPose::Peace => (false, true, true, false, false),
        SimPose::Rock => (false, true, false, false, true),
        SimPose::Ily => (true, true, false, false, true),
        SimPose::Open => (true, true, true, true, true),
        SimPose::Fist => (false, false, false, false, false),
    };

    let mut pts = [Landmark::default(); 21];
    pts[WRIST] = Landmark::new(0.5, 0.8, 0.0);

    pts[THUMB_CMC] = Landmark::new(0.46, 0.7, 0.0);
    pts[THUMB_MCP] = Landmark::new(0.44, 0.64, 0.0);
    pts[THUMB_IP] = Landmark::new(0.40, 0.60, 0.0);
    pts[THUMB_TIP] = if thumb {
        Landmark::new(0.31, 0.56, 0.0)
    } else {
        Landmark::new(0.41, 0.58, 0.0)
    };

    let fingers = [
        (INDEX_PIP, INDEX_TIP, 0.46, index),
        (MIDDLE_PIP, MIDDLE_TIP, 0.50, middle),
        (RING_PIP, RING_TIP, 0.54, ring),
        (PINKY_PIP, PINKY_TIP, 0.58, pinky),
    ];
    for (pip, tip, x, up) in fingers {
        // The two joints between MCP and PIP matter to nothing in the
        // classifier; park them on the palm column.
        pts[pip - 1] = Landmark::new(x, 0.62, 0.0);
        pts[pip] = Landmark::new(x, 0.55, 0.0);
        pts[pip + 1] = Landmark::new(x, if up { 0.45 } else { 0.58 }, 0.0);
        pts[tip] = Landmark::new(x, if up { 0.35 } else { 0.62 }, 0.0);
    }

    LandmarkSet::from_points(&pts).expect("synthetic pose is always 21 points")
}

// ════════════════════════════════════════════════════════════════════════════
// LeapLandmarkSource — real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Hand tracking backed by a LeapMotion controller.
///
/// The connection is opened up front so a missing device surfaces as a
/// [`TrackerError`] before any thread exists; after that the polling
/// loop runs until the stop flag drops and the connection (and with it
/// the device) is released on thread exit.
#[cfg(feature = "leap")]
pub struct LeapLandmarkSource {
    connection: leaprs::Connection,
    #[allow(dead_code)]
    config: DetectorConfig,
}

#[cfg(feature = "leap")]
impl LeapLandmarkSource {
    pub fn connect(config: DetectorConfig) -> Result<Self, TrackerError> {
        use leaprs::*;
        let mut connection = Connection::create(ConnectionConfig::default())
            .map_err(|e| TrackerError::DeviceAccess(format!("{:?}", e)))?;
        connection
            .open()
            .map_err(|e| TrackerError::DeviceAccess(format!("{:?}", e)))?;
        Ok(LeapLandmarkSource { connection, config })
    }
}

#[cfg(feature = "leap")]
impl LandmarkSource for LeapLandmarkSource {
    fn run(mut self: Box<Self>, tx: Sender<HandFrame>, running: Arc<AtomicBool>) {
        use leaprs::*;

        while running.load(Ordering::Relaxed) {
            let msg = match self.connection.poll(100) {
                Ok(m) => m,
                Err(_) => continue, // poll timeout, try again
            };
            if let Event::Tracking(frame) = msg.event() {
                let hands: Vec<_> = frame.hands().collect();
                let set = hands.first().and_then(leap_landmarks);
                if tx.send(analyze(set.as_ref())).is_err() {
                    return;
                }
            }
        }
    }
}

/// Convert a LeapC hand to the normalized 21-landmark convention.
///
/// LeapC reports millimetres with y up; landmarks are [0, 1] with y
/// down, so both axes are rescaled around the device center.
#[cfg(feature = "leap")]
fn leap_landmarks(hand: &leaprs::Hand) -> Option<LandmarkSet> {
    const SPAN_MM: f32 = 400.0;
    let norm = |x: f32, y: f32, z: f32| Landmark::new(0.5 + x / SPAN_MM, 0.5 - y / SPAN_MM, z / SPAN_MM);

    let digits: Vec<_> = hand.digits().collect();
    if digits.len() < 5 {
        return None;
    }

    let mut pts = Vec::with_capacity(21);
    let palm = hand.palm().position();
    pts.push(norm(palm.x, palm.y, palm.z));
    for d in &digits {
        for joint in [
            d.proximal().prev_joint(),
            d.proximal().next_joint(),
            d.intermediate().next_joint(),
            d.distal().next_joint(),
        ] {
            pts.push(norm(joint.x, joint.y, joint.z));
        }
    }
    LandmarkSet::from_points(&pts)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
