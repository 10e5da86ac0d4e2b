//! Software-rendered bouquet window using `minifb`.
//!
//! The core hands over a flat position buffer plus render parameters;
//! this module owns everything screen-shaped: the perspective
//! projection, the petal palette, pointer/drag capture, and the
//! status/legend text.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  HEADLINE (active formation)                 │
//! │                                              │
//! │              ·  ··· particle cloud ···  ·    │
//! │                                              │
//! │  status line                                 │
//! │  key legend                                  │
//! └──────────────────────────────────────────────┘
//! ```

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use crate::app::{RenderParams, WORLD_SPAN};
use crate::tracker::{SimInput, SimPose};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W: usize = 960;
pub const WIN_H: usize = 720;

const BG_COLOR: u32 = 0xFF0B0B18;
const TEXT_COLOR: u32 = 0xFFEDE7F6;
const LEGEND_COLOR: u32 = 0xFF7A7A99;
const TRACKING_COLOR: u32 = 0xFF7FE3A0;

const HEADLINE_Y: usize = 18;
const STATUS_Y: usize = WIN_H - 42;
const LEGEND_Y: usize = WIN_H - 18;

/// Virtual camera distance from the origin; particles live in roughly
/// a ±6 unit ball, so depth stays positive.
const CAM_DIST: f32 = 12.0;
const FOCAL: f32 = 620.0;

/// Pixels of mouse travel per radian of rotation.
const DRAG_RATE: f32 = 0.008;

// ════════════════════════════════════════════════════════════════════════════
// InputState — one frame of window input
// ════════════════════════════════════════════════════════════════════════════

/// Everything the run loop needs from one input poll.
#[derive(Default)]
pub struct InputState {
    pub quit: bool,
    pub cycle: bool,
    pub toggle_tracking: bool,
    /// Simulated pose change to forward to the detection thread.
    pub sim: Option<SimInput>,
    /// Current mouse position in window pixels.
    pub pointer: Option<(f32, f32)>,
    /// Rotation delta from dragging, radians.
    pub drag_delta: f32,
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    buf: Vec<u32>,
    last_mouse: Option<(f32, f32)>,
}

impl Visualizer {
    pub fn new() -> Result<Self, String> {
        let mut window = Window::new(
            "cam_bloom — gesture bouquet",
            WIN_W,
            WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| e.to_string())?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            last_mouse: None,
        })
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// Poll keyboard and mouse, translating to an [`InputState`].
    pub fn poll_input(&mut self) -> InputState {
        let mut input = InputState::default();
        if !self.window.is_open() {
            input.quit = true;
            return input;
        }

        let one_shot = |w: &Window, k: Key| w.is_key_pressed(k, KeyRepeat::No);

        if one_shot(&self.window, Key::Q) {
            input.quit = true;
            return input;
        }
        input.cycle = one_shot(&self.window, Key::B);
        input.toggle_tracking = one_shot(&self.window, Key::C);

        let poses = [
            (Key::Key1, SimPose::IndexUp),
            (Key::Key2, SimPose::Peace),
            (Key::Key3, SimPose::Rock),
            (Key::Key4, SimPose::Ily),
            (Key::Key5, SimPose::Open),
            (Key::Key6, SimPose::Fist),
        ];
        for (key, pose) in poses {
            if one_shot(&self.window, key) {
                input.sim = Some(SimInput::Pose(pose));
            }
        }
        if one_shot(&self.window, Key::Key0) {
            input.sim = Some(SimInput::HandGone);
        }

        input.pointer = self.window.get_mouse_pos(MouseMode::Discard);
        if self.window.get_mouse_down(MouseButton::Left) {
            if let (Some(last), Some(now)) = (self.last_mouse, input.pointer) {
                input.drag_delta = (now.0 - last.0) * DRAG_RATE;
            }
        }
        self.last_mouse = input.pointer;

        input
    }

    /// Map a window-pixel pointer position onto the z = 0 world plane.
    pub fn pointer_to_world(&self, x: f32, y: f32) -> [f32; 3] {
        let aspect = WIN_H as f32 / WIN_W as f32;
        [
            (x / WIN_W as f32 - 0.5) * WORLD_SPAN,
            (0.5 - y / WIN_H as f32) * WORLD_SPAN * aspect,
            0.0,
        ]
    }

    // ── Render ────────────────────────────────────────────────────────────

    pub fn render(
        &mut self,
        positions: &[f32],
        params: &RenderParams,
        headline: &str,
        status: &str,
        tracking: bool,
    ) {
        self.buf.fill(BG_COLOR);

        let count = positions.len() / 3;
        // Slow shimmer so the cloud never looks frozen mid-formation.
        let pulse = 0.9 + 0.1 * (params.elapsed * 2.0).sin();

        for i in 0..count {
            let x = positions[i * 3];
            let y = positions[i * 3 + 1];
            let z = positions[i * 3 + 2];
            let (sx, sy, depth) = match project(x, y, z, params.rotation) {
                Some(p) => p,
                None => continue,
            };

            let shade = (1.0 - (depth - CAM_DIST + 6.0) / 12.0).clamp(0.0, 1.0);
            let value = (0.35 + 0.6 * shade) * pulse;
            let hue = 300.0 + 50.0 * (i as f32 / count.max(1) as f32);
            let color = hsv_to_argb(hue, 0.55, value);

            let size = ((params.point_size * params.pixel_ratio * 10.0 / depth) as i32).clamp(1, 4);
            self.splat(sx, sy, size, color);
        }

        self.draw_label(headline, 12, HEADLINE_Y, 3, TEXT_COLOR);
        self.draw_label(status, 12, STATUS_Y, 1, TEXT_COLOR);
        self.draw_label(
            "B=CYCLE  C=TRACKING  1-6=POSE  0=HAND GONE  DRAG=ROTATE  Q=QUIT",
            12,
            LEGEND_Y,
            1,
            LEGEND_COLOR,
        );
        if tracking {
            self.draw_label("TRACKING", WIN_W - 80, HEADLINE_Y, 1, TRACKING_COLOR);
        }

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn splat(&mut self, cx: i32, cy: i32, size: i32, color: u32) {
        let half = size / 2;
        for dy in -half..=half {
            for dx in -half..=half {
                let x = cx + dx;
                let y = cy + dy;
                if x >= 0 && y >= 0 && (x as usize) < WIN_W && (y as usize) < WIN_H {
                    self.buf[y as usize * WIN_W + x as usize] = color;
                }
            }
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < WIN_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    /// Draw text with the packed 3x5 bitmap font, `scale` pixels per
    /// font pixel.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let bits = glyph_bits(ch);
            for row in 0..5 {
                for col in 0..3 {
                    if bits >> (14 - (row * 3 + col)) & 1 != 0 {
                        for py in 0..scale {
                            for px in 0..scale {
                                self.set_pixel(cx + col * scale + px, y + row * scale + py, color);
                            }
                        }
                    }
                }
            }
            cx += 4 * scale;
            if cx + 4 * scale > WIN_W {
                break;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Projection
// ════════════════════════════════════════════════════════════════════════════

/// Rotate around the y axis, then project perspectively.
///
/// Returns screen coordinates and the camera-space depth, or `None`
/// for points behind the near plane.
pub fn project(x: f32, y: f32, z: f32, rotation: f32) -> Option<(i32, i32, f32)> {
    let (s, c) = rotation.sin_cos();
    let xr = x * c - z * s;
    let zr = x * s + z * c;
    let depth = CAM_DIST - zr;
    if depth <= 0.5 {
        return None;
    }
    let f = FOCAL / depth;
    let sx = WIN_W as f32 / 2.0 + xr * f;
    let sy = WIN_H as f32 / 2.0 - y * f;
    if sx < -8.0 || sy < -8.0 || sx > WIN_W as f32 + 8.0 || sy > WIN_H as f32 + 8.0 {
        return None;
    }
    Some((sx as i32, sy as i32, depth))
}

// ════════════════════════════════════════════════════════════════════════════
// Petal palette
// ════════════════════════════════════════════════════════════════════════════

/// Convert HSV to packed ARGB (0xAARRGGBB, A = 0xFF).
pub fn hsv_to_argb(h: f32, s: f32, v: f32) -> u32 {
    let h = h.rem_euclid(360.0);
    let hi = (h / 60.0) as u32;
    let f = h / 60.0 - hi as f32;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match hi {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    let ri = (r.clamp(0.0, 1.0) * 255.0) as u32;
    let gi = (g.clamp(0.0, 1.0) * 255.0) as u32;
    let bi = (b.clamp(0.0, 1.0) * 255.0) as u32;
    0xFF000000 | (ri << 16) | (gi << 8) | bi
}

// ════════════════════════════════════════════════════════════════════════════
// Packed 3x5 bitmap font
// ════════════════════════════════════════════════════════════════════════════

/// 15 bits per glyph: five rows of three pixels, top row in the high
/// bits.  Unknown characters fall back to a centered dot.
fn glyph_bits(c: char) -> u16 {
    match c.to_ascii_uppercase() {
        '0' => 0b111_101_101_101_111,
        '1' => 0b010_110_010_010_111,
        '2' => 0b111_001_111_100_111,
        '3' => 0b111_001_111_001_111,
        '4' => 0b101_101_111_001_001,
        '5' => 0b111_100_111_001_111,
        '6' => 0b111_100_111_101_111,
        '7' => 0b111_001_001_001_001,
        '8' => 0b111_101_111_101_111,
        '9' => 0b111_101_111_001_111,
        'A' => 0b111_101_111_101_101,
        'B' => 0b110_101_110_101_110,
        'C' => 0b111_100_100_100_111,
        'D' => 0b110_101_101_101_110,
        'E' => 0b111_100_111_100_111,
        'F' => 0b111_100_111_100_100,
        'G' => 0b111_100_101_101_111,
        'H' => 0b101_101_111_101_101,
        'I' => 0b111_010_010_010_111,
        'J' => 0b001_001_001_101_111,
        'K' => 0b101_101_110_101_101,
        'L' => 0b100_100_100_100_111,
        'M' => 0b101_111_101_101_101,
        'N' => 0b111_101_101_101_101,
        'O' => 0b111_101_101_101_111,
        'P' => 0b111_101_111_100_100,
        'Q' => 0b111_101_101_111_001,
        'R' => 0b110_101_110_101_101,
        'S' => 0b111_100_111_001_111,
        'T' => 0b111_010_010_010_010,
        'U' => 0b101_101_101_101_111,
        'V' => 0b101_101_101_010_010,
        'W' => 0b101_101_101_111_101,
        'X' => 0b101_101_010_101_101,
        'Y' => 0b101_101_111_010_010,
        'Z' => 0b111_001_010_100_111,
        ' ' => 0b000_000_000_000_000,
        '-' => 0b000_000_111_000_000,
        '.' => 0b000_000_000_000_010,
        ',' => 0b000_000_000_010_100,
        ':' => 0b000_010_000_010_000,
        '/' => 0b001_001_010_100_100,
        '=' => 0b000_111_000_111_000,
        '+' => 0b000_010_111_010_000,
        '>' => 0b100_010_001_010_100,
        '<' => 0b001_010_100_010_001,
        '(' => 0b001_010_010_010_001,
        ')' => 0b100_010_010_010_100,
        _ => 0b000_000_010_000_000,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_projects_to_window_center() {
        let (sx, sy, depth) = project(0.0, 0.0, 0.0, 0.0).unwrap();
        assert_eq!(sx, WIN_W as i32 / 2);
        assert_eq!(sy, WIN_H as i32 / 2);
        assert!((depth - CAM_DIST).abs() < 1e-6);
    }

    #[test]
    fn rotation_swings_x_into_depth() {
        // A quarter turn moves a +x point onto the z axis.
        let (_, _, depth) = project(3.0, 0.0, 0.0, std::f32::consts::FRAC_PI_2).unwrap();
        assert!((depth - (CAM_DIST - 3.0)).abs() < 1e-4);
    }

    #[test]
    fn near_plane_culls() {
        assert!(project(0.0, 0.0, CAM_DIST, 0.0).is_none());
    }

    #[test]
    fn higher_world_y_is_higher_on_screen() {
        let (_, top, _) = project(0.0, 2.0, 0.0, 0.0).unwrap();
        let (_, bottom, _) = project(0.0, -2.0, 0.0, 0.0).unwrap();
        assert!(top < bottom);
    }

    #[test]
    fn palette_is_opaque() {
        for d in 0..12 {
            let c = hsv_to_argb(d as f32 * 30.0, 0.6, 0.9);
            assert_eq!(c >> 24, 0xFF);
        }
    }

    #[test]
    fn palette_hues_differ() {
        assert_ne!(hsv_to_argb(300.0, 0.55, 0.9), hsv_to_argb(350.0, 0.55, 0.9));
    }

    #[test]
    fn known_glyphs_are_nonempty() {
        for ch in "ABCXYZ019".chars() {
            assert_ne!(glyph_bits(ch), 0, "empty glyph for {}", ch);
        }
        assert_eq!(glyph_bits(' '), 0);
    }

    #[test]
    fn lowercase_shares_uppercase_glyphs() {
        assert_eq!(glyph_bits('a'), glyph_bits('A'));
        assert_eq!(glyph_bits('q'), glyph_bits('Q'));
    }
}
