//! Software-rendered overlay using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                                              │
//! │        T ●━━━━━━━━━━━━━━━━━● I               │
//! │                  ◆ midpoint                  │
//! │   camera view (frame pixels, scaled)         │
//! │                                              │
//! ├──────────────────────────────────────────────┤
//! │  [■][■][■][ ][ ]   0 ──|───|───|───|───|─▶   │
//! │  status bar                                  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! In simulation mode the thumb is parked at a fixed spot and the index tip
//! follows the mouse while the left button is held.

use std::sync::mpsc::Sender;

use led_protocol::{CommandToken, LedCount, Thresholds};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use crate::landmark::{FrameGeometry, Landmark};
use crate::perception::Observation;
use crate::source::SimInput;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const VIEW_W: usize = 640;
pub const VIEW_H: usize = 480;
const PANEL_H: usize = 96;
pub const WIN_W: usize = VIEW_W;
pub const WIN_H: usize = VIEW_H + PANEL_H;

const CELL: usize = 28;
const CELL_GAP: usize = 6;
const BAR_X: usize = 16;
const BAR_Y: usize = VIEW_H + 12;
const SCALE_X: usize = BAR_X + 5 * (CELL + CELL_GAP) + 24;
const SCALE_W: usize = WIN_W - SCALE_X - 24;
const SCALE_Y: usize = BAR_Y + CELL / 2;
const STATUS_Y: usize = WIN_H - 28;

const BG_COLOR: u32 = 0xFF1A1A2E;
const PANEL_BG: u32 = 0xFF16213E;
const TEXT_BG: u32 = 0xFF0F3460;
const THUMB_COLOR: u32 = 0xFFFF8C42;
const INDEX_COLOR: u32 = 0xFF42C6FF;
const LINE_COLOR: u32 = 0xFFEEEEEE;
const MID_COLOR: u32 = 0xFFFFD700; // gold
const LED_ON: u32 = 0xFFFF3B3B;
const LED_OFF: u32 = 0xFF3A3A4A;

/// Where the simulated thumb sits, as a fraction of the view.
pub const SIM_THUMB: (f32, f32) = (0.3, 0.5);

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    buf: Vec<u32>,
    geometry: FrameGeometry,
    /// Present in simulation mode only.
    sim_tx: Option<Sender<SimInput>>,
}

impl Visualizer {
    pub fn new(geometry: FrameGeometry, sim_tx: Option<Sender<SimInput>>) -> minifb::Result<Self> {
        let mut window = Window::new(
            "Gesture LED — thumb/index distance",
            WIN_W,
            WIN_H,
            WindowOptions { resize: false, ..WindowOptions::default() },
        )?;

        window.set_target_fps(60);

        Ok(Visualizer { window, buf: vec![BG_COLOR; WIN_W * WIN_H], geometry, sim_tx })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// Poll keyboard and mouse. Returns false when the user asked to quit.
    ///
    /// In simulation mode one [`SimInput`] is sent per call.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() {
            return false;
        }

        let quit = self.window.is_key_pressed(Key::Q, KeyRepeat::No)
            || self.window.is_key_pressed(Key::Escape, KeyRepeat::No);

        if let Some(tx) = &self.sim_tx {
            let input = if quit {
                SimInput::Quit
            } else {
                sim_input(
                    self.window.get_mouse_down(MouseButton::Left),
                    self.window.get_mouse_pos(MouseMode::Clamp),
                )
            };
            let _ = tx.send(input);
        }

        !quit
    }

    /// Render one frame.
    pub fn render(
        &mut self,
        observation: &Observation,
        shown: Option<CommandToken>,
        thresholds: &Thresholds,
        status: &str,
    ) {
        self.buf.fill(BG_COLOR);

        // ── Camera view ───────────────────────────────────────────────────
        if let Observation::Measured { pinch, .. } = observation {
            let t = self.to_view(pinch.thumb);
            let i = self.to_view(pinch.index);
            let m = self.to_view(pinch.midpoint);
            self.draw_line(t, i, LINE_COLOR);
            self.draw_disc(t, 7, THUMB_COLOR);
            self.draw_disc(i, 7, INDEX_COLOR);
            self.draw_diamond(m.0, m.1, 5, MID_COLOR);
            self.draw_label("T", t.0.max(0) as usize + 10, t.1.max(0) as usize, THUMB_COLOR);
            self.draw_label("I", i.0.max(0) as usize + 10, i.1.max(0) as usize, INDEX_COLOR);
            let d = format!("{:.0}px", pinch.distance);
            self.draw_label(&d, m.0.max(0) as usize + 10, m.1.max(0) as usize + 6, MID_COLOR);
        } else {
            self.draw_label("no hand", 10, 10, 0xFF888888);
        }

        // ── Panel ─────────────────────────────────────────────────────────
        self.fill_rect(0, VIEW_H, WIN_W, PANEL_H, PANEL_BG);

        let lit = shown.map(|t| t.count()).unwrap_or(LedCount::ZERO);
        self.draw_led_bar(lit);

        let distance = match observation {
            Observation::Measured { pinch, .. } => Some(pinch.distance),
            Observation::NoHand => None,
        };
        self.draw_scale(thresholds, distance);

        // ── Status bar ────────────────────────────────────────────────────
        self.fill_rect(0, STATUS_Y, WIN_W, WIN_H - STATUS_Y, TEXT_BG);
        self.draw_label(status, 10, STATUS_Y + 6, 0xFFEEEEEE);
        self.draw_label("hold mouse = pinch   q/esc = quit", 10, WIN_H - 9, 0xFF888888);

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    /// Frame pixels → view pixels.
    fn to_view(&self, (x, y): (f32, f32)) -> (isize, isize) {
        let sx = VIEW_W as f32 / self.geometry.width.max(1) as f32;
        let sy = VIEW_H as f32 / self.geometry.height.max(1) as f32;
        let clamp = |v: f32, lim: usize| v.clamp(-(lim as f32), 2.0 * lim as f32) as isize;
        (clamp(x * sx, VIEW_W), clamp(y * sy, VIEW_H))
    }

    // ── LED bar ───────────────────────────────────────────────────────────

    fn draw_led_bar(&mut self, lit: LedCount) {
        for k in 0..5 {
            let x = BAR_X + k * (CELL + CELL_GAP);
            let color = if k < lit.as_usize() { LED_ON } else { LED_OFF };
            self.fill_rect(x, BAR_Y, CELL, CELL, color);
            self.draw_border(x, BAR_Y, CELL, CELL, 0xFF000000);
        }
        let label = format!("{} leds", lit);
        self.draw_label(&label, BAR_X, BAR_Y + CELL + 6, 0xFFEEEEEE);
    }

    // ── Distance scale with threshold ticks ──────────────────────────────

    fn draw_scale(&mut self, thresholds: &Thresholds, distance: Option<f32>) {
        let top = thresholds.breakpoints()[4].max(1.0) * 1.2;
        let at = |d: f32| SCALE_X + ((d / top).clamp(0.0, 1.0) * SCALE_W as f32) as usize;

        self.fill_rect(SCALE_X, SCALE_Y, SCALE_W, 2, 0xFF888888);
        self.draw_label("0", SCALE_X, SCALE_Y + 8, 0xFF888888);
        for (k, &b) in thresholds.breakpoints().iter().enumerate() {
            let x = at(b);
            self.fill_rect(x, SCALE_Y - 6, 2, 14, 0xFFAADDFF);
            self.draw_label(&(k + 1).to_string(), x, SCALE_Y + 10, 0xFFAADDFF);
        }
        if let Some(d) = distance {
            let x = at(d);
            self.draw_diamond(x as isize, SCALE_Y as isize, 5, MID_COLOR);
        }
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(WIN_H) {
            for col in x..(x + w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 {
            return;
        }
        for col in x..(x + w).min(WIN_W) {
            self.set_pixel(col, y, color);
            self.set_pixel(col, y + h - 1, color);
        }
        for row in y..(y + h).min(WIN_H) {
            self.set_pixel(x, row, color);
            self.set_pixel(x + w - 1, row, color);
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < WIN_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    fn plot(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize, color);
        }
    }

    fn draw_line(&mut self, a: (isize, isize), b: (isize, isize), color: u32) {
        let steps = (b.0 - a.0).abs().max((b.1 - a.1).abs()).max(1);
        for s in 0..=steps {
            let t = s as f32 / steps as f32;
            let x = a.0 as f32 + (b.0 - a.0) as f32 * t;
            let y = a.1 as f32 + (b.1 - a.1) as f32 * t;
            self.plot(x.round() as isize, y.round() as isize, color);
            self.plot(x.round() as isize, y.round() as isize + 1, color);
        }
    }

    fn draw_disc(&mut self, (cx, cy): (isize, isize), r: isize, color: u32) {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    let edge = dx * dx + dy * dy > (r - 2) * (r - 2);
                    let c = if edge { shade(color, 0.6) } else { color };
                    self.plot(cx + dx, cy + dy, c);
                }
            }
        }
    }

    fn draw_diamond(&mut self, cx: isize, cy: isize, r: isize, color: u32) {
        for dy in 0..=r {
            let dx = r - dy;
            for &(sx, sy) in &[(cx + dx, cy + dy), (cx - dx, cy + dy), (cx + dx, cy - dy), (cx - dx, cy - dy)] {
                self.plot(sx, sy, color);
            }
        }
    }

    /// Minimal bitmap font: 3×5 characters.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.set_pixel(cx + col, y + row, color);
                    }
                }
            }
            cx += 4; // 3 wide + 1 gap
            if cx + 4 > WIN_W {
                break;
            }
        }
    }
}

/// Translate the mouse state into a simulated hand.
fn sim_input(held: bool, mouse: Option<(f32, f32)>) -> SimInput {
    match (held, mouse) {
        (true, Some((mx, my))) if my < VIEW_H as f32 => SimInput::Pinch {
            thumb: Landmark::new(SIM_THUMB.0, SIM_THUMB.1),
            index: Landmark::new(mx / VIEW_W as f32, my / VIEW_H as f32),
        },
        _ => SimInput::NoHand,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '|' => [0b010, 0b010, 0b010, 0b010, 0b010],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _ => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

/// Darken an opaque ARGB color, keeping `keep` of each channel.
fn shade(color: u32, keep: f32) -> u32 {
    let keep = keep.clamp(0.0, 1.0);
    let scale = |shift: u32| ((((color >> shift) & 0xFF) as f32 * keep) as u32) << shift;
    0xFF000000 | scale(16) | scale(8) | scale(0)
}
