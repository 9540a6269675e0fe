//! Page geometry shared by drawing and hit testing.
//!
//! All rectangles are in window pixels with the page scroll already applied.

use crate::ui::render::{fit_scale, text_width};
use crate::ui::state::View;

pub const MARGIN: f32 = 32.0;
pub const CONTENT_MAX_W: f32 = 1152.0;
pub const FORM_MAX_W: f32 = 768.0;
pub const HEADER_H: f32 = 160.0;
pub const SECTION_TOP: f32 = 64.0;
pub const FOOTER_H: f32 = 140.0;
pub const GRID_GAP: f32 = 24.0;
pub const PORTRAIT_SIZE: f32 = 320.0;
pub const ABOUT_TEXT_H: f32 = 470.0;
pub const CONTACT_H: f32 = 560.0;

/// Fraction of the window the unzoomed lightbox image may cover.
pub const LIGHTBOX_FILL: f32 = 0.85;

pub const NAV_ITEMS: [(View, &str); 3] = [
    (View::Home, "HOME"),
    (View::About, "ABOUT ME"),
    (View::Contact, "CONTACT"),
];

pub const FOOTER_ITEMS: [(View, &str); 3] = [
    (View::Home, "MANIFEST"),
    (View::About, "COORDINATES"),
    (View::Contact, "ARCHIVE"),
];

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.x + self.w && py >= self.y && py < self.y + self.h
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn inset(&self, d: f32) -> Rect {
        Rect::new(self.x + d, self.y + d, (self.w - 2.0 * d).max(0.0), (self.h - 2.0 * d).max(0.0))
    }
}

/// Horizontal extent of the centred content column.
fn column(win_w: f32, max_w: f32) -> (f32, f32) {
    let outer = win_w.min(max_w);
    let x = (win_w - outer) / 2.0 + MARGIN;
    (x, (outer - 2.0 * MARGIN).max(1.0))
}

pub fn grid_columns(win_w: f32) -> usize {
    if win_w < 640.0 {
        1
    } else if win_w < 1024.0 {
        2
    } else {
        4
    }
}

fn is_wide(win_w: f32) -> bool {
    win_w >= 1024.0
}

/// Top of the first section below the header heading row.
pub fn section_top(scroll: f32) -> f32 {
    HEADER_H + SECTION_TOP - scroll
}

// ---------------------------------------------------------------------------
// Header / footer
// ---------------------------------------------------------------------------

pub struct HeaderLayout {
    pub title: Rect,
    pub nav: Vec<(View, Rect)>,
    /// Top-left of the `Idx [N]` counter.
    pub counter: (f32, f32),
}

pub fn header(win_w: f32, scroll: f32, scale: u32) -> HeaderLayout {
    let (x, w) = column(win_w, CONTENT_MAX_W);
    let char_h = (7 * scale) as f32;
    let title = Rect::new(x, 48.0 - scroll, w.min(520.0), 80.0);

    let nav_y = HEADER_H - 40.0 - scroll;
    let gap = 32.0;
    let widths: Vec<f32> = NAV_ITEMS.iter().map(|(_, label)| text_width(label, scale)).collect();
    let counter_w = text_width("IDX [00]", scale);
    let total: f32 = widths.iter().sum::<f32>() + gap * widths.len() as f32 + counter_w;
    let mut cx = (x + w - total).max(x);
    let mut nav = Vec::with_capacity(NAV_ITEMS.len());
    for ((view, _), width) in NAV_ITEMS.iter().zip(&widths) {
        nav.push((*view, Rect::new(cx, nav_y - 6.0, *width, char_h + 12.0)));
        cx += width + gap;
    }

    HeaderLayout {
        title,
        nav,
        counter: (cx, nav_y),
    }
}

pub fn footer(view: View, win_w: f32, count: usize, scroll: f32, scale: u32) -> Vec<(View, Rect)> {
    let (x, w) = column(win_w, CONTENT_MAX_W);
    let top = content_height(view, win_w, count) - FOOTER_H - scroll;
    let char_h = (7 * scale) as f32;
    let gap = 48.0;
    let widths: Vec<f32> = FOOTER_ITEMS.iter().map(|(_, label)| text_width(label, scale)).collect();
    let total: f32 = widths.iter().sum::<f32>() + gap * (widths.len() - 1) as f32;
    let mut cx = (x + w - total).max(x);
    let mut out = Vec::with_capacity(FOOTER_ITEMS.len());
    for ((view, _), width) in FOOTER_ITEMS.iter().zip(&widths) {
        out.push((*view, Rect::new(cx, top + 56.0, *width, char_h + 12.0)));
        cx += width + gap;
    }
    out
}

/// Top-left of the footer copyright block.
pub fn footer_origin(view: View, win_w: f32, count: usize, scroll: f32) -> (f32, f32) {
    let (x, _) = column(win_w, CONTENT_MAX_W);
    (x, content_height(view, win_w, count) - FOOTER_H - scroll + 48.0)
}

// ---------------------------------------------------------------------------
// Home grid
// ---------------------------------------------------------------------------

fn cell_size(win_w: f32) -> (usize, f32, f32) {
    let (_, w) = column(win_w, CONTENT_MAX_W);
    let cols = grid_columns(win_w);
    let cell_w = (w - GRID_GAP * (cols - 1) as f32) / cols as f32;
    (cols, cell_w, cell_w * 5.0 / 4.0)
}

pub fn grid_cells(win_w: f32, scroll: f32, count: usize) -> Vec<Rect> {
    let (x, _) = column(win_w, CONTENT_MAX_W);
    let (cols, cell_w, cell_h) = cell_size(win_w);
    let top = section_top(scroll) + 48.0;
    (0..count)
        .map(|i| {
            let col = i % cols;
            let row = i / cols;
            Rect::new(
                x + col as f32 * (cell_w + GRID_GAP),
                top + row as f32 * (cell_h + GRID_GAP),
                cell_w,
                cell_h,
            )
        })
        .collect()
}

pub fn grid_hit(win_w: f32, scroll: f32, count: usize, px: f32, py: f32) -> Option<usize> {
    grid_cells(win_w, scroll, count)
        .iter()
        .position(|cell| cell.contains(px, py))
}

// ---------------------------------------------------------------------------
// About / contact
// ---------------------------------------------------------------------------

pub struct AboutLayout {
    pub portrait: Rect,
    /// Column the headline, body and skill lists are wrapped into.
    pub text: Rect,
}

pub fn about(win_w: f32, scroll: f32) -> AboutLayout {
    let (x, w) = column(win_w, CONTENT_MAX_W);
    let top = section_top(scroll);
    let size = PORTRAIT_SIZE.min(w);
    if is_wide(win_w) {
        let text_x = x + size + 96.0;
        AboutLayout {
            portrait: Rect::new(x, top + 40.0, size, size),
            text: Rect::new(text_x, top, (x + w - text_x).max(1.0), ABOUT_TEXT_H),
        }
    } else {
        AboutLayout {
            portrait: Rect::new(x + (w - size) / 2.0, top, size, size),
            text: Rect::new(x, top + size + 48.0, w, ABOUT_TEXT_H),
        }
    }
}

pub struct ContactLayout {
    pub name: Rect,
    pub email: Rect,
    pub message: Rect,
    pub send: Rect,
    /// Top-left of the direct-line block.
    pub direct_line: (f32, f32),
}

pub fn contact(win_w: f32, scroll: f32) -> ContactLayout {
    let (x, w) = column(win_w, FORM_MAX_W);
    let top = section_top(scroll) + 56.0;
    let field_h = 44.0;
    let (name, email) = if win_w >= 768.0 {
        let half = (w - 40.0) / 2.0;
        (
            Rect::new(x, top + 24.0, half, field_h),
            Rect::new(x + half + 40.0, top + 24.0, half, field_h),
        )
    } else {
        (
            Rect::new(x, top + 24.0, w, field_h),
            Rect::new(x, top + 24.0 + field_h + 48.0, w, field_h),
        )
    };
    let message_top = email.bottom() + 56.0;
    let message = Rect::new(x, message_top, w, 120.0);
    let send = Rect::new(x, message.bottom() + 40.0, 240.0, 48.0);
    ContactLayout {
        name,
        email,
        message,
        send,
        direct_line: (x, send.bottom() + 80.0),
    }
}

// ---------------------------------------------------------------------------
// Document height / scrolling
// ---------------------------------------------------------------------------

pub fn content_height(view: View, win_w: f32, count: usize) -> f32 {
    let body = match view {
        View::Home => {
            let (cols, _, cell_h) = cell_size(win_w);
            let rows = count.div_ceil(cols);
            48.0 + rows as f32 * (cell_h + GRID_GAP)
        }
        View::About => {
            if is_wide(win_w) {
                ABOUT_TEXT_H.max(PORTRAIT_SIZE + 40.0)
            } else {
                PORTRAIT_SIZE + 48.0 + ABOUT_TEXT_H
            }
        }
        View::Contact => {
            if win_w >= 768.0 {
                CONTACT_H
            } else {
                CONTACT_H + 92.0
            }
        }
    };
    HEADER_H + SECTION_TOP + body + SECTION_TOP + FOOTER_H
}

pub fn max_scroll(view: View, win_w: f32, win_h: f32, count: usize) -> f32 {
    (content_height(view, win_w, count) - win_h).max(0.0)
}

// ---------------------------------------------------------------------------
// Lightbox
// ---------------------------------------------------------------------------

pub struct LightboxLayout {
    pub close: Rect,
    pub prev: Rect,
    pub next: Rect,
    pub critique: Rect,
    pub panel: Rect,
    /// Baseline of the entry / position labels.
    pub labels_y: f32,
}

pub fn lightbox(win_w: f32, win_h: f32) -> LightboxLayout {
    let side = if win_w >= 768.0 { 32.0 } else { 16.0 };
    let button = 64.0;
    let mid = win_h / 2.0 - button / 2.0;
    let panel_w = (win_w * 0.7).min(900.0);
    LightboxLayout {
        close: Rect::new(win_w - side - 44.0, side, 44.0, 44.0),
        prev: Rect::new(side, mid, button, button),
        next: Rect::new(win_w - side - button, mid, button, button),
        critique: Rect::new(win_w - side - 44.0 - 16.0 - 132.0, side, 132.0, 44.0),
        panel: Rect::new((win_w - panel_w) / 2.0, win_h - 64.0 - 180.0, panel_w, 172.0),
        labels_y: win_h - 40.0,
    }
}

/// Where the open image is drawn: fitted (never upscaled), then zoomed about
/// its centre and translated by the pan.
pub fn lightbox_image(win_w: f32, win_h: f32, img_w: f32, img_h: f32, zoom: f32, pan: (f32, f32)) -> Rect {
    let base = fit_scale(img_w, img_h, win_w * LIGHTBOX_FILL, win_h * LIGHTBOX_FILL).min(1.0);
    let scale = base * zoom;
    let w = img_w * scale;
    let h = img_h * scale;
    Rect::new(
        (win_w - w) / 2.0 + pan.0,
        (win_h - h) / 2.0 + pan.1,
        w,
        h,
    )
}
