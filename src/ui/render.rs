//! Software drawing on a `u32` (0x00RRGGBB) framebuffer.

use crate::ui::layout::Rect;

pub const BG: (u8, u8, u8) = (239, 246, 255);
pub const BORDER: (u8, u8, u8, u8) = (219, 234, 254, 255);
pub const INK: (u8, u8, u8, u8) = (0, 0, 0, 255);
pub const INK_MUTED: (u8, u8, u8, u8) = (0, 0, 0, 110);
pub const INK_FAINT: (u8, u8, u8, u8) = (0, 0, 0, 40);
pub const WHITE: (u8, u8, u8, u8) = (255, 255, 255, 255);
pub const ERROR: (u8, u8, u8, u8) = (200, 40, 40, 255);

pub const GLYPH_W: u32 = 5;
pub const GLYPH_H: u32 = 7;
/// Horizontal advance per character before scaling (glyph plus one column of spacing).
pub const ADVANCE: u32 = 6;

// 5x7 bitmap font covering ASCII 32..127, one byte per column, LSB = top row.
static FONT_5X7: [[u8; 5]; 96] = [
    [0x00, 0x00, 0x00, 0x00, 0x00], [0x00, 0x00, 0x5F, 0x00, 0x00], [0x00, 0x07, 0x00, 0x07, 0x00], [0x14, 0x7F, 0x14, 0x7F, 0x14], //  !"#
    [0x24, 0x2A, 0x7F, 0x2A, 0x12], [0x23, 0x13, 0x08, 0x64, 0x62], [0x36, 0x49, 0x55, 0x22, 0x50], [0x00, 0x05, 0x03, 0x00, 0x00], // $%&'
    [0x00, 0x1C, 0x22, 0x41, 0x00], [0x00, 0x41, 0x22, 0x1C, 0x00], [0x14, 0x08, 0x3E, 0x08, 0x14], [0x08, 0x08, 0x3E, 0x08, 0x08], // ()*+
    [0x00, 0x50, 0x30, 0x00, 0x00], [0x08, 0x08, 0x08, 0x08, 0x08], [0x00, 0x60, 0x60, 0x00, 0x00], [0x20, 0x10, 0x08, 0x04, 0x02], // ,-./
    [0x3E, 0x51, 0x49, 0x45, 0x3E], [0x00, 0x42, 0x7F, 0x40, 0x00], [0x42, 0x61, 0x51, 0x49, 0x46], [0x21, 0x41, 0x45, 0x4B, 0x31], // 0123
    [0x18, 0x14, 0x12, 0x7F, 0x10], [0x27, 0x45, 0x45, 0x45, 0x39], [0x3C, 0x4A, 0x49, 0x49, 0x30], [0x01, 0x71, 0x09, 0x05, 0x03], // 4567
    [0x36, 0x49, 0x49, 0x49, 0x36], [0x06, 0x49, 0x49, 0x29, 0x1E], [0x00, 0x36, 0x36, 0x00, 0x00], [0x00, 0x56, 0x36, 0x00, 0x00], // 89:;
    [0x08, 0x14, 0x22, 0x41, 0x00], [0x14, 0x14, 0x14, 0x14, 0x14], [0x00, 0x41, 0x22, 0x14, 0x08], [0x02, 0x01, 0x51, 0x09, 0x06], // <=>?
    [0x3E, 0x41, 0x5D, 0x55, 0x1E], [0x7E, 0x11, 0x11, 0x11, 0x7E], [0x7F, 0x49, 0x49, 0x49, 0x36], [0x3E, 0x41, 0x41, 0x41, 0x22], // @ABC
    [0x7F, 0x41, 0x41, 0x22, 0x1C], [0x7F, 0x49, 0x49, 0x49, 0x41], [0x7F, 0x09, 0x09, 0x09, 0x01], [0x3E, 0x41, 0x49, 0x49, 0x7A], // DEFG
    [0x7F, 0x08, 0x08, 0x08, 0x7F], [0x00, 0x41, 0x7F, 0x41, 0x00], [0x20, 0x40, 0x41, 0x3F, 0x01], [0x7F, 0x08, 0x14, 0x22, 0x41], // HIJK
    [0x7F, 0x40, 0x40, 0x40, 0x40], [0x7F, 0x02, 0x0C, 0x02, 0x7F], [0x7F, 0x04, 0x08, 0x10, 0x7F], [0x3E, 0x41, 0x41, 0x41, 0x3E], // LMNO
    [0x7F, 0x09, 0x09, 0x09, 0x06], [0x3E, 0x41, 0x51, 0x21, 0x5E], [0x7F, 0x09, 0x19, 0x29, 0x46], [0x46, 0x49, 0x49, 0x49, 0x31], // PQRS
    [0x01, 0x01, 0x7F, 0x01, 0x01], [0x3F, 0x40, 0x40, 0x40, 0x3F], [0x1F, 0x20, 0x40, 0x20, 0x1F], [0x3F, 0x40, 0x38, 0x40, 0x3F], // TUVW
    [0x63, 0x14, 0x08, 0x14, 0x63], [0x07, 0x08, 0x70, 0x08, 0x07], [0x61, 0x51, 0x49, 0x45, 0x43], [0x00, 0x7F, 0x41, 0x41, 0x00], // XYZ[
    [0x02, 0x04, 0x08, 0x10, 0x20], [0x00, 0x41, 0x41, 0x7F, 0x00], [0x04, 0x02, 0x01, 0x02, 0x04], [0x40, 0x40, 0x40, 0x40, 0x40], // \]^_
    [0x00, 0x01, 0x02, 0x04, 0x00], [0x20, 0x54, 0x54, 0x54, 0x78], [0x7F, 0x48, 0x44, 0x44, 0x38], [0x38, 0x44, 0x44, 0x44, 0x20], // `abc
    [0x38, 0x44, 0x44, 0x48, 0x7F], [0x38, 0x54, 0x54, 0x54, 0x18], [0x08, 0x7E, 0x09, 0x01, 0x02], [0x0C, 0x52, 0x52, 0x52, 0x3E], // defg
    [0x7F, 0x08, 0x04, 0x04, 0x78], [0x00, 0x44, 0x7D, 0x40, 0x00], [0x20, 0x40, 0x44, 0x3D, 0x00], [0x7F, 0x10, 0x28, 0x44, 0x00], // hijk
    [0x00, 0x41, 0x7F, 0x40, 0x00], [0x7C, 0x04, 0x18, 0x04, 0x78], [0x7C, 0x08, 0x04, 0x04, 0x78], [0x38, 0x44, 0x44, 0x44, 0x38], // lmno
    [0x7C, 0x14, 0x14, 0x14, 0x08], [0x08, 0x14, 0x14, 0x18, 0x7C], [0x7C, 0x08, 0x04, 0x04, 0x08], [0x48, 0x54, 0x54, 0x54, 0x20], // pqrs
    [0x04, 0x3F, 0x44, 0x40, 0x20], [0x3C, 0x40, 0x40, 0x20, 0x7C], [0x1C, 0x20, 0x40, 0x20, 0x1C], [0x3C, 0x40, 0x30, 0x40, 0x3C], // tuvw
    [0x44, 0x28, 0x10, 0x28, 0x44], [0x0C, 0x50, 0x50, 0x50, 0x3C], [0x44, 0x64, 0x54, 0x4C, 0x44], [0x00, 0x08, 0x36, 0x41, 0x00], // xyz{
    [0x00, 0x00, 0x7F, 0x00, 0x00], [0x00, 0x41, 0x36, 0x08, 0x00], [0x10, 0x08, 0x08, 0x10, 0x08], [0x00, 0x00, 0x00, 0x00, 0x00], // |}~
];

/// Pack RGB into softbuffer u32 format: 0x00RRGGBB.
pub fn rgb(r: u8, g: u8, b: u8) -> u32 {
    (r as u32) << 16 | (g as u32) << 8 | b as u32
}

fn unpack_rgb(v: u32) -> (u8, u8, u8) {
    ((v >> 16) as u8, (v >> 8) as u8, v as u8)
}

fn blend(dst: u32, color: (u8, u8, u8, u8)) -> u32 {
    let a = color.3 as u32;
    if a == 255 {
        return rgb(color.0, color.1, color.2);
    }
    let (dr, dg, db) = unpack_rgb(dst);
    let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * (255 - a)) / 255) as u8;
    rgb(mix(color.0, dr), mix(color.1, dg), mix(color.2, db))
}

pub fn text_width(text: &str, scale: u32) -> f32 {
    (text.chars().count() as u32 * ADVANCE * scale) as f32
}

pub fn fit_scale(img_w: f32, img_h: f32, win_w: f32, win_h: f32) -> f32 {
    (win_w / img_w).min(win_h / img_h)
}

/// Scale at which the image fully covers the box (cropping the overflow).
pub fn cover_scale(img_w: f32, img_h: f32, box_w: f32, box_h: f32) -> f32 {
    (box_w / img_w).max(box_h / img_h)
}

/// Greedy word wrap to at most `max_chars` per line. Longer words are split.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let needed = if line.is_empty() { word.len() } else { line.chars().count() + 1 + word.len() };
        if needed > max_chars && !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.extend(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// How a source image is composited.
#[derive(Debug, Clone, Copy)]
pub struct BlitStyle {
    pub grayscale: bool,
    pub opacity: u8,
}

impl Default for BlitStyle {
    fn default() -> Self {
        Self {
            grayscale: false,
            opacity: 255,
        }
    }
}

/// A framebuffer borrowed for one frame.
pub struct Canvas<'a> {
    buf: &'a mut [u32],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    pub fn new(buf: &'a mut [u32], width: u32, height: u32) -> Self {
        Self { buf, width, height }
    }

    pub fn width(&self) -> f32 {
        self.width as f32
    }

    pub fn height(&self) -> f32 {
        self.height as f32
    }

    pub fn clear(&mut self, color: (u8, u8, u8)) {
        self.buf.fill(rgb(color.0, color.1, color.2));
    }

    fn put(&mut self, x: i32, y: i32, color: (u8, u8, u8, u8)) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return;
        }
        let off = (y as u32 * self.width + x as u32) as usize;
        if let Some(px) = self.buf.get_mut(off) {
            *px = blend(*px, color);
        }
    }

    /// Intersection of `r` with the framebuffer, as pixel bounds `[x0, x1) x [y0, y1)`.
    fn clip(&self, r: Rect) -> (i32, i32, i32, i32) {
        let x0 = r.x.max(0.0).floor() as i32;
        let y0 = r.y.max(0.0).floor() as i32;
        let x1 = r.right().min(self.width as f32).ceil() as i32;
        let y1 = r.bottom().min(self.height as f32).ceil() as i32;
        (x0, y0, x1, y1)
    }

    /// Fill a rectangle with a color (with alpha blending).
    pub fn fill(&mut self, r: Rect, color: (u8, u8, u8, u8)) {
        let (x0, y0, x1, y1) = self.clip(r);
        for y in y0..y1 {
            for x in x0..x1 {
                self.put(x, y, color);
            }
        }
    }

    pub fn outline(&mut self, r: Rect, thickness: f32, color: (u8, u8, u8, u8)) {
        let t = thickness.min(r.w / 2.0).min(r.h / 2.0);
        self.fill(Rect::new(r.x, r.y, r.w, t), color);
        self.fill(Rect::new(r.x, r.bottom() - t, r.w, t), color);
        self.fill(Rect::new(r.x, r.y + t, t, r.h - 2.0 * t), color);
        self.fill(Rect::new(r.right() - t, r.y + t, t, r.h - 2.0 * t), color);
    }

    /// Straight line with square pen of the given thickness.
    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), thickness: f32, color: (u8, u8, u8, u8)) {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as i32;
        let half = thickness / 2.0;
        let mut last = None;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = (from.0 + dx * t - half).round() as i32;
            let y = (from.1 + dy * t - half).round() as i32;
            if last == Some((x, y)) {
                continue;
            }
            last = Some((x, y));
            let pen = thickness.round().max(1.0) as i32;
            for py in 0..pen {
                for px in 0..pen {
                    self.put(x + px, y + py, color);
                }
            }
        }
    }

    fn draw_char(&mut self, ch: char, px: i32, py: i32, scale: u32, color: (u8, u8, u8, u8)) {
        let idx = (ch as u32).wrapping_sub(32) as usize;
        let Some(glyph) = FONT_5X7.get(idx) else { return };
        for col in 0..GLYPH_W {
            let bits = glyph[col as usize];
            for row in 0..GLYPH_H {
                if bits & (1 << row) == 0 {
                    continue;
                }
                for sy in 0..scale {
                    for sx in 0..scale {
                        let x = px + (col * scale + sx) as i32;
                        let y = py + (row * scale + sy) as i32;
                        self.put(x, y, color);
                    }
                }
            }
        }
    }

    /// Draw a string. Returns the x position after the last character.
    pub fn text(&mut self, text: &str, x: f32, y: f32, scale: u32, color: (u8, u8, u8, u8)) -> f32 {
        let mut cx = x.round() as i32;
        let cy = y.round() as i32;
        for ch in text.chars() {
            self.draw_char(ch, cx, cy, scale, color);
            cx += (ADVANCE * scale) as i32;
        }
        cx as f32
    }

    /// Draw wrapped text into `width`. Returns the y position below the last line.
    pub fn paragraph(&mut self, text: &str, x: f32, y: f32, width: f32, scale: u32, color: (u8, u8, u8, u8)) -> f32 {
        let max_chars = (width / (ADVANCE * scale) as f32).floor() as usize;
        let line_h = ((GLYPH_H + 4) * scale) as f32;
        let mut cy = y;
        for line in wrap_text(text, max_chars) {
            self.text(&line, x, cy, scale, color);
            cy += line_h;
        }
        cy
    }

    /// Nearest-neighbour scaled copy of an RGBA8 image into `dst`, limited to `clip`.
    pub fn blit(&mut self, src: &[u8], src_w: u32, src_h: u32, dst: Rect, clip: Rect, style: BlitStyle) {
        if src_w == 0 || src_h == 0 || dst.w <= 0.0 || dst.h <= 0.0 {
            return;
        }
        let visible = Rect::new(
            dst.x.max(clip.x),
            dst.y.max(clip.y),
            (dst.right().min(clip.right()) - dst.x.max(clip.x)).max(0.0),
            (dst.bottom().min(clip.bottom()) - dst.y.max(clip.y)).max(0.0),
        );
        let (x0, y0, x1, y1) = self.clip(visible);
        let sx_scale = src_w as f32 / dst.w;
        let sy_scale = src_h as f32 / dst.h;

        for y in y0..y1 {
            let sy = (((y as f32 + 0.5 - dst.y) * sy_scale) as u32).min(src_h - 1);
            for x in x0..x1 {
                let sx = (((x as f32 + 0.5 - dst.x) * sx_scale) as u32).min(src_w - 1);
                let si = (sy as usize * src_w as usize + sx as usize) * 4;
                let Some(p) = src.get(si..si + 4) else { continue };
                let (mut r, mut g, mut b) = (p[0], p[1], p[2]);
                if style.grayscale {
                    let luma = ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8;
                    (r, g, b) = (luma, luma, luma);
                }
                let a = (p[3] as u32 * style.opacity as u32 / 255) as u8;
                if a > 0 {
                    self.put(x, y, (r, g, b, a));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas_buf(w: u32, h: u32) -> Vec<u32> {
        vec![0; (w * h) as usize]
    }

    #[test]
    fn rgb_packs_channels() {
        assert_eq!(rgb(0x12, 0x34, 0x56), 0x0012_3456);
        assert_eq!(blend(rgb(0, 0, 0), (255, 255, 255, 255)), rgb(255, 255, 255));
        assert_eq!(blend(rgb(0, 0, 0), (255, 255, 255, 0)), rgb(0, 0, 0));
    }

    #[test]
    fn fill_is_clipped_to_the_framebuffer() {
        let mut buf = canvas_buf(4, 4);
        let mut canvas = Canvas::new(&mut buf, 4, 4);
        canvas.fill(Rect::new(-2.0, 2.0, 4.0, 10.0), WHITE);
        let white = rgb(255, 255, 255);
        assert_eq!(buf.iter().filter(|&&p| p == white).count(), 4);
        assert_eq!(buf[8], white);
        assert_eq!(buf[9], white);
        assert_eq!(buf[10], 0);
    }

    #[test]
    fn text_width_counts_advances() {
        assert_eq!(text_width("HOME", 2), 48.0);
        assert_eq!(text_width("", 3), 0.0);
    }

    #[test]
    fn wrap_breaks_on_words() {
        assert_eq!(
            wrap_text("every pixel is intentional", 12),
            vec!["every pixel", "is", "intentional"]
        );
        assert_eq!(wrap_text("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert!(wrap_text("   ", 10).is_empty());
    }

    #[test]
    fn blit_scales_and_grays() {
        // 1x1 pure red source stretched over a 2x2 target.
        let src = [255u8, 0, 0, 255];
        let mut buf = canvas_buf(3, 3);
        let mut canvas = Canvas::new(&mut buf, 3, 3);
        let dst = Rect::new(0.0, 0.0, 2.0, 2.0);
        canvas.blit(&src, 1, 1, dst, dst, BlitStyle::default());
        assert_eq!(buf[0], rgb(255, 0, 0));
        assert_eq!(buf[4], rgb(255, 0, 0));
        assert_eq!(buf[2], 0);

        let mut buf = canvas_buf(1, 1);
        let mut canvas = Canvas::new(&mut buf, 1, 1);
        let dst = Rect::new(0.0, 0.0, 1.0, 1.0);
        canvas.blit(&src, 1, 1, dst, dst, BlitStyle { grayscale: true, opacity: 255 });
        assert_eq!(buf[0], rgb(76, 76, 76));
    }

    #[test]
    fn blit_respects_clip() {
        let src = [0u8, 0, 255, 255];
        let mut buf = canvas_buf(4, 1);
        let mut canvas = Canvas::new(&mut buf, 4, 1);
        canvas.blit(
            &src,
            1,
            1,
            Rect::new(0.0, 0.0, 4.0, 1.0),
            Rect::new(1.0, 0.0, 2.0, 1.0),
            BlitStyle::default(),
        );
        assert_eq!(buf, vec![0, rgb(0, 0, 255), rgb(0, 0, 255), 0]);
    }
}
