use std::collections::HashMap;
use std::sync::{Arc, MutexGuard, PoisonError};
use winit::keyboard::{Key, NamedKey};
use winit::window::CursorIcon;

use crate::content::{
    ABOUT_BODY, ABOUT_COLUMNS, ABOUT_HEADLINE, COLLECTION_HEADING, CONTACT_HEADING, COPYRIGHT_YEAR,
    DIRECT_LINE_HEADING, FOOTER_TAGLINE, PROFILE_HEADING, TAGLINE,
};
use crate::critique::CuratorResponse;
use crate::gallery::Gallery;
use crate::loader::{CacheState, DecodedImage, SharedState};
use crate::ui::layout::{self, FOOTER_ITEMS, HEADER_H, NAV_ITEMS, Rect};
use crate::ui::render::{
    wrap_text, BlitStyle, Canvas, ADVANCE, BG, BORDER, ERROR, GLYPH_H, INK, INK_FAINT, INK_MUTED,
    WHITE, cover_scale, text_width,
};
use crate::ui::viewer::Viewer;

/// Browser-style pixels per wheel line.
pub const LINE_DELTA_PX: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Home,
    About,
    Contact,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CritiqueStatus {
    Pending,
    Ready(CuratorResponse),
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Message,
}

/// Contact form contents. There is no submission.
#[derive(Debug, Default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
    pub focus: Option<Field>,
}

impl ContactForm {
    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Message => &self.message,
        }
    }

    fn focused_mut(&mut self) -> Option<&mut String> {
        match self.focus? {
            Field::Name => Some(&mut self.name),
            Field::Email => Some(&mut self.email),
            Field::Message => Some(&mut self.message),
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = Some(match self.focus {
            None | Some(Field::Message) => Field::Name,
            Some(Field::Name) => Field::Email,
            Some(Field::Email) => Field::Message,
        });
    }

    /// Inserts typed text into the focused field, dropping control characters.
    /// Only the message field accepts newlines.
    pub fn insert(&mut self, text: &str) {
        let multiline = self.focus == Some(Field::Message);
        if let Some(value) = self.focused_mut() {
            value.extend(
                text.chars()
                    .filter(|c| !c.is_control() || (multiline && *c == '\n')),
            );
        }
    }

    pub fn backspace(&mut self) {
        if let Some(value) = self.focused_mut() {
            value.pop();
        }
    }
}

/// Work the window shell performs on behalf of the state.
#[derive(Debug, PartialEq)]
pub enum Effect {
    RequestCritique { index: usize, url: String },
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

pub struct AppState {
    pub gallery: Gallery,
    pub shared: SharedState,
    pub owner: String,
    pub email: String,

    pub view: View,
    pub viewer: Viewer,
    pub scroll: f32,
    pub mouse_pos: (f32, f32),
    pub win_size: (f32, f32),
    pub text_scale: u32,

    pub critique_enabled: bool,
    pub critiques: HashMap<usize, CritiqueStatus>,
    pub form: ContactForm,

    /// Selection last pushed to the loader.
    synced_selection: Option<usize>,
}

impl AppState {
    pub fn new(
        gallery: Gallery,
        shared: SharedState,
        owner: String,
        email: String,
        critique_enabled: bool,
    ) -> Self {
        let viewer = Viewer::new(gallery.len());
        Self {
            gallery,
            shared,
            owner,
            email,
            view: View::Home,
            viewer,
            scroll: 0.0,
            mouse_pos: (-1.0, -1.0),
            win_size: (1280.0, 720.0),
            text_scale: 2,
            critique_enabled,
            critiques: HashMap::new(),
            form: ContactForm::default(),
            synced_selection: None,
        }
    }

    fn cache(&self) -> MutexGuard<'_, CacheState> {
        self.shared.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pushes the lightbox selection to the loader so the open image is decoded first.
    fn sync_selection(&mut self) {
        let selected = self.viewer.selected();
        if selected == self.synced_selection {
            return;
        }
        self.synced_selection = selected;
        let (_, cvar) = &*self.shared;
        self.cache().set_selection(selected);
        cvar.notify_all();
    }

    fn max_scroll(&self) -> f32 {
        layout::max_scroll(self.view, self.win_size.0, self.win_size.1, self.gallery.len())
    }

    pub fn set_view(&mut self, view: View) {
        if view != self.view {
            log::debug!("[view] {:?} -> {:?}", self.view, view);
        }
        self.view = view;
        self.viewer.close();
        self.scroll = 0.0;
        self.form.focus = None;
        self.sync_selection();
    }

    pub fn open(&mut self, index: usize) {
        self.viewer.open(index);
        self.sync_selection();
    }

    // -- input ---------------------------------------------------------------

    pub fn on_resize(&mut self, width: f32, height: f32) {
        self.win_size = (width.max(1.0), height.max(1.0));
        self.scroll = self.scroll.clamp(0.0, self.max_scroll());
    }

    pub fn on_key(&mut self, key: &Key, text: Option<&str>) -> Option<Effect> {
        if self.viewer.handle_key(key) {
            self.sync_selection();
            return None;
        }
        if self.viewer.grab().is_some() {
            if let Key::Character(c) = key {
                if c.eq_ignore_ascii_case("c") {
                    return self.request_critique();
                }
            }
            return None;
        }

        if self.view == View::Contact && self.form.focus.is_some() {
            match key {
                Key::Named(NamedKey::Tab) => self.form.focus_next(),
                Key::Named(NamedKey::Backspace) => self.form.backspace(),
                Key::Named(NamedKey::Escape) => self.form.focus = None,
                Key::Named(NamedKey::Enter) => self.form.insert("\n"),
                _ => {
                    if let Some(text) = text {
                        self.form.insert(text);
                    }
                }
            }
        } else if self.view == View::Contact && *key == Key::Named(NamedKey::Tab) {
            self.form.focus_next();
        }
        None
    }

    /// Wheel input in browser convention (positive is scrolling down).
    pub fn on_wheel(&mut self, delta_y: f32) {
        if self.viewer.grab().is_some() {
            self.viewer.zoom_by(delta_y);
        } else {
            self.scroll = (self.scroll + delta_y).clamp(0.0, self.max_scroll());
        }
    }

    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        self.mouse_pos = (x, y);
        self.viewer.update_pan(x, y);
    }

    pub fn on_pointer_up(&mut self) {
        self.viewer.end_pan();
    }

    pub fn on_cursor_left(&mut self) {
        self.mouse_pos = (-1.0, -1.0);
        self.viewer.end_pan();
    }

    pub fn on_pointer_down(&mut self, x: f32, y: f32) -> Option<Effect> {
        self.mouse_pos = (x, y);
        let (w, h) = self.win_size;

        if self.viewer.is_open() {
            let lb = layout::lightbox(w, h);
            if lb.close.contains(x, y) {
                self.viewer.close();
            } else if lb.prev.contains(x, y) {
                self.viewer.previous();
            } else if lb.next.contains(x, y) {
                self.viewer.next();
            } else if lb.critique.contains(x, y) {
                return self.request_critique();
            } else if self.lightbox_image_rect().is_none_or(|r| r.contains(x, y)) {
                self.viewer.begin_pan(x, y);
            }
            self.sync_selection();
            return None;
        }

        let s = self.text_scale;
        let header = layout::header(w, self.scroll, s);
        if header.title.contains(x, y) {
            self.set_view(View::Home);
            return None;
        }
        let footer = layout::footer(self.view, w, self.gallery.len(), self.scroll, s);
        if let Some((view, _)) = header
            .nav
            .iter()
            .chain(footer.iter())
            .find(|(_, r)| r.contains(x, y))
        {
            self.set_view(*view);
            return None;
        }

        match self.view {
            View::Home => {
                if let Some(index) = layout::grid_hit(w, self.scroll, self.gallery.len(), x, y) {
                    self.open(index);
                }
            }
            View::Contact => {
                let form = layout::contact(w, self.scroll);
                self.form.focus = [
                    (Field::Name, form.name),
                    (Field::Email, form.email),
                    (Field::Message, form.message),
                ]
                .into_iter()
                .find(|(_, r)| r.contains(x, y))
                .map(|(field, _)| field);
                if form.send.contains(x, y) {
                    log::debug!("[contact] send pressed; the form has no submission");
                }
            }
            View::About => {}
        }
        None
    }

    // -- critique ------------------------------------------------------------

    pub fn request_critique(&mut self) -> Option<Effect> {
        let index = self.viewer.selected()?;
        if self.critiques.get(&index) == Some(&CritiqueStatus::Pending) {
            return None;
        }
        if !self.critique_enabled {
            self.critiques.insert(index, CritiqueStatus::Unavailable);
            return None;
        }
        let item = self.gallery.items.get(index)?;
        log::info!("Requesting critique for {}", item.title);
        let effect = Effect::RequestCritique {
            index: item.id,
            url: item.url.clone(),
        };
        self.critiques.insert(index, CritiqueStatus::Pending);
        Some(effect)
    }

    pub fn on_critique(&mut self, index: usize, critique: Option<CuratorResponse>) {
        let status = match critique {
            Some(c) => CritiqueStatus::Ready(c),
            None => CritiqueStatus::Unavailable,
        };
        self.critiques.insert(index, status);
    }

    // -- queries -------------------------------------------------------------

    /// Whether a freshly decoded thumbnail for loader slot `index` is on screen.
    pub fn thumbnail_visible(&self, index: usize) -> bool {
        if self.viewer.is_open() {
            return self.view == View::Home && self.viewer.selected() == Some(index);
        }
        match self.view {
            View::Home => index < self.gallery.len(),
            View::About => index == self.gallery.portrait_index(),
            View::Contact => false,
        }
    }

    pub fn hovered_cell(&self) -> Option<usize> {
        if self.view != View::Home || self.viewer.is_open() {
            return None;
        }
        let (x, y) = self.mouse_pos;
        layout::grid_hit(self.win_size.0, self.scroll, self.gallery.len(), x, y)
    }

    pub fn cursor(&self) -> CursorIcon {
        if self.viewer.is_dragging() {
            CursorIcon::Grabbing
        } else if self.viewer.is_zoomed() {
            CursorIcon::Grab
        } else if self.hovered_cell().is_some() {
            CursorIcon::Pointer
        } else {
            CursorIcon::Default
        }
    }

    /// Full image of the open entry, falling back to its thumbnail.
    fn lightbox_source(&self) -> Option<(Arc<DecodedImage>, bool)> {
        let index = self.viewer.selected()?;
        let cache = self.cache();
        cache
            .get(index)
            .map(|img| (img, true))
            .or_else(|| cache.get_thumbnail(index).map(|img| (img, false)))
    }

    /// Drag target for the open entry. It tracks the image actually drawn, so
    /// the area grows from the thumbnail's size once the full image is cached.
    fn lightbox_image_rect(&self) -> Option<Rect> {
        let (img, _) = self.lightbox_source()?;
        let (w, h) = self.win_size;
        let pan = self.viewer.pan();
        Some(layout::lightbox_image(
            w,
            h,
            img.width as f32,
            img.height as f32,
            self.viewer.zoom(),
            (pan.x, pan.y),
        ))
    }

    // -- rendering -----------------------------------------------------------

    /// Render into the softbuffer framebuffer (u32 per pixel, 0x00RRGGBB).
    pub fn render(&self, frame: &mut [u32], fb_w: u32, fb_h: u32) {
        let mut canvas = Canvas::new(frame, fb_w, fb_h);
        canvas.clear(BG);

        self.draw_header(&mut canvas);
        match self.view {
            View::Home => self.draw_home(&mut canvas),
            View::About => self.draw_about(&mut canvas),
            View::Contact => self.draw_contact(&mut canvas),
        }
        self.draw_footer(&mut canvas);

        if self.view == View::Home && self.viewer.is_open() {
            self.draw_lightbox(&mut canvas);
        }
    }

    fn section_heading(&self, canvas: &mut Canvas, label: &str, x: f32, y: f32, rule_w: f32) {
        let end = canvas.text(label, x, y, 1, INK_MUTED);
        canvas.fill(Rect::new(end + 16.0, y + 3.0, rule_w, 1.0), INK_FAINT);
    }

    fn draw_header(&self, canvas: &mut Canvas) {
        let s = self.text_scale;
        let header = layout::header(canvas.width(), self.scroll, s);
        let (mx, my) = self.mouse_pos;

        canvas.text(&self.owner.to_uppercase(), header.title.x, header.title.y, s * 2, INK);
        canvas.text(TAGLINE, header.title.x, header.title.y + 44.0, 1, INK_MUTED);

        for ((view, label), (_, rect)) in NAV_ITEMS.iter().zip(&header.nav) {
            let active = *view == self.view;
            let color = if active || rect.contains(mx, my) { INK } else { INK_MUTED };
            canvas.text(label, rect.x, rect.y + 6.0, s, color);
            if active {
                canvas.fill(Rect::new(rect.x, rect.bottom() - 2.0, rect.w, 1.0), INK);
            }
        }
        if self.view == View::Home {
            let (cx, cy) = header.counter;
            canvas.text(&format!("IDX [{}]", self.gallery.len()), cx, cy, s, INK_FAINT);
        }

        canvas.fill(Rect::new(0.0, HEADER_H - self.scroll, canvas.width(), 1.0), BORDER);
    }

    fn draw_footer(&self, canvas: &mut Canvas) {
        let count = self.gallery.len();
        let w = canvas.width();
        let (x, y) = layout::footer_origin(self.view, w, count, self.scroll);
        canvas.fill(Rect::new(0.0, y - 48.0, w, 1.0), BORDER);
        canvas.text(
            &format!("(C) {} {}", COPYRIGHT_YEAR, self.owner.to_uppercase()),
            x,
            y,
            1,
            INK,
        );
        canvas.text(FOOTER_TAGLINE, x, y + 16.0, 1, INK_MUTED);

        let (mx, my) = self.mouse_pos;
        let links = layout::footer(self.view, w, count, self.scroll, self.text_scale);
        for ((_, label), (_, rect)) in FOOTER_ITEMS.iter().zip(&links) {
            let color = if rect.contains(mx, my) { INK_MUTED } else { INK };
            canvas.text(label, rect.x, rect.y + 6.0, self.text_scale, color);
        }
    }

    fn draw_home(&self, canvas: &mut Canvas) {
        let w = canvas.width();
        let count = self.gallery.len();
        let cells = layout::grid_cells(w, self.scroll, count);
        if let Some(first) = cells.first() {
            self.section_heading(canvas, COLLECTION_HEADING, first.x, layout::section_top(self.scroll), w);
        }

        let hovered = self.hovered_cell();
        let cache = self.cache();
        for (index, cell) in cells.iter().enumerate() {
            if cell.bottom() < 0.0 || cell.y > canvas.height() {
                continue;
            }
            let hot = hovered == Some(index);
            canvas.fill(*cell, WHITE);

            if let Some(thumb) = cache.get_thumbnail(index) {
                let (tw, th) = (thumb.width as f32, thumb.height as f32);
                let zoom = if hot { 1.1 } else { 1.0 };
                let scale = cover_scale(tw, th, cell.w, cell.h) * zoom;
                let dst = Rect::new(
                    cell.x + (cell.w - tw * scale) / 2.0,
                    cell.y + (cell.h - th * scale) / 2.0,
                    tw * scale,
                    th * scale,
                );
                let style = BlitStyle {
                    grayscale: !hot,
                    opacity: if hot { 255 } else { 204 },
                };
                canvas.blit(&thumb.rgba_bytes, thumb.width, thumb.height, dst, cell.inset(1.0), style);
            } else {
                let label = if cache.thumbnail_errors.contains(&index) { "UNAVAILABLE" } else { "LOADING..." };
                canvas.text(label, cell.x + 16.0, cell.y + cell.h / 2.0, 1, INK_FAINT);
            }

            if hot {
                let band = Rect::new(cell.x, cell.bottom() - 72.0, cell.w, 72.0);
                canvas.fill(band, (BG.0, BG.1, BG.2, 220));
                canvas.text(&format!("PERSPECTIVE {}", index + 1), band.x + 24.0, band.y + 18.0, 1, INK_MUTED);
                canvas.text("VIEW FULL SIZE", band.x + 24.0, band.y + 36.0, self.text_scale, INK);
                canvas.outline(*cell, 1.0, INK);
            } else {
                canvas.outline(*cell, 1.0, BORDER);
            }
        }
    }

    fn draw_about(&self, canvas: &mut Canvas) {
        let s = self.text_scale;
        let about = layout::about(canvas.width(), self.scroll);
        let text = about.text;
        let portrait = about.portrait;
        let (mx, my) = self.mouse_pos;
        let hot = portrait.contains(mx, my);

        canvas.fill(portrait.inset(-12.0), (191, 219, 254, 90));
        canvas.fill(portrait, WHITE);
        let portrait_img = self.cache().get_thumbnail(self.gallery.portrait_index());
        if let Some(img) = portrait_img {
            let (iw, ih) = (img.width as f32, img.height as f32);
            let frame = portrait.inset(4.0);
            let scale = cover_scale(iw, ih, frame.w, frame.h) * 1.1;
            let dst = Rect::new(
                frame.x + (frame.w - iw * scale) / 2.0,
                frame.y + (frame.h - ih * scale) / 2.0,
                iw * scale,
                ih * scale,
            );
            let style = BlitStyle {
                grayscale: !hot,
                opacity: 255,
            };
            canvas.blit(&img.rgba_bytes, img.width, img.height, dst, frame, style);
        }
        canvas.outline(portrait, 2.0, INK_FAINT);

        self.section_heading(canvas, PROFILE_HEADING, text.x, text.y, 96.0);
        let mut y = canvas.paragraph(ABOUT_HEADLINE, text.x, text.y + 32.0, text.w, s + 1, INK);
        y = canvas.paragraph(ABOUT_BODY, text.x, y + 20.0, text.w.min(640.0), s, INK_MUTED);

        let col_w = (text.w / ABOUT_COLUMNS.len() as f32).floor();
        let max_chars = (((col_w - 16.0) / ADVANCE as f32) as usize).max(1);
        let line_h = (GLYPH_H + 7) as f32;
        for (i, (title, items)) in ABOUT_COLUMNS.iter().enumerate() {
            let cx = text.x + i as f32 * col_w;
            canvas.text(title, cx, y + 32.0, 1, INK_MUTED);
            for (j, item) in items.iter().enumerate() {
                let label: String = item.chars().take(max_chars).collect();
                canvas.text(&label, cx, y + 52.0 + j as f32 * line_h, 1, INK);
            }
        }
    }

    fn draw_contact(&self, canvas: &mut Canvas) {
        let s = self.text_scale;
        let form = layout::contact(canvas.width(), self.scroll);
        self.section_heading(
            canvas,
            CONTACT_HEADING,
            form.name.x,
            layout::section_top(self.scroll),
            form.message.w,
        );

        let fields = [
            (Field::Name, "NAME", "Enter your name", form.name),
            (Field::Email, "EMAIL ADDRESS", "Enter your email", form.email),
            (Field::Message, "MESSAGE", "How can I help you?", form.message),
        ];
        for (field, label, placeholder, rect) in fields {
            let focused = self.form.focus == Some(field);
            canvas.text(label, rect.x, rect.y - 16.0, 1, INK_MUTED);
            let value = self.form.value(field);
            let max_chars = (rect.w / (ADVANCE * s) as f32) as usize;
            if value.is_empty() && !focused {
                canvas.text(placeholder, rect.x, rect.y + 12.0, s, INK_FAINT);
            } else {
                let mut lines: Vec<String> = value.split('\n').flat_map(|l| {
                    let wrapped = wrap_text(l, max_chars);
                    if wrapped.is_empty() { vec![String::new()] } else { wrapped }
                }).collect();
                let visible = ((rect.h - 12.0) / ((GLYPH_H + 4) * s) as f32).max(1.0) as usize;
                let hidden = lines.len().saturating_sub(visible);
                lines.drain(..hidden);
                if focused {
                    if let Some(last) = lines.last_mut() {
                        last.push('_');
                    }
                }
                let mut y = rect.y + 12.0;
                for line in &lines {
                    canvas.text(line, rect.x, y, s, INK);
                    y += ((GLYPH_H + 4) * s) as f32;
                }
            }
            let rule = if focused { INK } else { INK_FAINT };
            canvas.fill(Rect::new(rect.x, rect.bottom() - 1.0, rect.w, 1.0), rule);
        }

        canvas.fill(form.send, INK);
        let label = "SEND MESSAGE";
        canvas.text(
            label,
            form.send.x + (form.send.w - text_width(label, 1)) / 2.0,
            form.send.y + (form.send.h - GLYPH_H as f32) / 2.0,
            1,
            WHITE,
        );

        let (x, y) = form.direct_line;
        canvas.fill(Rect::new(x, y - 40.0, form.message.w, 1.0), BORDER);
        canvas.text(DIRECT_LINE_HEADING, x, y, 1, INK_MUTED);
        canvas.text(&self.email, x, y + 20.0, s + 1, INK);
    }

    fn draw_lightbox(&self, canvas: &mut Canvas) {
        let (w, h) = (canvas.width(), canvas.height());
        let lb = layout::lightbox(w, h);
        let Some(index) = self.viewer.selected() else { return };
        let zoomed = self.viewer.is_zoomed();

        canvas.fill(Rect::new(0.0, 0.0, w, h), (BG.0, BG.1, BG.2, 250));

        match self.lightbox_source() {
            Some((img, full)) => {
                let pan = self.viewer.pan();
                let dst = layout::lightbox_image(
                    w,
                    h,
                    img.width as f32,
                    img.height as f32,
                    self.viewer.zoom(),
                    (pan.x, pan.y),
                );
                let screen = Rect::new(0.0, 0.0, w, h);
                canvas.fill(dst, WHITE);
                canvas.blit(&img.rgba_bytes, img.width, img.height, dst, screen, BlitStyle::default());
                canvas.outline(dst, 1.0, BORDER);
                if !full {
                    canvas.text("LOADING...", w / 2.0 - 30.0, dst.bottom() + 12.0, 1, INK_MUTED);
                }
            }
            None => {
                let error = self.cache().errors.get(&index).cloned();
                match error {
                    Some(err) => {
                        let msg = format!("Could not load: {}", err);
                        canvas.paragraph(&msg, w * 0.15, h / 2.0, w * 0.7, 1, ERROR);
                    }
                    None => {
                        canvas.text("LOADING...", w / 2.0 - 30.0, h / 2.0, self.text_scale, INK_MUTED);
                    }
                }
            }
        }

        // Controls
        let (mx, my) = self.mouse_pos;
        let hover_fill = (0, 0, 0, 13);
        for r in [lb.close, lb.prev, lb.next] {
            if r.contains(mx, my) {
                canvas.fill(r, hover_fill);
            }
        }
        let c = lb.close.inset(14.0);
        canvas.line((c.x, c.y), (c.right(), c.bottom()), 1.5, INK);
        canvas.line((c.right(), c.y), (c.x, c.bottom()), 1.5, INK);

        let p = lb.prev.inset(20.0);
        canvas.line((p.right(), p.y), (p.x + p.w / 4.0, p.y + p.h / 2.0), 1.5, INK);
        canvas.line((p.x + p.w / 4.0, p.y + p.h / 2.0), (p.right(), p.bottom()), 1.5, INK);

        let n = lb.next.inset(20.0);
        canvas.line((n.x, n.y), (n.right() - n.w / 4.0, n.y + n.h / 2.0), 1.5, INK);
        canvas.line((n.right() - n.w / 4.0, n.y + n.h / 2.0), (n.x, n.bottom()), 1.5, INK);

        let critique_color = if self.critique_enabled { INK } else { INK_FAINT };
        canvas.outline(lb.critique, 1.0, critique_color);
        canvas.text(
            "CRITIQUE",
            lb.critique.x + (lb.critique.w - text_width("CRITIQUE", 1)) / 2.0,
            lb.critique.y + (lb.critique.h - GLYPH_H as f32) / 2.0,
            1,
            critique_color,
        );

        if w >= 768.0 {
            let hint = self.viewer.zoom_label().to_uppercase();
            let hx = lb.critique.x - 24.0 - text_width(&hint, 1);
            canvas.text(&hint, hx, lb.critique.y + 18.0, 1, INK_MUTED);
        }

        if zoomed {
            return;
        }

        if let (Some(entry), Some(position)) = (self.viewer.entry_label(), self.viewer.position_label()) {
            let entry = entry.to_uppercase();
            canvas.text(&entry, 48.0, lb.labels_y, 1, INK_MUTED);
            canvas.text(&position, w - 48.0 - text_width(&position, 1), lb.labels_y, 1, INK_MUTED);
        }
        if let Some((img, true)) = self.lightbox_source() {
            let info = format!(
                "{} {}X{} {:.1} MB",
                img.format_name,
                img.width,
                img.height,
                img.file_size as f64 / (1024.0 * 1024.0)
            );
            canvas.text(&info, 48.0, lb.labels_y - 16.0, 1, INK_FAINT);
        }

        if let Some(status) = self.critiques.get(&index) {
            self.draw_critique_panel(canvas, lb.panel, status);
        }
    }

    fn draw_critique_panel(&self, canvas: &mut Canvas, panel: Rect, status: &CritiqueStatus) {
        canvas.fill(panel, (255, 255, 255, 235));
        canvas.outline(panel, 1.0, BORDER);
        let inner = panel.inset(16.0);
        match status {
            CritiqueStatus::Pending => {
                canvas.text("CONSULTING THE CURATOR...", inner.x, inner.y, 1, INK_MUTED);
            }
            CritiqueStatus::Unavailable => {
                canvas.text("NO CRITIQUE AVAILABLE", inner.x, inner.y, 1, INK_MUTED);
            }
            CritiqueStatus::Ready(c) => {
                let line_h = (GLYPH_H + 5) as f32;
                let max_chars = (inner.w / ADVANCE as f32) as usize;
                let mut y = inner.y;
                canvas.text(&format!("MOOD: {}", c.mood.to_uppercase()), inner.x, y, 1, INK);
                y += line_h * 1.5;

                let budget = ((inner.bottom() - y) / line_h) as usize;
                let context_lines = wrap_text(&c.historical_context, max_chars);
                let critique_lines = wrap_text(&c.critique, max_chars);
                let context_n = context_lines.len().min(budget / 3).max(1).min(budget);
                let critique_n = budget.saturating_sub(context_n + 1);

                for line in truncate_lines(critique_lines, critique_n) {
                    canvas.text(&line, inner.x, y, 1, INK);
                    y += line_h;
                }
                y += line_h / 2.0;
                for line in truncate_lines(context_lines, context_n) {
                    canvas.text(&line, inner.x, y, 1, INK_MUTED);
                    y += line_h;
                }
            }
        }
    }
}

/// Keeps at most `max` lines, marking a cut with a trailing ellipsis.
fn truncate_lines(mut lines: Vec<String>, max: usize) -> Vec<String> {
    if lines.len() > max {
        lines.truncate(max);
        if let Some(last) = lines.last_mut() {
            last.push_str("...");
        }
    }
    lines
}
