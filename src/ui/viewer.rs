//! Lightbox controller: selection, zoom and pan over a circular list of images.
//!
//! All transitions are synchronous and driven from window event handlers.
//! The selection is a tagged union so that a zoom, pan or drag can only
//! exist while an image is open.

use winit::keyboard::{Key, NamedKey};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const MIN_ZOOM: f32 = 1.0;
pub const MAX_ZOOM: f32 = 5.0;

/// Zoom change per unit of wheel delta (browser-style pixels, down is positive).
pub const WHEEL_ZOOM_SCALE: f32 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Zoom factor, always within `[MIN_ZOOM, MAX_ZOOM]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zoom(f32);

impl Zoom {
    /// Creates a zoom factor, clamping to the valid range.
    #[must_use]
    pub fn new(factor: f32) -> Self {
        Self(factor.clamp(MIN_ZOOM, MAX_ZOOM))
    }

    #[must_use]
    pub fn value(self) -> f32 {
        self.0
    }

    /// Whether the image is magnified past its fitted size.
    #[must_use]
    pub fn is_zoomed(self) -> bool {
        self.0 > MIN_ZOOM
    }

    /// Applies a wheel delta. Negative deltas (scrolling up) zoom in.
    #[must_use]
    pub fn apply_wheel(self, delta_y: f32) -> Self {
        Self::new(self.0 - delta_y * WHEEL_ZOOM_SCALE)
    }
}

impl Default for Zoom {
    fn default() -> Self {
        Self(MIN_ZOOM)
    }
}

/// Zoom, pan and drag of the open image.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    pub zoom: Zoom,
    pub pan: Point,
    /// Set while dragging: pointer position minus pan at drag start.
    pub drag_anchor: Option<Point>,
}

impl Transform {
    fn zoom_by(&mut self, delta_y: f32) {
        self.zoom = self.zoom.apply_wheel(delta_y);
        if self.zoom.value() == MIN_ZOOM {
            self.pan = Point::ORIGIN;
            self.drag_anchor = None;
        }
    }

    fn begin_pan(&mut self, pointer: Point) {
        if !self.zoom.is_zoomed() {
            return;
        }
        self.drag_anchor = Some(Point::new(pointer.x - self.pan.x, pointer.y - self.pan.y));
    }

    fn update_pan(&mut self, pointer: Point) {
        if let Some(anchor) = self.drag_anchor {
            self.pan = Point::new(pointer.x - anchor.x, pointer.y - anchor.y);
        }
    }
}

/// Input grab held while the lightbox is open.
///
/// Keyboard and wheel input are only routed to the viewer while one exists,
/// and page scrolling is suppressed for its lifetime. It is created on the
/// transition to open and dropped on close or teardown.
#[derive(Debug, PartialEq)]
pub struct InputGrab {
    _private: (),
}

impl InputGrab {
    fn acquire() -> Self {
        log::debug!("[viewer] input grabbed, page scroll suppressed");
        Self { _private: () }
    }
}

impl Drop for InputGrab {
    fn drop(&mut self) {
        log::debug!("[viewer] input released, page scroll restored");
    }
}

#[derive(Debug, PartialEq, Default)]
pub enum Selection {
    #[default]
    Closed,
    Open {
        index: usize,
        transform: Transform,
        grab: InputGrab,
    },
}

// ---------------------------------------------------------------------------
// Viewer
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
pub struct Viewer {
    len: usize,
    selection: Selection,
}

impl Viewer {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            selection: Selection::Closed,
        }
    }

    pub fn selected(&self) -> Option<usize> {
        match self.selection {
            Selection::Open { index, .. } => Some(index),
            Selection::Closed => None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.selected().is_some()
    }

    pub fn grab(&self) -> Option<&InputGrab> {
        match &self.selection {
            Selection::Open { grab, .. } => Some(grab),
            Selection::Closed => None,
        }
    }

    /// Transform of the open image; the identity transform while closed.
    pub fn transform(&self) -> Transform {
        match self.selection {
            Selection::Open { transform, .. } => transform,
            Selection::Closed => Transform::default(),
        }
    }

    pub fn zoom(&self) -> f32 {
        self.transform().zoom.value()
    }

    pub fn pan(&self) -> Point {
        self.transform().pan
    }

    pub fn is_zoomed(&self) -> bool {
        self.transform().zoom.is_zoomed()
    }

    pub fn is_dragging(&self) -> bool {
        self.transform().drag_anchor.is_some()
    }

    pub fn open(&mut self, index: usize) {
        if index >= self.len {
            log::warn!("[viewer] ignoring open of index {} (len {})", index, self.len);
            return;
        }
        log::debug!("[viewer] open {}", index);
        match &mut self.selection {
            // Keep the existing grab rather than releasing and re-acquiring it.
            Selection::Open {
                index: current,
                transform,
                ..
            } => {
                *current = index;
                *transform = Transform::default();
            }
            Selection::Closed => {
                self.selection = Selection::Open {
                    index,
                    transform: Transform::default(),
                    grab: InputGrab::acquire(),
                };
            }
        }
    }

    pub fn close(&mut self) {
        if self.is_open() {
            log::debug!("[viewer] close");
        }
        self.selection = Selection::Closed;
    }

    pub fn next(&mut self) {
        self.step(1);
    }

    pub fn previous(&mut self) {
        self.step(-1);
    }

    fn step(&mut self, delta: isize) {
        let len = self.len;
        if let Selection::Open {
            index, transform, ..
        } = &mut self.selection
        {
            let next = (*index as isize + delta).rem_euclid(len as isize) as usize;
            log::debug!("[viewer] move {} -> {}", index, next);
            *index = next;
            *transform = Transform::default();
        }
    }

    /// Applies a wheel delta to the zoom of the open image.
    pub fn zoom_by(&mut self, delta_y: f32) {
        if let Some(transform) = self.transform_mut() {
            transform.zoom_by(delta_y);
        }
    }

    pub fn begin_pan(&mut self, x: f32, y: f32) {
        if let Some(transform) = self.transform_mut() {
            transform.begin_pan(Point::new(x, y));
        }
    }

    pub fn update_pan(&mut self, x: f32, y: f32) {
        if let Some(transform) = self.transform_mut() {
            transform.update_pan(Point::new(x, y));
        }
    }

    pub fn end_pan(&mut self) {
        if let Some(transform) = self.transform_mut() {
            transform.drag_anchor = None;
        }
    }

    /// Dispatches a key press. Returns true if the key was consumed.
    pub fn handle_key(&mut self, key: &Key) -> bool {
        if self.grab().is_none() {
            return false;
        }
        match key {
            Key::Named(NamedKey::Escape) => self.close(),
            Key::Named(NamedKey::ArrowRight) => self.next(),
            Key::Named(NamedKey::ArrowLeft) => self.previous(),
            _ => return false,
        }
        true
    }

    fn transform_mut(&mut self) -> Option<&mut Transform> {
        match &mut self.selection {
            Selection::Open { transform, .. } => Some(transform),
            Selection::Closed => None,
        }
    }

    // -- labels --------------------------------------------------------------

    pub fn zoom_label(&self) -> String {
        if self.is_zoomed() {
            format!("Zoom: {}%", (self.zoom() * 100.0).round() as u32)
        } else {
            "Scroll to Zoom - Drag to Pan".to_string()
        }
    }

    pub fn position_label(&self) -> Option<String> {
        self.selected().map(|i| format!("{} / {}", i + 1, self.len))
    }

    pub fn entry_label(&self) -> Option<String> {
        self.selected().map(|i| format!("Archive Entry 0{}", i + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use winit::keyboard::SmolStr;

    fn open_viewer(len: usize, index: usize) -> Viewer {
        let mut viewer = Viewer::new(len);
        viewer.open(index);
        viewer
    }

    #[test]
    fn new_viewer_is_closed() {
        let viewer = Viewer::new(8);
        assert_eq!(viewer.selected(), None);
        assert!(viewer.grab().is_none());
        assert_eq!(viewer.zoom(), 1.0);
        assert_eq!(viewer.pan(), Point::ORIGIN);
    }

    #[test]
    fn next_twice_from_zero() {
        let mut viewer = open_viewer(8, 0);
        viewer.next();
        viewer.next();
        assert_eq!(viewer.selected(), Some(2));
    }

    #[test]
    fn previous_wraps_to_last() {
        let mut viewer = open_viewer(8, 0);
        viewer.previous();
        assert_eq!(viewer.selected(), Some(7));
    }

    #[test]
    fn next_wraps_to_first() {
        let mut viewer = open_viewer(8, 7);
        viewer.next();
        assert_eq!(viewer.selected(), Some(0));
    }

    #[test]
    fn navigation_is_noop_when_closed() {
        let mut viewer = Viewer::new(8);
        viewer.next();
        viewer.previous();
        assert_eq!(viewer, Viewer::new(8));
    }

    #[test]
    fn zoom_saturates_at_max() {
        let mut viewer = open_viewer(8, 0);
        for _ in 0..5 {
            viewer.zoom_by(-2000.0);
        }
        assert_eq!(viewer.zoom(), 5.0);
    }

    #[test]
    fn zoom_out_to_min_resets_pan() {
        let mut viewer = open_viewer(8, 0);
        viewer.zoom_by(-2000.0);
        viewer.begin_pan(10.0, 10.0);
        viewer.update_pan(60.0, -20.0);
        assert_eq!(viewer.pan(), Point::new(50.0, -30.0));

        viewer.zoom_by(10_000.0);
        assert_eq!(viewer.zoom(), 1.0);
        assert_eq!(viewer.pan(), Point::ORIGIN);
        assert!(!viewer.is_dragging());
    }

    #[test]
    fn zoom_is_ignored_while_closed() {
        let mut viewer = Viewer::new(8);
        viewer.zoom_by(-2000.0);
        assert_eq!(viewer.zoom(), 1.0);
        assert!(!viewer.is_open());
    }

    #[test]
    fn pan_follows_pointer_at_max_zoom() {
        let mut viewer = open_viewer(8, 0);
        viewer.zoom_by(-4000.0);
        assert_eq!(viewer.zoom(), 5.0);
        viewer.begin_pan(100.0, 100.0);
        viewer.update_pan(130.0, 145.0);
        assert_eq!(viewer.pan(), Point::new(30.0, 45.0));
    }

    #[test]
    fn second_drag_continues_from_current_pan() {
        let mut viewer = open_viewer(8, 0);
        viewer.zoom_by(-1000.0);
        viewer.begin_pan(0.0, 0.0);
        viewer.update_pan(20.0, 10.0);
        viewer.end_pan();
        viewer.begin_pan(100.0, 100.0);
        viewer.update_pan(105.0, 100.0);
        assert_eq!(viewer.pan(), Point::new(25.0, 10.0));
    }

    #[test]
    fn pan_is_unbounded() {
        let mut viewer = open_viewer(8, 0);
        viewer.zoom_by(-1000.0);
        viewer.begin_pan(0.0, 0.0);
        viewer.update_pan(1.0e6, -1.0e6);
        assert_eq!(viewer.pan(), Point::new(1.0e6, -1.0e6));
    }

    #[test]
    fn begin_pan_without_zoom_does_nothing() {
        let mut viewer = open_viewer(8, 3);
        let before = viewer.transform();
        viewer.begin_pan(100.0, 100.0);
        assert_eq!(viewer.transform(), before);
        viewer.update_pan(150.0, 150.0);
        assert_eq!(viewer.pan(), Point::ORIGIN);
        assert!(!viewer.is_dragging());
    }

    #[test]
    fn update_pan_without_drag_does_nothing() {
        let mut viewer = open_viewer(8, 0);
        viewer.zoom_by(-1000.0);
        viewer.update_pan(40.0, 40.0);
        assert_eq!(viewer.pan(), Point::ORIGIN);
    }

    #[test]
    fn end_pan_is_safe_when_not_dragging() {
        let mut viewer = open_viewer(8, 0);
        viewer.end_pan();
        assert!(!viewer.is_dragging());
        let mut closed = Viewer::new(8);
        closed.end_pan();
        assert_eq!(closed, Viewer::new(8));
    }

    #[test]
    fn open_resets_transform() {
        let mut viewer = open_viewer(8, 0);
        viewer.zoom_by(-3000.0);
        viewer.begin_pan(0.0, 0.0);
        viewer.update_pan(12.0, 34.0);
        viewer.open(5);
        assert_eq!(viewer.selected(), Some(5));
        assert_eq!(viewer.transform(), Transform::default());
    }

    #[test]
    fn navigation_resets_transform() {
        let mut viewer = open_viewer(8, 2);
        viewer.zoom_by(-3000.0);
        viewer.begin_pan(0.0, 0.0);
        viewer.update_pan(5.0, 5.0);
        viewer.next();
        assert_eq!(viewer.transform(), Transform::default());
        viewer.zoom_by(-3000.0);
        viewer.previous();
        assert_eq!(viewer.transform(), Transform::default());
    }

    #[test]
    fn open_out_of_range_is_ignored() {
        let mut viewer = Viewer::new(3);
        viewer.open(3);
        assert!(!viewer.is_open());
    }

    #[test]
    fn close_is_idempotent() {
        let mut once = open_viewer(8, 4);
        once.zoom_by(-500.0);
        once.close();

        let mut twice = open_viewer(8, 4);
        twice.zoom_by(-500.0);
        twice.close();
        twice.close();

        assert_eq!(once, twice);
        assert_eq!(once.selected(), None);
        assert_eq!(once.transform(), Transform::default());
    }

    #[test]
    fn grab_exists_only_while_open() {
        let mut viewer = open_viewer(8, 0);
        assert!(viewer.grab().is_some());
        viewer.next();
        assert!(viewer.grab().is_some());
        viewer.close();
        assert!(viewer.grab().is_none());
    }

    #[test]
    fn keyboard_bindings() {
        let mut viewer = open_viewer(8, 0);
        assert!(viewer.handle_key(&Key::Named(NamedKey::ArrowRight)));
        assert_eq!(viewer.selected(), Some(1));
        assert!(viewer.handle_key(&Key::Named(NamedKey::ArrowLeft)));
        assert!(viewer.handle_key(&Key::Named(NamedKey::ArrowLeft)));
        assert_eq!(viewer.selected(), Some(7));
        assert!(!viewer.handle_key(&Key::Character(SmolStr::new("x"))));
        assert!(viewer.handle_key(&Key::Named(NamedKey::Escape)));
        assert!(!viewer.is_open());
    }

    #[test]
    fn keys_are_not_consumed_while_closed() {
        let mut viewer = Viewer::new(8);
        assert!(!viewer.handle_key(&Key::Named(NamedKey::ArrowRight)));
        assert!(!viewer.handle_key(&Key::Named(NamedKey::Escape)));
        assert_eq!(viewer.selected(), None);
    }

    #[test]
    fn labels() {
        let mut viewer = open_viewer(8, 2);
        assert_eq!(viewer.position_label().as_deref(), Some("3 / 8"));
        assert_eq!(viewer.entry_label().as_deref(), Some("Archive Entry 03"));
        let mut long = Viewer::new(12);
        long.open(9);
        assert_eq!(long.entry_label().as_deref(), Some("Archive Entry 010"));
        assert_eq!(viewer.zoom_label(), "Scroll to Zoom - Drag to Pan");
        viewer.zoom_by(-1500.0);
        assert_eq!(viewer.zoom_label(), "Zoom: 250%");
    }

    proptest! {
        #[test]
        fn next_and_previous_are_modular(len in 1usize..64, seed in 0usize..64) {
            let start = seed % len;
            let mut viewer = open_viewer(len, start);
            viewer.next();
            prop_assert_eq!(viewer.selected(), Some((start + 1) % len));

            let mut viewer = open_viewer(len, start);
            viewer.previous();
            prop_assert_eq!(viewer.selected(), Some((start + len - 1) % len));
        }

        #[test]
        fn next_len_times_is_identity(len in 1usize..64, seed in 0usize..64) {
            let start = seed % len;
            let mut viewer = open_viewer(len, start);
            for _ in 0..len {
                viewer.next();
            }
            prop_assert_eq!(viewer.selected(), Some(start));
        }

        #[test]
        fn zoom_stays_clamped(deltas in prop::collection::vec(-20_000.0f32..20_000.0, 0..100)) {
            let mut viewer = open_viewer(8, 0);
            for delta in deltas {
                viewer.zoom_by(delta);
                let zoom = viewer.zoom();
                prop_assert!((MIN_ZOOM..=MAX_ZOOM).contains(&zoom));
                if zoom == MIN_ZOOM {
                    prop_assert_eq!(viewer.pan(), Point::ORIGIN);
                    prop_assert!(!viewer.is_dragging());
                }
            }
        }

        #[test]
        fn dragging_implies_zoomed(
            steps in prop::collection::vec((0u8..4, -3000.0f32..3000.0, -500.0f32..500.0), 0..60)
        ) {
            let mut viewer = open_viewer(8, 0);
            for (op, a, b) in steps {
                match op {
                    0 => viewer.zoom_by(a),
                    1 => viewer.begin_pan(a, b),
                    2 => viewer.update_pan(a, b),
                    _ => viewer.end_pan(),
                }
                if viewer.is_dragging() {
                    prop_assert!(viewer.zoom() > MIN_ZOOM);
                }
                if viewer.zoom() == MIN_ZOOM {
                    prop_assert_eq!(viewer.pan(), Point::ORIGIN);
                }
            }
        }
    }
}
