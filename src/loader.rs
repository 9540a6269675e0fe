use image::GenericImageView;
use reqwest::blocking::Client;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use thiserror::Error;
use winit::event_loop::EventLoopProxy;

use crate::critique::CuratorResponse;
use crate::gallery::is_remote;

/// Bounding box for grid thumbnails and the portrait.
pub const THUMBNAIL_SIZE: (u32, u32) = (480, 600);

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

// ---------------------------------------------------------------------------
// Decoded image data
// ---------------------------------------------------------------------------

pub struct DecodedImage {
    pub rgba_bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
    pub format_name: String,
}

impl DecodedImage {
    pub fn mem_size(&self) -> u64 {
        self.rgba_bytes.len() as u64
    }
}

/// Reads a source: HTTP(S) locations through `client`, anything else from disk.
pub fn fetch_bytes(client: &Client, source: &str) -> Result<Vec<u8>, LoadError> {
    if is_remote(source) {
        let response = client.get(source).send()?.error_for_status()?;
        Ok(response.bytes()?.to_vec())
    } else {
        Ok(fs::read(source)?)
    }
}

pub fn decode_image(bytes: &[u8], target_size: Option<(u32, u32)>) -> Result<DecodedImage, LoadError> {
    let format_name = image::guess_format(bytes)
        .ok()
        .and_then(|f| f.extensions_str().first().copied())
        .unwrap_or("unknown")
        .to_uppercase();

    let img = image::load_from_memory(bytes)?;
    let img = match target_size {
        Some((w, h)) => img.thumbnail(w, h),
        None => img,
    };

    let (width, height) = img.dimensions();
    Ok(DecodedImage {
        rgba_bytes: img.to_rgba8().into_raw(),
        width,
        height,
        file_size: bytes.len() as u64,
        format_name,
    })
}

/// Distance between two slots on a circular list of `len` entries.
pub fn circular_distance(a: usize, b: usize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let d = a.abs_diff(b) % len;
    d.min(len - d)
}

// ---------------------------------------------------------------------------
// Cache state (shared between UI and worker threads via Mutex + Condvar)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkType {
    Full,
    Thumbnail,
}

pub struct CacheState {
    /// Last image shown in the lightbox; prefetch distances are measured from it.
    pub current_idx: usize,
    /// Whether the lightbox is open.
    pub viewing: bool,

    pub images: HashMap<usize, Arc<DecodedImage>>,
    pub thumbnails: HashMap<usize, Arc<DecodedImage>>,

    pub in_progress: HashSet<(usize, WorkType)>,
    pub errors: HashMap<usize, String>,
    pub thumbnail_errors: HashSet<usize>,

    pub used_bytes: u64,
    pub budget: u64,
    /// Gallery items; full images are only loaded for these.
    pub item_count: usize,
    /// Gallery items plus the portrait slot.
    pub slot_count: usize,

    /// Indices that were decoded but couldn't be kept (cache full, too far).
    pub saturated: HashSet<usize>,
}

pub type SharedState = Arc<(Mutex<CacheState>, Condvar)>;

impl CacheState {
    pub fn new(budget: u64, item_count: usize, slot_count: usize) -> Self {
        Self {
            current_idx: 0,
            viewing: false,
            images: HashMap::new(),
            thumbnails: HashMap::new(),
            in_progress: HashSet::new(),
            errors: HashMap::new(),
            thumbnail_errors: HashSet::new(),
            used_bytes: 0,
            budget,
            item_count,
            slot_count,
            saturated: HashSet::new(),
        }
    }

    /// Tracks the lightbox selection. `None` means the lightbox is closed.
    pub fn set_selection(&mut self, selected: Option<usize>) {
        match selected {
            Some(idx) => {
                if idx != self.current_idx {
                    self.current_idx = idx;
                    self.saturated.clear();
                }
                self.viewing = true;
            }
            None => self.viewing = false,
        }
    }

    pub fn get(&self, idx: usize) -> Option<Arc<DecodedImage>> {
        self.images.get(&idx).cloned()
    }

    pub fn get_thumbnail(&self, idx: usize) -> Option<Arc<DecodedImage>> {
        self.thumbnails.get(&idx).cloned()
    }

    fn distance(&self, idx: usize) -> usize {
        circular_distance(idx, self.current_idx, self.item_count)
    }

    /// Average decoded image size in bytes (fallback: ~8 MB).
    fn avg_image_size(&self) -> u64 {
        if self.images.is_empty() {
            8 * 1024 * 1024
        } else {
            self.used_bytes.max(1) / self.images.len() as u64
        }
    }

    pub fn is_available(&self, idx: usize, wtype: WorkType) -> bool {
        if self.in_progress.contains(&(idx, wtype)) {
            return false;
        }
        match wtype {
            WorkType::Full => {
                idx < self.item_count
                    && !self.images.contains_key(&idx)
                    && !self.errors.contains_key(&idx)
                    && !self.saturated.contains(&idx)
            }
            WorkType::Thumbnail => {
                idx < self.slot_count
                    && !self.thumbnails.contains_key(&idx)
                    && !self.thumbnail_errors.contains(&idx)
            }
        }
    }

    fn farthest_cached(&self) -> Option<(usize, usize)> {
        self.images
            .keys()
            .filter(|&&i| i != self.current_idx)
            .map(|&i| (i, self.distance(i)))
            .max_by_key(|&(_, d)| d)
    }

    /// Picks the next unit of work:
    /// the open image, then thumbnails in grid order, then neighbours of the open image.
    pub fn find_work(&self) -> Option<(usize, WorkType)> {
        if self.viewing && self.is_available(self.current_idx, WorkType::Full) {
            return Some((self.current_idx, WorkType::Full));
        }

        if let Some(idx) = (0..self.slot_count).find(|&i| self.is_available(i, WorkType::Thumbnail)) {
            return Some((idx, WorkType::Thumbnail));
        }

        if !self.viewing || self.item_count < 2 {
            return None;
        }

        let avg = self.avg_image_size();
        let pending = self
            .in_progress
            .iter()
            .filter(|(_, t)| *t == WorkType::Full)
            .count() as u64
            * avg;
        let over_budget = self.used_bytes + pending + avg > self.budget;
        let farthest = if over_budget {
            self.farthest_cached().map(|(_, d)| d).unwrap_or(0)
        } else {
            usize::MAX
        };

        // Forward neighbour first at each distance; browsing usually moves forward.
        for dist in 1..=self.item_count / 2 {
            if dist >= farthest {
                break;
            }
            let fwd = (self.current_idx + dist) % self.item_count;
            let bwd = (self.current_idx + self.item_count - dist) % self.item_count;
            for idx in [fwd, bwd] {
                if self.is_available(idx, WorkType::Full) {
                    return Some((idx, WorkType::Full));
                }
            }
        }
        None
    }

    pub fn insert(&mut self, idx: usize, decoded: DecodedImage, wtype: WorkType) {
        match wtype {
            WorkType::Full => {
                if idx != self.current_idx && self.used_bytes + decoded.mem_size() > self.budget {
                    let farthest = self.farthest_cached().map(|(_, d)| d).unwrap_or(0);
                    if self.distance(idx) >= farthest {
                        self.saturated.insert(idx);
                        return;
                    }
                }
                if let Some(old) = self.images.remove(&idx) {
                    self.used_bytes -= old.mem_size();
                }
                self.used_bytes += decoded.mem_size();
                self.images.insert(idx, Arc::new(decoded));
                self.evict_distant();
            }
            WorkType::Thumbnail => {
                self.thumbnails.insert(idx, Arc::new(decoded));
            }
        }
    }

    pub fn record_error(&mut self, idx: usize, wtype: WorkType, message: String) {
        match wtype {
            WorkType::Full => {
                self.errors.insert(idx, message);
            }
            WorkType::Thumbnail => {
                self.thumbnail_errors.insert(idx);
            }
        }
    }

    fn evict_distant(&mut self) {
        while self.used_bytes > self.budget && self.images.len() > 1 {
            let Some((evict_idx, _)) = self.farthest_cached() else {
                break;
            };
            if let Some(img) = self.images.remove(&evict_idx) {
                log::debug!("[cache] evict {}", evict_idx);
                self.used_bytes -= img.mem_size();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// User events for waking the UI from background threads
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum UserEvent {
    ImageReady(usize),
    ThumbnailReady(usize),
    CritiqueReady {
        index: usize,
        critique: Option<CuratorResponse>,
    },
}

// ---------------------------------------------------------------------------
// Background decode workers
// ---------------------------------------------------------------------------

pub fn spawn_decode_workers(
    shared: SharedState,
    sources: Arc<Vec<String>>,
    client: Client,
    proxy: EventLoopProxy<UserEvent>,
    num_threads: usize,
) {
    for _ in 0..num_threads {
        let shared = Arc::clone(&shared);
        let sources = Arc::clone(&sources);
        let client = client.clone();
        let proxy = proxy.clone();
        thread::spawn(move || {
            loop {
                let (idx, wtype) = {
                    let (lock, cvar) = &*shared;
                    let Ok(mut state) = lock.lock() else { return };
                    loop {
                        if let Some(work) = state.find_work() {
                            state.in_progress.insert(work);
                            break work;
                        }
                        state = match cvar.wait(state) {
                            Ok(state) => state,
                            Err(_) => return,
                        };
                    }
                };

                let Some(source) = sources.get(idx) else {
                    if let Ok(mut state) = shared.0.lock() {
                        state.in_progress.remove(&(idx, wtype));
                    }
                    continue;
                };

                let target_size = match wtype {
                    WorkType::Full => None,
                    WorkType::Thumbnail => Some(THUMBNAIL_SIZE),
                };
                log::debug!("[worker] load {} ({:?}) from {}", idx, wtype, source);
                let result =
                    fetch_bytes(&client, source).and_then(|bytes| decode_image(&bytes, target_size));

                {
                    let (lock, cvar) = &*shared;
                    let Ok(mut state) = lock.lock() else { return };
                    state.in_progress.remove(&(idx, wtype));
                    match result {
                        Ok(decoded) => state.insert(idx, decoded, wtype),
                        Err(e) => {
                            log::warn!("Could not load {}: {}", source, e);
                            state.record_error(idx, wtype, format!("{}: {}", source, e));
                        }
                    }
                    cvar.notify_all();
                }

                let event = match wtype {
                    WorkType::Full => UserEvent::ImageReady(idx),
                    WorkType::Thumbnail => UserEvent::ThumbnailReady(idx),
                };
                if proxy.send_event(event).is_err() {
                    // Event loop is gone.
                    return;
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    const MB: u64 = 1024 * 1024;

    fn fake_image(bytes: u64) -> DecodedImage {
        DecodedImage {
            rgba_bytes: vec![0; bytes as usize],
            width: 1,
            height: 1,
            file_size: bytes,
            format_name: "PNG".to_string(),
        }
    }

    fn with_all_thumbnails(mut state: CacheState) -> CacheState {
        for i in 0..state.slot_count {
            state.insert(i, fake_image(16), WorkType::Thumbnail);
        }
        state
    }

    #[test]
    fn circular_distance_wraps() {
        assert_eq!(circular_distance(0, 7, 8), 1);
        assert_eq!(circular_distance(2, 6, 8), 4);
        assert_eq!(circular_distance(3, 3, 8), 0);
        assert_eq!(circular_distance(1, 0, 0), 0);
    }

    #[test]
    fn thumbnails_come_first_while_closed() {
        let state = CacheState::new(100 * MB, 4, 5);
        assert_eq!(state.find_work(), Some((0, WorkType::Thumbnail)));

        let state = with_all_thumbnails(CacheState::new(100 * MB, 4, 5));
        assert_eq!(state.find_work(), None);
    }

    #[test]
    fn open_image_has_priority() {
        let mut state = CacheState::new(100 * MB, 8, 9);
        state.set_selection(Some(5));
        assert_eq!(state.find_work(), Some((5, WorkType::Full)));

        state.in_progress.insert((5, WorkType::Full));
        assert_eq!(state.find_work(), Some((0, WorkType::Thumbnail)));
    }

    #[test]
    fn portrait_slot_gets_only_a_thumbnail() {
        let mut state = CacheState::new(100 * MB, 2, 3);
        assert!(state.is_available(2, WorkType::Thumbnail));
        assert!(!state.is_available(2, WorkType::Full));
        state.set_selection(Some(1));
        state.insert(0, fake_image(16), WorkType::Thumbnail);
        state.insert(1, fake_image(16), WorkType::Thumbnail);
        state.in_progress.insert((1, WorkType::Full));
        assert_eq!(state.find_work(), Some((2, WorkType::Thumbnail)));
    }

    #[test]
    fn neighbours_prefetch_circularly() {
        let mut state = with_all_thumbnails(CacheState::new(100 * MB, 8, 9));
        state.set_selection(Some(0));
        state.insert(0, fake_image(MB), WorkType::Full);
        assert_eq!(state.find_work(), Some((1, WorkType::Full)));
        state.insert(1, fake_image(MB), WorkType::Full);
        assert_eq!(state.find_work(), Some((7, WorkType::Full)));
    }

    #[test]
    fn no_prefetch_while_closed() {
        let mut state = with_all_thumbnails(CacheState::new(100 * MB, 8, 9));
        state.set_selection(Some(0));
        state.set_selection(None);
        assert_eq!(state.find_work(), None);
    }

    #[test]
    fn eviction_drops_farthest_image() {
        let mut state = CacheState::new(3 * MB, 8, 9);
        state.set_selection(Some(0));
        state.insert(0, fake_image(MB), WorkType::Full);
        state.insert(1, fake_image(MB), WorkType::Full);
        state.insert(4, fake_image(MB), WorkType::Full);
        assert_eq!(state.used_bytes, 3 * MB);

        // Moving next to 4 makes 1 the farthest.
        state.set_selection(Some(5));
        state.insert(5, fake_image(MB), WorkType::Full);
        assert!(!state.images.contains_key(&1));
        assert!(state.images.contains_key(&4));
        assert!(state.images.contains_key(&5));
        assert_eq!(state.used_bytes, 3 * MB);
    }

    #[test]
    fn far_image_is_saturated_when_full() {
        let mut state = CacheState::new(2 * MB, 8, 9);
        state.set_selection(Some(0));
        state.insert(0, fake_image(MB), WorkType::Full);
        state.insert(1, fake_image(MB), WorkType::Full);
        state.insert(3, fake_image(MB), WorkType::Full);
        assert!(state.saturated.contains(&3));
        assert!(!state.images.contains_key(&3));
        assert!(!state.is_available(3, WorkType::Full));

        state.set_selection(Some(3));
        assert!(state.saturated.is_empty());
    }

    #[test]
    fn errors_block_retries() {
        let mut state = CacheState::new(100 * MB, 2, 3);
        state.set_selection(Some(0));
        state.record_error(0, WorkType::Full, "boom".to_string());
        state.record_error(0, WorkType::Thumbnail, "boom".to_string());
        assert!(!state.is_available(0, WorkType::Full));
        assert!(!state.is_available(0, WorkType::Thumbnail));
        assert_eq!(state.errors.get(&0).map(String::as_str), Some("boom"));
    }

    #[test]
    fn decode_png_and_thumbnail() {
        let img = RgbaImage::from_pixel(40, 20, Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();

        let full = decode_image(&bytes, None).unwrap();
        assert_eq!((full.width, full.height), (40, 20));
        assert_eq!(full.format_name, "PNG");
        assert_eq!(full.mem_size(), 40 * 20 * 4);
        assert_eq!(&full.rgba_bytes[..4], &[10, 20, 30, 255]);

        let thumb = decode_image(&bytes, Some((10, 10))).unwrap();
        assert_eq!((thumb.width, thumb.height), (10, 5));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(decode_image(b"not an image", None), Err(LoadError::Decode(_))));
    }

    #[test]
    fn fetch_reads_local_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.bin");
        fs::write(&path, b"abc").unwrap();
        let client = Client::new();
        let bytes = fetch_bytes(&client, &path.display().to_string()).unwrap();
        assert_eq!(bytes, b"abc");
        assert!(matches!(
            fetch_bytes(&client, &dir.path().join("missing").display().to_string()),
            Err(LoadError::Io(_))
        ));
    }
}
