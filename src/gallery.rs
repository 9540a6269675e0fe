use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::content::SHARED_LINKS;

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tga", "tiff", "tif", "webp", "ico", "pnm", "pbm",
    "pgm", "ppm", "pam", "dds", "hdr", "exr", "ff", "qoi",
];

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

// ---------------------------------------------------------------------------
// Gallery model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct GalleryItem {
    pub id: usize,
    pub url: String,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct Gallery {
    pub items: Vec<GalleryItem>,
    pub portrait: String,
}

impl Gallery {
    pub fn from_sources(sources: Vec<String>, portrait: String) -> Self {
        let items = sources
            .into_iter()
            .enumerate()
            .map(|(i, url)| GalleryItem {
                id: i,
                url,
                title: format!("Entry {}", i + 1),
            })
            .collect();
        Self { items, portrait }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Loader slot of the portrait, placed after the gallery items.
    pub fn portrait_index(&self) -> usize {
        self.items.len()
    }

    /// All locations the loader fetches: gallery items then the portrait.
    pub fn sources(&self) -> Vec<String> {
        self.items
            .iter()
            .map(|item| item.url.clone())
            .chain(std::iter::once(self.portrait.clone()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Source collection
// ---------------------------------------------------------------------------

/// Expands command-line sources into an ordered list of image locations.
///
/// URLs are kept as given, image files are kept, directories are scanned.
/// With no sources the built-in collection is used.
pub fn collect_sources(inputs: &[String], recursive: bool, follow_links: bool) -> Vec<String> {
    if inputs.is_empty() {
        return SHARED_LINKS.iter().map(|s| s.to_string()).collect();
    }

    let mut out = Vec::new();
    let mut visited = HashSet::new();
    for input in inputs {
        if is_remote(input) {
            out.push(input.clone());
            continue;
        }

        let path = PathBuf::from(input);
        if !follow_links && is_symlink(&path) {
            log::debug!("Skipping symlink {:?}", path);
            continue;
        }

        if path.is_dir() {
            let mut found = Vec::new();
            scan_dir(&path, recursive, follow_links, &mut visited, &mut found);
            log::info!("Scanned {:?}: {} images", path, found.len());
            out.extend(found.into_iter().map(|p| p.display().to_string()));
        } else if path.is_file() && is_image_file(&path) {
            out.push(input.clone());
        } else {
            log::warn!("Ignoring {:?}: not an image file, directory or URL", path);
        }
    }
    out
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false)
}

/// `visited` holds canonical directories already scanned, so linked loops end.
fn scan_dir(
    dir: &Path,
    recursive: bool,
    follow_links: bool,
    visited: &mut HashSet<PathBuf>,
    dest: &mut Vec<PathBuf>,
) {
    let canonical = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
    if !visited.insert(canonical) {
        log::debug!("Skipping already scanned directory {:?}", dir);
        return;
    }
    let Ok(entries) = fs::read_dir(dir) else {
        log::warn!("Could not read directory {:?}", dir);
        return;
    };
    let mut files = Vec::new();
    let mut subdirs = Vec::new();

    for entry in entries.filter_map(|e| e.ok()) {
        let Ok(ft) = entry.file_type() else { continue };
        if ft.is_symlink() && !follow_links {
            continue;
        }

        let p = entry.path();
        if p.is_file() && is_image_file(&p) {
            files.push(p);
        } else if recursive && p.is_dir() {
            subdirs.push(p);
        }
    }

    files.sort();
    dest.extend(files);

    if recursive {
        subdirs.sort();
        for sub in subdirs {
            scan_dir(&sub, true, follow_links, visited, dest);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn items_are_numbered_in_order() {
        let gallery = Gallery::from_sources(
            vec!["a.png".to_string(), "b.png".to_string()],
            "me.png".to_string(),
        );
        assert_eq!(gallery.len(), 2);
        assert_eq!(gallery.items[1].id, 1);
        assert_eq!(gallery.items[1].title, "Entry 2");
        assert_eq!(gallery.portrait_index(), 2);
        assert_eq!(gallery.sources(), vec!["a.png", "b.png", "me.png"]);
    }

    #[test]
    fn no_inputs_yields_builtin_collection() {
        let sources = collect_sources(&[], false, false);
        assert_eq!(sources.len(), 8);
        assert!(sources.iter().all(|s| is_remote(s)));
    }

    #[test]
    fn image_extension_check_is_case_insensitive() {
        assert!(is_image_file(Path::new("photo.JPG")));
        assert!(is_image_file(Path::new("dir/photo.webp")));
        assert!(!is_image_file(Path::new("notes.txt")));
        assert!(!is_image_file(Path::new("no_extension")));
    }

    #[test]
    fn directory_scan_is_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("b.png")).unwrap();
        File::create(dir.path().join("a.jpg")).unwrap();
        File::create(dir.path().join("readme.md")).unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        File::create(dir.path().join("nested").join("c.gif")).unwrap();

        let input = vec![dir.path().display().to_string()];
        let flat = collect_sources(&input, false, false);
        let names: Vec<_> = flat
            .iter()
            .map(|s| Path::new(s).file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.png"]);

        let deep = collect_sources(&input, true, false);
        assert_eq!(deep.len(), 3);
        assert!(deep[2].ends_with("c.gif"));
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_followed_only_on_request() {
        use std::os::unix::fs::symlink;

        let target = tempfile::tempdir().unwrap();
        File::create(target.path().join("linked.png")).unwrap();
        fs::create_dir(target.path().join("album")).unwrap();
        File::create(target.path().join("album").join("deep.png")).unwrap();

        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("a.png")).unwrap();
        symlink(target.path().join("linked.png"), dir.path().join("b.png")).unwrap();
        symlink(target.path().join("album"), dir.path().join("c_album")).unwrap();

        let input = vec![dir.path().display().to_string()];
        let skipped = collect_sources(&input, true, false);
        assert_eq!(skipped.len(), 1);
        assert!(skipped[0].ends_with("a.png"));

        let followed = collect_sources(&input, true, true);
        assert_eq!(followed.len(), 3);
        assert!(followed[1].ends_with("b.png"));
        assert!(followed[2].ends_with("deep.png"));
    }

    #[cfg(unix)]
    #[test]
    fn linked_loops_are_scanned_once() {
        use std::os::unix::fs::symlink;

        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("a.png")).unwrap();
        symlink(dir.path(), dir.path().join("loop")).unwrap();
        symlink(dir.path(), dir.path().join("loop2")).unwrap();

        let input = vec![dir.path().display().to_string()];
        let sources = collect_sources(&input, true, true);
        assert_eq!(sources.len(), 1);
        assert!(sources[0].ends_with("a.png"));
    }

    #[test]
    fn urls_and_files_keep_command_line_order() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("z.png");
        File::create(&file).unwrap();

        let input = vec![
            file.display().to_string(),
            "https://example.com/a.png".to_string(),
            dir.path().join("missing.png").display().to_string(),
        ];
        let sources = collect_sources(&input, false, false);
        assert_eq!(sources, vec![file.display().to_string(), "https://example.com/a.png".to_string()]);
    }
}
