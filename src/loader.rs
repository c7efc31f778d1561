//! Background image loading for slides.
//!
//! Decoding runs on named worker threads fed through crossbeam channels; the
//! owner drains finished outcomes on its own thread and hands them to the
//! controller. A location is a file path or a `file://` URL.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use image::imageops::FilterType;
use image::GenericImageView;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::catalog::SlideId;
use crate::error::SlideshowError;
use crate::sizing::Size;

/// Supported image extensions
pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp", "ico", "tiff", "tif"];

/// Check if a file is a supported image
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Supported images directly inside `dir`, in natural filename order
pub fn images_in_directory(dir: &Path) -> Vec<PathBuf> {
    let mut images: Vec<PathBuf> = std::fs::read_dir(dir)
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && is_supported_image(p))
        .collect();

    images.sort_by(|a, b| {
        natord::compare(
            a.file_name().and_then(|n| n.to_str()).unwrap_or(""),
            b.file_name().and_then(|n| n.to_str()).unwrap_or(""),
        )
    });
    images
}

/// Decoded slide image: RGBA pixels plus the size the file declares.
#[derive(Clone)]
pub struct SlideImage {
    pub width: u32,
    pub height: u32,
    /// Dimensions before any downscaling
    pub natural_width: u32,
    pub natural_height: u32,
    pub pixels: Arc<[u8]>,
}

impl SlideImage {
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            natural_width: width,
            natural_height: height,
            pixels: pixels.into(),
        }
    }

    pub fn natural_size(&self) -> Size {
        Size::new(self.natural_width as f32, self.natural_height as f32)
    }
}

impl fmt::Debug for SlideImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlideImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("natural_width", &self.natural_width)
            .field("natural_height", &self.natural_height)
            .finish_non_exhaustive()
    }
}

/// Result of one load request.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Loaded { slide: SlideId, image: SlideImage },
    Failed { slide: SlideId, error: SlideshowError },
}

impl LoadOutcome {
    pub fn slide(&self) -> SlideId {
        match self {
            LoadOutcome::Loaded { slide, .. } | LoadOutcome::Failed { slide, .. } => *slide,
        }
    }
}

/// Asynchronous image source used by the slideshow controller.
pub trait ImageSource {
    /// Start loading `location` for `slide`. Completion is reported later.
    fn request(&mut self, slide: SlideId, location: &str);

    /// Outcomes that finished since the last call.
    fn drain_completed(&mut self) -> Vec<LoadOutcome> {
        Vec::new()
    }
}

struct LoadRequest {
    slide: SlideId,
    location: String,
}

/// Thread-backed image loader.
pub struct ImageLoader {
    request_tx: Option<Sender<LoadRequest>>,
    result_rx: Receiver<LoadOutcome>,
    in_flight: Arc<Mutex<HashSet<SlideId>>>,
    /// Set on drop; workers skip whatever is still queued
    shutdown: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
}

impl ImageLoader {
    /// Spawn `threads` decode workers. `max_texture_side` of 0 keeps full size.
    pub fn new(threads: usize, max_texture_side: u32) -> Self {
        let (request_tx, request_rx) = crossbeam_channel::unbounded::<LoadRequest>();
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<LoadOutcome>();
        let in_flight = Arc::new(Mutex::new(HashSet::new()));
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::new();
        for n in 0..threads.max(1) {
            let request_rx = request_rx.clone();
            let result_tx = result_tx.clone();
            let in_flight = Arc::clone(&in_flight);
            let shutdown = Arc::clone(&shutdown);
            let spawned = std::thread::Builder::new()
                .name(format!("slide-loader-{n}"))
                .spawn(move || Self::worker_loop(request_rx, result_tx, in_flight, shutdown, max_texture_side));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => warn!("Failed to spawn slide loader thread {}: {}", n, e),
            }
        }

        Self {
            request_tx: Some(request_tx),
            result_rx,
            in_flight,
            shutdown,
            workers,
        }
    }

    fn worker_loop(
        request_rx: Receiver<LoadRequest>,
        result_tx: Sender<LoadOutcome>,
        in_flight: Arc<Mutex<HashSet<SlideId>>>,
        shutdown: Arc<AtomicBool>,
        max_texture_side: u32,
    ) {
        for req in request_rx.iter() {
            if shutdown.load(Ordering::Acquire) {
                in_flight.lock().remove(&req.slide);
                continue;
            }
            let outcome = match decode(&req.location, max_texture_side) {
                Ok(image) => LoadOutcome::Loaded {
                    slide: req.slide,
                    image,
                },
                Err(error) => LoadOutcome::Failed {
                    slide: req.slide,
                    error,
                },
            };
            in_flight.lock().remove(&req.slide);
            if result_tx.send(outcome).is_err() {
                return; // owner gone
            }
        }
    }

    /// Number of requests not yet decoded.
    pub fn pending_count(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Whether there is anything left to wait for, decoded or not.
    pub fn is_busy(&self) -> bool {
        self.pending_count() > 0 || !self.result_rx.is_empty()
    }
}

impl ImageSource for ImageLoader {
    fn request(&mut self, slide: SlideId, location: &str) {
        let Some(tx) = &self.request_tx else {
            return;
        };
        if !self.in_flight.lock().insert(slide) {
            debug!("Slide {:?} already queued", slide);
            return;
        }
        let req = LoadRequest {
            slide,
            location: location.to_string(),
        };
        if tx.send(req).is_err() {
            self.in_flight.lock().remove(&slide);
            warn!("Slide loader workers are gone; dropping request for {}", location);
        }
    }

    fn drain_completed(&mut self) -> Vec<LoadOutcome> {
        self.result_rx.try_iter().collect()
    }
}

impl Drop for ImageLoader {
    fn drop(&mut self) {
        // Queued requests are skipped; closing the channel ends the loops
        self.shutdown.store(true, Ordering::Release);
        self.request_tx = None;
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

/// Map a location to a local path. Only plain paths and `file://` URLs are
/// supported.
pub fn resolve_location(location: &str) -> Result<PathBuf, SlideshowError> {
    if let Some(rest) = location.strip_prefix("file://") {
        return Ok(PathBuf::from(rest));
    }
    if let Some((scheme, _)) = location.split_once("://") {
        return Err(SlideshowError::image_load(
            location,
            format!("unsupported scheme '{scheme}'"),
        ));
    }
    Ok(PathBuf::from(location))
}

/// Decode the image at `location`, downscaling it to fit `max_texture_side`.
pub fn decode(location: &str, max_texture_side: u32) -> Result<SlideImage, SlideshowError> {
    let path = resolve_location(location)?;
    let img = image::open(&path).map_err(|e| SlideshowError::image_load(location, e.to_string()))?;
    let (natural_width, natural_height) = img.dimensions();

    let img = if max_texture_side > 0 && (natural_width > max_texture_side || natural_height > max_texture_side) {
        // Preserve aspect ratio; `resize` interprets (max_width, max_height).
        img.resize(max_texture_side, max_texture_side, FilterType::CatmullRom)
    } else {
        img
    };

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    debug!("Decoded {} ({}x{})", location, natural_width, natural_height);

    Ok(SlideImage {
        width,
        height,
        natural_width,
        natural_height,
        pixels: rgba.into_raw().into(),
    })
}

/// Natural sort comparison for filenames
pub mod natord {
    use std::cmp::Ordering;

    pub fn compare(a: &str, b: &str) -> Ordering {
        let mut a_chars = a.chars().peekable();
        let mut b_chars = b.chars().peekable();

        loop {
            match (a_chars.peek(), b_chars.peek()) {
                (None, None) => return Ordering::Equal,
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some(&ac), Some(&bc)) if ac.is_ascii_digit() && bc.is_ascii_digit() => {
                    let a_num = take_number(&mut a_chars);
                    let b_num = take_number(&mut b_chars);
                    match a_num.cmp(&b_num) {
                        Ordering::Equal => continue,
                        other => return other,
                    }
                }
                (Some(&ac), Some(&bc)) => {
                    match ac.to_ascii_lowercase().cmp(&bc.to_ascii_lowercase()) {
                        Ordering::Equal => {
                            a_chars.next();
                            b_chars.next();
                        }
                        other => return other,
                    }
                }
            }
        }
    }

    fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> u64 {
        let mut value: u64 = 0;
        while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
            value = value.saturating_mul(10).saturating_add(u64::from(d));
            chars.next();
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tempfile::tempdir;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        image::RgbaImage::from_pixel(width, height, image::Rgba([200, 10, 10, 255]))
            .save(&path)
            .expect("failed to write test image");
        path
    }

    fn wait_for(loader: &mut ImageLoader, count: usize) -> Vec<LoadOutcome> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut out = Vec::new();
        while out.len() < count && Instant::now() < deadline {
            out.extend(loader.drain_completed());
            std::thread::sleep(Duration::from_millis(5));
        }
        out
    }

    #[test]
    fn natural_order_compares_numbers_by_value() {
        use std::cmp::Ordering;
        assert_eq!(natord::compare("img2.png", "img10.png"), Ordering::Less);
        assert_eq!(natord::compare("B.png", "a.png"), Ordering::Greater);
        assert_eq!(natord::compare("x01", "x1"), Ordering::Equal);
    }

    #[test]
    fn directory_listing_filters_and_sorts() {
        let dir = tempdir().expect("failed to create temp dir");
        write_png(dir.path(), "img10.png", 1, 1);
        write_png(dir.path(), "img2.png", 1, 1);
        std::fs::write(dir.path().join("notes.txt"), b"x").expect("write txt");

        let names: Vec<String> = images_in_directory(dir.path())
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .collect();
        assert_eq!(names, vec!["img2.png", "img10.png"]);
    }

    #[test]
    fn locations_resolve_paths_and_file_urls() {
        assert_eq!(resolve_location("/tmp/a.png").ok(), Some(PathBuf::from("/tmp/a.png")));
        assert_eq!(resolve_location("file:///tmp/a.png").ok(), Some(PathBuf::from("/tmp/a.png")));
        assert!(matches!(
            resolve_location("https://example.com/a.png"),
            Err(SlideshowError::ImageLoad { .. })
        ));
    }

    #[test]
    fn decode_keeps_natural_size_when_downscaling() {
        let dir = tempdir().expect("failed to create temp dir");
        let path = write_png(dir.path(), "wide.png", 40, 20);

        let image = decode(path.to_str().unwrap_or_default(), 10).expect("decode");
        assert_eq!((image.natural_width, image.natural_height), (40, 20));
        assert_eq!((image.width, image.height), (10, 5));
        assert_eq!(image.pixels.len(), 10 * 5 * 4);
    }

    #[test]
    fn loader_reports_success_and_failure() {
        let dir = tempdir().expect("failed to create temp dir");
        let good = write_png(dir.path(), "good.png", 3, 2);
        let a = SlideId { gallery: 0, index: 0 };
        let b = SlideId { gallery: 0, index: 1 };

        let mut loader = ImageLoader::new(2, 0);
        loader.request(a, good.to_str().unwrap_or_default());
        loader.request(b, &dir.path().join("missing.png").to_string_lossy());

        let mut outcomes = wait_for(&mut loader, 2);
        outcomes.sort_by_key(LoadOutcome::slide);
        assert_eq!(outcomes.len(), 2);
        assert!(matches!(&outcomes[0], LoadOutcome::Loaded { image, .. } if image.width == 3));
        assert!(matches!(&outcomes[1], LoadOutcome::Failed { .. }));
        assert_eq!(loader.pending_count(), 0);
    }

    #[test]
    fn workers_skip_queued_requests_after_shutdown() {
        let dir = tempdir().expect("failed to create temp dir");
        let good = write_png(dir.path(), "good.png", 3, 2);
        let slide = SlideId { gallery: 0, index: 0 };

        let (request_tx, request_rx) = crossbeam_channel::unbounded();
        let (result_tx, result_rx) = crossbeam_channel::unbounded();
        let in_flight = Arc::new(Mutex::new(HashSet::from([slide])));
        request_tx
            .send(LoadRequest {
                slide,
                location: good.to_string_lossy().into_owned(),
            })
            .expect("queue request");
        drop(request_tx);

        ImageLoader::worker_loop(request_rx, result_tx, Arc::clone(&in_flight), Arc::new(AtomicBool::new(true)), 0);

        assert!(result_rx.try_recv().is_err());
        assert!(in_flight.lock().is_empty());
    }
}
