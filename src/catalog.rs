//! Slide catalog: slides grouped into galleries by key.
//!
//! The catalog is built once from the registered links and is append-only
//! afterwards. Slides are never removed; their loaded image is cached for the
//! lifetime of the controller.

use std::collections::{BTreeMap, HashMap};

use crate::error::{Result, SlideshowError};
use crate::loader::SlideImage;
use crate::sizing::SlideLayout;

/// Gallery key used for links that do not name one.
pub const DEFAULT_GALLERY: &str = "__all__";

/// Stable handle to a slide: gallery position plus index within the gallery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlideId {
    pub gallery: usize,
    pub index: usize,
}

/// A thumbnail link as registered by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Link {
    /// Location of the full-size image.
    pub href: String,
    pub title: String,
    /// Gallery key; `None` or empty falls back to [`DEFAULT_GALLERY`].
    pub rel: Option<String>,
    /// Attributes attached to the link itself.
    pub data: BTreeMap<String, String>,
    /// Attributes attached to the thumbnail inside the link.
    pub thumbnail_data: BTreeMap<String, String>,
}

impl Link {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_rel(mut self, rel: impl Into<String>) -> Self {
        self.rel = Some(rel.into());
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_thumbnail_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.thumbnail_data.insert(key.into(), value.into());
        self
    }

    fn gallery_key(&self) -> &str {
        match self.rel.as_deref() {
            Some(rel) if !rel.trim().is_empty() => rel,
            _ => DEFAULT_GALLERY,
        }
    }
}

/// Load progress of a slide's image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreloadState {
    #[default]
    NotStarted,
    Loading,
    Loaded,
    Failed,
}

impl PreloadState {
    pub fn is_not_started(self) -> bool {
        self == PreloadState::NotStarted
    }

    pub fn is_loading(self) -> bool {
        self == PreloadState::Loading
    }

    /// Loaded or failed: nothing more will happen to the image.
    pub fn is_resolved(self) -> bool {
        matches!(self, PreloadState::Loaded | PreloadState::Failed)
    }
}

/// One image entry within a gallery.
#[derive(Debug, Clone)]
pub struct Slide {
    pub id: SlideId,
    pub image: String,
    pub title: String,
    pub gallery: String,
    pub index: usize,
    /// Thumbnail attributes overlaid with link attributes.
    pub data: BTreeMap<String, String>,
    /// Decoded image, present once loaded.
    pub element: Option<SlideImage>,
    pub state: PreloadState,
    /// A display request arrived while the image was still loading.
    pub show_requested: bool,
    /// Fit computed for the last known viewport.
    pub layout: Option<SlideLayout>,
}

impl Slide {
    pub fn is_loaded(&self) -> bool {
        self.state == PreloadState::Loaded && self.element.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    pub fn is_failed(&self) -> bool {
        self.state == PreloadState::Failed
    }

    pub fn is_resolved(&self) -> bool {
        self.state.is_resolved()
    }

    /// Lightweight copy of the slide record carried by signals.
    pub fn snapshot(&self) -> SlideRef {
        SlideRef {
            id: self.id,
            image: self.image.clone(),
            title: self.title.clone(),
            gallery: self.gallery.clone(),
            index: self.index,
            data: self.data.clone(),
            failed: self.is_failed(),
        }
    }
}

/// Slide record as seen by signal listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideRef {
    pub id: SlideId,
    pub image: String,
    pub title: String,
    pub gallery: String,
    pub index: usize,
    pub data: BTreeMap<String, String>,
    pub failed: bool,
}

/// Ordered slides sharing a gallery key. Indices are contiguous from zero.
#[derive(Debug, Clone)]
pub struct Gallery {
    pub key: String,
    slides: Vec<Slide>,
}

impl Gallery {
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }
}

/// Mapping from gallery key to gallery, in first-registration order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    galleries: Vec<Gallery>,
    by_key: HashMap<String, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_links<I>(links: I) -> Self
    where
        I: IntoIterator<Item = Link>,
    {
        let mut catalog = Self::new();
        for link in links {
            catalog.register(link);
        }
        catalog
    }

    /// Append a link to its gallery and return the new slide's handle.
    pub fn register(&mut self, link: Link) -> SlideId {
        let key = link.gallery_key().to_string();
        let gallery = match self.by_key.get(&key) {
            Some(&pos) => pos,
            None => {
                let pos = self.galleries.len();
                self.galleries.push(Gallery {
                    key: key.clone(),
                    slides: Vec::new(),
                });
                self.by_key.insert(key.clone(), pos);
                pos
            }
        };

        let slides = &mut self.galleries[gallery].slides;
        let id = SlideId {
            gallery,
            index: slides.len(),
        };

        let mut data = link.thumbnail_data;
        data.extend(link.data);

        slides.push(Slide {
            id,
            image: link.href,
            title: link.title,
            gallery: key,
            index: id.index,
            data,
            element: None,
            state: PreloadState::NotStarted,
            show_requested: false,
            layout: None,
        });
        id
    }

    pub fn galleries(&self) -> &[Gallery] {
        &self.galleries
    }

    pub fn gallery(&self, key: &str) -> Option<&Gallery> {
        self.by_key.get(key).map(|&pos| &self.galleries[pos])
    }

    pub fn gallery_at(&self, pos: usize) -> Option<&Gallery> {
        self.galleries.get(pos)
    }

    pub fn slide(&self, id: SlideId) -> Option<&Slide> {
        self.galleries.get(id.gallery)?.slides.get(id.index)
    }

    pub fn slide_mut(&mut self, id: SlideId) -> Option<&mut Slide> {
        self.galleries.get_mut(id.gallery)?.slides.get_mut(id.index)
    }

    /// Look up a slide by gallery key and index.
    pub fn resolve(&self, key: &str, index: usize) -> Result<SlideId> {
        let gallery = self
            .gallery(key)
            .ok_or_else(|| SlideshowError::UnknownGallery(key.to_string()))?;
        gallery
            .slides
            .get(index)
            .map(|slide| slide.id)
            .ok_or_else(|| SlideshowError::SlideOutOfRange {
                gallery: key.to_string(),
                index,
                len: gallery.len(),
            })
    }

    /// Number of slides in the gallery a slide belongs to.
    pub fn gallery_len(&self, id: SlideId) -> usize {
        self.galleries.get(id.gallery).map_or(0, Gallery::len)
    }

    /// Total number of slides across all galleries.
    pub fn slide_count(&self) -> usize {
        self.galleries.iter().map(Gallery::len).sum()
    }

    pub fn slides_mut(&mut self) -> impl Iterator<Item = &mut Slide> {
        self.galleries.iter_mut().flat_map(|g| g.slides.iter_mut())
    }
}
