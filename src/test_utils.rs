//! Fakes shared by the controller tests.

use std::cell::RefCell;
use std::rc::Rc;

use crate::catalog::{Link, SlideId};
use crate::controller::Slideshow;
use crate::error::{Result, SlideshowError};
use crate::events::SlideEvent;
use crate::fullscreen::FullscreenApi;
use crate::host::Host;
use crate::loader::{ImageSource, LoadOutcome, SlideImage};
use crate::sizing::Size;
use crate::Options;

/// Page with numbered content blocks and a scroll offset.
#[derive(Debug)]
pub struct FakeHost {
    pub viewport: Size,
    pub scroll: f32,
    /// (element id, visible)
    pub elements: Vec<(u32, bool)>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self {
            viewport: Size::new(1000.0, 500.0),
            scroll: 0.0,
            elements: vec![(1, true), (2, false), (3, true)],
        }
    }
}

impl FakeHost {
    pub fn visible(&self) -> Vec<u32> {
        self.elements.iter().filter(|(_, v)| *v).map(|(id, _)| *id).collect()
    }
}

impl Host for FakeHost {
    type Element = u32;

    fn viewport_size(&self) -> Size {
        self.viewport
    }

    fn scroll_offset(&self) -> f32 {
        self.scroll
    }

    fn set_scroll_offset(&mut self, offset: f32) {
        self.scroll = offset;
    }

    fn hide_page_content(&mut self) -> Vec<u32> {
        let mut hidden = Vec::new();
        for (id, visible) in &mut self.elements {
            if *visible {
                *visible = false;
                hidden.push(*id);
            }
        }
        hidden
    }

    fn show_page_content(&mut self, elements: &[u32]) {
        for (id, visible) in &mut self.elements {
            if elements.contains(id) {
                *visible = true;
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeFullscreen {
    pub supported: bool,
    pub reject: bool,
    pub enters: usize,
    pub exits: usize,
}

impl FakeFullscreen {
    pub fn supported() -> Self {
        Self {
            supported: true,
            ..Self::default()
        }
    }
}

impl FullscreenApi for FakeFullscreen {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn enter(&mut self) -> Result<()> {
        if self.reject {
            return Err(SlideshowError::Fullscreen("denied".into()));
        }
        self.enters += 1;
        Ok(())
    }

    fn exit(&mut self) {
        self.exits += 1;
    }
}

/// Loader that records requests; outcomes are fed in by the test.
#[derive(Debug, Default)]
pub struct RecordingLoader {
    pub requests: Vec<(SlideId, String)>,
    pub completed: Vec<LoadOutcome>,
}

impl RecordingLoader {
    pub fn requests_for(&self, slide: SlideId) -> usize {
        self.requests.iter().filter(|(id, _)| *id == slide).count()
    }
}

impl ImageSource for RecordingLoader {
    fn request(&mut self, slide: SlideId, location: &str) {
        self.requests.push((slide, location.to_string()));
    }

    fn drain_completed(&mut self) -> Vec<LoadOutcome> {
        std::mem::take(&mut self.completed)
    }
}

pub type TestSlideshow = Slideshow<FakeHost, FakeFullscreen, RecordingLoader>;

/// Solid 400x300 test image.
pub fn image() -> SlideImage {
    sized_image(400, 300)
}

pub fn sized_image(width: u32, height: u32) -> SlideImage {
    SlideImage::from_rgba(width, height, vec![0; (width * height * 4) as usize])
}

/// Gallery "g" with `n` slides, no fades, hide-page presentation.
pub fn gallery(n: usize) -> TestSlideshow {
    let links = (0..n).map(|i| Link::new(format!("{i}.jpg")).with_rel("g").with_title(format!("slide {i}")));
    let options = Options {
        fade_duration_ms: 0,
        use_fullscreen_api: false,
        ..Options::default()
    };
    Slideshow::new(FakeHost::default(), FakeFullscreen::default(), RecordingLoader::default(), options, links)
}

/// Capture every emitted signal.
pub fn record(slideshow: &mut TestSlideshow) -> Rc<RefCell<Vec<SlideEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    slideshow.connect_all(move |e| sink.borrow_mut().push(e.clone()));
    events
}
