//! Benchmarks for slideshow navigation and slide sizing.
//!
//! Measures:
//! - Fit-to-viewport sizing
//! - Stepping through a gallery whose images are already loaded

use criterion::{criterion_group, criterion_main, Criterion};
use fullscreen_slides::{
    fit_to_viewport, Host, ImageSource, Link, NoFullscreen, Options, Size, SlideId, SlideImage, Slideshow,
};
use std::hint::black_box;

struct StaticPage;

impl Host for StaticPage {
    type Element = ();

    fn viewport_size(&self) -> Size {
        Size::new(1920.0, 1080.0)
    }

    fn scroll_offset(&self) -> f32 {
        0.0
    }

    fn set_scroll_offset(&mut self, _offset: f32) {}

    fn hide_page_content(&mut self) -> Vec<()> {
        Vec::new()
    }

    fn show_page_content(&mut self, _elements: &[()]) {}
}

/// Collects requests so the benchmark can answer them synchronously.
#[derive(Default)]
struct QueuedLoader {
    queued: Vec<SlideId>,
}

impl ImageSource for QueuedLoader {
    fn request(&mut self, slide: SlideId, _location: &str) {
        self.queued.push(slide);
    }
}

fn bench_sizing(c: &mut Criterion) {
    let mut group = c.benchmark_group("sizing");
    let viewport = Size::new(1920.0, 1080.0);

    group.bench_function("fit_landscape", |b| {
        b.iter(|| fit_to_viewport(black_box(viewport), black_box(Size::new(4000.0, 3000.0)), false));
    });
    group.bench_function("fit_portrait_no_enlarge", |b| {
        b.iter(|| fit_to_viewport(black_box(viewport), black_box(Size::new(600.0, 900.0)), true));
    });

    group.finish();
}

fn bench_navigation(c: &mut Criterion) {
    let mut group = c.benchmark_group("navigation");

    let links = (0..200).map(|i| Link::new(format!("{i}.png")).with_rel("bench"));
    let options = Options {
        fade_duration_ms: 0,
        use_fullscreen_api: false,
        ..Options::default()
    };
    let mut slideshow = Slideshow::new(StaticPage, NoFullscreen, QueuedLoader::default(), options, links);
    let image = SlideImage::from_rgba(4, 3, vec![0; 4 * 3 * 4]);

    slideshow.start("bench", Some(0)).unwrap();
    // Load the whole gallery up front so only navigation is measured.
    for index in 0..200 {
        let id = SlideId { gallery: 0, index };
        slideshow.load_slide(id).unwrap();
        slideshow.on_image_loaded(id, image.clone());
    }
    slideshow.loader_mut().queued.clear();

    group.bench_function("next_slide", |b| {
        b.iter(|| {
            slideshow.next_slide(false);
            black_box(slideshow.current());
        });
    });
    group.bench_function("prev_slide", |b| {
        b.iter(|| {
            slideshow.prev_slide(false);
            black_box(slideshow.current());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_sizing, bench_navigation);
criterion_main!(benches);
