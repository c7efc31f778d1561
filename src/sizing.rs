//! Fit-to-viewport sizing for slides.

/// Width and height in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    fn aspect_ratio(&self) -> f32 {
        self.width / self.height
    }
}

/// Which viewport side constrains the slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    Height,
    Width,
}

/// Display size of a slide plus the margins that centre it on a point placed
/// in the middle of the overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideLayout {
    pub width: f32,
    pub height: f32,
    pub margin_left: f32,
    pub margin_top: f32,
    pub fit: Fit,
}

impl SlideLayout {
    /// Top-left corner relative to the overlay origin.
    pub fn origin_in(&self, viewport: Size) -> (f32, f32) {
        (
            viewport.width * 0.5 + self.margin_left,
            viewport.height * 0.5 + self.margin_top,
        )
    }
}

/// Fit an image of `natural` size into `viewport`.
///
/// A viewport wider (relative to its height) than the image fits by height,
/// otherwise by width; the other side follows the image's aspect ratio. With
/// `no_enlarge` the constrained side never exceeds the natural dimension.
pub fn fit_to_viewport(viewport: Size, natural: Size, no_enlarge: bool) -> SlideLayout {
    if viewport.is_empty() || natural.is_empty() {
        return SlideLayout {
            width: 0.0,
            height: 0.0,
            margin_left: 0.0,
            margin_top: 0.0,
            fit: Fit::Width,
        };
    }

    let image_ratio = natural.aspect_ratio();
    let (width, height, fit) = if viewport.aspect_ratio() > image_ratio {
        let mut height = viewport.height;
        if no_enlarge {
            height = height.min(natural.height);
        }
        (height * image_ratio, height, Fit::Height)
    } else {
        let mut width = viewport.width;
        if no_enlarge {
            width = width.min(natural.width);
        }
        (width, width / image_ratio, Fit::Width)
    };

    SlideLayout {
        width,
        height,
        margin_left: -0.5 * width,
        margin_top: -0.5 * height,
        fit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn wide_viewport_fits_by_height() {
        let layout = fit_to_viewport(Size::new(1000.0, 500.0), Size::new(400.0, 300.0), false);

        assert_eq!(layout.fit, Fit::Height);
        assert!(close(layout.height, 500.0));
        assert!(close(layout.width, 666.67));
        assert!(close(layout.margin_left, -333.33));
        assert!(close(layout.margin_top, -250.0));
    }

    #[test]
    fn tall_viewport_fits_by_width() {
        let layout = fit_to_viewport(Size::new(600.0, 1000.0), Size::new(400.0, 300.0), false);

        assert_eq!(layout.fit, Fit::Width);
        assert!(close(layout.width, 600.0));
        assert!(close(layout.height, 450.0));
        assert!(close(layout.margin_top, -225.0));
    }

    #[test]
    fn no_enlarge_caps_at_natural_size() {
        let by_height = fit_to_viewport(Size::new(1000.0, 500.0), Size::new(400.0, 300.0), true);
        assert!(close(by_height.height, 300.0));
        assert!(close(by_height.width, 400.0));

        let by_width = fit_to_viewport(Size::new(600.0, 1000.0), Size::new(400.0, 300.0), true);
        assert!(close(by_width.width, 400.0));
        assert!(close(by_width.height, 300.0));
    }

    #[test]
    fn no_enlarge_still_shrinks_large_images() {
        let layout = fit_to_viewport(Size::new(800.0, 600.0), Size::new(4000.0, 3000.0), true);
        assert!(close(layout.width, 800.0));
        assert!(close(layout.height, 600.0));
    }

    #[test]
    fn equal_ratios_fit_by_width() {
        let layout = fit_to_viewport(Size::new(800.0, 600.0), Size::new(400.0, 300.0), false);
        assert_eq!(layout.fit, Fit::Width);
        assert!(close(layout.height, 600.0));
    }

    #[test]
    fn degenerate_sizes_collapse_to_zero() {
        let layout = fit_to_viewport(Size::new(0.0, 500.0), Size::new(400.0, 300.0), false);
        assert_eq!(layout.width, 0.0);
        let layout = fit_to_viewport(Size::new(1000.0, 500.0), Size::new(400.0, 0.0), false);
        assert_eq!(layout.height, 0.0);
    }

    #[test]
    fn origin_centres_slide() {
        let viewport = Size::new(1000.0, 500.0);
        let layout = fit_to_viewport(viewport, Size::new(400.0, 300.0), true);
        let (x, y) = layout.origin_in(viewport);
        assert!(close(x, 300.0));
        assert!(close(y, 100.0));
    }
}
