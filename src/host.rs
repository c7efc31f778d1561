//! The page the overlay is laid over.

use crate::sizing::Size;

/// Page-side collaborator of the slideshow.
///
/// `Element` is whatever handle the host uses for a piece of page content;
/// the slideshow only stores the handles it was given and hands them back.
pub trait Host {
    type Element: Clone;

    /// Size of the area the overlay covers.
    fn viewport_size(&self) -> Size;

    fn scroll_offset(&self) -> f32;

    fn set_scroll_offset(&mut self, offset: f32);

    /// Hide every currently visible piece of page content and return what was
    /// hidden.
    fn hide_page_content(&mut self) -> Vec<Self::Element>;

    /// Show the given content again.
    fn show_page_content(&mut self, elements: &[Self::Element]);
}
