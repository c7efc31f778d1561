//! Fullscreen image slideshow overlay.
//!
//! Links are grouped into galleries; activating one opens an overlay that
//! loads images on demand, crossfades between them and follows keyboard
//! navigation. The [`Slideshow`] controller is host-agnostic: the page,
//! native fullscreen and image decoding are injected through [`Host`],
//! [`FullscreenApi`] and [`ImageSource`].

pub mod animation;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod fullscreen;
pub mod host;
pub mod input;
pub mod loader;
pub mod sizing;

#[cfg(test)]
mod test_utils;

pub use catalog::{Link, SlideId, SlideRef, DEFAULT_GALLERY};
pub use config::{Config, Options, OptionsPatch};
pub use controller::{OverlayView, Phase, Presentation, SlideView, Slideshow};
pub use error::{Result, SlideshowError};
pub use events::{Command, CommandSender, ConnectionId, SignalKind, SlideEvent, SlideTarget};
pub use fullscreen::{FullscreenApi, NoFullscreen};
pub use host::Host;
pub use input::{Action, Key, KeyBinding, KeyBindings};
pub use loader::{ImageLoader, ImageSource, LoadOutcome, SlideImage};
pub use sizing::{fit_to_viewport, Size, SlideLayout};
