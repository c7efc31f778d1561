//! Native fullscreen capability and exit tracking.

use tracing::debug;

use crate::error::Result;

/// Platform fullscreen entry point.
///
/// Change notifications are not pulled from here; the host forwards them to
/// [`crate::Slideshow::on_fullscreen_change`].
pub trait FullscreenApi {
    /// Whether native fullscreen can be requested at all.
    fn is_supported(&self) -> bool;

    /// Ask the platform to enter fullscreen.
    fn enter(&mut self) -> Result<()>;

    /// Leave fullscreen.
    fn exit(&mut self);
}

/// Fullscreen stand-in for hosts without a native mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFullscreen;

impl FullscreenApi for NoFullscreen {
    fn is_supported(&self) -> bool {
        false
    }

    fn enter(&mut self) -> Result<()> {
        Err(crate::SlideshowError::Fullscreen("not supported".into()))
    }

    fn exit(&mut self) {}
}

/// Where the session stands with respect to native fullscreen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FullscreenState {
    #[default]
    Inactive,
    /// Entry requested, platform has not confirmed yet
    Requested,
    Active,
    /// We asked to leave; the next "off" notification is ours
    Exiting,
}

/// Tells user-initiated fullscreen exits apart from our own.
#[derive(Debug, Default)]
pub struct FullscreenTracker {
    state: FullscreenState,
}

impl FullscreenTracker {
    pub fn state(&self) -> FullscreenState {
        self.state
    }

    /// The session is (or is about to be) presented fullscreen.
    pub fn is_engaged(&self) -> bool {
        matches!(self.state, FullscreenState::Requested | FullscreenState::Active)
    }

    pub fn requested(&mut self) {
        self.state = FullscreenState::Requested;
    }

    /// Record a programmatic exit. Returns `true` if fullscreen was engaged.
    pub fn exiting(&mut self) -> bool {
        if self.is_engaged() {
            self.state = FullscreenState::Exiting;
            true
        } else {
            false
        }
    }

    /// Feed a platform change notification. Returns `true` exactly once per
    /// exit the user made on their own.
    pub fn changed(&mut self, fullscreen: bool) -> bool {
        let before = self.state;
        let user_exit = match (self.state, fullscreen) {
            (FullscreenState::Requested, true) => {
                self.state = FullscreenState::Active;
                false
            }
            (FullscreenState::Active, false) => {
                self.state = FullscreenState::Inactive;
                true
            }
            (FullscreenState::Exiting, false) => {
                self.state = FullscreenState::Inactive;
                false
            }
            _ => false,
        };
        debug!(?before, after = ?self.state, fullscreen, "fullscreen change");
        user_exit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_exit_reported_once() {
        let mut tracker = FullscreenTracker::default();
        tracker.requested();
        assert!(!tracker.changed(true));
        assert_eq!(tracker.state(), FullscreenState::Active);

        assert!(tracker.changed(false));
        assert!(!tracker.changed(false));
        assert_eq!(tracker.state(), FullscreenState::Inactive);
    }

    #[test]
    fn programmatic_exit_is_ignored() {
        let mut tracker = FullscreenTracker::default();
        tracker.requested();
        tracker.changed(true);

        assert!(tracker.exiting());
        assert!(!tracker.changed(false));
        assert_eq!(tracker.state(), FullscreenState::Inactive);
    }

    #[test]
    fn off_before_confirmation_is_not_an_exit() {
        let mut tracker = FullscreenTracker::default();
        tracker.requested();
        assert!(!tracker.changed(false));
        assert!(tracker.is_engaged());
    }

    #[test]
    fn unsupported_backend_rejects_entry() {
        let mut fs = NoFullscreen;
        assert!(!fs.is_supported());
        assert!(fs.enter().is_err());
    }
}
