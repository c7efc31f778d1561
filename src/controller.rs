//! The slideshow presenter.
//!
//! [`Slideshow`] owns the overlay, the slide catalog and the open session. It
//! is driven by the owner's event loop: commands, key presses, fullscreen
//! notifications, image load outcomes and `tick` for fades. Nothing in here
//! blocks; image decoding happens behind [`ImageSource`].

use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use tracing::{debug, info, warn};

use crate::animation::Crossfade;
use crate::catalog::{Catalog, Link, Slide, SlideId, SlideRef};
use crate::config::{Options, OptionsPatch};
use crate::error::{Result, SlideshowError};
use crate::events::{command_queue, Command, CommandSender, ConnectionId, SignalKind, SlideEvent, SlideTarget, Signals};
use crate::fullscreen::{FullscreenApi, FullscreenTracker};
use crate::host::Host;
use crate::input::{Action, KeyBinding, KeyBindings};
use crate::loader::{ImageSource, LoadOutcome, SlideImage};
use crate::sizing::{fit_to_viewport, Size, SlideLayout};

/// Lifecycle phase of the slideshow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Closed,
    Opening,
    Showing,
    /// Waiting for the image of the slide the user asked for.
    Loading,
    /// The displayed slide failed to load.
    Error,
}

/// How the overlay covers the page for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    Fullscreen,
    HiddenPage,
}

/// The shared overlay surface, created on first open.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub visible: bool,
    pub background_rgb: [u8; 3],
    pub size: Size,
}

struct Session<E> {
    gallery: usize,
    current: Option<SlideId>,
    presentation: Presentation,
    saved_scroll: Option<f32>,
    hidden: Vec<E>,
    options: Options,
}

/// One slide to draw.
#[derive(Debug, Clone)]
pub struct SlideView<'a> {
    pub id: SlideId,
    pub image: &'a SlideImage,
    pub layout: SlideLayout,
    pub opacity: f32,
}

/// What the overlay shows at a given instant, back to front.
#[derive(Debug, Clone)]
pub struct OverlayView<'a> {
    pub background_rgb: [u8; 3],
    pub size: Size,
    pub slides: Vec<SlideView<'a>>,
    /// The current slide, loaded or failed.
    pub current: Option<&'a Slide>,
    pub loading: bool,
}

/// Fullscreen image slideshow controller.
pub struct Slideshow<H: Host, F: FullscreenApi, L: ImageSource> {
    host: H,
    fullscreen: F,
    loader: L,
    options: Options,
    bindings: KeyBindings,
    catalog: Catalog,
    signals: Signals,
    overlay: Option<Overlay>,
    session: Option<Session<H::Element>>,
    phase: Phase,
    tracker: FullscreenTracker,
    crossfade: Crossfade,
    /// Slide whose fade-in has to finish before `StartOfSlide`
    fading_in: Option<SlideId>,
    /// `StartLoading` went out without its `StopLoading`
    loading_signalled: bool,
    initialized: bool,
    commands: CommandSender,
    command_rx: Receiver<Command>,
}

impl<H: Host, F: FullscreenApi, L: ImageSource> Slideshow<H, F, L> {
    pub fn new<I>(host: H, fullscreen: F, loader: L, options: Options, links: I) -> Self
    where
        I: IntoIterator<Item = Link>,
    {
        let catalog = Catalog::from_links(links);
        debug!(
            galleries = catalog.galleries().len(),
            slides = catalog.slide_count(),
            "slideshow catalog built"
        );
        let (commands, command_rx) = command_queue();
        Self {
            host,
            fullscreen,
            loader,
            crossfade: Crossfade::new(options.fade_easing),
            options,
            bindings: KeyBindings::default(),
            catalog,
            signals: Signals::new(),
            overlay: None,
            session: None,
            phase: Phase::Closed,
            tracker: FullscreenTracker::default(),
            fading_in: None,
            loading_signalled: false,
            initialized: false,
            commands,
            command_rx,
        }
    }

    pub fn with_bindings(mut self, bindings: KeyBindings) -> Self {
        self.bindings = bindings;
        self
    }

    // ---- accessors ----

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn fullscreen(&self) -> &F {
        &self.fullscreen
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Slide currently on display.
    pub fn current(&self) -> Option<SlideId> {
        self.session.as_ref().and_then(|s| s.current)
    }

    pub fn presentation(&self) -> Option<Presentation> {
        self.session.as_ref().map(|s| s.presentation)
    }

    /// Key presses are only handled while a session is open.
    pub fn keyboard_bound(&self) -> bool {
        self.session.is_some()
    }

    // ---- signals and commands ----

    pub fn connect<C>(&mut self, kind: SignalKind, listener: C) -> ConnectionId
    where
        C: FnMut(&SlideEvent) + 'static,
    {
        self.signals.connect(kind, listener)
    }

    pub fn connect_all<C>(&mut self, listener: C) -> ConnectionId
    where
        C: FnMut(&SlideEvent) + 'static,
    {
        self.signals.connect_all(listener)
    }

    pub fn disconnect(&mut self, id: ConnectionId) -> bool {
        self.signals.disconnect(id)
    }

    /// Handle for queueing commands, e.g. from inside a listener.
    pub fn command_sender(&self) -> CommandSender {
        self.commands.clone()
    }

    pub fn dispatch(&mut self, command: Command) -> Result<()> {
        debug!(?command, "dispatch");
        match command {
            Command::Show(target) => self.show(target),
            Command::Start { gallery, index } => self.start(&gallery, index),
            Command::ShowSlide(id) => self.show_slide(id),
            Command::LoadSlide(id) => self.load_slide(id),
            Command::PrevSlide { preload_only } => {
                self.prev_slide(preload_only);
                Ok(())
            }
            Command::NextSlide { preload_only } => {
                self.next_slide(preload_only);
                Ok(())
            }
            Command::Close => {
                self.close();
                Ok(())
            }
            Command::SetOptions(patch) => {
                self.set_options(&patch);
                Ok(())
            }
            Command::UpdateSize | Command::OrientationChange => {
                self.update_size();
                Ok(())
            }
        }
    }

    /// Apply finished image loads, then run queued commands. Returns how many
    /// items were processed.
    pub fn pump(&mut self) -> usize {
        let mut processed = 0;
        for outcome in self.loader.drain_completed() {
            self.apply_outcome(outcome);
            processed += 1;
        }
        while let Ok(command) = self.command_rx.try_recv() {
            if let Err(e) = self.dispatch(command) {
                warn!("Queued slideshow command failed: {}", e);
            }
            processed += 1;
        }
        processed
    }

    /// Add a link after construction.
    pub fn register_link(&mut self, link: Link) -> SlideId {
        self.catalog.register(link)
    }

    /// A link on the page was activated.
    pub fn activate_link(&mut self, id: SlideId) -> Result<()> {
        self.show(SlideTarget::Slide(id))
    }

    pub fn set_options(&mut self, patch: &OptionsPatch) {
        patch.apply(&mut self.options);
        debug!(options = ?self.options, "options updated");
    }

    // ---- opening ----

    /// Open the overlay on a slide, or switch to it if already open.
    pub fn show(&mut self, target: SlideTarget) -> Result<()> {
        let id = match target {
            SlideTarget::Slide(id) => {
                self.catalog.slide(id).ok_or(SlideshowError::UnknownSlide(id))?;
                id
            }
            SlideTarget::Position { gallery, index } => self.catalog.resolve(&gallery, index)?,
        };
        self.open(id.gallery);
        self.show_slide(id)
    }

    /// Open a gallery at `index`, or at the configured start slide.
    pub fn start(&mut self, gallery: &str, index: Option<usize>) -> Result<()> {
        let index = index.unwrap_or(self.options.start_slide);
        let id = self.catalog.resolve(gallery, index)?;
        self.show(SlideTarget::Slide(id))
    }

    fn open(&mut self, gallery: usize) {
        if let Some(session) = &mut self.session {
            session.gallery = gallery;
            return;
        }

        self.phase = Phase::Opening;
        let options = self.options.clone();
        let saved_scroll = Some(self.host.scroll_offset());
        self.overlay_mut();
        self.update_size();

        let presentation = if options.use_fullscreen_api && self.fullscreen.is_supported() {
            match self.fullscreen.enter() {
                Ok(()) => {
                    self.tracker.requested();
                    Presentation::Fullscreen
                }
                Err(e) => {
                    debug!("Falling back to hiding page content: {}", e);
                    Presentation::HiddenPage
                }
            }
        } else {
            debug!("Native fullscreen disabled or unsupported; hiding page content");
            Presentation::HiddenPage
        };

        if !self.initialized {
            self.initialized = true;
            self.signals.emit(&SlideEvent::Init);
        }

        let hidden = match presentation {
            Presentation::HiddenPage => self.host.hide_page_content(),
            Presentation::Fullscreen => Vec::new(),
        };

        let overlay = self.overlay_mut();
        overlay.visible = true;
        overlay.background_rgb = options.background_rgb;
        self.crossfade.set_easing(options.fade_easing);

        info!(?presentation, gallery = %self.gallery_key(gallery), "slideshow opened");
        self.session = Some(Session {
            gallery,
            current: None,
            presentation,
            saved_scroll,
            hidden,
            options,
        });
        self.phase = Phase::Showing;
    }

    fn overlay_mut(&mut self) -> &mut Overlay {
        let background_rgb = self.options.background_rgb;
        self.overlay.get_or_insert_with(|| Overlay {
            visible: false,
            background_rgb,
            size: Size::default(),
        })
    }

    fn gallery_key(&self, gallery: usize) -> &str {
        self.catalog.gallery_at(gallery).map_or("", |g| g.key.as_str())
    }

    // ---- slides ----

    /// Display a slide of the open session, loading it first if needed.
    ///
    /// Ignored while closed.
    pub fn show_slide(&mut self, id: SlideId) -> Result<()> {
        let state = self.catalog.slide(id).ok_or(SlideshowError::UnknownSlide(id))?.state;
        let Some(session) = &mut self.session else {
            debug!(?id, "show_slide while closed; ignored");
            return Ok(());
        };
        session.gallery = id.gallery;

        if state.is_resolved() {
            self.clear_show_requests();
            if self.loading_signalled {
                self.loading_signalled = false;
                self.signals.emit(&SlideEvent::StopLoading);
            }
            self.change_slide(id);
            return Ok(());
        }

        // Only one slide may wait for display at a time.
        self.clear_show_requests();
        if let Some(slide) = self.catalog.slide_mut(id) {
            slide.show_requested = true;
        }
        if !self.loading_signalled {
            self.loading_signalled = true;
            self.signals.emit(&SlideEvent::StartLoading);
        }
        self.phase = Phase::Loading;

        if state.is_loading() {
            debug!(?id, "slide already loading; display deferred to its completion");
        } else {
            self.request_load(id);
        }
        Ok(())
    }

    /// Load a slide without displaying it. Slides that are loaded, loading or
    /// failed are left alone.
    pub fn load_slide(&mut self, id: SlideId) -> Result<()> {
        let slide = self.catalog.slide(id).ok_or(SlideshowError::UnknownSlide(id))?;
        if slide.state.is_not_started() {
            self.request_load(id);
        }
        Ok(())
    }

    fn request_load(&mut self, id: SlideId) {
        let Some(slide) = self.catalog.slide_mut(id) else {
            return;
        };
        slide.state = crate::catalog::PreloadState::Loading;
        debug!(?id, image = %slide.image, "requesting image");
        self.loader.request(id, &slide.image);
    }

    fn clear_show_requests(&mut self) {
        for slide in self.catalog.slides_mut() {
            slide.show_requested = false;
        }
    }

    pub fn next_slide(&mut self, preload_only: bool) {
        self.navigate(true, preload_only);
    }

    pub fn prev_slide(&mut self, preload_only: bool) {
        self.navigate(false, preload_only);
    }

    /// Slide navigation counts from: the displayed one if it belongs to the
    /// session's gallery, else the one waiting to be displayed, else the
    /// first of the gallery.
    fn anchor(&self) -> Option<SlideId> {
        let session = self.session.as_ref()?;
        if let Some(current) = session.current.filter(|c| c.gallery == session.gallery) {
            return Some(current);
        }
        let gallery = self.catalog.gallery_at(session.gallery)?;
        let waiting = gallery.slides().iter().find(|s| s.show_requested).map(|s| s.id);
        Some(waiting.unwrap_or(SlideId {
            gallery: session.gallery,
            index: 0,
        }))
    }

    fn navigate(&mut self, forward: bool, preload_only: bool) {
        let Some(from) = self.anchor() else {
            debug!("navigation while closed; ignored");
            return;
        };
        let len = self.catalog.gallery_len(from);
        if len == 0 {
            return;
        }
        let index = if forward {
            (from.index + 1) % len
        } else {
            (from.index + len - 1) % len
        };
        let target = SlideId {
            gallery: from.gallery,
            index,
        };

        let no_wrap = self.session.as_ref().is_some_and(|s| s.options.disable_wraparound_loop);
        if forward && no_wrap && index < from.index {
            if !preload_only {
                debug!("end of gallery with wraparound disabled; closing");
                self.close();
            }
            return;
        }

        let result = if preload_only {
            if target == from {
                return;
            }
            self.load_slide(target)
        } else {
            self.show_slide(target)
        };
        if let Err(e) = result {
            warn!("Navigation to {:?} failed: {}", target, e);
        }
    }

    fn change_slide(&mut self, new: SlideId) {
        let Some(session) = &mut self.session else {
            return;
        };
        let old = session.current;
        if old == Some(new) {
            self.phase = self.settled_phase(new);
            return;
        }
        session.current = Some(new);
        let fade = Duration::from_millis(u64::from(session.options.fade_duration_ms));
        let now = Instant::now();

        if let Some(old) = old {
            if let Some(snapshot) = self.snapshot(old) {
                self.signals.emit(&SlideEvent::EndOfSlide(snapshot));
            }
            self.crossfade.fade_out(old, fade, now);
        }

        self.refresh_layout(new);
        self.phase = self.settled_phase(new);

        let visible = self.catalog.slide(new).is_some_and(Slide::is_loaded);
        if visible && !fade.is_zero() {
            self.crossfade.fade_in(new, fade, now);
            self.fading_in = Some(new);
        } else {
            self.crossfade.cancel(new);
            self.fading_in = None;
            self.slide_started(new);
        }
    }

    fn settled_phase(&self, id: SlideId) -> Phase {
        if self.catalog.slide(id).is_some_and(Slide::is_failed) {
            Phase::Error
        } else {
            Phase::Showing
        }
    }

    fn slide_started(&mut self, id: SlideId) {
        if let Some(snapshot) = self.snapshot(id) {
            self.signals.emit(&SlideEvent::StartOfSlide(snapshot));
        }
        self.next_slide(true);
    }

    fn snapshot(&self, id: SlideId) -> Option<SlideRef> {
        self.catalog.slide(id).map(Slide::snapshot)
    }

    /// Advance fades. Returns `true` while something is still animating.
    pub fn tick(&mut self, now: Instant) -> bool {
        let progress = self.crossfade.advance(now);
        if let Some(shown) = progress.shown {
            if self.fading_in == Some(shown) && self.current() == Some(shown) {
                self.fading_in = None;
                self.slide_started(shown);
            }
        }
        self.crossfade.is_active()
    }

    // ---- loading outcomes ----

    pub fn apply_outcome(&mut self, outcome: LoadOutcome) {
        match outcome {
            LoadOutcome::Loaded { slide, image } => self.on_image_loaded(slide, image),
            LoadOutcome::Failed { slide, error } => self.on_image_failed(slide, error),
        }
    }

    pub fn on_image_loaded(&mut self, id: SlideId, image: SlideImage) {
        let viewport = self.viewport();
        let no_enlarge = self.active_options().no_enlarge_beyond_native_size;
        let Some(slide) = self.catalog.slide_mut(id) else {
            warn!(?id, "image loaded for unknown slide");
            return;
        };
        if slide.is_resolved() {
            debug!(?id, "slide already resolved; keeping existing image");
            return;
        }
        debug!(?id, width = image.width, height = image.height, "image loaded");
        slide.layout = Some(fit_to_viewport(viewport, image.natural_size(), no_enlarge));
        slide.element = Some(image);
        slide.state = crate::catalog::PreloadState::Loaded;
        let requested = std::mem::take(&mut slide.show_requested);

        if requested {
            self.finish_display_load(id);
        }
    }

    pub fn on_image_failed(&mut self, id: SlideId, error: SlideshowError) {
        let Some(slide) = self.catalog.slide_mut(id) else {
            warn!(?id, "image failure for unknown slide");
            return;
        };
        if slide.is_resolved() {
            return;
        }
        warn!("Slide {:?} failed to load: {}", id, error);
        slide.state = crate::catalog::PreloadState::Failed;
        slide.element = None;
        slide.layout = None;
        let requested = std::mem::take(&mut slide.show_requested);
        let snapshot = slide.snapshot();

        if requested && self.loading_signalled {
            self.loading_signalled = false;
            self.signals.emit(&SlideEvent::StopLoading);
        }
        self.signals.emit(&SlideEvent::Error(snapshot));
        if requested {
            self.change_slide(id);
        }
    }

    fn finish_display_load(&mut self, id: SlideId) {
        if self.loading_signalled {
            self.loading_signalled = false;
            self.signals.emit(&SlideEvent::StopLoading);
        }
        self.change_slide(id);
    }

    // ---- input ----

    /// Handle a key press. Returns `true` if it was bound to an action.
    pub fn key_down(&mut self, key: KeyBinding) -> bool {
        if !self.keyboard_bound() {
            return false;
        }
        let Some(action) = self.bindings.action_for(&key) else {
            return false;
        };
        debug!(?key, ?action, "key action");
        match action {
            Action::NextSlide => self.next_slide(false),
            Action::PreviousSlide => self.prev_slide(false),
            Action::Close => self.close(),
        }
        true
    }

    /// The platform reported a fullscreen change.
    pub fn on_fullscreen_change(&mut self, fullscreen: bool) {
        if self.tracker.changed(fullscreen) && self.is_open() {
            info!("fullscreen left by user; closing slideshow");
            self.close();
        }
    }

    // ---- sizing ----

    fn viewport(&self) -> Size {
        self.host.viewport_size()
    }

    fn active_options(&self) -> &Options {
        self.session.as_ref().map_or(&self.options, |s| &s.options)
    }

    /// Resize the overlay (once it exists) to the viewport and re-fit loaded
    /// slides.
    pub fn update_size(&mut self) {
        let viewport = self.viewport();
        let no_enlarge = self.active_options().no_enlarge_beyond_native_size;
        if let Some(overlay) = &mut self.overlay {
            overlay.size = viewport;
        }
        for slide in self.catalog.slides_mut() {
            if let Some(image) = &slide.element {
                slide.layout = Some(fit_to_viewport(viewport, image.natural_size(), no_enlarge));
            }
        }
        self.signals.emit(&SlideEvent::UpdateSize);
    }

    fn refresh_layout(&mut self, id: SlideId) {
        let viewport = self.viewport();
        let no_enlarge = self.active_options().no_enlarge_beyond_native_size;
        if let Some(slide) = self.catalog.slide_mut(id) {
            slide.layout = slide
                .element
                .as_ref()
                .map(|image| fit_to_viewport(viewport, image.natural_size(), no_enlarge));
        }
    }

    // ---- closing ----

    /// Close the session and put the page back the way it was.
    pub fn close(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        if let Some(current) = session.current {
            if let Some(snapshot) = self.snapshot(current) {
                self.signals.emit(&SlideEvent::EndOfSlide(snapshot));
            }
        }
        if self.loading_signalled {
            self.loading_signalled = false;
            self.signals.emit(&SlideEvent::StopLoading);
        }
        self.crossfade.clear();
        self.fading_in = None;
        self.clear_show_requests();

        match session.presentation {
            Presentation::Fullscreen => {
                if self.tracker.exiting() {
                    self.fullscreen.exit();
                }
            }
            Presentation::HiddenPage => self.host.show_page_content(&session.hidden),
        }
        if let Some(offset) = session.saved_scroll {
            self.host.set_scroll_offset(offset);
        }
        if let Some(overlay) = &mut self.overlay {
            overlay.visible = false;
        }
        self.phase = Phase::Closed;
        info!("slideshow closed");
    }

    // ---- rendering ----

    /// Snapshot of what to draw at `now`, `None` while the overlay is hidden.
    pub fn view(&self, now: Instant) -> Option<OverlayView<'_>> {
        let overlay = self.overlay.as_ref().filter(|o| o.visible)?;
        let current_id = self.current();

        let mut slides = Vec::new();
        for id in self.crossfade.fading_out() {
            if Some(id) == current_id {
                continue;
            }
            if let Some(view) = self.slide_view(id, now) {
                slides.push(view);
            }
        }
        if let Some(view) = current_id.and_then(|id| self.slide_view(id, now)) {
            slides.push(view);
        }

        Some(OverlayView {
            background_rgb: overlay.background_rgb,
            size: overlay.size,
            slides,
            current: current_id.and_then(|id| self.catalog.slide(id)),
            loading: self.loading_signalled,
        })
    }

    fn slide_view(&self, id: SlideId, now: Instant) -> Option<SlideView<'_>> {
        let slide = self.catalog.slide(id)?;
        let image = slide.element.as_ref()?;
        let layout = slide.layout?;
        let opacity = match self.crossfade.opacity(id, now) {
            Some(opacity) => opacity,
            None if Some(id) == self.current() => 1.0,
            None => return None,
        };
        Some(SlideView {
            id,
            image,
            layout,
            opacity,
        })
    }
}


#[cfg(test)]
impl<H: Host, L: ImageSource> Slideshow<H, crate::test_utils::FakeFullscreen, L> {
    fn fullscreen_for_test(&mut self) -> &mut crate::test_utils::FakeFullscreen {
        &mut self.fullscreen
    }

    fn tracker_state(&self) -> crate::fullscreen::FullscreenState {
        self.tracker.state()
    }
}
