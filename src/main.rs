//! Fullscreen Slides desktop host
//! Built with Rust + egui (eframe)

#![windows_subsystem = "windows"]

#[cfg(feature = "mimalloc-allocator")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use eframe::egui;
use tracing::{info, warn};

use fullscreen_slides::input::parse_key;
use fullscreen_slides::loader::{images_in_directory, is_supported_image};
use fullscreen_slides::{
    Command, Config, FullscreenApi, Host, ImageLoader, KeyBinding, Link, SignalKind, Size, SlideId,
    SlideView, Slideshow, DEFAULT_GALLERY,
};

/// One gallery's block of links on the page
struct Section {
    key: String,
    links: Vec<(SlideId, String)>,
    visible: bool,
}

/// The link page underneath the overlay
struct PageHost {
    viewport: Size,
    scroll: f32,
    /// Offset to force on the scroll area next frame
    pending_scroll: Option<f32>,
    sections: Vec<Section>,
}

impl Host for PageHost {
    type Element = usize;

    fn viewport_size(&self) -> Size {
        self.viewport
    }

    fn scroll_offset(&self) -> f32 {
        self.scroll
    }

    fn set_scroll_offset(&mut self, offset: f32) {
        self.scroll = offset;
        self.pending_scroll = Some(offset);
    }

    fn hide_page_content(&mut self) -> Vec<usize> {
        let mut hidden = Vec::new();
        for (i, section) in self.sections.iter_mut().enumerate() {
            if section.visible {
                section.visible = false;
                hidden.push(i);
            }
        }
        hidden
    }

    fn show_page_content(&mut self, elements: &[usize]) {
        for &i in elements {
            if let Some(section) = self.sections.get_mut(i) {
                section.visible = true;
            }
        }
    }
}

/// Native fullscreen through viewport commands
struct ViewportFullscreen {
    ctx: egui::Context,
}

impl FullscreenApi for ViewportFullscreen {
    fn is_supported(&self) -> bool {
        true
    }

    fn enter(&mut self) -> fullscreen_slides::Result<()> {
        self.ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(true));
        Ok(())
    }

    fn exit(&mut self) {
        self.ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(false));
    }
}

type AppSlideshow = Slideshow<PageHost, ViewportFullscreen, ImageLoader>;

/// Application state
struct SlidesApp {
    slideshow: AppSlideshow,
    /// Uploaded textures, one per loaded slide
    textures: HashMap<SlideId, egui::TextureHandle>,
    /// Last fullscreen state reported by the viewport
    was_fullscreen: bool,
    /// Last screen size seen, for resize detection
    last_screen: Option<egui::Vec2>,
}

impl SlidesApp {
    fn new(cc: &eframe::CreationContext<'_>, paths: Vec<PathBuf>) -> Self {
        let config = Config::load();
        let gpu_max = cc.egui_ctx.input(|i| i.max_texture_side) as u32;
        let max_side = match config.max_texture_side {
            0 => gpu_max,
            side => side.min(gpu_max),
        };

        let links = collect_links(&paths);
        info!("Starting with {} image link(s)", links.len());

        let host = PageHost {
            viewport: Size::new(1024.0, 768.0),
            scroll: 0.0,
            pending_scroll: None,
            sections: Vec::new(),
        };
        let fullscreen = ViewportFullscreen {
            ctx: cc.egui_ctx.clone(),
        };
        let loader = ImageLoader::new(config.loader_threads, max_side);

        let mut slideshow = Slideshow::new(host, fullscreen, loader, config.options.clone(), links)
            .with_bindings(config.bindings.clone());

        let sections = slideshow
            .catalog()
            .galleries()
            .iter()
            .map(|gallery| Section {
                key: gallery.key.clone(),
                links: gallery.slides().iter().map(|s| (s.id, s.title.clone())).collect(),
                visible: true,
            })
            .collect();
        slideshow.host_mut().sections = sections;

        slideshow.connect(SignalKind::Init, |_| info!("Slideshow overlay initialised"));
        slideshow.connect(SignalKind::Error, |event| {
            if let Some(slide) = event.slide() {
                warn!("Showing placeholder for {}", slide.image);
            }
        });

        Self {
            slideshow,
            textures: HashMap::new(),
            was_fullscreen: false,
            last_screen: None,
        }
    }

    /// Forward resizes and fullscreen changes to the slideshow
    fn track_viewport(&mut self, ctx: &egui::Context) {
        let screen = ctx.screen_rect().size();
        if self.last_screen != Some(screen) {
            self.last_screen = Some(screen);
            self.slideshow.host_mut().viewport = Size::new(screen.x, screen.y);
            // Infallible for resize commands
            let _ = self.slideshow.dispatch(Command::UpdateSize);
        }

        if let Some(fullscreen) = ctx.input(|i| i.viewport().fullscreen) {
            if fullscreen != self.was_fullscreen {
                self.was_fullscreen = fullscreen;
                self.slideshow.on_fullscreen_change(fullscreen);
            }
        }
    }

    /// Handle keyboard input
    fn handle_input(&mut self, ctx: &egui::Context) {
        let pressed: Vec<KeyBinding> = ctx.input(|input| {
            input
                .events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Key {
                        key,
                        pressed: true,
                        modifiers,
                        ..
                    } => {
                        let key = parse_key(key.name())?;
                        Some(if modifiers.ctrl {
                            KeyBinding::WithCtrl(key)
                        } else if modifiers.shift {
                            KeyBinding::WithShift(key)
                        } else if modifiers.alt {
                            KeyBinding::WithAlt(key)
                        } else {
                            KeyBinding::Key(key)
                        })
                    }
                    _ => None,
                })
                .collect()
        });

        for binding in pressed {
            self.slideshow.key_down(binding);
        }
    }

    /// Draw the overlay. Returns `false` when it is hidden.
    fn draw_overlay(&mut self, ctx: &egui::Context, now: Instant) -> bool {
        let Some(view) = self.slideshow.view(now) else {
            return false;
        };
        let [r, g, b] = view.background_rgb;
        let size = view.size;
        let loading = view.loading;
        let caption = view.current.map(|s| s.title.clone()).filter(|t| !t.is_empty());
        let failed = view.current.filter(|s| s.is_failed()).map(|s| s.image.clone());
        let slides: Vec<(egui::TextureId, egui::Rect, f32)> = view
            .slides
            .iter()
            .map(|slide| {
                let (x, y) = slide.layout.origin_in(size);
                let rect = egui::Rect::from_min_size(
                    egui::pos2(x, y),
                    egui::vec2(slide.layout.width, slide.layout.height),
                );
                (upload_texture(&mut self.textures, ctx, slide), rect, slide.opacity)
            })
            .collect();
        let sender = self.slideshow.command_sender();

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::from_rgb(r, g, b)))
            .show(ctx, |ui| {
                let origin = ui.max_rect().min.to_vec2();
                let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                for (texture, rect, opacity) in &slides {
                    ui.painter().image(
                        *texture,
                        rect.translate(origin),
                        uv,
                        egui::Color32::WHITE.gamma_multiply(*opacity),
                    );
                }

                let full = ui.max_rect();
                if let Some(image) = &failed {
                    ui.painter().text(
                        full.center(),
                        egui::Align2::CENTER_CENTER,
                        format!("Could not load {image}"),
                        egui::FontId::proportional(18.0),
                        egui::Color32::RED,
                    );
                }
                if loading {
                    let spinner = egui::Rect::from_center_size(full.center(), egui::vec2(32.0, 32.0));
                    ui.put(spinner, egui::Spinner::new().size(32.0));
                }
                if let Some(title) = &caption {
                    ui.painter().text(
                        full.center_bottom() - egui::vec2(0.0, 24.0),
                        egui::Align2::CENTER_BOTTOM,
                        title,
                        egui::FontId::proportional(16.0),
                        egui::Color32::from_gray(220),
                    );
                }

                let button = egui::vec2(36.0, 36.0);
                let controls = [
                    (full.right_top() + egui::vec2(-44.0, 8.0), "✕", Command::Close),
                    (
                        full.left_center() + egui::vec2(8.0, -18.0),
                        "←",
                        Command::PrevSlide { preload_only: false },
                    ),
                    (
                        full.right_center() + egui::vec2(-44.0, -18.0),
                        "→",
                        Command::NextSlide { preload_only: false },
                    ),
                ];
                for (pos, label, command) in controls {
                    let rect = egui::Rect::from_min_size(pos, button);
                    if ui.put(rect, egui::Button::new(label)).clicked() {
                        sender.send(command);
                    }
                }
            });
        true
    }

    fn draw_page(&mut self, ctx: &egui::Context) {
        let mut activated = None;
        let host = self.slideshow.host_mut();
        let pending = host.pending_scroll.take();

        egui::CentralPanel::default().show(ctx, |ui| {
            let mut area = egui::ScrollArea::vertical().auto_shrink([false, false]);
            if let Some(offset) = pending {
                area = area.vertical_scroll_offset(offset);
            }
            let output = area.show(ui, |ui| {
                if host.sections.is_empty() {
                    ui.label(
                        egui::RichText::new("Pass image files or folders as arguments")
                            .color(egui::Color32::GRAY)
                            .size(16.0),
                    );
                }
                for section in host.sections.iter().filter(|s| s.visible) {
                    let heading = if section.key == DEFAULT_GALLERY {
                        "Images"
                    } else {
                        section.key.as_str()
                    };
                    ui.heading(heading);
                    ui.horizontal_wrapped(|ui| {
                        for (id, title) in &section.links {
                            if ui.link(title).clicked() {
                                activated = Some(*id);
                            }
                        }
                    });
                    ui.separator();
                }
            });
            host.scroll = output.state.offset.y;
        });

        if let Some(id) = activated {
            if let Err(e) = self.slideshow.activate_link(id) {
                warn!("Could not open slideshow: {}", e);
            }
        }
    }
}

impl eframe::App for SlidesApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.track_viewport(ctx);
        self.handle_input(ctx);
        self.slideshow.pump();

        let now = Instant::now();
        let animating = self.slideshow.tick(now);

        if !self.draw_overlay(ctx, now) {
            self.draw_page(ctx);
        }

        if animating {
            ctx.request_repaint();
        } else if self.slideshow.loader().is_busy() {
            ctx.request_repaint_after(Duration::from_millis(30));
        }
    }
}

/// Texture for a slide, uploaded on first use
fn upload_texture(
    textures: &mut HashMap<SlideId, egui::TextureHandle>,
    ctx: &egui::Context,
    view: &SlideView<'_>,
) -> egui::TextureId {
    textures
        .entry(view.id)
        .or_insert_with(|| {
            let color_image = egui::ColorImage::from_rgba_unmultiplied(
                [view.image.width as usize, view.image.height as usize],
                &view.image.pixels,
            );
            ctx.load_texture(
                format!("slide-{}-{}", view.id.gallery, view.id.index),
                color_image,
                egui::TextureOptions::LINEAR,
            )
        })
        .id()
}

/// Turn command line paths into links: folders become galleries named after
/// the folder, loose files share the default gallery
fn collect_links(paths: &[PathBuf]) -> Vec<Link> {
    let mut links = Vec::new();
    for path in paths {
        if path.is_dir() {
            let rel = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            for image in images_in_directory(path) {
                links.push(link_for(&image).with_rel(rel.clone()));
            }
        } else if is_supported_image(path) {
            links.push(link_for(path));
        } else {
            warn!("Skipping unsupported path {}", path.display());
        }
    }
    links
}

fn link_for(path: &Path) -> Link {
    let title = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Link::new(path.to_string_lossy()).with_title(title)
}

fn main() -> eframe::Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .init();

    let paths: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Fullscreen Slides")
            .with_min_inner_size([320.0, 240.0])
            .with_inner_size([1024.0, 768.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Fullscreen Slides",
        options,
        Box::new(move |cc| Ok(Box::new(SlidesApp::new(cc, paths)))),
    )
}
