//! Configuration module for slideshow options and shortcuts.
//!
//! Options can come from an INI file (`config.ini` in the platform config
//! directory) and may be patched at runtime through [`OptionsPatch`].

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::animation::EasingFunction;
use crate::error::{Result, SlideshowError};
use crate::input::{binding_to_string, parse_key_binding, Action, KeyBindings};

const DEFAULT_CONFIG_INI: &str = include_str!("../config.ini");

/// Default crossfade duration, matching the classic 400 ms fade.
pub const DEFAULT_FADE_MS: u32 = 400;

/// Presentation options for a slideshow session.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Overlay background colour as RGB (0-255)
    pub background_rgb: [u8; 3],
    /// Request native fullscreen when the platform supports it
    pub use_fullscreen_api: bool,
    /// Never scale a slide beyond its natural dimensions
    pub no_enlarge_beyond_native_size: bool,
    /// Close instead of wrapping from the last slide to the first
    pub disable_wraparound_loop: bool,
    /// Crossfade duration in milliseconds
    pub fade_duration_ms: u32,
    pub fade_easing: EasingFunction,
    /// Slide index used by `start` when none is given
    pub start_slide: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            background_rgb: [0, 0, 0],
            use_fullscreen_api: true,
            no_enlarge_beyond_native_size: false,
            disable_wraparound_loop: false,
            fade_duration_ms: DEFAULT_FADE_MS,
            fade_easing: EasingFunction::Swing,
            start_slide: 0,
        }
    }
}

/// Partial update applied by the `setOptions` command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionsPatch {
    pub background_rgb: Option<[u8; 3]>,
    pub use_fullscreen_api: Option<bool>,
    pub no_enlarge_beyond_native_size: Option<bool>,
    pub disable_wraparound_loop: Option<bool>,
    pub fade_duration_ms: Option<u32>,
    pub fade_easing: Option<EasingFunction>,
    pub start_slide: Option<usize>,
}

impl OptionsPatch {
    pub fn apply(&self, options: &mut Options) {
        if let Some(v) = self.background_rgb {
            options.background_rgb = v;
        }
        if let Some(v) = self.use_fullscreen_api {
            options.use_fullscreen_api = v;
        }
        if let Some(v) = self.no_enlarge_beyond_native_size {
            options.no_enlarge_beyond_native_size = v;
        }
        if let Some(v) = self.disable_wraparound_loop {
            options.disable_wraparound_loop = v;
        }
        if let Some(v) = self.fade_duration_ms {
            options.fade_duration_ms = v;
        }
        if let Some(v) = self.fade_easing {
            options.fade_easing = v;
        }
        if let Some(v) = self.start_slide {
            options.start_slide = v;
        }
    }
}

/// Application configuration loaded from INI file
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub options: Options,
    pub bindings: KeyBindings,
    /// Number of background decode threads
    pub loader_threads: usize,
    /// Longest side allowed for decoded images; 0 disables downscaling
    pub max_texture_side: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            options: Options::default(),
            bindings: KeyBindings::default(),
            loader_threads: 2,
            max_texture_side: 8192,
        }
    }
}

impl Config {
    /// Get the configuration directory, creating it if needed.
    fn config_dir() -> PathBuf {
        let dir = directories::ProjectDirs::from("", "", "fullscreen-slides")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        if let Err(e) = fs::create_dir_all(&dir) {
            warn!("Could not create config directory {:?}: {}", dir, e);
        }
        dir
    }

    /// Get settings file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.ini")
    }

    /// Load configuration from the default location
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, writing the default template there
    /// if the file does not exist yet.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            if let Err(e) = fs::write(path, DEFAULT_CONFIG_INI) {
                warn!("Could not write default config to {:?}: {}", path, e);
            }
            return Self::parse_ini(DEFAULT_CONFIG_INI);
        }

        match fs::read_to_string(path) {
            Ok(content) => {
                debug!("Loaded config from {:?}", path);
                Self::parse_ini(&content)
            }
            Err(e) => {
                warn!("Could not read config {:?}: {}; using defaults", path, e);
                Self::parse_ini(DEFAULT_CONFIG_INI)
            }
        }
    }

    /// Parse INI content into Config
    pub fn parse_ini(content: &str) -> Self {
        let mut config = Config::default();
        let mut rebound: Vec<Action> = Vec::new();

        let mut in_slideshow_section = false;
        let mut in_loader_section = false;
        let mut in_shortcuts_section = false;

        for line in content.lines() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                let section = &line[1..line.len() - 1];
                in_slideshow_section = section.eq_ignore_ascii_case("slideshow")
                    || section.eq_ignore_ascii_case("settings");
                in_loader_section = section.eq_ignore_ascii_case("loader");
                in_shortcuts_section = section.eq_ignore_ascii_case("shortcuts");
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            if in_shortcuts_section {
                if let Some(action) = Action::from_str(&key) {
                    // The first entry for an action replaces its defaults
                    if !rebound.contains(&action) {
                        config.bindings.clear_action(action);
                        rebound.push(action);
                    }
                    for binding_str in value.split(',') {
                        match parse_key_binding(binding_str) {
                            Some(binding) => config.bindings.add(binding, action),
                            None if binding_str.trim().is_empty() => {}
                            None => warn!("Unknown key binding '{}' for {}", binding_str.trim(), key),
                        }
                    }
                }
            } else if in_slideshow_section {
                let options = &mut config.options;
                match key.as_str() {
                    "background" | "background_color" | "bg_color" | "background_rgb" => {
                        if let Some(rgb) = parse_color(value) {
                            options.background_rgb = rgb;
                        }
                    }
                    "use_fullscreen_api" | "use_fullscreen" => {
                        if let Some(v) = parse_bool(value) {
                            options.use_fullscreen_api = v;
                        }
                    }
                    "no_enlarge_beyond_native_size" | "no_enlarge" => {
                        if let Some(v) = parse_bool(value) {
                            options.no_enlarge_beyond_native_size = v;
                        }
                    }
                    "disable_wraparound_loop" | "no_wraparound" => {
                        if let Some(v) = parse_bool(value) {
                            options.disable_wraparound_loop = v;
                        }
                    }
                    "fade_duration_ms" | "fade_ms" => {
                        if let Ok(v) = value.parse::<u32>() {
                            options.fade_duration_ms = v.min(10_000);
                        }
                    }
                    "fade_easing" | "easing" => {
                        if let Some(v) = EasingFunction::from_str(value) {
                            options.fade_easing = v;
                        }
                    }
                    "start_slide" => {
                        if let Ok(v) = value.parse::<usize>() {
                            options.start_slide = v;
                        }
                    }
                    _ => {}
                }
            } else if in_loader_section {
                match key.as_str() {
                    "threads" | "loader_threads" => {
                        if let Ok(v) = value.parse::<usize>() {
                            config.loader_threads = v.clamp(1, 16);
                        }
                    }
                    "max_texture_side" => {
                        if let Ok(v) = value.parse::<u32>() {
                            config.max_texture_side = v;
                        }
                    }
                    _ => {}
                }
            }
        }

        config
    }

    /// Render the configuration as INI text
    pub fn to_ini(&self) -> String {
        let o = &self.options;
        let mut content = String::new();

        content.push_str("; Fullscreen Slides configuration\n\n");
        content.push_str("[Slideshow]\n");
        content.push_str(&format!(
            "background = #{:02x}{:02x}{:02x}\n",
            o.background_rgb[0], o.background_rgb[1], o.background_rgb[2]
        ));
        content.push_str(&format!("use_fullscreen_api = {}\n", o.use_fullscreen_api));
        content.push_str(&format!(
            "no_enlarge_beyond_native_size = {}\n",
            o.no_enlarge_beyond_native_size
        ));
        content.push_str(&format!("disable_wraparound_loop = {}\n", o.disable_wraparound_loop));
        content.push_str(&format!("fade_duration_ms = {}\n", o.fade_duration_ms));
        content.push_str(&format!("fade_easing = {}\n", o.fade_easing.as_str()));
        content.push_str(&format!("start_slide = {}\n\n", o.start_slide));

        content.push_str("[Loader]\n");
        content.push_str(&format!("threads = {}\n", self.loader_threads));
        content.push_str(&format!("max_texture_side = {}\n\n", self.max_texture_side));

        content.push_str("[Shortcuts]\n");
        for action in Action::ALL {
            let keys: Vec<String> = self
                .bindings
                .bindings_for(action)
                .iter()
                .map(binding_to_string)
                .collect();
            content.push_str(&format!("{} = {}\n", action.as_str(), keys.join(", ")));
        }

        content
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_ini()).map_err(|e| SlideshowError::config(path, e))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Parse `#rgb`, `#rrggbb` or an `r, g, b` triplet
pub fn parse_color(value: &str) -> Option<[u8; 3]> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex_color(hex);
    }

    let parts: Vec<&str> = value
        .split(',')
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 3 {
        return None;
    }
    let r = parts[0].parse::<u8>().ok()?;
    let g = parts[1].parse::<u8>().ok()?;
    let b = parts[2].parse::<u8>().ok()?;
    Some([r, g, b])
}

fn parse_hex_color(hex: &str) -> Option<[u8; 3]> {
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (slot, c) in rgb.iter_mut().zip(hex.chars()) {
                let v = c.to_digit(16)? as u8;
                *slot = v * 17;
            }
            Some(rgb)
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some([r, g, b])
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Key, KeyBinding};
    use tempfile::tempdir;

    #[test]
    fn template_parses_to_defaults() {
        assert_eq!(Config::parse_ini(DEFAULT_CONFIG_INI), Config::default());
    }

    #[test]
    fn colors_accept_hex_and_triplets() {
        assert_eq!(parse_color("#000"), Some([0, 0, 0]));
        assert_eq!(parse_color("#fff"), Some([255, 255, 255]));
        assert_eq!(parse_color("#1a2B3c"), Some([0x1a, 0x2b, 0x3c]));
        assert_eq!(parse_color("10, 20, 30"), Some([10, 20, 30]));
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("red"), None);
    }

    #[test]
    fn settings_and_shortcuts_are_read() {
        let config = Config::parse_ini(
            "[Slideshow]\n\
             background = 20, 20, 20\n\
             use_fullscreen_api = no\n\
             disable_wraparound_loop = on\n\
             fade_duration_ms = 0\n\
             [Loader]\n\
             threads = 99\n\
             [Shortcuts]\n\
             next_slide = space, n\n",
        );

        assert_eq!(config.options.background_rgb, [20, 20, 20]);
        assert!(!config.options.use_fullscreen_api);
        assert!(config.options.disable_wraparound_loop);
        assert_eq!(config.options.fade_duration_ms, 0);
        assert_eq!(config.loader_threads, 16);
        assert_eq!(
            config.bindings.action_for(&KeyBinding::Key(Key::Space)),
            Some(Action::NextSlide)
        );
        // replaced, not extended
        assert_eq!(config.bindings.action_for(&KeyBinding::Key(Key::ArrowRight)), None);
        // untouched actions keep their defaults
        assert_eq!(
            config.bindings.action_for(&KeyBinding::Key(Key::Escape)),
            Some(Action::Close)
        );
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let mut options = Options::default();
        OptionsPatch {
            disable_wraparound_loop: Some(true),
            ..OptionsPatch::default()
        }
        .apply(&mut options);

        assert!(options.disable_wraparound_loop);
        assert!(options.use_fullscreen_api);
        assert_eq!(options.fade_duration_ms, DEFAULT_FADE_MS);
    }

    #[test]
    fn missing_file_is_created_from_template() {
        let dir = tempdir().expect("failed to create temp dir");
        let path = dir.path().join("config.ini");

        let config = Config::load_from(&path);
        assert_eq!(config, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempdir().expect("failed to create temp dir");
        let path = dir.path().join("config.ini");

        let mut config = Config::default();
        config.options.background_rgb = [1, 2, 3];
        config.options.no_enlarge_beyond_native_size = true;
        config.options.fade_easing = EasingFunction::EaseOut;
        config.max_texture_side = 4096;
        config.save_to(&path).expect("save config");

        assert_eq!(Config::load_from(&path), config);
    }
}
