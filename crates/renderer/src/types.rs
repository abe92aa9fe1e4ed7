use std::fmt;
use std::path::PathBuf;

/// Anti-aliasing behaviour requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Antialiasing {
    /// Pick the highest surface-supported sample count up to 4x.
    Auto,
    /// Disable MSAA and render directly into the swapchain.
    Off,
    /// Request a specific MSAA sample count (clamped to what the device supports).
    Samples(u32),
}

impl Default for Antialiasing {
    fn default() -> Self {
        Self::Auto
    }
}

/// Where the cube texture comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureSource {
    /// Image file on disk.
    Path(PathBuf),
    /// Image fetched over HTTP(S) by the loader thread.
    Url(String),
}

impl TextureSource {
    /// Classifies a raw argument string: `http://` and `https://` prefixes
    /// are remote sources, everything else is a filesystem path.
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Self::Url(raw.to_owned())
        } else {
            Self::Path(PathBuf::from(raw))
        }
    }
}

impl fmt::Display for TextureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// Immutable configuration passed to the renderer at start-up.
///
/// Mirrors the CLI flags: how large the window should be, which image to
/// wrap around the cube, and how much MSAA to apply.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Window size in physical pixels.
    pub surface_size: (u32, u32),
    /// Title of the spawned window.
    pub window_title: String,
    /// Optional texture for the cube faces; a placeholder is shown until it
    /// loads (or forever, if it never does).
    pub texture: Option<TextureSource>,
    /// Anti-aliasing mode requested by the caller.
    pub antialiasing: Antialiasing,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (640, 480),
            window_title: "spincube".to_owned(),
            texture: None,
            antialiasing: Antialiasing::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_and_https_strings_are_remote_sources() {
        assert_eq!(
            TextureSource::parse("https://example.com/crate.png"),
            TextureSource::Url("https://example.com/crate.png".into())
        );
        assert_eq!(
            TextureSource::parse("http://example.com/crate.png"),
            TextureSource::Url("http://example.com/crate.png".into())
        );
    }

    #[test]
    fn other_strings_are_paths() {
        assert_eq!(
            TextureSource::parse("textures/crate.png"),
            TextureSource::Path(PathBuf::from("textures/crate.png"))
        );
        // A scheme-looking substring later in the string stays a path.
        assert_eq!(
            TextureSource::parse("assets/https-logo.png"),
            TextureSource::Path(PathBuf::from("assets/https-logo.png"))
        );
    }

    #[test]
    fn display_shows_the_original_location() {
        assert_eq!(
            TextureSource::parse("textures/crate.png").to_string(),
            "textures/crate.png"
        );
        assert_eq!(
            TextureSource::parse("https://example.com/a.png").to_string(),
            "https://example.com/a.png"
        );
    }

    #[test]
    fn default_config_is_a_small_untextured_window() {
        let config = RendererConfig::default();
        assert_eq!(config.surface_size, (640, 480));
        assert!(config.texture.is_none());
        assert_eq!(config.antialiasing, Antialiasing::Auto);
    }
}
