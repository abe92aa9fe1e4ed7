use anyhow::{Context, Result};
use renderer::{Renderer, RendererConfig, TextureSource};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::settings::Settings;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn run(cli: Cli) -> Result<()> {
    let settings = match &cli.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };

    let config = build_config(&cli, settings);
    tracing::info!(
        texture = %config
            .texture
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "(placeholder)".into()),
        width = config.surface_size.0,
        height = config.surface_size.1,
        antialias = ?config.antialiasing,
        "starting spincube"
    );

    Renderer::new(config).run()
}

/// Merges the three configuration layers: CLI flags win over the settings
/// file, which wins over the built-in defaults.
fn build_config(cli: &Cli, settings: Settings) -> RendererConfig {
    let defaults = RendererConfig::default();
    RendererConfig {
        surface_size: cli.size.or(settings.size).unwrap_or(defaults.surface_size),
        window_title: cli
            .title
            .clone()
            .or(settings.title)
            .unwrap_or(defaults.window_title),
        texture: cli
            .texture
            .as_deref()
            .or(settings.texture.as_deref())
            .map(TextureSource::parse),
        antialiasing: cli
            .antialias
            .or(settings.antialias)
            .unwrap_or(defaults.antialiasing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use renderer::Antialiasing;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("spincube").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_apply_when_nothing_is_given() {
        let config = build_config(&cli(&[]), Settings::default());
        assert_eq!(config.surface_size, (640, 480));
        assert_eq!(config.window_title, "spincube");
        assert!(config.texture.is_none());
        assert_eq!(config.antialiasing, Antialiasing::Auto);
    }

    #[test]
    fn settings_file_overrides_defaults() {
        let settings = Settings::from_toml_str(
            r#"
texture = "crate.png"
size = "1024x768"
antialias = "off"
title = "from file"
"#,
        )
        .unwrap();
        let config = build_config(&cli(&[]), settings);
        assert_eq!(config.surface_size, (1024, 768));
        assert_eq!(config.window_title, "from file");
        assert_eq!(config.texture, Some(TextureSource::Path("crate.png".into())));
        assert_eq!(config.antialiasing, Antialiasing::Off);
    }

    #[test]
    fn cli_flags_override_the_settings_file() {
        let settings = Settings::from_toml_str(
            r#"
texture = "file.png"
size = "1024x768"
antialias = "off"
title = "from file"
"#,
        )
        .unwrap();
        let config = build_config(
            &cli(&[
                "cli.png",
                "--size",
                "800x600",
                "--antialias",
                "4",
                "--title",
                "from cli",
            ]),
            settings,
        );
        assert_eq!(config.surface_size, (800, 600));
        assert_eq!(config.window_title, "from cli");
        assert_eq!(config.texture, Some(TextureSource::Path("cli.png".into())));
        assert_eq!(config.antialiasing, Antialiasing::Samples(4));
    }

    #[test]
    fn url_textures_are_classified_as_remote() {
        let config = build_config(&cli(&["https://example.com/a.png"]), Settings::default());
        assert_eq!(
            config.texture,
            Some(TextureSource::Url("https://example.com/a.png".into()))
        );
    }

    #[test]
    fn layers_merge_per_field_not_wholesale() {
        // The file sets the title, the CLI sets the size; both should land.
        let settings = Settings::from_toml_str("title = \"from file\"").unwrap();
        let config = build_config(&cli(&["--size", "300x200"]), settings);
        assert_eq!(config.surface_size, (300, 200));
        assert_eq!(config.window_title, "from file");
    }
}
