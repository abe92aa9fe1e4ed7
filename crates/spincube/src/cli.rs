use std::path::PathBuf;

use clap::Parser;
use renderer::Antialiasing;

#[derive(Parser, Debug)]
#[command(
    name = "spincube",
    author,
    version,
    about = "Spin a textured cube with the mouse"
)]
pub struct Cli {
    /// Image to wrap around the cube: a file path or an http(s) URL.
    /// A solid placeholder is shown until it loads.
    #[arg(value_name = "TEXTURE")]
    pub texture: Option<String>,

    /// Window size (e.g. `800x600`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_surface_size)]
    pub size: Option<(u32, u32)>,

    /// Anti-aliasing policy: `auto`, `off`, or an explicit MSAA sample count (e.g. `4`).
    #[arg(long, value_name = "MODE", value_parser = parse_antialias)]
    pub antialias: Option<Antialiasing>,

    /// Window title.
    #[arg(long, value_name = "TITLE")]
    pub title: Option<String>,

    /// Optional TOML settings file; command-line flags win over its values.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_antialias(value: &str) -> Result<Antialiasing, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("anti-alias mode must not be empty".to_string());
    }

    let normalized = trimmed.to_ascii_lowercase();
    match normalized.as_str() {
        "auto" | "max" | "default" => Ok(Antialiasing::Auto),
        "off" | "none" | "disable" | "disabled" | "0" => Ok(Antialiasing::Off),
        _ => {
            let samples: u32 = normalized.parse().map_err(|_| {
                format!("invalid anti-alias sample count '{trimmed}'; use auto/off or 2/4/8/16")
            })?;

            if samples == 1 {
                return Ok(Antialiasing::Off);
            }

            if !matches!(samples, 2 | 4 | 8 | 16) {
                return Err(format!(
                    "unsupported sample count {samples}; supported values are 2, 4, 8, or 16"
                ));
            }

            Ok(Antialiasing::Samples(samples))
        }
    }
}

pub fn parse_surface_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT (e.g. 800x600)".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid width '{}'", w.trim()))?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid height '{}'", h.trim()))?;
    if width == 0 || height == 0 {
        return Err("window dimensions must be greater than zero".into());
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_antialias_variants() {
        assert_eq!(parse_antialias("auto").unwrap(), Antialiasing::Auto);
        assert_eq!(parse_antialias("MAX").unwrap(), Antialiasing::Auto);
        assert_eq!(parse_antialias("off").unwrap(), Antialiasing::Off);
        assert_eq!(parse_antialias("0").unwrap(), Antialiasing::Off);
        assert_eq!(parse_antialias("1").unwrap(), Antialiasing::Off);
        assert_eq!(parse_antialias("4").unwrap(), Antialiasing::Samples(4));
        assert_eq!(parse_antialias(" 16 ").unwrap(), Antialiasing::Samples(16));
        assert!(parse_antialias("3").is_err());
        assert!(parse_antialias("fancy").is_err());
        assert!(parse_antialias("").is_err());
    }

    #[test]
    fn parses_surface_sizes() {
        assert_eq!(parse_surface_size("800x600").unwrap(), (800, 600));
        assert_eq!(parse_surface_size("1920X1080").unwrap(), (1920, 1080));
        assert_eq!(parse_surface_size(" 640 x 480 ").unwrap(), (640, 480));
        assert!(parse_surface_size("800").is_err());
        assert!(parse_surface_size("0x600").is_err());
        assert!(parse_surface_size("800xtall").is_err());
    }

    #[test]
    fn positional_texture_and_flags_parse_together() {
        let cli = Cli::try_parse_from([
            "spincube",
            "crate.png",
            "--size",
            "1024x768",
            "--antialias",
            "4",
            "--title",
            "my cube",
        ])
        .unwrap();
        assert_eq!(cli.texture.as_deref(), Some("crate.png"));
        assert_eq!(cli.size, Some((1024, 768)));
        assert_eq!(cli.antialias, Some(Antialiasing::Samples(4)));
        assert_eq!(cli.title.as_deref(), Some("my cube"));
    }

    #[test]
    fn no_arguments_is_a_valid_invocation() {
        let cli = Cli::try_parse_from(["spincube"]).unwrap();
        assert!(cli.texture.is_none());
        assert!(cli.size.is_none());
        assert!(cli.antialias.is_none());
    }
}
