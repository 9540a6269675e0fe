use clap::Parser;

use crate::content::{CONTACT_EMAIL, OWNER, PROFILE_PHOTO};
use crate::critique::{DEFAULT_ENDPOINT, DEFAULT_MODEL};

pub const HELP_KEYS: &str = "\
Key Bindings (lightbox open):
  Esc           : Close
  Left          : Previous image
  Right         : Next image
  Wheel         : Zoom (100% - 500%)
  Drag          : Pan while zoomed
  c             : Request a critique of the current image

Key Bindings (pages):
  Wheel         : Scroll
  Tab           : Next contact form field
";

#[derive(Parser)]
#[command(name = "folio", about = "A portfolio gallery with a zoomable lightbox", after_help = HELP_KEYS)]
pub struct Cli {
    /// Image URLs, files or directories for the collection. Defaults to the built-in collection.
    pub sources: Vec<String>,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Follow symbolic links (default: false)
    #[arg(long)]
    pub follow_links: bool,

    /// Portrait shown on the About page
    #[arg(long, value_name = "URL", default_value = PROFILE_PHOTO)]
    pub profile_photo: String,

    /// Name shown in the header and footer
    #[arg(long, default_value = OWNER)]
    pub owner: String,

    /// Address shown on the Contact page
    #[arg(long, default_value = CONTACT_EMAIL)]
    pub email: String,

    /// Memory budget for full-size images (e.g. 512MB, 2GB). Default: 10% of RAM.
    #[arg(short, long, value_parser = parse_memory_budget)]
    pub memory: Option<u64>,

    /// API key for the critique service
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model used for critiques
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Base URL of the critique service
    #[arg(long, value_name = "URL", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

/// Parses `512MB`, `1.5GB` or a bare number of megabytes into bytes.
pub fn parse_memory_budget(s: &str) -> Result<u64, String> {
    let s = s.trim().to_uppercase();
    let (num, unit) = if let Some(num) = s.strip_suffix("GB") {
        (num, 1024.0 * 1024.0 * 1024.0)
    } else if let Some(num) = s.strip_suffix("MB") {
        (num, 1024.0 * 1024.0)
    } else {
        (s.as_str(), 1024.0 * 1024.0)
    };
    let value: f64 = num
        .trim()
        .parse()
        .map_err(|_| format!("invalid memory budget: {s:?}"))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(format!("memory budget must be positive: {s:?}"));
    }
    Ok((value * unit) as u64)
}

pub fn default_memory_budget() -> u64 {
    let mut sys = sysinfo::System::new();
    sys.refresh_memory();
    sys.total_memory() / 10
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;

    #[test]
    fn parses_units() {
        assert_eq!(parse_memory_budget("512MB"), Ok(512 * MB));
        assert_eq!(parse_memory_budget("2gb"), Ok(2048 * MB));
        assert_eq!(parse_memory_budget("1.5GB"), Ok(1536 * MB));
        assert_eq!(parse_memory_budget(" 300 "), Ok(300 * MB));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_memory_budget("lots").is_err());
        assert!(parse_memory_budget("-1GB").is_err());
        assert!(parse_memory_budget("0").is_err());
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["folio"]).unwrap();
        assert!(cli.sources.is_empty());
        assert_eq!(cli.profile_photo, PROFILE_PHOTO);
        assert_eq!(cli.model, DEFAULT_MODEL);
        assert!(cli.memory.is_none());
    }

    #[test]
    fn memory_flag_is_parsed() {
        let cli = Cli::try_parse_from(["folio", "-m", "256MB", "photos"]).unwrap();
        assert_eq!(cli.memory, Some(256 * MB));
        assert_eq!(cli.sources, vec!["photos"]);
    }
}
