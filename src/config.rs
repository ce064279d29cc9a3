//! Service configuration: settings file mapping and byte-size strings.

use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::render::prefetch;

/// Default cache budget (10 MB).
pub const DEFAULT_CACHE_BYTES: usize = 10_000_000;

/// Renders with a dimension under this many pixels are not worth
/// rendering or caching.
pub const DEFAULT_MIN_RENDER_DIMENSION: u32 = 10;

pub const DEFAULT_RENDER_WORKERS: usize = 2;

/// User-facing settings, as read from the configuration file.
///
/// Every field is optional in the file. Invalid values never fail startup:
/// [`Settings::resolve`] substitutes the default for each bad field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Cache budget as a human size string ("10MB", "512KiB", "1.5G").
    #[serde(default = "default_cache_size")]
    pub cache_size: String,

    /// Name of the prefetch strategy to run.
    #[serde(default = "default_prefetch_strategy")]
    pub prefetch_strategy: String,

    #[serde(default = "default_render_workers")]
    pub render_workers: usize,

    #[serde(default = "default_min_render_dimension")]
    pub min_render_dimension: u32,
}

fn default_cache_size() -> String {
    "10MB".to_string()
}

fn default_prefetch_strategy() -> String {
    "default".to_string()
}

fn default_render_workers() -> usize {
    DEFAULT_RENDER_WORKERS
}

fn default_min_render_dimension() -> u32 {
    DEFAULT_MIN_RENDER_DIMENSION
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_size: default_cache_size(),
            prefetch_strategy: default_prefetch_strategy(),
            render_workers: default_render_workers(),
            min_render_dimension: default_min_render_dimension(),
        }
    }
}

impl Settings {
    /// Parse settings from TOML text, falling back to defaults when the
    /// document does not parse.
    #[must_use]
    pub fn load_from_str(text: &str) -> Self {
        match toml::from_str(text) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("failed to parse settings: {e}");
                Self::default()
            }
        }
    }

    /// Read settings from a file, falling back to defaults when the file
    /// is missing or unreadable.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::load_from_str(&text),
            Err(e) => {
                warn!("failed to read settings from {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Validate field by field into a runnable configuration, keeping the
    /// default for every invalid value.
    #[must_use]
    pub fn resolve(&self) -> RenderConfig {
        let max_cache_bytes = match parse_byte_size(&self.cache_size) {
            Some(bytes) if bytes > 0 => bytes as usize,
            _ => {
                warn!(
                    "invalid cache size {:?}, keeping {}",
                    self.cache_size,
                    format_byte_size(DEFAULT_CACHE_BYTES as u64)
                );
                DEFAULT_CACHE_BYTES
            }
        };

        let prefetch_strategy = if prefetch::strategy_by_name(&self.prefetch_strategy).is_some() {
            self.prefetch_strategy.trim().to_string()
        } else {
            warn!(
                "unknown prefetch strategy {:?}, known strategies: {}",
                self.prefetch_strategy,
                prefetch::strategy_names().join(", ")
            );
            default_prefetch_strategy()
        };

        let render_workers = if self.render_workers == 0 {
            warn!("render_workers must be at least 1");
            DEFAULT_RENDER_WORKERS
        } else {
            self.render_workers
        };

        RenderConfig {
            max_cache_bytes,
            prefetch_strategy,
            render_workers,
            min_render_dimension: self.min_render_dimension,
        }
    }
}

/// Validated runtime configuration for
/// [`RenderService`](crate::render::RenderService).
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub max_cache_bytes: usize,
    pub prefetch_strategy: String,
    pub render_workers: usize,
    pub min_render_dimension: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Settings::default().resolve()
    }
}

// Suffix table ordered so the first (case-insensitive) match wins.
const SUFFIXES: &[(&str, u64)] = &[
    ("G", 1_000_000_000),
    ("GB", 1_000_000_000),
    ("GiB", 1 << 30),
    ("M", 1_000_000),
    ("MB", 1_000_000),
    ("MiB", 1 << 20),
    ("K", 1_000),
    ("KB", 1_000),
    ("KiB", 1 << 10),
    ("B", 1),
];

/// Parse a human byte-size string ("10MB", "512KiB", "1.5G", "2048").
///
/// Suffix optional, case-insensitive, fractional values allowed. `None`
/// when the numeric part does not parse or is negative.
#[must_use]
pub fn parse_byte_size(text: &str) -> Option<u64> {
    let text = text.trim();
    let mut number = text;
    let mut factor = 1u64;
    let lower = text.to_ascii_lowercase();
    for &(suffix, suffix_factor) in SUFFIXES {
        if lower.ends_with(&suffix.to_ascii_lowercase()) {
            number = text[..text.len() - suffix.len()].trim_end();
            factor = suffix_factor;
            break;
        }
    }

    let value: f64 = number.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some((value * factor as f64) as u64)
}

/// Format a byte count for humans ("9.54MiB").
#[must_use]
pub fn format_byte_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB", "PiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2}{}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_and_binary_suffixes() {
        assert_eq!(parse_byte_size("10MB"), Some(10_000_000));
        assert_eq!(parse_byte_size("10MiB"), Some(10 * 1024 * 1024));
        assert_eq!(parse_byte_size("500k"), Some(500_000));
        assert_eq!(parse_byte_size("1.5KiB"), Some(1536));
        assert_eq!(parse_byte_size("2G"), Some(2_000_000_000));
        assert_eq!(parse_byte_size("123B"), Some(123));
    }

    #[test]
    fn parses_bare_numbers_and_whitespace() {
        assert_eq!(parse_byte_size("2048"), Some(2048));
        assert_eq!(parse_byte_size(" 10 MiB "), Some(10 * 1024 * 1024));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_byte_size("plenty"), None);
        assert_eq!(parse_byte_size(""), None);
        assert_eq!(parse_byte_size("MB"), None);
        assert_eq!(parse_byte_size("-5MB"), None);
    }

    #[test]
    fn formats_binary_units() {
        assert_eq!(format_byte_size(0), "0.00B");
        assert_eq!(format_byte_size(1536), "1.50KiB");
        assert_eq!(format_byte_size(10_000_000), "9.54MiB");
    }

    #[test]
    fn resolve_keeps_valid_settings() {
        let settings = Settings {
            cache_size: "32MiB".into(),
            prefetch_strategy: "disabled".into(),
            render_workers: 4,
            min_render_dimension: 16,
        };
        let config = settings.resolve();
        assert_eq!(config.max_cache_bytes, 32 * 1024 * 1024);
        assert_eq!(config.prefetch_strategy, "disabled");
        assert_eq!(config.render_workers, 4);
        assert_eq!(config.min_render_dimension, 16);
    }

    #[test]
    fn resolve_falls_back_per_field() {
        let settings = Settings {
            cache_size: "a lot".into(),
            prefetch_strategy: "psychic".into(),
            render_workers: 0,
            min_render_dimension: 10,
        };
        let config = settings.resolve();
        assert_eq!(config.max_cache_bytes, DEFAULT_CACHE_BYTES);
        assert_eq!(config.prefetch_strategy, "default");
        assert_eq!(config.render_workers, DEFAULT_RENDER_WORKERS);
    }

    #[test]
    fn load_from_str_accepts_partial_files() {
        let settings = Settings::load_from_str("cache_size = \"64MiB\"\n");
        assert_eq!(settings.cache_size, "64MiB");
        assert_eq!(settings.prefetch_strategy, "default");
    }

    #[test]
    fn load_from_str_falls_back_on_parse_error() {
        let settings = Settings::load_from_str("cache_size = [broken");
        assert_eq!(settings.cache_size, default_cache_size());
    }

    #[test]
    fn load_reads_files_and_survives_missing_ones() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deckrender.toml");
        std::fs::write(&path, "prefetch_strategy = \"disabled\"\n").unwrap();

        assert_eq!(Settings::load(&path).prefetch_strategy, "disabled");
        assert_eq!(
            Settings::load(&dir.path().join("absent.toml")).prefetch_strategy,
            "default"
        );
    }
}
