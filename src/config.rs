/*
 *  config.rs
 *
 *  sharpmip - Sharp Memory-in-Pixel display driver
 *  (c) 2020-26 Stuart Hunter
 *
 *  Layered configuration: defaults, YAML file, command line
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

use crate::display::framebuffer::MAX_ROWS;

/// LS013B7DH05, the panel the demo was written against
pub const DEFAULT_WIDTH: u32 = 144;
pub const DEFAULT_HEIGHT: u32 = 168;
pub const DEFAULT_SPI_BUS: &str = "/dev/spidev0.0";
pub const DEFAULT_SPI_SPEED_HZ: u32 = 2_000_000;
pub const DEFAULT_CS_PIN: u64 = 28;
pub const DEFAULT_SETTLE_MS: u32 = 10;
pub const DEFAULT_VCOM_INTERVAL_MS: u64 = 1000;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level app configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default)]
pub struct Config {
    /// General options
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    /// panel geometry & wiring
    pub display: Option<DisplayConfig>,
    /// raw glyph table file used by the demo
    pub font: Option<PathBuf>,
    pub demo: Option<DemoConfig>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default)]
pub struct DisplayConfig {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub settle_ms: Option<u32>,        // pause after each transmission
    pub vcom_interval_ms: Option<u64>, // idle keep-alive period, <= 1000
    pub bus: Option<BusConfig>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BusConfig {
    Spi {
        bus: String,          // e.g. "/dev/spidev0.0"
        speed_hz: Option<u32>,
        cs_pin: u64,          // sysfs GPIO number, chip select is active-high
    },
}

impl Default for BusConfig {
    fn default() -> Self {
        BusConfig::Spi {
            bus: DEFAULT_SPI_BUS.to_string(),
            speed_hz: Some(DEFAULT_SPI_SPEED_HZ),
            cs_pin: DEFAULT_CS_PIN,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default)]
pub struct DemoConfig {
    pub frames: Option<u64>,     // 0 = run forever
    pub start_row: Option<u32>,  // first row of the moving text
    pub end_row: Option<u32>,    // text stops moving here
    pub dump: Option<bool>,      // log the framebuffer as ASCII after drawing
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "sharpmip", about = "Sharp Memory-in-Pixel display demo", disable_help_flag = false)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    #[arg(long)]
    pub display_width: Option<u32>,
    #[arg(long)]
    pub display_height: Option<u32>,
    #[arg(long)]
    pub spi_bus: Option<String>,
    #[arg(long)]
    pub spi_speed_hz: Option<u32>,
    #[arg(long)]
    pub cs_pin: Option<u64>,
    /// Raw glyph table: [width_bytes, height_px, first_char] + bitmaps
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub font: Option<PathBuf>,
    /// stop the demo after N iterations (0 = forever)
    #[arg(long)]
    pub frames: Option<u64>,
    /// log the framebuffer as ASCII art after each draw
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump: bool,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Public entry point: parse CLI, read YAML, merge, validate.
pub fn load() -> Result<Config, ConfigError> {
    let cli = Cli::parse();
    let cfg = load_with(&cli)?;

    if cli.dump_config {
        // Pretty YAML of effective config (nice for debugging)
        let s = serde_yaml::to_string(&cfg)?;
        println!("{s}");
        std::process::exit(0);
    }

    Ok(cfg)
}

/// Everything `load` does except parsing argv and the dump/exit.
pub fn load_with(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;
    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/sharpmip/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/sharpmip/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/sharpmip.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["sharpmip.yaml", "config.yaml", "config/sharpmip.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    parse_yaml(&s)
}

pub fn parse_yaml(s: &str) -> Result<Config, ConfigError> {
    let cfg: Config = serde_yaml::from_str(s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    // top-level
    if src.log_level.is_some()      { dst.log_level = src.log_level; }
    if src.font.is_some()           { dst.font = src.font; }
    // display
    match (&mut dst.display, src.display) {
        (None, Some(c)) => dst.display = Some(c),
        (Some(d), Some(s)) => merge_display(d, s),
        _ => {}
    }
    match (&mut dst.demo, src.demo) {
        (None, Some(c)) => dst.demo = Some(c),
        (Some(d), Some(s)) => merge_demo(d, s),
        _ => {}
    }
}

fn merge_display(dst: &mut DisplayConfig, src: DisplayConfig) {
    if src.width.is_some()            { dst.width = src.width; }
    if src.height.is_some()           { dst.height = src.height; }
    if src.settle_ms.is_some()        { dst.settle_ms = src.settle_ms; }
    if src.vcom_interval_ms.is_some() { dst.vcom_interval_ms = src.vcom_interval_ms; }
    if src.bus.is_some()              { dst.bus = src.bus; }
}

fn merge_demo(dst: &mut DemoConfig, src: DemoConfig) {
    if src.frames.is_some()     { dst.frames = src.frames; }
    if src.start_row.is_some()  { dst.start_row = src.start_row; }
    if src.end_row.is_some()    { dst.end_row = src.end_row; }
    if src.dump.is_some()       { dst.dump = src.dump; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some()       { cfg.log_level = cli.log_level.clone(); }
    if cli.font.is_some()            { cfg.font = cli.font.clone(); }

    let any_display = cli.display_width.is_some()
        || cli.display_height.is_some()
        || cli.spi_bus.is_some()
        || cli.spi_speed_hz.is_some()
        || cli.cs_pin.is_some();
    if any_display && cfg.display.is_none() {
        cfg.display = Some(DisplayConfig::default());
    }
    if let Some(display) = cfg.display.as_mut() {
        if cli.display_width.is_some()   { display.width = cli.display_width; }
        if cli.display_height.is_some()  { display.height = cli.display_height; }

        if cli.spi_bus.is_some() || cli.spi_speed_hz.is_some() || cli.cs_pin.is_some() {
            let BusConfig::Spi { bus, speed_hz, cs_pin } =
                display.bus.get_or_insert_with(BusConfig::default);
            if let Some(b) = cli.spi_bus.as_ref() { *bus = b.clone(); }
            if cli.spi_speed_hz.is_some()         { *speed_hz = cli.spi_speed_hz; }
            if let Some(p) = cli.cs_pin           { *cs_pin = p; }
        }
    }

    if cli.frames.is_some() || cli.dump {
        let demo = cfg.demo.get_or_insert_with(DemoConfig::default);
        if cli.frames.is_some() { demo.frames = cli.frames; }
        if cli.dump             { demo.dump = Some(true); }
    }
}

/// Put any invariants here (required fields, ranges, etc.)
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(display) = cfg.display.as_ref() {
        let w = display.width.unwrap_or(DEFAULT_WIDTH);
        let h = display.height.unwrap_or(DEFAULT_HEIGHT);
        if w == 0 || h == 0 {
            return Err(ConfigError::Validation("display width/height must be > 0".into()));
        }
        if h > MAX_ROWS {
            return Err(ConfigError::Validation(format!("display height must be <= {MAX_ROWS}")));
        }
        if let Some(ms) = display.vcom_interval_ms {
            if ms == 0 || ms > DEFAULT_VCOM_INTERVAL_MS {
                return Err(ConfigError::Validation(
                    "display vcom_interval_ms must be 1..=1000 (panel needs a toggle every second)".into(),
                ));
            }
        }
        if let Some(BusConfig::Spi { bus, speed_hz, .. }) = display.bus.as_ref() {
            if bus.is_empty() {
                return Err(ConfigError::Validation("spi bus path must not be empty".into()));
            }
            if *speed_hz == Some(0) {
                return Err(ConfigError::Validation("spi speed_hz must be > 0".into()));
            }
        }
    }
    if let Some(demo) = cfg.demo.as_ref() {
        for row in [demo.start_row, demo.end_row].into_iter().flatten() {
            if row > MAX_ROWS {
                return Err(ConfigError::Validation(format!("demo rows must be <= {MAX_ROWS}")));
            }
        }
        if let (Some(start), Some(end)) = (demo.start_row, demo.end_row) {
            if start >= end {
                return Err(ConfigError::Validation("demo start_row must be below end_row".into()));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
log_level: debug
font: fonts/font_16x20.bin
display:
  width: 400
  height: 240
  vcom_interval_ms: 500
  bus:
    type: spi
    bus: /dev/spidev1.0
    speed_hz: 1000000
    cs_pin: 8
demo:
  frames: 10
"#;

    #[test]
    fn test_parse_yaml() {
        let cfg = parse_yaml(SAMPLE).unwrap();
        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
        assert_eq!(cfg.font, Some(PathBuf::from("fonts/font_16x20.bin")));
        let display = cfg.display.as_ref().unwrap();
        assert_eq!(display.width, Some(400));
        assert_eq!(display.vcom_interval_ms, Some(500));
        match display.bus.as_ref().unwrap() {
            BusConfig::Spi { bus, speed_hz, cs_pin } => {
                assert_eq!(bus, "/dev/spidev1.0");
                assert_eq!(*speed_hz, Some(1_000_000));
                assert_eq!(*cs_pin, 8);
            }
        }
        assert_eq!(cfg.demo.unwrap().frames, Some(10));
        assert!(validate(&parse_yaml(SAMPLE).unwrap()).is_ok());
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let mut dst = parse_yaml(SAMPLE).unwrap();
        let src = parse_yaml("display:\n  height: 200\n").unwrap();
        merge(&mut dst, src);
        let display = dst.display.unwrap();
        assert_eq!(display.width, Some(400));
        assert_eq!(display.height, Some(200));
        assert!(display.bus.is_some());
    }

    #[test]
    fn test_cli_overrides() {
        let mut cfg = parse_yaml(SAMPLE).unwrap();
        let cli = Cli {
            display_width: Some(144),
            cs_pin: Some(5),
            frames: Some(3),
            dump: true,
            ..Default::default()
        };
        apply_cli_overrides(&mut cfg, &cli);
        let display = cfg.display.as_ref().unwrap();
        assert_eq!(display.width, Some(144));
        assert_eq!(display.height, Some(240));
        match display.bus.as_ref().unwrap() {
            BusConfig::Spi { bus, cs_pin, .. } => {
                assert_eq!(bus, "/dev/spidev1.0");
                assert_eq!(*cs_pin, 5);
            }
        }
        let demo = cfg.demo.unwrap();
        assert_eq!(demo.frames, Some(3));
        assert_eq!(demo.dump, Some(true));
    }

    #[test]
    fn test_cli_creates_display_section() {
        let mut cfg = Config::default();
        let cli = Cli { spi_bus: Some("/dev/spidev0.1".into()), ..Default::default() };
        apply_cli_overrides(&mut cfg, &cli);
        match cfg.display.unwrap().bus.unwrap() {
            BusConfig::Spi { bus, speed_hz, cs_pin } => {
                assert_eq!(bus, "/dev/spidev0.1");
                assert_eq!(speed_hz, Some(DEFAULT_SPI_SPEED_HZ));
                assert_eq!(cs_pin, DEFAULT_CS_PIN);
            }
        }
    }

    #[test]
    fn test_validation_failures() {
        for yaml in [
            "display:\n  width: 0\n",
            "display:\n  height: 300\n",
            "display:\n  vcom_interval_ms: 1500\n",
            "display:\n  vcom_interval_ms: 0\n",
            "display:\n  bus:\n    type: spi\n    bus: ''\n    cs_pin: 1\n",
            "display:\n  bus:\n    type: spi\n    bus: /dev/spidev0.0\n    speed_hz: 0\n    cs_pin: 1\n",
            "demo:\n  start_row: 50\n  end_row: 20\n",
            "demo:\n  end_row: 4294967295\n",
            "demo:\n  start_row: 4294967290\n  end_row: 4294967295\n",
        ] {
            let cfg = parse_yaml(yaml).unwrap();
            assert!(matches!(validate(&cfg), Err(ConfigError::Validation(_))), "{yaml}");
        }
    }

    #[test]
    fn test_missing_explicit_config_file() {
        let cli = Cli { config: Some(PathBuf::from("/nonexistent/sharpmip.yaml")), ..Default::default() };
        assert!(matches!(load_with(&cli), Err(ConfigError::Validation(_))));
    }
}
