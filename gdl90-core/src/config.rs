//! Configuration file management for the gdl90 tools.
//!
//! Reads/writes `~/.gdl90/config.yaml` with receiver, recorder and sender
//! defaults. Command-line flags override whatever is loaded here.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::types::{Gdl90Error, Result};

/// GDL-90 broadcast port used by most portable receivers.
pub const DEFAULT_PORT: u16 = 43211;

/// Full configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Config {
    pub receiver: ReceiverSettings,
    pub recorder: RecorderSettings,
    pub sender: SenderSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverSettings {
    pub port: u16,
    /// Largest datagram or file chunk read at once.
    pub maxsize: usize,
    /// Log a progress line every this many packets.
    pub reportcount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderSettings {
    pub port: u16,
    pub maxsize: usize,
    /// Seconds between flushes of the capture file.
    pub dataflush: u64,
    /// Directory capture files are written to.
    pub logprefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderSettings {
    pub dest: String,
    pub port: u16,
    /// Bytes per datagram when replaying a capture.
    pub size: usize,
    pub delay_ms: u64,
}

impl Default for ReceiverSettings {
    fn default() -> Self {
        ReceiverSettings {
            port: DEFAULT_PORT,
            maxsize: 9000,
            reportcount: 100,
        }
    }
}

impl Default for RecorderSettings {
    fn default() -> Self {
        RecorderSettings {
            port: DEFAULT_PORT,
            maxsize: 1500,
            dataflush: 10,
            logprefix: ".".into(),
        }
    }
}

impl Default for SenderSettings {
    fn default() -> Self {
        SenderSettings {
            dest: "255.255.255.255".into(),
            port: DEFAULT_PORT,
            size: 50,
            delay_ms: 10,
        }
    }
}

/// Get the config directory path (`~/.gdl90/`).
pub fn config_dir() -> PathBuf {
    dirs_home().join(".gdl90")
}

/// Get the config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.yaml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Load config from `~/.gdl90/config.yaml`, defaults if it doesn't exist.
pub fn load_config() -> Result<Config> {
    load_config_from(&config_file())
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = std::fs::read_to_string(path)?;
    parse_config(&text)
}

/// Save config to `~/.gdl90/config.yaml`.
pub fn save_config(config: &Config) -> Result<PathBuf> {
    let path = config_file();
    save_config_to(config, &path)?;
    Ok(path)
}

pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, serialize_config(config))?;
    Ok(())
}

/// Parse simple YAML-like config text.
///
/// Unknown sections and keys are skipped with a warning; a value that
/// doesn't parse for its key is an error.
pub fn parse_config(text: &str) -> Result<Config> {
    let mut config = Config::default();
    let mut current_section: Option<String> = None;

    for (lineno, line) in text.lines().enumerate() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }

        let is_indented = line.starts_with("  ") || line.starts_with('\t');

        let Some((key, val)) = stripped.split_once(':') else {
            return Err(Gdl90Error::Config(format!(
                "line {}: expected 'key: value'",
                lineno + 1
            )));
        };
        let key = key.trim();
        let val = val.trim();

        if !is_indented {
            current_section = val.is_empty().then(|| key.to_string());
            if current_section.is_none() {
                warn!(key, "ignoring top-level config key");
            }
            continue;
        }

        let Some(section) = current_section.as_deref() else {
            continue;
        };
        match (section, key) {
            ("receiver", "port") => config.receiver.port = parse_number(key, val)?,
            ("receiver", "maxsize") => config.receiver.maxsize = parse_number(key, val)?,
            ("receiver", "reportcount") => config.receiver.reportcount = parse_number(key, val)?,
            ("recorder", "port") => config.recorder.port = parse_number(key, val)?,
            ("recorder", "maxsize") => config.recorder.maxsize = parse_number(key, val)?,
            ("recorder", "dataflush") => config.recorder.dataflush = parse_number(key, val)?,
            ("recorder", "logprefix") => {
                if let Some(v) = parse_string_value(val) {
                    config.recorder.logprefix = v;
                }
            }
            ("sender", "dest") => {
                if let Some(v) = parse_string_value(val) {
                    config.sender.dest = v;
                }
            }
            ("sender", "port") => config.sender.port = parse_number(key, val)?,
            ("sender", "size") => config.sender.size = parse_number(key, val)?,
            ("sender", "delay_ms") => config.sender.delay_ms = parse_number(key, val)?,
            _ => warn!(section, key, "ignoring unknown config key"),
        }
    }

    Ok(config)
}

fn parse_string_value(val: &str) -> Option<String> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    // Strip quotes
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        return Some(val[1..val.len() - 1].to_string());
    }
    Some(val.to_string())
}

fn parse_number<T: std::str::FromStr>(key: &str, val: &str) -> Result<T> {
    val.parse()
        .map_err(|_| Gdl90Error::Config(format!("{key}: invalid number '{val}'")))
}

/// Serialize config to YAML-like text.
pub fn serialize_config(config: &Config) -> String {
    let mut lines = vec!["# gdl90 configuration".to_string(), String::new()];

    lines.push("receiver:".into());
    lines.push(format!("  port: {}", config.receiver.port));
    lines.push(format!("  maxsize: {}", config.receiver.maxsize));
    lines.push(format!("  reportcount: {}", config.receiver.reportcount));
    lines.push(String::new());

    lines.push("recorder:".into());
    lines.push(format!("  port: {}", config.recorder.port));
    lines.push(format!("  maxsize: {}", config.recorder.maxsize));
    lines.push(format!("  dataflush: {}", config.recorder.dataflush));
    lines.push(format!("  logprefix: \"{}\"", config.recorder.logprefix));
    lines.push(String::new());

    lines.push("sender:".into());
    lines.push(format!("  dest: \"{}\"", config.sender.dest));
    lines.push(format!("  port: {}", config.sender.port));
    lines.push(format!("  size: {}", config.sender.size));
    lines.push(format!("  delay_ms: {}", config.sender.delay_ms));

    lines.join("\n") + "\n"
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.receiver.port, 43211);
        assert_eq!(config.receiver.maxsize, 9000);
        assert_eq!(config.receiver.reportcount, 100);
        assert_eq!(config.recorder.maxsize, 1500);
        assert_eq!(config.recorder.dataflush, 10);
        assert_eq!(config.recorder.logprefix, ".");
        assert_eq!(config.sender.dest, "255.255.255.255");
        assert_eq!(config.sender.size, 50);
        assert_eq!(config.sender.delay_ms, 10);
    }

    #[test]
    fn test_parse_config() {
        let text = r#"
# local overrides
receiver:
  port: 4000
  reportcount: 10

recorder:
  logprefix: "/var/log/gdl90"
  dataflush: 5

sender:
  dest: '192.168.10.255'
  size: 100
"#;
        let config = parse_config(text).unwrap();
        assert_eq!(config.receiver.port, 4000);
        assert_eq!(config.receiver.maxsize, 9000);
        assert_eq!(config.receiver.reportcount, 10);
        assert_eq!(config.recorder.logprefix, "/var/log/gdl90");
        assert_eq!(config.recorder.dataflush, 5);
        assert_eq!(config.sender.dest, "192.168.10.255");
        assert_eq!(config.sender.size, 100);
        assert_eq!(config.sender.port, 43211);
    }

    #[test]
    fn test_parse_config_null_keeps_default() {
        let text = "recorder:\n  logprefix: null\nsender:\n  dest: ~\n";
        let config = parse_config(text).unwrap();
        assert_eq!(config.recorder.logprefix, ".");
        assert_eq!(config.sender.dest, "255.255.255.255");
    }

    #[test]
    fn test_parse_config_unknown_keys_skipped() {
        let text = "webhook: x\ndashboard:\n  port: 1\nreceiver:\n  colour: blue\n";
        assert_eq!(parse_config(text).unwrap(), Config::default());
    }

    #[test]
    fn test_parse_config_bad_number() {
        let err = parse_config("receiver:\n  port: 70000\n").unwrap_err();
        assert!(matches!(err, Gdl90Error::Config(_)));
        let err = parse_config("sender:\n  size: lots\n").unwrap_err();
        assert!(err.to_string().contains("size"));
    }

    #[test]
    fn test_parse_config_missing_colon() {
        assert!(parse_config("receiver\n").is_err());
    }

    #[test]
    fn test_roundtrip() {
        let mut config = Config::default();
        config.receiver.port = 4000;
        config.recorder.logprefix = "/tmp/caps".into();
        config.sender.dest = "10.0.0.255".into();
        config.sender.delay_ms = 250;
        let parsed = parse_config(&serialize_config(&config)).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let mut config = Config::default();
        config.recorder.maxsize = 2048;
        save_config_to(&config, &path).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), config);
    }
}
