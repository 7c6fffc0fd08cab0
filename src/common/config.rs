use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub fn config_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".config"))
        .join("rift-workspaces")
        .join("config.toml")
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid color {0:?}, expected #rrggbb or #rrggbbaa")]
    InvalidColor(String),
    #[error("at least one workspace must be configured")]
    NoWorkspaces,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub workspaces: WorkspaceSettings,
    #[serde(default)]
    pub theme: ThemeSettings,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct WorkspaceSettings {
    /// Workspace names in the order they are created.
    pub names: Vec<String>,
    /// Minimum number of workspaces. Names missing from `names` are
    /// generated from `prefix`.
    pub number: Option<usize>,
    pub prefix: String,
    /// How long the OSD stays up after a switch, in milliseconds. Zero
    /// disables the OSD entirely.
    pub popup_time: u64,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            names: Vec::new(),
            number: None,
            prefix: "Workspace".to_string(),
            popup_time: 1000,
        }
    }
}

impl WorkspaceSettings {
    pub fn popup_duration(&self) -> Duration { Duration::from_millis(self.popup_time) }

    /// The ordered list of names the registry is initialized with.
    pub fn resolved_names(&self) -> Vec<String> {
        let count = self.number.unwrap_or(0).max(self.names.len()).max(1);
        let mut names = self.names.clone();
        for n in names.len()..count {
            names.push(format!("{} {}", self.prefix, n + 1));
        }
        names
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ThemeSettings {
    pub osd: OsdTheme,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct OsdTheme {
    pub bg_color: Color,
    pub border_color: Color,
    pub label_text_color: Color,
    pub border_width: f64,
    pub font_size: f64,
}

impl Default for OsdTheme {
    fn default() -> Self {
        Self {
            bg_color: Color::rgba(0xdd, 0xda, 0xd6, 0xff),
            border_color: Color::rgba(0x00, 0x00, 0x00, 0xff),
            label_text_color: Color::rgba(0x00, 0x00, 0x00, 0xff),
            border_width: 1.0,
            font_size: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self { Self { r, g, b, a } }
}

impl FromStr for Color {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidColor(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if !(hex.len() == 6 || hex.len() == 8) || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        let a = if hex.len() == 8 { channel(6)? } else { 0xff };
        Ok(Color::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }
}

impl TryFrom<String> for Color {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

impl From<Color> for String {
    fn from(c: Color) -> String { c.to_string() }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

impl Config {
    pub fn read(path: &Path) -> Result<Config, ConfigError> {
        let buf = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(?path, "loaded config file");
        Self::parse(&buf)
    }

    pub fn parse(buf: &str) -> Result<Config, ConfigError> {
        let config: Config = toml::from_str(buf)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if it exists, falling back to the defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        if path.exists() {
            Self::read(path)
        } else {
            debug!(?path, "no config file, using defaults");
            Ok(Config::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workspaces.resolved_names().is_empty() {
            return Err(ConfigError::NoWorkspaces);
        }
        Ok(())
    }
}
