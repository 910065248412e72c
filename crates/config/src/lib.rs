//! Tilelevel Configuration Management
//!
//! Loads the loader configuration from a `key = value` text file.
//!
//! ```text
//! # tilelevel.cfg
//! map = assets/map1.tmx
//! assetroot = assets
//! stricttextures = false
//! loglevel = info
//! playertype = Player
//! collidertypes = Enemy, Snail
//! proptypes = Tree, Sign
//! json = false
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tilelevel_core::{CoreError, Result};

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "tilelevel.cfg";

/// Loader configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderConfig {
    /// Map file to load (from "map" option)
    pub map: PathBuf,
    /// Texture path prefix (from "assetroot" option, default: map directory)
    pub asset_root: Option<PathBuf>,
    /// Fail on texture load errors (from "stricttextures" option)
    pub strict_textures: bool,
    /// Log filter directive (from "loglevel" option)
    pub log_level: String,
    /// Type name registered as the player (from "playertype" option)
    pub player_type: String,
    /// Type names registered as colliding non-player objects (from "collidertypes")
    pub collider_types: Vec<String>,
    /// Type names registered as plain sprites (from "proptypes")
    pub prop_types: Vec<String>,
    /// Print the level summary as JSON (from "json" option)
    pub json: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            map: PathBuf::from("assets/map1.tmx"),
            asset_root: None,
            strict_textures: false,
            log_level: "info".to_string(),
            player_type: "Player".to_string(),
            collider_types: vec!["Enemy".to_string()],
            prop_types: Vec::new(),
            json: false,
        }
    }
}

impl LoaderConfig {
    /// Load configuration from a file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load `tilelevel.cfg` if it exists, otherwise the defaults
    pub fn load_default() -> Result<Self> {
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            Self::load_from_file(DEFAULT_CONFIG_FILE)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration content
    pub fn parse(content: &str) -> Result<Self> {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                config.parse_option(&key.trim().to_lowercase(), value.trim());
            } else {
                tracing::warn!("Ignoring config line without '=': {}", line);
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn parse_option(&mut self, key: &str, value: &str) {
        match key {
            "map" => self.map = PathBuf::from(value),
            "assetroot" => {
                self.asset_root = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            "stricttextures" => {
                self.strict_textures = value.parse().unwrap_or(false);
            }
            "loglevel" => self.log_level = value.into(),
            "playertype" => self.player_type = value.into(),
            "collidertypes" => self.collider_types = parse_list(value),
            "proptypes" => self.prop_types = parse_list(value),
            "json" => {
                self.json = value.parse().unwrap_or(false);
            }
            _ => tracing::debug!("Unknown config option: {}", key),
        }
    }

    /// Reject configurations the loader cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.map.as_os_str().is_empty() {
            return Err(CoreError::Config("'map' must name a map file".into()));
        }
        if self.player_type.is_empty() {
            return Err(CoreError::Config("'playertype' must not be empty".into()));
        }

        let mut seen = vec![self.player_type.as_str()];
        for name in self.collider_types.iter().chain(&self.prop_types) {
            if seen.contains(&name.as_str()) {
                return Err(CoreError::Config(format!(
                    "object type '{}' is listed more than once",
                    name
                )));
            }
            seen.push(name);
        }
        Ok(())
    }

    /// Log the active configuration
    pub fn display(&self) {
        tracing::info!("Loader configuration:");
        tracing::info!("  Map: {}", self.map.display());
        match &self.asset_root {
            Some(root) => tracing::info!("  Asset root: {}", root.display()),
            None => tracing::info!("  Asset root: (map directory)"),
        }
        tracing::info!("  Strict textures: {}", self.strict_textures);
        tracing::info!("  Player type: {}", self.player_type);
        tracing::info!("  Collider types: {}", self.collider_types.join(", "));
        tracing::info!("  Prop types: {}", self.prop_types.join(", "));
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
