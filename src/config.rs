use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub(crate) const CONFIG_FILE: &str = "config.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) lat: f64,
    pub(crate) long: f64,
    pub(crate) elevation: f64,
    pub(crate) timezone: String,
    pub(crate) ephemeris: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lat: -28.509160,
            long: 153.405900,
            elevation: 0.0,
            timezone: "Australia/Sydney".to_string(),
            ephemeris: PathBuf::from("ephemeris.json"),
        }
    }
}

/// Geodetic observer position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Observer {
    pub(crate) lat: f64,
    pub(crate) long: f64,
    pub(crate) elevation: f64,
}

impl Settings {
    pub(crate) fn observer(&self) -> Result<Observer> {
        if !(-90.0..=90.0).contains(&self.lat) {
            bail!("latitude {} out of range [-90, 90]", self.lat);
        }
        if !(-180.0..=180.0).contains(&self.long) {
            bail!("longitude {} out of range [-180, 180]", self.long);
        }
        Ok(Observer {
            lat: self.lat,
            long: self.long,
            elevation: self.elevation,
        })
    }
}

/// Config file candidates in lookup order: `./config.json`, then the platform
/// config directory.
pub(crate) fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE)];
    if let Some(proj) = ProjectDirs::from("com", "skywatch", "Skywatch") {
        paths.push(proj.config_dir().join(CONFIG_FILE));
    }
    paths
}

/// Reads settings from `path`. Keys missing from the file keep their defaults,
/// and a relative ephemeris path is taken relative to the file.
pub(crate) fn load_settings(path: &Path) -> Result<Settings> {
    let s = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut settings: Settings =
        serde_json::from_str(&s).with_context(|| format!("parsing {}", path.display()))?;
    if settings.ephemeris.is_relative() {
        if let Some(dir) = path.parent() {
            settings.ephemeris = dir.join(&settings.ephemeris);
        }
    }
    Ok(settings)
}

/// Loads the explicit `path` if given (it must exist), else the first existing
/// default candidate, else defaults.
pub(crate) fn resolve(path: Option<&Path>) -> Result<Settings> {
    if let Some(p) = path {
        return load_settings(p);
    }
    match default_paths().into_iter().find(|p| p.is_file()) {
        Some(p) => load_settings(&p),
        None => Ok(Settings::default()),
    }
}
