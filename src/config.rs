//! City catalog: which data file backs which city.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Directory holding the city files unless `BIKESHARE_DATA_DIR` says otherwise.
pub const DEFAULT_DATA_DIR: &str = "data";

static DEFAULT_CITIES: &[(&str, &str)] = &[
    ("chicago", "chicago.csv"),
    ("new york city", "new_york_city.csv"),
    ("washington", "washington.csv"),
];

/// Maps city names to data files, relative to a data directory.
///
/// A custom catalog is a plain JSON object on disk:
/// ```json
/// {
///   "chicago": "chicago.csv",
///   "boston": "boston_2017.csv.gz"
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CityCatalog {
    data_dir: PathBuf,
    entries: BTreeMap<String, String>,
}

impl CityCatalog {
    /// The three built-in cities.
    pub fn builtin(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            entries: DEFAULT_CITIES
                .iter()
                .map(|(city, file)| (city.to_string(), file.to_string()))
                .collect(),
        }
    }

    /// Loads a catalog from a JSON file at `path`, replacing the built-in cities.
    pub fn load(path: &str, data_dir: impl Into<PathBuf>) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read city catalog {path}"))?;
        Self::from_json(&content, data_dir)
    }

    pub fn from_json(content: &str, data_dir: impl Into<PathBuf>) -> Result<Self> {
        let raw: BTreeMap<String, String> =
            serde_json::from_str(content).context("city catalog must be a JSON object of strings")?;

        let entries: BTreeMap<String, String> = raw
            .into_iter()
            .map(|(city, file)| (normalize(&city), file))
            .filter(|(city, _)| !city.is_empty())
            .collect();

        anyhow::ensure!(!entries.is_empty(), "city catalog is empty");

        Ok(Self {
            data_dir: data_dir.into(),
            entries,
        })
    }

    /// Builds the catalog from the environment and an optional override file.
    ///
    /// `catalog_path` wins over `BIKESHARE_CITIES`; without either the
    /// built-in cities are used. Files resolve against `BIKESHARE_DATA_DIR`.
    pub fn from_env(catalog_path: Option<&str>) -> Result<Self> {
        let data_dir =
            std::env::var("BIKESHARE_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
        let catalog_path = catalog_path
            .map(str::to_string)
            .or_else(|| std::env::var("BIKESHARE_CITIES").ok());

        match catalog_path {
            Some(path) => Self::load(&path, data_dir),
            None => Ok(Self::builtin(data_dir)),
        }
    }

    /// Canonical (lower-cased, trimmed) name of `city`, if it is in the catalog.
    pub fn resolve(&self, city: &str) -> Option<&str> {
        self.entries
            .get_key_value(&normalize(city))
            .map(|(name, _)| name.as_str())
    }

    /// Full path to the data file for `city`, if it is in the catalog.
    pub fn path_for(&self, city: &str) -> Option<PathBuf> {
        self.entries
            .get(&normalize(city))
            .map(|file| self.data_dir.join(file))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Iterates over all `(city, file)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn normalize(city: &str) -> String {
    city.trim().to_lowercase()
}
