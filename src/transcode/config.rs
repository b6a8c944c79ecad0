use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use serde::de::{MapAccess, Visitor};

use crate::error::{StemkitError, StemkitResult};

pub const CONFIG_FILE_NAME: &str = "stems.json";

/// Per-stem settings from `stems.json`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StemConfig {
    pub filename: String,
    #[serde(default)]
    pub mono: bool,
    /// Carried through for other tools; encode parameters ignore it.
    #[serde(default, rename = "downSample")]
    pub down_sample: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// `stems.json` flattened to filename -> config.
///
/// Groups are visited in document order and a later entry for the same
/// filename replaces an earlier one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StemConfigMap {
    entries: HashMap<String, StemConfig>,
}

impl StemConfigMap {
    pub fn from_json_str(s: &str) -> StemkitResult<Self> {
        serde_json::from_str(s).map_err(|e| StemkitError::config(e.to_string()))
    }

    pub fn from_path(path: &Path) -> StemkitResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read stem config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn get(&self, filename: &str) -> Option<&StemConfig> {
        self.entries.get(filename)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, stem: StemConfig) {
        self.entries.insert(stem.filename.clone(), stem);
    }
}

impl<'de> serde::Deserialize<'de> for StemConfigMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct GroupsVisitor;

        impl<'de> Visitor<'de> for GroupsVisitor {
            type Value = StemConfigMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping track keys to lists of stems")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut map = StemConfigMap::default();
                while let Some((_group, stems)) = access.next_entry::<String, Vec<StemConfig>>()? {
                    for stem in stems {
                        map.insert(stem);
                    }
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(GroupsVisitor)
    }
}

/// A config document together with where it was found.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedConfig {
    pub source: PathBuf,
    pub stems: StemConfigMap,
}

/// Places to look for `stems.json`, highest priority first.
pub fn candidate_paths(
    folder: &Path,
    explicit: Option<&Path>,
    cwd: Option<&Path>,
    install_fallback: Option<&Path>,
) -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(4);
    if let Some(p) = explicit {
        paths.push(p.to_path_buf());
    }
    paths.push(folder.join(CONFIG_FILE_NAME));
    if let Some(cwd) = cwd {
        paths.push(cwd.join(CONFIG_FILE_NAME));
    }
    if let Some(p) = install_fallback {
        paths.push(p.to_path_buf());
    }
    paths
}

/// `<exe dir>/../workers/stems.json`, when the executable path is known.
pub fn install_fallback_path() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let exe_dir = exe.parent()?;
    let base = exe_dir.parent().unwrap_or(exe_dir);
    Some(base.join("workers").join(CONFIG_FILE_NAME))
}

/// First candidate that exists and parses; unreadable candidates are skipped with a warning.
pub fn load_first(candidates: &[PathBuf]) -> Option<LoadedConfig> {
    for path in candidates {
        if !path.exists() {
            continue;
        }
        match StemConfigMap::from_path(path) {
            Ok(stems) => {
                tracing::info!(path = %path.display(), stems = stems.len(), "loaded stems configuration");
                return Some(LoadedConfig {
                    source: path.clone(),
                    stems,
                });
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "found stems.json but couldn't parse it: {e}");
            }
        }
    }

    tracing::warn!("stems.json not found; using default settings for all files");
    None
}

/// Resolves configuration for `folder` using the standard search order.
pub fn resolve(folder: &Path, explicit: Option<&Path>) -> Option<LoadedConfig> {
    let cwd = std::env::current_dir().ok();
    let fallback = install_fallback_path();
    let candidates = candidate_paths(folder, explicit, cwd.as_deref(), fallback.as_deref());
    load_first(&candidates)
}
