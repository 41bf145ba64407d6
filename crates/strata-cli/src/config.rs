use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Command defaults loaded from `strata.toml`.
///
/// The file is read once at startup and threaded into commands explicitly;
/// nothing reads it as process-global state.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory for generated files when a command gets no explicit
    /// output path. Unset means next to the container.
    pub output_dir: Option<PathBuf>,
    /// Overrides the container's recorded assets directory in projected
    /// image paths.
    pub assets_dir_name: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Load an explicit config path, or `./strata.toml` if present, or the
    /// defaults.
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let implicit = Path::new("strata.toml");
                if implicit.exists() {
                    Self::load(implicit)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}
