//! Simulation configuration: typed knobs, bootstrap validation, and an
//! optional `simmer.toml` layer.
//!
//! The core API consumes a validated [`SimConfig`]; the TOML layer exists so
//! an embedding host can keep the knobs in a file without writing its own
//! parser. Unknown fields are ignored (TOML deserialization tolerance) to
//! allow forward evolution, and both a missing file and a malformed file
//! fall back to defaults rather than aborting a run.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Rejected knob combinations. These are programmer errors surfaced at
/// bootstrap; nothing inside a running simulation produces them.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("mesh dimension must be at least 1")]
    MeshDim,
    #[error("subgrid dimension must be a positive even number, got {0}")]
    SubgridDim(usize),
    #[error("steps per snapshot must be at least 1")]
    StepsPerSnapshot,
}

/// Validated simulation knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimConfig {
    /// Mesh dimension `q`: the simulation runs `q²` workers.
    pub mesh_dim: usize,
    /// Interior dimension `m` of each worker subgrid. Must be even: the
    /// stride-2 exchange phases cover the edge indices exactly once only
    /// for even `m`, and even worker origins keep local checkerboard parity
    /// equal to global parity.
    pub subgrid_dim: usize,
    /// Relaxation steps a worker performs between snapshot emissions.
    pub steps_per_snapshot: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        ConfigFile::default().into()
    }
}

impl SimConfig {
    pub fn new(mesh_dim: usize, subgrid_dim: usize) -> Self {
        Self {
            mesh_dim,
            subgrid_dim,
            steps_per_snapshot: OutputSection::default_steps_per_snapshot(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mesh_dim == 0 {
            return Err(ConfigError::MeshDim);
        }
        if self.subgrid_dim == 0 || self.subgrid_dim % 2 != 0 {
            return Err(ConfigError::SubgridDim(self.subgrid_dim));
        }
        if self.steps_per_snapshot == 0 {
            return Err(ConfigError::StepsPerSnapshot);
        }
        Ok(())
    }

    /// Side length `n = q·m` of the assembled global grid.
    #[inline]
    pub fn problem_dim(&self) -> usize {
        self.mesh_dim * self.subgrid_dim
    }

    #[inline]
    pub fn worker_count(&self) -> usize {
        self.mesh_dim * self.mesh_dim
    }
}

// -------------------------------------------------------------------------
// TOML file layer
// -------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub mesh: MeshSection,
    #[serde(default)]
    pub subgrid: SubgridSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MeshSection {
    #[serde(default = "MeshSection::default_dim")]
    pub dim: usize,
}

impl MeshSection {
    const fn default_dim() -> usize {
        2
    }
}

impl Default for MeshSection {
    fn default() -> Self {
        Self {
            dim: Self::default_dim(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SubgridSection {
    #[serde(default = "SubgridSection::default_dim")]
    pub dim: usize,
}

impl SubgridSection {
    const fn default_dim() -> usize {
        16
    }
}

impl Default for SubgridSection {
    fn default() -> Self {
        Self {
            dim: Self::default_dim(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputSection {
    #[serde(default = "OutputSection::default_steps_per_snapshot")]
    pub steps_per_snapshot: usize,
}

impl OutputSection {
    const fn default_steps_per_snapshot() -> usize {
        1
    }
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            steps_per_snapshot: Self::default_steps_per_snapshot(),
        }
    }
}

impl From<ConfigFile> for SimConfig {
    fn from(file: ConfigFile) -> Self {
        Self {
            mesh_dim: file.mesh.dim,
            subgrid_dim: file.subgrid.dim,
            steps_per_snapshot: file.output.steps_per_snapshot,
        }
    }
}

/// Best-effort config path following platform conventions: a local
/// `simmer.toml` wins, then the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("simmer.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("simmer").join("simmer.toml");
    }
    PathBuf::from("simmer.toml")
}

/// Parse knobs from TOML text. Validation stays with the bootstrap.
pub fn from_toml_str(content: &str) -> Result<SimConfig> {
    let file: ConfigFile = toml::from_str(content)?;
    Ok(file.into())
}

/// Load knobs from `path` (or the discovered location). A missing or
/// malformed file yields defaults so an embedding host always gets a
/// runnable configuration.
pub fn load_from(path: Option<PathBuf>) -> Result<SimConfig> {
    let path = path.unwrap_or_else(discover);
    match fs::read_to_string(&path) {
        Ok(content) => match toml::from_str::<ConfigFile>(&content) {
            Ok(file) => {
                info!(target: "sim.config", path = %path.display(), "config_loaded");
                Ok(file.into())
            }
            Err(e) => {
                warn!(target: "sim.config", path = %path.display(), %e, "config_parse_failed_using_defaults");
                Ok(SimConfig::default())
            }
        },
        Err(_) => Ok(SimConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SimConfig::default();
        assert_eq!(config.mesh_dim, 2);
        assert_eq!(config.subgrid_dim, 16);
        assert_eq!(config.steps_per_snapshot, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_mesh() {
        let config = SimConfig {
            mesh_dim: 0,
            ..SimConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MeshDim));
    }

    #[test]
    fn rejects_odd_or_zero_subgrid() {
        for bad in [0usize, 1, 3, 15] {
            let config = SimConfig {
                subgrid_dim: bad,
                ..SimConfig::default()
            };
            assert_eq!(config.validate(), Err(ConfigError::SubgridDim(bad)));
        }
    }

    #[test]
    fn rejects_zero_steps() {
        let config = SimConfig {
            steps_per_snapshot: 0,
            ..SimConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::StepsPerSnapshot));
    }

    #[test]
    fn toml_sections_override_defaults() {
        let config = from_toml_str(
            r#"
            [mesh]
            dim = 4

            [output]
            steps_per_snapshot = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.mesh_dim, 4);
        assert_eq!(config.subgrid_dim, 16, "absent section keeps its default");
        assert_eq!(config.steps_per_snapshot, 3);
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let config = from_toml_str(
            r#"
            [mesh]
            dim = 3
            shape = "torus"
            "#,
        )
        .unwrap();
        assert_eq!(config.mesh_dim, 3);
    }

    #[test]
    fn problem_dim_is_mesh_times_subgrid() {
        let config = SimConfig::new(3, 4);
        assert_eq!(config.problem_dim(), 12);
        assert_eq!(config.worker_count(), 9);
    }
}
