use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::model::NodeType;

/// Engine settings loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeuriteConfig {
    #[serde(default)]
    pub anchor: AnchorConfig,
    #[serde(default)]
    pub repair: RepairConfig,
    #[serde(default)]
    pub labels: LabelConfig,
    #[serde(default)]
    pub order: OrderConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorConfig {
    /// Type tag of the node that should become the root when no explicit
    /// anchor id is given.
    #[serde(default = "default_anchor_type")]
    pub node_type: u32,
}

impl AnchorConfig {
    #[must_use]
    pub const fn anchor_type(&self) -> NodeType {
        NodeType::from_code(self.node_type)
    }
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            node_type: default_anchor_type(),
        }
    }
}

/// Which correction path the pipeline takes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepairMode {
    /// Reparent when the input is already a tree, otherwise break cycles.
    #[default]
    Auto,
    /// Always reparent; fails on inputs that are not trees.
    Reparent,
    /// Always rebuild from undirected traversal.
    CycleBreak,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairConfig {
    #[serde(default)]
    pub mode: RepairMode,
    /// Renumber ids densely (1..=n, input order) after correction.
    #[serde(default = "default_true")]
    pub renumber: bool,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            mode: RepairMode::default(),
            renumber: default_true(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelConfig {
    #[serde(default = "default_root_label")]
    pub root: String,
    #[serde(default = "default_child_prefix")]
    pub child_prefix: String,
    #[serde(default = "default_separator")]
    pub separator: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            root: default_root_label(),
            child_prefix: default_child_prefix(),
            separator: default_separator(),
        }
    }
}

/// Section emission order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStrategy {
    /// Each section is followed directly by its own subtree.
    DepthFirst,
    /// Sections sorted by attachment depth, then by end id.
    #[default]
    BreadthFirst,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfig {
    #[serde(default)]
    pub strategy: OrderStrategy,
}

/// Project-local config path relative to a working directory.
pub const PROJECT_CONFIG: &str = ".neurite/config.toml";

/// Parse a config file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML for
/// [`NeuriteConfig`].
pub fn load_config_file(path: &Path) -> Result<NeuriteConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<NeuriteConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Resolve the effective config.
///
/// Precedence: `explicit` path, then `<root>/.neurite/config.toml`, then
/// `<config_dir>/neurite/config.toml`, then defaults.
///
/// # Errors
///
/// Returns an error if the explicit path is missing or any file found on the
/// lookup path fails to parse.
pub fn resolve_config(explicit: Option<&Path>, root: &Path) -> Result<NeuriteConfig> {
    if let Some(path) = explicit {
        return load_config_file(path);
    }

    for candidate in candidate_paths(root) {
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "loading config");
            return load_config_file(&candidate);
        }
    }

    Ok(NeuriteConfig::default())
}

fn candidate_paths(root: &Path) -> Vec<PathBuf> {
    let mut paths = vec![root.join(PROJECT_CONFIG)];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("neurite/config.toml"));
    }
    paths
}

const fn default_true() -> bool {
    true
}

const fn default_anchor_type() -> u32 {
    1
}

fn default_root_label() -> String {
    "soma".to_string()
}

fn default_child_prefix() -> String {
    "d".to_string()
}

fn default_separator() -> String {
    ",".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_config_missing() {
        let dir = TempDir::new().expect("tempdir");
        let cfg = load_config_file(&dir.path().join("missing.toml"));
        assert!(cfg.is_err());

        let defaults = NeuriteConfig::default();
        assert_eq!(defaults.anchor.anchor_type(), NodeType::Soma);
        assert_eq!(defaults.repair.mode, RepairMode::Auto);
        assert!(defaults.repair.renumber);
        assert_eq!(defaults.labels.root, "soma");
        assert_eq!(defaults.order.strategy, OrderStrategy::BreadthFirst);
    }

    #[test]
    fn project_config_is_picked_up() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::create_dir_all(dir.path().join(".neurite")).expect("mkdir");
        std::fs::write(
            dir.path().join(PROJECT_CONFIG),
            "[repair]\nmode = \"cycle-break\"\n\n[order]\nstrategy = \"depth-first\"\n",
        )
        .expect("write config");

        let cfg = resolve_config(None, dir.path()).expect("load");
        assert_eq!(cfg.repair.mode, RepairMode::CycleBreak);
        assert!(cfg.repair.renumber, "unset fields keep defaults");
        assert_eq!(cfg.order.strategy, OrderStrategy::DepthFirst);
        assert_eq!(cfg.labels.separator, ",");
    }

    #[test]
    fn partial_label_section_keeps_other_defaults() {
        let cfg: NeuriteConfig =
            toml::from_str("[labels]\nroot = \"cell\"\n").expect("parse");
        assert_eq!(cfg.labels.root, "cell");
        assert_eq!(cfg.labels.child_prefix, "d");
    }

    #[test]
    fn unknown_mode_is_a_parse_error() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[repair]\nmode = \"guess\"\n").expect("write");
        let err = resolve_config(Some(&path), dir.path()).expect_err("bad mode");
        assert!(format!("{err:#}").contains("Failed to parse"));
    }
}
