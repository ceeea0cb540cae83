use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::board::cozy::Position;
use crate::engine::EngineSettings;
use crate::moves::MoveSequence;

pub const DEFAULT_ENGINE: &str = "stockfish";
pub const DEFAULT_OUTPUT: &str = "variations.txt";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub engine_path: String,
    #[serde(default)]
    pub output_path: String,
    #[serde(default)]
    pub engine_settings: EngineSection,
    pub variation_config: VariationSection,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EngineSection {
    pub threads: Option<u32>,
    /// Hash table size in MB.
    pub memory: Option<u32>,
    pub pv: Option<u32>,
    #[serde(default)]
    pub print_all: bool,
    #[serde(default)]
    pub print_progress: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct VariationSection {
    #[serde(default)]
    pub initial_moves: String,
    pub engine_depth: u32,
    pub variation_depth: u32,
    #[serde(default)]
    pub is_white: bool,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).with_context(|| format!("opening config file {}", path.display()))?;
        serde_json::from_reader(BufReader::new(f)).with_context(|| format!("reading config file {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parsing config")
    }

    pub fn engine_path(&self) -> PathBuf {
        if self.engine_path.trim().is_empty() { PathBuf::from(DEFAULT_ENGINE) } else { PathBuf::from(&self.engine_path) }
    }

    pub fn output_path(&self) -> PathBuf {
        if self.output_path.trim().is_empty() { PathBuf::from(DEFAULT_OUTPUT) } else { PathBuf::from(&self.output_path) }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        let s = &self.engine_settings;
        let mut out = EngineSettings { echo_output: s.print_all, ..EngineSettings::default() };
        if let Some(t) = s.threads { out.threads = t; }
        if let Some(m) = s.memory { out.hash_mb = m; }
        if let Some(pv) = s.pv { out.multipv = pv; }
        out
    }

    pub fn initial_moves(&self) -> MoveSequence {
        // legality is checked in `validate`
        self.variation_config.initial_moves.parse().unwrap_or_default()
    }

    /// Checks everything that can be checked before an engine is launched.
    pub fn validate(&self) -> Result<()> {
        let v = &self.variation_config;
        if v.engine_depth == 0 { bail!("engine-depth must be at least 1"); }
        let s = self.engine_settings();
        if s.threads == 0 { bail!("threads must be at least 1"); }
        if s.hash_mb == 0 { bail!("memory must be at least 1 MB"); }
        if s.multipv == 0 { bail!("pv must be at least 1"); }
        let line = self.initial_moves();
        Position::from_line(&line).map_err(|e| anyhow::anyhow!(e)).with_context(|| format!("initial-moves `{line}`"))?;
        Ok(())
    }
}
