/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to defaults if the file is missing or incomplete.
///
/// ```toml
/// [agent]
/// act_freq = 1          # ticks advanced after each press
/// emulation_speed = 2   # viewer pacing, 0 = unthrottled
/// headless = false
///
/// [run]
/// results_dir = "results"
/// trace = ""            # empty = built-in demo trace
/// max_ticks = 0         # 0 = play the whole trace
/// ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::sim::replay::ReplayConfig;
use crate::sim::scheduler::SchedulerConfig;

const CONFIG_FILE: &str = "config.toml";

// ── Public Config Struct ──

#[derive(Clone, Debug, PartialEq)]
pub struct AgentConfig {
    pub act_freq: u32,
    pub emulation_speed: u32,
    pub headless: bool,
    pub results_dir: PathBuf,
    /// `None` plays the built-in trace.
    pub trace: Option<PathBuf>,
    pub max_ticks: u64,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    agent: TomlAgent,
    #[serde(default)]
    run: TomlRun,
}

#[derive(Deserialize, Debug)]
struct TomlAgent {
    #[serde(default = "default_act_freq")]
    act_freq: u32,
    #[serde(default = "default_emulation_speed")]
    emulation_speed: u32,
    #[serde(default)]
    headless: bool,
}

#[derive(Deserialize, Debug)]
struct TomlRun {
    #[serde(default = "default_results_dir")]
    results_dir: String,
    #[serde(default)]
    trace: String,
    #[serde(default)]
    max_ticks: u64,
}

// ── Defaults ──

fn default_act_freq() -> u32 { 1 }
fn default_emulation_speed() -> u32 { 2 }
fn default_results_dir() -> String { "results".into() }

impl Default for TomlAgent {
    fn default() -> Self {
        TomlAgent {
            act_freq: default_act_freq(),
            emulation_speed: default_emulation_speed(),
            headless: false,
        }
    }
}

impl Default for TomlRun {
    fn default() -> Self {
        TomlRun {
            results_dir: default_results_dir(),
            trace: String::new(),
            max_ticks: 0,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig::from_toml(TomlConfig::default(), &[])
    }
}

// ── Loading ──

impl AgentConfig {
    /// Load `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = search_dirs
            .iter()
            .map(|d| d.join(CONFIG_FILE))
            .find(|p| p.exists())
            .map(|p| load_toml(&p))
            .unwrap_or_default();
        AgentConfig::from_toml(toml_cfg, &search_dirs)
    }

    /// Load an explicit config file. Relative paths inside it resolve
    /// against the file's directory first.
    pub fn load_from(path: &Path) -> Self {
        let mut search_dirs = vec![];
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            search_dirs.push(parent.to_path_buf());
        }
        AgentConfig::from_toml(load_toml(path), &search_dirs)
    }

    /// Parse config text; a malformed document yields defaults.
    #[cfg(test)]
    pub fn from_toml_str(text: &str) -> Self {
        AgentConfig::from_toml(parse_toml(text), &[])
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let trace = match cfg.run.trace.trim() {
            "" => None,
            name => Some(resolve(name, search_dirs)),
        };
        AgentConfig {
            act_freq: cfg.agent.act_freq,
            emulation_speed: cfg.agent.emulation_speed,
            headless: cfg.agent.headless,
            results_dir: PathBuf::from(cfg.run.results_dir),
            trace,
            max_ticks: cfg.run.max_ticks,
        }
    }

    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig { act_freq: self.act_freq }
    }

    pub fn replay(&self) -> ReplayConfig {
        ReplayConfig {
            max_ticks: self.max_ticks,
            emulation_speed: self.emulation_speed,
        }
    }
}

/// Absolute paths pass through; relative ones prefer an existing file in a
/// search directory, else stay relative to the CWD.
fn resolve(name: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = PathBuf::from(name);
    if path.is_absolute() {
        return path;
    }
    search_dirs
        .iter()
        .map(|d| d.join(&path))
        .find(|p| p.is_file())
        .unwrap_or(path)
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

fn load_toml(path: &Path) -> TomlConfig {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            debug!(path = %path.display(), "config loaded");
            parse_toml(&text)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read config, using defaults");
            TomlConfig::default()
        }
    }
}

fn parse_toml(text: &str) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(error = %e, "config.toml parse error, using defaults");
            TomlConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = AgentConfig::from_toml_str("");
        assert_eq!(cfg, AgentConfig::default());
        assert_eq!(cfg.act_freq, 1);
        assert_eq!(cfg.emulation_speed, 2);
        assert!(!cfg.headless);
        assert_eq!(cfg.results_dir, PathBuf::from("results"));
        assert_eq!(cfg.trace, None);
        assert_eq!(cfg.max_ticks, 0);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = AgentConfig::from_toml_str("[agent]\nact_freq = 3\n\n[run]\nmax_ticks = 500\n");
        assert_eq!(cfg.act_freq, 3);
        assert_eq!(cfg.emulation_speed, 2);
        assert_eq!(cfg.max_ticks, 500);
        assert_eq!(cfg.scheduler().act_freq, 3);
        assert_eq!(cfg.replay().max_ticks, 500);
    }

    #[test]
    fn trace_path_is_kept() {
        let cfg = AgentConfig::from_toml_str("[run]\ntrace = \"/tmp/level1.trace\"\nresults_dir = \"out\"");
        assert_eq!(cfg.trace, Some(PathBuf::from("/tmp/level1.trace")));
        assert_eq!(cfg.results_dir, PathBuf::from("out"));
    }

    #[test]
    fn malformed_document_falls_back() {
        let cfg = AgentConfig::from_toml_str("[agent\nact_freq = ");
        assert_eq!(cfg, AgentConfig::default());
        let cfg = AgentConfig::from_toml_str("[agent]\nact_freq = \"fast\"");
        assert_eq!(cfg.act_freq, 1);
    }

    #[test]
    fn load_from_resolves_trace_next_to_config() {
        let dir = std::env::temp_dir().join(format!("reflexrunner-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("run.trace"), "0 0\n").unwrap();
        let path = dir.join("agent.toml");
        std::fs::write(&path, "[agent]\nheadless = true\n[run]\ntrace = \"run.trace\"\n").unwrap();

        let cfg = AgentConfig::load_from(&path);
        assert!(cfg.headless);
        assert_eq!(cfg.trace, Some(dir.join("run.trace")));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let cfg = AgentConfig::load_from(Path::new("/nonexistent/reflexrunner.toml"));
        assert_eq!(cfg, AgentConfig::default());
    }
}
