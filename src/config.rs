/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    /// Main loop tick, in milliseconds.
    pub tick_rate_ms: u64,
    /// Pacing delay between commands of a full run, in milliseconds.
    pub run_delay_ms: u64,
    pub variants_dir: PathBuf,
}

impl GameConfig {
    /// How many main-loop ticks one run pacing interval spans. At least 1,
    /// so a run always makes progress.
    pub fn run_pacing_ticks(&self) -> u32 {
        let ticks = self.run_delay_ms / self.tick_rate_ms.max(1);
        (ticks as u32).max(1)
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_run_delay")]
    run_delay_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_variants_dir")]
    variants_dir: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 75 }
fn default_run_delay() -> u64 { 650 }
fn default_variants_dir() -> String { "variants".into() }

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            tick_rate_ms: default_tick_rate(),
            run_delay_ms: default_run_delay(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { variants_dir: default_variants_dir() }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);

        let variants_dir_str = &toml_cfg.general.variants_dir;
        let variants_dir = if PathBuf::from(variants_dir_str).is_absolute() {
            PathBuf::from(variants_dir_str)
        } else {
            search_dirs
                .iter()
                .map(|d| d.join(variants_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(variants_dir_str))
        };

        GameConfig {
            tick_rate_ms: toml_cfg.speed.tick_rate_ms.max(1),
            run_delay_ms: toml_cfg.speed.run_delay_ms,
            variants_dir,
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so data is found relative to the real binary.
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

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pacing_spans_at_least_one_tick() {
        let cfg = GameConfig {
            tick_rate_ms: 50,
            run_delay_ms: 650,
            variants_dir: PathBuf::from("variants"),
        };
        assert_eq!(cfg.run_pacing_ticks(), 13);

        let fast = GameConfig { tick_rate_ms: 1000, run_delay_ms: 0, ..cfg };
        assert_eq!(fast.run_pacing_ticks(), 1);
    }
}
