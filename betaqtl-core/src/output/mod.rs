//! Result tables and the sinks they are written to.

pub mod format;
pub mod rows;
pub mod sink;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::CisQtlConfig;

pub use sink::{FileSink, LineSink, MemorySink};

/// File names derived from an output prefix.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub top_effects: PathBuf,
    pub all_effects: PathBuf,
    pub permutations: PathBuf,
    pub log: PathBuf,
    pub snp_qc_log: PathBuf,
    pub finished: PathBuf,
    pub config: PathBuf,
}

impl OutputPaths {
    pub fn from_prefix(prefix: &str) -> Self {
        let path = |suffix: &str| PathBuf::from(format!("{}-{}", prefix, suffix));
        Self {
            top_effects: path("TopEffects.txt"),
            all_effects: path("AllEffects.txt.gz"),
            permutations: path("Permutations.txt.gz"),
            log: path("log.txt.gz"),
            snp_qc_log: path("snpqclog.txt.gz"),
            finished: path("TopEffects.finished"),
            config: path("config.json"),
        }
    }
}

/// Write the resolved run settings as pretty JSON.
pub fn write_config(path: &Path, config: &CisQtlConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

/// Sinks of one run. Optional tables are `None` when disabled.
pub struct QtlOutputs {
    pub top_effects: Box<dyn LineSink>,
    pub all_effects: Option<Box<dyn LineSink>>,
    pub permutations: Option<Box<dyn LineSink>>,
    pub snp_qc_log: Option<Box<dyn LineSink>>,
    pub log: Box<dyn LineSink>,
}

impl QtlOutputs {
    /// Create file sinks for every enabled table and write their headers.
    pub fn create(paths: &OutputPaths, config: &CisQtlConfig, datasets: &[String]) -> Result<Self> {
        let open = |enabled: bool, path: &PathBuf| -> Result<Option<Box<dyn LineSink>>> {
            if enabled {
                let sink: Box<dyn LineSink> = Box::new(FileSink::create(path)?);
                Ok(Some(sink))
            } else {
                Ok(None)
            }
        };
        let outputs = Self {
            top_effects: Box::new(FileSink::create(&paths.top_effects)?),
            all_effects: open(config.output_all, &paths.all_effects)?,
            permutations: open(config.dump_permutation_pvalues, &paths.permutations)?,
            snp_qc_log: open(config.output_snp_log, &paths.snp_qc_log)?,
            log: Box::new(FileSink::create(&paths.log)?),
        };
        outputs.write_headers(config, datasets)?;
        Ok(outputs)
    }

    /// Write table headers to the sinks that are present.
    pub fn write_headers(&self, config: &CisQtlConfig, datasets: &[String]) -> Result<()> {
        self.top_effects
            .append_line(&rows::top_effects_header(datasets))?;
        if let Some(sink) = &self.all_effects {
            sink.append_line(&rows::all_effects_header(datasets))?;
        }
        if let Some(sink) = &self.permutations {
            sink.append_line(&rows::permutations_header(config.n_permutations))?;
        }
        if let Some(sink) = &self.snp_qc_log {
            sink.append_line(&rows::snp_qc_header(datasets))?;
        }
        Ok(())
    }

    /// Append a human-readable message to the run log.
    pub fn log_message(&self, message: &str) -> Result<()> {
        self.log.append_line(message)
    }

    pub fn finish(&self) -> Result<()> {
        self.top_effects.finish()?;
        for sink in [&self.all_effects, &self.permutations, &self.snp_qc_log]
            .into_iter()
            .flatten()
        {
            sink.finish()?;
        }
        self.log.finish()
    }
}

/// Handles to the in-memory sinks behind [`QtlOutputs::in_memory`].
#[derive(Clone, Default)]
pub struct MemoryOutputs {
    pub top_effects: MemorySink,
    pub all_effects: MemorySink,
    pub permutations: MemorySink,
    pub snp_qc_log: MemorySink,
    pub log: MemorySink,
}

impl QtlOutputs {
    /// In-memory outputs with headers written, for tests and embedding.
    pub fn in_memory(config: &CisQtlConfig, datasets: &[String]) -> Result<(Self, MemoryOutputs)> {
        let mem = MemoryOutputs::default();
        let boxed = |enabled: bool, sink: &MemorySink| -> Option<Box<dyn LineSink>> {
            if enabled {
                let sink: Box<dyn LineSink> = Box::new(sink.clone());
                Some(sink)
            } else {
                None
            }
        };
        let outputs = Self {
            top_effects: Box::new(mem.top_effects.clone()),
            all_effects: boxed(config.output_all, &mem.all_effects),
            permutations: boxed(config.dump_permutation_pvalues, &mem.permutations),
            snp_qc_log: boxed(config.output_snp_log, &mem.snp_qc_log),
            log: Box::new(mem.log.clone()),
        };
        outputs.write_headers(config, datasets)?;
        Ok((outputs, mem))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_paths() {
        let p = OutputPaths::from_prefix("/tmp/run");
        assert_eq!(p.top_effects, PathBuf::from("/tmp/run-TopEffects.txt"));
        assert_eq!(p.finished, PathBuf::from("/tmp/run-TopEffects.finished"));
    }

    #[test]
    fn test_create_writes_headers() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("out").display().to_string();
        let paths = OutputPaths::from_prefix(&prefix);
        let config = CisQtlConfig {
            output_all: true,
            ..Default::default()
        };
        let outputs = QtlOutputs::create(&paths, &config, &["A".to_string()]).unwrap();
        assert!(outputs.permutations.is_none());
        outputs.finish().unwrap();

        let top = std::fs::read_to_string(&paths.top_effects).unwrap();
        assert!(top.starts_with("Gene\tGeneChr"));
        assert!(paths.all_effects.exists());
        assert!(!paths.snp_qc_log.exists());
    }

    #[test]
    fn test_write_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run-config.json");
        let config = CisQtlConfig {
            seed: 42,
            ..Default::default()
        };
        write_config(&path, &config).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let back: CisQtlConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back.seed, 42);
        assert_eq!(back.n_permutations, config.n_permutations);
        assert_eq!(back.rank_data, config.rank_data);
    }

    #[test]
    fn test_in_memory_headers() {
        let config = CisQtlConfig {
            dump_permutation_pvalues: true,
            n_permutations: 3,
            ..Default::default()
        };
        let (outputs, mem) = QtlOutputs::in_memory(&config, &["A".to_string()]).unwrap();
        assert!(outputs.all_effects.is_none());
        assert_eq!(mem.permutations.lines(), vec!["Gene\tSNP\tPerm0\tPerm1\tPerm2"]);
        assert_eq!(mem.top_effects.lines().len(), 1);
    }
}
