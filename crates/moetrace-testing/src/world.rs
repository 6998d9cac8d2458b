//! Isolated CLI test environments.
//!
//! A `TestWorld` owns a throwaway data directory and builds `moetrace`
//! commands pointed at it, so CLI tests never touch the user's real
//! `~/.moetrace`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use assert_cmd::Command;
use tempfile::TempDir;

pub struct TestWorld {
    temp_dir: TempDir,
    data_dir: PathBuf,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorld {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_dir = temp_dir.path().join(".moetrace");
        Self { temp_dir, data_dir }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Write a file (e.g. an events JSONL) into the world.
    pub fn write_file(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    /// Write a config.toml into the data directory.
    pub fn write_config(&self, contents: &str) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::write(self.data_dir.join("config.toml"), contents)?;
        Ok(())
    }

    /// A `moetrace` command bound to this world's data dir.
    pub fn cmd(&self, args: &[&str]) -> Command {
        let mut cmd = Command::cargo_bin("moetrace").expect("moetrace binary");
        cmd.arg("--data-dir").arg(&self.data_dir).args(args);
        cmd
    }
}
