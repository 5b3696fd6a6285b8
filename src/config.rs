use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::utils::app_config::AppConfig;
use crate::utils::prelude::*;

/// Directory all rendered results go to, created on first use
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OutputDir(PathBuf);

impl OutputDir {
    pub fn file(&self, name: impl AsRef<Path>) -> Result<PathBuf> {
        fs::create_dir_all(&self.0)?;
        Ok(self.0.join(name))
    }
}

pub(crate) trait AppConfigExt {
    fn output_dir(&self) -> Result<OutputDir>;
}

impl AppConfigExt for AppConfig {
    fn output_dir(&self) -> Result<OutputDir> {
        self.get("output_dir")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_dir_is_created_lazily() {
        let root = std::env::temp_dir().join(format!("ossim-output-{}", std::process::id()));
        let dir = OutputDir(root.join("nested"));
        assert!(!root.join("nested").exists());

        let path = dir.file("result.json").unwrap();
        assert_eq!(path, root.join("nested").join("result.json"));
        assert!(root.join("nested").is_dir());

        fs::remove_dir_all(&root).unwrap();
    }
}
