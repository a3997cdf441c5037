//! Application paths management.

use directories::ProjectDirs;
use std::path::PathBuf;

/// Platform-specific locations of Quarry's files.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub config_file: PathBuf,
    pub database_file: PathBuf,
    pub work_dir: PathBuf,
}

impl AppPaths {
    /// Create paths using platform-specific directories.
    pub fn new() -> Option<Self> {
        let proj_dirs = ProjectDirs::from("com", "quarry", "quarry")?;

        let config_dir = proj_dirs.config_dir().to_path_buf();
        let data_dir = proj_dirs.data_dir().to_path_buf();

        Some(Self::with_dirs(config_dir, data_dir))
    }

    /// Build paths rooted at explicit directories.
    pub fn with_dirs(config_dir: PathBuf, data_dir: PathBuf) -> Self {
        Self {
            config_file: config_dir.join("config.toml"),
            database_file: data_dir.join("quarry.db"),
            work_dir: data_dir.join("work"),
            config_dir,
            data_dir,
        }
    }

    /// Point the data files at a different directory (`general.data_dir`).
    pub fn relocate_data(mut self, data_dir: PathBuf) -> Self {
        self.database_file = data_dir.join("quarry.db");
        self.work_dir = data_dir.join("work");
        self.data_dir = data_dir;
        self
    }

    /// Create all necessary directories.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.work_dir)?;
        Ok(())
    }

    /// Check if quarry has been initialized.
    pub fn is_initialized(&self) -> bool {
        self.config_file.exists() && self.database_file.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_from_dirs() {
        let paths = AppPaths::with_dirs(PathBuf::from("/cfg"), PathBuf::from("/data"));
        assert_eq!(paths.config_file, PathBuf::from("/cfg/config.toml"));
        assert_eq!(paths.database_file, PathBuf::from("/data/quarry.db"));

        let moved = paths.relocate_data(PathBuf::from("/elsewhere"));
        assert_eq!(moved.database_file, PathBuf::from("/elsewhere/quarry.db"));
        assert_eq!(moved.config_file, PathBuf::from("/cfg/config.toml"));
    }

    #[test]
    fn test_uninitialized_in_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::with_dirs(dir.path().join("cfg"), dir.path().join("data"));
        assert!(!paths.is_initialized());

        paths.ensure_dirs().unwrap();
        assert!(paths.work_dir.exists());
    }
}
