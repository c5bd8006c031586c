//! Open and build configuration.

use ordex_storage::{FileSinkOptions, OpenMode};

/// Configuration for opening and building indexes.
#[derive(Debug, Clone)]
pub struct Config {
    /// How persisted indexes are loaded.
    pub open_mode: OpenMode,

    /// Whether file-backed builds create missing parent directories.
    pub create_dirs: bool,

    /// Whether file-backed builds sync the file when finishing.
    pub sync_on_finish: bool,

    /// Whether file-backed builds hold an exclusive lock on the target.
    pub lock_target: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            open_mode: OpenMode::Mmap,
            create_dirs: false,
            sync_on_finish: true,
            lock_target: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how persisted indexes are loaded.
    #[must_use]
    pub const fn open_mode(mut self, mode: OpenMode) -> Self {
        self.open_mode = mode;
        self
    }

    /// Sets whether to create missing parent directories.
    #[must_use]
    pub const fn create_dirs(mut self, value: bool) -> Self {
        self.create_dirs = value;
        self
    }

    /// Sets whether to sync on finish.
    #[must_use]
    pub const fn sync_on_finish(mut self, value: bool) -> Self {
        self.sync_on_finish = value;
        self
    }

    /// Sets whether to lock the build target.
    #[must_use]
    pub const fn lock_target(mut self, value: bool) -> Self {
        self.lock_target = value;
        self
    }

    pub(crate) fn sink_options(&self) -> FileSinkOptions {
        FileSinkOptions::new()
            .create_dirs(self.create_dirs)
            .sync_on_seal(self.sync_on_finish)
            .lock(self.lock_target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.open_mode, OpenMode::Mmap);
        assert!(!config.create_dirs);
        assert!(config.sync_on_finish);
        assert!(config.lock_target);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .open_mode(OpenMode::Read)
            .create_dirs(true)
            .sync_on_finish(false);

        assert_eq!(config.open_mode, OpenMode::Read);
        assert!(config.create_dirs);
        assert!(!config.sync_on_finish);

        let options = config.sink_options();
        assert!(options.create_dirs);
        assert!(!options.sync_on_seal);
        assert!(options.lock);
    }
}
