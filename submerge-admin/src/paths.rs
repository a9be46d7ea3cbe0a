use std::path::{Path, PathBuf};

/// Filesystem layout under the agent's root directory (SPEC_FULL.md §4.5
/// step 1). All paths are derived, never configured independently, so a
/// restart always finds the same socket and pidfile the previous run used.
#[derive(Clone, Debug)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Paths { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pidfile(&self) -> PathBuf {
        self.root.join("inspector.pid")
    }

    pub fn database_dir(&self) -> PathBuf {
        self.root.join("db")
    }

    pub fn database_file(&self) -> PathBuf {
        self.database_dir().join("agent.redb")
    }

    pub fn plugin_socket(&self) -> PathBuf {
        self.root.join("inspector-extension.sock")
    }

    pub fn autoload_file(&self) -> PathBuf {
        self.root.join("extension.autoload")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn paths_are_derived_from_root() {
        let paths = Paths::new("/var/lib/agent");
        assert_eq!(paths.pidfile(), Path::new("/var/lib/agent/inspector.pid"));
        assert_eq!(paths.database_file(), Path::new("/var/lib/agent/db/agent.redb"));
        assert_eq!(
            paths.plugin_socket(),
            Path::new("/var/lib/agent/inspector-extension.sock")
        );
    }
}
