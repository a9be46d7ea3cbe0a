// Staging-directory management for the auto-updater: archive extraction and
// the atomic swap of a verified binary into place (SPEC_FULL.md §4.6 steps
// 1-3). Grounded on the "flush, sync, reopen" discipline this workspace's
// own file-writer abstraction uses before ever trusting a file it just wrote.

use std::io::Read;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use submerge_base::{kind_err, Error, ErrorKind, Result};
use tar::Archive;
use tracing::info;

const EXECUTABLE_MODE: u32 = 0o755;
// Linux errno for a rename crossing filesystems; std does not expose a
// stable ErrorKind for this.
const EXDEV: i32 = 18;

fn update_err<E: std::error::Error + Send + Sync + 'static>(e: E) -> Error {
    Error::new(ErrorKind::Update, e)
}

/// A private scratch directory adjacent to a running binary, used to
/// extract and verify a new version before it ever touches the binary's
/// real path.
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    /// Clears and recreates `dir`. Any leftover state from an interrupted
    /// previous update is discarded; partial extraction never survives a
    /// restart.
    pub fn prepare(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(update_err(e)),
        }
        std::fs::create_dir_all(&dir).map_err(update_err)?;
        Ok(StagingArea { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Extracts a `.tar.gz` archive into this staging directory and returns
    /// the path to the entry named `binary_name`. Fails if the archive
    /// doesn't contain it.
    pub fn extract(&self, archive: &[u8], binary_name: &str) -> Result<PathBuf> {
        let decoder = GzDecoder::new(archive);
        let mut unpacker = Archive::new(decoder);
        unpacker.unpack(&self.dir).map_err(|e| {
            kind_err(ErrorKind::Update, format!("extracting update archive: {e}"))
        })?;

        let extracted = self.dir.join(binary_name);
        if !extracted.is_file() {
            return Err(kind_err(
                ErrorKind::Update,
                format!("update archive did not contain {binary_name}"),
            ));
        }
        Ok(extracted)
    }

    /// Syncs `extracted` to disk, marks it executable, then atomically
    /// renames it over `destination`. Partial state never replaces the
    /// running binary: every step before the rename operates only inside
    /// the staging directory.
    pub fn install(&self, extracted: &Path, destination: &Path) -> Result<()> {
        {
            let mut file = std::fs::File::open(extracted).map_err(update_err)?;
            // Force the extracted bytes out of any page cache buffering
            // before we ever treat this file as a trusted executable.
            let mut discard = Vec::new();
            file.read_to_end(&mut discard).map_err(update_err)?;
            file.sync_all().map_err(update_err)?;
        }

        let mut perms = std::fs::metadata(extracted).map_err(update_err)?.permissions();
        perms.set_mode(EXECUTABLE_MODE);
        std::fs::set_permissions(extracted, perms).map_err(update_err)?;

        std::fs::rename(extracted, destination).map_err(|e| {
            if e.raw_os_error() == Some(EXDEV) {
                kind_err(
                    ErrorKind::Update,
                    format!(
                        "staging area and {} are on different filesystems; atomic rename unavailable",
                        destination.display()
                    ),
                )
            } else {
                update_err(e)
            }
        })?;

        info!(destination = %destination.display(), "installed updated binary");
        Ok(())
    }

    /// Removes the staging directory, tolerating it already being gone.
    pub fn cleanup(&self) -> Result<()> {
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(update_err(e)),
        }
    }
}
