// Per-binary update orchestration (SPEC_FULL.md §4.6): refresh the signed
// repository, detect a target-hash change, stage, verify, and swap a new
// binary into place, then invoke the finalizer.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use submerge_base::{Cancel, Error, ErrorKind, Result};
use submerge_cloud::StagingArea;
use tracing::{info, warn};

use crate::repo::TufRepo;

fn update_err<E: std::error::Error + Send + Sync + 'static>(e: E) -> Error {
    Error::new(ErrorKind::Update, e)
}

pub struct UpdaterConfig {
    pub channel: String,
    pub platform: String,
    pub metadata_base_url: String,
    pub targets_base_url: String,
    pub interval: Duration,
    pub refresh_timeout: Duration,
}

impl UpdaterConfig {
    pub fn new(
        channel: impl Into<String>,
        platform: impl Into<String>,
        metadata_base_url: impl Into<String>,
        targets_base_url: impl Into<String>,
    ) -> Self {
        UpdaterConfig {
            channel: channel.into(),
            platform: platform.into(),
            metadata_base_url: metadata_base_url.into(),
            targets_base_url: targets_base_url.into(),
            interval: Duration::from_secs(3600),
            refresh_timeout: Duration::from_secs(30),
        }
    }
}

/// Tracks and applies updates for exactly one managed binary ("self" or
/// "inspector"). One instance per binary; the agent's tick loop runs one
/// alongside the other.
pub struct BinaryUpdater {
    name: String,
    destination: PathBuf,
    local_datastore: PathBuf,
    staging_dir: PathBuf,
    pinned_root: &'static [u8],
    config: UpdaterConfig,
    finalizer: Box<dyn Fn() + Send + Sync>,
}

impl BinaryUpdater {
    pub fn new(
        name: impl Into<String>,
        destination: PathBuf,
        local_datastore: PathBuf,
        staging_dir: PathBuf,
        pinned_root: &'static [u8],
        config: UpdaterConfig,
        finalizer: Box<dyn Fn() + Send + Sync>,
    ) -> Self {
        BinaryUpdater {
            name: name.into(),
            destination,
            local_datastore,
            staging_dir,
            pinned_root,
            config,
            finalizer,
        }
    }

    fn target_name(&self) -> String {
        format!("{}/{}-{}.tar.gz", self.config.platform, self.name, self.config.channel)
    }

    fn applied_hash_path(&self) -> PathBuf {
        self.local_datastore.join("applied.hash")
    }

    fn load_applied_hash(&self) -> Result<Option<Vec<u8>>> {
        match std::fs::read(self.applied_hash_path()) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(update_err(e)),
        }
    }

    fn store_applied_hash(&self, digest: &[u8]) -> Result<()> {
        std::fs::write(self.applied_hash_path(), digest).map_err(update_err)
    }

    /// One refresh-check-apply cycle. Returns `Ok(true)` if an update was
    /// applied. Any failure leaves the running binary and the last-applied
    /// record untouched.
    pub fn tick(&self) -> Result<bool> {
        let started = Instant::now();
        let repo = TufRepo::open(
            self.pinned_root,
            &self.config.metadata_base_url,
            &self.config.targets_base_url,
            &self.local_datastore,
        )?;
        let target_name = self.target_name();
        let digest = match repo.target_digest(&target_name)? {
            Some(digest) => digest,
            None => return Ok(false),
        };
        if started.elapsed() > self.config.refresh_timeout {
            warn!(binary = %self.name, "metadata refresh exceeded its timeout");
        }

        if self.load_applied_hash()?.as_deref() == Some(digest.as_slice()) {
            return Ok(false);
        }

        let archive = repo.read_target(&target_name)?;
        let staging = StagingArea::prepare(&self.staging_dir)?;
        let result = staging
            .extract(&archive, &self.name)
            .and_then(|extracted| staging.install(&extracted, &self.destination));

        match result {
            Ok(()) => {
                staging.cleanup()?;
                self.store_applied_hash(&digest)?;
                info!(binary = %self.name, "applied signed update");
                (self.finalizer)();
                Ok(true)
            }
            Err(e) => {
                let _ = staging.cleanup();
                Err(e)
            }
        }
    }

    /// Runs `tick` on a fixed cadence until `cancel` trips.
    pub fn run(&self, cancel: &Cancel) {
        while cancel.sleep(self.config.interval) {
            match self.tick() {
                Ok(true) => {}
                Ok(false) => info!(binary = %self.name, "no update pending"),
                Err(e) => warn!(binary = %self.name, error = %e, "update tick failed"),
            }
        }
    }
}

#[cfg(test)]
mod test;
