// Thin wrapper over `tough::Repository`: open-with-pinned-root, target
// lookup by content hash, and streaming target download. All signature and
// freshness verification happens inside `tough` itself; this module never
// re-derives or re-checks a hash.

use std::io::Read;
use std::path::Path;

use submerge_base::{kind_err, Error, ErrorKind, Result};
use tough::{Repository, RepositoryLoader, TargetName};
use url::Url;

use crate::pinned;

fn update_err<E: std::error::Error + Send + Sync + 'static>(e: E) -> Error {
    Error::new(ErrorKind::Update, e)
}

pub struct TufRepo {
    repository: Repository,
}

impl TufRepo {
    /// Opens the repository rooted at `pinned_root`, using `local_datastore`
    /// as `tough`'s on-disk cache of the latest verified metadata. Seeds the
    /// datastore from the pinned bundle on first use, then loads (and so
    /// refreshes) against the remote.
    pub fn open(
        pinned_root: &[u8],
        metadata_base_url: &str,
        targets_base_url: &str,
        local_datastore: &Path,
    ) -> Result<Self> {
        pinned::seed(local_datastore).map_err(update_err)?;
        let metadata_base_url = Url::parse(metadata_base_url).map_err(update_err)?;
        let targets_base_url = Url::parse(targets_base_url).map_err(update_err)?;
        let repository = RepositoryLoader::new(pinned_root, metadata_base_url, targets_base_url)
            .datastore(local_datastore)
            .load()
            .map_err(update_err)?;
        Ok(TufRepo { repository })
    }

    /// The sha256 digest of `target_name` per the currently loaded metadata,
    /// or `None` if no such target is published.
    pub fn target_digest(&self, target_name: &str) -> Result<Option<Vec<u8>>> {
        let name = TargetName::new(target_name).map_err(update_err)?;
        Ok(self
            .repository
            .targets()
            .signed
            .targets
            .get(&name)
            .map(|target| target.hashes.sha256.as_ref().to_vec()))
    }

    /// Streams `target_name`'s full, hash-verified contents. `tough` checks
    /// the digest as it reads; a mismatch or truncated transfer surfaces as
    /// an error here rather than a silently corrupt download.
    pub fn read_target(&self, target_name: &str) -> Result<Vec<u8>> {
        let name = TargetName::new(target_name).map_err(update_err)?;
        let mut reader = self
            .repository
            .read_target(&name)
            .map_err(update_err)?
            .ok_or_else(|| {
                kind_err(
                    ErrorKind::Update,
                    format!("target {target_name} not published"),
                )
            })?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).map_err(update_err)?;
        Ok(buf)
    }
}
