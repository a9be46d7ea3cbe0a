// The signed-metadata bundle the agent ships with, embedded at compile time.
// These are the root of trust until the first successful refresh against the
// real remote repository replaces the local copy with something the remote
// actually signed; the binary never has to trust the network before trust
// has been rooted locally.

pub const ROOT: &[u8] = include_bytes!("../pinned/root.json");
pub const SNAPSHOT: &[u8] = include_bytes!("../pinned/snapshot.json");
pub const TIMESTAMP: &[u8] = include_bytes!("../pinned/timestamp.json");
pub const TARGETS: &[u8] = include_bytes!("../pinned/targets.json");

/// Writes the pinned role files into `local_datastore` if it doesn't already
/// hold a copy, so `tough` has something to verify freshness against on a
/// first run.
pub(crate) fn seed(local_datastore: &std::path::Path) -> std::io::Result<()> {
    std::fs::create_dir_all(local_datastore)?;
    for (name, contents) in [
        ("1.root.json", ROOT),
        ("snapshot.json", SNAPSHOT),
        ("timestamp.json", TIMESTAMP),
        ("targets.json", TARGETS),
    ] {
        let path = local_datastore.join(name);
        if !path.exists() {
            std::fs::write(path, contents)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use test_log::test;

    use super::*;

    #[test]
    fn seed_writes_all_four_role_files() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path()).unwrap();
        assert_eq!(std::fs::read(dir.path().join("1.root.json")).unwrap(), ROOT);
        assert_eq!(std::fs::read(dir.path().join("snapshot.json")).unwrap(), SNAPSHOT);
        assert_eq!(std::fs::read(dir.path().join("timestamp.json")).unwrap(), TIMESTAMP);
        assert_eq!(std::fs::read(dir.path().join("targets.json")).unwrap(), TARGETS);
    }

    #[test]
    fn seed_does_not_overwrite_an_existing_copy() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path()).unwrap();
        std::fs::write(dir.path().join("targets.json"), b"already refreshed from the remote").unwrap();

        seed(dir.path()).unwrap();

        assert_eq!(
            std::fs::read(dir.path().join("targets.json")).unwrap(),
            b"already refreshed from the remote"
        );
    }
}
