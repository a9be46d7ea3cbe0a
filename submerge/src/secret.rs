use submerge_base::{kind_err, ErrorKind, Result};

use crate::cli::AgentArgs;

/// Resolves the enrollment secret from either the literal flag or the file
/// path flag. The literal value wins if both are given.
pub fn resolve_enroll_secret(args: &AgentArgs) -> Result<String> {
    if let Some(secret) = &args.enroll_secret {
        return Ok(secret.clone());
    }
    if let Some(path) = &args.enroll_secret_path {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            kind_err(
                ErrorKind::Other,
                format!("reading enroll secret from {}: {e}", path.display()),
            )
        })?;
        return Ok(contents.trim().to_string());
    }
    Err(kind_err(
        ErrorKind::Other,
        "one of --enroll-secret or --enroll-secret-path is required",
    ))
}

#[cfg(test)]
mod test {
    use test_log::test;

    use super::*;

    fn args() -> AgentArgs {
        AgentArgs {
            root_dir: "/tmp/submerge".into(),
            enroll_secret: None,
            enroll_secret_path: None,
            server_addr: "https://example.invalid".to_string(),
            update_channel: "stable".to_string(),
            insecure_tls: false,
            pinned_keys: None,
            root_ca_path: None,
            inspector_binary: "osqueryd".into(),
        }
    }

    #[test]
    fn literal_secret_wins_over_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret");
        std::fs::write(&path, "from-file").unwrap();

        let mut a = args();
        a.enroll_secret = Some("from-flag".to_string());
        a.enroll_secret_path = Some(path);

        assert_eq!(resolve_enroll_secret(&a).unwrap(), "from-flag");
    }

    #[test]
    fn reads_and_trims_secret_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret");
        std::fs::write(&path, "from-file\n").unwrap();

        let mut a = args();
        a.enroll_secret_path = Some(path);

        assert_eq!(resolve_enroll_secret(&a).unwrap(), "from-file");
    }

    #[test]
    fn neither_flag_is_an_error() {
        assert!(resolve_enroll_secret(&args()).is_err());
    }
}
