use submerge_base::{kind_err, Error, ErrorKind, Result};
use submerge_net::TlsMode;

use crate::cli::AgentArgs;

fn decode_hex32(text: &str) -> Result<[u8; 32]> {
    let text = text.trim();
    if text.len() != 64 {
        return Err(kind_err(
            ErrorKind::Other,
            format!("pinned key {text} is not a 64-character hex SHA-256 hash"),
        ));
    }
    let mut out = [0u8; 32];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&text[i * 2..i * 2 + 2], 16)
            .map_err(|e| Error::new(ErrorKind::Other, e))?;
    }
    Ok(out)
}

/// Resolves the TLS verification mode from the mutually-overlapping
/// `--insecure-tls`/`--pinned-keys`/`--root-ca-path` flags, in that order of
/// precedence: insecure wins outright (it is only ever set deliberately),
/// then pinning, then a custom root, else the platform default.
pub fn build_tls_mode(args: &AgentArgs) -> Result<TlsMode> {
    if args.insecure_tls {
        return Ok(TlsMode::Insecure);
    }
    if let Some(pins) = &args.pinned_keys {
        let pins = pins
            .split(',')
            .map(decode_hex32)
            .collect::<Result<Vec<_>>>()?;
        return Ok(TlsMode::Pinned { pins });
    }
    if let Some(pem_path) = &args.root_ca_path {
        return Ok(TlsMode::CustomRootCa {
            pem_path: pem_path.clone(),
        });
    }
    Ok(TlsMode::SystemDefault)
}
