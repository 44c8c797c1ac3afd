//! SHA-256 digests and sidecar files

use crate::error::Error;
use crate::error::Result;
use std::io::ErrorKind;
use std::io::Read;
use std::path::Path;

/// Length of a hex encoded SHA-256 digest
const DIGEST_HEX_LEN: usize = 64;

/// Lowercase hex SHA-256 of everything `reader` yields
pub fn sha256_readable(reader: &mut impl Read) -> std::io::Result<String> {
    let mut buffer = vec![0; 1024 * 1024];
    let mut hasher = ring::digest::Context::new(&ring::digest::SHA256);
    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buffer[..n]),
            Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(faster_hex::hex_string(hasher.finish().as_ref()))
}

/// Lowercase hex SHA-256 of a byte slice
pub fn sha256_buffer(contents: &[u8]) -> String {
    faster_hex::hex_string(ring::digest::digest(&ring::digest::SHA256, contents).as_ref())
}

/// Lowercase hex SHA-256 of a file
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    Ok(sha256_readable(&mut file)?)
}

/// Hash `target` and write the digest, newline terminated, to `sidecar`
pub fn write_sidecar(target: &Path, sidecar: &Path) -> Result<String> {
    let digest = sha256_file(target)?;
    if let Some(parent) = sidecar.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(sidecar, format!("{digest}\n"))?;
    tracing::debug!("Wrote {}", sidecar.display());
    Ok(digest)
}

/// Check `target` against the digest stored in `sidecar`
///
/// Also accepts the `<digest>  <file name>` lines written by `sha256sum`.
/// Returns the verified digest.
pub fn verify_sidecar(target: &Path, sidecar: &Path) -> Result<String> {
    let contents = match std::fs::read_to_string(sidecar) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(Error::MissingInput(sidecar.to_owned()));
        }
        Err(err) if err.kind() == ErrorKind::InvalidData => {
            return Err(Error::InvalidSidecar(sidecar.to_owned()));
        }
        Err(err) => return Err(err.into()),
    };
    let expected = contents
        .split_whitespace()
        .next()
        .filter(|digest| {
            digest.len() == DIGEST_HEX_LEN && digest.bytes().all(|b| b.is_ascii_hexdigit())
        })
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| Error::InvalidSidecar(sidecar.to_owned()))?;

    if !target.is_file() {
        return Err(Error::MissingInput(target.to_owned()));
    }
    let actual = sha256_file(target)?;
    if actual != expected {
        return Err(Error::ChecksumMismatch {
            path: target.to_owned(),
            expected,
            actual,
        });
    }
    Ok(actual)
}
