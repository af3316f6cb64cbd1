// MD5 checksums for published-file manifests

use std::fs::File;
use std::io;
use std::path::Path;

use md5::{Digest, Md5};

use crate::utils::error::Result;

/// Streaming MD5 digest of a file, as lowercase hex
///
/// The catalog's published file manifests record MD5 sums, so that is the
/// algorithm used here despite its age.
pub fn md5_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Md5::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}
