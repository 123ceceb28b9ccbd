//! Build script for the web crate.
//!
//! Fingerprints the stylesheet so it can be served with long cache lifetimes.
//! Any failure leaves `CSS_HASH` empty, and pages link the unhashed file.

use std::env;
use std::fs;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Hex characters of the SHA-256 digest kept in the file name.
const HASH_LEN: usize = 8;

fn main() {
    let manifest_dir =
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo");
    let css_dir = Path::new(&manifest_dir).join("static/css");

    println!("cargo:rerun-if-changed={}", css_dir.join("main.css").display());

    let hash = match fingerprint(&css_dir) {
        Ok(hash) => hash,
        Err(e) => {
            println!("cargo:warning=Serving unhashed main.css: {e}");
            String::new()
        }
    };

    println!("cargo:rustc-env=CSS_HASH={hash}");
}

/// Copy `main.css` to `derived/main.<hash>.css` and return the hash.
///
/// Copies left over from earlier builds are removed so `derived/` only ever
/// holds the stylesheet this binary links to.
fn fingerprint(css_dir: &Path) -> io::Result<String> {
    let content = fs::read(css_dir.join("main.css"))?;
    let digest = format!("{:x}", Sha256::digest(&content));
    let hash = digest.get(..HASH_LEN).unwrap_or(&digest).to_string();

    let derived_dir = css_dir.join("derived");
    fs::create_dir_all(&derived_dir)?;

    let current = format!("main.{hash}.css");
    for entry in fs::read_dir(&derived_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("main.") && name.ends_with(".css") && name != current {
            fs::remove_file(entry.path())?;
        }
    }

    fs::write(derived_dir.join(&current), &content)?;
    Ok(hash)
}
