use std::path::{Path, PathBuf};

use plumage::err;
use plumage::error::{Chainable, Result};
use plumage::error;

/// Returns `root/path`, which must be an existing directory.
#[track_caller]
pub fn dircheck<P: AsRef<Path>>(root: &Path, path: P) -> Result<PathBuf> {
    let path = root.join(path);
    match std::fs::metadata(&path) {
        Ok(meta) if meta.is_dir() => Ok(path),
        Ok(_) => err! {
            "content path must point to a directory",
            "path is not a directory" => path.display(),
        },
        Err(e) => Err(e).chain_with(|| error! {
            "content path must point to an existing directory",
            "path" => path.display(),
        }),
    }
}

/// Writes `contents` to `path`, creating parent directories as needed.
pub fn write_file<C: AsRef<[u8]>>(path: &Path, contents: C) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, contents).chain_with(|| error! {
        "failed to write output file",
        "path" => path.display(),
    })
}

/// Wraps rendered HTML in a minimal standalone document.
pub fn html_page(title: &str, body: &str) -> String {
    let title = plumage::util::escape_xml(title);
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n{body}</body>\n</html>\n"
    )
}
