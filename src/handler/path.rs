//! Request path resolution
//!
//! Maps a request path onto a file below the root. Purely lexical: the result may name a
//! file that does not exist, which the read attempt reports later.

use std::path::{Component, Path, PathBuf};

#[inline]
fn decode_percents(string: &str) -> String {
    percent_encoding::percent_decode_str(string)
        .decode_utf8_lossy()
        .into_owned()
}

/// Push `segment` unless it could move the path outside the root.
fn push_segment(result: &mut PathBuf, segment: &str) {
    match segment {
        "" | "." => {}
        ".." => {
            result.pop();
        }
        _ => {
            // Parse again to drop segments that are not a plain file name, e.g. a Windows
            // drive letter in `/anypath/c:/windows/win.ini` or `a\..\b`.
            if Path::new(segment)
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
                && !segment.contains(['\\', '\0'])
            {
                result.push(segment);
            }
        }
    }
}

/// Compute the file to serve for `request_path`.
///
/// A request for exactly `/` maps to `root/index` when an index file is configured.
/// Otherwise `prefix` is cut from the front of the path, the rest is percent-decoded and
/// split on `/`, and each remaining segment is joined onto `root`.
pub fn resolve_file_path(
    request_path: &str,
    prefix: &str,
    root: &Path,
    index: Option<&str>,
) -> PathBuf {
    if let (Some(index), "/") = (index, request_path) {
        return root.join(index);
    }

    let remainder = request_path
        .strip_prefix(prefix)
        .or_else(|| request_path.get(prefix.len()..))
        .unwrap_or_default();
    let decoded = decode_percents(remainder);

    let relative = decoded.split('/').fold(PathBuf::new(), |mut result, segment| {
        push_segment(&mut result, segment);
        result
    });
    if relative.as_os_str().is_empty() {
        return root.to_path_buf();
    }
    root.join(relative)
}
