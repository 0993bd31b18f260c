//! String and file helpers shared by the preprocessor and the manager.

use crate::error::{Result, ShaderError};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Split `s` on every occurrence of `delim`.
///
/// Always yields at least one part: `split("", ":")` is `[""]` and
/// `split("a:", ":")` is `["a", ""]`.
pub fn split(s: &str, delim: &str) -> Vec<String> {
    if delim.is_empty() {
        return vec![s.to_string()];
    }
    s.split(delim).map(str::to_string).collect()
}

/// Join `parts` with `delim`, the inverse of [`split`].
pub fn join<S: AsRef<str>>(parts: &[S], delim: &str) -> String {
    let mut whole = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            whole.push_str(delim);
        }
        whole.push_str(part.as_ref());
    }
    whole
}

pub fn begins_with(s: &str, prefix: &str) -> bool {
    s.starts_with(prefix)
}

/// Read a whole file, mapping a missing file to [`ShaderError::FileNotFound`].
pub fn read_file_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => ShaderError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => ShaderError::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}

/// Last modification time, or `None` if the file cannot be stat'ed.
pub fn file_modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

pub fn is_regular_file(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}

/// File name component as a string, or the whole path if there is none.
pub fn basename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Extension without the dot, or an empty string.
pub fn extension(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Canonical form of `path`, used to compare paths that may reach the same
/// file through different routes (symlinks, `.` components).
///
/// A path that no longer exists is resolved through its parent directory, so
/// a deleted file still compares equal to the path it was recorded under.
/// Falls back to `path` itself when neither resolves.
pub fn identity(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|dir| dir.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_split_keeps_empty_parts() {
        assert_eq!(split("basic:FOO:BAR=1", ":"), vec!["basic", "FOO", "BAR=1"]);
        assert_eq!(split("basic:", ":"), vec!["basic", ""]);
        assert_eq!(split("", ":"), vec![""]);
        assert_eq!(split("a::b", ":"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_split_multichar_delimiter() {
        assert_eq!(split("a\r\nb", "\r\n"), vec!["a", "b"]);
    }

    #[test]
    fn test_join_inverts_split() {
        let parts = split("x:y::z", ":");
        assert_eq!(join(&parts, ":"), "x:y::z");
        assert_eq!(join::<&str>(&[], ":"), "");
        assert_eq!(join(&["only"], "\n"), "only");
    }

    #[test]
    fn test_begins_with() {
        assert!(begins_with("#version 450", "#version "));
        assert!(!begins_with("#versio", "#version "));
        assert!(!begins_with(" #include a", "#include "));
    }

    #[test]
    fn test_path_helpers() {
        let path = PathBuf::from("/shaders/volume/iso.frag");
        assert_eq!(basename(&path), "iso.frag");
        assert_eq!(extension(&path), "frag");
        assert_eq!(extension(Path::new("/shaders/README")), "");
    }

    #[test]
    fn test_file_queries() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file = temp_dir.path().join("a.vert");
        fs::write(&file, "void main(){}").expect("Failed to write file");

        assert!(is_regular_file(&file));
        assert!(!is_regular_file(temp_dir.path()));
        assert!(file_modified_time(&file).is_some());
        assert!(file_modified_time(&temp_dir.path().join("missing")).is_none());
        assert_eq!(
            read_file_to_string(&file).expect("read failed"),
            "void main(){}"
        );
        assert!(matches!(
            read_file_to_string(&temp_dir.path().join("missing")),
            Err(ShaderError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_identity_of_deleted_file_resolves_through_parent() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file = temp_dir.path().join("gone.glsl");
        fs::write(&file, "").expect("Failed to write file");
        let live = identity(&file);

        fs::remove_file(&file).expect("Failed to remove file");
        assert_eq!(identity(&file), live);
        assert_eq!(identity(Path::new("no/such/dir/x.glsl")), PathBuf::from("no/such/dir/x.glsl"));
    }

    #[cfg(unix)]
    #[test]
    fn test_identity_sees_through_symlinked_dir() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let real = temp_dir.path().join("real");
        fs::create_dir_all(&real).expect("Failed to create dir");
        let link = temp_dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).expect("Failed to create symlink");

        // Neither file exists; both resolve through their parents.
        assert_eq!(identity(&link.join("a.glsl")), identity(&real.join("a.glsl")));
    }
}
