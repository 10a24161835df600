//! Path normalization helpers for import resolution.
//!
//! Import paths in the emitted files are always forward-slash form, so the
//! helpers here normalize to that regardless of host platform.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Absolute, lexically normalized form of `path`, resolved against the
/// working directory when relative. Does not touch the filesystem beyond
/// reading the working directory, so nonexistent targets still resolve.
pub fn absolute(path: &Path) -> io::Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(normalize(&joined))
}

/// Removes `.` components and folds `..` into their parent where possible.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Relative path from directory `base` to `target`. Both must be absolute.
pub fn relative(base: &Path, target: &Path) -> Option<PathBuf> {
    if base.is_relative() || target.is_relative() {
        return None;
    }
    let base: Vec<Component> = base.components().collect();
    let target: Vec<Component> = target.components().collect();
    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..base.len() {
        out.push("..");
    }
    for component in &target[common..] {
        out.push(component.as_os_str());
    }
    Some(out)
}

/// Forward-slash rendering of a path.
pub fn to_slash(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        match component {
            Component::RootDir => out.push('/'),
            Component::Prefix(prefix) => out.push_str(&prefix.as_os_str().to_string_lossy()),
            other => {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str(&other.as_os_str().to_string_lossy());
            }
        }
    }
    out
}

/// Strips a trailing `.ts` suffix from a resolved import path; TypeScript
/// imports are written extensionless.
pub fn strip_ts_suffix(path: &str) -> String {
    match path.rfind(".ts") {
        Some(idx) => path[..idx].to_string(),
        None => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_walks_up_and_down() {
        let base = Path::new("/work/protos/api");
        assert_eq!(
            relative(base, Path::new("/work/protos/api/common.pb.ts")),
            Some(PathBuf::from("common.pb.ts"))
        );
        assert_eq!(
            relative(base, Path::new("/work/protos/shared/types.pb.ts")),
            Some(PathBuf::from("../shared/types.pb.ts"))
        );
        assert_eq!(relative(Path::new("rel"), Path::new("/abs")), None);
    }

    #[test]
    fn normalize_folds_dots() {
        assert_eq!(
            normalize(Path::new("/a/b/../c/./d")),
            PathBuf::from("/a/c/d")
        );
    }

    #[test]
    fn strips_only_the_ts_suffix() {
        assert_eq!(strip_ts_suffix("./foo.pb.ts"), "./foo.pb");
        assert_eq!(strip_ts_suffix("../bar"), "../bar");
    }
}
