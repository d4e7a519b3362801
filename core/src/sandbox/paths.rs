use std::path::{Component, Path, PathBuf};

use crate::error::PathError;

/// Lexically validate a step path: relative, no `..`, no root or drive prefix.
pub fn normalize_relative(requested: &str) -> Result<PathBuf, PathError> {
    if requested.trim().is_empty() {
        return Err(PathError::Empty);
    }
    let mut clean = PathBuf::new();
    for comp in Path::new(requested).components() {
        match comp {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir => return Err(PathError::Traversal(requested.to_string())),
            Component::RootDir | Component::Prefix(_) => {
                return Err(PathError::Absolute(requested.to_string()))
            }
        }
    }
    if clean.as_os_str().is_empty() {
        return Err(PathError::Empty);
    }
    Ok(clean)
}

/// Resolve `requested` under the canonical `root`, refusing anything that lands outside
/// it either lexically or through an existing symlink.
pub async fn confine(root: &Path, requested: &str) -> Result<PathBuf, PathError> {
    let rel = normalize_relative(requested)?;
    let candidate = root.join(rel);
    ensure_within(root, &candidate, requested).await?;
    Ok(candidate)
}

async fn ensure_within(root: &Path, candidate: &Path, requested: &str) -> Result<(), PathError> {
    // Canonicalize the deepest existing ancestor; everything below it is created fresh.
    let mut cursor = candidate;
    loop {
        match tokio::fs::canonicalize(cursor).await {
            Ok(real) if real.starts_with(root) => return Ok(()),
            Ok(_) => return Err(PathError::LinkEscape(requested.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // A dangling link would be followed on write.
                if tokio::fs::symlink_metadata(cursor).await.is_ok() {
                    return Err(PathError::LinkEscape(requested.to_string()));
                }
                cursor = cursor.parent().ok_or_else(|| PathError::Unresolvable {
                    path: requested.to_string(),
                    reason: "no existing ancestor".into(),
                })?;
            }
            Err(e) => {
                return Err(PathError::Unresolvable {
                    path: requested.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_plain_and_dotted_paths() {
        assert_eq!(
            normalize_relative("./out/data.txt").unwrap(),
            PathBuf::from("out/data.txt")
        );
        assert_eq!(normalize_relative("a.txt").unwrap(), PathBuf::from("a.txt"));
    }

    #[test]
    fn rejects_traversal_and_absolute() {
        assert_eq!(
            normalize_relative("../secret"),
            Err(PathError::Traversal("../secret".into()))
        );
        assert!(matches!(
            normalize_relative("a/../../b"),
            Err(PathError::Traversal(_))
        ));
        assert!(matches!(
            normalize_relative("/etc/passwd"),
            Err(PathError::Absolute(_))
        ));
        assert_eq!(normalize_relative("  "), Err(PathError::Empty));
        assert_eq!(normalize_relative("."), Err(PathError::Empty));
    }

    #[tokio::test]
    async fn confine_allows_new_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = tokio::fs::canonicalize(dir.path()).await.unwrap();
        let p = confine(&root, "new/dir/file.txt").await.unwrap();
        assert!(p.starts_with(&root));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn confine_rejects_symlink_escape() {
        let outside = tempfile::tempdir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let root = tokio::fs::canonicalize(dir.path()).await.unwrap();
        std::os::unix::fs::symlink(outside.path(), root.join("link")).unwrap();

        let err = confine(&root, "link/stolen.txt").await.unwrap_err();
        assert!(matches!(err, PathError::LinkEscape(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn confine_rejects_dangling_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let root = tokio::fs::canonicalize(dir.path()).await.unwrap();
        std::os::unix::fs::symlink("/nonexistent/agentbox-target", root.join("dangling")).unwrap();

        let err = confine(&root, "dangling").await.unwrap_err();
        assert!(matches!(err, PathError::LinkEscape(_)));
    }
}
