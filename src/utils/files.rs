use crate::error::{DeployError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Expands a leading `~` to the user's home directory and anchors relative
/// paths on the current directory. When no home directory can be found the `~`
/// is kept as-is and reading the file will fail with a normal I/O error.
pub fn expand_path(path: &str) -> Result<PathBuf> {
    let expanded = match (path.strip_prefix('~'), dirs::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
            home.join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(path),
    };

    if expanded.is_absolute() {
        return Ok(expanded);
    }
    let cwd = std::env::current_dir().map_err(|e| DeployError::io(".", e))?;
    Ok(cwd.join(expanded))
}

/// fs::read_to_string, but the error remembers which file it was about
pub fn read_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|e| DeployError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tilde_goes_to_home() {
        let home = match dirs::home_dir() {
            Some(h) => h,
            None => return,
        };
        assert_eq!(expand_path("~/.ssh/id_rsa.pub").unwrap(), home.join(".ssh/id_rsa.pub"));
        assert_eq!(expand_path("~").unwrap(), home);
    }

    #[test]
    fn tilde_user_form_is_left_alone() {
        let expanded = expand_path("~bob/key.pub").unwrap();
        assert!(expanded.ends_with("~bob/key.pub"));
        assert!(expanded.is_absolute());
    }

    #[test]
    fn relative_paths_become_absolute() {
        let expanded = expand_path("keys/id.pub").unwrap();
        assert!(expanded.is_absolute());
        assert!(expanded.ends_with("keys/id.pub"));
    }

    #[test]
    fn absolute_paths_are_untouched() {
        assert_eq!(expand_path("/etc/hostname").unwrap(), PathBuf::from("/etc/hostname"));
    }

    #[test]
    fn missing_file_reports_its_path() {
        let err = read_text("/definitely/not/here.pub").unwrap_err();
        match err {
            DeployError::Io { path, .. } => assert_eq!(path, PathBuf::from("/definitely/not/here.pub")),
            other => panic!("expected an I/O error, got {:?}", other),
        }
    }
}
