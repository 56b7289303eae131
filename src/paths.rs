use std::path::{Path, PathBuf};

pub const SETTINGS: &str = "config/deployment.yml";
pub const DEFAULT_PUBLIC_KEY: &str = "~/.ssh/id_rsa.pub";

/// Compiled in, so the program deploys the same template wherever it is started from
pub const BUNDLED_TEMPLATE: &str = include_str!("../templates/template.json");

/// Finds a relative data file: in the current directory first, then next to the
/// executable. Falls back to the relative path itself when neither has it.
pub fn locate(relative: &str) -> PathBuf {
    let rel = Path::new(relative);
    if rel.is_absolute() || rel.exists() {
        return rel.to_path_buf();
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(rel)))
        .filter(|candidate| candidate.exists())
        .unwrap_or_else(|| rel.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_paths_are_kept() {
        assert_eq!(locate("/etc/deployment.yml"), PathBuf::from("/etc/deployment.yml"));
    }

    #[test]
    fn found_next_to_the_executable() {
        let exe_dir = std::env::current_exe().unwrap().parent().unwrap().to_path_buf();
        let file = tempfile::Builder::new().prefix("locate-").suffix(".yml").tempfile_in(&exe_dir).unwrap();
        let name = file.path().file_name().unwrap().to_string_lossy().to_string();

        assert_eq!(locate(&name), exe_dir.join(&name));
    }

    #[test]
    fn unknown_files_stay_relative() {
        assert_eq!(locate("config/not-there-anywhere.yml"), PathBuf::from("config/not-there-anywhere.yml"));
    }

    #[test]
    fn bundled_template_is_json() {
        let template: serde_json::Value = serde_json::from_str(BUNDLED_TEMPLATE).unwrap();
        assert!(template["resources"].as_array().map(|r| !r.is_empty()).unwrap_or(false));
    }
}
