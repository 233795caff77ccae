//! Configuration file discovery

use std::path::{Path, PathBuf};

use super::env::config_override;

/// File names tried in the working directory, first match wins
const LOCAL_NAMES: &[&str] = &["hwtest.yaml", "hwtest.yml", "hwtest.json", ".hwtest.yaml"];

/// `HWTEST_CONFIG`, then the working directory, then the user config dir
pub fn find_config() -> Option<PathBuf> {
    if let Some(path) = config_override() {
        return Some(expand_home(&path));
    }
    candidates(Path::new("."), dirs::config_dir().as_deref())
        .into_iter()
        .find(|path| path.is_file())
}

fn candidates(cwd: &Path, user_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = LOCAL_NAMES.iter().map(|name| cwd.join(name)).collect();
    if let Some(dir) = user_dir {
        paths.push(dir.join("hwtest").join("config.yaml"));
    }
    paths
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// `.yaml` / `.yml`, case-insensitive
pub fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_order() {
        let found = candidates(Path::new("/work"), Some(Path::new("/home/u/.config")));
        assert_eq!(found.first(), Some(&PathBuf::from("/work/hwtest.yaml")));
        assert_eq!(
            found.last(),
            Some(&PathBuf::from("/home/u/.config/hwtest/config.yaml"))
        );
        assert_eq!(candidates(Path::new("."), None).len(), LOCAL_NAMES.len());
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("./hwtest.yaml"), PathBuf::from("./hwtest.yaml"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/x.yaml"), home.join("x.yaml"));
        }
    }

    #[test]
    fn test_is_yaml_file() {
        assert!(is_yaml_file(Path::new("suite.yml")));
        assert!(is_yaml_file(Path::new("dir/suite.YAML")));
        assert!(!is_yaml_file(Path::new("suite.json")));
        assert!(!is_yaml_file(Path::new("suite")));
    }
}
