//! Configuration file discovery (spec.md §1 "configuration file discovery"
//! is an external collaborator; §6 "Configuration file" gives its exact
//! search order).

use std::path::{Path, PathBuf};

/// `$FENSTERCHEF_CONFIGURATION_OVERRIDE` if set; else
/// `$XDG_CONFIG_HOME/fensterchef/config` (default `~/.config/fensterchef/config`);
/// else the first readable `fensterchef/config` under `$XDG_CONFIG_DIRS`
/// (default `/usr/local/share:/usr/share`). First readable file wins.
#[must_use]
pub fn discover() -> Option<PathBuf> {
    if let Ok(over) = std::env::var("FENSTERCHEF_CONFIGURATION_OVERRIDE") {
        let path = PathBuf::from(over);
        if path.is_file() {
            return Some(path);
        }
    }

    let config_home = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .ok()
        .or_else(|| std::env::var("HOME").ok().map(|h| Path::new(&h).join(".config")));
    if let Some(home) = config_home {
        let path = home.join("fensterchef").join("config");
        if path.is_file() {
            return Some(path);
        }
    }

    let dirs = std::env::var("XDG_CONFIG_DIRS").unwrap_or_else(|_| "/usr/local/share:/usr/share".to_string());
    for dir in dirs.split(':').filter(|d| !d.is_empty()) {
        let path = Path::new(dir).join("fensterchef").join("config");
        if path.is_file() {
            return Some(path);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins_when_file_exists() {
        let dir = std::env::temp_dir().join(format!("fensterchef-cfgtest-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("config");
        std::fs::write(&file, "quit").unwrap();
        std::env::set_var("FENSTERCHEF_CONFIGURATION_OVERRIDE", &file);
        assert_eq!(discover(), Some(file.clone()));
        std::env::remove_var("FENSTERCHEF_CONFIGURATION_OVERRIDE");
        std::fs::remove_dir_all(&dir).ok();
    }
}
