// src/infra/paths.rs — Path management
//
// All paths respect the GAVEL_HOME environment variable for isolation.
// When GAVEL_HOME is set, config and data live under that directory.
// When unset, config uses ~/.gavel/ and data uses XDG_DATA_HOME/gavel.

use directories::ProjectDirs;
use std::path::PathBuf;
use std::sync::OnceLock;

static PROJECT_DIRS: OnceLock<ProjectDirs> = OnceLock::new();

fn project_dirs() -> &'static ProjectDirs {
    PROJECT_DIRS.get_or_init(|| {
        ProjectDirs::from("", "", "gavel").expect("Could not determine home directory")
    })
}

fn gavel_home() -> Option<PathBuf> {
    std::env::var_os("GAVEL_HOME").map(PathBuf::from)
}

/// Configuration directory: $GAVEL_HOME/ or ~/.gavel/
pub fn config_dir() -> PathBuf {
    if let Some(home) = gavel_home() {
        return home;
    }
    dirs_home().join(".gavel")
}

/// Data directory: $GAVEL_HOME/data/ or XDG_DATA_HOME/gavel
pub fn data_dir() -> PathBuf {
    if let Some(home) = gavel_home() {
        return home.join("data");
    }
    project_dirs().data_local_dir().to_path_buf()
}

fn dirs_home() -> PathBuf {
    directories::BaseDirs::new()
        .expect("Could not determine home directory")
        .home_dir()
        .to_path_buf()
}

pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

pub fn db_path() -> PathBuf {
    data_dir().join("gavel.db")
}
