// Runtime settings, read once at startup from <project_dir>/.beatbox/config.json.
// Every field has a default, so a missing file or a partial one is fine.
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::{DEFAULT_MASTER_GAIN, DEFAULT_TEMPO};

const BEATBOX_DIR: &str = ".beatbox";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneratorCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tempo: f64,
    pub master_gain: f32,
    pub generator_command: Option<GeneratorCommand>,
    pub prompt: String,
    pub recordings_dir: Option<PathBuf>, // defaults to the project dir
    pub log_filter: String,
    pub capture_stop_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tempo: DEFAULT_TEMPO,
            master_gain: DEFAULT_MASTER_GAIN,
            generator_command: None,
            prompt: String::from("Atmospheric Latin Techno anthemic vibe"),
            recordings_dir: None,
            log_filter: String::from("beatbox=info"),
            capture_stop_timeout_ms: 250,
        }
    }
}

impl Config {
    pub fn capture_stop_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_stop_timeout_ms)
    }

    pub fn recordings_dir(&self, project_dir: &Path) -> PathBuf {
        match &self.recordings_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => project_dir.join(dir),
            None => project_dir.to_path_buf(),
        }
    }
}

// <project_dir>/.beatbox/config.json
pub fn config_file_path(project_dir: &Path) -> PathBuf {
    project_dir.join(BEATBOX_DIR).join(CONFIG_FILE)
}

pub fn load_config(project_dir: &Path) -> Result<Config, ConfigError> {
    let path = config_file_path(project_dir);
    let data = match std::fs::read_to_string(&path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(source) => return Err(ConfigError::Io { path, source }),
    };
    serde_json::from_str(&data).map_err(|source| ConfigError::Parse { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &Path, body: &str) {
        let path = config_file_path(dir);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.tempo, 128.0);
        assert_eq!(config.master_gain, 0.5);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            r#"{"tempo": 96, "generator_command": {"program": "gen-pattern"}}"#,
        );
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.tempo, 96.0);
        assert_eq!(config.master_gain, 0.5);
        assert_eq!(
            config.generator_command,
            Some(GeneratorCommand { program: "gen-pattern".into(), args: vec![] })
        );
    }

    #[test]
    fn broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), "{ tempo: ");
        assert!(matches!(load_config(dir.path()), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn relative_recordings_dir_is_under_the_project() {
        let config = Config {
            recordings_dir: Some(PathBuf::from("takes")),
            ..Config::default()
        };
        let project = Path::new("/tmp/project");
        assert_eq!(config.recordings_dir(project), project.join("takes"));
        assert_eq!(Config::default().recordings_dir(project), project);
    }
}
