use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::{EvalmapConfig, ScoringConfig, CONFIG_FILE_NAME};
use crate::errors::{Error, Result, ResultExt};

/// Pure function to read config file contents
pub(crate) fn read_config_file(path: &Path) -> std::result::Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Parse and validate config from a TOML string.
///
/// Invalid scoring weights are replaced by defaults with a warning. A TOML
/// syntax or type error comes back as `Error::Toml`, any other invalid
/// setting as `Error::Configuration`.
pub fn parse_and_validate_config(contents: &str) -> Result<EvalmapConfig> {
    let mut config: EvalmapConfig = toml::from_str(contents)?;

    if let Err(e) = config.scoring.validate() {
        tracing::warn!("Invalid scoring configuration: {}. Using defaults.", e);
        config.scoring = ScoringConfig::default();
    } else {
        config.scoring.normalize();
    }

    if let Err(e) = config.validate() {
        return Err(Error::Configuration(e));
    }

    Ok(config)
}

/// Load configuration from an explicit path; any failure is an error.
pub fn load_config_from_path(path: &Path) -> Result<EvalmapConfig> {
    let contents = read_config_file(path)
        .map_err(|e| Error::file_system("Failed to read config file", path, e))?;
    let config = parse_and_validate_config(&contents)
        .context(format!("Failed to parse {}", path.display()))?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Try loading config from a path found during discovery
pub(crate) fn try_load_config_from_path(config_path: &Path) -> Option<EvalmapConfig> {
    let contents = match read_config_file(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            handle_read_error(config_path, &e);
            return None;
        }
    };

    match parse_and_validate_config(&contents) {
        Ok(config) => {
            tracing::debug!("Loaded config from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse {}: {}. Using defaults.",
                config_path.display(),
                e
            );
            None
        }
    }
}

/// Handle file read errors with appropriate logging
pub(crate) fn handle_read_error(config_path: &Path, error: &std::io::Error) {
    // Only log actual errors, not "file not found"
    if error.kind() != std::io::ErrorKind::NotFound {
        tracing::warn!(
            "Failed to read config file {}: {}",
            config_path.display(),
            error
        );
    }
}

/// Directory ancestors of `start`, nearest first, up to `max_depth` entries
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Discover `.evalmap.toml` from `start` upward, falling back to defaults
pub fn load_config_from(start: PathBuf) -> EvalmapConfig {
    const MAX_TRAVERSAL_DEPTH: usize = 10;

    directory_ancestors(start, MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_else(|| {
            tracing::debug!(
                "No config found after checking {} directories. Using default config.",
                MAX_TRAVERSAL_DEPTH
            );
            EvalmapConfig::default()
        })
}

/// Discover configuration from the current directory
pub fn load_config() -> EvalmapConfig {
    match std::env::current_dir() {
        Ok(dir) => load_config_from(dir),
        Err(e) => {
            tracing::warn!(
                "Failed to get current directory: {}. Using default config.",
                e
            );
            EvalmapConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use tempfile::TempDir;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_and_validate_config("").unwrap();
        assert_eq!(config, EvalmapConfig::default());
    }

    #[test]
    fn test_partial_config_overrides() {
        let config = parse_and_validate_config(indoc! {r#"
            parallel = false

            [scoring.agreement_bonus]
            enabled = false
        "#})
        .unwrap();
        assert!(!config.parallel);
        assert!(!config.scoring.agreement_bonus.enabled);
        assert_eq!(config.scoring.automated_weight, 0.6);
    }

    #[test]
    fn test_invalid_weights_fall_back_to_defaults() {
        let config = parse_and_validate_config(indoc! {r#"
            [scoring]
            automated_weight = 2.0
            human_weight = 0.4
        "#})
        .unwrap();
        assert_eq!(config.scoring, ScoringConfig::default());
    }

    #[test]
    fn test_syntax_error_is_toml_error() {
        let err = parse_and_validate_config("parallel = = true").unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }

    #[test]
    fn test_explicit_path_errors_name_the_file() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("strict.toml");
        fs::write(&path, "default_expertise_weight = -1.0\n").unwrap();

        let err = load_config_from_path(&path).unwrap_err();
        assert!(matches!(
            &err,
            Error::WithContext { error, .. } if matches!(**error, Error::Configuration(_))
        ));
        assert!(err.to_string().starts_with("Failed to parse "));
        assert!(err.to_string().contains("strict.toml"));
        assert!(err.is_user_fixable());
    }

    #[test]
    fn test_negative_default_weight_rejected() {
        let err = parse_and_validate_config("default_expertise_weight = -1.0").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_discovers_config_in_ancestor() {
        let root = TempDir::new().unwrap();
        let nested = root.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(root.path().join(CONFIG_FILE_NAME), "parallel = false\n").unwrap();

        let config = load_config_from(nested);
        assert!(!config.parallel);
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let root = TempDir::new().unwrap();
        let result = load_config_from_path(&root.path().join("missing.toml"));
        assert!(matches!(result, Err(Error::FileSystem { .. })));
    }

    #[test]
    fn test_directory_ancestors_limit() {
        let dirs: Vec<_> = directory_ancestors(PathBuf::from("/a/b/c/d"), 2).collect();
        assert_eq!(dirs, vec![PathBuf::from("/a/b/c/d"), PathBuf::from("/a/b/c")]);
    }
}
