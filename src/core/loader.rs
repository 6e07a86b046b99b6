//! Record loading utilities
//!
//! A record file holds either one record or a list of records, in YAML
//! (`.yaml`/`.yml`) or JSON (`.json`). A directory is walked recursively
//! in file-name order; hidden entries such as `.srcc/` are skipped.

use miette::Diagnostic;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::yaml::YamlSyntaxError;

/// A record file could not be read or deserialized
#[derive(Debug, Error, Diagnostic)]
pub enum LoadError {
    #[error("path not found: {}", .0.display())]
    #[diagnostic(code(srcc::load::not_found))]
    NotFound(PathBuf),

    #[error("unsupported file type: {}", .0.display())]
    #[diagnostic(
        code(srcc::load::unsupported),
        help("record files must end in .yaml, .yml or .json")
    )]
    Unsupported(PathBuf),

    #[error("failed to read {}", path.display())]
    #[diagnostic(code(srcc::load::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] Box<YamlSyntaxError>),

    #[error("{} holds {count} records, expected exactly one", path.display())]
    #[diagnostic(code(srcc::load::count))]
    NotSingle { path: PathBuf, count: usize },
}

/// Record file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Json,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_lowercase().as_str() {
            "yaml" | "yml" => Some(FileFormat::Yaml),
            "json" => Some(FileFormat::Json),
            _ => None,
        }
    }
}

/// Record files under `path`: the file itself, or every record file in the
/// directory tree
pub fn record_files(path: &Path) -> Result<Vec<PathBuf>, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    if path.is_file() {
        return match FileFormat::from_path(path) {
            Some(_) => Ok(vec![path.to_path_buf()]),
            None => Err(LoadError::Unsupported(path.to_path_buf())),
        };
    }

    let files = WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|p| FileFormat::from_path(p).is_some())
        .collect();
    Ok(files)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|s| s.starts_with('.'))
}

/// Load every record of type T found under `path`
pub fn load_records<T: DeserializeOwned + 'static>(path: &Path) -> Result<Vec<T>, LoadError> {
    let mut records = Vec::new();
    for file in record_files(path)? {
        let mut loaded = load_file::<T>(&file)?;
        debug!(path = %file.display(), records = loaded.len(), "loaded record file");
        records.append(&mut loaded);
    }
    Ok(records)
}

/// Load exactly one record from a file
pub fn load_record<T: DeserializeOwned + 'static>(path: &Path) -> Result<T, LoadError> {
    let mut records = load_records::<T>(path)?;
    if records.len() == 1 {
        Ok(records.remove(0))
    } else {
        Err(LoadError::NotSingle {
            path: path.to_path_buf(),
            count: records.len(),
        })
    }
}

/// Deserialize one file holding a record or a list of records
pub fn load_file<T: DeserializeOwned + 'static>(path: &Path) -> Result<Vec<T>, LoadError> {
    let format = FileFormat::from_path(path).ok_or_else(|| LoadError::Unsupported(path.to_path_buf()))?;
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let filename = path.display().to_string();
    parse_records(&content, &filename, format)
}

/// Parse records from source text
///
/// The text is parsed twice: once into a generic value to tell a list from a
/// single record, then into the typed records so errors keep their location.
pub fn parse_records<T: DeserializeOwned + 'static>(
    content: &str,
    filename: &str,
    format: FileFormat,
) -> Result<Vec<T>, LoadError> {
    match format {
        FileFormat::Yaml => {
            let yaml_err = |e: serde_yml::Error| Box::new(YamlSyntaxError::from_serde_error(&e, content, filename));
            let value: serde_yml::Value = serde_yml::from_str(content).map_err(yaml_err)?;
            if value.is_null() {
                return Ok(Vec::new());
            }
            if value.is_sequence() {
                Ok(serde_yml::from_str::<Vec<T>>(content).map_err(yaml_err)?)
            } else {
                Ok(vec![serde_yml::from_str::<T>(content).map_err(yaml_err)?])
            }
        }
        FileFormat::Json => {
            let json_err = |e: serde_json::Error| Box::new(YamlSyntaxError::from_json_error(&e, content, filename));
            let value: serde_json::Value = serde_json::from_str(content).map_err(json_err)?;
            if value.is_array() {
                Ok(serde_json::from_str::<Vec<T>>(content).map_err(json_err)?)
            } else {
                Ok(vec![serde_json::from_str::<T>(content).map_err(json_err)?])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: String,
        age: u32,
    }

    #[test]
    fn test_single_and_list_yaml() {
        let one: Vec<Item> = parse_records("id: a\nage: 50\n", "one.yaml", FileFormat::Yaml).unwrap();
        assert_eq!(one, vec![Item { id: "a".into(), age: 50 }]);

        let many: Vec<Item> =
            parse_records("- id: a\n  age: 50\n- id: b\n  age: 61\n", "many.yaml", FileFormat::Yaml).unwrap();
        assert_eq!(many.len(), 2);
        assert_eq!(many[1].id, "b");
    }

    #[test]
    fn test_json_list() {
        let items: Vec<Item> =
            parse_records(r#"[{"id": "a", "age": 1}]"#, "x.json", FileFormat::Json).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_type_error_is_located() {
        let err = parse_records::<Item>("id: a\nage: old\n", "bad.yaml", FileFormat::Yaml).unwrap_err();
        assert!(matches!(err, LoadError::Syntax(_)));
        assert!(err.to_string().contains("bad.yaml"));
    }

    #[test]
    fn test_empty_yaml_is_empty() {
        let items: Vec<Item> = parse_records("", "empty.yaml", FileFormat::Yaml).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_directory_walk_skips_hidden_and_foreign_files() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::create_dir_all(dir.path().join(".srcc")).unwrap();
        fs::write(dir.path().join("b.yaml"), "id: b\nage: 2\n").unwrap();
        fs::write(dir.path().join("a.json"), r#"{"id": "a", "age": 1}"#).unwrap();
        fs::write(dir.path().join("nested/c.yml"), "- id: c\n  age: 3\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join(".srcc/config.yaml"), "default_format: json\n").unwrap();

        let items: Vec<Item> = load_records(dir.path()).unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_load_record_requires_one() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("two.yaml");
        fs::write(&path, "- id: a\n  age: 1\n- id: b\n  age: 2\n").unwrap();
        let err = load_record::<Item>(&path).unwrap_err();
        assert!(matches!(err, LoadError::NotSingle { count: 2, .. }));
    }

    #[test]
    fn test_missing_path() {
        let err = load_records::<Item>(Path::new("/nonexistent/cases")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }
}
