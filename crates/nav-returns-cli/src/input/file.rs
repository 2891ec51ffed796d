use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Which parser a document goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// `.yaml` / `.yml` files are YAML; everything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                DocumentFormat::Yaml
            }
            _ => DocumentFormat::Json,
        }
    }

    /// Piped text has no extension: a leading `{` or `[` means JSON.
    pub fn sniff(contents: &str) -> Self {
        match contents.trim_start().chars().next() {
            Some('{') | Some('[') => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

/// Deserialise a plan document. `source` names it in error messages.
pub fn parse_document<T: DeserializeOwned>(
    contents: &str,
    format: DocumentFormat,
    source: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    let parsed = match format {
        DocumentFormat::Json => {
            serde_json::from_str(contents).map_err(|e| format!("Failed to parse {source} as JSON: {e}"))?
        }
        DocumentFormat::Yaml => {
            serde_yaml::from_str(contents).map_err(|e| format!("Failed to parse {source} as YAML: {e}"))?
        }
    };
    Ok(parsed)
}

/// Read a JSON or YAML file (by extension) into a typed plan.
pub fn read_document<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    parse_document(
        &contents,
        DocumentFormat::from_path(&canonical),
        &format!("'{}'", canonical.display()),
    )
}

/// Resolve a relative path against the working directory and check it is a file.
pub fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }
    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }
    Ok(canonical)
}
