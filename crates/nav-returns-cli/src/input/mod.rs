pub mod file;
pub mod nav_csv;
pub mod stdin;

use serde::de::DeserializeOwned;

use file::DocumentFormat;

/// Resolve a command's input document: `--input` file first, then piped stdin
/// (JSON or YAML, told apart by the first character).
pub fn read_document<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(Some(file::read_document(path)?));
    }
    match stdin::read_stdin()? {
        Some(text) => Ok(Some(file::parse_document(
            &text,
            DocumentFormat::sniff(&text),
            "stdin",
        )?)),
        None => Ok(None),
    }
}
