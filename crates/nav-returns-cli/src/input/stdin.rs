use std::io::{self, Read};

/// Piped document text, or `None` when stdin is a terminal or carries nothing.
pub fn read_stdin() -> Result<Option<String>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    if buffer.trim().is_empty() {
        tracing::debug!("stdin is empty, falling back to flags");
        return Ok(None);
    }
    tracing::debug!(bytes = buffer.len(), "read plan from stdin");
    Ok(Some(buffer))
}
