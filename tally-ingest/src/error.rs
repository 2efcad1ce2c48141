use thiserror::Error;

/// The only failure the pipeline surfaces: no text could be obtained.
///
/// Everything else (bad line, bad date, out-of-range amount) is a per-line
/// skip reported through `ExtractionStats`.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("no text: {}", attempts.join("; "))]
    NoText { attempts: Vec<String> },
}

impl ExtractionError {
    pub fn no_text(attempts: Vec<String>) -> Self {
        Self::NoText { attempts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_lists_attempts() {
        let err = ExtractionError::no_text(vec![
            "pdf-extract: empty result".to_string(),
            "lopdf: invalid file header".to_string(),
        ]);
        let msg = err.to_string();
        assert!(msg.starts_with("no text"));
        assert!(msg.contains("lopdf: invalid file header"));
    }
}
