//! Canonical-embedding-text truncation (specification §4.3).
//!
//! Verbose schema fragments that operators sometimes append to a tool's
//! description would otherwise dominate the embedding vector; truncating
//! at the first delimiter occurrence that leaves a long-enough prefix
//! keeps the embedded text close to the human-facing summary.

pub use config::TruncationConfig;

/// Truncates `description` per `config`.
///
/// If `config.enabled` is `false` or `description` is empty, returns it
/// unchanged. Otherwise scans for successive occurrences of
/// `config.delimiter`, starting from `config.occurrence`, and returns the
/// first prefix (trimmed) whose length is at least `config.min_length`.
/// If no occurrence yields a long-enough prefix, the original description
/// is returned verbatim.
pub fn truncate(description: &str, config: &TruncationConfig) -> String {
    if !config.enabled || description.is_empty() || config.delimiter.is_empty() {
        return description.to_string();
    }

    let mut search_from = 0;
    let mut occurrence = 0;

    while let Some(relative) = description[search_from..].find(config.delimiter.as_str()) {
        let position = search_from + relative;
        occurrence += 1;

        if occurrence >= config.occurrence {
            let prefix = description[..position].trim();

            if prefix.chars().count() >= config.min_length {
                return prefix.to_string();
            }
        }

        search_from = position + config.delimiter.len();
    }

    description.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(occurrence: usize, min_length: usize) -> TruncationConfig {
        TruncationConfig {
            enabled: true,
            delimiter: "\n".to_string(),
            occurrence,
            min_length,
        }
    }

    #[test]
    fn disabled_returns_verbatim() {
        let mut cfg = config(1, 5);
        cfg.enabled = false;
        assert_eq!(truncate("A long paragraph.\n{schema}", &cfg), "A long paragraph.\n{schema}");
    }

    #[test]
    fn empty_description_returns_empty() {
        assert_eq!(truncate("", &config(1, 5)), "");
    }

    #[test]
    fn truncates_at_first_occurrence_when_long_enough() {
        let result = truncate("A long paragraph.\n{schema: ...}", &config(1, 5));
        assert_eq!(result, "A long paragraph.");
    }

    #[test]
    fn skips_too_short_prefix_and_tries_next_occurrence() {
        let result = truncate("Hi\nA long enough paragraph.\nmore", &config(1, 5));
        assert_eq!(result, "Hi\nA long enough paragraph.");
    }

    #[test]
    fn falls_back_to_full_description_when_no_prefix_qualifies() {
        let result = truncate("Hi\nOk\nYo", &config(1, 5));
        assert_eq!(result, "Hi\nOk\nYo");
    }

    #[test]
    fn honors_occurrence_greater_than_one() {
        let result = truncate("First part here.\nSecond part here.\nthird", &config(2, 5));
        assert_eq!(result, "First part here.\nSecond part here.");
    }

    #[test]
    fn no_delimiter_present_returns_verbatim() {
        let result = truncate("No delimiter at all", &config(1, 5));
        assert_eq!(result, "No delimiter at all");
    }
}
