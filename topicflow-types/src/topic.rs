//! Topic name normalization.

/// Normalize a topic name to its canonical form.
///
/// Topic names are case-insensitive: `"sum"`, `"Sum"` and `" SUM "` all
/// refer to the same topic. The canonical form is trimmed and upper-cased.
///
/// # Example
///
/// ```rust
/// use topicflow_types::canonical_topic;
///
/// assert_eq!(canonical_topic(" orders.new "), "ORDERS.NEW");
/// ```
pub fn canonical_topic(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Normalize a list of topic names, dropping entries that are empty after trimming.
pub fn canonical_topics<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| canonical_topic(name.as_ref()))
        .filter(|name| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_topic_is_case_insensitive() {
        assert_eq!(canonical_topic("x"), canonical_topic("X"));
        assert_eq!(canonical_topic("MixedCase"), "MIXEDCASE");
    }

    #[test]
    fn canonical_topic_trims_whitespace() {
        assert_eq!(canonical_topic("  a b  "), "A B");
    }

    #[test]
    fn canonical_topics_drops_blank_entries() {
        let names = canonical_topics(["a", " ", "", "b "]);
        assert_eq!(names, vec!["A", "B"]);
    }
}
