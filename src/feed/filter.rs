/// Decides whether a candidate entry is worth persisting.
pub trait RelevancePolicy: Send + Sync {
    fn is_relevant(&self, title: &str, summary: &str) -> bool;
}

/// Keeps every entry. Used when filtering is switched off in the config.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl RelevancePolicy for AcceptAll {
    fn is_relevant(&self, _title: &str, _summary: &str) -> bool {
        true
    }
}

/// Case-insensitive substring match of any keyword against title + summary.
#[derive(Debug, Clone)]
pub struct KeywordFilter {
    keywords: Vec<String>,
}

impl KeywordFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }
}

impl RelevancePolicy for KeywordFilter {
    fn is_relevant(&self, title: &str, summary: &str) -> bool {
        let text = format!("{} {}", title, summary).to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_match_is_case_insensitive() {
        let filter = KeywordFilter::new(["Copilot", "developer productivity"]);
        assert!(filter.is_relevant("GitHub COPILOT study", ""));
        assert!(filter.is_relevant("A study", "on Developer Productivity in teams"));
        assert!(!filter.is_relevant("Protein folding", "structures"));
    }

    #[test]
    fn matches_substrings_without_stemming() {
        let filter = KeywordFilter::new(["agent"]);
        assert!(filter.is_relevant("Multi-agents at scale", ""));
        let filter = KeywordFilter::new(["agents"]);
        assert!(!filter.is_relevant("An agent", ""));
    }

    #[test]
    fn empty_keyword_set_rejects_everything() {
        let filter = KeywordFilter::new(Vec::<String>::new());
        assert!(!filter.is_relevant("anything", "at all"));
        assert!(AcceptAll.is_relevant("anything", "at all"));
    }
}
