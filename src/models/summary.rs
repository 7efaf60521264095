/// Which path produced a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummarySource {
    Remote,
    #[default]
    Extractive,
}

/// A summary together with the path that produced it, so callers and tests
/// can see when the remote client was bypassed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SummaryOutcome {
    pub text: String,
    pub source: SummarySource,
}

impl SummaryOutcome {
    pub fn remote(text: String) -> Self {
        Self {
            text,
            source: SummarySource::Remote,
        }
    }

    pub fn extractive(text: String) -> Self {
        Self {
            text,
            source: SummarySource::Extractive,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
