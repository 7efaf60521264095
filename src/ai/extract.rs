use serde_json::Value;

/// One way of pulling generated text out of a provider response.
pub trait ResponseExtractor: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, body: &Value) -> Option<String>;
}

/// `{"candidates": [{"content": {"parts": [{"text": "..."}]}}]}`
pub struct CandidateParts;

impl ResponseExtractor for CandidateParts {
    fn name(&self) -> &'static str {
        "candidates[0].content.parts[0].text"
    }

    fn extract(&self, body: &Value) -> Option<String> {
        body.pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// `{"candidates": [{"content": "..."}]}`
pub struct CandidateContent;

impl ResponseExtractor for CandidateContent {
    fn name(&self) -> &'static str {
        "candidates[0].content"
    }

    fn extract(&self, body: &Value) -> Option<String> {
        body.pointer("/candidates/0/content")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// `{"output": {"text": "..."}}` or `{"output": "..."}`
pub struct OutputField;

impl ResponseExtractor for OutputField {
    fn name(&self) -> &'static str {
        "output"
    }

    fn extract(&self, body: &Value) -> Option<String> {
        let output = body.get("output")?;
        output
            .as_str()
            .or_else(|| output.get("text").and_then(Value::as_str))
            .map(str::to_string)
    }
}

/// A plain string under one of a few conventional top-level keys.
pub struct TopLevelText;

impl ResponseExtractor for TopLevelText {
    fn name(&self) -> &'static str {
        "top-level text"
    }

    fn extract(&self, body: &Value) -> Option<String> {
        ["summary", "text", "result", "reply"]
            .iter()
            .find_map(|key| body.get(*key).and_then(Value::as_str))
            .map(str::to_string)
    }
}

/// Extractors in the order they are tried.
pub fn default_extractors() -> Vec<Box<dyn ResponseExtractor>> {
    vec![
        Box::new(CandidateParts),
        Box::new(CandidateContent),
        Box::new(OutputField),
        Box::new(TopLevelText),
    ]
}

/// First non-empty text any extractor finds.
pub fn extract_text(extractors: &[Box<dyn ResponseExtractor>], body: &Value) -> Option<String> {
    extractors.iter().find_map(|extractor| {
        let text = extractor.extract(body).filter(|t| !t.trim().is_empty())?;
        tracing::trace!(extractor = extractor.name(), "Matched LLM response shape");
        Some(text)
    })
}
