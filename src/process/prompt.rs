//! Interactive prompt answering policy

use std::time::Duration;

/// Best-effort detection of an interactive prompt in streamed output.
///
/// Provider CLIs occasionally stop to ask a question even with every
/// non-interactive flag set. There is no terminal protocol to speak of;
/// the policy watches the accumulated stdout for trigger substrings and
/// answers at most once per run, then closes stdin.
#[derive(Debug, Clone)]
pub struct PromptPolicy {
    /// Substrings that mark a rendered prompt
    pub triggers: Vec<String>,

    /// Text written to stdin; stdin is closed afterwards
    pub response: String,

    /// Delay before writing, to let the prompt finish rendering
    pub settle_delay: Duration,
}

impl PromptPolicy {
    /// Accept whatever default the prompt offers
    pub fn accept_default() -> Self {
        Self {
            triggers: vec!["?".to_string(), "arrow keys".to_string()],
            response: "\n".to_string(),
            settle_delay: Duration::from_millis(500),
        }
    }

    pub fn with_response(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            ..Self::accept_default()
        }
    }

    /// True when the accumulated output contains any trigger
    pub fn matches(&self, output: &str) -> bool {
        self.triggers.iter().any(|t| output.contains(t.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_triggers() {
        let policy = PromptPolicy::accept_default();
        assert!(policy.matches("? Select a team"));
        assert!(policy.matches("Use arrow keys to choose"));
        assert!(!policy.matches("Uploading files..."));
    }

    #[test]
    fn test_custom_response_keeps_triggers() {
        let policy = PromptPolicy::with_response("yes\n");
        assert_eq!(policy.response, "yes\n");
        assert!(policy.matches("? Continue"));
    }
}
