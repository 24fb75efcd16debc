//! Plain-text answers about a plotted function from an external language model.
//!
//! The service itself is not part of this crate: it is reached through the
//! `TextGenerator` trait, and its credentials come in an explicit `AssistantConfig`.
//! This module builds the tutor prompt, maps the service outcome to an
//! `AssistantReply` and strips the markdown the model likes to answer with.

use std::sync::LazyLock;

use regex::Regex;

use crate::errors::GeneratorError;

/// Environment variable `AssistantConfig::from_env` reads the key from.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const NOT_CONFIGURED: &str = "Gemini is not configured. Put GEMINI_API_KEY in the config or env.";
const NO_RESPONSE: &str = "No response text.";

static MARKDOWN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[*_#`]+").expect("valid markdown pattern"));
static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid blank line pattern"));
static BULLETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*[*-][ \t]+").expect("valid bullet pattern"));

/// Credentials and model name for the text-generation service.
#[derive(Clone, PartialEq, Eq)]
pub struct AssistantConfig {
    pub api_key: Option<String>,
    pub model: String,
}

impl AssistantConfig {
    pub fn new(api_key: Option<String>) -> Self {
        AssistantConfig {
            api_key,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Reads the key from `GEMINI_API_KEY`; unset means disabled.
    pub fn from_env() -> Self {
        Self::new(std::env::var(API_KEY_VAR).ok())
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// True when a non-blank key is present.
    pub fn is_enabled(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self::new(None)
    }
}

impl std::fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .finish()
    }
}

/// A text-generation service.
pub trait TextGenerator {
    /// Generates a completion for `prompt`. `Ok(None)` means the service answered
    /// without any text.
    fn generate(
        &self,
        config: &AssistantConfig,
        prompt: &str,
    ) -> Result<Option<String>, GeneratorError>;
}

/// Outcome of a question, ready to be shown next to the plot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantReply {
    Answer(String),
    Error(String),
}

/// Builds the tutor prompt for a question about the plotted functions.
pub fn build_prompt(function_text: &str, xmin: &str, xmax: &str, question: &str) -> String {
    format!(
        "You are a math tutor. Given a real-valued function f(x) and a range, \
         answer the user's question briefly and clearly.\n\n\
         Function(s): {function_text}\n\
         Range: x in [{xmin}, {xmax}]\n\
         Question: {question}\n\
         If helpful, mention intercepts, monotonicity, curvature, extrema, \
         and asymptotic behavior within the range."
    )
}

/// Turns a markdown-flavoured answer into plain text.
///
/// ```rust
/// use fnplot::assistant::prettify_answer;
///
/// assert_eq!(
///     prettify_answer("**roots**:\r\n\r\n\r\n- x = 0\n- x = pi"),
///     "Roots:\n\n• x = 0\n• x = pi"
/// );
/// ```
pub fn prettify_answer(text: &str) -> String {
    let stripped = MARKDOWN.replace_all(text, "");
    let normalized = stripped.replace('\r', "\n");
    let collapsed = BLANK_RUNS.replace_all(normalized.trim(), "\n\n");
    let bulleted = BULLETS.replace_all(&collapsed, "• ");

    let mut chars = bulleted.chars();
    match chars.next() {
        Some(first) if !first.is_uppercase() => first.to_uppercase().chain(chars).collect(),
        _ => bulleted.into_owned(),
    }
}

/// Answers questions about a plot through a `TextGenerator`.
pub struct Assistant<G> {
    config: AssistantConfig,
    generator: G,
}

impl<G: TextGenerator> Assistant<G> {
    pub fn new(config: AssistantConfig, generator: G) -> Self {
        Assistant { config, generator }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    /// Asks a question about the function(s) over a range.
    ///
    /// Returns `None` for a blank question. Service failures are returned as
    /// `AssistantReply::Error`, never as a Rust error.
    pub fn ask(
        &self,
        function_text: &str,
        xmin: &str,
        xmax: &str,
        question: &str,
    ) -> Option<AssistantReply> {
        let question = question.trim();
        if question.is_empty() {
            return None;
        }
        if !self.config.is_enabled() {
            return Some(AssistantReply::Error(NOT_CONFIGURED.to_string()));
        }

        let prompt = build_prompt(function_text, xmin, xmax, question);
        log::debug!("asking {} ({} prompt bytes)", self.config.model, prompt.len());
        let reply = match self.generator.generate(&self.config, &prompt) {
            Ok(text) => {
                let text = text.filter(|t| !t.trim().is_empty());
                AssistantReply::Answer(prettify_answer(text.as_deref().unwrap_or(NO_RESPONSE)))
            }
            Err(err) => {
                log::warn!("text generation failed: {err}");
                AssistantReply::Error(format!("Gemini error: {err}"))
            }
        };
        Some(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Recorder {
        reply: Result<Option<String>, String>,
        prompts: RefCell<Vec<String>>,
    }

    impl Recorder {
        fn answering(reply: Result<Option<&str>, &str>) -> Self {
            Recorder {
                reply: reply.map(|t| t.map(str::to_string)).map_err(str::to_string),
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl TextGenerator for &Recorder {
        fn generate(
            &self,
            _config: &AssistantConfig,
            prompt: &str,
        ) -> Result<Option<String>, GeneratorError> {
            self.prompts.borrow_mut().push(prompt.to_string());
            self.reply.clone().map_err(GeneratorError)
        }
    }

    fn enabled() -> AssistantConfig {
        AssistantConfig::new(Some("key".to_string()))
    }

    #[test]
    fn test_config_enabled_flag() {
        assert!(!AssistantConfig::default().is_enabled());
        assert!(!AssistantConfig::new(Some("  ".to_string())).is_enabled());
        assert!(enabled().is_enabled());
        assert_eq!(enabled().model, DEFAULT_MODEL);
    }

    #[test]
    fn test_config_debug_hides_key() {
        let debug = format!("{:?}", AssistantConfig::new(Some("secret-key".to_string())));
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_prompt() {
        let prompt = build_prompt("sin(x)", "-10", "10", "Where are the roots?");
        assert!(prompt.starts_with("You are a math tutor."));
        assert!(prompt.contains("Function(s): sin(x)\n"));
        assert!(prompt.contains("Range: x in [-10, 10]\n"));
        assert!(prompt.contains("Question: Where are the roots?\n"));
        assert!(prompt.ends_with("asymptotic behavior within the range."));
    }

    #[test]
    fn test_prettify() {
        assert_eq!(prettify_answer("# Title\n`code` and __bold__"), "Title\ncode and bold");
        assert_eq!(prettify_answer("a\n\n\n\n\nb"), "A\n\nb");
        assert_eq!(prettify_answer("  - first\n  - second"), "• first\n• second");
        assert_eq!(prettify_answer("Already fine."), "Already fine.");
        assert_eq!(prettify_answer("ßtraße"), "SStraße");
        assert_eq!(prettify_answer(""), "");
    }

    #[test]
    fn test_blank_question_is_ignored() {
        let recorder = Recorder::answering(Ok(Some("unused")));
        let assistant = Assistant::new(enabled(), &recorder);
        assert_eq!(assistant.ask("x", "-1", "1", "   "), None);
        assert!(recorder.prompts.borrow().is_empty());
    }

    #[test]
    fn test_disabled_config() {
        let recorder = Recorder::answering(Ok(Some("unused")));
        let assistant = Assistant::new(AssistantConfig::default(), &recorder);
        assert_eq!(
            assistant.ask("x", "-1", "1", "why?"),
            Some(AssistantReply::Error(NOT_CONFIGURED.to_string()))
        );
        assert!(recorder.prompts.borrow().is_empty());
    }

    #[test]
    fn test_answer_is_prettified() {
        let recorder = Recorder::answering(Ok(Some("**it is periodic**")));
        let assistant = Assistant::new(enabled(), &recorder);
        assert_eq!(
            assistant.ask("sin(x)", "-10", "10", " periodic? "),
            Some(AssistantReply::Answer("It is periodic".to_string()))
        );
        assert!(recorder.prompts.borrow()[0].contains("Question: periodic?\n"));
    }

    #[test]
    fn test_empty_answer() {
        for reply in [None, Some("  ")] {
            let recorder = Recorder::answering(Ok(reply));
            let assistant = Assistant::new(enabled(), &recorder);
            assert_eq!(
                assistant.ask("x", "0", "1", "slope?"),
                Some(AssistantReply::Answer(NO_RESPONSE.to_string()))
            );
        }
    }

    #[test]
    fn test_generator_error() {
        let recorder = Recorder::answering(Err("quota exceeded"));
        let assistant = Assistant::new(enabled(), &recorder);
        assert_eq!(
            assistant.ask("x", "0", "1", "slope?"),
            Some(AssistantReply::Error("Gemini error: quota exceeded".to_string()))
        );
    }
}
