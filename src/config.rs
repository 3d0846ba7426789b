use crate::executor::DEFAULT_TERMINATE_KEYWORD;

/// Prompt printed before each line unless configured otherwise.
pub const DEFAULT_PROMPT: &str = "$ ";

/// User-level settings of the interpreter.
///
/// Nothing here changes while the interpreter runs; the only state carried from one
/// line to the next is whether the terminate keyword has been seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Printed by the line source before each read.
    pub prompt: String,
    /// A stage with exactly this program name stops the interpreter.
    pub terminate_keyword: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            terminate_keyword: DEFAULT_TERMINATE_KEYWORD.to_string(),
        }
    }
}

impl ShellConfig {
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_terminate_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.terminate_keyword = keyword.into();
        self
    }
}
