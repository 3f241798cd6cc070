/*!
 * Prompt templates for document translation.
 */

/// Instruction-style prompt pair sent with every translation call.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// System message, sent verbatim
    system: String,
    /// User message template with `{target_language}` and `{text}` placeholders
    user: String,
}

impl PromptTemplate {
    /// Create a new prompt template.
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }

    /// The system message.
    pub fn system(&self) -> &str {
        &self.system
    }

    /// Render the user message for one text unit.
    ///
    /// Placeholders are expanded in a single pass over the template, so
    /// neither value is ever scanned for placeholders itself.
    pub fn render(&self, target_language: &str, text: &str) -> String {
        let mut rendered = String::with_capacity(self.user.len() + text.len());
        let mut rest = self.user.as_str();

        while let Some(start) = rest.find('{') {
            rendered.push_str(&rest[..start]);
            let tail = &rest[start..];
            if let Some(after) = tail.strip_prefix("{target_language}") {
                rendered.push_str(target_language);
                rest = after;
            } else if let Some(after) = tail.strip_prefix("{text}") {
                rendered.push_str(text);
                rest = after;
            } else {
                rendered.push('{');
                rest = &tail[1..];
            }
        }
        rendered.push_str(rest);
        rendered
    }
}
