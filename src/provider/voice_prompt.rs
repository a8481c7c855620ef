//! Static spoken prompt served to the provider when a call connects.

use crate::config::VoicePromptConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoicePrompt {
    pub message: String,
    pub voice: String,
}

impl VoicePrompt {
    pub fn new(message: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            voice: voice.into(),
        }
    }

    /// Render as a TwiML `<Say>` document. No input is collected.
    pub fn to_twiml(&self) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Response>\n<Say voice=\"{}\">{}</Say>\n</Response>\n",
            escape_xml(&self.voice),
            escape_xml(&self.message)
        )
    }
}

impl From<&VoicePromptConfig> for VoicePrompt {
    fn from(config: &VoicePromptConfig) -> Self {
        Self::new(config.message.clone(), config.voice.clone())
    }
}

impl Default for VoicePrompt {
    fn default() -> Self {
        Self::from(&VoicePromptConfig::default())
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
