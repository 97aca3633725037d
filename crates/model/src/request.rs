/// A request to be sent to the model provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelRequest {
    /// The input messages.
    pub messages: Vec<ModelMessage>,
}

impl ModelRequest {
    /// Creates a single-turn request from a user prompt.
    #[inline]
    pub fn from_prompt<S: Into<String>>(prompt: S) -> Self {
        Self {
            messages: vec![ModelMessage::User(prompt.into())],
        }
    }

    /// Prepends system instructions to the request.
    #[inline]
    pub fn with_system<S: Into<String>>(mut self, instructions: S) -> Self {
        self.messages
            .insert(0, ModelMessage::System(instructions.into()));
        self
    }

    /// Returns the text of the last user message, if any.
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|msg| match msg {
            ModelMessage::User(text) => Some(text.as_str()),
            _ => None,
        })
    }
}

/// A complete message.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ModelMessage {
    /// The system instructions.
    System(String),
    /// A user input text.
    User(String),
    /// An assistant text.
    Assistant(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_goes_first() {
        let req = ModelRequest::from_prompt("What is Rust?")
            .with_system("Answer briefly.");
        assert_eq!(
            req.messages,
            vec![
                ModelMessage::System("Answer briefly.".to_owned()),
                ModelMessage::User("What is Rust?".to_owned()),
            ]
        );
        assert_eq!(req.last_user_text(), Some("What is Rust?"));
    }
}
