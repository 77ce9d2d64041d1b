//! Conversation types and state management

use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("Conversation must start with a user turn")]
    MustStartWithUser,

    #[error("Two consecutive {0} turns")]
    RoleNotAlternating(Role),
}

/// An append-only, strictly alternating user/assistant exchange.
///
/// The first turn is always `user`; turns are never reordered or removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Start a conversation with a single user turn
    pub fn from_user(content: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(content)],
        }
    }

    pub fn push(&mut self, message: Message) -> Result<(), ConversationError> {
        match self.messages.last() {
            None if message.role != Role::User => return Err(ConversationError::MustStartWithUser),
            Some(last) if last.role == message.role => {
                return Err(ConversationError::RoleNotAlternating(message.role))
            }
            _ => {}
        }
        self.messages.push(message);
        Ok(())
    }

    pub fn add_user(&mut self, content: impl Into<String>) -> Result<(), ConversationError> {
        self.push(Message::user(content))
    }

    pub fn add_assistant(&mut self, content: impl Into<String>) -> Result<(), ConversationError> {
        self.push(Message::assistant(content))
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Render turns as `role: content`, one per line
    pub fn render(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alternating_turns() {
        let mut conversation = Conversation::from_user("question");
        conversation.add_assistant("answers").unwrap();
        conversation.add_user("critique please").unwrap();

        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation.messages()[1].role, Role::Assistant);
    }

    #[test]
    fn test_rejects_repeated_role() {
        let mut conversation = Conversation::from_user("one");
        let err = conversation.add_user("two").unwrap_err();
        assert_eq!(err, ConversationError::RoleNotAlternating(Role::User));
        assert_eq!(conversation.len(), 1);
    }

    #[test]
    fn test_must_start_with_user() {
        let mut conversation = Conversation::default();
        assert_eq!(
            conversation.add_assistant("hi").unwrap_err(),
            ConversationError::MustStartWithUser
        );
        assert!(conversation.is_empty());
    }

    #[test]
    fn test_render() {
        let mut conversation = Conversation::from_user("What is 2+2?");
        conversation.add_assistant("4").unwrap();
        assert_eq!(conversation.render(), "user: What is 2+2?\nassistant: 4");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::assistant("ok")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"ok"}"#);
    }
}
