//! Users, friendships and one-to-one chat.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SketchError};

/// A user's profile document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub friends: Vec<String>,
}

impl UserProfile {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            friends: Vec::new(),
        }
    }

    pub fn is_friend(&self, user_id: &str) -> bool {
        self.friends.iter().any(|f| f == user_id)
    }

    /// Returns false if already friends or `user_id` is this user.
    pub fn add_friend(&mut self, user_id: &str) -> bool {
        if user_id == self.id || self.is_friend(user_id) {
            return false;
        }
        self.friends.push(user_id.to_string());
        true
    }

    /// Returns false if they were not friends.
    pub fn remove_friend(&mut self, user_id: &str) -> bool {
        let before = self.friends.len();
        self.friends.retain(|f| f != user_id);
        self.friends.len() != before
    }
}

/// Make two users friends of each other.
pub fn befriend(a: &mut UserProfile, b: &mut UserProfile) -> bool {
    let added_a = a.add_friend(&b.id);
    let added_b = b.add_friend(&a.id);
    added_a || added_b
}

/// End a friendship on both sides.
pub fn unfriend(a: &mut UserProfile, b: &mut UserProfile) -> bool {
    let removed_a = a.remove_friend(&b.id);
    let removed_b = b.remove_friend(&a.id);
    removed_a || removed_b
}

/// Conversation id for two users, the same whichever order they are given in.
pub fn conversation_id(a: &str, b: &str) -> String {
    if a <= b {
        format!("{}_{}", a, b)
    } else {
        format!("{}_{}", b, a)
    }
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender_id: String,
    pub text: String,
    pub sent_at: i64,
}

/// A one-to-one chat. Messages are kept in the order they were sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    id: String,
    participants: [String; 2],
    #[serde(default)]
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(a: &str, b: &str) -> Self {
        let mut participants = [a.to_string(), b.to_string()];
        participants.sort();
        Self {
            id: conversation_id(a, b),
            participants,
            messages: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn participants(&self) -> &[String; 2] {
        &self.participants
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Append a message from one of the two participants. Messages must not
    /// be sent earlier than the last one.
    pub fn send(&mut self, sender_id: &str, text: impl Into<String>, sent_at: i64) -> Result<()> {
        if !self.participants.iter().any(|p| p == sender_id) {
            return Err(SketchError::NotParticipant {
                group_id: self.id.clone(),
                user_id: sender_id.to_string(),
            });
        }
        if let Some(last) = self.last_message() {
            if sent_at < last.sent_at {
                return Err(SketchError::InvalidTimestamps {
                    message: format!(
                        "message at {} is older than the last one at {}",
                        sent_at, last.sent_at
                    ),
                });
            }
        }
        self.messages.push(ChatMessage {
            sender_id: sender_id.to_string(),
            text: text.into(),
            sent_at,
        });
        Ok(())
    }

    /// Messages sent after `since`, in send order, for incremental refresh.
    ///
    /// Scans every message, so stored conversations written before send
    /// order was enforced are still filtered correctly.
    pub fn messages_since(&self, since: i64) -> Vec<&ChatMessage> {
        self.messages.iter().filter(|m| m.sent_at > since).collect()
    }
}
