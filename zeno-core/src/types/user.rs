//! User identity and message sender types.

use serde::{Deserialize, Serialize};

/// Maximum length (in chars) of a first+last display name.
const MAX_NAME_CHARS: usize = 32;

/// User identity (id, username, names).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_bot: bool,
}

/// Unresolved sender reference, as carried by messages whose author was not resolved by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerRef {
    User(i64),
    Channel(i64),
    Chat(i64),
}

/// Author of a message: a resolved user or a raw peer reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User(User),
    Peer(PeerRef),
}

impl Sender {
    /// Numeric id of the author (user id, channel id or chat id).
    pub fn id(&self) -> i64 {
        match self {
            Sender::User(u) => u.id,
            Sender::Peer(PeerRef::User(id) | PeerRef::Channel(id) | PeerRef::Chat(id)) => *id,
        }
    }

    /// Display name without any lookup. Raw user peers fall back to `User_<id>`; callers that can resolve users
    /// should do so first.
    pub fn display_name(&self) -> String {
        match self {
            Sender::User(u) => display_name(u),
            Sender::Peer(PeerRef::User(id)) => format!("User_{}", id),
            Sender::Peer(PeerRef::Channel(id)) => format!("Channel_{}", id),
            Sender::Peer(PeerRef::Chat(id)) => format!("Chat_{}", id),
        }
    }
}

/// `@username` if set, else first + last name (truncated), else `User_<id>`.
pub fn display_name(user: &User) -> String {
    if let Some(username) = user.username.as_deref().filter(|u| !u.is_empty()) {
        return format!("@{}", username);
    }
    let mut name = user.first_name.clone().unwrap_or_default();
    if let Some(last) = user.last_name.as_deref().filter(|l| !l.is_empty()) {
        if !name.is_empty() {
            name.push(' ');
        }
        name.push_str(last);
    }
    let name = name.trim();
    if name.is_empty() {
        return format!("User_{}", user.id);
    }
    name.chars().take(MAX_NAME_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(username: Option<&str>, first: Option<&str>, last: Option<&str>) -> User {
        User {
            id: 42,
            username: username.map(String::from),
            first_name: first.map(String::from),
            last_name: last.map(String::from),
            is_bot: false,
        }
    }

    #[test]
    fn test_display_name_prefers_username() {
        assert_eq!(display_name(&user(Some("alice"), Some("Alice"), None)), "@alice");
    }

    #[test]
    fn test_display_name_first_and_last() {
        assert_eq!(display_name(&user(None, Some("Alice"), Some("Smith"))), "Alice Smith");
        assert_eq!(display_name(&user(None, None, Some("Smith"))), "Smith");
    }

    #[test]
    fn test_display_name_truncates_long_names() {
        let long = "x".repeat(80);
        assert_eq!(display_name(&user(None, Some(&long), None)).chars().count(), 32);
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        assert_eq!(display_name(&user(None, None, None)), "User_42");
        assert_eq!(Sender::Peer(PeerRef::Channel(7)).display_name(), "Channel_7");
    }
}
