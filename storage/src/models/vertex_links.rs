//! Grounding links captured from a provider answer, delivered later on request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One web citation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingLink {
    pub title: String,
    pub uri: String,
}

impl GroundingLink {
    pub fn new(title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            uri: uri.into(),
        }
    }
}

/// A stored link set. `sent` goes false → true once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexLinks {
    pub id: String,
    pub links: Vec<GroundingLink>,
    pub sent: bool,
    pub created_at: DateTime<Utc>,
}

/// Outcome of [`crate::LinkStore::mark_sent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkSent {
    /// This call flipped the flag; the caller should deliver the links.
    Marked,
    /// Already delivered earlier.
    AlreadySent,
    NotFound,
}

/// Row shape of `vertex_links`; `links` is stored as JSON.
#[derive(sqlx::FromRow)]
pub(crate) struct VertexLinksRow {
    pub id: String,
    pub links: String,
    pub sent: bool,
    pub created_at: DateTime<Utc>,
}

impl VertexLinksRow {
    pub(crate) fn into_model(self) -> Result<VertexLinks, serde_json::Error> {
        Ok(VertexLinks {
            id: self.id,
            links: serde_json::from_str(&self.links)?,
            sent: self.sent,
            created_at: self.created_at,
        })
    }
}
