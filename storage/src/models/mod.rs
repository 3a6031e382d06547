//! Persistence models.

mod credential;
mod journal_entry;
mod vertex_links;

pub use credential::UserCredential;
pub use journal_entry::JournalEntry;
pub use vertex_links::{GroundingLink, MarkSent, VertexLinks};
pub(crate) use vertex_links::VertexLinksRow;
