//! What a handler chain did with a message.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerResponse {
    /// Not for this handler; the next one gets it.
    Continue,
    /// Consumed (answered, stored, or deliberately ignored). Later handlers are skipped.
    Handled,
    /// A `before` gate rejected the message; no handler saw it.
    Filtered,
}

impl HandlerResponse {
    pub fn is_handled(self) -> bool {
        self == HandlerResponse::Handled
    }
}
