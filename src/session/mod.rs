//! Per-session state for documents being composed.

pub mod buffer;
pub mod context;
pub mod store;

pub use buffer::LineItemBuffer;
pub use context::{Flash, FlashLevel, SessionContext};
pub use store::{SessionId, SessionStore};
