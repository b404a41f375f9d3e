//! Dashboard module: tab views over the live collections and the live
//! WebSocket feed

pub mod dto;
pub mod handlers;
pub mod live;

pub use dto::*;
pub use handlers::*;
pub use live::*;
