//! Tool execution boundary: result shapes, sessions, and the connection manager

pub mod result;
pub mod session;

pub use result::{ContentBlock, ResourceBlock, ToolResult};
pub use session::{ConnectionManager, SessionInventory, ToolBackend, ToolDescriptor, ToolSession};
