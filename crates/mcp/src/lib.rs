// Tool registry, dispatcher, envelope normalization, and HTTP hosting for
// the Teller gateway.

pub mod config;
pub mod dispatch;
pub mod normalize;
pub mod protocol;
pub mod server;
pub mod tools;

pub use dispatch::Dispatcher;
pub use normalize::ToolCall;
pub use protocol::{CallToolResult, CallerContext, ToolContent, ToolSchema};
pub use tools::ToolKind;
