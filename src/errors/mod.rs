mod mcp_error;
mod settings_error;
mod tool_error;

pub use mcp_error::{ErrorCode, McpError};
pub use settings_error::SettingsError;
pub use tool_error::{ToolError, ToolErrorKind};
