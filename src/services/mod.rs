pub mod credential_store;
pub mod logger;
pub mod operation;
pub mod settings;
pub mod sim_client;
pub mod tool_executor;
