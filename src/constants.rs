pub mod network {
    pub const DEFAULT_BASE_URL: &str = "https://dt-fflc-vanlinks.hdt.cosmoplat.com";
    pub const TIMEOUT_API_REQUEST_MS: u64 = 30_000;
    pub const TIMEOUT_LOGIN_MS: u64 = 10_000;
    pub const TIMEOUT_CONNECTION_MS: u64 = 10_000;
    pub const USER_AGENT: &str = concat!("sim-mcp/", env!("CARGO_PKG_VERSION"));
}

pub mod login {
    pub const PATH: &str = "/api/login";
    pub const DEFAULT_MACHINE_CODE: &str = "mcp-server-001";
    pub const DEFAULT_CLIENT_CATEGORY: &str = "WEB";
}

pub mod envelope {
    /// Business codes the platform uses for an accepted request.
    pub const SUCCESS_CODES: &[i64] = &[0, 1, 200];
    /// Business codes treated as a rejected or expired session.
    pub const DEFAULT_AUTH_FAILURE_CODES: &[i64] = &[401, 403];
}

pub mod limits {
    pub const ERROR_BODY_PREVIEW_BYTES: usize = 500;
    pub const LOG_STRING_MAX: usize = 2048;
}

pub mod mcp {
    pub const PROTOCOL_VERSION: &str = "2025-06-18";
    pub const SERVER_NAME: &str = "sim-mcp";
    pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
}
