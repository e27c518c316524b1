// Error codes implementation
// Standardized error codes returned alongside tracker errors

pub mod validation {
    pub const INVALID_RECORD: &str = "VALIDATION_1001";
    pub const MISSING_REQUIRED_FIELD: &str = "VALIDATION_1002";
    pub const INVALID_FORMAT: &str = "VALIDATION_1003";
}

pub mod authentication {
    pub const INVALID_CREDENTIALS: &str = "AUTH_2001";
    pub const ACCOUNT_LOCKED: &str = "AUTH_2002";
}

pub mod authorization {
    pub const ACCESS_DENIED: &str = "AUTHZ_3001";
    pub const SENTINEL_PROTECTED: &str = "AUTHZ_3002";
}

pub mod repository {
    pub const STORAGE_FAILED: &str = "REPO_4001";
    pub const NOT_FOUND: &str = "REPO_4002";
}

pub mod configuration {
    pub const INVALID_CONFIG: &str = "CONFIG_5001";
}

pub mod system {
    pub const INTERNAL: &str = "SYS_9001";
}
