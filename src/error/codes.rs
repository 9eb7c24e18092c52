/// Error code registry for noxide
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration errors (fatal, abort the whole run)
/// - 2000-2999: Session errors
/// - 3000-3999: Environment errors
/// - 4000-4999: Execution errors
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_GENERIC: u16 = 1000;
    pub const CONFIG_DUPLICATE_SESSION: u16 = 1001;
    pub const CONFIG_UNKNOWN_SESSION: u16 = 1002;
    pub const CONFIG_INVALID_FILE: u16 = 1003;

    // Session errors (2000-2999)
    pub const SESSION_GENERIC: u16 = 2000;
    pub const SESSION_INVALID_ARGUMENTS: u16 = 2001;
    pub const SESSION_ABORTED: u16 = 2002;
    pub const SESSION_CANCELLED: u16 = 2003;

    // Environment errors (3000-3999)
    pub const ENV_GENERIC: u16 = 3000;
    pub const ENV_MISSING_INTERPRETER: u16 = 3001;
    pub const ENV_CREATE_FAILED: u16 = 3002;
    pub const ENV_NOT_ISOLATED: u16 = 3003;

    // Execution errors (4000-4999)
    pub const EXEC_GENERIC: u16 = 4000;
    pub const EXEC_SPAWN_FAILED: u16 = 4001;
    pub const EXEC_INSTALL_FAILED: u16 = 4002;
    pub const EXEC_COMMAND_FAILED: u16 = 4003;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        1000 => "Generic configuration error",
        1001 => "Session name registered twice",
        1002 => "Requested session does not exist",
        1003 => "Session file could not be parsed",

        2000 => "Generic session error",
        2001 => "Invalid or conflicting session arguments",
        2002 => "Session aborted itself",
        2003 => "Session cancelled by interrupt",

        3000 => "Generic environment error",
        3001 => "Requested interpreter is not installed",
        3002 => "Failed to create isolated environment",
        3003 => "Operation requires an isolated environment",

        4000 => "Generic execution error",
        4001 => "Failed to start external program",
        4002 => "Dependency installation failed",
        4003 => "External command exited with failure",

        _ => "Unknown error code",
    }
}
