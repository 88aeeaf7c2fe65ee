//! CLI Exit Code Registry
//!
//! This is the single source of truth for all `billsync` exit codes.
//! Exit codes are part of the shell contract: schedulers and scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args)               |
//! | 3-9     | local            | Config, source files, report, compare    |
//! | 50-59   | gateway          | Ledger connection and push-back          |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use billsync_gateway::GatewayError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
#[allow(dead_code)]
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments. Also what clap exits with.
#[allow(dead_code)]
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Local (3-9)
// =============================================================================

/// Config file unreadable, unparseable, or failing validation.
pub const EXIT_CONFIG_INVALID: u8 = 3;

/// Source file unreadable, empty, or missing required columns.
pub const EXIT_SOURCE_INVALID: u8 = 4;

/// Report could not be written.
pub const EXIT_REPORT_WRITE: u8 = 5;

/// Duplicate keys found and `compare.on_duplicate = "reject"`.
pub const EXIT_DUPLICATE_KEYS: u8 = 6;

// =============================================================================
// Gateway (50-59)
// =============================================================================

/// Request processor refused credentials (401/403).
pub const EXIT_GATEWAY_AUTH: u8 = 50;

/// Ledger unreachable, 4xx/5xx after retries.
pub const EXIT_GATEWAY_UPSTREAM: u8 = 51;

/// Response was not usable qbXML, or carried an error status.
pub const EXIT_GATEWAY_PROTOCOL: u8 = 52;

/// Push-back did not fully succeed. The report was still written.
pub const EXIT_PUSH_FAILED: u8 = 53;

/// Map a gateway error to its exit code.
pub fn gateway_exit_code(err: &GatewayError) -> u8 {
    match err {
        GatewayError::Auth { .. } => EXIT_GATEWAY_AUTH,
        GatewayError::Rejected { .. } | GatewayError::Upstream(_) => EXIT_GATEWAY_UPSTREAM,
        GatewayError::Protocol(_) | GatewayError::Status { .. } => EXIT_GATEWAY_PROTOCOL,
        GatewayError::Config(_) => EXIT_CONFIG_INVALID,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_unique() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_CONFIG_INVALID,
            EXIT_SOURCE_INVALID,
            EXIT_REPORT_WRITE,
            EXIT_DUPLICATE_KEYS,
            EXIT_GATEWAY_AUTH,
            EXIT_GATEWAY_UPSTREAM,
            EXIT_GATEWAY_PROTOCOL,
            EXIT_PUSH_FAILED,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn gateway_errors_map_to_gateway_range() {
        let auth = GatewayError::Auth {
            status: 401,
            message: String::new(),
        };
        assert_eq!(gateway_exit_code(&auth), EXIT_GATEWAY_AUTH);
        assert_eq!(gateway_exit_code(&GatewayError::Upstream("x".into())), EXIT_GATEWAY_UPSTREAM);
        let status = GatewayError::Status {
            request_id: "0".into(),
            code: 3200,
            message: String::new(),
        };
        assert_eq!(gateway_exit_code(&status), EXIT_GATEWAY_PROTOCOL);
    }
}
