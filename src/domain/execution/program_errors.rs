//! Human-readable messages for on-chain program error codes

pub const DEFAULT_FAILURE_MESSAGE: &str = "SWAP_FAILED";

const CUSTOM_ERROR_MARKER: &str = "custom program error: ";

const PROGRAM_ERRORS: &[(&str, &str)] = &[
    ("0xbc4", "Network occupied, try again later."),
    ("3012", "Network occupied, try again later."),
    ("6005", "Token migrated to Raydium."),
    ("0x1765", "Token migrated to Raydium."),
    ("0x1", "Another error occurred"),
    ("6", "IncorrectProgramId"),
];

fn lookup(code: &str) -> Option<&'static str> {
    PROGRAM_ERRORS
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, message)| *message)
}

/// Match `code` against the table, trying both its hex and decimal spelling.
pub fn describe_program_error(code: &str) -> String {
    let normalized = code.trim().to_lowercase();
    if let Some(message) = lookup(&normalized) {
        return message.to_string();
    }

    let alternate = match normalized.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok().map(|n| n.to_string()),
        None => normalized.parse::<u64>().ok().map(|n| format!("0x{:x}", n)),
    };

    alternate
        .as_deref()
        .and_then(lookup)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Unknown error code: {}", code))
}

/// Error code from the first log line carrying a custom program error.
pub fn custom_error_code(logs: &[String]) -> Option<&str> {
    logs.iter()
        .find_map(|line| line.split_once(CUSTOM_ERROR_MARKER))
        .map(|(_, code)| code.trim())
        .filter(|code| !code.is_empty())
}

pub fn describe_simulation_failure(logs: &[String]) -> String {
    custom_error_code(logs)
        .map(describe_program_error)
        .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_and_normalized_lookup() {
        assert_eq!(describe_program_error("0xBC4"), "Network occupied, try again later.");
        assert_eq!(describe_program_error("3012"), "Network occupied, try again later.");
        assert_eq!(describe_program_error("0x1775"), "Token migrated to Raydium.");
        assert_eq!(describe_program_error("1"), "Another error occurred");
        assert_eq!(describe_program_error("0x6"), "IncorrectProgramId");
    }

    #[test]
    fn test_unknown_codes() {
        assert_eq!(describe_program_error("0x2a"), "Unknown error code: 0x2a");
        assert_eq!(describe_program_error("garbage"), "Unknown error code: garbage");
    }

    #[test]
    fn test_simulation_logs() {
        let logs = vec![
            "Program 6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P invoke [1]".to_string(),
            "Program 6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P failed: custom program error: 0x1775"
                .to_string(),
        ];
        assert_eq!(custom_error_code(&logs), Some("0x1775"));
        assert_eq!(describe_simulation_failure(&logs), "Token migrated to Raydium.");
        assert_eq!(describe_simulation_failure(&[]), DEFAULT_FAILURE_MESSAGE);
    }
}
