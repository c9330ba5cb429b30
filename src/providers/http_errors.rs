use std::error::Error as StdError;
use std::io::ErrorKind;

use super::LlmError;

/// True when any error in the `source()` chain matches the I/O error kind or
/// mentions `needle` in its message.
fn error_chain_any(err: &(dyn StdError + 'static), kind: ErrorKind, needle: &str) -> bool {
    std::iter::successors(Some(err), |&current| current.source()).any(|current| {
        current
            .downcast_ref::<std::io::Error>()
            .is_some_and(|io_err| io_err.kind() == kind)
            || current.to_string().to_ascii_lowercase().contains(needle)
    })
}

fn is_timeout(err: &(dyn StdError + 'static)) -> bool {
    error_chain_any(err, ErrorKind::TimedOut, "timed out")
}

fn is_connection_refused(err: &(dyn StdError + 'static)) -> bool {
    error_chain_any(err, ErrorKind::ConnectionRefused, "connection refused")
}

pub(crate) fn request_error(err: reqwest::Error, api_url: &str, timeout_secs: u64) -> LlmError {
    if err.is_timeout() || is_timeout(&err) {
        return LlmError::Network(format!(
            "Request to '{}' timed out after {}s. Check the API responsiveness and your network.",
            api_url, timeout_secs
        ));
    }

    if err.is_connect() {
        if is_connection_refused(&err) {
            return LlmError::Network(format!(
                "Connection refused by API at '{}'. \
                 Check the configured base_url with 'trans -a <base_url>,<api_key>'.",
                api_url
            ));
        }

        return LlmError::Network(format!(
            "Failed to connect to API at '{}'. Check base_url and network connectivity.",
            api_url
        ));
    }

    LlmError::Network(format!("Failed to call API at '{}': {}", api_url, err))
}
