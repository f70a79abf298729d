/// Messages longer than this are split by carriers and cost more to send.
pub const SINGLE_SEGMENT_CHARS: usize = 70;

const SENDER_MIN_LEN: usize = 3;
const SENDER_MAX_LEN: usize = 11;

/// Outcome of checking a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageCheck {
    pub valid: bool,
    /// Advisory only; never makes a message invalid.
    pub warning: Option<String>,
}

/// Check an alphanumeric sender id.
///
/// 3–11 ASCII letters or digits, not all digits, not starting with a digit.
pub fn validate_sender(from: &str) -> bool {
    let len = from.chars().count();
    if !(SENDER_MIN_LEN..=SENDER_MAX_LEN).contains(&len) {
        return false;
    }
    if !from.chars().all(|c| c.is_ascii_alphanumeric()) {
        return false;
    }
    // Covers the all-digits case as well.
    !from.starts_with(|c: char| c.is_ascii_digit())
}

/// Check a message body; only an empty (or whitespace-only) body is invalid.
pub fn validate_message(message: &str) -> MessageCheck {
    if message.trim().is_empty() {
        return MessageCheck {
            valid: false,
            warning: None,
        };
    }

    let len = message.chars().count();
    let warning = (len > SINGLE_SEGMENT_CHARS).then(|| {
        format!(
            "Message exceeds {SINGLE_SEGMENT_CHARS} characters ({len} characters); sending may cost more."
        )
    });

    MessageCheck {
        valid: true,
        warning,
    }
}
