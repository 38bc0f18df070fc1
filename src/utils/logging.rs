//! Logging utilities
//!
//! Provides logging setup and the display-only escaping applied to message
//! payloads before they reach a log line.

use tokio_tungstenite::tungstenite::Message;

/// Setup logging for a binary. `RUST_LOG` overrides the `info` default.
pub fn setup_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

/// Renders CR, LF and TAB as their escape sequences so a message stays on one
/// log line. The relayed payload is never touched.
pub fn escape_for_log(message: &str) -> String {
    let mut escaped = String::with_capacity(message.len());
    for c in message.chars() {
        match c {
            '\r' => escaped.push_str("\\r"),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Log rendering of a relayed message: escaped text, or the size of a
/// binary payload.
pub fn describe_message(message: &Message) -> String {
    match message {
        Message::Binary(data) => format!("<{} bytes binary>", data.len()),
        other => escape_for_log(other.to_text().unwrap_or_default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_line_breaks_and_tabs() {
        assert_eq!(escape_for_log("hi\nthere"), "hi\\nthere");
        assert_eq!(escape_for_log("a\r\nb\tc"), "a\\r\\nb\\tc");
    }

    #[test]
    fn leaves_other_text_alone() {
        assert_eq!(escape_for_log("plain text"), "plain text");
        assert_eq!(escape_for_log("back\\slash"), "back\\slash");
        assert_eq!(escape_for_log(""), "");
    }

    #[test]
    fn describes_binary_by_length() {
        let message = Message::binary(vec![1u8, 2, 3]);
        assert_eq!(describe_message(&message), "<3 bytes binary>");
        assert_eq!(describe_message(&Message::text("a\tb")), "a\\tb");
    }
}
