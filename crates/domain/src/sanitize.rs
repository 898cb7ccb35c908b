use std::sync::LazyLock;

use regex::Regex;

static ANSI_ESCAPES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\u{1b}\\[[^m]*m").expect("ansi pattern"));

/// Strip ANSI escape sequences before transmission.
///
/// Hosts colorize error output for their own console; the remote service
/// stores messages verbatim.
pub fn strip_ansi(input: &str) -> String {
    ANSI_ESCAPES.replace_all(input, "").into_owned()
}

/// Build the error message submitted with a failed result: the test title,
/// then the sanitized host message.
pub fn error_message_for(title: &str, message: &str) -> String {
    format!("{title}: {}", strip_ansi(message))
}
