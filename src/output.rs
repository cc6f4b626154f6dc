//! Output sanitization: ANSI-escape stripping and terminal-chrome removal.
//!
//! The session state machine uses these pure functions to turn raw PTY
//! bytes into the sanitized output an [`Observation`](crate::session::Observation)
//! carries back to the caller. Sanitization is deterministic and documented
//! here because the test suite pins its exact behavior (spec.md §4.2 step 5).

use regex::Regex;
use std::sync::LazyLock;

/// Matches ANSI escape sequences: CSI sequences (colors, cursor motion),
/// OSC sequences (terminal title), simple two-byte escapes, and the
/// backspace-overstrike idiom some programs use for bold text.
static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\x1b\[[0-9;?<=>!]*[a-zA-Z~]|\x1b\][^\x07]*\x07|\x1b[()][0-9A-B]|\x1b[a-zA-Z]|.\x08",
    )
    .expect("invalid ANSI regex")
});

/// Matches a lone bell character, left over after OSC stripping in odd cases.
static BELL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x07").expect("invalid bell regex"));

/// Strip ANSI escape codes and stray control sequences from a string,
/// leaving only the visible text content.
#[must_use]
pub fn strip_ansi(s: &str) -> String {
    let stripped = ANSI_ESCAPE.replace_all(s, "");
    BELL.replace_all(&stripped, "").to_string()
}

/// Normalize CRLF and lone-CR line endings to `\n`.
#[must_use]
pub fn normalize_newlines(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}

/// Strip the first occurrence of `command` from the head of `raw`, if
/// present — some PTY/shell configurations echo input even with `stty
/// -echo`. Per spec.md §9, this is a verbatim-match-or-leave-unchanged
/// strip, never fuzzy matching.
#[must_use]
pub fn strip_echoed_command<'a>(raw: &'a str, command: &str) -> &'a str {
    let trimmed_command = command.trim_end_matches('\n');
    if let Some(rest) = raw.strip_prefix(trimmed_command) {
        rest.trim_start_matches('\n').trim_start_matches('\r')
    } else {
        raw
    }
}

/// Strip every occurrence of the PS1/PS2 prompt strings from command
/// output. Multi-line commands (heredocs, open compound statements) make
/// bash print PS2 once per continuation line it reads, and occasionally a
/// fresh PS1 surfaces between two statements sent in the same write; both
/// can land anywhere in the raw stream, so this removes the literal
/// substrings wherever they occur rather than anchoring to line starts.
#[must_use]
pub fn strip_prompts(raw: &str, ps1: &str, ps2: &str) -> String {
    let mut s = raw.to_string();
    if !ps2.is_empty() {
        s = s.replace(ps2, "");
    }
    if !ps1.is_empty() {
        s = s.replace(ps1, "");
    }
    s
}

/// Full sanitization pipeline applied to raw output captured between the
/// command wrapper and the sentinel, per spec.md §4.2 step 5.
#[must_use]
pub fn sanitize(raw: &str, command: &str, ps1: &str, ps2: &str) -> String {
    let normalized = normalize_newlines(raw);
    let without_echo = strip_echoed_command(&normalized, command);
    let without_prompts = strip_prompts(without_echo, ps1, ps2);
    strip_ansi(&without_prompts)
}
