//! Unit tests for the output sanitization module.

use swerex_runtime::output::{normalize_newlines, sanitize, strip_ansi, strip_echoed_command, strip_prompts};

const PS1: &str = "SWE-REX-PS1>";
const PS2: &str = "SWE-REX-PS2>";

// ---------------------------------------------------------------------------
// strip_ansi() tests
// ---------------------------------------------------------------------------

#[test]
fn test_strips_simple_ansi_colors() {
    assert_eq!(strip_ansi("\x1b[31mred\x1b[0m"), "red");
}

#[test]
fn test_strips_osc_title_sequence() {
    assert_eq!(strip_ansi("\x1b]0;title\x07rest"), "rest");
}

// ---------------------------------------------------------------------------
// normalize_newlines() tests
// ---------------------------------------------------------------------------

#[test]
fn test_normalizes_crlf() {
    assert_eq!(normalize_newlines("a\r\nb\rc"), "a\nb\nc");
}

// ---------------------------------------------------------------------------
// strip_echoed_command() tests
// ---------------------------------------------------------------------------

#[test]
fn test_strips_echoed_command_when_present() {
    assert_eq!(strip_echoed_command("echo hi\nhi\n", "echo hi"), "hi\n");
}

#[test]
fn test_leaves_output_unchanged_when_command_not_echoed() {
    assert_eq!(strip_echoed_command("hi\n", "echo hi"), "hi\n");
}

// ---------------------------------------------------------------------------
// strip_prompts() tests
// ---------------------------------------------------------------------------

#[test]
fn test_strips_ps2_prompts_anywhere() {
    let raw = "SWE-REX-PS2>SWE-REX-PS2>line1\nline2\n";
    assert_eq!(strip_prompts(raw, PS1, PS2), "line1\nline2\n");
}

#[test]
fn test_strips_stray_ps1_between_statements() {
    let raw = "line1\nSWE-REX-PS1>SOUT:abc\n";
    assert_eq!(strip_prompts(raw, PS1, PS2), "line1\nSOUT:abc\n");
}

// ---------------------------------------------------------------------------
// sanitize() pipeline tests
// ---------------------------------------------------------------------------

#[test]
fn test_full_sanitize_pipeline() {
    let raw = "echo hi\r\nhi\r\n";
    assert_eq!(sanitize(raw, "echo hi", PS1, PS2), "hi\n");
}
