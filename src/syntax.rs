//! Static syntax check: a conservative pre-flight that rejects
//! syntactically incomplete Bash before it ever reaches the shell.
//!
//! This is deliberately not a full Bash grammar — it's a single-pass
//! character scanner tracking quote state, heredoc state, paren/backtick
//! depth, and trailing-operator state. Per spec.md §4.8, false positives
//! (valid commands rejected) are acceptable; false negatives (letting an
//! incomplete command through to wedge the shell) are not.

/// Why a command was rejected as syntactically incomplete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncompleteReason {
    UnterminatedSingleQuote,
    UnterminatedDoubleQuote,
    UnterminatedHeredoc { delimiter: String },
    TrailingOperator { operator: &'static str },
    UnterminatedSubstitution,
}

impl std::fmt::Display for IncompleteReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IncompleteReason::UnterminatedSingleQuote => write!(f, "unterminated single quote"),
            IncompleteReason::UnterminatedDoubleQuote => write!(f, "unterminated double quote"),
            IncompleteReason::UnterminatedHeredoc { delimiter } => {
                write!(f, "unterminated heredoc (expecting '{delimiter}')")
            }
            IncompleteReason::TrailingOperator { operator } => {
                write!(f, "trailing '{operator}' with no following statement")
            }
            IncompleteReason::UnterminatedSubstitution => {
                write!(f, "unterminated command or process substitution")
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    None,
    Single,
    Double,
}

/// Check whether `command` is a complete Bash statement. Returns `Ok(())`
/// if the conservative scanner finds nothing incomplete, or
/// `Err(reason)` naming the first incompleteness found.
pub fn check_complete(command: &str) -> Result<(), IncompleteReason> {
    let mut quote = QuoteState::None;
    let mut escaped = false;
    // Depth of `(...)`/`$(...)` and backtick pairs, tracked together since
    // both must close before the statement is complete.
    let mut paren_depth: i32 = 0;
    let mut backtick_open = false;
    let mut heredoc_delims: Vec<(String, bool)> = Vec::new(); // (delim, strip_tabs)
    let mut pending_heredoc: Option<(String, bool)> = None;

    let chars: Vec<char> = command.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];

        if escaped {
            escaped = false;
            i += 1;
            continue;
        }

        match quote {
            QuoteState::Single => {
                if c == '\'' {
                    quote = QuoteState::None;
                }
                i += 1;
                continue;
            }
            QuoteState::Double => {
                if c == '\\' {
                    escaped = true;
                } else if c == '"' {
                    quote = QuoteState::None;
                }
                i += 1;
                continue;
            }
            QuoteState::None => {}
        }

        match c {
            '\\' => escaped = true,
            '\'' => quote = QuoteState::Single,
            '"' => quote = QuoteState::Double,
            '`' => backtick_open = !backtick_open,
            '(' => paren_depth += 1,
            ')' => paren_depth -= 1,
            '<' if chars.get(i + 1) == Some(&'<') => {
                // Heredoc operator: `<<` or `<<-`, optionally quoted delimiter.
                let mut j = i + 2;
                let strip_tabs = chars.get(j) == Some(&'-');
                if strip_tabs {
                    j += 1;
                }
                while chars.get(j) == Some(&' ') {
                    j += 1;
                }
                let mut delim = String::new();
                let quote_char = chars.get(j).copied().filter(|c| *c == '\'' || *c == '"');
                if let Some(q) = quote_char {
                    j += 1;
                    while chars.get(j).is_some_and(|c| *c != q) {
                        delim.push(chars[j]);
                        j += 1;
                    }
                    j += 1;
                } else {
                    while chars
                        .get(j)
                        .is_some_and(|c| !c.is_whitespace() && *c != '\n')
                    {
                        delim.push(chars[j]);
                        j += 1;
                    }
                }
                if !delim.is_empty() {
                    pending_heredoc = Some((delim, strip_tabs));
                }
                i = j;
                continue;
            }
            '\n' => {
                if let Some(delim) = pending_heredoc.take() {
                    heredoc_delims.push(delim);
                }
                // Check whether this newline closes the most recent heredoc body.
                if let Some((delim, strip_tabs)) = heredoc_delims.last() {
                    let rest_of_line_start = i + 1;
                    let mut k = rest_of_line_start;
                    if *strip_tabs {
                        while chars.get(k) == Some(&'\t') {
                            k += 1;
                        }
                    }
                    let line_rest: String = chars[k..]
                        .iter()
                        .take_while(|c| **c != '\n')
                        .collect();
                    if line_rest == *delim {
                        heredoc_delims.pop();
                    }
                }
            }
            _ => {}
        }

        i += 1;
    }

    if quote == QuoteState::Single {
        return Err(IncompleteReason::UnterminatedSingleQuote);
    }
    if quote == QuoteState::Double {
        return Err(IncompleteReason::UnterminatedDoubleQuote);
    }
    if let Some((delim, _)) = pending_heredoc {
        return Err(IncompleteReason::UnterminatedHeredoc { delimiter: delim });
    }
    if let Some((delim, _)) = heredoc_delims.into_iter().next() {
        return Err(IncompleteReason::UnterminatedHeredoc { delimiter: delim });
    }
    if paren_depth > 0 || backtick_open {
        return Err(IncompleteReason::UnterminatedSubstitution);
    }

    check_trailing_operator(command)
}

/// Reject a command ending in a pipe, `&&`, `||`, or a trailing backslash
/// continuation with no following statement.
fn check_trailing_operator(command: &str) -> Result<(), IncompleteReason> {
    let trimmed = command.trim_end_matches(['\n', ' ', '\t']);
    if trimmed.is_empty() {
        return Ok(());
    }
    if trimmed.ends_with("&&") {
        return Err(IncompleteReason::TrailingOperator { operator: "&&" });
    }
    if trimmed.ends_with("||") {
        return Err(IncompleteReason::TrailingOperator { operator: "||" });
    }
    if trimmed.ends_with('|') && !trimmed.ends_with("||") {
        return Err(IncompleteReason::TrailingOperator { operator: "|" });
    }
    if trimmed.ends_with('\\') && !trimmed.ends_with("\\\\") {
        return Err(IncompleteReason::TrailingOperator { operator: "\\" });
    }
    Ok(())
}
