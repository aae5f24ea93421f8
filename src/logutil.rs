//! Log-safe rendering of player-supplied text (names, descriptions, topics).
//!
//! [`Escaped`] formats lazily, so a `debug!` that is filtered out never pays
//! for the escaping.

use std::fmt;

/// Longest preview written to a log line.
pub const MAX_LOG_PREVIEW: usize = 120;

/// Display adapter that keeps the wrapped text on one line and caps its length.
#[derive(Debug, Clone, Copy)]
pub struct Escaped<'a>(pub &'a str);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, ch) in self.0.chars().enumerate() {
            if i == MAX_LOG_PREVIEW {
                return f.write_str("…");
            }
            match ch {
                '\\' => f.write_str("\\\\")?,
                '\n' => f.write_str("\\n")?,
                '\r' => f.write_str("\\r")?,
                '\t' => f.write_str("\\t")?,
                c if c.is_control() => write!(f, "\\x{:02X}", c as u32)?,
                c => fmt::Write::write_char(f, c)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escape_log(s: &str) -> String {
        Escaped(s).to_string()
    }

    #[test]
    fn description_stays_on_one_line() {
        assert_eq!(
            escape_log("A tall man.\r\n\tHe waves."),
            "A tall man.\\r\\n\\tHe waves."
        );
    }

    #[test]
    fn escapes_terminal_controls() {
        assert_eq!(format!("{}", Escaped("Ash\u{1b}[31m")), "Ash\\x1B[31m");
    }

    #[test]
    fn long_text_is_truncated() {
        let long = "x".repeat(MAX_LOG_PREVIEW + 50);
        let out = escape_log(&long);
        assert_eq!(out.chars().count(), MAX_LOG_PREVIEW + 1);
        assert!(out.ends_with('…'));
    }

    #[test]
    fn text_at_the_limit_is_untouched() {
        let exact = "y".repeat(MAX_LOG_PREVIEW);
        assert_eq!(escape_log(&exact), exact);
    }
}
