//! Terminal shim for program I/O
//!
//! Programs run without a live console. Output is recorded here, and input is
//! served from a fixed queue of lines supplied before the run. The interpreter
//! forwards every write to the capture engine as a side effect as well.

use std::collections::VecDeque;

/// Recorded stdout plus a queue of stdin lines
#[derive(Debug, Clone, Default)]
pub struct Terminal {
    output: String,
    stdin: VecDeque<String>,
}

impl Terminal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Terminal whose `input()` calls return `lines` in order
    pub fn with_stdin(lines: impl IntoIterator<Item = String>) -> Self {
        Terminal {
            output: String::new(),
            stdin: lines.into_iter().collect(),
        }
    }

    /// Print without newline
    pub fn print(&mut self, text: &str) {
        self.output.push_str(text);
    }

    /// Next input line, without its line terminator
    pub fn read_line(&mut self) -> Option<String> {
        self.stdin.pop_front().map(|line| {
            line.strip_suffix('\n')
                .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
                .unwrap_or(line)
        })
    }

    /// Everything printed so far
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn into_output(self) -> String {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_lines() {
        let mut terminal = Terminal::new();
        terminal.print("a");
        terminal.print("b\n");
        terminal.print("c\n");
        assert_eq!(terminal.output(), "ab\nc\n");
    }

    #[test]
    fn test_stdin_queue() {
        let mut terminal = Terminal::with_stdin(vec!["5\n".to_string(), "x".to_string()]);
        assert_eq!(terminal.read_line().as_deref(), Some("5"));
        assert_eq!(terminal.read_line().as_deref(), Some("x"));
        assert_eq!(terminal.read_line(), None);
    }
}
