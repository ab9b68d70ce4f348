//! Line-based prompter for the terminal.
//!
//! The prompt goes to the report stream followed by `": "`, and one line is
//! read back. Piped input works the same way as an interactive terminal.

use std::cell::RefCell;
use std::io::{self, BufRead, Stdout, StdinLock, Write};

use ropify_core::interaction::{InteractionError, InteractionResult, Prompter};

/// Prompter over any line reader and writer.
pub struct LinePrompter<R, W> {
    input: RefCell<R>,
    output: RefCell<W>,
}

/// Prompter bound to the process's stdin and stdout.
pub type TerminalPrompter = LinePrompter<StdinLock<'static>, Stdout>;

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        LinePrompter {
            input: RefCell::new(input),
            output: RefCell::new(output),
        }
    }
}

impl TerminalPrompter {
    pub fn stdio() -> Self {
        LinePrompter::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn ask_text(&self, prompt: &str) -> InteractionResult<String> {
        {
            let mut output = self.output.borrow_mut();
            write!(output, "{}: ", prompt)?;
            output.flush()?;
        }

        let mut line = String::new();
        let read = self.input.borrow_mut().read_line(&mut line)?;
        if read == 0 {
            // Keep the report stream line-oriented when input ends mid-prompt.
            let _ = writeln!(self.output.borrow_mut());
            return Err(InteractionError::Eof);
        }

        let answer = line.trim();
        if answer.is_empty() {
            return Err(InteractionError::Empty);
        }
        Ok(answer.to_string())
    }
}
