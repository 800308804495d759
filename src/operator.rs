//! Operator interaction: the confirmation gate and the press-Enter pause

use regex::Regex;
use std::io::{self, BufRead, Write};
use std::sync::OnceLock;

/// Prompts that block on the person running the cleanup
pub trait Operator {
    /// Asks a yes/no question; true only for an affirmative answer
    fn confirm(&mut self, question: &str) -> io::Result<bool>;

    /// Blocks until the operator signals they are done
    fn wait_for_enter(&mut self, message: &str) -> io::Result<()>;
}

fn affirmative() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^\s*y(es)?\s*$").expect("static pattern compiles"))
}

/// Returns true when the answer is "y" or "yes" in any case
pub fn is_affirmative(answer: &str) -> bool {
    affirmative().is_match(answer)
}

/// Operator reading answers from a line source and printing prompts to a writer
pub struct ConsoleOperator<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsoleOperator<R, W> {
    pub fn new(input: R, output: W) -> Self {
        ConsoleOperator { input, output }
    }

    fn read_answer(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let read = self.input.read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

impl ConsoleOperator<io::StdinLock<'static>, io::Stdout> {
    /// Operator bound to the process console
    pub fn stdio() -> Self {
        ConsoleOperator::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Operator for ConsoleOperator<R, W> {
    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        write!(self.output, "{} (Y/N): ", question)?;
        self.output.flush()?;

        // End of input declines
        Ok(self.read_answer()?.map(|a| is_affirmative(&a)).unwrap_or(false))
    }

    fn wait_for_enter(&mut self, message: &str) -> io::Result<()> {
        write!(self.output, "{} ", message)?;
        self.output.flush()?;
        self.read_answer()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_affirmative_answers() {
        for answer in ["y", "Y", "yes", "YES", "Yes\n", "  y \r\n"] {
            assert!(is_affirmative(answer), "{:?} should be affirmative", answer);
        }
    }

    #[test]
    fn test_non_affirmative_answers() {
        for answer in ["", "n", "no", "yeah", "ye", "y y", "sure", "1"] {
            assert!(!is_affirmative(answer), "{:?} should decline", answer);
        }
    }

    #[test]
    fn test_confirm_reads_one_line() {
        let mut out = Vec::new();
        let mut operator = ConsoleOperator::new(Cursor::new("yes\nno\n"), &mut out);

        assert!(operator.confirm("Continue?").unwrap());
        assert!(!operator.confirm("Again?").unwrap());
        drop(operator);

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Continue? (Y/N): "));
        assert!(printed.contains("Again? (Y/N): "));
    }

    #[test]
    fn test_end_of_input_declines() {
        let mut operator = ConsoleOperator::new(Cursor::new(""), Vec::new());
        assert!(!operator.confirm("Continue?").unwrap());
    }

    #[test]
    fn test_wait_for_enter_consumes_line() {
        let mut operator = ConsoleOperator::new(Cursor::new("\ny\n"), Vec::new());
        operator.wait_for_enter("Press Enter").unwrap();
        assert!(operator.confirm("Next?").unwrap());
    }
}
