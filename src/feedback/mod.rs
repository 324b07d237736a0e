//! Relevance judging of search results.

use std::io::{self, BufRead, Write};

use crate::google::SearchItem;
use crate::refine::format::format_result;

/// Decides whether a result is relevant to what the user is looking for.
pub trait Judge {
    /// `index` is the 1-based position of the item in the current round.
    fn judge(&mut self, index: usize, item: &SearchItem) -> io::Result<bool>;
}

/// Prompts on a writer and reads a Y/N answer per result.
pub struct ConsoleJudge<R, W> {
    input: R,
    output: W,
}

impl ConsoleJudge<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsoleJudge<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Judge for ConsoleJudge<R, W> {
    fn judge(&mut self, index: usize, item: &SearchItem) -> io::Result<bool> {
        write!(self.output, "{}Relevant (Y/N)? ", format_result(index, item))?;
        self.output.flush()?;

        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            writeln!(self.output)?;
            return Ok(false);
        }
        Ok(is_yes(&answer))
    }
}

fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}
