use crate::config::combiner_config::ExistingResultAction;
use crate::error::{IoResultExt, Result};
use std::io::{self, BufRead, StdinLock, Stdout, Write};
use std::path::Path;

/// Answers the questions a run asks before touching state on disk.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> Result<bool>;

    /// `None` aborts the run.
    fn existing_result(
        &mut self,
        path: &Path,
        size: &str,
    ) -> Result<Option<ExistingResultAction>>;
}

/// Asks on a terminal. Only an exact `y`, `d` or `a` counts as an answer.
pub struct TerminalConfirm<R, W> {
    input: R,
    output: W,
}

impl TerminalConfirm<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        TerminalConfirm::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        TerminalConfirm { input, output }
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        let terminal = Path::new("<terminal>");
        write!(self.output, "{prompt}").at("write prompt", terminal)?;
        self.output.flush().at("write prompt", terminal)?;

        let mut answer = String::new();
        self.input
            .read_line(&mut answer)
            .at("read answer", terminal)?;
        Ok(answer.trim().to_string())
    }
}

impl<R: BufRead, W: Write> Confirm for TerminalConfirm<R, W> {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        Ok(self.ask(&format!("{question} [y/n]: "))? == "y")
    }

    fn existing_result(
        &mut self,
        path: &Path,
        size: &str,
    ) -> Result<Option<ExistingResultAction>> {
        let answer = self.ask(&format!(
            "Result file {path:?} already exists ({size}). \
             Delete [d] it or append [a] results to it? [d/a]: "
        ))?;
        Ok(match answer.as_str() {
            "d" => Some(ExistingResultAction::Delete),
            "a" => Some(ExistingResultAction::Append),
            _ => None,
        })
    }
}
