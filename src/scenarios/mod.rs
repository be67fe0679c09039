//! Interactive walkthroughs that chain several actions together.
//!
//! Scenarios talk to the user only through [`Prompt`], so the same script
//! runs against stdin in the CLI and against scripted answers in tests.

pub mod cognito_mfa;
pub mod support_case;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin, Stdout};

use crate::errors::ActionError;

/// Longest answer accepted from the console; anything beyond is cut off.
pub const MAX_ANSWER_LEN: usize = 256;

#[async_trait]
pub trait Prompt: Send {
    /// Shows `question` and returns the user's answer, cleaned with [`clean_answer`].
    async fn ask(&mut self, question: &str) -> Result<String, ActionError>;

    /// Shows `question` and returns the answer with only the line ending removed.
    ///
    /// For passwords, where surrounding spaces are significant. The answer is
    /// never written back out, though the terminal still echoes what is typed.
    async fn ask_secret(&mut self, question: &str) -> Result<String, ActionError>;

    /// Shows an informational line.
    async fn say(&mut self, message: &str) -> Result<(), ActionError>;
}

/// Strips control characters, trims whitespace and caps the length.
#[must_use]
pub fn clean_answer(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .chars()
        .take(MAX_ANSWER_LEN)
        .collect()
}

/// Drops a trailing `\r` left by CRLF input.
fn strip_line_ending(raw: &str) -> &str {
    raw.strip_suffix('\r').unwrap_or(raw)
}

/// Lists `options` numbered from 1 and asks until a valid number is given.
///
/// # Errors
///
/// Returns `InvalidInput` when there is nothing to choose from, or the
/// prompt's error when input ends.
pub async fn choose(
    prompt: &mut dyn Prompt,
    question: &str,
    options: &[String],
) -> Result<usize, ActionError> {
    if options.is_empty() {
        return Err(ActionError::InvalidInput(format!(
            "no options available for: {question}"
        )));
    }
    for (i, option) in options.iter().enumerate() {
        prompt.say(&format!("  {}. {option}", i + 1)).await?;
    }
    loop {
        let answer = prompt
            .ask(&format!("{question} (1-{})", options.len()))
            .await?;
        match answer.parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => return Ok(n - 1),
            _ => {
                prompt
                    .say(&format!("'{answer}' is not a number between 1 and {}", options.len()))
                    .await?;
            }
        }
    }
}

/// Asks a yes/no question. Anything starting with `y` counts as yes.
///
/// # Errors
///
/// Returns the prompt's error when input ends.
pub async fn confirm(prompt: &mut dyn Prompt, question: &str) -> Result<bool, ActionError> {
    let answer = prompt.ask(&format!("{question} (y/n)")).await?;
    Ok(answer.to_ascii_lowercase().starts_with('y'))
}

/// Console prompt reading answers line by line from stdin.
pub struct StdinPrompt {
    lines: Lines<BufReader<Stdin>>,
    out: Stdout,
}

impl StdinPrompt {
    async fn read_line(&mut self, question: &str) -> Result<String, ActionError> {
        self.out.write_all(format!("{question}: ").as_bytes()).await?;
        self.out.flush().await?;
        self.lines
            .next_line()
            .await?
            .ok_or_else(|| ActionError::Io("input closed before an answer was given".into()))
    }

    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            out: tokio::io::stdout(),
        }
    }
}

impl Default for StdinPrompt {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prompt for StdinPrompt {
    async fn ask(&mut self, question: &str) -> Result<String, ActionError> {
        let line = self.read_line(question).await?;
        Ok(clean_answer(&line))
    }

    async fn ask_secret(&mut self, question: &str) -> Result<String, ActionError> {
        let line = self.read_line(question).await?;
        Ok(strip_line_ending(&line).to_string())
    }

    async fn say(&mut self, message: &str) -> Result<(), ActionError> {
        self.out.write_all(format!("{message}\n").as_bytes()).await?;
        self.out.flush().await?;
        Ok(())
    }
}
