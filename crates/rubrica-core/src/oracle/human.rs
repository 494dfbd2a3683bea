//! Human-in-the-loop oracle.
//!
//! Prompts a reviewer for each item and reads back one line of the form
//! `pass|fail|partial|skip[: justification]`. Prompts are serialized so
//! concurrent items never interleave on the terminal.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

use super::{Judgment, JudgmentOracle, JudgmentRequest, Verdict};
use crate::domain::OracleError;

struct Console<R, W> {
    reader: R,
    writer: W,
}

/// Oracle backed by a person answering prompts.
pub struct HumanOracle<R, W> {
    console: Mutex<Console<R, W>>,
}

impl HumanOracle<BufReader<tokio::io::Stdin>, tokio::io::Stderr> {
    /// Prompt on stderr and read answers from stdin, leaving stdout free
    /// for the report.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stderr())
    }
}

impl<R, W> HumanOracle<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            console: Mutex::new(Console { reader, writer }),
        }
    }
}

fn render_prompt(request: &JudgmentRequest) -> String {
    let mut out = format!("\n[{}] {}\n", request.item_id, request.description);
    if request.snippets.is_empty() {
        out.push_str("  (no evidence located)\n");
    }
    for s in &request.snippets {
        out.push_str(&format!("  > {s}\n"));
    }
    out.push_str("verdict (pass/fail/partial/skip)[: justification]: ");
    out
}

/// Parse a reviewer's answer line.
pub(crate) fn parse_answer(line: &str) -> Result<Judgment, OracleError> {
    let line = line.trim();
    let (head, tail) = match line.split_once(':') {
        Some((h, t)) => (h.trim(), t.trim()),
        None => (line, ""),
    };
    let justification = if tail.is_empty() {
        "reviewer judgment".to_string()
    } else {
        tail.to_string()
    };
    let verdict = match head.to_ascii_lowercase().as_str() {
        "pass" | "p" | "y" | "yes" => Verdict::Pass,
        "fail" | "f" | "n" | "no" => Verdict::Fail,
        "partial" | "part" => Verdict::Partial,
        "skip" | "s" | "?" | "unknown" => {
            let reason = if tail.is_empty() {
                "reviewer skipped".to_string()
            } else {
                tail.to_string()
            };
            return Ok(Judgment::undecided(reason));
        }
        other => {
            return Err(OracleError::Malformed(format!(
                "unrecognised reviewer answer '{other}'"
            )))
        }
    };
    Ok(Judgment::decided(verdict, justification))
}

#[async_trait]
impl<R, W> JudgmentOracle for HumanOracle<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn judge(&self, request: &JudgmentRequest) -> Result<Judgment, OracleError> {
        let mut console = self.console.lock().await;
        let prompt = render_prompt(request);

        console
            .writer
            .write_all(prompt.as_bytes())
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?;
        console
            .writer
            .flush()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        let mut line = String::new();
        let read = console
            .reader
            .read_line(&mut line)
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?;
        if read == 0 {
            return Ok(Judgment::undecided("reviewer input closed"));
        }
        parse_answer(&line)
    }

    fn name(&self) -> &'static str {
        "human"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> JudgmentRequest {
        JudgmentRequest {
            item_id: "nav-1".to_string(),
            description: "Navigation highlights the current page".to_string(),
            snippets: vec!["<a class=\"active\">Home</a>".to_string()],
        }
    }

    #[test]
    fn test_parse_answers() {
        assert_eq!(
            parse_answer("pass").unwrap(),
            Judgment::decided(Verdict::Pass, "reviewer judgment")
        );
        assert_eq!(
            parse_answer("Fail: button is grey\n").unwrap(),
            Judgment::decided(Verdict::Fail, "button is grey")
        );
        assert_eq!(
            parse_answer("skip: cannot tell from code").unwrap(),
            Judgment::undecided("cannot tell from code")
        );
        assert!(matches!(
            parse_answer("maybe"),
            Err(OracleError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_prompts_and_reads_answers_in_order() {
        let input: &[u8] = b"partial: only desktop\npass\n";
        let mut output = Vec::new();
        {
            let oracle = HumanOracle::new(input, &mut output);
            let first = oracle.judge(&request()).await.unwrap();
            assert_eq!(first, Judgment::decided(Verdict::Partial, "only desktop"));
            let second = oracle.judge(&request()).await.unwrap();
            assert_eq!(second, Judgment::decided(Verdict::Pass, "reviewer judgment"));
            let third = oracle.judge(&request()).await.unwrap();
            assert_eq!(third, Judgment::undecided("reviewer input closed"));
        }
        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("[nav-1] Navigation highlights the current page"));
        assert!(shown.contains("  > <a class=\"active\">Home</a>"));
    }
}
