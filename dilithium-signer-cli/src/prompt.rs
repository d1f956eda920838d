use std::io::{self, BufRead, IsTerminal, Write};

/// Ask a yes/no question on stderr; anything but `y`/`yes` is a no.
///
/// Without a terminal on stdin nobody can answer, so the answer is no.
pub fn confirm(question: &str) -> io::Result<bool> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        tracing::debug!(question, "stdin is not a terminal; declining");
        return Ok(false);
    }
    ask(question, &mut stdin.lock(), &mut io::stderr())
}

fn ask(question: &str, input: &mut impl BufRead, output: &mut impl Write) -> io::Result<bool> {
    write!(output, "{question} [y/N] ")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}
