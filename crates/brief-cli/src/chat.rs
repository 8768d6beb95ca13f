use brief_core::session::Session;
use std::io::{self, BufRead, Write};

const QUIT: &str = "/quit";

/// Question loop over the current summary. Ends on `/quit` or end of input;
/// a failed question is reported and the loop keeps going.
pub fn run<R: BufRead, W: Write>(session: &mut Session, input: R, mut out: W) -> io::Result<()> {
    writeln!(out, "Ask questions about the summary ({QUIT} to finish).")?;
    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = lines.next() else {
            writeln!(out)?;
            break;
        };
        let line = line?;
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question == QUIT {
            break;
        }
        match session.ask(question) {
            Ok(answer) => writeln!(out, "{answer}\n")?,
            Err(err) => writeln!(out, "error: {err}\n")?,
        }
    }
    Ok(())
}
