//! The interactive prompt loop.

use std::future::Future;
use std::io::{self, BufRead, Write};

use tokio::sync::mpsc;

use pulse_p2p::PeerNode;

use crate::commands::{self, Command, Flow, HELP};

/// Prompt shown before each line of input.
pub const PROMPT: &str = ">> ";

/// Lines of user input. The channel closes at end of input.
pub type InputLines = mpsc::Receiver<io::Result<String>>;

/// Read stdin line by line on a dedicated thread.
///
/// The thread is detached: a read blocked on the terminal does not keep the
/// process alive once `main` returns.
pub fn spawn_stdin_reader() -> InputLines {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let failed = line.is_err();
            if tx.blocking_send(line).is_err() || failed {
                break;
            }
        }
    });
    rx
}

/// Read commands from `input` until `exit`, end of input, or `shutdown`
/// completes. Does not close the node.
pub async fn run<W, S>(
    node: &PeerNode,
    mut input: InputLines,
    out: &mut W,
    shutdown: S,
) -> anyhow::Result<()>
where
    W: Write,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    write!(out, "{}", HELP)?;

    loop {
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        let line = tokio::select! {
            _ = &mut shutdown => break,
            line = input.recv() => line.transpose()?,
        };
        let Some(line) = line else {
            tracing::debug!("End of input");
            break;
        };

        match Command::parse(&line) {
            Ok(Some(command)) => {
                if commands::execute(node, command, out).await? == Flow::Exit {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => writeln!(out, "{}", e)?,
        }

        commands::print_status(node, out).await?;
    }

    writeln!(out)?;
    Ok(())
}
