//! Interactive commands.

use std::io::{self, Write};

use thiserror::Error;

use pulse_p2p::{ConnectionSnapshot, LogEntry, PeerNode};

/// Host used by `connect <port>`.
pub const DEFAULT_CONNECT_HOST: &str = "localhost";

/// Usage text printed by `help` and at startup.
pub const HELP: &str = "Usage\n\
help\tprints this message\n\
connect [Port]\tconnects to `localhost:port`\n\
connect [Host] [Port]\tconnects to `host:port`\n\
send [Message]\tsends message to all peers\n\
peers\tlists connections\n\
messages\tprints pending messages\n\
exit\tcloses the server\n";

const MESSAGES_HEADER: &str = "------------ MESSAGES ------------";
const CONNECTIONS_HEADER: &str = "---------- CONNECTIONS -----------";
const FOOTER: &str = "----------------------------------";

/// A parsed prompt command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Connect { host: String, port: u16 },
    Send(String),
    Peers,
    Messages,
    Exit,
}

/// Why a prompt line could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid port `{0}`")]
    InvalidPort(String),
}

/// What the prompt loop does after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

impl Command {
    /// Parse one prompt line. Blank lines parse to `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match name {
            "help" => Command::Help,
            "connect" => {
                let (host, port) = match args.as_slice() {
                    [port] => (DEFAULT_CONNECT_HOST, *port),
                    [host, port] => (*host, *port),
                    _ => return Err(CommandError::Usage("connect [Host] <Port>")),
                };
                let port = port
                    .parse()
                    .map_err(|_| CommandError::InvalidPort(port.to_string()))?;
                Command::Connect {
                    host: host.to_string(),
                    port,
                }
            }
            "send" => Command::Send(args.join(" ")),
            "peers" => Command::Peers,
            "messages" => Command::Messages,
            "exit" => Command::Exit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

/// Run one command against the node.
pub async fn execute<W: Write>(node: &PeerNode, command: Command, out: &mut W) -> io::Result<Flow> {
    match command {
        Command::Help => write!(out, "{}", HELP)?,
        Command::Connect { host, port } => {
            // Failures land in the message log and are printed with it.
            if let Ok(addr) = node.connect(&host, port).await {
                writeln!(out, "connected to {}", addr)?;
            }
        }
        Command::Send(text) => match node.send_message(text).await {
            Ok(delivered) => writeln!(out, "sent to {} peer(s)", delivered)?,
            Err(e) => writeln!(out, "send failed: {}", e)?,
        },
        Command::Peers => {
            let connections = node.list_connections().await;
            if connections.is_empty() {
                writeln!(out, "no connections")?;
            }
            print_connections(&connections, out)?;
        }
        Command::Messages => print_messages(&node.drain_messages().await, out)?,
        Command::Exit => return Ok(Flow::Exit),
    }
    Ok(Flow::Continue)
}

/// Print log entries between separator lines. Prints nothing when empty.
pub fn print_messages<W: Write>(entries: &[LogEntry], out: &mut W) -> io::Result<()> {
    if entries.is_empty() {
        return Ok(());
    }
    writeln!(out, "{}", MESSAGES_HEADER)?;
    for entry in entries {
        writeln!(out, "{}", entry)?;
    }
    writeln!(out, "{}", FOOTER)
}

/// Print connections between separator lines. Prints nothing when empty.
pub fn print_connections<W: Write>(connections: &[ConnectionSnapshot], out: &mut W) -> io::Result<()> {
    if connections.is_empty() {
        return Ok(());
    }
    writeln!(out, "{}", CONNECTIONS_HEADER)?;
    for connection in connections {
        writeln!(out, "{}", connection)?;
    }
    writeln!(out, "{}", FOOTER)
}

/// Drain and print pending messages, then the connection list.
pub async fn print_status<W: Write>(node: &PeerNode, out: &mut W) -> io::Result<()> {
    print_messages(&node.drain_messages().await, out)?;
    print_connections(&node.list_connections().await, out)
}
