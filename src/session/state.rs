//! Per-connection state machine: authenticate, attach a namespace, then
//! loop on commands until the peer disconnects, goes idle too long, or
//! sends `exit`.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::cache::CacheStore;
use crate::error::{CacheError, Result};
use crate::protocol::{self, command, dispatch, response, Command, CommandOutcome};
use crate::server::context::ServerContext;

fn interactive_banner(idle_timeout: Duration) -> [String; 2] {
    [
        format!(
            "You've been connected to In-memory cache. Connection idle timeout is {}s.",
            idle_timeout.as_secs()
        ),
        "Please enter first command: \"stop-server\" or \"connect-to\" <cacheId>".to_string(),
    ]
}

/// Credential handshake record sent as the first line of every connection.
#[derive(Debug, Deserialize)]
struct Credentials {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Pass")]
    pass_hash: String,
    #[serde(rename = "IsMachine")]
    is_machine: bool,
}

/// Drives one connection through the full state machine. `reader`/`writer`
/// are a split transport — any `AsyncBufRead`/`AsyncWrite` pair works, so
/// this is exercised directly over an in-memory duplex stream in tests and
/// over a TLS stream in production.
pub async fn run_session<R, W>(mut reader: R, mut writer: W, ctx: Arc<ServerContext>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let Some(line) = read_line(&mut reader, None).await? else {
        return Ok(());
    };
    let credentials: Credentials = match serde_json::from_str(&line) {
        Ok(c) => c,
        Err(_) => return Err(CacheError::InvalidCommand),
    };
    let is_machine = credentials.is_machine;

    if !ctx.credentials.verify(&credentials.name, &credentials.pass_hash) {
        if is_machine {
            write_structured_error(&mut writer, &CacheError::Auth).await?;
        } else {
            write_interactive(&mut writer, &[CacheError::Auth.to_string()]).await?;
        }
        return Err(CacheError::Auth);
    }

    if is_machine {
        write_line(&mut writer, &response::StructuredRecord::ok(serde_json::json!("Ok")).to_line())
            .await?;
    } else {
        write_interactive(&mut writer, &interactive_banner(ctx.idle_timeout)).await?;
    }

    let idle = if is_machine { None } else { Some(ctx.idle_timeout) };
    let Some(line) = read_line(&mut reader, idle).await? else {
        return Ok(());
    };
    let store = match attach(&line, &ctx) {
        AttachOutcome::Stop => {
            ctx.request_stop();
            return Ok(());
        }
        AttachOutcome::Store(store) => store,
        AttachOutcome::Invalid => {
            if is_machine {
                write_structured_error(&mut writer, &CacheError::InvalidCommand).await?;
            } else {
                write_interactive(
                    &mut writer,
                    &[CacheError::InvalidCommand.to_string(), protocol::help::NEED_HELP.to_string()],
                )
                .await?;
            }
            return Err(CacheError::InvalidCommand);
        }
    };

    if !is_machine {
        write_interactive(&mut writer, &["Connected".to_string()]).await?;
    }

    loop {
        let Some(line) = read_line(&mut reader, idle).await? else {
            return Ok(());
        };
        if handle_command(&line, &store, is_machine, &mut writer).await? {
            return Ok(());
        }
    }
}

enum AttachOutcome {
    Stop,
    Store(Arc<CacheStore>),
    Invalid,
}

fn attach(line: &str, ctx: &ServerContext) -> AttachOutcome {
    if line == "stop-server" {
        return AttachOutcome::Stop;
    }
    let parts: Vec<&str> = line.split(' ').collect();
    if parts.len() == 2 && parts[0] == "connect-to" {
        AttachOutcome::Store(ctx.registry.attach(parts[1]))
    } else {
        AttachOutcome::Invalid
    }
}

/// Executes one command-loop line. Returns `Ok(true)` when the session
/// should end (interactive `exit`).
async fn handle_command<W>(
    line: &str,
    store: &CacheStore,
    is_machine: bool,
    writer: &mut W,
) -> Result<bool>
where
    W: AsyncWrite + Unpin,
{
    let trimmed = line.trim();
    let first = trimmed.split(' ').next().unwrap_or("");

    if !is_machine {
        match first {
            "help" => {
                write_interactive(writer, protocol::help::HELP_LINES).await?;
                return Ok(false);
            }
            "exit" => {
                write_interactive(writer, &["Connection closed".to_string()]).await?;
                return Ok(true);
            }
            _ => {}
        }
    }

    let outcome = command::parse(trimmed).and_then(|cmd| {
        if is_machine && matches!(cmd, Command::Help | Command::Exit) {
            Err(CacheError::UnknownCommand)
        } else {
            dispatch::dispatch(store, cmd)
        }
    });

    match outcome {
        Ok(outcome) => {
            if is_machine {
                let record = response::StructuredRecord::ok(response::structured_value(&outcome));
                write_line(writer, &record.to_line()).await?;
            } else {
                write_interactive(writer, &response::interactive_lines(&outcome)).await?;
            }
            Ok(false)
        }
        Err(err) => {
            if is_machine {
                write_structured_error(writer, &err).await?;
            } else {
                write_interactive(
                    writer,
                    &[err.to_string(), protocol::help::NEED_HELP.to_string()],
                )
                .await?;
            }
            Ok(false)
        }
    }
}

async fn read_line<R>(reader: &mut R, timeout: Option<Duration>) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = String::new();
    let read = async { reader.read_line(&mut buf).await };
    let n = match timeout {
        Some(d) => tokio::time::timeout(d, read)
            .await
            .map_err(|_| CacheError::Transport(std::io::Error::from(std::io::ErrorKind::TimedOut)))??,
        None => read.await?,
    };
    if n == 0 {
        return Ok(None);
    }
    while buf.ends_with('\n') || buf.ends_with('\r') {
        buf.pop();
    }
    Ok(Some(buf))
}

async fn write_line<W>(writer: &mut W, line: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

async fn write_interactive<W, S: AsRef<str>>(writer: &mut W, lines: &[S]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    for line in lines {
        writer.write_all(line.as_ref().as_bytes()).await?;
        writer.write_all(b"\r\n").await?;
    }
    writer.flush().await?;
    Ok(())
}

async fn write_structured_error<W>(writer: &mut W, err: &CacheError) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    write_line(writer, &response::StructuredRecord::error(err).to_line()).await
}
