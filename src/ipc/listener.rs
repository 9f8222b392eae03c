//! Unix-socket [`CommandSource`] implementation.
//!
//! Clients (key-bind scripts, the compositor plugin reporting grabs and
//! resizes) connect one at a time and write newline-delimited JSON
//! commands.  Every non-empty line is answered with one line of JSON:
//!
//! ```json
//! → {"TileWindow":{"window":"0x55d0c1a0","zone":"top-right"}}
//! ← {"status":"accepted"}
//! → {"Tile":"sideways"}
//! ← {"status":"rejected","reason":"malformed command: unknown variant ..."}
//! ```
//!
//! `accepted` means the command was queued for the engine, not that it
//! took effect.  Clients that never read replies are not stalled: once a
//! reply cannot be written in time, that connection stops being answered.

use crate::command::Command;
use crate::traits::CommandSource;
use log::{debug, error, info, warn};
use serde::Serialize;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

const REPLY_TIMEOUT: Duration = Duration::from_millis(100);

/// Errors that end the listener.
#[derive(Debug, thiserror::Error)]
pub enum UnixSocketError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a single line was not accepted.  The connection stays open.
#[derive(Debug, thiserror::Error)]
pub enum LineError {
    #[error("line is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
    #[error("malformed command: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Answer written back for each line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Reply {
    Accepted,
    Rejected { reason: String },
}

/// Parse one raw line.  Blank lines yield `Ok(None)`.
pub fn parse_line(raw: &[u8]) -> Result<Option<Command>, LineError> {
    let text = std::str::from_utf8(raw)?.trim();
    if text.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(text)?))
}

/// How a client session ended.
#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    Disconnected,
    SinkClosed,
}

/// A [`CommandSource`] that listens on a Unix stream socket.
pub struct UnixSocketListener {
    path: PathBuf,
}

impl UnixSocketListener {
    /// The socket file is created when [`run`](CommandSource::run) is
    /// called and removed once the engine stops taking commands.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn serve(&self, stream: UnixStream, sink: &mpsc::Sender<Command>) -> Result<SessionEnd, UnixSocketError> {
        stream.set_write_timeout(Some(REPLY_TIMEOUT))?;
        let mut replies = Some(stream.try_clone()?);
        let mut reader = BufReader::new(stream);
        let mut raw = Vec::new();

        loop {
            raw.clear();
            if reader.read_until(b'\n', &mut raw)? == 0 {
                return Ok(SessionEnd::Disconnected);
            }
            let reply = match parse_line(&raw) {
                Ok(None) => continue,
                Ok(Some(cmd)) => {
                    debug!("received {:?}", cmd);
                    if sink.send(cmd).is_err() {
                        return Ok(SessionEnd::SinkClosed);
                    }
                    Reply::Accepted
                }
                Err(e) => {
                    warn!("rejected line {:?}: {}", String::from_utf8_lossy(&raw).trim(), e);
                    Reply::Rejected {
                        reason: e.to_string(),
                    }
                }
            };
            if let Some(out) = replies.as_mut() {
                if let Err(e) = write_reply(out, &reply) {
                    debug!("client stopped reading replies: {}", e);
                    replies = None;
                }
            }
        }
    }
}

fn write_reply(out: &mut UnixStream, reply: &Reply) -> std::io::Result<()> {
    let mut line = serde_json::to_vec(reply)?;
    line.push(b'\n');
    out.write_all(&line)
}

impl CommandSource for UnixSocketListener {
    type Error = UnixSocketError;

    /// Bind the socket and serve clients one after another.
    ///
    /// This method **blocks** until the receiving end of `sink` is dropped.
    fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), Self::Error> {
        // Remove stale socket if present.
        let _ = std::fs::remove_file(&self.path);

        let listener = UnixListener::bind(&self.path)?;
        info!("listening on {}", self.path.display());

        for stream in listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    error!("accept error: {}", e);
                    continue;
                }
            };
            debug!("client connected");
            match self.serve(stream, &sink) {
                Ok(SessionEnd::Disconnected) => debug!("client disconnected"),
                Ok(SessionEnd::SinkClosed) => {
                    info!("sink closed, shutting down");
                    let _ = std::fs::remove_file(&self.path);
                    return Ok(());
                }
                Err(e) => warn!("client dropped: {}", e),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Direction, WindowId};
    use crate::geometry::Zone;
    use std::sync::atomic::{AtomicU32, Ordering};

    static TEST_ID: AtomicU32 = AtomicU32::new(0);

    fn tmp_socket_path() -> PathBuf {
        let id = TEST_ID.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!("edgetile-test-{}-{}.sock", std::process::id(), id))
    }

    /// Start a listener, send `lines`, and return the replies and the
    /// commands that reached the sink.
    fn exchange(lines: &[&[u8]]) -> (Vec<String>, Vec<Command>) {
        let path = tmp_socket_path();
        let server_path = path.clone();
        let (tx, rx) = mpsc::channel();
        let _handle = std::thread::spawn(move || {
            let mut listener = UnixSocketListener::new(&server_path);
            let _ = listener.run(tx);
        });
        std::thread::sleep(Duration::from_millis(150));

        let mut stream = UnixStream::connect(&path).expect("connect");
        for line in lines {
            stream.write_all(line).unwrap();
            stream.write_all(b"\n").unwrap();
        }
        stream.shutdown(std::net::Shutdown::Write).unwrap();
        let replies = BufReader::new(stream)
            .lines()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        let cmds = rx.try_iter().collect();
        let _ = std::fs::remove_file(&path);
        (replies, cmds)
    }

    #[test]
    fn parse_line_skips_blank_lines() {
        assert!(parse_line(b"   \r").unwrap().is_none());
        assert_eq!(
            parse_line(br#"{"Tile":"left-full"}"#).unwrap(),
            Some(Command::Tile(Zone::LeftFull))
        );
    }

    #[test]
    fn parse_line_reports_what_went_wrong() {
        assert!(matches!(parse_line(b"\xff\xfe"), Err(LineError::Encoding(_))));
        assert!(matches!(
            parse_line(br#"{"Tile":"sideways"}"#),
            Err(LineError::Malformed(_))
        ));
    }

    #[test]
    fn replies_are_tagged_by_status() {
        assert_eq!(
            serde_json::to_string(&Reply::Accepted).unwrap(),
            r#"{"status":"accepted"}"#
        );
        let rejected = Reply::Rejected {
            reason: "nope".into(),
        };
        assert_eq!(
            serde_json::to_string(&rejected).unwrap(),
            r#"{"status":"rejected","reason":"nope"}"#
        );
    }

    #[test]
    fn every_command_line_is_acknowledged() {
        let (replies, cmds) = exchange(&[
            br#"{"Tile":"right-full"}"#,
            b"",
            br#"{"GrabEnd":{"window":"0x2a"}}"#,
            br#""Untile""#,
        ]);
        assert_eq!(replies, vec![r#"{"status":"accepted"}"#; 3]);
        assert_eq!(
            cmds,
            vec![
                Command::Tile(Zone::RightFull),
                Command::GrabEnd { window: WindowId(42) },
                Command::Untile,
            ]
        );
    }

    #[test]
    fn bad_lines_are_rejected_without_closing_the_connection() {
        let (replies, cmds) = exchange(&[b"not json at all", b"\xff", br#"{"Swap":"Right"}"#]);
        assert_eq!(replies.len(), 3);
        assert!(replies[0].starts_with(r#"{"status":"rejected","reason":"malformed command"#));
        assert!(replies[1].contains("UTF-8"));
        assert_eq!(replies[2], r#"{"status":"accepted"}"#);
        assert_eq!(cmds, vec![Command::Swap(Direction::Right)]);
    }
}
