use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, LineWriter, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use tracing::{debug, warn};

use crate::ai::Agent;
use crate::error::GameError;
use crate::protocol::Message;
use crate::session::Session;

/// The other party of a match, reached through newline-terminated lines.
pub trait Peer {
    /// Write one line. `line` already carries its terminating newline.
    fn send_line(&mut self, line: &str) -> io::Result<()>;

    /// Block until the peer writes a line and return its raw bytes, newline
    /// included. End of stream is an error.
    fn recv_line(&mut self) -> io::Result<Vec<u8>>;
}

/// An opponent running as a child process, spoken to over its stdin/stdout.
/// The child is killed when the peer is dropped.
pub struct ProcessPeer {
    child: Child,
    stdin: LineWriter<ChildStdin>,
    stdout: BufReader<ChildStdout>,
}

impl ProcessPeer {
    /// Launch `command`, split on whitespace into program and arguments.
    pub fn spawn(command: &str) -> io::Result<Self> {
        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty opponent command"))?;
        let mut child = Command::new(program)
            .args(parts)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("opponent stdin not captured"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("opponent stdout not captured"))?;
        debug!(pid = child.id(), command, "opponent process started");
        Ok(ProcessPeer {
            child,
            stdin: LineWriter::new(stdin),
            stdout: BufReader::new(stdout),
        })
    }
}

impl Peer for ProcessPeer {
    fn send_line(&mut self, line: &str) -> io::Result<()> {
        self.stdin.write_all(line.as_bytes())?;
        self.stdin.flush()
    }

    fn recv_line(&mut self) -> io::Result<Vec<u8>> {
        let mut line = Vec::new();
        if self.stdout.read_until(b'\n', &mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "opponent closed its output",
            ));
        }
        Ok(line)
    }
}

impl Drop for ProcessPeer {
    fn drop(&mut self) {
        if let Err(e) = self.child.kill() {
            // Already exited.
            debug!("kill opponent: {e}");
        }
        if let Err(e) = self.child.wait() {
            warn!("failed to reap opponent process: {e}");
        }
    }
}

/// An opponent that runs an agent session in memory. Replies are queued as
/// soon as a message is delivered and handed out by `recv_line`.
pub struct InProcessPeer<A: Agent> {
    session: Session<A>,
    holes: usize,
    outbox: VecDeque<String>,
}

impl<A: Agent> InProcessPeer<A> {
    pub fn new(agent: A, holes: usize, seeds: u32) -> Result<Self, GameError> {
        Ok(InProcessPeer {
            session: Session::new(agent, holes, seeds)?,
            holes,
            outbox: VecDeque::new(),
        })
    }

    pub fn session(&self) -> &Session<A> {
        &self.session
    }
}

impl<A: Agent> Peer for InProcessPeer<A> {
    fn send_line(&mut self, line: &str) -> io::Result<()> {
        let message = Message::decode(line, self.holes)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let reply = self
            .session
            .handle(&message)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if let Some(reply) = reply {
            self.outbox.push_back(reply.encode());
        }
        Ok(())
    }

    fn recv_line(&mut self) -> io::Result<Vec<u8>> {
        self.outbox.pop_front().map(String::into_bytes).ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "in-process opponent has nothing to say")
        })
    }
}

/// A peer that replays canned lines and records everything sent to it.
#[derive(Debug, Default)]
pub struct ScriptedPeer {
    script: VecDeque<Vec<u8>>,
    sent: Vec<String>,
    broken: bool,
}

impl ScriptedPeer {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedPeer {
            script: lines.into_iter().map(|line| line.into().into_bytes()).collect(),
            sent: Vec::new(),
            broken: false,
        }
    }

    /// A peer replaying lines given as raw bytes.
    pub fn from_bytes<I>(lines: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        ScriptedPeer {
            script: lines.into_iter().collect(),
            sent: Vec::new(),
            broken: false,
        }
    }

    /// A peer whose pipe is closed: every write fails.
    pub fn broken() -> Self {
        ScriptedPeer {
            broken: true,
            ..Self::default()
        }
    }

    /// Lines delivered to the peer so far, newlines included.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }
}

impl Peer for ScriptedPeer {
    fn send_line(&mut self, line: &str) -> io::Result<()> {
        if self.broken {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer pipe closed"));
        }
        self.sent.push(line.to_string());
        Ok(())
    }

    fn recv_line(&mut self) -> io::Result<Vec<u8>> {
        self.script
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
    }
}
