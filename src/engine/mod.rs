//! Client for a UCI engine running as a child process.
//!
//! Every exchange is a blocking write followed by a blocking read up to a
//! marker line. There is no read timeout: an engine that stops answering
//! stalls the caller.

pub mod parse;

use std::collections::BTreeMap;
use std::fmt::Display;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use log::{debug, info, trace, warn};

use crate::error::EngineError;
use crate::moves::MoveSequence;
use self::parse::{parse_candidate, parse_fen_line};

/// Candidate move token -> centipawn evaluation, one entry per distinct first move.
pub type Candidates = BTreeMap<String, i32>;

/// Options applied during the handshake. Changing them on a running engine
/// goes through the `Engine::set_*` methods, which re-send the option.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineSettings {
    pub threads: u32,
    pub hash_mb: u32,
    pub multipv: u32,
    /// Log every line the engine prints at `info` instead of `debug`.
    pub echo_output: bool,
}

impl Default for EngineSettings {
    fn default() -> Self { Self { threads: 8, hash_mb: 2048, multipv: 5, echo_output: false } }
}

pub type ProcessEngine = Engine<BufReader<ChildStdout>, BufWriter<ChildStdin>>;

pub struct Engine<R: BufRead, W: Write> {
    reader: R,
    // `None` once stdin has been closed for shutdown
    writer: Option<W>,
    settings: EngineSettings,
    child: Option<Child>,
}

impl ProcessEngine {
    /// Spawns the engine at `path` and completes the handshake.
    pub fn start(path: impl AsRef<Path>, settings: EngineSettings) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| EngineError::Launch { path: path.to_path_buf(), source })?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(i), Some(o)) => (i, o),
            (i, _) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(EngineError::Pipe(if i.is_none() { "stdin" } else { "stdout" }));
            }
        };
        info!(target: "engine", "started {} (pid {})", path.display(), child.id());

        let mut engine = Engine { reader: BufReader::new(stdout), writer: Some(BufWriter::new(stdin)), settings, child: Some(child) };
        engine.handshake()?;
        Ok(engine)
    }
}

impl<R: BufRead, W: Write> Engine<R, W> {
    /// Runs the handshake over streams that are already connected to an engine.
    pub fn attach(reader: R, writer: W, settings: EngineSettings) -> Result<Self, EngineError> {
        let mut engine = Engine { reader, writer: Some(writer), settings, child: None };
        engine.handshake()?;
        Ok(engine)
    }

    fn handshake(&mut self) -> Result<(), EngineError> {
        self.send("uci")?;
        self.set_option("Threads", self.settings.threads)?;
        self.set_option("Hash", self.settings.hash_mb)?;
        self.set_option("MultiPV", self.settings.multipv)?;
        self.send("isready")?;
        self.send("ucinewgame")?;
        self.skip_until("readyok")
    }

    pub fn settings(&self) -> &EngineSettings { &self.settings }

    pub fn multipv(&self) -> u32 { self.settings.multipv }

    pub fn send(&mut self, cmd: &str) -> Result<(), EngineError> {
        trace!(target: "engine", ">> {cmd}");
        let res = match self.writer.as_mut() {
            Some(w) => writeln!(w, "{cmd}").and_then(|_| w.flush()),
            None => Err(io::Error::new(io::ErrorKind::BrokenPipe, "engine input is closed")),
        };
        res.map_err(|e| EngineError::protocol(format!("sending `{cmd}`"), e))
    }

    fn read_line(&mut self, expected: &str) -> Result<String, EngineError> {
        let mut buf = Vec::new();
        let n = self
            .reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| EngineError::protocol(format!("waiting for `{expected}`"), e))?;
        if n == 0 {
            return Err(EngineError::closed(expected));
        }
        // stray non-UTF-8 bytes (file names in `info string`) must not end the read
        let line = String::from_utf8_lossy(&buf).trim_end_matches(['\r', '\n']).to_string();
        if self.settings.echo_output {
            info!(target: "engine", "<< {line}");
        } else {
            debug!(target: "engine", "<< {line}");
        }
        Ok(line)
    }

    /// Reads lines until one contains `marker`, handing every earlier line to
    /// `skipped`. Returns the marker line.
    pub fn read_until<F: FnMut(&str)>(&mut self, marker: &str, mut skipped: F) -> Result<String, EngineError> {
        loop {
            let line = self.read_line(marker)?;
            if line.contains(marker) {
                return Ok(line);
            }
            skipped(&line);
        }
    }

    pub fn skip_until(&mut self, marker: &str) -> Result<(), EngineError> {
        self.read_until(marker, |_| {}).map(|_| ())
    }

    /// Fire-and-forget `setoption`; the protocol has no acknowledgement for it.
    pub fn set_option(&mut self, name: &str, value: impl Display) -> Result<(), EngineError> {
        self.send(&format!("setoption name {name} value {value}"))
    }

    pub fn set_threads(&mut self, threads: u32) -> Result<(), EngineError> {
        self.set_option("Threads", threads)?;
        self.settings.threads = threads;
        Ok(())
    }

    pub fn set_hash(&mut self, hash_mb: u32) -> Result<(), EngineError> {
        self.set_option("Hash", hash_mb)?;
        self.settings.hash_mb = hash_mb;
        Ok(())
    }

    pub fn set_multipv(&mut self, multipv: u32) -> Result<(), EngineError> {
        self.set_option("MultiPV", multipv)?;
        self.settings.multipv = multipv;
        Ok(())
    }

    pub fn set_position(&mut self, line: &MoveSequence) -> Result<(), EngineError> {
        if line.is_empty() {
            self.send("position startpos")
        } else {
            self.send(&format!("position startpos moves {line}"))
        }
    }

    pub fn set_fen(&mut self, fen: &str) -> Result<(), EngineError> {
        self.send(&format!("position fen {fen}"))
    }

    /// Position string of the current position from a `d` board dump, or an
    /// empty string when the dump carries no `Fen:` line.
    pub fn current_fen(&mut self) -> Result<String, EngineError> {
        self.send("d")?;
        let mut fen = String::new();
        self.read_until("Checkers:", |l| {
            if let Some(f) = parse_fen_line(l) { fen = f; }
        })?;
        if fen.is_empty() {
            warn!(target: "engine", "board dump had no Fen line");
        }
        Ok(fen)
    }

    /// Feeds the board dump of `line` to `out`, one line at a time.
    pub fn print_position<F: FnMut(&str)>(&mut self, line: &MoveSequence, out: F) -> Result<(), EngineError> {
        self.set_position(line)?;
        self.send("d")?;
        self.read_until("Checkers:", out).map(|_| ())
    }

    pub fn start_search(&mut self, depth: u32) -> Result<(), EngineError> {
        self.send(&format!("go depth {depth}"))
    }

    /// Searches `line` to `depth` with `lines` principal variations and returns
    /// the first move of every variation reported at exactly that depth. A move
    /// reported twice keeps its last evaluation.
    pub fn find_best_moves(&mut self, line: &MoveSequence, depth: u32, lines: u32) -> Result<Candidates, EngineError> {
        self.set_option("MultiPV", lines)?;
        self.set_position(line)?;
        self.start_search(depth)?;
        let mut found = Candidates::new();
        self.read_until("bestmove", |l| {
            if let Some(mv) = parse_candidate(l, depth) {
                found.insert(mv.token().to_string(), mv.eval());
            }
        })?;
        Ok(found)
    }

    /// Sends `quit`, closes the engine's input and waits for the child
    /// process, if there is one.
    pub fn quit(mut self) -> Result<(), EngineError> {
        self.send("quit")?;
        drop(self.writer.take());
        if let Some(mut child) = self.child.take() {
            let status = child.wait().map_err(|e| EngineError::protocol("waiting for the engine to exit", e))?;
            info!(target: "engine", "engine exited with {status}");
        }
        Ok(())
    }
}

impl<R: BufRead, W: Write> Drop for Engine<R, W> {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Some(mut w) = self.writer.take() {
                let _ = writeln!(w, "quit").and_then(|_| w.flush());
            }
            // engines that ignore `quit` still stop at end of input
            let _ = child.wait();
        }
    }
}
