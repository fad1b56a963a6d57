//! Operator console: help text, line prompts and a raw-mode friendly writer.
//!
//! In raw mode the terminal no longer turns `\n` into "new line + return to
//! column 0", so everything printed here goes through [`CrlfWriter`].
//!
//! [`KeyQueue`] is the production [`Operator`]: it hands captured keys to the
//! dispatcher one at a time and assembles prompt answers from the same
//! stream, echoing what is typed.

use std::io::{self, Write};

use async_trait::async_trait;
use c64kb_core::HostKey;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{trace, warn};

use crate::application::dispatch::{Operator, PromptError};

/// Key reference printed at start-up.
pub const HELP_TEXT: &[&str] = &[
    "f12: toggle between host commands and C64 keys for f1-f8 (default: C64 keys)",
    "f9:  cycle real joystick mode",
    "host commands:",
    "  f1: show cpu and chip registers",
    "  f2: load prg from sd card",
    "  f3: show memory",
    "  f4: send prg over BLE",
    "  f5: cycle keyboard joystick mapping",
    "  f6: reset C64",
    "  f7: toggle between sequential and interlaced line drawing",
    "ctrl+c: quit",
];

/// Writes [`HELP_TEXT`] to `out`, one line each.
pub fn print_help(out: &mut impl Write) -> io::Result<()> {
    for line in HELP_TEXT {
        writeln!(out, "{line}")?;
    }
    out.flush()
}

// ── CrlfWriter ────────────────────────────────────────────────────────────────

/// Expands every `\n` to `\r\n`.
#[derive(Debug)]
pub struct CrlfWriter<W> {
    inner: W,
}

impl<W: Write> CrlfWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CrlfWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for (i, segment) in buf.split(|&b| b == b'\n').enumerate() {
            if i > 0 {
                self.inner.write_all(b"\r\n")?;
            }
            self.inner.write_all(segment)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

// ── KeyQueue ──────────────────────────────────────────────────────────────────

/// The captured key stream plus somewhere to echo prompts.
pub struct KeyQueue<W> {
    keys: UnboundedReceiver<HostKey>,
    out: W,
}

impl<W: Write + Send> KeyQueue<W> {
    pub fn new(keys: UnboundedReceiver<HostKey>, out: W) -> Self {
        Self { keys, out }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Throws away keys typed ahead of a prompt or after its answer.
    fn discard_pending(&mut self) {
        let mut dropped = 0usize;
        while self.keys.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            trace!(dropped, "discarded queued keys");
        }
    }

    fn echo(&mut self, text: &str) {
        let result = self
            .out
            .write_all(text.as_bytes())
            .and_then(|()| self.out.flush());
        if let Err(e) = result {
            warn!("console write failed: {e}");
        }
    }
}

#[async_trait]
impl<W: Write + Send> Operator for KeyQueue<W> {
    async fn next_key(&mut self) -> Option<HostKey> {
        self.keys.recv().await
    }

    async fn prompt(&mut self, question: &str) -> Result<String, PromptError> {
        self.discard_pending();
        self.echo(question);

        let mut answer = String::new();
        loop {
            match self.keys.recv().await {
                None => return Err(PromptError::Closed),
                Some(HostKey::Enter) => break,
                Some(HostKey::Escape) => {
                    self.echo("\n");
                    self.discard_pending();
                    return Err(PromptError::Cancelled);
                }
                Some(HostKey::Backspace) => {
                    if answer.pop().is_some() {
                        self.echo("\u{8} \u{8}");
                    }
                }
                Some(key) => {
                    if let Some(c) = key.printable() {
                        answer.push(c);
                        let mut buf = [0u8; 4];
                        self.echo(c.encode_utf8(&mut buf));
                    }
                }
            }
        }

        self.echo("\n");
        self.discard_pending();
        Ok(answer)
    }
}
