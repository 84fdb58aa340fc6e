// ABOUTME: AT command dispatcher - serialises commands, classifies lines, fans out URCs
// ABOUTME: One reader task per device; one command in flight; bounded response queue

//! Device Module
//!
//! This module provides the AT command dispatcher with the following
//! guarantees:
//!
//! * **One command in flight** - concurrent `send`s serialise on an async
//!   lock; their bytes never interleave on the wire
//! * **Clean attribution** - every received line lands in exactly one of
//!   the in-flight command's response set, the URC stream, or the log (on
//!   queue overflow)
//! * **Non-blocking reader** - URC handlers run on their own tasks, so a
//!   slow handler cannot stall line reception
//! * **Defined shutdown** - `close()` is idempotent, cancels the waiter,
//!   joins the reader and aborts outstanding URC tasks
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use atmodem::device::{Device, DeviceConfig};
//! use std::sync::Arc;
//!
//! # async fn example(port: tokio::io::DuplexStream) -> Result<(), Box<dyn std::error::Error>> {
//! let handler = Arc::new(|urc: atmodem::device::Urc| {
//!     println!("unsolicited: {} {:?}", urc.label, urc.params);
//! });
//! let device = Device::open(port, Some(handler), DeviceConfig::default());
//!
//! let lines = device.send("AT").await?;
//! assert_eq!(lines.last().map(String::as_str), Some("OK"));
//!
//! device.close().await;
//! # Ok(())
//! # }
//! ```

pub mod basic;
pub mod call;
pub mod command_set;
pub mod config;
pub mod error;
pub mod network;
pub mod response_set;
pub mod sms;
pub mod urc_set;

pub use command_set::CommandSet;
pub use config::DeviceConfig;
pub use error::{AtError, AtResult};
pub use response_set::ResponseSet;
pub use urc_set::UrcSet;

use crate::line::{self, LineReader};
use crate::sms::Segmenter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};

/// Lines buffered between the reader and the waiting command. Overflow
/// drops the newest line rather than stalling the reader.
const RESPONSE_QUEUE_CAPACITY: usize = 100;

/// A parsed unsolicited result code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Urc {
    /// The line's label, e.g. `+CMTI` or `RING`.
    pub label: String,
    /// Positional parameters following the label's colon.
    pub params: Vec<String>,
}

impl Urc {
    fn parse(raw: &str) -> Self {
        let (label, params) = line::parse_params(raw);
        Urc { label, params }
    }
}

/// Callback receiving each URC on its own task.
pub type UrcHandler = Arc<dyn Fn(Urc) + Send + Sync>;

struct Shared {
    closed: AtomicBool,
    /// The command currently on the wire, empty when idle. Written by the
    /// dispatcher around its write, read by the line classifier.
    current: StdMutex<String>,
    responses: ResponseSet,
    urcs: UrcSet,
}

impl Shared {
    fn current_command(&self) -> String {
        lock(&self.current).clone()
    }
}

struct CommandChannel {
    writer: Box<dyn AsyncWrite + Send + Unpin>,
    rx: mpsc::Receiver<String>,
}

/// A modem bound to a serial byte stream.
///
/// The port is read only by the device's background reader task and
/// written only under the command lock, so a `Device` can be shared
/// freely behind an `Arc`.
pub struct Device {
    shared: Arc<Shared>,
    chan: Mutex<CommandChannel>,
    reader: StdMutex<Option<JoinHandle<()>>>,
    command_timeout: Duration,
    pub(crate) sms_timeout: Duration,
    pub(crate) commands: CommandSet,
    pub(crate) segmenter: Segmenter,
}

impl Device {
    /// Bind a device to `port` and start its reader task. Must be called
    /// within a tokio runtime.
    pub fn open<P>(port: P, urc_handler: Option<UrcHandler>, config: DeviceConfig) -> Device
    where
        P: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let (read_half, write_half) = tokio::io::split(port);
        let (tx, rx) = mpsc::channel(RESPONSE_QUEUE_CAPACITY);

        let shared = Arc::new(Shared {
            closed: AtomicBool::new(false),
            current: StdMutex::new(String::new()),
            responses: config.responses,
            urcs: config.urcs,
        });

        let reader = tokio::spawn(read_and_dispatch(
            LineReader::new(read_half),
            tx,
            shared.clone(),
            urc_handler,
            config.command_timeout / 2,
        ));

        Device {
            shared,
            chan: Mutex::new(CommandChannel {
                writer: Box::new(write_half),
                rx,
            }),
            reader: StdMutex::new(Some(reader)),
            command_timeout: config.command_timeout,
            sms_timeout: config.sms_timeout,
            commands: config.commands,
            segmenter: Segmenter::new(),
        }
    }

    /// Whether the device is still open.
    pub fn is_open(&self) -> bool {
        !self.shared.closed.load(Ordering::SeqCst)
    }

    /// Send a command and collect its response lines up to and including
    /// the final result line.
    ///
    /// CR+LF is appended unless the command already ends with CR, LF,
    /// Ctrl-Z or ESC. Fails with [`AtError::Timeout`] when no final line
    /// arrives within the command deadline and with [`AtError::Closed`]
    /// when the device closes mid-wait; both carry the lines received so
    /// far.
    pub async fn send(&self, command: &str) -> AtResult<Vec<String>> {
        self.send_with_timeout(command, self.command_timeout).await
    }

    /// [`Device::send`] with an explicit deadline.
    pub async fn send_with_timeout(
        &self,
        command: &str,
        timeout: Duration,
    ) -> AtResult<Vec<String>> {
        if !self.is_open() {
            return Err(AtError::Closed { lines: Vec::new() });
        }

        let mut chan = self.chan.lock().await;
        if !self.is_open() {
            return Err(AtError::Closed { lines: Vec::new() });
        }

        // Drop lines left over from a previous command (late arrivals after
        // a timeout, typically) so they cannot be misattributed.
        while let Ok(stale) = chan.rx.try_recv() {
            tracing::debug!(line = %stale, "dropping stale response line");
        }

        let mut text = command.to_string();
        if !has_terminator(&text) {
            text.push_str("\r\n");
        }

        *lock(&self.shared.current) = text.clone();
        let result = self.run_command(&mut chan, &text, timeout).await;
        lock(&self.shared.current).clear();
        result
    }

    async fn run_command(
        &self,
        chan: &mut CommandChannel,
        text: &str,
        timeout: Duration,
    ) -> AtResult<Vec<String>> {
        tracing::debug!(command = %text.trim_end(), "sending command");
        let written = chan.writer.write(text.as_bytes()).await?;
        if written < text.len() {
            return Err(AtError::IncompleteWrite {
                written,
                expected: text.len(),
            });
        }

        let deadline = tokio::time::Instant::now() + timeout;
        let mut lines = Vec::new();
        loop {
            match tokio::time::timeout_at(deadline, chan.rx.recv()).await {
                Err(_) => return Err(AtError::Timeout { lines }),
                Ok(None) => return Err(AtError::Closed { lines }),
                Ok(Some(line)) => {
                    let is_final = self.shared.responses.is_final(&line);
                    lines.push(line);
                    if is_final {
                        return Ok(lines);
                    }
                }
            }
        }
    }

    /// Send a command and require some response line to contain
    /// `expected` (case-sensitive substring match).
    pub async fn send_expect(&self, command: &str, expected: &str) -> AtResult<()> {
        self.send_expect_with_timeout(command, expected, self.command_timeout)
            .await
    }

    pub(crate) async fn send_expect_with_timeout(
        &self,
        command: &str,
        expected: &str,
        timeout: Duration,
    ) -> AtResult<()> {
        let lines = self.send_with_timeout(command, timeout).await?;
        if lines.iter().any(|line| line.contains(expected)) {
            return Ok(());
        }
        Err(AtError::UnexpectedResponse {
            expected: expected.to_string(),
            lines,
        })
    }

    /// Send a query command and return its data line: the first response
    /// line that is not the echoed `AT` command.
    pub async fn simple_query(&self, command: &str) -> AtResult<String> {
        let lines = self.send(command).await?;
        for line in &lines {
            if !line.starts_with("AT") {
                return Ok(line.clone());
            }
        }
        Err(AtError::UnexpectedResponse {
            expected: command.to_string(),
            lines,
        })
    }

    /// Close the device: cancel any pending waiter with
    /// [`AtError::Closed`], join the reader task and shut the port down.
    /// Idempotent.
    pub async fn close(&self) {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::debug!("closing device");

        // Stopping the reader drops the response sender, which wakes any
        // waiter with `Closed` and releases the command lock.
        let handle = lock(&self.reader).take();
        if let Some(handle) = handle {
            handle.abort();
            let _ = handle.await;
        }

        let mut chan = self.chan.lock().await;
        if let Err(error) = chan.writer.shutdown().await {
            tracing::debug!(%error, "port shutdown failed");
        }
    }

    pub(crate) fn shared_responses(&self) -> &ResponseSet {
        &self.shared.responses
    }

    /// Find the first response line matching the label `command` answers
    /// with and carrying at least `min_params` parameters.
    pub(crate) fn parse_response(
        &self,
        command: &str,
        lines: &[String],
        min_params: usize,
    ) -> AtResult<Vec<String>> {
        self.parse_response_filtered(command, lines, min_params, |_| true)
    }

    /// [`Device::parse_response`] with an additional predicate over the
    /// parsed parameters, for multi-line responses such as `+CGDCONT`.
    pub(crate) fn parse_response_filtered(
        &self,
        command: &str,
        lines: &[String],
        min_params: usize,
        filter: impl Fn(&[String]) -> bool,
    ) -> AtResult<Vec<String>> {
        let label = line::command_label(command).unwrap_or_default();
        for candidate in lines {
            let (candidate_label, params) = line::parse_params(candidate);
            if candidate_label == label && params.len() >= min_params && filter(&params) {
                return Ok(params);
            }
        }
        Err(AtError::UnexpectedResponse {
            expected: label,
            lines: lines.to_vec(),
        })
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.reader).take() {
            handle.abort();
        }
    }
}

/// Reader task: split the stream into lines, classify each, and route it
/// to the URC stream or the response queue.
async fn read_and_dispatch<R: AsyncRead + Unpin>(
    mut lines: LineReader<R>,
    tx: mpsc::Sender<String>,
    shared: Arc<Shared>,
    urc_handler: Option<UrcHandler>,
    retry_delay: Duration,
) {
    let mut urc_tasks = JoinSet::new();
    loop {
        if shared.closed.load(Ordering::SeqCst) {
            break;
        }

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                // End of stream: the port is gone, so the device is closed.
                tracing::debug!("port reached end of stream");
                shared.closed.store(true, Ordering::SeqCst);
                break;
            }
            Err(error) => {
                if shared.closed.load(Ordering::SeqCst) {
                    break;
                }
                tracing::warn!(%error, "port read failed");
                tokio::time::sleep(retry_delay).await;
                continue;
            }
        };

        // Reap finished URC handler tasks.
        while urc_tasks.try_join_next().is_some() {}

        let command = shared.current_command();
        if shared.urcs.is_urc(&line, &command) {
            tracing::debug!(line = %line, "received urc");
            if let Some(handler) = &urc_handler {
                let handler = handler.clone();
                let urc = Urc::parse(&line);
                urc_tasks.spawn(async move { handler(urc) });
            }
            continue;
        }

        match tx.try_send(line) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(line)) => {
                tracing::warn!(line = %line, "response queue full, discarding line");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => break,
        }
    }
    // Aborting outstanding handlers here makes close() a defined
    // cancellation point for URC fan-out.
    urc_tasks.shutdown().await;
}

/// Whether `command` already carries a line terminator (CR, LF, Ctrl-Z or
/// ESC) and must be written as-is.
fn has_terminator(command: &str) -> bool {
    command.ends_with(['\r', '\n', '\u{1A}', '\u{1B}'])
}

fn lock<T>(mutex: &StdMutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Parse an integer parameter the way modems print them; anything
/// unparseable reads as zero.
pub(crate) fn parse_int(value: &str) -> i32 {
    value.trim().parse().unwrap_or(0)
}
