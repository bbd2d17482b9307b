//! Pump Pair
//!
//! Moves envelopes across two independent byte directions:
//!
//! ```text
//!  peer stdout ──► read pump ──► incoming (bounded) ──► consumer loop
//!                      │
//!                      └──────► errors ◄──── write pump ◄── outgoing (unbounded) ◄── send()
//!                                                 │
//!  peer stdin  ◄─────────── exclusive write ◄─────┴────────────────────────────── send_sync()
//! ```
//!
//! The read pump owns the inbound stream. The write pump and `send_sync`
//! share the outbound stream through one async mutex, so whole lines never
//! interleave.

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use super::codec::LineCodec;
use super::config::TransportConfig;
use super::error::TransportError;
use crate::protocol::Envelope;

/// Initial capacity of the read pump's line buffer
const MIN_LINE_CAPACITY: usize = 4096;

/// Transport over the process's own stdin/stdout
pub type StdioTransport = PumpTransport<tokio::io::Stdin, tokio::io::Stdout>;

/// Framed message pump over an inbound and an outbound byte stream
pub struct PumpTransport<R, W> {
    /// Inbound stream, moved into the read pump on start
    reader: Option<R>,
    /// Outbound stream, shared by the write pump and `send_sync`
    writer: Arc<Mutex<W>>,
    codec: LineCodec,

    outgoing_tx: mpsc::UnboundedSender<Envelope>,
    outgoing_rx: Option<mpsc::UnboundedReceiver<Envelope>>,

    incoming_tx: Option<mpsc::Sender<Envelope>>,
    incoming_rx: Option<mpsc::Receiver<Envelope>>,

    error_tx: mpsc::Sender<TransportError>,
    error_rx: Option<mpsc::Receiver<TransportError>>,

    shutdown: watch::Sender<bool>,
    started: bool,
    tasks: Vec<JoinHandle<()>>,
}

impl StdioTransport {
    /// Create a transport reading stdin and writing stdout
    #[must_use]
    pub fn stdio(config: &TransportConfig) -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout(), config)
    }
}

impl<R, W> PumpTransport<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// Create a transport; nothing is read or written until [`start`](Self::start)
    pub fn new(reader: R, writer: W, config: &TransportConfig) -> Self {
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (incoming_tx, incoming_rx) = mpsc::channel(config.incoming_capacity.max(1));
        let (error_tx, error_rx) = mpsc::channel(config.error_capacity.max(1));
        let (shutdown, _) = watch::channel(false);

        Self {
            reader: Some(reader),
            writer: Arc::new(Mutex::new(writer)),
            codec: LineCodec::new(config.max_line_bytes),
            outgoing_tx,
            outgoing_rx: Some(outgoing_rx),
            incoming_tx: Some(incoming_tx),
            incoming_rx: Some(incoming_rx),
            error_tx,
            error_rx: Some(error_rx),
            shutdown,
            started: false,
            tasks: Vec::new(),
        }
    }

    /// Launch the read and write pumps
    ///
    /// Calling this more than once has no effect.
    pub fn start(&mut self) {
        if self.started {
            warn!("Transport already started");
            return;
        }
        let (Some(reader), Some(outgoing_rx), Some(incoming_tx)) = (
            self.reader.take(),
            self.outgoing_rx.take(),
            self.incoming_tx.take(),
        ) else {
            warn!("Transport was stopped before it started");
            return;
        };
        self.started = true;

        let errors = ErrorReporter(self.error_tx.clone());
        self.tasks.push(tokio::spawn(read_pump(
            reader,
            self.codec,
            incoming_tx,
            errors.clone(),
            self.shutdown.subscribe(),
        )));
        self.tasks.push(tokio::spawn(write_pump(
            Arc::clone(&self.writer),
            self.codec,
            outgoing_rx,
            errors,
            self.shutdown.subscribe(),
        )));

        debug!("Transport pumps started");
    }

    /// Queue of decoded inbound envelopes
    ///
    /// Can be taken once. The queue closes when the inbound stream ends or
    /// the transport stops.
    pub fn incoming(&mut self) -> Option<mpsc::Receiver<Envelope>> {
        self.incoming_rx.take()
    }

    /// Queue of transport and decode failures
    ///
    /// Can be taken once. Independent from [`incoming`](Self::incoming): a
    /// consumer that ignores errors never stalls inbound delivery.
    pub fn errors(&mut self) -> Option<mpsc::Receiver<TransportError>> {
        self.error_rx.take()
    }

    /// Queue an envelope for asynchronous delivery
    ///
    /// Never waits on I/O. Once shutdown has begun the envelope is silently
    /// discarded; delivery is best effort.
    pub fn send(&self, envelope: Envelope) {
        if self.is_stopping() {
            trace!(msg_type = %envelope.msg_type, "Discarding send after shutdown");
            return;
        }
        if self.outgoing_tx.send(envelope).is_err() {
            trace!("Write pump gone, discarding send");
        }
    }

    /// Write an envelope immediately, bypassing the outbound queue
    ///
    /// Shares the exclusive write section with the write pump, so the line
    /// is never interleaved with another. Envelopes still queued for the
    /// write pump may be written after this one.
    ///
    /// # Errors
    ///
    /// Returns encode and write failures to the caller instead of the error
    /// queue, and `TransportError::Closed` once shutdown has begun.
    pub async fn send_sync(&self, envelope: &Envelope) -> Result<(), TransportError> {
        if self.is_stopping() {
            return Err(TransportError::Closed);
        }
        write_line(&self.writer, &self.codec, envelope).await
    }

    /// Signal both pumps to stop and close the inbound queue
    pub fn stop(&mut self) {
        if !self.shutdown.send_replace(true) {
            debug!("Transport stopping");
        }
        // Not started yet: the inbound sender is still ours to drop
        self.incoming_tx = None;
    }

    /// Stop and wait for both pumps to exit
    pub async fn shutdown(&mut self) {
        self.stop();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                warn!(error = %e, "Transport pump panicked");
            }
        }
    }

    /// Whether `start` has run
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Whether `stop` has been called
    #[must_use]
    pub fn is_stopping(&self) -> bool {
        *self.shutdown.borrow()
    }
}

impl<R, W> Drop for PumpTransport<R, W> {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
    }
}

/// Non-blocking handle onto the error queue
#[derive(Clone)]
struct ErrorReporter(mpsc::Sender<TransportError>);

impl ErrorReporter {
    fn report(&self, error: TransportError) {
        match self.0.try_send(error) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(error)) => {
                warn!(error = %error, "Error queue full, dropping report");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}

/// Resolves once shutdown is signalled or the transport is dropped
async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

async fn write_line<W>(
    writer: &Mutex<W>,
    codec: &LineCodec,
    envelope: &Envelope,
) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    let line = codec.encode(envelope)?;
    let mut writer = writer.lock().await;
    writer.write_all(&line).await.map_err(TransportError::Write)?;
    writer.flush().await.map_err(TransportError::Write)
}

/// Outcome of reading one bounded line
#[derive(Debug, PartialEq, Eq)]
enum LineRead {
    /// Stream ended with nothing buffered
    Eof,
    /// A line (possibly unterminated at EOF) is in the buffer
    Line,
    /// The line passed the limit; unless terminated, the rest is still unread
    TooLong { len: usize, terminated: bool },
}

/// Read one line, never buffering more than the limit
async fn read_bounded_line<R>(
    reader: &mut R,
    line: &mut Vec<u8>,
    max_line_bytes: usize,
) -> io::Result<LineRead>
where
    R: AsyncBufRead + Unpin,
{
    // Room for a `\r\n` terminator on a line right at the limit
    let limit = max_line_bytes.saturating_add(2);

    loop {
        let (used, done) = {
            let buf = reader.fill_buf().await?;
            if buf.is_empty() {
                return Ok(if line.is_empty() {
                    LineRead::Eof
                } else {
                    LineRead::Line
                });
            }
            let (chunk, terminated) = match buf.iter().position(|b| *b == b'\n') {
                Some(end) => (&buf[..=end], true),
                None => (buf, false),
            };
            if line.len() + chunk.len() > limit {
                let len = line.len() + chunk.len();
                line.clear();
                (chunk.len(), Some(LineRead::TooLong { len, terminated }))
            } else {
                line.extend_from_slice(chunk);
                (chunk.len(), terminated.then_some(LineRead::Line))
            }
        };
        reader.consume(used);

        if let Some(read) = done {
            return Ok(read);
        }
    }
}

/// Discard input through the next `\n` or EOF without buffering it
async fn skip_line<R>(reader: &mut R) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let (used, terminated) = {
            let buf = reader.fill_buf().await?;
            if buf.is_empty() {
                return Ok(());
            }
            match buf.iter().position(|b| *b == b'\n') {
                Some(end) => (end + 1, true),
                None => (buf.len(), false),
            }
        };
        reader.consume(used);
        if terminated {
            return Ok(());
        }
        // A peer streaming without newlines must not starve other tasks
        tokio::task::yield_now().await;
    }
}

async fn read_pump<R>(
    reader: R,
    codec: LineCodec,
    incoming: mpsc::Sender<Envelope>,
    errors: ErrorReporter,
    mut shutdown: watch::Receiver<bool>,
) where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = Vec::with_capacity(MIN_LINE_CAPACITY);

    loop {
        line.clear();
        let read = tokio::select! {
            () = stopped(&mut shutdown) => break,
            read = read_bounded_line(&mut reader, &mut line, codec.max_line_bytes()) => read,
        };

        match read {
            Ok(LineRead::Eof) => {
                debug!("Inbound stream reached EOF");
                break;
            }
            Ok(LineRead::Line) => {}
            Ok(LineRead::TooLong { len, terminated }) => {
                let e = TransportError::LineTooLong {
                    len,
                    max: codec.max_line_bytes(),
                };
                warn!(error = %e, "Skipping oversized line");
                errors.report(e);
                if terminated {
                    continue;
                }
                let skipped = tokio::select! {
                    () = stopped(&mut shutdown) => break,
                    skipped = skip_line(&mut reader) => skipped,
                };
                if let Err(e) = skipped {
                    warn!(error = %e, "Inbound stream failed");
                    errors.report(TransportError::Read(e));
                    break;
                }
                continue;
            }
            Err(e) => {
                warn!(error = %e, "Inbound stream failed");
                errors.report(TransportError::Read(e));
                break;
            }
        }

        match codec.decode(&line) {
            Ok(None) => {}
            Ok(Some(envelope)) => {
                trace!(msg_type = %envelope.msg_type, "Envelope received");
                tokio::select! {
                    () = stopped(&mut shutdown) => break,
                    sent = incoming.send(envelope) => {
                        if sent.is_err() {
                            debug!("Incoming receiver dropped");
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Skipping undecodable line");
                errors.report(e);
            }
        }
    }

    // Dropping `incoming` here closes the queue exactly once
    debug!("Read pump stopped");
}

async fn write_pump<W>(
    writer: Arc<Mutex<W>>,
    codec: LineCodec,
    mut outgoing: mpsc::UnboundedReceiver<Envelope>,
    errors: ErrorReporter,
    mut shutdown: watch::Receiver<bool>,
) where
    W: AsyncWrite + Unpin,
{
    loop {
        let envelope = tokio::select! {
            () = stopped(&mut shutdown) => break,
            next = outgoing.recv() => match next {
                Some(envelope) => envelope,
                None => break,
            },
        };

        if let Err(e) = write_line(&writer, &codec, &envelope).await {
            warn!(error = %e, msg_type = %envelope.msg_type, "Outbound write failed");
            errors.report(e);
        }
    }

    debug!("Write pump stopped");
}
