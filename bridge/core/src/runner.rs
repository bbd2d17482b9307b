//! Consumer Loop
//!
//! [`SessionRunner`] is the one task that touches the [`Session`]. It merges
//! four sources into a single ordered event stream:
//!
//! ```text
//!   incoming envelopes ──► dispatch ──┐
//!   transport errors ──► error_event ─┤
//!   user actions ─────────────────────┼──► Session::update ──► effects
//!   request timeout ──────────────────┘                          │
//!                                          send / send_sync ◄────┤
//!                                          Renderer ◄────────────┘
//! ```
//!
//! The loop never reads or writes the byte streams itself; it only hands
//! envelopes to the transport.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, info_span, trace, warn, Instrument};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::dispatch::dispatch;
use crate::protocol::{ComponentUpdate, Envelope};
use crate::session::{Effect, Session, SessionEvent, UserAction};
use crate::transport::{PumpTransport, TransportError};

/// Surface that presents the session
///
/// Called from the consumer loop after every transition. Implementations
/// must not block; they only read the session.
pub trait Renderer {
    /// Present the current state
    fn render(&mut self, session: &Session);

    /// Receive an opaque component update from the peer
    fn apply_update(&mut self, update: &ComponentUpdate);
}

/// Why the consumer loop ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The user quit while the peer was connected
    Quit,
    /// The peer went away and the user then quit
    PeerClosed,
    /// The local action source closed
    InputClosed,
}

/// Owner of the session and its transport
pub struct SessionRunner<R, W> {
    session: Session,
    transport: PumpTransport<R, W>,
    incoming: Option<mpsc::Receiver<Envelope>>,
    errors: Option<mpsc::Receiver<TransportError>>,
    request_timeout: Option<Duration>,
    session_id: Uuid,
}

/// Map a transport failure to the event the session sees
///
/// Read failures are only logged: the read pump closes the incoming queue
/// right after, which produces the single terminal close event.
#[must_use]
pub fn error_event(error: &TransportError) -> Option<SessionEvent> {
    if error.is_fatal() {
        debug!(error = %error, "Terminal transport error, waiting for close");
        None
    } else if error.is_retryable() {
        Some(SessionEvent::DecodeFailed(error.to_string()))
    } else {
        Some(SessionEvent::SendFailed(error.to_string()))
    }
}

/// Receive from a queue that may already be gone
async fn recv_or_pending<T>(rx: &mut Option<mpsc::Receiver<T>>) -> Option<T> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Instant `timeout` from `now`, or `None` when it cannot be represented
fn deadline_after(now: Instant, timeout: Duration) -> Option<Instant> {
    now.checked_add(timeout)
}

async fn deadline(timer: Option<(u64, Instant)>) -> u64 {
    match timer {
        Some((seq, at)) => {
            sleep_until(at).await;
            seq
        }
        None => std::future::pending().await,
    }
}

impl<R, W> SessionRunner<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// Take ownership of a transport that has not been started
    ///
    /// The transport's queues must not have been taken yet.
    pub fn new(mut transport: PumpTransport<R, W>, config: &SessionConfig) -> Self {
        let incoming = transport.incoming();
        let errors = transport.errors();
        if incoming.is_none() || errors.is_none() {
            warn!("Transport queues already taken; runner will not see them");
        }
        Self {
            session: Session::new(config.busy_policy),
            transport,
            incoming,
            errors,
            request_timeout: config.request_timeout,
            session_id: Uuid::new_v4(),
        }
    }

    /// Session state
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Identifier used in this session's log lines
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Run until the user quits or the action source closes
    ///
    /// Starts the transport and stops it before returning.
    pub async fn run<V>(
        &mut self,
        actions: mpsc::Receiver<UserAction>,
        renderer: &mut V,
    ) -> SessionOutcome
    where
        V: Renderer + ?Sized,
    {
        let span = info_span!("session", id = %self.session_id);
        self.run_loop(actions, renderer).instrument(span).await
    }

    async fn run_loop<V>(
        &mut self,
        mut actions: mpsc::Receiver<UserAction>,
        renderer: &mut V,
    ) -> SessionOutcome
    where
        V: Renderer + ?Sized,
    {
        info!(
            busy_policy = %self.session.busy_policy(),
            request_timeout = ?self.request_timeout,
            "Session started"
        );
        self.transport.start();
        renderer.render(&self.session);

        let mut incoming = self.incoming.take();
        let mut errors = self.errors.take();
        let mut timer: Option<(u64, Instant)> = None;

        let outcome = loop {
            timer = self.rearm(timer);

            let event = tokio::select! {
                msg = recv_or_pending(&mut incoming) => match msg {
                    Some(envelope) => match dispatch(&envelope) {
                        Some(event) => event,
                        None => continue,
                    },
                    None => {
                        incoming = None;
                        SessionEvent::ConnectionClosed
                    }
                },
                err = recv_or_pending(&mut errors) => match err {
                    Some(e) => match error_event(&e) {
                        Some(event) => event,
                        None => continue,
                    },
                    None => {
                        errors = None;
                        continue;
                    }
                },
                action = actions.recv() => match action {
                    Some(action) => SessionEvent::User(action),
                    None => {
                        debug!("User action source closed");
                        break SessionOutcome::InputClosed;
                    }
                },
                seq = deadline(timer) => {
                    timer = None;
                    SessionEvent::RequestTimedOut { seq }
                }
            };

            if self.process(event, renderer).await {
                break if self.session.is_closed() {
                    SessionOutcome::PeerClosed
                } else {
                    SessionOutcome::Quit
                };
            }
        };

        self.transport.shutdown().await;
        info!(outcome = ?outcome, "Session ended");
        outcome
    }

    /// Apply an event and its follow-ups; returns whether to exit
    async fn process<V>(&mut self, event: SessionEvent, renderer: &mut V) -> bool
    where
        V: Renderer + ?Sized,
    {
        let mut exit = false;
        let mut events = VecDeque::from([event]);

        while let Some(event) = events.pop_front() {
            for effect in self.session.update(event) {
                match effect {
                    Effect::Send(msg) => match msg.to_envelope() {
                        Ok(envelope) => self.transport.send(envelope),
                        Err(e) => {
                            warn!(error = %e, msg_type = %msg.msg_type(), "Failed to encode message");
                            events.push_back(SessionEvent::SendFailed(e.to_string()));
                        }
                    },
                    Effect::SendNow(msg) => {
                        let sent = match msg.to_envelope() {
                            Ok(envelope) => self.transport.send_sync(&envelope).await,
                            Err(e) => Err(TransportError::Encode(e)),
                        };
                        if let Err(e) = sent {
                            warn!(error = %e, msg_type = %msg.msg_type(), "Immediate send failed");
                        }
                    }
                    Effect::ForwardUpdate(update) => renderer.apply_update(&update),
                    Effect::Exit => exit = true,
                }
            }
        }

        renderer.render(&self.session);
        exit
    }

    /// Keep the timer in step with the pending request
    fn rearm(&self, timer: Option<(u64, Instant)>) -> Option<(u64, Instant)> {
        let timeout = self.request_timeout?;
        let seq = self.session.pending_seq()?;
        match timer {
            Some((armed, at)) if armed == seq => Some((armed, at)),
            _ => match deadline_after(Instant::now(), timeout) {
                Some(at) => {
                    debug!(seq, timeout = ?timeout, "Request timer armed");
                    Some((seq, at))
                }
                None => {
                    trace!(seq, timeout = ?timeout, "Timeout past the clock's range, never fires");
                    None
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_event_mapping() {
        let decode = TransportError::LineTooLong { len: 10, max: 5 };
        assert!(matches!(
            error_event(&decode),
            Some(SessionEvent::DecodeFailed(_))
        ));

        let write = TransportError::Write(std::io::Error::from(std::io::ErrorKind::BrokenPipe));
        assert!(matches!(error_event(&write), Some(SessionEvent::SendFailed(_))));

        let encode = TransportError::Encode(
            serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
        );
        assert!(matches!(error_event(&encode), Some(SessionEvent::SendFailed(_))));

        let read = TransportError::Read(std::io::Error::from(std::io::ErrorKind::UnexpectedEof));
        assert_eq!(error_event(&read), None);
        assert_eq!(error_event(&TransportError::Closed), None);
    }

    #[test]
    fn test_deadline_after_saturates_to_never() {
        let now = Instant::now();
        assert_eq!(
            deadline_after(now, Duration::from_secs(5)),
            Some(now + Duration::from_secs(5))
        );
        assert_eq!(deadline_after(now, Duration::from_secs(u64::MAX)), None);
        assert_eq!(deadline_after(now, Duration::MAX), None);
    }
}
