//! End-to-end tests: a scripted peer on one side of in-memory pipes, the
//! real transport and consumer loop on the other.

use std::time::Duration;

use agentui_core::protocol::ComponentUpdate;
use agentui_core::{
    BusyPolicy, FormAction, PumpTransport, Renderer, Session, SessionConfig, SessionOutcome,
    SessionRunner, TransportConfig, UiMode, UserAction,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::io::{duplex, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

type Runner = SessionRunner<DuplexStream, DuplexStream>;

/// Renderer that reports every mode and update it sees
struct RecordingRenderer {
    modes: mpsc::UnboundedSender<UiMode>,
    updates: mpsc::UnboundedSender<ComponentUpdate>,
    log_len: usize,
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, session: &Session) {
        self.log_len = session.log().len();
        let _ = self.modes.send(session.mode());
    }

    fn apply_update(&mut self, update: &ComponentUpdate) {
        let _ = self.updates.send(update.clone());
    }
}

struct Peer {
    /// What the peer writes (our inbound)
    out: DuplexStream,
    /// What the peer reads (our outbound)
    input: BufReader<DuplexStream>,
}

impl Peer {
    async fn say(&mut self, line: &str) {
        self.out.write_all(line.as_bytes()).await.unwrap();
        self.out.write_all(b"\n").await.unwrap();
    }

    async fn hear(&mut self) -> Value {
        let mut line = String::new();
        timeout(WAIT, self.input.read_line(&mut line))
            .await
            .expect("peer timed out waiting for a line")
            .unwrap();
        serde_json::from_str(&line).unwrap()
    }
}

struct Harness {
    peer: Peer,
    actions: mpsc::Sender<UserAction>,
    modes: mpsc::UnboundedReceiver<UiMode>,
    updates: mpsc::UnboundedReceiver<ComponentUpdate>,
    task: JoinHandle<(SessionOutcome, Runner, RecordingRenderer)>,
}

impl Harness {
    fn start(session: SessionConfig) -> Self {
        let (peer_out, our_in) = duplex(64 * 1024);
        let (our_out, peer_in) = duplex(64 * 1024);
        let transport = PumpTransport::new(our_in, our_out, &TransportConfig::default());
        let mut runner = SessionRunner::new(transport, &session);

        let (actions, actions_rx) = mpsc::channel(16);
        let (modes_tx, modes) = mpsc::unbounded_channel();
        let (updates_tx, updates) = mpsc::unbounded_channel();
        let mut renderer = RecordingRenderer {
            modes: modes_tx,
            updates: updates_tx,
            log_len: 0,
        };

        let task = tokio::spawn(async move {
            let outcome = runner.run(actions_rx, &mut renderer).await;
            (outcome, runner, renderer)
        });

        Self {
            peer: Peer {
                out: peer_out,
                input: BufReader::new(peer_in),
            },
            actions,
            modes,
            updates,
            task,
        }
    }

    async fn act(&self, action: UserAction) {
        self.actions.send(action).await.unwrap();
    }

    async fn wait_for_mode(&mut self, mode: UiMode) {
        timeout(WAIT, async {
            while let Some(seen) = self.modes.recv().await {
                if seen == mode {
                    return;
                }
            }
            panic!("renderer gone before reaching {mode:?}");
        })
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {mode:?}"));
    }

    async fn finish(self) -> (SessionOutcome, Runner, RecordingRenderer, Peer) {
        let (outcome, runner, renderer) = timeout(WAIT, self.task).await.unwrap().unwrap();
        (outcome, runner, renderer, self.peer)
    }
}

#[tokio::test]
async fn test_form_roundtrip_echoes_correlation_id() {
    let mut h = Harness::start(SessionConfig::default());

    h.peer
        .say(r#"{"type":"form","id":"abc123","payload":{"fields":[{"name":"env","label":"Env","type":"select","options":["dev","prod"],"default":"prod"}]}}"#)
        .await;
    h.wait_for_mode(UiMode::AwaitingForm).await;

    h.act(UserAction::Form(FormAction::Submit)).await;
    assert_eq!(
        h.peer.hear().await,
        json!({"type": "form_response", "id": "abc123", "payload": {"values": {"env": "prod"}}})
    );
    h.wait_for_mode(UiMode::Active).await;

    h.act(UserAction::Quit).await;
    assert_eq!(h.peer.hear().await, json!({"type": "quit"}));

    let (outcome, runner, _, _) = h.finish().await;
    assert_eq!(outcome, SessionOutcome::Quit);
    assert!(runner.session().pending().is_none());
}

#[tokio::test]
async fn test_streamed_reply_and_done() {
    let mut h = Harness::start(SessionConfig::default());

    h.act(UserAction::SubmitInput("hello".into())).await;
    assert_eq!(
        h.peer.hear().await,
        json!({"type": "input", "payload": {"content": "hello"}})
    );

    h.peer
        .say(r#"{"type":"text","payload":{"content":"Hel"}}"#)
        .await;
    h.peer
        .say(r#"{"type":"text","payload":{"content":"lo","done":true}}"#)
        .await;
    h.peer
        .say(r#"{"type":"done","payload":{"summary":"All set"}}"#)
        .await;
    h.peer.say(r#"{"type":"alert","payload":{"message":"hi"}}"#).await;
    // Inbound order is preserved, so once the confirm shows everything before it landed
    h.peer
        .say(r#"{"type":"confirm","id":"sync","payload":{"message":"ok?"}}"#)
        .await;
    h.wait_for_mode(UiMode::AwaitingConfirm).await;

    h.act(UserAction::Quit).await;
    let (_, runner, renderer, _) = h.finish().await;
    let session = runner.session();
    assert!(session.overlay().alert.is_some());
    assert_eq!(session.overlay().status, "All set");
    assert!(!session.overlay().streaming);
    let contents: Vec<&str> = session
        .log()
        .entries()
        .iter()
        .map(|e| e.content.as_str())
        .collect();
    assert_eq!(contents, vec!["hello", "Hello"]);
    assert_eq!(renderer.log_len, 2);
}

#[tokio::test]
async fn test_eof_closes_session_once() {
    let mut h = Harness::start(SessionConfig::default());
    h.peer.say(r#"{"type":"text","payload":{"content":"bye","done":true}}"#).await;
    h.peer.out.shutdown().await.unwrap();

    h.wait_for_mode(UiMode::Closed).await;
    h.act(UserAction::SubmitInput("anyone?".into())).await;
    h.act(UserAction::Quit).await;

    let (outcome, runner, _, mut peer) = h.finish().await;
    assert_eq!(outcome, SessionOutcome::PeerClosed);

    let notices = runner
        .session()
        .log()
        .entries()
        .iter()
        .filter(|e| e.content == "Connection closed")
        .count();
    assert_eq!(notices, 1);

    // Nothing was written after the close: not the input, not a quit
    drop(runner);
    let mut rest = String::new();
    timeout(WAIT, peer.input.read_to_string(&mut rest))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(rest, "");
}

#[tokio::test]
async fn test_malformed_line_is_recoverable() {
    let mut h = Harness::start(SessionConfig::default());

    h.peer.say("{this is not json").await;
    h.wait_for_mode(UiMode::ErrorDisplay).await;

    h.peer.say(r#"{"type":"confirm","id":"c1","payload":{"message":"Go?"}}"#).await;
    h.act(UserAction::Dismiss).await;
    h.wait_for_mode(UiMode::AwaitingConfirm).await;

    h.act(UserAction::Confirm(agentui_core::ConfirmAction::Accept))
        .await;
    assert_eq!(
        h.peer.hear().await,
        json!({"type": "confirm_response", "id": "c1", "payload": {"confirmed": true}})
    );

    h.act(UserAction::Quit).await;
    let (outcome, runner, _, _) = h.finish().await;
    assert_eq!(outcome, SessionOutcome::Quit);
    assert!(runner.session().error().is_none());
}

#[tokio::test]
async fn test_unknown_types_ignored_and_updates_forwarded() {
    let mut h = Harness::start(SessionConfig::default());

    h.peer.say(r#"{"type":"hologram","payload":{"x":1}}"#).await;
    h.peer
        .say(r#"{"type":"update","payload":{"id":"bar","percent":40}}"#)
        .await;

    let update = timeout(WAIT, h.updates.recv()).await.unwrap().unwrap();
    assert_eq!(update.target, "bar");
    assert_eq!(update.fields.get("percent"), Some(&json!(40)));

    h.act(UserAction::Quit).await;
    let (_, runner, _, _) = h.finish().await;
    assert_eq!(runner.session().mode(), UiMode::Active);
    assert!(runner.session().error().is_none());
}

#[tokio::test]
async fn test_reject_policy_answers_second_request_busy() {
    let mut h = Harness::start(SessionConfig {
        busy_policy: BusyPolicy::Reject,
        request_timeout: None,
    });

    h.peer
        .say(r#"{"type":"select","id":"A","payload":{"label":"Pick","options":["x"]}}"#)
        .await;
    h.peer
        .say(r#"{"type":"select","id":"B","payload":{"label":"Pick","options":["y"]}}"#)
        .await;

    assert_eq!(
        h.peer.hear().await,
        json!({"type": "select_response", "id": "B", "payload": {"value": "", "busy": true}})
    );
    h.wait_for_mode(UiMode::AwaitingSelect).await;

    h.act(UserAction::Select(agentui_core::SelectAction::Choose))
        .await;
    assert_eq!(
        h.peer.hear().await,
        json!({"type": "select_response", "id": "A", "payload": {"value": "x"}})
    );

    h.act(UserAction::Quit).await;
    h.finish().await;
}

#[tokio::test]
async fn test_request_timeout_answers_peer() {
    let mut h = Harness::start(SessionConfig {
        busy_policy: BusyPolicy::Queue,
        request_timeout: Some(Duration::from_millis(50)),
    });

    h.peer
        .say(r#"{"type":"confirm","id":"slow","payload":{"message":"Still there?"}}"#)
        .await;

    assert_eq!(
        h.peer.hear().await,
        json!({"type": "confirm_response", "id": "slow", "payload": {"confirmed": false, "timed_out": true}})
    );
    h.wait_for_mode(UiMode::ErrorDisplay).await;

    h.act(UserAction::Quit).await;
    let (outcome, runner, _, _) = h.finish().await;
    assert_eq!(outcome, SessionOutcome::Quit);
    assert!(runner.session().pending().is_none());
}

#[tokio::test]
async fn test_unrepresentable_timeout_never_fires() {
    let mut h = Harness::start(SessionConfig {
        busy_policy: BusyPolicy::Queue,
        request_timeout: Some(Duration::from_secs(u64::MAX)),
    });

    h.peer
        .say(r#"{"type":"confirm","id":"far","payload":{"message":"Proceed?"}}"#)
        .await;
    h.wait_for_mode(UiMode::AwaitingConfirm).await;

    h.act(UserAction::Confirm(agentui_core::ConfirmAction::Yes))
        .await;
    assert_eq!(
        h.peer.hear().await,
        json!({"type": "confirm_response", "id": "far", "payload": {"confirmed": true}})
    );

    h.act(UserAction::Quit).await;
    let (outcome, runner, _, _) = h.finish().await;
    assert_eq!(outcome, SessionOutcome::Quit);
    assert!(runner.session().error().is_none());
}

#[tokio::test]
async fn test_closing_action_source_ends_loop() {
    let h = Harness::start(SessionConfig::default());
    let Harness { actions, task, .. } = h;
    drop(actions);
    let (outcome, _, _) = timeout(WAIT, task).await.unwrap().unwrap();
    assert_eq!(outcome, SessionOutcome::InputClosed);
}
