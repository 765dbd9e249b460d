//! Session flows over the in-memory transport.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tokio::time::{timeout, Duration};

use minarai_client::transport::{memory_pair, MemoryRemote};
use minarai_client::{
    Attachment, ClientOptions, SendOptions, SessionClient, UploadForm, UploadOptions, Uploader,
    WireEvent,
};
use minarai_core::error::{MinaraiError, Result};
use minarai_core::protocol::{LogsQuery, SessionEvent, UploadResponse};

const WAIT: Duration = Duration::from_secs(2);

fn options() -> ClientOptions {
    ClientOptions::new("ws://realtime.test", "app-1")
        .with_client_id("c0")
        .with_user_id("u0")
        .with_device_id("d0")
}

fn started(opts: ClientOptions) -> (SessionClient, MemoryRemote, broadcast::Receiver<SessionEvent>) {
    let (factory, remote) = memory_pair();
    let client = SessionClient::new(opts, &factory).unwrap();
    let rx = client.subscribe();
    client.initialize().unwrap();
    (client, remote, rx)
}

async fn next_event(rx: &mut broadcast::Receiver<SessionEvent>) -> SessionEvent {
    timeout(WAIT, rx.recv()).await.expect("event timeout").unwrap()
}

async fn next_emitted(remote: &mut MemoryRemote) -> WireEvent {
    timeout(WAIT, remote.next_emitted())
        .await
        .expect("emit timeout")
        .expect("transport closed")
}

fn joined_payload() -> Value {
    json!({ "applicationId": "A", "clientId": "C", "userId": "U", "deviceId": "D" })
}

#[test]
fn construction_requires_url_and_application() {
    let (factory, _remote) = memory_pair();
    let err = SessionClient::new(ClientOptions::new("ws://h", ""), &factory)
        .err()
        .expect("must fail");
    assert_eq!(err.code().as_str(), "INVALID_ARGUMENT");

    let err = SessionClient::new(ClientOptions::new("", "app"), &factory)
        .err()
        .expect("must fail");
    assert_eq!(err.code().as_str(), "INVALID_ARGUMENT");
}

#[test]
fn construction_connects_eagerly_with_defaults() {
    let (factory, remote) = memory_pair();
    let client = SessionClient::new(ClientOptions::new("ws://realtime.test", "app"), &factory).unwrap();

    assert_eq!(remote.connected_url().as_deref(), Some("ws://realtime.test"));
    assert_eq!(client.lang(), "ja");
    assert!(client.upload_endpoint().is_none());

    let id = client.identity();
    assert_eq!(id.application_id, "app");
    assert!(id.client_id.is_none());
    assert!(id.device_id.starts_with("device_id_app_"));
}

#[tokio::test]
async fn connect_republishes_then_joins_with_constructor_identity() {
    let (_client, mut remote, mut rx) = started(options());

    remote.push("connect", None).unwrap();
    assert_eq!(next_event(&mut rx).await, SessionEvent::Connect);

    let join = next_emitted(&mut remote).await;
    assert_eq!(join.name, "join-as-client");
    assert_eq!(
        join.payload,
        Some(json!({ "applicationId": "app-1", "clientId": "c0", "userId": "u0", "deviceId": "d0" }))
    );
}

#[tokio::test]
async fn joined_identity_is_used_verbatim_afterwards() {
    let (client, mut remote, mut rx) = started(options());

    remote.push("joined", Some(joined_payload())).unwrap();
    assert_eq!(next_event(&mut rx).await, SessionEvent::Joined(joined_payload()));

    client.send("hi", SendOptions::default()).unwrap();
    client.send_command("open", json!({ "page": 1 })).unwrap();

    for expected_event in ["message", "command"] {
        let ev = next_emitted(&mut remote).await;
        assert_eq!(ev.name, expected_event);
        let head = &ev.payload.as_ref().unwrap()["head"];
        assert_eq!(head["applicationId"], "A");
        assert_eq!(head["clientId"], "C");
        assert_eq!(head["userId"], "U");
        assert_eq!(head["deviceId"], "D");
    }

    // reconnect handshake carries the reconciled identity
    remote.push("connect", None).unwrap();
    assert_eq!(next_event(&mut rx).await, SessionEvent::Connect);
    let join = next_emitted(&mut remote).await;
    assert_eq!(join.payload, Some(joined_payload()));
}

#[tokio::test]
async fn send_defaults() {
    let (client, mut remote, _rx) = started(options());

    client.send("hi", SendOptions::default()).unwrap();
    let ev = next_emitted(&mut remote).await;
    assert_eq!(ev.name, "message");

    let env = ev.payload.unwrap();
    assert_eq!(env["head"]["lang"], "ja-JP");
    assert_eq!(env["body"], json!({ "message": "hi", "position": {}, "extra": {} }));

    let ts = env["head"]["timestampUnixTime"].as_u64().unwrap();
    assert_eq!(env["id"], format!("app-1c0u0d0-{ts}"));
}

#[tokio::test]
async fn send_passes_options_through() {
    let (client, mut remote, _rx) = started(options());

    let opts = SendOptions {
        lang: Some("en-US".into()),
        position: Some(json!({ "lat": 1.5 })),
        extra: Some(json!({ "k": "v" })),
    };
    client.send("hello", opts).unwrap();
    let env = next_emitted(&mut remote).await.payload.unwrap();
    assert_eq!(env["head"]["lang"], "en-US");
    assert_eq!(env["body"]["position"], json!({ "lat": 1.5 }));
    assert_eq!(env["body"]["extra"], json!({ "k": "v" }));
}

#[tokio::test]
async fn command_logs_and_legacy_system_command() {
    let (client, mut remote, _rx) = started(options());

    #[allow(deprecated)]
    let sent = client.send_system_command("reset", json!({ "hard": true }));
    sent.unwrap();
    let ev = next_emitted(&mut remote).await;
    assert_eq!(ev.name, "system-command");
    let env = ev.payload.unwrap();
    assert!(env["id"].as_str().unwrap().ends_with("-system"));
    assert_eq!(env["body"], json!({ "message": { "command": "reset", "payload": { "hard": true } } }));

    client
        .get_logs(LogsQuery { lt_date: Some("2024-05-01T00:00:00Z".into()), limit: Some(10) })
        .unwrap();
    let ev = next_emitted(&mut remote).await;
    assert_eq!(ev.name, "logs");
    let env = ev.payload.unwrap();
    assert!(env["id"].as_str().unwrap().ends_with("-logs"));
    assert_eq!(env["body"], json!({ "ltDate": "2024-05-01T00:00:00Z", "limit": 10 }));
}

#[tokio::test]
async fn force_disconnect_emits_once_and_keeps_identity() {
    let (client, mut remote, _rx) = started(options());
    let before = client.identity();

    client.force_disconnect().unwrap();
    let ev = next_emitted(&mut remote).await;
    assert_eq!(ev, WireEvent::new("force-disconnect", None));
    assert!(remote.try_next_emitted().is_none());
    assert_eq!(client.identity(), before);
}

#[tokio::test]
async fn disconnect_becomes_exactly_one_disconnected() {
    let (client, remote, mut rx) = started(options());
    let before = client.identity();

    remote.push("disconnect", None).unwrap();
    remote.push("sync", Some(json!({ "marker": true }))).unwrap();

    assert_eq!(next_event(&mut rx).await, SessionEvent::Disconnected);
    assert_eq!(next_event(&mut rx).await, SessionEvent::Sync(json!({ "marker": true })));
    assert_eq!(client.identity(), before);
}

#[tokio::test]
async fn data_events_republish_unchanged() {
    let (_client, remote, mut rx) = started(options());

    let names = [
        "sync",
        "sync-system-command",
        "sync-command",
        "message",
        "operator-command",
        "system-message",
        "logs",
    ];
    for (i, name) in names.iter().enumerate() {
        remote.push(name, Some(json!({ "n": i }))).unwrap();
    }
    for (i, name) in names.iter().enumerate() {
        let ev = next_event(&mut rx).await;
        assert_eq!(ev.name(), *name);
        assert_eq!(ev.payload(), Some(&json!({ "n": i })));
    }
}

#[tokio::test]
async fn unknown_events_are_skipped() {
    let (_client, remote, mut rx) = started(options());

    remote.push("pong", Some(json!(1))).unwrap();
    remote.push("message", Some(json!("after"))).unwrap();
    assert_eq!(next_event(&mut rx).await, SessionEvent::Message(json!("after")));
}

#[tokio::test]
async fn events_before_initialize_are_buffered() {
    let (factory, remote) = memory_pair();
    let client = SessionClient::new(options(), &factory).unwrap();

    remote.push("connect", None).unwrap();
    remote.push("message", Some(json!("early"))).unwrap();

    let mut rx = client.subscribe();
    client.initialize().unwrap();
    assert_eq!(next_event(&mut rx).await, SessionEvent::Connect);
    assert_eq!(next_event(&mut rx).await, SessionEvent::Message(json!("early")));
}

#[tokio::test]
async fn initialize_is_call_once() {
    let (client, _remote, _rx) = started(options());
    let err = client.initialize().unwrap_err();
    assert_eq!(err.code().as_str(), "ALREADY_INITIALIZED");
}

#[tokio::test]
async fn malformed_joined_keeps_identity_but_is_republished() {
    let (client, remote, mut rx) = started(options());
    let before = client.identity();

    remote.push("joined", Some(json!("welcome"))).unwrap();
    assert_eq!(next_event(&mut rx).await, SessionEvent::Joined(json!("welcome")));
    assert_eq!(client.identity(), before);

    let bad = json!({ "applicationId": "A", "clientId": { "id": 1 }, "deviceId": "D" });
    remote.push("joined", Some(bad.clone())).unwrap();
    assert_eq!(next_event(&mut rx).await, SessionEvent::Joined(bad));
    assert_eq!(client.identity(), before);
}

#[tokio::test]
async fn partial_joined_updates_session_ids_and_keeps_device() {
    let (client, mut remote, mut rx) = started(options());

    let ack = json!({ "applicationId": "A", "clientId": "C2", "userId": "U2" });
    remote.push("joined", Some(ack.clone())).unwrap();
    assert_eq!(next_event(&mut rx).await, SessionEvent::Joined(ack));

    client.send("hi", SendOptions::default()).unwrap();
    let ev = next_emitted(&mut remote).await;
    let head = &ev.payload.as_ref().unwrap()["head"];
    assert_eq!(head["applicationId"], "A");
    assert_eq!(head["clientId"], "C2");
    assert_eq!(head["userId"], "U2");
    assert_eq!(head["deviceId"], "d0");

    // an ack without a user id clears it
    remote.push("joined", Some(json!({ "clientId": "C3" }))).unwrap();
    next_event(&mut rx).await;
    let id = client.identity();
    assert_eq!(id.application_id, "A");
    assert_eq!(id.client_id.as_deref(), Some("C3"));
    assert!(id.user_id.is_none());
    assert_eq!(id.device_id, "d0");
}

#[tokio::test]
async fn dropping_the_client_closes_the_connection() {
    let (client, mut remote, mut rx) = started(options());
    let mut lossless = client.subscribe_unbounded();

    drop(client);
    assert!(timeout(WAIT, remote.next_emitted()).await.unwrap().is_none());
    assert!(matches!(
        timeout(WAIT, rx.recv()).await.unwrap(),
        Err(broadcast::error::RecvError::Closed)
    ));
    assert!(timeout(WAIT, lossless.recv()).await.unwrap().is_none());
}

#[tokio::test]
async fn bounded_subscriber_lags_while_unbounded_sees_everything() {
    let (factory, remote) = memory_pair();
    let client = SessionClient::new(options().with_event_capacity(16), &factory).unwrap();
    let mut bounded = client.subscribe();
    let mut lossless = client.subscribe_unbounded();
    client.initialize().unwrap();

    for i in 0..300 {
        remote.push("sync", Some(json!({ "seq": i }))).unwrap();
    }

    for i in 0..300 {
        let ev = timeout(WAIT, lossless.recv()).await.unwrap().unwrap();
        assert_eq!(ev, SessionEvent::Sync(json!({ "seq": i })));
    }

    // the bounded stream kept only the newest 16
    match bounded.recv().await {
        Err(broadcast::error::RecvError::Lagged(n)) => assert_eq!(n, 284),
        other => panic!("expected lag, got {other:?}"),
    }
    assert_eq!(next_event(&mut bounded).await, SessionEvent::Sync(json!({ "seq": 284 })));
}

#[tokio::test]
async fn close_resets_session_ids_and_refuses_sends() {
    let (client, mut remote, _rx) = started(options());

    client.close();
    let id = client.identity();
    assert_eq!(id.application_id, "app-1");
    assert_eq!(id.device_id, "d0");
    assert!(id.client_id.is_none());
    assert!(id.user_id.is_none());

    let err = client.send("late", SendOptions::default()).unwrap_err();
    assert!(matches!(err, MinaraiError::Closed));
    assert!(timeout(WAIT, remote.next_emitted()).await.unwrap().is_none());
}

/// Uploader double recording the form and replaying a canned result.
struct StubUploader {
    reply: Mutex<Option<Result<UploadResponse>>>,
    seen: Mutex<Option<(String, UploadForm)>>,
}

impl StubUploader {
    fn new(reply: Result<UploadResponse>) -> Arc<Self> {
        Arc::new(Self {
            reply: Mutex::new(Some(reply)),
            seen: Mutex::new(None),
        })
    }
}

#[async_trait]
impl Uploader for StubUploader {
    async fn post(&self, endpoint: &str, form: UploadForm) -> Result<UploadResponse> {
        *self.seen.lock().unwrap() = Some((endpoint.to_string(), form));
        self.reply.lock().unwrap().take().unwrap()
    }
}

fn upload_client(stub: Arc<StubUploader>) -> (SessionClient, MemoryRemote, broadcast::Receiver<SessionEvent>) {
    let (client, remote, rx) = started(options().with_upload_base_url("http://files.test/api/"));
    (client.with_uploader(stub), remote, rx)
}

#[tokio::test]
async fn upload_without_endpoint_fails_fast() {
    let (client, _remote, _rx) = started(options());
    let err = client
        .upload_attachment(Attachment::new("a.png", vec![0u8]), UploadOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.code().as_str(), "MISSING_CAPABILITY");
}

#[tokio::test]
async fn upload_ok_appends_identity_query() {
    let stub = StubUploader::new(Ok(UploadResponse {
        message: Some("ok".into()),
        url: Some("http://x/y".into()),
    }));
    let (client, remote, mut rx) = upload_client(Arc::clone(&stub));

    remote
        .push("joined", Some(json!({ "applicationId": "A", "userId": "U", "deviceId": "D" })))
        .unwrap();
    next_event(&mut rx).await;

    let out = client
        .upload_attachment(
            Attachment::new("a.png", vec![1u8, 2]).with_content_type("image/png"),
            UploadOptions { extra: Some(json!({ "tag": "t" })) },
        )
        .await
        .unwrap();
    assert_eq!(
        out.to_json(),
        json!({ "ok": true, "result": { "url": "http://x/y?applicationId=A&userId=U" } })
    );

    let (endpoint, form) = stub.seen.lock().unwrap().take().unwrap();
    assert_eq!(endpoint, "http://files.test/api/upload-image");
    assert_eq!(form.field("applicationId"), Some("A"));
    assert_eq!(form.field("clientId"), Some(""));
    assert_eq!(form.field("params"), Some(r#"{"tag":"t"}"#));
    assert_eq!(form.file.file_name, "a.png");
}

#[tokio::test]
async fn upload_soft_failures_are_values() {
    let stub = StubUploader::new(Ok(UploadResponse { message: Some("ok".into()), url: None }));
    let (client, _remote, _rx) = upload_client(stub);
    let out = client
        .upload_attachment(Attachment::new("a.png", vec![1u8]), UploadOptions::default())
        .await
        .unwrap();
    let v = out.to_json();
    assert_eq!(v, json!({ "error": "url does not exist" }));
    assert!(v.get("ok").is_none());

    let stub = StubUploader::new(Err(MinaraiError::Transport("connection refused".into())));
    let (client, _remote, _rx) = upload_client(stub);
    let out = client
        .upload_attachment(Attachment::new("a.png", vec![1u8]), UploadOptions::default())
        .await
        .unwrap();
    let v = out.to_json();
    assert!(v["err"].as_str().unwrap().contains("connection refused"));
    assert!(v.get("ok").is_none());
}
