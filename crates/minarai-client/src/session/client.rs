use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde_json::{json, Value};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use minarai_core::error::{MinaraiError, Result};
use minarai_core::protocol::{
    now_millis, Body, Envelope, Identity, LogsQuery, SessionEvent, SystemCommand, UploadOutcome,
};

use crate::log::Logger;
use crate::session::inbound;
use crate::session::options::{ClientOptions, SendOptions, DEFAULT_LANG, DEFAULT_SEND_LANG};
use crate::transport::{Transport, TransportFactory, WireEvent};
use crate::upload::{upload_endpoint, Attachment, HttpUploader, UploadForm, UploadOptions, Uploader};

/// Default number of local events a `subscribe` receiver may fall behind by
/// before it starts lagging.
pub const EVENT_CAPACITY: usize = 256;

/// State shared between the client handle and its inbound task.
pub(crate) struct Shared {
    identity: RwLock<Identity>,
    transport: RwLock<Option<Arc<dyn Transport>>>,
    events: broadcast::Sender<SessionEvent>,
    sinks: Mutex<Vec<mpsc::UnboundedSender<SessionEvent>>>,
    pub(crate) log: Logger,
}

impl Shared {
    pub(crate) fn identity(&self) -> Identity {
        self.identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply a join acknowledgment to the held identity. A payload that is
    /// not an identity leaves the current one in place.
    pub(crate) fn reconcile(&self, payload: &Value) {
        let result = self
            .identity
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .apply_join_ack(payload);
        if let Err(e) = result {
            self.log.warn(&format!("joined payload ignored: {e}"));
        }
    }

    pub(crate) fn emit(&self, event: &str, payload: Option<Value>) -> Result<()> {
        let handle = self
            .transport
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(MinaraiError::Closed)?;
        handle.emit(event, payload)
    }

    /// Handshake with whatever identity is held right now.
    pub(crate) fn join_as_client(&self) {
        let result = self
            .identity()
            .join_request()
            .and_then(|req| self.emit("join-as-client", Some(req)));
        if let Err(e) = result {
            self.log.warn(&format!("join-as-client not sent: {e}"));
        }
    }

    pub(crate) fn publish(&self, ev: SessionEvent) {
        // no subscribers is fine
        let _ = self.events.send(ev.clone());
        self.sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|tx| tx.send(ev.clone()).is_ok());
    }

    fn take_transport(&self) -> Option<Arc<dyn Transport>> {
        self.transport
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Client-side session over one realtime connection.
pub struct SessionClient {
    shared: Arc<Shared>,
    inbound: Mutex<Option<mpsc::UnboundedReceiver<WireEvent>>>,
    task: Mutex<Option<JoinHandle<()>>>,
    upload_endpoint: Option<String>,
    uploader: Arc<dyn Uploader>,
    lang: String,
}

impl SessionClient {
    /// Validate options and connect. The connection is opened here, not in
    /// `initialize`; inbound events wait in the connection's queue.
    pub fn new(options: ClientOptions, factory: &dyn TransportFactory) -> Result<Self> {
        if options.realtime_url.trim().is_empty() || options.application_id.trim().is_empty() {
            return Err(MinaraiError::InvalidArgument(
                "options must contain realtime_url and application_id".into(),
            ));
        }

        let identity = Identity::new(
            options.application_id,
            options.client_id,
            options.user_id,
            options.device_id,
            now_millis(),
        );
        let upload_endpoint = options
            .upload_base_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .map(upload_endpoint);
        let lang = options
            .lang
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_LANG.to_string());
        let log = Logger::new(options.debug, options.silent);

        let conn = factory.connect(&options.realtime_url, &options.transport)?;
        log.debug(&format!("connecting to {}", options.realtime_url));

        let capacity = options.event_capacity.unwrap_or(EVENT_CAPACITY).max(1);
        let (events, _) = broadcast::channel(capacity);

        Ok(Self {
            shared: Arc::new(Shared {
                identity: RwLock::new(identity),
                transport: RwLock::new(Some(conn.handle)),
                events,
                sinks: Mutex::new(Vec::new()),
                log,
            }),
            inbound: Mutex::new(Some(conn.inbound)),
            task: Mutex::new(None),
            upload_endpoint,
            uploader: Arc::new(HttpUploader::new()),
            lang,
        })
    }

    /// Replace the HTTP uploader.
    pub fn with_uploader(mut self, uploader: Arc<dyn Uploader>) -> Self {
        self.uploader = uploader;
        self
    }

    /// Start republishing transport events. Call once, inside a tokio runtime.
    pub fn initialize(&self) -> Result<()> {
        let rx = self
            .inbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(MinaraiError::AlreadyInitialized)?;
        let rt = tokio::runtime::Handle::try_current()
            .map_err(|e| MinaraiError::Internal(format!("initialize needs a tokio runtime: {e}")))?;
        let task = rt.spawn(inbound::run(Arc::clone(&self.shared), rx));
        *self.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
        Ok(())
    }

    /// Bounded local event stream. Subscribe before `initialize` to see every
    /// event.
    ///
    /// A receiver more than `event_capacity` events behind loses the oldest
    /// ones and gets `RecvError::Lagged(n)` on its next `recv`. Use
    /// `subscribe_unbounded` when every event must be seen.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }

    /// Lossless local event stream. Events queue without limit until read;
    /// the stream ends when the client is dropped.
    pub fn subscribe_unbounded(&self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.shared
            .sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Snapshot of the identity used for the next envelope.
    pub fn identity(&self) -> Identity {
        self.shared.identity()
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn upload_endpoint(&self) -> Option<&str> {
        self.upload_endpoint.as_deref()
    }

    /// Send a chat message. Fire and forget.
    pub fn send(&self, text: impl Into<String>, options: SendOptions) -> Result<()> {
        let lang = options
            .lang
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_SEND_LANG.to_string());
        let body = Body::Message {
            message: text.into(),
            position: or_empty_object(options.position),
            extra: or_empty_object(options.extra),
        };
        self.dispatch("send", Some(lang), body)
    }

    pub fn send_command(&self, name: impl Into<String>, extra: Value) -> Result<()> {
        let body = Body::Command {
            name: name.into(),
            extra,
        };
        self.dispatch("send-command", None, body)
    }

    #[deprecated(note = "use `send_command` instead")]
    pub fn send_system_command(&self, command: impl Into<String>, payload: Value) -> Result<()> {
        self.shared
            .log
            .warn("send_system_command is deprecated. Please use send_command instead.");
        let body = Body::SystemCommand {
            message: SystemCommand {
                command: command.into(),
                payload,
            },
        };
        self.dispatch("send-system-command", None, body)
    }

    /// Ask the server for past logs; they arrive as a `logs` event.
    pub fn get_logs(&self, query: LogsQuery) -> Result<()> {
        self.dispatch("logs", None, Body::Logs(query))
    }

    /// Ask the server to drop this connection. Identity is left as is.
    pub fn force_disconnect(&self) -> Result<()> {
        self.shared.log.obj("force-disconnect", None);
        self.shared.emit("force-disconnect", None)
    }

    /// Upload an attachment for the current identity.
    ///
    /// Returns `Err` only when no upload base url was configured. Every
    /// other failure is reported through the outcome.
    pub async fn upload_attachment(
        &self,
        file: Attachment,
        options: UploadOptions,
    ) -> Result<UploadOutcome> {
        let endpoint = self.upload_endpoint.as_deref().ok_or_else(|| {
            MinaraiError::MissingCapability("upload base url is needed to upload attachments".into())
        })?;

        let form = match UploadForm::build(&self.identity(), file, &options) {
            Ok(form) => form,
            Err(e) => return Ok(UploadOutcome::failed(e)),
        };

        let outcome = match self.uploader.post(endpoint, form).await {
            Ok(resp) => {
                // identity as of completion, like every other read
                let identity = self.identity();
                let user_id = identity.user_id.as_deref().unwrap_or_default();
                UploadOutcome::from_response(
                    resp,
                    &[
                        ("applicationId", identity.application_id.as_str()),
                        ("userId", user_id),
                    ],
                )
            }
            Err(e) => {
                self.shared.log.warn(&format!("upload failed: {e}"));
                UploadOutcome::failed(e)
            }
        };
        self.shared.log.obj("upload", Some(&outcome.to_json()));
        Ok(outcome)
    }

    /// Local teardown: drop the transport handle and forget the
    /// server-assigned client and user ids. Later sends fail with `Closed`.
    pub fn close(&self) {
        self.shared.take_transport();
        self.shared
            .identity
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .reset_session();
        self.shared.log.debug("session closed");
    }

    fn dispatch(&self, label: &str, lang: Option<String>, body: Body) -> Result<()> {
        let env = Envelope::build(&self.identity(), now_millis(), lang, body);
        let payload = env.to_value()?;
        self.shared.log.obj(label, Some(&payload));
        self.shared.emit(env.event_name(), Some(payload))
    }
}

impl Drop for SessionClient {
    /// Release the transport handle and stop the inbound task, so the
    /// connection closes even when `close` was never called.
    fn drop(&mut self) {
        self.shared.take_transport();
        if let Some(task) = self.task.lock().unwrap_or_else(PoisonError::into_inner).take() {
            task.abort();
        }
    }
}

fn or_empty_object(v: Option<Value>) -> Value {
    match v {
        Some(v) if !v.is_null() => v,
        _ => json!({}),
    }
}
