//! Test helpers for host-core integration tests.
//!
//! - Starting a relay on an ephemeral port and connecting WebSocket clients
//! - An in-memory rendering process speaking the line protocol
//! - A process double for escalation tests

use host_core::broker::Broker;
use host_core::dispatch::Dispatcher;
use host_core::native::link::run_link;
use host_core::native::process::ManagedProcess;
use host_core::registry::CommandRegistry;
use host_core::relay::{ClientSet, RelayServer};
use host_core::runtime::signal::ShutdownSignal;
use host_core::runtime::tasks::TaskGroup;

use models::{Envelope, NativeLaunch};

use std::collections::HashMap;
use std::io::Result as IoResult;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, duplex};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub type TestSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const RECEIVE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TestRelay {
    pub addr: SocketAddr,
    pub clients: ClientSet,
    pub tasks: TaskGroup,
}

/// Test helper: Start a relay serving `registry` on an ephemeral loopback port.
pub async fn start_relay(registry: CommandRegistry) -> TestRelay {
    let server = RelayServer::bind("127.0.0.1", 0)
        .await
        .expect("Failed to bind relay");
    let addr = server.local_addr();
    let clients = ClientSet::new();
    let tasks = TaskGroup::new();

    tasks.spawn(
        "relay",
        server.serve(
            Dispatcher::new(Arc::new(registry)),
            clients.clone(),
            tasks.clone(),
            false,
        ),
    );

    TestRelay {
        addr,
        clients,
        tasks,
    }
}

/// Test helper: Connect a WebSocket client to the relay.
pub async fn connect(addr: SocketAddr) -> TestSocket {
    let (ws, _) = connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("Failed to connect to relay");
    ws
}

/// Test helper: Wait until the relay has registered `count` clients.
pub async fn wait_for_clients(clients: &ClientSet, count: usize) {
    for _ in 0..200 {
        if clients.len().await == count {
            return;
        }
        sleep(Duration::from_millis(5)).await;
    }
    panic!("relay never reached {count} client(s)");
}

pub async fn send_json(ws: &mut TestSocket, value: Value) {
    ws.send(Message::text(value.to_string()))
        .await
        .expect("Failed to send message");
}

pub async fn send_raw(ws: &mut TestSocket, text: &str) {
    ws.send(Message::text(text.to_string()))
        .await
        .expect("Failed to send message");
}

/// Test helper: Receive the next text frame as an envelope.
pub async fn receive_envelope(ws: &mut TestSocket) -> Envelope {
    loop {
        let msg = timeout(RECEIVE_TIMEOUT, ws.next())
            .await
            .expect("Timed out waiting for message")
            .expect("Connection closed")
            .expect("Error receiving message");

        if let Message::Text(text) = msg {
            return Envelope::parse(text.as_str()).expect("Relay sent an invalid envelope");
        }
    }
}

pub fn request(cmd: &str, result_id: &str, payload: Value) -> Value {
    json!({
        "cmd": cmd,
        "result_id": result_id,
        "error_id": format!("{result_id}-err"),
        "payload": payload,
    })
}

/// Test helper: Link `broker` to an in-memory rendering process that keeps a
/// clipboard and a window title.
pub fn link_fake_native(broker: &Broker) {
    let outbound = broker.take_outbound().expect("Outbound already taken");
    let (host_side, native_side) = duplex(16 * 1024);
    tokio::spawn(run_link(host_side, broker.clone(), outbound));
    tokio::spawn(fake_native(native_side));
}

async fn fake_native(stream: DuplexStream) {
    let (reader, mut writer) = tokio::io::split(stream);
    let mut lines = BufReader::new(reader).lines();
    let mut state: HashMap<&'static str, Value> = HashMap::new();

    while let Ok(Some(line)) = lines.next_line().await {
        let request = Envelope::parse(&line).expect("Host sent an invalid envelope");
        let arg = request.payload.get(0).cloned().unwrap_or(Value::Null);

        let result = match request.cmd.as_str() {
            "clipboard.set_text" => {
                state.insert("clipboard", arg);
                Ok(Value::Null)
            }
            "clipboard.get_text" => Ok(state.get("clipboard").cloned().unwrap_or(Value::Null)),
            "clipboard.clear" => {
                state.remove("clipboard");
                Ok(Value::Null)
            }
            "window.setTitle" => {
                state.insert("title", arg);
                Ok(Value::Null)
            }
            "window.getTitle" => Ok(state.get("title").cloned().unwrap_or(json!(""))),
            "webview.isDevtoolsOpen" => Ok(json!(false)),
            other => Err(format!("unsupported method {other}")),
        };

        let response = match result {
            Ok(value) => Envelope::success(&request.cmd, &request.result_id, value),
            Err(message) => Envelope::failure(&request.cmd, &request.error_id, message),
        };
        let frame = format!("{}\n", response.to_json().expect("encode"));
        if writer.write_all(frame.as_bytes()).await.is_err() {
            return;
        }
    }
}

/// How a [`FakeProcess`] reacts at each escalation step.
#[derive(Debug, Clone, Copy)]
pub struct FakeBehavior {
    pub exits_on_signal: bool,
    pub honors_terminate: bool,
    pub honors_kill: bool,
}

/// A rendering process double that never touches the OS.
pub struct FakeProcess {
    signal: ShutdownSignal,
    behavior: FakeBehavior,
    exited: Arc<AtomicBool>,
    pub calls: Arc<Mutex<Vec<&'static str>>>,
}

impl FakeProcess {
    pub fn from_launch(
        launch: &NativeLaunch,
        behavior: FakeBehavior,
        calls: Arc<Mutex<Vec<&'static str>>>,
    ) -> Self {
        Self {
            signal: ShutdownSignal::at(launch.shutdown_signal().clone()),
            behavior,
            exited: Arc::new(AtomicBool::new(false)),
            calls,
        }
    }

    pub fn exit_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.exited)
    }

    fn has_exited(&self) -> bool {
        self.exited.load(Ordering::Acquire)
            || (self.behavior.exits_on_signal && self.signal.is_set())
    }

    async fn until_exited(&self) {
        while !self.has_exited() {
            sleep(Duration::from_millis(5)).await;
        }
    }
}

impl ManagedProcess for FakeProcess {
    fn id(&self) -> Option<u32> {
        Some(4242)
    }

    async fn wait_for_exit(&mut self, limit: Duration) -> bool {
        timeout(limit, self.until_exited()).await.is_ok()
    }

    async fn wait(&mut self) -> IoResult<()> {
        self.until_exited().await;
        Ok(())
    }

    fn terminate(&mut self) -> bool {
        self.calls.lock().unwrap().push("terminate");
        if self.behavior.honors_terminate {
            self.exited.store(true, Ordering::Release);
        }
        true
    }

    async fn kill(&mut self) -> IoResult<()> {
        self.calls.lock().unwrap().push("kill");
        if self.behavior.honors_kill {
            self.exited.store(true, Ordering::Release);
        }
        Ok(())
    }
}
