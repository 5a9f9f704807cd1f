use crate::broker::Broker;
use crate::config::HostConfig;
use crate::dispatch::Dispatcher;
use crate::error::signal::SignalError;
use crate::registry::CommandRegistry;
use crate::relay::ClientSet;
use crate::runtime::orchestrator::LifecycleState;
use crate::runtime::signal::ShutdownSignal;
use crate::runtime::tasks::TaskGroup;

use std::sync::Arc;

use log::info;
use tokio::sync::watch;
use uuid::Uuid;

/// Everything one runtime session owns.
///
/// Created by the orchestrator and lent to the parts that need it; nothing
/// here is global.
pub struct RuntimeContext {
    session_id: String,
    config: HostConfig,
    dispatcher: Dispatcher,
    broker: Broker,
    clients: ClientSet,
    tasks: TaskGroup,
    signal: ShutdownSignal,
    state: watch::Sender<LifecycleState>,
}

impl RuntimeContext {
    pub fn new(config: HostConfig, registry: Arc<CommandRegistry>, broker: Broker) -> Self {
        let session_id = Uuid::new_v4().simple().to_string();
        let signal = ShutdownSignal::for_session(&config.native.channel_name, &session_id);
        let (state, _) = watch::channel(LifecycleState::Idle);

        Self {
            session_id,
            config,
            dispatcher: Dispatcher::new(registry),
            broker,
            clients: ClientSet::new(),
            tasks: TaskGroup::new(),
            signal,
            state,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn broker(&self) -> &Broker {
        &self.broker
    }

    pub fn clients(&self) -> &ClientSet {
        &self.clients
    }

    pub fn tasks(&self) -> &TaskGroup {
        &self.tasks
    }

    pub fn shutdown_signal(&self) -> &ShutdownSignal {
        &self.signal
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Receiver that observes every lifecycle transition.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    pub(crate) fn transition(&self, next: LifecycleState) {
        let previous = self.state.send_replace(next);
        info!("Session {}: {previous:?} -> {next:?}", self.session_id);
    }

    /// Ask the running session to shut down.
    ///
    /// Equivalent to the rendering process setting the shared signal.
    pub fn request_shutdown(&self) -> Result<bool, SignalError> {
        info!("Shutdown requested by host");
        self.signal.set()
    }
}
