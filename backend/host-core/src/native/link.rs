//! Newline-delimited JSON link to the rendering process.
//!
//! Requests queued by the [`Broker`] are written one envelope per line, and
//! every line read back is handed to [`Broker::resolve`].

use crate::NATIVE_SOCKET_EXTENSION;
use crate::broker::{Broker, Resolution};
use crate::error::link::LinkError;

use common::ErrorLocation;
use models::Envelope;

use std::env::temp_dir;
use std::panic::Location;
use std::path::PathBuf;
use std::time::Duration;

use backoff::{ExponentialBackoff, backoff::Backoff};
use log::{debug, info, trace, warn};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::sleep as TokioSleep;

const CONNECT_MAX_ELAPSED: Duration = Duration::from_secs(20);
const LINK_CLOSED_REASON: &str = "lost: native link closed";

/// Location of the local socket the rendering process serves for `channel_name`.
pub fn socket_path(channel_name: &str) -> PathBuf {
    temp_dir().join(format!("{channel_name}.{NATIVE_SOCKET_EXTENSION}"))
}

#[cfg(unix)]
pub type NativeStream = tokio::net::UnixStream;

#[cfg(windows)]
pub type NativeStream = tokio::net::windows::named_pipe::NamedPipeClient;

#[cfg(unix)]
async fn try_connect(channel_name: &str) -> std::io::Result<NativeStream> {
    tokio::net::UnixStream::connect(socket_path(channel_name)).await
}

#[cfg(windows)]
async fn try_connect(channel_name: &str) -> std::io::Result<NativeStream> {
    tokio::net::windows::named_pipe::ClientOptions::new()
        .open(format!(r"\\.\pipe\{channel_name}"))
}

/// Connect to the rendering process, retrying while it starts up.
///
/// The orchestrator does not wait for a readiness acknowledgment, so the
/// socket may not exist yet on the first attempts.
pub async fn connect_native(
    channel_name: &str,
    max_elapsed: Duration,
) -> Result<NativeStream, LinkError> {
    let mut backoff = ExponentialBackoff {
        max_elapsed_time: Some(max_elapsed),
        ..Default::default()
    };

    debug!("Connecting to native channel '{channel_name}'");

    loop {
        match try_connect(channel_name).await {
            Ok(stream) => {
                info!("Connected to native channel '{channel_name}'");
                return Ok(stream);
            }
            Err(e) => match backoff.next_backoff() {
                Some(duration) => {
                    trace!("Native channel not ready ({e}), retrying after {duration:?}");
                    TokioSleep(duration).await;
                }
                None => {
                    return Err(LinkError::Connect {
                        message: format!(
                            "Native channel '{channel_name}' unavailable after {max_elapsed:?}: {e}"
                        ),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
            },
        }
    }
}

/// Pump envelopes between the broker and an established stream.
///
/// Returns when either side closes: the peer hangs up or the outbound queue
/// has no more senders. Calls still waiting on the link are rejected and new
/// ones fail to send.
pub async fn run_link<S>(
    stream: S,
    broker: Broker,
    mut outbound: mpsc::Receiver<Envelope>,
) -> Result<(), LinkError>
where
    S: AsyncRead + AsyncWrite + Send + Unpin,
{
    let result = pump(stream, &broker, &mut outbound).await;

    outbound.close();
    let rejected = broker.reject_pending(LINK_CLOSED_REASON);
    if rejected > 0 {
        warn!("Native link closed with {rejected} call(s) in flight");
    }
    result
}

async fn pump<S>(
    stream: S,
    broker: &Broker,
    outbound: &mut mpsc::Receiver<Envelope>,
) -> Result<(), LinkError>
where
    S: AsyncRead + AsyncWrite + Send + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut lines = BufReader::new(reader).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => handle_inbound(broker, &line),
                None => {
                    info!("Native link closed by peer");
                    return Ok(());
                }
            },
            request = outbound.recv() => match request {
                Some(request) => {
                    let mut frame = request.to_json().map_err(|e| LinkError::Io {
                        message: e.to_string(),
                        location: ErrorLocation::from(Location::caller()),
                    })?;
                    frame.push('\n');
                    writer.write_all(frame.as_bytes()).await?;
                    writer.flush().await?;
                    trace!("Sent '{}' to native", request.cmd);
                }
                None => {
                    debug!("Outbound queue closed; stopping native link");
                    return Ok(());
                }
            },
        }
    }
}

fn handle_inbound(broker: &Broker, line: &str) {
    if line.trim().is_empty() {
        return;
    }

    match Envelope::parse(line) {
        Ok(envelope) => {
            let cmd = envelope.cmd.clone();
            if broker.resolve(envelope) == Resolution::Unmatched {
                debug!("Unmatched native response for '{cmd}'");
            }
        }
        Err(e) => warn!("Dropping malformed native message: {e}"),
    }
}

/// Connect to `channel_name` and run the link until it closes.
pub async fn serve_native_link(channel_name: String, broker: Broker) -> Result<(), LinkError> {
    let outbound = broker.take_outbound().ok_or_else(|| LinkError::State {
        message: String::from("Broker outbound queue already taken"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let stream = connect_native(&channel_name, CONNECT_MAX_ELAPSED).await?;
    run_link(stream, broker, outbound).await
}
