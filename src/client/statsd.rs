//! statsd client over UDP.

use super::MetricsClient;
use crate::error::{Result, StatsError};
use crate::metrics::data::{Metric, MetricKind};
use async_trait::async_trait;
use std::fmt::Write as _;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{Mutex, Notify};
use tokio::time::{self, Instant};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, trace, warn};

/// Largest datagram payload sent by default.
pub const DEFAULT_PACKET_SIZE: usize = 512;

/// Longest a line may wait in the buffer before it is sent.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(1);

/// A statsd client that batches newline-separated lines into datagrams.
///
/// Buffered lines are sent when the next line would overflow a datagram, on
/// [`MetricsClient::flush`], or by a background task once the oldest line has
/// waited `max_delay`. The task stops when the client is dropped.
#[derive(Debug)]
pub struct StatsdClient {
    shared: Arc<Shared>,
    packet_size: usize,
    max_delay: Duration,
    flusher: OnceLock<DropGuard>,
}

#[derive(Debug)]
struct Shared {
    socket: UdpSocket,
    peer: SocketAddr,
    buffer: Mutex<PacketBuffer>,
    pending: Notify,
}

#[derive(Debug, Default)]
struct PacketBuffer {
    bytes: Vec<u8>,
    since: Option<Instant>,
}

impl PacketBuffer {
    fn take(&mut self) -> Vec<u8> {
        self.since = None;
        std::mem::take(&mut self.bytes)
    }
}

impl Shared {
    async fn send(&self, payload: &[u8]) -> Result<()> {
        if payload.is_empty() {
            return Ok(());
        }
        trace!(bytes = payload.len(), "Sending statsd datagram");
        self.socket.send(payload).await.map_err(|e| {
            StatsError::transport_error(format!("Failed to send to {}: {}", self.peer, e))
        })?;
        Ok(())
    }
}

impl StatsdClient {
    /// Resolve `address` and connect a UDP socket to it.
    ///
    /// An address of the form `:port` targets the local host.
    pub async fn dial(address: &str) -> Result<Self> {
        let address = normalize_address(address);
        let peer = tokio::net::lookup_host(address.as_str())
            .await
            .map_err(|e| {
                StatsError::transport_error(format!("Failed to resolve {}: {}", address, e))
            })?
            .next()
            .ok_or_else(|| {
                StatsError::transport_error(format!("No addresses found for {}", address))
            })?;

        let local: SocketAddr = if peer.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };

        let socket = UdpSocket::bind(local)
            .await
            .map_err(|e| StatsError::transport_error(format!("Failed to bind UDP socket: {}", e)))?;
        socket.connect(peer).await.map_err(|e| {
            StatsError::transport_error(format!("Failed to connect to {}: {}", peer, e))
        })?;

        debug!(%peer, "Connected statsd client");

        Ok(Self {
            shared: Arc::new(Shared {
                socket,
                peer,
                buffer: Mutex::new(PacketBuffer::default()),
                pending: Notify::new(),
            }),
            packet_size: DEFAULT_PACKET_SIZE,
            max_delay: DEFAULT_MAX_DELAY,
            flusher: OnceLock::new(),
        })
    }

    /// Set the maximum datagram payload size.
    pub fn with_packet_size(mut self, packet_size: usize) -> Self {
        self.packet_size = packet_size.max(1);
        self
    }

    /// Set how long buffered lines may wait for more company.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// The resolved address datagrams are sent to.
    pub fn peer_addr(&self) -> SocketAddr {
        self.shared.peer
    }

    /// Wake the background flusher, spawning it on first use.
    fn schedule_flush(&self) {
        self.flusher.get_or_init(|| {
            let token = CancellationToken::new();
            tokio::spawn(flush_loop(
                self.shared.clone(),
                self.max_delay,
                token.clone(),
            ));
            token.drop_guard()
        });
        self.shared.pending.notify_one();
    }
}

/// Send the buffer once its oldest line is `max_delay` old.
async fn flush_loop(shared: Arc<Shared>, max_delay: Duration, token: CancellationToken) {
    loop {
        let since = shared.buffer.lock().await.since;

        let since = match since {
            Some(since) => since,
            None => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = shared.pending.notified() => {}
                }
                continue;
            }
        };

        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = time::sleep_until(since + max_delay) => {
                let mut buffer = shared.buffer.lock().await;
                // A newer batch may have replaced the one this deadline was for.
                if buffer.since.is_some_and(|s| s + max_delay <= Instant::now()) {
                    let payload = buffer.take();
                    if let Err(err) = shared.send(&payload).await {
                        warn!(error = %err, "Failed to send delayed statsd datagram");
                    }
                }
            }
        }
    }

    trace!("statsd flusher stopped");
}

#[async_trait]
impl MetricsClient for StatsdClient {
    async fn emit(&self, metric: Metric) -> Result<()> {
        let line = encode(&metric);
        let mut buffer = self.shared.buffer.lock().await;

        if !buffer.bytes.is_empty() && buffer.bytes.len() + 1 + line.len() > self.packet_size {
            let payload = buffer.take();
            self.shared.send(&payload).await?;
        }

        if !buffer.bytes.is_empty() {
            buffer.bytes.push(b'\n');
        }
        buffer.bytes.extend_from_slice(line.as_bytes());

        let since = match buffer.since {
            Some(since) => since,
            None => {
                let now = Instant::now();
                buffer.since = Some(now);
                self.schedule_flush();
                now
            }
        };

        if buffer.bytes.len() >= self.packet_size || since.elapsed() >= self.max_delay {
            let payload = buffer.take();
            self.shared.send(&payload).await?;
        }

        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        let payload = self.shared.buffer.lock().await.take();
        self.shared.send(&payload).await
    }
}

/// Expand the `:port` shorthand to the IPv4 loopback.
pub fn normalize_address(address: &str) -> String {
    let address = address.trim();
    if address.starts_with(':') {
        format!("127.0.0.1{}", address)
    } else {
        address.to_string()
    }
}

/// Encode a metric as one or more statsd lines.
pub fn encode(metric: &Metric) -> String {
    let name = sanitize_name(&metric.name);
    let suffix = metric.kind.statsd_suffix();
    let mut line = String::new();

    // A leading sign on a gauge means "adjust by", so reset to zero first.
    if metric.kind == MetricKind::Gauge && metric.value < 0.0 {
        let _ = writeln!(line, "{}:0|{}", name, suffix);
    }
    let _ = write!(line, "{}:{}|{}", name, format_value(metric.value), suffix);
    line
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            ':' | '|' | '@' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect()
}

fn format_value(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
