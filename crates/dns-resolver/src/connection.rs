//! A single UDP socket, multiplexed across many concurrent queries.
//!
//! One ephemeral source port is used for every outgoing query,
//! regardless of how many are in flight or which server they are
//! aimed at. Two background tasks share the socket: a receive task
//! that does nothing but pull datagrams off the wire and hand them
//! to the serve task, and a serve task that owns the map of
//! outstanding requests, sends queued queries, matches replies
//! against it, and sweeps expired deadlines.

use std::collections::HashMap;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

use rand::Rng;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, oneshot};

use dns_types::protocol::deserialise::ConsumableBuffer;
use dns_types::protocol::types::{Message, Question};

use crate::config::ResolverConfig;

/// A reply, paired with the address it actually came from so callers
/// can apply their own spoof checks if they need to (the connection
/// already rejects replies from an address other than the one the
/// matching request was sent to).
#[derive(Debug, Clone)]
pub struct Response {
    pub message: Message,
    pub from: Ipv4Addr,
}

/// Why a query did not produce a `Response`.
#[derive(Debug, Clone)]
pub enum QueryError {
    /// No reply arrived before the per-request deadline.
    Timeout,
    /// The socket itself errored while sending.
    Io(String),
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            QueryError::Timeout => write!(f, "time out"),
            QueryError::Io(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for QueryError {}

struct SendJob {
    target: Ipv4Addr,
    question: Question,
    callback: oneshot::Sender<Result<Response, QueryError>>,
}

struct RecvBuf {
    bytes: Vec<u8>,
    from: SocketAddr,
}

struct PendingRequest {
    target: Ipv4Addr,
    deadline: Instant,
    callback: oneshot::Sender<Result<Response, QueryError>>,
}

/// A handle to the running connection. Cloning it is cheap: it's
/// just a couple of channel senders.
#[derive(Clone)]
pub struct Connection {
    send_tx: mpsc::Sender<SendJob>,
    close_tx: mpsc::Sender<()>,
}

impl Connection {
    /// Binds an ephemeral UDP port and starts the receive and serve
    /// tasks.
    pub async fn new(config: &ResolverConfig) -> io::Result<Self> {
        let socket = Arc::new(UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?);

        let (send_tx, send_rx) = mpsc::channel::<SendJob>(config.queue_capacity);
        let (recv_tx, recv_rx) = mpsc::channel::<RecvBuf>(config.queue_capacity);
        let (close_tx, close_rx) = mpsc::channel::<()>(1);
        let (recv_close_tx, recv_close_rx) = mpsc::channel::<()>(1);

        tokio::spawn(recv_task(Arc::clone(&socket), recv_tx, recv_close_rx));
        tokio::spawn(serve_task(
            socket,
            send_rx,
            recv_rx,
            close_rx,
            recv_close_tx,
            config.query_timeout,
            config.idle_sleep,
            config.deadline_sweep_interval,
        ));

        Ok(Connection { send_tx, close_tx })
    }

    /// Send a single query and wait for either a matching reply or a
    /// timeout. This is the synchronous-feeling entry point the
    /// solver uses; `SendJob`s queue behind whatever else the serve
    /// task is doing, but a caller here just awaits its own oneshot.
    pub async fn query(&self, target: Ipv4Addr, question: Question) -> Result<Response, QueryError> {
        let (callback, rx) = oneshot::channel();
        let job = SendJob {
            target,
            question,
            callback,
        };
        if self.send_tx.send(job).await.is_err() {
            return Err(QueryError::Io("connection closed".to_string()));
        }
        match rx.await {
            Ok(result) => result,
            Err(_) => Err(QueryError::Io("connection closed".to_string())),
        }
    }

    /// Signal both background tasks to stop. Safe to call more than
    /// once; later calls are no-ops once the channel is gone.
    pub async fn close(&self) {
        let _ = self.close_tx.send(()).await;
    }
}

async fn recv_task(
    socket: Arc<UdpSocket>,
    recv_tx: mpsc::Sender<RecvBuf>,
    mut close_rx: mpsc::Receiver<()>,
) {
    let mut buf = vec![0u8; 65536];
    loop {
        tokio::select! {
            biased;
            _ = close_rx.recv() => {
                return;
            }
            result = socket.recv_from(&mut buf) => {
                match result {
                    Ok((n, from)) => {
                        let bytes = buf[..n].to_vec();
                        if recv_tx.send(RecvBuf { bytes, from }).await.is_err() {
                            return;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "udp recv error");
                    }
                }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn serve_task(
    socket: Arc<UdpSocket>,
    mut send_rx: mpsc::Receiver<SendJob>,
    mut recv_rx: mpsc::Receiver<RecvBuf>,
    mut close_rx: mpsc::Receiver<()>,
    recv_close_tx: mpsc::Sender<()>,
    query_timeout: std::time::Duration,
    idle_sleep: std::time::Duration,
    deadline_sweep_interval: std::time::Duration,
) {
    let mut jobs: HashMap<u16, PendingRequest> = HashMap::new();
    let mut sweep = tokio::time::interval(deadline_sweep_interval);
    sweep.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = close_rx.recv() => {
                let _ = recv_close_tx.send(()).await;
                return;
            }

            Some(buf) = recv_rx.recv() => {
                handle_recv(&mut jobs, buf);
            }

            Some(job) = send_rx.recv() => {
                handle_send(&socket, &mut jobs, job, query_timeout).await;
            }

            _ = sweep.tick() => {
                sweep_deadlines(&mut jobs);
            }

            () = tokio::time::sleep(idle_sleep) => {}
        }
    }
}

fn handle_recv(jobs: &mut HashMap<u16, PendingRequest>, buf: RecvBuf) {
    let from_ip = match buf.from {
        SocketAddr::V4(addr) => *addr.ip(),
        SocketAddr::V6(_) => return,
    };

    let message = match Message::deserialise(&mut ConsumableBuffer::new(&buf.bytes)) {
        Ok(message) => message,
        Err(err) => {
            tracing::debug!(error = %err, "dropping undecodable reply");
            return;
        }
    };

    let id = message.header.id;
    let Some(pending) = jobs.get(&id) else {
        return;
    };

    // reject replies that don't come from the server we actually
    // asked, even if the transaction ID matches.
    if pending.target != from_ip {
        tracing::debug!(%from_ip, expected = %pending.target, "dropping spoofed reply");
        return;
    }

    let pending = jobs.remove(&id).unwrap();
    let _ = pending.callback.send(Ok(Response {
        message,
        from: from_ip,
    }));
}

async fn handle_send(
    socket: &UdpSocket,
    jobs: &mut HashMap<u16, PendingRequest>,
    job: SendJob,
    query_timeout: std::time::Duration,
) {
    let mut id = rand::thread_rng().gen::<u16>();
    while jobs.contains_key(&id) {
        id = rand::thread_rng().gen::<u16>();
    }

    let message = Message::from_question(id, job.question);
    let octets = match message.into_octets() {
        Ok(octets) => octets,
        Err(err) => {
            let _ = job.callback.send(Err(QueryError::Io(err.to_string())));
            return;
        }
    };

    let target_addr = SocketAddr::new(job.target.into(), 53);
    if let Err(err) = socket.send_to(&octets, target_addr).await {
        let _ = job.callback.send(Err(QueryError::Io(err.to_string())));
        return;
    }

    jobs.insert(
        id,
        PendingRequest {
            target: job.target,
            deadline: Instant::now() + query_timeout,
            callback: job.callback,
        },
    );
}

fn sweep_deadlines(jobs: &mut HashMap<u16, PendingRequest>) {
    let now = Instant::now();
    let expired: Vec<u16> = jobs
        .iter()
        .filter(|(_, pending)| now >= pending.deadline)
        .map(|(id, _)| *id)
        .collect();

    for id in expired {
        if let Some(pending) = jobs.remove(&id) {
            let _ = pending.callback.send(Err(QueryError::Timeout));
        }
    }
}
