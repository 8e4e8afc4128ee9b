// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Dominique Chuo

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, bounded};
use eventbus_router::Router;
use eventbus_storage::KeyValueStore;
use tracing::{debug, error, info, warn};

use crate::registry::ConnectionRegistry;

/// Bind address and accept-loop cadence. The deadline exists only so the
/// accept loop gets a chance to notice a shutdown request; it is not a
/// client-facing timeout.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: String,
    pub accept_deadline: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { addr: "localhost:8080".to_string(), accept_deadline: Duration::from_millis(500) }
    }
}

/// The event bus TCP server: an accept loop tracking its connections, plus
/// the two-phase shutdown that drains them before releasing the store.
pub struct Server {
    quit_tx: Sender<()>,
    exited_rx: Receiver<()>,
    accept_thread: Option<JoinHandle<()>>,
    store: Arc<dyn KeyValueStore>,
    local_addr: SocketAddr,
}

impl Server {
    /// Binds `settings.addr` and spawns the accept loop on its own thread.
    pub fn listen_and_serve(
        settings: ServerSettings,
        router: Arc<Router>,
        store: Arc<dyn KeyValueStore>,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(&settings.addr)?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, "event bus server is up and running");

        let (quit_tx, quit_rx) = bounded::<()>(1);
        let (exited_tx, exited_rx) = bounded::<()>(1);
        let registry = Arc::new(ConnectionRegistry::new());
        let accept_deadline = settings.accept_deadline;

        let accept_thread = std::thread::spawn(move || {
            accept_loop(listener, quit_rx, registry, router, accept_deadline);
            let _ = exited_tx.send(());
        });

        Ok(Self { quit_tx, exited_rx, accept_thread: Some(accept_thread), store, local_addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Signals the accept loop to quit, closes the store, then blocks
    /// until the accept loop has closed the listener and drained every
    /// connection.
    ///
    /// Order matters: the store closes only after the quit signal is
    /// sent, but the listener and tracked connections are closed by the
    /// accept loop itself before it publishes "exited" — so no request
    /// can reach a closed store.
    pub fn stop(mut self) -> std::io::Result<()> {
        let _ = self.quit_tx.send(());
        self.store.close().map_err(|err| std::io::Error::other(err.to_string()))?;
        let _ = self.exited_rx.recv();
        if let Some(handle) = self.accept_thread.take() {
            let _ = handle.join();
        }
        Ok(())
    }
}

fn accept_loop(
    listener: TcpListener,
    quit: Receiver<()>,
    registry: Arc<ConnectionRegistry>,
    router: Arc<Router>,
    accept_deadline: Duration,
) {
    loop {
        if quit.try_recv().is_ok() {
            break;
        }

        match listener.accept() {
            Ok((conn, _)) => {
                if let Err(err) = conn.set_nonblocking(false) {
                    error!(error = %err, "failed to make accepted connection blocking");
                    continue;
                }
                let tracked = match conn.try_clone() {
                    Ok(tracked) => tracked,
                    Err(err) => {
                        error!(error = %err, "failed to clone accepted connection");
                        continue;
                    }
                };
                let id = registry.add(tracked);
                let router = Arc::clone(&router);
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    info!(client_id = id, "client joined");
                    handle_connection(conn, &router);
                    registry.close(id);
                    info!(client_id = id, "client left");
                });
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(accept_deadline);
            }
            Err(err) => {
                error!(error = %err, "failed to accept connection");
                break;
            }
        }
    }

    debug!("shutting down the event bus server");
    drop(listener);
    registry.close_all();
}

/// Scans newline-framed request lines off `conn` until the client sends
/// `exit`, closes its side, or a read/write error occurs. Empty lines are
/// skipped without a response.
fn handle_connection(conn: TcpStream, router: &Router) {
    let reader_conn = match conn.try_clone() {
        Ok(c) => c,
        Err(err) => {
            error!(error = %err, "could not clone connection for reading");
            return;
        }
    };
    let mut reader = BufReader::new(reader_conn);
    let mut writer = conn;
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                let trimmed = line.trim_end_matches(['\r', '\n']);
                if trimmed.is_empty() {
                    debug!("skipping empty line");
                    continue;
                }

                let (response, exit) = router.dispatch(trimmed);
                let mut encoded = response.encode();
                encoded.push('\n');
                if let Err(err) = writer.write_all(encoded.as_bytes()) {
                    warn!(error = %err, "failed to write response");
                    break;
                }
                if exit {
                    break;
                }
            }
            Err(err) => {
                warn!(error = %err, "connection read error");
                break;
            }
        }
    }
}
