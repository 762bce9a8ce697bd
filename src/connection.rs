//! # Conexión aceptada
//! src/connection.rs
//!
//! Una `Connection` es dueña del socket de un cliente. No implementa `Clone`:
//! se mueve a la cola del pool o se atiende en el event loop, nunca las dos
//! cosas, y al hacer drop se cierra el descriptor.

use std::net::{SocketAddr, TcpStream};
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Instant;

/// Cliente aceptado, pendiente de una única respuesta
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    peer: Option<SocketAddr>,
    arrived_at: Instant,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Self {
        let peer = stream.peer_addr().ok();
        Self {
            stream,
            peer,
            arrived_at: Instant::now(),
        }
    }

    /// Descriptor del socket; se usa como identificador en los logs
    pub fn fd(&self) -> RawFd {
        self.stream.as_raw_fd()
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub fn arrived_at(&self) -> Instant {
        self.arrived_at
    }

    pub fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }
}

impl std::fmt::Display for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.peer {
            Some(peer) => write!(f, "FD={} ({})", self.fd(), peer),
            None => write!(f, "FD={}", self.fd()),
        }
    }
}
