//! # Servidor con Pool de Workers
//! src/server/tcp.rs
//!
//! El thread principal solo acepta conexiones y las entrega al pool. Cuando
//! la cola está llena, `submit` bloquea y el accept se detiene hasta que un
//! worker libere espacio.

use crate::connection::Connection;
use crate::error::ServerError;
use crate::handler::RequestHandler;
use crate::metrics::PoolMetrics;
use crate::workers::{PoolConfig, WorkerPool};
use log::{debug, info, warn};
use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;
use std::sync::Arc;

/// Servidor HTTP/1.0 con pool elástico y `/metrics`
pub struct PoolServer {
    listener: TcpListener,
    pool: WorkerPool,
}

impl PoolServer {
    /// Hace bind y arranca el pool
    ///
    /// El handler recibe las métricas del mismo pool para `/metrics`.
    pub fn bind(address: &str, base_dir: impl Into<PathBuf>, config: PoolConfig) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(address).map_err(|source| ServerError::Bind {
            address: address.to_string(),
            source,
        })?;

        let metrics = Arc::new(PoolMetrics::new());
        let handler = RequestHandler::new(base_dir).with_metrics(metrics.clone());
        let pool = WorkerPool::new(config, metrics, Arc::new(handler))?;

        Ok(Self { listener, pool })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Loop de accept. Un error de accept se registra y se sigue.
    pub fn run(&self) -> Result<(), ServerError> {
        info!("Pool server listening on {}", self.local_addr()?);

        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    let conn = Connection::new(stream);
                    debug!("Accepted {}", conn);
                    self.pool.submit(conn)?;
                }
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpStream;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn start(config: PoolConfig) -> SocketAddr {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let server = PoolServer::bind("127.0.0.1:0", std::env::temp_dir(), config).unwrap();
            tx.send(server.local_addr().unwrap()).unwrap();
            let _ = server.run();
        });
        rx.recv().unwrap()
    }

    fn get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        write!(stream, "GET {} HTTP/1.0\r\n\r\n", path).unwrap();
        let mut buf = String::new();
        stream.read_to_string(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_bind_error() {
        let taken = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = taken.local_addr().unwrap().to_string();

        let result = PoolServer::bind(&address, ".", PoolConfig::default());
        assert!(matches!(result, Err(ServerError::Bind { .. })));
    }

    #[test]
    fn test_invalid_pool_config() {
        let config = PoolConfig {
            queue_capacity: 0,
            ..PoolConfig::default()
        };
        let result = PoolServer::bind("127.0.0.1:0", ".", config);
        assert!(matches!(result, Err(ServerError::Config(_))));
    }

    #[test]
    fn test_metrics_count_requests() {
        let addr = start(PoolConfig {
            initial_threads: 2,
            max_threads: 4,
            idle_timeout: Duration::from_secs(10),
            ..PoolConfig::default()
        });

        let first = get(addr, "/metrics");
        assert!(first.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(first.contains("live_threads 2\n"));
        // El request actual todavía no cuenta
        assert!(first.contains("total_requests 0\n"));
        assert!(first.contains("active_threads 1\n"));

        let _ = get(addr, "/does-not-exist.html");

        // El worker suma al total antes de cerrar la conexión
        let third = get(addr, "/metrics");
        assert!(third.contains("total_requests 2\n"));
        assert!(third.contains("queue_size 0\n"));
    }
}
