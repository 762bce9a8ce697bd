//! # Collector de Métricas
//! src/metrics/collector.rs
//!
//! Contadores del pool de workers. Cada contador es atómico por separado:
//! un snapshot no es una foto consistente de los cuatro valores a la vez.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Capacidad de exponer métricas al handler de `/metrics`
///
/// El handler recibe un `Arc<dyn MetricsProvider>` al construirse; en modo
/// event loop no recibe ninguno.
pub trait MetricsProvider: Send + Sync {
    fn snapshot(&self) -> MetricsSnapshot;
}

/// Contadores del pool
#[derive(Debug)]
pub struct PoolMetrics {
    /// Threads vivos
    live_threads: AtomicUsize,

    /// Threads procesando un request
    active_threads: AtomicUsize,

    /// Conexiones esperando en la cola
    queue_size: AtomicUsize,

    /// Requests completados desde el arranque
    total_requests: AtomicU64,
}

impl PoolMetrics {
    pub fn new() -> Self {
        Self {
            live_threads: AtomicUsize::new(0),
            active_threads: AtomicUsize::new(0),
            queue_size: AtomicUsize::new(0),
            total_requests: AtomicU64::new(0),
        }
    }

    pub fn worker_started(&self) {
        self.live_threads.fetch_add(1, Ordering::SeqCst);
    }

    pub fn worker_exited(&self) {
        Self::saturating_decrement(&self.live_threads);
    }

    pub fn job_queued(&self) {
        self.queue_size.fetch_add(1, Ordering::SeqCst);
    }

    pub fn job_dequeued(&self) {
        Self::saturating_decrement(&self.queue_size);
    }

    /// Un worker empezó a procesar una conexión
    pub fn job_started(&self) {
        self.active_threads.fetch_add(1, Ordering::SeqCst);
    }

    /// Un worker terminó una conexión: deja de estar activo y suma al total
    pub fn job_finished(&self) {
        Self::saturating_decrement(&self.active_threads);
        self.total_requests.fetch_add(1, Ordering::SeqCst);
    }

    pub fn live_threads(&self) -> usize {
        self.live_threads.load(Ordering::SeqCst)
    }

    pub fn active_threads(&self) -> usize {
        self.active_threads.load(Ordering::SeqCst)
    }

    pub fn queue_size(&self) -> usize {
        self.queue_size.load(Ordering::SeqCst)
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::SeqCst)
    }

    fn saturating_decrement(counter: &AtomicUsize) {
        let _ = counter.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| v.checked_sub(1));
    }
}

impl Default for PoolMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsProvider for PoolMetrics {
    fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            active_threads: self.active_threads(),
            live_threads: self.live_threads(),
            queue_size: self.queue_size(),
            total_requests: self.total_requests(),
        }
    }
}

/// Valores leídos en un momento dado
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub active_threads: usize,
    pub live_threads: usize,
    pub queue_size: usize,
    pub total_requests: u64,
}

impl MetricsSnapshot {
    /// Cuerpo de `/metrics`: una línea `clave valor` por campo
    ///
    /// # Ejemplo
    /// ```
    /// use cgi_httpd::metrics::MetricsSnapshot;
    ///
    /// let snapshot = MetricsSnapshot { active_threads: 1, live_threads: 2, queue_size: 0, total_requests: 7 };
    /// assert_eq!(
    ///     snapshot.to_text(),
    ///     "active_threads 1\nlive_threads 2\nqueue_size 0\ntotal_requests 7\n"
    /// );
    /// ```
    pub fn to_text(&self) -> String {
        format!(
            "active_threads {}\nlive_threads {}\nqueue_size {}\ntotal_requests {}\n",
            self.active_threads, self.live_threads, self.queue_size, self.total_requests
        )
    }
}
