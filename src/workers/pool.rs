//! # Worker Pool
//! src/workers/pool.rs
//!
//! Un mutex protege la cola y la cantidad de workers vivos. Dos condvars:
//! `job_available` despierta workers, `space_available` despierta al
//! productor bloqueado en `submit`.
//!
//! Los contadores de `PoolMetrics` reflejan este estado pero el valor
//! autoritativo de `live` es el que está bajo el mutex.

use crate::config::Config;
use crate::connection::Connection;
use crate::error::ServerError;
use crate::handler::ServeConnection;
use crate::metrics::PoolMetrics;
use crate::workers::worker;
use log::{debug, info, warn};
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Parámetros del pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Workers creados al arrancar
    pub initial_threads: usize,

    /// Piso para el scale-down por inactividad
    pub min_threads: usize,

    /// Techo para el scale-up por carga
    pub max_threads: usize,

    /// Capacidad de la cola de conexiones
    pub queue_capacity: usize,

    /// Tiempo de espera ocioso antes de considerar terminar
    pub idle_timeout: Duration,
}

impl PoolConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            initial_threads: config.threads,
            min_threads: config.min_threads,
            max_threads: config.max_threads,
            queue_capacity: config.buffers,
            idle_timeout: Duration::from_millis(config.idle_timeout_ms),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.min_threads == 0 {
            return Err("Min threads must be >= 1".to_string());
        }
        if self.min_threads > self.max_threads {
            return Err("Min threads must be <= max threads".to_string());
        }
        if self.initial_threads < self.min_threads || self.initial_threads > self.max_threads {
            return Err("Initial threads must be between min and max threads".to_string());
        }
        if self.queue_capacity == 0 {
            return Err("Queue capacity must be >= 1".to_string());
        }
        if self.idle_timeout.is_zero() {
            return Err("Idle timeout must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_threads: 1,
            min_threads: 1,
            max_threads: 16,
            queue_capacity: 3,
            idle_timeout: Duration::from_secs(10),
        }
    }
}

/// Estado protegido por el mutex del pool
pub(crate) struct PoolState {
    pub(crate) jobs: VecDeque<Connection>,
    pub(crate) live: usize,
    pub(crate) shutting_down: bool,
    handles: Vec<JoinHandle<()>>,
}

/// Lo que comparten el pool y sus workers
pub(crate) struct Shared {
    pub(crate) config: PoolConfig,
    pub(crate) state: Mutex<PoolState>,
    pub(crate) job_available: Condvar,
    pub(crate) space_available: Condvar,
    pub(crate) metrics: Arc<PoolMetrics>,
    pub(crate) handler: Arc<dyn ServeConnection>,
    next_worker_id: AtomicUsize,
}

impl Shared {
    /// Un handler que entró en pánico no envenena el pool: el pánico se
    /// atrapa fuera del lock, así que el estado sigue siendo válido.
    pub(crate) fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Pool elástico con cola acotada
pub struct WorkerPool {
    shared: Arc<Shared>,
}

impl WorkerPool {
    /// Crea el pool y arranca `initial_threads` workers
    ///
    /// No poder crear los workers iniciales es fatal.
    pub fn new(
        config: PoolConfig,
        metrics: Arc<PoolMetrics>,
        handler: Arc<dyn ServeConnection>,
    ) -> Result<Self, ServerError> {
        config.validate().map_err(ServerError::Config)?;

        let shared = Arc::new(Shared {
            state: Mutex::new(PoolState {
                jobs: VecDeque::with_capacity(config.queue_capacity),
                live: 0,
                shutting_down: false,
                handles: Vec::with_capacity(config.max_threads),
            }),
            job_available: Condvar::new(),
            space_available: Condvar::new(),
            metrics,
            handler,
            next_worker_id: AtomicUsize::new(0),
            config,
        });

        let pool = Self { shared };
        {
            let mut state = pool.shared.lock();
            for _ in 0..pool.shared.config.initial_threads {
                spawn_worker(&pool.shared, &mut state).map_err(ServerError::Spawn)?;
            }
        }

        info!(
            "Worker pool started: {} threads (min {}, max {}), queue capacity {}",
            pool.shared.config.initial_threads,
            pool.shared.config.min_threads,
            pool.shared.config.max_threads,
            pool.shared.config.queue_capacity
        );

        Ok(pool)
    }

    /// Encola una conexión
    ///
    /// Bloquea mientras la cola esté llena. Después de encolar puede crear
    /// un worker más si la cola supera a los workers vivos.
    pub fn submit(&self, conn: Connection) -> Result<(), ServerError> {
        let shared = &self.shared;
        let capacity = shared.config.queue_capacity;

        let mut state = shared.lock();
        while state.jobs.len() >= capacity && !state.shutting_down {
            debug!("[FD={}] Queue full ({}), waiting for space", conn.fd(), capacity);
            state = shared
                .space_available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        if state.shutting_down {
            // La conexión se cierra al salir de aquí
            return Err(ServerError::PoolShutdown);
        }

        debug!("[FD={}] Queued ({} waiting)", conn.fd(), state.jobs.len() + 1);
        state.jobs.push_back(conn);
        shared.metrics.job_queued();
        shared.job_available.notify_one();

        if state.live < shared.config.max_threads && state.jobs.len() > state.live {
            match spawn_worker(shared, &mut state) {
                Ok(()) => info!(
                    "Scaled up: {} live threads for {} queued connections",
                    state.live,
                    state.jobs.len()
                ),
                Err(e) => warn!("Failed to spawn extra worker: {}", e),
            }
        }

        // Los workers que salieron por inactividad dejan su handle aquí
        state.handles.retain(|h| !h.is_finished());

        Ok(())
    }

    /// Workers vivos según el estado protegido
    pub fn live_threads(&self) -> usize {
        self.shared.lock().live
    }

    /// Conexiones esperando en la cola
    pub fn queued(&self) -> usize {
        self.shared.lock().jobs.len()
    }

    /// Cierra el pool: los workers vacían la cola y terminan
    ///
    /// Bloquea hasta que todos los workers hayan salido. Llamarlo más de una
    /// vez no tiene efecto.
    pub fn shutdown(&self) {
        let handles = {
            let mut state = self.shared.lock();
            if state.shutting_down && state.handles.is_empty() {
                return;
            }
            state.shutting_down = true;
            std::mem::take(&mut state.handles)
        };

        info!("Shutting down worker pool");
        self.shared.job_available.notify_all();
        self.shared.space_available.notify_all();

        for handle in handles {
            if handle.join().is_err() {
                warn!("A worker thread panicked during shutdown");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Crea un worker y lo registra en el estado
///
/// Se llama con el lock tomado: el worker nuevo no puede ver el estado
/// antes de que `live` ya lo cuente.
fn spawn_worker(shared: &Arc<Shared>, state: &mut PoolState) -> io::Result<()> {
    let id = shared.next_worker_id.fetch_add(1, Ordering::SeqCst);
    let worker_shared = Arc::clone(shared);

    let handle = thread::Builder::new()
        .name(format!("worker-{}", id))
        .spawn(move || worker::run(worker_shared, id))?;

    state.live += 1;
    state.handles.push(handle);
    shared.metrics.worker_started();
    Ok(())
}
