//! # Pool Elástico de Workers
//! src/workers/mod.rs
//!
//! Modo pool: el hilo principal acepta conexiones y las encola en una cola
//! acotada; los workers las sacan y ejecutan el handler.
//!
//! - La cola llena bloquea al productor (backpressure).
//! - Si hay más conexiones encoladas que workers vivos, se crea uno más
//!   (hasta `max_threads`).
//! - Un worker ocioso por más de `idle_timeout` termina si quedan más de
//!   `min_threads`.

pub mod pool;
pub mod worker;

pub use pool::{PoolConfig, WorkerPool};
pub use worker::WorkerState;
