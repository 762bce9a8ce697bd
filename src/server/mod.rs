//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Dos formas de despachar conexiones al mismo `RequestHandler`:
//! - `EventLoopServer`: un thread, readiness con epoll (vía mio)
//! - `PoolServer`: accept en el thread principal, pool elástico de workers

pub mod event_loop;
pub mod tcp;

pub use event_loop::EventLoopServer;
pub use tcp::PoolServer;
