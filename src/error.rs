//! # Errores del Servidor
//! src/error.rs
//!
//! Errores de arranque y de infraestructura. Se propagan hasta `main`, que
//! decide terminar el proceso. Los errores de cada request NO pasan por acá:
//! se convierten en respuestas HTTP (ver `handler::Outcome`).

use std::io;
use std::path::PathBuf;

/// Errores fatales del servidor
#[derive(Debug)]
pub enum ServerError {
    /// Configuración inválida
    Config(String),

    /// El directorio base no existe o no es un directorio
    BaseDir { path: PathBuf, source: io::Error },

    /// No se pudo hacer bind del socket de escucha
    Bind { address: String, source: io::Error },

    /// No se pudo crear la instancia de epoll
    Poll(io::Error),

    /// No se pudo registrar el listener en el event loop
    Register(io::Error),

    /// No se pudo crear un thread worker
    Spawn(io::Error),

    /// El pool ya fue cerrado y no acepta más conexiones
    PoolShutdown,

    /// Cualquier otro error de I/O
    Io(io::Error),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerError::Config(msg) => write!(f, "Invalid configuration: {}", msg),
            ServerError::BaseDir { path, source } => {
                write!(f, "Invalid base directory {}: {}", path.display(), source)
            }
            ServerError::Bind { address, source } => {
                write!(f, "Failed to bind {}: {}", address, source)
            }
            ServerError::Poll(e) => write!(f, "Failed to create event loop: {}", e),
            ServerError::Register(e) => write!(f, "Failed to register listener: {}", e),
            ServerError::Spawn(e) => write!(f, "Failed to spawn worker thread: {}", e),
            ServerError::PoolShutdown => write!(f, "Worker pool is shut down"),
            ServerError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::BaseDir { source, .. } | ServerError::Bind { source, .. } => Some(source),
            ServerError::Poll(e) | ServerError::Register(e) | ServerError::Spawn(e) | ServerError::Io(e) => {
                Some(e)
            }
            ServerError::Config(_) | ServerError::PoolShutdown => None,
        }
    }
}

impl From<io::Error> for ServerError {
    fn from(e: io::Error) -> Self {
        ServerError::Io(e)
    }
}
