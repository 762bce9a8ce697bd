//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración por argumentos CLI con respaldo en variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./cgi_httpd --dir ./public --port 8080 --mode pool \
//!   --threads 2 --buffers 8 --min-threads 1 --max-threads 8
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! BASE_DIR=./public HTTP_PORT=8080 SERVER_MODE=event-loop ./cgi_httpd
//! ```

use crate::error::ServerError;
use clap::{Parser, ValueEnum};
use std::fmt;
use std::path::PathBuf;

/// Forma de despachar las conexiones
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ServerMode {
    /// Un thread con epoll; sin `/metrics`
    EventLoop,

    /// Pool elástico de workers con cola acotada y `/metrics`
    Pool,
}

impl fmt::Display for ServerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMode::EventLoop => write!(f, "event-loop"),
            ServerMode::Pool => write!(f, "pool"),
        }
    }
}

/// Configuración del servidor HTTP/1.0
#[derive(Debug, Clone, Parser)]
#[command(name = "cgi_httpd")]
#[command(about = "Servidor HTTP/1.0 de archivos estáticos y CGI")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Directorio base desde el que se sirven los archivos
    #[arg(short = 'd', long = "dir", default_value = ".", env = "BASE_DIR")]
    pub base_dir: String,

    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "10000", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "0.0.0.0", env = "HTTP_HOST")]
    pub host: String,

    /// Modo de concurrencia
    #[arg(long, value_enum, default_value_t = ServerMode::Pool, env = "SERVER_MODE")]
    pub mode: ServerMode,

    // === Pool ===

    /// Workers creados al arrancar
    #[arg(short = 't', long, default_value = "1", env = "WORKERS")]
    pub threads: usize,

    /// Capacidad de la cola de conexiones
    #[arg(short = 'b', long, default_value = "3", env = "QUEUE_SIZE")]
    pub buffers: usize,

    /// Mínimo de workers vivos
    #[arg(long = "min-threads", default_value = "1", env = "MIN_THREADS")]
    pub min_threads: usize,

    /// Máximo de workers vivos
    #[arg(long = "max-threads", default_value = "16", env = "MAX_THREADS")]
    pub max_threads: usize,

    /// Espera ociosa antes de que un worker sobrante termine, en milisegundos
    #[arg(long = "idle-timeout-ms", default_value = "10000", env = "IDLE_TIMEOUT_MS")]
    pub idle_timeout_ms: u64,

    // === Event loop ===

    /// Eventos leídos por cada llamada a poll
    #[arg(long = "max-events", default_value = "64", env = "MAX_EVENTS")]
    pub max_events: usize,

    // === Logging ===

    /// Filtro de logs (error, warn, info, debug, trace o por módulo)
    #[arg(long = "log-level", default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use cgi_httpd::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "0.0.0.0:10000");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        // Validar workers
        if self.threads == 0 {
            return Err("Threads must be >= 1".to_string());
        }
        if self.min_threads == 0 {
            return Err("Min threads must be >= 1".to_string());
        }
        if self.min_threads > self.max_threads {
            return Err(format!(
                "Min threads ({}) must be <= max threads ({})",
                self.min_threads, self.max_threads
            ));
        }
        if self.threads < self.min_threads || self.threads > self.max_threads {
            return Err(format!(
                "Threads ({}) must be between min ({}) and max ({})",
                self.threads, self.min_threads, self.max_threads
            ));
        }

        // Validar cola
        if self.buffers == 0 {
            return Err("Buffers must be >= 1".to_string());
        }

        if self.idle_timeout_ms == 0 {
            return Err("Idle timeout must be > 0".to_string());
        }
        if self.max_events == 0 {
            return Err("Max events must be >= 1".to_string());
        }

        Ok(())
    }

    /// Resuelve el directorio base a una ruta absoluta
    ///
    /// Los CGI corren con este directorio como directorio actual.
    pub fn resolve_base_dir(&self) -> Result<PathBuf, ServerError> {
        let base_dir_error = |source| ServerError::BaseDir {
            path: PathBuf::from(&self.base_dir),
            source,
        };

        let path = std::fs::canonicalize(&self.base_dir).map_err(base_dir_error)?;
        if !path.is_dir() {
            return Err(base_dir_error(std::io::Error::new(
                std::io::ErrorKind::Other,
                "not a directory",
            )));
        }
        Ok(path)
    }

    /// Imprime un resumen de la configuración
    pub fn print_summary(&self) {
        println!("╔══════════════════════════════════════════════════════════════╗");
        println!("║              cgi_httpd HTTP/1.0 Server Configuration         ║");
        println!("╚══════════════════════════════════════════════════════════════╝");
        println!();
        println!("🌐 Network:");
        println!("   Address:      {}", self.address());
        println!("   Base dir:     {}", self.base_dir);
        println!("   Mode:         {}", self.mode);
        println!();

        match self.mode {
            ServerMode::Pool => {
                println!("👷 Worker Pool:");
                println!("   ┌──────────┬──────────┬──────────┬────────────┬─────────────┐");
                println!("   │ Initial  │ Min      │ Max      │ Queue Cap  │ Idle        │");
                println!("   ├──────────┼──────────┼──────────┼────────────┼─────────────┤");
                println!(
                    "   │ {:^8} │ {:^8} │ {:^8} │ {:^10} │ {:>7} ms  │",
                    self.threads, self.min_threads, self.max_threads, self.buffers, self.idle_timeout_ms
                );
                println!("   └──────────┴──────────┴──────────┴────────────┴─────────────┘");
            }
            ServerMode::EventLoop => {
                println!("🔁 Event Loop:");
                println!("   Max events:   {}", self.max_events);
            }
        }

        println!();
        println!("═══════════════════════════════════════════════════════════════");
        println!();
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            base_dir: ".".to_string(),
            port: 10000,
            host: "0.0.0.0".to_string(),
            mode: ServerMode::Pool,
            threads: 1,
            buffers: 3,
            min_threads: 1,
            max_threads: 16,
            idle_timeout_ms: 10_000,
            max_events: 64,
            log_level: "info".to_string(),
        }
    }
}
