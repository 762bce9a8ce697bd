//! # cgi_httpd
//! src/lib.rs
//!
//! Servidor HTTP/1.0 que sirve archivos estáticos y ejecuta programas CGI,
//! con dos modelos de concurrencia intercambiables para demostrar conceptos
//! de sistemas operativos: multiplexación con epoll y pools de threads.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `http`: Parsing del request line y construcción de respuestas HTTP/1.0
//! - `content`: Resolución de URIs, archivos estáticos (mmap) y CGI
//! - `handler`: Ciclo completo de una conexión, común a los dos modos
//! - `server`: Event loop (mio) y servidor con pool
//! - `workers`: Pool elástico de workers con cola acotada
//! - `metrics`: Contadores del pool expuestos en `/metrics`
//! - `config`: CLI y variables de entorno
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use cgi_httpd::server::PoolServer;
//! use cgi_httpd::workers::PoolConfig;
//!
//! let server = PoolServer::bind("0.0.0.0:10000", "/srv/www", PoolConfig::default())
//!     .expect("Error al iniciar servidor");
//! server.run().expect("Error en el accept loop");
//! ```

pub mod config;
pub mod connection;
pub mod content;
pub mod error;
pub mod handler;
pub mod http;
pub mod metrics;
pub mod server;
pub mod workers;
