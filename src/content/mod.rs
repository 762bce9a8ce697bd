//! # Contenido estático y dinámico
//!
//! - `resolver`: URI → `Target` (estático o CGI)
//! - `emitter`: `Target` → bytes en el socket
//! - `mapped`: mmap de solo lectura con munmap en el drop
//! - `cgi`: proceso hijo con stdout = socket, siempre cosechado

pub mod cgi;
pub mod emitter;
pub mod mapped;
pub mod resolver;

pub use emitter::{content_type, emit, send_error};
pub use resolver::{resolve, Target};
