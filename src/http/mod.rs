//! # Módulo HTTP
//!
//! Subconjunto mínimo de HTTP/1.0 que necesita el servidor:
//!
//! - Parsing de la request line (método, URI, versión)
//! - Construcción de responses y páginas de error
//! - Códigos de estado
//!
//! No hay keep-alive, chunked transfer ni parsing de headers: cada conexión
//! recibe exactamente una respuesta y luego se cierra.
//!
//! ### Formato de Request
//!
//! ```text
//! GET /path?query HTTP/1.0\r\n
//! Header-Name: Header-Value\r\n
//! \r\n
//! ```

pub mod request;
pub mod response;
pub mod status;

pub use request::{Method, Request};
pub use response::Response;
pub use status::StatusCode;
