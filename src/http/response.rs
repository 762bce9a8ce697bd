//! # Construcción de Respuestas HTTP
//!
//! API para armar respuestas HTTP/1.0 y escribirlas en el socket.
//!
//! ## Formato de una respuesta HTTP/1.0
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Server: cgi_httpd\r\n
//! Content-Length: 13\r\n
//! Content-Type: text/plain\r\n
//! \r\n
//! hello, world!
//! ```
//!
//! Los archivos estáticos no pasan por `with_body`: se escribe solo la
//! cabecera (`head_bytes`) y luego los bytes mapeados, sin copiarlos.

use super::StatusCode;
use std::io::{self, Write};

/// Valor del header `Server`
pub const SERVER_NAME: &str = "cgi_httpd";

/// Representa una respuesta HTTP/1.0 completa
#[derive(Debug, Clone)]
pub struct Response {
    /// Código de estado HTTP (200, 404, etc.)
    status: StatusCode,

    /// Headers en orden de inserción
    headers: Vec<(String, String)>,

    /// Cuerpo de la respuesta (puede ser vacío)
    body: Vec<u8>,
}

impl Response {
    /// Crea una respuesta vacía con el código indicado
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Agrega el header `Server`
    ///
    /// Solo lo llevan las respuestas 200 de contenido (estático y CGI); las
    /// páginas de error y `/metrics` van sin él.
    ///
    /// # Ejemplo
    /// ```
    /// use cgi_httpd::http::{Response, StatusCode};
    ///
    /// let response = Response::new(StatusCode::Ok).with_server();
    /// assert_eq!(response.header("Server"), Some("cgi_httpd"));
    /// ```
    pub fn with_server(self) -> Self {
        self.with_header("Server", SERVER_NAME)
    }

    /// Agrega un header; si ya existe, se sobrescribe su valor
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Versión mutable de `with_header`
    pub fn add_header(&mut self, name: &str, value: &str) {
        match self.headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Establece el cuerpo y calcula `Content-Length`
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        let length = self.body.len().to_string();
        self.add_header("Content-Length", &length);
        self
    }

    /// Respuesta `text/plain` con cuerpo
    pub fn text(status: StatusCode, body: &str) -> Self {
        Self::new(status)
            .with_header("Content-Type", "text/plain")
            .with_body(body)
    }

    /// Página de error HTML
    ///
    /// `long_msg` explica el error y `cause` es lo que lo provocó (el path
    /// resuelto o el método rechazado).
    ///
    /// # Ejemplo
    /// ```
    /// use cgi_httpd::http::{Response, StatusCode};
    ///
    /// let response = Response::error_page(StatusCode::NotFound, "File not found", "./nope.html");
    /// let body = String::from_utf8(response.body().to_vec()).unwrap();
    /// assert!(body.contains("404: Not Found"));
    /// assert!(body.contains("File not found: ./nope.html"));
    /// ```
    pub fn error_page(status: StatusCode, long_msg: &str, cause: &str) -> Self {
        let body = format!(
            "<!doctype html>\r\n\
             <head>\r\n\
             \x20 <title>WebServer Error</title>\r\n\
             </head>\r\n\
             <body>\r\n\
             \x20 <h2>{}: {}</h2>\r\n\
             \x20 <p>{}: {}</p>\r\n\
             </body>\r\n\
             </html>\r\n",
            status.as_u16(),
            status.reason_phrase(),
            long_msg,
            cause
        );

        Self::new(status)
            .with_header("Content-Type", "text/html")
            .with_body(body)
    }

    /// Status line + headers, sin la línea vacía final
    ///
    /// Es lo que recibe el cliente antes de la salida de un CGI: el programa
    /// agrega sus propios headers y cierra el bloque.
    pub fn open_head_bytes(&self) -> Vec<u8> {
        let mut head = format!("HTTP/1.0 {}\r\n", self.status);
        for (name, value) in &self.headers {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.into_bytes()
    }

    /// Status line + headers + línea vacía
    pub fn head_bytes(&self) -> Vec<u8> {
        let mut head = self.open_head_bytes();
        head.extend_from_slice(b"\r\n");
        head
    }

    /// Respuesta completa lista para enviar
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.head_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }

    /// Escribe la respuesta completa en `writer`
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())?;
        writer.flush()
    }

    /// Obtiene el código de estado de la respuesta
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Busca un header (sin distinguir mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Obtiene una referencia al body
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}
