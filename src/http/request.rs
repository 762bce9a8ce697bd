//! # Parsing de la Request Line
//! src/http/request.rs
//!
//! Solo interesa la primera línea del request:
//!
//! ```text
//! GET /cgi-bin/spin.cgi?5 HTTP/1.0\r\n
//! Host: localhost:10000\r\n      <- se lee pero se descarta
//! \r\n
//! ```
//!
//! El parser es tolerante: nunca falla. Los tokens que faltan quedan como
//! strings vacíos y el método desconocido se conserva tal cual para poder
//! citarlo en el 501.

/// Método HTTP de la request line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - el único método que se sirve
    Get,

    /// Cualquier otro token (incluido el vacío)
    Other(String),
}

impl Method {
    /// Clasifica el token del método. La comparación distingue mayúsculas.
    pub fn parse(token: &str) -> Self {
        match token {
            "GET" => Method::Get,
            other => Method::Other(other.to_string()),
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Other(token) => token,
        }
    }
}

/// Request parseado: vive solo mientras se atiende la conexión
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: String,
    version: String,
}

impl Request {
    /// Parsea la request line desde los bytes recibidos
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use cgi_httpd::http::{Method, Request};
    ///
    /// let request = Request::parse(b"GET /index.html HTTP/1.0\r\nHost: x\r\n\r\n");
    /// assert_eq!(request.method(), &Method::Get);
    /// assert_eq!(request.uri(), "/index.html");
    /// assert_eq!(request.version(), "HTTP/1.0");
    /// ```
    pub fn parse(buffer: &[u8]) -> Self {
        let text = String::from_utf8_lossy(buffer);
        let request_line = text.lines().next().unwrap_or("");

        let mut tokens = request_line.split_whitespace();
        let method = Method::parse(tokens.next().unwrap_or(""));
        let uri = tokens.next().unwrap_or("").to_string();
        let version = tokens.next().unwrap_or("").to_string();

        Request { method, uri, version }
    }

    /// Obtiene el método HTTP del request
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// URI tal como llegó (incluye el query string)
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Obtiene la versión HTTP
    pub fn version(&self) -> &str {
        &self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_get() {
        let request = Request::parse(b"GET / HTTP/1.0\r\n\r\n");

        assert_eq!(request.method(), &Method::Get);
        assert_eq!(request.uri(), "/");
        assert_eq!(request.version(), "HTTP/1.0");
    }

    #[test]
    fn test_parse_keeps_query_in_uri() {
        let request = Request::parse(b"GET /cgi-bin/spin.cgi?5 HTTP/1.0\r\n\r\n");
        assert_eq!(request.uri(), "/cgi-bin/spin.cgi?5");
    }

    #[test]
    fn test_headers_are_ignored() {
        let raw = b"GET /a.html HTTP/1.1\r\nHost: localhost\r\nUser-Agent: test\r\n\r\n";
        let request = Request::parse(raw);

        assert_eq!(request.uri(), "/a.html");
        assert_eq!(request.version(), "HTTP/1.1");
    }

    #[test]
    fn test_other_method_is_preserved() {
        let request = Request::parse(b"POST /form HTTP/1.0\r\n\r\n");
        assert_eq!(request.method(), &Method::Other("POST".to_string()));
        assert_eq!(request.method().as_str(), "POST");
    }

    #[test]
    fn test_lowercase_get_is_not_get() {
        let request = Request::parse(b"get / HTTP/1.0\r\n\r\n");
        assert_eq!(request.method().as_str(), "get");
        assert_ne!(request.method(), &Method::Get);
    }

    #[test]
    fn test_missing_tokens_are_empty() {
        let request = Request::parse(b"GET\r\n\r\n");
        assert_eq!(request.method(), &Method::Get);
        assert_eq!(request.uri(), "");
        assert_eq!(request.version(), "");
    }

    #[test]
    fn test_empty_request() {
        let request = Request::parse(b"");
        assert_eq!(request.method(), &Method::Other(String::new()));
        assert_eq!(request.uri(), "");
    }

    #[test]
    fn test_extra_whitespace() {
        let request = Request::parse(b"GET   /x.txt \t HTTP/1.0\n");
        assert_eq!(request.uri(), "/x.txt");
        assert_eq!(request.version(), "HTTP/1.0");
    }
}
