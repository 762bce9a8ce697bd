//! # Emisión de respuestas
//! src/content/emitter.rs
//!
//! Escribe directamente en el socket la respuesta para un `Target`:
//!
//! ```text
//! stat(path) ──✗──► 404
//!    │
//!    ├─ Static  ── regular + u+r ──► mmap + 200 (Content-Length, Content-Type)
//!    │             si no         ──► 403
//!    │
//!    └─ Dynamic ── regular + u+x ──► 200 parcial + CGI con stdout = socket
//!                  si no         ──► 403
//! ```
//!
//! Nada de esto es idempotente: cada llamada vuelve a escribir en el socket.
//! Los errores de escritura se devuelven como `io::Error`; el resto de los
//! fallos se traducen a respuestas HTTP.

use super::cgi::CgiProcess;
use super::mapped::MappedFile;
use super::resolver::Target;
use crate::handler::Outcome;
use crate::http::{Response, StatusCode};
use log::{error, info, warn};
use std::fs;
use std::io::{self, Write};
use std::net::TcpStream;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::io::AsRawFd;
use std::path::Path;

/// Bit de lectura del dueño (S_IRUSR)
const OWNER_READ: u32 = 0o400;

/// Bit de ejecución del dueño (S_IXUSR)
const OWNER_EXEC: u32 = 0o100;

/// Content-Type según la extensión del archivo
///
/// # Ejemplo
/// ```
/// use cgi_httpd::content::content_type;
///
/// assert_eq!(content_type("./index.html"), "text/html");
/// assert_eq!(content_type("./logo.gif"), "image/gif");
/// assert_eq!(content_type("./photo.jpg"), "image/jpeg");
/// assert_eq!(content_type("./notes"), "text/plain");
/// ```
pub fn content_type(path: &str) -> &'static str {
    match Path::new(path).extension().and_then(|ext| ext.to_str()) {
        Some("html") => "text/html",
        Some("gif") => "image/gif",
        Some("jpg") => "image/jpeg",
        _ => "text/plain",
    }
}

/// Envía una página de error HTML
pub fn send_error(stream: &mut TcpStream, status: StatusCode, long_msg: &str, cause: &str) -> io::Result<()> {
    Response::error_page(status, long_msg, cause).write_to(stream)?;
    info!(
        "[FD={}] Sent HTTP error: {} (Cause: {})",
        stream.as_raw_fd(),
        status,
        cause
    );
    Ok(())
}

/// Sirve `target` usando `base_dir` como raíz de los paths relativos
pub fn emit(stream: &mut TcpStream, base_dir: &Path, target: &Target) -> io::Result<Outcome> {
    let fs_path = base_dir.join(target.path());

    let metadata = match fs::metadata(&fs_path) {
        Ok(metadata) => metadata,
        Err(_) => {
            send_error(stream, StatusCode::NotFound, "File not found", target.path())?;
            return Ok(Outcome::NotFound);
        }
    };
    let mode = metadata.permissions().mode();

    match target {
        Target::Static { path } => {
            if !metadata.is_file() || mode & OWNER_READ == 0 {
                send_error(stream, StatusCode::Forbidden, "Cannot read file", path)?;
                return Ok(Outcome::StaticForbidden);
            }
            serve_static(stream, &fs_path, path, metadata.len())
        }
        Target::Dynamic { path, query } => {
            if !metadata.is_file() || mode & OWNER_EXEC == 0 {
                send_error(stream, StatusCode::Forbidden, "Cannot execute CGI", path)?;
                return Ok(Outcome::DynamicForbidden);
            }
            serve_dynamic(stream, &fs_path, path, query, base_dir)
        }
    }
}

/// Mapea el archivo y lo envía completo en una sola pasada
fn serve_static(stream: &mut TcpStream, fs_path: &Path, path: &str, size: u64) -> io::Result<Outcome> {
    let fd = stream.as_raw_fd();
    info!("[FD={}] Serving static file: {} ({} bytes)", fd, path, size);

    let mapped = match usize::try_from(size)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "file too large to map"))
        .and_then(|len| MappedFile::open(fs_path, len))
    {
        Ok(mapped) => mapped,
        Err(e) => {
            error!("[FD={}] mmap of {} failed: {}", fd, path, e);
            send_error(stream, StatusCode::InternalServerError, "Cannot map file", path)?;
            return Ok(Outcome::ServerError);
        }
    };

    let head = Response::new(StatusCode::Ok)
        .with_server()
        .with_header("Content-Length", &mapped.len().to_string())
        .with_header("Content-Type", content_type(path));

    stream.write_all(&head.head_bytes())?;
    stream.write_all(mapped.as_slice())?;
    stream.flush()?;

    info!("[FD={}] Finished serving: {}", fd, path);
    Ok(Outcome::StaticOk)
}

/// Envía el 200 parcial y deja que el CGI escriba el resto
fn serve_dynamic(
    stream: &mut TcpStream,
    fs_path: &Path,
    path: &str,
    query: &str,
    base_dir: &Path,
) -> io::Result<Outcome> {
    let fd = stream.as_raw_fd();
    info!("[FD={}] Running CGI: {} Args: '{}'", fd, path, query);

    // Sin Content-Length: el largo lo decide el programa
    stream.write_all(&Response::new(StatusCode::Ok).with_server().open_head_bytes())?;
    stream.flush()?;

    let mut process = match CgiProcess::spawn(fs_path, query, stream, base_dir) {
        Ok(process) => process,
        Err(e) => {
            error!("[FD={}] fork for {} failed: {}", fd, path, e);
            send_error(stream, StatusCode::InternalServerError, "Failed to fork", path)?;
            return Ok(Outcome::ServerError);
        }
    };

    match process.wait() {
        Ok(status) if status.success() => {
            info!("[FD={}] CGI executed successfully (pid={})", fd, process.id());
        }
        Ok(status) => {
            warn!("[FD={}] CGI exited with error: {}", fd, status);
        }
        Err(e) => {
            error!("[FD={}] waitpid on CGI pid={} failed: {}", fd, process.id(), e);
        }
    }

    Ok(Outcome::DynamicOk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::resolve;
    use std::io::Read;
    use std::net::TcpListener;
    use std::path::PathBuf;

    fn socket_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (server, _) = listener.accept().unwrap();
        (server, client)
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cgi_httpd-emitter-{}-{}", std::process::id(), name));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_file(dir: &Path, name: &str, contents: &[u8], mode: u32) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
    }

    /// Emite para `uri` y devuelve (outcome, bytes recibidos por el cliente)
    fn emit_uri(dir: &Path, uri: &str) -> (Outcome, Vec<u8>) {
        let (mut server, mut client) = socket_pair();
        let outcome = emit(&mut server, dir, &resolve(uri)).unwrap();
        drop(server);

        let mut received = Vec::new();
        client.read_to_end(&mut received).unwrap();
        (outcome, received)
    }

    fn split_response(raw: &[u8]) -> (String, Vec<u8>) {
        let pos = raw.windows(4).position(|w| w == b"\r\n\r\n").expect("header terminator");
        (
            String::from_utf8_lossy(&raw[..pos + 4]).into_owned(),
            raw[pos + 4..].to_vec(),
        )
    }

    // ==================== Content-Type ====================

    #[test]
    fn test_content_types() {
        assert_eq!(content_type("./a.html"), "text/html");
        assert_eq!(content_type("./a.gif"), "image/gif");
        assert_eq!(content_type("./a.jpg"), "image/jpeg");
        assert_eq!(content_type("./a.jpeg"), "text/plain");
        assert_eq!(content_type("./a.txt"), "text/plain");
        assert_eq!(content_type("./README"), "text/plain");
    }

    // ==================== Static ====================

    #[test]
    fn test_static_ok_exact_bytes() {
        let dir = scratch_dir("static-ok");
        let data: Vec<u8> = (0..50_000u32).map(|i| (i * 7 % 251) as u8).collect();
        write_file(&dir, "img.gif", &data, 0o644);

        let (outcome, raw) = emit_uri(&dir, "/img.gif");
        assert_eq!(outcome, Outcome::StaticOk);

        let (head, body) = split_response(&raw);
        assert!(head.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(head.contains("Content-Type: image/gif\r\n"));
        assert!(head.contains(&format!("Content-Length: {}\r\n", data.len())));
        assert_eq!(body, data);
    }

    #[test]
    fn test_static_index_for_directory_uri() {
        let dir = scratch_dir("static-index");
        write_file(&dir, "docs/index.html", b"<h1>hi</h1>", 0o644);

        let (outcome, raw) = emit_uri(&dir, "/docs/");
        assert_eq!(outcome, Outcome::StaticOk);
        let (head, body) = split_response(&raw);
        assert!(head.contains("Content-Type: text/html\r\n"));
        assert_eq!(body, b"<h1>hi</h1>");
    }

    #[test]
    fn test_static_empty_file() {
        let dir = scratch_dir("static-empty");
        write_file(&dir, "empty.txt", b"", 0o644);

        let (outcome, raw) = emit_uri(&dir, "/empty.txt");
        assert_eq!(outcome, Outcome::StaticOk);
        let (head, body) = split_response(&raw);
        assert!(head.contains("Content-Length: 0\r\n"));
        assert!(body.is_empty());
    }

    #[test]
    fn test_static_not_found() {
        let dir = scratch_dir("static-404");

        let (outcome, raw) = emit_uri(&dir, "/missing.html");
        assert_eq!(outcome, Outcome::NotFound);
        let text = String::from_utf8_lossy(&raw);
        assert!(text.starts_with("HTTP/1.0 404 Not Found\r\n"));
        assert!(text.contains("./missing.html"));
    }

    #[test]
    fn test_static_without_owner_read() {
        let dir = scratch_dir("static-403");
        write_file(&dir, "secret.txt", b"nope", 0o044);

        let (outcome, raw) = emit_uri(&dir, "/secret.txt");
        assert_eq!(outcome, Outcome::StaticForbidden);
        assert!(String::from_utf8_lossy(&raw).starts_with("HTTP/1.0 403 Forbidden\r\n"));
    }

    #[test]
    fn test_static_directory_is_forbidden() {
        let dir = scratch_dir("static-dir");
        fs::create_dir_all(dir.join("sub")).unwrap();

        let (outcome, _) = emit_uri(&dir, "/sub");
        assert_eq!(outcome, Outcome::StaticForbidden);
    }

    // ==================== Dynamic ====================

    #[test]
    fn test_dynamic_ok() {
        let dir = scratch_dir("dynamic-ok");
        write_file(
            &dir,
            "cgi-bin/echo.cgi",
            b"#!/bin/sh\nprintf 'Content-Type: text/plain\\r\\n\\r\\n'\nprintf 'args=%s' \"$QUERY_STRING\"\n",
            0o755,
        );

        let (outcome, raw) = emit_uri(&dir, "/cgi-bin/echo.cgi?n=5&m=6");
        assert_eq!(outcome, Outcome::DynamicOk);

        let text = String::from_utf8_lossy(&raw);
        assert!(text.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(!text.contains("Content-Length"));
        assert!(text.ends_with("\r\n\r\nargs=n=5&m=6"));
    }

    #[test]
    fn test_dynamic_failing_program_still_200() {
        let dir = scratch_dir("dynamic-fail");
        write_file(&dir, "broken.cgi", b"#!/bin/sh\nexit 7\n", 0o755);

        let (outcome, raw) = emit_uri(&dir, "/broken.cgi");
        assert_eq!(outcome, Outcome::DynamicOk);
        assert!(String::from_utf8_lossy(&raw).starts_with("HTTP/1.0 200 OK\r\n"));
    }

    #[test]
    fn test_dynamic_without_owner_exec() {
        let dir = scratch_dir("dynamic-403");
        write_file(&dir, "plain.cgi", b"#!/bin/sh\necho hi\n", 0o644);

        let (outcome, raw) = emit_uri(&dir, "/plain.cgi");
        assert_eq!(outcome, Outcome::DynamicForbidden);
        assert!(String::from_utf8_lossy(&raw).starts_with("HTTP/1.0 403 Forbidden\r\n"));
    }

    #[test]
    fn test_dynamic_not_found() {
        let dir = scratch_dir("dynamic-404");

        let (outcome, raw) = emit_uri(&dir, "/cgi-bin/none.cgi?1");
        assert_eq!(outcome, Outcome::NotFound);
        assert!(String::from_utf8_lossy(&raw).contains("./cgi-bin/none.cgi"));
    }

    #[test]
    fn test_dynamic_exec_failure_keeps_bare_200() {
        let dir = scratch_dir("dynamic-exec-fail");
        // Ejecutable pero sin intérprete válido: el execve falla en el hijo
        write_file(&dir, "bad.cgi", b"#!/nonexistent/interpreter\n", 0o755);

        let (outcome, raw) = emit_uri(&dir, "/bad.cgi");
        assert_eq!(outcome, Outcome::DynamicOk);
        assert_eq!(raw, b"HTTP/1.0 200 OK\r\nServer: cgi_httpd\r\n");
    }
}
