//! # Handler de Requests
//! src/handler/mod.rs
//!
//! Atiende una conexión de principio a fin:
//!
//! ```text
//! RECEIVED → PARSED → { STATIC_OK | STATIC_FORBIDDEN | DYNAMIC_OK | DYNAMIC_FORBIDDEN
//!                     | NOT_FOUND | METHOD_REJECTED | METRICS | SERVER_ERROR }
//!                   → RESPONSE_SENT
//! ```
//!
//! Un solo `read` en un buffer fijo; si no llega nada, no se responde. El
//! handler nunca cierra la conexión: eso lo hace quien la posee (el event
//! loop o el worker) al hacer drop.
//!
//! Es el mismo handler para los dos modos. La única diferencia es si tiene
//! o no un `MetricsProvider` para responder `/metrics`.

use crate::connection::Connection;
use crate::content::{self, Target};
use crate::http::{Method, Request, Response, StatusCode};
use crate::metrics::MetricsProvider;
use log::{debug, info, warn};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Tamaño del buffer de lectura del request
pub const REQUEST_BUFFER_SIZE: usize = 8192;

/// Path reservado para las métricas del pool
pub const METRICS_PATH: &str = "/metrics";

/// Estado terminal de una conexión
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    StaticOk,
    StaticForbidden,
    DynamicOk,
    DynamicForbidden,
    NotFound,
    MethodRejected,
    Metrics,

    /// 500: no se pudo lanzar el CGI o mapear el archivo
    ServerError,

    /// El `read` inicial devolvió 0 o falló; no se envió nada
    ReceiveFailed,

    /// El cliente se fue mientras se escribía la respuesta
    SendFailed,
}

impl Outcome {
    /// Código HTTP enviado, si se envió alguno
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Outcome::StaticOk | Outcome::DynamicOk | Outcome::Metrics => Some(StatusCode::Ok),
            Outcome::StaticForbidden | Outcome::DynamicForbidden => Some(StatusCode::Forbidden),
            Outcome::NotFound => Some(StatusCode::NotFound),
            Outcome::MethodRejected => Some(StatusCode::NotImplemented),
            Outcome::ServerError => Some(StatusCode::InternalServerError),
            Outcome::ReceiveFailed | Outcome::SendFailed => None,
        }
    }
}

/// Algo que sabe atender una conexión ya aceptada
///
/// Es la costura entre el pool y el handler: los workers solo conocen este
/// trait, lo que permite probar el pool con handlers falsos.
pub trait ServeConnection: Send + Sync {
    fn serve(&self, conn: &mut Connection);
}

/// Handler de archivos estáticos, CGI y `/metrics`
pub struct RequestHandler {
    /// Raíz contra la que se resuelven los paths `./...`
    base_dir: PathBuf,

    metrics: Option<Arc<dyn MetricsProvider>>,
}

impl RequestHandler {
    /// Crea un handler sin métricas (modo event loop)
    ///
    /// `base_dir` debería ser absoluto: los CGI corren con él como
    /// directorio actual.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            metrics: None,
        }
    }

    /// Habilita `/metrics` con el proveedor indicado
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsProvider>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Lee, parsea y responde. Devuelve el estado terminal alcanzado.
    pub fn handle(&self, conn: &mut Connection) -> Outcome {
        let fd = conn.fd();
        let mut buffer = [0u8; REQUEST_BUFFER_SIZE];

        let bytes_read = match conn.stream_mut().read(&mut buffer) {
            Ok(0) => {
                warn!("[FD={}] Failed to receive data: connection closed by peer", fd);
                return Outcome::ReceiveFailed;
            }
            Ok(n) => n,
            Err(e) => {
                warn!("[FD={}] Failed to receive data: {}", fd, e);
                return Outcome::ReceiveFailed;
            }
        };

        let request = Request::parse(&buffer[..bytes_read]);
        info!(
            "[FD={}] Received request: Method={} URI={} Version={}",
            fd,
            request.method().as_str(),
            request.uri(),
            request.version()
        );

        match self.respond(conn, &request) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("[FD={}] Failed to send response: {}", fd, e);
                Outcome::SendFailed
            }
        }
    }

    fn respond(&self, conn: &mut Connection, request: &Request) -> io::Result<Outcome> {
        let stream = conn.stream_mut();

        if let Method::Other(method) = request.method() {
            content::send_error(stream, StatusCode::NotImplemented, "HTTP method not supported", method)?;
            return Ok(Outcome::MethodRejected);
        }

        if request.uri() == METRICS_PATH {
            if let Some(metrics) = &self.metrics {
                let body = metrics.snapshot().to_text();
                Response::text(StatusCode::Ok, &body).write_to(stream)?;
                return Ok(Outcome::Metrics);
            }
        }

        let target = content::resolve(request.uri());
        match &target {
            Target::Static { path } => debug!("Parsed URI '{}' as static: {}", request.uri(), path),
            Target::Dynamic { path, query } => {
                debug!("Parsed URI '{}' as dynamic: {} Args: '{}'", request.uri(), path, query)
            }
        }

        content::emit(stream, &self.base_dir, &target)
    }
}

impl ServeConnection for RequestHandler {
    fn serve(&self, conn: &mut Connection) {
        let start = Instant::now();
        let outcome = self.handle(conn);

        let status = outcome
            .status()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "no response".to_string());
        info!(
            "[FD={}] {} in {:.2}ms (waited {:.2}ms)",
            conn.fd(),
            status,
            start.elapsed().as_secs_f64() * 1000.0,
            start.duration_since(conn.arrived_at()).as_secs_f64() * 1000.0
        );
    }
}
