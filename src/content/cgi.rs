//! # Procesos CGI
//! src/content/cgi.rs
//!
//! `fork` + `execve` del ejecutable con un argv vacío, el entorno heredado
//! más `QUERY_STRING`, stdin en `/dev/null` y stdout apuntando al socket del
//! cliente. El hijo queda envuelto en `CgiProcess`, que garantiza el
//! `waitpid` aunque el caller salga antes por un error. No hay timeout ni
//! kill: un CGI colgado retiene al worker.
//!
//! Solo un fallo de `fork` se reporta como error al caller. Si el `execve`
//! falla, el hijo termina con código 1 y eso se ve en `wait`.

use std::env;
use std::ffi::{CString, OsStr};
use std::io;
use std::net::TcpStream;
use std::os::raw::c_char;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::ExitStatus;
use std::ptr;

/// Variable de entorno con el query string crudo
pub const QUERY_ENV: &str = "QUERY_STRING";

/// Código con el que termina el hijo si no pudo ejecutar el programa
pub const EXEC_FAILED_CODE: i32 = 1;

const DEV_NULL: &[u8] = b"/dev/null\0";

/// Hijo CGI que siempre se cosecha
pub struct CgiProcess {
    pid: libc::pid_t,
    status: Option<ExitStatus>,
}

impl CgiProcess {
    /// Lanza `program` con stdout redirigido a `output`
    ///
    /// Todo lo que necesita el hijo se arma antes del `fork`: entre `fork` y
    /// `execve` solo se hacen llamadas async-signal-safe. El socket de
    /// `output` sigue siendo del caller.
    pub fn spawn(program: &Path, query: &str, output: &TcpStream, working_dir: &Path) -> io::Result<Self> {
        let program = to_cstring(program.as_os_str())?;
        let working_dir = to_cstring(working_dir.as_os_str())?;
        let environment = child_environment(query);

        let mut envp: Vec<*const c_char> = environment.iter().map(|var| var.as_ptr()).collect();
        envp.push(ptr::null());
        let argv: [*const c_char; 1] = [ptr::null()];
        let socket = output.as_raw_fd();

        match unsafe { libc::fork() } {
            -1 => Err(io::Error::last_os_error()),
            0 => unsafe { exec_child(&program, &argv, &envp, &working_dir, socket) },
            pid => Ok(Self { pid, status: None }),
        }
    }

    pub fn id(&self) -> u32 {
        self.pid as u32
    }

    /// Espera a que el hijo termine y devuelve su estado de salida
    pub fn wait(&mut self) -> io::Result<ExitStatus> {
        if let Some(status) = self.status {
            return Ok(status);
        }

        let mut raw = 0;
        loop {
            if unsafe { libc::waitpid(self.pid, &mut raw, 0) } == self.pid {
                break;
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }

        let status = ExitStatus::from_raw(raw);
        self.status = Some(status);
        Ok(status)
    }
}

impl Drop for CgiProcess {
    fn drop(&mut self) {
        if self.status.is_none() {
            if let Err(e) = self.wait() {
                log::error!("[CGI pid={}] could not reap child: {}", self.pid, e);
            }
        }
    }
}

/// Lado del hijo: redirige stdin/stdout, cambia de directorio y ejecuta
///
/// Nunca retorna. Ninguna de estas llamadas reserva memoria.
unsafe fn exec_child(
    program: &CString,
    argv: &[*const c_char],
    envp: &[*const c_char],
    working_dir: &CString,
    socket: RawFd,
) -> ! {
    let null = libc::open(DEV_NULL.as_ptr() as *const c_char, libc::O_RDONLY);
    if null > libc::STDIN_FILENO {
        libc::dup2(null, libc::STDIN_FILENO);
        libc::close(null);
    }

    if libc::dup2(socket, libc::STDOUT_FILENO) < 0 || libc::chdir(working_dir.as_ptr()) < 0 {
        libc::_exit(EXEC_FAILED_CODE);
    }

    libc::execve(program.as_ptr(), argv.as_ptr(), envp.as_ptr());
    libc::_exit(EXEC_FAILED_CODE)
}

/// Entorno heredado con `QUERY_STRING` reemplazado
///
/// El query se corta en el primer NUL, igual que lo haría un string de C.
fn child_environment(query: &str) -> Vec<CString> {
    let query = query.split('\0').next().unwrap_or_default();

    let mut environment: Vec<CString> = env::vars_os()
        .filter(|(key, _)| key.as_os_str() != QUERY_ENV)
        .filter_map(|(key, value)| {
            let mut entry = key.as_bytes().to_vec();
            entry.push(b'=');
            entry.extend_from_slice(value.as_bytes());
            CString::new(entry).ok()
        })
        .collect();

    environment.extend(CString::new(format!("{}={}", QUERY_ENV, query)).ok());
    environment
}

fn to_cstring(value: &OsStr) -> io::Result<CString> {
    CString::new(value.as_bytes()).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}
