//! # Servidor Event Loop
//! src/server/event_loop.rs
//!
//! Un solo thread dueño de un `mio::Poll` con el listener y todas las
//! conexiones abiertas:
//!
//! 1. Bloquea hasta que algo esté listo
//! 2. Listener listo → acepta todo lo pendiente y lo registra para lectura
//! 3. Conexión lista → la saca del poll, la pasa a modo bloqueante,
//!    ejecuta el handler y la cierra
//!
//! El procesamiento es bloqueante: un CGI lento detiene todo el loop.

use crate::connection::Connection;
use crate::error::ServerError;
use crate::handler::{RequestHandler, ServeConnection};
use log::{debug, info, warn};
use mio::net::{TcpListener as MioTcpListener, TcpStream as MioTcpStream};
use mio::{Events, Interest, Poll, Token};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::os::fd::{FromRawFd, IntoRawFd};

const LISTENER: Token = Token(0);

/// Servidor de un solo thread basado en readiness
pub struct EventLoopServer {
    poll: Poll,
    listener: MioTcpListener,
    connections: HashMap<Token, MioTcpStream>,
    next_token: usize,
    max_events: usize,
    handler: RequestHandler,
}

impl EventLoopServer {
    /// Hace bind y registra el listener en un poll nuevo
    ///
    /// Cualquier error aquí es fatal para el proceso.
    pub fn bind(address: &str, max_events: usize, handler: RequestHandler) -> Result<Self, ServerError> {
        let bind_error = |source| ServerError::Bind {
            address: address.to_string(),
            source,
        };

        let std_listener = TcpListener::bind(address).map_err(bind_error)?;
        std_listener.set_nonblocking(true).map_err(bind_error)?;
        let mut listener = MioTcpListener::from_std(std_listener);

        let poll = Poll::new().map_err(ServerError::Poll)?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)
            .map_err(ServerError::Register)?;

        Ok(Self {
            poll,
            listener,
            connections: HashMap::new(),
            next_token: LISTENER.0 + 1,
            max_events: max_events.max(1),
            handler,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Loop principal. Solo retorna si `poll` falla.
    pub fn run(&mut self) -> Result<(), ServerError> {
        info!("Event loop listening on {}", self.local_addr()?);

        let mut events = Events::with_capacity(self.max_events);
        loop {
            if let Err(e) = self.poll.poll(&mut events, None) {
                if e.kind() == ErrorKind::Interrupted {
                    continue;
                }
                return Err(ServerError::Poll(e));
            }

            for event in events.iter() {
                match event.token() {
                    LISTENER => self.accept_pending(),
                    token => self.dispatch(token),
                }
            }
        }
    }

    /// Acepta hasta vaciar el backlog del listener
    fn accept_pending(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((mut stream, peer)) => {
                    let token = Token(self.next_token);
                    self.next_token += 1;

                    if let Err(e) = self.poll.registry().register(&mut stream, token, Interest::READABLE) {
                        // Solo se pierde esta conexión
                        warn!("Failed to register connection from {}: {}", peer, e);
                        continue;
                    }

                    debug!("Accepted connection from {} as {:?}", peer, token);
                    self.connections.insert(token, stream);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    break;
                }
            }
        }
    }

    /// Atiende una conexión lista para lectura y la cierra
    fn dispatch(&mut self, token: Token) {
        let Some(mut stream) = self.connections.remove(&token) else {
            return;
        };

        if let Err(e) = self.poll.registry().deregister(&mut stream) {
            warn!("Failed to deregister {:?}: {}", token, e);
        }

        // El handler trabaja con un socket bloqueante
        let stream = unsafe { TcpStream::from_raw_fd(stream.into_raw_fd()) };
        if let Err(e) = stream.set_nonblocking(false) {
            warn!("Failed to switch {:?} to blocking mode: {}", token, e);
            return;
        }

        let mut conn = Connection::new(stream);
        self.handler.serve(&mut conn);
    }
}
