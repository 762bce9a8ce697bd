//! # cgi_httpd - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor HTTP/1.0.
//!
//! Parsea la configuración, inicializa los logs y arranca el modo elegido.
//! Cualquier error de arranque termina el proceso con código 1.

use cgi_httpd::config::{Config, ServerMode};
use cgi_httpd::error::ServerError;
use cgi_httpd::handler::RequestHandler;
use cgi_httpd::server::{EventLoopServer, PoolServer};
use cgi_httpd::workers::PoolConfig;
use log::{error, info};

fn main() {
    let config = Config::new();

    pretty_env_logger::formatted_builder()
        .parse_filters(&config.log_level)
        .init();

    if let Err(e) = run(config) {
        error!("💥 Fatal error: {}", e);
        std::process::exit(1);
    }
}

fn run(config: Config) -> Result<(), ServerError> {
    config.validate().map_err(ServerError::Config)?;
    let base_dir = config.resolve_base_dir()?;

    config.print_summary();
    info!("Serving files from {}", base_dir.display());

    match config.mode {
        ServerMode::EventLoop => {
            let handler = RequestHandler::new(base_dir);
            let mut server = EventLoopServer::bind(&config.address(), config.max_events, handler)?;
            server.run()
        }
        ServerMode::Pool => {
            let server = PoolServer::bind(&config.address(), base_dir, PoolConfig::from_config(&config))?;
            server.run()
        }
    }
}
