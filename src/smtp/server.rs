//! SMTP server implementation

use crate::config::ServerConfig;
use crate::smtp::commands::SmtpCommandHandler;
use crate::smtp::error::SmtpError;
use crate::smtp::queue::{DeliveryQueue, DeliveryWorker};
use crate::smtp::response::SmtpResponse;
use crate::smtp::session::{SmtpSession, SmtpState};
use crate::store::MailStore;

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info, warn};

/// SMTP server accepting mail for the addresses registered in its store
#[derive(Clone)]
pub struct SmtpServer {
    config: ServerConfig,
    store: Arc<dyn MailStore>,
}

impl SmtpServer {
    /// Create a new SMTP server and register the configured well-known
    /// addresses in `store`
    pub fn new(config: ServerConfig, store: Arc<dyn MailStore>) -> Result<Self, SmtpError> {
        for addr in config.well_known_addresses() {
            store.register(&addr)?;
            debug!(address = %addr, "registered well-known mailbox");
        }
        Ok(Self { config, store })
    }

    /// The store this server delivers into
    pub fn store(&self) -> &Arc<dyn MailStore> {
        &self.store
    }

    /// Bind the configured address and serve forever (blocking)
    pub fn start(&self) -> Result<(), SmtpError> {
        let listener = TcpListener::bind(&self.config.listen_addr)?;
        self.start_with_listener(listener)
    }

    /// Serve connections from an existing listener (blocking).
    ///
    /// Starts the delivery worker, then runs every accepted connection on its
    /// own thread.
    pub fn start_with_listener(&self, listener: TcpListener) -> Result<(), SmtpError> {
        info!(addr = %listener.local_addr()?, "SMTP server listening");

        let (queue, receiver) = DeliveryQueue::bounded(self.config.queue_capacity);
        let _worker = DeliveryWorker::spawn(receiver, Arc::clone(&self.store))?;

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => self.spawn_session(stream, queue.clone()),
                Err(e) => {
                    error!(error = %e, "error accepting connection");
                }
            }
        }

        Ok(())
    }

    fn spawn_session(&self, stream: TcpStream, queue: DeliveryQueue) {
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        let server = self.clone();

        let spawned = thread::Builder::new()
            .name(format!("session-{peer}"))
            .spawn(move || {
                info!(%peer, "connection accepted");
                match server.handle_client(stream, &queue) {
                    Ok(()) => info!(%peer, "connection closed"),
                    Err(e) => warn!(%peer, error = %e, "session ended with error"),
                }
            });

        if let Err(e) = spawned {
            error!(error = %e, "failed to spawn session thread");
        }
    }

    /// Handle a client connection
    fn handle_client(&self, stream: TcpStream, queue: &DeliveryQueue) -> Result<(), SmtpError> {
        let reader = BufReader::new(stream.try_clone()?);
        self.serve(reader, stream, queue)
    }

    /// Run one session to completion over a reader/writer pair.
    ///
    /// Returns when the client quits or the input ends. Only transport
    /// failures are returned as errors; protocol errors are answered.
    pub fn serve<R: BufRead, W: Write>(
        &self,
        mut reader: R,
        mut writer: W,
        queue: &DeliveryQueue,
    ) -> Result<(), SmtpError> {
        let command_handler = SmtpCommandHandler::new(&self.config.hostname, self.store.as_ref());
        let mut session = SmtpSession::new();

        self.send_response(&mut writer, &SmtpResponse::greeting(&self.config.hostname))?;

        let mut line_buffer = Vec::new();
        while session.state != SmtpState::Closed {
            line_buffer.clear();

            if reader.read_until(b'\n', &mut line_buffer)? == 0 {
                if session.in_data_mode() {
                    debug!("input ended during DATA, discarding message");
                }
                break;
            }

            let line = String::from_utf8_lossy(&line_buffer);
            let line = line.trim_end_matches(['\r', '\n']);

            if session.in_data_mode() {
                if line == "." {
                    let response = match self.complete_message(&mut session, queue) {
                        Ok(()) => SmtpResponse::ok(),
                        Err(e) => error_response(&e),
                    };
                    self.send_response(&mut writer, &response)?;
                } else if let Err(e) = session.add_data_line(line) {
                    session.reset();
                    self.send_response(&mut writer, &error_response(&e))?;
                }
                continue;
            }

            let response = match command_handler.process_command(line, &mut session) {
                Ok(response) => response,
                Err(e) => {
                    match &e {
                        SmtpError::InvalidCommand(verb) => warn!(%verb, "unrecognized command"),
                        _ => debug!(code = e.to_response_code(), error = %e, "command refused"),
                    }
                    error_response(&e)
                }
            };
            self.send_response(&mut writer, &response)?;
        }

        Ok(())
    }

    fn complete_message(
        &self,
        session: &mut SmtpSession,
        queue: &DeliveryQueue,
    ) -> Result<(), SmtpError> {
        let message = session.finish_data_collection()?;
        debug!(
            from = %message.from,
            recipients = message.to.len(),
            size = message.body_size(),
            "message accepted"
        );
        queue.enqueue(message)
    }

    /// Send a response to the client
    fn send_response<W: Write>(
        &self,
        writer: &mut W,
        response: &SmtpResponse,
    ) -> Result<(), SmtpError> {
        writer.write_all(response.format().as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

fn error_response(e: &SmtpError) -> SmtpResponse {
    SmtpResponse::error(e.to_response_code(), &e.to_response_message())
}
