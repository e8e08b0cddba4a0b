//! TCP Server
//!
//! Exposes a simulated servo as a bus endpoint. The bus is half-duplex with a
//! single master, so connections are served one at a time.

use std::io;
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::device::SimulatedServo;
use crate::error::Result;
use crate::protocol::Id;
use crate::storage::FileStorage;

use super::Connection;

/// How often the accept loop checks for shutdown
const ACCEPT_POLL: Duration = Duration::from_millis(20);

/// TCP server for a simulated device
pub struct Server {
    config: Config,
    listener: TcpListener,
    local_addr: SocketAddr,
    servo: SimulatedServo,
    storage: FileStorage,
    device_id: Option<Id>,
    shutdown: Arc<AtomicBool>,
}

impl Server {
    /// Bind the listen address and open the control table storage
    ///
    /// Fails with [`BioloidError::Config`](crate::BioloidError::Config) when
    /// the config does not validate.
    pub fn bind(config: Config, servo: SimulatedServo) -> Result<Self> {
        config.validate()?;
        let listener = TcpListener::bind(&config.listen_addr)?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;
        let storage = FileStorage::new(&config.storage_path);

        tracing::info!(
            "Listening on {}, storage {}",
            local_addr,
            config.storage_path.display()
        );

        Ok(Self {
            config,
            listener,
            local_addr,
            servo,
            storage,
            device_id: None,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Program this id into the table whenever it is loaded
    pub fn with_device_id(mut self, id: Id) -> Self {
        self.device_id = Some(id);
        self
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Flag that stops [`run`](Self::run) when set
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn servo(&self) -> &SimulatedServo {
        &self.servo
    }

    /// Accept and serve connections until shutdown (blocking)
    pub fn run(&mut self) -> Result<()> {
        while !self.shutdown.load(Ordering::Relaxed) {
            let (stream, addr) = match self.listener.accept() {
                Ok(accepted) => accepted,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    std::thread::sleep(ACCEPT_POLL);
                    continue;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };

            tracing::info!("Bus master connected from {}", addr);
            stream.set_nonblocking(false)?;

            let served = Connection::new(
                stream,
                &mut self.servo,
                &mut self.storage,
                &self.config,
                self.device_id,
                Arc::clone(&self.shutdown),
            )
            .and_then(|mut conn| conn.handle());

            if let Err(e) = served {
                tracing::warn!("Connection from {} failed: {}", addr, e);
            }
        }

        tracing::info!("Server on {} stopped", self.local_addr);
        Ok(())
    }
}
