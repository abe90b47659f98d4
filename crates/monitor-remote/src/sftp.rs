//! SFTP transport on top of `libssh2`.

use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use monitor_core::config::ConnectionConfig;
use monitor_core::error::{ConnectionError, TransferError};
use ssh2::{ErrorCode, Session, Sftp};

use crate::transport::{Connector, Transport};

/// SFTP status code for a missing file (`LIBSSH2_FX_NO_SUCH_FILE`).
const FX_NO_SUCH_FILE: i32 = 2;

/// Opens password-authenticated SFTP sessions.
#[derive(Debug, Clone)]
pub struct SftpConnector {
    timeout: Duration,
}

impl SftpConnector {
    /// `timeout` bounds the TCP connect and every blocking SSH call made on
    /// the resulting session, including file reads.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Connector for SftpConnector {
    type Transport = SftpTransport;

    fn connect(&self, config: &ConnectionConfig) -> Result<SftpTransport, ConnectionError> {
        let host = config.hostname.as_str();
        let port = config.port;

        let addr = (host, port)
            .to_socket_addrs()
            .map_err(|e| ConnectionError::Resolve {
                host: host.to_string(),
                port,
                reason: e.to_string(),
            })?
            .next()
            .ok_or_else(|| ConnectionError::Resolve {
                host: host.to_string(),
                port,
                reason: "no addresses returned".to_string(),
            })?;

        tracing::debug!(%addr, timeout_secs = self.timeout.as_secs(), "opening tcp connection");
        let tcp = TcpStream::connect_timeout(&addr, self.timeout).map_err(|source| {
            ConnectionError::Unreachable {
                host: host.to_string(),
                port,
                source,
            }
        })?;

        let handshake_err = |e: ssh2::Error| ConnectionError::Handshake {
            host: host.to_string(),
            message: e.to_string(),
        };
        let mut session = Session::new().map_err(handshake_err)?;
        session.set_timeout(timeout_millis(self.timeout));
        session.set_tcp_stream(tcp);
        session.handshake().map_err(handshake_err)?;

        session
            .userauth_password(&config.username, config.password.expose())
            .map_err(|e| ConnectionError::Authentication {
                username: config.username.clone(),
                message: e.to_string(),
            })?;
        if !session.authenticated() {
            return Err(ConnectionError::Authentication {
                username: config.username.clone(),
                message: "server did not accept the credentials".to_string(),
            });
        }

        let sftp = session
            .sftp()
            .map_err(|e| ConnectionError::Channel(e.to_string()))?;

        tracing::info!(host, port, user = %config.username, "sftp session established");
        Ok(SftpTransport {
            session: Some(session),
            sftp: Some(sftp),
        })
    }
}

/// An authenticated SFTP session.
pub struct SftpTransport {
    session: Option<Session>,
    sftp: Option<Sftp>,
}

impl Transport for SftpTransport {
    fn read_file(&mut self, remote_path: &str) -> Result<Vec<u8>, TransferError> {
        let sftp = self.sftp.as_ref().ok_or(TransferError::Closed)?;

        let mut file = sftp.open(Path::new(remote_path)).map_err(|e| {
            if matches!(e.code(), ErrorCode::SFTP(FX_NO_SUCH_FILE)) {
                TransferError::NotFound(remote_path.to_string())
            } else {
                TransferError::Remote {
                    path: remote_path.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .map_err(|e| TransferError::Remote {
                path: remote_path.to_string(),
                message: e.to_string(),
            })?;
        Ok(buf)
    }

    fn close(&mut self) {
        // The channel has to go before the session it runs on.
        drop(self.sftp.take());
        if let Some(session) = self.session.take() {
            if let Err(e) = session.disconnect(None, "monitoring stopped", None) {
                tracing::debug!(error = %e, "ssh disconnect failed");
            }
            tracing::debug!("sftp session closed");
        }
    }
}

impl Drop for SftpTransport {
    fn drop(&mut self) {
        self.close();
    }
}

/// libssh2 takes milliseconds as `u32`; `0` would mean "no timeout".
fn timeout_millis(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX).max(1)
}
