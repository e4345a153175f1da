//! UdpTransport - fire-and-forget datagram per publish

use contracts::{ContractError, MessageId, PublishRequest, PublishTransport};
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::{debug, instrument, warn};

/// Largest payload a single IPv4 UDP datagram can carry
const MAX_DATAGRAM: usize = 65_507;

/// Transport that sends each payload as one UDP datagram
pub struct UdpTransport {
    name: String,
    target: SocketAddr,
    socket: Option<UdpSocket>,
    next_id: u32,
}

impl UdpTransport {
    /// Bind an ephemeral local port and connect to `target`
    #[instrument(name = "udp_transport_new", skip(name))]
    pub async fn new(name: impl Into<String>, target: SocketAddr) -> std::io::Result<Self> {
        let name = name.into();
        let local: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(target).await?;

        debug!(transport = %name, target = %target, "UdpTransport connected");

        Ok(Self {
            name,
            target,
            socket: Some(socket),
            next_id: 1,
        })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    fn socket(&self) -> Result<&UdpSocket, ContractError> {
        self.socket
            .as_ref()
            .ok_or_else(|| ContractError::publish(&self.name, "transport closed"))
    }
}

impl PublishTransport for UdpTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "udp_transport_publish",
        skip(self, request),
        fields(transport = %self.name, bytes = request.payload.len())
    )]
    async fn publish(&mut self, request: &PublishRequest) -> Result<MessageId, ContractError> {
        if request.payload.len() > MAX_DATAGRAM {
            warn!(
                transport = %self.name,
                bytes = request.payload.len(),
                "Payload exceeds datagram size"
            );
            return Err(ContractError::publish(
                &self.name,
                format!("payload of {} bytes exceeds datagram size", request.payload.len()),
            ));
        }

        self.socket()?
            .send(&request.payload)
            .await
            .map_err(|e| ContractError::publish(&self.name, e.to_string()))?;

        let id = MessageId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        Ok(id)
    }

    #[instrument(name = "udp_transport_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.socket = None;
        debug!(transport = %self.name, "UdpTransport closed");
        Ok(())
    }
}
