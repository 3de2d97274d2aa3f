//! UDP link to the looper and the session lister

use super::command::{Destination, RemoteCommand};
use super::feedback::{Feedback, FeedbackError};
use anyhow::{Context, Result};
use rosc::{encoder, OscPacket};
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::{debug, info, trace};

/// Largest datagram accepted from the looper
const RECV_BUFFER: usize = rosc::decoder::MTU;

/// Bound feedback socket plus the two remote endpoints
pub struct LooperLink {
    socket: UdpSocket,
    looper: SocketAddr,
    lister: SocketAddr,
    buf: Vec<u8>,
}

async fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    tokio::net::lookup_host((host, port))
        .await
        .with_context(|| format!("Failed to resolve {}:{}", host, port))?
        .next()
        .with_context(|| format!("No address for {}:{}", host, port))
}

impl LooperLink {
    /// Bind the local feedback port and resolve both remotes
    pub async fn bind(
        local_port: u16,
        looper: (&str, u16),
        lister: (&str, u16),
    ) -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", local_port))
            .await
            .with_context(|| format!("Failed to bind feedback port {}", local_port))?;
        let looper = resolve(looper.0, looper.1).await?;
        let lister = resolve(lister.0, lister.1).await?;

        info!(
            "Looper link on {} -> looper {}, sessions {}",
            socket.local_addr()?,
            looper,
            lister
        );

        Ok(Self {
            socket,
            looper,
            lister,
            buf: vec![0u8; RECV_BUFFER],
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub async fn send(&self, command: &RemoteCommand) -> Result<()> {
        let target = match command.destination() {
            Destination::Looper => self.looper,
            Destination::SessionLister => self.lister,
        };
        let bytes = encoder::encode(&OscPacket::Message(command.to_osc()))
            .map_err(|e| anyhow::anyhow!("OSC encode failed: {:?}", e))?;
        self.socket
            .send_to(&bytes, target)
            .await
            .with_context(|| format!("Failed to send {} to {}", command.address(), target))?;
        trace!("-> {} {}", target, command);
        Ok(())
    }

    /// Wait for the next datagram and parse it
    pub async fn recv(&mut self) -> Result<Vec<Result<Feedback, FeedbackError>>> {
        let (len, from) = self
            .socket
            .recv_from(&mut self.buf)
            .await
            .context("Feedback socket receive failed")?;
        let parsed = Feedback::from_datagram(&self.buf[..len]);
        if parsed.is_empty() {
            debug!("Empty bundle from {}", from);
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::looper::command::Target;
    use rosc::{OscMessage, OscType};

    #[tokio::test]
    async fn test_commands_reach_their_destination() {
        let looper = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let lister = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let looper_port = looper.local_addr().unwrap().port();
        let lister_port = lister.local_addr().unwrap().port();

        let link = LooperLink::bind(0, ("127.0.0.1", looper_port), ("127.0.0.1", lister_port))
            .await
            .unwrap();

        link.send(&RemoteCommand::hit(Target::Track(0), "record"))
            .await
            .unwrap();
        link.send(&RemoteCommand::sessions("127.0.0.1", 9952))
            .await
            .unwrap();

        let mut buf = [0u8; 1024];
        let (len, _) = looper.recv_from(&mut buf).await.unwrap();
        let (_, packet) = rosc::decoder::decode_udp(&buf[..len]).unwrap();
        match packet {
            OscPacket::Message(msg) => {
                assert_eq!(msg.addr, "/sl/0/hit");
                assert_eq!(msg.args, vec![OscType::String("record".into())]);
            }
            other => panic!("unexpected packet {:?}", other),
        }

        let (len, _) = lister.recv_from(&mut buf).await.unwrap();
        let (_, packet) = rosc::decoder::decode_udp(&buf[..len]).unwrap();
        assert!(matches!(packet, OscPacket::Message(ref m) if m.addr == "/sessions"));
    }

    #[tokio::test]
    async fn test_feedback_is_parsed() {
        let mut link = LooperLink::bind(0, ("127.0.0.1", 9), ("127.0.0.1", 9))
            .await
            .unwrap();
        let port = link.local_addr().unwrap().port();

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let bytes = encoder::encode(&OscPacket::Message(OscMessage {
            addr: "/pong".into(),
            args: vec![],
        }))
        .unwrap();
        sender.send_to(&bytes, ("127.0.0.1", port)).await.unwrap();

        let parsed = link.recv().await.unwrap();
        assert_eq!(parsed, vec![Ok(Feedback::Pong(None))]);
    }
}
