//! Packet transport collaborators.
//!
//! Plugins only ever see [`PacketTransport`]. The stream implementations here
//! carry one JSON packet per line, which is what the service binary uses on
//! stdin/stdout.

use crate::error::{transport_error, Error, PluginResult};
use crate::packet::NetworkPacket;
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Stdout};
use tokio::sync::Mutex;

/// Delivers packets to the paired device
#[async_trait]
pub trait PacketTransport: Send + Sync {
    /// Send one packet
    async fn send_packet(&self, packet: NetworkPacket) -> PluginResult<()>;
}

/// Transport writing newline-delimited JSON packets to an async writer
pub struct LineTransport<W> {
    writer: Mutex<W>,
}

impl LineTransport<Stdout> {
    /// Transport on the process's standard output
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W> LineTransport<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Get the underlying writer back
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W> PacketTransport for LineTransport<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send_packet(&self, packet: NetworkPacket) -> PluginResult<()> {
        let mut line = packet.to_json()?;
        line.push('\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| transport_error(&format!("Failed to write packet: {}", e)))?;
        writer
            .flush()
            .await
            .map_err(|e| transport_error(&format!("Failed to flush packet: {}", e)))?;

        Ok(())
    }
}

/// Reads newline-delimited JSON packets from an async reader
pub struct PacketReader<R> {
    reader: R,
    line: Vec<u8>,
}

impl<R> PacketReader<R>
where
    R: AsyncBufRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
        }
    }

    /// Read the next packet, skipping blank lines
    ///
    /// Returns `Ok(None)` at end of input. A line that is not a valid packet,
    /// including one that is not UTF-8, yields [`Error::Serialization`] and the
    /// reader can keep going.
    pub async fn next_packet(&mut self) -> PluginResult<Option<NetworkPacket>> {
        loop {
            self.line.clear();
            let read = self.reader.read_until(b'\n', &mut self.line).await?;
            if read == 0 {
                return Ok(None);
            }

            // The whole line is already consumed, so a bad one can be skipped
            let text = std::str::from_utf8(&self.line)
                .map_err(|e| Error::Serialization(format!("Packet is not UTF-8: {}", e)))?;
            let trimmed = text.trim();
            if trimmed.is_empty() {
                continue;
            }

            return NetworkPacket::from_json(trimmed).map(Some);
        }
    }
}
