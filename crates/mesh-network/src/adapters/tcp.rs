use crate::error::NetworkError;
use crate::ports::Connection;
use async_trait::async_trait;
use socket2::SockRef;
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Framing
// ============================================================================

/// Size of the big-endian length prefix in front of every frame.
pub const FRAME_HEADER_LEN: usize = 4;

/// Prefix `payload` with its length.
///
/// An empty payload encodes the keep-alive probe.
///
/// # Errors
///
/// Returns `InvalidInput` if the payload does not fit a 32-bit length.
pub fn encode_frame(payload: &[u8]) -> io::Result<Vec<u8>> {
    let len = u32::try_from(payload.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("payload of {} bytes is too large to frame", payload.len()),
        )
    })?;
    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Read one frame, refusing payloads longer than `max_frame_size`.
///
/// # Errors
///
/// Returns `UnexpectedEof` when the stream ends (cleanly or mid-frame) and
/// `InvalidData` for an oversized frame.
pub async fn read_frame<R>(reader: &mut R, max_frame_size: usize) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let len = reader.read_u32().await? as usize;
    if len > max_frame_size {
        return Err(NetworkError::FrameTooLarge {
            size: len,
            max: max_frame_size,
        }
        .into());
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

// ============================================================================
// TcpConnection - Production TCP Adapter
// ============================================================================

/// Length-prefixed TCP connection.
///
/// The stream is split so a watch worker can sit in `recv` while other tasks
/// `send`. `close` fires a token that aborts any pending `recv` and shuts
/// down the write half, which the remote side observes as end of stream.
///
/// # Wire Protocol
///
/// - Bytes 0-3: payload length, big-endian `u32`
/// - Bytes 4..: payload
///
/// A zero length is a keep-alive probe.
#[derive(Debug)]
pub struct TcpConnection {
    remote: SocketAddr,
    local: SocketAddr,
    reader: Mutex<BufReader<OwnedReadHalf>>,
    writer: Mutex<OwnedWriteHalf>,
    closed: CancellationToken,
    max_frame_size: usize,
}

impl TcpConnection {
    /// Wrap an established stream.
    ///
    /// # Errors
    ///
    /// Returns error if the socket addresses cannot be read (the stream is
    /// already dead).
    pub fn new(stream: TcpStream, max_frame_size: usize) -> io::Result<Self> {
        let remote = stream.peer_addr()?;
        let local = stream.local_addr()?;
        stream.set_nodelay(true)?;
        let (read_half, write_half) = stream.into_split();

        Ok(Self {
            remote,
            local,
            reader: Mutex::new(BufReader::new(read_half)),
            writer: Mutex::new(write_half),
            closed: CancellationToken::new(),
            max_frame_size,
        })
    }

    /// Turn on TCP keep-alive for `stream`.
    ///
    /// # Errors
    ///
    /// Returns the socket option error.
    pub fn enable_keepalive(stream: &TcpStream) -> io::Result<()> {
        SockRef::from(stream).set_keepalive(true)
    }

    /// Our end of the connection.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local
    }

    /// True once `close` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    async fn read_next(&self) -> io::Result<Vec<u8>> {
        let mut reader = self.reader.lock().await;
        read_frame(&mut *reader, self.max_frame_size).await
    }
}

#[async_trait]
impl Connection for TcpConnection {
    async fn recv(&self) -> io::Result<Vec<u8>> {
        tokio::select! {
            biased;
            _ = self.closed.cancelled() => Err(io::Error::new(
                io::ErrorKind::ConnectionAborted,
                "connection closed locally",
            )),
            frame = self.read_next() => frame,
        }
    }

    async fn send(&self, payload: &[u8]) -> io::Result<usize> {
        if self.is_closed() {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "connection closed locally",
            ));
        }
        let frame = encode_frame(payload)?;
        let mut writer = self.writer.lock().await;
        writer.write_all(&frame).await?;
        writer.flush().await?;
        Ok(payload.len())
    }

    async fn close(&self) -> io::Result<()> {
        if self.is_closed() {
            return Ok(());
        }
        self.closed.cancel();

        let mut writer = self.writer.lock().await;
        match writer.shutdown().await {
            Ok(()) => Ok(()),
            // Remote already gone.
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn remote_addr(&self) -> SocketAddr {
        self.remote
    }
}
