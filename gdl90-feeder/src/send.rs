//! Replay a capture as fixed-size UDP datagrams.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::UdpSocket;
use tracing::debug;

/// Totals for one replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendTotals {
    pub packets: u64,
    pub bytes: u64,
}

/// Send `reader` to `dest` in `size`-byte datagrams, sleeping `delay`
/// between them. The final datagram may be shorter.
pub async fn send_capture<R: AsyncRead + Unpin>(
    mut reader: R,
    socket: &UdpSocket,
    dest: SocketAddr,
    size: usize,
    delay: Duration,
) -> io::Result<SendTotals> {
    let mut totals = SendTotals::default();
    let mut buf = vec![0u8; size];

    loop {
        let n = read_chunk(&mut reader, &mut buf).await?;
        if n == 0 {
            break;
        }
        socket.send_to(&buf[..n], dest).await?;
        totals.packets += 1;
        totals.bytes += n as u64;
        debug!(packets = totals.packets, bytes = n, "sent");

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
    Ok(totals)
}

/// Fill `buf` unless the reader ends first; stdin and pipes return short reads.
async fn read_chunk<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_chunked_replay() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let dest = receiver.local_addr().unwrap();
        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let data: Vec<u8> = (0..120u8).collect();
        let totals = send_capture(&data[..], &sender, dest, 50, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(totals, SendTotals { packets: 3, bytes: 120 });

        let mut buf = [0u8; 100];
        let mut sizes = Vec::new();
        let mut received = Vec::new();
        for _ in 0..3 {
            let n = receiver.recv(&mut buf).await.unwrap();
            sizes.push(n);
            received.extend_from_slice(&buf[..n]);
        }
        assert_eq!(sizes, vec![50, 50, 20]);
        assert_eq!(received, data);
    }

    #[tokio::test]
    async fn test_empty_input_sends_nothing() {
        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let dest = sender.local_addr().unwrap();
        let totals = send_capture(&[][..], &sender, dest, 50, Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(totals, SendTotals::default());
    }

    #[tokio::test]
    async fn test_read_chunk_joins_short_reads() {
        let (mut client, mut server) = tokio::io::duplex(4);
        tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            client.write_all(b"0123456789").await.unwrap();
        });
        let mut buf = [0u8; 8];
        assert_eq!(read_chunk(&mut server, &mut buf).await.unwrap(), 8);
        assert_eq!(&buf, b"01234567");
        assert_eq!(read_chunk(&mut server, &mut buf).await.unwrap(), 2);
    }
}
