// Replay transport for testing without hardware
//
// Radio responses are queued as discrete chunks and a single read never
// crosses a chunk boundary, modeling the pauses between responses on the
// real link. Without the boundaries the variable-length firmware variant
// read would swallow the bytes of the next response.

use super::comm::{Result, Transport};
use super::protocol::ACK;
use std::collections::VecDeque;

/// Mock serial port replaying scripted radio responses.
pub struct MockSerialPort {
    /// Response chunks still to be read.
    responses: VecDeque<Vec<u8>>,

    /// Every byte written by the code under test, in order.
    written: Vec<u8>,
}

impl MockSerialPort {
    pub fn new() -> Self {
        Self {
            responses: VecDeque::new(),
            written: Vec::new(),
        }
    }

    /// Queue one radio response.
    pub fn push_response(&mut self, data: &[u8]) {
        self.responses.push_back(data.to_vec());
    }

    /// Bytes written so far by the code under test.
    pub fn written(&self) -> Vec<u8> {
        self.written.clone()
    }

    /// Check whether a byte sequence was written.
    pub fn was_written(&self, expected: &[u8]) -> bool {
        self.written
            .windows(expected.len())
            .any(|window| window == expected)
    }

    /// Number of queued responses not yet consumed.
    pub fn pending_responses(&self) -> usize {
        self.responses.len()
    }
}

impl Default for MockSerialPort {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockSerialPort {
    async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        self.written.extend_from_slice(buf);
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    async fn read_upto(&mut self, buf: &mut [u8]) -> Result<usize> {
        let Some(chunk) = self.responses.front_mut() else {
            // nothing queued: the radio stayed silent until the timeout
            return Ok(0);
        };

        let count = buf.len().min(chunk.len());
        buf[..count].copy_from_slice(&chunk[..count]);

        if count == chunk.len() {
            self.responses.pop_front();
        } else {
            chunk.drain(..count);
        }

        Ok(count)
    }

    fn clear_input(&mut self) -> Result<()> {
        self.responses.clear();
        Ok(())
    }

    fn clear_output(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Queue every response of a default-options programming-mode handshake.
pub fn push_handshake_responses(port: &mut MockSerialPort) {
    port.push_response(&[ACK]); // PSEARCH ack
    port.push_response(b"P13GMRS");
    port.push_response(&[b'P', 0x00, 0x00]); // PASSSTA status
    port.push_response(&[ACK]); // SYSINFO ack

    // three opaque pre-entry exchanges with arbitrary payloads
    for _ in 0..3 {
        port.push_response(&[0x56, 0x0D, 0x0A, 0x0A, 0x0D]);
        port.push_response(&[0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0]);
        port.push_response(&[ACK]);
    }

    // the fourth exchange carries a fixed payload
    port.push_response(&[0x56, 0x0A, 0x08, 0x00, 0x10]);
    port.push_response(&[0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00]);
    port.push_response(&[ACK]);

    port.push_response(&[ACK]); // idle timeout setup ack
    port.push_response(&[0xFF; 8]); // mode entry response
    port.push_response(&[ACK]);
}

/// Queue the response to a single memory read of `data` at `address`.
pub fn push_read_response(port: &mut MockSerialPort, address: u16, data: &[u8]) {
    let addr = address.to_le_bytes();
    let mut response = vec![0x57, addr[0], addr[1], 0x00, data.len() as u8];
    response.extend_from_slice(data);
    port.push_response(&response);
    port.push_response(&[ACK]);
}

/// Queue the responses to a chunked range read of `data` at `address`.
pub fn push_range_read_responses(
    port: &mut MockSerialPort,
    address: u16,
    data: &[u8],
    chunk_size: usize,
) {
    for (i, chunk) in data.chunks(chunk_size).enumerate() {
        push_read_response(port, address + (i * chunk_size) as u16, chunk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_stop_at_chunk_boundary() {
        let mut port = MockSerialPort::new();
        port.push_response(b"P13GMRS");
        port.push_response(&[ACK]);

        // a 16-byte read only sees the 7-byte chunk
        let mut buf = [0u8; 16];
        let count = port.read_upto(&mut buf).await.unwrap();
        assert_eq!(&buf[..count], b"P13GMRS");

        let mut buf = [0u8; 1];
        assert_eq!(port.read_upto(&mut buf).await.unwrap(), 1);
        assert_eq!(buf[0], ACK);
    }

    #[tokio::test]
    async fn test_partial_chunk_read() {
        let mut port = MockSerialPort::new();
        port.push_response(&[1, 2, 3, 4, 5]);

        let mut buf = [0u8; 2];
        port.read_upto(&mut buf).await.unwrap();
        assert_eq!(buf, [1, 2]);

        let mut buf = [0u8; 3];
        port.read_upto(&mut buf).await.unwrap();
        assert_eq!(buf, [3, 4, 5]);
        assert_eq!(port.pending_responses(), 0);
    }

    #[tokio::test]
    async fn test_silent_when_empty() {
        let mut port = MockSerialPort::new();
        let mut buf = [0u8; 4];
        assert_eq!(port.read_upto(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_written_inspection() {
        let mut port = MockSerialPort::new();
        port.write_all(b"PSEARCH").await.unwrap();
        port.write_all(&[0x02]).await.unwrap();

        assert!(port.was_written(b"PSEARCH"));
        assert!(port.was_written(&[0x02]));
        assert!(!port.was_written(b"SYSINFO"));
    }

    #[tokio::test]
    async fn test_clear_input_drops_pending() {
        let mut port = MockSerialPort::new();
        port.push_response(&[1, 2, 3]);
        port.clear_input().unwrap();
        assert_eq!(port.pending_responses(), 0);
    }
}
