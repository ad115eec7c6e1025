// Framed request/response programming protocol
//
// The protocol loosely follows a request/response flow with one-way or
// bi-directional acknowledgements and relies on hardware flow control.
// Memory read/write commands are only accepted after a scripted multi-step
// handshake puts the radio into programming mode.

use super::comm::{SerialError, Transport};
use thiserror::Error;

/// Acknowledgement byte exchanged after most commands.
pub const ACK: u8 = 0x06;

/// Memory read request type.
pub const CMD_READ: u8 = 0x52;

/// Memory write request type; also the response type of a read.
pub const CMD_WRITE: u8 = 0x57;

/// The only firmware variant this implementation has been validated
/// against (US region GMRS firmware).
pub const KNOWN_FIRMWARE_VARIANT: &str = "P13GMRS";

/// Default chunk size for ranged transfers.
pub const DEFAULT_CHUNK_SIZE: usize = 0x40;

// Opaque pre-entry handshake frames. Their semantics are unknown (the
// third byte looks like a sub-command id, and the responses change with
// radio memory contents); the byte sequences are reproduced exactly and
// never interpreted.
const STATUS_QUERY_FRAMES: [[u8; 5]; 3] = [
    [0x56, 0x00, 0x00, 0x0A, 0x0D],
    [0x56, 0x00, 0x10, 0x0A, 0x0D],
    [0x56, 0x00, 0x20, 0x0A, 0x0D],
];
const STATUS_QUERY_ECHO: [u8; 5] = [0x56, 0x0D, 0x0A, 0x0A, 0x0D];
const STATUS_QUERY4_FRAME: [u8; 5] = [0x56, 0x00, 0x00, 0x00, 0x0A];
const STATUS_QUERY4_ECHO: [u8; 5] = [0x56, 0x0A, 0x08, 0x00, 0x10];
const STATUS_QUERY4_PAYLOAD: [u8; 6] = [0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00];

// Arms a radio-side idle timeout; without further commands inside the
// window the radio resets out of programming mode.
const IDLE_TIMEOUT_FRAME: [u8; 5] = [0xFF, 0xFF, 0xFF, 0xFF, 0x0C];

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Serial communication error: {0}")]
    Serial(#[from] SerialError),

    #[error("No response received")]
    NoResponse,

    #[error("Unexpected read size: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    #[error("Failed to receive ACK: got {got:#04x}")]
    Ack { got: u8 },

    #[error("Unvalidated firmware variant: {0:?}")]
    VariantMismatch(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Radio is not in programming mode")]
    NotInProgrammingMode,

    #[error("Memory {0} with zero size")]
    ZeroSize(&'static str),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Policy knobs for the programming-mode handshake.
#[derive(Debug, Clone)]
pub struct HandshakeOptions {
    /// Query the password status word (not required to enter
    /// programming mode).
    pub query_password_status: bool,

    /// Run the four opaque pre-entry exchanges (not required to enter
    /// programming mode).
    pub run_pre_entry_queries: bool,

    /// Fail on any firmware variant other than the validated one; when
    /// false the mismatch is logged and the received variant is used.
    pub strict_variant: bool,
}

impl Default for HandshakeOptions {
    fn default() -> Self {
        Self {
            query_password_status: true,
            run_pre_entry_queries: true,
            strict_variant: true,
        }
    }
}

/// Request/response programming protocol over a [`Transport`].
///
/// One command is in flight at a time; no operation is retried
/// internally. Retry policy, if any, belongs to the caller.
pub struct Protocol<T: Transport> {
    transport: T,
    programming_mode: bool,
}

impl<T: Transport> Protocol<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            programming_mode: false,
        }
    }

    /// True once the handshake has completed and memory commands are
    /// accepted.
    pub fn in_programming_mode(&self) -> bool {
        self.programming_mode
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    #[cfg(test)]
    pub(crate) fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn reset(&mut self) {
        // drop both directions so a desynchronized exchange cannot
        // corrupt the next command
        if let Err(e) = self.transport.clear_input() {
            tracing::warn!("Failed to clear input buffer: {}", e);
        }
        if let Err(e) = self.transport.clear_output() {
            tracing::warn!("Failed to clear output buffer: {}", e);
        }
    }

    async fn fixed_write(&mut self, data: &[u8]) -> Result<()> {
        self.transport.write_all(data).await?;
        self.transport.flush().await?;
        Ok(())
    }

    async fn variable_read(&mut self, max_count: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; max_count];
        let count = self.transport.read_upto(&mut buf).await?;
        buf.truncate(count);
        Ok(buf)
    }

    async fn fixed_read(&mut self, expected_count: usize) -> Result<Vec<u8>> {
        let response = self.variable_read(expected_count).await?;

        if response.is_empty() {
            self.reset();
            return Err(ProtocolError::NoResponse);
        }

        if response.len() != expected_count {
            self.reset();
            return Err(ProtocolError::ShortRead {
                expected: expected_count,
                actual: response.len(),
            });
        }

        Ok(response)
    }

    pub async fn send_ack(&mut self) -> Result<()> {
        self.fixed_write(&[ACK]).await
    }

    pub async fn receive_ack(&mut self) -> Result<()> {
        let response = self.fixed_read(1).await?;
        if response[0] != ACK {
            return Err(ProtocolError::Ack { got: response[0] });
        }
        Ok(())
    }

    /// Read `size` bytes of radio memory at `address`.
    ///
    /// Request: `0x52 addr_lo addr_hi 0x00 size`. The response echoes the
    /// four parameter bytes behind a `0x57` type byte, then carries the
    /// payload; every read ends with a send-ack/receive-ack exchange.
    pub async fn read_memory(&mut self, address: u16, size: u8) -> Result<Vec<u8>> {
        if !self.programming_mode {
            return Err(ProtocolError::NotInProgrammingMode);
        }
        if size == 0 {
            return Err(ProtocolError::ZeroSize("read"));
        }

        let addr = address.to_le_bytes();
        let request = [CMD_READ, addr[0], addr[1], 0x00, size];
        self.fixed_write(&request).await?;

        let response = self.fixed_read(5 + size as usize).await?;
        if response[0] != CMD_WRITE || response[1..5] != request[1..5] {
            self.reset();
            return Err(ProtocolError::InvalidResponse(format!(
                "read memory response header {:02x?}",
                &response[..5]
            )));
        }

        self.send_ack().await?;
        self.receive_ack().await?;

        tracing::debug!("Read {:#04x} bytes at {:#06x}", size, address);
        Ok(response[5..].to_vec())
    }

    /// Write up to 255 bytes of radio memory at `address`.
    ///
    /// Request: `0x57 addr_lo addr_hi 0x00 size` followed by the data;
    /// the radio answers with a single acknowledgement byte.
    pub async fn write_memory(&mut self, address: u16, data: &[u8]) -> Result<()> {
        if !self.programming_mode {
            return Err(ProtocolError::NotInProgrammingMode);
        }
        if data.is_empty() {
            return Err(ProtocolError::ZeroSize("write"));
        }
        if data.len() > 0xFF {
            return Err(ProtocolError::InvalidResponse(format!(
                "write of {} bytes exceeds a single command",
                data.len()
            )));
        }

        let addr = address.to_le_bytes();
        let mut request = vec![CMD_WRITE, addr[0], addr[1], 0x00, data.len() as u8];
        request.extend_from_slice(data);
        self.fixed_write(&request).await?;

        self.receive_ack().await?;

        tracing::debug!("Wrote {:#04x} bytes at {:#06x}", data.len(), address);
        Ok(())
    }

    /// Read an arbitrary-length range in `chunk_size` pieces at
    /// consecutive addresses. The first failed chunk aborts the range.
    pub async fn read_memory_range(
        &mut self,
        address: u16,
        size: usize,
        chunk_size: usize,
    ) -> Result<Vec<u8>> {
        if size == 0 {
            return Err(ProtocolError::ZeroSize("read"));
        }

        let mut data = Vec::with_capacity(size);
        let mut read_address = address;
        let mut remaining = size;

        while remaining > 0 {
            let read_size = chunk_size.min(remaining).min(0xFF);
            data.extend(self.read_memory(read_address, read_size as u8).await?);

            remaining -= read_size;
            read_address = read_address.wrapping_add(read_size as u16);
        }

        Ok(data)
    }

    /// Write an arbitrary-length range in `chunk_size` pieces at
    /// consecutive addresses. The first failed chunk aborts the range.
    pub async fn write_memory_range(
        &mut self,
        address: u16,
        data: &[u8],
        chunk_size: usize,
    ) -> Result<()> {
        if data.is_empty() {
            return Err(ProtocolError::ZeroSize("write"));
        }

        let mut written = 0;
        while written < data.len() {
            let write_size = chunk_size.min(data.len() - written).min(0xFF);
            self.write_memory(
                address.wrapping_add(written as u16),
                &data[written..written + write_size],
            )
            .await?;

            written += write_size;
        }

        Ok(())
    }

    /// Query the firmware variant name (`PSEARCH`).
    pub async fn query_firmware_variant(&mut self) -> Result<String> {
        self.fixed_write(b"PSEARCH").await?;
        self.receive_ack().await?;

        let response = self.variable_read(16).await?;
        if response.is_empty() {
            self.reset();
            return Err(ProtocolError::NoResponse);
        }

        String::from_utf8(response)
            .map_err(|e| ProtocolError::InvalidResponse(format!("firmware variant: {}", e)))
    }

    /// Query the password status word (`PASSSTA`).
    ///
    /// Possibly reports whether a programming password is set; only the
    /// structure of the response is checked.
    pub async fn query_password_status(&mut self) -> Result<()> {
        self.fixed_write(b"PASSSTA").await?;

        let response = self.fixed_read(3).await?;
        if response != [b'P', 0x00, 0x00] {
            return Err(ProtocolError::InvalidResponse(format!(
                "password status {:02x?}",
                response
            )));
        }
        Ok(())
    }

    /// Send the `SYSINFO` command; required before entering programming
    /// mode. Nothing beyond the acknowledgement is returned.
    pub async fn query_system_info(&mut self) -> Result<()> {
        self.fixed_write(b"SYSINFO").await?;
        self.receive_ack().await
    }

    // The four scripted pre-entry exchanges. The payloads seem to change
    // with the contents of radio memory but not over time on their own;
    // they are logged and discarded.
    async fn run_pre_entry_queries(&mut self) -> Result<()> {
        for frame in &STATUS_QUERY_FRAMES {
            self.fixed_write(frame).await?;

            let echo = self.fixed_read(5).await?;
            if echo != STATUS_QUERY_ECHO {
                return Err(ProtocolError::InvalidResponse(format!(
                    "pre-entry query echo {:02x?}",
                    echo
                )));
            }

            let payload = self.fixed_read(8).await?;
            tracing::debug!("Pre-entry query {:02x?} payload {:02x?}", frame, payload);

            self.send_ack().await?;
            self.receive_ack().await?;
        }

        self.fixed_write(&STATUS_QUERY4_FRAME).await?;

        let echo = self.fixed_read(5).await?;
        if echo != STATUS_QUERY4_ECHO {
            return Err(ProtocolError::InvalidResponse(format!(
                "pre-entry query echo {:02x?}",
                echo
            )));
        }

        let payload = self.fixed_read(6).await?;
        if payload != STATUS_QUERY4_PAYLOAD {
            return Err(ProtocolError::InvalidResponse(format!(
                "pre-entry query payload {:02x?}",
                payload
            )));
        }

        self.send_ack().await?;
        self.receive_ack().await
    }

    /// Walk the radio through the full handshake into programming mode.
    ///
    /// Memory read/write commands are rejected until this has completed.
    pub async fn enter_programming_mode(&mut self, options: &HandshakeOptions) -> Result<()> {
        let fw_variant = self.query_firmware_variant().await?;
        if fw_variant != KNOWN_FIRMWARE_VARIANT {
            if options.strict_variant {
                return Err(ProtocolError::VariantMismatch(fw_variant));
            }
            tracing::warn!(
                "Firmware variant {:?} has not been validated, continuing anyway",
                fw_variant
            );
        }
        tracing::debug!("Firmware variant: {}", fw_variant);

        if options.query_password_status {
            self.query_password_status().await?;
        }

        self.query_system_info().await?;

        if options.run_pre_entry_queries {
            self.run_pre_entry_queries().await?;
        }

        // arm the idle timeout, identifying with whatever variant the
        // radio reported rather than the validated literal
        self.fixed_write(&IDLE_TIMEOUT_FRAME).await?;
        self.fixed_write(fw_variant.as_bytes()).await?;
        self.receive_ack().await?;

        // mode entry
        self.fixed_write(&[0x02]).await?;
        let response = self.fixed_read(8).await?;
        if response != [0xFF; 8] {
            return Err(ProtocolError::InvalidResponse(format!(
                "mode entry response {:02x?}",
                response
            )));
        }

        self.send_ack().await?;
        self.receive_ack().await?;

        self.programming_mode = true;
        tracing::info!("Programming mode active");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::mock::{push_handshake_responses, MockSerialPort};

    async fn programming_protocol() -> Protocol<MockSerialPort> {
        let mut port = MockSerialPort::new();
        push_handshake_responses(&mut port);

        let mut protocol = Protocol::new(port);
        protocol
            .enter_programming_mode(&HandshakeOptions::default())
            .await
            .unwrap();
        protocol
    }

    #[tokio::test]
    async fn test_handshake_reaches_programming_mode() {
        let protocol = programming_protocol().await;
        assert!(protocol.in_programming_mode());

        // every scripted frame went out in order
        let written = protocol.into_inner().written();
        let mut expected = Vec::new();
        expected.extend_from_slice(b"PSEARCH");
        expected.extend_from_slice(b"PASSSTA");
        expected.extend_from_slice(b"SYSINFO");
        for frame in &STATUS_QUERY_FRAMES {
            expected.extend_from_slice(frame);
            expected.push(ACK);
        }
        expected.extend_from_slice(&STATUS_QUERY4_FRAME);
        expected.push(ACK);
        expected.extend_from_slice(&IDLE_TIMEOUT_FRAME);
        expected.extend_from_slice(b"P13GMRS");
        expected.push(0x02);
        expected.push(ACK);
        assert_eq!(written, expected);
    }

    #[tokio::test]
    async fn test_handshake_minimal_options() {
        let mut port = MockSerialPort::new();
        port.push_response(&[ACK]);
        port.push_response(b"P13GMRS");
        port.push_response(&[ACK]); // SYSINFO
        port.push_response(&[ACK]); // idle timeout setup
        port.push_response(&[0xFF; 8]);
        port.push_response(&[ACK]);

        let mut protocol = Protocol::new(port);
        let options = HandshakeOptions {
            query_password_status: false,
            run_pre_entry_queries: false,
            strict_variant: true,
        };
        protocol.enter_programming_mode(&options).await.unwrap();
        assert!(protocol.in_programming_mode());
    }

    #[tokio::test]
    async fn test_handshake_rejects_unknown_variant() {
        let mut port = MockSerialPort::new();
        port.push_response(&[ACK]);
        port.push_response(b"P99TEST");

        let mut protocol = Protocol::new(port);
        let result = protocol
            .enter_programming_mode(&HandshakeOptions::default())
            .await;
        assert!(matches!(
            result,
            Err(ProtocolError::VariantMismatch(v)) if v == "P99TEST"
        ));
        assert!(!protocol.in_programming_mode());
    }

    #[tokio::test]
    async fn test_handshake_lenient_variant_uses_received_bytes() {
        let mut port = MockSerialPort::new();
        port.push_response(&[ACK]);
        port.push_response(b"P99TEST");
        port.push_response(&[ACK]); // SYSINFO
        port.push_response(&[ACK]); // idle timeout setup
        port.push_response(&[0xFF; 8]);
        port.push_response(&[ACK]);

        let mut protocol = Protocol::new(port);
        let options = HandshakeOptions {
            query_password_status: false,
            run_pre_entry_queries: false,
            strict_variant: false,
        };
        protocol.enter_programming_mode(&options).await.unwrap();

        // the idle timeout step must identify with the received variant
        assert!(protocol.into_inner().was_written(b"P99TEST"));
    }

    #[tokio::test]
    async fn test_read_memory() {
        let mut protocol = programming_protocol().await;

        let payload: Vec<u8> = (0..64).collect();
        let port = protocol.transport_mut();
        let mut response = vec![CMD_WRITE, 0x00, 0x10, 0x00, 0x40];
        response.extend_from_slice(&payload);
        port.push_response(&response);
        port.push_response(&[ACK]);

        let data = protocol.read_memory(0x1000, 0x40).await.unwrap();
        assert_eq!(data, payload);
        assert!(protocol
            .transport_mut()
            .was_written(&[CMD_READ, 0x00, 0x10, 0x00, 0x40]));
    }

    #[tokio::test]
    async fn test_read_memory_header_mismatch_resets_buffers() {
        let mut protocol = programming_protocol().await;

        let port = protocol.transport_mut();
        let mut response = vec![CMD_WRITE, 0xAA, 0xBB, 0x00, 0x40];
        response.extend_from_slice(&[0u8; 64]);
        port.push_response(&response);
        port.push_response(&[ACK]); // stale data that must be discarded

        let result = protocol.read_memory(0x1000, 0x40).await;
        assert!(matches!(result, Err(ProtocolError::InvalidResponse(_))));
        assert_eq!(protocol.transport_mut().pending_responses(), 0);
    }

    #[tokio::test]
    async fn test_read_memory_no_response() {
        let mut protocol = programming_protocol().await;
        let result = protocol.read_memory(0x1000, 0x40).await;
        assert!(matches!(result, Err(ProtocolError::NoResponse)));
    }

    #[tokio::test]
    async fn test_read_memory_short_response() {
        let mut protocol = programming_protocol().await;
        protocol
            .transport_mut()
            .push_response(&[CMD_WRITE, 0x00, 0x10, 0x00]);

        let result = protocol.read_memory(0x1000, 0x40).await;
        assert!(matches!(
            result,
            Err(ProtocolError::ShortRead {
                expected: 69,
                actual: 4
            })
        ));
    }

    #[tokio::test]
    async fn test_requires_programming_mode() {
        let mut protocol = Protocol::new(MockSerialPort::new());
        assert!(matches!(
            protocol.read_memory(0x1000, 1).await,
            Err(ProtocolError::NotInProgrammingMode)
        ));
        assert!(matches!(
            protocol.write_memory(0x1000, &[0x00]).await,
            Err(ProtocolError::NotInProgrammingMode)
        ));
    }

    #[tokio::test]
    async fn test_write_memory_ack_mismatch() {
        let mut protocol = programming_protocol().await;
        protocol.transport_mut().push_response(&[0x15]);

        let result = protocol.write_memory(0x1000, &[1, 2, 3]).await;
        assert!(matches!(result, Err(ProtocolError::Ack { got: 0x15 })));
    }

    #[tokio::test]
    async fn test_write_memory_range_chunking() {
        let mut protocol = programming_protocol().await;
        for _ in 0..4 {
            protocol.transport_mut().push_response(&[ACK]);
        }

        let data = vec![0x55u8; 200];
        protocol
            .write_memory_range(0x1000, &data, DEFAULT_CHUNK_SIZE)
            .await
            .unwrap();

        // 200 bytes split into 0x40 + 0x40 + 0x40 + 0x08
        let port = protocol.transport_mut();
        assert!(port.was_written(&[CMD_WRITE, 0x00, 0x10, 0x00, 0x40]));
        assert!(port.was_written(&[CMD_WRITE, 0x40, 0x10, 0x00, 0x40]));
        assert!(port.was_written(&[CMD_WRITE, 0x80, 0x10, 0x00, 0x40]));
        assert!(port.was_written(&[CMD_WRITE, 0xC0, 0x10, 0x00, 0x08]));
    }

    #[tokio::test]
    async fn test_read_memory_range_chunking() {
        let mut protocol = programming_protocol().await;

        let port = protocol.transport_mut();
        for (addr, size) in [(0x1000u16, 0x40u8), (0x1040, 0x40), (0x1080, 0x20)] {
            let lo = (addr & 0xFF) as u8;
            let hi = (addr >> 8) as u8;
            let mut response = vec![CMD_WRITE, lo, hi, 0x00, size];
            response.extend(std::iter::repeat(lo).take(size as usize));
            port.push_response(&response);
            port.push_response(&[ACK]);
        }

        let data = protocol
            .read_memory_range(0x1000, 0xA0, DEFAULT_CHUNK_SIZE)
            .await
            .unwrap();
        assert_eq!(data.len(), 0xA0);
        assert_eq!(data[0], 0x00);
        assert_eq!(data[0x40], 0x40);
        assert_eq!(data[0x80], 0x80);
    }

    #[tokio::test]
    async fn test_zero_size_rejected() {
        let mut protocol = programming_protocol().await;
        assert!(matches!(
            protocol.read_memory(0x1000, 0).await,
            Err(ProtocolError::ZeroSize("read"))
        ));
        assert!(matches!(
            protocol.write_memory_range(0x1000, &[], 0x40).await,
            Err(ProtocolError::ZeroSize("write"))
        ));
    }
}
