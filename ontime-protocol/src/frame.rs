//! Frame encoding and decoding for the gateway link.
//!
//! Frame format:
//! - START (1 byte): 0xAA synchronization byte
//! - LENGTH (1 byte): payload length (0-250)
//! - TYPE (1 byte): message type identifier
//! - SEQ (1 byte): request sequence number, echoed by responses
//! - PAYLOAD (0-250 bytes): type-specific data
//! - CHECKSUM (1 byte): XOR of LENGTH, TYPE, SEQ, and all PAYLOAD bytes

use heapless::Vec;

/// Frame synchronization byte
pub const FRAME_START: u8 = 0xAA;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = 250;

/// Bytes surrounding the payload (START + LENGTH + TYPE + SEQ + CHECKSUM)
pub const FRAME_OVERHEAD: usize = 5;

/// Maximum complete frame size
pub const MAX_FRAME_SIZE: usize = FRAME_OVERHEAD + MAX_PAYLOAD_SIZE;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Checksum mismatch
    InvalidChecksum,
    /// Invalid frame structure or unknown message type
    InvalidFrame,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message type identifier
    pub msg_type: u8,
    /// Sequence number correlating a response with its request
    pub seq: u8,
    /// Payload data
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Frame {
    /// Create a new frame with the given message type, sequence and payload
    pub fn new(msg_type: u8, seq: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let mut payload_vec = Vec::new();
        payload_vec
            .extend_from_slice(payload)
            .map_err(|_| FrameError::PayloadTooLarge)?;

        Ok(Self {
            msg_type,
            seq,
            payload: payload_vec,
        })
    }

    /// Create a frame with no payload
    pub fn empty(msg_type: u8, seq: u8) -> Self {
        Self {
            msg_type,
            seq,
            payload: Vec::new(),
        }
    }

    fn checksum(length: u8, msg_type: u8, seq: u8, payload: &[u8]) -> u8 {
        payload
            .iter()
            .fold(length ^ msg_type ^ seq, |acc, &byte| acc ^ byte)
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let payload_len = self.payload.len();
        let frame_len = FRAME_OVERHEAD + payload_len;
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        let length = payload_len as u8;
        buffer[0] = FRAME_START;
        buffer[1] = length;
        buffer[2] = self.msg_type;
        buffer[3] = self.seq;
        buffer[4..4 + payload_len].copy_from_slice(&self.payload);
        buffer[4 + payload_len] = Self::checksum(length, self.msg_type, self.seq, &self.payload);

        Ok(frame_len)
    }

    /// Encode into an owned buffer sized for the largest frame
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        Vec::from_slice(&buffer[..len]).map_err(|_| FrameError::BufferTooSmall)
    }
}

/// Byte-at-a-time reassembly of gateway frames
#[derive(Debug, Clone)]
pub struct FrameParser {
    state: ParseState,
    buffer: Vec<u8, MAX_PAYLOAD_SIZE>,
    expected_length: u8,
    msg_type: u8,
    seq: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    WaitingForStart,
    WaitingForLength,
    WaitingForType,
    WaitingForSeq,
    ReadingPayload,
    WaitingForChecksum,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Create a new frame parser
    pub fn new() -> Self {
        Self {
            state: ParseState::WaitingForStart,
            buffer: Vec::new(),
            expected_length: 0,
            msg_type: 0,
            seq: 0,
        }
    }

    /// Drop any partial frame
    pub fn reset(&mut self) {
        self.state = ParseState::WaitingForStart;
        self.buffer.clear();
        self.expected_length = 0;
        self.msg_type = 0;
        self.seq = 0;
    }

    /// Feed one byte received from the gateway
    ///
    /// Yields a frame once its checksum byte matches. A bad length or
    /// checksum drops the partial frame and the parser waits for the next
    /// START byte.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        match self.state {
            ParseState::WaitingForStart => {
                if byte == FRAME_START {
                    self.state = ParseState::WaitingForLength;
                }
                Ok(None)
            }
            ParseState::WaitingForLength => {
                if byte as usize > MAX_PAYLOAD_SIZE {
                    self.reset();
                    return Err(FrameError::InvalidFrame);
                }
                self.expected_length = byte;
                self.state = ParseState::WaitingForType;
                Ok(None)
            }
            ParseState::WaitingForType => {
                self.msg_type = byte;
                self.state = ParseState::WaitingForSeq;
                Ok(None)
            }
            ParseState::WaitingForSeq => {
                self.seq = byte;
                self.buffer.clear();
                self.state = if self.expected_length == 0 {
                    ParseState::WaitingForChecksum
                } else {
                    ParseState::ReadingPayload
                };
                Ok(None)
            }
            ParseState::ReadingPayload => {
                // Capacity is MAX_PAYLOAD_SIZE and expected_length never exceeds it
                let _ = self.buffer.push(byte);
                if self.buffer.len() == self.expected_length as usize {
                    self.state = ParseState::WaitingForChecksum;
                }
                Ok(None)
            }
            ParseState::WaitingForChecksum => {
                let expected =
                    Frame::checksum(self.expected_length, self.msg_type, self.seq, &self.buffer);

                if byte != expected {
                    self.reset();
                    return Err(FrameError::InvalidChecksum);
                }

                let frame = Frame {
                    msg_type: self.msg_type,
                    seq: self.seq,
                    payload: self.buffer.clone(),
                };

                self.reset();
                Ok(Some(frame))
            }
        }
    }

    /// Feed a chunk of UART input, stopping at the first complete frame
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<Option<Frame>, FrameError> {
        for &byte in bytes {
            if let Some(frame) = self.feed(byte)? {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{MSG_CONNECTED, MSG_CUMULATIVE, MSG_PUSH_ACK, MSG_PUSH_STATE};

    #[test]
    fn test_connected_notice_layout() {
        let frame = Frame::empty(MSG_CONNECTED, 7);
        let mut buffer = [0u8; 10];
        let len = frame.encode(&mut buffer).unwrap();

        assert_eq!(len, FRAME_OVERHEAD);
        assert_eq!(
            &buffer[..len],
            &[FRAME_START, 0, MSG_CONNECTED, 7, MSG_CONNECTED ^ 7]
        );
    }

    #[test]
    fn test_push_does_not_fit_short_buffer() {
        let frame = Frame::new(MSG_PUSH_STATE, 1, &[1, 2, 3]).unwrap();
        let mut buffer = [0u8; 7];
        assert_eq!(frame.encode(&mut buffer), Err(FrameError::BufferTooSmall));
    }

    #[test]
    fn test_cumulative_reply_keeps_request_seq() {
        let reply = Frame::new(MSG_CUMULATIVE, 200, &[1, 0x90, 0x4E]).unwrap();
        let wire = reply.encode_to_vec().unwrap();

        let mut parser = FrameParser::new();
        let parsed = parser.feed_bytes(&wire).unwrap().unwrap();

        assert_eq!(parsed.seq, 200);
        assert_eq!(parsed, reply);
    }

    #[test]
    fn test_corrupted_ack_is_rejected() {
        let mut wire = Frame::empty(MSG_PUSH_ACK, 3).encode_to_vec().unwrap();
        let last = wire.len() - 1;
        wire[last] ^= 0xFF;

        let mut parser = FrameParser::new();
        assert_eq!(parser.feed_bytes(&wire), Err(FrameError::InvalidChecksum));
        // Next intact frame still gets through
        let wire = Frame::empty(MSG_PUSH_ACK, 4).encode_to_vec().unwrap();
        assert_eq!(parser.feed_bytes(&wire).unwrap().map(|f| f.seq), Some(4));
    }

    #[test]
    fn test_oversize_length_drops_frame() {
        let mut parser = FrameParser::new();
        assert_eq!(parser.feed(FRAME_START), Ok(None));
        assert_eq!(
            parser.feed(MAX_PAYLOAD_SIZE as u8 + 1),
            Err(FrameError::InvalidFrame)
        );
        assert_eq!(parser.feed(0x00), Ok(None));
    }

    #[test]
    fn test_line_noise_before_frame() {
        let wire = Frame::empty(MSG_CONNECTED, 0).encode_to_vec().unwrap();

        let mut data = Vec::<u8, 20>::new();
        data.extend_from_slice(&[0x00, 0xFF, 0x12, 0x34]).unwrap();
        data.extend_from_slice(&wire).unwrap();

        let mut parser = FrameParser::new();
        let parsed = parser.feed_bytes(&data).unwrap().unwrap();
        assert_eq!(parsed.msg_type, MSG_CONNECTED);
    }

    #[test]
    fn test_acks_arriving_back_to_back() {
        let first = Frame::empty(MSG_PUSH_ACK, 1).encode_to_vec().unwrap();
        let second = Frame::new(MSG_CUMULATIVE, 2, &[0]).unwrap().encode_to_vec().unwrap();

        let mut parser = FrameParser::new();
        let mut seen = Vec::<u8, 4>::new();
        for &byte in first.iter().chain(second.iter()) {
            if let Some(frame) = parser.feed(byte).unwrap() {
                seen.push(frame.seq).unwrap();
            }
        }
        assert_eq!(&seen[..], &[1, 2]);
    }

    #[test]
    fn test_oversize_document_rejected() {
        let document = [0u8; MAX_PAYLOAD_SIZE + 1];
        assert_eq!(
            Frame::new(MSG_PUSH_STATE, 0, &document),
            Err(FrameError::PayloadTooLarge)
        );
    }
}
