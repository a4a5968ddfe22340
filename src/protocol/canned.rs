//! Fixed frames: the GO keep-alive, the handshake ACK, and the recorded
//! replies the proxy plays back when the controller sends GO.
//!
//! The five replies were captured from a real companion device.  Their
//! internal structure is not understood beyond "the controller accepts
//! them and proceeds", so they are replayed byte for byte and never
//! synthesised.

/// Keep-alive that elicits the handshake sequence (ends in ASCII "GO").
pub const GO_KEEPALIVE: [u8; 15] = [
    0x17, 0x00, 0x00, 0x00, 0x00, 0x17, 0x09, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x01, 0x47, 0x4F,
];

/// Acknowledgement for handshake-config and clock-sync frames.
pub const HANDSHAKE_ACK: [u8; 15] = [
    0x17, 0x0A, 0x00, 0x00, 0x00, 0x17, 0x09, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x02,
];

/// Reply the emulated peer gives when the controller reads from it.
pub const READ_REPLY: [u8; 2] = [0x00, 0x00];

/// Recorded reply 1 (type 0x00, sub 0x05).
pub const GO_REPLY_1: [u8; 78] = [
    0x17, 0x09, 0x00, 0x00, 0x00, 0x17, 0x0A, 0x01,
    0x00, 0x01, 0x00, 0x00, 0x40, 0xC7, 0x52, 0x51,
    0x00, 0x00, 0x05, 0x02, 0xA3, 0x02, 0x08, 0x00,
    0x04, 0x00, 0x00, 0x00, 0x09, 0x00, 0x00, 0x0C,
    0x00, 0x01, 0x1A, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x0E, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x01, 0x02, 0x1E, 0x00, 0x00,
    0x00, 0x0A, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x0C, 0x01, 0x01, 0x30,
    0x14, 0x78, 0x78, 0x00, 0x28, 0x2A,
];

/// Recorded reply 2 (type 0x3B, sub 0x02).
pub const GO_REPLY_2: [u8; 78] = [
    0x17, 0x09, 0x00, 0x00, 0x00, 0x17, 0x0A, 0x01,
    0x00, 0x01, 0x00, 0x00, 0x40, 0xC7, 0x52, 0x51,
    0x00, 0x3B, 0x02, 0x04, 0x04, 0x00, 0x28, 0x00,
    0x73, 0x00, 0x90, 0x02, 0xE4, 0x00, 0x01, 0x24,
    0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x0F, 0x02,
    0xE5, 0x00, 0x02, 0x02, 0x02, 0x01, 0x01, 0x05,
    0x03, 0x03, 0x05, 0x05, 0x04, 0x04, 0x01, 0x03,
    0x00, 0x14, 0x14, 0x14, 0x14, 0x14, 0x14, 0x07,
    0x06, 0x08, 0x06, 0x07, 0x07, 0xF4, 0x00, 0x02,
    0x00, 0x03, 0x00, 0x00, 0x00, 0xA1,
];

/// Recorded reply 3 (type 0x76, sub 0x3C).  The capture is 77 bytes; the
/// transmitted frame is zero-padded to 78.
pub const GO_REPLY_3: [u8; 78] = [
    0x17, 0x09, 0x00, 0x00, 0x00, 0x17, 0x0A, 0x01,
    0x00, 0x01, 0x00, 0x00, 0x40, 0xC7, 0x52, 0x51,
    0x00, 0x76, 0x3C, 0x04, 0x1E, 0x01, 0x0A, 0x30,
    0x40, 0x80, 0x00, 0x83, 0x00, 0x00, 0x00, 0x00,
    0x01, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00,
    0x30, 0x14, 0x10, 0x30, 0x30, 0x10, 0x0A, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x86, 0x00,
];

/// Recorded reply 4 (type 0xB1, sub 0x00).
pub const GO_REPLY_4: [u8; 23] = [
    0x17, 0x09, 0x00, 0x00, 0x00, 0x17, 0x0A, 0x01,
    0x00, 0x01, 0x00, 0x00, 0x09, 0xC7, 0x52, 0x51,
    0x00, 0xB1, 0x00, 0x00, 0x00, 0x01, 0x7E,
];

/// Recorded reply 5: bare 2-byte ACK, repeated to close the sequence.
pub const GO_REPLY_ACK: [u8; 2] = [0x17, 0x0A];

/// The four data replies in playback order.  [`GO_REPLY_ACK`] follows them.
pub const GO_REPLIES: [&[u8]; 4] = [&GO_REPLY_1, &GO_REPLY_2, &GO_REPLY_3, &GO_REPLY_4];
