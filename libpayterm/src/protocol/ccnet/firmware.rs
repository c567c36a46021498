// libpayterm/src/protocol/ccnet/firmware.rs

//! Bootloader and flash packet formats for the CCNET firmware-update
//! sub-mode.
//!
//! This is a linear protocol distinct from normal polling: fixed-size
//! CRC16-framed packets, each acknowledged by a bare ASCII `OK`. The
//! bootloader unlock writes vendor blobs to fixed flash addresses; the
//! firmware body is flashed as 112 pages of 512 bytes.

use super::crc16;
use crate::{Error, Result};

/// Size of a flash data packet on the wire.
pub const FW_PACKET_SIZE: usize = 518;

/// Size of a bootloader unlock packet.
pub const UNLOCK_PACKET_SIZE: usize = 72;

/// Payload bytes carried by one flash page packet.
pub const PAGE_SIZE: usize = 512;

/// Pages in a full firmware image.
pub const PAGE_COUNT: usize = 112;

/// Minimum acceptable firmware image size.
pub const MIN_IMAGE_LEN: usize = PAGE_COUNT * PAGE_SIZE; // 57344

/// Bootloader slices are written in 64-byte chunks.
pub const UNLOCK_CHUNK: usize = 64;

/// Flash base for the 16 bootloader pages; each page advances 0x200.
pub const UNLOCK_BASE_ADDRESS: u16 = 0x3000;

/// Flash page command byte.
pub const PAGE_WRITE: u8 = 0xAA;

/// First flash page address byte.
pub const PAGE_ADDRESS_BASE: u8 = 0x10;

/// Expected acknowledgement after each packet.
pub const FW_ACK: &[u8] = b"OK";

/// Short 6-byte command packet: the first four data bytes followed by
/// their CRC16.
pub fn command_packet(data: &[u8]) -> Vec<u8> {
    let mut packet = vec![0u8; 6];
    for (i, &b) in data.iter().take(6).enumerate() {
        packet[i] = b;
    }
    let crc = crc16(&packet[..4]);
    packet[4] = crc as u8;
    packet[5] = (crc >> 8) as u8;
    packet
}

/// Padded 518-byte command packet with header `[0x02][0x01][command]`.
/// The CRC of the four header bytes lands at offsets 4..6, matching the
/// bootloader's expectations for control commands.
pub fn command_packet_padded(command: u8, data: &[u8]) -> Vec<u8> {
    let mut packet = vec![0u8; FW_PACKET_SIZE];
    packet[0] = 0x02;
    packet[1] = 0x01;
    packet[2] = command;
    for (i, &b) in data.iter().enumerate() {
        if 4 + i >= FW_PACKET_SIZE {
            break;
        }
        packet[4 + i] = b;
    }
    let crc = crc16(&packet[..4]);
    packet[4] = crc as u8;
    packet[5] = (crc >> 8) as u8;
    packet
}

/// Full flash page packet: `[0x02][0x01][command][page address][data...]`
/// with CRC16 over everything before the trailer.
pub fn page_packet(command: u8, page_address: u8, data: &[u8]) -> Vec<u8> {
    let mut packet = vec![0u8; FW_PACKET_SIZE];
    packet[0] = 0x02;
    packet[1] = 0x01;
    packet[2] = command;
    packet[3] = page_address;
    for (i, &b) in data.iter().enumerate() {
        if 4 + i >= FW_PACKET_SIZE - 2 {
            break;
        }
        packet[4 + i] = b;
    }
    let crc = crc16(&packet[..FW_PACKET_SIZE - 2]);
    packet[FW_PACKET_SIZE - 2] = crc as u8;
    packet[FW_PACKET_SIZE - 1] = (crc >> 8) as u8;
    packet
}

/// Bootloader unlock packet: 72 bytes, flash address big-endian at
/// offsets 4..6, 64 data bytes, CRC16 trailer.
pub fn unlock_packet(address: u16, data: &[u8]) -> Vec<u8> {
    let mut packet = vec![0u8; UNLOCK_PACKET_SIZE];
    packet[0] = 0x02;
    packet[1] = 0x03;
    packet[2] = UNLOCK_PACKET_SIZE as u8;
    packet[3] = PAGE_WRITE;
    packet[4] = (address >> 8) as u8;
    packet[5] = address as u8;
    for (i, &b) in data.iter().enumerate() {
        if 6 + i >= UNLOCK_PACKET_SIZE - 2 {
            break;
        }
        packet[6 + i] = b;
    }
    let crc = crc16(&packet[..UNLOCK_PACKET_SIZE - 2]);
    packet[UNLOCK_PACKET_SIZE - 2] = crc as u8;
    packet[UNLOCK_PACKET_SIZE - 1] = (crc >> 8) as u8;
    packet
}

/// Switch the validator into service mode.
pub fn service_mode_packet() -> Vec<u8> {
    command_packet(&[0x02, 0x03, 0x06, 0x88, 0x00, 0x00])
}

/// Reset from service/bootloader mode.
pub fn reset_packet() -> Vec<u8> {
    command_packet(&[0x02, 0x03, 0x06, 0xBB, 0x00, 0x00])
}

/// Ask whether the bootloader is answering.
pub fn bootloader_check_packet() -> Vec<u8> {
    command_packet_padded(0x99, &[0x00, 0x00, 0x00])
}

/// Reset issued after the last flash page.
pub fn final_reset_packet() -> Vec<u8> {
    command_packet_padded(0xBB, &[0x00, 0x00, 0x00])
}

/// Vendor bootloader blobs written during the unlock sequence, supplied
/// by the caller from its firmware assets.
#[derive(Debug, Clone)]
pub struct UnlockKit {
    /// 16 x 64-byte slices written from `UNLOCK_BASE_ADDRESS` upwards.
    pub bloader: Vec<u8>,
    pub ldr_1a00: Vec<u8>,
    pub ldr_1c00: Vec<u8>,
    pub ldr_1e00: Vec<u8>,
    pub ldr_fe00: Vec<u8>,
}

impl UnlockKit {
    /// Validate blob sizes before any byte goes on the wire.
    pub fn validate(&self) -> Result<()> {
        if self.bloader.len() < 16 * UNLOCK_CHUNK {
            return Err(Error::FirmwareFormat(format!(
                "bootloader blob too short: {} bytes, need {}",
                self.bloader.len(),
                16 * UNLOCK_CHUNK
            )));
        }
        Ok(())
    }
}

/// A parsed firmware image.
#[derive(Debug, Clone)]
pub struct FirmwareImage {
    bytes: Vec<u8>,
}

impl FirmwareImage {
    /// Parse the vendor's comma-separated `0xNN` listing format.
    pub fn from_hex_listing(listing: &str) -> Result<Self> {
        let mut bytes = Vec::new();
        for token in listing.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let Some(hex) = token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
            else {
                continue;
            };
            match u8::from_str_radix(hex, 16) {
                Ok(b) => bytes.push(b),
                Err(_) => {
                    return Err(Error::FirmwareFormat(format!(
                        "bad byte token '{}'",
                        token
                    )));
                }
            }
        }
        Self::from_bytes(bytes)
    }

    /// Accept an already-binary image.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() < MIN_IMAGE_LEN {
            return Err(Error::FirmwareFormat(format!(
                "image too short: {} bytes, need {}",
                bytes.len(),
                MIN_IMAGE_LEN
            )));
        }
        Ok(Self { bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Flash page `page` (0..PAGE_COUNT).
    pub fn page(&self, page: usize) -> &[u8] {
        &self.bytes[page * PAGE_SIZE..(page + 1) * PAGE_SIZE]
    }
}
