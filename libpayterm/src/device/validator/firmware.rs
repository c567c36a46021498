// libpayterm/src/device/validator/firmware.rs

//! CCNET firmware-update sub-mode.
//!
//! A strictly linear protocol that must never run concurrently with
//! polling: the session is taken `&mut` for the whole update and refuses
//! to start unless acceptance is disabled. After a successful update the
//! device reboots; the caller re-probes to get back to a normal session.

use std::time::Duration;

use super::{ValidatorProtocol, ValidatorSession};
use crate::polling::events::{DeviceEvent, EventChannel, FirmwareState};
use crate::protocol::ccnet::firmware::{
    FirmwareImage, PAGE_ADDRESS_BASE, PAGE_COUNT, PAGE_WRITE, UNLOCK_BASE_ADDRESS, UNLOCK_CHUNK,
    UnlockKit, bootloader_check_packet, final_reset_packet, page_packet, reset_packet,
    service_mode_packet, unlock_packet,
};
use crate::transport::read_accumulate;
use crate::{Error, Result};

/// Flash addresses for the four loader tails.
const LDR_ADDRESSES: [u16; 4] = [0x1A00, 0x1C00, 0x1E00, 0xFFC0];

impl ValidatorSession {
    /// Run the complete firmware-update sequence: service-mode switch,
    /// bootloader unlock, page-by-page flash, reset. Progress and the
    /// final result are reported through `events`.
    pub fn firmware_update(
        &mut self,
        image: &FirmwareImage,
        kit: &UnlockKit,
        events: &EventChannel,
    ) -> Result<()> {
        if self.protocol() != ValidatorProtocol::CcNet {
            return Err(Error::UnsupportedOperation(
                "firmware update is a CCNET-only operation".into(),
            ));
        }
        if self.is_enabled() {
            return Err(Error::UnsupportedOperation(
                "disable polling before a firmware update".into(),
            ));
        }
        kit.validate()?;

        events.send(DeviceEvent::FirmwareResult(FirmwareState::Started));

        // A previous interrupted update leaves the device stuck in its
        // bootloader; flash directly in that case.
        if self.fw_ack(&bootloader_check_packet())? {
            return self.flash(image, events);
        }

        if !self.fw_ack(&service_mode_packet())? {
            events.send(DeviceEvent::FirmwareResult(FirmwareState::Cancelled));
            return Err(Error::NoAnswer);
        }

        if let Err(e) = self.unlock(kit) {
            let _ = self.fw_ack(&reset_packet());
            events.send(DeviceEvent::FirmwareResult(FirmwareState::Cancelled));
            return Err(e);
        }

        self.fw_pause();

        if self.fw_ack(&bootloader_check_packet())? {
            self.flash(image, events)
        } else {
            let _ = self.fw_ack(&reset_packet());
            events.send(DeviceEvent::FirmwareResult(FirmwareState::Failed));
            Err(Error::NoAnswer)
        }
    }

    /// Whether the bootloader answers (probe hook for devices stuck
    /// mid-update).
    pub(crate) fn bootloader_present(&mut self) -> Result<bool> {
        self.fw_ack(&bootloader_check_packet())
    }

    /// Write the vendor bootloader blobs to their fixed flash addresses.
    fn unlock(&mut self, kit: &UnlockKit) -> Result<()> {
        for i in 0..16u16 {
            let chunk =
                &kit.bloader[i as usize * UNLOCK_CHUNK..(i as usize + 1) * UNLOCK_CHUNK];
            let address = UNLOCK_BASE_ADDRESS + i * 0x0200;
            if !self.fw_ack(&unlock_packet(address, chunk))? {
                log::warn!("bootloader page {} not acknowledged", i);
                return Err(Error::NoAnswer);
            }
            self.fw_pause();
        }

        let tails = [
            &kit.ldr_1a00,
            &kit.ldr_1c00,
            &kit.ldr_1e00,
            &kit.ldr_fe00,
        ];
        for (blob, &address) in tails.iter().zip(LDR_ADDRESSES.iter()) {
            if !self.fw_ack(&unlock_packet(address, blob))? {
                log::warn!("loader page {:#06x} not acknowledged", address);
                return Err(Error::NoAnswer);
            }
            self.fw_pause();
        }

        // Leave service mode so the bootloader takes over.
        let _ = self.fw_ack(&reset_packet())?;
        Ok(())
    }

    /// Flash the firmware body page by page, reporting progress.
    fn flash(&mut self, image: &FirmwareImage, events: &EventChannel) -> Result<()> {
        for page in 0..PAGE_COUNT {
            let packet = page_packet(
                PAGE_WRITE,
                PAGE_ADDRESS_BASE + page as u8,
                image.page(page),
            );
            if !self.fw_ack(&packet)? {
                events.send(DeviceEvent::FirmwareResult(FirmwareState::Failed));
                return Err(Error::NoAnswer);
            }

            let percent = ((0.91 * page as f64).round() as u8).min(100);
            events.send(DeviceEvent::FirmwareProgress { percent });
        }

        // Reboot into the new firmware; the device stops answering here.
        let _ = self.fw_ack(&final_reset_packet());
        self.fw_pause();

        events.send(DeviceEvent::FirmwareResult(FirmwareState::Success));
        Ok(())
    }

    /// Send one firmware packet and wait for the ASCII `OK` ack.
    /// `Ok(false)` means the window expired without one; port errors
    /// propagate.
    fn fw_ack(&mut self, packet: &[u8]) -> Result<bool> {
        self.transport.write(packet)?;

        let timeout = self.config.timing.fw_ack_timeout_ms;
        let slice = self.config.timing.read_slice_ms;
        let answer = read_accumulate(self.transport.as_mut(), timeout, slice, |buffer| {
            buffer.windows(2).any(|w| w == b"OK")
        })?;

        Ok(answer.windows(2).any(|w| w == b"OK"))
    }

    fn fw_pause(&self) {
        if self.config.timing.fw_pause_ms > 0 {
            std::thread::sleep(Duration::from_millis(self.config.timing.fw_pause_ms));
        }
    }
}
