#![cfg(feature = "serial")]

#[path = "common.rs"]
mod common;

use libpayterm::Result;
use serial_test::serial;

// This integration test requires a real CCNET validator connected. It is
// marked `#[ignore]` so CI does not attempt to run it. Run manually with:
//
// cargo test -p libpayterm --test hardware --features serial -- --ignored

#[test]
#[ignore]
#[serial]
fn probe_and_identify_ccnet_validator() -> Result<()> {
    match common::find_ccnet_validator()? {
        Some(session) => {
            assert!(!session.identity().part_number.is_empty());
            Ok(())
        }
        None => Ok(()),
    }
}
