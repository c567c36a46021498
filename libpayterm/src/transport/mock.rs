// libpayterm/src/transport/mock.rs

use crate::transport::traits::Transport;
use crate::{Error, Result};

/// Mock transport for unit tests. It records written payloads and replays
/// queued responses, one queued chunk per `read_timeout` call. An empty
/// queue reads as silence (empty buffer), matching the real transport
/// contract where a timeout is not an error.
#[derive(Debug, Default)]
pub struct MockTransport {
    pub sent: Vec<Vec<u8>>,
    pub responses: Vec<Vec<u8>>,
    pub open: bool,
    /// Testing hook: number of subsequent writes that should fail with a
    /// port error.
    pub write_failures: usize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            sent: Vec::new(),
            responses: Vec::new(),
            open: true,
            write_failures: 0,
        }
    }

    /// Queue a response chunk for a later read.
    pub fn push_response(&mut self, resp: Vec<u8>) {
        self.responses.push(resp);
    }

    /// Queue one read's worth of silence.
    pub fn push_silence(&mut self) {
        self.responses.push(Vec::new());
    }

    /// Set how many subsequent writes should fail (for tests).
    pub fn set_write_failures(&mut self, n: usize) {
        self.write_failures = n;
    }

    pub fn last_sent(&self) -> Option<&Vec<u8>> {
        self.sent.last()
    }
}

impl Transport for MockTransport {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.write_failures > 0 {
            self.write_failures -= 1;
            return Err(Error::PortNotAvailable("mock write failure".into()));
        }
        self.sent.push(data.to_vec());
        Ok(())
    }

    fn read_timeout(&mut self, _max_len: usize, _timeout_ms: u64) -> Result<Vec<u8>> {
        if self.responses.is_empty() {
            Ok(Vec::new())
        } else {
            Ok(self.responses.remove(0))
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        self.open = false;
    }
}
