// fixtures.rs — shared transports and frames for the integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use libpayterm::transport::{MockTransport, Transport};
use libpayterm::{Error, Result};

/// Transport wrapper that keeps the underlying mock inspectable after the
/// session has taken ownership of the boxed transport.
#[derive(Clone)]
pub struct SharedTransport {
    inner: Arc<Mutex<MockTransport>>,
}

impl SharedTransport {
    pub fn new() -> (Self, Arc<Mutex<MockTransport>>) {
        let inner = Arc::new(Mutex::new(MockTransport::new()));
        (
            Self {
                inner: Arc::clone(&inner),
            },
            inner,
        )
    }

    pub fn boxed(&self) -> Box<dyn Transport> {
        Box::new(self.clone())
    }
}

impl Transport for SharedTransport {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.lock()?.write(data)
    }

    fn read_timeout(&mut self, max_len: usize, timeout_ms: u64) -> Result<Vec<u8>> {
        self.lock()?.read_timeout(max_len, timeout_ms)
    }

    fn is_open(&self) -> bool {
        self.inner
            .lock()
            .map(|guard| guard.is_open())
            .unwrap_or(false)
    }

    fn close(&mut self) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.close();
        }
    }
}

impl SharedTransport {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MockTransport>> {
        self.inner
            .lock()
            .map_err(|_| Error::PortNotAvailable("shared mock poisoned".into()))
    }
}

/// Queue a response chunk on a shared mock.
pub fn push(inner: &Arc<Mutex<MockTransport>>, response: Vec<u8>) {
    inner.lock().unwrap().push_response(response);
}

/// All frames written so far.
pub fn sent(inner: &Arc<Mutex<MockTransport>>) -> Vec<Vec<u8>> {
    inner.lock().unwrap().sent.clone()
}

/// Whether the mock port is still open.
pub fn is_open(inner: &Arc<Mutex<MockTransport>>) -> bool {
    inner.lock().unwrap().is_open()
}
