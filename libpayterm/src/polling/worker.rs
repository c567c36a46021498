// libpayterm/src/polling/worker.rs

//! Dedicated worker thread per device session.
//!
//! Each physical device gets exactly one thread doing blocking serial
//! I/O. Stop is cooperative: the flag is observed at the top of the next
//! poll iteration, so a stop request can take up to one full exchange
//! (timeouts and retries included) to land. Port close is only safe
//! after the loop has exited, which `PollHandle::stop` guarantees by
//! joining.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use crate::polling::engine::{PollDevice, PollingEngine};
use crate::{Error, Result};

/// Handle to a running poll worker.
pub struct PollHandle<D: PollDevice + Send + 'static> {
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<(Result<()>, PollingEngine<D>)>>,
}

impl<D: PollDevice + Send + 'static> PollHandle<D> {
    /// Request the loop to stop without waiting for it.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Stop the loop and wait for the thread to exit. Returns the engine
    /// (and the device inside it) so the session can be closed or
    /// re-used, along with the loop's exit result.
    pub fn stop(mut self) -> Result<PollingEngine<D>> {
        self.request_stop();
        let handle = self
            .join
            .take()
            .ok_or_else(|| Error::UnsupportedOperation("poll worker already joined".into()))?;
        match handle.join() {
            Ok((result, engine)) => {
                result?;
                Ok(engine)
            }
            Err(_) => Err(Error::UnsupportedOperation(
                "poll worker thread panicked".into(),
            )),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join
            .as_ref()
            .map(|h| h.is_finished())
            .unwrap_or(true)
    }
}

/// Spawn a poll loop on its own thread.
pub fn spawn<D: PollDevice + Send + 'static>(mut engine: PollingEngine<D>) -> Result<PollHandle<D>> {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);

    let join = std::thread::Builder::new()
        .name("payterm-poll".into())
        .spawn(move || {
            let result = engine.run(&stop_flag);
            if let Err(e) = &result {
                log::warn!("poll loop exited with error: {}", e);
            }
            (result, engine)
        })?;

    Ok(PollHandle {
        stop,
        join: Some(join),
    })
}
