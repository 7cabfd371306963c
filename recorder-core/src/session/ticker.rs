use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::session::metering::TickToken;

/// Receives one token per period. Runs on the ticker thread, so hosts
/// should forward the token to their primary context and return.
pub type TickCallback = Arc<dyn Fn(TickToken) + Send + Sync + 'static>;

/// Background thread delivering a fixed token every `period` until stopped.
pub struct Ticker {
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Ticker {
    pub fn spawn(token: TickToken, period: Duration, callback: TickCallback) -> io::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name("metering-tick".into())
            .spawn(move || {
                while flag.load(Ordering::SeqCst) {
                    thread::sleep(period);
                    if !flag.load(Ordering::SeqCst) {
                        break;
                    }
                    callback(token);
                }
            })?;

        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop the thread and wait for it to exit.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Metering ticker thread panicked");
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
