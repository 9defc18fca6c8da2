//! Abandons a composition nobody finishes.
//!
//! The watchdog runs on its own thread and only learns about the composer
//! through notifications: `start` and `key` re-arm the deadline, `done`
//! disarms it. When the deadline passes the expiry callback runs, normally
//! `ENGINE.lock().abort_all()`.

use crate::composer::Notifier;
use crate::types::ComposeState;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

enum Msg {
    State(ComposeState),
    Shutdown,
}

pub struct IdleWatchdog {
    tx: Sender<Msg>,
    handle: Option<JoinHandle<()>>,
}

/// Notifier half of an [`IdleWatchdog`]; hand it to the composer.
#[derive(Clone)]
pub struct IdleNotifier {
    tx: Sender<Msg>,
}

impl Notifier for IdleNotifier {
    fn notify(&mut self, state: ComposeState) {
        // Never blocks: the channel is unbounded.
        if self.tx.send(Msg::State(state)).is_err() {
            warn!("Idle watchdog is gone; dropping {:?}", state);
        }
    }
}

impl IdleWatchdog {
    pub fn spawn<F>(timeout: Duration, on_expire: F) -> std::io::Result<Self>
    where
        F: Fn() + Send + 'static,
    {
        let (tx, rx) = unbounded();
        let handle = std::thread::Builder::new()
            .name("compose-idle".to_string())
            .spawn(move || run(rx, timeout, on_expire))?;
        Ok(Self {
            tx,
            handle: Some(handle),
        })
    }

    pub fn notifier(&self) -> IdleNotifier {
        IdleNotifier {
            tx: self.tx.clone(),
        }
    }

    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.tx.send(Msg::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for IdleWatchdog {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<F: Fn()>(rx: Receiver<Msg>, timeout: Duration, on_expire: F) {
    let mut deadline: Option<Instant> = None;
    loop {
        let msg = match deadline {
            Some(at) => rx.recv_deadline(at),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match msg {
            Ok(Msg::State(ComposeState::Start | ComposeState::Key)) => {
                deadline = Some(Instant::now() + timeout);
            }
            Ok(Msg::State(ComposeState::Done)) => deadline = None,
            Ok(Msg::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                debug!("Composition idle for {:?}, aborting", timeout);
                deadline = None;
                on_expire();
            }
        }
    }
}
