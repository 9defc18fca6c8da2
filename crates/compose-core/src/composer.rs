//! The compose-key state machine.
//!
//! A [`Composer`] sees every intercepted key event, one at a time, and decides
//! whether the event is consumed. Pressing the hotkey opens a composition
//! level; the next `arity` translated keys are looked up in the
//! [`CompositionTable`] and the result replaces them. Pressing the hotkey again
//! while a level is open nests a new level whose result becomes the next key
//! of the outer one. Output is only injected once every level has closed.

use crate::error::Result;
use crate::keys::{VK_ESCAPE, VK_RMENU};
use crate::shift_state::ShiftState;
use crate::table::CompositionTable;
use crate::translate::{translate_key, KeyTranslator, Translation};
use crate::types::{ComposeState, KeyEvent, Ordinal, PhysicalKey, WindowId};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};

/// Receives composed output and failure signals.
pub trait InputSink {
    /// Synthesizes the ordinals as keyboard input, in order.
    fn inject(&mut self, ordinals: &[Ordinal]) -> Result<()>;

    /// Audible "no such composition" indication.
    fn signal_failure(&mut self);
}

/// Receives composition state changes.
pub trait Notifier {
    fn notify(&mut self, state: ComposeState);
}

impl<F> Notifier for F
where
    F: FnMut(ComposeState),
{
    fn notify(&mut self, state: ComposeState) {
        self(state)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposerConfig {
    /// Virtual-key code that opens a composition level.
    pub hotkey: u32,
    /// Virtual-key code that aborts every open level.
    pub cancel_key: u32,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            hotkey: VK_RMENU,
            cancel_key: VK_ESCAPE,
        }
    }
}

pub struct Composer {
    config: ComposerConfig,
    table: Arc<CompositionTable>,
    translator: Box<dyn KeyTranslator + Send>,
    sink: Box<dyn InputSink + Send>,
    notifier: Box<dyn Notifier + Send>,

    shift: ShiftState,
    /// One key buffer per open level; the last entry is the active level.
    levels: Vec<Vec<Ordinal>>,
    pending: Vec<Ordinal>,
    target_window: Option<WindowId>,
    last_key: Option<PhysicalKey>,
    hotkey_held: bool,
}

impl std::fmt::Debug for Composer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composer")
            .field("config", &self.config)
            .field("levels", &self.levels)
            .field("pending", &self.pending)
            .field("target_window", &self.target_window)
            .field("last_key", &self.last_key)
            .finish_non_exhaustive()
    }
}

impl Composer {
    pub fn new(
        config: ComposerConfig,
        table: Arc<CompositionTable>,
        translator: impl KeyTranslator + Send + 'static,
        sink: impl InputSink + Send + 'static,
        notifier: impl Notifier + Send + 'static,
    ) -> Self {
        Self {
            config,
            table,
            translator: Box::new(translator),
            sink: Box::new(sink),
            notifier: Box::new(notifier),
            shift: ShiftState::default(),
            levels: Vec::new(),
            pending: Vec::new(),
            target_window: None,
            last_key: None,
            hotkey_held: false,
        }
    }

    /// Seeds the modifier snapshot, e.g. from the OS keyboard state at startup.
    pub fn with_shift_state(mut self, shift: ShiftState) -> Self {
        self.shift = shift;
        self
    }

    pub fn config(&self) -> ComposerConfig {
        self.config
    }

    pub fn table(&self) -> &CompositionTable {
        &self.table
    }

    /// Number of open, possibly nested, composition levels.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn is_composing(&self) -> bool {
        !self.levels.is_empty()
    }

    /// Keys buffered for the active level.
    pub fn compose_keys(&self) -> &[Ordinal] {
        self.levels.last().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Output waiting for the outermost level to close.
    pub fn pending_output(&self) -> &[Ordinal] {
        &self.pending
    }

    pub fn target_window(&self) -> Option<WindowId> {
        self.target_window
    }

    pub fn last_key(&self) -> Option<PhysicalKey> {
        self.last_key
    }

    pub fn shift_state(&self) -> &ShiftState {
        &self.shift
    }

    /// Classifies one key event. Returns `true` if the event is consumed and
    /// must not reach the foreground application.
    pub fn handle(&mut self, event: &KeyEvent, foreground: WindowId) -> bool {
        self.shift.track(event);
        let hotkey_repeat = self.track_hotkey(event);

        if self.is_composing() && self.target_window != Some(foreground) {
            debug!(
                "Focus moved from {:?} to {:?}, aborting composition",
                self.target_window, foreground
            );
            self.abort_all();
            return false;
        }

        let key = event.key;
        let translation = translate_key(self.translator.as_ref(), key, &self.shift);

        // The matching key-down was already acted on.
        if event.is_up()
            && (self.last_key == Some(key) || self.compose_keys().contains(&translation.ordinal()))
        {
            return true;
        }

        if event.is_injected() {
            if self.is_composing() {
                if !event.is_up() {
                    self.feed([translation.ordinal()]);
                }
                return true;
            }
            return false;
        }

        self.last_key = Some(key);

        if key.vk == self.config.hotkey {
            if !event.is_up() && !hotkey_repeat {
                self.start_composing(foreground);
            }
            return true;
        }

        if let Translation::Char(ordinal) = translation {
            if self.is_composing() {
                if event.is_up() {
                    return true;
                }
                if key.vk == self.config.cancel_key {
                    debug!("Cancel key pressed at depth {}", self.depth());
                    self.abort_all();
                } else {
                    self.notifier.notify(ComposeState::Key);
                    self.feed([ordinal]);
                }
                return true;
            }
        }

        self.last_key = None;
        false
    }

    /// Drops every open level and any queued output. Always reports `done`.
    pub fn abort_all(&mut self) {
        if self.is_composing() || !self.pending.is_empty() {
            debug!(
                "Aborting composition (depth={}, pending={})",
                self.depth(),
                self.pending.len()
            );
        }
        self.levels.clear();
        self.pending.clear();
        self.notifier.notify(ComposeState::Done);
    }

    /// Forgets everything learned from the event stream and takes `shift` as
    /// the new modifier snapshot. Used when interception resumes after a gap
    /// in which key-ups may have been missed.
    pub fn reset(&mut self, shift: ShiftState) {
        self.levels.clear();
        self.pending.clear();
        self.target_window = None;
        self.last_key = None;
        self.hotkey_held = false;
        self.shift = shift;
    }

    /// Returns `true` for an auto-repeated hotkey press.
    fn track_hotkey(&mut self, event: &KeyEvent) -> bool {
        if event.vk() != self.config.hotkey || event.is_injected() {
            return false;
        }
        let repeat = !event.is_up() && self.hotkey_held;
        self.hotkey_held = !event.is_up();
        repeat
    }

    fn start_composing(&mut self, foreground: WindowId) {
        self.target_window = Some(foreground);
        self.levels.push(Vec::with_capacity(self.table.arity()));
        debug!("Composition started (depth={})", self.depth());
        self.notifier.notify(ComposeState::Start);
    }

    /// Buffers ordinals into the active level, resolving every level that
    /// fills up. A resolved result becomes input for the enclosing level, or
    /// queued output once no level is left.
    fn feed<I>(&mut self, ordinals: I)
    where
        I: IntoIterator<Item = Ordinal>,
    {
        let arity = self.table.arity();
        let mut queue: VecDeque<Ordinal> = ordinals.into_iter().collect();

        while let Some(ordinal) = queue.pop_front() {
            let Some(level) = self.levels.last_mut() else {
                self.pending.push(ordinal);
                continue;
            };
            level.push(ordinal);
            if level.len() < arity {
                continue;
            }

            let keys = std::mem::take(level);
            self.levels.pop();
            match self.table.lookup(&keys) {
                Some(result) => {
                    debug!(
                        "Composed {:?} -> {:?} (depth={})",
                        ordinals_text(&keys),
                        ordinals_text(result),
                        self.levels.len()
                    );
                    for &out in result.iter().rev() {
                        queue.push_front(out);
                    }
                }
                None => {
                    warn!("No composition for {:?}", ordinals_text(&keys));
                    self.sink.signal_failure();
                }
            }
        }

        if self.levels.is_empty() {
            self.flush();
            self.notifier.notify(ComposeState::Done);
        }
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let output = std::mem::take(&mut self.pending);
        if let Err(e) = self.sink.inject(&output) {
            warn!("Failed to inject composed output: {}", e);
        }
    }
}

fn ordinals_text(ordinals: &[Ordinal]) -> String {
    ordinals
        .iter()
        .map(|&o| char::from_u32(o).unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
