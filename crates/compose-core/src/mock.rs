//! Deterministic collaborators for tests, benches and demos.
//!
//! Lets a [`Composer`](crate::composer::Composer) run without an OS hook: a
//! fixed US-layout translator, a sink that records injections and failure
//! signals, and a notifier that records state changes.

use crate::composer::{InputSink, Notifier};
use crate::error::{Error, Result};
use crate::keys::*;
use crate::shift_state::ShiftState;
use crate::translate::KeyTranslator;
use crate::types::{ComposeState, Ordinal, PhysicalKey};
use parking_lot::Mutex;
use std::sync::Arc;

const LETTER_ROWS: [(&str, u32); 3] = [("qwertyuiop", 0x10), ("asdfghjkl", 0x1E), ("zxcvbnm", 0x2C)];

/// (virtual key, unshifted, shifted) for the punctuation keys.
const OEM_KEYS: [(u32, char, char); 11] = [
    (VK_OEM_1, ';', ':'),
    (VK_OEM_PLUS, '=', '+'),
    (VK_OEM_COMMA, ',', '<'),
    (VK_OEM_MINUS, '-', '_'),
    (VK_OEM_PERIOD, '.', '>'),
    (VK_OEM_2, '/', '?'),
    (VK_OEM_3, '`', '~'),
    (VK_OEM_4, '[', '{'),
    (VK_OEM_5, '\\', '|'),
    (VK_OEM_6, ']', '}'),
    (VK_OEM_7, '\'', '"'),
];

const OEM_SCANS: [u32; 11] = [0x27, 0x0D, 0x33, 0x0C, 0x34, 0x35, 0x29, 0x1A, 0x2B, 0x1B, 0x28];

const SHIFTED_DIGITS: [char; 10] = [')', '!', '@', '#', '$', '%', '^', '&', '*', '('];

/// Translates virtual keys the way a US keyboard layout does.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsTranslator;

impl KeyTranslator for UsTranslator {
    fn translate(&self, key: PhysicalKey, shift: &ShiftState) -> Option<Ordinal> {
        let shifted = shift.is_shifted();
        let c = match key.vk {
            0x41..=0x5A => {
                let lower = char::from_u32(key.vk + 0x20)?;
                if shifted {
                    lower.to_ascii_uppercase()
                } else {
                    lower
                }
            }
            0x30..=0x39 if shifted => SHIFTED_DIGITS[(key.vk - 0x30) as usize],
            0x30..=0x39 => char::from_u32(key.vk)?,
            VK_SPACE => ' ',
            VK_ESCAPE => '\u{1B}',
            VK_RETURN => '\r',
            VK_BACK => '\u{08}',
            VK_TAB => '\t',
            vk => {
                let &(_, plain, upper) = OEM_KEYS.iter().find(|(oem, _, _)| *oem == vk)?;
                if shifted {
                    upper
                } else {
                    plain
                }
            }
        };
        Some(c as Ordinal)
    }
}

/// Returns the `(virtual key, scan code)` that types `c` on a US layout,
/// ignoring shift.
///
/// Panics if `c` has no key.
pub fn vk_for(c: char) -> (u32, u32) {
    let lower = c.to_ascii_lowercase();
    for (row, first_scan) in LETTER_ROWS {
        if let Some(i) = row.find(lower) {
            return (lower.to_ascii_uppercase() as u32, first_scan + i as u32);
        }
    }
    if let Some(d) = c.to_digit(10) {
        let scan = if d == 0 { 0x0B } else { 0x01 + d };
        return (0x30 + d, scan);
    }
    if let Some(d) = SHIFTED_DIGITS.iter().position(|&s| s == c) {
        return vk_for(char::from_digit(d as u32, 10).unwrap_or('0'));
    }
    if let Some(i) = OEM_KEYS
        .iter()
        .position(|&(_, plain, upper)| plain == c || upper == c)
    {
        return (OEM_KEYS[i].0, OEM_SCANS[i]);
    }
    match c {
        ' ' => (VK_SPACE, 0x39),
        '\u{1B}' => (VK_ESCAPE, 0x01),
        _ => panic!("no US key for {:?}", c),
    }
}

#[derive(Debug, Default)]
struct SinkLog {
    injected: Vec<Vec<Ordinal>>,
    failures: usize,
    fail_next: bool,
}

/// Records every injection request and failure signal. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    log: Arc<Mutex<SinkLog>>,
}

impl RecordingSink {
    pub fn injected(&self) -> Vec<Vec<Ordinal>> {
        self.log.lock().injected.clone()
    }

    /// Injected output as text.
    pub fn injected_text(&self) -> String {
        self.log
            .lock()
            .injected
            .iter()
            .flatten()
            .filter_map(|&o| char::from_u32(o))
            .collect()
    }

    pub fn failures(&self) -> usize {
        self.log.lock().failures
    }

    /// Makes the next injection return an error without recording it.
    pub fn fail_next(&self) {
        self.log.lock().fail_next = true;
    }
}

impl InputSink for RecordingSink {
    fn inject(&mut self, ordinals: &[Ordinal]) -> Result<()> {
        let mut log = self.log.lock();
        if std::mem::take(&mut log.fail_next) {
            return Err(Error::Injection("simulated failure".to_string()));
        }
        log.injected.push(ordinals.to_vec());
        Ok(())
    }

    fn signal_failure(&mut self) {
        self.log.lock().failures += 1;
    }
}

/// Records state notifications. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    states: Arc<Mutex<Vec<ComposeState>>>,
}

impl RecordingNotifier {
    pub fn states(&self) -> Vec<ComposeState> {
        self.states.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, state: ComposeState) {
        self.states.lock().push(state);
    }
}
