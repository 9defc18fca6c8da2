use crate::keys::{is_shift, KEY_DOWN_BIT, VK_LSHIFT, VK_RSHIFT, VK_SHIFT};
use crate::types::KeyEvent;

/// Snapshot of the 256 keyboard-state slots handed to the translator.
///
/// Only the shift slots are maintained here; every other slot keeps whatever
/// the initial snapshot held. After any update the combined `VK_SHIFT` slot is
/// the bitwise OR of the left and right slots.
#[derive(Clone, PartialEq, Eq)]
pub struct ShiftState {
    slots: [u8; 256],
}

impl Default for ShiftState {
    fn default() -> Self {
        Self { slots: [0; 256] }
    }
}

impl std::fmt::Debug for ShiftState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShiftState")
            .field("lshift", &self.slots[VK_LSHIFT as usize])
            .field("rshift", &self.slots[VK_RSHIFT as usize])
            .field("shift", &self.slots[VK_SHIFT as usize])
            .finish()
    }
}

impl ShiftState {
    /// Starts from an OS keyboard-state snapshot.
    pub fn from_snapshot(slots: [u8; 256]) -> Self {
        let mut state = Self { slots };
        state.recombine();
        state
    }

    /// Updates the left/right slot for a shift transition.
    /// Returns `true` if the event was a shift key.
    pub fn track(&mut self, event: &KeyEvent) -> bool {
        let vk = event.vk();
        if !is_shift(vk) {
            return false;
        }
        self.slots[vk as usize] = if event.is_up() { 0 } else { KEY_DOWN_BIT };
        self.recombine();
        true
    }

    fn recombine(&mut self) {
        self.slots[VK_SHIFT as usize] =
            self.slots[VK_LSHIFT as usize] | self.slots[VK_RSHIFT as usize];
    }

    pub fn is_shifted(&self) -> bool {
        self.slots[VK_SHIFT as usize] & KEY_DOWN_BIT != 0
    }

    pub fn slot(&self, vk: u32) -> u8 {
        self.slots.get(vk as usize).copied().unwrap_or(0)
    }

    pub fn as_bytes(&self) -> &[u8; 256] {
        &self.slots
    }
}
