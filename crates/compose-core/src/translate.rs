use crate::keys::VK_PACKET;
use crate::shift_state::ShiftState;
use crate::types::{Ordinal, PhysicalKey};

/// Maps a physical key plus modifier context to a printable character.
pub trait KeyTranslator {
    /// Returns the character ordinal, or `None` when the key has no
    /// printable mapping under `shift`.
    fn translate(&self, key: PhysicalKey, shift: &ShiftState) -> Option<Ordinal>;
}

impl<F> KeyTranslator for F
where
    F: Fn(PhysicalKey, &ShiftState) -> Option<Ordinal>,
{
    fn translate(&self, key: PhysicalKey, shift: &ShiftState) -> Option<Ordinal> {
        self(key, shift)
    }
}

/// Outcome of translating a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Translation {
    /// Printable character ordinal.
    Char(Ordinal),
    /// No mapping; carries the raw virtual-key code.
    Raw(u32),
}

impl Translation {
    pub const fn ordinal(self) -> Ordinal {
        match self {
            Translation::Char(c) | Translation::Raw(c) => c,
        }
    }
}

/// Translates `key`, treating unicode packets as already translated.
pub fn translate_key(
    translator: &dyn KeyTranslator,
    key: PhysicalKey,
    shift: &ShiftState,
) -> Translation {
    if key.vk == VK_PACKET {
        return Translation::Char(key.scan);
    }
    match translator.translate(key, shift) {
        Some(ordinal) => Translation::Char(ordinal),
        None => Translation::Raw(key.vk),
    }
}
