//! Virtual-key codes the composer cares about, plus the key-name table used
//! by settings.

pub const VK_BACK: u32 = 0x08;
pub const VK_TAB: u32 = 0x09;
pub const VK_RETURN: u32 = 0x0D;
pub const VK_SHIFT: u32 = 0x10;
pub const VK_CONTROL: u32 = 0x11;
pub const VK_MENU: u32 = 0x12;
pub const VK_PAUSE: u32 = 0x13;
pub const VK_CAPITAL: u32 = 0x14;
pub const VK_ESCAPE: u32 = 0x1B;
pub const VK_SPACE: u32 = 0x20;
pub const VK_INSERT: u32 = 0x2D;
pub const VK_LWIN: u32 = 0x5B;
pub const VK_RWIN: u32 = 0x5C;
pub const VK_APPS: u32 = 0x5D;
pub const VK_F1: u32 = 0x70;
pub const VK_SCROLL: u32 = 0x91;
pub const VK_LSHIFT: u32 = 0xA0;
pub const VK_RSHIFT: u32 = 0xA1;
pub const VK_LCONTROL: u32 = 0xA2;
pub const VK_RCONTROL: u32 = 0xA3;
pub const VK_LMENU: u32 = 0xA4;
pub const VK_RMENU: u32 = 0xA5;
pub const VK_OEM_1: u32 = 0xBA;
pub const VK_OEM_PLUS: u32 = 0xBB;
pub const VK_OEM_COMMA: u32 = 0xBC;
pub const VK_OEM_MINUS: u32 = 0xBD;
pub const VK_OEM_PERIOD: u32 = 0xBE;
pub const VK_OEM_2: u32 = 0xBF;
pub const VK_OEM_3: u32 = 0xC0;
pub const VK_OEM_4: u32 = 0xDB;
pub const VK_OEM_5: u32 = 0xDC;
pub const VK_OEM_6: u32 = 0xDD;
pub const VK_OEM_7: u32 = 0xDE;
/// Unicode packet: the scan code carries the character.
pub const VK_PACKET: u32 = 0xE7;

/// High bit of a keyboard-state slot, set while the key is held.
pub const KEY_DOWN_BIT: u8 = 0x80;

pub fn vk_to_key_name(vk: u32) -> Option<&'static str> {
    match vk {
        VK_BACK => Some("backspace"),
        VK_TAB => Some("tab"),
        VK_RETURN => Some("enter"),
        VK_PAUSE => Some("pause"),
        VK_CAPITAL => Some("capslock"),
        VK_ESCAPE => Some("escape"),
        VK_SPACE => Some("space"),
        VK_INSERT => Some("insert"),
        VK_LWIN => Some("leftwin"),
        VK_RWIN => Some("rightwin"),
        VK_APPS => Some("menu"),
        VK_SCROLL => Some("scrolllock"),
        VK_LSHIFT => Some("leftshift"),
        VK_RSHIFT => Some("rightshift"),
        VK_LCONTROL => Some("leftctrl"),
        VK_RCONTROL => Some("rightctrl"),
        VK_LMENU => Some("leftalt"),
        VK_RMENU => Some("rightalt"),
        0x70..=0x87 => Some(FUNCTION_KEY_NAMES[(vk - 0x70) as usize]),
        _ => None,
    }
}

const FUNCTION_KEY_NAMES: [&str; 24] = [
    "f1", "f2", "f3", "f4", "f5", "f6", "f7", "f8", "f9", "f10", "f11", "f12", "f13", "f14",
    "f15", "f16", "f17", "f18", "f19", "f20", "f21", "f22", "f23", "f24",
];

/// Case-insensitive reverse lookup of [`vk_to_key_name`].
pub fn key_name_to_vk(name: &str) -> Option<u32> {
    let name = name.trim().to_ascii_lowercase();
    (0..256u32).find(|&vk| vk_to_key_name(vk) == Some(name.as_str()))
}

/// Whether a standard layout maps `vk` to a character at all. Keys outside
/// this set never translate, so they can't act as in-composition keys.
pub const fn types_character(vk: u32) -> bool {
    matches!(
        vk,
        VK_BACK | VK_TAB | VK_RETURN | VK_ESCAPE | VK_SPACE
            | 0x30..=0x39
            | 0x41..=0x5A
            | 0x60..=0x6F
            | VK_OEM_1..=VK_OEM_3
            | VK_OEM_4..=VK_OEM_7
            | 0xE2
    )
}

pub const fn is_shift(vk: u32) -> bool {
    matches!(vk, VK_LSHIFT | VK_RSHIFT)
}
