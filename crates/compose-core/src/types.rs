/// A character ordinal, or a raw virtual-key code when translation failed.
pub type Ordinal = u32;

/// Virtual-key code + hardware scan code identifying a physical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhysicalKey {
    pub vk: u32,
    pub scan: u32,
}

impl PhysicalKey {
    pub const fn new(vk: u32, scan: u32) -> Self {
        Self { vk, scan }
    }
}

/// Flags carried by an intercepted key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyFlags {
    pub up: bool,
    pub injected: bool,
    pub extended: bool,
}

/// One intercepted key transition, already decoded from the OS hook struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: PhysicalKey,
    pub flags: KeyFlags,
}

impl KeyEvent {
    pub const fn down(vk: u32, scan: u32) -> Self {
        Self {
            key: PhysicalKey::new(vk, scan),
            flags: KeyFlags {
                up: false,
                injected: false,
                extended: false,
            },
        }
    }

    pub const fn up(vk: u32, scan: u32) -> Self {
        Self {
            key: PhysicalKey::new(vk, scan),
            flags: KeyFlags {
                up: true,
                injected: false,
                extended: false,
            },
        }
    }

    /// Marks the event as synthesized (looped back from our own injection).
    pub const fn injected(mut self) -> Self {
        self.flags.injected = true;
        self
    }

    pub const fn extended(mut self) -> Self {
        self.flags.extended = true;
        self
    }

    pub const fn vk(&self) -> u32 {
        self.key.vk
    }

    pub const fn is_up(&self) -> bool {
        self.flags.up
    }

    pub const fn is_injected(&self) -> bool {
        self.flags.injected
    }
}

/// Opaque identity of a top-level window, compared for equality only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WindowId(pub isize);

/// Composition state change reported to the notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeState {
    /// The hotkey opened a composition level.
    Start,
    /// A key was buffered into the active level.
    Key,
    /// Every level is closed, by resolution or abort.
    Done,
}

impl ComposeState {
    pub const fn as_str(self) -> &'static str {
        match self {
            ComposeState::Start => "start",
            ComposeState::Key => "key",
            ComposeState::Done => "done",
        }
    }
}

/// Action to be taken by the hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Pass,
    Block,
}

impl From<bool> for KeyAction {
    fn from(consumed: bool) -> Self {
        if consumed {
            KeyAction::Block
        } else {
            KeyAction::Pass
        }
    }
}
