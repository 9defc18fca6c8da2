pub mod composer;
pub mod engine;
pub mod error;
pub mod idle;
#[cfg(windows)]
pub mod keyboard_hook;
pub mod keys;
pub mod mock;
pub mod settings;
pub mod shift_state;
pub mod table;
pub mod translate;
pub mod types;

pub use composer::{Composer, ComposerConfig, InputSink, Notifier};
pub use error::{Error, Result};
pub use table::CompositionTable;
pub use types::{ComposeState, KeyAction, KeyEvent, Ordinal, PhysicalKey, WindowId};
