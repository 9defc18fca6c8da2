use crate::composer::ComposerConfig;
use crate::error::{Error, Result};
use crate::keys::{
    self, VK_APPS, VK_CAPITAL, VK_ESCAPE, VK_INSERT, VK_PAUSE, VK_RCONTROL, VK_RMENU, VK_RWIN,
    VK_SCROLL,
};
use crate::table::{CompositionTable, DEFAULT_ARITY};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeySelect {
    RightAlt,
    RightControl,
    RightWin,
    Menu,
    CapsLock,
    ScrollLock,
    Pause,
    Insert,
    Escape,
    /// Any key by name, e.g. `"f13"`.
    Named(String),
    /// Raw virtual-key code.
    Vk(u32),
}

impl KeySelect {
    pub fn to_vk(&self) -> Result<u32> {
        match self {
            KeySelect::RightAlt => Ok(VK_RMENU),
            KeySelect::RightControl => Ok(VK_RCONTROL),
            KeySelect::RightWin => Ok(VK_RWIN),
            KeySelect::Menu => Ok(VK_APPS),
            KeySelect::CapsLock => Ok(VK_CAPITAL),
            KeySelect::ScrollLock => Ok(VK_SCROLL),
            KeySelect::Pause => Ok(VK_PAUSE),
            KeySelect::Insert => Ok(VK_INSERT),
            KeySelect::Escape => Ok(VK_ESCAPE),
            KeySelect::Named(name) => {
                keys::key_name_to_vk(name).ok_or_else(|| Error::UnknownKeyName(name.clone()))
            }
            KeySelect::Vk(vk) => Ok(*vk),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub hotkey: KeySelect,
    pub cancel_key: KeySelect,
    pub arity: usize,
    /// Milliseconds without input before an open composition is abandoned.
    /// Zero disables the timeout.
    pub idle_timeout_ms: u64,
    pub enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hotkey: KeySelect::RightAlt,
            cancel_key: KeySelect::Escape,
            arity: DEFAULT_ARITY,
            idle_timeout_ms: 2000,
            enabled: true,
        }
    }
}

impl Settings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&content)?;
        info!("Settings loaded from {:?}", path);
        Ok(settings)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Resolves the key selections. The cancel key is only checked once a
    /// key has translated to a character, so keys that never do are refused.
    pub fn composer_config(&self) -> Result<ComposerConfig> {
        let cancel_key = self.cancel_key.to_vk()?;
        if !keys::types_character(cancel_key) {
            return Err(Error::CancelKeyNotCharacter(cancel_key));
        }
        Ok(ComposerConfig {
            hotkey: self.hotkey.to_vk()?,
            cancel_key,
        })
    }

    /// An empty table with the configured arity, ready to be filled.
    pub fn empty_table(&self) -> Result<CompositionTable> {
        CompositionTable::with_arity(self.arity)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_ms > 0).then(|| Duration::from_millis(self.idle_timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        let config = settings.composer_config().unwrap();
        assert_eq!(config, ComposerConfig::default());
        assert_eq!(settings.idle_timeout(), Some(Duration::from_secs(2)));
        assert_eq!(settings.empty_table().unwrap().arity(), 2);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings =
            Settings::from_json(r#"{ "hotkey": "CapsLock", "idle_timeout_ms": 0 }"#).unwrap();
        assert_eq!(settings.hotkey, KeySelect::CapsLock);
        assert_eq!(settings.cancel_key, KeySelect::Escape);
        assert_eq!(settings.idle_timeout(), None);
        assert!(settings.enabled);
        assert_eq!(settings.composer_config().unwrap().hotkey, VK_CAPITAL);
    }

    #[test]
    fn test_named_and_raw_keys() {
        let settings =
            Settings::from_json(r#"{ "hotkey": { "Named": "F13" }, "cancel_key": { "Vk": 8 } }"#)
                .unwrap();
        let config = settings.composer_config().unwrap();
        assert_eq!(config.hotkey, 0x7C);
        assert_eq!(config.cancel_key, 0x08);
    }

    #[test]
    fn test_unknown_name_is_an_error() {
        let settings = Settings {
            hotkey: KeySelect::Named("hyper".to_string()),
            ..Settings::default()
        };
        assert!(matches!(
            settings.composer_config(),
            Err(Error::UnknownKeyName(name)) if name == "hyper"
        ));
    }

    #[test]
    fn test_cancel_key_must_type_a_character() {
        for select in [
            KeySelect::Pause,
            KeySelect::Insert,
            KeySelect::ScrollLock,
            KeySelect::CapsLock,
            KeySelect::RightWin,
            KeySelect::Named("f13".to_string()),
        ] {
            let vk = select.to_vk().unwrap();
            let settings = Settings {
                cancel_key: select,
                ..Settings::default()
            };
            assert!(matches!(
                settings.composer_config(),
                Err(Error::CancelKeyNotCharacter(found)) if found == vk
            ));
        }
    }

    #[test]
    fn test_configured_cancel_key_aborts() {
        use crate::composer::Composer;
        use crate::mock::{vk_for, RecordingNotifier, RecordingSink, UsTranslator};
        use crate::types::{ComposeState, KeyEvent, WindowId};
        use std::sync::Arc;

        let settings =
            Settings::from_json(r#"{ "cancel_key": { "Named": "backspace" } }"#).unwrap();
        let config = settings.composer_config().unwrap();
        let mut table = settings.empty_table().unwrap();
        table.insert(&['a', 'e'], "æ").unwrap();
        let sink = RecordingSink::default();
        let notes = RecordingNotifier::default();
        let mut composer = Composer::new(
            config,
            Arc::new(table),
            UsTranslator,
            sink.clone(),
            notes.clone(),
        );
        let win = WindowId(1);

        assert!(composer.handle(&KeyEvent::down(VK_RMENU, 0x38), win));
        let (vk, scan) = vk_for('a');
        assert!(composer.handle(&KeyEvent::down(vk, scan), win));
        assert!(composer.handle(&KeyEvent::down(keys::VK_BACK, 0x0E), win));

        assert!(!composer.is_composing());
        assert!(sink.injected().is_empty());
        assert_eq!(notes.states().last(), Some(&ComposeState::Done));

        // Escape is an ordinary key now.
        composer.handle(&KeyEvent::down(VK_RMENU, 0x38), win);
        assert!(composer.handle(&KeyEvent::down(VK_ESCAPE, 0x01), win));
        assert!(composer.is_composing());
    }

    #[test]
    fn test_json_roundtrip_and_bad_input() {
        let settings = Settings {
            arity: 3,
            ..Settings::default()
        };
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
        assert!(matches!(Settings::from_json("{"), Err(Error::Settings(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Settings::load("/nonexistent/compose-settings.json").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
