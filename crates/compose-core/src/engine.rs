use crate::composer::Composer;
use crate::shift_state::ShiftState;
use crate::types::{KeyAction, KeyEvent, WindowId};
use parking_lot::Mutex;
use tracing::info;

lazy_static::lazy_static! {
    pub static ref ENGINE: Mutex<Engine> = Mutex::new(Engine::default());
}

/// Owns the loaded composer and the user-facing enabled switch.
pub struct Engine {
    composer: Option<Composer>,
    enabled: bool,
    on_enabled_change: Option<Box<dyn Fn(bool) + Send + Sync>>,
    /// Modifier snapshot taken when interception resumes.
    shift_source: Box<dyn Fn() -> ShiftState + Send + Sync>,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            composer: None,
            enabled: true,
            on_enabled_change: None,
            shift_source: Box::new(ShiftState::default),
        }
    }
}

impl Engine {
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            if enabled {
                // Key-ups seen while disabled never reached the composer.
                if let Some(composer) = self.composer.as_mut() {
                    composer.reset((self.shift_source)());
                }
            } else {
                self.abort_all();
            }
            info!("Engine enabled: {}", enabled);
            if let Some(ref cb) = self.on_enabled_change {
                cb(enabled);
            }
        }
    }

    pub fn set_on_enabled_change(&mut self, cb: impl Fn(bool) + Send + Sync + 'static) {
        self.on_enabled_change = Some(Box::new(cb));
    }

    pub fn set_shift_source(&mut self, source: impl Fn() -> ShiftState + Send + Sync + 'static) {
        self.shift_source = Box::new(source);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Replaces the active composer. Any open composition on the old one is
    /// aborted first.
    pub fn load_composer(&mut self, composer: Composer) {
        if let Some(mut old) = self.composer.take() {
            old.abort_all();
        }
        info!(
            "Engine: composer loaded with {} compositions (arity {}).",
            composer.table().len(),
            composer.table().arity()
        );
        self.composer = Some(composer);
    }

    pub fn unload(&mut self) -> Option<Composer> {
        self.composer.take()
    }

    pub fn is_composing(&self) -> bool {
        self.composer.as_ref().is_some_and(Composer::is_composing)
    }

    pub fn process_key(&mut self, event: &KeyEvent, foreground: WindowId) -> KeyAction {
        if !self.enabled {
            return KeyAction::Pass;
        }
        match self.composer.as_mut() {
            Some(composer) => composer.handle(event, foreground).into(),
            None => KeyAction::Pass,
        }
    }

    pub fn abort_all(&mut self) {
        if let Some(composer) = self.composer.as_mut() {
            composer.abort_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::ComposerConfig;
    use crate::keys::{KEY_DOWN_BIT, VK_LSHIFT, VK_RMENU};
    use crate::mock::{vk_for, RecordingNotifier, RecordingSink, UsTranslator};
    use crate::table::CompositionTable;
    use crate::types::ComposeState;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    const WIN: WindowId = WindowId(1);

    fn loaded_engine() -> (Engine, RecordingSink, RecordingNotifier) {
        let mut table = CompositionTable::new();
        table.insert(&['a', 'e'], "æ").unwrap();
        let sink = RecordingSink::default();
        let notes = RecordingNotifier::default();
        let composer = Composer::new(
            ComposerConfig::default(),
            Arc::new(table),
            UsTranslator,
            sink.clone(),
            notes.clone(),
        );
        let mut engine = Engine::default();
        engine.load_composer(composer);
        (engine, sink, notes)
    }

    fn press(engine: &mut Engine, c: char) -> KeyAction {
        let (vk, scan) = vk_for(c);
        engine.process_key(&KeyEvent::down(vk, scan), WIN)
    }

    #[test]
    fn test_without_composer_everything_passes() {
        let mut engine = Engine::default();
        let res = engine.process_key(&KeyEvent::down(VK_RMENU, 0x38), WIN);
        assert_eq!(res, KeyAction::Pass);
        assert!(!engine.is_composing());
    }

    #[test]
    fn test_compose_through_engine() {
        let (mut engine, sink, _) = loaded_engine();
        assert_eq!(
            engine.process_key(&KeyEvent::down(VK_RMENU, 0x38), WIN),
            KeyAction::Block
        );
        assert!(engine.is_composing());
        assert_eq!(press(&mut engine, 'a'), KeyAction::Block);
        assert_eq!(press(&mut engine, 'e'), KeyAction::Block);
        assert_eq!(sink.injected_text(), "æ");
        assert_eq!(press(&mut engine, 'x'), KeyAction::Pass);
    }

    #[test]
    fn test_disable_aborts_and_passes() {
        let (mut engine, sink, notes) = loaded_engine();
        let toggled = Arc::new(AtomicBool::new(true));
        let seen = toggled.clone();
        engine.set_on_enabled_change(move |on| seen.store(on, Ordering::SeqCst));

        engine.process_key(&KeyEvent::down(VK_RMENU, 0x38), WIN);
        press(&mut engine, 'a');
        engine.set_enabled(false);

        assert!(!toggled.load(Ordering::SeqCst));
        assert!(!engine.is_composing());
        assert_eq!(notes.states().last(), Some(&ComposeState::Done));
        assert_eq!(press(&mut engine, 'e'), KeyAction::Pass);
        assert!(sink.injected().is_empty());

        engine.set_enabled(true);
        assert!(toggled.load(Ordering::SeqCst));
        assert_eq!(press(&mut engine, 'e'), KeyAction::Pass, "fresh state");
    }

    #[test]
    fn test_reload_aborts_old_composer() {
        let (mut engine, _, notes) = loaded_engine();
        engine.process_key(&KeyEvent::down(VK_RMENU, 0x38), WIN);
        let (mut other, _, _) = loaded_engine();
        engine.load_composer(other.unload().unwrap());

        assert_eq!(notes.states(), vec![ComposeState::Start, ComposeState::Done]);
        assert!(!engine.is_composing());
    }

    #[test]
    fn test_hotkey_released_while_disabled_is_not_a_repeat() {
        let (mut engine, sink, _) = loaded_engine();
        engine.process_key(&KeyEvent::down(VK_RMENU, 0x38), WIN);
        engine.set_enabled(false);
        assert_eq!(
            engine.process_key(&KeyEvent::up(VK_RMENU, 0x38), WIN),
            KeyAction::Pass
        );
        engine.set_enabled(true);

        assert_eq!(
            engine.process_key(&KeyEvent::down(VK_RMENU, 0x38), WIN),
            KeyAction::Block
        );
        assert!(engine.is_composing());
        press(&mut engine, 'a');
        press(&mut engine, 'e');
        assert_eq!(sink.injected_text(), "æ");
    }

    #[test]
    fn test_shift_released_while_disabled_is_forgotten() {
        let (mut engine, sink, _) = loaded_engine();
        engine.process_key(&KeyEvent::down(VK_LSHIFT, 0x2A), WIN);
        engine.set_enabled(false);
        engine.process_key(&KeyEvent::up(VK_LSHIFT, 0x2A), WIN);
        engine.set_enabled(true);

        engine.process_key(&KeyEvent::down(VK_RMENU, 0x38), WIN);
        press(&mut engine, 'a');
        press(&mut engine, 'e');
        assert_eq!(sink.injected_text(), "æ");
        assert_eq!(sink.failures(), 0);
    }

    #[test]
    fn test_reenable_takes_shift_from_source() {
        let (mut engine, sink, _) = loaded_engine();
        engine.set_shift_source(|| {
            let mut slots = [0u8; 256];
            slots[VK_LSHIFT as usize] = KEY_DOWN_BIT;
            ShiftState::from_snapshot(slots)
        });
        engine.set_enabled(false);
        engine.set_enabled(true);

        engine.process_key(&KeyEvent::down(VK_RMENU, 0x38), WIN);
        press(&mut engine, 'a');
        press(&mut engine, 'e');
        assert!(sink.injected().is_empty(), "held shift looks up \"AE\"");
        assert_eq!(sink.failures(), 1);
    }
}
