use compose_core::composer::{Composer, ComposerConfig, InputSink};
use compose_core::keys::{VK_PACKET, VK_RMENU};
use compose_core::mock::{vk_for, RecordingNotifier, UsTranslator};
use compose_core::{CompositionTable, KeyEvent, Ordinal, WindowId};
use parking_lot::Mutex;
use std::sync::Arc;

const WIN: WindowId = WindowId(7);

/// Sink that behaves like SendInput: every ordinal comes back through the
/// hook as an injected unicode packet.
#[derive(Clone, Default)]
struct LoopbackSink {
    queue: Arc<Mutex<Vec<Ordinal>>>,
    beeps: Arc<Mutex<usize>>,
}

impl InputSink for LoopbackSink {
    fn inject(&mut self, ordinals: &[Ordinal]) -> compose_core::Result<()> {
        self.queue.lock().extend_from_slice(ordinals);
        Ok(())
    }

    fn signal_failure(&mut self) {
        *self.beeps.lock() += 1;
    }
}

/// Replays looped-back output; returns the characters that reached the app.
fn replay(composer: &mut Composer, sink: &LoopbackSink) -> String {
    let looped = std::mem::take(&mut *sink.queue.lock());
    let mut delivered = String::new();
    for ordinal in looped {
        let down = KeyEvent::down(VK_PACKET, ordinal).injected();
        let up = KeyEvent::up(VK_PACKET, ordinal).injected();
        let down_consumed = composer.handle(&down, WIN);
        composer.handle(&up, WIN);
        if !down_consumed {
            delivered.extend(char::from_u32(ordinal));
        }
    }
    delivered
}

fn setup() -> (Composer, LoopbackSink, RecordingNotifier) {
    let mut table = CompositionTable::new();
    table.insert(&['a', 'e'], "æ").unwrap();
    table.insert(&['-', '>'], "→").unwrap();
    let sink = LoopbackSink::default();
    let notes = RecordingNotifier::default();
    let composer = Composer::new(
        ComposerConfig::default(),
        Arc::new(table),
        UsTranslator,
        sink.clone(),
        notes.clone(),
    );
    (composer, sink, notes)
}

fn tap(composer: &mut Composer, c: char) -> bool {
    let (vk, scan) = vk_for(c);
    let down = composer.handle(&KeyEvent::down(vk, scan), WIN);
    let up = composer.handle(&KeyEvent::up(vk, scan), WIN);
    assert_eq!(down, up, "key-up must follow its key-down for {:?}", c);
    down
}

fn hotkey(composer: &mut Composer) {
    assert!(composer.handle(&KeyEvent::down(VK_RMENU, 0x38), WIN));
    assert!(composer.handle(&KeyEvent::up(VK_RMENU, 0x38), WIN));
}

#[test]
fn composed_output_reaches_the_application_once() {
    let (mut composer, sink, _) = setup();
    hotkey(&mut composer);
    assert!(tap(&mut composer, 'a'));
    assert!(tap(&mut composer, 'e'));

    assert_eq!(replay(&mut composer, &sink), "æ");
    assert_eq!(composer.depth(), 0);
    assert!(sink.queue.lock().is_empty(), "no feedback loop");
}

#[test]
fn injected_passthrough_matches_plain_passthrough() {
    let (mut composer, sink, notes) = setup();

    // A plain untranslated key and an injected packet at depth 0 both pass
    // without touching composer state.
    assert!(!tap(&mut composer, 'x'));
    sink.queue.lock().push('y' as u32);
    assert_eq!(replay(&mut composer, &sink), "y");

    assert_eq!(composer.depth(), 0);
    assert!(composer.compose_keys().is_empty());
    assert!(composer.pending_output().is_empty());
    assert_eq!(composer.last_key(), None);
    assert!(notes.states().is_empty());
}

#[test]
fn output_from_another_tool_is_captured_while_composing() {
    let (mut composer, sink, _) = setup();
    hotkey(&mut composer);
    assert!(tap(&mut composer, '-'));

    // Some other program injects '>' while we wait for the second key.
    sink.queue.lock().push('>' as u32);
    assert_eq!(replay(&mut composer, &sink), "", "swallowed into the sequence");
    assert_eq!(composer.depth(), 0);

    assert_eq!(replay(&mut composer, &sink), "→");
}

#[test]
fn typing_continues_normally_after_composition() {
    let (mut composer, sink, _) = setup();
    hotkey(&mut composer);
    tap(&mut composer, 'a');
    tap(&mut composer, 'e');
    replay(&mut composer, &sink);

    for c in "hello".chars() {
        assert!(!tap(&mut composer, c), "{:?} should pass", c);
    }
    assert_eq!(*sink.beeps.lock(), 0);
}
