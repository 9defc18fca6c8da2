//! Feeds a typed script through the composer with the US-layout mock and
//! prints what the application would receive.
//!
//! Usage: `replay '*ae plain *o/'` (`*` is the compose key)

use compose_core::composer::Composer;
use compose_core::engine::Engine;
use compose_core::idle::IdleWatchdog;
use compose_core::keys::VK_LSHIFT;
use compose_core::mock::{vk_for, RecordingSink, UsTranslator};
use compose_core::settings::Settings;
use compose_core::{ComposeState, KeyAction, KeyEvent, Notifier, WindowId};
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let script = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "*ae and *o/ and **e'*e'".to_string());

    let settings = Settings::default();
    let config = settings.composer_config()?;
    let mut table = settings.empty_table()?;
    table.insert(&['a', 'e'], "æ")?;
    table.insert(&['o', '/'], "ø")?;
    table.insert(&['e', '\''], "é")?;
    table.insert(&['é', 'é'], "ee!")?;

    let watchdog = IdleWatchdog::spawn(
        settings.idle_timeout().unwrap_or(std::time::Duration::from_secs(2)),
        || tracing::warn!("composition timed out"),
    )?;
    let mut idle = watchdog.notifier();
    let notifier = move |state: ComposeState| {
        tracing::debug!("state {}", state.as_str());
        idle.notify(state);
    };

    let sink = RecordingSink::default();
    let mut engine = Engine::default();
    engine.load_composer(Composer::new(
        config,
        Arc::new(table),
        UsTranslator,
        sink.clone(),
        notifier,
    ));

    let window = WindowId(1);
    let mut output = String::new();
    let mut seen = 0;
    for c in script.chars() {
        let shifted = c.is_ascii_uppercase() || "\"<>?:{}|~!@#$%^&()_+".contains(c);
        let (vk, scan) = if c == '*' {
            (config.hotkey, 0x38)
        } else {
            vk_for(c)
        };
        if shifted {
            engine.process_key(&KeyEvent::down(VK_LSHIFT, 0x2A), window);
        }
        if engine.process_key(&KeyEvent::down(vk, scan), window) == KeyAction::Pass {
            output.push(c);
        }
        engine.process_key(&KeyEvent::up(vk, scan), window);
        if shifted {
            engine.process_key(&KeyEvent::up(VK_LSHIFT, 0x2A), window);
        }
        let injected = sink.injected();
        for ordinals in &injected[seen..] {
            output.extend(ordinals.iter().filter_map(|&o| char::from_u32(o)));
        }
        seen = injected.len();
    }

    println!("{}", output);
    println!("failed sequences: {}", sink.failures());
    watchdog.shutdown();
    Ok(())
}
