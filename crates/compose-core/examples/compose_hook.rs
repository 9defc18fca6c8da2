//! Installs the low-level keyboard hook with a small built-in table.
//!
//! Usage: `compose_hook [settings.json]`

#[cfg(windows)]
fn main() -> anyhow::Result<()> {
    use compose_core::engine::ENGINE;
    use compose_core::idle::IdleWatchdog;
    use compose_core::keyboard_hook;
    use compose_core::settings::Settings;
    use compose_core::{ComposeState, Notifier};
    use std::sync::Arc;

    tracing_subscriber::fmt::init();

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let mut table = settings.empty_table()?;
    if table.arity() == 2 {
        for (keys, result) in [
            (['a', 'e'], "æ"),
            (['o', '/'], "ø"),
            (['e', '\''], "é"),
            (['s', 's'], "ß"),
            (['-', '>'], "→"),
        ] {
            table.insert(&keys, result)?;
        }
    }

    let watchdog = match settings.idle_timeout() {
        Some(timeout) => Some(IdleWatchdog::spawn(timeout, || ENGINE.lock().abort_all())?),
        None => None,
    };
    let mut idle = watchdog.as_ref().map(IdleWatchdog::notifier);
    let notifier = move |state: ComposeState| {
        tracing::info!("state {}", state.as_str());
        if let Some(idle) = idle.as_mut() {
            idle.notify(state);
        }
    };

    let composer =
        keyboard_hook::win32_composer(settings.composer_config()?, Arc::new(table), notifier);
    {
        let mut engine = ENGINE.lock();
        engine.load_composer(composer);
        engine.set_shift_source(keyboard_hook::current_shift_state);
        engine.set_enabled(settings.enabled);
    }

    keyboard_hook::install_hook()?;
    keyboard_hook::run_event_loop();
    keyboard_hook::uninstall_hook();
    Ok(())
}

#[cfg(not(windows))]
fn main() {
    eprintln!("compose_hook needs the Windows low-level keyboard hook; try the `replay` example.");
}
