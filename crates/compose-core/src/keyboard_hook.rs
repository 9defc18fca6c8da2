use crate::composer::{Composer, ComposerConfig, InputSink, Notifier};
use crate::engine::ENGINE;
use crate::shift_state::ShiftState;
use crate::table::CompositionTable;
use crate::translate::KeyTranslator;
use crate::types::{KeyAction, KeyEvent, KeyFlags, Ordinal, PhysicalKey, WindowId};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use windows::Win32::Foundation::{HINSTANCE, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::Diagnostics::Debug::MessageBeep;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetKeyboardState, SendInput, ToUnicode, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT,
    KEYEVENTF_KEYUP, KEYEVENTF_UNICODE, VIRTUAL_KEY,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetForegroundWindow, GetMessageW, PeekMessageW,
    SetWindowsHookExW, TranslateMessage, UnhookWindowsHookEx, HHOOK, KBDLLHOOKSTRUCT,
    LLKHF_EXTENDED, LLKHF_INJECTED, LLKHF_UP, MESSAGEBOX_STYLE, MSG, WH_KEYBOARD_LL,
};

static HOOK_HANDLE: Mutex<Option<HHOOK>> = Mutex::new(None);

/// Composed output waiting for the engine lock to be released.
static PENDING_OUTPUT: parking_lot::Mutex<Vec<Vec<Ordinal>>> = parking_lot::const_mutex(Vec::new());

/// Starts the keyboard hook.
/// This must be called from a thread that pumps messages (GetMessage/PeekMessage).
pub fn install_hook() -> anyhow::Result<()> {
    info!("Installing keyboard hook...");

    let hook_id =
        unsafe { SetWindowsHookExW(WH_KEYBOARD_LL, Some(hook_proc), HINSTANCE::default(), 0) }?;

    if hook_id.is_invalid() {
        return Err(anyhow::anyhow!("Failed to install hook"));
    }

    *HOOK_HANDLE
        .lock()
        .map_err(|_| anyhow::anyhow!("hook handle lock poisoned"))? = Some(hook_id);
    info!("Keyboard hook installed successfully. Handle: {:?}", hook_id);
    Ok(())
}

pub fn uninstall_hook() {
    let Ok(mut handle) = HOOK_HANDLE.lock() else {
        return;
    };
    if let Some(h) = handle.take() {
        unsafe {
            let _ = UnhookWindowsHookEx(h);
        };
        info!("Keyboard hook uninstalled.");
    }
}

/// Runs a blocking message loop.
pub fn run_event_loop() {
    info!("Starting message loop...");
    let mut msg = MSG::default();
    unsafe {
        // Force message queue creation
        let _ = PeekMessageW(
            &mut msg,
            None,
            0,
            0,
            windows::Win32::UI::WindowsAndMessaging::PEEK_MESSAGE_REMOVE_TYPE(0),
        );

        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
    info!("Message loop exited.");
}

unsafe extern "system" fn hook_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code < 0 {
        return CallNextHookEx(None, code, wparam, lparam);
    }

    let kbd = &*(lparam.0 as *const KBDLLHOOKSTRUCT);
    let event = decode_event(kbd);
    let foreground = WindowId(GetForegroundWindow().0);

    let action = ENGINE.lock().process_key(&event, foreground);

    // Injected events re-enter this hook; send them only once the state
    // change that produced them is visible.
    flush_pending_output();

    match action {
        KeyAction::Pass => CallNextHookEx(None, code, wparam, lparam),
        KeyAction::Block => LRESULT(1),
    }
}

fn decode_event(kbd: &KBDLLHOOKSTRUCT) -> KeyEvent {
    KeyEvent {
        key: PhysicalKey::new(kbd.vkCode, kbd.scanCode),
        flags: KeyFlags {
            up: kbd.flags.0 & LLKHF_UP.0 != 0,
            injected: kbd.flags.0 & LLKHF_INJECTED.0 != 0,
            extended: kbd.flags.0 & LLKHF_EXTENDED.0 != 0,
        },
    }
}

fn flush_pending_output() {
    let batches = std::mem::take(&mut *PENDING_OUTPUT.lock());
    for ordinals in batches {
        if let Err(e) = inject_unicode(&ordinals) {
            warn!("{}", e);
        }
    }
}

/// Inject characters as unicode key presses (down + up per UTF-16 unit).
pub fn inject_unicode(ordinals: &[Ordinal]) -> anyhow::Result<()> {
    let mut inputs = Vec::with_capacity(ordinals.len() * 4);
    for &ordinal in ordinals {
        let Some(c) = char::from_u32(ordinal) else {
            warn!("Skipping invalid ordinal {:#X}", ordinal);
            continue;
        };
        let mut buf = [0; 2];
        for code_unit in c.encode_utf16(&mut buf) {
            for flags in [KEYEVENTF_UNICODE, KEYEVENTF_UNICODE | KEYEVENTF_KEYUP] {
                inputs.push(INPUT {
                    r#type: INPUT_KEYBOARD,
                    Anonymous: INPUT_0 {
                        ki: KEYBDINPUT {
                            wVk: VIRTUAL_KEY(0),
                            wScan: *code_unit,
                            dwFlags: flags,
                            time: 0,
                            dwExtraInfo: 0,
                        },
                    },
                });
            }
        }
    }
    if inputs.is_empty() {
        return Ok(());
    }

    let sent = unsafe { SendInput(&inputs, std::mem::size_of::<INPUT>() as i32) };
    if sent as usize != inputs.len() {
        return Err(anyhow::anyhow!(
            "SendInput accepted {} of {} events",
            sent,
            inputs.len()
        ));
    }
    Ok(())
}

/// `ToUnicode` against the composer's shift snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32Translator;

impl KeyTranslator for Win32Translator {
    fn translate(&self, key: PhysicalKey, shift: &ShiftState) -> Option<Ordinal> {
        let mut buf = [0u16; 4];
        let rv = unsafe { ToUnicode(key.vk, key.scan, Some(shift.as_bytes()), &mut buf, 0) };
        if rv <= 0 {
            return None;
        }
        char::decode_utf16(buf[..rv as usize].iter().copied())
            .next()
            .and_then(Result::ok)
            .map(|c| c as Ordinal)
    }
}

/// Queues output for the hook to send and beeps on failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32Sink;

impl InputSink for Win32Sink {
    fn inject(&mut self, ordinals: &[Ordinal]) -> crate::error::Result<()> {
        PENDING_OUTPUT.lock().push(ordinals.to_vec());
        Ok(())
    }

    fn signal_failure(&mut self) {
        unsafe {
            let _ = MessageBeep(MESSAGEBOX_STYLE(0xFFFF_FFFF));
        }
    }
}

/// Current OS keyboard state, used to seed the composer's shift snapshot.
pub fn current_shift_state() -> ShiftState {
    let mut slots = [0u8; 256];
    if let Err(e) = unsafe { GetKeyboardState(&mut slots) } {
        warn!("GetKeyboardState failed: {}", e);
    }
    ShiftState::from_snapshot(slots)
}

/// A composer wired to the Win32 translator and sink.
pub fn win32_composer(
    config: ComposerConfig,
    table: Arc<CompositionTable>,
    notifier: impl Notifier + Send + 'static,
) -> Composer {
    Composer::new(config, table, Win32Translator, Win32Sink, notifier)
        .with_shift_state(current_shift_state())
}
