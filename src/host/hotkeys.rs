//! Global hotkeys: P toggles pause, S skips the initial waits, Q stops

use crate::game_automation::{ControlCommand, ControlPlane};
use rdev::{EventType, Key, listen};

fn command_for(key: Key) -> Option<ControlCommand> {
    match key {
        Key::KeyP => Some(ControlCommand::TogglePause),
        Key::KeyS => Some(ControlCommand::SkipInitialWait),
        Key::KeyQ => Some(ControlCommand::Stop),
        _ => None,
    }
}

/// Listen for hotkeys on a background OS thread for the rest of the process.
///
/// `rdev::listen` blocks forever, so the thread is detached.
pub fn spawn_hotkey_listener(control: ControlPlane) {
    let spawned = std::thread::Builder::new()
        .name("hotkeys".to_string())
        .spawn(move || {
            let result = listen(move |event| {
                if let EventType::KeyPress(key) = event.event_type {
                    if let Some(command) = command_for(key) {
                        log::info!("⌨️ Hotkey {:?} -> {:?}", key, command);
                        control.apply(command);
                    }
                }
            });
            if let Err(e) = result {
                log::error!("⌨️ Global hotkey listener failed: {:?}", e);
            }
        });
    if let Err(e) = spawned {
        log::error!("⌨️ Could not start hotkey thread: {e}");
    }
}
