//! System-wide keyboard hook using WH_KEYBOARD_LL
//!
//! Runs on a dedicated thread with its own Win32 message loop. The hook
//! procedure is called on that thread for every keyboard event and must
//! answer within the system's hook timeout, so all decisions are made
//! inline by the [`Dispatcher`] kept in thread-local storage.
//!
//! # Safety
//!
//! `unsafe` is limited to Win32 FFI calls and reading the hook struct.

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{mpsc as std_mpsc, Arc};
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetMessageW, PostThreadMessageW, SetWindowsHookExW,
    TranslateMessage, UnhookWindowsHookEx, HC_ACTION, KBDLLHOOKSTRUCT, KBDLLHOOKSTRUCT_FLAGS,
    LLKHF_INJECTED, MSG, WH_KEYBOARD_LL, WM_KEYDOWN, WM_KEYUP, WM_QUIT, WM_SYSKEYDOWN,
    WM_SYSKEYUP,
};

use super::dispatch::Dispatcher;
use super::inject::{KeyInjector, SendInputInjector};
use crate::events::RemapEvent;
use crate::platform;
use crate::remap::{
    Disposition, GestureStyle, KeyEvent, KeyTransition, RemapMachine, SynthKey, SynthKeyAction,
    VirtualKey,
};

thread_local! {
    /// Owned by the hook thread for the lifetime of its message loop
    static DISPATCHER: RefCell<Option<Dispatcher<SendInputInjector>>> = const { RefCell::new(None) };
}

/// Errors that can occur while running the keyboard hook
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("keyboard hook is already running")]
    AlreadyRunning,

    #[error("failed to install keyboard hook: {0}")]
    Install(String),

    #[error("failed to spawn hook thread: {0}")]
    ThreadSpawn(String),

    #[error("hook thread exited before reporting its status")]
    StartupLost,
}

/// Low-level keyboard hook driving the remapper
pub struct KeyboardHook {
    gesture: GestureStyle,
    running: Arc<AtomicBool>,
    thread_id: Arc<AtomicU32>,
}

impl KeyboardHook {
    pub fn new(gesture: GestureStyle) -> Self {
        Self {
            gesture,
            running: Arc::new(AtomicBool::new(false)),
            thread_id: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Install the hook on a new thread
    ///
    /// Blocks until the thread has either installed the hook or failed to,
    /// so registration errors surface here. `event_tx` moves to the hook
    /// thread and is dropped when its message loop ends.
    pub fn start(&self, event_tx: mpsc::Sender<RemapEvent>) -> Result<(), HookError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(HookError::AlreadyRunning);
        }

        let (status_tx, status_rx) = std_mpsc::channel::<Result<(), HookError>>();
        let dispatcher = Dispatcher::new(
            RemapMachine::new(self.gesture),
            SendInputInjector,
            event_tx,
        );
        let running = Arc::clone(&self.running);
        let thread_id = Arc::clone(&self.thread_id);

        let spawned = thread::Builder::new()
            .name("keyboard-hook".to_string())
            .spawn(move || {
                info!("hook thread started");
                // SAFETY: no preconditions
                thread_id.store(unsafe { GetCurrentThreadId() }, Ordering::SeqCst);

                run_message_loop(dispatcher, status_tx);

                running.store(false, Ordering::SeqCst);
                info!("hook thread stopped");
            });

        if let Err(e) = spawned {
            self.running.store(false, Ordering::SeqCst);
            return Err(HookError::ThreadSpawn(e.to_string()));
        }

        status_rx.recv().unwrap_or(Err(HookError::StartupLost))
    }

    /// Ask the hook thread to leave its message loop
    pub fn stop(&self) {
        let thread_id = self.thread_id.load(Ordering::SeqCst);
        if thread_id == 0 || !self.is_running() {
            return;
        }
        // SAFETY: posting to a thread id has no memory-safety preconditions
        if let Err(e) = unsafe { PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) } {
            warn!(error = %e, "failed to post quit to hook thread");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

fn run_message_loop(
    dispatcher: Dispatcher<SendInputInjector>,
    status_tx: std_mpsc::Sender<Result<(), HookError>>,
) {
    DISPATCHER.with(|cell| *cell.borrow_mut() = Some(dispatcher));

    // SAFETY: this thread pumps messages below, as LL hooks require
    let hook = match unsafe { SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook_proc), None, 0) }
    {
        Ok(hook) => hook,
        Err(e) => {
            error!(error = %e, "SetWindowsHookExW failed");
            DISPATCHER.with(|cell| cell.borrow_mut().take());
            let _ = status_tx.send(Err(HookError::Install(e.to_string())));
            return;
        }
    };
    info!("keyboard hook installed");

    // Start from a known lock state: Caps Lock is only toggled via the chord
    if platform::caps_lock_on() {
        debug!("Caps Lock is on at startup, turning it off");
        let toggle = [
            SynthKeyAction::press(SynthKey::CapsLock),
            SynthKeyAction::release(SynthKey::CapsLock),
        ];
        if let Err(e) = SendInputInjector.inject(&toggle) {
            warn!(error = %e, "failed to reset Caps Lock");
        }
    }

    let _ = status_tx.send(Ok(()));

    let mut msg = MSG::default();
    // SAFETY: standard GetMessage/DispatchMessage loop; WM_QUIT ends it
    unsafe {
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
        if let Err(e) = UnhookWindowsHookEx(hook) {
            warn!(error = %e, "UnhookWindowsHookEx failed");
        }
    }

    // Dropping the dispatcher closes the notification channel
    DISPATCHER.with(|cell| cell.borrow_mut().take());
}

fn transition_from_message(message: u32) -> Option<KeyTransition> {
    match message {
        WM_KEYDOWN => Some(KeyTransition::Down),
        WM_SYSKEYDOWN => Some(KeyTransition::AltDown),
        WM_KEYUP | WM_SYSKEYUP => Some(KeyTransition::Up),
        _ => None,
    }
}

/// Low-level keyboard hook callback
///
/// # Safety
///
/// Called by Windows on the hook thread with a valid `KBDLLHOOKSTRUCT`
/// pointer in `l_param` whenever `n_code == HC_ACTION`.
unsafe extern "system" fn keyboard_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code != HC_ACTION as i32 {
        return CallNextHookEx(None, n_code, w_param, l_param);
    }

    let Some(transition) = transition_from_message(w_param.0 as u32) else {
        return CallNextHookEx(None, n_code, w_param, l_param);
    };

    let kbs = &*(l_param.0 as *const KBDLLHOOKSTRUCT);
    let event = KeyEvent {
        key: VirtualKey::from_vk_code(kbs.vkCode),
        transition,
        synthetic: (kbs.flags & LLKHF_INJECTED) != KBDLLHOOKSTRUCT_FLAGS(0),
    };

    // A busy dispatcher means we were re-entered while injecting
    let disposition = DISPATCHER.with(|cell| match cell.try_borrow_mut() {
        Ok(mut slot) => slot.as_mut().map(|d| d.dispatch(event)),
        Err(_) => None,
    });

    match disposition.unwrap_or(Disposition::PassThrough) {
        Disposition::PassThrough => CallNextHookEx(None, n_code, w_param, l_param),
        Disposition::Handled => LRESULT(0),
        Disposition::Suppress => LRESULT(1),
    }
}
