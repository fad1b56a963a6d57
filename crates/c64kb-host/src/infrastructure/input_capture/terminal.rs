//! Terminal key capture via `crossterm`.
//!
//! # Raw mode and keyboard enhancement (for beginners)
//!
//! A terminal normally buffers a whole line and interprets control keys
//! itself.  *Raw mode* switches that off so every key press reaches us
//! immediately.  [`TerminalGuard`] turns raw mode on and restores the
//! terminal when dropped, even when the program leaves through an error.
//!
//! Plain terminals never report a modifier key pressed on its own, but the
//! Control key is the C64's Commodore key and the joystick fire button.
//! Terminals that implement the kitty keyboard protocol can report it, so
//! the guard asks for that when [`supports_keyboard_enhancement`] says yes.
//!
//! # Threading
//!
//! `crossterm::event::read` blocks, so [`TerminalInput`] reads on its own OS
//! thread.  The loop polls with a short timeout so that [`InputSource::stop`]
//! is noticed promptly.

use std::io::stdout;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use c64kb_core::HostKey;
use crossterm::event::{
    self, DisableFocusChange, EnableFocusChange, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, KeyboardEnhancementFlags, ModifierKeyCode, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, trace, warn};

use super::{CaptureError, FocusGate, InputSource};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

// ── Terminal mode ─────────────────────────────────────────────────────────────

/// Holds the terminal in raw mode for as long as it lives.
pub struct TerminalGuard {
    enhanced: bool,
}

impl TerminalGuard {
    /// Enables raw mode, focus reporting and, where available, the keyboard
    /// enhancement flags.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Terminal`] if stdin/stdout is not a terminal.
    pub fn enter() -> Result<Self, CaptureError> {
        let enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
        enable_raw_mode()?;
        let mut guard = Self { enhanced: false };

        execute!(stdout(), EnableFocusChange)?;
        if enhanced {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(
                    KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                        | KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES
                        // Shift+1 must arrive as the shifted character, not as '1'.
                        | KeyboardEnhancementFlags::REPORT_ALTERNATE_KEYS
                )
            )?;
            guard.enhanced = true;
        } else {
            warn!("terminal cannot report a lone Ctrl press; Commodore key and fire are unavailable");
        }
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.enhanced {
            let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = execute!(stdout(), DisableFocusChange);
        if let Err(e) = disable_raw_mode() {
            error!("failed to restore terminal: {e}");
        }
    }
}

// ── Event translation ─────────────────────────────────────────────────────────

/// What a terminal event means to the capture loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalSignal {
    Key(HostKey),
    FocusGained,
    FocusLost,
    /// Ctrl+C: end the session.
    Quit,
    /// Any other Ctrl+character combination.  Sends nothing.
    Chord,
    Ignore,
}

/// Classifies one terminal event.
pub fn classify_event(event: &Event) -> TerminalSignal {
    match event {
        Event::FocusGained => TerminalSignal::FocusGained,
        Event::FocusLost => TerminalSignal::FocusLost,
        Event::Key(key) if is_interrupt(key) => TerminalSignal::Quit,
        Event::Key(key) if is_chord(key) => TerminalSignal::Chord,
        Event::Key(key) => translate(key).map_or(TerminalSignal::Ignore, TerminalSignal::Key),
        _ => TerminalSignal::Ignore,
    }
}

/// Converts a crossterm key event into a [`HostKey`].
///
/// Only presses and auto-repeats count.  Control chords other than a lone
/// Ctrl are dropped: the C64 has no equivalent.
pub fn translate(event: &KeyEvent) -> Option<HostKey> {
    if event.kind == KeyEventKind::Release {
        return None;
    }
    let key = match event.code {
        KeyCode::Backspace => HostKey::Backspace,
        KeyCode::Insert => HostKey::Insert,
        KeyCode::Enter => HostKey::Enter,
        KeyCode::Esc => HostKey::Escape,
        KeyCode::Home => HostKey::Home,
        KeyCode::End => HostKey::End,
        KeyCode::Left => HostKey::Left,
        KeyCode::Right => HostKey::Right,
        KeyCode::Up => HostKey::Up,
        KeyCode::Down => HostKey::Down,
        KeyCode::F(n) => HostKey::function(n)?,
        KeyCode::Modifier(ModifierKeyCode::LeftControl | ModifierKeyCode::RightControl) => {
            HostKey::Ctrl
        }
        KeyCode::Char(_) if is_control_chord(event.modifiers) => return None,
        KeyCode::Char(c) => HostKey::from(c),
        _ => return None,
    };
    Some(key)
}

// AltGr arrives as Ctrl+Alt on some platforms and produces ordinary characters.
fn is_control_chord(modifiers: KeyModifiers) -> bool {
    modifiers.contains(KeyModifiers::CONTROL) && !modifiers.contains(KeyModifiers::ALT)
}

fn is_chord(event: &KeyEvent) -> bool {
    event.kind != KeyEventKind::Release
        && is_control_chord(event.modifiers)
        && matches!(event.code, KeyCode::Char(_))
}

fn is_interrupt(event: &KeyEvent) -> bool {
    event.kind != KeyEventKind::Release
        && is_control_chord(event.modifiers)
        && matches!(event.code, KeyCode::Char('c' | 'C'))
}

// ── Chord filter ──────────────────────────────────────────────────────────────

/// Holds back a lone Ctrl press until it is clear it does not start a chord.
///
/// With keyboard enhancement, Ctrl+C arrives as a lone Ctrl press followed by
/// the chord.  Forwarding the Ctrl press right away would send a Commodore
/// key (or fire) frame just before the session ends.  The held press is
/// released by the next unrelated event or by [`ChordFilter::flush`] once
/// the terminal has been quiet for a poll interval.
#[derive(Debug, Default)]
pub struct ChordFilter {
    pending_ctrl: bool,
}

impl ChordFilter {
    /// Feeds one signal.  Returns a held Ctrl press to forward first, if any,
    /// and the signal to act on.
    pub fn accept(&mut self, signal: TerminalSignal) -> (Option<HostKey>, TerminalSignal) {
        match signal {
            TerminalSignal::Key(HostKey::Ctrl) => {
                let held = self.take();
                self.pending_ctrl = true;
                (held, TerminalSignal::Ignore)
            }
            TerminalSignal::Quit | TerminalSignal::Chord => {
                self.pending_ctrl = false;
                (None, signal)
            }
            other => (self.take(), other),
        }
    }

    /// Releases a held Ctrl press after a quiet poll interval.
    pub fn flush(&mut self) -> Option<HostKey> {
        self.take()
    }

    fn take(&mut self) -> Option<HostKey> {
        std::mem::take(&mut self.pending_ctrl).then_some(HostKey::Ctrl)
    }
}

// ── Input source ──────────────────────────────────────────────────────────────

/// [`InputSource`] backed by the controlling terminal.
pub struct TerminalInput {
    running: Arc<AtomicBool>,
    started: AtomicBool,
    focus: Arc<FocusGate>,
}

impl TerminalInput {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            started: AtomicBool::new(false),
            focus: Arc::new(FocusGate::new()),
        }
    }
}

impl Default for TerminalInput {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for TerminalInput {
    fn start(&self) -> Result<UnboundedReceiver<HostKey>, CaptureError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::AlreadyStarted);
        }
        self.running.store(true, Ordering::SeqCst);

        let (tx, rx) = mpsc::unbounded_channel();
        let running = Arc::clone(&self.running);
        let focus = Arc::clone(&self.focus);
        thread::Builder::new()
            .name("c64kb-input".to_string())
            .spawn(move || read_loop(&tx, &running, &focus))?;

        debug!("terminal capture started");
        Ok(rx)
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Reads terminal events until stopped, interrupted or the receiver is gone.
/// Returning drops `tx`, which closes the key stream.
fn read_loop(tx: &UnboundedSender<HostKey>, running: &AtomicBool, focus: &FocusGate) {
    let mut chords = ChordFilter::default();
    while running.load(Ordering::SeqCst) {
        match event::poll(POLL_INTERVAL) {
            Ok(true) => {}
            Ok(false) => {
                if let Some(key) = chords.flush() {
                    if !forward(tx, focus, key) {
                        break;
                    }
                }
                continue;
            }
            Err(e) => {
                error!("terminal poll failed: {e}");
                break;
            }
        }
        let event = match event::read() {
            Ok(event) => event,
            Err(e) => {
                error!("terminal read failed: {e}");
                break;
            }
        };

        let (held, signal) = chords.accept(classify_event(&event));
        if let Some(key) = held {
            if !forward(tx, focus, key) {
                break;
            }
        }

        match signal {
            TerminalSignal::Key(key) => {
                if !forward(tx, focus, key) {
                    break;
                }
            }
            TerminalSignal::FocusGained => {
                debug!("focus gained");
                focus.set_focused(true);
            }
            TerminalSignal::FocusLost => {
                debug!("focus lost");
                focus.set_focused(false);
            }
            TerminalSignal::Quit => {
                info!("Ctrl+C pressed, ending session");
                break;
            }
            TerminalSignal::Chord | TerminalSignal::Ignore => {}
        }
    }
    debug!("terminal capture stopped");
}

/// Sends `key` if the terminal has focus.  Returns `false` once the
/// receiver is gone.
fn forward(tx: &UnboundedSender<HostKey>, focus: &FocusGate, key: HostKey) -> bool {
    if !focus.is_focused() {
        trace!(?key, "dropped key while unfocused");
        return true;
    }
    tx.send(key).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_translate_printable_characters() {
        assert_eq!(translate(&press(KeyCode::Char('a'))), Some(HostKey::Char('a')));
        assert_eq!(translate(&press(KeyCode::Char(' '))), Some(HostKey::Space));
    }

    #[test]
    fn test_translate_keeps_shifted_character_as_produced() {
        // Arrange
        let event = KeyEvent::new(KeyCode::Char('+'), KeyModifiers::SHIFT);

        // Act / Assert
        assert_eq!(translate(&event), Some(HostKey::Char('+')));
    }

    #[test]
    fn test_translate_named_keys() {
        assert_eq!(translate(&press(KeyCode::Enter)), Some(HostKey::Enter));
        assert_eq!(translate(&press(KeyCode::Backspace)), Some(HostKey::Backspace));
        assert_eq!(translate(&press(KeyCode::Esc)), Some(HostKey::Escape));
        assert_eq!(translate(&press(KeyCode::Right)), Some(HostKey::Right));
        assert_eq!(translate(&press(KeyCode::F(12))), Some(HostKey::F12));
    }

    #[test]
    fn test_translate_lone_control_press() {
        let event = KeyEvent::new(
            KeyCode::Modifier(ModifierKeyCode::LeftControl),
            KeyModifiers::CONTROL,
        );

        assert_eq!(translate(&event), Some(HostKey::Ctrl));
    }

    #[test]
    fn test_translate_ignores_releases_and_chords() {
        let release =
            KeyEvent::new_with_kind(KeyCode::Char('a'), KeyModifiers::NONE, KeyEventKind::Release);
        let chord = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::CONTROL);

        assert_eq!(translate(&release), None);
        assert_eq!(translate(&chord), None);
        assert_eq!(translate(&press(KeyCode::F(13))), None);
        assert_eq!(translate(&press(KeyCode::Tab)), None);
    }

    #[test]
    fn test_translate_keeps_altgr_characters() {
        let event = KeyEvent::new(
            KeyCode::Char('@'),
            KeyModifiers::CONTROL | KeyModifiers::ALT,
        );

        assert_eq!(translate(&event), Some(HostKey::Char('@')));
    }

    #[test]
    fn test_translate_accepts_auto_repeat() {
        let repeat =
            KeyEvent::new_with_kind(KeyCode::Char('z'), KeyModifiers::NONE, KeyEventKind::Repeat);

        assert_eq!(translate(&repeat), Some(HostKey::Char('z')));
    }

    #[test]
    fn test_classify_ctrl_c_quits() {
        let event = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));

        assert_eq!(classify_event(&event), TerminalSignal::Quit);
    }

    #[test]
    fn test_classify_control_letter_is_a_chord() {
        let event = Event::Key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::CONTROL));

        assert_eq!(classify_event(&event), TerminalSignal::Chord);
    }

    // ── ChordFilter ───────────────────────────────────────────────────────────

    #[test]
    fn test_ctrl_c_sequence_forwards_no_ctrl_press() {
        // Arrange
        let mut chords = ChordFilter::default();

        // Act – lone Ctrl press, then the Ctrl+C chord
        let first = chords.accept(TerminalSignal::Key(HostKey::Ctrl));
        let second = chords.accept(TerminalSignal::Quit);

        // Assert
        assert_eq!(first, (None, TerminalSignal::Ignore));
        assert_eq!(second, (None, TerminalSignal::Quit));
        assert_eq!(chords.flush(), None);
    }

    #[test]
    fn test_ctrl_before_other_chord_is_dropped() {
        let mut chords = ChordFilter::default();

        chords.accept(TerminalSignal::Key(HostKey::Ctrl));
        let result = chords.accept(TerminalSignal::Chord);

        assert_eq!(result, (None, TerminalSignal::Chord));
        assert_eq!(chords.flush(), None);
    }

    #[test]
    fn test_lone_ctrl_is_released_by_next_key() {
        let mut chords = ChordFilter::default();

        chords.accept(TerminalSignal::Key(HostKey::Ctrl));
        let result = chords.accept(TerminalSignal::Key(HostKey::Right));

        assert_eq!(
            result,
            (Some(HostKey::Ctrl), TerminalSignal::Key(HostKey::Right))
        );
    }

    #[test]
    fn test_lone_ctrl_is_released_when_terminal_goes_quiet() {
        let mut chords = ChordFilter::default();

        chords.accept(TerminalSignal::Key(HostKey::Ctrl));

        assert_eq!(chords.flush(), Some(HostKey::Ctrl));
        assert_eq!(chords.flush(), None);
    }

    #[test]
    fn test_repeated_ctrl_releases_the_previous_press() {
        let mut chords = ChordFilter::default();

        chords.accept(TerminalSignal::Key(HostKey::Ctrl));
        let result = chords.accept(TerminalSignal::Key(HostKey::Ctrl));

        assert_eq!(result, (Some(HostKey::Ctrl), TerminalSignal::Ignore));
        assert_eq!(chords.flush(), Some(HostKey::Ctrl));
    }

    #[test]
    fn test_classify_focus_and_other_events() {
        assert_eq!(classify_event(&Event::FocusLost), TerminalSignal::FocusLost);
        assert_eq!(classify_event(&Event::FocusGained), TerminalSignal::FocusGained);
        assert_eq!(classify_event(&Event::Resize(80, 25)), TerminalSignal::Ignore);
        assert_eq!(
            classify_event(&Event::Key(press(KeyCode::Char('1')))),
            TerminalSignal::Key(HostKey::Char('1'))
        );
    }
}
