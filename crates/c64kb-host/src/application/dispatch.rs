//! DispatchUseCase: turns key presses into peripheral round trips.
//!
//! This use case is the heart of the host application.  It takes one key at a
//! time from the [`Operator`], resolves it against the current [`ModeState`],
//! and either sends a frame, changes mode, or runs a composite operation
//! (memory dump, program upload) that asks the operator for more input.
//!
//! # Architecture
//!
//! This use case depends only on traits ([`FrameTransport`], [`ProgramLoader`],
//! [`Operator`]) and core types.  All infrastructure implementations are
//! injected at construction time, making the use case fully unit-testable.
//!
//! # Ordering
//!
//! A key is processed to completion, including every round trip and prompt it
//! triggers, before the next key is taken.  Prompts read from the same key
//! stream, so nothing typed during a prompt is dispatched as a C64 key.

use std::sync::Arc;

use async_trait::async_trait;
use c64kb_core::{resolve, Command, HostKey, HostOpcode, KeyAction, ModeState};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::link::{send_command, FrameTransport, TransportError};
use super::memory_dump;
use super::send_program::{send_program, ProgramLoader, SendProgramError, TransferReport};

/// Errors that end the dispatch loop.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
}

/// Why a prompt produced no answer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    /// The operator pressed Escape.
    #[error("prompt cancelled")]
    Cancelled,

    /// The key stream ended while waiting for an answer.
    #[error("input closed")]
    Closed,
}

/// The person at the keyboard, as seen by the dispatcher.
#[async_trait]
pub trait Operator: Send {
    /// Waits for the next key press.  `None` ends the session.
    async fn next_key(&mut self) -> Option<HostKey>;

    /// Shows `question` and reads one line of input.
    ///
    /// Keys already queued are discarded before the question is shown and
    /// again after the answer is read.
    async fn prompt(&mut self, question: &str) -> Result<String, PromptError>;
}

/// What handling one key press amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No mapping for the key.
    Ignored,
    /// One frame was sent; carries the acknowledgment.
    Sent(Vec<u8>),
    /// A mode key was pressed; carries the new mode.
    ModeChanged(ModeState),
    /// A composite operation was abandoned; the session continues.
    Aborted(String),
    /// A program upload finished.
    ProgramSent(TransferReport),
    /// The key stream closed in the middle of a prompt.
    InputClosed,
}

/// The Dispatch use case.
pub struct DispatchUseCase {
    mode: ModeState,
    transport: Arc<dyn FrameTransport>,
    programs: Arc<dyn ProgramLoader>,
}

impl DispatchUseCase {
    /// Creates a dispatcher in the initial mode.
    pub fn new(transport: Arc<dyn FrameTransport>, programs: Arc<dyn ProgramLoader>) -> Self {
        Self {
            mode: ModeState::new(),
            transport,
            programs,
        }
    }

    /// Returns the current mode.
    pub fn mode(&self) -> &ModeState {
        &self.mode
    }

    /// Processes keys until the operator's key stream ends.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Transport`] on the first failed round trip.
    pub async fn run(&mut self, operator: &mut dyn Operator) -> Result<(), DispatchError> {
        while let Some(key) = operator.next_key().await {
            if self.handle_key(key, operator).await? == Outcome::InputClosed {
                break;
            }
        }
        info!("key input closed");
        Ok(())
    }

    /// Handles a single key press.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Transport`] if any round trip fails.  Every
    /// other failure is reported as [`Outcome::Aborted`].
    pub async fn handle_key(
        &mut self,
        key: HostKey,
        operator: &mut dyn Operator,
    ) -> Result<Outcome, DispatchError> {
        let Some(action) = resolve(key, &self.mode) else {
            debug!(?key, "unmapped key");
            return Ok(Outcome::Ignored);
        };

        match action {
            KeyAction::Send(command) => {
                let ack = send_command(self.transport.as_ref(), &command).await?;
                Ok(Outcome::Sent(ack))
            }

            KeyAction::ToggleHostMode => {
                self.mode.toggle_host_command_mode();
                info!("{}", self.mode);
                Ok(Outcome::ModeChanged(self.mode))
            }

            KeyAction::CycleKeyboardJoystick => {
                self.send_control(HostOpcode::SetKeyboardJoystickMode).await?;
                self.mode.cycle_keyboard_joystick();
                info!("{}", self.mode);
                Ok(Outcome::ModeChanged(self.mode))
            }

            KeyAction::CycleRealJoystick => {
                self.send_control(HostOpcode::SetJoystickMode).await?;
                self.mode.cycle_real_joystick();
                info!("{}", self.mode);
                Ok(Outcome::ModeChanged(self.mode))
            }

            KeyAction::PromptShowMemory => self.show_memory(operator).await,

            KeyAction::PromptSendProgram => self.send_program(operator).await,
        }
    }

    async fn send_control(&self, op: HostOpcode) -> Result<Vec<u8>, TransportError> {
        send_command(self.transport.as_ref(), &Command::Control(op)).await
    }

    async fn show_memory(&mut self, operator: &mut dyn Operator) -> Result<Outcome, DispatchError> {
        let address = match operator.prompt("address (hex)? ").await {
            Ok(answer) => answer,
            Err(e) => return Ok(prompt_failed(e)),
        };
        let count = match operator.prompt("numofbytes? ").await {
            Ok(answer) => answer,
            Err(e) => return Ok(prompt_failed(e)),
        };

        let command = match memory_dump::build_request(&address, &count) {
            Ok(command) => command,
            Err(e) => {
                warn!("memory dump aborted: {e}");
                return Ok(Outcome::Aborted(e.to_string()));
            }
        };

        let ack = send_command(self.transport.as_ref(), &command).await?;
        Ok(Outcome::Sent(ack))
    }

    async fn send_program(&mut self, operator: &mut dyn Operator) -> Result<Outcome, DispatchError> {
        let name = match operator.prompt("filename? ").await {
            Ok(answer) => answer,
            Err(e) => return Ok(prompt_failed(e)),
        };
        info!("load {name}");

        let image = match self.programs.load(&name) {
            Ok(image) => image,
            Err(e) => {
                warn!("{e}");
                return Ok(Outcome::Aborted(e.to_string()));
            }
        };

        match send_program(self.transport.as_ref(), &image).await {
            Ok(report) => Ok(Outcome::ProgramSent(report)),
            Err(SendProgramError::Transfer(e)) => {
                warn!("program not sent: {e}");
                Ok(Outcome::Aborted(e.to_string()))
            }
            Err(SendProgramError::Transport(e)) => Err(e.into()),
        }
    }
}

fn prompt_failed(error: PromptError) -> Outcome {
    match error {
        PromptError::Cancelled => {
            info!("prompt cancelled");
            Outcome::Aborted(error.to_string())
        }
        PromptError::Closed => Outcome::InputClosed,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::send_program::ProgramLoadError;
    use std::collections::{HashMap, VecDeque};
    use std::path::PathBuf;
    use std::sync::Mutex;

    // ── Test doubles ──────────────────────────────────────────────────────────

    #[derive(Default)]
    struct RecordingTransport {
        frames: Mutex<Vec<Vec<u8>>>,
        should_fail: bool,
    }

    impl RecordingTransport {
        fn frames(&self) -> Vec<Vec<u8>> {
            self.frames.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FrameTransport for RecordingTransport {
        async fn round_trip(&self, frame: &[u8]) -> Result<Vec<u8>, TransportError> {
            if self.should_fail {
                return Err(TransportError::Link("injected failure".to_string()));
            }
            self.frames.lock().unwrap().push(frame.to_vec());
            Ok(vec![0x01])
        }
    }

    #[derive(Default)]
    struct InMemoryPrograms {
        files: HashMap<String, Vec<u8>>,
    }

    impl ProgramLoader for InMemoryPrograms {
        fn load(&self, name: &str) -> Result<Vec<u8>, ProgramLoadError> {
            self.files
                .get(name)
                .cloned()
                .ok_or_else(|| ProgramLoadError::NotFound { path: PathBuf::from(name) })
        }
    }

    /// Replays scripted keys and prompt answers.
    #[derive(Default)]
    struct ScriptedOperator {
        keys: VecDeque<HostKey>,
        answers: VecDeque<Result<String, PromptError>>,
        questions: Vec<String>,
    }

    impl ScriptedOperator {
        fn answering(answers: &[&str]) -> Self {
            Self {
                answers: answers.iter().map(|a| Ok(a.to_string())).collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl Operator for ScriptedOperator {
        async fn next_key(&mut self) -> Option<HostKey> {
            self.keys.pop_front()
        }

        async fn prompt(&mut self, question: &str) -> Result<String, PromptError> {
            self.questions.push(question.to_string());
            self.answers.pop_front().unwrap_or(Err(PromptError::Closed))
        }
    }

    fn make_use_case(
        programs: InMemoryPrograms,
    ) -> (DispatchUseCase, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::default());
        let uc = DispatchUseCase::new(
            Arc::clone(&transport) as Arc<dyn FrameTransport>,
            Arc::new(programs),
        );
        (uc, transport)
    }

    async fn enter_host_mode(uc: &mut DispatchUseCase, op: &mut ScriptedOperator) {
        uc.handle_key(HostKey::F12, op).await.unwrap();
        assert!(uc.mode().host_command_mode());
    }

    // ── Plain keys ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_printable_key_sends_matrix_frame() {
        // Arrange
        let (mut uc, tx) = make_use_case(InMemoryPrograms::default());
        let mut op = ScriptedOperator::default();

        // Act
        let outcome = uc.handle_key(HostKey::Char('a'), &mut op).await.unwrap();

        // Assert
        assert_eq!(outcome, Outcome::Sent(vec![0x01]));
        assert_eq!(tx.frames(), vec![vec![0xFD, 0xFB, 0x00]]);
    }

    #[tokio::test]
    async fn test_unmapped_key_sends_nothing() {
        let (mut uc, tx) = make_use_case(InMemoryPrograms::default());
        let mut op = ScriptedOperator::default();

        let outcome = uc.handle_key(HostKey::F10, &mut op).await.unwrap();

        assert_eq!(outcome, Outcome::Ignored);
        assert!(tx.frames().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_fatal() {
        let transport = Arc::new(RecordingTransport {
            should_fail: true,
            ..Default::default()
        });
        let mut uc = DispatchUseCase::new(transport, Arc::new(InMemoryPrograms::default()));
        let mut op = ScriptedOperator::default();

        let result = uc.handle_key(HostKey::Enter, &mut op).await;

        assert!(matches!(result, Err(DispatchError::Transport(_))));
    }

    // ── Mode keys ─────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_f12_toggles_host_mode_without_sending() {
        let (mut uc, tx) = make_use_case(InMemoryPrograms::default());
        let mut op = ScriptedOperator::default();

        let outcome = uc.handle_key(HostKey::F12, &mut op).await.unwrap();

        assert!(matches!(outcome, Outcome::ModeChanged(m) if m.host_command_mode()));
        assert!(tx.frames().is_empty());
    }

    #[tokio::test]
    async fn test_f12_then_f1_sends_show_registers() {
        let (mut uc, tx) = make_use_case(InMemoryPrograms::default());
        let mut op = ScriptedOperator::default();

        enter_host_mode(&mut uc, &mut op).await;
        uc.handle_key(HostKey::F1, &mut op).await.unwrap();

        assert_eq!(tx.frames(), vec![vec![0x0D, 0x00, 0x80]]);
    }

    #[tokio::test]
    async fn test_f5_in_host_mode_sends_opcode_then_changes_joystick() {
        // Arrange
        let (mut uc, tx) = make_use_case(InMemoryPrograms::default());
        let mut op = ScriptedOperator::default();
        enter_host_mode(&mut uc, &mut op).await;

        // Act
        uc.handle_key(HostKey::F5, &mut op).await.unwrap();
        uc.handle_key(HostKey::Right, &mut op).await.unwrap();

        // Assert
        assert_eq!(
            tx.frames(),
            vec![vec![0x02, 0x00, 0x80], vec![0xF7, 0x01, 0x20]]
        );
    }

    #[tokio::test]
    async fn test_mode_change_reports_status_line() {
        // Arrange
        let (mut uc, _tx) = make_use_case(InMemoryPrograms::default());
        let mut op = ScriptedOperator::default();
        enter_host_mode(&mut uc, &mut op).await;

        // Act
        let outcome = uc.handle_key(HostKey::F5, &mut op).await.unwrap();

        // Assert
        match outcome {
            Outcome::ModeChanged(mode) => assert_eq!(
                mode.to_string(),
                "hostmode = true, kbjoystick = 1, joystick = 0"
            ),
            other => panic!("expected ModeChanged, got {other:?}"),
        }
        assert_eq!(uc.mode().to_string(), "hostmode = true, kbjoystick = 1, joystick = 0");
    }

    #[tokio::test]
    async fn test_f9_sends_opcode_and_cycles_real_joystick() {
        let (mut uc, tx) = make_use_case(InMemoryPrograms::default());
        let mut op = ScriptedOperator::default();

        for _ in 0..3 {
            uc.handle_key(HostKey::F9, &mut op).await.unwrap();
        }

        assert_eq!(tx.frames(), vec![vec![0x01, 0x00, 0x80]; 3]);
        assert_eq!(uc.mode(), &ModeState::new());
    }

    #[tokio::test]
    async fn test_failed_mode_command_leaves_mode_unchanged() {
        let transport = Arc::new(RecordingTransport {
            should_fail: true,
            ..Default::default()
        });
        let mut uc = DispatchUseCase::new(transport, Arc::new(InMemoryPrograms::default()));
        let mut op = ScriptedOperator::default();

        assert!(uc.handle_key(HostKey::F9, &mut op).await.is_err());
        assert_eq!(uc.mode(), &ModeState::new());
    }

    // ── Memory dump ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_show_memory_prompts_and_sends_request() {
        // Arrange
        let (mut uc, tx) = make_use_case(InMemoryPrograms::default());
        let mut op = ScriptedOperator::answering(&["c000", "300"]);
        enter_host_mode(&mut uc, &mut op).await;

        // Act
        uc.handle_key(HostKey::F3, &mut op).await.unwrap();

        // Assert
        assert_eq!(op.questions, vec!["address (hex)? ", "numofbytes? "]);
        assert_eq!(tx.frames(), vec![vec![0x0E, 0x00, 0x80, 250, 0x00, 0xC0]]);
    }

    #[tokio::test]
    async fn test_show_memory_with_bad_address_is_aborted() {
        let (mut uc, tx) = make_use_case(InMemoryPrograms::default());
        let mut op = ScriptedOperator::answering(&["nope", "10"]);
        enter_host_mode(&mut uc, &mut op).await;

        let outcome = uc.handle_key(HostKey::F3, &mut op).await.unwrap();

        assert!(matches!(outcome, Outcome::Aborted(_)));
        assert!(tx.frames().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_prompt_aborts_without_sending() {
        let (mut uc, tx) = make_use_case(InMemoryPrograms::default());
        let mut op = ScriptedOperator::default();
        op.answers.push_back(Err(PromptError::Cancelled));
        enter_host_mode(&mut uc, &mut op).await;

        let outcome = uc.handle_key(HostKey::F3, &mut op).await.unwrap();

        assert_eq!(outcome, Outcome::Aborted("prompt cancelled".to_string()));
        assert!(tx.frames().is_empty());
    }

    // ── Program upload ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_send_program_uploads_named_file() {
        // Arrange
        let mut programs = InMemoryPrograms::default();
        programs.files.insert("game.prg".to_string(), vec![0x01, 0x08, 0xAA, 0xBB]);
        let (mut uc, tx) = make_use_case(programs);
        let mut op = ScriptedOperator::answering(&["game.prg"]);
        enter_host_mode(&mut uc, &mut op).await;

        // Act
        let outcome = uc.handle_key(HostKey::F4, &mut op).await.unwrap();

        // Assert
        assert!(matches!(outcome, Outcome::ProgramSent(ref r) if r.bytes == 2 && r.chunks == 1));
        assert_eq!(
            tx.frames(),
            vec![
                vec![0x0C, 0x00, 0x80, 0x02, 0x01, 0x08, 0xAA, 0xBB],
                vec![0xFF],
            ]
        );
    }

    #[tokio::test]
    async fn test_send_program_missing_file_is_aborted_and_loop_continues() {
        let (mut uc, tx) = make_use_case(InMemoryPrograms::default());
        let mut op = ScriptedOperator::answering(&["missing.prg"]);
        enter_host_mode(&mut uc, &mut op).await;

        let outcome = uc.handle_key(HostKey::F4, &mut op).await.unwrap();
        assert!(matches!(outcome, Outcome::Aborted(_)));

        uc.handle_key(HostKey::Enter, &mut op).await.unwrap();
        assert_eq!(tx.frames(), vec![vec![0xFE, 0xFD, 0x00]]);
    }

    #[tokio::test]
    async fn test_send_program_too_short_is_aborted() {
        let mut programs = InMemoryPrograms::default();
        programs.files.insert("tiny".to_string(), vec![0x01, 0x08]);
        let (mut uc, tx) = make_use_case(programs);
        let mut op = ScriptedOperator::answering(&["tiny"]);
        enter_host_mode(&mut uc, &mut op).await;

        let outcome = uc.handle_key(HostKey::F4, &mut op).await.unwrap();

        assert!(matches!(outcome, Outcome::Aborted(_)));
        assert!(tx.frames().is_empty());
    }

    // ── Run loop ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_run_processes_keys_in_order_until_input_ends() {
        let (mut uc, tx) = make_use_case(InMemoryPrograms::default());
        let mut op = ScriptedOperator {
            keys: [HostKey::Char('q'), HostKey::F12, HostKey::F6, HostKey::F12, HostKey::F6]
                .into_iter()
                .collect(),
            ..Default::default()
        };

        uc.run(&mut op).await.unwrap();

        assert_eq!(
            tx.frames(),
            vec![
                vec![0x7F, 0xBF, 0x00],
                vec![0x14, 0x00, 0x80],
                vec![0xFE, 0xBF, 0x01],
            ]
        );
    }

    #[tokio::test]
    async fn test_run_stops_when_input_closes_during_prompt() {
        let (mut uc, tx) = make_use_case(InMemoryPrograms::default());
        let mut op = ScriptedOperator {
            keys: [HostKey::F12, HostKey::F4, HostKey::Char('a')].into_iter().collect(),
            ..Default::default()
        };

        uc.run(&mut op).await.unwrap();

        assert!(tx.frames().is_empty());
    }
}
