//! Six-position verification code entry.
//!
//! The machine moves `Entering -> Submitting -> Authenticated`, falling back to
//! `Entering` with an error when verification fails. Input events never block
//! and never touch the network; only [`CodeEntry::submit`] does.

use crate::error::PortalError;
use crate::routes::Route;
use crate::session::SessionContext;
use chanterelle_client::ChanterelleClient;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, instrument, warn};

/// Number of positions in a verification code.
pub const CODE_LENGTH: usize = 6;

const INVALID_CODE: &str = "Invalid verification code";
const CODE_FORMAT: &str = "Verification code must be 6 digits";

/// Local format check applied before calling the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CodeValidation {
    /// Only the length is checked.
    LengthOnly,
    /// The code must be six ASCII digits.
    #[default]
    Numeric,
}

/// Whether a complete code is submitted without an explicit submit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AutoSubmit {
    #[default]
    Off,
    On,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CodeEntryOptions {
    pub validation: CodeValidation,
    pub auto_submit: AutoSubmit,
}

/// Which control has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Digit(usize),
    Submit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Entering,
    Submitting,
    Authenticated,
}

/// Point-in-time view of the entry state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeEntrySnapshot {
    pub positions: [Option<char>; CODE_LENGTH],
    pub focus: Focus,
    pub phase: Phase,
    pub error: Option<String>,
}

impl CodeEntrySnapshot {
    /// The filled positions joined in order.
    pub fn code(&self) -> String {
        self.positions.iter().flatten().collect()
    }
}

/// Effect of an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEffect {
    /// The event did not change anything.
    Ignored,
    /// A position was filled or cleared; focus moved.
    Filled { focus: Focus },
    /// Every position is filled and the submit control has focus.
    /// `submit_now` is set when auto-submit is on.
    Complete { submit_now: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Authenticated(Route),
    Failed(String),
    /// The code is not complete.
    Disabled,
    /// A submission is already running, or the login already finished.
    Ignored,
}

struct EntryState {
    positions: [Option<char>; CODE_LENGTH],
    focus: Focus,
    phase: Phase,
    error: Option<String>,
}

impl EntryState {
    fn new() -> Self {
        Self {
            positions: [None; CODE_LENGTH],
            focus: Focus::Digit(0),
            phase: Phase::Entering,
            error: None,
        }
    }

    fn is_complete(&self) -> bool {
        self.positions.iter().all(Option::is_some)
    }

    fn code(&self) -> String {
        self.positions.iter().flatten().collect()
    }
}

/// Code entry bound to the session that holds the pending identifier.
pub struct CodeEntry {
    client: ChanterelleClient,
    session: Arc<SessionContext>,
    options: CodeEntryOptions,
    state: Mutex<EntryState>,
}

impl CodeEntry {
    pub fn new(
        client: ChanterelleClient,
        session: Arc<SessionContext>,
        options: CodeEntryOptions,
    ) -> Self {
        Self {
            client,
            session,
            options,
            state: Mutex::new(EntryState::new()),
        }
    }

    /// Type one character at `index`.
    ///
    /// Anything but a single digit is ignored.
    pub fn enter(&self, index: usize, text: &str) -> InputEffect {
        let mut chars = text.chars();
        let (Some(ch), None) = (chars.next(), chars.next()) else {
            return InputEffect::Ignored;
        };
        if !ch.is_ascii_digit() || index >= CODE_LENGTH {
            return InputEffect::Ignored;
        }

        let mut state = self.lock();
        if state.phase != Phase::Entering {
            return InputEffect::Ignored;
        }

        state.positions[index] = Some(ch);
        state.error = None;

        if state.is_complete() {
            state.focus = Focus::Submit;
            return self.complete();
        }

        state.focus = Focus::Digit((index + 1).min(CODE_LENGTH - 1));
        InputEffect::Filled { focus: state.focus }
    }

    /// Paste at `index`. Exactly six characters replace the whole code.
    pub fn paste(&self, index: usize, text: &str) -> InputEffect {
        let text = text.trim();
        if index >= CODE_LENGTH || text.chars().count() != CODE_LENGTH {
            return InputEffect::Ignored;
        }

        let mut state = self.lock();
        if state.phase != Phase::Entering {
            return InputEffect::Ignored;
        }

        for (slot, ch) in state.positions.iter_mut().zip(text.chars()) {
            *slot = Some(ch);
        }
        state.focus = Focus::Submit;
        state.error = None;
        self.complete()
    }

    /// Clear the position at `index` and focus it.
    pub fn erase(&self, index: usize) -> InputEffect {
        if index >= CODE_LENGTH {
            return InputEffect::Ignored;
        }

        let mut state = self.lock();
        if state.phase != Phase::Entering {
            return InputEffect::Ignored;
        }

        state.positions[index] = None;
        state.focus = Focus::Digit(index);
        state.error = None;
        InputEffect::Filled { focus: state.focus }
    }

    pub fn snapshot(&self) -> CodeEntrySnapshot {
        let state = self.lock();
        CodeEntrySnapshot {
            positions: state.positions,
            focus: state.focus,
            phase: state.phase,
            error: state.error.clone(),
        }
    }

    /// Whether the submit control is enabled.
    pub fn submit_enabled(&self) -> bool {
        let state = self.lock();
        state.phase == Phase::Entering && state.is_complete()
    }

    /// Verify the entered code for the pending identifier.
    #[instrument(skip(self))]
    pub async fn submit(&self) -> Result<SubmitOutcome, PortalError> {
        let (identifier, code) = {
            let mut state = self.lock();
            if state.phase != Phase::Entering {
                return Ok(SubmitOutcome::Ignored);
            }
            if !state.is_complete() {
                return Ok(SubmitOutcome::Disabled);
            }

            let code = state.code();
            if self.options.validation == CodeValidation::Numeric
                && !code.chars().all(|c| c.is_ascii_digit())
            {
                return Ok(fail(&mut state, CODE_FORMAT));
            }

            let Some(identifier) = self.session.pending_identifier() else {
                return Ok(fail(&mut state, self.session.variant().missing_message()));
            };

            state.phase = Phase::Submitting;
            state.error = None;
            (identifier, code)
        };

        let token = match self.client.verify_code(&identifier, &code).await {
            Ok(response) => response.token,
            Err(e) => {
                warn!(identifier = %identifier, error = %e, "Code verification failed");
                return Ok(fail(&mut self.lock(), INVALID_CODE));
            }
        };

        if let Err(e) = self.session.store_token(&token).await {
            self.lock().phase = Phase::Entering;
            return Err(e);
        }

        self.lock().phase = Phase::Authenticated;
        info!(identifier = %identifier, "Admin signed in");
        Ok(SubmitOutcome::Authenticated(Route::Admin))
    }

    fn complete(&self) -> InputEffect {
        InputEffect::Complete {
            submit_now: self.options.auto_submit == AutoSubmit::On,
        }
    }

    fn lock(&self) -> MutexGuard<'_, EntryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn fail(state: &mut EntryState, message: &str) -> SubmitOutcome {
    state.phase = Phase::Entering;
    state.error = Some(message.to_string());
    SubmitOutcome::Failed(message.to_string())
}
