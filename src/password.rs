//! Password prompt state machine shared by resolve and download.

use crate::error::ValidationError;

const REQUIRED_MARKER: &str = "PASSWORD_REQUIRED";
const INVALID_MARKER: &str = "PASSWORD_INVALID";

/// Message shown when a supplied password was rejected.
pub const WRONG_PASSWORD_MESSAGE: &str = "Wrong password, please try again";

/// Which operation to replay once a password is supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    Resolve,
    Download,
}

/// A backend failure recognised as a password problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordFailure {
    /// No password was given for a protected share.
    Required,
    /// The given password was rejected.
    Invalid,
}

impl PasswordFailure {
    /// Classifies free-text failure output by its marker.
    #[must_use]
    pub fn from_message(message: &str) -> Option<Self> {
        if message.contains(REQUIRED_MARKER) {
            Some(Self::Required)
        } else if message.contains(INVALID_MARKER) {
            Some(Self::Invalid)
        } else {
            None
        }
    }

    /// User-visible message accompanying the prompt, if any.
    ///
    /// A first prompt is not a correction, so only `Invalid` has one.
    #[must_use]
    pub const fn retry_message(self) -> Option<&'static str> {
        match self {
            Self::Required => None,
            Self::Invalid => Some(WRONG_PASSWORD_MESSAGE),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptState {
    Idle,
    AwaitingPassword { action: PendingAction },
}

/// A confirmed credential and the operation it unblocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retry {
    pub action: PendingAction,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmError {
    /// No prompt is open.
    NotAwaiting,
    /// The input was empty after trimming; the prompt stays open.
    EmptyPassword,
}

impl ConfirmError {
    /// The user-facing validation failure, if this error has one.
    #[must_use]
    pub const fn validation(self) -> Option<ValidationError> {
        match self {
            Self::NotAwaiting => None,
            Self::EmptyPassword => Some(ValidationError::EmptyPassword),
        }
    }
}

/// Prompt state plus the credential being typed.
#[derive(Debug, Clone)]
pub struct PasswordPrompt {
    state: PromptState,
    input: String,
}

impl Default for PasswordPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordPrompt {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: PromptState::Idle,
            input: String::new(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> PromptState {
        self.state
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.state, PromptState::AwaitingPassword { .. })
    }

    #[must_use]
    pub const fn pending(&self) -> Option<PendingAction> {
        match self.state {
            PromptState::Idle => None,
            PromptState::AwaitingPassword { action } => Some(action),
        }
    }

    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, value: impl Into<String>) {
        self.input = value.into();
    }

    pub fn push_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn pop_char(&mut self) {
        self.input.pop();
    }

    /// Opens (or reopens) the prompt for `action` with an empty input.
    ///
    /// Returns the message to surface alongside the prompt.
    pub fn intercept(
        &mut self,
        action: PendingAction,
        failure: PasswordFailure,
    ) -> Option<&'static str> {
        log::info!("Password needed for {action:?} ({failure:?})");
        self.state = PromptState::AwaitingPassword { action };
        self.input.clear();
        failure.retry_message()
    }

    /// Accepts the typed credential and closes the prompt.
    ///
    /// # Errors
    ///
    /// Returns `NotAwaiting` when no prompt is open and `EmptyPassword` when
    /// the trimmed input is empty; in both cases the state is unchanged.
    pub fn confirm(&mut self) -> Result<Retry, ConfirmError> {
        let PromptState::AwaitingPassword { action } = self.state else {
            return Err(ConfirmError::NotAwaiting);
        };
        let password = self.input.trim();
        if password.is_empty() {
            return Err(ConfirmError::EmptyPassword);
        }
        let retry = Retry {
            action,
            password: password.to_string(),
        };
        self.state = PromptState::Idle;
        Ok(retry)
    }

    /// Closes the prompt and returns the abandoned action.
    pub fn cancel(&mut self) -> Option<PendingAction> {
        let pending = self.pending();
        self.state = PromptState::Idle;
        pending
    }
}
