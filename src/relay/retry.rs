use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    Attempting,
    Succeeded,
    RetryableFailure,
    TerminalFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    /// Upstream answered but is temporarily unavailable (503).
    Transient,
    Network,
    Permanent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Computes the next state after `attempts_so_far` calls have been made,
    /// the latest of which ended with `outcome`.
    pub fn next(
        &self,
        state: AttemptState,
        outcome: AttemptOutcome,
        attempts_so_far: u32,
    ) -> AttemptState {
        match state {
            AttemptState::Attempting => match outcome {
                AttemptOutcome::Success => AttemptState::Succeeded,
                AttemptOutcome::Transient | AttemptOutcome::Network => {
                    if attempts_so_far < self.max_attempts() {
                        AttemptState::RetryableFailure
                    } else {
                        AttemptState::TerminalFailure
                    }
                }
                AttemptOutcome::Permanent => AttemptState::TerminalFailure,
            },
            AttemptState::RetryableFailure => AttemptState::Attempting,
            AttemptState::Succeeded | AttemptState::TerminalFailure => state,
        }
    }
}
