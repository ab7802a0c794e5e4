use alloy::primitives::B256;

use crate::error::DappError;

/// State of a single transaction attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxState {
    Built,
    Submitted,
    Pending(B256),
    Confirmed(B256),
    Failed(String),
}

impl TxState {
    pub fn name(&self) -> &'static str {
        match self {
            TxState::Built => "built",
            TxState::Submitted => "submitted",
            TxState::Pending(_) => "pending",
            TxState::Confirmed(_) => "confirmed",
            TxState::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TxState::Confirmed(_) | TxState::Failed(_))
    }

    fn can_advance_to(&self, next: &TxState) -> bool {
        match (self, next) {
            (TxState::Built, TxState::Submitted)
            | (TxState::Submitted, TxState::Pending(_))
            | (TxState::Pending(_), TxState::Confirmed(_)) => true,
            (from, TxState::Failed(_)) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// Tracks one transaction from construction to a terminal state.
#[derive(Debug, Clone)]
pub struct TransactionLifecycle {
    history: Vec<TxState>,
}

impl TransactionLifecycle {
    pub fn new() -> Self {
        Self {
            history: vec![TxState::Built],
        }
    }

    pub fn state(&self) -> &TxState {
        // history always starts with Built
        &self.history[self.history.len() - 1]
    }

    pub fn history(&self) -> &[TxState] {
        &self.history
    }

    pub fn advance(&mut self, next: TxState) -> Result<(), DappError> {
        let current = self.state();
        if !current.can_advance_to(&next) {
            return Err(DappError::InvalidTransition {
                from: current.name(),
                to: next.name(),
            });
        }
        self.history.push(next);
        Ok(())
    }

    /// Hash of the submitted transaction, once known.
    pub fn tx_hash(&self) -> Option<B256> {
        self.history.iter().rev().find_map(|state| match state {
            TxState::Pending(hash) | TxState::Confirmed(hash) => Some(*hash),
            _ => None,
        })
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self.state(), TxState::Confirmed(_))
    }
}

impl Default for TransactionLifecycle {
    fn default() -> Self {
        Self::new()
    }
}
