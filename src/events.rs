//! In-process change notifications
//!
//! Services post a `WalletEvent` after every successful mutation so that
//! interested parties (cached views, the auto-sync hook, tests) can react
//! without the services knowing about them. Delivery is one-to-many: every
//! subscriber gets its own channel.

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Something in the wallet changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsUpdated,
    CategoriesUpdated,
    TransactionsUpdated,
    BudgetsUpdated,
    PlannedPaymentsUpdated,
    SettingsUpdated,
    /// A sync run ended; `true` when it succeeded
    SyncFinished(bool),
}

impl fmt::Display for WalletEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccountsUpdated => write!(f, "accounts updated"),
            Self::CategoriesUpdated => write!(f, "categories updated"),
            Self::TransactionsUpdated => write!(f, "transactions updated"),
            Self::BudgetsUpdated => write!(f, "budgets updated"),
            Self::PlannedPaymentsUpdated => write!(f, "planned payments updated"),
            Self::SettingsUpdated => write!(f, "settings updated"),
            Self::SyncFinished(true) => write!(f, "sync succeeded"),
            Self::SyncFinished(false) => write!(f, "sync failed"),
        }
    }
}

/// Fan-out event bus
#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Sender<WalletEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// The subscriber list stays usable after a panicking holder
    fn subscribers(&self) -> MutexGuard<'_, Vec<Sender<WalletEvent>>> {
        self.subscribers.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("event bus lock was poisoned; recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    /// Register a new subscriber
    pub fn subscribe(&self) -> Receiver<WalletEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers().push(tx);
        rx
    }

    /// Deliver an event to every live subscriber
    ///
    /// Subscribers whose receiver has been dropped are forgotten.
    pub fn post(&self, event: WalletEvent) {
        tracing::trace!(%event, "posting event");
        self.subscribers().retain(|tx| tx.send(event).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers().len()
    }
}
