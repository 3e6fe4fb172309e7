//! Paywall service
//!
//! Free users may keep a limited number of accounts, categories and budgets.
//! Two checks exist: "quota exceeded" looks at what is already stored (used
//! before saving a transaction), "add" looks at what the store would hold
//! after one more item (used before creating an account, category or budget).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::error::{WalletError, WalletResult};
use crate::events::WalletEvent;
use crate::storage::{Repository, Storage};

/// Which free-tier limit was hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaywallReason {
    Accounts,
    Categories,
    Budgets,
}

impl fmt::Display for PaywallReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accounts => write!(f, "accounts"),
            Self::Categories => write!(f, "categories"),
            Self::Budgets => write!(f, "budgets"),
        }
    }
}

/// Usage against one free-tier limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub reason: PaywallReason,
    pub used: usize,
    pub limit: usize,
}

/// Snapshot for `wallet premium status`
#[derive(Debug, Clone)]
pub struct PaywallStatus {
    pub premium: bool,
    pub enabled: bool,
    pub quotas: Vec<Quota>,
}

/// Service for free-tier gating
pub struct PaywallService<'a> {
    storage: &'a Storage,
}

impl<'a> PaywallService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    fn quotas(&self, settings: &Settings) -> WalletResult<Vec<Quota>> {
        Ok(vec![
            Quota {
                reason: PaywallReason::Accounts,
                used: self.storage.accounts.count()?,
                limit: settings.paywall.free_accounts,
            },
            Quota {
                reason: PaywallReason::Categories,
                used: self.storage.categories.count()?,
                limit: settings.paywall.free_categories,
            },
            Quota {
                reason: PaywallReason::Budgets,
                used: self.storage.budgets.count()?,
                limit: settings.paywall.free_budgets,
            },
        ])
    }

    /// `None` when the paywall does not apply at all
    fn gated_settings(&self) -> WalletResult<Option<Settings>> {
        let settings = self.storage.settings.get()?;
        if settings.premium || !settings.paywall.enabled {
            return Ok(None);
        }
        Ok(Some(settings))
    }

    /// First limit already exceeded by stored data
    pub fn check_quota_exceeded(&self) -> WalletResult<Option<PaywallReason>> {
        let Some(settings) = self.gated_settings()? else {
            return Ok(None);
        };
        Ok(self
            .quotas(&settings)?
            .into_iter()
            .find(|q| q.used > q.limit)
            .map(|q| q.reason))
    }

    /// Whether adding one more item of `kind` would exceed its limit
    pub fn check_add(&self, kind: PaywallReason) -> WalletResult<Option<PaywallReason>> {
        let Some(settings) = self.gated_settings()? else {
            return Ok(None);
        };
        Ok(self
            .quotas(&settings)?
            .into_iter()
            .find(|q| q.reason == kind && q.used + 1 > q.limit)
            .map(|q| q.reason))
    }

    pub fn protect_quota_exceeded(&self) -> WalletResult<()> {
        match self.check_quota_exceeded()? {
            Some(reason) => {
                tracing::debug!(%reason, "paywall hit: quota exceeded");
                Err(WalletError::Paywall(reason))
            }
            None => Ok(()),
        }
    }

    pub fn protect_add(&self, kind: PaywallReason) -> WalletResult<()> {
        match self.check_add(kind)? {
            Some(reason) => {
                tracing::debug!(%reason, "paywall hit: add");
                Err(WalletError::Paywall(reason))
            }
            None => Ok(()),
        }
    }

    pub fn activate_premium(&self) -> WalletResult<()> {
        self.set_premium(true)
    }

    pub fn deactivate_premium(&self) -> WalletResult<()> {
        self.set_premium(false)
    }

    fn set_premium(&self, premium: bool) -> WalletResult<()> {
        self.storage.settings.update(|s| {
            s.premium = premium;
            Ok(())
        })?;
        tracing::info!(premium, "premium status changed");
        self.storage.notify(WalletEvent::SettingsUpdated);
        Ok(())
    }

    pub fn status(&self) -> WalletResult<PaywallStatus> {
        let settings = self.storage.settings.get()?;
        Ok(PaywallStatus {
            premium: settings.premium,
            enabled: settings.paywall.enabled,
            quotas: self.quotas(&settings)?,
        })
    }
}
