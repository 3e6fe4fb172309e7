//! Planned payments service
//!
//! Rules describe one-time or repeating payments. Each rule materializes as
//! planned transactions (due date set, no payment date) that can be paid,
//! skipped, or regenerated when the rule changes. The rule remembers the due
//! dates that were paid or skipped, so regeneration never brings them back.

use chrono::{NaiveDateTime, Utc};

use crate::audit::EntityType;
use crate::error::{WalletError, WalletResult};
use crate::events::WalletEvent;
use crate::models::{DateRange, Money, PlannedPaymentRule, PlannedRuleId, Transaction, TransactionId, TransactionType};
use crate::services::exchange::ExchangeService;
use crate::storage::{Repository, Storage};

/// Planned transactions with their totals in the base currency
#[derive(Debug, Clone, Default)]
pub struct PlannedPayments {
    /// Ordered by due date, earliest first
    pub items: Vec<Transaction>,
    pub income: Money,
    pub expenses: Money,
}

impl PlannedPayments {
    /// Income minus expenses
    pub fn net(&self) -> Money {
        self.income - self.expenses
    }
}

/// Service for planned payments and their rules
pub struct PlannedService<'a> {
    storage: &'a Storage,
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

impl<'a> PlannedService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    fn active_transaction(&self, id: TransactionId) -> WalletResult<Transaction> {
        self.storage
            .transactions
            .get(id)?
            .filter(|t| !t.is_deleted)
            .ok_or_else(|| WalletError::transaction_not_found(id.to_string()))
    }

    /// Pay a planned transaction now; already paid ones are returned as is
    pub fn pay_or_get(&self, id: TransactionId) -> WalletResult<Transaction> {
        let before = self.active_transaction(id)?;
        if !before.is_planned() {
            return Ok(before);
        }

        self.settle_occurrence(&before)?;
        let mut txn = before.clone();
        txn.pay(now());
        self.storage.transactions.upsert(txn.clone())?;
        self.storage.transactions.save()?;
        self.storage.log_update(
            EntityType::Transaction,
            txn.id.to_string(),
            txn.title.clone(),
            &before,
            &txn,
        )?;

        tracing::debug!(id = %txn.id, amount = %txn.amount, "planned payment paid");
        self.storage.notify(WalletEvent::TransactionsUpdated);
        self.storage.notify(WalletEvent::PlannedPaymentsUpdated);
        Ok(txn)
    }

    /// Drop a single planned occurrence without paying it
    pub fn skip(&self, id: TransactionId) -> WalletResult<Transaction> {
        let mut txn = self.active_transaction(id)?;
        if !txn.is_planned() {
            return Err(WalletError::Validation(format!(
                "Transaction {} is already paid",
                txn.id
            )));
        }

        self.settle_occurrence(&txn)?;
        txn.mark_deleted();
        self.storage.transactions.upsert(txn.clone())?;
        self.storage.transactions.save()?;
        self.storage.log_delete(
            EntityType::Transaction,
            txn.id.to_string(),
            txn.title.clone(),
            &txn,
        )?;

        self.storage.notify(WalletEvent::TransactionsUpdated);
        self.storage.notify(WalletEvent::PlannedPaymentsUpdated);
        Ok(txn)
    }

    /// Record a planned occurrence's due date on its rule
    fn settle_occurrence(&self, txn: &Transaction) -> WalletResult<()> {
        let (Some(rule_id), Some(due)) = (txn.recurring_rule_id, txn.due_date) else {
            return Ok(());
        };
        if let Some(mut rule) = self.get_rule(rule_id)? {
            if rule.settle(due) {
                self.storage.planned_rules.upsert(rule)?;
                self.storage.planned_rules.save()?;
            }
        }
        Ok(())
    }

    fn check_rule(&self, rule: &PlannedPaymentRule) -> WalletResult<()> {
        rule.validate()
            .map_err(|e| WalletError::Validation(e.to_string()))?;
        if !self.storage.accounts.exists(rule.account_id)? {
            return Err(WalletError::account_not_found(rule.account_id.to_string()));
        }
        if let Some(category_id) = rule.category_id {
            if self.storage.categories.get(category_id)?.filter(|c| !c.is_deleted).is_none() {
                return Err(WalletError::category_not_found(category_id.to_string()));
            }
        }
        Ok(())
    }

    /// Store a new rule and generate its planned transactions
    pub fn create_rule(&self, mut rule: PlannedPaymentRule) -> WalletResult<PlannedPaymentRule> {
        rule.title = rule.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        self.check_rule(&rule)?;
        rule.touch();

        self.storage.planned_rules.upsert(rule.clone())?;
        self.storage.planned_rules.save()?;
        let generated = self.generate(&rule)?;
        self.storage.log_create(
            EntityType::PlannedRule,
            rule.id.to_string(),
            rule.title.clone(),
            &rule,
        )?;

        tracing::debug!(rule = %rule.id, generated, "planned payment rule created");
        self.storage.notify(WalletEvent::PlannedPaymentsUpdated);
        self.storage.notify(WalletEvent::TransactionsUpdated);
        Ok(rule)
    }

    pub fn get_rule(&self, id: PlannedRuleId) -> WalletResult<Option<PlannedPaymentRule>> {
        Ok(self.storage.planned_rules.get(id)?.filter(|r| !r.is_deleted))
    }

    pub fn find_rule(&self, identifier: &str) -> WalletResult<Option<PlannedPaymentRule>> {
        self.storage.planned_rules.find(identifier)
    }

    pub fn list_rules(&self) -> WalletResult<Vec<PlannedPaymentRule>> {
        self.storage.planned_rules.get_all()
    }

    /// Replace a rule's schedule and details, regenerating unpaid occurrences
    pub fn edit_rule(&self, id: PlannedRuleId, changes: PlannedPaymentRule) -> WalletResult<PlannedPaymentRule> {
        let before = self
            .get_rule(id)?
            .ok_or_else(|| WalletError::rule_not_found(id.to_string()))?;

        let mut rule = before.clone();
        rule.start_date = changes.start_date;
        rule.one_time = changes.one_time;
        rule.interval_n = changes.interval_n;
        rule.interval_type = changes.interval_type;
        rule.transaction_type = changes.transaction_type;
        rule.amount = changes.amount;
        rule.account_id = changes.account_id;
        rule.category_id = changes.category_id;
        rule.title = changes.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        rule.description = changes.description;
        self.check_rule(&rule)?;
        rule.touch();

        self.storage.planned_rules.upsert(rule.clone())?;
        self.storage.planned_rules.save()?;
        self.regenerate(&rule)?;
        self.storage.log_update(
            EntityType::PlannedRule,
            rule.id.to_string(),
            rule.title.clone(),
            &before,
            &rule,
        )?;

        self.storage.notify(WalletEvent::PlannedPaymentsUpdated);
        self.storage.notify(WalletEvent::TransactionsUpdated);
        Ok(rule)
    }

    /// Delete a rule and its unpaid occurrences; paid ones stay in history
    pub fn delete_rule(&self, id: PlannedRuleId) -> WalletResult<PlannedPaymentRule> {
        let mut rule = self
            .get_rule(id)?
            .ok_or_else(|| WalletError::rule_not_found(id.to_string()))?;

        self.remove_unpaid(id)?;
        rule.mark_deleted();
        self.storage.planned_rules.upsert(rule.clone())?;
        self.storage.planned_rules.save()?;
        self.storage.log_delete(
            EntityType::PlannedRule,
            rule.id.to_string(),
            rule.title.clone(),
            &rule,
        )?;

        self.storage.notify(WalletEvent::PlannedPaymentsUpdated);
        self.storage.notify(WalletEvent::TransactionsUpdated);
        Ok(rule)
    }

    /// Soft-delete a rule's planned occurrences
    fn remove_unpaid(&self, id: PlannedRuleId) -> WalletResult<()> {
        for mut txn in self.storage.transactions.get_by_rule(id)? {
            if txn.is_planned() {
                txn.mark_deleted();
                self.storage.transactions.upsert(txn)?;
            }
        }
        self.storage.transactions.save()
    }

    /// Rebuild the unpaid occurrences of a rule
    ///
    /// Due dates that were paid or skipped are not generated again.
    pub fn regenerate(&self, rule: &PlannedPaymentRule) -> WalletResult<usize> {
        self.remove_unpaid(rule.id)?;
        self.generate(rule)
    }

    /// Create planned transactions for a rule's unsettled occurrences
    fn generate(&self, rule: &PlannedPaymentRule) -> WalletResult<usize> {
        let mut count = 0;
        for due in rule.unsettled_occurrences() {
            let mut txn = Transaction::planned(rule.transaction_type, rule.account_id, rule.amount, due);
            txn.category_id = rule.category_id;
            txn.title = rule.title.clone();
            txn.description = rule.description.clone();
            txn.recurring_rule_id = Some(rule.id);
            self.storage.transactions.upsert(txn)?;
            count += 1;
        }
        self.storage.transactions.save()?;
        Ok(count)
    }

    pub(crate) fn summarize(&self, items: Vec<Transaction>) -> WalletResult<PlannedPayments> {
        let exchange = ExchangeService::new(self.storage);
        let mut result = PlannedPayments::default();
        for txn in &items {
            let amount = exchange.account_amount_base(txn.amount, txn.account_id)?;
            match txn.transaction_type {
                TransactionType::Income => result.income += amount,
                TransactionType::Expense => result.expenses += amount,
                TransactionType::Transfer => {}
            }
        }
        result.items = items;
        Ok(result)
    }

    fn planned_in(&self, range: DateRange) -> WalletResult<Vec<Transaction>> {
        let mut items: Vec<Transaction> = self
            .storage
            .transactions
            .get_all()?
            .into_iter()
            .filter(|t| t.is_planned())
            .filter(|t| t.due_date.map(|d| range.contains(d)).unwrap_or(false))
            .collect();
        items.sort_by_key(|t| t.due_date);
        Ok(items)
    }

    /// Planned payments due in the range and not yet overdue
    pub fn upcoming(&self, range: DateRange) -> WalletResult<PlannedPayments> {
        self.upcoming_at(range, now())
    }

    pub fn upcoming_at(&self, range: DateRange, now: NaiveDateTime) -> WalletResult<PlannedPayments> {
        let items = self
            .planned_in(range)?
            .into_iter()
            .filter(|t| !t.is_overdue(now))
            .collect();
        self.summarize(items)
    }

    /// Planned payments due in the range whose due date has passed
    pub fn overdue(&self, range: DateRange) -> WalletResult<PlannedPayments> {
        self.overdue_at(range, now())
    }

    pub fn overdue_at(&self, range: DateRange, now: NaiveDateTime) -> WalletResult<PlannedPayments> {
        let items = self
            .planned_in(range)?
            .into_iter()
            .filter(|t| t.is_overdue(now))
            .collect();
        self.summarize(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, IntervalType};
    use crate::storage::test_support::create_test_storage;
    use chrono::NaiveDate;

    fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn setup() -> (tempfile::TempDir, Storage, Account) {
        let (temp, storage) = create_test_storage();
        let account = Account::new("Cash");
        storage.accounts.upsert(account.clone()).unwrap();
        (temp, storage, account)
    }

    fn monthly_rent(account: &Account) -> PlannedPaymentRule {
        let mut rule = PlannedPaymentRule::recurring(
            TransactionType::Expense,
            account.id,
            Money::from_cents(80_000),
            at(2025, 1, 31),
            1,
            IntervalType::Month,
        );
        rule.title = Some("Rent".into());
        rule
    }

    #[test]
    fn test_one_time_rule_generates_single_occurrence() {
        let (_temp, storage, account) = setup();
        let service = PlannedService::new(&storage);
        let rule = service
            .create_rule(PlannedPaymentRule::one_time(
                TransactionType::Income,
                account.id,
                Money::from_cents(5_000),
                at(2025, 6, 1),
            ))
            .unwrap();

        let txns = storage.transactions.get_by_rule(rule.id).unwrap();
        assert_eq!(txns.len(), 1);
        assert!(txns[0].is_planned());
        assert_eq!(txns[0].due_date, Some(at(2025, 6, 1)));
    }

    #[test]
    fn test_recurring_rule_generates_a_year() {
        let (_temp, storage, account) = setup();
        let service = PlannedService::new(&storage);
        let rule = service.create_rule(monthly_rent(&account)).unwrap();

        let txns = storage.transactions.get_by_rule(rule.id).unwrap();
        assert_eq!(txns.len(), 13);
        assert!(txns.iter().all(|t| t.title.as_deref() == Some("Rent")));
    }

    #[test]
    fn test_invalid_rules_rejected() {
        let (_temp, storage, account) = setup();
        let service = PlannedService::new(&storage);

        let mut no_interval = monthly_rent(&account);
        no_interval.interval_n = Some(0);
        assert!(service.create_rule(no_interval).unwrap_err().is_validation());

        let mut bad_account = monthly_rent(&account);
        bad_account.account_id = crate::models::AccountId::new();
        assert!(service.create_rule(bad_account).unwrap_err().is_not_found());
    }

    #[test]
    fn test_pay_or_get() {
        let (_temp, storage, account) = setup();
        let service = PlannedService::new(&storage);
        let rule = service.create_rule(monthly_rent(&account)).unwrap();
        let first = storage.transactions.get_by_rule(rule.id).unwrap().pop().unwrap();

        let paid = service.pay_or_get(first.id).unwrap();
        assert!(!paid.is_planned());
        assert!(paid.date_time.is_some());
        assert!(paid.due_date.is_none());

        let again = service.pay_or_get(first.id).unwrap();
        assert_eq!(again.date_time, paid.date_time);
    }

    #[test]
    fn test_skip() {
        let (_temp, storage, account) = setup();
        let service = PlannedService::new(&storage);
        let rule = service.create_rule(monthly_rent(&account)).unwrap();
        let txn = storage.transactions.get_by_rule(rule.id).unwrap().pop().unwrap();

        service.skip(txn.id).unwrap();
        assert_eq!(storage.transactions.get_by_rule(rule.id).unwrap().len(), 12);

        let other = storage.transactions.get_by_rule(rule.id).unwrap().pop().unwrap();
        service.pay_or_get(other.id).unwrap();
        assert!(service.skip(other.id).unwrap_err().is_validation());
    }

    #[test]
    fn test_edit_rule_keeps_paid_occurrences() {
        let (_temp, storage, account) = setup();
        let service = PlannedService::new(&storage);
        let rule = service.create_rule(monthly_rent(&account)).unwrap();

        // Pay the earliest occurrence
        let earliest = storage.transactions.get_by_rule(rule.id).unwrap().pop().unwrap();
        service.pay_or_get(earliest.id).unwrap();

        let mut changes = rule.clone();
        changes.amount = Money::from_cents(90_000);
        service.edit_rule(rule.id, changes).unwrap();

        let txns = storage.transactions.get_by_rule(rule.id).unwrap();
        assert_eq!(txns.len(), 13);
        let paid: Vec<_> = txns.iter().filter(|t| !t.is_planned()).collect();
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].amount.cents(), 80_000);
        assert!(txns
            .iter()
            .filter(|t| t.is_planned())
            .all(|t| t.amount.cents() == 90_000));
    }

    #[test]
    fn test_edit_rule_after_paying_out_of_order() {
        let (_temp, storage, account) = setup();
        let service = PlannedService::new(&storage);
        let rule = service.create_rule(monthly_rent(&account)).unwrap();

        // Oldest first: Jan 31, Feb 28, Mar 31, ...
        let mut occurrences = storage.transactions.get_by_rule(rule.id).unwrap();
        occurrences.reverse();
        let march = occurrences[2].clone();
        assert_eq!(march.due_date, Some(at(2025, 3, 31)));
        service.pay_or_get(march.id).unwrap();

        let mut changes = rule.clone();
        changes.amount = Money::from_cents(90_000);
        service.edit_rule(rule.id, changes).unwrap();

        let txns = storage.transactions.get_by_rule(rule.id).unwrap();
        assert_eq!(txns.len(), 13);
        assert!(!txns.iter().any(|t| t.due_date == Some(at(2025, 3, 31))));
        assert!(txns.iter().any(|t| t.due_date == Some(at(2025, 1, 31))));
    }

    #[test]
    fn test_edit_rule_keeps_skipped_dates_skipped() {
        let (_temp, storage, account) = setup();
        let service = PlannedService::new(&storage);
        let rule = service.create_rule(monthly_rent(&account)).unwrap();
        let earliest = storage.transactions.get_by_rule(rule.id).unwrap().pop().unwrap();
        service.skip(earliest.id).unwrap();

        let stored = service.get_rule(rule.id).unwrap().unwrap();
        assert_eq!(stored.settled_dates, vec![at(2025, 1, 31)]);

        let mut changes = stored.clone();
        changes.amount = Money::from_cents(90_000);
        service.edit_rule(rule.id, changes).unwrap();

        let txns = storage.transactions.get_by_rule(rule.id).unwrap();
        assert_eq!(txns.len(), 12);
        assert!(txns.iter().all(|t| t.due_date != Some(at(2025, 1, 31))));
    }

    #[test]
    fn test_delete_rule() {
        let (_temp, storage, account) = setup();
        let service = PlannedService::new(&storage);
        let rule = service.create_rule(monthly_rent(&account)).unwrap();
        let earliest = storage.transactions.get_by_rule(rule.id).unwrap().pop().unwrap();
        service.pay_or_get(earliest.id).unwrap();

        service.delete_rule(rule.id).unwrap();
        assert!(service.list_rules().unwrap().is_empty());
        let remaining = storage.transactions.get_by_rule(rule.id).unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(!remaining[0].is_planned());
    }

    #[test]
    fn test_upcoming_and_overdue() {
        let (_temp, storage, account) = setup();
        let service = PlannedService::new(&storage);
        service.create_rule(monthly_rent(&account)).unwrap();
        service
            .create_rule(PlannedPaymentRule::one_time(
                TransactionType::Income,
                account.id,
                Money::from_cents(10_000),
                at(2025, 3, 10),
            ))
            .unwrap();

        let q1 = DateRange::new(at(2025, 1, 1), at(2025, 4, 1));
        let now = at(2025, 3, 1);

        // Jan 31 and Feb 28 rent are overdue
        let overdue = service.overdue_at(q1, now).unwrap();
        assert_eq!(overdue.items.len(), 2);
        assert_eq!(overdue.expenses.cents(), 160_000);

        // Mar 10 income and Mar 31 rent are upcoming
        let upcoming = service.upcoming_at(q1, now).unwrap();
        assert_eq!(upcoming.items.len(), 2);
        assert_eq!(upcoming.income.cents(), 10_000);
        assert_eq!(upcoming.expenses.cents(), 80_000);
        assert_eq!(upcoming.net().cents(), -70_000);
        assert!(upcoming.items[0].due_date < upcoming.items[1].due_date);
    }
}
