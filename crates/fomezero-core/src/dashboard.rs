//! # Dashboard Aggregator
//!
//! Read-only rollups over sales, customers, snacks and the credit ledger.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  DashboardSnapshot ──┬──► period (DateRange) ──► sales count, collected │
//! │  (loaded by the      │                           average ticket,       │
//! │   receivables layer) │                           top snacks, buyers    │
//! │                      │                                                  │
//! │                      ├──► all time, open ──────► receivable, debtors,  │
//! │                      │                           old debts, high risk  │
//! │                      │                                                  │
//! │                      └──► calendar months ─────► current vs previous,  │
//! │                                                  rolling history       │
//! │                                                                         │
//! │  `now` and the reference UTC offset are inputs: same snapshot, same     │
//! │  `now`, same report.                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cancelled sales are ignored everywhere. Debt figures use each sale's
//! remaining amount, so partial payments lower them.
//!
//! ## Ordering
//! Every ranking has a deterministic tie-break: snacks by id, customers by id,
//! old debts by sale id.

use std::cmp::Reverse;
use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ledger::balances_by_customer;
use crate::money::{Money, Percent};
use crate::types::{Customer, CustomerCredit, DateRange, Sale, Snack};
use crate::{DEFAULT_OVERDUE_DAYS, HIGH_RISK_DEBT_CENTS, HIGH_RISK_UNPAID_COUNT, HISTORY_MONTHS};

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

const UNKNOWN_NAME: &str = "Unknown";

// =============================================================================
// Inputs
// =============================================================================

/// Everything the aggregator reads.
#[derive(Debug, Clone, Copy)]
pub struct DashboardSnapshot<'a> {
    pub customers: &'a [Customer],
    pub snacks: &'a [Snack],
    /// Sales with their items and payments loaded.
    pub sales: &'a [Sale],
    pub credits: &'a [CustomerCredit],
}

/// Thresholds and list sizes of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardPolicy {
    /// Reference time zone for day and month boundaries.
    pub utc_offset: FixedOffset,
    pub overdue_days: i64,
    pub high_risk_unpaid_count: i64,
    pub high_risk_debt: Money,
    pub history_months: u32,
    pub top_snacks: usize,
    pub top_debtors: usize,
    pub old_debts_limit: usize,
    pub high_risk_limit: usize,
}

impl Default for DashboardPolicy {
    fn default() -> Self {
        DashboardPolicy {
            utc_offset: Utc.fix(),
            overdue_days: DEFAULT_OVERDUE_DAYS,
            high_risk_unpaid_count: HIGH_RISK_UNPAID_COUNT,
            high_risk_debt: Money::from_cents(HIGH_RISK_DEBT_CENTS),
            history_months: HISTORY_MONTHS,
            top_snacks: 3,
            top_debtors: 5,
            old_debts_limit: 10,
            high_risk_limit: 5,
        }
    }
}

// =============================================================================
// Report
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MonthlyTotal {
    /// `mmm/yy`, e.g. `mar/26`.
    pub label: String,
    pub year: i32,
    pub month: u32,
    pub total_cents: i64,
    pub sales_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TopSnack {
    pub snack_id: String,
    pub name: String,
    pub quantity_sold: i64,
    /// Σ quantity × unit price, before discounts.
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DebtorRanking {
    pub customer_id: String,
    pub name: String,
    pub total_debt_cents: i64,
    pub unpaid_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BuyerRanking {
    pub customer_id: String,
    pub name: String,
    pub purchase_count: i64,
    pub total_spent_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OldDebt {
    pub sale_id: String,
    pub customer_id: String,
    pub customer_name: String,
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
    pub days_overdue: i64,
    pub remaining_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HighRiskCustomer {
    pub customer_id: String,
    pub name: String,
    pub total_debt_cents: i64,
    pub unpaid_count: i64,
    pub reason: String,
}

/// The dashboard report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardStats {
    pub active_customers: i64,
    pub active_snacks: i64,

    // Period
    pub total_sales: i64,
    pub total_collected_cents: i64,
    pub average_ticket_cents: i64,

    // All time
    pub total_receivable_cents: i64,
    pub unpaid_sales_count: i64,
    pub outstanding_store_credit_cents: i64,

    // Calendar months
    pub current_month_total_cents: i64,
    pub previous_month_total_cents: i64,
    pub month_over_month_growth: Percent,
    pub monthly_history: Vec<MonthlyTotal>,

    pub top_snacks: Vec<TopSnack>,
    pub top_debtors: Vec<DebtorRanking>,
    pub top_buyer_by_count: Option<BuyerRanking>,
    pub top_buyer_by_spend: Option<BuyerRanking>,
    pub old_debts: Vec<OldDebt>,
    pub high_risk_customers: Vec<HighRiskCustomer>,
}

// =============================================================================
// Aggregation
// =============================================================================

#[derive(Default)]
struct Tally {
    amount: Money,
    count: i64,
}

/// Builds the report. Pure: reads the snapshot, never mutates it.
pub fn compute(
    snapshot: &DashboardSnapshot<'_>,
    range: DateRange,
    now: DateTime<Utc>,
    policy: &DashboardPolicy,
) -> DashboardStats {
    let tz = policy.utc_offset;
    let local_date = |sale: &Sale| -> NaiveDate { sale.sale_date.with_timezone(&tz).date_naive() };

    let customer_names: HashMap<&str, &str> = snapshot
        .customers
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect();
    let name_of = |id: &str| -> String {
        customer_names.get(id).copied().unwrap_or(UNKNOWN_NAME).to_string()
    };

    let active: Vec<&Sale> = snapshot.sales.iter().filter(|s| s.is_active).collect();
    let open: Vec<&Sale> = active.iter().copied().filter(|s| !s.is_paid).collect();
    let in_period: Vec<&Sale> = active
        .iter()
        .copied()
        .filter(|&s| range.contains(local_date(s)))
        .collect();

    // -------------------------------------------------------------------------
    // Period figures
    // -------------------------------------------------------------------------
    let period_total: Money = in_period.iter().map(|s| s.total_amount()).sum();
    let total_collected: Money = in_period
        .iter()
        .filter(|s| s.is_paid)
        .map(|s| s.total_amount())
        .sum();
    let average_ticket = if in_period.is_empty() {
        Money::zero()
    } else {
        period_total.mul_ratio(1, in_period.len() as i64)
    };

    // -------------------------------------------------------------------------
    // Calendar months
    // -------------------------------------------------------------------------
    let today = now.with_timezone(&tz).date_naive();
    let mut by_month: HashMap<(i32, u32), Tally> = HashMap::new();
    for &sale in &active {
        let date = local_date(sale);
        let tally = by_month.entry((date.year(), date.month())).or_default();
        tally.amount += sale.total_amount();
        tally.count += 1;
    }
    let month_total = |key: (i32, u32)| by_month.get(&key).map_or(Money::zero(), |t| t.amount);

    let current_key = (today.year(), today.month());
    let previous_key = shift_month(current_key, 1);
    let current_month_total = month_total(current_key);
    let previous_month_total = month_total(previous_key);

    let monthly_history = (0..policy.history_months)
        .rev()
        .map(|back| {
            let (year, month) = shift_month(current_key, back);
            let tally = by_month.get(&(year, month));
            MonthlyTotal {
                label: month_label(year, month),
                year,
                month,
                total_cents: tally.map_or(0, |t| t.amount.cents()),
                sales_count: tally.map_or(0, |t| t.count),
            }
        })
        .collect();

    // -------------------------------------------------------------------------
    // Snacks
    // -------------------------------------------------------------------------
    let snack_names: HashMap<&str, &str> = snapshot
        .snacks
        .iter()
        .map(|s| (s.id.as_str(), s.name.as_str()))
        .collect();
    let mut by_snack: HashMap<&str, (i64, Money)> = HashMap::new();
    for item in in_period.iter().flat_map(|s| s.items.iter()) {
        let entry = by_snack.entry(item.snack_id.as_str()).or_default();
        entry.0 += item.quantity;
        entry.1 += item.gross_amount();
    }
    let mut top_snacks: Vec<TopSnack> = by_snack
        .into_iter()
        .map(|(id, (quantity, revenue))| TopSnack {
            snack_id: id.to_string(),
            name: snack_names.get(id).copied().unwrap_or(UNKNOWN_NAME).to_string(),
            quantity_sold: quantity,
            revenue_cents: revenue.cents(),
        })
        .collect();
    top_snacks.sort_by(|a, b| {
        b.quantity_sold
            .cmp(&a.quantity_sold)
            .then_with(|| a.snack_id.cmp(&b.snack_id))
    });
    top_snacks.truncate(policy.top_snacks);

    // -------------------------------------------------------------------------
    // Debt rankings (all time)
    // -------------------------------------------------------------------------
    let mut debts: HashMap<&str, Tally> = HashMap::new();
    for sale in &open {
        let tally = debts.entry(sale.customer_id.as_str()).or_default();
        tally.amount += sale.remaining_amount();
        tally.count += 1;
    }
    let mut debts: Vec<(&str, Tally)> = debts.into_iter().collect();
    debts.sort_by_key(|(id, tally)| (Reverse(tally.amount), *id));

    let top_debtors = debts
        .iter()
        .take(policy.top_debtors)
        .map(|(id, tally)| DebtorRanking {
            customer_id: id.to_string(),
            name: name_of(*id),
            total_debt_cents: tally.amount.cents(),
            unpaid_count: tally.count,
        })
        .collect();

    let high_risk_customers = debts
        .iter()
        .filter_map(|(id, tally)| {
            risk_reason(tally.count, tally.amount, policy).map(|reason| HighRiskCustomer {
                customer_id: id.to_string(),
                name: name_of(*id),
                total_debt_cents: tally.amount.cents(),
                unpaid_count: tally.count,
                reason,
            })
        })
        .take(policy.high_risk_limit)
        .collect();

    // -------------------------------------------------------------------------
    // Buyers (period)
    // -------------------------------------------------------------------------
    let mut buyers: HashMap<&str, Tally> = HashMap::new();
    for sale in &in_period {
        let tally = buyers.entry(sale.customer_id.as_str()).or_default();
        tally.amount += sale.total_amount();
        tally.count += 1;
    }
    let to_ranking = |(id, tally): (&&str, &Tally)| BuyerRanking {
        customer_id: id.to_string(),
        name: name_of(*id),
        purchase_count: tally.count,
        total_spent_cents: tally.amount.cents(),
    };
    let top_buyer_by_count = buyers
        .iter()
        .min_by_key(|(id, tally)| (Reverse(tally.count), **id))
        .map(to_ranking);
    let top_buyer_by_spend = buyers
        .iter()
        .min_by_key(|(id, tally)| (Reverse(tally.amount), **id))
        .map(to_ranking);

    // -------------------------------------------------------------------------
    // Old debts
    // -------------------------------------------------------------------------
    let overdue_cutoff = now - Duration::days(policy.overdue_days);
    let mut overdue: Vec<&Sale> = open
        .iter()
        .copied()
        .filter(|s| s.sale_date < overdue_cutoff)
        .collect();
    overdue.sort_by(|a, b| a.sale_date.cmp(&b.sale_date).then_with(|| a.id.cmp(&b.id)));
    let old_debts = overdue
        .into_iter()
        .take(policy.old_debts_limit)
        .map(|sale| OldDebt {
            sale_id: sale.id.clone(),
            customer_id: sale.customer_id.clone(),
            customer_name: name_of(&sale.customer_id),
            sale_date: sale.sale_date,
            days_overdue: (now - sale.sale_date).num_days(),
            remaining_cents: sale.remaining_amount().cents(),
        })
        .collect();

    // -------------------------------------------------------------------------
    // Store credit
    // -------------------------------------------------------------------------
    let outstanding_store_credit: Money = balances_by_customer(snapshot.credits, &[])
        .into_values()
        .filter(Money::is_positive)
        .sum();

    DashboardStats {
        active_customers: snapshot.customers.iter().filter(|c| c.is_active).count() as i64,
        active_snacks: snapshot.snacks.iter().filter(|s| s.is_active).count() as i64,
        total_sales: in_period.len() as i64,
        total_collected_cents: total_collected.cents(),
        average_ticket_cents: average_ticket.cents(),
        total_receivable_cents: open.iter().map(|s| s.remaining_amount()).sum::<Money>().cents(),
        unpaid_sales_count: open.len() as i64,
        outstanding_store_credit_cents: outstanding_store_credit.cents(),
        current_month_total_cents: current_month_total.cents(),
        previous_month_total_cents: previous_month_total.cents(),
        month_over_month_growth: Percent::change(current_month_total, previous_month_total),
        monthly_history,
        top_snacks,
        top_debtors,
        top_buyer_by_count,
        top_buyer_by_spend,
        old_debts,
        high_risk_customers,
    }
}

/// Goes `back` calendar months before `(year, month)`.
fn shift_month((year, month): (i32, u32), back: u32) -> (i32, u32) {
    let index = year * 12 + (month as i32 - 1) - back as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// `mar/26` style label.
pub fn month_label(year: i32, month: u32) -> String {
    let abbreviation = MONTH_ABBREVIATIONS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("???");
    format!("{}/{:02}", abbreviation, year.rem_euclid(100))
}

fn risk_reason(unpaid_count: i64, debt: Money, policy: &DashboardPolicy) -> Option<String> {
    let many = unpaid_count >= policy.high_risk_unpaid_count;
    let high = debt >= policy.high_risk_debt;
    match (many, high) {
        (true, true) => Some(format!(
            "Many unpaid purchases ({}) and high open balance ({})",
            unpaid_count, debt
        )),
        (true, false) => Some(format!("Many unpaid purchases ({})", unpaid_count)),
        (false, true) => Some(format!("High open balance ({})", debt)),
        (false, false) => None,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CreditType, PaymentSource, SaleItem, SalePayment};
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn customer(id: &str, name: &str) -> Customer {
        Customer {
            id: id.to_string(),
            name: name.to_string(),
            phone: None,
            is_active: true,
            credit_cents: 0,
            created_at: at(2025, 1, 1),
            updated_at: at(2025, 1, 1),
        }
    }

    fn snack(id: &str, name: &str) -> Snack {
        Snack {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            price_cents: 500,
            is_active: true,
            created_at: at(2025, 1, 1),
            updated_at: at(2025, 1, 1),
        }
    }

    struct SaleBuilder(Sale);

    impl SaleBuilder {
        fn new(id: &str, customer: &str, date: DateTime<Utc>) -> Self {
            SaleBuilder(Sale {
                id: id.to_string(),
                customer_id: customer.to_string(),
                sale_date: date,
                is_paid: false,
                paid_at: None,
                is_active: true,
                items: Vec::new(),
                payments: Vec::new(),
                created_at: date,
                updated_at: date,
            })
        }

        fn item(mut self, snack: &str, quantity: i64, unit: i64) -> Self {
            self.0.items.push(SaleItem {
                id: format!("{}-{}", self.0.id, self.0.items.len()),
                sale_id: self.0.id.clone(),
                snack_id: snack.to_string(),
                quantity,
                unit_price_cents: unit,
                discount_cents: 0,
                total_amount_cents: quantity * unit,
                created_at: self.0.sale_date,
            });
            self
        }

        fn paid_partially(mut self, cents: i64) -> Self {
            self.0.payments.push(SalePayment {
                id: format!("{}-p", self.0.id),
                sale_id: self.0.id.clone(),
                source: PaymentSource::Method("cash".to_string()),
                amount_cents: cents,
                paid_at: self.0.sale_date,
                created_at: self.0.sale_date,
            });
            self
        }

        fn paid(mut self) -> Self {
            let total = self.0.total_amount().cents();
            self = self.paid_partially(total);
            self.0.is_paid = true;
            self.0.paid_at = Some(self.0.sale_date);
            self
        }

        fn cancelled(mut self) -> Self {
            self.0.is_active = false;
            self
        }

        fn build(self) -> Sale {
            self.0
        }
    }

    fn run(sales: &[Sale], range: DateRange, now: DateTime<Utc>) -> DashboardStats {
        let customers = vec![customer("c1", "Ana"), customer("c2", "Bruno")];
        let snacks = vec![snack("coxinha", "Coxinha"), snack("pastel", "Pastel")];
        let snapshot = DashboardSnapshot {
            customers: &customers,
            snacks: &snacks,
            sales,
            credits: &[],
        };
        compute(&snapshot, range, now, &DashboardPolicy::default())
    }

    #[test]
    fn test_month_over_month_growth() {
        let sales = vec![
            SaleBuilder::new("a", "c1", at(2026, 2, 10)).item("coxinha", 1, 10_000).paid().build(),
            SaleBuilder::new("b", "c1", at(2026, 3, 2)).item("coxinha", 1, 10_000).build(),
            SaleBuilder::new("c", "c2", at(2026, 3, 5)).item("pastel", 1, 5_000).paid().build(),
        ];
        let march = DateRange::new(
            NaiveDate::from_ymd_opt(2026, 3, 1),
            NaiveDate::from_ymd_opt(2026, 3, 31),
        );
        let stats = run(&sales, march, at(2026, 3, 20));

        assert_eq!(stats.current_month_total_cents, 15_000);
        assert_eq!(stats.previous_month_total_cents, 10_000);
        assert_eq!(stats.month_over_month_growth, Percent::from_hundredths(5_000));
        assert_eq!(stats.total_sales, 2);
        assert_eq!(stats.total_collected_cents, 5_000);
        assert_eq!(stats.average_ticket_cents, 7_500);
    }

    #[test]
    fn test_growth_from_empty_previous_month() {
        let sales = vec![SaleBuilder::new("a", "c1", at(2026, 3, 2)).item("coxinha", 1, 500).build()];
        let stats = run(&sales, DateRange::default(), at(2026, 3, 20));
        assert_eq!(stats.month_over_month_growth, Percent::HUNDRED);

        let stats = run(&[], DateRange::default(), at(2026, 3, 20));
        assert_eq!(stats.month_over_month_growth, Percent::zero());
        assert_eq!(stats.top_buyer_by_count, None);
    }

    #[test]
    fn test_monthly_history_labels_cross_year() {
        let stats = run(&[], DateRange::default(), at(2026, 2, 15));
        let labels: Vec<&str> = stats.monthly_history.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["set/25", "out/25", "nov/25", "dez/25", "jan/26", "fev/26"]);
    }

    #[test]
    fn test_receivable_uses_remaining_amount() {
        let sales = vec![
            SaleBuilder::new("a", "c1", at(2026, 3, 1))
                .item("coxinha", 1, 4_000)
                .paid_partially(1_500)
                .build(),
            SaleBuilder::new("b", "c1", at(2026, 3, 2)).item("coxinha", 1, 1_000).paid().build(),
        ];
        let stats = run(&sales, DateRange::default(), at(2026, 3, 20));
        assert_eq!(stats.total_receivable_cents, 2_500);
        assert_eq!(stats.unpaid_sales_count, 1);
        assert_eq!(stats.top_debtors[0].total_debt_cents, 2_500);
    }

    #[test]
    fn test_cancelled_sales_are_ignored() {
        let sales = vec![
            SaleBuilder::new("a", "c1", at(2026, 3, 1)).item("coxinha", 1, 4_000).cancelled().build(),
        ];
        let stats = run(&sales, DateRange::default(), at(2026, 3, 20));
        assert_eq!(stats.total_sales, 0);
        assert_eq!(stats.total_receivable_cents, 0);
        assert_eq!(stats.current_month_total_cents, 0);
        assert!(stats.top_debtors.is_empty());
    }

    #[test]
    fn test_top_snacks_tie_break_by_id() {
        let sales = vec![
            SaleBuilder::new("a", "c1", at(2026, 3, 1))
                .item("pastel", 2, 700)
                .item("coxinha", 2, 500)
                .build(),
        ];
        let stats = run(&sales, DateRange::default(), at(2026, 3, 20));
        let ids: Vec<&str> = stats.top_snacks.iter().map(|s| s.snack_id.as_str()).collect();
        assert_eq!(ids, vec!["coxinha", "pastel"]);
        assert_eq!(stats.top_snacks[1].revenue_cents, 1_400);
        assert_eq!(stats.top_snacks[0].name, "Coxinha");
    }

    #[test]
    fn test_old_debts() {
        let now = at(2026, 3, 31);
        let sales = vec![
            SaleBuilder::new("old", "c1", at(2026, 1, 10)).item("coxinha", 1, 500).build(),
            SaleBuilder::new("recent", "c1", at(2026, 3, 10)).item("coxinha", 1, 500).build(),
            SaleBuilder::new("older", "c2", at(2025, 12, 1)).item("coxinha", 1, 800).build(),
        ];
        let stats = run(&sales, DateRange::default(), now);

        let ids: Vec<&str> = stats.old_debts.iter().map(|d| d.sale_id.as_str()).collect();
        assert_eq!(ids, vec!["older", "old"]);
        assert_eq!(stats.old_debts[1].days_overdue, 80);
        assert_eq!(stats.old_debts[0].customer_name, "Bruno");
    }

    #[test]
    fn test_high_risk_reasons() {
        let mut sales = Vec::new();
        for i in 0..3 {
            sales.push(
                SaleBuilder::new(&format!("a{i}"), "c1", at(2026, 3, 1 + i))
                    .item("coxinha", 1, 500)
                    .build(),
            );
        }
        sales.push(SaleBuilder::new("b", "c2", at(2026, 3, 1)).item("pastel", 1, 12_000).build());

        let stats = run(&sales, DateRange::default(), at(2026, 3, 20));
        assert_eq!(stats.high_risk_customers.len(), 2);
        assert_eq!(stats.high_risk_customers[0].customer_id, "c2");
        assert_eq!(stats.high_risk_customers[0].reason, "High open balance (R$ 120.00)");
        assert_eq!(stats.high_risk_customers[1].reason, "Many unpaid purchases (3)");
    }

    #[test]
    fn test_high_risk_both_thresholds() {
        let sales: Vec<Sale> = (0..3)
            .map(|i| {
                SaleBuilder::new(&format!("s{i}"), "c1", at(2026, 3, 1))
                    .item("coxinha", 1, 4_000)
                    .build()
            })
            .collect();
        let stats = run(&sales, DateRange::default(), at(2026, 3, 20));
        assert_eq!(
            stats.high_risk_customers[0].reason,
            "Many unpaid purchases (3) and high open balance (R$ 120.00)"
        );
    }

    #[test]
    fn test_top_buyers() {
        let sales = vec![
            SaleBuilder::new("a", "c1", at(2026, 3, 1)).item("coxinha", 1, 500).build(),
            SaleBuilder::new("b", "c1", at(2026, 3, 2)).item("coxinha", 1, 500).build(),
            SaleBuilder::new("c", "c2", at(2026, 3, 3)).item("pastel", 1, 5_000).build(),
        ];
        let stats = run(&sales, DateRange::default(), at(2026, 3, 20));
        assert_eq!(stats.top_buyer_by_count.unwrap().customer_id, "c1");
        let by_spend = stats.top_buyer_by_spend.unwrap();
        assert_eq!(by_spend.customer_id, "c2");
        assert_eq!(by_spend.total_spent_cents, 5_000);
    }

    #[test]
    fn test_period_uses_reference_offset() {
        // 02:00 UTC on Apr 1st is still March 31st in São Paulo (UTC-3)
        let sale = SaleBuilder::new("a", "c1", Utc.with_ymd_and_hms(2026, 4, 1, 2, 0, 0).unwrap())
            .item("coxinha", 1, 500)
            .build();
        let customers = vec![customer("c1", "Ana")];
        let policy = DashboardPolicy {
            utc_offset: FixedOffset::west_opt(3 * 3600).unwrap(),
            ..DashboardPolicy::default()
        };
        let march = DateRange::new(
            NaiveDate::from_ymd_opt(2026, 3, 1),
            NaiveDate::from_ymd_opt(2026, 3, 31),
        );
        let snapshot = DashboardSnapshot {
            customers: &customers,
            snacks: &[],
            sales: std::slice::from_ref(&sale),
            credits: &[],
        };
        let stats = compute(&snapshot, march, at(2026, 3, 31), &policy);
        assert_eq!(stats.total_sales, 1);
        assert_eq!(stats.current_month_total_cents, 500);
    }

    #[test]
    fn test_outstanding_store_credit() {
        let entry = |customer: &str, cents: i64, credit_type| CustomerCredit {
            id: format!("{customer}-{cents}"),
            customer_id: customer.to_string(),
            amount_cents: cents,
            credit_type,
            description: "x".to_string(),
            reference_date: at(2026, 3, 1),
            created_at: at(2026, 3, 1),
        };
        let credits = vec![
            entry("c1", 5_000, CreditType::Credit),
            entry("c1", 3_000, CreditType::Debit),
            entry("c2", 700, CreditType::Credit),
        ];
        let snapshot = DashboardSnapshot {
            customers: &[],
            snacks: &[],
            sales: &[],
            credits: &credits,
        };
        let stats = compute(
            &snapshot,
            DateRange::default(),
            at(2026, 3, 20),
            &DashboardPolicy::default(),
        );
        assert_eq!(stats.outstanding_store_credit_cents, 2_700);
    }

    #[test]
    fn test_shift_month() {
        assert_eq!(shift_month((2026, 1), 1), (2025, 12));
        assert_eq!(shift_month((2026, 6), 5), (2026, 1));
        assert_eq!(shift_month((2026, 3), 0), (2026, 3));
    }
}
