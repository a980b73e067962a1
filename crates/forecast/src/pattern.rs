//! Recurrence pattern classification for one category's history.
//!
//! Rules are tried in a fixed order and the first match wins: fixed
//! recurring, periodic, burst plus tail, seasonal, then variable as the
//! fallback. All amounts are absolute values.

use chrono::Datelike;
use finflow_core::{LedgerTransaction, Money, MonthKey, PatternThresholds, TransactionKind};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::monthly::{by_month, category_history};
use crate::stats::{coefficient_of_variation, mean, median, std_dev, tail, weighted_avg};

/// Interval assumed when there is a single transaction.
const DEFAULT_INTERVAL_DAYS: f64 = 30.0;
const DAYS_PER_MONTH: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternKind {
    FixedRecurring,
    Periodic,
    BurstTail,
    Seasonal,
    Variable,
    Insufficient,
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PatternKind::FixedRecurring => "FIXED_RECURRING",
            PatternKind::Periodic => "PERIODIC",
            PatternKind::BurstTail => "BURST_TAIL",
            PatternKind::Seasonal => "SEASONAL",
            PatternKind::Variable => "VARIABLE",
            PatternKind::Insufficient => "INSUFFICIENT",
        };
        f.write_str(name)
    }
}

/// A detected pattern with the figures that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "pattern", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Pattern {
    FixedRecurring {
        amount: Money,
        typical_day: u32,
        per_month: f64,
    },
    Periodic {
        avg_interval: f64,
        avg_amount: Money,
        events_per_month: f64,
    },
    BurstTail {
        burst_amount: Money,
        tail_amount: Money,
        tail_count: u32,
    },
    Seasonal {
        /// Month number (1-12) to the totals observed in that month.
        profile: BTreeMap<u32, Vec<Money>>,
    },
    Variable {
        recent_avg: Money,
        /// Change between the last two monthly totals.
        trend: Money,
    },
    Insufficient,
}

impl Pattern {
    pub fn kind(&self) -> PatternKind {
        match self {
            Pattern::FixedRecurring { .. } => PatternKind::FixedRecurring,
            Pattern::Periodic { .. } => PatternKind::Periodic,
            Pattern::BurstTail { .. } => PatternKind::BurstTail,
            Pattern::Seasonal { .. } => PatternKind::Seasonal,
            Pattern::Variable { .. } => PatternKind::Variable,
            Pattern::Insufficient => PatternKind::Insufficient,
        }
    }

    /// One-line summary for display.
    pub fn describe(&self) -> String {
        match self {
            Pattern::FixedRecurring {
                amount,
                typical_day,
                ..
            } => format!("~{} around day {typical_day}", whole(*amount)),
            Pattern::Periodic {
                avg_interval,
                avg_amount,
                ..
            } => format!("~{} every {} days", whole(*avg_amount), avg_interval.round()),
            Pattern::BurstTail {
                burst_amount,
                tail_amount,
                tail_count,
            } => format!(
                "1 large purchase (~{}) + {tail_count} smaller (~{})",
                whole(*burst_amount),
                whole(*tail_amount)
            ),
            Pattern::Seasonal { .. } => "Varies significantly by month".to_string(),
            Pattern::Variable { .. } => "Weighted average of recent months".to_string(),
            Pattern::Insufficient => "Not enough history".to_string(),
        }
    }
}

fn whole(amount: Money) -> String {
    format!("{:.0}", amount.abs().to_f64())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternAnalysis {
    pub pattern: Pattern,
    /// Expected total per month.
    pub avg_monthly: Money,
    pub confidence: f64,
}

impl PatternAnalysis {
    pub fn insufficient() -> Self {
        Self {
            pattern: Pattern::Insufficient,
            avg_monthly: Money::zero(),
            confidence: 0.0,
        }
    }

    pub fn kind(&self) -> PatternKind {
        self.pattern.kind()
    }

    pub fn is_insufficient(&self) -> bool {
        self.kind() == PatternKind::Insufficient
    }

    pub fn describe(&self) -> String {
        self.pattern.describe()
    }
}

/// Largest-purchase share and tail figures for one month with at least two
/// transactions.
struct MonthShape {
    max_ratio: f64,
    count: usize,
    max_value: f64,
    tail_avg: f64,
}

#[derive(Debug, Clone, Default)]
pub struct PatternClassifier {
    thresholds: PatternThresholds,
}

impl PatternClassifier {
    pub fn new(thresholds: PatternThresholds) -> Self {
        Self { thresholds }
    }

    /// Picks the category's transactions of `kind` from the ledger and classifies them.
    pub fn analyze_category(
        &self,
        ledger: &[LedgerTransaction],
        category: &str,
        kind: TransactionKind,
    ) -> PatternAnalysis {
        let history = category_history(ledger, category, kind);
        let analysis = self.classify(&history);
        debug!(
            category,
            %kind,
            transactions = history.len(),
            pattern = %analysis.kind(),
            avg_monthly = %analysis.avg_monthly,
            "category pattern classified"
        );
        analysis
    }

    /// Classifies a history already sorted by date.
    pub fn classify(&self, history: &[&LedgerTransaction]) -> PatternAnalysis {
        let t = &self.thresholds;
        if history.len() < t.min_transactions {
            return PatternAnalysis::insufficient();
        }

        let months = by_month(history);
        let monthly_totals: Vec<f64> = months
            .values()
            .map(|txs| txs.iter().map(|tx| tx.amount.abs().to_f64()).sum())
            .collect();
        let monthly_counts: Vec<f64> = months.values().map(|txs| txs.len() as f64).collect();
        let amounts: Vec<f64> = history.iter().map(|tx| tx.amount.abs().to_f64()).collect();

        if let Some(found) = self.fixed_recurring(history, &amounts, &monthly_counts) {
            return found;
        }
        if let Some(found) = self.periodic(history, &amounts) {
            return found;
        }
        let shapes: Vec<MonthShape> = months
            .values()
            .filter_map(|txs| month_shape(txs))
            .collect();
        if let Some(found) = self.burst_tail(&shapes) {
            return found;
        }
        if let Some(found) = self.seasonal(&months, &monthly_totals) {
            return found;
        }
        self.variable(&monthly_totals)
    }

    fn fixed_recurring(
        &self,
        history: &[&LedgerTransaction],
        amounts: &[f64],
        monthly_counts: &[f64],
    ) -> Option<PatternAnalysis> {
        let t = &self.thresholds;
        let amount_cv = if amounts.len() > 1 {
            coefficient_of_variation(amounts)
        } else {
            1.0
        };
        let days: Vec<f64> = history.iter().map(|tx| tx.date.day() as f64).collect();
        let regular = amount_cv < t.fixed_amount_cv
            && std_dev(&days) < t.fixed_day_stddev
            && monthly_counts.iter().all(|c| *c <= t.fixed_max_per_month as f64);
        if !regular {
            return None;
        }

        let amount = median(amounts);
        let per_month = median(monthly_counts);
        Some(PatternAnalysis {
            pattern: Pattern::FixedRecurring {
                amount: Money::from_f64(amount),
                typical_day: median(&days).round() as u32,
                per_month,
            },
            avg_monthly: Money::from_f64(amount * per_month),
            confidence: t.fixed_confidence,
        })
    }

    fn periodic(&self, history: &[&LedgerTransaction], amounts: &[f64]) -> Option<PatternAnalysis> {
        let t = &self.thresholds;
        let intervals: Vec<f64> = history
            .windows(2)
            .map(|pair| (pair[1].date - pair[0].date).num_days() as f64)
            .collect();
        let avg_interval = if intervals.is_empty() {
            DEFAULT_INTERVAL_DAYS
        } else {
            mean(&intervals)
        };

        let regular = intervals.len() >= t.periodic_min_intervals
            && std_dev(&intervals) / avg_interval < t.periodic_interval_cv
            && avg_interval < t.periodic_max_interval_days;
        if !regular {
            return None;
        }

        let avg_amount = weighted_avg(tail(amounts, t.periodic_amount_window), t.recency_step);
        let events_per_month = DAYS_PER_MONTH / avg_interval;
        Some(PatternAnalysis {
            pattern: Pattern::Periodic {
                avg_interval,
                avg_amount: Money::from_f64(avg_amount),
                events_per_month,
            },
            avg_monthly: Money::from_f64(avg_amount * events_per_month),
            confidence: t.periodic_confidence,
        })
    }

    fn burst_tail(&self, shapes: &[MonthShape]) -> Option<PatternAnalysis> {
        let t = &self.thresholds;
        if shapes.len() < t.burst_min_months {
            return None;
        }
        let ratios: Vec<f64> = shapes.iter().map(|s| s.max_ratio).collect();
        let avg_ratio = mean(&ratios);
        if !(avg_ratio > t.burst_ratio_min && avg_ratio < t.burst_ratio_max) {
            return None;
        }

        let maxima: Vec<f64> = shapes.iter().map(|s| s.max_value).collect();
        let tails: Vec<f64> = shapes.iter().map(|s| s.tail_avg).collect();
        let tail_counts: Vec<f64> = shapes.iter().map(|s| (s.count - 1) as f64).collect();

        let burst = weighted_avg(&maxima, t.recency_step);
        let tail_amount = weighted_avg(&tails, t.recency_step);
        let tail_count = median(&tail_counts).round() as u32;
        Some(PatternAnalysis {
            pattern: Pattern::BurstTail {
                burst_amount: Money::from_f64(burst),
                tail_amount: Money::from_f64(tail_amount),
                tail_count,
            },
            avg_monthly: Money::from_f64(burst + tail_amount * tail_count as f64),
            confidence: t.burst_confidence,
        })
    }

    fn seasonal(
        &self,
        months: &BTreeMap<MonthKey, Vec<&LedgerTransaction>>,
        monthly_totals: &[f64],
    ) -> Option<PatternAnalysis> {
        let t = &self.thresholds;
        // CV over two points says nothing about seasonality.
        let total_cv = if monthly_totals.len() > 2 {
            coefficient_of_variation(monthly_totals)
        } else {
            0.0
        };
        if !(total_cv > t.seasonal_total_cv && months.len() >= t.seasonal_min_months) {
            return None;
        }

        let mut profile: BTreeMap<u32, Vec<Money>> = BTreeMap::new();
        for (key, total) in months.keys().zip(monthly_totals) {
            profile.entry(key.month).or_default().push(Money::from_f64(*total));
        }
        Some(PatternAnalysis {
            pattern: Pattern::Seasonal { profile },
            avg_monthly: Money::from_f64(weighted_avg(
                tail(monthly_totals, t.seasonal_window),
                t.recency_step,
            )),
            confidence: t.seasonal_confidence,
        })
    }

    fn variable(&self, monthly_totals: &[f64]) -> PatternAnalysis {
        let t = &self.thresholds;
        let trend = match monthly_totals {
            [.., previous, last] => last - previous,
            _ => 0.0,
        };
        PatternAnalysis {
            pattern: Pattern::Variable {
                recent_avg: Money::from_f64(weighted_avg(
                    tail(monthly_totals, t.seasonal_window),
                    t.recency_step,
                )),
                trend: Money::from_f64(trend),
            },
            avg_monthly: Money::from_f64(weighted_avg(
                tail(monthly_totals, t.variable_window),
                t.recency_step,
            )),
            confidence: t.variable_confidence,
        }
    }
}

fn month_shape(txs: &[&LedgerTransaction]) -> Option<MonthShape> {
    if txs.len() < 2 {
        return None;
    }
    let mut values: Vec<f64> = txs.iter().map(|tx| tx.amount.abs().to_f64()).collect();
    values.sort_by(|a, b| b.total_cmp(a));
    let total: f64 = values.iter().sum();
    let tail_values = &values[1..];
    Some(MonthShape {
        max_ratio: values[0] / total,
        count: values.len(),
        max_value: values[0],
        tail_avg: tail_values.iter().sum::<f64>() / tail_values.len() as f64,
    })
}
