//! Month-end projection from the day-of-month shape of past spending.
//!
//! Each past month yields a 31-bucket cumulative curve: bucket `d` is the
//! share of that month's total spent by day `d + 1`. Recent months weigh
//! more when the curves are blended. Dividing what was spent so far by the
//! blended share at today's bucket gives the projected total.

use chrono::{Datelike, NaiveDate};
use finflow_core::{LedgerTransaction, Money, MonthEndSettings, MonthKey};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::monthly::by_month;

pub const CURVE_DAYS: usize = 31;

pub type SpendCurve = [f64; CURVE_DAYS];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthEndPrediction {
    pub projected: Money,
    pub spent: Money,
    pub remaining: Money,
    pub confidence: f64,
}

impl MonthEndPrediction {
    fn settled(spent: Money, confidence: f64) -> Self {
        Self {
            projected: spent,
            spent,
            remaining: Money::zero(),
            confidence,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MonthEndProjector {
    settings: MonthEndSettings,
}

impl MonthEndProjector {
    pub fn new(settings: MonthEndSettings) -> Self {
        Self { settings }
    }

    /// Projects `month`'s total for a single category history as of `today`.
    ///
    /// Only the month containing `today` is projected. Any other month, and
    /// the current one on its last day, reports its actual total.
    pub fn project(
        &self,
        history: &[&LedgerTransaction],
        month: MonthKey,
        today: NaiveDate,
    ) -> MonthEndPrediction {
        let s = &self.settings;
        let spent: Money = history
            .iter()
            .filter(|tx| month.contains(tx.date))
            .map(|tx| tx.amount.abs())
            .sum();

        let days_total = month.days_in_month();
        let current_month = MonthKey::from_date(today);
        let current_day = if month == current_month {
            today.day()
        } else {
            days_total
        };
        if current_day >= days_total {
            return MonthEndPrediction::settled(spent, 1.0);
        }

        let Some(curve) = self.reference_curve(history, month) else {
            return MonthEndPrediction::settled(spent, s.no_history_confidence);
        };

        let fraction = curve[(current_day as usize).saturating_sub(1).min(CURVE_DAYS - 1)];
        let projected = if fraction > s.curve_floor {
            Money::from_f64(spent.to_f64() / fraction).max(spent)
        } else {
            spent
        };

        MonthEndPrediction {
            projected,
            spent,
            remaining: projected - spent,
            confidence: (s.confidence_base + fraction * s.confidence_slope).min(s.confidence_cap),
        }
    }

    /// Blended curve of the last `history_months` months before `month` that
    /// have any spending. `None` when there are none.
    pub fn reference_curve(&self, history: &[&LedgerTransaction], month: MonthKey) -> Option<SpendCurve> {
        let past: BTreeMap<MonthKey, Vec<&LedgerTransaction>> = by_month(history)
            .into_iter()
            .filter(|(key, _)| *key < month)
            .collect();
        let skip = past.len().saturating_sub(self.settings.history_months);
        let curves: Vec<SpendCurve> = past
            .values()
            .skip(skip)
            .filter_map(|txs| cumulative_curve(txs))
            .collect();
        if curves.is_empty() {
            return None;
        }

        let step = self.settings.recency_step;
        let total_weight: f64 = (0..curves.len()).map(|i| 1.0 + i as f64 * step).sum();
        let mut blended = [0.0; CURVE_DAYS];
        for (i, curve) in curves.iter().enumerate() {
            let weight = 1.0 + i as f64 * step;
            for (slot, value) in blended.iter_mut().zip(curve) {
                *slot += value * weight;
            }
        }
        blended.iter_mut().for_each(|v| *v /= total_weight);
        Some(blended)
    }
}

/// Share of one month's total spent by each day; `None` for an empty month.
pub fn cumulative_curve(txs: &[&LedgerTransaction]) -> Option<SpendCurve> {
    let mut by_day = [0.0; CURVE_DAYS];
    for tx in txs {
        by_day[tx.date.day0() as usize] += tx.amount.abs().to_f64();
    }
    let total: f64 = by_day.iter().sum();
    if total <= 0.0 {
        return None;
    }

    let mut curve = [0.0; CURVE_DAYS];
    let mut running = 0.0;
    for (slot, spent) in curve.iter_mut().zip(by_day) {
        running += spent;
        *slot = running / total;
    }
    Some(curve)
}
