//! Cash-flow forecasting and per-category month predictions over a ledger
//! snapshot. Every entry point is a pure function of its inputs plus an
//! explicit `today`.

pub mod error;
pub mod forecast;
pub mod month_end;
pub mod monthly;
pub mod pattern;
pub mod predict;
pub mod stats;

pub use error::ForecastError;
pub use forecast::{ForecastEngine, ForecastPoint, ForecastSummary, MonthTotals};
pub use month_end::{MonthEndPrediction, MonthEndProjector};
pub use monthly::{aggregate, MonthlyAggregate};
pub use pattern::{Pattern, PatternAnalysis, PatternClassifier, PatternKind};
pub use predict::{
    monthly_budget_target, smart_prediction, BudgetTarget, CategoryPrediction, MonthPredictions,
    PredictionEngine,
};
