//! Per-category predictions for one month, combining the recurrence
//! pattern with the month-end projection and comparing against budgets.

use chrono::NaiveDate;
use finflow_core::{
    CategoryBudget, CategoryKind, EngineConfig, LedgerRepository, LedgerTransaction, Money, MonthKey,
};
use serde::Serialize;
use tracing::info;

use crate::error::ForecastError;
use crate::month_end::{MonthEndPrediction, MonthEndProjector};
use crate::monthly::category_history;
use crate::pattern::{PatternAnalysis, PatternClassifier};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPrediction {
    pub category: String,
    pub kind: CategoryKind,
    pub analysis: PatternAnalysis,
    pub month_end: MonthEndPrediction,
    pub budget: Money,
    /// Expected month total; never below what is already recorded.
    pub smart_predicted: Money,
    /// `None` when the category has no budget for the month.
    pub on_track: Option<bool>,
    pub percent_of_budget: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthPredictions {
    pub month: MonthKey,
    pub expenses: Vec<CategoryPrediction>,
    pub incomes: Vec<CategoryPrediction>,
    pub total_expense_predicted: Money,
    pub total_income_predicted: Money,
}

impl MonthPredictions {
    pub fn predicted_savings(&self) -> Money {
        self.total_income_predicted - self.total_expense_predicted
    }

    pub fn category(&self, id: &str) -> Option<&CategoryPrediction> {
        self.expenses
            .iter()
            .chain(&self.incomes)
            .find(|p| p.category == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BudgetTarget {
    pub expense_budget: Money,
    pub income_budget: Money,
    pub savings_target: Money,
}

/// Sums every category's budget for `month`.
pub fn monthly_budget_target(categories: &[CategoryBudget], month: MonthKey) -> BudgetTarget {
    let sum = |kind: CategoryKind| -> Money {
        categories
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.amount_for(month))
            .sum()
    };
    let expense_budget = sum(CategoryKind::Expense);
    let income_budget = sum(CategoryKind::Income);
    BudgetTarget {
        expense_budget,
        income_budget,
        savings_target: income_budget - expense_budget,
    }
}

#[derive(Debug, Clone, Default)]
pub struct PredictionEngine {
    classifier: PatternClassifier,
    projector: MonthEndProjector,
}

impl PredictionEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            classifier: PatternClassifier::new(config.patterns.clone()),
            projector: MonthEndProjector::new(config.month_end.clone()),
        }
    }

    pub fn generate(
        &self,
        ledger: &[LedgerTransaction],
        categories: &[CategoryBudget],
        month: MonthKey,
        today: NaiveDate,
    ) -> MonthPredictions {
        let (mut expenses, mut incomes) = (Vec::new(), Vec::new());
        for category in categories {
            let prediction = self.predict_category(ledger, category, month, today);
            match category.kind {
                CategoryKind::Expense => expenses.push(prediction),
                CategoryKind::Income => incomes.push(prediction),
            }
        }

        let total = |list: &[CategoryPrediction]| -> Money { list.iter().map(|p| p.smart_predicted).sum() };
        let predictions = MonthPredictions {
            month,
            total_expense_predicted: total(&expenses),
            total_income_predicted: total(&incomes),
            expenses,
            incomes,
        };
        info!(
            %month,
            categories = categories.len(),
            expense = %predictions.total_expense_predicted,
            income = %predictions.total_income_predicted,
            "month predictions generated"
        );
        predictions
    }

    pub fn predict_category(
        &self,
        ledger: &[LedgerTransaction],
        category: &CategoryBudget,
        month: MonthKey,
        today: NaiveDate,
    ) -> CategoryPrediction {
        let kind = category.kind.transaction_kind();
        let analysis = self.classifier.analyze_category(ledger, &category.id, kind);
        let history = category_history(ledger, &category.id, kind);
        let month_end = self.projector.project(&history, month, today);

        let smart_predicted = smart_prediction(&analysis, &month_end);
        let budget = category.amount_for(month);
        let has_budget = budget.is_positive();
        let on_track = has_budget.then(|| match category.kind {
            CategoryKind::Expense => smart_predicted <= budget,
            CategoryKind::Income => smart_predicted >= budget,
        });
        let percent_of_budget =
            has_budget.then(|| smart_predicted.to_f64() / budget.to_f64() * 100.0);

        CategoryPrediction {
            category: category.id.clone(),
            kind: category.kind,
            analysis,
            month_end,
            budget,
            smart_predicted,
            on_track,
            percent_of_budget,
        }
    }

    pub fn for_repository<R: LedgerRepository>(
        &self,
        repo: &R,
        month: MonthKey,
        today: NaiveDate,
    ) -> Result<MonthPredictions, ForecastError> {
        let ledger = repo.transactions()?;
        let categories = repo.category_budgets()?;
        Ok(self.generate(&ledger, &categories, month, today))
    }
}

/// With a pattern and spending under way, the larger of the curve projection
/// and the pattern's monthly figure wins. With a pattern and nothing spent,
/// the pattern's figure stands alone. The result is never below spend.
pub fn smart_prediction(analysis: &PatternAnalysis, month_end: &MonthEndPrediction) -> Money {
    let spent = month_end.spent;
    let predicted = if analysis.is_insufficient() {
        month_end.projected
    } else if spent.is_positive() {
        let projected = month_end.projected.max(analysis.avg_monthly);
        spent + (projected - spent).max(Money::zero())
    } else {
        analysis.avg_monthly
    };
    predicted.max(spent)
}
