//! Monthly salary computation.
//!
//! The ledgers (overtime, field work, day off) are reduced to totals for one
//! user and one [`Period`]. A ledger that cannot be read contributes nothing:
//! the failure is logged and reported back as a warning so the caller can see
//! that the figures are degraded.

use sea_orm::{ConnectionTrait, DbErr};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::entity::user;

pub mod compose;
pub mod fuel;
pub mod overtime;
pub mod period;
pub mod vacation;

pub use compose::PayFigures;
pub use overtime::{DayKind, OtDetail, OvertimeSummary};
pub use period::Period;
pub use vacation::VacationSummary;

#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("{ledger} ledger could not be read, its contribution was set to zero")]
    Ledger {
        ledger: &'static str,
        #[source]
        source: DbErr,
    },
}

/// What the ledgers say about one user's month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSnapshot {
    pub overtime: OvertimeSummary,
    pub fuel_costs: i64,
    pub vacation: VacationSummary,
    pub working_days: i64,
    pub warnings: Vec<String>,
}

fn or_zero<T: Default>(result: Result<T, AggregationError>, warnings: &mut Vec<String>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            let AggregationError::Ledger { ledger, source } = &err;
            warn!(ledger, error = %source, "ledger aggregation degraded to zero");

            warnings.push(err.to_string());
            T::default()
        },
    }
}

/// Reads every ledger for the period. `fuel_override` skips the field work
/// ledger when the caller already knows the amount.
pub async fn collect<C: ConnectionTrait>(
    db: &C,
    user: &user::Model,
    period: Period,
    fuel_override: Option<i64>,
) -> LedgerSnapshot {
    let mut warnings = Vec::new();

    let overtime = or_zero(overtime::aggregate(db, user.id, period).await, &mut warnings);

    let fuel_costs = match fuel_override {
        Some(fuel_costs) => fuel_costs,
        None => or_zero(fuel::aggregate(db, user.id, period).await, &mut warnings),
    };

    let vacation = vacation_balance(db, user, period, &mut warnings).await;

    LedgerSnapshot {
        overtime,
        fuel_costs,
        vacation,
        working_days: period.working_days(),
        warnings,
    }
}

/// Month and year-to-date day-off usage against the user's allotment
pub async fn vacation_balance<C: ConnectionTrait>(
    db: &C,
    user: &user::Model,
    period: Period,
    warnings: &mut Vec<String>,
) -> VacationSummary {
    let day_off_days = or_zero(vacation::month_days_off(db, user.id, period).await, warnings);
    let used_this_year = or_zero(vacation::year_days_off(db, user.id, period).await, warnings);

    VacationSummary::new(user.vacation_days, day_off_days, used_this_year)
}
