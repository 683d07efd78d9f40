use chrono::NaiveDate;

use crate::payroll::{DayKind, LedgerSnapshot, OtDetail, OvertimeSummary, VacationSummary};

use super::*;

/// One OT line as sent by the salary form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct OtEntryInput {
    pub(super) date: NaiveDate,
    pub(super) hours: f64,
    #[serde(default)]
    pub(super) amount: i64,
    /// Derived from `date` when absent
    #[serde(default)]
    pub(super) day_kind: Option<DayKind>,
    #[serde(default)]
    pub(super) is_manual: bool,
}

impl OtEntryInput {
    pub(super) fn into_manual_detail(self) -> Result<OtDetail, ApiError> {
        if !self.hours.is_finite() || self.hours < 0.0 {
            return Err(ApiError::validation(format!("invalid overtime hours on {}", self.date)));
        }

        if self.amount < 0 {
            return Err(ApiError::validation(format!("invalid overtime amount on {}", self.date)));
        }

        Ok(OtDetail {
            date: self.date,
            hours: self.hours,
            day_kind: self.day_kind.unwrap_or_else(|| DayKind::of(self.date)),
            is_manual: true,
            amount: self.amount,
            request_id: None,
        })
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(super) struct CreateSalary {
    pub(super) user_id: Uuid,
    pub(super) month: Option<u32>,
    pub(super) year: Option<i32>,

    pub(super) base_salary: Option<i64>,
    pub(super) ot_amount: Option<i64>,
    pub(super) ot_hours: Option<f64>,
    /// Only entries flagged `is_manual` are taken, the rest is rebuilt from the ledger
    #[serde(default)]
    pub(super) ot_details: Vec<OtEntryInput>,
    #[serde(default)]
    pub(super) manual_ot: Vec<OtEntryInput>,

    pub(super) bonus: Option<i64>,
    pub(super) commission: Option<i64>,
    pub(super) fuel_costs: Option<i64>,
    pub(super) money_not_spent_on_holidays: Option<i64>,
    pub(super) other_income: Option<i64>,
    pub(super) office_expenses: Option<i64>,
    pub(super) social_security: Option<i64>,
    pub(super) cut_off_pay_days: Option<f64>,
    pub(super) cut_off_pay_amount: Option<i64>,
    pub(super) working_days: Option<i32>,

    /// Either one overrides the computed net salary
    pub(super) salary: Option<i64>,
    pub(super) net_salary: Option<i64>,

    pub(super) notes: Option<String>,
}

fn non_negative(amounts: &[(&str, Option<i64>)], quantities: &[(&str, Option<f64>)]) -> Result<(), ApiError> {
    if let Some((name, _)) = amounts.iter().find(|(_, value)| value.is_some_and(|v| v < 0)) {
        return Err(ApiError::validation(format!("{name} must not be negative")));
    }

    if let Some((name, _)) = quantities.iter().find(|(_, value)| value.is_some_and(|v| !v.is_finite() || v < 0.0)) {
        return Err(ApiError::validation(format!("{name} must be a non-negative number")));
    }

    Ok(())
}

impl CreateSalary {
    pub(super) fn validate(&self) -> Result<(), ApiError> {
        non_negative(&[
            ("base_salary", self.base_salary),
            ("ot_amount", self.ot_amount),
            ("bonus", self.bonus),
            ("commission", self.commission),
            ("fuel_costs", self.fuel_costs),
            ("money_not_spent_on_holidays", self.money_not_spent_on_holidays),
            ("other_income", self.other_income),
            ("office_expenses", self.office_expenses),
            ("social_security", self.social_security),
            ("cut_off_pay_amount", self.cut_off_pay_amount),
            ("working_days", self.working_days.map(i64::from)),
            ("salary", self.salary),
            ("net_salary", self.net_salary),
        ], &[
            ("ot_hours", self.ot_hours),
            ("cut_off_pay_days", self.cut_off_pay_days),
        ])
    }

    pub(super) fn manual_entries(&mut self) -> Result<Vec<OtDetail>, ApiError> {
        let flagged = std::mem::take(&mut self.ot_details).into_iter().filter(|entry| entry.is_manual);
        let explicit = std::mem::take(&mut self.manual_ot);

        flagged.chain(explicit)
            .map(OtEntryInput::into_manual_detail)
            .collect()
    }
}

/// Fields that may still change while a salary is pending
#[derive(Debug, Default, Serialize, Deserialize)]
pub(super) struct UpdateSalary {
    pub(super) base_salary: Option<i64>,
    pub(super) ot_amount: Option<i64>,
    pub(super) ot_hours: Option<f64>,
    pub(super) bonus: Option<i64>,
    pub(super) commission: Option<i64>,
    pub(super) fuel_costs: Option<i64>,
    pub(super) money_not_spent_on_holidays: Option<i64>,
    pub(super) other_income: Option<i64>,
    pub(super) office_expenses: Option<i64>,
    pub(super) social_security: Option<i64>,
    pub(super) cut_off_pay_days: Option<f64>,
    pub(super) cut_off_pay_amount: Option<i64>,
    pub(super) working_days: Option<i32>,
    pub(super) notes: Option<String>,
}

impl UpdateSalary {
    pub(super) fn validate(&self) -> Result<(), ApiError> {
        non_negative(&[
            ("base_salary", self.base_salary),
            ("ot_amount", self.ot_amount),
            ("bonus", self.bonus),
            ("commission", self.commission),
            ("fuel_costs", self.fuel_costs),
            ("money_not_spent_on_holidays", self.money_not_spent_on_holidays),
            ("other_income", self.other_income),
            ("office_expenses", self.office_expenses),
            ("social_security", self.social_security),
            ("cut_off_pay_amount", self.cut_off_pay_amount),
            ("working_days", self.working_days.map(i64::from)),
        ], &[
            ("ot_hours", self.ot_hours),
            ("cut_off_pay_days", self.cut_off_pay_days),
        ])
    }

    pub(super) fn apply(self, salary: &mut salary::Model) {
        fn put<T>(target: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *target = value;
            }
        }

        put(&mut salary.base_salary, self.base_salary);
        put(&mut salary.ot_amount, self.ot_amount);
        put(&mut salary.ot_hours, self.ot_hours);
        put(&mut salary.bonus, self.bonus);
        put(&mut salary.commission, self.commission);
        put(&mut salary.fuel_costs, self.fuel_costs);
        put(&mut salary.money_not_spent_on_holidays, self.money_not_spent_on_holidays);
        put(&mut salary.other_income, self.other_income);
        put(&mut salary.office_expenses, self.office_expenses);
        put(&mut salary.social_security, self.social_security);
        put(&mut salary.cut_off_pay_days, self.cut_off_pay_days);
        put(&mut salary.cut_off_pay_amount, self.cut_off_pay_amount);
        put(&mut salary.working_days, self.working_days);

        if self.notes.is_some() {
            salary.notes = self.notes;
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct UpdateSalaryStatus {
    pub(super) status: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(super) struct SalaryQuery {
    pub(super) month: Option<i32>,
    pub(super) year: Option<i32>,
    pub(super) status: Option<String>,
    #[serde(rename = "userId", alias = "user_id")]
    pub(super) user_id: Option<Uuid>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(super) struct PeriodQuery {
    pub(super) month: Option<u32>,
    pub(super) year: Option<i32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(super) struct YearQuery {
    pub(super) year: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct SalaryResponse {
    pub(super) message: String,
    pub(super) salary: salary::Model,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(super) warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct SalaryViewResponse {
    pub(super) message: String,
    pub(super) salary: SalaryView,
}

#[derive(Debug, Serialize)]
pub(super) struct SalaryListResponse {
    pub(super) message: String,
    pub(super) count: usize,
    pub(super) salaries: Vec<SalaryView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct MessageResponse {
    pub(super) message: String,
}

#[derive(Debug, Serialize)]
pub(super) struct Calculated {
    pub(super) base_salary: i64,
    pub(super) overtime: OvertimeSummary,
    pub(super) fuel_costs: i64,
    pub(super) working_days: i64,
    pub(super) vacation: VacationSummary,
    pub(super) cut_off_pay_days: f64,
    /// Net salary before any manual adjustment
    pub(super) estimated_net_salary: i64,
}

impl Calculated {
    pub(super) fn new(base_salary: i64, ledgers: LedgerSnapshot) -> Result<(Self, Vec<String>), ApiError> {
        let estimated_net_salary = PayFigures {
            base_salary,
            ot_amount: ledgers.overtime.total_amount,
            fuel_costs: ledgers.fuel_costs,
            ..Default::default()
        }.net_salary()?;

        let calculated = Self {
            base_salary,
            cut_off_pay_days: ledgers.vacation.exceed_days,
            overtime: ledgers.overtime,
            fuel_costs: ledgers.fuel_costs,
            working_days: ledgers.working_days,
            vacation: ledgers.vacation,
            estimated_net_salary,
        };

        Ok((calculated, ledgers.warnings))
    }
}

#[derive(Debug, Serialize)]
pub(super) struct PrefillData {
    pub(super) user: EmployeeView,
    pub(super) calculated: Calculated,
    pub(super) month: u32,
    pub(super) year: i32,
}

#[derive(Debug, Serialize)]
pub(super) struct PrefillResponse {
    pub(super) message: String,
    pub(super) data: PrefillData,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(super) warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct SummaryResponse {
    pub(super) message: String,
    pub(super) summary: SalarySummary,
}

#[derive(Debug, Serialize)]
pub(super) struct OtSummaryData {
    pub(super) month: u32,
    pub(super) year: i32,
    pub(super) overtime: OvertimeSummary,
}

#[derive(Debug, Serialize)]
pub(super) struct OtSummaryResponse {
    pub(super) message: String,
    pub(super) data: OtSummaryData,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(super) warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct OtByTypeResponse {
    pub(super) message: String,
    pub(super) data: OtByType,
}
