use serde::Serialize;

use crate::{entity::salary, error::ApiError};

/// Money that makes up a salary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PayFigures {
    pub base_salary: i64,
    pub ot_amount: i64,
    pub bonus: i64,
    pub commission: i64,
    pub fuel_costs: i64,
    pub money_not_spent_on_holidays: i64,
    pub other_income: i64,
    pub office_expenses: i64,
    pub social_security: i64,
    pub cut_off_pay_amount: i64,
}

impl PayFigures {
    pub fn earnings(&self) -> Option<i64> {
        [
            self.ot_amount,
            self.bonus,
            self.commission,
            self.fuel_costs,
            self.money_not_spent_on_holidays,
            self.other_income,
        ].into_iter().try_fold(self.base_salary, i64::checked_add)
    }

    pub fn deductions(&self) -> Option<i64> {
        [self.social_security, self.cut_off_pay_amount]
            .into_iter()
            .try_fold(self.office_expenses, i64::checked_add)
    }

    /// Earnings minus deductions, refusing figures that leave the `i64` range
    pub fn net_salary(&self) -> Result<i64, ApiError> {
        self.earnings()
            .zip(self.deductions())
            .and_then(|(earnings, deductions)| earnings.checked_sub(deductions))
            .ok_or_else(|| ApiError::validation("salary figures are too large to add up"))
    }
}

impl From<&salary::Model> for PayFigures {
    fn from(salary: &salary::Model) -> Self {
        Self {
            base_salary: salary.base_salary,
            ot_amount: salary.ot_amount,
            bonus: salary.bonus,
            commission: salary.commission,
            fuel_costs: salary.fuel_costs,
            money_not_spent_on_holidays: salary.money_not_spent_on_holidays,
            other_income: salary.other_income,
            office_expenses: salary.office_expenses,
            social_security: salary.social_security,
            cut_off_pay_amount: salary.cut_off_pay_amount,
        }
    }
}
