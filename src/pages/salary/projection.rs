//! Read models for salaries.
//!
//! Stored rows only reference employees by id. These projections resolve the
//! employee, department and position names once per request and shape the
//! typed views the handlers return.

use std::collections::{BTreeMap, HashMap};

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};

use crate::{
    entity::{department, position, sea_orm_active_enums::{EmployeeStatus, RoleType}, user},
    payroll::{DayKind, OtDetail},
};

use super::*;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(super) struct EmployeeView {
    pub(super) id: Uuid,
    pub(super) username: String,
    pub(super) role: RoleType,
    pub(super) status: EmployeeStatus,
    pub(super) base_salary: i64,
    pub(super) vacation_days: f64,
    pub(super) department: Option<String>,
    pub(super) position: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct SalaryView {
    #[serde(flatten)]
    pub(super) salary: salary::Model,
    pub(super) employee: Option<EmployeeView>,
}

/// Employees referenced by a batch of salaries, with their display names
#[derive(Debug, Default)]
pub(super) struct Directory {
    users: HashMap<Uuid, user::Model>,
    departments: HashMap<Uuid, String>,
    positions: HashMap<Uuid, String>,
}

impl Directory {
    pub(super) async fn load<C: ConnectionTrait>(db: &C, user_ids: impl IntoIterator<Item = Uuid>) -> Result<Self, DbErr> {
        let mut user_ids = user_ids.into_iter().collect::<Vec<_>>();
        user_ids.sort();
        user_ids.dedup();

        if user_ids.is_empty() {
            return Ok(Self::default());
        }

        let users = User::find()
            .filter(user::Column::Id.is_in(user_ids))
            .all(db).await?;

        Self::for_users(db, users).await
    }

    pub(super) async fn for_users<C: ConnectionTrait>(db: &C, users: Vec<user::Model>) -> Result<Self, DbErr> {
        let mut department_ids = users.iter().filter_map(|u| u.department_id).collect::<Vec<_>>();
        department_ids.sort();
        department_ids.dedup();

        let mut position_ids = users.iter().filter_map(|u| u.position_id).collect::<Vec<_>>();
        position_ids.sort();
        position_ids.dedup();

        let departments = if department_ids.is_empty() {
            Vec::new()
        } else {
            Department::find()
                .filter(department::Column::Id.is_in(department_ids))
                .all(db).await?
        };

        let positions = if position_ids.is_empty() {
            Vec::new()
        } else {
            Position::find()
                .filter(position::Column::Id.is_in(position_ids))
                .all(db).await?
        };

        Ok(Self {
            users: users.into_iter().map(|u| (u.id, u)).collect(),
            departments: departments.into_iter().map(|d| (d.id, d.name)).collect(),
            positions: positions.into_iter().map(|p| (p.id, p.name)).collect(),
        })
    }

    pub(super) fn employee(&self, user_id: Uuid) -> Option<EmployeeView> {
        let user = self.users.get(&user_id)?;

        Some(EmployeeView {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            status: user.status,
            base_salary: user.salary,
            vacation_days: user.vacation_days,
            department: user.department_id.and_then(|id| self.departments.get(&id).cloned()),
            position: user.position_id.and_then(|id| self.positions.get(&id).cloned()),
        })
    }

    pub(super) fn project(&self, salary: salary::Model) -> SalaryView {
        SalaryView {
            employee: self.employee(salary.user_id),
            salary,
        }
    }
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub(super) struct SalarySummary {
    pub(super) count: usize,
    pub(super) total_base_salary: i64,
    pub(super) total_ot_hours: f64,
    pub(super) total_ot_amount: i64,
    pub(super) total_bonus: i64,
    pub(super) total_commission: i64,
    pub(super) total_fuel_costs: i64,
    pub(super) total_deductions: i64,
    pub(super) total_net_salary: i64,
    pub(super) by_status: BTreeMap<String, usize>,
}

pub(super) fn summarize(salaries: &[salary::Model]) -> SalarySummary {
    salaries.iter().fold(SalarySummary::default(), |mut summary, salary| {
        let figures = PayFigures::from(salary);

        summary.count += 1;
        summary.total_base_salary = summary.total_base_salary.saturating_add(salary.base_salary);
        summary.total_ot_hours += salary.ot_hours;
        summary.total_ot_amount = summary.total_ot_amount.saturating_add(salary.ot_amount);
        summary.total_bonus = summary.total_bonus.saturating_add(salary.bonus);
        summary.total_commission = summary.total_commission.saturating_add(salary.commission);
        summary.total_fuel_costs = summary.total_fuel_costs.saturating_add(salary.fuel_costs);
        summary.total_deductions = summary.total_deductions.saturating_add(figures.deductions().unwrap_or(i64::MAX));
        summary.total_net_salary = summary.total_net_salary.saturating_add(salary.net_salary);
        *summary.by_status.entry(salary.status.to_string()).or_default() += 1;

        summary
    })
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub(super) struct OtBucket {
    pub(super) hours: f64,
    pub(super) amount: i64,
    pub(super) entries: Vec<OtEntryView>,
}

#[derive(Debug, PartialEq, Serialize)]
pub(super) struct OtEntryView {
    pub(super) salary_id: Uuid,
    pub(super) month: i32,
    pub(super) year: i32,
    #[serde(flatten)]
    pub(super) detail: OtDetail,
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub(super) struct OtByType {
    pub(super) weekday: OtBucket,
    pub(super) weekend: OtBucket,
}

/// Every stored OT entry of the given salaries, split by day kind
pub(super) fn group_by_type(salaries: Vec<salary::Model>) -> OtByType {
    let mut grouped = OtByType::default();

    for salary in salaries {
        for detail in salary.ot_details.0 {
            let bucket = match detail.day_kind {
                DayKind::Weekday => &mut grouped.weekday,
                DayKind::Weekend => &mut grouped.weekend,
            };

            bucket.hours += detail.hours;
            bucket.amount += detail.amount;
            bucket.entries.push(OtEntryView {
                salary_id: salary.id,
                month: salary.month,
                year: salary.year,
                detail,
            });
        }
    }

    grouped
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use sea_orm::{DatabaseBackend, MockDatabase};

    use crate::{entity::salary::OtDetails, pages::salary::tests::pending_salary, payroll::tests::employee};

    use super::*;

    fn detail(day: u32, hours: f64, amount: i64) -> OtDetail {
        let date = NaiveDate::from_ymd_opt(2025, 6, day).unwrap();

        OtDetail { date, hours, day_kind: DayKind::of(date), is_manual: amount > 0, amount, request_id: None }
    }

    #[test]
    fn test_summarize() {
        let user = employee(1_000_000, 12.0);

        let mut first = pending_salary(&user);
        first.bonus = 100_000;
        first.social_security = 20_000;
        first.net_salary = 1_080_000;

        let mut second = pending_salary(&user);
        second.status = SalaryStatus::Paid;
        second.ot_hours = 4.5;
        second.ot_amount = 90_000;
        second.net_salary = 1_090_000;

        let summary = summarize(&[first, second]);

        assert_eq!(summary.count, 2);
        assert_eq!(summary.total_base_salary, 2_000_000);
        assert_eq!(summary.total_ot_hours, 4.5);
        assert_eq!(summary.total_ot_amount, 90_000);
        assert_eq!(summary.total_bonus, 100_000);
        assert_eq!(summary.total_deductions, 20_000);
        assert_eq!(summary.total_net_salary, 2_170_000);
        assert_eq!(summary.by_status.get("pending"), Some(&1));
        assert_eq!(summary.by_status.get("paid"), Some(&1));
    }

    #[test]
    fn test_group_by_type() {
        let user = employee(1_000_000, 12.0);

        let mut may = pending_salary(&user);
        may.ot_details = OtDetails(vec![detail(2, 10.0, 0), detail(7, 3.0, 0)]);

        let mut june = pending_salary(&user);
        june.ot_details = OtDetails(vec![detail(8, 2.0, 200_000), detail(3, 1.5, 75_000)]);

        let grouped = group_by_type(vec![may, june]);

        assert_eq!(grouped.weekday.hours, 11.5);
        assert_eq!(grouped.weekday.amount, 75_000);
        assert_eq!(grouped.weekday.entries.len(), 2);
        assert_eq!(grouped.weekend.hours, 5.0);
        assert_eq!(grouped.weekend.amount, 200_000);
        assert_eq!(grouped.weekend.entries.len(), 2);
    }

    #[actix_web::test]
    async fn test_directory_resolves_names() {
        let department = department::Model {
            id: Uuid::new_v4(),
            created_at: Local::now().into(),
            updated_at: Local::now().into(),
            name: "Engineering".to_string(),
        };
        let user = user::Model { department_id: Some(department.id), ..employee(1_000_000, 12.0) };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ user.clone() ]])
            .append_query_results([vec![ department.clone() ]])
            .into_connection();

        let directory = Directory::load(&db, [user.id, user.id]).await.unwrap();
        let view = directory.project(pending_salary(&user));

        let employee = view.employee.unwrap();
        assert_eq!(employee.username, user.username);
        assert_eq!(employee.department.as_deref(), Some("Engineering"));
        assert_eq!(employee.position, None);
        assert!(directory.employee(Uuid::new_v4()).is_none());
    }
}
