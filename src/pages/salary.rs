use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::Local;
use sea_orm::{ActiveValue::{Set, Unchanged}, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{Admin, Session},
    entity::{prelude::*, salary::{self, OtDetails}, sea_orm_active_enums::SalaryStatus},
    error::ApiError,
    pages::parse_id,
    payroll::{self, LedgerSnapshot, PayFigures, Period},
};

use extractor::PendingSalary;
use model::*;
use projection::*;

mod extractor;
mod model;
mod projection;

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    // Fixed segments go before `/{salary_id}`
    cfg
        .service(create_salary)
        .service(get_salaries)
        .service(get_salary_summary)
        .service(get_prefill_data)
        .service(get_ot_summary)
        .service(get_ot_by_type)
        .service(get_salary)
        .service(update_salary_status)
        .service(update_salary)
        .service(delete_salary);
}

enum Upserted {
    Created,
    Updated,
}

/// Caller value, else what the pending record already holds, else zero
fn carry<T: Default>(supplied: Option<T>, existing: Option<&salary::Model>, stored: impl FnOnce(&salary::Model) -> T) -> T {
    supplied.or_else(|| existing.map(stored)).unwrap_or_default()
}

async fn find_by_period(db: &DatabaseConnection, user_id: Uuid, period: Period) -> Result<Option<salary::Model>, ApiError> {
    Ok(Salary::find()
        .filter(salary::Column::UserId.eq(user_id))
        .filter(salary::Column::Month.eq(period.month as i32))
        .filter(salary::Column::Year.eq(period.year))
        .one(db).await?)
}

/// What a guarded write that matched nothing ran into
async fn locked(db: &DatabaseConnection, salary_id: Uuid) -> ApiError {
    match Salary::find_by_id(salary_id).one(db).await {
        Ok(Some(salary)) => ApiError::Locked(salary.status),
        Ok(None) => ApiError::NotFound("Salary"),
        Err(err) => err.into(),
    }
}

/// Writes `model` only while the salary is still pending
async fn update_pending(db: &DatabaseConnection, salary_id: Uuid, model: salary::ActiveModel) -> Result<salary::Model, ApiError> {
    let updated = Salary::update_many()
        .set(model)
        .filter(salary::Column::Id.eq(salary_id))
        .filter(salary::Column::Status.eq(SalaryStatus::Pending))
        .exec_with_returning(db).await?;

    match updated.into_iter().next() {
        Some(salary) => Ok(salary),
        None => Err(locked(db, salary_id).await),
    }
}

/// Computes the salary of `payload.user_id` for the requested month and
/// stores it, creating the record or recalculating a pending one.
async fn upsert_salary(
    db: &DatabaseConnection,
    session: &Session,
    mut payload: CreateSalary,
) -> Result<(Upserted, salary::Model, Vec<String>), ApiError> {
    payload.validate()?;
    let period = Period::resolve(payload.month, payload.year, Local::now().date_naive())?;

    let Some(user) = User::find_by_id(payload.user_id).one(db).await? else {
        return Err(ApiError::NotFound("User"));
    };

    let existing = find_by_period(db, user.id, period).await?;

    if let Some(existing) = &existing {
        if !existing.status.is_editable() {
            return Err(ApiError::Locked(existing.status));
        }
    }

    let mut manual = payload.manual_entries()?;
    if manual.is_empty() {
        if let Some(existing) = &existing {
            manual = existing.ot_details.0.iter().filter(|d| d.is_manual).cloned().collect();
        }
    }

    let LedgerSnapshot { overtime, fuel_costs, vacation, working_days, warnings } =
        payroll::collect(db, &user, period, payload.fuel_costs).await;
    let overtime = overtime.merge_manual(manual);

    let existing_ref = existing.as_ref();
    let figures = PayFigures {
        base_salary: payload.base_salary.unwrap_or(user.salary),
        ot_amount: payload.ot_amount.unwrap_or(overtime.total_amount),
        bonus: carry(payload.bonus, existing_ref, |s| s.bonus),
        commission: carry(payload.commission, existing_ref, |s| s.commission),
        fuel_costs,
        money_not_spent_on_holidays: carry(payload.money_not_spent_on_holidays, existing_ref, |s| s.money_not_spent_on_holidays),
        other_income: carry(payload.other_income, existing_ref, |s| s.other_income),
        office_expenses: carry(payload.office_expenses, existing_ref, |s| s.office_expenses),
        social_security: carry(payload.social_security, existing_ref, |s| s.social_security),
        cut_off_pay_amount: carry(payload.cut_off_pay_amount, existing_ref, |s| s.cut_off_pay_amount),
    };

    let net_salary = match payload.net_salary.or(payload.salary) {
        Some(net_salary) => net_salary,
        None => figures.net_salary()?,
    };
    let notes = payload.notes.take().or_else(|| existing_ref.and_then(|s| s.notes.clone()));
    let now = Local::now().fixed_offset();

    let mut model = salary::ActiveModel {
        updated_at: Set(now),
        user_id: Set(user.id),
        month: Set(period.month as i32),
        year: Set(period.year),
        base_salary: Set(figures.base_salary),
        ot_amount: Set(figures.ot_amount),
        ot_hours: Set(payload.ot_hours.unwrap_or(overtime.total_hours)),
        weekday_ot_hours: Set(overtime.weekday_ot_hours),
        weekday_ot_amount: Set(overtime.weekday_ot_amount),
        weekend_ot_hours: Set(overtime.weekend_ot_hours),
        weekend_ot_amount: Set(overtime.weekend_ot_amount),
        ot_details: Set(OtDetails(overtime.details)),
        bonus: Set(figures.bonus),
        commission: Set(figures.commission),
        fuel_costs: Set(figures.fuel_costs),
        money_not_spent_on_holidays: Set(figures.money_not_spent_on_holidays),
        other_income: Set(figures.other_income),
        office_expenses: Set(figures.office_expenses),
        social_security: Set(figures.social_security),
        cut_off_pay_days: Set(payload.cut_off_pay_days.unwrap_or(vacation.exceed_days)),
        cut_off_pay_amount: Set(figures.cut_off_pay_amount),
        working_days: Set(payload.working_days.unwrap_or_else(|| i32::try_from(working_days).unwrap_or_default())),
        day_off_days: Set(vacation.day_off_days),
        remaining_vacation_days: Set(vacation.remaining_vacation_days),
        used_vacation_days_this_year: Set(vacation.used_vacation_days_this_year),
        net_salary: Set(net_salary),
        notes: Set(notes),
        ..Default::default()
    };

    match existing {
        Some(existing) => {
            let salary = update_pending(db, existing.id, model).await?;
            info!(salary_id = %salary.id, user_id = %user.id, month = period.month, year = period.year, "salary recalculated");

            Ok((Upserted::Updated, salary, warnings))
        },
        None => {
            model.created_at = Set(now);
            model.created_by = Set(Some(session.id));
            model.status = Set(SalaryStatus::Pending);

            let salary = Salary::insert(model)
                .exec_with_returning(db).await
                .map_err(ApiError::from_insert)?;
            info!(salary_id = %salary.id, user_id = %user.id, month = period.month, year = period.year, "salary created");

            Ok((Upserted::Created, salary, warnings))
        },
    }
}

#[post("")]
async fn create_salary(db: web::Data<DatabaseConnection>, admin: Admin, payload: web::Json<CreateSalary>) -> Result<HttpResponse, ApiError> {
    let (upserted, salary, warnings) = upsert_salary(db.get_ref(), &admin, payload.into_inner()).await?;

    if !warnings.is_empty() {
        warn!(salary_id = %salary.id, ?warnings, "salary computed from degraded ledgers");
    }

    let (mut response, message) = match upserted {
        Upserted::Created => (HttpResponse::Created(), "Salary created successfully"),
        Upserted::Updated => (HttpResponse::Ok(), "Salary updated successfully"),
    };

    Ok(response.json(SalaryResponse { message: message.to_string(), salary, warnings }))
}

#[get("")]
async fn get_salaries(db: web::Data<DatabaseConnection>, _admin: Admin, query: web::Query<SalaryQuery>) -> Result<HttpResponse, ApiError> {
    let mut select = Salary::find();

    if let Some(month) = query.month {
        select = select.filter(salary::Column::Month.eq(month));
    }
    if let Some(year) = query.year {
        select = select.filter(salary::Column::Year.eq(year));
    }
    if let Some(status) = &query.status {
        let status = status.parse::<SalaryStatus>().map_err(ApiError::Validation)?;
        select = select.filter(salary::Column::Status.eq(status));
    }
    if let Some(user_id) = query.user_id {
        select = select.filter(salary::Column::UserId.eq(user_id));
    }

    let salaries = select
        .order_by_desc(salary::Column::Year)
        .order_by_desc(salary::Column::Month)
        .all(db.get_ref()).await?;

    let directory = Directory::load(db.get_ref(), salaries.iter().map(|s| s.user_id)).await?;
    let salaries = salaries.into_iter().map(|s| directory.project(s)).collect::<Vec<_>>();

    Ok(HttpResponse::Ok().json(SalaryListResponse {
        message: "Salaries retrieved successfully".to_string(),
        count: salaries.len(),
        salaries,
    }))
}

#[get("/summary")]
async fn get_salary_summary(db: web::Data<DatabaseConnection>, _admin: Admin, query: web::Query<SalaryQuery>) -> Result<HttpResponse, ApiError> {
    let mut select = Salary::find();

    if let Some(month) = query.month {
        select = select.filter(salary::Column::Month.eq(month));
    }
    if let Some(year) = query.year {
        select = select.filter(salary::Column::Year.eq(year));
    }
    if let Some(status) = &query.status {
        let status = status.parse::<SalaryStatus>().map_err(ApiError::Validation)?;
        select = select.filter(salary::Column::Status.eq(status));
    }

    let salaries = select.all(db.get_ref()).await?;

    Ok(HttpResponse::Ok().json(SummaryResponse {
        message: "Salary summary retrieved successfully".to_string(),
        summary: summarize(&salaries),
    }))
}

#[get("/prefill/{user_id}")]
async fn get_prefill_data(
    db: web::Data<DatabaseConnection>,
    _admin: Admin,
    user_id: web::Path<String>,
    query: web::Query<PeriodQuery>,
) -> Result<HttpResponse, ApiError> {
    let user_id = parse_id(&user_id, "user_id")?;
    let period = Period::resolve(query.month, query.year, Local::now().date_naive())?;

    let Some(user) = User::find_by_id(user_id).one(db.get_ref()).await? else {
        return Err(ApiError::NotFound("User"));
    };

    let directory = Directory::for_users(db.get_ref(), vec![user.clone()]).await?;
    let ledgers = payroll::collect(db.get_ref(), &user, period, None).await;
    let (calculated, warnings) = Calculated::new(user.salary, ledgers)?;

    let Some(employee) = directory.employee(user.id) else {
        return Err(ApiError::NotFound("User"));
    };

    Ok(HttpResponse::Ok().json(PrefillResponse {
        message: "Prefill data retrieved successfully".to_string(),
        data: PrefillData {
            user: employee,
            calculated,
            month: period.month,
            year: period.year,
        },
        warnings,
    }))
}

#[get("/ot-summary/{user_id}")]
async fn get_ot_summary(
    db: web::Data<DatabaseConnection>,
    session: Session,
    user_id: web::Path<String>,
    query: web::Query<PeriodQuery>,
) -> Result<HttpResponse, ApiError> {
    let user_id = parse_id(&user_id, "user_id")?;
    if !session.can_view(user_id) {
        return Err(ApiError::Forbidden("cannot view another employee's overtime"));
    }

    let period = Period::resolve(query.month, query.year, Local::now().date_naive())?;

    let manual = find_by_period(db.get_ref(), user_id, period).await?
        .map(|s| s.ot_details.0.into_iter().filter(|d| d.is_manual).collect::<Vec<_>>())
        .unwrap_or_default();

    let mut warnings = Vec::new();
    let overtime = match payroll::overtime::aggregate(db.get_ref(), user_id, period).await {
        Ok(overtime) => overtime,
        Err(err) => {
            warn!(user_id = %user_id, error = %err, "overtime summary degraded to stored entries");
            warnings.push(err.to_string());
            Default::default()
        },
    };

    Ok(HttpResponse::Ok().json(OtSummaryResponse {
        message: "OT summary retrieved successfully".to_string(),
        data: OtSummaryData {
            month: period.month,
            year: period.year,
            overtime: overtime.merge_manual(manual),
        },
        warnings,
    }))
}

#[get("/ot-by-type/{user_id}")]
async fn get_ot_by_type(
    db: web::Data<DatabaseConnection>,
    session: Session,
    user_id: web::Path<String>,
    query: web::Query<YearQuery>,
) -> Result<HttpResponse, ApiError> {
    let user_id = parse_id(&user_id, "user_id")?;
    if !session.can_view(user_id) {
        return Err(ApiError::Forbidden("cannot view another employee's overtime"));
    }

    let mut select = Salary::find().filter(salary::Column::UserId.eq(user_id));
    if let Some(year) = query.year {
        select = select.filter(salary::Column::Year.eq(year));
    }

    let salaries = select
        .order_by_asc(salary::Column::Year)
        .order_by_asc(salary::Column::Month)
        .all(db.get_ref()).await?;

    Ok(HttpResponse::Ok().json(OtByTypeResponse {
        message: "OT by type retrieved successfully".to_string(),
        data: group_by_type(salaries),
    }))
}

#[get("/{salary_id}")]
async fn get_salary(db: web::Data<DatabaseConnection>, session: Session, salary: salary::Model) -> Result<HttpResponse, ApiError> {
    if !session.can_view(salary.user_id) {
        return Err(ApiError::Forbidden("cannot view another employee's salary"));
    }

    let directory = Directory::load(db.get_ref(), [salary.user_id]).await?;

    Ok(HttpResponse::Ok().json(SalaryViewResponse {
        message: "Salary retrieved successfully".to_string(),
        salary: directory.project(salary),
    }))
}

#[put("/{salary_id}/status")]
async fn update_salary_status(
    db: web::Data<DatabaseConnection>,
    admin: Admin,
    salary: salary::Model,
    payload: web::Json<UpdateSalaryStatus>,
) -> Result<HttpResponse, ApiError> {
    let status = payload.status.parse::<SalaryStatus>().map_err(ApiError::Validation)?;

    if !salary.status.can_transition_to(status) {
        return Err(ApiError::InvalidTransition { from: salary.status, to: status });
    }

    let salary = if salary.status == status {
        salary
    } else {
        let updated = Salary::update(salary::ActiveModel {
            id: Unchanged(salary.id),
            updated_at: Set(Local::now().fixed_offset()),
            status: Set(status),
            ..Default::default()
        }).exec(db.get_ref()).await?;

        info!(salary_id = %updated.id, from = %salary.status, to = %status, by = %admin.id, "salary status changed");
        updated
    };

    Ok(HttpResponse::Ok().json(SalaryResponse {
        message: format!("Salary status updated to {status}"),
        salary,
        warnings: Vec::new(),
    }))
}

#[put("/{salary_id}")]
async fn update_salary(
    db: web::Data<DatabaseConnection>,
    _admin: Admin,
    salary: PendingSalary,
    payload: web::Json<UpdateSalary>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    payload.validate()?;

    let mut salary = salary.0;
    payload.apply(&mut salary);
    salary.net_salary = PayFigures::from(&salary).net_salary()?;

    let salary = update_pending(db.get_ref(), salary.id, salary::ActiveModel {
        updated_at: Set(Local::now().fixed_offset()),
        base_salary: Set(salary.base_salary),
        ot_amount: Set(salary.ot_amount),
        ot_hours: Set(salary.ot_hours),
        bonus: Set(salary.bonus),
        commission: Set(salary.commission),
        fuel_costs: Set(salary.fuel_costs),
        money_not_spent_on_holidays: Set(salary.money_not_spent_on_holidays),
        other_income: Set(salary.other_income),
        office_expenses: Set(salary.office_expenses),
        social_security: Set(salary.social_security),
        cut_off_pay_days: Set(salary.cut_off_pay_days),
        cut_off_pay_amount: Set(salary.cut_off_pay_amount),
        working_days: Set(salary.working_days),
        net_salary: Set(salary.net_salary),
        notes: Set(salary.notes),
        ..Default::default()
    }).await?;

    Ok(HttpResponse::Ok().json(SalaryResponse {
        message: "Salary updated successfully".to_string(),
        salary,
        warnings: Vec::new(),
    }))
}

#[delete("/{salary_id}")]
async fn delete_salary(db: web::Data<DatabaseConnection>, admin: Admin, salary: PendingSalary) -> Result<HttpResponse, ApiError> {
    let deleted = Salary::delete_many()
        .filter(salary::Column::Id.eq(salary.id))
        .filter(salary::Column::Status.eq(SalaryStatus::Pending))
        .exec(db.get_ref()).await?;

    if deleted.rows_affected == 0 {
        return Err(locked(db.get_ref(), salary.id).await);
    }

    info!(salary_id = %salary.id, by = %admin.id, "salary deleted");

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Salary deleted successfully".to_string(),
    }))
}
