use sea_orm_migration::{prelude::{extension::postgres::TypeDropStatement, *}, sea_orm::{ActiveEnum, DbBackend, DeriveActiveEnum, EnumIter, Schema}};

use crate::util::{default_table_statement, reference};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(DbBackend::Postgres);

        manager.create_type(schema.create_enum_from_active_enum::<RoleType>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<EmployeeStatus>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<WorkRequestKind>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<WorkRequestStatus>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<DayOffType>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<DayOffStatus>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<SalaryStatus>()).await?;

        manager
            .create_table(default_table_statement()
                .table(Department::Table)
                .col(ColumnDef::new(Department::Name)
                    .text()
                    .unique_key()
                    .not_null())
                .take()
            ).await?;

        manager
            .create_table(default_table_statement()
                .table(Position::Table)
                .col(ColumnDef::new(Position::Name)
                    .text()
                    .unique_key()
                    .not_null())
                .take()
            ).await?;

        manager
            .create_table(default_table_statement()
                .table(User::Table)
                .col(ColumnDef::new(User::Username)
                    .text()
                    .unique_key()
                    .not_null())
                .col(ColumnDef::new(User::Password)
                    .binary()
                    .not_null()) // SHA-256 of `password:username`
                .col(ColumnDef::new(User::Role)
                    .custom(RoleType::name())
                    .not_null())
                .col(ColumnDef::new(User::Status)
                    .custom(EmployeeStatus::name())
                    .not_null()
                    .default(Expr::val("active").cast_as(EmployeeStatus::name())))
                .col(ColumnDef::new(User::Salary)
                    .big_integer()
                    .not_null()
                    .default(0))
                .col(ColumnDef::new(User::VacationDays)
                    .double()
                    .not_null()
                    .default(12.0))
                .col(ColumnDef::new(User::DepartmentId)
                    .uuid())
                .col(ColumnDef::new(User::PositionId)
                    .uuid())
                .take()
            ).await?;

        manager
            .create_foreign_key(reference(User::Table, User::DepartmentId, Department::Table)
                .on_delete(ForeignKeyAction::SetNull)
                .take()
            ).await?;
        manager
            .create_foreign_key(reference(User::Table, User::PositionId, Position::Table)
                .on_delete(ForeignKeyAction::SetNull)
                .take()
            ).await?;

        manager
            .create_table(default_table_statement()
                .table(WorkRequest::Table)
                .col(ColumnDef::new(WorkRequest::UserId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(WorkRequest::SupervisorId)
                    .uuid())
                .col(ColumnDef::new(WorkRequest::Date)
                    .date()
                    .not_null())
                .col(ColumnDef::new(WorkRequest::Title)
                    .custom(WorkRequestKind::name())
                    .not_null())
                .col(ColumnDef::new(WorkRequest::StartHour)
                    .time()
                    .not_null())
                .col(ColumnDef::new(WorkRequest::EndHour)
                    .time()
                    .not_null())
                .col(ColumnDef::new(WorkRequest::Fuel)
                    .big_integer())
                .col(ColumnDef::new(WorkRequest::Reason)
                    .text()
                    .not_null()
                    .default(""))
                .col(ColumnDef::new(WorkRequest::Status)
                    .custom(WorkRequestStatus::name())
                    .not_null())
                .check(Expr::col(WorkRequest::EndHour).gt(Expr::col(WorkRequest::StartHour)))
                .take()
            ).await?;

        manager
            .create_foreign_key(reference(WorkRequest::Table, WorkRequest::UserId, User::Table)
                .on_delete(ForeignKeyAction::Cascade)
                .take()
            ).await?;
        manager
            .create_foreign_key(reference(WorkRequest::Table, WorkRequest::SupervisorId, User::Table)
                .on_delete(ForeignKeyAction::SetNull)
                .take()
            ).await?;
        manager
            .create_index(Index::create()
                .name("idx_work_request_user_date")
                .table(WorkRequest::Table)
                .col(WorkRequest::UserId)
                .col(WorkRequest::Date)
                .take()
            ).await?;

        manager
            .create_table(default_table_statement()
                .table(DayOffRequest::Table)
                .col(ColumnDef::new(DayOffRequest::UserId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(DayOffRequest::SupervisorId)
                    .uuid())
                .col(ColumnDef::new(DayOffRequest::EmployeeId)
                    .uuid())
                .col(ColumnDef::new(DayOffRequest::DayOffType)
                    .custom(DayOffType::name())
                    .not_null())
                .col(ColumnDef::new(DayOffRequest::StartDateTime)
                    .timestamp_with_time_zone()
                    .not_null())
                .col(ColumnDef::new(DayOffRequest::EndDateTime)
                    .timestamp_with_time_zone()
                    .not_null())
                .col(ColumnDef::new(DayOffRequest::DateOffNumber)
                    .double()
                    .not_null())
                .col(ColumnDef::new(DayOffRequest::Title)
                    .text()
                    .not_null()
                    .default(""))
                .col(ColumnDef::new(DayOffRequest::Status)
                    .custom(DayOffStatus::name())
                    .not_null())
                .check(Expr::col(DayOffRequest::EndDateTime).gte(Expr::col(DayOffRequest::StartDateTime)))
                .take()
            ).await?;

        manager
            .create_foreign_key(reference(DayOffRequest::Table, DayOffRequest::UserId, User::Table)
                .on_delete(ForeignKeyAction::Cascade)
                .take()
            ).await?;
        manager
            .create_foreign_key(reference(DayOffRequest::Table, DayOffRequest::SupervisorId, User::Table)
                .on_delete(ForeignKeyAction::SetNull)
                .take()
            ).await?;
        manager
            .create_foreign_key(reference(DayOffRequest::Table, DayOffRequest::EmployeeId, User::Table)
                .on_delete(ForeignKeyAction::SetNull)
                .take()
            ).await?;
        manager
            .create_index(Index::create()
                .name("idx_day_off_request_user_start")
                .table(DayOffRequest::Table)
                .col(DayOffRequest::UserId)
                .col(DayOffRequest::StartDateTime)
                .take()
            ).await?;

        let money = |column: Salary| ColumnDef::new(column).big_integer().not_null().default(0).take();
        let amount = |column: Salary| ColumnDef::new(column).double().not_null().default(0.0).take();

        manager
            .create_table(default_table_statement()
                .table(Salary::Table)
                .col(ColumnDef::new(Salary::CreatedBy)
                    .uuid())
                .col(ColumnDef::new(Salary::UserId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(Salary::Month)
                    .integer()
                    .not_null())
                .col(ColumnDef::new(Salary::Year)
                    .integer()
                    .not_null())
                .col(money(Salary::BaseSalary))
                .col(money(Salary::OtAmount))
                .col(amount(Salary::OtHours))
                .col(ColumnDef::new(Salary::OtDetails)
                    .json_binary()
                    .not_null()
                    .default(Expr::cust("'[]'::jsonb")))
                .col(amount(Salary::WeekdayOtHours))
                .col(money(Salary::WeekdayOtAmount))
                .col(amount(Salary::WeekendOtHours))
                .col(money(Salary::WeekendOtAmount))
                .col(money(Salary::Bonus))
                .col(money(Salary::Commission))
                .col(money(Salary::FuelCosts))
                .col(money(Salary::MoneyNotSpentOnHolidays))
                .col(money(Salary::OtherIncome))
                .col(money(Salary::OfficeExpenses))
                .col(money(Salary::SocialSecurity))
                .col(amount(Salary::CutOffPayDays))
                .col(money(Salary::CutOffPayAmount))
                .col(ColumnDef::new(Salary::WorkingDays)
                    .integer()
                    .not_null()
                    .default(0))
                .col(amount(Salary::DayOffDays))
                .col(amount(Salary::RemainingVacationDays))
                .col(amount(Salary::UsedVacationDaysThisYear))
                .col(money(Salary::NetSalary))
                .col(ColumnDef::new(Salary::Status)
                    .custom(SalaryStatus::name())
                    .not_null()
                    .default(Expr::val("pending").cast_as(SalaryStatus::name())))
                .col(ColumnDef::new(Salary::Notes)
                    .text())
                .check(Expr::col(Salary::Month).between(1, 12))
                .take()
            ).await?;

        manager
            .create_foreign_key(reference(Salary::Table, Salary::UserId, User::Table)
                .on_delete(ForeignKeyAction::Cascade)
                .take()
            ).await?;
        manager
            .create_foreign_key(reference(Salary::Table, Salary::CreatedBy, User::Table)
                .on_delete(ForeignKeyAction::SetNull)
                .take()
            ).await?;

        // One salary per employee and month, concurrent upserts race on this
        manager
            .create_index(Index::create()
                .name("idx_salary_period")
                .table(Salary::Table)
                .col(Salary::UserId)
                .col(Salary::Month)
                .col(Salary::Year)
                .unique()
                .take()
            ).await?;

        manager
            .create_table(default_table_statement()
                .table(VacationAdjustment::Table)
                .col(ColumnDef::new(VacationAdjustment::CreatedBy)
                    .uuid())
                .col(ColumnDef::new(VacationAdjustment::UserId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(VacationAdjustment::Days)
                    .double()
                    .not_null())
                .col(ColumnDef::new(VacationAdjustment::PreviousBalance)
                    .double()
                    .not_null())
                .col(ColumnDef::new(VacationAdjustment::NewBalance)
                    .double()
                    .not_null())
                .col(ColumnDef::new(VacationAdjustment::Reason)
                    .text()
                    .not_null()
                    .default(""))
                .take()
            ).await?;

        manager
            .create_foreign_key(reference(VacationAdjustment::Table, VacationAdjustment::UserId, User::Table)
                .on_delete(ForeignKeyAction::Cascade)
                .take()
            ).await?;
        manager
            .create_foreign_key(reference(VacationAdjustment::Table, VacationAdjustment::CreatedBy, User::Table)
                .on_delete(ForeignKeyAction::SetNull)
                .take()
            ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            VacationAdjustment::Table.into_table_ref(),
            Salary::Table.into_table_ref(),
            DayOffRequest::Table.into_table_ref(),
            WorkRequest::Table.into_table_ref(),
            User::Table.into_table_ref(),
            Position::Table.into_table_ref(),
            Department::Table.into_table_ref(),
        ] {
            manager
                .drop_table(TableDropStatement::new()
                    .table(table)
                    .if_exists()
                    .take()
                ).await?;
        }

        for name in [
            SalaryStatus::name(),
            DayOffStatus::name(),
            DayOffType::name(),
            WorkRequestStatus::name(),
            WorkRequestKind::name(),
            EmployeeStatus::name(),
            RoleType::name(),
        ] {
            manager
                .drop_type(TypeDropStatement::new()
                    .name(name)
                    .if_exists()
                    .to_owned()
                ).await?;
        }

        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum Department {
    Table,
    Name,
}

#[derive(DeriveIden)]
pub(crate) enum Position {
    Table,
    Name,
}

#[derive(DeriveIden)]
pub(crate) enum User {
    Table,
    Username,
    Password,
    Role,
    Status,
    Salary,
    VacationDays,
    DepartmentId,
    PositionId,
}

#[derive(DeriveIden)]
enum WorkRequest {
    Table,
    UserId,
    SupervisorId,
    Date,
    Title,
    StartHour,
    EndHour,
    Fuel,
    Reason,
    Status,
}

#[derive(DeriveIden)]
enum DayOffRequest {
    Table,
    UserId,
    SupervisorId,
    EmployeeId,
    DayOffType,
    StartDateTime,
    EndDateTime,
    DateOffNumber,
    Title,
    Status,
}

#[derive(DeriveIden)]
enum Salary {
    Table,
    CreatedBy,
    UserId,
    Month,
    Year,
    BaseSalary,
    OtAmount,
    OtHours,
    OtDetails,
    WeekdayOtHours,
    WeekdayOtAmount,
    WeekendOtHours,
    WeekendOtAmount,
    Bonus,
    Commission,
    FuelCosts,
    MoneyNotSpentOnHolidays,
    OtherIncome,
    OfficeExpenses,
    SocialSecurity,
    CutOffPayDays,
    CutOffPayAmount,
    WorkingDays,
    DayOffDays,
    RemainingVacationDays,
    UsedVacationDaysThisYear,
    NetSalary,
    Status,
    Notes,
}

#[derive(DeriveIden)]
enum VacationAdjustment {
    Table,
    CreatedBy,
    UserId,
    Days,
    PreviousBalance,
    NewBalance,
    Reason,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "role_type")]
enum RoleType {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "supervisor")]
    Supervisor,
    #[sea_orm(string_value = "employee")]
    Employee,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "employee_status")]
enum EmployeeStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
    #[sea_orm(string_value = "on_leave")]
    OnLeave,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "work_request_kind")]
enum WorkRequestKind {
    #[sea_orm(string_value = "ot")]
    Ot,
    #[sea_orm(string_value = "field_work")]
    FieldWork,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "work_request_status")]
enum WorkRequestStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "accept")]
    Accept,
    #[sea_orm(string_value = "reject")]
    Reject,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "day_off_type")]
enum DayOffType {
    #[sea_orm(string_value = "full_day")]
    FullDay,
    #[sea_orm(string_value = "half_day")]
    HalfDay,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "day_off_status")]
enum DayOffStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "salary_status")]
enum SalaryStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}
