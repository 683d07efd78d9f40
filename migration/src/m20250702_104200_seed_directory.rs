use sea_orm_migration::prelude::*;

use crate::{
    m20250701_091500_init::{Department, Position, User},
    util::{hash_password, seed_id, DefaultColumn},
};

const DEPARTMENT: u128 = 1;
const POSITION: u128 = 2;
const USER: u128 = 3;

const DEPARTMENTS: [&str; 3] = ["Engineering", "Finance", "Operations"];
const POSITIONS: [&str; 3] = ["Staff", "Senior Staff", "Lead"];

const EMPLOYEES: u128 = 30;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let uuid = |namespace, index| Expr::val(seed_id(namespace, index)).cast_as("uuid");

        for (index, name) in (1..).zip(DEPARTMENTS) {
            manager
                .exec_stmt(Query::insert()
                    .into_table(Department::Table)
                    .columns([DefaultColumn::Id.into_iden(), Department::Name.into_iden()])
                    .values_panic([uuid(DEPARTMENT, index), name.into()])
                    .to_owned()
                ).await?;
        }

        for (index, name) in (1..).zip(POSITIONS) {
            manager
                .exec_stmt(Query::insert()
                    .into_table(Position::Table)
                    .columns([DefaultColumn::Id.into_iden(), Position::Name.into_iden()])
                    .values_panic([uuid(POSITION, index), name.into()])
                    .to_owned()
                ).await?;
        }

        let columns = [
            DefaultColumn::Id.into_iden(),
            User::Username.into_iden(),
            User::Password.into_iden(),
            User::Role.into_iden(),
            User::Salary.into_iden(),
            User::VacationDays.into_iden(),
            User::DepartmentId.into_iden(),
            User::PositionId.into_iden(),
        ];

        // Password equals the username for every seeded account
        let mut accounts = vec![
            ("admin".to_string(), "admin", 0_i64, 0_u128, 0_u128),
            ("supervisor".to_string(), "supervisor", 15_000_000, 1, 3),
        ];
        for i in 1..=EMPLOYEES {
            let salary = rand::random_range(5_000_000..=20_000_000);

            accounts.push((format!("employee{i}"), "employee", salary, i % 3 + 1, i % 2 + 1));
        }

        for (index, (username, role, salary, department, position)) in (1..).zip(accounts) {
            let department = match department {
                0 => Expr::val(Option::<String>::None).cast_as("uuid"),
                d => uuid(DEPARTMENT, d),
            };
            let position = match position {
                0 => Expr::val(Option::<String>::None).cast_as("uuid"),
                p => uuid(POSITION, p),
            };

            manager
                .exec_stmt(Query::insert()
                    .into_table(User::Table)
                    .columns(columns.clone())
                    .values_panic([
                        uuid(USER, index),
                        username.as_str().into(),
                        hash_password(&username, &username).into(),
                        Expr::val(role).cast_as("role_type"),
                        salary.into(),
                        12.0.into(),
                        department,
                        position,
                    ])
                    .to_owned()
                ).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let seeded = |namespace: u128, count: u128| (1..=count)
            .map(|index| Expr::val(seed_id(namespace, index)).cast_as("uuid"))
            .collect::<Vec<_>>();

        manager
            .exec_stmt(Query::delete()
                .from_table(User::Table)
                .and_where(Expr::col(DefaultColumn::Id).is_in(seeded(USER, EMPLOYEES + 2)))
                .to_owned()
            ).await?;

        manager
            .exec_stmt(Query::delete()
                .from_table(Position::Table)
                .and_where(Expr::col(DefaultColumn::Id).is_in(seeded(POSITION, POSITIONS.len() as u128)))
                .to_owned()
            ).await?;

        manager
            .exec_stmt(Query::delete()
                .from_table(Department::Table)
                .and_where(Expr::col(DefaultColumn::Id).is_in(seeded(DEPARTMENT, DEPARTMENTS.len() as u128)))
                .to_owned()
            ).await?;

        Ok(())
    }
}
