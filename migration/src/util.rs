use sea_orm_migration::prelude::*;

/// `id`, `created_at` and `updated_at`, shared by every table
pub(crate) fn default_table_statement() -> TableCreateStatement {
    TableCreateStatement::new()
        .if_not_exists()
        .col(ColumnDef::new(DefaultColumn::Id)
            .uuid()
            .primary_key()
            .default(Expr::cust("GEN_RANDOM_UUID()"))
            .take())
        .col(ColumnDef::new(DefaultColumn::CreatedAt)
            .timestamp_with_time_zone()
            .not_null()
            .default(Expr::current_timestamp())
            .take())
        .col(ColumnDef::new(DefaultColumn::UpdatedAt)
            .timestamp_with_time_zone()
            .not_null()
            .default(Expr::current_timestamp())
            .take())
        .take()
}

#[derive(DeriveIden)]
pub(crate) enum DefaultColumn {
    Id,
    CreatedAt,
    UpdatedAt,
}

/// Foreign key from `table.column` to another table's `id`
///
/// # Example
///
/// ```rs
/// manager
///     .create_foreign_key(reference(WorkRequest::Table, WorkRequest::UserId, User::Table)
///         .on_delete(ForeignKeyAction::Cascade)
///         .take()
///     ).await?;
/// ```
pub(crate) fn reference<T, C, R>(table: T, column: C, target: R) -> ForeignKeyCreateStatement
where
    T: IntoTableRef,
    C: IntoIden,
    R: IntoTableRef,
{
    ForeignKeyCreateStatement::new()
        .from(table, column)
        .to(target, DefaultColumn::Id)
        .on_update(ForeignKeyAction::Cascade)
        .take()
}

/// Builds `"{password}:{username}"` hashed the way the login handler expects
pub(crate) fn hash_password(username: &str, password: &str) -> Vec<u8> {
    use sha2::Digest as _;

    sha2::Sha256::digest(format!("{password}:{username}")).to_vec()
}

/// Deterministic ids for seeded rows, so `down` can find them again
pub(crate) fn seed_id(namespace: u128, index: u128) -> String {
    format!("{:032x}", (namespace << 64) | index)
}
