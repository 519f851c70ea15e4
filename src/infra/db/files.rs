use async_trait::async_trait;

use crate::{
    application::repos::{FilesRepo, RepoError},
    domain::uploads::StoredFileRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[async_trait]
impl FilesRepo for PostgresRepositories {
    async fn insert_file(&self, record: StoredFileRecord) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO files (id, user_id, file_url, kind, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(record.file_url)
        .bind(record.kind.as_str())
        .bind(record.created_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}
