use academy_core::model::{User, UserId};

use super::SqliteRepository;
use super::mapping::{db_err, id_i64, id_u64, map_user_row};
use crate::repository::{NewUserRecord, StorageError, UserRecord, UserRepository};

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, password_hash, date_joined";

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn insert_user(&self, user: NewUserRecord) -> Result<User, StorageError> {
        let id = sqlx::query(
            r"
            INSERT INTO users (username, email, first_name, last_name, password_hash, date_joined)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(user.username.as_str())
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .bind(user.date_joined)
        .execute(&self.pool)
        .await
        .map_err(db_err)?
        .last_insert_rowid();

        Ok(User {
            id: UserId::new(id_u64("user_id", id)?),
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            date_joined: user.date_joined,
        })
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StorageError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(map_user_row).transpose()
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))
            .bind(id_i64("user_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.as_ref().map(map_user_row).transpose()?.map(|record| record.user))
    }
}
