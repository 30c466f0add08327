use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{ContactsRepo, RepoError};
use crate::domain::contact::NewContactMessage;
use crate::domain::entities::ContactMessageRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct ContactMessageRow {
    id: Uuid,
    name: String,
    email: String,
    phone: Option<String>,
    description: String,
    created_at: OffsetDateTime,
}

impl From<ContactMessageRow> for ContactMessageRecord {
    fn from(row: ContactMessageRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ContactsRepo for PostgresRepositories {
    async fn create_contact_message(
        &self,
        message: NewContactMessage,
    ) -> Result<ContactMessageRecord, RepoError> {
        let NewContactMessage {
            name,
            email,
            phone,
            description,
        } = message;

        let row = sqlx::query_as::<_, ContactMessageRow>(
            r#"
            INSERT INTO contact_messages (id, name, email, phone, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, email, phone, description, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(description)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(ContactMessageRecord::from(row))
    }
}
