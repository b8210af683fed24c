use diesel::{pg::Pg, prelude::*};

use crate::db::schema;

#[derive(Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable, Associations)]
#[diesel(table_name = schema::session)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(crate::model::user::User, foreign_key = user_id))]
pub struct Session {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub token_hash: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::session)]
pub struct NewSession<'a> {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub token_hash: &'a str,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}
