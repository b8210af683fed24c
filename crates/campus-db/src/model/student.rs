use diesel::{pg::Pg, prelude::*};
use serde::Serialize;

use crate::db::schema;
use crate::model::user::User;

#[derive(
    Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable, Associations, Serialize,
)]
#[diesel(table_name = schema::student_profile)]
#[diesel(check_for_backend(Pg))]
#[diesel(primary_key(user_id))]
#[diesel(belongs_to(User, foreign_key = user_id))]
pub struct StudentProfile {
    pub user_id: uuid::Uuid,
    pub formation_id: Option<uuid::Uuid>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub birth_date: Option<chrono::NaiveDate>,
    pub emergency_contact: Option<String>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::student_profile)]
pub struct NewStudentProfile {
    pub user_id: uuid::Uuid,
    pub formation_id: Option<uuid::Uuid>,
}

/// Contact fields a student may edit on their own profile, plus the
/// enrolment an administrator may change.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = schema::student_profile)]
pub struct StudentProfileChangeset {
    pub formation_id: Option<Option<uuid::Uuid>>,
    pub phone: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub birth_date: Option<Option<chrono::NaiveDate>>,
    pub emergency_contact: Option<Option<String>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Account joined with its student profile.
#[derive(Debug, Clone, Serialize)]
pub struct Student {
    #[serde(flatten)]
    pub user: User,
    pub profile: StudentProfile,
}
