//! Formations (training programmes).

use chrono::NaiveDate;
use diesel_async::AsyncPgConnection;
use serde::Deserialize;

use campus_db::db::query::formation as formation_query;
use campus_db::model::formation::{Formation, FormationChangeset, NewFormation};

use crate::error::{ServiceError, ServiceResult};
use crate::patch::{double_option, optional_text, required_text};

const NAME_TAKEN: &str = "Une formation porte déjà ce nom";

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFormation {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFormation {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<NaiveDate>>,
}

/// ## Summary
/// Rejects a period ending before it starts.
///
/// ## Errors
/// Returns `ValidationError` if both dates are set and `end < start`.
pub fn validate_period(start: Option<NaiveDate>, end: Option<NaiveDate>) -> ServiceResult<()> {
    if matches!((start, end), (Some(start), Some(end)) if end < start) {
        return Err(ServiceError::ValidationError(
            "La date de fin précède la date de début".to_string(),
        ));
    }
    Ok(())
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn list(conn: &mut AsyncPgConnection) -> ServiceResult<Vec<Formation>> {
    Ok(formation_query::list_formations(conn).await?)
}

/// ## Errors
/// Returns `NotFound` if the formation does not exist.
pub async fn get(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> ServiceResult<Formation> {
    formation_query::get_formation(conn, id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("formation {id}")))
}

/// ## Errors
/// - `ValidationError` for a blank name or an inverted period.
/// - `Conflict` if the name is taken.
#[tracing::instrument(skip(conn, request))]
pub async fn create(
    conn: &mut AsyncPgConnection,
    request: &CreateFormation,
) -> ServiceResult<Formation> {
    let name = required_text(&request.name, "nom")?;
    let description = optional_text(request.description.as_deref());
    validate_period(request.start_date, request.end_date)?;

    let formation = formation_query::create_formation(
        conn,
        &NewFormation {
            id: uuid::Uuid::now_v7(),
            name: &name,
            description: description.as_deref(),
            start_date: request.start_date,
            end_date: request.end_date,
        },
    )
    .await
    .map_err(|e| ServiceError::from(e).conflict_on_unique(NAME_TAKEN))?;

    tracing::info!(formation_id = %formation.id, "Formation created");
    Ok(formation)
}

/// ## Errors
/// - `NotFound` if the formation does not exist.
/// - `ValidationError` for a blank name or an inverted period.
/// - `Conflict` if the new name is taken.
#[tracing::instrument(skip(conn, request))]
pub async fn update(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
    request: &UpdateFormation,
) -> ServiceResult<Formation> {
    let existing = get(conn, id).await?;
    validate_period(
        request.start_date.unwrap_or(existing.start_date),
        request.end_date.unwrap_or(existing.end_date),
    )?;

    let changes = FormationChangeset {
        name: request
            .name
            .as_deref()
            .map(|v| required_text(v, "nom"))
            .transpose()?,
        description: request
            .description
            .as_ref()
            .map(|d| optional_text(d.as_deref())),
        start_date: request.start_date,
        end_date: request.end_date,
        updated_at: Some(chrono::Utc::now()),
    };

    formation_query::update_formation(conn, id, &changes)
        .await
        .map_err(|e| ServiceError::from(e).conflict_on_unique(NAME_TAKEN))?
        .ok_or_else(|| ServiceError::NotFound(format!("formation {id}")))
}

/// ## Errors
/// Returns `NotFound` if the formation does not exist.
#[tracing::instrument(skip(conn))]
pub async fn delete(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> ServiceResult<()> {
    if formation_query::delete_formation(conn, id).await? == 0 {
        return Err(ServiceError::NotFound(format!("formation {id}")));
    }
    tracing::info!(formation_id = %id, "Formation deleted");
    Ok(())
}
