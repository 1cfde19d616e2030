use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "note_visibility", rename_all = "lowercase")]
pub enum NoteVisibility {
    Internal,
    Shared,
}

/// Staff annotation on an application.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationNote {
    pub id: Uuid,
    pub application_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub visibility: NoteVisibility,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNote {
    pub application_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub visibility: NoteVisibility,
}
