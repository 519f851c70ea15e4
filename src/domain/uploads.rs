//! Records for user-uploaded assets (sample receipts and logos).

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Sample,
    Logo,
}

impl FileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Sample => "sample",
            FileKind::Logo => "logo",
        }
    }
}

impl TryFrom<&str> for FileKind {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "sample" => Ok(FileKind::Sample),
            "logo" => Ok(FileKind::Logo),
            _ => Err(()),
        }
    }
}

/// Audit row for a stored upload; the bytes themselves live in object storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredFileRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_url: String,
    pub kind: FileKind,
    pub created_at: OffsetDateTime,
}
