//! Types stored in the catalogue.

/// Scan result for one file, stored as a string in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// Detection succeeded (possibly with zero faces).
    Scanned,
    /// The service could not process the image.
    Unprocessable,
    /// Dropped after an error; eligible for a rescan.
    Failed,
}

impl FileState {
    pub fn as_str(self) -> &'static str {
        match self {
            FileState::Scanned => "scanned",
            FileState::Unprocessable => "unprocessable",
            FileState::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "scanned" => FileState::Scanned,
            "unprocessable" => FileState::Unprocessable,
            _ => FileState::Failed,
        }
    }
}

/// One catalogued picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: String,
    pub group_id: String,
    pub face_count: u32,
    pub state: FileState,
    /// Error text for unprocessable/failed files.
    pub note: Option<String>,
    pub scanned_at: i64,
}

impl FileRecord {
    pub fn new(path: impl Into<String>, group_id: impl Into<String>, state: FileState) -> Self {
        Self {
            path: path.into(),
            group_id: group_id.into(),
            face_count: 0,
            state,
            note: None,
            scanned_at: 0,
        }
    }

    pub fn with_faces(mut self, face_count: u32) -> Self {
        self.face_count = face_count;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
