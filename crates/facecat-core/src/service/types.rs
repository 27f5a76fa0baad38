//! Service payload shapes, limited to the fields facecat reads.

use serde::{Deserialize, Serialize};

pub type PersonId = String;
pub type PersistedFaceId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FaceRectangle {
    pub top: u32,
    pub left: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedFace {
    #[serde(default)]
    pub face_id: Option<String>,
    pub face_rectangle: FaceRectangle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub person_id: PersonId,
    pub name: String,
    #[serde(default)]
    pub user_data: Option<String>,
    #[serde(default)]
    pub persisted_face_ids: Vec<PersistedFaceId>,
}

/// A large person group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonGroup {
    pub large_person_group_id: String,
    pub name: String,
    #[serde(default)]
    pub user_data: Option<String>,
}

/// Group training state as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingState {
    NotStarted,
    Running,
    Succeeded,
    Failed,
}

impl TrainingState {
    /// True once training will not change state without a new train request.
    pub fn is_finished(self) -> bool {
        matches!(self, TrainingState::Succeeded | TrainingState::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingStatus {
    pub status: TrainingState,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub person_id: PersonId,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyResult {
    pub face_id: String,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}
