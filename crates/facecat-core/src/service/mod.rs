//! Face-recognition service port and its HTTP adapter.
//!
//! The retry executor and dispatcher are generic over operations; call sites
//! in `scan` and `training` talk to the service only through [`FaceService`].

mod http;
mod types;

pub use http::HttpFaceClient;
pub use types::{
    Candidate, DetectedFace, FaceRectangle, IdentifyResult, PersistedFaceId, Person, PersonGroup,
    PersonId, TrainingState, TrainingStatus,
};

use async_trait::async_trait;

use crate::remote::RemoteError;

/// Default API root for the hosted service.
pub const DEFAULT_API_ROOT: &str = "https://westus.api.cognitive.microsoft.com/face/v1.0";

/// Operations of the remote face service used by facecat.
///
/// Every method fails with a [`RemoteError`] whose `code` is stable, which
/// is all the retry and dispatch layers rely on.
#[async_trait]
pub trait FaceService: Send + Sync {
    /// Detect faces in an image.
    async fn detect_faces(&self, image: Vec<u8>) -> Result<Vec<DetectedFace>, RemoteError>;

    /// Create a large person group. Fails with a conflict-style error if it exists.
    async fn create_group(
        &self,
        group: &str,
        name: &str,
        user_data: Option<&str>,
    ) -> Result<(), RemoteError>;

    async fn list_groups(&self) -> Result<Vec<PersonGroup>, RemoteError>;

    /// Delete a group with all its persons and faces.
    async fn delete_group(&self, group: &str) -> Result<(), RemoteError>;

    async fn create_person(
        &self,
        group: &str,
        name: &str,
        user_data: Option<&str>,
    ) -> Result<PersonId, RemoteError>;

    /// Add a face image to a person. Fails if the image has more than one face.
    async fn add_person_face(
        &self,
        group: &str,
        person: &str,
        image: Vec<u8>,
        user_data: Option<&str>,
    ) -> Result<PersistedFaceId, RemoteError>;

    async fn list_persons(&self, group: &str) -> Result<Vec<Person>, RemoteError>;

    async fn delete_person(&self, group: &str, person: &str) -> Result<(), RemoteError>;

    /// Start training a group. Returns once the service accepted the request.
    async fn train_group(&self, group: &str) -> Result<(), RemoteError>;

    async fn training_status(&self, group: &str) -> Result<TrainingStatus, RemoteError>;

    async fn identify(
        &self,
        group: &str,
        face_ids: &[String],
        max_candidates: u32,
    ) -> Result<Vec<IdentifyResult>, RemoteError>;
}
