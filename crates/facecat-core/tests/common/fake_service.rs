//! In-memory face service for integration tests.
//!
//! Behaviour is driven by image content:
//! - `faces:N` detects N faces
//! - `multi` is rejected by add-face with "more than 1 face"
//! - `conflict-once` fails the first call with ConcurrentOperationConflict
//! - `throttle-once` fails the first call with RateLimitExceeded
//! - `broken` fails every call with a non-retryable error

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use facecat_core::remote::{ErrorCode, RemoteError};
use facecat_core::service::{
    DetectedFace, FaceRectangle, FaceService, IdentifyResult, PersistedFaceId, Person, PersonGroup,
    PersonId, TrainingState, TrainingStatus,
};

#[derive(Default)]
pub struct FakeFaceService {
    calls: Mutex<HashMap<Vec<u8>, usize>>,
    in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
    pub create_person_failures: AtomicUsize,
    pub train_calls: AtomicUsize,
    /// Responses for successive training status polls; the last one repeats.
    pub training_script: Mutex<VecDeque<Result<TrainingState, RemoteError>>>,
    groups: Mutex<HashSet<String>>,
    /// (group, person) pairs.
    persons: Mutex<Vec<(String, Person)>>,
    next_person: AtomicUsize,
}

impl FakeFaceService {
    /// A service that already has `groups`.
    pub fn with_groups(groups: &[&str]) -> Self {
        let fake = Self::default();
        fake.groups
            .lock()
            .unwrap()
            .extend(groups.iter().map(|g| g.to_string()));
        fake
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.groups.lock().unwrap().contains(group)
    }

    fn group_missing(&self, group: &str) -> Option<RemoteError> {
        (!self.has_group(group)).then(|| {
            RemoteError::new(
                ErrorCode::LargePersonGroupNotFound,
                format!("Large person group {} is not found.", group),
            )
        })
    }

    pub fn calls_for(&self, image: &[u8]) -> usize {
        self.calls.lock().unwrap().get(image).copied().unwrap_or(0)
    }

    fn begin(&self, image: &[u8]) -> usize {
        let n = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(n, Ordering::SeqCst);
        let mut calls = self.calls.lock().unwrap();
        let c = calls.entry(image.to_vec()).or_default();
        *c += 1;
        *c
    }

    fn end(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn scripted_failure(image: &[u8], call: usize) -> Option<RemoteError> {
        match image {
            b"conflict-once" if call == 1 => Some(RemoteError::new(
                ErrorCode::ConcurrentOperationConflict,
                "There is a conflict operation on resource",
            )),
            b"throttle-once" if call == 1 => Some(RemoteError::new(
                ErrorCode::RateLimitExceeded,
                "Rate limit is exceeded.",
            )),
            b"broken" => Some(RemoteError::new(
                ErrorCode::Other("BadArgument".into()),
                "Invalid image format",
            )),
            _ => None,
        }
    }

    fn face(i: usize) -> DetectedFace {
        DetectedFace {
            face_id: Some(format!("face-{}", i)),
            face_rectangle: FaceRectangle {
                top: 10,
                left: 10 + i as u32 * 50,
                width: 40,
                height: 40,
            },
        }
    }
}

#[async_trait]
impl FaceService for FakeFaceService {
    async fn detect_faces(&self, image: Vec<u8>) -> Result<Vec<DetectedFace>, RemoteError> {
        let call = self.begin(&image);
        tokio::task::yield_now().await;
        self.end();
        if let Some(e) = Self::scripted_failure(&image, call) {
            return Err(e);
        }
        let count = std::str::from_utf8(&image)
            .ok()
            .and_then(|s| s.strip_prefix("faces:"))
            .and_then(|n| n.trim().parse::<usize>().ok())
            .unwrap_or(1);
        Ok((0..count).map(Self::face).collect())
    }

    async fn create_group(
        &self,
        group: &str,
        _name: &str,
        _user_data: Option<&str>,
    ) -> Result<(), RemoteError> {
        if !self.groups.lock().unwrap().insert(group.to_string()) {
            return Err(RemoteError::new(
                ErrorCode::Other("LargePersonGroupExists".into()),
                "Large person group already exists.",
            ));
        }
        Ok(())
    }

    async fn list_groups(&self) -> Result<Vec<PersonGroup>, RemoteError> {
        let mut ids: Vec<String> = self.groups.lock().unwrap().iter().cloned().collect();
        ids.sort();
        Ok(ids
            .into_iter()
            .map(|id| PersonGroup {
                name: id.clone(),
                large_person_group_id: id,
                user_data: None,
            })
            .collect())
    }

    async fn delete_group(&self, group: &str) -> Result<(), RemoteError> {
        if let Some(e) = self.group_missing(group) {
            return Err(e);
        }
        self.groups.lock().unwrap().remove(group);
        self.persons.lock().unwrap().retain(|(g, _)| g != group);
        Ok(())
    }

    async fn create_person(
        &self,
        group: &str,
        name: &str,
        user_data: Option<&str>,
    ) -> Result<PersonId, RemoteError> {
        if self
            .create_person_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(RemoteError::new(ErrorCode::RateLimitExceeded, "Rate limit is exceeded."));
        }
        if let Some(e) = self.group_missing(group) {
            return Err(e);
        }
        let id = format!("person-{}", self.next_person.fetch_add(1, Ordering::SeqCst) + 1);
        self.persons.lock().unwrap().push((
            group.to_string(),
            Person {
                person_id: id.clone(),
                name: name.to_string(),
                user_data: user_data.map(str::to_string),
                persisted_face_ids: Vec::new(),
            },
        ));
        Ok(id)
    }

    async fn add_person_face(
        &self,
        _group: &str,
        person: &str,
        image: Vec<u8>,
        _user_data: Option<&str>,
    ) -> Result<PersistedFaceId, RemoteError> {
        let call = self.begin(&image);
        tokio::task::yield_now().await;
        self.end();
        if let Some(e) = Self::scripted_failure(&image, call) {
            return Err(e);
        }
        if image == b"multi" {
            return Err(RemoteError::new(
                ErrorCode::InvalidImage,
                "There are more than 1 face in the image.",
            ));
        }
        let mut persons = self.persons.lock().unwrap();
        let Some((_, p)) = persons.iter_mut().find(|(_, p)| p.person_id == person) else {
            return Err(RemoteError::new(ErrorCode::PersonNotFound, "Person is not found."));
        };
        let id = format!("{}-face-{}", person, p.persisted_face_ids.len() + 1);
        p.persisted_face_ids.push(id.clone());
        Ok(id)
    }

    async fn list_persons(&self, group: &str) -> Result<Vec<Person>, RemoteError> {
        if let Some(e) = self.group_missing(group) {
            return Err(e);
        }
        Ok(self
            .persons
            .lock()
            .unwrap()
            .iter()
            .filter(|(g, _)| g == group)
            .map(|(_, p)| p.clone())
            .collect())
    }

    async fn delete_person(&self, group: &str, person: &str) -> Result<(), RemoteError> {
        let mut persons = self.persons.lock().unwrap();
        let before = persons.len();
        persons.retain(|(g, p)| !(g == group && p.person_id == person));
        if persons.len() == before {
            return Err(RemoteError::new(ErrorCode::PersonNotFound, "Person is not found."));
        }
        Ok(())
    }

    async fn train_group(&self, _group: &str) -> Result<(), RemoteError> {
        let n = self.train_calls.fetch_add(1, Ordering::SeqCst);
        if n == 0 {
            return Err(RemoteError::new(
                ErrorCode::ConcurrentOperationConflict,
                "There is a conflict operation on resource",
            ));
        }
        Ok(())
    }

    async fn training_status(&self, _group: &str) -> Result<TrainingStatus, RemoteError> {
        let mut script = self.training_script.lock().unwrap();
        let next = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };
        match next.unwrap_or(Ok(TrainingState::Succeeded)) {
            Ok(status) => Ok(TrainingStatus {
                status,
                message: None,
            }),
            Err(e) => Err(e),
        }
    }

    async fn identify(
        &self,
        _group: &str,
        face_ids: &[String],
        _max_candidates: u32,
    ) -> Result<Vec<IdentifyResult>, RemoteError> {
        Ok(face_ids
            .iter()
            .map(|f| IdentifyResult {
                face_id: f.clone(),
                candidates: Vec::new(),
            })
            .collect())
    }
}
