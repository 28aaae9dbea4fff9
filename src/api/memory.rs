//! In-process students store.
//!
//! Behaves like a small json-server: ids are assigned from a counter and never
//! reused, listings are 1-indexed pages with a total count, and an email that
//! is already taken is rejected with a validation error. Every call is recorded
//! so callers can check exactly which requests were made.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use super::{ApiError, FieldErrors, StudentService};
use crate::model::{Page, Student, StudentDraft, StudentId};

/// A request received by [`MemoryStudentService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    List { page: u32, limit: u32 },
    Get(StudentId),
    Create(StudentDraft),
    Update(StudentId, Student),
    Delete(StudentId),
}

#[derive(Debug, Default)]
struct Store {
    students: BTreeMap<StudentId, Student>,
    next_id: StudentId,
    requests: Vec<Request>,
    failures: VecDeque<ApiError>,
}

impl Store {
    fn email_taken(&self, email: &str, except: Option<StudentId>) -> bool {
        !email.is_empty()
            && self
                .students
                .values()
                .any(|s| s.email == email && Some(s.id) != except)
    }
}

fn email_taken() -> ApiError {
    ApiError::Validation(FieldErrors {
        email: Some("Email already exists".to_string()),
        ..FieldErrors::default()
    })
}

/// [`StudentService`] backed by memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStudentService {
    store: Arc<Mutex<Store>>,
    latency: Duration,
}

impl MemoryStudentService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `students`; new ids continue after the largest one.
    #[must_use]
    pub fn with_students(students: impl IntoIterator<Item = Student>) -> Self {
        let service = Self::new();
        {
            let mut store = service.lock();
            for student in students {
                store.next_id = store.next_id.max(student.id);
                store.students.insert(student.id, student);
            }
        }
        service
    }

    /// Delays every response by `latency`.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Makes the next request fail with `error` instead of touching the store.
    pub fn fail_next(&self, error: ApiError) {
        self.lock().failures.push_back(error);
    }

    /// All requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<Request> {
        self.lock().requests.clone()
    }

    /// Current contents, ordered by id.
    #[must_use]
    pub fn students(&self) -> Vec<Student> {
        self.lock().students.values().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records `request`, waits for the configured latency, then runs `op`
    /// unless a scripted failure is pending.
    fn call<T, F>(&self, request: Request, op: F) -> BoxFuture<'static, Result<T, ApiError>>
    where
        T: Send + 'static,
        F: FnOnce(&mut Store) -> Result<T, ApiError> + Send + 'static,
    {
        self.lock().requests.push(request);
        let store = Arc::clone(&self.store);
        let latency = self.latency;

        async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            let mut store = store.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(error) = store.failures.pop_front() {
                return Err(error);
            }
            op(&mut store)
        }
        .boxed()
    }
}

impl StudentService for MemoryStudentService {
    fn list(
        &self,
        page: u32,
        limit: u32,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<Page<Student>, ApiError>> {
        let fetch = self.call(Request::List { page, limit }, move |store| {
            let start = (page.max(1) as usize - 1) * limit as usize;
            let items = store
                .students
                .values()
                .skip(start)
                .take(limit as usize)
                .cloned()
                .collect();
            Ok(Page::new(items, Some(store.students.len() as u64)))
        });

        async move {
            tokio::select! {
                () = cancel.cancelled() => Err(ApiError::Cancelled),
                result = fetch => result,
            }
        }
        .boxed()
    }

    fn get(&self, id: StudentId) -> BoxFuture<'static, Result<Student, ApiError>> {
        self.call(Request::Get(id), move |store| {
            store.students.get(&id).cloned().ok_or(ApiError::Status(404))
        })
    }

    fn create(&self, draft: StudentDraft) -> BoxFuture<'static, Result<Student, ApiError>> {
        self.call(Request::Create(draft.clone()), move |store| {
            if store.email_taken(&draft.email, None) {
                return Err(email_taken());
            }
            store.next_id += 1;
            let student = draft.with_id(store.next_id);
            store.students.insert(student.id, student.clone());
            Ok(student)
        })
    }

    fn update(&self, id: StudentId, student: Student) -> BoxFuture<'static, Result<Student, ApiError>> {
        self.call(Request::Update(id, student.clone()), move |store| {
            if !store.students.contains_key(&id) {
                return Err(ApiError::Status(404));
            }
            if store.email_taken(&student.email, Some(id)) {
                return Err(email_taken());
            }
            let student = Student { id, ..student };
            store.students.insert(id, student.clone());
            Ok(student)
        })
    }

    fn delete(&self, id: StudentId) -> BoxFuture<'static, Result<(), ApiError>> {
        self.call(Request::Delete(id), move |store| {
            store
                .students
                .remove(&id)
                .map(|_| ())
                .ok_or(ApiError::Status(404))
        })
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::students;
    use super::*;

    #[tokio::test]
    async fn test_list_pages_and_total() {
        let service = MemoryStudentService::with_students(students(23));

        let page = service.list(3, 10, CancellationToken::new()).await.unwrap();
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.items[0].id, 21);
        assert_eq!(page.total_count, Some(23));

        let beyond = service.list(9, 10, CancellationToken::new()).await.unwrap();
        assert!(beyond.items.is_empty());
    }

    #[tokio::test]
    async fn test_ids_are_never_reused() {
        let service = MemoryStudentService::with_students(students(2));
        service.delete(2).await.unwrap();

        let created = service.create(StudentDraft::default()).await.unwrap();
        assert_eq!(created.id, 3);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let service = MemoryStudentService::with_students(students(1));
        let draft = StudentDraft {
            email: "student1@example.com".to_string(),
            ..StudentDraft::default()
        };

        let err = service.create(draft).await.unwrap_err();
        let errors = err.field_errors().expect("should be a validation error");
        assert_eq!(errors.email.as_deref(), Some("Email already exists"));
    }

    #[tokio::test]
    async fn test_update_keeps_own_email() {
        let service = MemoryStudentService::with_students(students(1));
        let mut student = service.get(1).await.unwrap();
        student.country = "Japan".to_string();

        let updated = service.update(1, student).await.unwrap();
        assert_eq!(updated.country, "Japan");
    }

    #[tokio::test]
    async fn test_missing_record_is_404() {
        let service = MemoryStudentService::new();
        assert_eq!(service.get(7).await, Err(ApiError::Status(404)));
        assert_eq!(service.delete(7).await, Err(ApiError::Status(404)));
    }

    #[tokio::test]
    async fn test_scripted_failure_applies_once() {
        let service = MemoryStudentService::with_students(students(1));
        service.fail_next(ApiError::Status(500));

        assert_eq!(service.delete(1).await, Err(ApiError::Status(500)));
        assert_eq!(service.delete(1).await, Ok(()));
        assert_eq!(service.requests(), vec![Request::Delete(1), Request::Delete(1)]);
    }

    #[tokio::test]
    async fn test_list_is_cancellable() {
        let service = MemoryStudentService::new().with_latency(Duration::from_secs(10));
        let cancel = CancellationToken::new();
        let request = service.list(1, 10, cancel.clone());
        cancel.cancel();

        assert_eq!(request.await, Err(ApiError::Cancelled));
    }
}
