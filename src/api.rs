//! Access to the students resource.
//!
//! Views talk to a [`StudentService`], never to HTTP directly. Two
//! implementations ship with the crate:
//!
//! - [`HttpStudentService`]: the REST client used in production
//! - [`MemoryStudentService`]: an in-process store for offline runs and tests

pub mod http;
pub mod memory;

use futures::future::BoxFuture;
use serde::Deserialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::model::{Page, Student, StudentDraft, StudentId};

pub use http::HttpStudentService;
pub use memory::MemoryStudentService;

/// Per-field messages from a 422 response.
///
/// The server mirrors student field names; unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FieldErrors {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub country: Option<String>,
    pub avatar: Option<String>,
    pub btc_address: Option<String>,
}

impl FieldErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Body of a 422 response.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub(crate) error: FieldErrors,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("request cancelled")]
    Cancelled,

    #[error("network error: {0}")]
    Network(String),

    #[error("validation failed")]
    Validation(FieldErrors),

    #[error("server responded with status {0}")]
    Status(u16),

    #[error("invalid response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Field errors if this is a 422 response.
    #[must_use]
    pub const fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// The five operations on the students collection.
///
/// Futures are `'static` so they can be moved into commands and subscriptions.
pub trait StudentService: Send + Sync + 'static {
    /// `GET /students?_page={page}&_limit={limit}`. Resolves to
    /// [`ApiError::Cancelled`] once `cancel` fires.
    fn list(
        &self,
        page: u32,
        limit: u32,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<Page<Student>, ApiError>>;

    /// `GET /students/{id}`
    fn get(&self, id: StudentId) -> BoxFuture<'static, Result<Student, ApiError>>;

    /// `POST /students`
    fn create(&self, draft: StudentDraft) -> BoxFuture<'static, Result<Student, ApiError>>;

    /// `PUT /students/{id}`
    fn update(&self, id: StudentId, student: Student) -> BoxFuture<'static, Result<Student, ApiError>>;

    /// `DELETE /students/{id}`
    fn delete(&self, id: StudentId) -> BoxFuture<'static, Result<(), ApiError>>;
}
