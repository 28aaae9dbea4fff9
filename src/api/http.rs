//! REST client for the students collection.

use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use super::{ApiError, ErrorBody, StudentService};
use crate::model::{Page, Student, StudentDraft, StudentId};

/// Response header carrying the total number of records.
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// [`StudentService`] over HTTP.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpStudentService {
    client: Client,
    base_url: String,
}

impl HttpStudentService {
    /// Creates a client for the API rooted at `base_url`, e.g. `http://localhost:4000`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Uses an existing [`reqwest::Client`].
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn collection_url(&self) -> String {
        format!("{}/students", self.base_url)
    }

    fn record_url(&self, id: StudentId) -> String {
        format!("{}/students/{id}", self.base_url)
    }
}

/// Maps non-success statuses to errors; 422 bodies become [`ApiError::Validation`].
async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNPROCESSABLE_ENTITY {
        let body: ErrorBody = response.json().await.map_err(|e| ApiError::Decode(e.to_string()))?;
        return Err(ApiError::Validation(body.error));
    }
    Err(ApiError::Status(status.as_u16()))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let response = check(response).await?;
    response.json().await.map_err(|e| ApiError::Decode(e.to_string()))
}

fn total_count(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(TOTAL_COUNT_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

impl StudentService for HttpStudentService {
    fn list(
        &self,
        page: u32,
        limit: u32,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<Page<Student>, ApiError>> {
        let request = self
            .client
            .get(self.collection_url())
            .query(&[("_page", page), ("_limit", limit)]);

        async move {
            let fetch = async {
                let response = check(request.send().await?).await?;
                let total = total_count(&response);
                let items: Vec<Student> =
                    response.json().await.map_err(|e| ApiError::Decode(e.to_string()))?;
                Ok::<_, ApiError>(Page::new(items, total))
            };

            tokio::select! {
                () = cancel.cancelled() => {
                    tracing::debug!(page, "students list request aborted");
                    Err(ApiError::Cancelled)
                }
                result = fetch => result,
            }
        }
        .boxed()
    }

    fn get(&self, id: StudentId) -> BoxFuture<'static, Result<Student, ApiError>> {
        let request = self.client.get(self.record_url(id));
        async move { decode(request.send().await?).await }.boxed()
    }

    fn create(&self, draft: StudentDraft) -> BoxFuture<'static, Result<Student, ApiError>> {
        let request = self.client.post(self.collection_url()).json(&draft);
        async move { decode(request.send().await?).await }.boxed()
    }

    fn update(&self, id: StudentId, student: Student) -> BoxFuture<'static, Result<Student, ApiError>> {
        let request = self.client.put(self.record_url(id)).json(&student);
        async move { decode(request.send().await?).await }.boxed()
    }

    fn delete(&self, id: StudentId) -> BoxFuture<'static, Result<(), ApiError>> {
        let request = self.client.delete(self.record_url(id));
        async move {
            check(request.send().await?).await?;
            Ok::<_, ApiError>(())
        }
        .boxed()
    }
}
