//! Screens of the application.
//!
//! Each view owns its state and exposes the same shape as an
//! [`Application`](crate::application::Application), scoped to its own message
//! type: `update`, `view` into a given area, and `subscriptions`. Views also map
//! raw terminal input to their messages with `on_key` / `on_mouse`. The shell in
//! [`app`](crate::app) lifts their commands and subscriptions with `map`.

pub mod form;
pub mod list;
pub mod skeleton;

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::{FutureExt, TryFutureExt};

use crate::api::StudentService;
use crate::model::{Student, StudentId};
use crate::query::{QueryClient, QueryError};

pub use form::{Field, FormMessage, FormMode, StudentForm};
pub use list::{ListMessage, StudentList};

/// Services and timings shared by every view.
#[derive(Clone)]
pub struct Context {
    pub service: Arc<dyn StudentService>,
    pub client: Arc<QueryClient>,
    /// Rows per list page.
    pub page_size: u32,
    /// A list request still running after this long is cancelled.
    pub list_timeout: Duration,
    /// Stale time of single-record queries and hover prefetches.
    pub detail_stale_time: Duration,
}

impl Context {
    pub fn new(service: Arc<dyn StudentService>, client: Arc<QueryClient>) -> Self {
        Self {
            service,
            client,
            page_size: 10,
            list_timeout: Duration::from_secs(5),
            detail_stale_time: Duration::from_secs(10),
        }
    }

    /// Fetches one record, for queries and prefetches keyed `student/{id}`.
    pub(crate) fn student_fetcher(
        &self,
        id: StudentId,
    ) -> impl Fn() -> BoxFuture<'static, Result<Student, QueryError>> + Send + Sync + 'static {
        let service = Arc::clone(&self.service);
        move || service.get(id).map_err(QueryError::from).boxed()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("page_size", &self.page_size)
            .field("list_timeout", &self.list_timeout)
            .field("detail_stale_time", &self.detail_stale_time)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use ratatui::{Frame, Terminal, backend::TestBackend};

    use super::Context;
    use crate::api::MemoryStudentService;
    use crate::api::memory::fixtures;
    use crate::query::QueryClient;

    /// A context over an in-memory store seeded with `count` students.
    pub(crate) fn context(count: u64) -> (Context, MemoryStudentService) {
        let service = MemoryStudentService::with_students(fixtures::students(count));
        let context = Context::new(Arc::new(service.clone()), Arc::new(QueryClient::new()));
        (context, service)
    }

    /// Draws once into a test terminal and returns the screen as text lines.
    pub(crate) fn render(width: u16, height: u16, draw: impl FnOnce(&mut Frame<'_>)) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("test terminal");
        terminal.draw(draw).expect("draw");

        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }
}
