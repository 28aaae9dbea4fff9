use std::io::{self, stdout};
use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;

use roster::api::{HttpStudentService, MemoryStudentService, StudentService};
use roster::app::{AppFlags, StudentsApp};
use roster::config::{Backend, Settings};
use roster::model::{Gender, Student};
use roster::query::QueryClient;
use roster::route::Route;
use roster::runtime::Runtime;
use roster::views::Context;

/// Sample records for `backend = "memory"`.
fn sample_students() -> Vec<Student> {
    const NAMES: [(&str, &str, &str); 6] = [
        ("Linh", "Nguyen", "Vietnam"),
        ("Kenji", "Sato", "Japan"),
        ("Ana", "Souza", "Brazil"),
        ("Tomas", "Novak", "Czechia"),
        ("Amara", "Okafor", "Nigeria"),
        ("Freya", "Larsen", "Denmark"),
    ];

    (1..=37_u64)
        .map(|id| {
            let (first, last, country) = NAMES[(id as usize - 1) % NAMES.len()];
            Student {
                id,
                first_name: first.to_string(),
                last_name: format!("{last}{id}"),
                email: format!("{}.{}{id}@example.com", first.to_lowercase(), last.to_lowercase()),
                gender: Gender::ALL[id as usize % Gender::ALL.len()],
                country: country.to_string(),
                avatar: String::new(),
                btc_address: format!("bc1q{id:08x}"),
            }
        })
        .collect()
}

fn service(settings: &Settings) -> Result<Arc<dyn StudentService>> {
    let service: Arc<dyn StudentService> = match settings.backend {
        Backend::Http => Arc::new(HttpStudentService::new(settings.api_url.as_str())?),
        Backend::Memory => Arc::new(MemoryStudentService::with_students(sample_students())),
    };
    Ok(service)
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    // A missing .env is fine.
    let _ = dotenvy::dotenv();

    let settings = Settings::load()?;
    let _guard = roster::logging::init(&settings)?;
    tracing::info!(backend = ?settings.backend, api_url = %settings.api_url, "starting");

    let route = std::env::args()
        .nth(1)
        .map_or_else(Route::default, |path| Route::parse(&path));

    let client = Arc::new(QueryClient::with_config(settings.query_config()));
    let mut context = Context::new(service(&settings)?, Arc::clone(&client));
    context.page_size = settings.page_size;
    context.list_timeout = settings.list_timeout();
    context.detail_stale_time = settings.detail_stale_time();

    let flags = AppFlags {
        context,
        toast_ttl: settings.toast_ttl(),
        route,
    };

    let mut terminal = ratatui::init();
    let result = session(
        || execute!(stdout(), EnableMouseCapture),
        Runtime::<StudentsApp>::new(flags).run(&mut terminal, settings.frame_rate),
        || {
            let disabled = execute!(stdout(), DisableMouseCapture);
            ratatui::restore();
            disabled
        },
    )
    .await;

    client.clear();
    tracing::info!("stopped");
    result
}

/// Runs `body` after `enter` succeeds. `leave` runs in every case, so the
/// terminal is restored even when entering or the body fails.
async fn session<T>(
    enter: impl FnOnce() -> io::Result<()>,
    body: impl Future<Output = Result<T>>,
    leave: impl FnOnce() -> io::Result<()>,
) -> Result<T> {
    let result = match enter() {
        Ok(()) => body.await,
        Err(e) => Err(e.into()),
    };
    let left = leave();
    let value = result?;
    left?;
    Ok(value)
}
