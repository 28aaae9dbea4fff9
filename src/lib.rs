//! # roster
//!
//! A terminal client for a remote "students" REST resource: a paginated list,
//! a create/edit form, deletes, toast notifications and loading skeletons.
//!
//! The client is an Elm-architecture application on a small runtime built on
//! [ratatui](https://ratatui.rs/) and tokio:
//!
//! 1. **Model**: the state of each screen
//! 2. **Message**: everything that can happen to it
//! 3. **Update**: applies a message and returns a [`Command`](command::Command)
//! 4. **View**: draws the model
//! 5. **Subscriptions**: long-running sources such as terminal input, timers
//!    and cached queries
//!
//! Server data lives in an explicit [`QueryClient`](query::QueryClient) cache,
//! created at start-up and passed to the views. Queries keep cache keys loaded,
//! mutations write through the [`StudentService`](api::StudentService) seam,
//! and every fetch is sequenced so a late response never replaces newer data.
//!
//! ## Layout
//!
//! - [`runtime`], [`application`], [`command`], [`subscription`]: the event loop
//! - [`query`]: the query cache
//! - [`api`]: HTTP and in-memory student services
//! - [`views`], [`app`]: screens and the shell that routes between them
//! - [`config`], [`logging`]: start-up settings and log output
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use roster::api::MemoryStudentService;
//! use roster::app::{AppFlags, StudentsApp};
//! use roster::query::QueryClient;
//! use roster::route::Route;
//! use roster::runtime::Runtime;
//! use roster::views::Context;
//!
//! # async fn run() -> color_eyre::Result<()> {
//! let context = Context::new(
//!     Arc::new(MemoryStudentService::new()),
//!     Arc::new(QueryClient::new()),
//! );
//! let flags = AppFlags {
//!     context,
//!     toast_ttl: std::time::Duration::from_secs(3),
//!     route: Route::default(),
//! };
//!
//! let mut terminal = ratatui::init();
//! Runtime::<StudentsApp>::new(flags).run(&mut terminal, 30).await?;
//! ratatui::restore();
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod app;
pub mod application;
pub mod command;
pub mod config;
pub mod logging;
pub mod model;
pub mod notify;
pub mod pagination;
pub mod prelude;
pub mod query;
pub mod route;
pub mod runtime;
pub mod subscription;
pub mod views;
