//! Connections Domain
//!
//! Connection requests between users, their accept/decline/withdraw lifecycle,
//! notifications to the other party, and applicant tracking for job postings.
//!
//! A request is keyed by `(requester, target, job)`. Only one active
//! (pending or accepted) request may exist per key; declined and withdrawn
//! requests can be sent again.
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_connections::{
//!     handlers, ConnectionService, InMemoryConnectionRepository, Notifier, TracingSink,
//! };
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let (notifier, _worker) = Notifier::spawn(Arc::new(TracingSink), 1024);
//! let service = ConnectionService::new(InMemoryConnectionRepository::new())
//!     .with_notifier(notifier);
//! let router = handlers::router(Arc::new(service));
//! # }
//! ```

pub mod applicants;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod notifier;
pub mod postgres;
pub mod repository;
pub mod service;

pub use applicants::ApplicantTracker;
pub use error::{ConnectionError, ConnectionResult};
pub use models::{
    Applicant, ApplicantList, ConnectionList, ConnectionListQuery, ConnectionRequest,
    ConnectionStatus, CreateConnectionRequest, Decision, Direction, RespondToConnection,
};
pub use notifier::{
    ConnectionEvent, ConnectionEventKind, NotificationSink, Notifier, NotifierConfig,
    TracingSink, WebhookSink,
};
pub use postgres::PgConnectionRepository;
pub use repository::{ConnectionRepository, InMemoryConnectionRepository};
pub use service::ConnectionService;
