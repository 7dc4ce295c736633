use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{ConnectionError, ConnectionResult};
use crate::models::{ConnectionRequest, ConnectionStatus};

/// Persistence for connection requests.
///
/// Implementations must make `create` and `transition` atomic: two concurrent
/// creates for the same idempotency key yield one row, and two concurrent
/// transitions of the same pending request let exactly one win.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    /// Insert a pending request, failing with `DuplicateRequest` when an active
    /// request already exists for the same (requester, target, job).
    async fn create(&self, request: ConnectionRequest) -> ConnectionResult<ConnectionRequest>;

    async fn get(&self, id: Uuid) -> ConnectionResult<Option<ConnectionRequest>>;

    /// Move a pending request to `to`. Fails with `InvalidTransition` when the
    /// request is no longer pending.
    async fn transition(
        &self,
        id: Uuid,
        to: ConnectionStatus,
        at: DateTime<Utc>,
    ) -> ConnectionResult<ConnectionRequest>;

    /// Requests sent by `user_id`, newest first
    async fn list_sent(&self, user_id: Uuid) -> ConnectionResult<Vec<ConnectionRequest>>;

    /// Requests received by `user_id`, newest first
    async fn list_received(&self, user_id: Uuid) -> ConnectionResult<Vec<ConnectionRequest>>;

    /// Requests received by `target_id` that reference `job_id`, newest first.
    /// Withdrawn requests are left out.
    async fn list_for_job(
        &self,
        target_id: Uuid,
        job_id: Uuid,
    ) -> ConnectionResult<Vec<ConnectionRequest>>;
}

/// Newest first; v7 ids break ties in creation order.
pub(crate) fn newest_first(requests: &mut [ConnectionRequest]) {
    requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
}

/// In-memory implementation of ConnectionRepository
#[derive(Debug, Default, Clone)]
pub struct InMemoryConnectionRepository {
    requests: Arc<RwLock<HashMap<Uuid, ConnectionRequest>>>,
}

impl InMemoryConnectionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn select(
        &self,
        filter: impl Fn(&ConnectionRequest) -> bool,
    ) -> Vec<ConnectionRequest> {
        let requests = self.requests.read().await;
        let mut matched: Vec<ConnectionRequest> =
            requests.values().filter(|r| filter(r)).cloned().collect();
        newest_first(&mut matched);
        matched
    }
}

#[async_trait]
impl ConnectionRepository for InMemoryConnectionRepository {
    async fn create(&self, request: ConnectionRequest) -> ConnectionResult<ConnectionRequest> {
        let mut requests = self.requests.write().await;

        let key = request.idempotency_key();
        if let Some(existing) = requests
            .values()
            .find(|r| r.status.is_active() && r.idempotency_key() == key)
        {
            return Err(ConnectionError::DuplicateRequest {
                existing_id: existing.id,
            });
        }

        requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn get(&self, id: Uuid) -> ConnectionResult<Option<ConnectionRequest>> {
        let requests = self.requests.read().await;
        Ok(requests.get(&id).cloned())
    }

    async fn transition(
        &self,
        id: Uuid,
        to: ConnectionStatus,
        at: DateTime<Utc>,
    ) -> ConnectionResult<ConnectionRequest> {
        let mut requests = self.requests.write().await;
        let request = requests.get_mut(&id).ok_or(ConnectionError::NotFound(id))?;

        if !request.status.can_transition_to(to) {
            return Err(ConnectionError::InvalidTransition {
                id,
                from: request.status,
                to,
            });
        }

        request.status = to;
        request.responded_at = Some(at);
        Ok(request.clone())
    }

    async fn list_sent(&self, user_id: Uuid) -> ConnectionResult<Vec<ConnectionRequest>> {
        Ok(self.select(|r| r.requester_id == user_id).await)
    }

    async fn list_received(&self, user_id: Uuid) -> ConnectionResult<Vec<ConnectionRequest>> {
        Ok(self.select(|r| r.target_id == user_id).await)
    }

    async fn list_for_job(
        &self,
        target_id: Uuid,
        job_id: Uuid,
    ) -> ConnectionResult<Vec<ConnectionRequest>> {
        Ok(self
            .select(|r| {
                r.target_id == target_id
                    && r.job_id == Some(job_id)
                    && r.status != ConnectionStatus::Withdrawn
            })
            .await)
    }
}
