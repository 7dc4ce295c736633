use chrono::Utc;
use domain_matching::Caller;
use observability::ConnectionMetrics;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ConnectionError, ConnectionResult};
use crate::models::{
    ConnectionList, ConnectionRequest, ConnectionStatus, CreateConnectionRequest, Decision,
    Direction,
};
use crate::notifier::{ConnectionEvent, Notifier};
use crate::repository::ConnectionRepository;

/// Connection request state machine.
///
/// `pending → accepted | declined` by the target, `pending → withdrawn` by the
/// requester. All other transitions fail with `InvalidTransition`. Events are
/// enqueued only after the repository has committed the change.
pub struct ConnectionService<R: ConnectionRepository> {
    repository: Arc<R>,
    notifier: Option<Notifier>,
}

impl<R: ConnectionRepository> ConnectionService<R> {
    pub fn new(repository: R) -> Self {
        Self::from_shared(Arc::new(repository))
    }

    pub fn from_shared(repository: Arc<R>) -> Self {
        Self {
            repository,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    #[instrument(skip_all, fields(requester_id = %caller.user_id, target_id = %input.target_id))]
    pub async fn request_connection(
        &self,
        caller: &Caller,
        input: CreateConnectionRequest,
    ) -> ConnectionResult<ConnectionRequest> {
        input
            .validate()
            .map_err(|e| ConnectionError::Validation(e.to_string()))?;
        if input.target_id == caller.user_id {
            return Err(ConnectionError::Validation(
                "Cannot send a connection request to yourself".to_string(),
            ));
        }

        let request = match self
            .repository
            .create(ConnectionRequest::new(caller.user_id, input))
            .await
        {
            Ok(request) => request,
            Err(e @ ConnectionError::DuplicateRequest { .. }) => {
                ConnectionMetrics::record_duplicate_rejected();
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        ConnectionMetrics::record_request_created();
        info!(request_id = %request.id, job_id = ?request.job_id, "Connection requested");
        self.emit(&request);
        Ok(request)
    }

    /// Accept or decline a request. Only the target may respond.
    #[instrument(skip_all, fields(request_id = %request_id, responder_id = %caller.user_id, decision = %decision))]
    pub async fn respond(
        &self,
        caller: &Caller,
        request_id: Uuid,
        decision: Decision,
    ) -> ConnectionResult<ConnectionRequest> {
        let request = self.load(request_id).await?;
        if request.target_id != caller.user_id {
            return Err(ConnectionError::Unauthorized(caller.user_id));
        }
        self.apply(request, decision.into()).await
    }

    /// Retract a pending request. Only the requester may withdraw.
    #[instrument(skip_all, fields(request_id = %request_id, requester_id = %caller.user_id))]
    pub async fn withdraw(
        &self,
        caller: &Caller,
        request_id: Uuid,
    ) -> ConnectionResult<ConnectionRequest> {
        let request = self.load(request_id).await?;
        if request.requester_id != caller.user_id {
            return Err(ConnectionError::Unauthorized(caller.user_id));
        }
        self.apply(request, ConnectionStatus::Withdrawn).await
    }

    /// A request is visible to its requester and its target only.
    pub async fn get(&self, caller: &Caller, request_id: Uuid) -> ConnectionResult<ConnectionRequest> {
        let request = self.load(request_id).await?;
        if !request.involves(caller.user_id) {
            return Err(ConnectionError::Unauthorized(caller.user_id));
        }
        Ok(request)
    }

    pub async fn list_for(
        &self,
        caller: &Caller,
        direction: Direction,
    ) -> ConnectionResult<ConnectionList> {
        let mut list = ConnectionList::default();
        if direction.includes_sent() {
            list.sent = self.repository.list_sent(caller.user_id).await?;
        }
        if direction.includes_received() {
            list.received = self.repository.list_received(caller.user_id).await?;
        }
        Ok(list)
    }

    async fn load(&self, request_id: Uuid) -> ConnectionResult<ConnectionRequest> {
        self.repository
            .get(request_id)
            .await?
            .ok_or(ConnectionError::NotFound(request_id))
    }

    async fn apply(
        &self,
        request: ConnectionRequest,
        to: ConnectionStatus,
    ) -> ConnectionResult<ConnectionRequest> {
        // fail fast on an already-terminal request; the repository re-checks atomically
        if !request.status.can_transition_to(to) {
            ConnectionMetrics::record_transition(&to.to_string(), false);
            return Err(ConnectionError::InvalidTransition {
                id: request.id,
                from: request.status,
                to,
            });
        }

        match self.repository.transition(request.id, to, Utc::now()).await {
            Ok(updated) => {
                ConnectionMetrics::record_transition(&to.to_string(), true);
                info!(status = %updated.status, "Connection request updated");
                self.emit(&updated);
                Ok(updated)
            }
            Err(e) => {
                if matches!(e, ConnectionError::InvalidTransition { .. }) {
                    ConnectionMetrics::record_transition(&to.to_string(), false);
                }
                Err(e)
            }
        }
    }

    fn emit(&self, request: &ConnectionRequest) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(ConnectionEvent::from_request(request));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::{ConnectionEventKind, MockNotificationSink};
    use crate::repository::{InMemoryConnectionRepository, MockConnectionRepository};
    use domain_matching::UserRole;

    fn caller(user_id: Uuid) -> Caller {
        Caller::new(user_id, UserRole::Founder)
    }

    fn input(target_id: Uuid, job_id: Option<Uuid>) -> CreateConnectionRequest {
        CreateConnectionRequest {
            target_id,
            message: "Would love to chat".to_string(),
            job_id,
        }
    }

    fn service() -> ConnectionService<InMemoryConnectionRepository> {
        ConnectionService::new(InMemoryConnectionRepository::new())
    }

    #[tokio::test]
    async fn test_duplicate_request_for_same_job() {
        let service = service();
        let (a, b, job) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());

        let first = service
            .request_connection(&caller(a), input(b, Some(job)))
            .await
            .unwrap();
        let err = service
            .request_connection(&caller(a), input(b, Some(job)))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ConnectionError::DuplicateRequest { existing_id } if existing_id == first.id
        ));
        let list = service.list_for(&caller(a), Direction::Sent).await.unwrap();
        assert_eq!(list.sent.len(), 1);
    }

    #[tokio::test]
    async fn test_self_request_rejected() {
        let me = Uuid::now_v7();
        let err = service()
            .request_connection(&caller(me), input(me, None))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectionError::Validation(_)));
    }

    #[tokio::test]
    async fn test_overlong_message_rejected() {
        let mut body = input(Uuid::now_v7(), None);
        body.message = "a".repeat(2001);
        let err = service()
            .request_connection(&caller(Uuid::now_v7()), body)
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectionError::Validation(_)));
    }

    #[tokio::test]
    async fn test_decline_twice_is_invalid_transition() {
        let service = service();
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
        let request = service.request_connection(&caller(a), input(b, None)).await.unwrap();

        let declined = service
            .respond(&caller(b), request.id, Decision::Decline)
            .await
            .unwrap();
        assert_eq!(declined.status, ConnectionStatus::Declined);

        let err = service
            .respond(&caller(b), request.id, Decision::Decline)
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectionError::InvalidTransition { .. }));
        assert_eq!(
            service.get(&caller(a), request.id).await.unwrap().status,
            ConnectionStatus::Declined
        );
    }

    #[tokio::test]
    async fn test_only_target_may_respond() {
        let service = service();
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
        let request = service.request_connection(&caller(a), input(b, None)).await.unwrap();

        let err = service
            .respond(&caller(a), request.id, Decision::Accept)
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectionError::Unauthorized(id) if id == a));
    }

    #[tokio::test]
    async fn test_withdraw_by_requester_only() {
        let service = service();
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
        let request = service.request_connection(&caller(a), input(b, None)).await.unwrap();

        let err = service.withdraw(&caller(b), request.id).await.unwrap_err();
        assert!(matches!(err, ConnectionError::Unauthorized(_)));

        let withdrawn = service.withdraw(&caller(a), request.id).await.unwrap();
        assert_eq!(withdrawn.status, ConnectionStatus::Withdrawn);

        let err = service
            .respond(&caller(b), request.id, Decision::Accept)
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectionError::InvalidTransition { .. }));

        // a withdrawn request no longer blocks a new one
        assert!(service.request_connection(&caller(a), input(b, None)).await.is_ok());
    }

    #[tokio::test]
    async fn test_get_hidden_from_third_parties() {
        let service = service();
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
        let request = service.request_connection(&caller(a), input(b, None)).await.unwrap();

        assert!(service.get(&caller(b), request.id).await.is_ok());
        let err = service
            .get(&caller(Uuid::now_v7()), request.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectionError::Unauthorized(_)));

        let err = service.get(&caller(a), Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, ConnectionError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_partitions_by_direction() {
        let service = service();
        let (a, b, c) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        service.request_connection(&caller(a), input(b, None)).await.unwrap();
        service.request_connection(&caller(c), input(a, None)).await.unwrap();
        let latest = service.request_connection(&caller(b), input(a, None)).await.unwrap();

        let all = service.list_for(&caller(a), Direction::All).await.unwrap();
        assert_eq!(all.sent.len(), 1);
        assert_eq!(all.received.len(), 2);
        assert_eq!(all.received[0].id, latest.id);

        let received = service.list_for(&caller(a), Direction::Received).await.unwrap();
        assert!(received.sent.is_empty());
        assert_eq!(received.received.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_responses_single_winner() {
        let service = Arc::new(service());
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
        let id = service
            .request_connection(&caller(a), input(b, None))
            .await
            .unwrap()
            .id;

        let attempts = [Decision::Accept, Decision::Decline, Decision::Accept, Decision::Decline]
            .into_iter()
            .map(|decision| {
                let service = service.clone();
                tokio::spawn(async move { service.respond(&caller(b), id, decision).await })
            });
        let results = futures::future::join_all(attempts).await;

        let (won, lost): (Vec<_>, Vec<_>) = results
            .into_iter()
            .map(|r| r.unwrap())
            .partition(|r| r.is_ok());
        assert_eq!(won.len(), 1);
        assert!(
            lost.iter()
                .all(|r| matches!(r, Err(ConnectionError::InvalidTransition { .. })))
        );
    }

    #[tokio::test]
    async fn test_storage_error_is_surfaced() {
        let mut repo = MockConnectionRepository::new();
        repo.expect_create()
            .returning(|_| Err(ConnectionError::Storage("connection reset".to_string())));

        let err = ConnectionService::new(repo)
            .request_connection(&caller(Uuid::now_v7()), input(Uuid::now_v7(), None))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectionError::Storage(_)));
    }

    #[tokio::test]
    async fn test_notification_failure_keeps_state_change() {
        let mut sink = MockNotificationSink::new();
        sink.expect_name().return_const("mock");
        sink.expect_deliver()
            .returning(|_| Err(ConnectionError::Delivery("unreachable".to_string())));
        let (notifier, handle) = Notifier::spawn(Arc::new(sink), 4);

        let service = ConnectionService::new(InMemoryConnectionRepository::new()).with_notifier(notifier);
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
        let request = service.request_connection(&caller(a), input(b, None)).await.unwrap();
        let accepted = service
            .respond(&caller(b), request.id, Decision::Accept)
            .await
            .unwrap();
        assert_eq!(accepted.status, ConnectionStatus::Accepted);

        drop(service);
        handle.await.unwrap();
    }

    #[test]
    fn test_events_follow_transitions() {
        let mut request = ConnectionRequest::new(Uuid::now_v7(), input(Uuid::now_v7(), None));
        request.status = ConnectionStatus::Declined;
        assert_eq!(
            ConnectionEvent::from_request(&request).kind,
            ConnectionEventKind::Declined
        );
    }
}
