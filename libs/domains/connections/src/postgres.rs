use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, SqlErr,
};
use uuid::Uuid;

use crate::{
    entity,
    error::{ConnectionError, ConnectionResult},
    models::{ConnectionRequest, ConnectionStatus},
    repository::ConnectionRepository,
};

/// Postgres-backed connection store.
///
/// Duplicate suppression relies on the partial unique index
/// `uq_connection_requests_active`; transitions are a single conditional
/// `UPDATE ... WHERE status = 'pending'`.
pub struct PgConnectionRepository {
    db: DatabaseConnection,
}

impl PgConnectionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_active(
        &self,
        requester_id: Uuid,
        target_id: Uuid,
        job_id: Option<Uuid>,
    ) -> ConnectionResult<Option<entity::Model>> {
        let job = match job_id {
            Some(job_id) => entity::Column::JobId.eq(job_id),
            None => entity::Column::JobId.is_null(),
        };
        let model = entity::Entity::find()
            .filter(entity::Column::RequesterId.eq(requester_id))
            .filter(entity::Column::TargetId.eq(target_id))
            .filter(job)
            .filter(
                Condition::any()
                    .add(entity::Column::Status.eq(ConnectionStatus::Pending))
                    .add(entity::Column::Status.eq(ConnectionStatus::Accepted)),
            )
            .one(&self.db)
            .await?;
        Ok(model)
    }

    async fn list_where(&self, condition: Condition) -> ConnectionResult<Vec<ConnectionRequest>> {
        let models = entity::Entity::find()
            .filter(condition)
            .order_by_desc(entity::Column::CreatedAt)
            .order_by_desc(entity::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[async_trait]
impl ConnectionRepository for PgConnectionRepository {
    async fn create(&self, request: ConnectionRequest) -> ConnectionResult<ConnectionRequest> {
        let (requester_id, target_id, job_id) = request.idempotency_key();
        let active_model: entity::ActiveModel = request.into();

        match active_model.insert(&self.db).await {
            Ok(model) => {
                tracing::info!(request_id = %model.id, "Created connection request");
                Ok(model.into())
            }
            Err(e) if is_unique_violation(&e) => {
                let existing = self.find_active(requester_id, target_id, job_id).await?;
                match existing {
                    Some(existing) => Err(ConnectionError::DuplicateRequest {
                        existing_id: existing.id,
                    }),
                    // the blocking row was resolved between the insert and the lookup
                    None => Err(ConnectionError::Storage(e.to_string())),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, id: Uuid) -> ConnectionResult<Option<ConnectionRequest>> {
        let model = entity::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn transition(
        &self,
        id: Uuid,
        to: ConnectionStatus,
        at: DateTime<Utc>,
    ) -> ConnectionResult<ConnectionRequest> {
        if !ConnectionStatus::Pending.can_transition_to(to) {
            return Err(ConnectionError::InvalidTransition {
                id,
                from: ConnectionStatus::Pending,
                to,
            });
        }

        let result = entity::Entity::update_many()
            .col_expr(entity::Column::Status, to.as_enum())
            .col_expr(entity::Column::RespondedAt, Expr::value(at.fixed_offset()))
            .filter(entity::Column::Id.eq(id))
            .filter(entity::Column::Status.eq(ConnectionStatus::Pending))
            .exec(&self.db)
            .await?;

        let current = entity::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(ConnectionError::NotFound(id))?;

        if result.rows_affected == 0 {
            return Err(ConnectionError::InvalidTransition {
                id,
                from: current.status,
                to,
            });
        }

        tracing::info!(request_id = %id, status = %to, "Connection request transitioned");
        Ok(current.into())
    }

    async fn list_sent(&self, user_id: Uuid) -> ConnectionResult<Vec<ConnectionRequest>> {
        self.list_where(Condition::all().add(entity::Column::RequesterId.eq(user_id)))
            .await
    }

    async fn list_received(&self, user_id: Uuid) -> ConnectionResult<Vec<ConnectionRequest>> {
        self.list_where(Condition::all().add(entity::Column::TargetId.eq(user_id)))
            .await
    }

    async fn list_for_job(
        &self,
        target_id: Uuid,
        job_id: Uuid,
    ) -> ConnectionResult<Vec<ConnectionRequest>> {
        self.list_where(
            Condition::all()
                .add(entity::Column::TargetId.eq(target_id))
                .add(entity::Column::JobId.eq(job_id))
                .add(entity::Column::Status.ne(ConnectionStatus::Withdrawn)),
        )
        .await
    }
}
