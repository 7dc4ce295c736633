use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::{ConnectionRequest, ConnectionStatus};

/// Sea-ORM Entity for the connection_requests table
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "connection_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub requester_id: Uuid,
    pub target_id: Uuid,
    pub job_id: Option<Uuid>,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub status: ConnectionStatus,
    pub created_at: DateTimeWithTimeZone,
    pub responded_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ConnectionRequest {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            requester_id: model.requester_id,
            target_id: model.target_id,
            job_id: model.job_id,
            message: model.message,
            status: model.status,
            created_at: model.created_at.into(),
            responded_at: model.responded_at.map(Into::into),
        }
    }
}

impl From<ConnectionRequest> for ActiveModel {
    fn from(request: ConnectionRequest) -> Self {
        ActiveModel {
            id: Set(request.id),
            requester_id: Set(request.requester_id),
            target_id: Set(request.target_id),
            job_id: Set(request.job_id),
            message: Set(request.message),
            status: Set(request.status),
            created_at: Set(request.created_at.into()),
            responded_at: Set(request.responded_at.map(Into::into)),
        }
    }
}
