use chrono::{DateTime, Utc};
use domain_matching::MatchRecord;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Lifecycle of a connection request.
///
/// `pending` is the only non-terminal state.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "connection_status")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "declined")]
    Declined,
    /// Retracted by the requester before a response
    #[sea_orm(string_value = "withdrawn")]
    Withdrawn,
}

impl ConnectionStatus {
    pub fn is_terminal(self) -> bool {
        self != ConnectionStatus::Pending
    }

    /// Pending and accepted requests block a new request for the same tuple.
    pub fn is_active(self) -> bool {
        matches!(self, ConnectionStatus::Pending | ConnectionStatus::Accepted)
    }

    pub fn can_transition_to(self, next: ConnectionStatus) -> bool {
        self == ConnectionStatus::Pending && next.is_terminal()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConnectionRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub target_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<Uuid>,
    pub message: String,
    pub status: ConnectionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
}

impl ConnectionRequest {
    pub fn new(requester_id: Uuid, input: CreateConnectionRequest) -> Self {
        Self {
            id: Uuid::now_v7(),
            requester_id,
            target_id: input.target_id,
            job_id: input.job_id,
            message: input.message.trim().to_string(),
            status: ConnectionStatus::Pending,
            created_at: Utc::now(),
            responded_at: None,
        }
    }

    /// Identity used to reject duplicates.
    pub fn idempotency_key(&self) -> (Uuid, Uuid, Option<Uuid>) {
        (self.requester_id, self.target_id, self.job_id)
    }

    pub fn involves(&self, user_id: Uuid) -> bool {
        self.requester_id == user_id || self.target_id == user_id
    }
}

/// Body of `POST /connections/request`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateConnectionRequest {
    /// User id of the person being contacted
    pub target_id: Uuid,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub message: String,
    #[serde(default)]
    pub job_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Decision {
    Accept,
    Decline,
}

impl From<Decision> for ConnectionStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Accept => ConnectionStatus::Accepted,
            Decision::Decline => ConnectionStatus::Declined,
        }
    }
}

/// Body of `POST /connections/{id}/respond`.
#[derive(Debug, Clone, Copy, Deserialize, Validate, ToSchema)]
pub struct RespondToConnection {
    pub decision: Decision,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
    #[default]
    All,
}

impl Direction {
    pub fn includes_sent(self) -> bool {
        matches!(self, Direction::Sent | Direction::All)
    }

    pub fn includes_received(self) -> bool {
        matches!(self, Direction::Received | Direction::All)
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ConnectionListQuery {
    /// `sent`, `received` or `all` (default)
    #[serde(default)]
    pub direction: Direction,
}

/// Both sides of a user's connection requests, newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ConnectionList {
    pub sent: Vec<ConnectionRequest>,
    pub received: Vec<ConnectionRequest>,
}

/// A request received for a job, joined with the applicant's match against it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Applicant {
    pub request: ConnectionRequest,
    /// Absent when the applicant has no talent profile to score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching: Option<MatchRecord>,
}

impl Applicant {
    pub fn composite_score(&self) -> Option<f64> {
        self.matching.as_ref().map(MatchRecord::composite_score)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApplicantList {
    pub job_id: Uuid,
    pub items: Vec<Applicant>,
    pub total: usize,
}
