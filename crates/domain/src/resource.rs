use std::fmt::{Display, Formatter};
use std::str::FromStr;

use bizdock_core::{AppError, AppResult, ResourceId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Resource type subject to row-level access control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// Business actor (organizational person).
    Actor,
    /// Organizational unit.
    OrgUnit,
    /// Portfolio grouping portfolio entries.
    Portfolio,
    /// Initiative or application tracked in portfolios.
    PortfolioEntry,
    /// Budget bucket.
    BudgetBucket,
    /// Release planning item.
    Release,
    /// Report definition.
    Reporting,
    /// Weekly timesheet submitted by an actor.
    TimesheetReport,
}

impl ResourceType {
    /// Returns stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Actor => "actor",
            Self::OrgUnit => "org_unit",
            Self::Portfolio => "portfolio",
            Self::PortfolioEntry => "portfolio_entry",
            Self::BudgetBucket => "budget_bucket",
            Self::Release => "release",
            Self::Reporting => "reporting",
            Self::TimesheetReport => "timesheet_report",
        }
    }

    /// Returns all resource types.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[
            Self::Actor,
            Self::OrgUnit,
            Self::Portfolio,
            Self::PortfolioEntry,
            Self::BudgetBucket,
            Self::Release,
            Self::Reporting,
            Self::TimesheetReport,
        ]
    }

    /// Returns the operation that governs listing screens for this type.
    ///
    /// Timesheet reports are only ever listed for approval.
    #[must_use]
    pub fn listing_operation(&self) -> Operation {
        match self {
            Self::TimesheetReport => Operation::Approve,
            _ => Operation::View,
        }
    }
}

impl Display for ResourceType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "actor" => Ok(Self::Actor),
            "org_unit" => Ok(Self::OrgUnit),
            "portfolio" => Ok(Self::Portfolio),
            "portfolio_entry" => Ok(Self::PortfolioEntry),
            "budget_bucket" => Ok(Self::BudgetBucket),
            "release" => Ok(Self::Release),
            "reporting" => Ok(Self::Reporting),
            "timesheet_report" => Ok(Self::TimesheetReport),
            _ => Err(AppError::Validation(format!(
                "unknown resource type '{value}'"
            ))),
        }
    }
}

/// Operation requested on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// See the resource in listings.
    View,
    /// Open the detail page.
    Details,
    /// Modify the resource.
    Edit,
    /// Delete the resource.
    Delete,
    /// See financial information.
    ViewFinancial,
    /// Modify financial information.
    EditFinancial,
    /// Submit a review request.
    ReviewRequest,
    /// Approve the resource.
    Approve,
}

impl Operation {
    /// Returns stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Details => "details",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::ViewFinancial => "view_financial",
            Self::EditFinancial => "edit_financial",
            Self::ReviewRequest => "review_request",
            Self::Approve => "approve",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "view" => Ok(Self::View),
            "details" => Ok(Self::Details),
            "edit" => Ok(Self::Edit),
            "delete" => Ok(Self::Delete),
            "view_financial" => Ok(Self::ViewFinancial),
            "edit_financial" => Ok(Self::EditFinancial),
            "review_request" => Ok(Self::ReviewRequest),
            "approve" => Ok(Self::Approve),
            _ => Err(AppError::Validation(format!("unknown operation '{value}'"))),
        }
    }
}

/// Relationship or attribute field an access rule may reference.
///
/// Collection-valued fields are stored as JSON arrays on the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessField {
    /// Record identifier.
    Id,
    /// Actor managing the record.
    ManagerId,
    /// Actor owning the record.
    OwnerId,
    /// Manager of the actor the record belongs to.
    ActorManagerId,
    /// Actors registered as direct stakeholders.
    StakeholderActorIds,
    /// Managers of the portfolios containing the record.
    PortfolioManagerIds,
    /// Stakeholders of the portfolios containing the record.
    PortfolioStakeholderActorIds,
    /// Public visibility flag.
    IsPublic,
    /// Concept (not yet committed) flag.
    IsConcept,
    /// Archived flag.
    Archived,
    /// Account subjects explicitly authorized on the record.
    AuthorizedPrincipals,
}

impl AccessField {
    /// Returns the storage name of the field.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::ManagerId => "manager_id",
            Self::OwnerId => "owner_id",
            Self::ActorManagerId => "actor_manager_id",
            Self::StakeholderActorIds => "stakeholder_actor_ids",
            Self::PortfolioManagerIds => "portfolio_manager_ids",
            Self::PortfolioStakeholderActorIds => "portfolio_stakeholder_actor_ids",
            Self::IsPublic => "is_public",
            Self::IsConcept => "is_concept",
            Self::Archived => "archived",
            Self::AuthorizedPrincipals => "authorized_principals",
        }
    }
}

impl Display for AccessField {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Scalar value compared against an access field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccessValue {
    /// Integer identifier.
    Int(i64),
    /// Text value such as an account subject.
    Text(String),
    /// Boolean flag.
    Bool(bool),
}

impl AccessValue {
    /// Returns the JSON representation stored on records.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Int(value) => Value::from(*value),
            Self::Text(value) => Value::from(value.as_str()),
            Self::Bool(value) => Value::Bool(*value),
        }
    }

    /// Returns whether a stored JSON scalar equals this value.
    #[must_use]
    pub fn matches_json(&self, stored: &Value) -> bool {
        match (self, stored) {
            (Self::Int(expected), Value::Number(number)) => number.as_i64() == Some(*expected),
            (Self::Text(expected), Value::String(value)) => value == expected,
            (Self::Bool(expected), Value::Bool(value)) => value == expected,
            _ => false,
        }
    }
}

impl From<i64> for AccessValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for AccessValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for AccessValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// Row of an access-controlled resource as seen by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    id: ResourceId,
    resource_type: ResourceType,
    deleted: bool,
    data: Value,
}

impl ResourceRecord {
    /// Creates a record projection. `data` must be a JSON object.
    pub fn new(
        id: ResourceId,
        resource_type: ResourceType,
        deleted: bool,
        data: Value,
    ) -> AppResult<Self> {
        if !data.is_object() {
            return Err(AppError::Validation(format!(
                "resource record {resource_type}/{id} data must be a JSON object"
            )));
        }

        Ok(Self {
            id,
            resource_type,
            deleted,
            data,
        })
    }

    /// Returns record identifier.
    #[must_use]
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Returns record resource type.
    #[must_use]
    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Returns whether the record is soft-deleted.
    #[must_use]
    pub fn deleted(&self) -> bool {
        self.deleted
    }

    /// Returns record payload.
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Returns a copy flagged as deleted.
    #[must_use]
    pub fn into_deleted(self) -> Self {
        Self {
            deleted: true,
            ..self
        }
    }

    /// Resolves a field by storage name. `id` resolves to the identifier.
    #[must_use]
    pub fn field_value(&self, field: &str) -> Option<Value> {
        if field == AccessField::Id.as_str() {
            return Some(Value::from(self.id.value()));
        }

        self.data.get(field).filter(|value| !value.is_null()).cloned()
    }
}
