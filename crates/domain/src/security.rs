use std::str::FromStr;

use bizdock_core::AppError;
use serde::{Deserialize, Serialize};

macro_rules! permission_catalog {
    ($($(#[$doc:meta])* $variant:ident => $value:literal,)+) => {
        /// Permissions consulted by the row-level access rules.
        ///
        /// Storage values are the identifiers persisted in role grants.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum Permission {
            $($(#[$doc])* #[serde(rename = $value)] $variant,)+
        }

        impl Permission {
            /// Returns a stable storage value for this permission.
            #[must_use]
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }

            /// Returns all known permissions.
            #[must_use]
            pub fn all() -> &'static [Self] {
                const ALL: &[Permission] = &[$(Permission::$variant,)+];

                ALL
            }
        }

        impl FromStr for Permission {
            type Err = AppError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($value => Ok(Self::$variant),)+
                    _ => Err(AppError::Validation(format!(
                        "unknown permission value '{value}'"
                    ))),
                }
            }
        }
    };
}

permission_catalog! {
    /// View every actor.
    ActorViewAll => "ACTOR_VIEW_ALL_PERMISSION",
    /// View actors managed by the user or by the user's subordinates.
    ActorViewAsSuperior => "ACTOR_VIEW_AS_SUPERIOR_PERMISSION",
    /// Edit and delete every actor.
    ActorEditAll => "ACTOR_EDIT_ALL_PERMISSION",
    /// View every org unit.
    OrgUnitViewAll => "ORG_UNIT_VIEW_ALL_PERMISSION",
    /// View org units managed by the user or by the user's subordinates.
    OrgUnitViewAsResponsible => "ORG_UNIT_VIEW_AS_RESPONSIBLE_PERMISSION",
    /// View the details of every portfolio.
    PortfolioViewDetailsAll => "PORTFOLIO_VIEW_DETAILS_ALL_PERMISSION",
    /// View the details of managed portfolios.
    PortfolioViewDetailsAsManager => "PORTFOLIO_VIEW_DETAILS_AS_MANAGER_PERMISSION",
    /// View the details of portfolios the user is a stakeholder of.
    PortfolioViewDetailsAsStakeholder => "PORTFOLIO_VIEW_DETAILS_AS_STAKEHOLDER_PERMISSION",
    /// Edit every portfolio.
    PortfolioEditAll => "PORTFOLIO_EDIT_ALL_PERMISSION",
    /// Edit managed portfolios.
    PortfolioEditAsPortfolioManager => "PORTFOLIO_EDIT_AS_PORTFOLIO_MANAGER_PERMISSION",
    /// View the financial part of every portfolio.
    PortfolioViewFinancialInfoAll => "PORTFOLIO_VIEW_FINANCIAL_INFO_ALL_PERMISSION",
    /// View the financial part of managed portfolios.
    PortfolioViewFinancialInfoAsManager => "PORTFOLIO_VIEW_FINANCIAL_INFO_AS_MANAGER_PERMISSION",
    /// View the details of every portfolio entry.
    PortfolioEntryViewDetailsAll => "PORTFOLIO_ENTRY_VIEW_DETAILS_ALL_PERMISSION",
    /// View public portfolio entries that are not concepts.
    PortfolioEntryViewPublic => "PORTFOLIO_ENTRY_VIEW_PUBLIC_PERMISSION",
    /// View the details of managed portfolio entries.
    PortfolioEntryViewDetailsAsManager => "PORTFOLIO_ENTRY_VIEW_DETAILS_AS_MANAGER_PERMISSION",
    /// View the details of portfolio entries the user is a stakeholder of, directly or via a portfolio.
    PortfolioEntryViewDetailsAsStakeholder => "PORTFOLIO_ENTRY_VIEW_DETAILS_AS_STAKEHOLDER_PERMISSION",
    /// View the details of portfolio entries belonging to a managed portfolio.
    PortfolioEntryViewDetailsAsPortfolioManager => "PORTFOLIO_ENTRY_VIEW_DETAILS_AS_PORTFOLIO_MANAGER_PERMISSION",
    /// Edit every portfolio entry.
    PortfolioEntryEditAll => "PORTFOLIO_ENTRY_EDIT_ALL_PERMISSION",
    /// Edit managed portfolio entries.
    PortfolioEntryEditAsManager => "PORTFOLIO_ENTRY_EDIT_AS_MANAGER_PERMISSION",
    /// Edit portfolio entries belonging to a managed portfolio.
    PortfolioEntryEditAsPortfolioManager => "PORTFOLIO_ENTRY_EDIT_AS_PORTFOLIO_MANAGER_PERMISSION",
    /// Delete every portfolio entry.
    PortfolioEntryDeleteAll => "PORTFOLIO_ENTRY_DELETE_ALL_PERMISSION",
    /// View the financial part of every portfolio entry.
    PortfolioEntryViewFinancialInfoAll => "PORTFOLIO_ENTRY_VIEW_FINANCIAL_INFO_ALL_PERMISSION",
    /// View the financial part of managed portfolio entries.
    PortfolioEntryViewFinancialInfoAsManager => "PORTFOLIO_ENTRY_VIEW_FINANCIAL_INFO_AS_MANAGER_PERMISSION",
    /// View the financial part of portfolio entries the user is a stakeholder of.
    PortfolioEntryViewFinancialInfoAsStakeholder => "PORTFOLIO_ENTRY_VIEW_FINANCIAL_INFO_AS_STAKEHOLDER_PERMISSION",
    /// View the financial part of portfolio entries belonging to a managed portfolio.
    PortfolioEntryViewFinancialInfoAsPortfolioManager => "PORTFOLIO_ENTRY_VIEW_FINANCIAL_INFO_AS_PORTFOLIO_MANAGER_PERMISSION",
    /// Edit the financial part of every portfolio entry.
    PortfolioEntryEditFinancialInfoAll => "PORTFOLIO_ENTRY_EDIT_FINANCIAL_INFO_ALL_PERMISSION",
    /// Edit the financial part of managed portfolio entries.
    PortfolioEntryEditFinancialInfoAsManager => "PORTFOLIO_ENTRY_EDIT_FINANCIAL_INFO_AS_MANAGER_PERMISSION",
    /// Request a review on every portfolio entry.
    PortfolioEntryReviewRequestAll => "PORTFOLIO_ENTRY_REVIEW_REQUEST_ALL_PERMISSION",
    /// Request a review on portfolio entries belonging to a managed portfolio.
    PortfolioEntryReviewRequestAsPortfolioManager => "PORTFOLIO_ENTRY_REVIEW_REQUEST_AS_PORTFOLIO_MANAGER_PERMISSION",
    /// View every budget bucket.
    BudgetBucketViewAll => "BUDGET_BUCKET_VIEW_ALL_PERMISSION",
    /// View budget buckets owned by the user or by the user's subordinates.
    BudgetBucketViewAsOwner => "BUDGET_BUCKET_VIEW_AS_OWNER_PERMISSION",
    /// Edit every budget bucket.
    BudgetBucketEditAll => "BUDGET_BUCKET_EDIT_ALL_PERMISSION",
    /// Edit budget buckets owned by the user or by the user's subordinates.
    BudgetBucketEditAsOwner => "BUDGET_BUCKET_EDIT_AS_OWNER_PERMISSION",
    /// View every release.
    ReleaseViewAll => "RELEASE_VIEW_ALL_PERMISSION",
    /// View managed releases.
    ReleaseViewAsManager => "RELEASE_VIEW_AS_MANAGER_PERMISSION",
    /// Edit every release.
    ReleaseEditAll => "RELEASE_EDIT_ALL_PERMISSION",
    /// Edit managed releases.
    ReleaseEditAsManager => "RELEASE_EDIT_AS_MANAGER_PERMISSION",
    /// View every report.
    ReportingViewAll => "REPORTING_VIEW_ALL_PERMISSION",
    /// View public reports and reports shared with the user.
    ReportingViewAsViewer => "REPORTING_VIEW_AS_VIEWER_PERMISSION",
    /// Approve every timesheet report.
    TimesheetApprovalAll => "TIMESHEET_APPROVAL_ALL_PERMISSION",
    /// Approve timesheets of actors managed by the user or by the user's subordinates.
    TimesheetApprovalAsManager => "TIMESHEET_APPROVAL_AS_MANAGER_PERMISSION",
}
