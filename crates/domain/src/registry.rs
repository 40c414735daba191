use std::collections::BTreeMap;

use bizdock_core::{AppError, AppResult};

use crate::{
    AccessClause, AccessField, AccessRule, AccessRuleSet, AccessValue, Operation, Permission,
    Relationship, ResourceType,
};

/// Deployment switches that change the default rule table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryOptions {
    /// Allows editing archived portfolio entries.
    pub manage_archived_portfolio_entries: bool,
}

/// Immutable per resource type and operation access rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRuleRegistry {
    rule_sets: BTreeMap<(ResourceType, Operation), AccessRuleSet>,
}

impl AccessRuleRegistry {
    /// Creates a registry from rule sets. Later duplicates are rejected.
    pub fn new(rule_sets: impl IntoIterator<Item = AccessRuleSet>) -> AppResult<Self> {
        let mut indexed = BTreeMap::new();
        for rule_set in rule_sets {
            let key = (rule_set.resource_type(), rule_set.operation());
            if indexed.insert(key, rule_set).is_some() {
                return Err(AppError::Validation(format!(
                    "duplicate access rules for {} {}",
                    key.0, key.1
                )));
            }
        }

        Ok(Self {
            rule_sets: indexed,
        })
    }

    /// Builds the BizDock rule table.
    #[must_use]
    pub fn bizdock(options: &RegistryOptions) -> Self {
        let rule_sets = bizdock_rule_sets(options)
            .into_iter()
            .map(|rule_set| ((rule_set.resource_type(), rule_set.operation()), rule_set))
            .collect();

        Self { rule_sets }
    }

    /// Returns the rule set for a resource type and operation.
    pub fn rule_set(
        &self,
        resource_type: ResourceType,
        operation: Operation,
    ) -> AppResult<&AccessRuleSet> {
        self.rule_sets
            .get(&(resource_type, operation))
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "operation '{operation}' is not defined for resource type '{resource_type}'"
                ))
            })
    }

    /// Returns the operations defined for a resource type.
    #[must_use]
    pub fn operations(&self, resource_type: ResourceType) -> Vec<Operation> {
        self.rule_sets
            .keys()
            .filter(|(candidate, _)| *candidate == resource_type)
            .map(|(_, operation)| *operation)
            .collect()
    }
}

fn actor_is(field: AccessField) -> Relationship {
    Relationship::ActorIs { field }
}

fn actor_or_subordinate_is(field: AccessField) -> Relationship {
    Relationship::ActorOrSubordinateIs { field }
}

fn portfolio_entry_rule_set(
    operation: Operation,
    blanket: Permission,
    rules: impl IntoIterator<Item = AccessRule>,
) -> AccessRuleSet {
    rules.into_iter().fold(
        AccessRuleSet::new(ResourceType::PortfolioEntry, operation).with_blanket(blanket),
        AccessRuleSet::with_rule,
    )
}

fn bizdock_rule_sets(options: &RegistryOptions) -> Vec<AccessRuleSet> {
    let public_entry = Relationship::AllOf {
        relationships: vec![
            Relationship::FlagIs {
                field: AccessField::IsPublic,
                value: true,
            },
            Relationship::FlagIs {
                field: AccessField::IsConcept,
                value: false,
            },
        ],
    };

    let mut edit_portfolio_entry = portfolio_entry_rule_set(
        Operation::Edit,
        Permission::PortfolioEntryEditAll,
        [
            AccessRule::granted_by(
                Permission::PortfolioEntryEditAsManager,
                actor_is(AccessField::ManagerId),
            ),
            AccessRule::granted_by(
                Permission::PortfolioEntryEditAsPortfolioManager,
                actor_is(AccessField::PortfolioManagerIds),
            ),
        ],
    );
    if !options.manage_archived_portfolio_entries {
        edit_portfolio_entry = edit_portfolio_entry.with_guard(AccessClause::FieldEquals {
            field: AccessField::Archived,
            value: AccessValue::Bool(false),
        });
    }

    vec![
        AccessRuleSet::new(ResourceType::Actor, Operation::View)
            .with_blanket(Permission::ActorViewAll)
            .with_rule(AccessRule::implicit(Relationship::IsPrincipalActor))
            .with_rule(AccessRule::granted_by(
                Permission::ActorViewAsSuperior,
                actor_or_subordinate_is(AccessField::ManagerId),
            )),
        AccessRuleSet::new(ResourceType::Actor, Operation::Edit)
            .with_blanket(Permission::ActorEditAll)
            .with_rule(AccessRule::implicit(Relationship::IsPrincipalActor)),
        AccessRuleSet::new(ResourceType::Actor, Operation::Delete)
            .with_blanket(Permission::ActorEditAll),
        AccessRuleSet::new(ResourceType::OrgUnit, Operation::View)
            .with_blanket(Permission::OrgUnitViewAll)
            .with_rule(AccessRule::granted_by(
                Permission::OrgUnitViewAsResponsible,
                actor_or_subordinate_is(AccessField::ManagerId),
            )),
        AccessRuleSet::new(ResourceType::Portfolio, Operation::View)
            .with_blanket(Permission::PortfolioViewDetailsAll)
            .with_rule(AccessRule::granted_by(
                Permission::PortfolioViewDetailsAsManager,
                actor_is(AccessField::ManagerId),
            ))
            .with_rule(AccessRule::granted_by(
                Permission::PortfolioViewDetailsAsStakeholder,
                actor_is(AccessField::StakeholderActorIds),
            )),
        AccessRuleSet::new(ResourceType::Portfolio, Operation::Edit)
            .with_blanket(Permission::PortfolioEditAll)
            .with_rule(AccessRule::granted_by(
                Permission::PortfolioEditAsPortfolioManager,
                actor_is(AccessField::ManagerId),
            )),
        AccessRuleSet::new(ResourceType::Portfolio, Operation::ViewFinancial)
            .with_blanket(Permission::PortfolioViewFinancialInfoAll)
            .with_rule(AccessRule::granted_by(
                Permission::PortfolioViewFinancialInfoAsManager,
                actor_is(AccessField::ManagerId),
            )),
        portfolio_entry_rule_set(
            Operation::View,
            Permission::PortfolioEntryViewDetailsAll,
            [
                AccessRule::granted_by(Permission::PortfolioEntryViewPublic, public_entry),
                AccessRule::granted_by(
                    Permission::PortfolioEntryViewDetailsAsManager,
                    actor_is(AccessField::ManagerId),
                ),
                AccessRule::granted_by(
                    Permission::PortfolioEntryViewDetailsAsStakeholder,
                    actor_is(AccessField::StakeholderActorIds),
                ),
                AccessRule::granted_by(
                    Permission::PortfolioEntryViewDetailsAsStakeholder,
                    actor_is(AccessField::PortfolioStakeholderActorIds),
                ),
                AccessRule::granted_by(
                    Permission::PortfolioEntryViewDetailsAsPortfolioManager,
                    actor_is(AccessField::PortfolioManagerIds),
                ),
            ],
        ),
        portfolio_entry_rule_set(
            Operation::Details,
            Permission::PortfolioEntryViewDetailsAll,
            [
                AccessRule::granted_by(
                    Permission::PortfolioEntryViewDetailsAsManager,
                    actor_is(AccessField::ManagerId),
                ),
                AccessRule::granted_by(
                    Permission::PortfolioEntryViewDetailsAsStakeholder,
                    actor_is(AccessField::StakeholderActorIds),
                ),
                AccessRule::granted_by(
                    Permission::PortfolioEntryViewDetailsAsStakeholder,
                    actor_is(AccessField::PortfolioStakeholderActorIds),
                ),
                AccessRule::granted_by(
                    Permission::PortfolioEntryViewDetailsAsPortfolioManager,
                    actor_is(AccessField::PortfolioManagerIds),
                ),
            ],
        ),
        edit_portfolio_entry,
        portfolio_entry_rule_set(
            Operation::Delete,
            Permission::PortfolioEntryDeleteAll,
            [],
        ),
        portfolio_entry_rule_set(
            Operation::ViewFinancial,
            Permission::PortfolioEntryViewFinancialInfoAll,
            [
                AccessRule::granted_by(
                    Permission::PortfolioEntryViewFinancialInfoAsManager,
                    actor_is(AccessField::ManagerId),
                ),
                AccessRule::granted_by(
                    Permission::PortfolioEntryViewFinancialInfoAsStakeholder,
                    actor_is(AccessField::StakeholderActorIds),
                ),
                AccessRule::granted_by(
                    Permission::PortfolioEntryViewFinancialInfoAsStakeholder,
                    actor_is(AccessField::PortfolioStakeholderActorIds),
                ),
                AccessRule::granted_by(
                    Permission::PortfolioEntryViewFinancialInfoAsPortfolioManager,
                    actor_is(AccessField::PortfolioManagerIds),
                ),
            ],
        ),
        portfolio_entry_rule_set(
            Operation::EditFinancial,
            Permission::PortfolioEntryEditFinancialInfoAll,
            [AccessRule::granted_by(
                Permission::PortfolioEntryEditFinancialInfoAsManager,
                actor_is(AccessField::ManagerId),
            )],
        ),
        portfolio_entry_rule_set(
            Operation::ReviewRequest,
            Permission::PortfolioEntryReviewRequestAll,
            [AccessRule::granted_by(
                Permission::PortfolioEntryReviewRequestAsPortfolioManager,
                actor_is(AccessField::PortfolioManagerIds),
            )],
        ),
        AccessRuleSet::new(ResourceType::BudgetBucket, Operation::View)
            .with_blanket(Permission::BudgetBucketViewAll)
            .with_rule(AccessRule::granted_by(
                Permission::BudgetBucketViewAsOwner,
                actor_or_subordinate_is(AccessField::OwnerId),
            )),
        AccessRuleSet::new(ResourceType::BudgetBucket, Operation::Edit)
            .with_blanket(Permission::BudgetBucketEditAll)
            .with_rule(AccessRule::granted_by(
                Permission::BudgetBucketEditAsOwner,
                actor_or_subordinate_is(AccessField::OwnerId),
            )),
        AccessRuleSet::new(ResourceType::Release, Operation::View)
            .with_blanket(Permission::ReleaseViewAll)
            .with_rule(AccessRule::granted_by(
                Permission::ReleaseViewAsManager,
                actor_is(AccessField::ManagerId),
            )),
        AccessRuleSet::new(ResourceType::Release, Operation::Edit)
            .with_blanket(Permission::ReleaseEditAll)
            .with_rule(AccessRule::granted_by(
                Permission::ReleaseEditAsManager,
                actor_is(AccessField::ManagerId),
            )),
        AccessRuleSet::new(ResourceType::Reporting, Operation::View)
            .with_blanket(Permission::ReportingViewAll)
            .with_rule(AccessRule::granted_by(
                Permission::ReportingViewAsViewer,
                Relationship::AnyOf {
                    relationships: vec![
                        Relationship::FlagIs {
                            field: AccessField::IsPublic,
                            value: true,
                        },
                        Relationship::PrincipalListedIn {
                            field: AccessField::AuthorizedPrincipals,
                        },
                    ],
                },
            )),
        AccessRuleSet::new(ResourceType::TimesheetReport, Operation::Approve)
            .with_blanket(Permission::TimesheetApprovalAll)
            .with_rule(AccessRule::granted_by(
                Permission::TimesheetApprovalAsManager,
                actor_or_subordinate_is(AccessField::ActorManagerId),
            )),
    ]
}

#[cfg(test)]
mod tests {
    use super::{AccessRuleRegistry, RegistryOptions};
    use crate::{AccessField, AccessRuleSet, Operation, Permission, ResourceType};

    #[test]
    fn every_resource_type_defines_its_listing_operation() {
        let registry = AccessRuleRegistry::bizdock(&RegistryOptions::default());

        for resource_type in ResourceType::all() {
            let rule_set = registry.rule_set(*resource_type, resource_type.listing_operation());
            assert!(rule_set.is_ok(), "missing listing rules for {resource_type}");
        }
    }

    #[test]
    fn undefined_operation_is_a_validation_error() {
        let registry = AccessRuleRegistry::bizdock(&RegistryOptions::default());

        let result = registry.rule_set(ResourceType::Reporting, Operation::Delete);
        assert!(matches!(result, Err(bizdock_core::AppError::Validation(_))));
    }

    #[test]
    fn every_rule_set_has_a_blanket_permission() {
        let registry = AccessRuleRegistry::bizdock(&RegistryOptions::default());

        for resource_type in ResourceType::all() {
            for operation in registry.operations(*resource_type) {
                let blanket = registry
                    .rule_set(*resource_type, operation)
                    .ok()
                    .and_then(AccessRuleSet::blanket);
                assert!(blanket.is_some(), "{resource_type} {operation} has no blanket");
            }
        }
    }

    #[test]
    fn archived_entries_are_guarded_unless_manageable() {
        let guarded = AccessRuleRegistry::bizdock(&RegistryOptions::default());
        let open = AccessRuleRegistry::bizdock(&RegistryOptions {
            manage_archived_portfolio_entries: true,
        });

        let guards = |registry: &AccessRuleRegistry| {
            registry
                .rule_set(ResourceType::PortfolioEntry, Operation::Edit)
                .map(|rule_set| rule_set.guards().len())
                .unwrap_or(usize::MAX)
        };

        assert_eq!(guards(&guarded), 1);
        assert_eq!(guards(&open), 0);
    }

    #[test]
    fn stakeholder_view_covers_direct_and_portfolio_stakeholders() {
        let registry = AccessRuleRegistry::bizdock(&RegistryOptions::default());
        let Ok(rule_set) = registry.rule_set(ResourceType::PortfolioEntry, Operation::View) else {
            panic!("portfolio entry view rules should exist");
        };

        let stakeholder_fields: Vec<AccessField> = rule_set
            .rules()
            .iter()
            .filter(|rule| {
                rule.permission() == Some(Permission::PortfolioEntryViewDetailsAsStakeholder)
            })
            .filter_map(|rule| match rule.relationship() {
                crate::Relationship::ActorIs { field } => Some(*field),
                _ => None,
            })
            .collect();

        assert_eq!(
            stakeholder_fields,
            vec![
                AccessField::StakeholderActorIds,
                AccessField::PortfolioStakeholderActorIds
            ]
        );
    }

    #[test]
    fn duplicate_rule_sets_are_rejected() {
        let registry = AccessRuleRegistry::new([
            AccessRuleSet::new(ResourceType::Release, Operation::View),
            AccessRuleSet::new(ResourceType::Release, Operation::View),
        ]);

        assert!(registry.is_err());
    }
}
