use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bizdock_core::{ActorId, AppError, AppResult, ResourceId};
use bizdock_domain::{PageRequest, Principal, QueryPlan, ResourceRecord, ResourceType};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::{ActorHierarchyRepository, PrincipalRepository, ResourceStore};

pub(crate) fn principal(
    subject: &str,
    permissions: &[&str],
    actor_id: Option<i64>,
) -> Principal {
    match Principal::new(
        subject,
        permissions.iter().copied(),
        actor_id.map(ActorId::new),
    ) {
        Ok(principal) => principal,
        Err(error) => panic!("invalid test principal: {error}"),
    }
}

pub(crate) fn record(
    resource_type: ResourceType,
    id: i64,
    deleted: bool,
    data: Value,
) -> ResourceRecord {
    match ResourceRecord::new(ResourceId::new(id), resource_type, deleted, data) {
        Ok(record) => record,
        Err(error) => panic!("invalid test record: {error}"),
    }
}

#[derive(Default)]
pub(crate) struct FakePrincipalRepository {
    pub(crate) principals: HashMap<String, Principal>,
    pub(crate) delay: Option<Duration>,
}

#[async_trait]
impl PrincipalRepository for FakePrincipalRepository {
    async fn find_principal(&self, subject: &str) -> AppResult<Option<Principal>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        Ok(self.principals.get(subject).cloned())
    }
}

/// Manager to direct reports, with a log of every level requested.
#[derive(Default)]
pub(crate) struct FakeHierarchy {
    pub(crate) reports: HashMap<ActorId, Vec<ActorId>>,
    pub(crate) fail: bool,
    pub(crate) calls: Mutex<Vec<Vec<ActorId>>>,
}

impl FakeHierarchy {
    pub(crate) fn from_edges(edges: &[(i64, i64)]) -> Self {
        let mut reports: HashMap<ActorId, Vec<ActorId>> = HashMap::new();
        for (manager, report) in edges {
            reports
                .entry(ActorId::new(*manager))
                .or_default()
                .push(ActorId::new(*report));
        }

        Self {
            reports,
            ..Self::default()
        }
    }

    pub(crate) async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait]
impl ActorHierarchyRepository for FakeHierarchy {
    async fn list_direct_reports(&self, managers: &[ActorId]) -> AppResult<Vec<ActorId>> {
        self.calls.lock().await.push(managers.to_vec());
        if self.fail {
            return Err(AppError::Internal("hierarchy table unavailable".to_owned()));
        }

        Ok(managers
            .iter()
            .filter_map(|manager| self.reports.get(manager))
            .flatten()
            .copied()
            .collect())
    }
}

/// Store evaluating plans in-process, recording every plan it receives.
#[derive(Default)]
pub(crate) struct FakeResourceStore {
    pub(crate) records: Vec<ResourceRecord>,
    pub(crate) plans: Mutex<Vec<QueryPlan>>,
}

#[async_trait]
impl ResourceStore for FakeResourceStore {
    async fn count_resources(&self, plan: &QueryPlan) -> AppResult<u64> {
        self.plans.lock().await.push(plan.clone());
        let count = self
            .records
            .iter()
            .filter(|record| plan.matches(record))
            .count();

        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn list_resources(
        &self,
        plan: &QueryPlan,
        page: PageRequest,
    ) -> AppResult<Vec<ResourceRecord>> {
        self.plans.lock().await.push(plan.clone());
        let mut matching: Vec<ResourceRecord> = self
            .records
            .iter()
            .filter(|record| plan.matches(record))
            .cloned()
            .collect();
        matching.sort_by(|left, right| plan.compare(left, right));

        Ok(matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect())
    }
}
