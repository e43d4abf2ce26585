use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::StoreError;
use crate::model::{PlanningItem, PlanningStatus, Project, ProjectId, Resource, ResourceId};

pub trait ResourceProvider {
    fn resources(&self) -> Vec<Resource>;
}

pub trait ProjectProvider {
    fn projects(&self) -> Vec<Project>;
}

pub trait PlanningStore {
    fn create_planning_item(&mut self, item: PlanningItem) -> Result<PlanningItem, StoreError>;

    /// Persists a whole batch or nothing.
    fn create_many(&mut self, items: Vec<PlanningItem>) -> Result<Vec<PlanningItem>, StoreError>;

    fn list_planning_items(&self, filter: &PlanningFilter)
        -> Result<Vec<PlanningItem>, StoreError>;
}

/// Optional address suggestions. Purely advisory.
pub trait LocationLookup {
    fn suggest(&self, text: &str) -> Vec<String>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanningFilter {
    pub resource_id: Option<ResourceId>,
    pub project_id: Option<ProjectId>,
    /// Inclusive.
    pub from: Option<NaiveDate>,
    /// Inclusive.
    pub to: Option<NaiveDate>,
    pub status: Option<PlanningStatus>,
}

impl PlanningFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource_id(mut self, resource_id: ResourceId) -> Self {
        self.resource_id = Some(resource_id);
        self
    }

    pub fn with_project_id(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn with_dates(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn with_status(mut self, status: PlanningStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, item: &PlanningItem) -> bool {
        if let Some(ref resource_id) = self.resource_id {
            if item.assigned_resource_id != *resource_id {
                return false;
            }
        }

        if let Some(ref project_id) = self.project_id {
            if item.project_id != *project_id {
                return false;
            }
        }

        if self.from.is_some_and(|from| item.date < from) {
            return false;
        }

        if self.to.is_some_and(|to| item.date > to) {
            return false;
        }

        if let Some(status) = self.status {
            if item.status != status {
                return false;
            }
        }

        true
    }
}

/// Ordered collection of planning items. Grows only through `append` and
/// `append_many`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    items: Vec<PlanningItem>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, item: PlanningItem) {
        self.items.push(item);
    }

    pub fn append_many(&mut self, items: impl IntoIterator<Item = PlanningItem>) {
        self.items.extend(items);
    }

    pub fn items(&self) -> &[PlanningItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains_id(&self, item: &PlanningItem) -> bool {
        self.items.iter().any(|i| i.id == item.id)
    }

    pub fn filtered<'a>(
        &'a self,
        filter: &'a PlanningFilter,
    ) -> impl Iterator<Item = &'a PlanningItem> + 'a {
        self.items.iter().filter(move |i| filter.matches(i))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    schedule: Schedule,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: impl IntoIterator<Item = PlanningItem>) -> Self {
        let mut schedule = Schedule::new();
        schedule.append_many(items);
        Self { schedule }
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }
}

impl PlanningStore for MemoryStore {
    fn create_planning_item(&mut self, item: PlanningItem) -> Result<PlanningItem, StoreError> {
        if self.schedule.contains_id(&item) {
            return Err(StoreError::Rejected(format!("duplicate id {}", item.id)));
        }
        debug!(id = %item.id, date = %item.date, "planning item stored");
        self.schedule.append(item.clone());
        Ok(item)
    }

    fn create_many(&mut self, items: Vec<PlanningItem>) -> Result<Vec<PlanningItem>, StoreError> {
        let mut seen = HashSet::new();
        for item in &items {
            if !seen.insert(&item.id) || self.schedule.contains_id(item) {
                return Err(StoreError::Rejected(format!("duplicate id {}", item.id)));
            }
        }
        debug!(count = items.len(), "planning batch stored");
        self.schedule.append_many(items.iter().cloned());
        Ok(items)
    }

    fn list_planning_items(
        &self,
        filter: &PlanningFilter,
    ) -> Result<Vec<PlanningItem>, StoreError> {
        Ok(self.schedule.filtered(filter).cloned().collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    pub resources: Vec<Resource>,
    pub projects: Vec<Project>,
}

impl ResourceProvider for StaticDirectory {
    fn resources(&self) -> Vec<Resource> {
        self.resources.clone()
    }
}

impl ProjectProvider for StaticDirectory {
    fn projects(&self) -> Vec<Project> {
        self.projects.clone()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;

    fn item(resource: &str, day: u32) -> PlanningItem {
        PlanningItem::scheduled(
            NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            resource.into(),
            "p-1".into(),
        )
    }

    #[test]
    fn test_empty_filter_matches_all() {
        assert!(PlanningFilter::new().matches(&item("anna", 2)));
    }

    #[test]
    fn test_filter_by_resource_and_dates() {
        let filter = PlanningFilter::new()
            .with_resource_id("anna".into())
            .with_dates(
                NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 8).unwrap(),
            );

        assert!(filter.matches(&item("anna", 2)));
        assert!(filter.matches(&item("anna", 8)));
        assert!(!filter.matches(&item("anna", 9)));
        assert!(!filter.matches(&item("ben", 3)));
    }

    #[test]
    fn test_filter_by_status() {
        let filter = PlanningFilter::new().with_status(PlanningStatus::Confirmed);
        let mut it = item("anna", 2);
        assert!(!filter.matches(&it));
        it.status = PlanningStatus::Confirmed;
        assert!(filter.matches(&it));
    }

    #[test]
    fn test_schedule_keeps_insertion_order() {
        let mut schedule = Schedule::new();
        schedule.append(item("anna", 5));
        schedule.append_many([item("anna", 2), item("anna", 3)]);

        let days: Vec<_> = schedule.items().iter().map(|i| i.date).collect();
        assert_eq!(days.len(), 3);
        assert!(days[0] > days[1]);
    }

    #[test]
    fn test_memory_store_rejects_duplicates() {
        let mut store = MemoryStore::new();
        let it = item("anna", 2);
        store.create_planning_item(it.clone()).unwrap();
        assert!(store.create_planning_item(it.clone()).is_err());

        // a batch containing a known id is rejected as a whole
        let fresh = item("anna", 3);
        assert!(store.create_many(vec![fresh, it]).is_err());
        assert_eq!(store.schedule().len(), 1);
    }

    #[test]
    fn test_memory_store_list() {
        let mut store = MemoryStore::new();
        store
            .create_many(vec![item("anna", 2), item("ben", 2), item("anna", 4)])
            .unwrap();

        let listed = store
            .list_planning_items(&PlanningFilter::new().with_resource_id("anna".into()))
            .unwrap();
        assert_eq!(listed.len(), 2);
    }
}
