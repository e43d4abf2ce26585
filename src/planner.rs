use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, info, warn};

use crate::error::{PlannerError, Result, ValidationError};
use crate::model::{
    CalendarEvent, EventId, PlanningItem, PlanningStatus, Project, ProjectId, Resource,
    ResourceId,
};
use crate::recurrence::{self, GeneratedPlan, RecurrenceSpec, WeekdaySet};
use crate::settings::{BookingPolicy, Settings};
use crate::store::{
    LocationLookup, PlanningFilter, PlanningStore, ProjectProvider, ResourceProvider, Schedule,
};
use crate::time;
use crate::view::CalendarHandler;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanDraft {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub assigned_resource_id: Option<ResourceId>,
    pub project_id: Option<ProjectId>,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl PlanDraft {
    pub fn new(date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            date,
            start_time,
            end_time,
            assigned_resource_id: None,
            project_id: None,
            location: None,
            description: None,
        }
    }

    pub fn assign(mut self, resource: impl Into<ResourceId>, project: impl Into<ProjectId>) -> Self {
        self.assigned_resource_id = Some(resource.into());
        self.project_id = Some(project.into());
        self
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    /// Opened from a drag range or explicitly.
    Single(PlanDraft),
    /// Opened from a single-slot click; fixed default duration.
    Quick(PlanDraft),
    /// Multi-day plan, prefilled with a one-day range.
    Recurring {
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Failure(String),
}

pub struct Planner<S: PlanningStore> {
    store: S,
    settings: Settings,
    resources: Vec<Resource>,
    projects: Vec<Project>,
    locator: Option<Box<dyn LocationLookup>>,
    schedule: Schedule,
    dialog: Option<Dialog>,
    selected_event: Option<EventId>,
    notices: Vec<Notice>,
}

impl<S: PlanningStore> Planner<S> {
    pub fn new(
        store: S,
        settings: Settings,
        resources: &dyn ResourceProvider,
        projects: &dyn ProjectProvider,
    ) -> Self {
        Self {
            store,
            settings,
            resources: resources.resources(),
            projects: projects.projects(),
            locator: None,
            schedule: Schedule::new(),
            dialog: None,
            selected_event: None,
            notices: Vec::new(),
        }
    }

    pub fn with_locator(mut self, locator: Box<dyn LocationLookup>) -> Self {
        self.locator = Some(locator);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    pub fn selected_event(&self) -> Option<&EventId> {
        self.selected_event.as_ref()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Replaces the visible schedule with what the store returns.
    pub fn refresh(&mut self, filter: &PlanningFilter) -> Result<()> {
        let items = self.store.list_planning_items(filter).map_err(|err| {
            warn!(error = %err, "failed to load planning items");
            self.notices.push(Notice::Failure(err.to_string()));
            err
        })?;
        self.schedule = Schedule::new();
        self.schedule.append_many(items);
        Ok(())
    }

    pub fn calendar_events(&self) -> Vec<CalendarEvent> {
        self.schedule
            .items()
            .iter()
            .map(|item| {
                let project = self.projects.iter().find(|p| p.id == item.project_id);
                let resource = self
                    .resources
                    .iter()
                    .find(|r| r.id == item.assigned_resource_id);
                item.to_calendar_event(project, resource)
            })
            .collect()
    }

    /// Raw text is always acceptable; suggestions only help.
    pub fn location_suggestions(&self, text: &str) -> Vec<String> {
        match &self.locator {
            Some(locator) if !text.trim().is_empty() => locator.suggest(text),
            _ => Vec::new(),
        }
    }

    pub fn open_single(&mut self, date: NaiveDate, start_hour: u32, end_hour: u32) {
        let start = hour_time(start_hour);
        let end = hour_time(end_hour);
        debug!(%date, start_hour, end_hour, "opening single plan dialog");
        self.dialog = Some(Dialog::Single(PlanDraft::new(date, start, end)));
    }

    pub fn open_quick(&mut self, date: NaiveDate, hour: u32) {
        let start = hour_time(hour);
        let end = end_after(start, self.settings.calendar.quick_duration_minutes);
        debug!(%date, hour, "opening quick plan dialog");
        self.dialog = Some(Dialog::Quick(PlanDraft::new(date, start, end)));
    }

    pub fn open_recurring(&mut self, date: NaiveDate) {
        debug!(%date, "opening recurring plan dialog");
        self.dialog = Some(Dialog::Recurring {
            start_date: date,
            end_date: date,
        });
    }

    pub fn dismiss_dialog(&mut self) {
        if self.dialog.take().is_some() {
            debug!("dialog dismissed");
        }
    }

    pub fn submit_plan(&mut self, draft: PlanDraft) -> Result<PlanningItem> {
        if !matches!(self.dialog, Some(Dialog::Single(_) | Dialog::Quick(_))) {
            return Err(PlannerError::NoDialog);
        }

        let item = self.validate_draft(draft).map_err(|err| self.reject(err))?;
        self.check_booking(std::slice::from_ref(&item))?;

        match self.store.create_planning_item(item) {
            Ok(created) => {
                info!(id = %created.id, date = %created.date, "planning item created");
                self.schedule.append(created.clone());
                self.dialog = None;
                self.notices
                    .push(Notice::Success("planning item created".to_string()));
                Ok(created)
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    pub fn quick_create(
        &mut self,
        date: NaiveDate,
        hour: u32,
        resource: Option<ResourceId>,
        project: Option<ProjectId>,
    ) -> Result<PlanningItem> {
        self.open_quick(date, hour);
        let Some(Dialog::Quick(mut draft)) = self.dialog.clone() else {
            return Err(PlannerError::NoDialog);
        };
        draft.assigned_resource_id = resource;
        draft.project_id = project;
        self.submit_plan(draft)
    }

    /// Expands and persists a multi-day plan as one batch.
    pub fn submit_recurring(&mut self, spec: RecurrenceSpec) -> Result<GeneratedPlan> {
        if !matches!(self.dialog, Some(Dialog::Recurring { .. })) {
            return Err(PlannerError::NoDialog);
        }

        let plan = self
            .check_known(&spec.assigned_resource_id, &spec.project_id)
            .and_then(|_| recurrence::generate(&spec))
            .map_err(|err| self.reject(err))?;
        self.check_booking(&plan.items)?;

        match self.store.create_many(plan.items.clone()) {
            Ok(items) => {
                let plan = GeneratedPlan { items };
                info!(count = plan.count(), "recurring plan created");
                self.schedule.append_many(plan.items.iter().cloned());
                self.dialog = None;
                self.notices.push(Notice::Success(plan.summary()));
                Ok(plan)
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Existing items of the same resource overlapping `item`. Cancelled
    /// items hold no time.
    pub fn conflicts(&self, item: &PlanningItem) -> Result<Vec<PlanningItem>> {
        let filter = PlanningFilter::new()
            .with_resource_id(item.assigned_resource_id.clone())
            .with_dates(item.date, item.date);
        let existing = self.store.list_planning_items(&filter)?;
        Ok(existing
            .into_iter()
            .filter(|other| other.status != PlanningStatus::Cancelled)
            .filter(|other| other.id != item.id && other.overlaps(item))
            .collect())
    }

    fn validate_draft(
        &self,
        draft: PlanDraft,
    ) -> std::result::Result<PlanningItem, ValidationError> {
        let resource = draft
            .assigned_resource_id
            .filter(|r| !r.is_blank())
            .ok_or(ValidationError::MissingField("resource"))?;
        let project = draft
            .project_id
            .filter(|p| !p.is_blank())
            .ok_or(ValidationError::MissingField("project"))?;
        self.check_known(&resource, &project)?;

        if draft.start_time >= draft.end_time {
            return Err(ValidationError::InvalidTimeRange);
        }

        let item =
            PlanningItem::scheduled(draft.date, draft.start_time, draft.end_time, resource, project);
        Ok(item
            .with_location(draft.location)
            .with_description(draft.description))
    }

    fn check_known(
        &self,
        resource: &ResourceId,
        project: &ProjectId,
    ) -> std::result::Result<(), ValidationError> {
        if !self.resources.iter().any(|r| r.id == *resource) {
            return Err(ValidationError::UnknownResource(resource.clone()));
        }
        if !self.projects.iter().any(|p| p.id == *project) {
            return Err(ValidationError::UnknownProject(project.clone()));
        }
        Ok(())
    }

    /// Nothing is created when the store cannot answer the conflict query.
    fn check_booking(&mut self, items: &[PlanningItem]) -> Result<()> {
        if self.settings.booking.policy == BookingPolicy::AllowOverlap {
            return Ok(());
        }

        for item in items {
            let existing = self.conflicts(item).map_err(|err| self.fail(err))?;
            if !existing.is_empty() {
                return Err(self.reject(ValidationError::Conflict {
                    resource: item.assigned_resource_id.clone(),
                    date: item.date,
                    existing: existing.len(),
                }));
            }
        }
        Ok(())
    }

    /// Validation failure: report and keep the dialog open.
    fn reject(&mut self, err: ValidationError) -> PlannerError {
        debug!(error = %err, "plan rejected");
        self.notices.push(Notice::Failure(err.to_string()));
        err.into()
    }

    /// Store failure: report; nothing is added to the schedule.
    fn fail(&mut self, err: PlannerError) -> PlannerError {
        warn!(error = %err, "planning store failed");
        self.notices.push(Notice::Failure(err.to_string()));
        err
    }
}

impl<S: PlanningStore> CalendarHandler for Planner<S> {
    fn on_event_click(&mut self, event: &CalendarEvent) {
        self.selected_event = Some(event.id.clone());
    }

    fn on_time_slot_click(&mut self, date: NaiveDate, hour: u32) {
        self.open_quick(date, hour);
    }

    fn on_range_create(&mut self, date: NaiveDate, start_hour: u32, end_hour: u32) {
        self.open_single(date, start_hour, end_hour);
    }
}

/// Top of a grid row; hour 24 maps to the last minute of the day.
fn hour_time(hour: u32) -> NaiveTime {
    time::hour_to_time(hour)
        .or_else(|| NaiveTime::from_hms_opt(23, 59, 0))
        .unwrap_or(NaiveTime::MIN)
}

fn end_after(start: NaiveTime, minutes: u32) -> NaiveTime {
    let (end, wrapped) =
        start.overflowing_add_signed(chrono::TimeDelta::minutes(i64::from(minutes)));
    if wrapped != 0 {
        hour_time(24)
    } else {
        end
    }
}

/// [`RecurrenceSpec`] prefilled from an open recurring dialog.
pub fn recurring_spec(
    start_date: NaiveDate,
    end_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    weekdays: WeekdaySet,
    resource: impl Into<ResourceId>,
    project: impl Into<ProjectId>,
) -> RecurrenceSpec {
    RecurrenceSpec {
        start_date,
        end_date,
        start_time,
        end_time,
        weekdays,
        assigned_resource_id: resource.into(),
        project_id: project.into(),
        location: None,
        description: None,
    }
}
