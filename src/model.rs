use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::time;

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(ResourceId);
string_id!(ProjectId);
string_id!(PlanningItemId);
string_id!(EventId);

impl PlanningItemId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub display_name: String,
}

impl Resource {
    pub fn new(id: impl Into<ResourceId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub customer_label: String,
}

impl Project {
    pub fn new(
        id: impl Into<ProjectId>,
        title: impl Into<String>,
        customer_label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            customer_label: customer_label.into(),
        }
    }
}

/// Display category of a calendar event. Drives color only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventCategory {
    Planning,
    Appointment,
    Meeting,
    Deadline,
    Cancelled,
}

impl EventCategory {
    pub fn color(self) -> &'static str {
        match self {
            Self::Planning => "#2563eb",
            Self::Appointment => "#16a34a",
            Self::Meeting => "#9333ea",
            Self::Deadline => "#dc2626",
            Self::Cancelled => "#9ca3af",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlanningStatus {
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl PlanningStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Confirmed => "Confirmed",
            Self::InProgress => "In progress",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Scheduled => "#3b82f6",
            Self::Confirmed => "#10b981",
            Self::InProgress => "#f59e0b",
            Self::Completed => "#6b7280",
            Self::Cancelled => "#ef4444",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Lifecycle moves made by external actors. The scheduling engine itself
    /// only ever creates items as `Scheduled`.
    pub fn can_transition_to(self, next: PlanningStatus) -> bool {
        use PlanningStatus::*;
        match (self, next) {
            (Scheduled, Confirmed) | (Confirmed, InProgress) | (InProgress, Completed) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl FromStr for PlanningStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scheduled" => Ok(Self::Scheduled),
            "confirmed" => Ok(Self::Confirmed),
            "in-progress" | "in_progress" | "inprogress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(format!("unknown planning status `{other}`")),
        }
    }
}

/// A renderable appointment. Always a projection; never stored by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: EventId,
    pub title: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub category: EventCategory,
    pub description: Option<String>,
}

impl CalendarEvent {
    pub fn new(
        id: impl Into<EventId>,
        title: impl Into<String>,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        category: EventCategory,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            date,
            start_time,
            end_time,
            category,
            description: None,
        }
    }

    pub fn date_key(&self) -> String {
        time::date_key(self.date)
    }

    pub fn duration_minutes(&self) -> i64 {
        time::span_minutes(self.start_time, self.end_time)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningItem {
    pub id: PlanningItemId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub assigned_resource_id: ResourceId,
    pub project_id: ProjectId,
    pub location: Option<String>,
    pub description: Option<String>,
    pub status: PlanningStatus,
}

impl PlanningItem {
    pub fn scheduled(
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        assigned_resource_id: ResourceId,
        project_id: ProjectId,
    ) -> Self {
        Self {
            id: PlanningItemId::generate(),
            date,
            start_time,
            end_time,
            assigned_resource_id,
            project_id,
            location: None,
            description: None,
            status: PlanningStatus::Scheduled,
        }
    }

    pub fn with_location(mut self, location: Option<String>) -> Self {
        self.location = location.filter(|l| !l.trim().is_empty());
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }

    /// Same resource, same day, intersecting half-open time ranges.
    pub fn overlaps(&self, other: &PlanningItem) -> bool {
        self.assigned_resource_id == other.assigned_resource_id
            && self.date == other.date
            && self.start_time < other.end_time
            && other.start_time < self.end_time
    }

    /// Builds the calendar projection. Falls back to raw ids when the
    /// project or resource is not known to the caller.
    pub fn to_calendar_event(
        &self,
        project: Option<&Project>,
        resource: Option<&Resource>,
    ) -> CalendarEvent {
        let project_label = project.map_or(self.project_id.as_str(), |p| p.title.as_str());
        let resource_label =
            resource.map_or(self.assigned_resource_id.as_str(), |r| r.display_name.as_str());

        let category = match self.status {
            PlanningStatus::Cancelled => EventCategory::Cancelled,
            PlanningStatus::Scheduled
            | PlanningStatus::Confirmed
            | PlanningStatus::InProgress
            | PlanningStatus::Completed => EventCategory::Planning,
        };

        CalendarEvent {
            id: EventId::from(self.id.as_str()),
            title: format!("{project_label} · {resource_label}"),
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            category,
            description: self.description.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(resource: &str, h1: u32, h2: u32) -> PlanningItem {
        PlanningItem::scheduled(
            NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            NaiveTime::from_hms_opt(h1, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(h2, 0, 0).unwrap(),
            resource.into(),
            "p-1".into(),
        )
    }

    #[test]
    fn test_new_items_are_scheduled_with_unique_ids() {
        let a = item("anna", 9, 10);
        let b = item("anna", 9, 10);
        assert_eq!(a.status, PlanningStatus::Scheduled);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_overlaps() {
        assert!(item("anna", 9, 11).overlaps(&item("anna", 10, 12)));
        // touching ranges do not overlap
        assert!(!item("anna", 9, 10).overlaps(&item("anna", 10, 11)));
        assert!(!item("anna", 9, 11).overlaps(&item("ben", 9, 11)));
    }

    #[test]
    fn test_blank_location_is_dropped() {
        let it = item("anna", 9, 10).with_location(Some("  ".into()));
        assert_eq!(it.location, None);
    }

    #[test]
    fn test_projection() {
        let project = Project::new("p-1", "Roof repair", "ACME");
        let resource = Resource::new("anna", "Anna K.");
        let mut it = item("anna", 9, 10);

        let event = it.to_calendar_event(Some(&project), Some(&resource));
        assert_eq!(event.title, "Roof repair · Anna K.");
        assert_eq!(event.category, EventCategory::Planning);
        assert_eq!(event.id.as_str(), it.id.as_str());

        it.status = PlanningStatus::Cancelled;
        let event = it.to_calendar_event(None, None);
        assert_eq!(event.title, "p-1 · anna");
        assert_eq!(event.category, EventCategory::Cancelled);
    }

    #[test]
    fn test_status_transitions() {
        use PlanningStatus::*;
        assert!(Scheduled.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Scheduled));
        assert!(!Scheduled.can_transition_to(InProgress));
        assert_eq!("in-progress".parse::<PlanningStatus>(), Ok(InProgress));
        assert!("paused".parse::<PlanningStatus>().is_err());
    }
}
