use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use tracing::debug;

use crate::error::ValidationError;
use crate::model::{PlanningItem, ProjectId, ResourceId};

const SUNDAY_FIRST: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub fn new() -> Self {
        Self(0)
    }

    /// Builds a set from day numbers where `0` is Sunday and `6` is Saturday.
    /// Out-of-range numbers are ignored.
    pub fn from_indices(indices: impl IntoIterator<Item = u32>) -> Self {
        indices
            .into_iter()
            .filter_map(|i| SUNDAY_FIRST.get(i as usize).copied())
            .collect()
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_sunday();
    }

    pub fn remove(&mut self, day: Weekday) {
        self.0 &= !(1 << day.num_days_from_sunday());
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_sunday()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        SUNDAY_FIRST
            .into_iter()
            .filter(|day| self.contains(*day))
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = Self::new();
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl fmt::Debug for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Parameters of a multi-day plan. Dates are inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceSpec {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub weekdays: WeekdaySet,
    pub assigned_resource_id: ResourceId,
    pub project_id: ProjectId,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl RecurrenceSpec {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.weekdays.is_empty() {
            return Err(ValidationError::NoWeekdays);
        }
        if self.start_date > self.end_date {
            return Err(ValidationError::InvalidDateRange);
        }
        if self.start_time >= self.end_time {
            return Err(ValidationError::InvalidTimeRange);
        }
        if self.assigned_resource_id.is_blank() {
            return Err(ValidationError::MissingField("resource"));
        }
        if self.project_id.is_blank() {
            return Err(ValidationError::MissingField("project"));
        }
        Ok(())
    }
}

/// Items produced from one [`RecurrenceSpec`], in date order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPlan {
    pub items: Vec<PlanningItem>,
}

impl GeneratedPlan {
    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn summary(&self) -> String {
        format!("{} planning items created", self.count())
    }
}

/// Walks every date of the range and emits one `Scheduled` item per date
/// whose weekday is selected. No conflict checking happens here.
pub fn generate(spec: &RecurrenceSpec) -> Result<GeneratedPlan, ValidationError> {
    spec.validate()?;

    let items: Vec<PlanningItem> = spec
        .start_date
        .iter_days()
        .take_while(|date| *date <= spec.end_date)
        .filter(|date| spec.weekdays.contains(date.weekday()))
        .map(|date| {
            PlanningItem::scheduled(
                date,
                spec.start_time,
                spec.end_time,
                spec.assigned_resource_id.clone(),
                spec.project_id.clone(),
            )
            .with_location(spec.location.clone())
            .with_description(spec.description.clone())
        })
        .collect();

    debug!(
        start = %spec.start_date,
        end = %spec.end_date,
        weekdays = ?spec.weekdays,
        count = items.len(),
        "recurring plan expanded"
    );

    Ok(GeneratedPlan { items })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlanningStatus;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn spec(weekdays: WeekdaySet) -> RecurrenceSpec {
        RecurrenceSpec {
            start_date: date(6, 2),
            end_date: date(6, 15),
            start_time: NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            weekdays,
            assigned_resource_id: "anna".into(),
            project_id: "p-17".into(),
            location: Some("Main St 4".into()),
            description: None,
        }
    }

    #[test]
    fn test_weekday_indices_start_on_sunday() {
        let set = WeekdaySet::from_indices([0, 1, 3, 9]);
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![Weekday::Sun, Weekday::Mon, Weekday::Wed]
        );
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_monday_and_wednesday_over_two_weeks() {
        let plan = generate(&spec(WeekdaySet::from_indices([1, 3]))).unwrap();

        let dates: Vec<NaiveDate> = plan.items.iter().map(|i| i.date).collect();
        assert_eq!(dates, vec![date(6, 2), date(6, 4), date(6, 9), date(6, 11)]);
        for item in &plan.items {
            assert_eq!(item.start_time, NaiveTime::from_hms_opt(8, 30, 0).unwrap());
            assert_eq!(item.end_time, NaiveTime::from_hms_opt(12, 0, 0).unwrap());
            assert_eq!(item.assigned_resource_id.as_str(), "anna");
            assert_eq!(item.project_id.as_str(), "p-17");
            assert_eq!(item.location.as_deref(), Some("Main St 4"));
            assert_eq!(item.status, PlanningStatus::Scheduled);
        }
        assert_eq!(plan.summary(), "4 planning items created");
    }

    #[test]
    fn test_end_date_is_inclusive() {
        let mut s = spec(WeekdaySet::from_indices([0]));
        s.end_date = date(6, 15);
        let plan = generate(&s).unwrap();
        assert_eq!(plan.items.last().map(|i| i.date), Some(date(6, 15)));
    }

    #[test]
    fn test_single_day_range() {
        let mut s = spec(WeekdaySet::from_indices([1]));
        s.end_date = s.start_date;
        assert_eq!(generate(&s).unwrap().count(), 1);

        s.weekdays = WeekdaySet::from_indices([2]);
        assert_eq!(generate(&s).unwrap().count(), 0);
    }

    #[test]
    fn test_empty_weekdays_rejected_for_any_range() {
        let mut s = spec(WeekdaySet::new());
        assert_eq!(generate(&s), Err(ValidationError::NoWeekdays));
        s.start_date = date(7, 1);
        assert_eq!(generate(&s), Err(ValidationError::NoWeekdays));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let mut s = spec(WeekdaySet::from_indices([1]));
        s.start_date = date(6, 16);
        assert_eq!(generate(&s), Err(ValidationError::InvalidDateRange));
    }

    #[test]
    fn test_other_validation() {
        let mut s = spec(WeekdaySet::from_indices([1]));
        s.end_time = s.start_time;
        assert_eq!(s.validate(), Err(ValidationError::InvalidTimeRange));

        let mut s = spec(WeekdaySet::from_indices([1]));
        s.assigned_resource_id = " ".into();
        assert_eq!(s.validate(), Err(ValidationError::MissingField("resource")));
    }
}
