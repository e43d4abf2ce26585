use std::collections::{BTreeMap, HashSet};

use chrono::{NaiveDate, NaiveTime, TimeDelta};
use thiserror::Error;
use tracing::debug;

use crate::ast::{self, Slot};
use crate::model::{PlanningItem, PlanningItemId, PlanningStatus, ResourceId};
use crate::time;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgendaError {
    #[error("{date}: entry has no {tag} tag")]
    MissingTag { date: NaiveDate, tag: &'static str },
    #[error("{date}: unknown status {status:?}")]
    UnknownStatus { date: NaiveDate, status: String },
    #[error("{date}: {start} for {minutes} minutes does not end on the same day")]
    InvalidSpan {
        date: NaiveDate,
        start: NaiveTime,
        minutes: i64,
    },
    #[error("{date}: id {id} is used more than once")]
    DuplicateId { date: NaiveDate, id: PlanningItemId },
}

/// Converts every slot of the agenda into one planning item, in file order.
pub fn agenda_to_items(file: &ast::File) -> Result<Vec<PlanningItem>, AgendaError> {
    let mut items = Vec::new();
    let mut ids = HashSet::new();

    for day in &file.days {
        for entry in &day.entries {
            let tag = |name: &'static str| entry.tags.as_ref().and_then(|tags| tags.get(name));
            let required = |name: &'static str| {
                tag(name)
                    .filter(|value| !value.trim().is_empty())
                    .ok_or(AgendaError::MissingTag {
                        date: day.date,
                        tag: name,
                    })
            };

            let resource = required("resource")?;
            let project = required("project")?;
            let status = match tag("status") {
                Some(status) => status.parse::<PlanningStatus>().map_err(|_| {
                    AgendaError::UnknownStatus {
                        date: day.date,
                        status: status.to_string(),
                    }
                })?,
                None => PlanningStatus::Scheduled,
            };

            for (i, slot) in entry.slots.iter().enumerate() {
                let end_time = slot_end(day.date, slot)?;
                let mut item = PlanningItem::scheduled(
                    day.date,
                    slot.time,
                    end_time,
                    resource.into(),
                    project.into(),
                )
                .with_location(tag("location").map(str::to_string))
                .with_description(tag("description").map(str::to_string));

                item.status = status;
                // an explicit id only names the first slot of its line
                if let (0, Some(id)) = (i, tag("id")) {
                    item.id = PlanningItemId::from(id);
                }
                if !ids.insert(item.id.clone()) {
                    return Err(AgendaError::DuplicateId {
                        date: day.date,
                        id: item.id,
                    });
                }
                items.push(item);
            }
        }
    }

    debug!(days = file.days.len(), items = items.len(), "agenda converted");
    Ok(items)
}

fn slot_end(date: NaiveDate, slot: &Slot) -> Result<NaiveTime, AgendaError> {
    let invalid = || AgendaError::InvalidSpan {
        date,
        start: slot.time,
        minutes: slot.duration.num_minutes(),
    };

    if slot.duration <= TimeDelta::zero() {
        return Err(invalid());
    }

    match slot.time.overflowing_add_signed(slot.duration) {
        (end, 0) if end > slot.time => Ok(end),
        _ => Err(invalid()),
    }
}

/// Minutes booked per resource between `from` and `to`, both inclusive.
pub fn booked_minutes(
    items: &[PlanningItem],
    from: NaiveDate,
    to: NaiveDate,
) -> BTreeMap<ResourceId, i64> {
    let mut totals = BTreeMap::new();

    for item in items
        .iter()
        .filter(|item| item.date >= from && item.date <= to)
        .filter(|item| item.status != PlanningStatus::Cancelled)
    {
        *totals.entry(item.assigned_resource_id.clone()).or_insert(0) +=
            time::span_minutes(item.start_time, item.end_time);
    }

    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn items(source: &str) -> Result<Vec<PlanningItem>, AgendaError> {
        agenda_to_items(&Parser::new(source).parse_file().unwrap())
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_agenda_to_items() {
        let items = items(
            "2025-06-02\n\
             [resource(anna) project(p-17) location(Main St 4)] 09:00 - 2h\n\
             [resource(ben) project(p-9) status(confirmed) id(x-1)] 13:30 - 1h30m, 16:00 - 45m\n",
        )
        .unwrap();

        assert_eq!(items.len(), 3);

        assert_eq!(items[0].date, date(2));
        assert_eq!(items[0].end_time, hm(11, 0));
        assert_eq!(items[0].location.as_deref(), Some("Main St 4"));
        assert_eq!(items[0].status, PlanningStatus::Scheduled);

        assert_eq!(items[1].id.as_str(), "x-1");
        assert_eq!(items[1].end_time, hm(15, 0));
        assert_eq!(items[1].status, PlanningStatus::Confirmed);

        assert_ne!(items[2].id.as_str(), "x-1");
        assert_eq!(items[2].end_time, hm(16, 45));
    }

    #[test]
    fn test_missing_tags() {
        assert_eq!(
            items("2025-06-02\n09:00 - 1h\n"),
            Err(AgendaError::MissingTag {
                date: date(2),
                tag: "resource"
            })
        );
        assert_eq!(
            items("2025-06-02\n[resource(anna)] 09:00 - 1h\n"),
            Err(AgendaError::MissingTag {
                date: date(2),
                tag: "project"
            })
        );
    }

    #[test]
    fn test_unknown_status() {
        let err = items("2025-06-02\n[resource(a) project(p) status(paused)] 09:00 - 1h\n")
            .unwrap_err();
        assert!(matches!(err, AgendaError::UnknownStatus { ref status, .. } if status == "paused"));
    }

    #[test]
    fn test_slot_past_midnight() {
        let err = items("2025-06-02\n[resource(a) project(p)] 23:00 - 2h\n").unwrap_err();
        assert!(matches!(err, AgendaError::InvalidSpan { minutes: 120, .. }));
    }

    #[test]
    fn test_duplicate_id() {
        let err = items(
            "2025-06-02\n\
             [resource(anna) project(p) id(x-1)] 09:00 - 1h\n\
             \n\
             2025-06-03\n\
             [resource(ben) project(p) id(x-1)] 09:00 - 1h\n",
        )
        .unwrap_err();
        assert_eq!(
            err,
            AgendaError::DuplicateId {
                date: date(3),
                id: "x-1".into()
            }
        );
    }

    #[test]
    fn test_booked_minutes() {
        let mut items = items(
            "2025-06-02\n\
             [resource(anna) project(p)] 09:00 - 2h, 14:00 - 30m\n\
             [resource(ben) project(p)] 09:00 - 1h\n\
             \n\
             2025-06-10\n\
             [resource(anna) project(p)] 09:00 - 8h\n",
        )
        .unwrap();
        items[2].status = PlanningStatus::Cancelled;

        let totals = booked_minutes(&items, date(2), date(8));
        assert_eq!(totals.get(&ResourceId::from("anna")), Some(&150));
        assert_eq!(totals.get(&ResourceId::from("ben")), None);
    }
}
