use chrono::{NaiveDate, NaiveTime, TimeDelta};

use crate::settings::Settings;

/// A parsed agenda file.
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub settings: Option<Settings>,
    pub days: Vec<DayRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub entries: Vec<Entry>,
}

/// One agenda line: shared tags plus one or more time slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub tags: Option<Tags>,
    pub slots: Vec<Slot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tags {
    pub tags: Vec<Tag>,
}

impl Tags {
    pub fn get(&self, title: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| tag.title == title)
            .and_then(|tag| tag.detail.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub title: String,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub time: NaiveTime,
    pub duration: TimeDelta,
}
