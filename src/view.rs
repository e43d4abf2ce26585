//! Week and month calendar views.
//!
//! Views own their navigation offset and their drag selection. They never
//! touch event storage: clicks and selections are handed to a
//! [`CalendarHandler`], which decides what to create.

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use tracing::debug;

use crate::layout::{layout_day, EventBox, GridGeometry};
use crate::model::CalendarEvent;
use crate::selection::{Cell, DragSelection, SelectionOutcome};
use crate::settings::CalendarSettings;
use crate::time;

pub trait CalendarHandler {
    fn on_event_click(&mut self, event: &CalendarEvent);
    fn on_time_slot_click(&mut self, date: NaiveDate, hour: u32);
    fn on_range_create(&mut self, date: NaiveDate, start_hour: u32, end_hour: u32);
}

/// Events whose date key equals the key of `date`.
pub fn events_for_day(events: &[CalendarEvent], date: NaiveDate) -> Vec<&CalendarEvent> {
    let key = time::date_key(date);
    events.iter().filter(|e| e.date_key() == key).collect()
}

/// The first `first_weekday` on or before `date`.
pub fn start_of_week(date: NaiveDate, first_weekday: Weekday) -> NaiveDate {
    let back = (date.weekday().num_days_from_monday() + 7
        - first_weekday.num_days_from_monday())
        % 7;
    date.checked_sub_days(Days::new(u64::from(back)))
        .unwrap_or(date)
}

fn dispatch(outcome: SelectionOutcome, handler: &mut dyn CalendarHandler) {
    match outcome {
        SelectionOutcome::SlotClick { day, hour } => handler.on_time_slot_click(day, hour),
        SelectionOutcome::RangeCreate {
            day,
            start_hour,
            end_hour,
        } => handler.on_range_create(day, start_hour, end_hour),
    }
}

#[derive(Debug, Clone)]
pub struct PlacedEvent<'a> {
    pub event: &'a CalendarEvent,
    pub placement: EventBox,
}

#[derive(Debug, Clone)]
pub struct DayColumn<'a> {
    pub date: NaiveDate,
    pub key: String,
    pub events: Vec<PlacedEvent<'a>>,
}

#[derive(Debug, Clone)]
pub struct WeekGrid<'a> {
    pub week_start: NaiveDate,
    pub hours: Vec<u32>,
    pub columns: Vec<DayColumn<'a>>,
}

#[derive(Debug, Clone)]
pub struct WeekView {
    week_start: NaiveDate,
    first_weekday: Weekday,
    geometry: GridGeometry,
    selection: DragSelection,
}

impl WeekView {
    pub fn new(today: NaiveDate, first_weekday: Weekday, geometry: GridGeometry) -> Self {
        Self {
            week_start: start_of_week(today, first_weekday),
            first_weekday,
            geometry,
            selection: DragSelection::new(),
        }
    }

    pub fn week_start(&self) -> NaiveDate {
        self.week_start
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn selection(&self) -> &DragSelection {
        &self.selection
    }

    pub fn days(&self) -> Vec<NaiveDate> {
        (0..7)
            .filter_map(|i| self.week_start.checked_add_days(Days::new(i)))
            .collect()
    }

    pub fn next(&mut self) {
        if let Some(date) = self.week_start.checked_add_days(Days::new(7)) {
            self.week_start = date;
        }
    }

    pub fn previous(&mut self) {
        if let Some(date) = self.week_start.checked_sub_days(Days::new(7)) {
            self.week_start = date;
        }
    }

    pub fn go_to(&mut self, date: NaiveDate) {
        self.week_start = start_of_week(date, self.first_weekday);
    }

    pub fn render<'a>(&self, events: &'a [CalendarEvent]) -> WeekGrid<'a> {
        let columns = self
            .days()
            .into_iter()
            .map(|date| {
                let day_events = events_for_day(events, date);
                let boxes = layout_day(&day_events, &self.geometry);
                DayColumn {
                    date,
                    key: time::date_key(date),
                    events: day_events
                        .into_iter()
                        .zip(boxes)
                        .map(|(event, placement)| PlacedEvent { event, placement })
                        .collect(),
                }
            })
            .collect();

        WeekGrid {
            week_start: self.week_start,
            hours: self.geometry.hours().collect(),
            columns,
        }
    }

    /// Grid-local `(column, hour)` to an absolute cell. `None` off the grid.
    pub fn cell_at(&self, day_index: usize, hour: u32) -> Option<Cell> {
        if day_index >= 7 || !self.geometry.hours().contains(&hour) {
            return None;
        }
        let day = self.week_start.checked_add_days(Days::new(day_index as u64))?;
        Some(Cell::new(day, hour))
    }

    pub fn pointer_down(&mut self, day_index: usize, hour: u32) {
        if let Some(cell) = self.cell_at(day_index, hour) {
            self.selection.pointer_down(cell);
        }
    }

    pub fn pointer_enter(&mut self, day_index: usize, hour: u32) {
        if let Some(cell) = self.cell_at(day_index, hour) {
            self.selection.pointer_enter(cell);
        }
    }

    pub fn pointer_up(&mut self, handler: &mut dyn CalendarHandler) {
        if let Some(outcome) = self.selection.pointer_up() {
            dispatch(outcome, handler);
        }
    }

    pub fn pointer_leave(&mut self, handler: &mut dyn CalendarHandler) {
        if let Some(outcome) = self.selection.pointer_leave() {
            dispatch(outcome, handler);
        }
    }

    pub fn cancel_selection(&mut self) {
        self.selection.cancel();
    }

    pub fn is_highlighted(&self, day_index: usize, hour: u32) -> bool {
        self.cell_at(day_index, hour)
            .is_some_and(|cell| self.selection.is_highlighted(cell))
    }

    pub fn click_event(&self, event: &CalendarEvent, handler: &mut dyn CalendarHandler) {
        debug!(event = %event.id, "event clicked");
        handler.on_event_click(event);
    }
}

#[derive(Debug, Clone)]
pub struct MonthDay<'a> {
    pub date: NaiveDate,
    /// False for leading and trailing days of the neighbouring months.
    pub in_month: bool,
    pub events: Vec<&'a CalendarEvent>,
    pub overflow: usize,
}

#[derive(Debug, Clone)]
pub struct MonthView {
    month_start: NaiveDate,
    first_weekday: Weekday,
    visible_events: usize,
    default_hour: u32,
}

impl MonthView {
    pub fn new(today: NaiveDate, settings: &CalendarSettings) -> Self {
        Self {
            month_start: today.with_day(1).unwrap_or(today),
            first_weekday: settings.first_weekday,
            visible_events: settings.month_visible_events,
            default_hour: settings.default_hour,
        }
    }

    pub fn month_start(&self) -> NaiveDate {
        self.month_start
    }

    pub fn title(&self) -> String {
        self.month_start.format("%B %Y").to_string()
    }

    pub fn next(&mut self) {
        if let Some(date) = self.month_start.checked_add_months(Months::new(1)) {
            self.month_start = date;
        }
    }

    pub fn previous(&mut self) {
        if let Some(date) = self.month_start.checked_sub_months(Months::new(1)) {
            self.month_start = date;
        }
    }

    pub fn go_to(&mut self, date: NaiveDate) {
        self.month_start = date.with_day(1).unwrap_or(date);
    }

    /// Every date of the whole weeks overlapping the month.
    pub fn grid_dates(&self) -> Vec<NaiveDate> {
        let last = self
            .month_start
            .checked_add_months(Months::new(1))
            .and_then(|d| d.pred_opt())
            .unwrap_or(self.month_start);

        let mut dates = Vec::new();
        let mut date = start_of_week(self.month_start, self.first_weekday);
        while date <= last || dates.len() % 7 != 0 {
            dates.push(date);
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }
        dates
    }

    pub fn weeks<'a>(&self, events: &'a [CalendarEvent]) -> Vec<Vec<MonthDay<'a>>> {
        let days: Vec<MonthDay<'a>> = self
            .grid_dates()
            .into_iter()
            .map(|date| {
                let mut day_events = events_for_day(events, date);
                day_events.sort_by_key(|e| (e.start_time, e.end_time));
                let overflow = day_events.len().saturating_sub(self.visible_events);
                day_events.truncate(self.visible_events);
                MonthDay {
                    date,
                    in_month: date.month() == self.month_start.month()
                        && date.year() == self.month_start.year(),
                    events: day_events,
                    overflow,
                }
            })
            .collect();

        days.chunks(7).map(<[MonthDay<'a>]>::to_vec).collect()
    }

    /// Month cells have no hour grid; a click opens creation at the default hour.
    pub fn click_day(&self, date: NaiveDate, handler: &mut dyn CalendarHandler) {
        handler.on_time_slot_click(date, self.default_hour);
    }

    pub fn click_event(&self, event: &CalendarEvent, handler: &mut dyn CalendarHandler) {
        handler.on_event_click(event);
    }
}
