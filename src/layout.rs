use std::borrow::Borrow;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::model::{CalendarEvent, EventId};
use crate::time;

/// Geometry of the hour grid. The row height is the only thing that differs
/// between wide and narrow displays, so callers pick a preset instead of the
/// layout code knowing about devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridGeometry {
    pub window_start_hour: u32,
    /// Exclusive.
    pub window_end_hour: u32,
    pub hour_height: f64,
    pub min_event_height: f64,
    /// Put overlapping events side by side instead of on top of each other.
    pub stack_overlaps: bool,
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self {
            window_start_hour: 8,
            window_end_hour: 22,
            hour_height: 60.0,
            min_event_height: 20.0,
            stack_overlaps: false,
        }
    }
}

impl GridGeometry {
    pub fn compact() -> Self {
        Self {
            hour_height: 40.0,
            ..Self::default()
        }
    }

    pub fn hours(&self) -> Range<u32> {
        self.window_start_hour..self.window_end_hour
    }

    pub fn total_height(&self) -> f64 {
        f64::from(self.window_end_hour.saturating_sub(self.window_start_hour)) * self.hour_height
    }

    /// Grid row under a vertical offset, if any.
    pub fn hour_at(&self, y: f64) -> Option<u32> {
        if y < 0.0 || self.hour_height <= 0.0 || y >= self.total_height() {
            return None;
        }
        Some(self.window_start_hour + (y / self.hour_height) as u32)
    }

    pub fn contains(&self, event: &CalendarEvent) -> bool {
        let start = time::minutes_since_window_start(event.start_time, self.window_start_hour);
        let end = time::minutes_since_window_start(event.end_time, self.window_start_hour);
        let window = i64::from(self.window_end_hour.saturating_sub(self.window_start_hour)) * 60;
        start >= 0 && end <= window
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventBox {
    pub id: EventId,
    pub top: f64,
    pub height: f64,
    /// Zero-based column among overlapping events; always 0 unless
    /// `stack_overlaps` is set.
    pub column: usize,
    pub columns: usize,
}

impl EventBox {
    /// Horizontal share of the day column as `(left, width)` fractions.
    pub fn horizontal(&self) -> (f64, f64) {
        let width = 1.0 / self.columns.max(1) as f64;
        (self.column as f64 * width, width)
    }
}

/// Places a single day's events. Output order matches input order.
pub fn layout_day<E: Borrow<CalendarEvent>>(
    events: &[E],
    geometry: &GridGeometry,
) -> Vec<EventBox> {
    let mut boxes: Vec<EventBox> = events
        .iter()
        .map(|event| place(event.borrow(), geometry))
        .collect();

    if geometry.stack_overlaps {
        assign_columns(events, &mut boxes);
    }

    boxes
}

fn place(event: &CalendarEvent, geometry: &GridGeometry) -> EventBox {
    let offset = time::minutes_since_window_start(event.start_time, geometry.window_start_hour);
    let span = time::span_minutes(event.start_time, event.end_time);

    let top = offset as f64 / 60.0 * geometry.hour_height;
    let height = (span as f64 / 60.0 * geometry.hour_height).max(geometry.min_event_height);

    EventBox {
        id: event.id.clone(),
        top,
        height,
        column: 0,
        columns: 1,
    }
}

/// Sweep over events by start time. Each event takes the first column whose
/// last event has ended; a cluster of transitively overlapping events shares
/// one column count.
fn assign_columns<E: Borrow<CalendarEvent>>(events: &[E], boxes: &mut [EventBox]) {
    let mut order: Vec<usize> = (0..events.len()).collect();
    order.sort_by_key(|&i| {
        let event = events[i].borrow();
        (event.start_time, event.end_time)
    });

    let mut cluster: Vec<usize> = Vec::new();
    let mut column_ends = Vec::new();
    let mut cluster_end = None;

    for i in order {
        let event = events[i].borrow();
        if cluster_end.is_some_and(|end| event.start_time >= end) {
            close_cluster(&cluster, column_ends.len(), boxes);
            cluster.clear();
            column_ends.clear();
            cluster_end = None;
        }

        let column = match column_ends.iter().position(|end| *end <= event.start_time) {
            Some(column) => {
                column_ends[column] = event.end_time;
                column
            }
            None => {
                column_ends.push(event.end_time);
                column_ends.len() - 1
            }
        };

        boxes[i].column = column;
        cluster.push(i);
        cluster_end = Some(cluster_end.map_or(event.end_time, |end| event.end_time.max(end)));
    }

    close_cluster(&cluster, column_ends.len(), boxes);
}

fn close_cluster(cluster: &[usize], columns: usize, boxes: &mut [EventBox]) {
    for &i in cluster {
        boxes[i].columns = columns;
    }
}
