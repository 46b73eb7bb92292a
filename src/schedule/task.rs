// src/schedule/task.rs

use embedded_graphics::pixelcolor::Rgb888;
use jiff::civil::{Date, DateTime};

use crate::common::clock::add_minutes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSource {
    Routine,
    Calendar,
}

/// A concrete task instance for one date, with presentation already resolved.
#[derive(Debug, Clone)]
pub struct Task {
    pub title: String,
    pub start: DateTime,
    pub duration_minutes: i64,
    pub text_color: Rgb888,
    pub border_color: Rgb888,
    pub fill_color: Rgb888,
    pub source: TaskSource,
}

impl Task {
    pub fn end(&self) -> DateTime {
        add_minutes(self.start, self.duration_minutes)
    }
}

/// Resolved, ordered task list for a single date.
#[derive(Debug, Clone)]
pub struct DayPlan {
    pub date: Date,
    tasks: Vec<Task>,
}

impl DayPlan {
    pub fn new(date: Date, mut tasks: Vec<Task>) -> Self {
        tasks.sort_by_key(|t| t.start);
        Self { date, tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Calendar tasks are drawn alongside routine tasks. They may overlap
    /// freely, lane assignment in the timeline sorts that out.
    pub fn merge_calendar(&mut self, events: Vec<Task>) {
        self.tasks.extend(events);
        self.tasks.sort_by_key(|t| t.start);
    }

    pub fn current_task(&self, now: DateTime) -> Option<&Task> {
        self.tasks
            .iter()
            .find(|t| t.start <= now && now <= t.end())
    }

    pub fn next_task(&self, now: DateTime) -> Option<&Task> {
        self.tasks
            .iter()
            .filter(|t| t.start > now)
            .min_by_key(|t| t.start)
    }

    pub fn tasks_in_range(&self, start: DateTime, end: DateTime) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| !(t.end() <= start || t.start >= end))
            .collect()
    }

    /// Future task boundaries (starts and ends), sorted. Drives the update
    /// queue.
    pub fn boundaries_after(&self, now: DateTime) -> Vec<DateTime> {
        let mut out = Vec::new();
        for t in &self.tasks {
            if t.start > now {
                out.push(t.start);
            }
            let end = t.end();
            if end > now {
                out.push(end);
            }
        }
        out.sort();
        out
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::render::style;
    use jiff::civil::date;

    pub(crate) fn task(title: &str, start: DateTime, duration_minutes: i64) -> Task {
        Task {
            title: title.to_string(),
            start,
            duration_minutes,
            text_color: style::BLACK,
            border_color: style::BLACK,
            fill_color: style::WHITE,
            source: TaskSource::Routine,
        }
    }

    fn plan() -> DayPlan {
        let d = date(2026, 8, 5);
        DayPlan::new(
            d,
            vec![
                task("standup", d.at(8, 0, 0, 0), 15),
                task("focus", d.at(9, 0, 0, 0), 60),
                task("run", d.at(10, 30, 0, 0), 50),
            ],
        )
    }

    #[test]
    fn current_task_is_inclusive_on_both_ends() {
        let p = plan();
        let d = date(2026, 8, 5);
        assert_eq!(p.current_task(d.at(8, 0, 0, 0)).unwrap().title, "standup");
        assert_eq!(p.current_task(d.at(8, 15, 0, 0)).unwrap().title, "standup");
        assert!(p.current_task(d.at(8, 16, 0, 0)).is_none());
    }

    #[test]
    fn next_task_picks_earliest_future_start() {
        let p = plan();
        let d = date(2026, 8, 5);
        assert_eq!(p.next_task(d.at(8, 30, 0, 0)).unwrap().title, "focus");
        assert!(p.next_task(d.at(11, 0, 0, 0)).is_none());
    }

    #[test]
    fn range_query_returns_overlapping_tasks_only() {
        let p = plan();
        let d = date(2026, 8, 5);
        let hits = p.tasks_in_range(d.at(9, 30, 0, 0), d.at(10, 45, 0, 0));
        let titles: Vec<_> = hits.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["focus", "run"]);
    }

    #[test]
    fn boundaries_are_sorted_and_future_only() {
        let p = plan();
        let d = date(2026, 8, 5);
        let bounds = p.boundaries_after(d.at(9, 30, 0, 0));
        assert_eq!(
            bounds,
            vec![d.at(10, 0, 0, 0), d.at(10, 30, 0, 0), d.at(11, 20, 0, 0)]
        );
    }
}
