// src/scheduler/queue.rs
//! 当日更新队列
//!
//! 任务起止点、面板切换点与周期性补位点按时间入堆；
//! 早于最小更新间隔的触发被顺延到最早允许时刻，从不丢弃。

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

use jiff::civil::DateTime;

use crate::common::clock::add_minutes;
use crate::schedule::task::DayPlan;

/// Why an update fires. Task boundaries outrank the rest on time ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Trigger {
    TaskStart,
    TaskEnd,
    PanelShift,
    Periodic,
    DayRollover,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::TaskStart => "task_start",
            Trigger::TaskEnd => "task_end",
            Trigger::PanelShift => "panel_shift",
            Trigger::Periodic => "periodic",
            Trigger::DayRollover => "day_rollover",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Default)]
pub struct UpdateQueue {
    heap: BinaryHeap<Reverse<(DateTime, Trigger)>>,
}

impl UpdateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, at: DateTime, trigger: Trigger) {
        self.heap.push(Reverse((at, trigger)));
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Pre-calculate all update times for one day: task boundaries, the
    /// panel shift, and periodic fill in the gaps between boundaries.
    pub fn build_for_day(
        plan: &DayPlan,
        now: DateTime,
        periodic_interval_mins: i64,
        panel_shift_hour: i8,
    ) -> Self {
        let mut queue = Self::new();

        for task in plan.tasks() {
            if task.start > now {
                queue.push(task.start, Trigger::TaskStart);
            }
            let end = task.end();
            if end > now {
                queue.push(end, Trigger::TaskEnd);
            }
        }

        let shift = plan.date.at(panel_shift_hour, 0, 1, 0);
        if shift > now {
            queue.push(shift, Trigger::PanelShift);
        }

        let end_of_day = plan.date.at(23, 59, 0, 0);
        let events = plan.boundaries_after(now);
        if events.is_empty() {
            queue.fill_periodic(add_minutes(now, periodic_interval_mins), end_of_day, periodic_interval_mins);
        } else {
            queue.fill_periodic(
                add_minutes(now, periodic_interval_mins),
                events[0],
                periodic_interval_mins,
            );
            for pair in events.windows(2) {
                queue.fill_periodic(
                    add_minutes(pair[0], periodic_interval_mins),
                    pair[1],
                    periodic_interval_mins,
                );
            }
            if let Some(last) = events.last() {
                queue.fill_periodic(
                    add_minutes(*last, periodic_interval_mins),
                    end_of_day,
                    periodic_interval_mins,
                );
            }
        }

        queue
    }

    fn fill_periodic(&mut self, from: DateTime, until: DateTime, step_mins: i64) {
        let mut t = from;
        while t < until {
            self.push(t, Trigger::Periodic);
            t = add_minutes(t, step_mins);
        }
    }

    /// Next trigger strictly after `now`. Entries earlier than
    /// `earliest_allowed` are re-queued at that time instead of firing early.
    pub fn next_due(
        &mut self,
        now: DateTime,
        earliest_allowed: DateTime,
    ) -> Option<(DateTime, Trigger)> {
        while let Some(Reverse((at, trigger))) = self.heap.pop() {
            if at <= now {
                continue;
            }
            if at < earliest_allowed {
                self.push(earliest_allowed, trigger);
                continue;
            }
            return Some((at, trigger));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::task::tests::task;
    use jiff::civil::date;

    fn sample_plan() -> DayPlan {
        let d = date(2026, 8, 5);
        DayPlan::new(
            d,
            vec![
                task("standup", d.at(8, 0, 0, 0), 15),
                task("focus", d.at(9, 0, 0, 0), 60),
            ],
        )
    }

    fn drain(queue: &mut UpdateQueue) -> Vec<(DateTime, Trigger)> {
        let mut out = Vec::new();
        let epoch = date(2026, 8, 5).at(0, 0, 0, 0);
        while let Some(item) = queue.next_due(epoch, epoch) {
            out.push(item);
        }
        out
    }

    #[test]
    fn task_boundaries_and_panel_shift_are_queued() {
        let d = date(2026, 8, 5);
        let mut q = UpdateQueue::build_for_day(&sample_plan(), d.at(7, 0, 0, 0), 30, 12);
        let items = drain(&mut q);
        let has = |at: DateTime, trig: Trigger| items.iter().any(|&(a, t)| a == at && t == trig);
        assert!(has(d.at(8, 0, 0, 0), Trigger::TaskStart));
        assert!(has(d.at(8, 15, 0, 0), Trigger::TaskEnd));
        assert!(has(d.at(9, 0, 0, 0), Trigger::TaskStart));
        assert!(has(d.at(10, 0, 0, 0), Trigger::TaskEnd));
        assert!(has(d.at(12, 0, 1, 0), Trigger::PanelShift));
    }

    #[test]
    fn periodic_fill_stays_out_of_tight_gaps() {
        let d = date(2026, 8, 5);
        let mut q = UpdateQueue::build_for_day(&sample_plan(), d.at(7, 0, 0, 0), 30, 12);
        let periodic: Vec<_> = drain(&mut q)
            .into_iter()
            .filter(|(_, t)| *t == Trigger::Periodic)
            .map(|(a, _)| a)
            .collect();
        // 7:30 before the first boundary, nothing between 8:00 and 8:15,
        // then half-hourly after the last boundary until end of day.
        assert!(periodic.contains(&d.at(7, 30, 0, 0)));
        assert!(!periodic.iter().any(|&a| a > d.at(8, 0, 0, 0) && a < d.at(8, 15, 0, 0)));
        assert!(periodic.contains(&d.at(10, 30, 0, 0)));
        assert!(periodic.contains(&d.at(23, 30, 0, 0)));
    }

    #[test]
    fn past_entries_are_discarded() {
        let d = date(2026, 8, 5);
        let mut q = UpdateQueue::new();
        q.push(d.at(8, 0, 0, 0), Trigger::Periodic);
        q.push(d.at(10, 0, 0, 0), Trigger::Periodic);
        let now = d.at(9, 0, 0, 0);
        assert_eq!(q.next_due(now, now), Some((d.at(10, 0, 0, 0), Trigger::Periodic)));
    }

    #[test]
    fn early_entries_are_clamped_to_earliest_allowed() {
        let d = date(2026, 8, 5);
        let mut q = UpdateQueue::new();
        q.push(d.at(9, 1, 0, 0), Trigger::TaskStart);
        let now = d.at(9, 0, 0, 0);
        let earliest = d.at(9, 3, 0, 0);
        assert_eq!(q.next_due(now, earliest), Some((earliest, Trigger::TaskStart)));
    }

    #[test]
    fn task_triggers_win_time_ties() {
        let d = date(2026, 8, 5);
        let mut q = UpdateQueue::new();
        let at = d.at(9, 0, 0, 0);
        q.push(at, Trigger::Periodic);
        q.push(at, Trigger::TaskStart);
        let now = d.at(8, 0, 0, 0);
        assert_eq!(q.next_due(now, now), Some((at, Trigger::TaskStart)));
    }

    #[test]
    fn empty_plan_fills_the_whole_day() {
        let d = date(2026, 8, 5);
        let plan = DayPlan::new(d, Vec::new());
        let mut q = UpdateQueue::build_for_day(&plan, d.at(22, 0, 0, 0), 30, 12);
        let items = drain(&mut q);
        let times: Vec<_> = items.iter().map(|(a, _)| *a).collect();
        assert_eq!(times, vec![d.at(22, 30, 0, 0), d.at(23, 0, 0, 0), d.at(23, 30, 0, 0)]);
    }
}
