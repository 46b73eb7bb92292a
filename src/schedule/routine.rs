// src/schedule/routine.rs
//! 用户时间表
//!
//! 紧凑文本语法: "HH:MM 任务名 [--HH:MM], ..."
//! 未写停止时间的条目沿用模板默认时长，或在与下一条冲突时截断到下一条开始。

use std::collections::BTreeMap;

use jiff::civil::Date;

use crate::common::config::RoutinesConfig;
use crate::common::error::{AppError, Result};
use crate::schedule::task::{DayPlan, Task, TaskSource};
use crate::schedule::templates::TemplateRegistry;

/// One routine entry, minutes from midnight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEntry {
    pub template_key: String,
    pub start_min: i64,
    pub duration_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct RoutineSpec {
    pub name: String,
    pub entries: Vec<TaskEntry>,
}

impl RoutineSpec {
    pub fn from_plan(name: &str, plan: &str, registry: &TemplateRegistry) -> Result<Self> {
        let entries = parse_plan(plan, registry)?;
        validate_no_overlap(&entries, name)?;
        Ok(Self {
            name: name.to_string(),
            entries,
        })
    }

    /// Expand the routine into concrete tasks for one date.
    pub fn resolve(&self, date: Date, registry: &TemplateRegistry) -> DayPlan {
        let tasks = self
            .entries
            .iter()
            .map(|e| {
                let template = registry.resolve(&e.template_key);
                let title = if registry.contains(&e.template_key) {
                    template.title.clone()
                } else {
                    // Keep the literal key visible so ad hoc entries still read.
                    e.template_key.clone()
                };
                Task {
                    title,
                    start: date.at((e.start_min / 60) as i8, (e.start_min % 60) as i8, 0, 0),
                    duration_minutes: e.duration_minutes,
                    text_color: template.text_color,
                    border_color: template.border_color,
                    fill_color: template.fill_color,
                    source: TaskSource::Routine,
                }
            })
            .collect();
        DayPlan::new(date, tasks)
    }
}

/// All configured routines, keyed by "MMDD" with a default fallback.
pub struct RoutineSet {
    default: RoutineSpec,
    by_date: BTreeMap<String, RoutineSpec>,
}

impl RoutineSet {
    pub fn from_config(cfg: &RoutinesConfig, registry: &TemplateRegistry) -> Result<Self> {
        let default = RoutineSpec::from_plan(&cfg.default.name, &cfg.default.plan, registry)?;
        let mut by_date = BTreeMap::new();
        for (key, rc) in &cfg.by_date {
            if key.len() != 4 || !key.bytes().all(|b| b.is_ascii_digit()) {
                return Err(AppError::Config(format!(
                    "routine date key '{key}' is not MMDD"
                )));
            }
            by_date.insert(key.clone(), RoutineSpec::from_plan(&rc.name, &rc.plan, registry)?);
        }
        Ok(Self { default, by_date })
    }

    pub fn for_date(&self, date: Date) -> &RoutineSpec {
        let key = format!("{:02}{:02}", date.month(), date.day());
        self.by_date.get(&key).unwrap_or(&self.default)
    }
}

fn parse_time(s: &str) -> Result<i64> {
    let (h, m) = s
        .split_once(':')
        .ok_or_else(|| AppError::Config(format!("bad time '{s}'")))?;
    let h: i64 = h
        .trim()
        .parse()
        .map_err(|_| AppError::Config(format!("bad hour in '{s}'")))?;
    let m: i64 = m
        .trim()
        .parse()
        .map_err(|_| AppError::Config(format!("bad minute in '{s}'")))?;
    if !(0..24).contains(&h) || !(0..60).contains(&m) {
        return Err(AppError::Config(format!("time '{s}' out of range")));
    }
    Ok(h * 60 + m)
}

/// Parse the compact plan syntax into entries with resolved durations.
pub fn parse_plan(plan: &str, registry: &TemplateRegistry) -> Result<Vec<TaskEntry>> {
    struct RawEntry {
        key: String,
        start_min: i64,
        stop_min: Option<i64>,
    }

    let mut raw = Vec::new();
    for item in plan.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let (head, stop) = match item.split_once("--") {
            Some((head, stop)) => (head.trim(), Some(parse_time(stop.trim())?)),
            None => (item, None),
        };
        let (time_str, key) = head
            .split_once(' ')
            .ok_or_else(|| AppError::Config(format!("entry '{item}' lacks a task name")))?;
        raw.push(RawEntry {
            key: key.trim().to_string(),
            start_min: parse_time(time_str)?,
            stop_min: stop,
        });
    }

    let mut entries = Vec::with_capacity(raw.len());
    for (i, e) in raw.iter().enumerate() {
        let duration = match e.stop_min {
            Some(stop) => {
                let d = stop - e.start_min;
                if d <= 0 {
                    return Err(AppError::Config(format!(
                        "entry '{}' stops before it starts",
                        e.key
                    )));
                }
                d
            }
            None => {
                let default = registry.resolve(&e.key).duration_minutes;
                match raw.get(i + 1) {
                    // Truncate to the next entry when the default would collide.
                    Some(next) => default.min((next.start_min - e.start_min).max(1)),
                    None => default,
                }
            }
        };
        entries.push(TaskEntry {
            template_key: e.key.clone(),
            start_min: e.start_min,
            duration_minutes: duration,
        });
    }
    Ok(entries)
}

/// Routine entries for one day must not overlap.
fn validate_no_overlap(entries: &[TaskEntry], routine: &str) -> Result<()> {
    let mut sorted: Vec<_> = entries.iter().collect();
    sorted.sort_by_key(|e| e.start_min);
    for pair in sorted.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a.start_min + a.duration_minutes > b.start_min {
            return Err(AppError::Config(format!(
                "routine '{routine}': '{}' overlaps '{}'",
                a.template_key, b.template_key
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::templates::tests::sample_registry;
    use jiff::civil::date;

    #[test]
    fn basic_plan_uses_template_defaults() {
        let reg = sample_registry();
        let entries = parse_plan("8:00 standup, 9:00 focus, 10:00 run", &reg).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].start_min, 8 * 60);
        assert_eq!(entries[0].duration_minutes, 15);
        assert_eq!(entries[1].duration_minutes, 60);
        assert_eq!(entries[2].duration_minutes, 50);
    }

    #[test]
    fn explicit_stop_times_override_defaults() {
        let reg = sample_registry();
        let entries = parse_plan("8:00 standup --8:10, 9:00 focus --10:30", &reg).unwrap();
        assert_eq!(entries[0].duration_minutes, 10);
        assert_eq!(entries[1].duration_minutes, 90);
    }

    #[test]
    fn default_duration_is_truncated_by_next_entry() {
        let reg = sample_registry();
        // focus defaults to 60 but the next entry starts 30 minutes in.
        let entries = parse_plan("9:00 focus, 9:30 run", &reg).unwrap();
        assert_eq!(entries[0].duration_minutes, 30);
    }

    #[test]
    fn unknown_key_gets_default_template_duration() {
        let reg = sample_registry();
        let entries = parse_plan("8:00 mystery", &reg).unwrap();
        assert_eq!(entries[0].duration_minutes, 30);
    }

    #[test]
    fn overlapping_entries_are_rejected() {
        let reg = sample_registry();
        let out = RoutineSpec::from_plan("bad", "8:00 focus --9:30, 9:00 run", &reg);
        assert!(out.is_err());
    }

    #[test]
    fn bad_times_are_rejected() {
        let reg = sample_registry();
        assert!(parse_plan("25:00 focus", &reg).is_err());
        assert!(parse_plan("8:61 focus", &reg).is_err());
        assert!(parse_plan("8:00", &reg).is_err());
    }

    #[test]
    fn resolve_produces_dated_tasks_with_template_titles() {
        let reg = sample_registry();
        let spec = RoutineSpec::from_plan("Workday", "6:50 standup --7:10, 8:00 focus", &reg).unwrap();
        let plan = spec.resolve(date(2026, 8, 5), &reg);
        let tasks = plan.tasks();
        assert_eq!(tasks[0].title, "Morning standup");
        assert_eq!(tasks[0].start, date(2026, 8, 5).at(6, 50, 0, 0));
        assert_eq!(tasks[0].duration_minutes, 20);
        assert_eq!(tasks[1].title, "Deep work");
    }

    #[test]
    fn ad_hoc_entry_keeps_its_literal_name() {
        let reg = sample_registry();
        let spec = RoutineSpec::from_plan("X", "8:00 dentist visit --9:00", &reg).unwrap();
        let plan = spec.resolve(date(2026, 8, 5), &reg);
        assert_eq!(plan.tasks()[0].title, "dentist visit");
    }

    #[test]
    fn date_override_wins_over_default() {
        let reg = sample_registry();
        let cfg: RoutinesConfig = serde_json::from_str(
            r#"{
                "default": { "name": "Workday", "plan": "8:00 focus" },
                "by_date": { "0805": { "name": "Holiday", "plan": "10:00 run" } }
            }"#,
        )
        .unwrap();
        let set = RoutineSet::from_config(&cfg, &reg).unwrap();
        assert_eq!(set.for_date(date(2026, 8, 5)).name, "Holiday");
        assert_eq!(set.for_date(date(2026, 8, 6)).name, "Workday");
    }
}
