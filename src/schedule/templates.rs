// src/schedule/templates.rs
//! 任务模板注册表
//!
//! 启动时从配置构建并校验，渲染期对未知键退回默认模板而不是报错。

use std::collections::BTreeMap;

use embedded_graphics::pixelcolor::Rgb888;
use log::debug;

use crate::common::config::{TagConfig, TemplateConfig};
use crate::common::error::{AppError, Result};
use crate::render::style;

/// Reusable styling and duration rule for one task kind.
#[derive(Debug, Clone)]
pub struct TaskTemplate {
    pub key: String,
    pub title: String,
    pub duration_minutes: i64,
    pub text_color: Rgb888,
    pub border_color: Rgb888,
    pub fill_color: Rgb888,
}

pub struct TemplateRegistry {
    templates: BTreeMap<String, TaskTemplate>,
    default: TaskTemplate,
}

fn rgb(c: [u8; 3]) -> Rgb888 {
    Rgb888::new(c[0], c[1], c[2])
}

impl TemplateRegistry {
    pub fn from_config(
        templates: &BTreeMap<String, TemplateConfig>,
        tags: &BTreeMap<String, TagConfig>,
    ) -> Result<Self> {
        let mut out = BTreeMap::new();
        for (key, tc) in templates {
            if tc.duration_minutes <= 0 {
                return Err(AppError::Config(format!(
                    "template '{key}': duration must be positive"
                )));
            }
            let tag = match &tc.tag {
                Some(name) => Some(tags.get(name).ok_or_else(|| {
                    AppError::Config(format!("template '{key}': unknown tag '{name}'"))
                })?),
                None => None,
            };

            // Per-template overrides win over the tag, the tag over built-ins.
            let pick = |own: &Option<[u8; 3]>,
                        tagged: fn(&TagConfig) -> Option<[u8; 3]>,
                        fallback: Rgb888| {
                own.map(rgb)
                    .or_else(|| tag.and_then(tagged).map(rgb))
                    .unwrap_or(fallback)
            };

            out.insert(
                key.clone(),
                TaskTemplate {
                    key: key.clone(),
                    title: tc.title.clone(),
                    duration_minutes: tc.duration_minutes,
                    text_color: pick(&tc.text_color, |t| t.text_color, style::BLACK),
                    border_color: pick(&tc.border_color, |t| t.border_color, style::task_border()),
                    fill_color: pick(&tc.fill_color, |t| t.fill_color, style::WHITE),
                },
            );
        }

        Ok(Self {
            templates: out,
            default: Self::built_in_default(),
        })
    }

    fn built_in_default() -> TaskTemplate {
        TaskTemplate {
            key: "default".to_string(),
            title: "Untitled".to_string(),
            duration_minutes: 30,
            text_color: style::BLACK,
            border_color: style::task_border(),
            fill_color: style::task_default_fill(),
        }
    }

    /// Lookup never fails; unknown keys resolve to the default entry.
    pub fn resolve(&self, key: &str) -> &TaskTemplate {
        match self.templates.get(key) {
            Some(t) => t,
            None => {
                debug!("unknown task template '{key}', using default");
                &self.default
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.templates.contains_key(key)
    }

    pub fn default_template(&self) -> &TaskTemplate {
        &self.default
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_registry() -> TemplateRegistry {
        let json = r#"{
            "tags": {
                "work": { "fill_color": [230, 210, 205], "border_color": [150, 90, 70] }
            },
            "templates": {
                "standup": { "title": "Morning standup", "duration_minutes": 15, "tag": "work" },
                "focus":   { "title": "Deep work", "duration_minutes": 60, "tag": "work" },
                "run":     { "title": "Run", "duration_minutes": 50,
                             "fill_color": [240, 200, 195] }
            }
        }"#;
        #[derive(serde::Deserialize)]
        struct Wrap {
            tags: BTreeMap<String, TagConfig>,
            templates: BTreeMap<String, TemplateConfig>,
        }
        let w: Wrap = serde_json::from_str(json).unwrap();
        TemplateRegistry::from_config(&w.templates, &w.tags).unwrap()
    }

    #[test]
    fn tag_colors_flow_into_templates() {
        let reg = sample_registry();
        let t = reg.resolve("standup");
        assert_eq!(t.fill_color, Rgb888::new(230, 210, 205));
        assert_eq!(t.border_color, Rgb888::new(150, 90, 70));
        assert_eq!(t.duration_minutes, 15);
    }

    #[test]
    fn template_override_beats_tag() {
        let reg = sample_registry();
        let t = reg.resolve("run");
        assert_eq!(t.fill_color, Rgb888::new(240, 200, 195));
    }

    #[test]
    fn unknown_key_falls_back_to_default() {
        let reg = sample_registry();
        let t = reg.resolve("nonexistent");
        assert_eq!(t.key, "default");
        assert_eq!(t.duration_minutes, 30);
    }

    #[test]
    fn unknown_tag_is_rejected_at_load() {
        let mut templates = BTreeMap::new();
        templates.insert(
            "x".to_string(),
            TemplateConfig {
                title: "X".to_string(),
                duration_minutes: 10,
                tag: Some("missing".to_string()),
                text_color: None,
                border_color: None,
                fill_color: None,
            },
        );
        let out = TemplateRegistry::from_config(&templates, &BTreeMap::new());
        assert!(out.is_err());
    }

    #[test]
    fn nonpositive_duration_is_rejected_at_load() {
        let mut templates = BTreeMap::new();
        templates.insert(
            "x".to_string(),
            TemplateConfig {
                title: "X".to_string(),
                duration_minutes: 0,
                tag: None,
                text_color: None,
                border_color: None,
                fill_color: None,
            },
        );
        assert!(TemplateRegistry::from_config(&templates, &BTreeMap::new()).is_err());
    }
}
