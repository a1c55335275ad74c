use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_MAX_UNDO: usize = 200;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    // Zero picks the default.
    #[serde(default)]
    pub max_undo: usize,
}

impl EditorConfig {
    pub fn with_defaults(mut self) -> Self {
        if self.max_undo == 0 {
            self.max_undo = DEFAULT_MAX_UNDO;
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightKind {
    Marker,
    Pen,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightOption {
    pub model: String,
    pub title: String,
    pub color: String,
    pub kind: HighlightKind,
}

impl HighlightOption {
    pub fn new(
        model: impl Into<String>,
        title: impl Into<String>,
        color: impl Into<String>,
        kind: HighlightKind,
    ) -> Self {
        Self {
            model: model.into(),
            title: title.into(),
            color: color.into(),
            kind,
        }
    }

    pub fn command_id(&self) -> String {
        format!("highlight.{}", self.model)
    }
}

fn default_options() -> Vec<HighlightOption> {
    vec![
        HighlightOption::new("yellow_marker", "Yellow marker", "#fdfd77", HighlightKind::Marker),
        HighlightOption::new("green_marker", "Green marker", "#63f963", HighlightKind::Marker),
        HighlightOption::new("pink_marker", "Pink marker", "#fc7999", HighlightKind::Marker),
        HighlightOption::new("blue_marker", "Blue marker", "#72cce9", HighlightKind::Marker),
        HighlightOption::new("red_pen", "Red pen", "#e91313", HighlightKind::Pen),
        HighlightOption::new("green_pen", "Green pen", "#118800", HighlightKind::Pen),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightConfig {
    #[serde(default = "default_options")]
    pub options: Vec<HighlightOption>,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            options: default_options(),
        }
    }
}

impl HighlightConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn option(&self, model: &str) -> Option<&HighlightOption> {
        self.options.iter().find(|o| o.model == model)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for option in &self.options {
            if option.model.trim().is_empty() {
                return Err(ConfigError::EmptyModel);
            }
            if !seen.insert(option.model.as_str()) {
                return Err(ConfigError::DuplicateModel(option.model.clone()));
            }
            if !is_hex_color(&option.color) {
                return Err(ConfigError::InvalidColor {
                    model: option.model.clone(),
                    color: option.color.clone(),
                });
            }
        }
        Ok(())
    }
}

fn is_hex_color(color: &str) -> bool {
    let Some(digits) = color.strip_prefix('#') else {
        return false;
    };
    matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
}
