use anyhow::{anyhow, Context, Result};
use chrono::Weekday;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use weekplan_core::{AvailabilityWindow, Project, ProjectRole, SlotKind, WeeklyAvailability, DEFAULT_MAX_WEEKS};

use crate::state::ensure_weekplan_home;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_schedule_weeks")]
    pub schedule_weeks: u32,
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    /// IANA zone the availability windows are expressed in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_max_estimate_weeks")]
    pub max_estimate_weeks: u32,

    /// Project filenames (without `.md`) by role. Anything else is inactive.
    #[serde(default)]
    pub focus: Vec<String>,
    #[serde(default)]
    pub buffer: Vec<String>,
    #[serde(default)]
    pub queue: Vec<String>,

    #[serde(default)]
    pub available: AvailableSection,
}

/// One list of windows per weekday.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvailableSection {
    #[serde(rename = "Mon", default, skip_serializing_if = "Vec::is_empty")]
    pub mon: Vec<WindowEntry>,
    #[serde(rename = "Tue", default, skip_serializing_if = "Vec::is_empty")]
    pub tue: Vec<WindowEntry>,
    #[serde(rename = "Wed", default, skip_serializing_if = "Vec::is_empty")]
    pub wed: Vec<WindowEntry>,
    #[serde(rename = "Thu", default, skip_serializing_if = "Vec::is_empty")]
    pub thu: Vec<WindowEntry>,
    #[serde(rename = "Fri", default, skip_serializing_if = "Vec::is_empty")]
    pub fri: Vec<WindowEntry>,
    #[serde(rename = "Sat", default, skip_serializing_if = "Vec::is_empty")]
    pub sat: Vec<WindowEntry>,
    #[serde(rename = "Sun", default, skip_serializing_if = "Vec::is_empty")]
    pub sun: Vec<WindowEntry>,
}

impl AvailableSection {
    fn days(&self) -> [(Weekday, &[WindowEntry]); 7] {
        [
            (Weekday::Mon, self.mon.as_slice()),
            (Weekday::Tue, self.tue.as_slice()),
            (Weekday::Wed, self.wed.as_slice()),
            (Weekday::Thu, self.thu.as_slice()),
            (Weekday::Fri, self.fri.as_slice()),
            (Weekday::Sat, self.sat.as_slice()),
            (Weekday::Sun, self.sun.as_slice()),
        ]
    }
}

/// `"09:00-12:00"` (usable by anything) or `{ time = "09:00-12:00", type = "project" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WindowEntry {
    Range(String),
    Tagged {
        time: String,
        #[serde(rename = "type", default)]
        kind: SlotKind,
    },
}

impl WindowEntry {
    fn tagged(time: &str, kind: SlotKind) -> Self {
        WindowEntry::Tagged {
            time: time.to_string(),
            kind,
        }
    }

    pub fn to_window(&self) -> Result<AvailabilityWindow> {
        let (time, kind) = match self {
            WindowEntry::Range(t) => (t.as_str(), SlotKind::Any),
            WindowEntry::Tagged { time, kind } => (time.as_str(), *kind),
        };
        Ok(AvailabilityWindow::parse(time, kind)?)
    }
}

fn default_schedule_weeks() -> u32 {
    2
}

fn default_calendar_id() -> String {
    "primary".to_string()
}

fn default_timezone() -> String {
    "Asia/Seoul".to_string()
}

fn default_max_estimate_weeks() -> u32 {
    DEFAULT_MAX_WEEKS
}

impl Default for Config {
    fn default() -> Self {
        let workday = vec![
            WindowEntry::tagged("07:00-08:00", SlotKind::Routine),
            WindowEntry::Range("09:00-12:00".to_string()),
            WindowEntry::tagged("14:00-18:00", SlotKind::Project),
        ];
        Self {
            schedule_weeks: default_schedule_weeks(),
            calendar_id: default_calendar_id(),
            timezone: default_timezone(),
            max_estimate_weeks: default_max_estimate_weeks(),
            focus: Vec::new(),
            buffer: Vec::new(),
            queue: Vec::new(),
            available: AvailableSection {
                mon: workday.clone(),
                tue: workday.clone(),
                wed: workday.clone(),
                thu: workday.clone(),
                fri: workday,
                sat: vec![WindowEntry::Range("10:00-12:00".to_string())],
                sun: Vec::new(),
            },
        }
    }
}

impl Config {
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse()
            .map_err(|e| anyhow!("invalid timezone '{}': {e}", self.timezone))
    }

    pub fn weekly_availability(&self) -> Result<WeeklyAvailability> {
        let mut out = WeeklyAvailability::new();
        for (day, entries) in self.available.days() {
            for entry in entries {
                let w = entry.to_window().with_context(|| format!("available.{day}"))?;
                out.push(day, w);
            }
        }
        Ok(out)
    }

    /// Apply the focus/buffer lists. A project named in both is focus.
    pub fn assign_roles(&self, projects: &mut [Project]) {
        let listed = |list: &[String], name: &str| list.iter().any(|f| f.strip_suffix(".md").unwrap_or(f.as_str()) == name);

        for p in projects.iter_mut() {
            p.role = if listed(&self.focus, &p.filename) {
                Some(ProjectRole::Focus)
            } else if listed(&self.buffer, &p.filename) {
                Some(ProjectRole::Buffer)
            } else {
                None
            };
        }

        for name in self.focus.iter().chain(&self.buffer) {
            let stem = name.strip_suffix(".md").unwrap_or(name.as_str());
            if !projects.iter().any(|p| p.filename == stem) {
                warn!(project = %stem, "configured project not found in inputs");
            }
        }
    }
}

/// `--config` if given, else `~/.weekplan/config.toml`.
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(p) => Ok(p.to_path_buf()),
        None => Ok(ensure_weekplan_home()?.join("config.toml")),
    }
}

pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let p = config_path(explicit)?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(cfg: &Config, explicit: Option<&Path>) -> Result<()> {
    let p = config_path(explicit)?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config(explicit: Option<&Path>) -> Result<()> {
    let p = config_path(explicit)?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default(), explicit)?;
    println!("Wrote {}", p.display());
    Ok(())
}
