//! Project and task model consumed by the project placer.

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Minimum free minutes a slot must offer a `long` task.
pub const LONG_BLOCK_MINUTES: u32 = 180;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// What slot sizes suit a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Short,
    Long,
    #[default]
    Any,
}

impl BlockType {
    /// Whether a slot with `free` remaining minutes suits this block type.
    /// Only `long` adds a constraint; capacity is checked separately.
    pub fn suits(self, free: u32) -> bool {
        match self {
            BlockType::Long => free >= LONG_BLOCK_MINUTES,
            BlockType::Short | BlockType::Any => true,
        }
    }
}

impl FromStr for BlockType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "short" => Ok(BlockType::Short),
            "long" => Ok(BlockType::Long),
            "any" => Ok(BlockType::Any),
            other => Err(format!("unknown block type: {other}")),
        }
    }
}

/// Which placement pass a project joins. Projects without a role are queued
/// and never placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectRole {
    Focus,
    Buffer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique within the owning project (`#3` in the source file is `"3"`).
    pub id: String,
    pub name: String,

    /// Minutes.
    pub duration: u32,

    #[serde(default)]
    pub block_type: BlockType,

    /// Ids of tasks in the same project that must be placed first.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            duration: 60,
            block_type: BlockType::Any,
            dependencies: Vec::new(),
        }
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration = minutes;
        self
    }

    pub fn with_block_type(mut self, block_type: BlockType) -> Self {
        self.block_type = block_type;
        self
    }

    pub fn after(mut self, dependency: impl Into<String>) -> Self {
        self.dependencies.push(dependency.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// File stem of the source document; the project's identity.
    pub filename: String,

    /// Display name used in event titles.
    #[serde(rename = "project")]
    pub name: String,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub deadline: Option<NaiveDate>,

    #[serde(default)]
    pub tasks: Vec<Task>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<ProjectRole>,
}

impl Project {
    pub fn new(filename: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            name: name.into(),
            priority: Priority::Medium,
            deadline: None,
            tasks: Vec::new(),
            role: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_role(mut self, role: ProjectRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn total_minutes(&self) -> u32 {
        self.tasks.iter().map(|t| t.duration).sum()
    }
}
