//! Project files.
//!
//! ```text
//! ---
//! project: Website
//! priority: high
//! deadline: 2025-03-31
//! ---
//! - [ ] #1 Research | 2h
//! - [ ] #2 Wireframes | 3h | long | after:#1
//! ```

use anyhow::Result;
use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, warn};
use weekplan_core::{BlockType, Priority, Project, Task};

use super::{file_stem, parse_duration};
use crate::frontmatter::Frontmatter;

/// Parse one project file. Lines that are not task lines are ignored.
pub fn parse_project(content: &str, filename: &str) -> Result<Project> {
    let task_re = Regex::new(concat!(
        r"^- \[ \] #(?P<id>\d+)\s+(?P<name>.+?)\s*",
        r"\|\s*(?P<dur>\d+(?:\.\d+)?[hm])\s*",
        r"(?:\|\s*(?P<block>short|long|any)\s*)?",
        r"(?:\|\s*after:(?P<deps>#[\d,#\s]+?)\s*)?$"
    ))?;

    let stem = file_stem(filename);
    let fm = Frontmatter::split(content);
    let mut project = Project::new(stem, fm.get("project").unwrap_or(stem));

    if let Some(p) = fm.get("priority") {
        match p.parse::<Priority>() {
            Ok(p) => project = project.with_priority(p),
            Err(e) => warn!(file = %filename, "{e}; using medium"),
        }
    }
    if let Some(d) = fm.get("deadline") {
        match NaiveDate::parse_from_str(d, "%Y-%m-%d") {
            Ok(d) => project = project.with_deadline(d),
            Err(_) => warn!(file = %filename, deadline = %d, "ignoring unparsable deadline"),
        }
    }

    for line in fm.body.lines() {
        let Some(caps) = task_re.captures(line.trim()) else { continue };
        let Some(minutes) = parse_duration(&caps["dur"]) else { continue };

        let mut task = Task::new(&caps["id"], caps["name"].trim()).with_duration(minutes);
        if let Some(block) = caps.name("block") {
            // the regex only admits known block types
            task = task.with_block_type(block.as_str().parse().unwrap_or(BlockType::Any));
        }
        if let Some(deps) = caps.name("deps") {
            for dep in deps.as_str().split(',') {
                let dep = dep.trim().trim_start_matches('#').trim();
                if !dep.is_empty() {
                    task = task.after(dep);
                }
            }
        }
        project = project.with_task(task);
    }

    debug!(file = %filename, tasks = project.tasks.len(), "parsed project");
    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "---
project: Website Redesign
priority: high
deadline: 2025-03-31
---

Some notes that are not tasks.

- [ ] #1 Research competitors | 2h
- [ ] #2 Wireframes | 1.5h | long | after:#1
- [ ] #3 Build pages | 45m | short | after:#1,#2
- [x] #4 Done already | 1h
- [ ] #5 Deploy | 30m | after:#3
";

    #[test]
    fn parses_header_and_tasks() {
        let p = parse_project(SAMPLE, "website.md").unwrap();
        assert_eq!(p.filename, "website");
        assert_eq!(p.name, "Website Redesign");
        assert_eq!(p.priority, Priority::High);
        assert_eq!(p.deadline, NaiveDate::from_ymd_opt(2025, 3, 31));
        assert_eq!(p.tasks.len(), 4);

        let t = &p.tasks[1];
        assert_eq!((t.id.as_str(), t.name.as_str()), ("2", "Wireframes"));
        assert_eq!(t.duration, 90);
        assert_eq!(t.block_type, BlockType::Long);
        assert_eq!(t.dependencies, vec!["1"]);

        assert_eq!(p.tasks[2].dependencies, vec!["1", "2"]);
        assert_eq!(p.tasks[2].block_type, BlockType::Short);
        assert_eq!(p.tasks[3].block_type, BlockType::Any);
        assert_eq!(p.tasks[3].dependencies, vec!["3"]);
    }

    #[test]
    fn defaults_come_from_the_filename() {
        let p = parse_project("- [ ] #1 Only task | 1h", "side-quest.md").unwrap();
        assert_eq!(p.name, "side-quest");
        assert_eq!(p.priority, Priority::Medium);
        assert_eq!(p.deadline, None);
        assert_eq!(p.tasks[0].duration, 60);
    }

    #[test]
    fn bad_header_values_fall_back() {
        let p = parse_project("---\npriority: urgent\ndeadline: soon\n---\n", "x.md").unwrap();
        assert_eq!(p.priority, Priority::Medium);
        assert_eq!(p.deadline, None);
        assert!(p.tasks.is_empty());
    }

    #[test]
    fn lines_without_duration_are_skipped() {
        let p = parse_project("- [ ] #1 No duration\n- [ ] #2 Fine | 20m\n", "x.md").unwrap();
        assert_eq!(p.tasks.len(), 1);
        assert_eq!(p.tasks[0].id, "2");
    }
}
