//! Per-project dependency graph and topological task order.

use std::collections::HashMap;

use crate::error::ScheduleError;
use crate::task::{Project, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Adjacency list keyed by task position; `deps[i]` are the tasks `i` waits on.
#[derive(Debug)]
pub struct TaskGraph<'a> {
    project: &'a Project,
    deps: Vec<Vec<usize>>,
}

impl<'a> TaskGraph<'a> {
    /// Resolve every dependency id inside the project. A repeated task id is a
    /// `DuplicateTask`; an id that names no task is a `MalformedDependency`.
    pub fn build(project: &'a Project) -> Result<Self, ScheduleError> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        for (i, t) in project.tasks.iter().enumerate() {
            if index.insert(t.id.as_str(), i).is_some() {
                return Err(ScheduleError::DuplicateTask {
                    project: project.filename.clone(),
                    task: t.id.clone(),
                });
            }
        }

        let mut deps = Vec::with_capacity(project.tasks.len());
        for t in &project.tasks {
            let mut resolved = Vec::with_capacity(t.dependencies.len());
            for dep in &t.dependencies {
                let Some(&j) = index.get(dep.as_str()) else {
                    return Err(ScheduleError::MalformedDependency {
                        project: project.filename.clone(),
                        task: t.id.clone(),
                        dependency: dep.clone(),
                    });
                };
                resolved.push(j);
            }
            deps.push(resolved);
        }

        Ok(Self { project, deps })
    }

    /// Depth-first post-order over declared task order: every task follows all
    /// of its dependencies. A cycle is a `CyclicDependency`.
    pub fn topological_order(&self) -> Result<Vec<&'a Task>, ScheduleError> {
        let n = self.project.tasks.len();
        let mut marks = vec![Mark::Unvisited; n];
        let mut order = Vec::with_capacity(n);
        for i in 0..n {
            self.visit(i, &mut marks, &mut order)?;
        }
        Ok(order.into_iter().map(|i| &self.project.tasks[i]).collect())
    }

    fn visit(&self, i: usize, marks: &mut [Mark], order: &mut Vec<usize>) -> Result<(), ScheduleError> {
        match marks[i] {
            Mark::Done => return Ok(()),
            Mark::InProgress => {
                return Err(ScheduleError::CyclicDependency {
                    project: self.project.filename.clone(),
                    task: self.project.tasks[i].id.clone(),
                });
            }
            Mark::Unvisited => {}
        }

        marks[i] = Mark::InProgress;
        for &d in &self.deps[i] {
            self.visit(d, marks, order)?;
        }
        marks[i] = Mark::Done;
        order.push(i);
        Ok(())
    }
}

/// Validate a project and return its tasks in dependency order.
pub fn ordered_tasks(project: &Project) -> Result<Vec<&Task>, ScheduleError> {
    TaskGraph::build(project)?.topological_order()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn dependencies_come_first() {
        let p = Project::new("p", "P")
            .with_task(Task::new("1", "a").after("3"))
            .with_task(Task::new("2", "b"))
            .with_task(Task::new("3", "c").after("2"));
        assert_eq!(ids(&ordered_tasks(&p).unwrap()), vec!["2", "3", "1"]);
    }

    #[test]
    fn independent_tasks_keep_declared_order() {
        let p = Project::new("p", "P")
            .with_task(Task::new("1", "a"))
            .with_task(Task::new("2", "b"))
            .with_task(Task::new("3", "c"));
        assert_eq!(ids(&ordered_tasks(&p).unwrap()), vec!["1", "2", "3"]);
    }

    #[test]
    fn unknown_dependency_is_malformed() {
        let p = Project::new("p", "P").with_task(Task::new("1", "a").after("9"));
        let err = ordered_tasks(&p).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::MalformedDependency {
                project: "p".into(),
                task: "1".into(),
                dependency: "9".into()
            }
        );
    }

    #[test]
    fn repeated_ids_are_rejected() {
        let p = Project::new("p", "P")
            .with_task(Task::new("1", "a"))
            .with_task(Task::new("2", "b"))
            .with_task(Task::new("1", "c"));
        assert_eq!(
            ordered_tasks(&p).unwrap_err(),
            ScheduleError::DuplicateTask {
                project: "p".into(),
                task: "1".into()
            }
        );
    }

    #[test]
    fn cycles_are_rejected() {
        let p = Project::new("p", "P")
            .with_task(Task::new("1", "a").after("2"))
            .with_task(Task::new("2", "b").after("1"));
        assert!(matches!(
            ordered_tasks(&p),
            Err(ScheduleError::CyclicDependency { .. })
        ));

        let selfish = Project::new("q", "Q").with_task(Task::new("1", "a").after("1"));
        assert!(ordered_tasks(&selfish).is_err());
    }
}
