//! Task-code resource parser and importer.
//!
//! # Responsibility
//! - Read `NNNN Name` lines into tasks, skipping comments and categories.
//! - Assign parents by truncating codes to wider power-of-ten boundaries.
//!
//! # Invariants
//! - Only lines starting with four digits produce tasks.
//! - A name whose trimmed text starts with `-` is a category marker.
//! - A task never becomes its own parent.

use crate::db::schema::Seeder;
use crate::db::TransactionScope;
use crate::model::task::{Task, TaskId};
use crate::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use crate::repo::RepoResult;
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::Path;

static TASK_CODE_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})(.*)$").expect("valid task code regex"));

/// Parses task-code text into tasks with parents inferred.
pub fn parse_task_codes(text: &str) -> Vec<Task> {
    let mut tasks: Vec<Task> = text.lines().filter_map(parse_line).collect();
    infer_parents(&mut tasks);
    tasks
}

fn parse_line(line: &str) -> Option<Task> {
    let captures = TASK_CODE_LINE_RE.captures(line)?;
    let id: TaskId = captures.get(1)?.as_str().parse().ok()?;
    let name = captures.get(2)?.as_str().trim();
    if name.is_empty() || name.starts_with('-') {
        return None;
    }
    Some(Task::new(id, name))
}

/// Assigns each task the nearest existing ancestor code.
///
/// For `1234` the candidates are `1230`, `1200`, `1000`, in that order;
/// the first one present in `tasks` becomes the parent.
pub fn infer_parents(tasks: &mut [Task]) {
    let known: HashSet<TaskId> = tasks.iter().map(|task| task.id).collect();
    for task in tasks.iter_mut() {
        task.parent = parent_candidates(task.id).find(|candidate| known.contains(candidate));
    }
}

fn parent_candidates(id: TaskId) -> impl Iterator<Item = TaskId> {
    let mut truncated = id;
    let mut divisor: Option<TaskId> = Some(10);
    std::iter::from_fn(move || {
        while let Some(current) = divisor.filter(|current| truncated > *current) {
            truncated = (truncated / current) * current;
            divisor = current.checked_mul(10);
            if truncated != id {
                return Some(truncated);
            }
        }
        None
    })
}

/// Imports task codes into an existing database in one transaction.
///
/// Returns the number of tasks written.
pub fn import_task_codes(conn: &Connection, text: &str) -> RepoResult<usize> {
    let tasks = parse_task_codes(text);
    let scope = TransactionScope::begin(conn, "import_task_codes")?;
    let written = add_all(&scope, &tasks)?;
    scope.commit()?;
    info!(
        "event=task_codes_import module=seed status=ok tasks={}",
        written
    );
    Ok(written)
}

fn add_all(conn: &Connection, tasks: &[Task]) -> RepoResult<usize> {
    let repo = SqliteTaskRepository::new(conn);
    for task in tasks {
        repo.add_task(task)?;
    }
    Ok(tasks.len())
}

/// `Seeder` that fills `Tasks` from a task-code resource.
#[derive(Debug, Clone, Default)]
pub struct TaskCodeSeeder {
    text: String,
}

impl TaskCodeSeeder {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Loads the resource from disk. A missing file yields an empty seeder.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Self::from_text(text)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    "event=task_codes_load module=seed status=skipped reason=not_found path={}",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(err) => Err(err),
        }
    }
}

impl Seeder for TaskCodeSeeder {
    fn seed(&self, conn: &Connection) -> Result<usize, String> {
        let tasks = parse_task_codes(&self.text);
        info!(
            "event=task_codes_parse module=seed status=ok tasks={}",
            tasks.len()
        );
        add_all(conn, &tasks).map_err(|err| err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{infer_parents, parent_candidates, parse_task_codes};
    use crate::model::task::Task;

    #[test]
    fn candidates_widen_one_digit_at_a_time() {
        assert_eq!(
            parent_candidates(1234).collect::<Vec<_>>(),
            vec![1230, 1200, 1000]
        );
        assert_eq!(parent_candidates(1200).collect::<Vec<_>>(), vec![1000]);
        assert_eq!(parent_candidates(5).count(), 0);
    }

    #[test]
    fn candidates_stop_before_the_divisor_overflows() {
        let candidates: Vec<i64> = parent_candidates(i64::MAX).collect();
        assert_eq!(candidates.len(), 18);
        assert_eq!(candidates.last(), Some(&9_000_000_000_000_000_000));
        assert!(candidates.windows(2).all(|pair| pair[0] >= pair[1]));

        let mut tasks = vec![
            Task::new(i64::MAX, "Edge"),
            Task::new(9_000_000_000_000_000_000, "Top"),
        ];
        infer_parents(&mut tasks);
        assert_eq!(tasks[0].parent, Some(9_000_000_000_000_000_000));
    }

    #[test]
    fn skips_comments_categories_and_short_lines() {
        let tasks = parse_task_codes(
            "# project codes\n\
             1000-1999 - Internal\n\
             1000 Internal\n\
             12\n\
             abcd Not a code\n\
             1100   Meetings  \n",
        );

        let ids: Vec<i64> = tasks.iter().map(|task| task.id).collect();
        assert_eq!(ids, vec![1000, 1100]);
        assert_eq!(tasks[1].name, "Meetings");
    }

    #[test]
    fn nearest_existing_ancestor_wins() {
        let tasks = parse_task_codes("1000 Root\n1230 Group\n1234 Leaf\n1300 Other\n");

        let parent_of = |id: i64| {
            tasks
                .iter()
                .find(|task| task.id == id)
                .and_then(|task| task.parent)
        };
        assert_eq!(parent_of(1000), None);
        assert_eq!(parent_of(1230), Some(1000));
        assert_eq!(parent_of(1234), Some(1230));
        assert_eq!(parent_of(1300), Some(1000));
    }
}
