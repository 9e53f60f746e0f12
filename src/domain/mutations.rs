//! Pure operations over a task collection.
//!
//! Each function takes the current collection and returns the next one.
//! Blank text and unknown ids are ignored: the returned collection is then
//! equal to the input.

use chrono::{DateTime, SubsecRound, Utc};

use super::todo::{EditTodo, NewTodo, Subtask, SubtaskId, Todo, TodoId};

fn clean_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

/// Stored timestamps carry millisecond precision.
fn stamp(now: DateTime<Utc>) -> DateTime<Utc> { now.trunc_subsecs(3) }

/// Prepends a new pending task. Returns the collection unchanged for blank text.
pub fn add(todos: &[Todo], input: NewTodo, now: DateTime<Utc>) -> Vec<Todo> {
    let Some(text) = clean_text(&input.text) else { return todos.to_vec() };
    let todo = Todo {
        id: TodoId::default(),
        text,
        completed: false,
        priority: input.priority,
        category: input.category,
        created_at: stamp(now),
        completed_at: None,
        due_date: input.due_date,
        subtasks: Vec::new(),
    };
    std::iter::once(todo).chain(todos.iter().cloned()).collect()
}

pub fn toggle(todos: &[Todo], id: TodoId, now: DateTime<Utc>) -> Vec<Todo> {
    map_todo(todos, id, |todo| {
        todo.completed = !todo.completed;
        todo.completed_at = if todo.completed { Some(stamp(now)) } else { None };
    })
}

/// Replaces text and due date; a `None` due date clears it.
pub fn edit(todos: &[Todo], id: TodoId, input: EditTodo) -> Vec<Todo> {
    let Some(text) = clean_text(&input.text) else { return todos.to_vec() };
    map_todo(todos, id, |todo| {
        todo.text = text.clone();
        todo.due_date = input.due_date;
    })
}

pub fn remove(todos: &[Todo], id: TodoId) -> Vec<Todo> {
    todos.iter().filter(|t| t.id != id).cloned().collect()
}

pub fn add_subtask(todos: &[Todo], id: TodoId, text: &str) -> Vec<Todo> {
    let Some(text) = clean_text(text) else { return todos.to_vec() };
    map_todo(todos, id, |todo| {
        todo.subtasks.push(Subtask { id: SubtaskId::default(), text: text.clone(), completed: false });
    })
}

pub fn toggle_subtask(todos: &[Todo], id: TodoId, subtask_id: SubtaskId) -> Vec<Todo> {
    map_todo(todos, id, |todo| {
        if let Some(subtask) = todo.subtasks.iter_mut().find(|s| s.id == subtask_id) {
            subtask.completed = !subtask.completed;
        }
    })
}

pub fn remove_subtask(todos: &[Todo], id: TodoId, subtask_id: SubtaskId) -> Vec<Todo> {
    map_todo(todos, id, |todo| todo.subtasks.retain(|s| s.id != subtask_id))
}

fn map_todo(todos: &[Todo], id: TodoId, mut f: impl FnMut(&mut Todo)) -> Vec<Todo> {
    todos
        .iter()
        .cloned()
        .map(|mut todo| {
            if todo.id == id { f(&mut todo); }
            todo
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::todo::{Category, Priority};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 5, 10, 8, 30, 0).unwrap() }

    fn new_todo(text: &str) -> NewTodo {
        NewTodo { text: text.into(), priority: Priority::Low, category: Category::Personal, due_date: None }
    }

    #[test]
    fn add_prepends_pending_task() {
        let first = add(&[], new_todo("first"), now());
        let both = add(&first, new_todo("  second  "), now());
        assert_eq!(both.len(), 2);
        assert_eq!(both[0].text, "second");
        assert_eq!(both[1].id, first[0].id);
        assert!(!both[0].completed);
        assert_eq!(both[0].completed_at, None);
        assert_eq!(both[0].created_at, now());
    }

    #[test]
    fn add_ignores_blank_text() {
        let todos = add(&[], new_todo("keep"), now());
        assert_eq!(add(&todos, new_todo("   \t"), now()), todos);
    }

    #[test]
    fn double_toggle_restores_task() {
        let todos = add(&[], new_todo("toggle me"), now());
        let id = todos[0].id;
        let done = toggle(&todos, id, now() + Duration::minutes(5));
        assert!(done[0].completed);
        assert_eq!(done[0].completed_at, Some(now() + Duration::minutes(5)));
        let undone = toggle(&done, id, now() + Duration::minutes(6));
        assert_eq!(undone, todos);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let todos = add(&[], new_todo("only"), now());
        let missing = TodoId::default();
        assert_eq!(toggle(&todos, missing, now()), todos);
        assert_eq!(remove(&todos, missing), todos);
        assert_eq!(edit(&todos, missing, EditTodo { text: "x".into(), due_date: None }), todos);
        assert_eq!(add_subtask(&todos, missing, "child"), todos);
    }

    #[test]
    fn remove_undoes_add() {
        let base = add(&add(&[], new_todo("a"), now()), new_todo("b"), now());
        let grown = add(&base, new_todo("c"), now());
        assert_eq!(remove(&grown, grown[0].id), base);
    }

    #[test]
    fn edit_replaces_text_and_due_date_only() {
        let due = now() + Duration::days(2);
        let added = add(&[], new_todo("draft"), now());
        let id = added[0].id;
        let todos = toggle(&added, id, now());
        let edited = edit(&todos, id, EditTodo { text: " final ".into(), due_date: Some(due) });
        assert_eq!(edited[0].text, "final");
        assert_eq!(edited[0].due_date, Some(due));
        assert!(edited[0].completed);
        assert_eq!(edited[0].completed_at, todos[0].completed_at);
        assert_eq!(edited[0].created_at, todos[0].created_at);
        assert_eq!(edit(&edited, id, EditTodo { text: "".into(), due_date: None }), edited);
        let cleared = edit(&edited, id, EditTodo { text: "final".into(), due_date: None });
        assert_eq!(cleared[0].due_date, None);
    }

    #[test]
    fn subtasks_are_scoped_to_their_parent() {
        let todos = add(&add(&[], new_todo("other"), now()), new_todo("parent"), now());
        let parent = todos[0].id;
        let with_child = add_subtask(&add_subtask(&todos, parent, "one"), parent, "two");
        assert_eq!(with_child[0].subtasks.len(), 2);
        assert!(with_child[1].subtasks.is_empty());
        assert_eq!(add_subtask(&with_child, parent, " "), with_child);

        let child = with_child[0].subtasks[0].id;
        let toggled = toggle_subtask(&with_child, parent, child);
        assert!(toggled[0].subtasks[0].completed);
        assert!(!toggled[0].completed);
        assert_eq!(toggled[0].subtask_progress(), (1, 2));

        let removed = remove_subtask(&toggled, parent, child);
        assert_eq!(removed[0].subtasks.len(), 1);
        assert_eq!(removed[0].subtasks[0].text, "two");
        assert_eq!(remove_subtask(&removed, parent, SubtaskId::default()), removed);
    }
}
