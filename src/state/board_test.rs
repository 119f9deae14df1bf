use super::*;

fn store() -> BoardStore {
    BoardStore::sample(Duration::ZERO)
}

// =============================================================
// Sample board
// =============================================================

#[test]
fn sample_board_has_three_columns() {
    let board = Board::sample();
    let names: Vec<&str> = board.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["To Do", "In Progress", "Done"]);
    assert!(board.columns[2].tasks.is_empty());
}

#[test]
fn find_task_searches_every_column() {
    let board = Board::sample();
    assert_eq!(board.find_task("task-3").unwrap().priority, Priority::High);
    assert!(board.find_task("task-404").is_none());
}

#[test]
fn tasks_assigned_to_filters_by_user() {
    let board = Board::sample();
    let ids: Vec<&str> = board.tasks_assigned_to(&UserId::from(2)).iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["task-1", "task-2"]);
}

#[test]
fn board_serializes_camel_case_fields() {
    let value = serde_json::to_value(Board::sample()).unwrap();
    let task = &value["columns"][0]["tasks"][0];
    assert_eq!(task["dueDate"], "2024-06-15");
    assert_eq!(task["assignedTo"], 2);
    assert_eq!(task["priority"], "medium");
    assert_eq!(task["comments"][0]["userId"], 1);
}

#[test]
fn comment_new_stamps_id_and_time() {
    let comment = Comment::new(UserId::from(1), "looks good");
    assert!(comment.id.starts_with("comment-"));
    assert!(comment.timestamp.ends_with('Z'));
    assert_eq!(comment.text, "looks good");
}

// =============================================================
// Store actions
// =============================================================

#[tokio::test]
async fn fetch_board_returns_snapshot() {
    let store = store();
    assert_eq!(store.fetch_board().await, Board::sample());
}

#[tokio::test]
async fn add_task_appends_with_defaults() {
    let mut store = store();
    let task = store
        .add_task("col-3", NewTask { title: "Ship it".to_owned(), ..NewTask::default() })
        .await
        .unwrap();
    assert!(task.id.starts_with("task-"));
    assert_eq!(task.progress, 0);
    assert!(task.labels.is_empty() && task.comments.is_empty() && task.attachments.is_empty());
    assert_eq!(store.board().columns[2].tasks, vec![task]);
}

#[tokio::test]
async fn add_task_unknown_column_errors() {
    let mut store = store();
    let err = store.add_task("col-9", NewTask::default()).await.unwrap_err();
    assert_eq!(err, BoardError::ColumnNotFound("col-9".to_owned()));
}

#[tokio::test]
async fn update_task_merges_only_given_fields() {
    let mut store = store();
    let updated = store
        .update_task(TaskPatch {
            id: "task-2".to_owned(),
            progress: Some(250),
            assigned_to: Some(None),
            ..TaskPatch::default()
        })
        .await
        .unwrap();
    assert_eq!(updated.progress, 100);
    assert_eq!(updated.assigned_to, None);
    assert_eq!(updated.title, "Create basic components");
    assert_eq!(store.board().find_task("task-2"), Some(&updated));
}

#[tokio::test]
async fn update_task_unknown_id_errors() {
    let mut store = store();
    let err = store.update_task(TaskPatch { id: "nope".to_owned(), ..TaskPatch::default() }).await.unwrap_err();
    assert_eq!(err, BoardError::TaskNotFound("nope".to_owned()));
}

#[tokio::test]
async fn add_comment_puts_newest_first() {
    let mut store = store();
    let comment = Comment::new(UserId::from(2), "second");
    let task = store.add_comment("task-1", comment.clone()).await.unwrap();
    assert_eq!(task.comments.len(), 2);
    assert_eq!(task.comments[0], comment);
    assert_eq!(task.comments[1].id, "comment-1");
}

#[tokio::test]
async fn add_attachment_appends() {
    let mut store = store();
    let attachment =
        Attachment { id: "att-1".to_owned(), name: "mockups.pdf".to_owned(), url: "https://files.test/mockups.pdf".to_owned() };
    let task = store.add_attachment("task-3", attachment.clone()).await.unwrap();
    assert_eq!(task.attachments, vec![attachment]);
    assert!(store.add_attachment("missing", task.attachments[0].clone()).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn actions_wait_for_simulated_latency() {
    let store = BoardStore::sample(Duration::from_millis(500));
    let started = tokio::time::Instant::now();
    store.fetch_board().await;
    assert!(started.elapsed() >= Duration::from_millis(500));
}
