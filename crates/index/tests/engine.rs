use std::{sync::Arc, time::Duration};

use index::{ActionError, MemoryVault, SettingsSource, SettingsStore, Snapshot, TasksStore};
use taskdeck_core::{ScopeOption, Settings, TaskId};
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

fn everywhere() -> Settings {
  Settings {
    scope: ScopeOption::Everywhere,
    ..Default::default()
  }
}

fn scenario_files() -> Vec<(&'static str, &'static str)> {
  vec![
    ("b/file2.md", "# B\n- [ ] b first\n- [x] b second\n"),
    ("a/file1.md", "intro\n- [ ] a only\n"),
  ]
}

async fn start<P, C>(files: Vec<(P, C)>, settings: Settings) -> (MemoryVault, SettingsStore, TasksStore)
where
  P: Into<String>,
  C: Into<String>,
{
  let vault = MemoryVault::from_files(files);
  let settings = SettingsStore::new(settings);
  let store = TasksStore::spawn(
    Arc::new(vault.clone()),
    Arc::new(settings.clone()),
    CancellationToken::new(),
  );
  vault.attach(store.handle()).await;
  store.initialise().unwrap();
  settle(&store).await;
  (vault, settings, store)
}

async fn settle(store: &TasksStore) {
  timeout(Duration::from_secs(5), store.settled())
    .await
    .expect("timeout waiting for index to settle")
    .expect("index actor alive");
}

fn summary(snapshot: &Snapshot) -> Vec<(String, usize, String)> {
  snapshot
    .iter()
    .map(|t| (t.path.clone(), t.row_index, t.content.clone()))
    .collect()
}

fn find(snapshot: &Snapshot, content: &str) -> TaskId {
  snapshot
    .iter()
    .find(|t| t.content == content)
    .map(|t| t.id.clone())
    .unwrap_or_else(|| panic!("task {content:?} not in snapshot"))
}

#[tokio::test]
async fn test_initialise_orders_by_path_then_row() {
  let (_vault, _settings, store) = start(scenario_files(), everywhere()).await;

  let snapshot = store.snapshot();
  assert_eq!(
    summary(&snapshot),
    vec![
      ("a/file1.md".to_string(), 1, "a only".to_string()),
      ("b/file2.md".to_string(), 1, "b first".to_string()),
      ("b/file2.md".to_string(), 2, "b second".to_string()),
    ]
  );
  assert!(snapshot[2].done);
}

#[tokio::test]
async fn test_excluded_folder_change_is_ignored_until_rebuild() {
  let (vault, settings, store) = start(scenario_files(), everywhere()).await;

  settings.try_update(|s| s.add_excluded_folder("a")).unwrap();
  vault.put("a/file1.md", "intro\n- [ ] a edited\n").await;
  settle(&store).await;

  // The modify event was filtered out, so the old task is still there
  let snapshot = store.snapshot();
  assert_eq!(snapshot.len(), 3);
  assert!(snapshot.iter().any(|t| t.content == "a only"));

  store.initialise().unwrap();
  settle(&store).await;
  let snapshot = store.snapshot();
  assert_eq!(snapshot.len(), 2);
  assert!(snapshot.iter().all(|t| t.path == "b/file2.md"));
}

#[tokio::test]
async fn test_rebuild_is_idempotent() {
  let (_vault, _settings, store) = start(scenario_files(), everywhere()).await;
  let first = store.snapshot();

  store.initialise().unwrap();
  settle(&store).await;
  let second = store.snapshot();

  assert_eq!(first.to_vec(), second.to_vec());
}

#[tokio::test]
async fn test_burst_produces_single_publish() {
  let files: Vec<(String, &str)> = (0..20).map(|i| (format!("notes/{i:02}.md"), "- [ ] task")).collect();
  let (_vault, _settings, store) = start(files, everywhere()).await;

  let stats = store.stats().await.unwrap();
  assert_eq!(stats.tasks, 20);
  assert_eq!(stats.published, 1);
  assert_eq!(store.snapshot().len(), 20);
}

#[tokio::test]
async fn test_delete_removes_file_tasks() {
  let (vault, _settings, store) = start(scenario_files(), everywhere()).await;

  assert!(vault.remove("b/file2.md").await);
  settle(&store).await;

  let snapshot = store.snapshot();
  assert_eq!(snapshot.len(), 1);
  assert_eq!(snapshot[0].path, "a/file1.md");

  let stats = store.stats().await.unwrap();
  assert_eq!(stats.tasks, 1);
  assert_eq!(stats.metadata, 1);
  assert_eq!(stats.files, 1);
}

#[tokio::test]
async fn test_modify_replaces_file_tasks() {
  let (vault, _settings, store) = start(scenario_files(), everywhere()).await;

  vault.put("a/file1.md", "- [ ] new one\n- [ ] new two\n").await;
  vault.put("c.md", "- [ ] root task\n").await;
  settle(&store).await;

  let snapshot = store.snapshot();
  let contents: Vec<&str> = snapshot.iter().map(|t| t.content.as_str()).collect();
  assert_eq!(contents, vec!["new one", "new two", "b first", "b second", "root task"]);
}

#[tokio::test]
async fn test_newest_extraction_wins() {
  let (vault, _settings, store) = start(vec![("a.md", "- [ ] v1\n")], everywhere()).await;

  // The slow read captures v2 and finishes after the fast read of v3
  vault.set_read_delay("a.md", Some(Duration::from_millis(200))).await;
  vault.put("a.md", "- [ ] v2\n").await;
  sleep(Duration::from_millis(30)).await;
  vault.set_read_delay("a.md", None).await;
  vault.put("a.md", "- [ ] v3\n").await;
  settle(&store).await;

  let snapshot = store.snapshot();
  assert_eq!(summary(&snapshot), vec![("a.md".to_string(), 0, "v3".to_string())]);
}

#[tokio::test]
async fn test_delete_discards_in_flight_extraction() {
  let (vault, _settings, store) = start(vec![("a.md", "- [ ] v1\n"), ("b.md", "- [ ] b\n")], everywhere()).await;

  vault.set_read_delay("a.md", Some(Duration::from_millis(150))).await;
  vault.put("a.md", "- [ ] v2\n").await;
  sleep(Duration::from_millis(30)).await;
  vault.remove("a.md").await;
  settle(&store).await;

  let snapshot = store.snapshot();
  assert_eq!(snapshot.len(), 1);
  assert_eq!(snapshot[0].path, "b.md");
}

#[tokio::test]
async fn test_failed_extraction_keeps_previous_tasks() {
  let (vault, _settings, store) = start(scenario_files(), everywhere()).await;

  vault.set_unreadable("a/file1.md", true).await;
  vault.put("a/file1.md", "- [ ] unreachable\n").await;
  settle(&store).await;

  let snapshot = store.snapshot();
  assert!(snapshot.iter().any(|t| t.content == "a only"));
  assert_eq!(snapshot.len(), 3);
}

#[tokio::test]
async fn test_rename_rebuilds() {
  let (vault, _settings, store) = start(scenario_files(), everywhere()).await;

  vault.rename("a/file1.md", "z/moved.md").await.unwrap();
  settle(&store).await;

  let snapshot = store.snapshot();
  let paths: Vec<&str> = snapshot.iter().map(|t| t.path.as_str()).collect();
  assert_eq!(paths, vec!["b/file2.md", "b/file2.md", "z/moved.md"]);
}

#[tokio::test]
async fn test_slow_rebuild_never_publishes_cleared_index() {
  let (vault, _settings, store) = start(scenario_files(), everywhere()).await;
  let mut updates = store.subscribe();
  updates.borrow_and_update();

  let delay = Some(Duration::from_millis(120));
  vault.set_read_delay("b/file2.md", delay).await;
  vault.set_read_delay("z/moved.md", delay).await;
  vault.rename("a/file1.md", "z/moved.md").await.unwrap();

  let mut sizes = Vec::new();
  while let Ok(Ok(())) = timeout(Duration::from_millis(400), updates.changed()).await {
    sizes.push(updates.borrow_and_update().len());
  }

  assert!(!sizes.is_empty());
  assert!(sizes.iter().all(|&n| n > 0), "published sizes: {sizes:?}");
  assert_eq!(sizes.last(), Some(&3));
}

#[tokio::test]
async fn test_rebuild_of_unreadable_files_publishes_empty_snapshot() {
  let (vault, _settings, store) = start(vec![("t.md", "- [ ] only\n")], everywhere()).await;
  assert_eq!(store.snapshot().len(), 1);

  vault.set_unreadable("t.md", true).await;
  store.initialise().unwrap();
  settle(&store).await;

  assert!(store.snapshot().is_empty());
  assert_eq!(store.stats().await.unwrap().published, 2);
}

#[tokio::test]
async fn test_folder_scope() {
  let settings = Settings {
    scope: ScopeOption::Folder,
    folder: "/b".to_string(),
    excluded_folders: vec!["b".to_string()],
    ..Default::default()
  };
  let (_vault, _settings, store) = start(scenario_files(), settings).await;

  let snapshot = store.snapshot();
  assert_eq!(snapshot.len(), 2);
  assert!(snapshot.iter().all(|t| t.path == "b/file2.md"));
}

#[tokio::test]
async fn test_empty_vault_publishes_empty_snapshot() {
  let (_vault, _settings, store) = start(Vec::<(&str, &str)>::new(), everywhere()).await;
  assert!(store.snapshot().is_empty());
  assert_eq!(store.stats().await.unwrap().published, 1);
}

// ============================================================================
// Task Actions
// ============================================================================

#[tokio::test]
async fn test_toggle_done_round_trips_through_file() {
  let (vault, _settings, store) = start(scenario_files(), everywhere()).await;
  let id = find(&store.snapshot(), "a only");

  let done = store.actions().toggle_done(&id).await.unwrap();
  assert!(done);
  assert_eq!(vault.content("a/file1.md").await.unwrap(), "intro\n- [x] a only\n");

  settle(&store).await;
  let snapshot = store.snapshot();
  let task = snapshot.iter().find(|t| t.path == "a/file1.md").unwrap();
  assert!(task.done);
  // The edited line is a new task identity
  assert_ne!(task.id, id);

  let done = store.actions().toggle_done(&task.id).await.unwrap();
  assert!(!done);
  assert_eq!(vault.content("a/file1.md").await.unwrap(), "intro\n- [ ] a only\n");
}

#[tokio::test]
async fn test_done_marker_follows_settings() {
  let mut settings = everywhere();
  settings.done_status_markers = "✓x".to_string();
  let (vault, _settings, store) = start(vec![("t.md", "- [ ] task\n")], settings).await;

  let id = find(&store.snapshot(), "task");
  store.actions().mark_done(&id, true).await.unwrap();
  assert_eq!(vault.content("t.md").await.unwrap(), "- [✓] task\n");
}

#[tokio::test]
async fn test_stale_id_is_not_found() {
  let (vault, _settings, store) = start(scenario_files(), everywhere()).await;
  let id = find(&store.snapshot(), "a only");

  vault.remove("a/file1.md").await;
  settle(&store).await;

  let err = store.actions().toggle_done(&id).await.unwrap_err();
  assert!(matches!(err, ActionError::NotFound(_)));
  assert!(matches!(
    store.actions().locate(&TaskId::from("missing")).await,
    Err(ActionError::NotFound(_))
  ));
}

#[tokio::test]
async fn test_edit_of_changed_line_conflicts() {
  let vault = MemoryVault::from_files([("t.md", "- [ ] original\n")]);
  let settings = SettingsStore::new(everywhere());
  let store = TasksStore::spawn(
    Arc::new(vault.clone()),
    Arc::new(settings.clone()),
    CancellationToken::new(),
  );
  store.initialise().unwrap();
  settle(&store).await;
  let id = find(&store.snapshot(), "original");

  // Not attached: the index never hears about this edit
  vault.put("t.md", "- [ ] rewritten\n").await;

  let err = store.actions().toggle_done(&id).await.unwrap_err();
  assert!(matches!(err, ActionError::Conflict { line: 1, .. }));
  assert_eq!(vault.content("t.md").await.unwrap(), "- [ ] rewritten\n");
}

#[tokio::test]
async fn test_change_column_and_update_content() {
  let (vault, settings, store) = start(vec![("t.md", "  - [ ] plan trip #later #travel\r\nnext\r\n")], everywhere()).await;
  let id = find(&store.snapshot(), "plan trip #travel");

  store.actions().change_column(&id, Some("Today")).await.unwrap();
  assert_eq!(
    vault.content("t.md").await.unwrap(),
    "  - [ ] plan trip #travel #today\r\nnext\r\n"
  );
  settle(&store).await;

  let snapshot = store.snapshot();
  let task = snapshot.iter().find(|t| t.path == "t.md").unwrap();
  assert_eq!(task.column.as_deref(), Some("Today"));

  store.actions().update_content(&task.id, "book flights #travel").await.unwrap();
  assert_eq!(
    vault.content("t.md").await.unwrap(),
    "  - [ ] book flights #travel #today\r\nnext\r\n"
  );
  settle(&store).await;

  let id = find(&store.snapshot(), "book flights #travel");
  assert!(matches!(
    store.actions().change_column(&id, Some("Someday")).await,
    Err(ActionError::UnknownColumn(_))
  ));

  store.actions().change_column(&id, None).await.unwrap();
  assert_eq!(vault.content("t.md").await.unwrap(), "  - [ ] book flights #travel\r\nnext\r\n");
  assert!(settings.current().columns.contains(&"Today".to_string()));
}

#[tokio::test]
async fn test_delete_task_and_locate() {
  let (vault, _settings, store) = start(scenario_files(), everywhere()).await;
  let id = find(&store.snapshot(), "b second");

  let location = store.actions().locate(&id).await.unwrap();
  assert_eq!(location.file.path, "b/file2.md");
  assert_eq!(location.row_index, 2);

  store.actions().delete_task(&id).await.unwrap();
  assert_eq!(vault.content("b/file2.md").await.unwrap(), "# B\n- [ ] b first\n");
  settle(&store).await;
  assert_eq!(store.snapshot().len(), 2);
}
