use notedupe::actions::{clean_duplicate_groups, delete_all, delete_documents_by_id};
use notedupe::cli::{CleanArgs, FileScanArgs};
use notedupe::commands::run_clean;
use notedupe::config::Config;
use notedupe::dedupe::{ComparisonMode, ItemFilter, RetentionPolicy};
use notedupe::error::ExitCode;
use notedupe::host::{ChildEntry, DocEntry, Locator, MemoryHost};
use notedupe::scan::{empty_documents, scan_duplicate_files, FileScanOptions};

fn doc(id: &str, title: &str, path: &str) -> DocEntry {
    DocEntry {
        id: id.to_string(),
        title: title.to_string(),
        locator: Locator::new("box-1", path),
        readable_path: format!("/{title}"),
        updated: 20_240_101_000_000,
        size_bytes: 10,
    }
}

fn child(name: &str, path: &str, size_bytes: u64) -> ChildEntry {
    ChildEntry {
        name: name.to_string(),
        path: path.to_string(),
        child_count: 0,
        updated: 0,
        size_bytes,
    }
}

fn scan_options() -> FileScanOptions {
    FileScanOptions {
        notebook: "box-1".to_string(),
        path: "/".to_string(),
        recursive: true,
        mode: ComparisonMode::Content,
        filter: ItemFilter::default(),
    }
}

#[tokio::test]
async fn test_batch_delete_continues_past_failures() {
    let host = MemoryHost::new();
    host.add_document(doc("a", "A", "/a.sy"), "");
    host.add_document(doc("b", "B", "/b.sy"), "");
    host.add_document(doc("c", "C", "/c.sy"), "");
    host.fail_delete("/b.sy");

    let items = empty_documents(&host, false).await.unwrap();
    let outcome = delete_all(&host, &items).await;

    assert_eq!(outcome.deleted_count(), 2);
    assert_eq!(outcome.failure_count(), 1);
    assert!(!outcome.all_succeeded());
    // The failure in the middle did not stop the last deletion.
    assert!(!host.contains_document("a"));
    assert!(host.contains_document("b"));
    assert!(!host.contains_document("c"));
}

#[tokio::test]
async fn test_delete_by_id_isolates_missing_documents() {
    let host = MemoryHost::new();
    host.add_document(doc("real", "Real", "/real.sy"), "");

    let outcome = delete_documents_by_id(
        &host,
        &["ghost".to_string(), "real".to_string()],
    )
    .await
    .unwrap();

    assert_eq!(outcome.deleted, vec!["real"]);
    assert_eq!(outcome.failure_count(), 1);
    assert_eq!(outcome.freed_bytes, 10);
}

#[tokio::test]
async fn test_clean_keeps_the_largest_member() {
    let host = MemoryHost::new();
    host.add_children(
        "box-1",
        "/",
        vec![
            child("a.txt", "/a.txt", 10),
            child("b.txt", "/b.txt", 30),
            child("c.txt", "/c.txt", 20),
        ],
    );
    host.add_raw_file("/a.txt", b"dup!");
    host.add_raw_file("/b.txt", b"dup!");
    host.add_raw_file("/c.txt", b"dup!");

    let (groups, _) = scan_duplicate_files(&host, &scan_options()).await.unwrap();
    assert_eq!(groups.len(), 1);

    let outcome = clean_duplicate_groups(&host, &groups, RetentionPolicy::Largest).await;

    assert!(outcome.all_succeeded());
    assert_eq!(outcome.deleted_count(), 2);
    assert_eq!(outcome.freed_bytes, 30);
    let deletions: Vec<String> = host
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("delete_item"))
        .collect();
    assert_eq!(
        deletions,
        vec!["delete_item box-1:/a.txt", "delete_item box-1:/c.txt"]
    );
}

#[tokio::test]
async fn test_clean_ties_keep_scan_order_winner() {
    let host = MemoryHost::new();
    host.add_children(
        "box-1",
        "/",
        vec![child("a.txt", "/a.txt", 10), child("b.txt", "/b.txt", 10)],
    );
    host.add_raw_file("/a.txt", b"dup!");
    host.add_raw_file("/b.txt", b"dup!");

    let (groups, _) = scan_duplicate_files(&host, &scan_options()).await.unwrap();
    // Sizes and timestamps tie under every policy, so the first stays.
    for policy in [
        RetentionPolicy::Newest,
        RetentionPolicy::Oldest,
        RetentionPolicy::Largest,
        RetentionPolicy::Smallest,
    ] {
        let hold = MemoryHost::new();
        hold.add_children(
            "box-1",
            "/",
            vec![child("a.txt", "/a.txt", 10), child("b.txt", "/b.txt", 10)],
        );
        hold.add_raw_file("/a.txt", b"dup!");
        hold.add_raw_file("/b.txt", b"dup!");

        let outcome = clean_duplicate_groups(&hold, &groups, policy).await;
        assert_eq!(outcome.deleted, vec!["/b.txt"], "policy {policy}");
    }
}

#[tokio::test]
async fn test_keeper_follows_the_policy_given_at_cleanup_time() {
    let seed = |host: &MemoryHost| {
        host.add_children(
            "box-1",
            "/",
            vec![child("small.txt", "/small.txt", 5), child("big.txt", "/big.txt", 50)],
        );
        host.add_raw_file("/small.txt", b"dup!");
        host.add_raw_file("/big.txt", b"dup!");
    };

    let scanned = MemoryHost::new();
    seed(&scanned);
    let (groups, _) = scan_duplicate_files(&scanned, &scan_options()).await.unwrap();

    // The same scan output, cleaned under two policies, keeps different members.
    let keep_big = MemoryHost::new();
    seed(&keep_big);
    let outcome = clean_duplicate_groups(&keep_big, &groups, RetentionPolicy::Largest).await;
    assert_eq!(outcome.deleted, vec!["/small.txt"]);

    let keep_small = MemoryHost::new();
    seed(&keep_small);
    let outcome = clean_duplicate_groups(&keep_small, &groups, RetentionPolicy::Smallest).await;
    assert_eq!(outcome.deleted, vec!["/big.txt"]);
}

#[tokio::test]
async fn test_clean_command_end_to_end() {
    let host = MemoryHost::new();
    host.add_children(
        "box-1",
        "/",
        vec![
            child("a.txt", "/a.txt", 4),
            child("b.txt", "/b.txt", 4),
            child("solo.txt", "/solo.txt", 4),
        ],
    );
    host.add_raw_file("/a.txt", b"dup!");
    host.add_raw_file("/b.txt", b"dup!");
    host.add_raw_file("/solo.txt", b"solo");

    let args = CleanArgs {
        scan: FileScanArgs {
            notebook: "box-1".to_string(),
            path: "/".to_string(),
            by: ComparisonMode::Content,
            min_size: None,
            ignore_ext: Vec::new(),
            no_recursive: false,
        },
        keep: None,
        yes: true,
        dry_run: false,
        json: true,
    };
    let code = run_clean(&host, &Config::default(), &args, true)
        .await
        .unwrap();

    assert_eq!(code, ExitCode::Success);
    // One duplicate deleted, one keeper and the singleton left alone.
    let deletions: Vec<String> = host
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("delete_item"))
        .collect();
    assert_eq!(deletions.len(), 1);
    assert_eq!(host.pushed_notifications().len(), 1);
}

#[tokio::test]
async fn test_clean_failure_reports_partial_success() {
    let host = MemoryHost::new();
    host.add_children(
        "box-1",
        "/",
        vec![
            child("keep.txt", "/keep.txt", 9),
            child("gone.txt", "/gone.txt", 4),
            child("stuck.txt", "/stuck.txt", 4),
        ],
    );
    host.add_raw_file("/keep.txt", b"dup!");
    host.add_raw_file("/gone.txt", b"dup!");
    host.add_raw_file("/stuck.txt", b"dup!");
    host.fail_delete("/stuck.txt");

    let (groups, _) = scan_duplicate_files(&host, &scan_options()).await.unwrap();
    let outcome = clean_duplicate_groups(&host, &groups, RetentionPolicy::Largest).await;

    assert_eq!(outcome.deleted, vec!["/gone.txt"]);
    assert_eq!(outcome.failure_count(), 1);
    assert_eq!(outcome.freed_bytes, 4);
}
