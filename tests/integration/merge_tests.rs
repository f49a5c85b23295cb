use notedupe::actions::{merge_documents, MergeRequest};
use notedupe::dedupe::{select_keeper, RetentionPolicy};
use notedupe::host::{DocEntry, Locator, MemoryHost};
use notedupe::scan::{duplicate_documents, DocScanOptions};

fn doc(id: &str, title: &str, path: &str, updated: u64) -> DocEntry {
    DocEntry {
        id: id.to_string(),
        title: title.to_string(),
        locator: Locator::new("box-1", path),
        readable_path: format!("/{title}"),
        updated,
        size_bytes: 10,
    }
}

#[tokio::test]
async fn test_newest_duplicate_becomes_merge_target() {
    let host = MemoryHost::new();
    host.add_document(
        doc("old", "Meeting Notes", "/old.sy", 20_240_101_120_000),
        "early notes",
    );
    host.add_document(
        doc("new", "Meeting Notes", "/new.sy", 20_240_201_120_000),
        "later notes",
    );

    let (groups, _) = duplicate_documents(&host, &DocScanOptions::default())
        .await
        .unwrap();
    assert_eq!(groups.len(), 1);

    let keeper = select_keeper(&groups[0].items, RetentionPolicy::Newest).unwrap();
    let target = &groups[0].items[keeper];
    assert_eq!(target.id, "new");

    let sources: Vec<String> = groups[0]
        .items
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != keeper)
        .map(|(_, item)| item.id.clone())
        .collect();
    let request = MergeRequest::new(&target.id, &sources).unwrap();
    let outcome = merge_documents(&host, &request).await;

    assert!(outcome.all_succeeded());
    assert!(!host.contains_document("old"));
    let merged = host.document_content("new").unwrap();
    assert!(merged.contains("later notes"));
    assert!(merged.contains("early notes"));
}

#[tokio::test]
async fn test_merge_runs_stages_in_order_per_source() {
    let host = MemoryHost::new();
    host.add_document(doc("tgt", "Notes", "/tgt.sy", 300), "t");
    host.add_document(doc("s1", "Notes", "/s1.sy", 100), "a");
    host.add_document(doc("s2", "Notes", "/s2.sy", 200), "b");

    let request = MergeRequest::new("tgt", &["s1".to_string(), "s2".to_string()]).unwrap();
    let outcome = merge_documents(&host, &request).await;

    assert_eq!(outcome.merged, vec!["s1", "s2"]);
    assert_eq!(
        host.calls(),
        vec![
            "transfer_references s1 -> tgt",
            "export_text_content s1",
            "append_text_content tgt",
            "lookup_document s1",
            "delete_item box-1:/s1.sy",
            "transfer_references s2 -> tgt",
            "export_text_content s2",
            "append_text_content tgt",
            "lookup_document s2",
            "delete_item box-1:/s2.sy",
            "notify Info",
        ]
    );
}

#[tokio::test]
async fn test_failed_source_survives_and_rest_proceed() {
    let host = MemoryHost::new();
    host.add_document(doc("tgt", "Notes", "/tgt.sy", 300), "t");
    host.add_document(doc("s1", "Notes", "/s1.sy", 100), "a");
    host.add_document(doc("s2", "Notes", "/s2.sy", 200), "b");
    host.fail_transfer("s1");

    let request = MergeRequest::new("tgt", &["s1".to_string(), "s2".to_string()]).unwrap();
    let outcome = merge_documents(&host, &request).await;

    assert_eq!(outcome.merged, vec!["s2"]);
    assert_eq!(outcome.failure_count(), 1);
    // The failed source is untouched, the other one is gone.
    assert!(host.contains_document("s1"));
    assert!(!host.contains_document("s2"));

    let notifications = host.pushed_notifications();
    assert_eq!(notifications.len(), 1);
    assert!(notifications[0].0.contains("1 failed"));
}

#[tokio::test]
async fn test_append_failure_leaves_source_alive() {
    let host = MemoryHost::new();
    host.add_document(doc("tgt", "Notes", "/tgt.sy", 300), "t");
    host.add_document(doc("src", "Notes", "/src.sy", 100), "body");
    host.fail_append("tgt");

    let request = MergeRequest::new("tgt", &["src".to_string()]).unwrap();
    let outcome = merge_documents(&host, &request).await;

    assert_eq!(outcome.merged_count(), 0);
    assert!(host.contains_document("src"));
    assert!(!host.calls().iter().any(|c| c.starts_with("delete_item")));
}

#[tokio::test]
async fn test_request_normalization_drops_target_and_blanks() {
    let request = MergeRequest::new(
        "tgt",
        &[
            " src ".to_string(),
            "tgt".to_string(),
            String::new(),
            "src".to_string(),
        ],
    )
    .unwrap();

    assert_eq!(request.source_ids(), ["src"]);
    assert!(!request.is_noop());

    let empty = MergeRequest::new("tgt", &["tgt".to_string()]).unwrap();
    assert!(empty.is_noop());
}

#[tokio::test]
async fn test_noop_merge_makes_no_host_calls() {
    let host = MemoryHost::new();
    let request = MergeRequest::new("tgt", &[]).unwrap();

    let outcome = merge_documents(&host, &request).await;

    assert!(outcome.all_succeeded());
    assert_eq!(outcome.merged_count(), 0);
    assert!(host.calls().is_empty());
}
