use notedupe::dedupe::{ComparisonMode, ItemFilter};
use notedupe::host::{ChildEntry, DocEntry, Locator, MemoryHost, RefEntry};
use notedupe::scan::{duplicate_documents, empty_documents, scan_duplicate_files, DocScanOptions, FileScanOptions};

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

fn child(name: &str, path: &str, child_count: u64, size_bytes: u64) -> ChildEntry {
    ChildEntry {
        name: name.to_string(),
        path: path.to_string(),
        child_count,
        updated: 0,
        size_bytes,
    }
}

fn reference(id: &str) -> RefEntry {
    RefEntry {
        id: id.to_string(),
        doc_id: "elsewhere".to_string(),
        excerpt: "((ref))".to_string(),
    }
}

fn scan_options(mode: ComparisonMode) -> FileScanOptions {
    FileScanOptions {
        notebook: "box-1".to_string(),
        path: "/".to_string(),
        recursive: true,
        mode,
        filter: ItemFilter::default(),
    }
}

#[tokio::test]
async fn test_docs_scan_groups_exact_titles() {
    let host = MemoryHost::new();
    host.add_document(doc("a", "Project Plan", "/a.sy"), "x");
    host.add_document(doc("b", "Project Plan", "/b.sy"), "y");
    host.add_document(doc("c", "Other", "/c.sy"), "z");
    host.add_reference("a", reference("ref-1"));

    let (groups, stats) = duplicate_documents(&host, &DocScanOptions::default())
        .await
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].key, "Project Plan");
    assert_eq!(groups[0].len(), 2);
    assert_eq!(groups[0].items[0].reference_count, Some(1));
    assert_eq!(groups[0].items[1].reference_count, Some(0));
    assert_eq!(stats.duplicate_items, 2);
}

#[tokio::test]
async fn test_docs_scan_skips_placeholder_titles() {
    let host = MemoryHost::new();
    host.add_document(doc("a", "Untitled", "/a.sy"), "");
    host.add_document(doc("b", "Untitled", "/b.sy"), "");
    host.add_document(doc("c", "Kept", "/c.sy"), "");
    host.add_document(doc("d", "Kept", "/d.sy"), "");

    let (groups, stats) = duplicate_documents(&host, &DocScanOptions::default())
        .await
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].key, "Kept");
    assert_eq!(stats.filtered_out, 2);

    // With exclusion off, the placeholder group is an ordinary group.
    let options = DocScanOptions {
        exclude_placeholder: false,
        ..DocScanOptions::default()
    };
    let (groups, _) = duplicate_documents(&host, &options).await.unwrap();
    assert_eq!(groups.len(), 2);
}

#[tokio::test]
async fn test_docs_scan_honors_custom_placeholder() {
    let host = MemoryHost::new();
    host.add_document(doc("a", "Draft", "/a.sy"), "");
    host.add_document(doc("b", "Draft", "/b.sy"), "");

    let options = DocScanOptions {
        exclude_placeholder: true,
        placeholder_title: "Draft".to_string(),
    };
    let (groups, _) = duplicate_documents(&host, &options).await.unwrap();
    assert!(groups.is_empty());

    // The default placeholder no longer matches, so the group survives.
    let (groups, _) = duplicate_documents(&host, &DocScanOptions::default())
        .await
        .unwrap();
    assert_eq!(groups.len(), 1);
}

#[tokio::test]
async fn test_files_scan_name_mode_ignores_content() {
    let host = MemoryHost::new();
    host.add_children(
        "box-1",
        "/",
        vec![
            child("Readme.md", "/Readme.md", 0, 5),
            child("readme.MD", "/sub/readme.MD", 0, 9),
            child("other.md", "/other.md", 0, 5),
        ],
    );

    let (groups, _) = scan_duplicate_files(&host, &scan_options(ComparisonMode::Name))
        .await
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].key, "readme.md");
    // No content was ever fetched.
    assert!(!host.calls().iter().any(|c| c.starts_with("fetch_raw")));
}

#[tokio::test]
async fn test_files_scan_content_and_hash_modes_agree() {
    let host = MemoryHost::new();
    host.add_children(
        "box-1",
        "/",
        vec![
            child("a.txt", "/a.txt", 0, 4),
            child("b.txt", "/b.txt", 0, 4),
            child("c.txt", "/c.txt", 0, 4),
        ],
    );
    host.add_raw_file("/a.txt", b"same");
    host.add_raw_file("/b.txt", b"same");
    host.add_raw_file("/c.txt", b"diff");

    let (by_content, _) = scan_duplicate_files(&host, &scan_options(ComparisonMode::Content))
        .await
        .unwrap();
    let (by_hash, _) = scan_duplicate_files(&host, &scan_options(ComparisonMode::Hash))
        .await
        .unwrap();

    assert_eq!(by_content.len(), 1);
    assert_eq!(by_hash.len(), 1);
    let content_members: Vec<&str> = by_content[0]
        .items
        .iter()
        .map(|i| i.display_name.as_str())
        .collect();
    let hash_members: Vec<&str> = by_hash[0]
        .items
        .iter()
        .map(|i| i.display_name.as_str())
        .collect();
    assert_eq!(content_members, hash_members);
    // The content key is the text itself, the hash key is 8 hex chars.
    assert_eq!(by_content[0].key, "same");
    assert_eq!(by_hash[0].key.len(), 8);
}

#[tokio::test]
async fn test_files_scan_filters_before_fetching() {
    let host = MemoryHost::new();
    host.add_children(
        "box-1",
        "/",
        vec![
            child("big.txt", "/big.txt", 0, 100),
            child("small.txt", "/small.txt", 0, 3),
            child("skip.png", "/skip.png", 0, 100),
        ],
    );
    host.add_raw_file("/big.txt", b"payload");

    let options = FileScanOptions {
        filter: ItemFilter::new(10, vec!["png".to_string()]),
        ..scan_options(ComparisonMode::Content)
    };
    let (groups, stats) = scan_duplicate_files(&host, &options).await.unwrap();

    assert!(groups.is_empty());
    assert_eq!(stats.filtered_out, 2);
    let fetched: Vec<String> = host
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("fetch_raw"))
        .collect();
    assert_eq!(fetched, vec!["fetch_raw /big.txt"]);
}

#[tokio::test]
async fn test_files_scan_recursion_toggle() {
    let host = MemoryHost::new();
    host.add_children(
        "box-1",
        "/",
        vec![
            child("top.txt", "/top.txt", 0, 4),
            child("folder.sy", "/folder.sy", 1, 0),
        ],
    );
    host.add_children(
        "box-1",
        "/folder.sy",
        vec![child("nested.txt", "/folder/nested.txt", 0, 4)],
    );
    host.add_raw_file("/top.txt", b"dup!");
    host.add_raw_file("/folder/nested.txt", b"dup!");

    let (recursive, _) = scan_duplicate_files(&host, &scan_options(ComparisonMode::Content))
        .await
        .unwrap();
    assert_eq!(recursive.len(), 1);
    assert_eq!(recursive[0].len(), 2);

    let flat_options = FileScanOptions {
        recursive: false,
        ..scan_options(ComparisonMode::Content)
    };
    let (flat, _) = scan_duplicate_files(&host, &flat_options).await.unwrap();
    assert!(flat.is_empty());
}

#[tokio::test]
async fn test_empty_docs_hide_referenced_toggle() {
    let host = MemoryHost::new();
    host.add_document(doc("orphan", "Orphan", "/orphan.sy"), "");
    host.add_document(doc("linked", "Linked", "/linked.sy"), " \n ");
    host.add_reference("linked", reference("ref-1"));

    let hidden = empty_documents(&host, true).await.unwrap();
    assert_eq!(hidden.len(), 1);
    assert_eq!(hidden[0].id, "orphan");

    let shown = empty_documents(&host, false).await.unwrap();
    assert_eq!(shown.len(), 2);
}
