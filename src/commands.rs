//! Command handlers for the CLI.
//!
//! Each handler turns parsed arguments plus configuration into engine calls,
//! renders the result, and maps the outcome to an exit code. Handlers take
//! the host as a trait object, so tests drive them against the in-memory
//! host without a running server.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use crate::actions::{
    clean_duplicate_groups, delete_all, delete_documents_by_id, merge_documents, DeleteOutcome,
    MergeRequest,
};
use crate::cli::{
    CleanArgs, DeleteEmptyArgs, DocsArgs, EmptyArgs, FileScanArgs, FilesArgs, InitArgs, MergeArgs,
};
use crate::config::Config;
use crate::dedupe::{select_keeper, DuplicateGroup, ItemFilter, RetentionPolicy};
use crate::error::ExitCode;
use crate::host::{Host, Severity};
use crate::output::json::{CleanupReport, ItemsReport, ScanReport};
use crate::output::text;
use crate::scan::{self, DocScanOptions, FileScanOptions};

/// Write a starter configuration file.
pub fn run_init(args: &InitArgs) -> Result<ExitCode> {
    let path = match &args.path {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };
    Config::write_starter(&path, args.force)?;
    println!("Wrote starter configuration to {}", path.display());
    Ok(ExitCode::Success)
}

/// Scan for documents sharing a title.
pub async fn run_docs(
    host: &dyn Host,
    config: &Config,
    args: &DocsArgs,
    quiet: bool,
) -> Result<ExitCode> {
    let exclude_placeholder = if args.include_placeholder {
        false
    } else {
        // Naming a placeholder on the command line implies excluding it.
        args.placeholder.is_some() || config.scan.exclude_placeholder
    };
    let options = DocScanOptions {
        exclude_placeholder,
        placeholder_title: args
            .placeholder
            .clone()
            .unwrap_or_else(|| config.scan.placeholder_title.clone()),
    };

    let bar = spinner("Scanning for duplicate titles", quiet);
    let result = scan::duplicate_documents(host, &options).await;
    bar.finish_and_clear();
    let (groups, stats) = result?;

    let exit_code = if groups.is_empty() {
        ExitCode::NothingFound
    } else {
        ExitCode::Success
    };
    if args.json {
        println!(
            "{}",
            ScanReport::new(&groups, &stats, exit_code).to_json_pretty()?
        );
    } else {
        print!("{}", text::render_groups(&groups));
        print!("{}", text::render_scan_summary(&stats, &groups));
    }
    Ok(exit_code)
}

/// Merge duplicate documents into one target.
pub async fn run_merge(
    host: &dyn Host,
    config: &Config,
    args: &MergeArgs,
    quiet: bool,
) -> Result<ExitCode> {
    let request = MergeRequest::new(&args.target, &args.sources)?;
    if request.is_noop() {
        println!("Nothing to merge.");
        return Ok(ExitCode::NothingFound);
    }

    let prompt = format!(
        "Merge {} document(s) into {} and delete them?",
        request.source_ids().len(),
        request.target_id()
    );
    if !should_proceed(&prompt, args.yes, config)? {
        println!("Cancelled.");
        return Ok(ExitCode::Success);
    }

    let bar = spinner("Merging documents", quiet);
    let outcome = merge_documents(host, &request).await;
    bar.finish_and_clear();

    print!("{}", text::render_merge(&outcome));
    Ok(if outcome.all_succeeded() {
        ExitCode::Success
    } else if outcome.merged_count() > 0 {
        ExitCode::PartialSuccess
    } else {
        ExitCode::GeneralError
    })
}

/// List empty documents.
pub async fn run_empty(
    host: &dyn Host,
    config: &Config,
    args: &EmptyArgs,
    quiet: bool,
) -> Result<ExitCode> {
    let hide_referenced = !args.show_referenced && config.scan.hide_referenced;

    let bar = spinner("Scanning for empty documents", quiet);
    let result = scan::empty_documents(host, hide_referenced).await;
    bar.finish_and_clear();
    let items = result?;

    let exit_code = if items.is_empty() {
        ExitCode::NothingFound
    } else {
        ExitCode::Success
    };
    if args.json {
        println!("{}", ItemsReport::new(&items, exit_code).to_json_pretty()?);
    } else if items.is_empty() {
        println!("No empty documents found.");
    } else {
        print!("{}", text::render_items(&items));
        println!("Found {} empty document(s)", items.len());
    }
    Ok(exit_code)
}

/// Delete empty documents, either a given selection or all of them.
pub async fn run_delete_empty(
    host: &dyn Host,
    config: &Config,
    args: &DeleteEmptyArgs,
    quiet: bool,
) -> Result<ExitCode> {
    if args.all {
        let bar = spinner("Scanning for empty documents", quiet);
        let result = scan::empty_documents(host, config.scan.hide_referenced).await;
        bar.finish_and_clear();
        let items = result?;
        if items.is_empty() {
            println!("No empty documents found.");
            return Ok(ExitCode::NothingFound);
        }

        if args.dry_run {
            let planned = DeleteOutcome {
                deleted: items.iter().map(|i| i.id.clone()).collect(),
                failures: Vec::new(),
                freed_bytes: items.iter().map(|i| i.size_bytes).sum(),
            };
            print!("{}", text::render_cleanup(&planned, true));
            return Ok(ExitCode::Success);
        }

        let prompt = format!("Delete {} empty document(s)?", items.len());
        if !should_proceed(&prompt, args.yes, config)? {
            println!("Cancelled.");
            return Ok(ExitCode::Success);
        }

        let bar = spinner("Deleting empty documents", quiet);
        let outcome = delete_all(host, &items).await;
        bar.finish_and_clear();
        notify_cleanup(host, &outcome).await;

        print!("{}", text::render_cleanup(&outcome, false));
        return Ok(cleanup_exit(&outcome));
    }

    if args.dry_run {
        let mut planned_ids: Vec<String> = Vec::new();
        for raw in &args.ids {
            let id = raw.trim();
            if !id.is_empty() && !planned_ids.iter().any(|p| p == id) {
                planned_ids.push(id.to_string());
            }
        }
        let planned = DeleteOutcome {
            deleted: planned_ids,
            failures: Vec::new(),
            freed_bytes: 0,
        };
        print!("{}", text::render_cleanup(&planned, true));
        return Ok(ExitCode::Success);
    }

    let prompt = format!("Delete {} document(s)?", args.ids.len());
    if !should_proceed(&prompt, args.yes, config)? {
        println!("Cancelled.");
        return Ok(ExitCode::Success);
    }

    let bar = spinner("Deleting documents", quiet);
    let result = delete_documents_by_id(host, &args.ids).await;
    bar.finish_and_clear();
    let outcome = result?;
    notify_cleanup(host, &outcome).await;

    print!("{}", text::render_cleanup(&outcome, false));
    Ok(cleanup_exit(&outcome))
}

/// Scan a folder for duplicate files.
pub async fn run_files(
    host: &dyn Host,
    config: &Config,
    args: &FilesArgs,
    quiet: bool,
) -> Result<ExitCode> {
    let options = scan_options_from(&args.scan, config);

    let bar = spinner(
        &format!("Scanning {}:{}", options.notebook, options.path),
        quiet,
    );
    let result = scan::scan_duplicate_files(host, &options).await;
    bar.finish_and_clear();
    let (groups, stats) = result?;

    let exit_code = if groups.is_empty() {
        ExitCode::NothingFound
    } else {
        ExitCode::Success
    };
    if args.json {
        println!(
            "{}",
            ScanReport::new(&groups, &stats, exit_code).to_json_pretty()?
        );
    } else {
        print!("{}", text::render_groups(&groups));
        print!("{}", text::render_scan_summary(&stats, &groups));
    }
    Ok(exit_code)
}

/// Scan a folder and delete every duplicate except one keeper per group.
pub async fn run_clean(
    host: &dyn Host,
    config: &Config,
    args: &CleanArgs,
    quiet: bool,
) -> Result<ExitCode> {
    let options = scan_options_from(&args.scan, config);
    let policy = args.keep.unwrap_or(config.cleanup.keep);

    let bar = spinner(
        &format!("Scanning {}:{}", options.notebook, options.path),
        quiet,
    );
    let result = scan::scan_duplicate_files(host, &options).await;
    bar.finish_and_clear();
    let (groups, stats) = result?;

    if groups.is_empty() {
        if args.json {
            println!(
                "{}",
                ScanReport::new(&groups, &stats, ExitCode::NothingFound).to_json_pretty()?
            );
        } else {
            println!("No duplicates found.");
        }
        return Ok(ExitCode::NothingFound);
    }

    if args.dry_run {
        let planned = planned_cleanup(&groups, policy);
        if args.json {
            println!(
                "{}",
                CleanupReport::new(&planned, true, ExitCode::Success).to_json_pretty()?
            );
        } else {
            print!("{}", text::render_groups(&groups));
            print!("{}", text::render_cleanup(&planned, true));
        }
        return Ok(ExitCode::Success);
    }

    let removable: usize = groups.iter().map(DuplicateGroup::duplicate_count).sum();
    let prompt = format!(
        "Delete {removable} duplicate(s), keeping the {policy} item of each group?"
    );
    if !should_proceed(&prompt, args.yes, config)? {
        println!("Cancelled.");
        return Ok(ExitCode::Success);
    }

    let bar = spinner("Deleting duplicates", quiet);
    let outcome = clean_duplicate_groups(host, &groups, policy).await;
    bar.finish_and_clear();
    notify_cleanup(host, &outcome).await;

    let exit_code = cleanup_exit(&outcome);
    if args.json {
        println!(
            "{}",
            CleanupReport::new(&outcome, false, exit_code).to_json_pretty()?
        );
    } else {
        print!("{}", text::render_cleanup(&outcome, false));
    }
    Ok(exit_code)
}

/// Merge CLI flags with the configured scan settings.
fn scan_options_from(args: &FileScanArgs, config: &Config) -> FileScanOptions {
    let ignored = if args.ignore_ext.is_empty() {
        config.scan.ignore_extensions.clone()
    } else {
        args.ignore_ext.clone()
    };
    FileScanOptions {
        notebook: args.notebook.clone(),
        path: args.path.clone(),
        recursive: config.scan.recursive && !args.no_recursive,
        mode: args.by,
        filter: ItemFilter::new(args.min_size.unwrap_or(config.scan.min_file_size), ignored),
    }
}

/// The deletions a cleanup run would perform, without performing them.
fn planned_cleanup(groups: &[DuplicateGroup], policy: RetentionPolicy) -> DeleteOutcome {
    let mut planned = DeleteOutcome::default();
    for group in groups {
        if group.len() < 2 {
            continue;
        }
        let Some(keeper) = select_keeper(&group.items, policy) else {
            continue;
        };
        for (index, item) in group.items.iter().enumerate() {
            if index == keeper {
                continue;
            }
            planned.deleted.push(item.id.clone());
            planned.freed_bytes += item.size_bytes;
        }
    }
    planned
}

fn cleanup_exit(outcome: &DeleteOutcome) -> ExitCode {
    if outcome.all_succeeded() {
        ExitCode::Success
    } else if outcome.deleted_count() > 0 {
        ExitCode::PartialSuccess
    } else {
        ExitCode::GeneralError
    }
}

/// Push the cleanup summary into the host UI. Failures only get logged;
/// the deletions already happened.
async fn notify_cleanup(host: &dyn Host, outcome: &DeleteOutcome) {
    let severity = if outcome.failure_count() > 0 {
        Severity::Error
    } else {
        Severity::Info
    };
    if let Err(err) = host.notify(&outcome.summary(), severity).await {
        log::debug!("Could not push notification: {err}");
    }
}

fn should_proceed(prompt: &str, assume_yes: bool, config: &Config) -> io::Result<bool> {
    if assume_yes || !config.cleanup.confirm_before_delete {
        return Ok(true);
    }
    confirm(prompt, &mut io::stdin().lock())
}

/// Ask a yes/no question, defaulting to no.
fn confirm(prompt: &str, input: &mut impl BufRead) -> io::Result<bool> {
    print!("{prompt} (y/N): ");
    io::stdout().flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().eq_ignore_ascii_case("y"))
}

fn spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}
