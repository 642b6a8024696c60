use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::{BatchArgs, OcrMode, default_db_path};
use crate::commands::extract::{conversion_options, extract_one, extraction_id_for};
use crate::commands::inventory;
use crate::convert::collect_tool_versions;
use crate::facts::FactPipeline;
use crate::model::{BatchCounts, BatchFailure, BatchPaths, BatchRunManifest};
use crate::store::{ExtractionRecord, open_store, record_extraction};
use crate::util::{ensure_directory, now_utc_string, utc_compact_string, write_json_pretty};

pub fn run(args: BatchArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| args.cache_root.join("runs").join(&run_id));
    let responses_dir = output_dir.join("responses");
    ensure_directory(&responses_dir)?;

    let inventory_manifest_path = output_dir.join("document_inventory.json");
    let run_manifest_path = output_dir.join("batch_run.json");
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&args.cache_root));

    info!(
        source = %args.source_dir.display(),
        output = %output_dir.display(),
        run_id = %run_id,
        "starting batch extraction"
    );

    let inventory = inventory::build_manifest(&args.source_dir)?;
    write_json_pretty(&inventory_manifest_path, &inventory)?;

    let connection = if args.no_record {
        None
    } else {
        Some(open_store(&db_path)?)
    };

    let pipeline = FactPipeline::new()?;
    let options = conversion_options(&args.conversion);

    let mut counts = BatchCounts {
        document_count: inventory.document_count,
        ..BatchCounts::default()
    };
    let mut failures = Vec::new();
    let mut warnings = Vec::new();
    let mut response_names = HashSet::new();

    for document in &inventory.documents {
        let path = args.source_dir.join(&document.filename);

        let extracted = match extract_one(&path, None, &options, &pipeline) {
            Ok(extracted) => extracted,
            Err(error) => {
                warn!(
                    path = %path.display(),
                    kind = error.kind(),
                    error = %error,
                    "document extraction failed"
                );
                if error.is_unsupported() {
                    counts.unsupported_count += 1;
                } else {
                    counts.failed_count += 1;
                }
                failures.push(BatchFailure {
                    filename: document.filename.clone(),
                    kind: error.kind().to_string(),
                    reason: error.to_string(),
                });
                continue;
            }
        };

        warnings.extend(
            extracted
                .converted
                .warnings
                .iter()
                .map(|warning| format!("{}: {warning}", document.filename)),
        );

        let response_name = unique_response_name(&document.filename, &mut response_names);
        let response_path = responses_dir.join(response_name);
        write_json_pretty(&response_path, &extracted.response)?;

        counts.extracted_count += 1;
        counts.fields_total += extracted.response.fields.len();
        counts.meeting_rooms_total += extracted.response.facts.meeting_rooms.len();

        if let Some(connection) = &connection {
            let extraction_id = extraction_id_for(&document.sha256);
            let source_path = path.display().to_string();
            record_extraction(
                connection,
                &ExtractionRecord {
                    extraction_id: &extraction_id,
                    source_path: &source_path,
                    sha256: &document.sha256,
                    format: extracted.format.as_str(),
                    response: &extracted.response,
                },
            )?;
            counts.recorded_count += 1;
        }

        info!(
            filename = %document.filename,
            fields = extracted.response.fields.len(),
            meeting_rooms = extracted.response.facts.meeting_rooms.len(),
            "document extracted"
        );
    }

    let status = if failures.is_empty() {
        "completed"
    } else {
        "completed_with_failures"
    };

    let manifest = BatchRunManifest {
        manifest_version: 1,
        run_id: run_id.clone(),
        status: status.to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_batch_command(&args),
        tool_versions: collect_tool_versions(),
        paths: BatchPaths {
            source_directory: args.source_dir.display().to_string(),
            output_directory: output_dir.display().to_string(),
            inventory_manifest_path: inventory_manifest_path.display().to_string(),
            db_path: connection.as_ref().map(|_| db_path.display().to_string()),
        },
        counts,
        failures,
        warnings,
    };

    write_json_pretty(&run_manifest_path, &manifest)?;
    info!(path = %run_manifest_path.display(), "wrote batch run manifest");
    info!(
        run_id = %run_id,
        status = status,
        documents = manifest.counts.document_count,
        extracted = manifest.counts.extracted_count,
        unsupported = manifest.counts.unsupported_count,
        failed = manifest.counts.failed_count,
        recorded = manifest.counts.recorded_count,
        "batch extraction completed"
    );

    Ok(())
}

fn response_file_name(filename: &str) -> String {
    filename
        .chars()
        .map(|character| {
            if character.is_ascii_alphanumeric() {
                character
            } else {
                '_'
            }
        })
        .collect()
}

fn unique_response_name(filename: &str, taken: &mut HashSet<String>) -> String {
    let stem = response_file_name(filename);
    let mut candidate = stem.clone();
    let mut suffix = 2;
    while !taken.insert(candidate.clone()) {
        candidate = format!("{stem}_{suffix}");
        suffix += 1;
    }
    format!("{candidate}.json")
}

fn render_batch_command(args: &BatchArgs) -> String {
    let mut command = vec![
        "fedevent".to_string(),
        "batch".to_string(),
        "--source-dir".to_string(),
        args.source_dir.display().to_string(),
        "--cache-root".to_string(),
        args.cache_root.display().to_string(),
    ];

    push_path_flag(&mut command, "--output-dir", args.output_dir.as_deref());
    push_path_flag(&mut command, "--db-path", args.db_path.as_deref());
    if args.no_record {
        command.push("--no-record".to_string());
    }
    if let Some(max_pages) = args.conversion.max_pages {
        command.push("--max-pages".to_string());
        command.push(max_pages.to_string());
    }
    command.push("--ocr-mode".to_string());
    command.push(args.conversion.ocr_mode.as_str().to_string());
    if args.conversion.ocr_mode != OcrMode::Off {
        command.push("--ocr-lang".to_string());
        command.push(args.conversion.ocr_lang.clone());
        command.push("--ocr-min-text-chars".to_string());
        command.push(args.conversion.ocr_min_text_chars.to_string());
    }

    command.join(" ")
}

fn push_path_flag(command: &mut Vec<String>, flag: &str, path: Option<&Path>) {
    if let Some(path) = path {
        command.push(flag.to_string());
        command.push(path.display().to_string());
    }
}
