use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use crate::cli::{ConversionArgs, ExtractArgs, default_db_path};
use crate::convert::{
    ConversionError, ConversionOptions, ConvertedDocument, DocumentFormat, extract_document_text,
};
use crate::facts::FactPipeline;
use crate::model::AutofillResponse;
use crate::store::{ExtractionRecord, open_store, record_extraction};
use crate::util::{ensure_directory, sha256_file, write_json_pretty, write_json_stdout};

static EXTRACTION_SEQUENCE: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub format: DocumentFormat,
    pub converted: ConvertedDocument,
    pub normalized_text: String,
    pub response: AutofillResponse,
}

pub fn run(args: ExtractArgs) -> Result<()> {
    let pipeline = FactPipeline::new()?;
    let options = conversion_options(&args.conversion);

    let extracted = extract_one(&args.input, args.format.as_deref(), &options, &pipeline)
        .with_context(|| format!("failed to extract {}", args.input.display()))?;

    info!(
        path = %args.input.display(),
        format = extracted.format.as_str(),
        fields = extracted.response.fields.len(),
        meeting_rooms = extracted.response.facts.meeting_rooms.len(),
        "extraction completed"
    );

    if let Some(text_path) = &args.text_output {
        write_text(text_path, &extracted.normalized_text)?;
        info!(path = %text_path.display(), "wrote normalized text");
    }

    if args.record {
        let db_path = args
            .db_path
            .clone()
            .unwrap_or_else(|| default_db_path(&args.cache_root));
        let connection = open_store(&db_path)?;
        let sha256 = sha256_file(&args.input)?;
        let extraction_id = extraction_id_for(&sha256);
        let source_path = args.input.display().to_string();

        record_extraction(
            &connection,
            &ExtractionRecord {
                extraction_id: &extraction_id,
                source_path: &source_path,
                sha256: &sha256,
                format: extracted.format.as_str(),
                response: &extracted.response,
            },
        )?;
        info!(
            extraction_id = %extraction_id,
            db = %db_path.display(),
            "recorded extraction"
        );
    }

    match &args.output {
        Some(output_path) => {
            write_json_pretty(output_path, &extracted.response)?;
            info!(path = %output_path.display(), "wrote autofill response");
        }
        None => write_json_stdout(&extracted.response)?,
    }

    Ok(())
}

pub fn conversion_options(args: &ConversionArgs) -> ConversionOptions {
    ConversionOptions {
        ocr_mode: args.ocr_mode,
        ocr_lang: args.ocr_lang.clone(),
        ocr_min_text_chars: args.ocr_min_text_chars,
        max_pages: args.max_pages,
    }
}

pub fn extract_one(
    path: &Path,
    declared_extension: Option<&str>,
    options: &ConversionOptions,
    pipeline: &FactPipeline,
) -> Result<ExtractedDocument, ConversionError> {
    let (format, converted) = extract_document_text(path, declared_extension, options)?;
    let normalized_text = pipeline.normalize(&converted.text);
    let response = pipeline.run(&converted.text);

    Ok(ExtractedDocument {
        format,
        converted,
        normalized_text,
        response,
    })
}

pub fn extraction_id_for(sha256: &str) -> String {
    let prefix = sha256.get(..12).unwrap_or(sha256);
    let sequence = EXTRACTION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!(
        "ext-{}-{}-{}-{sequence}",
        Utc::now().format("%Y%m%dT%H%M%S%9fZ"),
        prefix,
        std::process::id()
    )
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        ensure_directory(parent)?;
    }

    let mut contents = text.to_string();
    contents.push('\n');
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OcrMode;

    fn plain_options() -> ConversionOptions {
        ConversionOptions {
            ocr_mode: OcrMode::Off,
            ocr_lang: "eng".to_string(),
            ocr_min_text_chars: 40,
            max_pages: None,
        }
    }

    #[test]
    fn extract_one_runs_text_file_through_pipeline() {
        let path = std::env::temp_dir().join(format!(
            "fedevent_extract_{}.txt",
            std::process::id()
        ));
        fs::write(
            &path,
            "Hotel Name: The Capitol Inn\r\nTotal Rooms: 250\r\n\r\n\r\nSalon A 27' x 51' 17 1,377 87 168 46 140\r\n",
        )
        .expect("write fixture");

        let pipeline = FactPipeline::new().expect("pipeline compiles");
        let extracted =
            extract_one(&path, None, &plain_options(), &pipeline).expect("text file extracts");

        assert_eq!(extracted.format, DocumentFormat::PlainText);
        assert!(!extracted.normalized_text.contains('\r'));
        assert!(!extracted.normalized_text.contains("\n\n\n"));
        assert_eq!(
            extracted.response.fields.get("hotel_name").map(String::as_str),
            Some("The Capitol Inn")
        );
        assert_eq!(
            extracted.response.fields.get("rooms_total").map(String::as_str),
            Some("250")
        );
        assert_eq!(extracted.response.facts.meeting_rooms.len(), 1);
        assert_eq!(extracted.response.facts.meeting_rooms[0].sqft, Some(1377));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn extract_one_reports_unsupported_declared_format() {
        let pipeline = FactPipeline::new().expect("pipeline compiles");
        let error = extract_one(
            Path::new("upload.bin"),
            Some("xlsx"),
            &plain_options(),
            &pipeline,
        )
        .expect_err("xlsx is not converted");

        assert!(error.is_unsupported());
    }

    #[test]
    fn extraction_ids_are_unique_for_the_same_file() {
        let first = extraction_id_for("0123456789abcdef0123");
        let second = extraction_id_for("0123456789abcdef0123");

        assert!(first.starts_with("ext-"));
        assert!(first.contains("-0123456789ab-"));
        assert_ne!(first, second);
    }
}
