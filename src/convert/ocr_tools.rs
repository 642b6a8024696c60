use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use chrono::Utc;

use super::ConversionError;
use crate::cli::OcrMode;
use crate::util::safe_file_stem;

pub(super) fn extract_pages_with_pdftotext(
    pdf_path: &Path,
    max_pages: Option<usize>,
) -> Result<Vec<String>, ConversionError> {
    let mut command = Command::new("pdftotext");
    command.arg("-layout").arg("-enc").arg("UTF-8").arg("-f").arg("1");
    if let Some(max_pages) = max_pages {
        command.arg("-l").arg(max_pages.to_string());
    }
    command.arg(pdf_path).arg("-");

    let output = run_tool("pdftotext", pdf_path, &mut command)?;

    let raw = String::from_utf8_lossy(&output.stdout);
    let mut pages: Vec<String> = raw
        .split('\u{000C}')
        .map(|chunk| chunk.replace('\u{0000}', ""))
        .collect();

    while let Some(last_page) = pages.last() {
        if last_page.trim().is_empty() {
            pages.pop();
            continue;
        }
        break;
    }

    Ok(pages)
}

pub(super) fn collect_ocr_candidates(
    pages: &[String],
    ocr_mode: OcrMode,
    min_text_chars: usize,
) -> Vec<usize> {
    match ocr_mode {
        OcrMode::Off => Vec::new(),
        OcrMode::Force => (1..=pages.len().max(1)).collect(),
        OcrMode::Auto => {
            if pages.is_empty() {
                return vec![1];
            }
            pages
                .iter()
                .enumerate()
                .filter_map(|(index, page)| {
                    if non_whitespace_char_count(page) < min_text_chars {
                        Some(index + 1)
                    } else {
                        None
                    }
                })
                .collect()
        }
    }
}

pub(super) fn non_whitespace_char_count(text: &str) -> usize {
    text.chars()
        .filter(|character| !character.is_whitespace())
        .count()
}

pub(super) fn extract_page_with_ocr(
    pdf_path: &Path,
    page_number: usize,
    ocr_lang: &str,
) -> Result<String, ConversionError> {
    let stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let output_root = std::env::temp_dir().join(format!(
        "fedevent_ocr_{}_{}_{}_{}",
        safe_file_stem(pdf_path),
        std::process::id(),
        page_number,
        stamp
    ));
    let png_path = PathBuf::from(format!("{}.png", output_root.display()));

    let mut pdftoppm = Command::new("pdftoppm");
    pdftoppm
        .arg("-f")
        .arg(page_number.to_string())
        .arg("-l")
        .arg(page_number.to_string())
        .arg("-r")
        .arg("300")
        .arg("-singlefile")
        .arg("-png")
        .arg(pdf_path)
        .arg(&output_root);
    run_tool("pdftoppm", pdf_path, &mut pdftoppm)?;

    if !png_path.exists() {
        return Err(ConversionError::failed(
            pdf_path,
            format!("pdftoppm did not produce an image for page {page_number}"),
        ));
    }

    let text = ocr_image(&png_path, ocr_lang);
    let _ = fs::remove_file(&png_path);
    text
}

pub(super) fn ocr_image(image_path: &Path, ocr_lang: &str) -> Result<String, ConversionError> {
    let mut tesseract = Command::new("tesseract");
    tesseract
        .arg(image_path)
        .arg("stdout")
        .arg("-l")
        .arg(ocr_lang)
        .arg("--psm")
        .arg("6");
    let output = run_tool("tesseract", image_path, &mut tesseract)?;

    Ok(String::from_utf8_lossy(&output.stdout)
        .replace('\u{0000}', "")
        .trim()
        .to_string())
}

pub(super) fn command_available(program: &str) -> bool {
    Command::new(program).arg("--version").output().is_ok()
}

pub(super) fn require_tool(program: &'static str) -> Result<(), ConversionError> {
    if command_available(program) {
        Ok(())
    } else {
        Err(ConversionError::ToolUnavailable { tool: program })
    }
}

pub(super) fn command_version_optional(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let source = if stdout.trim().is_empty() {
        stderr.trim()
    } else {
        stdout.trim()
    };

    source
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
}

fn run_tool(
    program: &'static str,
    input: &Path,
    command: &mut Command,
) -> Result<Output, ConversionError> {
    let output = command.output().map_err(|error| {
        if error.kind() == ErrorKind::NotFound {
            ConversionError::ToolUnavailable { tool: program }
        } else {
            ConversionError::io(input, error)
        }
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ConversionError::failed(
            input,
            format!("{program} returned non-zero exit status: {}", stderr.trim()),
        ));
    }

    Ok(output)
}
