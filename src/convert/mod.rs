use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use crate::cli::OcrMode;
use crate::model::ToolVersions;

mod ocr_tools;
mod office_xml;
#[cfg(test)]
mod tests;

use ocr_tools::*;
use office_xml::*;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("unsupported document format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("required tool `{tool}` is not available")]
    ToolUnavailable { tool: &'static str },

    #[error("failed to convert {path}: {reason}")]
    ConversionFailed { path: String, reason: String },

    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConversionError {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedFormat { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat { .. } => "unsupported_format",
            Self::ToolUnavailable { .. } => "tool_unavailable",
            Self::ConversionFailed { .. } => "conversion_failed",
            Self::Io { .. } => "io",
        }
    }

    fn failed(path: &Path, reason: impl Into<String>) -> Self {
        Self::ConversionFailed {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }

    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DocumentFormat {
    Docx,
    Pptx,
    Pdf,
    Image,
    PlainText,
}

impl DocumentFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        let normalized = extension.trim().trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "docx" => Some(Self::Docx),
            "pptx" => Some(Self::Pptx),
            "pdf" => Some(Self::Pdf),
            "png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" | "gif" | "webp" => Some(Self::Image),
            "txt" | "text" | "md" => Some(Self::PlainText),
            _ => None,
        }
    }

    pub fn detect(path: &Path, declared_extension: Option<&str>) -> Result<Self, ConversionError> {
        let extension = declared_extension
            .map(ToOwned::to_owned)
            .or_else(|| {
                path.extension()
                    .and_then(|value| value.to_str())
                    .map(ToOwned::to_owned)
            })
            .unwrap_or_default();

        Self::from_extension(&extension)
            .ok_or(ConversionError::UnsupportedFormat { extension })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Pptx => "pptx",
            Self::Pdf => "pdf",
            Self::Image => "image",
            Self::PlainText => "text",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConversionOptions {
    pub ocr_mode: OcrMode,
    pub ocr_lang: String,
    pub ocr_min_text_chars: usize,
    pub max_pages: Option<usize>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            ocr_mode: OcrMode::Auto,
            ocr_lang: "eng".to_string(),
            ocr_min_text_chars: 40,
            max_pages: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConvertedDocument {
    pub text: String,
    pub page_count: usize,
    pub ocr_page_count: usize,
    pub warnings: Vec<String>,
}

pub fn extract_document_text(
    path: &Path,
    declared_extension: Option<&str>,
    options: &ConversionOptions,
) -> Result<(DocumentFormat, ConvertedDocument), ConversionError> {
    let format = DocumentFormat::detect(path, declared_extension)?;

    let converted = match format {
        DocumentFormat::Docx => single_page(extract_docx_text(path)?),
        DocumentFormat::Pptx => single_page(extract_pptx_text(path)?),
        DocumentFormat::Pdf => extract_pdf_text(path, options)?,
        DocumentFormat::Image => {
            require_tool("tesseract")?;
            let text = ocr_image(path, &options.ocr_lang)?;
            ConvertedDocument {
                text,
                page_count: 1,
                ocr_page_count: 1,
                warnings: Vec::new(),
            }
        }
        DocumentFormat::PlainText => {
            let raw = fs::read(path).map_err(|error| ConversionError::io(path, error))?;
            single_page(String::from_utf8_lossy(&raw).replace('\u{0000}', ""))
        }
    };

    for warning in &converted.warnings {
        warn!(path = %path.display(), warning = %warning, "conversion warning");
    }
    info!(
        path = %path.display(),
        format = format.as_str(),
        pages = converted.page_count,
        ocr_pages = converted.ocr_page_count,
        chars = converted.text.chars().count(),
        "converted document to text"
    );

    Ok((format, converted))
}

pub fn collect_tool_versions() -> ToolVersions {
    ToolVersions {
        pdftotext: command_version_optional("pdftotext", &["-v"]),
        pdftoppm: command_version_optional("pdftoppm", &["-v"]),
        tesseract: command_version_optional("tesseract", &["--version"]),
    }
}

fn single_page(text: String) -> ConvertedDocument {
    ConvertedDocument {
        text,
        page_count: 1,
        ..ConvertedDocument::default()
    }
}

fn extract_pdf_text(
    path: &Path,
    options: &ConversionOptions,
) -> Result<ConvertedDocument, ConversionError> {
    require_tool("pdftotext")?;
    let mut pages = extract_pages_with_pdftotext(path, options.max_pages)?;
    let mut converted = ConvertedDocument {
        page_count: pages.len(),
        ..ConvertedDocument::default()
    };

    let candidate_pages =
        collect_ocr_candidates(&pages, options.ocr_mode, options.ocr_min_text_chars);
    if candidate_pages.is_empty() {
        converted.text = pages.join("\n\n");
        return Ok(converted);
    }

    if !command_available("pdftoppm") || !command_available("tesseract") {
        if matches!(options.ocr_mode, OcrMode::Force) {
            let tool = if command_available("pdftoppm") {
                "tesseract"
            } else {
                "pdftoppm"
            };
            return Err(ConversionError::ToolUnavailable { tool });
        }

        converted.warnings.push(format!(
            "OCR mode '{}' requested for {} pages but pdftoppm/tesseract are unavailable",
            options.ocr_mode.as_str(),
            candidate_pages.len()
        ));
        converted.text = pages.join("\n\n");
        return Ok(converted);
    }

    for page_number in candidate_pages {
        let page_index = page_number.saturating_sub(1);
        match extract_page_with_ocr(path, page_number, &options.ocr_lang) {
            Ok(ocr_text) => {
                if non_whitespace_char_count(&ocr_text) == 0
                    && matches!(options.ocr_mode, OcrMode::Auto)
                {
                    converted.warnings.push(format!(
                        "OCR text was empty for page {page_number}; kept text layer"
                    ));
                    continue;
                }
                if pages.len() <= page_index {
                    pages.resize(page_index + 1, String::new());
                }
                pages[page_index] = ocr_text;
                converted.ocr_page_count += 1;
            }
            Err(error) => {
                if matches!(options.ocr_mode, OcrMode::Force) {
                    return Err(error);
                }
                converted
                    .warnings
                    .push(format!("OCR fallback failed for page {page_number}: {error}"));
            }
        }
    }

    converted.page_count = pages.len();
    converted.text = pages.join("\n\n");
    Ok(converted)
}
