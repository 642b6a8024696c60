use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use zip::ZipArchive;

use super::ConversionError;

const DOCX_BODY: &str = "word/document.xml";
const PPTX_SLIDE_PREFIX: &str = "ppt/slides/slide";

#[derive(Debug, Clone, Copy)]
pub(super) enum OfficeDialect {
    Word,
    Drawing,
}

impl OfficeDialect {
    fn prefix(self) -> &'static str {
        match self {
            Self::Word => "w",
            Self::Drawing => "a",
        }
    }
}

pub(super) fn extract_docx_text(path: &Path) -> Result<String, ConversionError> {
    let file = File::open(path).map_err(|error| ConversionError::io(path, error))?;
    docx_text_from_reader(file).map_err(|reason| ConversionError::failed(path, reason))
}

pub(super) fn extract_pptx_text(path: &Path) -> Result<String, ConversionError> {
    let file = File::open(path).map_err(|error| ConversionError::io(path, error))?;
    pptx_text_from_reader(file).map_err(|reason| ConversionError::failed(path, reason))
}

pub(super) fn docx_text_from_reader<R: Read + Seek>(reader: R) -> Result<String, String> {
    let mut archive =
        ZipArchive::new(reader).map_err(|error| format!("not a DOCX container: {error}"))?;
    let xml = read_archive_entry(&mut archive, DOCX_BODY)?;
    office_xml_to_text(&xml, OfficeDialect::Word)
}

pub(super) fn pptx_text_from_reader<R: Read + Seek>(reader: R) -> Result<String, String> {
    let mut archive =
        ZipArchive::new(reader).map_err(|error| format!("not a PPTX container: {error}"))?;

    let mut slides = archive
        .file_names()
        .filter_map(|name| slide_number(name).map(|number| (number, name.to_string())))
        .collect::<Vec<(u32, String)>>();
    if slides.is_empty() {
        return Err("PPTX container has no slides".to_string());
    }
    slides.sort();

    let mut texts = Vec::with_capacity(slides.len());
    for (_, name) in slides {
        let xml = read_archive_entry(&mut archive, &name)?;
        let text = office_xml_to_text(&xml, OfficeDialect::Drawing)?;
        if !text.trim().is_empty() {
            texts.push(text);
        }
    }

    Ok(texts.join("\n\n"))
}

fn read_archive_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<String, String> {
    let mut entry = archive
        .by_name(name)
        .map_err(|error| format!("missing {name}: {error}"))?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|error| format!("failed to read {name}: {error}"))?;
    Ok(xml)
}

fn slide_number(name: &str) -> Option<u32> {
    name.strip_prefix(PPTX_SLIDE_PREFIX)?
        .strip_suffix(".xml")?
        .parse::<u32>()
        .ok()
}

pub(super) fn office_xml_to_text(xml: &str, dialect: OfficeDialect) -> Result<String, String> {
    let prefix = dialect.prefix();
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut out = String::with_capacity(xml.len() / 4);
    let mut in_text_run = false;
    let mut cell_depth = 0usize;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|error| {
            format!(
                "malformed office XML at byte {}: {error}",
                reader.buffer_position()
            )
        })?;

        match event {
            Event::Start(element) => match local_name(element.name().as_ref(), prefix) {
                Some(b"t") => in_text_run = true,
                Some(b"tc") => cell_depth += 1,
                _ => {}
            },
            Event::Empty(element) => match local_name(element.name().as_ref(), prefix) {
                Some(b"tab") => out.push('\t'),
                Some(b"br" | b"cr" | b"p") => out.push(line_break(cell_depth)),
                _ => {}
            },
            Event::End(element) => match local_name(element.name().as_ref(), prefix) {
                Some(b"t") => in_text_run = false,
                Some(b"p") => out.push(line_break(cell_depth)),
                Some(b"tc") => {
                    cell_depth = cell_depth.saturating_sub(1);
                    out.push('\t');
                }
                Some(b"tr") => out.push('\n'),
                _ => {}
            },
            Event::Text(text) if in_text_run => {
                let text = text
                    .unescape()
                    .map_err(|error| format!("invalid text run: {error}"))?;
                out.push_str(&text);
            }
            Event::CData(data) if in_text_run => {
                out.push_str(&String::from_utf8_lossy(&data.into_inner()));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}

fn local_name<'a>(name: &'a [u8], prefix: &str) -> Option<&'a [u8]> {
    name.strip_prefix(prefix.as_bytes())?.strip_prefix(b":")
}

fn line_break(cell_depth: usize) -> char {
    if cell_depth > 0 { ' ' } else { '\n' }
}
