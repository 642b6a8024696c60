use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use zip::ZipWriter;
use zip::write::FileOptions;

use super::ocr_tools::{collect_ocr_candidates, non_whitespace_char_count};
use super::office_xml::{
    OfficeDialect, docx_text_from_reader, office_xml_to_text, pptx_text_from_reader,
};
use super::*;

fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer
            .start_file(*name, FileOptions::default())
            .expect("zip entry starts");
        writer
            .write_all(contents.as_bytes())
            .expect("zip entry is written");
    }
    writer.finish().expect("zip archive finishes").into_inner()
}

fn slide(text: &str) -> String {
    format!(
        "<p:sld><p:cSld><p:spTree><p:sp><p:txBody><a:p><a:r><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"
    )
}

#[test]
fn word_table_row_stays_on_one_line() {
    let xml = r#"<w:document><w:body><w:p><w:r><w:t>Meeting Rooms</w:t></w:r></w:p><w:tbl><w:tr><w:tc><w:p><w:r><w:t>Salon A</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>27' x 51'</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t xml:space="preserve">1,377</w:t></w:r></w:p></w:tc></w:tr></w:tbl><w:p><w:r><w:t>Rates</w:t></w:r><w:r><w:tab/><w:t>2024</w:t></w:r></w:p></w:body></w:document>"#;

    let text = office_xml_to_text(xml, OfficeDialect::Word).expect("word xml parses");

    assert_eq!(
        text,
        "Meeting Rooms\nSalon A \t27' x 51' \t1,377 \t\nRates\t2024\n"
    );
}

#[test]
fn drawing_paragraphs_and_breaks_become_lines() {
    let xml = "<p:txBody><a:p><a:r><a:t>Grand Ballroom</a:t></a:r></a:p><a:p><a:r><a:t>3,456 sq. ft.</a:t></a:r><a:br/><a:r><a:t>Seats 300</a:t></a:r></a:p></p:txBody>";

    let text = office_xml_to_text(xml, OfficeDialect::Drawing).expect("drawing xml parses");

    assert_eq!(text, "Grand Ballroom\n3,456 sq. ft.\nSeats 300\n");
}

#[test]
fn text_runs_decode_xml_entities() {
    let xml = "<w:p><w:r><w:t>Caf&#233; &amp; Bar&#x2019;s &lt;Lobby&gt;</w:t></w:r></w:p>";

    let text = office_xml_to_text(xml, OfficeDialect::Word).expect("entities decode");

    assert_eq!(text, "Caf\u{e9} & Bar\u{2019}s <Lobby>\n");
}

#[test]
fn markup_inside_attributes_comments_and_cdata_is_not_text() {
    let xml = r#"<w:p><!-- <w:t>hidden</w:t> --><w:r><w:t foo="a>b">Salon</w:t><w:t xml:space="preserve"> </w:t><w:t><![CDATA[A & B]]></w:t></w:r></w:p>"#;

    let text = office_xml_to_text(xml, OfficeDialect::Word).expect("word xml parses");

    assert_eq!(text, "Salon A & B\n");
}

#[test]
fn mismatched_office_xml_is_rejected() {
    let error = office_xml_to_text("<w:p><w:t>Salon</w:p>", OfficeDialect::Word)
        .expect_err("end tag does not match");

    assert!(error.starts_with("malformed office XML"));
}

#[test]
fn docx_body_is_read_from_container() {
    let bytes = zip_bytes(&[
        ("[Content_Types].xml", "<Types/>"),
        (
            "word/document.xml",
            "<w:document><w:body><w:p><w:r><w:t>Total Rooms: 250</w:t></w:r></w:p></w:body></w:document>",
        ),
    ]);

    let text = docx_text_from_reader(Cursor::new(bytes)).expect("docx text extracts");

    assert_eq!(text, "Total Rooms: 250\n");
}

#[test]
fn docx_without_body_or_container_is_rejected() {
    let bytes = zip_bytes(&[("word/styles.xml", "<w:styles/>")]);
    let error = docx_text_from_reader(Cursor::new(bytes)).expect_err("body is required");
    assert!(error.contains("word/document.xml"));

    let error = docx_text_from_reader(Cursor::new(b"plain text".to_vec()))
        .expect_err("not a zip archive");
    assert!(error.starts_with("not a DOCX container"));
}

#[test]
fn pptx_slides_are_read_in_numeric_order() {
    let one = slide("One");
    let two = slide("Two");
    let ten = slide("Ten");
    let bytes = zip_bytes(&[
        ("ppt/slides/slide10.xml", ten.as_str()),
        ("ppt/slides/slide2.xml", two.as_str()),
        ("ppt/slides/_rels/slide1.xml.rels", "<Relationships/>"),
        ("ppt/slides/slide1.xml", one.as_str()),
    ]);

    let text = pptx_text_from_reader(Cursor::new(bytes)).expect("pptx text extracts");
    let lines = text
        .lines()
        .filter(|line| !line.is_empty())
        .collect::<Vec<&str>>();

    assert_eq!(lines, vec!["One", "Two", "Ten"]);
}

#[test]
fn pptx_without_slides_is_rejected() {
    let bytes = zip_bytes(&[("ppt/presentation.xml", "<p:presentation/>")]);

    let error = pptx_text_from_reader(Cursor::new(bytes)).expect_err("slides are required");

    assert_eq!(error, "PPTX container has no slides");
}

#[test]
fn format_detection_prefers_declared_extension() {
    assert_eq!(DocumentFormat::from_extension(".PDF"), Some(DocumentFormat::Pdf));
    assert_eq!(DocumentFormat::from_extension("JPEG"), Some(DocumentFormat::Image));
    assert_eq!(DocumentFormat::from_extension("xlsx"), None);

    let detected = DocumentFormat::detect(Path::new("upload"), Some("docx"))
        .expect("declared docx is supported");
    assert_eq!(detected, DocumentFormat::Docx);

    let detected =
        DocumentFormat::detect(Path::new("sheet.pptx"), None).expect("pptx is supported");
    assert_eq!(detected, DocumentFormat::Pptx);

    let detected = DocumentFormat::detect(Path::new("sheet.pptx"), Some("pdf"))
        .expect("declared pdf is supported");
    assert_eq!(detected, DocumentFormat::Pdf);
}

#[test]
fn unsupported_format_is_distinct_from_failed_conversion() {
    let error =
        DocumentFormat::detect(Path::new("README"), None).expect_err("no extension to detect");
    assert!(error.is_unsupported());
    assert_eq!(error.kind(), "unsupported_format");
    assert_eq!(error.to_string(), "unsupported document format: ");

    let error = ConversionError::ToolUnavailable { tool: "tesseract" };
    assert!(!error.is_unsupported());
    assert_eq!(error.kind(), "tool_unavailable");
    assert_eq!(error.to_string(), "required tool `tesseract` is not available");

    let error = ConversionError::failed(Path::new("deck.pptx"), "PPTX container has no slides");
    assert!(!error.is_unsupported());
    assert_eq!(error.kind(), "conversion_failed");
}

#[test]
fn ocr_candidates_follow_mode_and_threshold() {
    let pages = vec![
        "short".to_string(),
        "Meeting space totals twelve thousand square feet across ten rooms".to_string(),
        "   \n  ".to_string(),
    ];

    assert_eq!(collect_ocr_candidates(&pages, OcrMode::Off, 40), Vec::<usize>::new());
    assert_eq!(collect_ocr_candidates(&pages, OcrMode::Auto, 40), vec![1, 3]);
    assert_eq!(collect_ocr_candidates(&pages, OcrMode::Force, 40), vec![1, 2, 3]);
    assert_eq!(collect_ocr_candidates(&[], OcrMode::Auto, 40), vec![1]);
    assert_eq!(collect_ocr_candidates(&[], OcrMode::Force, 40), vec![1]);
    assert_eq!(collect_ocr_candidates(&[], OcrMode::Off, 40), Vec::<usize>::new());
}

#[test]
fn non_whitespace_count_ignores_all_whitespace() {
    assert_eq!(non_whitespace_char_count("a b\n\tc "), 3);
    assert_eq!(non_whitespace_char_count(""), 0);
}

#[test]
fn plain_text_document_converts_without_tools() {
    let path = std::env::temp_dir().join(format!(
        "fedevent_convert_{}_sheet",
        std::process::id()
    ));
    fs::write(&path, "Total Rooms: 250\u{0000}\n").expect("write fixture");

    let (format, converted) =
        extract_document_text(&path, Some("txt"), &ConversionOptions::default())
            .expect("plain text converts");

    assert_eq!(format, DocumentFormat::PlainText);
    assert_eq!(converted.text, "Total Rooms: 250\n");
    assert_eq!(converted.page_count, 1);
    assert_eq!(converted.ocr_page_count, 0);
    assert!(converted.warnings.is_empty());

    let _ = fs::remove_file(&path);
}

#[test]
fn missing_file_reports_io_error() {
    let error = extract_document_text(
        Path::new("/nonexistent/fedevent/sheet.txt"),
        None,
        &ConversionOptions::default(),
    )
    .expect_err("missing file fails");

    assert_eq!(error.kind(), "io");
}
