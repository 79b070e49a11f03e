use usability_report::fonts;
use usability_report::model::ReportDocument;
use usability_report::{PdfRenderer, ReportCompiler, ReportConfig, ReportInput};
use sha2::{Digest, Sha256};

const SKIP_HINT: &str =
    "bundled fonts missing. Set USABILITY_REPORT_FONTS_DIR or copy assets/fonts next to the binary.";

fn compile_demo(json: &str) -> ReportDocument {
    let input = ReportInput::from_json(json).expect("demo input parses");
    ReportCompiler::offline(ReportConfig::default())
        .compile_input(input)
        .expect("demo input compiles")
}

fn standard_document() -> ReportDocument {
    compile_demo(include_str!("../demos/standard_survey.json"))
}

fn heuristic_document() -> ReportDocument {
    compile_demo(include_str!("../demos/heuristic_survey.json"))
}

fn render_sample_pdf() -> Option<Vec<u8>> {
    if !fonts::default_fonts_available() {
        return None;
    }

    let bytes = PdfRenderer::new()
        .render(&standard_document())
        .expect("render sample pdf")
        .bytes;

    Some(bytes)
}

fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    fn scrub_segment(data: &mut [u8], tag: &[u8], terminator: u8) {
        let mut index = 0;
        while index + tag.len() < data.len() {
            if data[index..].starts_with(tag) {
                let mut cursor = index + tag.len();
                while cursor < data.len() {
                    let byte = data[cursor];
                    if byte == terminator {
                        break;
                    }
                    if terminator == b')' {
                        data[cursor] = b'0';
                    } else if !matches!(byte, b'<' | b'>' | b' ' | b'\n' | b'\r' | b'\t') {
                        data[cursor] = b'0';
                    }
                    cursor += 1;
                }
                index = cursor;
            } else {
                index += 1;
            }
        }
    }

    fn scrub_xml(data: &mut [u8], start: &[u8], end: &[u8]) {
        let mut offset = 0;
        while offset + start.len() < data.len() {
            if let Some(start_pos) = data[offset..]
                .windows(start.len())
                .position(|window| window == start)
            {
                let start_index = offset + start_pos + start.len();
                if let Some(end_pos) = data[start_index..]
                    .windows(end.len())
                    .position(|window| window == end)
                {
                    for byte in &mut data[start_index..start_index + end_pos] {
                        if !matches!(*byte, b'<' | b'>' | b'/' | b' ' | b'\n' | b'\r' | b'\t') {
                            *byte = b'0';
                        }
                    }
                    offset = start_index + end_pos + end.len();
                } else {
                    break;
                }
            } else {
                break;
            }
        }
    }

    let mut normalized = bytes.to_vec();
    scrub_segment(&mut normalized, b"/CreationDate(", b')');
    scrub_segment(&mut normalized, b"/ModDate(", b')');
    scrub_segment(&mut normalized, b"/ID[", b']');
    scrub_segment(&mut normalized, b"/Producer(", b')');
    scrub_xml(&mut normalized, b"<xmp:CreateDate>", b"</xmp:CreateDate>");
    scrub_xml(&mut normalized, b"<xmp:ModifyDate>", b"</xmp:ModifyDate>");
    scrub_xml(
        &mut normalized,
        b"<xmp:MetadataDate>",
        b"</xmp:MetadataDate>",
    );
    scrub_xml(
        &mut normalized,
        b"<xmpMM:DocumentID>",
        b"</xmpMM:DocumentID>",
    );
    scrub_xml(
        &mut normalized,
        b"<xmpMM:InstanceID>",
        b"</xmpMM:InstanceID>",
    );
    scrub_xml(&mut normalized, b"<xmpMM:VersionID>", b"</xmpMM:VersionID>");
    normalized
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    let normalized = scrub_pdf(bytes);
    let digest = Sha256::digest(&normalized);
    digest.into()
}

#[test]
fn renders_non_empty_output() {
    let Some(bytes) = render_sample_pdf() else {
        eprintln!("Skipping renders_non_empty_output: {}", SKIP_HINT);
        return;
    };
    assert!(bytes.starts_with(b"%PDF"), "rendered PDF should start with a header");
}

#[test]
fn rendering_is_deterministic() {
    let (Some(bytes_a), Some(bytes_b)) = (render_sample_pdf(), render_sample_pdf()) else {
        eprintln!("Skipping rendering_is_deterministic: {}", SKIP_HINT);
        return;
    };

    assert_eq!(bytes_a.len(), bytes_b.len(), "PDF sizes should match");

    let hash_a = normalized_hash(&bytes_a);
    let hash_b = normalized_hash(&bytes_b);

    assert_eq!(
        hash_a, hash_b,
        "PDF renders must be deterministic after metadata normalization"
    );
}

#[test]
fn every_logical_page_starts_on_its_own_physical_page() {
    if !fonts::default_fonts_available() {
        eprintln!("Skipping every_logical_page_starts_on_its_own_physical_page: {}", SKIP_HINT);
        return;
    }

    let document = heuristic_document();
    let rendered = PdfRenderer::new().render(&document).expect("render heuristic report");
    assert_eq!(rendered.page_starts.len(), document.page_count());
    assert_eq!(rendered.page_starts[0], Some(1));

    let starts: Vec<usize> = rendered.page_starts.iter().flatten().copied().collect();
    assert_eq!(starts.len(), document.page_count());
    assert!(starts.windows(2).all(|pair| pair[0] < pair[1]));

    let outline = rendered.outline(&document);
    assert_eq!(outline[0], ("Portada".to_string(), 1));
    assert!(outline
        .iter()
        .any(|(title, _)| title == "Usabilidad: Carrito"));
}
