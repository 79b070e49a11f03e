use std::cell::Cell;
use std::io::Cursor;
use std::rc::Rc;

use image::{DynamicImage, ImageOutputFormat, RgbImage};
use serde_json::{json, Value};
use usability_report::backend::{LookupError, QuestionCounter};
use usability_report::error::ReportError;
use usability_report::model::{Block, ReportDocument, Table};
use usability_report::screenshot::{CaptureError, ScreenshotService};
use usability_report::survey::InputError;
use usability_report::{ReportCompiler, ReportConfig, ReportInput};

struct FixedCount(usize);

impl QuestionCounter for FixedCount {
    fn question_count(&self, _test_id: u64) -> Result<usize, LookupError> {
        Ok(self.0)
    }
}

struct PngScreenshots;

impl ScreenshotService for PngScreenshots {
    fn capture(&self, _url: &str) -> Result<Vec<u8>, CaptureError> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(160, 90))
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .expect("encode screenshot");
        Ok(bytes)
    }
}

struct FailingScreenshots;

impl ScreenshotService for FailingScreenshots {
    fn capture(&self, _url: &str) -> Result<Vec<u8>, CaptureError> {
        Err(CaptureError::Status(502))
    }
}

fn compiler() -> ReportCompiler {
    ReportCompiler::offline(ReportConfig::default())
        .with_question_counter(FixedCount(3))
        .with_screenshot_service(PngScreenshots)
}

fn design_test(has_heuristics: bool) -> Value {
    json!({
        "test_id": 4,
        "user_name": "Ana Torres",
        "name": "Checkout",
        "description": "Flujo de pago",
        "url": "https://embed.figma.com/proto/abc/Checkout?node-id=1-2&embed-host=share",
        "test_type": "Web",
        "has_heuristics": has_heuristics,
        "created_at": "2024-03-05T10:00:00Z"
    })
}

fn question(id: u64, title: &str) -> Value {
    json!({
        "question_id": id,
        "title": title,
        "description": "",
        "url_frame": format!("https://embed.figma.com/proto/abc/Checkout?node-id={id}-1&embed-host=share")
    })
}

fn heuristic_response(id: u64, title: &str, values: &[f64], comment: Option<&str>) -> Value {
    let mut response = question(id, title);
    let subprinciples: Vec<Value> = values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            json!({
                "subprinciple_code": format!("H1.{}", i + 1),
                "subprinciple_subtitle": format!("Criterio {}", i + 1),
                "response_value": value
            })
        })
        .collect();
    response["heuristics"] = json!([{
        "heuristic_code": "H1",
        "heuristic_title": "Visibilidad del estado del sistema",
        "comment": comment,
        "subprinciples": subprinciples
    }]);
    response
}

fn standard_response(id: u64, title: &str, kind: &str, value: f64, comment: &str) -> Value {
    json!({
        "question": question(id, title),
        "response": { "response_type": kind, "response_value": value, "comment": comment }
    })
}

fn evaluator(name: &str, responses: Vec<Value>) -> Value {
    json!({
        "username": name,
        "email": format!("{name}@example.com"),
        "responses": responses
    })
}

fn input(has_heuristics: bool, evaluators: Vec<Value>) -> ReportInput {
    let json = json!({
        "design_test": design_test(has_heuristics),
        "evaluators": evaluators
    });
    ReportInput::from_json(&json.to_string()).expect("valid envelope")
}

fn page_titles(document: &ReportDocument) -> Vec<&str> {
    document
        .pages()
        .iter()
        .map(|page| page.title().unwrap_or_default())
        .collect()
}

fn page_tables<'a>(document: &'a ReportDocument, title: &str) -> Vec<&'a Table> {
    document
        .pages()
        .iter()
        .filter(|page| page.title() == Some(title))
        .flat_map(|page| page.tables())
        .collect()
}

fn all_cells(document: &ReportDocument) -> Vec<&str> {
    document
        .pages()
        .iter()
        .flat_map(|page| page.tables())
        .flat_map(|table| table.rows())
        .flat_map(|row| row.cells.iter().map(String::as_str))
        .collect()
}

#[test]
fn standard_survey_reports_global_usability() {
    let document = compiler()
        .compile_input(input(
            false,
            vec![evaluator(
                "eva",
                vec![standard_response(1, "Inicio", "calificacion", 8.0, "ok")],
            )],
        ))
        .expect("compiles");

    assert_eq!(
        page_titles(&document),
        [
            "Portada",
            "Evaluador: eva",
            "Gráficas de Evaluación - General",
            "Pregunta: Inicio",
        ]
    );
    assert!(document.issues().is_empty());

    let tables = page_tables(&document, "Gráficas de Evaluación - General");
    let usability = tables[0];
    assert_eq!(usability.cell(0, 0), Some("Calificacion"));
    assert_eq!(usability.cell(0, 3), Some("80.00%"));
    assert_eq!(usability.cell(1, 3), Some("0.00%"));
    assert_eq!(usability.cell(3, 0), Some("Falta de Usabilidad"));
    assert_eq!(usability.cell(3, 3), Some("20.00%"));

    let question_page = &document.pages()[3];
    assert_eq!(question_page.images().count(), 1);
    let comments = question_page.tables().nth(1).expect("comments table");
    assert_eq!(comments.cell(0, 0), Some("eva"));
    assert_eq!(comments.cell(0, 1), Some("ok"));
}

#[test]
fn heuristic_question_answered_twice_gets_one_usability_page() {
    let document = compiler()
        .compile_input(input(
            true,
            vec![
                evaluator(
                    "luis",
                    vec![heuristic_response(1, "Carrito", &[7.0, 9.0], Some("Claro"))],
                ),
                evaluator(
                    "marta",
                    vec![heuristic_response(1, "Carrito", &[5.0, 8.0], None)],
                ),
            ],
        ))
        .expect("compiles");

    assert_eq!(
        page_titles(&document),
        [
            "Portada",
            "Evaluador: luis",
            "Evaluador: marta",
            "Usabilidad: Carrito",
            "Comentarios: Carrito",
            "Captura: Carrito",
        ]
    );

    let usability = page_tables(&document, "Usabilidad: Carrito")[0];
    assert_eq!(usability.cell(0, 1), Some("29.00"));
    assert_eq!(usability.cell(0, 2), Some("40.00"));
    assert_eq!(usability.cell(0, 3), Some("100.00%"));
    assert_eq!(usability.cell(1, 3), Some("0.00%"));

    let comments = page_tables(&document, "Comentarios: Carrito")[1];
    assert_eq!(comments.cell(1, 0), Some("luis"));
    assert_eq!(comments.cell(1, 1), Some("Claro"));
    assert_eq!(comments.cell(2, 0), Some("marta"));
    assert_eq!(comments.cell(2, 1), Some("Sin comentario"));
}

#[test]
fn single_heuristic_scores_against_its_maximum() {
    let document = compiler()
        .compile_input(input(
            true,
            vec![evaluator(
                "luis",
                vec![heuristic_response(1, "Carrito", &[7.0, 9.0], None)],
            )],
        ))
        .expect("compiles");

    let usability = page_tables(&document, "Usabilidad: Carrito")[0];
    assert_eq!(usability.cell(0, 1), Some("16.00"));
    assert_eq!(usability.cell(0, 2), Some("20.00"));
    assert_eq!(usability.cell(0, 3), Some("100.00%"));
    assert_eq!(usability.cell(1, 3), Some("0.00%"));

    let evaluator_cells: Vec<&str> = page_tables(&document, "Evaluador: luis")
        .iter()
        .flat_map(|table| table.rows())
        .flat_map(|row| row.cells.iter().map(String::as_str))
        .collect();
    assert!(evaluator_cells.contains(&"Total de puntajes"));
    assert!(evaluator_cells.contains(&"16.00"));
}

#[test]
fn compiling_twice_yields_the_same_document() {
    let compiler = compiler();
    let evaluators = vec![
        evaluator(
            "eva",
            vec![
                standard_response(1, "Inicio", "calificacion", 8.0, "ok"),
                standard_response(2, "Pago", "legibilidad", 3.0, ""),
            ],
        ),
        evaluator(
            "jorge",
            vec![standard_response(1, "Inicio", "coherencia", 9.0, "bien")],
        ),
    ];

    let first = compiler
        .compile_input(input(false, evaluators.clone()))
        .expect("first run");
    let second = compiler
        .compile_input(input(false, evaluators))
        .expect("second run");
    assert_eq!(first, second);
}

#[test]
fn zero_scores_skip_the_usability_table() {
    let document = compiler()
        .compile_input(input(
            true,
            vec![evaluator(
                "luis",
                vec![heuristic_response(1, "Carrito", &[0.0, 0.0], None)],
            )],
        ))
        .expect("compiles");

    assert_eq!(document.issues().len(), 1);
    let issue = &document.issues()[0];
    assert_eq!(
        document.pages()[issue.page_index].title(),
        Some("Usabilidad: Carrito")
    );
    assert_eq!(page_tables(&document, "Usabilidad: Carrito").len(), 0);
    assert!(all_cells(&document).iter().all(|cell| !cell.contains("NaN")));
}

#[test]
fn zero_standard_scores_explain_the_missing_table() {
    let document = compiler()
        .compile_input(input(
            false,
            vec![evaluator(
                "eva",
                vec![standard_response(1, "Inicio", "calificacion", 0.0, "nada")],
            )],
        ))
        .expect("compiles");

    assert_eq!(document.issues().len(), 1);
    let global = document
        .pages()
        .iter()
        .find(|page| page.title() == Some("Gráficas de Evaluación - General"))
        .expect("global page");
    assert_eq!(global.tables().count(), 0);
    assert!(global.blocks().iter().any(|block| matches!(
        block,
        Block::Paragraph(paragraph)
            if paragraph.text() == "No hay puntajes registrados para calcular la usabilidad."
    )));

    let captions: Vec<String> = global
        .images()
        .filter_map(|image| image.caption())
        .map(|caption| caption.text())
        .collect();
    assert_eq!(captions.len(), 2, "pie and gauge are still drawn: {:?}", captions);
    assert!(captions[0].contains("Falta de Usabilidad: 10.00"));
    assert_eq!(captions[1], "Usabilidad: 0.00%");
}

#[test]
fn survey_without_responses_draws_no_global_charts() {
    let document = compiler()
        .compile_input(input(false, vec![evaluator("eva", vec![])]))
        .expect("compiles");

    assert_eq!(document.issues().len(), 1);
    let global = document
        .pages()
        .iter()
        .find(|page| page.title() == Some("Gráficas de Evaluación - General"))
        .expect("global page");
    assert_eq!(global.tables().count(), 0);
    assert_eq!(global.images().count(), 0);
}

#[test]
fn standard_question_answered_twice_gets_one_page() {
    let document = compiler()
        .compile_input(input(
            false,
            vec![
                evaluator(
                    "eva",
                    vec![standard_response(1, "Inicio", "calificacion", 8.0, "ok")],
                ),
                evaluator(
                    "jorge",
                    vec![standard_response(1, "Inicio", "coherencia", 9.0, "bien")],
                ),
            ],
        ))
        .expect("compiles");

    let titles = page_titles(&document);
    assert_eq!(
        titles.iter().filter(|title| **title == "Pregunta: Inicio").count(),
        1
    );

    let comments = page_tables(&document, "Pregunta: Inicio")[1];
    assert_eq!(comments.rows().len(), 2);
    assert_eq!(comments.cell(0, 0), Some("eva"));
    assert_eq!(comments.cell(1, 0), Some("jorge"));
    assert_eq!(comments.cell(1, 1), Some("bien"));
}

#[test]
fn same_question_id_with_another_frame_is_a_distinct_question() {
    let mut moved = standard_response(1, "Inicio", "coherencia", 9.0, "bien");
    moved["question"]["url_frame"] =
        json!("https://embed.figma.com/proto/abc/Checkout?node-id=9-9&embed-host=share");

    let document = compiler()
        .compile_input(input(
            false,
            vec![
                evaluator(
                    "eva",
                    vec![standard_response(1, "Inicio", "calificacion", 8.0, "ok")],
                ),
                evaluator("jorge", vec![moved]),
            ],
        ))
        .expect("compiles");

    let question_pages: Vec<_> = document
        .pages()
        .iter()
        .filter(|page| page.title() == Some("Pregunta: Inicio"))
        .collect();
    assert_eq!(question_pages.len(), 2);
    for page in question_pages {
        let comments = page.tables().nth(1).expect("comments table");
        assert_eq!(comments.rows().len(), 1);
    }
}

#[test]
fn failed_captures_keep_the_tables() {
    let document = ReportCompiler::offline(ReportConfig::default())
        .with_screenshot_service(FailingScreenshots)
        .compile_input(input(
            true,
            vec![evaluator(
                "luis",
                vec![heuristic_response(1, "Carrito", &[7.0, 9.0], None)],
            )],
        ))
        .expect("compiles");

    assert!(!page_titles(&document).contains(&"Captura: Carrito"));
    assert_eq!(page_tables(&document, "Comentarios: Carrito").len(), 2);

    let comment_page = document
        .pages()
        .iter()
        .find(|page| page.title() == Some("Comentarios: Carrito"))
        .expect("comments page");
    assert_eq!(comment_page.images().count(), 0);
}

#[test]
fn cover_reports_the_screen_count() {
    let document = compiler()
        .compile_input(input(false, vec![]))
        .expect("compiles");
    let cover = &document.pages()[0];
    let details = cover.tables().next().expect("design test table");
    let screens = details
        .rows()
        .iter()
        .find(|row| row.cells[0] == "Pantallas")
        .expect("screen count row");
    assert_eq!(screens.cells[1], "3");
}

#[test]
fn missing_design_test_is_rejected() {
    let json = json!({ "evaluators": [] }).to_string();
    let err = compiler()
        .compile_input(ReportInput::from_json(&json).expect("valid envelope"))
        .unwrap_err();
    assert!(matches!(
        err,
        ReportError::Input(InputError::MissingDesignTest)
    ));
}

#[test]
fn hooks_fire_around_a_failed_export() {
    let started = Rc::new(Cell::new(0));
    let ended = Rc::new(Cell::new(0));
    let compiler = {
        let started = Rc::clone(&started);
        let ended = Rc::clone(&ended);
        compiler()
            .on_start(move || started.set(started.get() + 1))
            .on_end(move || ended.set(ended.get() + 1))
    };

    let result = compiler.export(ReportInput::default(), std::env::temp_dir());
    assert!(matches!(
        result,
        Err(ReportError::Input(InputError::MissingDesignTest))
    ));
    assert_eq!(started.get(), 1);
    assert_eq!(ended.get(), 1);
}

#[test]
fn export_writes_the_prefixed_file() {
    if !usability_report::fonts::default_fonts_available() {
        eprintln!("Skipping export test: no fonts found (set USABILITY_REPORT_FONTS_DIR)");
        return;
    }

    let output_dir = std::env::temp_dir().join("usability_report_export_test");
    std::fs::create_dir_all(&output_dir).expect("create output dir");

    let exported = compiler()
        .export(
            input(
                false,
                vec![evaluator(
                    "eva",
                    vec![standard_response(1, "Inicio", "calificacion", 8.0, "ok")],
                )],
            ),
            &output_dir,
        )
        .expect("export succeeds");

    assert_eq!(
        exported.path.file_name().and_then(|name| name.to_str()),
        Some("Informe detallado de Checkout.pdf")
    );
    let bytes = std::fs::read(&exported.path).expect("read exported pdf");
    assert!(bytes.starts_with(b"%PDF"));
}
