// Enrollment term (termo de matrícula) PDF generation
// Handlebars text template -> word-wrapped lines -> paginated A4 PDF

use chrono::NaiveDate;
use handlebars::Handlebars;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};

use crate::app_config::AcademyConfig;
use crate::models::plan::Plan;
use crate::models::student::Student;
use crate::utils::formatting::{format_date, format_money};

const DEFAULT_TEMPLATE: &str = include_str!("../../templates/documents/enrollment_term.hbs");
const TEMPLATE_NAME: &str = "enrollment_term";
const MISSING: &str = "-";

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const BODY_FONT_SIZE: f32 = 11.0;
const HEADING_FONT_SIZE: f32 = 13.0;
const FOOTER_FONT_SIZE: f32 = 8.0;
const LINE_HEIGHT_MM: f32 = 5.5;
/// Approximate Helvetica 11pt capacity of the 170mm text column
pub const MAX_LINE_CHARS: usize = 88;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to load template {path}: {source}")]
    TemplateLoad {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid template: {0}")]
    Template(String),

    #[error("Template rendering failed: {0}")]
    Render(String),

    #[error("PDF generation failed: {0}")]
    Pdf(String),
}

/// Values substituted into the template; absent values render as "-"
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnrollmentTermData {
    pub student_name: String,
    pub student_cpf: String,
    pub student_email: String,
    pub student_phone: String,
    pub student_birth_date: String,
    pub student_address: String,
    pub plan_name: String,
    pub plan_price: String,
    pub plan_duration_months: String,
    pub plan_expires_at: String,
    pub academy_name: String,
    pub academy_document: String,
    pub academy_address: String,
    pub issue_date: String,
    pub issued_by: String,
}

fn or_missing(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(MISSING)
        .to_string()
}

/// `12345678909` -> `123.456.789-09`
fn format_cpf(cpf: &str) -> String {
    if cpf.len() == 11 && cpf.chars().all(|c| c.is_ascii_digit()) {
        format!("{}.{}.{}-{}", &cpf[0..3], &cpf[3..6], &cpf[6..9], &cpf[9..11])
    } else {
        cpf.to_string()
    }
}

impl EnrollmentTermData {
    pub fn new(
        student: &Student,
        plan: Option<&Plan>,
        academy: &AcademyConfig,
        issued_by: &str,
        issue_date: NaiveDate,
    ) -> Self {
        Self {
            student_name: or_missing(Some(&student.full_name)),
            student_cpf: or_missing(student.cpf.as_deref().map(format_cpf).as_deref()),
            student_email: or_missing(Some(&student.email)),
            student_phone: or_missing(student.phone.as_deref()),
            student_birth_date: or_missing(student.birth_date.map(format_date).as_deref()),
            student_address: or_missing(student.address.as_deref()),
            plan_name: or_missing(plan.map(|p| p.name.as_str())),
            plan_price: or_missing(
                plan.map(|p| format_money(i64::from(p.price_cents), &academy.currency_symbol))
                    .as_deref(),
            ),
            plan_duration_months: or_missing(
                plan.map(|p| p.duration_months.to_string()).as_deref(),
            ),
            plan_expires_at: or_missing(student.plan_expires_at.map(format_date).as_deref()),
            academy_name: or_missing(Some(&academy.name)),
            academy_document: or_missing(Some(&academy.legal_document)),
            academy_address: or_missing(Some(&academy.address)),
            issue_date: format_date(issue_date),
            issued_by: or_missing(Some(issued_by)),
        }
    }
}

/// One rendered line of the document
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Heading(String),
    Body(String),
    Blank,
}

/// Greedy word wrap on whitespace; words longer than `width` are split
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > width {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
        if needed > width {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current_len += word.len();
        current.extend(word);
    }

    if current_len > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Splits the rendered template into display lines. `# ` marks a heading.
pub fn layout(text: &str, width: usize) -> Vec<Line> {
    let mut lines = Vec::new();
    for raw in text.lines() {
        let raw = raw.trim_end();
        if raw.trim().is_empty() {
            lines.push(Line::Blank);
        } else if let Some(heading) = raw.strip_prefix("# ") {
            lines.extend(wrap_text(heading, width).into_iter().map(Line::Heading));
        } else {
            lines.extend(wrap_text(raw, width).into_iter().map(Line::Body));
        }
    }
    while lines.last() == Some(&Line::Blank) {
        lines.pop();
    }
    lines
}

pub fn lines_per_page() -> usize {
    // Footer takes the bottom margin
    ((PAGE_HEIGHT_MM - 2.0 * MARGIN_MM) / LINE_HEIGHT_MM).floor() as usize
}

/// Groups lines into pages, never starting a page with a blank line
pub fn paginate(lines: Vec<Line>, per_page: usize) -> Vec<Vec<Line>> {
    let per_page = per_page.max(1);
    let mut pages: Vec<Vec<Line>> = Vec::new();
    let mut current: Vec<Line> = Vec::new();

    for line in lines {
        if current.len() == per_page {
            pages.push(std::mem::take(&mut current));
        }
        if current.is_empty() && line == Line::Blank {
            continue;
        }
        current.push(line);
    }
    if !current.is_empty() || pages.is_empty() {
        pages.push(current);
    }
    pages
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

fn load_fonts(doc: &PdfDocumentReference) -> Result<Fonts, DocumentError> {
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| DocumentError::Pdf(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| DocumentError::Pdf(e.to_string()))?;
    Ok(Fonts { regular, bold })
}

/// Renders plain text as a paginated A4 PDF
pub fn render_pdf(title: &str, text: &str) -> Result<Vec<u8>, DocumentError> {
    let pages = paginate(layout(text, MAX_LINE_CHARS), lines_per_page());
    let total = pages.len();

    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let fonts = load_fonts(&doc)?;

    for (index, page_lines) in pages.iter().enumerate() {
        let (page, layer) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1")
        };
        let layer = doc.get_page(page).get_layer(layer);

        let mut y = PAGE_HEIGHT_MM - MARGIN_MM;
        for line in page_lines {
            match line {
                Line::Heading(text) => {
                    layer.use_text(text.as_str(), HEADING_FONT_SIZE, Mm(MARGIN_MM), Mm(y), &fonts.bold)
                },
                Line::Body(text) => {
                    layer.use_text(text.as_str(), BODY_FONT_SIZE, Mm(MARGIN_MM), Mm(y), &fonts.regular)
                },
                Line::Blank => {},
            }
            y -= LINE_HEIGHT_MM;
        }

        layer.use_text(
            format!("Página {} de {}", index + 1, total),
            FOOTER_FONT_SIZE,
            Mm(PAGE_WIDTH_MM - MARGIN_MM - 25.0),
            Mm(MARGIN_MM / 2.0),
            &fonts.regular,
        );
    }

    doc.save_to_bytes()
        .map_err(|e| DocumentError::Pdf(e.to_string()))
}

/// Renders enrollment terms from the configured template
pub struct EnrollmentTermService {
    templates: Handlebars<'static>,
    academy: AcademyConfig,
}

impl EnrollmentTermService {
    /// Loads the template from `ENROLLMENT_TERM_TEMPLATE_PATH` or the embedded default
    pub fn new(academy: AcademyConfig) -> Result<Self, DocumentError> {
        let source = match &academy.enrollment_term_template_path {
            Some(path) => {
                info!("Loading enrollment term template from {}", path);
                std::fs::read_to_string(path).map_err(|source| DocumentError::TemplateLoad {
                    path: path.clone(),
                    source,
                })?
            },
            None => DEFAULT_TEMPLATE.to_string(),
        };
        Self::from_template(&source, academy)
    }

    pub fn from_template(source: &str, academy: AcademyConfig) -> Result<Self, DocumentError> {
        let mut templates = Handlebars::new();
        templates.register_escape_fn(handlebars::no_escape);
        templates
            .register_template_string(TEMPLATE_NAME, source)
            .map_err(|e| DocumentError::Template(e.to_string()))?;
        Ok(Self { templates, academy })
    }

    pub fn academy(&self) -> &AcademyConfig {
        &self.academy
    }

    pub fn render_text(&self, data: &EnrollmentTermData) -> Result<String, DocumentError> {
        self.templates
            .render(TEMPLATE_NAME, data)
            .map_err(|e| DocumentError::Render(e.to_string()))
    }

    #[instrument(skip(self, data), fields(student = %data.student_name))]
    pub fn generate(&self, data: &EnrollmentTermData) -> Result<Vec<u8>, DocumentError> {
        let text = self.render_text(data)?;
        render_pdf(&format!("Termo de matrícula - {}", data.student_name), &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn academy() -> AcademyConfig {
        AcademyConfig {
            name: "Academia Teste".to_string(),
            legal_document: "12.345.678/0001-90".to_string(),
            address: String::new(),
            currency_symbol: "R$".to_string(),
            enrollment_term_template_path: None,
        }
    }

    fn student() -> Student {
        Student {
            id: Uuid::new_v4(),
            full_name: "Ana Souza".to_string(),
            email: "ana@example.com".to_string(),
            phone: None,
            cpf: Some("52998224725".to_string()),
            birth_date: NaiveDate::from_ymd_opt(1995, 7, 4),
            address: None,
            emergency_contact: None,
            plan_id: None,
            status: "active".to_string(),
            enrollment_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            plan_expires_at: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("a bb ccc", 4), vec!["a bb", "ccc"]);
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap_text("", 10), vec![""]);
        for line in wrap_text(&"palavra ".repeat(50), MAX_LINE_CHARS) {
            assert!(line.chars().count() <= MAX_LINE_CHARS);
        }
    }

    #[test]
    fn test_paginate_skips_leading_blank() {
        let lines = vec![
            Line::Body("1".into()),
            Line::Body("2".into()),
            Line::Blank,
            Line::Body("3".into()),
        ];
        let pages = paginate(lines, 2);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1], vec![Line::Body("3".into())]);
    }

    #[test]
    fn test_missing_values_render_as_dash() {
        let data = EnrollmentTermData::new(
            &student(),
            None,
            &academy(),
            "Carla",
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        );
        assert_eq!(data.plan_name, "-");
        assert_eq!(data.plan_price, "-");
        assert_eq!(data.student_phone, "-");
        assert_eq!(data.academy_address, "-");
        assert_eq!(data.student_cpf, "529.982.247-25");
        assert_eq!(data.student_birth_date, "04/07/1995");
        assert_eq!(data.issue_date, "15/03/2024");
    }

    #[test]
    fn test_template_not_escaped() {
        let service =
            EnrollmentTermService::from_template("Aluno: {{student_name}}", academy()).unwrap();
        let mut data = EnrollmentTermData::new(
            &student(),
            None,
            &academy(),
            "Carla",
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        );
        data.student_name = "Ana & Filhos".to_string();
        assert_eq!(service.render_text(&data).unwrap(), "Aluno: Ana & Filhos");
    }

    #[test]
    fn test_generate_pdf() {
        let service = EnrollmentTermService::new(academy()).unwrap();
        let data = EnrollmentTermData::new(
            &student(),
            None,
            &academy(),
            "Carla",
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        );
        let text = service.render_text(&data).unwrap();
        assert!(text.contains("Ana Souza"));
        assert!(text.contains("529.982.247-25"));

        let bytes = service.generate(&data).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_long_document_spans_pages() {
        let text = "linha\n".repeat(lines_per_page() * 2 + 1);
        let pages = paginate(layout(&text, MAX_LINE_CHARS), lines_per_page());
        assert_eq!(pages.len(), 3);
        assert!(render_pdf("teste", &text).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn test_missing_template_file() {
        let mut config = academy();
        config.enrollment_term_template_path = Some("/nonexistent/term.hbs".to_string());
        assert!(matches!(
            EnrollmentTermService::new(config),
            Err(DocumentError::TemplateLoad { .. })
        ));
    }
}
