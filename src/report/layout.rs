//! Page layout for the medical history report.
//!
//! Coordinates are millimetres from the top-left corner of an A4 page.
//! Layout is a pure function of its inputs: the same data, options and
//! generation date always give the same pages.

use chrono::NaiveDate;
use serde::Serialize;

use super::{ExportOptions, MedicalData};
use crate::models::ReportSection;

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 20.0;
/// Printed height of one text line per point of font size.
pub const LINE_HEIGHT_FACTOR: f32 = 0.35;

const PT_TO_MM: f32 = 0.3528;
/// Average Helvetica glyph width in em.
const AVG_CHAR_EM: f32 = 0.5;

pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";
pub const REPORT_TITLE: &str = "MEDICAL HISTORY REPORT";
pub const FOOTER_TEXT: &str = "Generated by Medical Records System";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RgbColor(pub u8, pub u8, pub u8);

impl RgbColor {
    pub const BLACK: Self = Self(0, 0, 0);
    pub const WHITE: Self = Self(255, 255, 255);
    pub const GREY: Self = Self(128, 128, 128);
    pub const RULE: Self = Self(200, 200, 200);
    pub const HEADER: Self = Self(41, 128, 185);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: RgbColor,
    },
    Rule {
        x1: f32,
        x2: f32,
        y: f32,
        color: RgbColor,
    },
    /// Wrapped text; `y` is the baseline of the first line.
    Text {
        x: f32,
        y: f32,
        size: f32,
        weight: FontWeight,
        color: RgbColor,
        lines: Vec<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    pub ops: Vec<Op>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportLayout {
    pub title: String,
    pub pages: Vec<Page>,
}

impl ReportLayout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Every printed line, page by page.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(|page| {
            page.ops.iter().flat_map(|op| match op {
                Op::Text { lines, .. } => lines.iter().map(String::as_str).collect::<Vec<_>>(),
                _ => Vec::new(),
            })
        })
    }
}

struct SectionStyle {
    heading: &'static str,
    color: RgbColor,
    /// Space reserved before each item.
    item_height: f32,
}

fn section_style(section: ReportSection) -> SectionStyle {
    match section {
        ReportSection::Exams => SectionStyle {
            heading: "EXAMS",
            color: RgbColor(52, 152, 219),
            item_height: 25.0,
        },
        ReportSection::Vaccines => SectionStyle {
            heading: "VACCINES",
            color: RgbColor(46, 204, 113),
            item_height: 30.0,
        },
        ReportSection::Medications => SectionStyle {
            heading: "MEDICATIONS",
            color: RgbColor(155, 89, 182),
            item_height: 35.0,
        },
        ReportSection::History => SectionStyle {
            heading: "MEDICAL HISTORY",
            color: RgbColor(230, 126, 34),
            item_height: 40.0,
        },
    }
}

/// Greedy word wrap on whitespace. Words longer than a line are broken
/// into `max_chars` pieces. Never returns an empty list.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for piece in chars.chunks(max_chars) {
            if current.chars().count() + piece.len() + 1 > max_chars && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.extend(piece);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Characters fitting on one line of the usable width at `size` points.
fn chars_per_line(size: f32) -> usize {
    let usable = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
    ((usable / (size * PT_TO_MM * AVG_CHAR_EM)).floor() as usize).max(1)
}

struct Composer {
    pages: Vec<Page>,
    y: f32,
}

impl Composer {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y: MARGIN_MM,
        }
    }

    fn push(&mut self, op: Op) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    /// Open a new page when `height` more millimetres would cross the bottom margin.
    fn ensure_space(&mut self, height: f32) {
        if self.y + height > PAGE_HEIGHT_MM - MARGIN_MM {
            self.pages.push(Page::default());
            self.y = MARGIN_MM;
        }
    }

    /// Place wrapped text at `(x, y)` and return its printed height.
    fn text(&mut self, text: &str, x: f32, y: f32, size: f32, weight: FontWeight, color: RgbColor) -> f32 {
        let lines = wrap_text(text, chars_per_line(size));
        let height = lines.len() as f32 * size * LINE_HEIGHT_FACTOR;
        self.push(Op::Text {
            x,
            y,
            size,
            weight,
            color,
            lines,
        });
        height
    }

    fn banner(&mut self, style: &SectionStyle) {
        self.ensure_space(40.0);
        self.push(Op::FillRect {
            x: 15.0,
            y: self.y - 5.0,
            width: PAGE_WIDTH_MM - 30.0,
            height: 15.0,
            color: style.color,
        });
        let y = self.y + 5.0;
        self.text(style.heading, 20.0, y, 14.0, FontWeight::Bold, RgbColor::WHITE);
        self.y += 25.0;
    }

    /// One numbered record: separator, bold title, then detail paragraphs.
    fn item(&mut self, style: &SectionStyle, index: usize, title: &str, details: &[String]) {
        self.ensure_space(style.item_height);
        self.push(Op::Rule {
            x1: MARGIN_MM,
            x2: PAGE_WIDTH_MM - MARGIN_MM,
            y: self.y - 3.0,
            color: RgbColor::RULE,
        });

        let y = self.y;
        let height = self.text(
            &format!("{}. {title}", index + 1),
            MARGIN_MM,
            y,
            11.0,
            FontWeight::Bold,
            RgbColor::BLACK,
        );
        self.y += height + 3.0;

        for (i, detail) in details.iter().enumerate() {
            let y = self.y;
            let height = self.text(detail, 25.0, y, 9.0, FontWeight::Regular, RgbColor::BLACK);
            let gap = if i + 1 == details.len() { 8.0 } else { 3.0 };
            self.y += height + gap;
        }
    }

    fn footers(&mut self) {
        let total = self.pages.len();
        let y = PAGE_HEIGHT_MM - 10.0;
        for (i, page) in self.pages.iter_mut().enumerate() {
            page.ops.push(Op::Text {
                x: PAGE_WIDTH_MM - 30.0,
                y,
                size: 8.0,
                weight: FontWeight::Regular,
                color: RgbColor::GREY,
                lines: vec![format!("Page {} of {total}", i + 1)],
            });
            page.ops.push(Op::Text {
                x: MARGIN_MM,
                y,
                size: 8.0,
                weight: FontWeight::Regular,
                color: RgbColor::GREY,
                lines: vec![FOOTER_TEXT.to_string()],
            });
        }
    }
}

fn display_date(date: &NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

/// Title and detail paragraphs for every item of a section.
fn section_items(data: &MedicalData, section: ReportSection) -> Vec<(String, Vec<String>)> {
    match section {
        ReportSection::Exams => data
            .exams
            .iter()
            .map(|exam| {
                (
                    exam.name.clone(),
                    vec![format!("Date: {} | Type: {}", display_date(&exam.exam_date), exam.exam_type)],
                )
            })
            .collect(),
        ReportSection::Vaccines => data
            .vaccines
            .iter()
            .map(|vaccine| {
                let mut details = format!("Date: {}", display_date(&vaccine.vaccine_date));
                if let Some(batch) = vaccine.batch.as_deref().filter(|b| !b.is_empty()) {
                    details.push_str(&format!(" | Batch: {batch}"));
                }
                if let Some(location) = vaccine.location.as_deref().filter(|l| !l.is_empty()) {
                    details.push_str(&format!(" | Location: {location}"));
                }
                (vaccine.name.clone(), vec![details])
            })
            .collect(),
        ReportSection::Medications => data
            .medications
            .iter()
            .map(|med| {
                (
                    med.name.clone(),
                    vec![
                        format!("Dosage: {} | Frequency: {}", med.dose, med.frequency),
                        format!(
                            "Start Date: {} | Status: {}",
                            display_date(&med.start_date),
                            med.status_label()
                        ),
                    ],
                )
            })
            .collect(),
        ReportSection::History => data
            .history
            .iter()
            .map(|entry| {
                let mut when = format!("Date: {}", display_date(&entry.history_date));
                if let Some(professional) =
                    entry.evaluating_professional.as_deref().filter(|p| !p.is_empty())
                {
                    when.push_str(&format!(" | Professional: {professional}"));
                }
                (entry.title.clone(), vec![when, entry.description.clone()])
            })
            .collect(),
    }
}

/// Lay out the report.
///
/// Sections print in a fixed order regardless of the order in `options`.
/// Empty sections print nothing, not even a banner.
pub fn layout_report(data: &MedicalData, options: &ExportOptions, generated_on: NaiveDate) -> ReportLayout {
    let mut doc = Composer::new();

    doc.push(Op::FillRect {
        x: 0.0,
        y: 0.0,
        width: PAGE_WIDTH_MM,
        height: 30.0,
        color: RgbColor::HEADER,
    });
    doc.text(REPORT_TITLE, MARGIN_MM, 18.0, 18.0, FontWeight::Bold, RgbColor::WHITE);

    doc.y = 45.0;
    let y = doc.y;
    doc.text(
        &format!("Patient: {}", options.patient_name),
        MARGIN_MM,
        y,
        12.0,
        FontWeight::Bold,
        RgbColor::BLACK,
    );
    doc.y += 8.0;
    let y = doc.y;
    doc.text(
        &format!("Healthcare Provider: {}", options.professional_name),
        MARGIN_MM,
        y,
        10.0,
        FontWeight::Regular,
        RgbColor::BLACK,
    );
    doc.y += 8.0;
    let y = doc.y;
    doc.text(
        &format!("Generated on: {}", display_date(&generated_on)),
        MARGIN_MM,
        y,
        10.0,
        FontWeight::Regular,
        RgbColor::BLACK,
    );
    doc.y += 20.0;

    for section in ReportSection::all() {
        if !options.sections.contains(section) {
            continue;
        }
        let items = section_items(data, *section);
        if items.is_empty() {
            continue;
        }

        let style = section_style(*section);
        doc.banner(&style);
        for (index, (title, details)) in items.iter().enumerate() {
            doc.item(&style, index, title, details);
        }
        if *section != ReportSection::History {
            doc.y += 10.0;
        }
    }

    doc.footers();
    ReportLayout {
        title: format!("Medical History - {}", options.patient_name),
        pages: doc.pages,
    }
}
