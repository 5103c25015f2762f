use std::io::BufWriter;

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rect, Rgb,
};

use super::layout::{FontWeight, Op, ReportLayout, RgbColor, LINE_HEIGHT_FACTOR, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use super::ReportError;

fn color(c: RgbColor) -> Color {
    Color::Rgb(Rgb::new(
        f32::from(c.0) / 255.0,
        f32::from(c.1) / 255.0,
        f32::from(c.2) / 255.0,
        None,
    ))
}

/// Layout y (from the top) to PDF y (from the bottom).
fn pdf_y(y: f32) -> Mm {
    Mm(PAGE_HEIGHT_MM - y)
}

fn font_error(e: impl std::fmt::Display) -> ReportError {
    ReportError::Pdf(format!("PDF font error: {e}"))
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

fn draw(layer: &PdfLayerReference, fonts: &Fonts, op: &Op) {
    match op {
        Op::FillRect {
            x,
            y,
            width,
            height,
            color: c,
        } => {
            layer.set_fill_color(color(*c));
            layer.add_rect(Rect::new(
                Mm(*x),
                pdf_y(y + height),
                Mm(x + width),
                pdf_y(*y),
            ));
        }
        Op::Rule { x1, x2, y, color: c } => {
            layer.set_outline_color(color(*c));
            layer.set_outline_thickness(0.5);
            layer.add_line(Line {
                points: vec![
                    (Point::new(Mm(*x1), pdf_y(*y)), false),
                    (Point::new(Mm(*x2), pdf_y(*y)), false),
                ],
                is_closed: false,
            });
        }
        Op::Text {
            x,
            y,
            size,
            weight,
            color: c,
            lines,
        } => {
            let font = match weight {
                FontWeight::Regular => &fonts.regular,
                FontWeight::Bold => &fonts.bold,
            };
            layer.set_fill_color(color(*c));
            for (i, line) in lines.iter().enumerate() {
                let line_y = y + i as f32 * size * LINE_HEIGHT_FACTOR;
                layer.use_text(line.as_str(), *size, Mm(*x), pdf_y(line_y), font);
            }
        }
    }
}

pub(super) fn save(doc: PdfDocumentReference) -> Result<Vec<u8>, ReportError> {
    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ReportError::Pdf(format!("PDF save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| ReportError::Pdf(format!("PDF buffer error: {e}")))
}

/// Draw a laid-out report into PDF bytes.
pub fn render_pdf(layout: &ReportLayout) -> Result<Vec<u8>, ReportError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(&layout.title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(font_error)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(font_error)?,
    };

    for (i, page) in layout.pages.iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_idx, layer_idx) =
                doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), format!("Layer {}", i + 1));
            doc.get_page(page_idx).get_layer(layer_idx)
        };
        for op in &page.ops {
            draw(&layer, &fonts, op);
        }
    }

    save(doc)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::report::{layout_report, ExportOptions, MedicalData};

    #[test]
    fn renders_every_page() {
        let layout = layout_report(
            &MedicalData::default(),
            &ExportOptions::default(),
            NaiveDate::from_ymd_opt(2024, 12, 20).unwrap(),
        );
        let bytes = render_pdf(&layout).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }

    #[test]
    fn y_axis_flipped() {
        assert_eq!(pdf_y(0.0), Mm(PAGE_HEIGHT_MM));
        assert_eq!(pdf_y(PAGE_HEIGHT_MM), Mm(0.0));
    }
}
