//! Bitmap-to-PDF export: a rendered page image scaled to page width and
//! sliced across as many pages as it needs.

use printpdf::{
    ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfDocument, Px,
};

use super::layout::{PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use super::ReportError;

/// Width the bitmap is scaled to.
pub const IMAGE_WIDTH_MM: f32 = PAGE_WIDTH_MM;
/// Height of image shown per page.
pub const SLICE_HEIGHT_MM: f32 = 295.0;

/// Top offset (mm into the scaled image) of each page's slice.
///
/// Always at least one page. A trailing slice is only added while image
/// remains to show.
pub fn slice_offsets(image_height_mm: f32) -> Vec<f32> {
    let mut offsets = vec![0.0];
    let mut remaining = image_height_mm - SLICE_HEIGHT_MM;
    let mut offset = 0.0;
    while remaining > 0.0 {
        offset += SLICE_HEIGHT_MM;
        offsets.push(offset);
        remaining -= SLICE_HEIGHT_MM;
    }
    offsets
}

/// Pixel `(top, rows)` of each page slice. Slices that round to no rows
/// are dropped.
pub fn pixel_slices(height_px: u32, px_per_mm: f32, offsets: &[f32]) -> Vec<(u32, u32)> {
    let slice_rows = ((SLICE_HEIGHT_MM * px_per_mm).round() as u32).max(1);
    offsets
        .iter()
        .map(|offset_mm| {
            let top = ((offset_mm * px_per_mm).round() as u32).min(height_px);
            (top, slice_rows.min(height_px - top))
        })
        .take_while(|&(_, rows)| rows > 0)
        .collect()
}

/// Decode a PNG/JPEG bitmap and paginate it into a PDF.
pub fn export_raster_to_pdf(image_bytes: &[u8]) -> Result<Vec<u8>, ReportError> {
    let bitmap = image::load_from_memory(image_bytes)
        .map_err(|e| ReportError::Image(e.to_string()))?
        .to_rgb8();
    let (width_px, height_px) = bitmap.dimensions();
    if width_px == 0 || height_px == 0 {
        return Err(ReportError::EmptyImage);
    }

    let px_per_mm = width_px as f32 / IMAGE_WIDTH_MM;
    let image_height_mm = height_px as f32 / px_per_mm;
    let slices = pixel_slices(height_px, px_per_mm, &slice_offsets(image_height_mm));
    let dpi = width_px as f32 * 25.4 / IMAGE_WIDTH_MM;

    let (doc, first_page, first_layer) =
        PdfDocument::new("Export", Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");

    for (i, &(top, rows)) in slices.iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) =
                doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), format!("Layer {}", i + 1));
            doc.get_page(page).get_layer(layer)
        };

        let slice = image::imageops::crop_imm(&bitmap, 0, top, width_px, rows).to_image();
        let xobject = ImageXObject {
            width: Px(width_px as usize),
            height: Px(rows as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data: slice.into_raw(),
            image_filter: None,
            smask: None,
            clipping_bbox: None,
        };
        let slice_height_mm = rows as f32 / px_per_mm;
        Image::from(xobject).add_to_layer(
            layer,
            ImageTransform {
                translate_x: Some(Mm(0.0)),
                translate_y: Some(Mm(PAGE_HEIGHT_MM - slice_height_mm)),
                dpi: Some(dpi),
                ..Default::default()
            },
        );
    }

    tracing::info!(
        width_px,
        height_px,
        pages = slices.len(),
        "Raster export rendered"
    );
    super::render::save(doc)
}
