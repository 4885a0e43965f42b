// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — build a paginated document of full-page images using `lopdf`.
//
// Each page embeds one JPEG verbatim as a `DCTDecode` image XObject, so the
// quality chosen at encode time is exactly what lands in the file. The
// document lives in memory until `finish()` serialises it.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use syscan_core::PaperSize;
use syscan_core::error::SyscanError;
use tracing::{debug, info, instrument};

use super::layout::{Placement, mm_to_pt};

/// Resource name of the single image drawn on every page.
const IMAGE_RESOURCE: &[u8] = b"Im1";

/// Accumulates image pages into an in-memory PDF.
pub struct PdfWriter {
    paper_size: PaperSize,
    title: Option<String>,
    document: Document,
    /// Object ID reserved for the /Pages node, written in `finish()`.
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl PdfWriter {
    /// Create a new writer targeting the given paper size.
    pub fn new(paper_size: PaperSize) -> Self {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        Self {
            paper_size,
            title: None,
            document,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Create a new writer defaulting to A4.
    pub fn a4() -> Self {
        Self::new(PaperSize::A4)
    }

    /// Set a title for the PDF metadata.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Number of pages appended so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Paper dimensions in points.
    fn page_dimensions_pt(&self) -> (f64, f64) {
        let (w_mm, h_mm) = self.paper_size.dimensions_mm();
        (mm_to_pt(w_mm as f64), mm_to_pt(h_mm as f64))
    }

    // -- Pages ----------------------------------------------------------------

    /// Append a page showing `jpeg` (an RGB baseline JPEG of
    /// `width_px` x `height_px`) at `placement`.
    #[instrument(skip(self, jpeg), fields(jpeg_len = jpeg.len(), page = self.kids.len() + 1))]
    pub fn add_jpeg_page(
        &mut self,
        jpeg: &[u8],
        width_px: u32,
        height_px: u32,
        placement: &Placement,
    ) -> Result<(), SyscanError> {
        let (page_w_pt, page_h_pt) = self.page_dimensions_pt();
        let (_, page_h_mm) = self.paper_size.dimensions_mm();

        let image_id = self.document.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width_px as i64,
                "Height" => height_px as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg.to_vec(),
        ));

        let w_pt = mm_to_pt(placement.width_mm) as f32;
        let h_pt = mm_to_pt(placement.height_mm) as f32;
        let x_pt = mm_to_pt(placement.x_mm) as f32;
        let y_pt = mm_to_pt(placement.bottom_offset_mm(page_h_mm as f64)) as f32;

        // The image XObject occupies the unit square; `cm` stretches it to
        // the placed size and moves it into position.
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(w_pt),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(h_pt),
                        Object::Real(x_pt),
                        Object::Real(y_pt),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(IMAGE_RESOURCE.to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content.encode().map_err(|err| {
            SyscanError::PdfError(format!("failed to encode page content: {}", err))
        })?;
        let content_id = self
            .document
            .add_object(Stream::new(dictionary! {}, encoded));

        let mut xobjects = lopdf::Dictionary::new();
        xobjects.set(IMAGE_RESOURCE.to_vec(), Object::Reference(image_id));

        let page_id = self.document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(page_w_pt as f32),
                Object::Real(page_h_pt as f32),
            ],
            "Resources" => dictionary! {
                "XObject" => xobjects,
            },
        });
        self.kids.push(Object::Reference(page_id));

        debug!(w_pt, h_pt, x_pt, y_pt, "Image placed on page");
        Ok(())
    }

    // -- Output ---------------------------------------------------------------

    /// Serialise the document. A document without pages is an error.
    #[instrument(skip(self), fields(pages = self.kids.len()))]
    pub fn finish(mut self) -> Result<Vec<u8>, SyscanError> {
        if self.kids.is_empty() {
            return Err(SyscanError::PdfError("document has no pages".into()));
        }

        let page_count = self.kids.len();
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => std::mem::take(&mut self.kids),
            "Count" => page_count as i64,
        };
        self.document
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.document.trailer.set("Root", catalog_id);

        let title = self.title.as_deref().unwrap_or("SyScan Document");
        let info_id = self.document.add_object(dictionary! {
            "Title" => Object::string_literal(title),
            "Producer" => Object::string_literal("SyScan"),
        });
        self.document.trailer.set("Info", info_id);

        let mut output = Vec::new();
        self.document.save_to(&mut output).map_err(|err| {
            SyscanError::PdfError(format!("failed to serialise PDF: {}", err))
        })?;

        info!(
            paper = ?self.paper_size,
            pages = page_count,
            bytes = output.len(),
            "PDF serialised"
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::processor::ImageProcessor;
    use crate::pdf::layout::fit_to_page;
    use crate::pdf::reader::PdfReader;
    use image::{DynamicImage, Rgb, RgbImage};

    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([10, 120, 240])));
        ImageProcessor::from_dynamic(img).to_jpeg_bytes(70).unwrap()
    }

    #[test]
    fn empty_document_is_refused() {
        assert!(matches!(
            PdfWriter::a4().finish(),
            Err(SyscanError::PdfError(_))
        ));
    }

    #[test]
    fn pages_are_appended_in_order() {
        let mut writer = PdfWriter::a4();
        for (w, h) in [(30, 40), (40, 30), (10, 10)] {
            let placement = fit_to_page(w, h, PaperSize::A4).unwrap();
            writer.add_jpeg_page(&jpeg(w, h), w, h, &placement).unwrap();
        }
        assert_eq!(writer.page_count(), 3);

        let bytes = writer.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let reader = PdfReader::from_bytes(&bytes).unwrap();
        assert_eq!(reader.page_count(), 3);
        let widths: Vec<i64> = (1..=3)
            .map(|n| reader.page_image_size(n).unwrap().0)
            .collect();
        assert_eq!(widths, vec![30, 40, 10]);
    }

    #[test]
    fn pages_are_a4_sized() {
        let mut writer = PdfWriter::a4();
        let placement = fit_to_page(20, 20, PaperSize::A4).unwrap();
        writer.add_jpeg_page(&jpeg(20, 20), 20, 20, &placement).unwrap();
        let reader = PdfReader::from_bytes(&writer.finish().unwrap()).unwrap();
        let (w, h) = reader.page_size_pt(1).unwrap();
        assert!((w - 595.2756).abs() < 0.01);
        assert!((h - 841.8898).abs() < 0.01);
    }

    /// Operands of the `cm` operator on page `page_number`.
    fn placement_matrix(bytes: &[u8], page_number: u32) -> Vec<f32> {
        let document = Document::load_mem(bytes).unwrap();
        let page_id = document.get_pages()[&page_number];
        let content = Content::decode(&document.get_page_content(page_id).unwrap()).unwrap();
        let ops: Vec<&str> = content.operations.iter().map(|op| op.operator.as_str()).collect();
        assert_eq!(ops, vec!["q", "cm", "Do", "Q"]);
        content.operations[1]
            .operands
            .iter()
            .map(|operand| operand.as_float().unwrap())
            .collect()
    }

    fn assert_matrix(actual: &[f32], expected: [f32; 6]) {
        assert_eq!(actual.len(), 6);
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 0.01, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn wide_image_is_centred_vertically_in_points() {
        let mut writer = PdfWriter::a4();
        let placement = fit_to_page(4000, 1000, PaperSize::A4).unwrap();
        writer.add_jpeg_page(&jpeg(40, 10), 4000, 1000, &placement).unwrap();
        let bytes = writer.finish().unwrap();

        // 210 x 52.5 mm, 122.25 mm above the bottom edge.
        assert_matrix(
            &placement_matrix(&bytes, 1),
            [595.2756, 0.0, 0.0, 148.8189, 0.0, 346.5354],
        );
    }

    #[test]
    fn top_offset_is_measured_from_the_bottom_edge() {
        let mut writer = PdfWriter::a4();
        let placement = Placement {
            scale: 1.0,
            x_mm: 20.0,
            y_mm: 10.0,
            width_mm: 100.0,
            height_mm: 50.0,
        };
        writer.add_jpeg_page(&jpeg(100, 50), 100, 50, &placement).unwrap();
        let bytes = writer.finish().unwrap();

        // Lower edge at 297 - 10 - 50 = 237 mm from the bottom.
        assert_matrix(
            &placement_matrix(&bytes, 1),
            [283.4646, 0.0, 0.0, 141.7323, 56.6929, 671.8110],
        );
    }
}
