//! Page OCR for scanned PDFs.
//!
//! [`RasterOcr`] renders a page to PNG with a [`PageRenderer`] and reads the
//! image back with an [`ImageRecognizer`]. The `ocr` feature supplies
//! [`PdfiumRenderer`] and [`TesseractRecognizer`]; both load native
//! libraries (PDFium, libtesseract) at run time.

use std::sync::Arc;

use tracing::debug;

use crate::config::DEFAULT_OCR_RENDER_DPI;
use crate::upload::{OcrEngine, UploadError};

/// Renders one PDF page to PNG bytes.
pub trait PageRenderer: Send + Sync {
    fn render_page(&self, pdf_bytes: &[u8], page_index: usize, dpi: u32) -> Result<Vec<u8>, UploadError>;
}

/// Reads text from an encoded image.
pub trait ImageRecognizer: Send + Sync {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, UploadError>;
}

/// OCR that rasterizes the page, then recognizes the image.
pub struct RasterOcr {
    renderer: Arc<dyn PageRenderer>,
    recognizer: Arc<dyn ImageRecognizer>,
    dpi: u32,
}

impl RasterOcr {
    pub fn new(renderer: Arc<dyn PageRenderer>, recognizer: Arc<dyn ImageRecognizer>) -> Self {
        Self { renderer, recognizer, dpi: DEFAULT_OCR_RENDER_DPI }
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }
}

impl OcrEngine for RasterOcr {
    fn name(&self) -> &str {
        "raster"
    }

    fn recognize_page(&self, pdf_bytes: &[u8], page_index: usize) -> Result<String, UploadError> {
        let image = self.renderer.render_page(pdf_bytes, page_index, self.dpi)?;
        let text = self.recognizer.recognize(&image)?;
        debug!(page = page_index + 1, image_size = image.len(), chars = text.len(), "recognized page");
        Ok(text)
    }
}

#[cfg(feature = "ocr")]
pub use native::{PdfiumRenderer, TesseractRecognizer};

#[cfg(feature = "ocr")]
mod native {
    use std::io::Cursor;
    use std::path::{Path, PathBuf};

    use image::ImageOutputFormat;
    use pdfium_render::prelude::*;
    use tracing::{debug, warn};

    use super::{ImageRecognizer, PageRenderer};
    use crate::upload::UploadError;

    /// Longest rendered side in pixels.
    const MAX_DIMENSION_PX: u32 = 4096;
    const POINTS_PER_INCH: f32 = 72.0;

    /// Renders pages with Google PDFium.
    ///
    /// `Pdfium` is `!Send`, so the library is bound per call. The OS caches
    /// the dynamic load.
    pub struct PdfiumRenderer;

    impl PdfiumRenderer {
        /// Fails when no PDFium library can be bound.
        pub fn new() -> Result<Self, UploadError> {
            load_pdfium()?;
            Ok(Self)
        }
    }

    /// `PDFIUM_DYNAMIC_LIB_PATH` first, then the directory of the executable,
    /// then the system search path.
    fn load_pdfium() -> Result<Pdfium, UploadError> {
        if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
            let bindings = Pdfium::bind_to_library(&path)
                .map_err(|e| UploadError::Ocr(format!("failed to load PDFium from {path}: {e}")))?;
            return Ok(Pdfium::new(bindings));
        }

        if let Some(dir) = std::env::current_exe().ok().as_deref().and_then(Path::parent) {
            let lib_path = Pdfium::pdfium_platform_library_name_at_path(dir.to_string_lossy().as_ref());
            if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
                debug!(dir = %dir.display(), "loaded PDFium next to executable");
                return Ok(Pdfium::new(bindings));
            }
        }

        let bindings = Pdfium::bind_to_system_library().map_err(|e| {
            UploadError::Ocr(format!(
                "PDFium library not found. Set PDFIUM_DYNAMIC_LIB_PATH or install PDFium: {e}"
            ))
        })?;
        Ok(Pdfium::new(bindings))
    }

    /// Pixel size at `dpi`, capped to [`MAX_DIMENSION_PX`] with aspect ratio kept.
    pub(super) fn render_dimensions(width_points: f32, height_points: f32, dpi: u32) -> (u32, u32) {
        let scale = dpi as f32 / POINTS_PER_INCH;
        let width = (width_points * scale).max(1.0);
        let height = (height_points * scale).max(1.0);

        let longest = width.max(height);
        if longest <= MAX_DIMENSION_PX as f32 {
            return (width as u32, height as u32);
        }
        let ratio = MAX_DIMENSION_PX as f32 / longest;
        (
            ((width * ratio) as u32).clamp(1, MAX_DIMENSION_PX),
            ((height * ratio) as u32).clamp(1, MAX_DIMENSION_PX),
        )
    }

    impl PageRenderer for PdfiumRenderer {
        fn render_page(&self, pdf_bytes: &[u8], page_index: usize, dpi: u32) -> Result<Vec<u8>, UploadError> {
            let pdfium = load_pdfium()?;
            let document = pdfium
                .load_pdf_from_byte_slice(pdf_bytes, None)
                .map_err(|e| UploadError::Ocr(format!("failed to load PDF: {e}")))?;

            let pages = document.pages();
            let index = u16::try_from(page_index)
                .map_err(|_| UploadError::Ocr(format!("page index {page_index} out of range")))?;
            let page = pages.get(index).map_err(|_| {
                UploadError::Ocr(format!("page {page_index} out of range ({} pages)", pages.len()))
            })?;

            let (width, height) = render_dimensions(page.width().value, page.height().value, dpi);
            if width == MAX_DIMENSION_PX || height == MAX_DIMENSION_PX {
                warn!(page = page_index + 1, width, height, "page render size capped");
            }

            let config = PdfRenderConfig::new()
                .set_target_width(width as i32)
                .set_maximum_height(height as i32);
            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| UploadError::Ocr(format!("rendering page {page_index} failed: {e}")))?;

            let mut png = Cursor::new(Vec::new());
            bitmap
                .as_image()
                .write_to(&mut png, ImageOutputFormat::Png)
                .map_err(|e| UploadError::Ocr(format!("PNG encoding failed: {e}")))?;
            Ok(png.into_inner())
        }
    }

    /// Tesseract recognition against a tessdata directory.
    pub struct TesseractRecognizer {
        tessdata_dir: PathBuf,
        languages: String,
    }

    impl TesseractRecognizer {
        /// Fails when a `<lang>.traineddata` file for `languages`
        /// (`eng`, `eng+fra`, ...) is missing from `tessdata_dir`.
        pub fn new(tessdata_dir: &Path, languages: &str) -> Result<Self, UploadError> {
            for lang in languages.split('+').map(str::trim).filter(|l| !l.is_empty()) {
                let file = tessdata_dir.join(format!("{lang}.traineddata"));
                if !file.exists() {
                    return Err(UploadError::Ocr(format!("missing tessdata file {}", file.display())));
                }
            }
            Ok(Self { tessdata_dir: tessdata_dir.to_path_buf(), languages: languages.to_string() })
        }
    }

    impl ImageRecognizer for TesseractRecognizer {
        fn recognize(&self, image_bytes: &[u8]) -> Result<String, UploadError> {
            let tessdata = self
                .tessdata_dir
                .to_str()
                .ok_or_else(|| UploadError::Ocr("tessdata path is not valid UTF-8".into()))?;

            let mut tess = tesseract::Tesseract::new(Some(tessdata), Some(&self.languages))
                .map_err(|e| UploadError::Ocr(format!("tesseract init failed: {e:?}")))?
                .set_image_from_mem(image_bytes)
                .map_err(|e| UploadError::Ocr(format!("tesseract rejected image: {e:?}")))?;
            tess.get_text()
                .map_err(|e| UploadError::Ocr(format!("tesseract recognition failed: {e:?}")))
        }
    }

}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct FakeRenderer {
        calls: Mutex<Vec<(usize, u32)>>,
    }

    impl PageRenderer for FakeRenderer {
        fn render_page(&self, _pdf_bytes: &[u8], page_index: usize, dpi: u32) -> Result<Vec<u8>, UploadError> {
            self.calls.lock().unwrap().push((page_index, dpi));
            Ok(format!("png-{page_index}").into_bytes())
        }
    }

    struct EchoRecognizer;

    impl ImageRecognizer for EchoRecognizer {
        fn recognize(&self, image_bytes: &[u8]) -> Result<String, UploadError> {
            Ok(format!("text of {}", String::from_utf8_lossy(image_bytes)))
        }
    }

    struct FailingRecognizer;

    impl ImageRecognizer for FailingRecognizer {
        fn recognize(&self, _image_bytes: &[u8]) -> Result<String, UploadError> {
            Err(UploadError::Ocr("engine crashed".into()))
        }
    }

    #[test]
    fn renders_then_recognizes_at_configured_dpi() {
        let renderer = Arc::new(FakeRenderer { calls: Mutex::new(Vec::new()) });
        let ocr = RasterOcr::new(renderer.clone(), Arc::new(EchoRecognizer)).with_dpi(300);

        assert_eq!(ocr.recognize_page(b"%PDF", 2).unwrap(), "text of png-2");
        assert_eq!(*renderer.calls.lock().unwrap(), vec![(2, 300)]);
        assert_eq!(ocr.name(), "raster");
    }

    #[test]
    fn recognizer_errors_propagate() {
        let renderer = Arc::new(FakeRenderer { calls: Mutex::new(Vec::new()) });
        let err = RasterOcr::new(renderer, Arc::new(FailingRecognizer))
            .recognize_page(b"%PDF", 0)
            .unwrap_err();
        assert_eq!(err, UploadError::Ocr("engine crashed".into()));
    }
}
