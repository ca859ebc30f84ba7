//! PDF rendering
//!
//! Paints a laid-out `Document` with `genpdf`'s low-level renderer. Layout
//! is already final at this point: every block has an absolute position, so
//! the renderer only maps blocks to PDF operations and never paginates.
//!
//! Rendering strategy: `genpdf` (pure Rust), embedded Liberation Sans so any
//! Unicode in scan facts renders.

use std::path::{Path, PathBuf};

use genpdf::fonts::{self, FontCache, FontData, FontFamily};
use genpdf::render::Renderer;
use genpdf::style::{Color, Style};
use genpdf::{Mm, Position, Size};

use crate::document::{Block, Document, Rgb, STROKE_SPACING_MM};
use crate::error::ReportError;

/// Font directories to search on different platforms
const FONT_DIRS: &[&str] = &[
    "./fonts",
    "/usr/share/fonts/liberation",
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/liberation-sans",
    "/usr/share/fonts/TTF",
    "/System/Library/Fonts",
    "/Library/Fonts",
    "/System/Library/Fonts/Supplemental",
];

const FONT_FAMILY: &str = "LiberationSans";

/// Fonts directory shipped next to the crate, if present
fn crate_fonts_dir() -> Option<PathBuf> {
    let fonts_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fonts");
    fonts_dir.exists().then_some(fonts_dir)
}

/// Pure Rust PDF renderer using genpdf
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    font_dirs: Vec<PathBuf>,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfRenderer {
    /// Renderer searching the crate fonts directory, then system directories
    pub fn new() -> Self {
        let mut font_dirs: Vec<PathBuf> = FONT_DIRS.iter().map(PathBuf::from).collect();
        if let Some(crate_fonts) = crate_fonts_dir() {
            font_dirs.insert(0, crate_fonts);
        }
        Self { font_dirs }
    }

    /// Search `dir` before every other location
    pub fn with_font_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.font_dirs.insert(0, dir.into());
        self
    }

    pub fn font_dirs(&self) -> &[PathBuf] {
        &self.font_dirs
    }

    /// Directory holding a loadable Liberation Sans family, if any
    pub fn find_font_dir(&self) -> Option<&Path> {
        self.font_dirs
            .iter()
            .filter(|dir| dir.exists())
            .find(|dir| load_family(dir).is_some())
            .map(PathBuf::as_path)
    }

    fn load_fonts(&self) -> Result<FontFamily<FontData>, ReportError> {
        self.font_dirs
            .iter()
            .filter(|dir| dir.exists())
            .find_map(|dir| load_family(dir))
            .ok_or_else(|| ReportError::FontsNotFound {
                searched: self.font_dirs.clone(),
            })
    }

    /// Render a sealed document to PDF bytes. Nothing is written anywhere;
    /// the caller decides where complete output goes.
    pub fn render(&self, document: &Document) -> Result<Vec<u8>, ReportError> {
        let pages = document.pages();
        let first = pages.first().ok_or(ReportError::EmptyDocument)?;

        let family = self.load_fonts()?;
        let mut renderer = Renderer::new(size(first.width(), first.height()), document.title())?;
        for page in &pages[1..] {
            renderer.add_page(size(page.width(), page.height()));
        }

        let mut font_cache = FontCache::new(family);
        font_cache.load_pdf_fonts(&renderer)?;

        for (index, page) in pages.iter().enumerate() {
            let pdf_page = renderer
                .get_page(index)
                .ok_or(ReportError::EmptyDocument)?;
            let area = pdf_page.first_layer().area();

            for block in page.blocks() {
                match block {
                    Block::Text(text) => {
                        let mut style = Style::new()
                            .with_font_size(text.font_size)
                            .with_color(color(text.color));
                        if text.bold {
                            style = style.bold();
                        }
                        area.print_str(&font_cache, position(text.x, text.y), style, &text.text)?;
                    }
                    Block::Line(line) => {
                        // Stroke width is fixed by genpdf; weight comes from repeated strokes
                        for stroke in 0..line.strokes.max(1) {
                            let dy = f64::from(stroke) * STROKE_SPACING_MM;
                            area.draw_line(
                                vec![
                                    position(line.x1, line.y1 + dy),
                                    position(line.x2, line.y2 + dy),
                                ],
                                Style::new().with_color(color(line.color)),
                            );
                        }
                    }
                }
            }
        }

        let mut bytes = Vec::new();
        renderer.write(&mut bytes)?;
        tracing::debug!(
            pages = pages.len(),
            bytes = bytes.len(),
            "Rendered PDF"
        );
        Ok(bytes)
    }
}

/// Liberation fonts must be embedded (no builtin) for Unicode support
fn load_family(dir: &Path) -> Option<FontFamily<FontData>> {
    fonts::from_files(dir, FONT_FAMILY, None).ok()
}

fn size(width: f64, height: f64) -> Size {
    Size::new(Mm::from(width), Mm::from(height))
}

fn position(x: f64, y: f64) -> Position {
    Position::new(Mm::from(x), Mm::from(y))
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_font_dir_searched_first() {
        let renderer = PdfRenderer::new().with_font_dir("/opt/dossier/fonts");
        assert_eq!(renderer.font_dirs()[0], PathBuf::from("/opt/dossier/fonts"));
        assert!(renderer
            .font_dirs()
            .contains(&PathBuf::from("/usr/share/fonts/truetype/liberation")));
    }

    #[test]
    fn test_empty_document_is_rejected() {
        let renderer = PdfRenderer::new();
        let err = renderer.render(&Document::new("empty")).unwrap_err();
        assert!(matches!(err, ReportError::EmptyDocument));
    }

    #[test]
    fn test_missing_fonts_reported_with_search_path() {
        let renderer = PdfRenderer {
            font_dirs: vec![PathBuf::from("/nonexistent/fonts")],
        };
        assert!(renderer.find_font_dir().is_none());
        let config = crate::config::LayoutConfig::default();
        let mut document = Document::new("doc");
        let mut page = crate::document::Page::new(0, crate::document::Orientation::Portrait, &config);
        page.place_header(Vec::new()).unwrap();
        document.push_page(page);
        let err = renderer.render(&document).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/fonts"));
    }
}
