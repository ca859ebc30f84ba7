//! Laid-out document model
//!
//! A `Document` is a list of pages whose blocks carry absolute positions in
//! millimetres from the page's top-left corner. Each page walks a one-way
//! state machine:
//!
//! `Empty -> HeaderPlaced -> ContentFlowing -> FooterReserved -> Sealed`
//!
//! Illegal transitions and writes to a reserved or sealed page are
//! `LayoutError`s; they indicate a bug in the composer, never bad input.

use crate::config::{LayoutConfig, PageConfig};
use crate::error::LayoutError;
use crate::paginate::SafeArea;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// Page width and height in mm
    pub fn dimensions(self, page: &PageConfig) -> (f64, f64) {
        match self {
            Orientation::Portrait => (page.width_mm, page.height_mm),
            Orientation::Landscape => (page.height_mm, page.width_mm),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    Empty,
    HeaderPlaced,
    ContentFlowing,
    FooterReserved,
    Sealed,
}

impl PageState {
    pub fn can_become(self, next: PageState) -> bool {
        use PageState::*;
        matches!(
            (self, next),
            (Empty, HeaderPlaced)
                | (HeaderPlaced, ContentFlowing)
                | (ContentFlowing, ContentFlowing)
                | (HeaderPlaced, FooterReserved)
                | (ContentFlowing, FooterReserved)
                | (FooterReserved, Sealed)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const GREY: Rgb = Rgb(110, 110, 110);
    pub const RULE: Rgb = Rgb(170, 170, 170);
    pub const RED: Rgb = Rgb(176, 32, 32);
    pub const AMBER: Rgb = Rgb(196, 120, 0);
    pub const GREEN: Rgb = Rgb(30, 120, 60);
}

/// A single line of text. `y` is the top of the line box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub x: f64,
    pub y: f64,
    /// Line box height
    pub height: f64,
    pub text: String,
    pub font_size: u8,
    pub bold: bool,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineBlock {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    /// Parallel strokes drawn `STROKE_SPACING_MM` apart, downwards
    pub strokes: u8,
    pub color: Rgb,
}

/// Distance between the strokes of a heavy rule
pub const STROKE_SPACING_MM: f64 = 0.2;

/// Positioned drawing primitive
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Text(TextBlock),
    Line(LineBlock),
}

impl Block {
    pub fn text(x: f64, y: f64, height: f64, text: impl Into<String>, font_size: u8) -> Self {
        Block::Text(TextBlock {
            x,
            y,
            height,
            text: text.into(),
            font_size,
            bold: false,
            color: Rgb::BLACK,
        })
    }

    pub fn rule(x1: f64, x2: f64, y: f64) -> Self {
        Block::Line(LineBlock {
            x1,
            y1: y,
            x2,
            y2: y,
            strokes: 1,
            color: Rgb::RULE,
        })
    }

    /// Double-stroked rule
    pub fn heavy(mut self) -> Self {
        if let Block::Line(line) = &mut self {
            line.strokes = 2;
        }
        self
    }

    pub fn bold(mut self) -> Self {
        if let Block::Text(text) = &mut self {
            text.bold = true;
        }
        self
    }

    pub fn colored(mut self, rgb: Rgb) -> Self {
        match &mut self {
            Block::Text(text) => text.color = rgb,
            Block::Line(line) => line.color = rgb,
        }
        self
    }

    /// Vertical extent `(top, bottom)`
    pub fn vertical_span(&self) -> (f64, f64) {
        match self {
            Block::Text(text) => (text.y, text.y + text.height),
            Block::Line(line) => {
                let spread = f64::from(line.strokes.saturating_sub(1)) * STROKE_SPACING_MM;
                (line.y1.min(line.y2), line.y1.max(line.y2) + spread)
            }
        }
    }
}

/// Footer of a sealed page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footer {
    pub page_number: usize,
    pub page_count: usize,
    pub fingerprint: String,
}

impl Footer {
    pub fn page_label(&self) -> String {
        format!("Page {} of {}", self.page_number, self.page_count)
    }
}

#[derive(Debug, Clone)]
pub struct Page {
    index: usize,
    orientation: Orientation,
    width: f64,
    height: f64,
    safe_area: SafeArea,
    state: PageState,
    header: Vec<Block>,
    content: Vec<Block>,
    footer_blocks: Vec<Block>,
    footer: Option<Footer>,
}

impl Page {
    pub fn new(index: usize, orientation: Orientation, config: &LayoutConfig) -> Self {
        let (width, height) = orientation.dimensions(&config.page);
        Self {
            index,
            orientation,
            width,
            height,
            safe_area: SafeArea::for_page(config, width, height),
            state: PageState::Empty,
            header: Vec::new(),
            content: Vec::new(),
            footer_blocks: Vec::new(),
            footer: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn safe_area(&self) -> SafeArea {
        self.safe_area
    }

    pub fn state(&self) -> PageState {
        self.state
    }

    pub fn header_blocks(&self) -> &[Block] {
        &self.header
    }

    pub fn content_blocks(&self) -> &[Block] {
        &self.content
    }

    pub fn footer_blocks(&self) -> &[Block] {
        &self.footer_blocks
    }

    pub fn footer(&self) -> Option<&Footer> {
        self.footer.as_ref()
    }

    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }

    /// All blocks in paint order
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.header
            .iter()
            .chain(self.content.iter())
            .chain(self.footer_blocks.iter())
    }

    fn transition(&mut self, next: PageState) -> Result<(), LayoutError> {
        if !self.state.can_become(next) {
            return Err(LayoutError::IllegalTransition {
                page: self.index,
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    pub fn place_header(&mut self, blocks: Vec<Block>) -> Result<(), LayoutError> {
        self.transition(PageState::HeaderPlaced)?;
        self.header = blocks;
        Ok(())
    }

    /// Add flowing content. Only valid between header placement and footer reservation.
    pub fn push(&mut self, block: Block) -> Result<(), LayoutError> {
        match self.state {
            PageState::HeaderPlaced | PageState::ContentFlowing => {
                self.transition(PageState::ContentFlowing)?;
                self.content.push(block);
                Ok(())
            }
            state => Err(LayoutError::NotWritable {
                page: self.index,
                state,
            }),
        }
    }

    /// Turn a page that holds no content yet; its header must be placed again.
    pub fn reorient(
        &mut self,
        orientation: Orientation,
        config: &LayoutConfig,
    ) -> Result<(), LayoutError> {
        if self.has_content() || !matches!(self.state, PageState::Empty | PageState::HeaderPlaced)
        {
            return Err(LayoutError::NotWritable {
                page: self.index,
                state: self.state,
            });
        }
        *self = Page::new(self.index, orientation, config);
        Ok(())
    }

    pub fn reserve_footer(&mut self) -> Result<(), LayoutError> {
        self.transition(PageState::FooterReserved)
    }

    pub fn seal(&mut self, footer: Footer, blocks: Vec<Block>) -> Result<(), LayoutError> {
        self.transition(PageState::Sealed)?;
        self.footer = Some(footer);
        self.footer_blocks = blocks;
        Ok(())
    }
}

/// A fully laid-out document ready for rendering
#[derive(Debug, Clone)]
pub struct Document {
    title: String,
    pages: Vec<Page>,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            pages: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// True once every page is sealed
    pub fn is_complete(&self) -> bool {
        !self.pages.is_empty() && self.pages.iter().all(|p| p.state == PageState::Sealed)
    }

    pub(crate) fn push_page(&mut self, page: Page) {
        self.pages.push(page);
    }

    pub(crate) fn page_mut(&mut self, index: usize) -> Option<&mut Page> {
        self.pages.get_mut(index)
    }

    pub(crate) fn last_page_mut(&mut self) -> Option<&mut Page> {
        self.pages.last_mut()
    }

    pub(crate) fn pages_mut(&mut self) -> &mut [Page] {
        &mut self.pages
    }

    pub(crate) fn pop_page(&mut self) -> Option<Page> {
        self.pages.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Page {
        Page::new(0, Orientation::Portrait, &LayoutConfig::default())
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut page = page();
        assert_eq!(page.state(), PageState::Empty);
        page.place_header(vec![]).unwrap();
        page.push(Block::text(15.0, 30.0, 4.0, "hello", 10)).unwrap();
        page.push(Block::text(15.0, 34.0, 4.0, "world", 10)).unwrap();
        assert_eq!(page.state(), PageState::ContentFlowing);
        page.reserve_footer().unwrap();
        let footer = Footer {
            page_number: 1,
            page_count: 1,
            fingerprint: "abcd".to_string(),
        };
        page.seal(footer, vec![]).unwrap();
        assert_eq!(page.state(), PageState::Sealed);
        assert_eq!(page.footer().unwrap().page_label(), "Page 1 of 1");
    }

    #[test]
    fn test_sealed_page_rejects_content() {
        let mut page = page();
        page.place_header(vec![]).unwrap();
        page.reserve_footer().unwrap();
        assert!(matches!(
            page.push(Block::text(0.0, 0.0, 1.0, "late", 10)),
            Err(LayoutError::NotWritable {
                state: PageState::FooterReserved,
                ..
            })
        ));
        let footer = Footer {
            page_number: 1,
            page_count: 1,
            fingerprint: String::new(),
        };
        page.seal(footer.clone(), vec![]).unwrap();
        assert!(page.push(Block::text(0.0, 0.0, 1.0, "late", 10)).is_err());
        assert!(page.seal(footer, vec![]).is_err());
    }

    #[test]
    fn test_content_requires_header() {
        let mut page = page();
        assert!(page.push(Block::text(0.0, 0.0, 1.0, "early", 10)).is_err());
        assert!(page.reserve_footer().is_err());
    }

    #[test]
    fn test_reorient_only_without_content() {
        let config = LayoutConfig::default();
        let mut page = page();
        page.place_header(vec![]).unwrap();
        page.reorient(Orientation::Landscape, &config).unwrap();
        assert_eq!(page.state(), PageState::Empty);
        assert_eq!(page.width(), 297.0);

        page.place_header(vec![]).unwrap();
        page.push(Block::rule(15.0, 100.0, 40.0)).unwrap();
        assert!(page.reorient(Orientation::Portrait, &config).is_err());
    }

    #[test]
    fn test_transition_table() {
        use PageState::*;
        assert!(Empty.can_become(HeaderPlaced));
        assert!(!Empty.can_become(ContentFlowing));
        assert!(!Sealed.can_become(ContentFlowing));
        assert!(!FooterReserved.can_become(ContentFlowing));
        assert!(!Sealed.can_become(Empty));
    }

    #[test]
    fn test_heavy_rule_spans_its_strokes() {
        let light = Block::rule(15.0, 195.0, 50.0);
        assert_eq!(light.vertical_span(), (50.0, 50.0));

        let heavy = Block::rule(15.0, 195.0, 50.0).heavy();
        match &heavy {
            Block::Line(line) => assert_eq!(line.strokes, 2),
            Block::Text(_) => panic!("expected a line"),
        }
        let (top, bottom) = heavy.vertical_span();
        assert_eq!(top, 50.0);
        assert!((bottom - (50.0 + STROKE_SPACING_MM)).abs() < 1e-9);

        // Only lines carry strokes
        assert_eq!(Block::text(0.0, 0.0, 4.0, "x", 10).heavy().vertical_span(), (0.0, 4.0));
    }
}
