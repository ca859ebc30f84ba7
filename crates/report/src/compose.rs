//! Document composition
//!
//! Turns the canonical model and its derived results into a paginated
//! `Document`:
//! - Portrait cover: target metadata, risk summary with reasons in two
//!   columns, scan coverage
//! - Landscape findings register, split across pages with a repeated header
//! - Portrait signals and integrity verification section
//!
//! One `LayoutEngine::compose` call owns all layout state for one document.
//! Pages are opened lazily when content needs them, so no page is ever left
//! blank.

use chrono::{DateTime, Utc};
use dossier_core::{
    CanonicalModel, Finding, IntegrityFingerprint, PageRef, RiskAssessment, RiskLevel,
    FINGERPRINT_ALGORITHM,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{ColumnKey, LayoutConfig};
use crate::document::{Block, Document, Footer, Orientation, Page, PageState, Rgb};
use crate::error::LayoutError;
use crate::metrics::{text_width, truncate_to_width, wrap};
use crate::paginate::{balance_two_columns, paginate_rows, Cursor, SafeArea};
use crate::table::{measure_row, solve_widths, Column, MeasuredRow, RowStyle};

const DOCUMENT_TITLE: &str = "Website Compliance Dossier";

/// Width of the label column in key/value listings
const LABEL_WIDTH_MM: f64 = 48.0;

/// Vertical gap between items of a two-column list
const LIST_ITEM_GAP_MM: f64 = 1.0;

/// Space between a heading's rule and the content below it
const HEADING_RULE_GAP_MM: f64 = 1.0;

// ============================================================================
// Inputs
// ============================================================================

/// Per-report metadata. Shown on the cover, never fingerprinted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationMeta {
    pub report_id: Uuid,
    pub generated_at: DateTime<Utc>,
}

impl GenerationMeta {
    pub fn new() -> Self {
        Self {
            report_id: Uuid::new_v4(),
            generated_at: Utc::now(),
        }
    }

    pub fn with_generated_at(mut self, ts: DateTime<Utc>) -> Self {
        self.generated_at = ts;
        self
    }
}

impl Default for GenerationMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the layout needs; all of it is computed before layout starts
#[derive(Debug, Clone, Copy)]
pub struct ReportInputs<'a> {
    pub model: &'a CanonicalModel,
    pub fingerprint: &'a IntegrityFingerprint,
    pub risk: &'a RiskAssessment,
    pub findings: &'a [Finding],
    pub meta: &'a GenerationMeta,
}

// ============================================================================
// Layout Engine
// ============================================================================

pub struct LayoutEngine<'c> {
    config: &'c LayoutConfig,
}

impl<'c> LayoutEngine<'c> {
    pub fn new(config: &'c LayoutConfig) -> Self {
        Self { config }
    }

    pub fn compose(&self, inputs: &ReportInputs<'_>) -> Result<Document, LayoutError> {
        self.config.validate()?;

        let target = target_name(inputs.model);
        let mut flow = Flow::new(
            self.config,
            format!("{} - {}", DOCUMENT_TITLE, target),
            format!("{} | {}", DOCUMENT_TITLE, target),
            inputs.fingerprint.short().to_string(),
        );

        self.cover(&mut flow, inputs, &target)?;
        self.findings_register(&mut flow, inputs.findings)?;
        self.signals(&mut flow, inputs)?;

        let document = flow.finish()?;
        tracing::debug!(
            pages = document.page_count(),
            findings = inputs.findings.len(),
            "Composed document"
        );
        Ok(document)
    }

    fn cover(
        &self,
        flow: &mut Flow<'_>,
        inputs: &ReportInputs<'_>,
        target: &str,
    ) -> Result<(), LayoutError> {
        let fonts = &self.config.fonts;
        let meta = &inputs.model.meta;
        let portrait = Orientation::Portrait;

        flow.paragraph(DOCUMENT_TITLE, fonts.title, true, Rgb::BLACK, portrait)?;
        flow.paragraph(target, fonts.heading, false, Rgb::GREY, portrait)?;
        flow.gap();

        flow.field("Target URL", or_none(&meta.url), portrait)?;
        flow.field("Hostname", or_none(&meta.hostname), portrait)?;
        flow.field("Scan ID", or_none(&meta.scan_id), portrait)?;
        flow.field("Scanned at", or_none(&meta.scanned_at), portrait)?;
        flow.field("Report ID", &inputs.meta.report_id.to_string(), portrait)?;
        flow.field(
            "Generated at",
            &inputs
                .meta
                .generated_at
                .format("%Y-%m-%d %H:%M:%S UTC")
                .to_string(),
            portrait,
        )?;
        flow.gap();

        let risk = inputs.risk;
        flow.heading("Risk assessment", portrait)?;
        flow.paragraph(
            &format!(
                "Overall risk: {} (score {} of {})",
                risk.level.as_str().to_uppercase(),
                risk.score,
                dossier_core::MAX_SCORE
            ),
            fonts.body,
            true,
            level_color(risk.level),
            portrait,
        )?;
        flow.two_column_list(&risk.reasons, fonts.body, portrait)?;
        flow.gap();

        let coverage = &inputs.model.coverage;
        flow.heading("Scan coverage", portrait)?;
        if coverage.is_empty() {
            flow.paragraph(
                "No pages could be retrieved. Every signal in this report is unverified and the risk level is the worst case.",
                fonts.body,
                true,
                Rgb::RED,
                portrait,
            )?;
        }
        flow.paragraph(
            &format!(
                "Checked pages: {}. Failed pages: {}.",
                coverage.checked_pages.len(),
                coverage.failed_pages.len()
            ),
            fonts.body,
            false,
            Rgb::BLACK,
            portrait,
        )?;
        for note in &coverage.notes {
            flow.paragraph(note, fonts.body, false, Rgb::GREY, portrait)?;
        }
        self.page_list(flow, "Checked", &coverage.checked_pages)?;
        self.page_list(flow, "Failed", &coverage.failed_pages)?;
        flow.gap();
        Ok(())
    }

    fn page_list(
        &self,
        flow: &mut Flow<'_>,
        label: &str,
        pages: &[PageRef],
    ) -> Result<(), LayoutError> {
        for (i, page) in pages.iter().enumerate() {
            let key = if i == 0 { label } else { "" };
            let status = if page.status == 0 {
                "no response".to_string()
            } else {
                format!("HTTP {}", page.status)
            };
            flow.field(key, &format!("{}  ({})", page.url, status), Orientation::Portrait)?;
        }
        Ok(())
    }

    fn findings_register(
        &self,
        flow: &mut Flow<'_>,
        findings: &[Finding],
    ) -> Result<(), LayoutError> {
        let config = self.config;
        let orientation = Orientation::Landscape;
        let (width, height) = orientation.dimensions(&config.page);
        let safe = SafeArea::for_page(config, width, height);

        let columns: Vec<Column> = config.table.columns.iter().map(Column::from).collect();
        let widths = solve_widths(&columns, safe.width, config.table.absolute_min_column_mm);

        let mut style = RowStyle {
            font_size: config.fonts.table,
            line_height: config.line_height(config.fonts.table),
            padding: config.table.cell_padding_mm,
            min_height: config.table.min_row_height_mm,
            max_height: config.table.max_row_height_mm,
        };
        let labels: Vec<String> = columns.iter().map(|c| c.label.clone()).collect();
        let header = measure_row(&labels, &widths, &style, true);
        style.max_height = config.effective_row_clamp(safe.height, header.height);

        let rows: Vec<MeasuredRow> = findings
            .iter()
            .map(|finding| {
                let cells: Vec<String> = config
                    .table
                    .columns
                    .iter()
                    .map(|spec| cell_text(finding, spec.key))
                    .collect();
                measure_row(&cells, &widths, &style, false)
            })
            .collect();
        let clipped = rows.iter().filter(|r| r.clipped).count();
        if clipped > 0 {
            tracing::debug!(clipped, "Findings rows clipped at the height clamp");
        }

        let keep_with = header.height + rows.first().map(|r| r.height).unwrap_or(0.0);
        flow.heading_keep(
            "Findings register",
            orientation,
            keep_with,
        )?;
        if rows.is_empty() {
            return flow.paragraph(
                "No findings.",
                config.fonts.body,
                false,
                Rgb::BLACK,
                orientation,
            );
        }

        let heights: Vec<f64> = rows.iter().map(|r| r.height).collect();
        let first_capacity = flow.remaining();
        let plan = paginate_rows(&heights, header.height, first_capacity, safe.height);

        for (i, segment) in plan.segments.iter().enumerate() {
            if i > 0 || plan.starts_on_fresh_page {
                flow.break_page(orientation)?;
            }
            flow.table_row(&header, &widths, &style, &[])?;
            for (row, finding) in rows[segment.clone()]
                .iter()
                .zip(&findings[segment.clone()])
            {
                flow.table_row(row, &widths, &style, &score_colors(finding, config))?;
            }
        }
        flow.gap();
        Ok(())
    }

    fn signals(&self, flow: &mut Flow<'_>, inputs: &ReportInputs<'_>) -> Result<(), LayoutError> {
        let portrait = Orientation::Portrait;
        let model = inputs.model;
        let signals = &model.signals;
        let images = signals.accessibility.images;

        flow.heading("Observed signals", portrait)?;
        flow.field("HTTPS", yes_no(model.meta.https), portrait)?;
        flow.field("Privacy policy", found(signals.policies.privacy), portrait)?;
        flow.field("Terms of service", found(signals.policies.terms), portrait)?;
        flow.field("Cookie policy", found(signals.policies.cookies), portrait)?;
        flow.field(
            "Consent banner",
            if signals.consent.banner_detected {
                "detected"
            } else {
                "not detected"
            },
            portrait,
        )?;
        flow.field("Consent vendors", &list(&signals.consent.vendors), portrait)?;
        flow.field("Tracking scripts", &list(&signals.tracking_scripts), portrait)?;
        flow.field(
            "Forms",
            &format!(
                "{} detected, {} personal-data field matches",
                signals.forms.detected, signals.forms.personal_data_signals
            ),
            portrait,
        )?;
        flow.field(
            "Images",
            &format!(
                "{} total, {} missing alt text ({}%)",
                images.total,
                images.missing_alt,
                images.missing_alt_percent()
            ),
            portrait,
        )?;
        flow.field(
            "Accessibility notes",
            &list(&signals.accessibility.notes),
            portrait,
        )?;
        flow.field("Contact information", found(signals.contact.detected), portrait)?;
        flow.gap();

        let body = self.config.fonts.body;
        flow.heading("Integrity verification", portrait)?;
        flow.field("Algorithm", &FINGERPRINT_ALGORITHM.to_uppercase(), portrait)?;
        flow.field("Fingerprint", inputs.fingerprint.as_str(), portrait)?;
        flow.gap();
        flow.paragraph(
            "The fingerprint is a digest of the canonical scan facts serialized with sorted keys. \
             Report identifiers, generation time, storage locations and access tokens are not part of it. \
             To verify this report, recompute the fingerprint from the stored scan facts and compare, \
             for example: dossier verify --input facts.json --expected <fingerprint>. \
             Any change to an observed fact produces a different fingerprint.",
            body,
            false,
            Rgb::BLACK,
            portrait,
        )?;
        Ok(())
    }
}

// ============================================================================
// Flow: cursor and page bookkeeping for one composition
// ============================================================================

struct Flow<'c> {
    config: &'c LayoutConfig,
    document: Document,
    running_header: String,
    fingerprint_short: String,
    cursor: Option<Cursor>,
}

impl<'c> Flow<'c> {
    fn new(
        config: &'c LayoutConfig,
        title: String,
        running_header: String,
        fingerprint_short: String,
    ) -> Self {
        Self {
            config,
            document: Document::new(title),
            running_header,
            fingerprint_short,
            cursor: None,
        }
    }

    fn current_page(&self) -> Option<&Page> {
        self.cursor.and_then(|c| self.document.pages().get(c.page))
    }

    fn safe_area(&self, orientation: Orientation) -> SafeArea {
        let (width, height) = orientation.dimensions(&self.config.page);
        SafeArea::for_page(self.config, width, height)
    }

    /// Space left below the cursor on the current page
    fn remaining(&self) -> f64 {
        match (self.current_page(), self.cursor) {
            (Some(page), Some(cursor)) => page.safe_area().remaining(cursor),
            _ => 0.0,
        }
    }

    fn header_blocks(&self, page_width: f64) -> Vec<Block> {
        let config = self.config;
        let margin = config.page.margin_mm;
        let size = config.fonts.footer;
        let line_height = config.line_height(size);
        let right = page_width - margin;
        let text = truncate_to_width(&self.running_header, right - margin, size, false);
        vec![
            Block::text(margin, margin, line_height, text, size).colored(Rgb::GREY),
            Block::rule(
                margin,
                right,
                (margin + config.header_band_mm - 2.0).max(margin + line_height),
            ),
        ]
    }

    /// Start a fresh page in `orientation`. A page that holds no content yet
    /// is turned in place rather than abandoned.
    fn break_page(&mut self, orientation: Orientation) -> Result<Cursor, LayoutError> {
        let config = self.config;
        let reuse = match self.document.last_page_mut() {
            Some(page) if page.state() == PageState::HeaderPlaced => {
                if page.orientation() != orientation {
                    page.reorient(orientation, config)?;
                }
                true
            }
            Some(page) => {
                page.reserve_footer()?;
                false
            }
            None => false,
        };

        if !reuse {
            let index = self.document.page_count();
            self.document.push_page(Page::new(index, orientation, config));
        }

        let index = self.document.page_count() - 1;
        let header = self.header_blocks(orientation.dimensions(&config.page).0);
        if let Some(page) = self.document.page_mut(index) {
            if page.state() == PageState::Empty {
                page.place_header(header)?;
            }
        }

        let top = self.safe_area(orientation).top;
        let cursor = Cursor::new(index, top);
        self.cursor = Some(cursor);
        Ok(cursor)
    }

    /// Make room for `height`, breaking to a new page when it does not fit.
    /// Content taller than a whole safe area is placed on a fresh page anyway.
    fn ensure(&mut self, height: f64, orientation: Orientation) -> Result<Cursor, LayoutError> {
        let current = self
            .current_page()
            .map(|p| (p.orientation(), p.safe_area(), p.has_content()));
        let (page_orientation, safe, has_content, cursor) = match (current, self.cursor) {
            (Some((o, safe, has_content)), Some(cursor)) => (o, safe, has_content, cursor),
            _ => return self.break_page(orientation),
        };
        if page_orientation != orientation {
            return self.break_page(orientation);
        }
        if safe.fits(cursor, height) || !has_content {
            return Ok(cursor);
        }
        self.break_page(orientation)
    }

    fn place(&mut self, block: Block) -> Result<(), LayoutError> {
        let index = self.cursor.map(|c| c.page).unwrap_or(0);
        match self.document.page_mut(index) {
            Some(page) => page.push(block),
            None => Err(LayoutError::NotWritable {
                page: index,
                state: PageState::Empty,
            }),
        }
    }

    fn advance(&mut self, dy: f64) {
        if let Some(cursor) = self.cursor.as_mut() {
            *cursor = cursor.advanced(dy);
        }
    }

    /// Vertical spacing; never opens a page by itself
    fn gap(&mut self) {
        let gap = self.config.block_gap_mm;
        let bottom = self.current_page().map(|p| p.safe_area().bottom());
        if let (Some(cursor), Some(bottom)) = (self.cursor.as_mut(), bottom) {
            cursor.y = (cursor.y + gap).min(bottom);
        }
    }

    /// Wrapped text, flowed line by line across pages
    fn paragraph(
        &mut self,
        text: &str,
        size: u8,
        bold: bool,
        color: Rgb,
        orientation: Orientation,
    ) -> Result<(), LayoutError> {
        let safe = self.safe_area(orientation);
        let line_height = self.config.line_height(size);
        for line in wrap(text, safe.width, size, bold) {
            let cursor = self.ensure(line_height, orientation)?;
            let mut block = Block::text(safe.left, cursor.y, line_height, line, size).colored(color);
            if bold {
                block = block.bold();
            }
            self.place(block)?;
            self.advance(line_height);
        }
        Ok(())
    }

    fn heading(&mut self, text: &str, orientation: Orientation) -> Result<(), LayoutError> {
        let body = self.config.line_height(self.config.fonts.body);
        self.heading_keep(text, orientation, 2.0 * body)
    }

    /// Heading kept on the same page as the next `keep_with` mm of content
    fn heading_keep(
        &mut self,
        text: &str,
        orientation: Orientation,
        keep_with: f64,
    ) -> Result<(), LayoutError> {
        let size = self.config.fonts.heading;
        let line_height = self.config.line_height(size);
        let safe = self.safe_area(orientation);
        let needed = (line_height + HEADING_RULE_GAP_MM + keep_with).min(safe.height);
        self.ensure(needed, orientation)?;
        self.paragraph(text, size, true, Rgb::BLACK, orientation)?;
        if let Some(cursor) = self.cursor {
            self.place(Block::rule(safe.left, safe.right(), cursor.y))?;
        }
        self.advance(HEADING_RULE_GAP_MM);
        Ok(())
    }

    /// Bold label in a fixed column, wrapped value beside it
    fn field(&mut self, label: &str, value: &str, orientation: Orientation) -> Result<(), LayoutError> {
        let size = self.config.fonts.body;
        let line_height = self.config.line_height(size);
        let safe = self.safe_area(orientation);
        let label_width = LABEL_WIDTH_MM.min(safe.width / 2.0);
        let lines = wrap(value, safe.width - label_width, size, false);
        let label = truncate_to_width(label, label_width - 2.0, size, true);

        for (i, line) in lines.into_iter().enumerate() {
            let cursor = self.ensure(line_height, orientation)?;
            if i == 0 && !label.is_empty() {
                self.place(Block::text(safe.left, cursor.y, line_height, label.clone(), size).bold())?;
            }
            self.place(Block::text(
                safe.left + label_width,
                cursor.y,
                line_height,
                line,
                size,
            ))?;
            self.advance(line_height);
        }
        Ok(())
    }

    /// Bulleted items balanced across two columns, continuing on new pages
    fn two_column_list(
        &mut self,
        items: &[String],
        size: u8,
        orientation: Orientation,
    ) -> Result<(), LayoutError> {
        let safe = self.safe_area(orientation);
        let line_height = self.config.line_height(size);
        let gutter = self.config.column_gutter_mm;
        let column_width = ((safe.width - gutter) / 2.0).max(1.0);

        let wrapped: Vec<Vec<String>> = items
            .iter()
            .map(|item| wrap(&format!("- {}", item), column_width, size, false))
            .collect();
        let heights: Vec<f64> = wrapped
            .iter()
            .map(|lines| lines.len() as f64 * line_height)
            .collect();

        let mut start = 0;
        while start < wrapped.len() {
            let cursor = self.ensure(heights[start], orientation)?;
            let budget = self.remaining();
            let split = balance_two_columns(&heights[start..], LIST_ITEM_GAP_MM, budget);

            for (range, x) in [
                (split.left.clone(), safe.left),
                (split.right.clone(), safe.left + column_width + gutter),
            ] {
                let mut y = cursor.y;
                for item in range {
                    for line in &wrapped[start + item] {
                        self.place(Block::text(x, y, line_height, line.clone(), size))?;
                        y += line_height;
                    }
                    y += LIST_ITEM_GAP_MM;
                }
            }

            self.advance(split.height);
            start += split.placed();
            if start < wrapped.len() {
                self.break_page(orientation)?;
            }
        }
        Ok(())
    }

    /// Draw one measured row at the cursor. Pagination has already decided it fits.
    fn table_row(
        &mut self,
        row: &MeasuredRow,
        widths: &[f64],
        style: &RowStyle,
        colors: &[Rgb],
    ) -> Result<(), LayoutError> {
        let cursor = self.cursor.unwrap_or(Cursor::new(0, 0.0));
        let page_safe = self
            .current_page()
            .map(|p| p.safe_area())
            .unwrap_or_else(|| self.safe_area(Orientation::Landscape));

        if row.bold {
            self.place(Block::rule(page_safe.left, page_safe.right(), cursor.y).heavy())?;
        }

        let mut x = page_safe.left;
        for (column, (lines, width)) in row.cells.iter().zip(widths).enumerate() {
            let color = colors.get(column).copied().unwrap_or(Rgb::BLACK);
            for (i, line) in lines.iter().enumerate() {
                let y = cursor.y + style.padding + i as f64 * style.line_height;
                let mut block =
                    Block::text(x + style.padding, y, style.line_height, line.clone(), style.font_size)
                        .colored(color);
                if row.bold {
                    block = block.bold();
                }
                self.place(block)?;
            }
            x += width;
        }

        let bottom = cursor.y + row.height;
        let mut rule = Block::rule(page_safe.left, page_safe.right(), bottom);
        if row.bold {
            rule = rule.heavy();
        }
        self.place(rule)?;
        self.advance(row.height);
        Ok(())
    }

    /// Reserve and seal footers. Footers live in their own band and never
    /// open a page.
    fn finish(mut self) -> Result<Document, LayoutError> {
        // An untouched trailing page would render blank
        if self.document.page_count() > 1 {
            let trailing_empty = self
                .document
                .pages()
                .last()
                .map(|p| !p.has_content())
                .unwrap_or(false);
            if trailing_empty {
                self.document.pop_page();
            }
        }
        if self.document.page_count() == 0 {
            self.break_page(Orientation::Portrait)?;
        }

        let config = self.config;
        let page_count = self.document.page_count();
        let fingerprint = self.fingerprint_short.clone();
        for page in self.document.pages_mut() {
            if page.state() != PageState::FooterReserved {
                page.reserve_footer()?;
            }
            let footer = Footer {
                page_number: page.index() + 1,
                page_count,
                fingerprint: fingerprint.clone(),
            };
            let blocks = footer_blocks(config, page, &footer);
            page.seal(footer, blocks)?;
        }
        Ok(self.document)
    }
}

fn footer_blocks(config: &LayoutConfig, page: &Page, footer: &Footer) -> Vec<Block> {
    let size = config.fonts.footer;
    let line_height = config.line_height(size);
    let safe = page.safe_area();
    let band_top = safe.bottom();
    let band_bottom = page.height() - config.page.margin_mm;
    let text_y = (band_bottom - line_height).max(band_top);
    let rule_y = (band_top + 1.0).min(text_y);

    let label = footer.page_label();
    let label_width = text_width(&label, size, false);
    let left_text = truncate_to_width(
        &format!("Integrity fingerprint {}", footer.fingerprint),
        (safe.width - label_width - 4.0).max(0.0),
        size,
        false,
    );

    vec![
        Block::rule(safe.left, safe.right(), rule_y),
        Block::text(safe.left, text_y, line_height, left_text, size).colored(Rgb::GREY),
        Block::text(safe.right() - label_width, text_y, line_height, label, size)
            .colored(Rgb::GREY),
    ]
}

// ============================================================================
// Helpers
// ============================================================================

fn target_name(model: &CanonicalModel) -> String {
    if !model.meta.hostname.is_empty() {
        model.meta.hostname.clone()
    } else if !model.meta.url.is_empty() {
        model.meta.url.clone()
    } else {
        "unknown target".to_string()
    }
}

fn cell_text(finding: &Finding, key: ColumnKey) -> String {
    match key {
        ColumnKey::Id => finding.id.clone(),
        ColumnKey::Category => finding.category.as_str().to_string(),
        ColumnKey::Description => finding.description.clone(),
        ColumnKey::Probability => format!("{} ({})", finding.probability.label, finding.probability.value),
        ColumnKey::Impact => format!("{} ({})", finding.impact.label, finding.impact.value),
        ColumnKey::Score => finding.score.to_string(),
        ColumnKey::Trigger => finding.trigger.clone(),
        ColumnKey::Mitigation => finding.mitigation.clone(),
        ColumnKey::Evidence => finding.evidence.clone(),
    }
}

/// Per-column text colors for a finding row; only the score is highlighted
fn score_colors(finding: &Finding, config: &LayoutConfig) -> Vec<Rgb> {
    config
        .table
        .columns
        .iter()
        .map(|spec| match spec.key {
            ColumnKey::Score if finding.score >= 15 => Rgb::RED,
            ColumnKey::Score if finding.score >= 8 => Rgb::AMBER,
            ColumnKey::Score => Rgb::GREEN,
            _ => Rgb::BLACK,
        })
        .collect()
}

fn level_color(level: RiskLevel) -> Rgb {
    match level {
        RiskLevel::High => Rgb::RED,
        RiskLevel::Medium => Rgb::AMBER,
        RiskLevel::Low => Rgb::GREEN,
    }
}

fn or_none(value: &str) -> &str {
    if value.is_empty() {
        "not recorded"
    } else {
        value
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn found(value: bool) -> &'static str {
    if value {
        "found"
    } else {
        "not found"
    }
}

fn list(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dossier_core::{assess, fingerprint, normalize_value, synthesize};
    use serde_json::json;

    fn compose_for(model: &CanonicalModel, config: &LayoutConfig) -> Document {
        let fp = fingerprint(model).unwrap();
        let risk = assess(model);
        let findings = synthesize(model);
        let meta = GenerationMeta::new();
        let inputs = ReportInputs {
            model,
            fingerprint: &fp,
            risk: &risk,
            findings: &findings,
            meta: &meta,
        };
        LayoutEngine::new(config).compose(&inputs).unwrap()
    }

    fn sample_model() -> CanonicalModel {
        normalize_value(&json!({
            "meta": {"url": "https://shop.example.com/", "scanId": "scan-7", "https": false},
            "coverage": {"checkedPages": [{"url": "https://shop.example.com/", "status": 200}]},
            "signals": {
                "trackingScripts": ["GA4"],
                "forms": {"detected": 2, "personalDataSignals": 1},
                "accessibility": {"images": {"total": 10, "missingAlt": 4}}
            }
        }))
    }

    fn all_text(document: &Document) -> Vec<String> {
        document
            .pages()
            .iter()
            .flat_map(|p| p.blocks())
            .filter_map(|b| match b {
                Block::Text(t) => Some(t.text.clone()),
                Block::Line(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_document_sections_and_orientations() {
        let document = compose_for(&sample_model(), &LayoutConfig::default());
        assert!(document.is_complete());
        assert!(document.page_count() >= 3);

        let orientations: Vec<Orientation> =
            document.pages().iter().map(|p| p.orientation()).collect();
        assert_eq!(orientations.first(), Some(&Orientation::Portrait));
        assert!(orientations.contains(&Orientation::Landscape));
        assert_eq!(orientations.last(), Some(&Orientation::Portrait));

        let text = all_text(&document);
        assert!(text.iter().any(|t| t == "Findings register"));
        assert!(text.iter().any(|t| t.starts_with("Overall risk: HIGH")));
        assert!(text.iter().any(|t| t == "F-01"));
    }

    #[test]
    fn test_every_page_has_one_footer_with_page_numbers() {
        let document = compose_for(&sample_model(), &LayoutConfig::default());
        let count = document.page_count();
        for (i, page) in document.pages().iter().enumerate() {
            let footer = page.footer().unwrap();
            assert_eq!(footer.page_number, i + 1);
            assert_eq!(footer.page_count, count);
            assert!(page.has_content(), "page {} is blank", i + 1);
        }
    }

    #[test]
    fn test_zero_coverage_warning_on_cover() {
        let model = normalize_value(&json!({"url": "https://down.example"}));
        let document = compose_for(&model, &LayoutConfig::default());
        let text = all_text(&document);
        assert!(text.iter().any(|t| t.starts_with("No pages could be retrieved")));
    }

    #[test]
    fn test_generation_meta_is_unique() {
        let a = GenerationMeta::new();
        let b = GenerationMeta::new();
        assert_ne!(a.report_id, b.report_id);
    }

    #[test]
    fn test_cell_text_formats_ratings() {
        let findings = synthesize(&sample_model());
        let coverage = &findings[0];
        assert_eq!(cell_text(coverage, ColumnKey::Id), "F-01");
        assert_eq!(cell_text(coverage, ColumnKey::Probability), "Rare (1)");
    }

    #[test]
    fn test_kept_heading_reserves_rule_gap() {
        let config = LayoutConfig::default();
        let portrait = Orientation::Portrait;
        let mut flow = Flow::new(&config, "t".into(), "h".into(), "0123456789abcdef".into());
        flow.paragraph("Intro", config.fonts.body, false, Rgb::BLACK, portrait)
            .unwrap();

        // Room for the heading line and the kept content, but not the gap below the rule
        let keep_with = 20.0;
        let heading_line = config.line_height(config.fonts.heading);
        let bottom = flow.current_page().unwrap().safe_area().bottom();
        if let Some(cursor) = flow.cursor.as_mut() {
            cursor.y = bottom - (heading_line + keep_with + HEADING_RULE_GAP_MM / 2.0);
        }

        flow.heading_keep("Register", portrait, keep_with).unwrap();
        assert_eq!(flow.cursor.unwrap().page, 1);
        assert!(flow.remaining() >= keep_with);
    }
}
