//! Layout configuration
//!
//! YAML/JSON configuration for page geometry, typography and the findings
//! table. Every field has a default, so an empty file is a valid config.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, ReportError};

/// Top-level layout configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Portrait page geometry; landscape pages swap width and height
    pub page: PageConfig,

    /// Height reserved at the top of every page for the running header
    pub header_band_mm: f64,

    /// Height reserved at the bottom of every page for the footer
    pub footer_band_mm: f64,

    pub fonts: FontSizes,

    /// Line height as a multiple of the font size
    pub line_spacing: f64,

    /// Vertical gap after headings, paragraphs and lists
    pub block_gap_mm: f64,

    /// Horizontal gutter between the two columns of a balanced list
    pub column_gutter_mm: f64,

    pub table: TableConfig,

    /// Extra directory searched first for Liberation Sans font files
    pub font_dir: Option<PathBuf>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page: PageConfig::default(),
            header_band_mm: 12.0,
            footer_band_mm: 10.0,
            fonts: FontSizes::default(),
            line_spacing: 1.3,
            block_gap_mm: 3.0,
            column_gutter_mm: 8.0,
            table: TableConfig::default(),
            font_dir: None,
        }
    }
}

impl LayoutConfig {
    /// Load from YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self, ReportError> {
        let content = read_config(path)?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| ReportError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from JSON file
    pub fn from_json_file(path: &Path) -> Result<Self, ReportError> {
        let content = read_config(path)?;
        let config: Self =
            serde_json::from_str(&content).map_err(|e| ReportError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load by file extension: `.json` is JSON, anything else is YAML
    pub fn load(path: &Path) -> Result<Self, ReportError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_file(path),
            _ => Self::from_yaml_file(path),
        }
    }

    /// Reject geometry that leaves no room for content
    pub fn validate(&self) -> Result<(), LayoutError> {
        let invalid = |msg: String| Err(LayoutError::InvalidConfig(msg));

        let page = &self.page;
        if !(page.width_mm > 0.0 && page.height_mm > 0.0) {
            return invalid(format!(
                "page size must be positive, got {}x{} mm",
                page.width_mm, page.height_mm
            ));
        }
        if !(page.margin_mm >= 0.0) {
            return invalid(format!("margin must be non-negative, got {}", page.margin_mm));
        }
        let narrow = page.width_mm.min(page.height_mm);
        if 2.0 * page.margin_mm >= narrow {
            return invalid(format!(
                "margins of {} mm leave no width on a {} mm page",
                page.margin_mm, narrow
            ));
        }
        if !(self.header_band_mm >= 0.0 && self.footer_band_mm >= 0.0) {
            return invalid("header and footer bands must be non-negative".to_string());
        }
        let vertical = 2.0 * page.margin_mm + self.header_band_mm + self.footer_band_mm;
        if vertical >= narrow {
            return invalid(format!(
                "margins and bands ({} mm) leave no safe area on a {} mm page",
                vertical, narrow
            ));
        }
        if !(self.line_spacing > 0.0) {
            return invalid(format!("line spacing must be positive, got {}", self.line_spacing));
        }
        if !(self.block_gap_mm >= 0.0 && self.column_gutter_mm >= 0.0) {
            return invalid("gaps must be non-negative".to_string());
        }
        let fonts = &self.fonts;
        if [fonts.title, fonts.heading, fonts.body, fonts.table, fonts.footer].contains(&0) {
            return invalid("font sizes must be at least 1 pt".to_string());
        }

        let table = &self.table;
        if !(table.min_row_height_mm > 0.0) {
            return invalid("table.min_row_height_mm must be positive".to_string());
        }
        if table.max_row_height_mm < table.min_row_height_mm {
            return invalid(format!(
                "table.max_row_height_mm ({}) is below table.min_row_height_mm ({})",
                table.max_row_height_mm, table.min_row_height_mm
            ));
        }
        if !(table.cell_padding_mm >= 0.0 && table.absolute_min_column_mm > 0.0) {
            return invalid("table padding and absolute column minimum are invalid".to_string());
        }
        if table.columns.is_empty() {
            return invalid("table.columns must not be empty".to_string());
        }
        for column in &table.columns {
            if !(column.min_width_mm >= 0.0) || !(column.weight >= 0.0) || !column.weight.is_finite()
            {
                return invalid(format!(
                    "column '{}' needs a non-negative min width and finite weight",
                    column.label
                ));
            }
        }
        Ok(())
    }

    /// Row-height clamp actually applied on a page whose safe area is
    /// `safe_height` tall, given the measured table header row.
    ///
    /// A single row can never be taller than what fits below a header on a
    /// fresh page, so pagination always makes progress.
    pub fn effective_row_clamp(&self, safe_height: f64, header_row_height: f64) -> f64 {
        let room = (safe_height - header_row_height).max(self.table.min_row_height_mm);
        self.table.max_row_height_mm.min(room)
    }

    /// Line height in mm for a font size in points
    pub fn line_height(&self, font_size: u8) -> f64 {
        crate::metrics::pt_to_mm(f64::from(font_size)) * self.line_spacing
    }
}

fn read_config(path: &Path) -> Result<String, ReportError> {
    std::fs::read_to_string(path).map_err(|source| ReportError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Portrait page geometry in millimetres (A4 by default)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub width_mm: f64,
    pub height_mm: f64,
    pub margin_mm: f64,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            width_mm: 210.0,
            height_mm: 297.0,
            margin_mm: 15.0,
        }
    }
}

/// Font sizes in points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSizes {
    pub title: u8,
    pub heading: u8,
    pub body: u8,
    pub table: u8,
    pub footer: u8,
}

impl Default for FontSizes {
    fn default() -> Self {
        Self {
            title: 20,
            heading: 13,
            body: 10,
            table: 8,
            footer: 7,
        }
    }
}

/// Findings table configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub min_row_height_mm: f64,

    /// Upper bound on a single row; taller content is clipped
    pub max_row_height_mm: f64,

    pub cell_padding_mm: f64,

    /// Floor applied when even the column minimums do not fit
    pub absolute_min_column_mm: f64,

    pub columns: Vec<ColumnSpec>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            min_row_height_mm: 7.0,
            max_row_height_mm: 60.0,
            cell_padding_mm: 1.5,
            absolute_min_column_mm: 6.0,
            columns: default_columns(),
        }
    }
}

/// Configuration for a single findings table column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Finding field shown in this column
    pub key: ColumnKey,

    /// Header text
    pub label: String,

    #[serde(default)]
    pub min_width_mm: f64,

    /// Target share of the available width
    #[serde(default)]
    pub weight: f64,

    /// Shave order when widths overflow; lower goes first, `None` is rigid
    #[serde(default)]
    pub flex_priority: Option<u8>,
}

impl ColumnSpec {
    fn new(key: ColumnKey, label: &str, min_width_mm: f64, weight: f64) -> Self {
        Self {
            key,
            label: label.to_string(),
            min_width_mm,
            weight,
            flex_priority: None,
        }
    }

    fn flexible(mut self, priority: u8) -> Self {
        self.flex_priority = Some(priority);
        self
    }
}

/// Finding fields a table column can show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKey {
    Id,
    Category,
    Description,
    Probability,
    Impact,
    Score,
    Trigger,
    Mitigation,
    Evidence,
}

fn default_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new(ColumnKey::Id, "ID", 10.0, 0.04),
        ColumnSpec::new(ColumnKey::Category, "Category", 20.0, 0.09),
        ColumnSpec::new(ColumnKey::Description, "Description", 30.0, 0.18).flexible(1),
        ColumnSpec::new(ColumnKey::Probability, "Probability", 16.0, 0.08),
        ColumnSpec::new(ColumnKey::Impact, "Impact", 14.0, 0.07),
        ColumnSpec::new(ColumnKey::Score, "Score", 10.0, 0.04),
        ColumnSpec::new(ColumnKey::Trigger, "Trigger", 20.0, 0.11).flexible(4),
        ColumnSpec::new(ColumnKey::Mitigation, "Mitigation", 30.0, 0.20).flexible(2),
        ColumnSpec::new(ColumnKey::Evidence, "Evidence", 30.0, 0.19).flexible(3),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = LayoutConfig::default();
        assert!(config.validate().is_ok());
        let weights: f64 = config.table.columns.iter().map(|c| c.weight).sum();
        assert!((weights - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_yaml_overrides_merge_with_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "page:\n  margin_mm: 20\nfonts:\n  body: 11\ntable:\n  max_row_height_mm: 40"
        )
        .unwrap();

        let config = LayoutConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.page.margin_mm, 20.0);
        assert_eq!(config.page.width_mm, 210.0);
        assert_eq!(config.fonts.body, 11);
        assert_eq!(config.fonts.title, 20);
        assert_eq!(config.table.max_row_height_mm, 40.0);
        assert_eq!(config.table.columns.len(), 9);
    }

    #[test]
    fn test_json_loaded_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"line_spacing": 1.5, "font_dir": "/opt/fonts"}}"#).unwrap();

        let config = LayoutConfig::load(file.path()).unwrap();
        assert_eq!(config.line_spacing, 1.5);
        assert_eq!(config.font_dir, Some(PathBuf::from("/opt/fonts")));
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        let mut config = LayoutConfig::default();
        config.page.margin_mm = 120.0;
        assert!(config.validate().is_err());

        let mut config = LayoutConfig::default();
        config.header_band_mm = 150.0;
        config.footer_band_mm = 50.0;
        assert!(config.validate().is_err());

        let mut config = LayoutConfig::default();
        config.table.max_row_height_mm = 2.0;
        assert!(config.validate().is_err());

        let mut config = LayoutConfig::default();
        config.table.columns.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = LayoutConfig::from_yaml_file(Path::new("/nonexistent/layout.yaml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/layout.yaml"));
    }

    #[test]
    fn test_effective_row_clamp_leaves_room_for_header() {
        let config = LayoutConfig::default();
        assert_eq!(config.effective_row_clamp(200.0, 8.0), 60.0);
        assert_eq!(config.effective_row_clamp(50.0, 8.0), 42.0);
        // Never below the minimum row height
        assert_eq!(config.effective_row_clamp(5.0, 8.0), 7.0);
    }
}
