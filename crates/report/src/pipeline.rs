//! Report generation pipeline
//!
//! One generation is one synchronous pass over one record:
//! normalize -> fingerprint -> risk -> findings -> layout -> render.
//! Nothing is shared between generations, so independent requests can run
//! in parallel without coordination. The only await point is the final sink
//! write, which happens after the full byte stream exists in memory.

use std::path::Path;

use dossier_core::{
    assess, fingerprint, normalize_with_report, synthesize, CanonicalModel, Degradation, Finding,
    IntegrityFingerprint, RawFacts, RiskAssessment,
};
use serde::Serialize;

use crate::compose::{GenerationMeta, LayoutEngine, ReportInputs};
use crate::config::LayoutConfig;
use crate::document::Document;
use crate::error::ReportError;
use crate::render::PdfRenderer;
use crate::sink;

/// Everything computed for a report, short of rendering
#[derive(Debug, Clone)]
pub struct ReportPlan {
    pub model: CanonicalModel,
    pub degradations: Vec<Degradation>,
    pub fingerprint: IntegrityFingerprint,
    pub risk: RiskAssessment,
    pub findings: Vec<Finding>,
    pub meta: GenerationMeta,
    pub document: Document,
}

/// A finished report: complete PDF bytes plus the values callers persist
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub pdf: Vec<u8>,
    pub fingerprint: IntegrityFingerprint,
    pub risk: RiskAssessment,
    pub findings: Vec<Finding>,
    pub meta: GenerationMeta,
    pub page_count: usize,
}

impl GeneratedReport {
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            report_id: self.meta.report_id.to_string(),
            generated_at: self.meta.generated_at.to_rfc3339(),
            fingerprint: self.fingerprint.to_string(),
            risk: self.risk.clone(),
            findings: self.findings.len(),
            pages: self.page_count,
            bytes: self.pdf.len(),
        }
    }
}

/// JSON summary of a generation
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub report_id: String,
    pub generated_at: String,
    pub fingerprint: String,
    pub risk: RiskAssessment,
    pub findings: usize,
    pub pages: usize,
    pub bytes: usize,
}

pub struct ReportGenerator {
    config: LayoutConfig,
    renderer: PdfRenderer,
}

impl ReportGenerator {
    /// Generator using `config`; its `font_dir`, if set, is searched first
    pub fn new(config: LayoutConfig) -> Self {
        let mut renderer = PdfRenderer::new();
        if let Some(dir) = &config.font_dir {
            renderer = renderer.with_font_dir(dir.clone());
        }
        Self { config, renderer }
    }

    pub fn with_renderer(mut self, renderer: PdfRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn renderer(&self) -> &PdfRenderer {
        &self.renderer
    }

    /// Compute and lay out a report without rendering it
    pub fn plan(&self, raw: &RawFacts) -> Result<ReportPlan, ReportError> {
        self.plan_with_meta(raw, GenerationMeta::new())
    }

    pub fn plan_with_meta(
        &self,
        raw: &RawFacts,
        meta: GenerationMeta,
    ) -> Result<ReportPlan, ReportError> {
        let normalized = normalize_with_report(raw);
        let model = normalized.model;
        let fingerprint = fingerprint(&model)?;
        let risk = assess(&model);
        let findings = synthesize(&model);

        let inputs = ReportInputs {
            model: &model,
            fingerprint: &fingerprint,
            risk: &risk,
            findings: &findings,
            meta: &meta,
        };
        let document = LayoutEngine::new(&self.config).compose(&inputs)?;

        Ok(ReportPlan {
            model,
            degradations: normalized.degradations,
            fingerprint,
            risk,
            findings,
            meta,
            document,
        })
    }

    /// Plan and render. Either the full PDF is returned or an error; never partial output.
    pub fn generate(&self, raw: &RawFacts) -> Result<GeneratedReport, ReportError> {
        let plan = self.plan(raw)?;
        let pdf = self.renderer.render(&plan.document)?;

        tracing::info!(
            report_id = %plan.meta.report_id,
            fingerprint = %plan.fingerprint.short(),
            level = %plan.risk.level,
            score = plan.risk.score,
            pages = plan.document.page_count(),
            degradations = plan.degradations.len(),
            "Generated report"
        );

        Ok(GeneratedReport {
            pdf,
            page_count: plan.document.page_count(),
            fingerprint: plan.fingerprint,
            risk: plan.risk,
            findings: plan.findings,
            meta: plan.meta,
        })
    }

    /// Generate and write atomically to `path`
    pub async fn generate_to_file(
        &self,
        raw: &RawFacts,
        path: &Path,
    ) -> Result<GeneratedReport, ReportError> {
        let report = self.generate(raw)?;
        sink::write_file_atomic_async(path, &report.pdf).await?;
        Ok(report)
    }
}
