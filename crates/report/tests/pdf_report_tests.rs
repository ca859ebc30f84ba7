//! End-to-end PDF generation. Skipped when no Liberation Sans fonts are installed.

use dossier_core::{fingerprint, normalize, RawFacts};
use dossier_report::{LayoutConfig, PdfRenderer, ReportGenerator};
use serde_json::json;
use tempfile::tempdir;

fn raw() -> RawFacts {
    RawFacts::from(json!({
        "meta": {
            "url": "https://shop.example.com/",
            "scanId": "scan-0042",
            "scannedAt": "2024-05-01T10:00:00Z",
            "https": true
        },
        "coverage": {
            "checkedPages": [
                {"url": "https://shop.example.com/", "status": 200},
                {"url": "https://shop.example.com/privacy", "status": 200}
            ]
        },
        "signals": {
            "policies": {"privacy": true, "terms": false, "cookies": false},
            "consent": {"bannerDetected": false},
            "trackingScripts": ["GA4", "Meta Pixel"],
            "forms": {"detected": 2, "personalDataSignals": 1},
            "accessibility": {"images": {"total": 12, "missingAlt": 5}},
            "contact": {"detected": true}
        }
    }))
}

fn generator() -> Option<ReportGenerator> {
    let generator = ReportGenerator::new(LayoutConfig::default());
    if generator.renderer().find_font_dir().is_none() {
        eprintln!("skipping: no fonts in {:?}", generator.renderer().font_dirs());
        return None;
    }
    Some(generator)
}

#[test]
fn test_generate_produces_pdf_bytes() {
    let Some(generator) = generator() else {
        return;
    };
    let report = generator.generate(&raw()).unwrap();

    assert!(report.pdf.starts_with(b"%PDF-"));
    assert!(report.page_count >= 3);
    assert_eq!(report.fingerprint, fingerprint(&normalize(&raw())).unwrap());

    let summary = serde_json::to_value(report.summary()).unwrap();
    assert_eq!(summary["pages"], json!(report.page_count));
    assert_eq!(summary["bytes"], json!(report.pdf.len()));
}

#[tokio::test]
async fn test_generate_to_file_writes_complete_pdf() {
    let Some(generator) = generator() else {
        return;
    };
    let dir = tempdir().unwrap();
    let path = dir.path().join("out").join("dossier.pdf");

    let report = generator.generate_to_file(&raw(), &path).await.unwrap();
    let written = std::fs::read(&path).unwrap();
    assert_eq!(written, report.pdf);
}

#[tokio::test]
async fn test_failed_generation_writes_nothing() {
    let generator = ReportGenerator::new(LayoutConfig::default())
        .with_renderer(PdfRenderer::new().with_font_dir("/nonexistent/fonts"));
    if generator.renderer().find_font_dir().is_some() {
        return;
    }
    let dir = tempdir().unwrap();
    let path = dir.path().join("dossier.pdf");

    assert!(generator.generate_to_file(&raw(), &path).await.is_err());
    assert!(!path.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
