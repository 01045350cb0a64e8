use crate::acroform::AcroForm;
use lopdf::{Document as LoDocument, Object as LoObject};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PdfInspectErrorCode {
    PdfParseFailed,
    PdfEmptyOrNoPages,
    PdfIoError,
}

impl PdfInspectErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PdfInspectErrorCode::PdfParseFailed => "PDF_PARSE_FAILED",
            PdfInspectErrorCode::PdfEmptyOrNoPages => "PDF_EMPTY_OR_NO_PAGES",
            PdfInspectErrorCode::PdfIoError => "PDF_IO_ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfInspectError {
    pub code: PdfInspectErrorCode,
    pub message: String,
}

impl std::fmt::Display for PdfInspectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for PdfInspectError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdfInspectReport {
    pub pdf_version: String,
    pub page_count: usize,
    pub encrypted: bool,
    pub form_field_count: usize,
    pub signature_count: usize,
    pub file_size_bytes: usize,
}

impl PdfInspectReport {
    pub fn is_signed(&self) -> bool {
        self.signature_count > 0
    }

    /// Flattened output keeps no interactive fields.
    pub fn is_flattened(&self) -> bool {
        self.form_field_count == 0
    }
}

fn is_signature_dict(object: &LoObject) -> bool {
    let LoObject::Dictionary(dict) = object else {
        return false;
    };
    let typed_sig = dict
        .get(b"Type")
        .and_then(|t| t.as_name())
        .map(|name| name == b"Sig")
        .unwrap_or(false);
    typed_sig && dict.has(b"ByteRange") && dict.has(b"Contents")
}

pub fn inspect_pdf_bytes(bytes: &[u8]) -> Result<PdfInspectReport, PdfInspectError> {
    let pdf = LoDocument::load_mem(bytes).map_err(|err| PdfInspectError {
        code: PdfInspectErrorCode::PdfParseFailed,
        message: err.to_string(),
    })?;

    let page_count = pdf.get_pages().len();
    if page_count == 0 {
        return Err(PdfInspectError {
            code: PdfInspectErrorCode::PdfEmptyOrNoPages,
            message: "pdf has no pages".to_string(),
        });
    }

    let signature_count = pdf.objects.values().filter(|o| is_signature_dict(o)).count();
    // Signature widgets are form fields too; only count the fillable ones.
    let form_field_count = AcroForm::read(&pdf)
        .fields()
        .iter()
        .filter(|field| !field.is_signature())
        .count();

    Ok(PdfInspectReport {
        pdf_version: pdf.version.clone(),
        page_count,
        encrypted: pdf.is_encrypted(),
        form_field_count,
        signature_count,
        file_size_bytes: bytes.len(),
    })
}

pub fn inspect_pdf_path(path: &Path) -> Result<PdfInspectReport, PdfInspectError> {
    let data = std::fs::read(path).map_err(|err| PdfInspectError {
        code: PdfInspectErrorCode::PdfIoError,
        message: format!("{}: {}", path.display(), err),
    })?;
    inspect_pdf_bytes(&data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acroform::fixtures::{FieldSpec, form_document};
    use crate::pdf::fixtures::blank_document;
    use crate::pdf::save_document;
    use std::io::Write;

    #[test]
    fn inspect_pdf_bytes_reads_version_and_page_count() {
        let (mut doc, _) = blank_document(612, 792, false);
        let bytes = save_document(&mut doc).expect("save");
        let report = inspect_pdf_bytes(&bytes).expect("inspect");
        assert_eq!(report.page_count, 1);
        assert!(!report.encrypted);
        assert_eq!(report.file_size_bytes, bytes.len());
        assert!(!report.pdf_version.is_empty());
        assert!(report.is_flattened());
        assert!(!report.is_signed());
    }

    #[test]
    fn counts_remaining_form_fields() {
        let (mut doc, _) = form_document(&[
            FieldSpec::new("PARTICIPANT_NAME", [100.0, 400.0, 500.0, 440.0]),
            FieldSpec::new("EVENT_NAME", [100.0, 300.0, 500.0, 330.0]),
        ]);
        let bytes = save_document(&mut doc).expect("save");
        let report = inspect_pdf_bytes(&bytes).expect("inspect");
        assert_eq!(report.form_field_count, 2);
        assert!(!report.is_flattened());
    }

    #[test]
    fn inspect_pdf_bytes_rejects_malformed_data() {
        let err = inspect_pdf_bytes(b"not a pdf").expect_err("invalid");
        assert_eq!(err.code, PdfInspectErrorCode::PdfParseFailed);
    }

    #[test]
    fn inspect_pdf_path_reports_io_error_for_missing_file() {
        let missing = std::env::temp_dir().join(format!(
            "certpress_pdfinspect_missing_{}_{}.pdf",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        let err = inspect_pdf_path(&missing).expect_err("missing");
        assert_eq!(err.code, PdfInspectErrorCode::PdfIoError);
        assert!(err.message.contains("certpress_pdfinspect_missing"));
    }

    #[test]
    fn inspect_pdf_path_matches_bytes_report() {
        let (mut doc, _) = blank_document(595, 842, true);
        let bytes = save_document(&mut doc).expect("save");
        let temp_dir = std::env::temp_dir().join(format!(
            "certpress_pdfinspect_path_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&temp_dir).expect("mkdir");
        let path = temp_dir.join("one.pdf");
        let mut f = std::fs::File::create(&path).expect("create");
        f.write_all(&bytes).expect("write");

        let from_path = inspect_pdf_path(&path).expect("inspect path");
        let from_bytes = inspect_pdf_bytes(&bytes).expect("inspect bytes");
        assert_eq!(from_path, from_bytes);
        let _ = std::fs::remove_dir_all(&temp_dir);
    }
}
