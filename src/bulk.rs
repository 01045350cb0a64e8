//! Sequential bulk signing. Every item is signed on its own; one failure is
//! recorded and the loop moves on.

use crate::error::CertPressError;
use crate::sign::PdfSigner;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A rendered certificate waiting for its signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCertificate {
    pub certificate_number: String,
    pub pdf_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSignOutcome {
    pub certificate_number: String,
    pub source: PathBuf,
    pub signed_path: Option<PathBuf>,
    pub sha256: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkSignReport {
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<BulkSignOutcome>,
}

/// `<dir>/<stem>_signed.pdf` next to `source`.
pub fn signed_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "certificate".to_string());
    source.with_file_name(format!("{}_signed.pdf", stem))
}

fn sign_one(signer: &PdfSigner, item: &IssuedCertificate) -> Result<(PathBuf, String), CertPressError> {
    if !item.pdf_path.is_file() {
        return Err(CertPressError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("source PDF not found: {}", item.pdf_path.display()),
        )));
    }
    let bytes = fs::read(&item.pdf_path)?;
    let signed = signer.sign(&bytes)?;
    let out = signed_path(&item.pdf_path);
    fs::write(&out, &signed.bytes)?;
    Ok((out, signed.sha256))
}

pub fn sign_all(signer: &PdfSigner, items: &[IssuedCertificate]) -> BulkSignReport {
    let mut report = BulkSignReport::default();
    for item in items {
        let outcome = match sign_one(signer, item) {
            Ok((path, sha256)) => {
                report.succeeded += 1;
                info!(
                    certificate = %item.certificate_number,
                    path = %path.display(),
                    "signed"
                );
                BulkSignOutcome {
                    certificate_number: item.certificate_number.clone(),
                    source: item.pdf_path.clone(),
                    signed_path: Some(path),
                    sha256: Some(sha256),
                    error: None,
                }
            }
            Err(err) => {
                report.failed += 1;
                warn!(
                    certificate = %item.certificate_number,
                    error = %err,
                    "signing failed; continuing"
                );
                BulkSignOutcome {
                    certificate_number: item.certificate_number.clone(),
                    source: item.pdf_path.clone(),
                    signed_path: None,
                    sha256: None,
                    error: Some(err.to_string()),
                }
            }
        };
        report.outcomes.push(outcome);
    }
    info!(
        succeeded = report.succeeded,
        failed = report.failed,
        "bulk signing finished"
    );
    report
}
