use crate::config::RenderConfig;
use crate::error::CertPressError;
use crate::model::{CertType, has_cpd_units};
use std::path::{Path, PathBuf};

pub const RECOGNITION_TEMPLATE: &str = "recognition.pdf";
pub const RECOGNITION_NO_CPD_TEMPLATE: &str = "recognition_no_cpd.pdf";
pub const APPEARANCE_TEMPLATE: &str = "appearance.pdf";
pub const PARTICIPATION_TEMPLATE: &str = "participation.pdf";

/// Maps certificate type and CPD eligibility to a template file. The lookup
/// is an ordered candidate list; the first file that exists wins.
#[derive(Debug, Clone)]
pub struct TemplateResolver {
    templates_dir: PathBuf,
    default_template: PathBuf,
}

impl TemplateResolver {
    pub fn new(templates_dir: impl Into<PathBuf>, default_template: impl Into<PathBuf>) -> Self {
        Self {
            templates_dir: templates_dir.into(),
            default_template: default_template.into(),
        }
    }

    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(&config.templates_dir, &config.default_template)
    }

    pub fn candidates(&self, cert_type: CertType, has_cpd: bool) -> Vec<PathBuf> {
        let names: &[&str] = match (cert_type, has_cpd) {
            (CertType::Recognition, true) => &[RECOGNITION_TEMPLATE],
            (CertType::Recognition, false) => &[RECOGNITION_NO_CPD_TEMPLATE, RECOGNITION_TEMPLATE],
            (CertType::Appearance, _) => &[APPEARANCE_TEMPLATE],
            (CertType::Participation, _) => &[PARTICIPATION_TEMPLATE],
        };
        let mut out: Vec<PathBuf> = names.iter().map(|n| self.templates_dir.join(n)).collect();
        if !out.contains(&self.default_template) {
            out.push(self.default_template.clone());
        }
        out
    }

    pub fn resolve(&self, cert_type: &str, cpd_units: Option<&str>) -> Result<PathBuf, CertPressError> {
        let candidates = self.candidates(CertType::parse(cert_type), has_cpd_units(cpd_units));
        match candidates.iter().find(|p| is_readable_file(p)) {
            Some(path) => Ok(path.clone()),
            None => Err(CertPressError::TemplateNotFound { tried: candidates }),
        }
    }
}

fn is_readable_file(path: &Path) -> bool {
    std::fs::File::open(path)
        .and_then(|f| f.metadata())
        .map(|m| m.is_file())
        .unwrap_or(false)
}
