use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum CertPressError {
    TemplateNotFound { tried: Vec<PathBuf> },
    CertificateGeneration { stage: &'static str, cause: String },
    CredentialNotFound(PathBuf),
    Signing(String),
    InvalidConfiguration(String),
    Pdf(String),
    Io(std::io::Error),
}

impl CertPressError {
    pub(crate) fn generation(stage: &'static str, cause: impl fmt::Display) -> Self {
        CertPressError::CertificateGeneration {
            stage,
            cause: cause.to_string(),
        }
    }

    pub(crate) fn signing(context: &str, cause: impl fmt::Display) -> Self {
        CertPressError::Signing(format!("{context}: {cause}"))
    }
}

impl fmt::Display for CertPressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertPressError::TemplateNotFound { tried } => {
                let tried = tried
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "no readable certificate template (tried: {})", tried)
            }
            CertPressError::CertificateGeneration { stage, cause } => {
                write!(f, "certificate generation failed during {}: {}", stage, cause)
            }
            CertPressError::CredentialNotFound(path) => {
                write!(f, "signing credential not found: {}", path.display())
            }
            CertPressError::Signing(message) => write!(f, "signing failed: {}", message),
            CertPressError::InvalidConfiguration(message) => {
                write!(f, "invalid configuration: {}", message)
            }
            CertPressError::Pdf(message) => write!(f, "pdf error: {}", message),
            CertPressError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for CertPressError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CertPressError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CertPressError {
    fn from(value: std::io::Error) -> Self {
        CertPressError::Io(value)
    }
}

/// Non-fatal conditions absorbed during a render. Each one is logged when it
/// happens and returned to the caller alongside the output bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderWarning {
    FieldNotFound { field: String },
    FontEmbed { path: PathBuf, reason: String },
    DateFormat { field: &'static str, raw: String },
}

impl RenderWarning {
    pub fn code(&self) -> &'static str {
        match self {
            RenderWarning::FieldNotFound { .. } => "FIELD_NOT_FOUND",
            RenderWarning::FontEmbed { .. } => "FONT_EMBED_FAILED",
            RenderWarning::DateFormat { .. } => "DATE_FORMAT_FAILED",
        }
    }
}

impl fmt::Display for RenderWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderWarning::FieldNotFound { field } => {
                write!(f, "{}: template has no field {}", self.code(), field)
            }
            RenderWarning::FontEmbed { path, reason } => {
                write!(f, "{}: {} ({})", self.code(), path.display(), reason)
            }
            RenderWarning::DateFormat { field, raw } => {
                write!(f, "{}: {} could not parse {:?}", self.code(), field, raw)
            }
        }
    }
}
