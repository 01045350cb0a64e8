use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CertType {
    Participation,
    Recognition,
    Appearance,
}

impl CertType {
    /// Case-insensitive; anything unrecognized renders as a participation
    /// certificate.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "recognition" => CertType::Recognition,
            "appearance" => CertType::Appearance,
            _ => CertType::Participation,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CertType::Participation => "participation",
            CertType::Recognition => "recognition",
            CertType::Appearance => "appearance",
        }
    }
}

/// Certificate data handed over by the records layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CertificateRequest {
    pub certificate_number: String,
    pub cert_type: String,
    pub participant_name: String,
    pub participant_role: String,
    pub event_role: Option<String>,
    pub participant_school: String,
    pub participant_unit: String,
    pub event_name: String,
    pub event_venue: String,
    pub event_date: String,
    pub issued_date: String,
    pub created_at: String,
    pub duration: Option<String>,
    pub cpd_units: Option<String>,
    pub prc_number: Option<String>,
    pub issuer_name: String,
}

impl CertificateRequest {
    pub fn cert_type(&self) -> CertType {
        CertType::parse(&self.cert_type)
    }

    /// CPD units worth printing, with the "N/A" / zero sentinels filtered out.
    pub fn cpd_units(&self) -> Option<&str> {
        self.cpd_units
            .as_deref()
            .filter(|v| has_cpd_units(Some(*v)))
            .map(str::trim)
    }

    pub fn prc_number(&self) -> Option<&str> {
        self.prc_number
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("N/A"))
    }

    pub fn duration(&self) -> Option<&str> {
        self.duration
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("N/A"))
    }

    /// Role printed on recognition certificates: the event-specific role when
    /// one was assigned, else the participant's standing role.
    pub fn recognition_role(&self) -> &str {
        self.event_role
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(self.participant_role.trim())
    }
}

pub fn has_cpd_units(raw: Option<&str>) -> bool {
    let Some(value) = raw.map(str::trim) else {
        return false;
    };
    if value.is_empty() || value.eq_ignore_ascii_case("N/A") {
        return false;
    }
    !matches!(value, "0" | "0.0")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyledSegment {
    pub text: String,
    pub is_bold: bool,
}

impl StyledSegment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_bold: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_bold: true,
        }
    }
}
