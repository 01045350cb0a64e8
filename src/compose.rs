use crate::layout::{atoms_text, flatten_segments};
use crate::model::{CertType, CertificateRequest, StyledSegment};

const PARTICIPATION_PREAMBLE: &str = "for actively participating in the ";

/// Builds the certificate body paragraph. The sentence shape depends only on
/// the certificate type and which optional values are present.
pub fn compose(
    request: &CertificateRequest,
    event_date: &str,
    issued_date: &str,
) -> Vec<StyledSegment> {
    let venue = request.event_venue.trim();
    let event_name = request.event_name.trim();
    let mut body = Vec::new();

    match request.cert_type() {
        CertType::Appearance => {
            push_event_clause(&mut body, event_name, event_date, venue);
            body.push(StyledSegment::plain(". "));
            push_issued_clause(&mut body, issued_date, venue);
            body.push(StyledSegment::plain("."));
        }
        CertType::Recognition => {
            body.push(StyledSegment::plain("has served as "));
            body.push(StyledSegment::bold(request.recognition_role()));
            body.push(StyledSegment::plain(" during the conduct of "));
            push_event_clause(&mut body, event_name, event_date, venue);
            body.push(StyledSegment::plain(". "));
            push_issued_clause(&mut body, issued_date, venue);
            push_cpd_suffix(&mut body, request);
        }
        CertType::Participation => {
            body.push(StyledSegment::plain(PARTICIPATION_PREAMBLE));
            push_event_clause(&mut body, event_name, event_date, venue);
            body.push(StyledSegment::plain(". "));
            if let Some(duration) = request.duration() {
                body.push(StyledSegment::plain("This activity has a duration of "));
                body.push(StyledSegment::bold(duration));
                body.push(StyledSegment::plain(". "));
            }
            push_issued_clause(&mut body, issued_date, venue);
            body.push(StyledSegment::plain("."));
            push_cpd_suffix(&mut body, request);
        }
    }
    body
}

fn push_event_clause(body: &mut Vec<StyledSegment>, event_name: &str, date: &str, venue: &str) {
    body.push(StyledSegment::bold(event_name));
    body.push(StyledSegment::plain(" held on "));
    body.push(StyledSegment::bold(date));
    body.push(StyledSegment::plain(", at "));
    body.push(StyledSegment::bold(venue));
}

fn push_issued_clause(body: &mut Vec<StyledSegment>, issued_date: &str, venue: &str) {
    body.push(StyledSegment::plain("Issued this "));
    body.push(StyledSegment::bold(issued_date));
    body.push(StyledSegment::plain(", at "));
    body.push(StyledSegment::bold(venue));
}

fn push_cpd_suffix(body: &mut Vec<StyledSegment>, request: &CertificateRequest) {
    if let Some(units) = request.cpd_units() {
        body.push(StyledSegment::bold(format!(" ({} CPD Units)", units)));
    }
}

/// Plain-text rendering of a segment list, used for logs and native-field
/// fallback values.
pub fn to_plain_text(segments: &[StyledSegment]) -> String {
    atoms_text(&flatten_segments(segments))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(cert_type: &str) -> CertificateRequest {
        CertificateRequest {
            certificate_number: "CERT-2025-0042".to_string(),
            cert_type: cert_type.to_string(),
            participant_name: "Maria Santos".to_string(),
            participant_role: "Teacher III".to_string(),
            event_name: "Division Science Fair".to_string(),
            event_venue: "City Hall".to_string(),
            ..CertificateRequest::default()
        }
    }

    #[test]
    fn participation_with_duration_and_no_cpd() {
        let mut req = request("Participation");
        req.duration = Some("8 hours".to_string());
        req.cpd_units = Some("N/A".to_string());
        let body = compose(&req, "January 5, 2025", "5th day of January 2025");
        assert_eq!(body[0], StyledSegment::plain(PARTICIPATION_PREAMBLE));
        assert!(body.contains(&StyledSegment::plain("This activity has a duration of ")));
        assert!(body.contains(&StyledSegment::bold("8 hours")));
        assert!(!body.iter().any(|s| s.text.contains("CPD")));
        assert_eq!(body.last(), Some(&StyledSegment::plain(".")));
        assert_eq!(
            to_plain_text(&body),
            "for actively participating in the Division Science Fair held on January 5, 2025, \
             at City Hall. This activity has a duration of 8 hours. Issued this 5th day of \
             January 2025, at City Hall."
        );
    }

    #[test]
    fn recognition_ends_with_bold_cpd_suffix() {
        let mut req = request("Recognition");
        req.event_role = Some("Resource Speaker".to_string());
        req.cpd_units = Some("3.0".to_string());
        let body = compose(&req, "January 5, 2025", "5th day of January 2025");
        assert_eq!(body[0], StyledSegment::plain("has served as "));
        assert_eq!(body[1], StyledSegment::bold("Resource Speaker"));
        assert_eq!(body.last(), Some(&StyledSegment::bold(" (3.0 CPD Units)")));
    }

    #[test]
    fn recognition_without_cpd_has_no_suffix() {
        let mut req = request("recognition");
        req.cpd_units = Some("0".to_string());
        let body = compose(&req, "d", "i");
        assert_eq!(body[1], StyledSegment::bold("Teacher III"));
        assert_eq!(body.last(), Some(&StyledSegment::bold("City Hall")));
    }

    #[test]
    fn appearance_uses_the_short_sentence() {
        let body = compose(&request("APPEARANCE"), "January 5, 2025", "5th day of January 2025");
        assert_eq!(body[0], StyledSegment::bold("Division Science Fair"));
        assert_eq!(
            to_plain_text(&body),
            "Division Science Fair held on January 5, 2025, at City Hall. Issued this 5th day \
             of January 2025, at City Hall."
        );
    }

    #[test]
    fn unknown_type_composes_participation() {
        let body = compose(&request("seminar"), "d", "i");
        assert_eq!(body[0], StyledSegment::plain(PARTICIPATION_PREAMBLE));
        assert!(!body.iter().any(|s| s.text.contains("duration")));
    }

    #[test]
    fn compose_is_deterministic() {
        let mut req = request("Participation");
        req.cpd_units = Some("2".to_string());
        let a = compose(&req, "d", "i");
        let b = compose(&req, "d", "i");
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_vec(&a).expect("json"),
            serde_json::to_vec(&b).expect("json")
        );
    }
}
