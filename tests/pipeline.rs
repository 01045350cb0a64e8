mod common;

use certpress::{
    CertPressError, CertificateRenderer, IssuedCertificate, LayoutConfig, PdfSigner, RenderWarning,
    SigningConfig, inspect_pdf_bytes, output_file_name, sign_all,
};
use common::{byte_range, render_config, request, standard_template, temp_dir, write_credential};
use lopdf::Document;

fn page_text(bytes: &[u8]) -> String {
    let doc = Document::load_mem(bytes).expect("load");
    let page_id = *doc.get_pages().values().next().expect("page");
    String::from_utf8_lossy(&doc.get_page_content(page_id).expect("content")).into_owned()
}

fn signer(dir: &std::path::Path) -> PdfSigner {
    PdfSigner::new(SigningConfig {
        p12_path: Some(write_credential(dir, "changeit")),
        p12_password: "changeit".to_string(),
        signature_image: dir.join("signature.png"),
        signer_name: "Dr. Elena Ramos".to_string(),
        ..SigningConfig::default()
    })
}

#[test]
fn render_sign_inspect_round_trip() {
    let dir = temp_dir("round_trip");
    standard_template(&dir);
    let renderer = CertificateRenderer::new(render_config(&dir), LayoutConfig::default());
    let request = request("CERT-2025-0107", "Juan Dela Cruz");

    let rendered = renderer.render_to_file(&request).expect("render");
    assert_eq!(
        rendered.path,
        dir.join("generated").join("CERT-2025-0107_Juan_Dela_Cruz.pdf")
    );
    assert_eq!(
        rendered.path.file_name().and_then(|n| n.to_str()),
        Some(output_file_name(&request).as_str())
    );
    assert_eq!(rendered.output.template, dir.join("participation.pdf"));
    let on_disk = std::fs::read(&rendered.path).expect("read rendered");
    assert_eq!(on_disk, rendered.output.bytes);

    let text = page_text(&on_disk);
    assert!(text.contains("(CERTIFICATE) Tj"), "template content kept");
    assert!(text.contains("(CERT-2025-0107) Tj"));
    assert!(text.contains("(March 15, 2025) Tj"));

    let report = inspect_pdf_bytes(&on_disk).expect("inspect rendered");
    assert_eq!(report.page_count, 1);
    assert_eq!(report.form_field_count, 0);
    assert!(!report.is_signed());

    let signed = signer(&dir).sign(&on_disk).expect("sign");
    let report = inspect_pdf_bytes(&signed.bytes).expect("inspect signed");
    assert_eq!(report.signature_count, 1);
    assert_eq!(report.form_field_count, 0);
    assert_eq!(report.file_size_bytes, signed.bytes.len());
    assert_eq!(signed.sha256.len(), 64);

    let [start, first_len, second_start, second_len] = byte_range(&signed.bytes);
    assert_eq!(start, 0);
    assert_eq!(signed.bytes[first_len], b'<');
    assert_eq!(signed.bytes[second_start - 1], b'>');
    assert_eq!(second_start + second_len, signed.bytes.len());
    assert!(page_text(&signed.bytes).contains("(Dr. Elena Ramos) Tj"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn fields_missing_from_the_template_are_skipped_with_warnings() {
    let dir = temp_dir("missing_fields");
    standard_template(&dir);
    let renderer = CertificateRenderer::new(render_config(&dir), LayoutConfig::default());

    let output = renderer
        .render_to_bytes(&request("CERT-2025-0108", "Ana Reyes"))
        .expect("render");
    let skipped: Vec<&str> = output
        .warnings
        .iter()
        .filter_map(|w| match w {
            RenderWarning::FieldNotFound { field } => Some(field.as_str()),
            _ => None,
        })
        .collect();
    assert!(skipped.contains(&"EVENT_NAME"));
    assert!(skipped.contains(&"EVENT_VENUE"));
    assert!(!skipped.contains(&"PARTICIPANT_NAME"));
    // No PRC number or CPD units were supplied, so those fields are not even looked up.
    assert!(!skipped.contains(&"PRC_NUMBER"));
    assert!(!skipped.contains(&"CPD_UNITS"));
    assert!(
        output
            .warnings
            .iter()
            .any(|w| matches!(w, RenderWarning::FontEmbed { .. }))
    );
    assert_eq!(output.metrics.fields_skipped, skipped.len());
    assert_eq!(output.metrics.output_bytes, output.bytes.len());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_templates_fail_without_writing_output() {
    let dir = temp_dir("no_template");
    let renderer = CertificateRenderer::new(render_config(&dir), LayoutConfig::default());

    let err = renderer
        .render_to_file(&request("CERT-2025-0109", "Pedro Lim"))
        .expect_err("no template");
    match err {
        CertPressError::TemplateNotFound { tried } => {
            assert_eq!(tried.last(), Some(&dir.join("participation.pdf")));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!dir.join("generated").exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn bulk_signing_continues_past_a_missing_file() {
    let dir = temp_dir("bulk");
    standard_template(&dir);
    let renderer = CertificateRenderer::new(render_config(&dir), LayoutConfig::default());
    let first = renderer
        .render_to_file(&request("CERT-2025-0201", "Liza Soberano"))
        .expect("render first");
    let last = renderer
        .render_to_file(&request("CERT-2025-0203", "Carlo Aquino"))
        .expect("render last");

    let items = vec![
        IssuedCertificate {
            certificate_number: "CERT-2025-0201".to_string(),
            pdf_path: first.path.clone(),
        },
        IssuedCertificate {
            certificate_number: "CERT-2025-0202".to_string(),
            pdf_path: dir.join("generated").join("deleted.pdf"),
        },
        IssuedCertificate {
            certificate_number: "CERT-2025-0203".to_string(),
            pdf_path: last.path.clone(),
        },
    ];
    let report = sign_all(&signer(&dir), &items);

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);
    let missing = &report.outcomes[1];
    assert_eq!(missing.certificate_number, "CERT-2025-0202");
    assert!(missing.error.as_deref().is_some_and(|e| e.contains("deleted.pdf")));
    for outcome in [&report.outcomes[0], &report.outcomes[2]] {
        let path = outcome.signed_path.as_ref().expect("signed path");
        let bytes = std::fs::read(path).expect("signed file");
        assert!(inspect_pdf_bytes(&bytes).expect("inspect").is_signed());
    }

    let _ = std::fs::remove_dir_all(&dir);
}
