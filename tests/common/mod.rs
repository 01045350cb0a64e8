#![allow(dead_code)]

use certpress::{CertificateRequest, RenderConfig};
use lopdf::{Document, Object, Stream, dictionary};
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::PKey;
use openssl::rsa::Rsa;
use openssl::x509::{X509, X509NameBuilder};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub const MULTILINE: i64 = 1 << 12;

pub fn temp_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "certpress_it_{}_{}_{}",
        tag,
        std::process::id(),
        nanos
    ));
    std::fs::create_dir_all(&dir).expect("mkdir");
    dir
}

/// One-page letter template with a text field per `(name, rect, flags)`.
pub fn write_template(path: &Path, fields: &[(&str, [i64; 4], i64)]) {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let page_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        b"BT /F1 24 Tf 180 700 Td (CERTIFICATE) Tj ET".to_vec(),
    ));

    let mut refs = Vec::new();
    for (name, [x1, y1, x2, y2], flags) in fields {
        let id = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Tx",
            "T" => Object::string_literal(*name),
            "Rect" => vec![(*x1).into(), (*y1).into(), (*x2).into(), (*y2).into()],
            "P" => page_id,
            "Q" => 1,
            "Ff" => *flags,
        });
        refs.push(Object::Reference(id));
    }

    doc.objects.insert(
        page_id,
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            "Contents" => content_id,
            "Annots" => refs.clone(),
        }),
    );
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let form_id = doc.add_object(dictionary! {
        "Fields" => refs,
        "DA" => Object::string_literal("/Helv 0 Tf 0 g"),
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "AcroForm" => form_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).expect("save template");
}

pub fn standard_template(dir: &Path) -> PathBuf {
    let path = dir.join("participation.pdf");
    write_template(
        &path,
        &[
            ("PARTICIPANT_NAME", [100, 560, 512, 610], 0),
            ("CERTIFICATE_BODY", [72, 380, 540, 520], MULTILINE),
            ("CERTIFICATE_NUMBER", [400, 40, 580, 56], 0),
            ("ISSUED_DATE", [72, 200, 300, 220], 0),
            ("ISSUER_NAME", [320, 120, 540, 140], 0),
        ],
    );
    path
}

pub fn render_config(dir: &Path) -> RenderConfig {
    RenderConfig {
        templates_dir: dir.to_path_buf(),
        default_template: dir.join("participation.pdf"),
        font_path: dir.join("no-script-font.ttf"),
        bold_font_path: None,
        output_dir: dir.join("generated"),
    }
}

pub fn request(number: &str, name: &str) -> CertificateRequest {
    serde_json::from_value(serde_json::json!({
        "certificateNumber": number,
        "certType": "participation",
        "participantName": name,
        "participantRole": "Teacher I",
        "participantSchool": "San Isidro Elementary School",
        "participantUnit": "Grade 4",
        "eventName": "Regional Reading Camp",
        "eventVenue": "Provincial Capitol",
        "eventDate": "2025-03-14",
        "issuedDate": "2025-03-15",
        "createdAt": "2025-03-15T08:30:00Z",
        "duration": "3 days",
        "cpdUnits": "N/A",
        "prcNumber": "",
        "issuerName": "Dr. Elena Ramos"
    }))
    .expect("request json")
}

/// Self-signed RSA credential written as PKCS#12.
pub fn write_credential(dir: &Path, password: &str) -> PathBuf {
    let pkey = PKey::from_rsa(Rsa::generate(2048).expect("rsa")).expect("pkey");
    let mut name = X509NameBuilder::new().expect("name");
    name.append_entry_by_text("CN", "Integration Signer")
        .expect("cn");
    let name = name.build();
    let mut builder = X509::builder().expect("builder");
    builder.set_version(2).expect("version");
    builder.set_subject_name(&name).expect("subject");
    builder.set_issuer_name(&name).expect("issuer");
    builder.set_pubkey(&pkey).expect("pubkey");
    let serial = BigNum::from_u32(7)
        .and_then(|bn| bn.to_asn1_integer())
        .expect("serial");
    builder.set_serial_number(&serial).expect("serial");
    builder
        .set_not_before(&Asn1Time::days_from_now(0).expect("time"))
        .expect("not before");
    builder
        .set_not_after(&Asn1Time::days_from_now(7).expect("time"))
        .expect("not after");
    builder.sign(&pkey, MessageDigest::sha256()).expect("sign");
    let cert = builder.build();
    let p12 = Pkcs12::builder()
        .name("integration")
        .pkey(&pkey)
        .cert(&cert)
        .build2(password)
        .expect("pkcs12");
    let path = dir.join("integration.p12");
    std::fs::write(&path, p12.to_der().expect("der")).expect("write p12");
    path
}

pub fn byte_range(bytes: &[u8]) -> [usize; 4] {
    let text = String::from_utf8_lossy(bytes);
    let start = text.find("/ByteRange[").expect("byte range") + "/ByteRange[".len();
    let end = start + text[start..].find(']').expect("close");
    let values: Vec<usize> = text[start..end]
        .split_whitespace()
        .map(|v| v.parse().expect("number"))
        .collect();
    [values[0], values[1], values[2], values[3]]
}
