//! Visual signature stamp plus a detached PKCS#7 signature over the whole
//! file except the reserved `/Contents` hex string.

use crate::canvas::Canvas;
use crate::config::{Config, SigningConfig};
use crate::error::CertPressError;
use crate::font::StandardFont;
use crate::pdf::{
    add_image, add_page_resource, add_standard_font, append_page_content, first_page_id,
    load_document, page_box, save_document,
};
use crate::types::{Color, Pt};
use chrono::{DateTime, Local, Utc};
use lopdf::{
    Document as LoDocument, Object as LoObject, ObjectId as LoObjectId, StringFormat, dictionary,
};
use openssl::pkcs12::Pkcs12;
use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
use openssl::pkey::{PKey, Private};
use openssl::stack::Stack;
use openssl::x509::X509;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

const BYTE_RANGE_PLACEHOLDER: i64 = 9_999_999_999;
const STAMP_FONT: &str = "CpSigHelv";
const STAMP_FONT_BOLD: &str = "CpSigHelvB";
const STAMP_IMAGE: &str = "CpSigImg";
/// Annotation flags: Print | Locked.
const SIG_WIDGET_FLAGS: i64 = 132;

#[derive(Debug, Clone)]
pub struct SignedDocument {
    pub bytes: Vec<u8>,
    /// Lower-case hex SHA-256 of `bytes`.
    pub sha256: String,
}

struct Credential {
    pkey: PKey<Private>,
    cert: X509,
    chain: Stack<X509>,
}

fn load_credential(path: &Path, password: &str) -> Result<Credential, CertPressError> {
    if !path.is_file() {
        return Err(CertPressError::CredentialNotFound(path.to_path_buf()));
    }
    let der = fs::read(path)?;
    let parsed = Pkcs12::from_der(&der)
        .and_then(|p12| p12.parse2(password))
        .map_err(|e| CertPressError::signing("pkcs12", e))?;
    let pkey = parsed
        .pkey
        .ok_or_else(|| CertPressError::Signing("pkcs12 has no private key".to_string()))?;
    let cert = parsed
        .cert
        .ok_or_else(|| CertPressError::Signing("pkcs12 has no certificate".to_string()))?;
    let chain = match parsed.ca {
        Some(chain) => chain,
        None => Stack::new().map_err(|e| CertPressError::signing("certificate chain", e))?,
    };
    Ok(Credential { pkey, cert, chain })
}

pub struct PdfSigner {
    config: SigningConfig,
}

impl PdfSigner {
    pub fn new(config: SigningConfig) -> Self {
        Self { config }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.signing.clone())
    }

    pub fn config(&self) -> &SigningConfig {
        &self.config
    }

    /// Signs with the configured PKCS#12 credential.
    pub fn sign(&self, pdf: &[u8]) -> Result<SignedDocument, CertPressError> {
        let path = self.config.p12_path.as_deref().ok_or_else(|| {
            CertPressError::InvalidConfiguration("CERTPRESS_P12_PATH is not set".to_string())
        })?;
        self.sign_with_credential(pdf, path, &self.config.p12_password)
    }

    /// Stamps page one, reserves the signature and signs. The credential and
    /// signer image are read from disk on every call.
    pub fn sign_with_credential(
        &self,
        pdf: &[u8],
        p12_path: &Path,
        password: &str,
    ) -> Result<SignedDocument, CertPressError> {
        let credential = load_credential(p12_path, password)?;
        let mut doc = load_document(pdf).map_err(|e| CertPressError::signing("load", e))?;
        let page_id = first_page_id(&doc).map_err(|e| CertPressError::signing("load", e))?;
        let now = Local::now();

        self.draw_stamp(&mut doc, page_id, &now)?;
        insert_signature_fields(
            &mut doc,
            page_id,
            &self.config,
            &now.with_timezone(&Utc),
        )?;
        let mut bytes =
            save_document(&mut doc).map_err(|e| CertPressError::signing("serialize", e))?;

        let placeholder = locate_placeholder(&bytes, self.config.signature_reserve_bytes)?;
        placeholder.patch_byte_range(&mut bytes)?;
        let signed_data = placeholder.signed_data(&bytes);
        let pkcs7 = Pkcs7::sign(
            &credential.cert,
            &credential.pkey,
            &credential.chain,
            &signed_data,
            Pkcs7Flags::DETACHED | Pkcs7Flags::BINARY | Pkcs7Flags::NOSMIMECAP,
        )
        .and_then(|p| p.to_der())
        .map_err(|e| CertPressError::signing("pkcs7", e))?;
        placeholder.write_signature(&mut bytes, &pkcs7)?;

        let sha256 = hex::encode(Sha256::digest(&bytes));
        info!(
            bytes = bytes.len(),
            signature_bytes = pkcs7.len(),
            sha256 = %sha256,
            "document signed"
        );
        Ok(SignedDocument { bytes, sha256 })
    }

    /// Signer image left of the page's horizontal center, identity lines to
    /// the right, both resting on `stamp_bottom_offset`.
    fn draw_stamp(
        &self,
        doc: &mut LoDocument,
        page_id: LoObjectId,
        now: &DateTime<Local>,
    ) -> Result<(), CertPressError> {
        let cfg = &self.config;
        let page = page_box(doc, page_id);
        let center_x = page.x + page.width.mul_ratio(1, 2);
        let bottom = page.y + cfg.stamp_bottom_offset;
        let half_gap = cfg.stamp_gap.mul_ratio(1, 2);
        let err = |e: CertPressError| CertPressError::signing("stamp", e);

        let mut canvas = Canvas::new();
        canvas.save_state();
        match fs::read(&cfg.signature_image) {
            Ok(data) => match add_image(doc, &data) {
                Ok((image_id, px_w, px_h)) => {
                    let (width, height) = fit_box(
                        px_w,
                        px_h,
                        cfg.stamp_image_width,
                        cfg.stamp_image_height,
                    );
                    add_page_resource(doc, page_id, "XObject", STAMP_IMAGE, image_id)
                        .map_err(err)?;
                    let x = center_x - half_gap - width;
                    canvas.draw_image(x, bottom, width, height, STAMP_IMAGE);
                }
                Err(reason) => {
                    warn!(path = %cfg.signature_image.display(), %reason, "signer image unreadable")
                }
            },
            Err(e) => {
                warn!(path = %cfg.signature_image.display(), error = %e, "signer image missing")
            }
        }

        let date_line = format!("Date: {}", now.format("%Y.%m.%d"));
        let time_line = format!("Time: {}", now.format("%H:%M:%S %:z"));
        let lines = [
            (cfg.signer_role.as_str(), false),
            (cfg.signer_name.as_str(), true),
            (cfg.signer_title.as_str(), true),
            (date_line.as_str(), false),
            (time_line.as_str(), false),
        ];
        let line_height = cfg.stamp_font_size.mul_ratio(5, 4);
        let x = center_x + half_gap;
        canvas.set_fill_color(Color::BLACK);
        canvas.set_font_size(cfg.stamp_font_size);
        let mut y = bottom + line_height * (lines.len() as i32 - 1);
        for (text, bold) in lines {
            canvas.set_font_name(if bold { STAMP_FONT_BOLD } else { STAMP_FONT });
            canvas.draw_string(x, y, text);
            y -= line_height;
        }
        canvas.restore_state();

        let regular = add_standard_font(doc, StandardFont::Helvetica);
        let bold = add_standard_font(doc, StandardFont::HelveticaBold);
        add_page_resource(doc, page_id, "Font", STAMP_FONT, regular).map_err(err)?;
        add_page_resource(doc, page_id, "Font", STAMP_FONT_BOLD, bold).map_err(err)?;
        debug!(
            x = x.to_f32(),
            bottom = bottom.to_f32(),
            "signature stamp placed"
        );
        append_page_content(doc, page_id, canvas.to_content().bytes).map_err(err)
    }
}

/// Scales pixel dimensions to fit inside `max_w` x `max_h`, keeping aspect.
fn fit_box(px_w: u32, px_h: u32, max_w: Pt, max_h: Pt) -> (Pt, Pt) {
    if px_w == 0 || px_h == 0 {
        return (max_w, max_h);
    }
    let by_width = max_h.to_f32() * px_w as f32 >= max_w.to_f32() * px_h as f32;
    if by_width {
        (max_w, Pt::from_f32(max_w.to_f32() * px_h as f32 / px_w as f32))
    } else {
        (Pt::from_f32(max_h.to_f32() * px_w as f32 / px_h as f32), max_h)
    }
}

fn pdf_date(at: &DateTime<Utc>) -> LoObject {
    LoObject::string_literal(at.format("D:%Y%m%d%H%M%SZ").to_string())
}

/// Adds the `/Sig` value dictionary with fixed-width placeholders, an
/// invisible signature widget on `page_id` and the `/AcroForm` entry.
fn insert_signature_fields(
    doc: &mut LoDocument,
    page_id: LoObjectId,
    cfg: &SigningConfig,
    at: &DateTime<Utc>,
) -> Result<(), CertPressError> {
    let err = |e: lopdf::Error| CertPressError::signing("placeholder", e);
    let sig_id = doc.add_object(dictionary! {
        "Type" => "Sig",
        "Filter" => "Adobe.PPKLite",
        "SubFilter" => "adbe.pkcs7.detached",
        "ByteRange" => vec![LoObject::Integer(BYTE_RANGE_PLACEHOLDER); 4],
        "Contents" => LoObject::String(
            vec![0u8; cfg.signature_reserve_bytes],
            StringFormat::Hexadecimal,
        ),
        "M" => pdf_date(at),
        "Name" => LoObject::string_literal(cfg.signer_name.as_str()),
        "Reason" => LoObject::string_literal(cfg.reason.as_str()),
        "Location" => LoObject::string_literal(cfg.location.as_str()),
    });
    let widget_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Sig",
        "T" => LoObject::string_literal("CertpressSignature"),
        "Rect" => vec![0.into(), 0.into(), 0.into(), 0.into()],
        "F" => SIG_WIDGET_FLAGS,
        "P" => page_id,
        "V" => sig_id,
    });

    let annots_ref = doc
        .get_dictionary(page_id)
        .and_then(|page| page.get(b"Annots"))
        .and_then(LoObject::as_reference)
        .ok();
    match annots_ref {
        Some(id) => doc
            .get_object_mut(id)
            .and_then(LoObject::as_array_mut)
            .map_err(err)?
            .push(widget_id.into()),
        None => {
            let page = doc.get_dictionary_mut(page_id).map_err(err)?;
            match page.get_mut(b"Annots").and_then(LoObject::as_array_mut) {
                Ok(annots) => annots.push(widget_id.into()),
                Err(_) => page.set("Annots", vec![widget_id.into()]),
            }
        }
    }

    let form_ref = doc
        .catalog()
        .and_then(|c| c.get(b"AcroForm"))
        .and_then(LoObject::as_reference)
        .ok();
    let form = match form_ref {
        Some(id) => doc.get_dictionary_mut(id).map_err(err)?,
        None => {
            let catalog = doc.catalog_mut().map_err(err)?;
            if !matches!(catalog.get(b"AcroForm"), Ok(LoObject::Dictionary(_))) {
                catalog.set("AcroForm", dictionary! {});
            }
            catalog
                .get_mut(b"AcroForm")
                .and_then(LoObject::as_dict_mut)
                .map_err(err)?
        }
    };
    match form.get_mut(b"Fields").and_then(LoObject::as_array_mut) {
        Ok(fields) => fields.push(widget_id.into()),
        Err(_) => form.set("Fields", vec![widget_id.into()]),
    }
    form.set("SigFlags", 3);
    Ok(())
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| pos + from)
}

/// Byte offsets of the reserved `/ByteRange` array and `/Contents` string
/// in a serialized document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placeholder {
    byte_range_start: usize,
    byte_range_len: usize,
    contents_start: usize,
    contents_end: usize,
}

fn locate_placeholder(bytes: &[u8], reserve: usize) -> Result<Placeholder, CertPressError> {
    let byte_range = format!("[{0} {0} {0} {0}]", BYTE_RANGE_PLACEHOLDER);
    let byte_range_start = find(bytes, byte_range.as_bytes(), 0)
        .ok_or_else(|| CertPressError::Signing("byte range placeholder not found".to_string()))?;
    let mut contents = Vec::with_capacity(reserve * 2 + 2);
    contents.push(b'<');
    contents.resize(reserve * 2 + 1, b'0');
    contents.push(b'>');
    let contents_start = find(bytes, &contents, byte_range_start)
        .ok_or_else(|| CertPressError::Signing("contents placeholder not found".to_string()))?;
    Ok(Placeholder {
        byte_range_start,
        byte_range_len: byte_range.len(),
        contents_start,
        contents_end: contents_start + contents.len(),
    })
}

impl Placeholder {
    fn ranges(&self, total: usize) -> [usize; 4] {
        [
            0,
            self.contents_start,
            self.contents_end,
            total - self.contents_end,
        ]
    }

    /// Rewrites the array in place, space padded to its reserved width.
    fn patch_byte_range(&self, bytes: &mut [u8]) -> Result<(), CertPressError> {
        let [a, b, c, d] = self.ranges(bytes.len());
        let mut value = format!("[{} {} {} {}", a, b, c, d);
        if value.len() + 1 > self.byte_range_len {
            return Err(CertPressError::Signing(
                "document too large for byte range placeholder".to_string(),
            ));
        }
        while value.len() + 1 < self.byte_range_len {
            value.push(' ');
        }
        value.push(']');
        bytes[self.byte_range_start..self.byte_range_start + self.byte_range_len]
            .copy_from_slice(value.as_bytes());
        Ok(())
    }

    fn signed_data(&self, bytes: &[u8]) -> Vec<u8> {
        let mut data = Vec::with_capacity(bytes.len() - (self.contents_end - self.contents_start));
        data.extend_from_slice(&bytes[..self.contents_start]);
        data.extend_from_slice(&bytes[self.contents_end..]);
        data
    }

    fn write_signature(&self, bytes: &mut [u8], der: &[u8]) -> Result<(), CertPressError> {
        let encoded = hex::encode_upper(der);
        let capacity = self.contents_end - self.contents_start - 2;
        if encoded.len() > capacity {
            return Err(CertPressError::Signing(format!(
                "signature needs {} bytes but only {} are reserved",
                der.len(),
                capacity / 2
            )));
        }
        let start = self.contents_start + 1;
        bytes[start..start + encoded.len()].copy_from_slice(encoded.as_bytes());
        Ok(())
    }
}
