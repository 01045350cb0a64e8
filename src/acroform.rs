//! AcroForm access for certificate templates: field lookup by fully
//! qualified name, value clearing, native appearance generation and
//! flattening of widget appearances into page content.

use crate::canvas::Canvas;
use crate::config::LayoutConfig;
use crate::error::CertPressError;
use crate::font::StandardFont;
use crate::layout::{self, Align, BoldMode, DrawFonts};
use crate::pdf::{add_page_resource, append_page_content, lopdf_err, rect_from_array};
use crate::types::{Pt, Rect, fmt};
use crate::winansi;
use lopdf::{
    Dictionary as LoDictionary, Document as LoDocument, Object as LoObject, ObjectId as LoObjectId,
    Stream as LoStream, StringFormat, dictionary,
};
use std::collections::HashMap;

const FF_MULTILINE: i64 = 1 << 12;
const ANNOT_HIDDEN: i64 = 1 << 1;
const ANNOT_NO_VIEW: i64 = 1 << 5;
const MAX_FIELD_DEPTH: usize = 32;

/// Font resource name used inside generated appearance streams.
pub const NATIVE_FONT_RESOURCE: &str = "Helv";

#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    pub id: LoObjectId,
    pub rect: Rect,
    pub page_id: Option<LoObjectId>,
}

/// A terminal form field with its inheritable text properties resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub name: String,
    pub id: LoObjectId,
    pub widgets: Vec<Widget>,
    pub quadding: i64,
    pub flags: i64,
    /// Size from the default appearance string; `None` for auto size (`0 Tf`).
    pub font_size: Option<f32>,
    /// `/FT /Sig`, inherited like the other properties.
    pub signature: bool,
}

impl FormField {
    pub fn align(&self) -> Align {
        Align::from_quadding(self.quadding)
    }

    pub fn is_multiline(&self) -> bool {
        self.flags & FF_MULTILINE != 0
    }

    pub fn is_signature(&self) -> bool {
        self.signature
    }

    /// First widget that sits on a known page.
    pub fn primary_widget(&self) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.page_id.is_some())
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Inherited {
    quadding: Option<i64>,
    flags: Option<i64>,
    font_size: Option<f32>,
    signature: Option<bool>,
}

impl Inherited {
    fn merge(mut self, doc: &LoDocument, dict: &LoDictionary) -> Self {
        if let Ok(q) = dict.get_deref(b"Q", doc).and_then(LoObject::as_i64) {
            self.quadding = Some(q);
        }
        if let Ok(ff) = dict.get_deref(b"Ff", doc).and_then(LoObject::as_i64) {
            self.flags = Some(ff);
        }
        if let Ok(da) = dict.get_deref(b"DA", doc).and_then(LoObject::as_str) {
            self.font_size = da_font_size(&String::from_utf8_lossy(da));
        }
        if let Ok(ft) = dict.get(b"FT").and_then(LoObject::as_name) {
            self.signature = Some(ft == b"Sig");
        }
        self
    }
}

/// Snapshot of the document's interactive form.
#[derive(Debug, Clone, Default)]
pub struct AcroForm {
    fields: Vec<FormField>,
}

impl AcroForm {
    pub fn read(doc: &LoDocument) -> Self {
        let Some(form) = acroform_dict(doc) else {
            return Self::default();
        };
        let defaults = Inherited::default().merge(doc, form);
        let annotation_pages = annotation_pages(doc);
        let mut fields = Vec::new();
        if let Ok(roots) = form.get_deref(b"Fields", doc).and_then(LoObject::as_array) {
            for root in roots {
                if let Ok(id) = root.as_reference() {
                    visit_field(doc, id, "", defaults, &annotation_pages, 0, &mut fields);
                }
            }
        }
        Self { fields }
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Looks a field up by its fully qualified name, then by its last
    /// partial name.
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .or_else(|| {
                self.fields
                    .iter()
                    .find(|f| f.name.rsplit('.').next() == Some(name))
            })
    }
}

fn acroform_dict(doc: &LoDocument) -> Option<&LoDictionary> {
    let catalog = doc.catalog().ok()?;
    catalog
        .get_deref(b"AcroForm", doc)
        .and_then(LoObject::as_dict)
        .ok()
}

/// Widget annotation id -> page id, read from every page's `/Annots`.
fn annotation_pages(doc: &LoDocument) -> HashMap<LoObjectId, LoObjectId> {
    let mut out = HashMap::new();
    for page_id in doc.get_pages().into_values() {
        for annot_id in page_annotation_ids(doc, page_id) {
            out.entry(annot_id).or_insert(page_id);
        }
    }
    out
}

fn page_annotation_ids(doc: &LoDocument, page_id: LoObjectId) -> Vec<LoObjectId> {
    doc.get_dictionary(page_id)
        .and_then(|page| page.get_deref(b"Annots", doc))
        .and_then(LoObject::as_array)
        .map(|annots| annots.iter().filter_map(|a| a.as_reference().ok()).collect())
        .unwrap_or_default()
}

fn is_widget(dict: &LoDictionary) -> bool {
    dict.has(b"Rect") || dict.get(b"Subtype").and_then(LoObject::as_name).ok() == Some(&b"Widget"[..])
}

fn visit_field(
    doc: &LoDocument,
    id: LoObjectId,
    parent_name: &str,
    inherited: Inherited,
    annotation_pages: &HashMap<LoObjectId, LoObjectId>,
    depth: usize,
    out: &mut Vec<FormField>,
) {
    if depth > MAX_FIELD_DEPTH {
        return;
    }
    let Ok(dict) = doc.get_dictionary(id) else {
        return;
    };
    let name = match dict.get_deref(b"T", doc).and_then(LoObject::as_str) {
        Ok(partial) if parent_name.is_empty() => decode_text_string(partial),
        Ok(partial) => format!("{}.{}", parent_name, decode_text_string(partial)),
        Err(_) => parent_name.to_string(),
    };
    let props = inherited.merge(doc, dict);

    let mut widgets = Vec::new();
    if is_widget(dict) {
        widgets.extend(read_widget(doc, id, dict, annotation_pages));
    }
    let mut has_child_fields = false;
    if let Ok(kids) = dict.get_deref(b"Kids", doc).and_then(LoObject::as_array) {
        for kid in kids {
            let Ok(kid_id) = kid.as_reference() else {
                continue;
            };
            let Ok(kid_dict) = doc.get_dictionary(kid_id) else {
                continue;
            };
            if kid_dict.has(b"T") {
                has_child_fields = true;
                visit_field(doc, kid_id, &name, props, annotation_pages, depth + 1, out);
            } else if is_widget(kid_dict) {
                widgets.extend(read_widget(doc, kid_id, kid_dict, annotation_pages));
            }
        }
    }
    if has_child_fields && widgets.is_empty() {
        return;
    }
    out.push(FormField {
        name,
        id,
        widgets,
        quadding: props.quadding.unwrap_or(0),
        flags: props.flags.unwrap_or(0),
        font_size: props.font_size,
        signature: props.signature.unwrap_or(false),
    });
}

fn read_widget(
    doc: &LoDocument,
    id: LoObjectId,
    dict: &LoDictionary,
    annotation_pages: &HashMap<LoObjectId, LoObjectId>,
) -> Option<Widget> {
    let rect = dict
        .get_deref(b"Rect", doc)
        .and_then(LoObject::as_array)
        .ok()
        .and_then(|values| rect_from_array(values))?;
    let page_id = dict
        .get(b"P")
        .and_then(LoObject::as_reference)
        .ok()
        .filter(|p| doc.get_dictionary(*p).map(|d| d.has_type(b"Page")).unwrap_or(false))
        .or_else(|| annotation_pages.get(&id).copied());
    Some(Widget { id, rect, page_id })
}

/// PDF text strings are either UTF-16BE with a byte order mark or
/// PDFDocEncoding, which matches WinAnsi for the printable range.
fn decode_text_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes
        .iter()
        .map(|b| winansi::decode_byte(*b).unwrap_or('?'))
        .collect()
}

/// Reads the size operand of `Tf` from a default appearance string such as
/// `/Helv 12 Tf 0 g`. Zero means auto size.
pub(crate) fn da_font_size(da: &str) -> Option<f32> {
    let tokens: Vec<&str> = da.split_whitespace().collect();
    let idx = tokens.iter().position(|t| *t == "Tf")?;
    let size: f32 = tokens.get(idx.checked_sub(1)?)?.parse().ok()?;
    (size > 0.0).then_some(size)
}

/// Removes the field value and every widget appearance.
pub fn clear_field(doc: &mut LoDocument, field: &FormField) -> Result<(), CertPressError> {
    doc.get_dictionary_mut(field.id)
        .map_err(|e| lopdf_err("clear field", e))?
        .remove(b"V");
    for widget in &field.widgets {
        let dict = doc
            .get_dictionary_mut(widget.id)
            .map_err(|e| lopdf_err("clear widget", e))?;
        dict.remove(b"AP");
        dict.remove(b"V");
    }
    Ok(())
}

/// Stores `value` in the field and generates a Helvetica appearance for
/// every widget at `nominal` size. Multiline fields wrap; others stay on one
/// line without shrinking.
pub fn fill_native(
    doc: &mut LoDocument,
    field: &FormField,
    value: &str,
    font_id: LoObjectId,
    nominal: Pt,
    cfg: &LayoutConfig,
) -> Result<(), CertPressError> {
    let (encoded, _) = winansi::encode_lossy(value);
    doc.get_dictionary_mut(field.id)
        .map_err(|e| lopdf_err("fill field", e))?
        .set("V", LoObject::String(encoded, StringFormat::Literal));

    let fixed = LayoutConfig {
        single_line_floor_ratio: 1.0,
        ..*cfg
    };
    let measure = StandardFont::Helvetica;
    for widget in &field.widgets {
        let local = Rect {
            x: Pt::ZERO,
            y: Pt::ZERO,
            ..widget.rect
        };
        let layout = if field.is_multiline() {
            layout::layout_wrapped(&local, value, &measure, nominal, field.align(), cfg)
        } else {
            let size = nominal.max(fixed.min_font_size);
            layout::layout_single_line(&local, value, &measure, size, field.align(), &fixed)
        };
        let mut canvas = Canvas::new();
        let fonts = DrawFonts {
            regular: NATIVE_FONT_RESOURCE,
            bold: NATIVE_FONT_RESOURCE,
        };
        layout::draw(&mut canvas, &layout, fonts, BoldMode::Font, cfg.text_color);
        let mut content = b"/Tx BMC\n".to_vec();
        content.extend_from_slice(&canvas.to_content().bytes);
        content.extend_from_slice(b"EMC\n");

        let mut stream = LoStream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![
                    0.into(),
                    0.into(),
                    widget.rect.width.to_f32().into(),
                    widget.rect.height.to_f32().into(),
                ],
                "Resources" => dictionary! {
                    "Font" => dictionary! { NATIVE_FONT_RESOURCE => font_id },
                },
            },
            content,
        );
        let _ = stream.compress();
        let appearance_id = doc.add_object(stream);
        doc.get_dictionary_mut(widget.id)
            .map_err(|e| lopdf_err("widget appearance", e))?
            .set("AP", dictionary! { "N" => appearance_id });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlattenStats {
    pub widgets_flattened: usize,
    pub widgets_removed: usize,
}

/// Picks the normal appearance stream, following `/AS` for state
/// dictionaries.
fn normal_appearance(doc: &LoDocument, widget: &LoDictionary) -> Option<LoObjectId> {
    let ap = widget.get_deref(b"AP", doc).and_then(LoObject::as_dict).ok()?;
    let normal = ap.get(b"N").ok()?;
    if let Ok(id) = normal.as_reference() {
        if let Ok(LoObject::Stream(_)) = doc.get_object(id) {
            return Some(id);
        }
        let states = doc.get_dictionary(id).ok()?;
        return appearance_state(states, widget);
    }
    appearance_state(normal.as_dict().ok()?, widget)
}

fn appearance_state(states: &LoDictionary, widget: &LoDictionary) -> Option<LoObjectId> {
    let state = widget.get(b"AS").and_then(LoObject::as_name).ok()?;
    states.get(state).and_then(LoObject::as_reference).ok()
}

fn form_bbox(doc: &LoDocument, appearance_id: LoObjectId) -> Option<Rect> {
    let stream = doc.get_object(appearance_id).and_then(LoObject::as_stream).ok()?;
    stream
        .dict
        .get_deref(b"BBox", doc)
        .and_then(LoObject::as_array)
        .ok()
        .and_then(|values| rect_from_array(values))
}

/// Draws every visible widget appearance into its page's content, removes
/// widget annotations and drops `/AcroForm`. Orphaned field objects are
/// pruned afterwards.
pub fn flatten(doc: &mut LoDocument) -> Result<FlattenStats, CertPressError> {
    let mut stats = FlattenStats::default();
    let page_ids: Vec<LoObjectId> = doc.get_pages().into_values().collect();
    let mut counter = 0usize;

    for page_id in page_ids {
        let annot_ids = page_annotation_ids(doc, page_id);
        if annot_ids.is_empty() {
            continue;
        }
        let mut kept = Vec::new();
        let mut placements: Vec<(LoObjectId, Rect)> = Vec::new();
        for annot_id in annot_ids {
            let Ok(annot) = doc.get_dictionary(annot_id) else {
                continue;
            };
            let is_widget_annot =
                annot.get(b"Subtype").and_then(LoObject::as_name).ok() == Some(&b"Widget"[..]);
            if !is_widget_annot {
                kept.push(LoObject::Reference(annot_id));
                continue;
            }
            stats.widgets_removed += 1;
            let flags = annot.get(b"F").and_then(LoObject::as_i64).unwrap_or(0);
            if flags & (ANNOT_HIDDEN | ANNOT_NO_VIEW) != 0 {
                continue;
            }
            let rect = annot
                .get_deref(b"Rect", doc)
                .and_then(LoObject::as_array)
                .ok()
                .and_then(|values| rect_from_array(values));
            if let (Some(appearance_id), Some(rect)) = (normal_appearance(doc, annot), rect) {
                placements.push((appearance_id, rect));
            }
        }

        let mut content = String::new();
        for (appearance_id, rect) in placements {
            let Some(bbox) = form_bbox(doc, appearance_id) else {
                continue;
            };
            if bbox.width <= Pt::ZERO || bbox.height <= Pt::ZERO {
                continue;
            }
            if let Ok(LoObject::Stream(stream)) = doc.get_object_mut(appearance_id) {
                stream.dict.set("Type", "XObject");
                stream.dict.set("Subtype", "Form");
            }
            counter += 1;
            let name = format!("CpFlat{}", counter);
            add_page_resource(doc, page_id, "XObject", &name, appearance_id)?;
            let sx = rect.width.to_f32() / bbox.width.to_f32();
            let sy = rect.height.to_f32() / bbox.height.to_f32();
            let tx = rect.x.to_f32() - bbox.x.to_f32() * sx;
            let ty = rect.y.to_f32() - bbox.y.to_f32() * sy;
            content.push_str(&format!(
                "q\n{} 0 0 {} {} {} cm\n/{} Do\nQ\n",
                fmt(sx),
                fmt(sy),
                fmt(tx),
                fmt(ty),
                name
            ));
            stats.widgets_flattened += 1;
        }
        if !content.is_empty() {
            append_page_content(doc, page_id, content.into_bytes())?;
        }

        let page = doc
            .get_dictionary_mut(page_id)
            .map_err(|e| lopdf_err("flatten annotations", e))?;
        if kept.is_empty() {
            page.remove(b"Annots");
        } else {
            page.set("Annots", kept);
        }
    }

    doc.catalog_mut()
        .map_err(|e| lopdf_err("flatten catalog", e))?
        .remove(b"AcroForm");
    doc.prune_objects();
    Ok(stats)
}
