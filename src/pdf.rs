//! lopdf plumbing shared by the renderer and the signer: loading, resource
//! registration, content appends and serialization.

use crate::error::CertPressError;
use crate::font::{EmbeddedFont, FontProgramKind, StandardFont};
use crate::types::Rect;
use image::GenericImageView;
use lopdf::xref::XrefType;
use lopdf::{
    Dictionary as LoDictionary, Document as LoDocument, Object as LoObject, ObjectId as LoObjectId,
    Stream as LoStream, dictionary,
};

pub(crate) fn lopdf_err(context: &str, err: lopdf::Error) -> CertPressError {
    CertPressError::Pdf(format!("{}: {}", context, err))
}

pub fn load_document(bytes: &[u8]) -> Result<LoDocument, CertPressError> {
    let doc = LoDocument::load_mem(bytes).map_err(|err| lopdf_err("load", err))?;
    if doc.is_encrypted() {
        return Err(CertPressError::Pdf(
            "encrypted documents are not supported".to_string(),
        ));
    }
    if doc.get_pages().is_empty() {
        return Err(CertPressError::Pdf("document has no pages".to_string()));
    }
    Ok(doc)
}

/// Serializes with a classic cross-reference table. lopdf never writes object
/// streams, so every dictionary lands in the file as plain text, which the
/// signature placeholder patching depends on.
pub fn save_document(doc: &mut LoDocument) -> Result<Vec<u8>, CertPressError> {
    doc.reference_table.cross_reference_type = XrefType::CrossReferenceTable;
    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|err| lopdf_err("save", lopdf::Error::IO(err)))?;
    Ok(out)
}

pub fn first_page_id(doc: &LoDocument) -> Result<LoObjectId, CertPressError> {
    doc.get_pages()
        .values()
        .next()
        .copied()
        .ok_or_else(|| CertPressError::Pdf("document has no pages".to_string()))
}

/// Looks `key` up on the page and then along its `/Parent` chain.
fn inherited_attribute(doc: &LoDocument, page_id: LoObjectId, key: &[u8]) -> Option<LoObject> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..32 {
        if let Ok(value) = current.get(key) {
            return match value {
                LoObject::Reference(id) => doc.get_object(*id).ok().cloned(),
                other => Some(other.clone()),
            };
        }
        let parent = current.get(b"Parent").and_then(LoObject::as_reference).ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

pub(crate) fn number(obj: &LoObject) -> Option<f32> {
    obj.as_float().ok()
}

pub(crate) fn rect_from_array(values: &[LoObject]) -> Option<Rect> {
    if values.len() != 4 {
        return None;
    }
    let nums: Vec<f32> = values.iter().filter_map(number).collect();
    if nums.len() != 4 {
        return None;
    }
    Some(Rect::from_corners(nums[0], nums[1], nums[2], nums[3]))
}

/// Page box in user space. Falls back to US Letter when the page carries no
/// readable `/MediaBox`.
pub fn page_box(doc: &LoDocument, page_id: LoObjectId) -> Rect {
    let from = |key: &[u8]| {
        inherited_attribute(doc, page_id, key)
            .and_then(|obj| obj.as_array().ok().and_then(|arr| rect_from_array(arr)))
    };
    from(b"CropBox")
        .or_else(|| from(b"MediaBox"))
        .unwrap_or_else(|| Rect::new(0.0, 0.0, 612.0, 792.0))
}

/// Makes sure the page owns a `/Resources` entry, copying inherited resources
/// down if needed. Returns the object id when resources are indirect.
fn ensure_page_resources(
    doc: &mut LoDocument,
    page_id: LoObjectId,
) -> Result<Option<LoObjectId>, lopdf::Error> {
    let page = doc.get_dictionary(page_id)?;
    match page.get(b"Resources") {
        Ok(LoObject::Reference(id)) => return Ok(Some(*id)),
        Ok(LoObject::Dictionary(_)) => return Ok(None),
        _ => {}
    }
    let inherited = match inherited_attribute(doc, page_id, b"Resources") {
        Some(LoObject::Dictionary(dict)) => dict,
        _ => LoDictionary::new(),
    };
    doc.get_dictionary_mut(page_id)?
        .set("Resources", LoObject::Dictionary(inherited));
    Ok(None)
}

fn resources_mut(
    doc: &mut LoDocument,
    page_id: LoObjectId,
    resources_id: Option<LoObjectId>,
) -> Result<&mut LoDictionary, lopdf::Error> {
    match resources_id {
        Some(id) => doc.get_dictionary_mut(id),
        None => doc
            .get_dictionary_mut(page_id)?
            .get_mut(b"Resources")
            .and_then(LoObject::as_dict_mut),
    }
}

/// Registers `target` as `/<category>/<name>` in the page's resources.
pub fn add_page_resource(
    doc: &mut LoDocument,
    page_id: LoObjectId,
    category: &str,
    name: &str,
    target: LoObjectId,
) -> Result<(), CertPressError> {
    let err = |e: lopdf::Error| lopdf_err("page resources", e);
    let resources_id = ensure_page_resources(doc, page_id).map_err(err)?;
    let category_id = resources_mut(doc, page_id, resources_id)
        .map_err(err)?
        .get(category.as_bytes())
        .and_then(LoObject::as_reference)
        .ok();
    if let Some(id) = category_id {
        doc.get_dictionary_mut(id)
            .map_err(err)?
            .set(name, LoObject::Reference(target));
        return Ok(());
    }
    let resources = resources_mut(doc, page_id, resources_id).map_err(err)?;
    if !matches!(resources.get(category.as_bytes()), Ok(LoObject::Dictionary(_))) {
        resources.set(category, LoDictionary::new());
    }
    resources
        .get_mut(category.as_bytes())
        .and_then(LoObject::as_dict_mut)
        .map_err(err)?
        .set(name, LoObject::Reference(target));
    Ok(())
}

/// Appends a compressed content stream after the page's existing content.
pub fn append_page_content(
    doc: &mut LoDocument,
    page_id: LoObjectId,
    content: Vec<u8>,
) -> Result<(), CertPressError> {
    let mut stream = LoStream::new(dictionary! {}, content);
    let _ = stream.compress();
    let stream_id = doc.add_object(stream);
    let page = doc
        .get_dictionary(page_id)
        .map_err(|e| lopdf_err("page contents", e))?;
    let mut contents: Vec<LoObject> = match page.get(b"Contents") {
        Ok(LoObject::Reference(id)) => vec![LoObject::Reference(*id)],
        Ok(LoObject::Array(arr)) => arr.clone(),
        _ => Vec::new(),
    };
    // Existing content may leave the graphics state unbalanced; isolate it.
    if !contents.is_empty() {
        let open_id = doc.add_object(LoStream::new(dictionary! {}, b"q\n".to_vec()));
        let close_id = doc.add_object(LoStream::new(dictionary! {}, b"\nQ\n".to_vec()));
        contents.insert(0, LoObject::Reference(open_id));
        contents.push(LoObject::Reference(close_id));
    }
    contents.push(LoObject::Reference(stream_id));
    doc.get_dictionary_mut(page_id)
        .map_err(|e| lopdf_err("page contents", e))?
        .set("Contents", contents);
    Ok(())
}

pub fn add_standard_font(doc: &mut LoDocument, font: StandardFont) -> LoObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => font.base_font(),
        "Encoding" => "WinAnsiEncoding",
    })
}

/// Embeds a simple WinAnsi font: font program, descriptor and font dictionary.
pub fn add_embedded_font(doc: &mut LoDocument, font: &EmbeddedFont) -> LoObjectId {
    let metrics = &font.metrics;
    let (file_key, font_subtype) = match font.program_kind {
        FontProgramKind::TrueType => ("FontFile2", "TrueType"),
        FontProgramKind::OpenTypeCff => ("FontFile3", "Type1"),
    };
    let mut file_dict = dictionary! { "Length1" => font.data.len() as i64 };
    if font.program_kind == FontProgramKind::OpenTypeCff {
        file_dict.set("Subtype", "OpenType");
    }
    let mut file_stream = LoStream::new(file_dict, font.data.clone());
    let _ = file_stream.compress();
    let file_id = doc.add_object(file_stream);

    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => LoObject::Name(font.name.as_bytes().to_vec()),
        "Flags" => metrics.descriptor_flags(),
        "FontBBox" => vec![
            (metrics.bbox.0 as i64).into(),
            (metrics.bbox.1 as i64).into(),
            (metrics.bbox.2 as i64).into(),
            (metrics.bbox.3 as i64).into(),
        ],
        "ItalicAngle" => metrics.italic_angle as i64,
        "Ascent" => metrics.ascent as i64,
        "Descent" => metrics.descent as i64,
        "CapHeight" => metrics.cap_height as i64,
        "StemV" => metrics.stem_v as i64,
        "MissingWidth" => metrics.missing_width as i64,
        file_key => file_id,
    });

    let widths: Vec<LoObject> = metrics
        .widths
        .iter()
        .map(|w| LoObject::Integer(*w as i64))
        .collect();
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => font_subtype,
        "BaseFont" => LoObject::Name(font.name.as_bytes().to_vec()),
        "FirstChar" => metrics.first_char as i64,
        "LastChar" => metrics.last_char as i64,
        "Widths" => widths,
        "FontDescriptor" => descriptor_id,
        "Encoding" => "WinAnsiEncoding",
    })
}

/// Decodes a PNG or JPEG and adds it as an image XObject. JPEG data is kept
/// as-is under `DCTDecode`; everything else becomes Flate RGB with an
/// optional soft mask. Returns the XObject id and pixel dimensions.
pub fn add_image(doc: &mut LoDocument, data: &[u8]) -> Result<(LoObjectId, u32, u32), String> {
    let format = image::guess_format(data).map_err(|e| e.to_string())?;
    let decoded = image::load_from_memory(data).map_err(|e| e.to_string())?;
    let (width, height) = decoded.dimensions();

    if format == image::ImageFormat::Jpeg {
        let color_space = match decoded.color() {
            image::ColorType::L8 | image::ColorType::La8 => "DeviceGray",
            _ => "DeviceRGB",
        };
        let stream = LoStream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => color_space,
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            data.to_vec(),
        )
        .with_compression(false);
        return Ok((doc.add_object(stream), width, height));
    }

    let rgba = decoded.to_rgba8();
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    let mut has_alpha = false;
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        if a != 255 {
            has_alpha = true;
        }
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(a);
    }

    let mut image_dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
    };
    if has_alpha {
        let mut mask = LoStream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            alpha,
        );
        let _ = mask.compress();
        let mask_id = doc.add_object(mask);
        image_dict.set("SMask", mask_id);
    }
    let mut stream = LoStream::new(image_dict, rgb);
    let _ = stream.compress();
    Ok((doc.add_object(stream), width, height))
}
