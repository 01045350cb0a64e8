use crate::error::CertPressError;
use crate::types::Pt;
use crate::winansi;
use std::fs;
use std::path::Path;

/// Width measurement seam used by the layout engine.
pub trait TextMeasure {
    fn text_width(&self, text: &str, font_size: Pt) -> Pt;

    fn space_width(&self, font_size: Pt) -> Pt {
        self.text_width(" ", font_size)
    }
}

/// Advance widths (1/1000 em) for WinAnsi 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // 32-47
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 48-63
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // 64-79
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 80-95
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 96-111
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 112-126
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // 32-47
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 48-63
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // 64-79
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 80-95
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // 96-111
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 112-126
];

/// The non-embedded base-14 faces used for every field that is not set in the
/// script font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    pub fn base_font(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
        }
    }

    fn table(&self) -> &'static [u16; 95] {
        match self {
            StandardFont::Helvetica => &HELVETICA_WIDTHS,
            StandardFont::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
        }
    }

    fn char_width(&self, ch: char) -> u16 {
        let table = self.table();
        let ascii = fold_to_ascii(ch);
        let code = ascii as u32;
        if (32..=126).contains(&code) {
            return table[(code - 32) as usize];
        }
        match ch {
            '\u{2018}' | '\u{2019}' => 222,
            '\u{201C}' | '\u{201D}' => 333,
            '\u{2013}' => 556,
            '\u{2014}' => 1000,
            '\u{2022}' => 350,
            '\u{00A0}' => table[0],
            _ => table[(b'?' - 32) as usize],
        }
    }
}

impl TextMeasure for StandardFont {
    fn text_width(&self, text: &str, font_size: Pt) -> Pt {
        let units: i32 = text.chars().map(|ch| self.char_width(ch) as i32).sum();
        if units <= 0 {
            return Pt::ZERO;
        }
        font_size.mul_ratio(units, 1000)
    }
}

/// Accented Latin-1 letters share the advance of their base letter in the
/// Helvetica AFM files.
fn fold_to_ascii(ch: char) -> char {
    match ch {
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ñ' => 'N',
        'Ò'..='Ö' | 'Ø' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' => 'Y',
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ñ' => 'n',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => ch,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontProgramKind {
    TrueType,
    OpenTypeCff,
}

#[derive(Debug)]
pub struct FontMetrics {
    pub first_char: u8,
    pub last_char: u8,
    pub widths: Vec<u16>,
    pub ascent: i16,
    pub descent: i16,
    pub cap_height: i16,
    pub italic_angle: i16,
    pub stem_v: i16,
    pub bbox: (i16, i16, i16, i16),
    pub missing_width: u16,
    pub is_fixed_pitch: bool,
    pub is_serif_like: bool,
}

/// A TrueType/OpenType program loaded for embedding as a simple WinAnsi font.
#[derive(Debug)]
pub struct EmbeddedFont {
    pub name: String,
    pub data: Vec<u8>,
    pub metrics: FontMetrics,
    pub program_kind: FontProgramKind,
}

impl EmbeddedFont {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CertPressError> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let source = path
            .file_stem()
            .and_then(|v| v.to_str())
            .unwrap_or("EmbeddedFont");
        Self::from_bytes(data, source)
    }

    pub fn from_bytes(data: Vec<u8>, source_name: &str) -> Result<Self, CertPressError> {
        let face = ttf_parser::Face::parse(&data, 0).map_err(|err| {
            CertPressError::InvalidConfiguration(format!(
                "invalid font data for {}: {}",
                source_name, err
            ))
        })?;
        let name = postscript_name(&face).unwrap_or_else(|| source_name.to_string());
        let (metrics, program_kind) = FontMetrics::from_face(&face);
        drop(face);
        Ok(Self {
            name: sanitize_font_name(&name),
            data,
            metrics,
            program_kind,
        })
    }

    fn advance(&self, byte: u8) -> u16 {
        if byte < self.metrics.first_char || byte > self.metrics.last_char {
            return self.metrics.missing_width;
        }
        let idx = (byte - self.metrics.first_char) as usize;
        self.metrics
            .widths
            .get(idx)
            .copied()
            .unwrap_or(self.metrics.missing_width)
    }
}

impl TextMeasure for EmbeddedFont {
    fn text_width(&self, text: &str, font_size: Pt) -> Pt {
        let (bytes, _) = winansi::encode_lossy(text);
        let units: i32 = bytes.iter().map(|b| self.advance(*b) as i32).sum();
        if units <= 0 {
            return Pt::ZERO;
        }
        font_size.mul_ratio(units, 1000)
    }
}

impl FontMetrics {
    fn from_face(face: &ttf_parser::Face<'_>) -> (Self, FontProgramKind) {
        let units_per_em = face.units_per_em().max(1);
        let scale = 1000.0 / units_per_em as f32;
        let first_char = 32u8;
        let last_char = 255u8;
        let widths = build_widths(face, scale, first_char, last_char);
        let missing_width = widths
            .get((b' ' - first_char) as usize)
            .copied()
            .unwrap_or(0);

        let ascent = scale_i16(face.ascender(), scale);
        let descent = scale_i16(face.descender(), scale);
        let cap_height = face
            .capital_height()
            .map(|value| scale_i16(value, scale))
            .unwrap_or(ascent);
        let bbox = face.global_bounding_box();
        let bbox = (
            scale_i16(bbox.x_min, scale),
            scale_i16(bbox.y_min, scale),
            scale_i16(bbox.x_max, scale),
            scale_i16(bbox.y_max, scale),
        );
        let italic_angle = face
            .italic_angle()
            .map(|value| value.round() as i16)
            .unwrap_or(0);
        let program_kind = if face.tables().cff.is_some() {
            FontProgramKind::OpenTypeCff
        } else {
            FontProgramKind::TrueType
        };

        (
            Self {
                first_char,
                last_char,
                widths,
                ascent,
                descent,
                cap_height,
                italic_angle,
                stem_v: 80,
                bbox,
                missing_width,
                is_fixed_pitch: face.is_monospaced(),
                is_serif_like: italic_angle != 0,
            },
            program_kind,
        )
    }

    /// PDF font descriptor flags: nonsymbolic, plus fixed-pitch and italic
    /// where the face says so.
    pub fn descriptor_flags(&self) -> i64 {
        let mut flags = 32;
        if self.is_fixed_pitch {
            flags |= 1;
        }
        if self.is_serif_like {
            flags |= 64;
        }
        flags
    }
}

fn build_widths(face: &ttf_parser::Face<'_>, scale: f32, first: u8, last: u8) -> Vec<u16> {
    let mut widths = Vec::with_capacity((last - first) as usize + 1);
    for code in first..=last {
        let width = winansi::decode_byte(code)
            .and_then(|ch| face.glyph_index(ch))
            .and_then(|id| face.glyph_hor_advance(id))
            .unwrap_or(0);
        let scaled = (width as f32 * scale).round() as i32;
        widths.push(scaled.clamp(0, u16::MAX as i32) as u16);
    }
    widths
}

fn scale_i16(value: i16, scale: f32) -> i16 {
    let scaled = (value as f32 * scale).round() as i32;
    scaled.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

fn postscript_name(face: &ttf_parser::Face<'_>) -> Option<String> {
    use ttf_parser::name::name_id;

    let mut family = None;
    let mut post = None;
    for entry in face.names() {
        let Some(name) = entry.to_string() else {
            continue;
        };
        match entry.name_id {
            name_id::POST_SCRIPT_NAME if post.is_none() => post = Some(name),
            name_id::FAMILY if family.is_none() => family = Some(name),
            _ => {}
        }
    }
    post.or(family)
}

pub(crate) fn sanitize_font_name(name: &str) -> String {
    let mut out = String::new();
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' {
            out.push(ch);
        } else if ch == ' ' {
            out.push('-');
        }
    }
    if out.is_empty() {
        "EmbeddedFont".to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helvetica_widths_match_afm() {
        let size = Pt::from_f32(10.0);
        // H=722 e=556 l=222 l=222 o=556
        assert_eq!(
            StandardFont::Helvetica.text_width("Hello", size),
            Pt::from_f32(22.78)
        );
        assert_eq!(
            StandardFont::HelveticaBold.text_width("Hello", size),
            Pt::from_f32(24.45)
        );
        assert_eq!(StandardFont::Helvetica.space_width(size), Pt::from_f32(2.78));
    }

    #[test]
    fn accented_letters_measure_like_their_base_letter() {
        let size = Pt::from_f32(12.0);
        assert_eq!(
            StandardFont::Helvetica.text_width("Peñaflor", size),
            StandardFont::Helvetica.text_width("Penaflor", size)
        );
    }

    #[test]
    fn standard_font_width_is_linear_in_size() {
        let a = StandardFont::Helvetica.text_width("Certificate", Pt::from_f32(10.0));
        let b = StandardFont::Helvetica.text_width("Certificate", Pt::from_f32(20.0));
        assert_eq!(a * 2, b);
    }

    #[test]
    fn sanitize_font_name_strips_pdf_delimiters() {
        assert_eq!(sanitize_font_name("Great Vibes/Regular"), "Great-VibesRegular");
        assert_eq!(sanitize_font_name("()"), "EmbeddedFont");
    }

    #[test]
    fn invalid_font_bytes_are_rejected() {
        let err = EmbeddedFont::from_bytes(b"not a font".to_vec(), "broken").expect_err("invalid");
        assert!(err.to_string().contains("invalid font data for broken"));
    }

    #[test]
    #[ignore = "needs a system TrueType font (DejaVu Sans or Liberation Sans)"]
    fn system_truetype_font_loads() {
        let candidates = [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        ];
        let path = candidates
            .iter()
            .find(|p| Path::new(p).exists())
            .expect("no system TrueType font installed");
        let font = EmbeddedFont::from_path(path).expect("load");
        assert_eq!(font.metrics.widths.len(), 224);
        assert!(font.text_width("Certificate", Pt::from_f32(12.0)) > Pt::ZERO);
        assert!(!font.name.is_empty());
    }
}
