use crate::error::CertPressError;
use crate::types::{Color, Pt};
use std::path::PathBuf;

/// Where templates, fonts and rendered certificates live.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub templates_dir: PathBuf,
    pub default_template: PathBuf,
    pub font_path: PathBuf,
    pub bold_font_path: Option<PathBuf>,
    pub output_dir: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let templates_dir = PathBuf::from("assets/templates");
        Self {
            default_template: templates_dir.join("participation.pdf"),
            templates_dir,
            font_path: PathBuf::from("assets/fonts/script.ttf"),
            bold_font_path: None,
            output_dir: PathBuf::from("generated/certificates"),
        }
    }
}

/// Tunables of the field layout engine, shrink floors included.
#[derive(Debug, Clone, Copy)]
pub struct LayoutConfig {
    pub horizontal_padding: Pt,
    pub vertical_padding: Pt,
    pub shrink_step: Pt,
    pub single_line_floor_ratio: f32,
    pub min_font_size: Pt,
    pub rich_min_font_size: Pt,
    pub wrap_line_height_factor: f32,
    pub rich_line_height_factor: f32,
    pub baseline_factor: f32,
    pub cap_center_factor: f32,
    pub faux_bold_offset: Pt,
    pub text_color: Color,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            horizontal_padding: Pt::from_f32(10.0),
            vertical_padding: Pt::from_f32(4.0),
            shrink_step: Pt::from_f32(0.5),
            single_line_floor_ratio: 0.5,
            min_font_size: Pt::from_f32(6.0),
            rich_min_font_size: Pt::from_f32(8.0),
            wrap_line_height_factor: 2.0,
            rich_line_height_factor: 1.8,
            baseline_factor: 0.7,
            cap_center_factor: 0.35,
            faux_bold_offset: Pt::from_f32(0.3),
            text_color: Color::BLACK,
        }
    }
}

impl LayoutConfig {
    /// Lowest size the single-line shrink may reach for a given nominal size.
    pub fn single_line_floor(&self, nominal: Pt) -> Pt {
        (nominal * self.single_line_floor_ratio).max(self.min_font_size)
    }

    /// `shrink_step`, never below 0.1pt so a shrink loop always makes progress.
    pub fn effective_shrink_step(&self) -> Pt {
        self.shrink_step.max(Pt::from_f32(MIN_SHRINK_STEP))
    }
}

const MIN_SHRINK_STEP: f32 = 0.1;

#[derive(Debug, Clone)]
pub struct SigningConfig {
    pub p12_path: Option<PathBuf>,
    pub p12_password: String,
    pub signature_image: PathBuf,
    pub signer_role: String,
    pub signer_name: String,
    pub signer_title: String,
    pub reason: String,
    pub location: String,
    pub stamp_bottom_offset: Pt,
    pub stamp_font_size: Pt,
    pub stamp_image_width: Pt,
    pub stamp_image_height: Pt,
    pub stamp_gap: Pt,
    pub signature_reserve_bytes: usize,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            p12_path: None,
            p12_password: String::new(),
            signature_image: PathBuf::from("assets/signature.png"),
            signer_role: "Digitally signed by:".to_string(),
            signer_name: "Schools Division Superintendent".to_string(),
            signer_title: "Office of the Schools Division".to_string(),
            reason: "Certificate issuance".to_string(),
            location: "Schools Division Office".to_string(),
            stamp_bottom_offset: Pt::from_f32(36.0),
            stamp_font_size: Pt::from_f32(7.0),
            stamp_image_width: Pt::from_f32(90.0),
            stamp_image_height: Pt::from_f32(40.0),
            stamp_gap: Pt::from_f32(6.0),
            signature_reserve_bytes: 8192,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub render: RenderConfig,
    pub layout: LayoutConfig,
    pub signing: SigningConfig,
}

impl Config {
    /// Loads `.env` (when present) and reads `CERTPRESS_*` variables.
    pub fn from_env() -> Result<Self, CertPressError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, CertPressError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut render = RenderConfig::default();
        if let Some(dir) = var("CERTPRESS_TEMPLATES_DIR") {
            render.templates_dir = PathBuf::from(dir);
            render.default_template = render.templates_dir.join("participation.pdf");
        }
        if let Some(path) = var("CERTPRESS_DEFAULT_TEMPLATE") {
            render.default_template = PathBuf::from(path);
        }
        if let Some(path) = var("CERTPRESS_FONT_PATH") {
            render.font_path = PathBuf::from(path);
        }
        render.bold_font_path = var("CERTPRESS_BOLD_FONT_PATH").map(PathBuf::from);
        if let Some(dir) = var("CERTPRESS_OUTPUT_DIR") {
            render.output_dir = PathBuf::from(dir);
        }

        let mut layout = LayoutConfig::default();
        if let Some(raw) = var("CERTPRESS_SINGLE_LINE_FLOOR_RATIO") {
            let ratio = parse_f32("CERTPRESS_SINGLE_LINE_FLOOR_RATIO", &raw)?;
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(CertPressError::InvalidConfiguration(format!(
                    "CERTPRESS_SINGLE_LINE_FLOOR_RATIO must be in (0, 1], got {}",
                    raw
                )));
            }
            layout.single_line_floor_ratio = ratio;
        }
        if let Some(raw) = var("CERTPRESS_MIN_FONT_SIZE") {
            layout.min_font_size = parse_size("CERTPRESS_MIN_FONT_SIZE", &raw)?;
        }
        if let Some(raw) = var("CERTPRESS_RICH_MIN_FONT_SIZE") {
            layout.rich_min_font_size = parse_size("CERTPRESS_RICH_MIN_FONT_SIZE", &raw)?;
        }

        let mut signing = SigningConfig::default();
        signing.p12_path = var("CERTPRESS_P12_PATH").map(PathBuf::from);
        if let Some(password) = lookup("CERTPRESS_P12_PASSWORD") {
            signing.p12_password = password;
        }
        if let Some(path) = var("CERTPRESS_SIGNATURE_IMAGE") {
            signing.signature_image = PathBuf::from(path);
        }
        if let Some(role) = var("CERTPRESS_SIGNER_ROLE") {
            signing.signer_role = role;
        }
        if let Some(name) = var("CERTPRESS_SIGNER_NAME") {
            signing.signer_name = name;
        }
        if let Some(title) = var("CERTPRESS_SIGNER_TITLE") {
            signing.signer_title = title;
        }
        if let Some(raw) = var("CERTPRESS_SIGNATURE_RESERVE_BYTES") {
            signing.signature_reserve_bytes = raw.trim().parse::<usize>().map_err(|_| {
                CertPressError::InvalidConfiguration(format!(
                    "CERTPRESS_SIGNATURE_RESERVE_BYTES is not a byte count: {}",
                    raw
                ))
            })?;
        }

        Ok(Self {
            render,
            layout,
            signing,
        })
    }
}

fn parse_f32(key: &str, raw: &str) -> Result<f32, CertPressError> {
    raw.trim()
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            CertPressError::InvalidConfiguration(format!("{} is not a number: {}", key, raw))
        })
}

fn parse_size(key: &str, raw: &str) -> Result<Pt, CertPressError> {
    let value = parse_f32(key, raw)?;
    if value <= 0.0 {
        return Err(CertPressError::InvalidConfiguration(format!(
            "{} must be positive, got {}",
            key, raw
        )));
    }
    Ok(Pt::from_f32(value))
}
