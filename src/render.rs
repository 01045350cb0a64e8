//! Certificate rendering: template resolution, font embedding, per-field
//! layout onto the page canvas, flattening and serialization.

use crate::acroform::{self, AcroForm, FormField};
use crate::canvas::Canvas;
use crate::compose::{compose, to_plain_text};
use crate::config::{Config, LayoutConfig, RenderConfig};
use crate::dates::{DATE_NOT_AVAILABLE, DateStyle, format_date};
use crate::error::{CertPressError, RenderWarning};
use crate::font::{EmbeddedFont, StandardFont, TextMeasure};
use crate::layout::{self, BoldMode, DrawFonts, FieldLayout, RichFonts};
use crate::metrics::{FieldMetrics, RenderMetrics};
use crate::model::{CertType, CertificateRequest, StyledSegment};
use crate::pdf::{
    add_embedded_font, add_page_resource, add_standard_font, append_page_content, load_document,
    save_document,
};
use crate::template::TemplateResolver;
use crate::types::Pt;
use lopdf::{Document as LoDocument, ObjectId as LoObjectId};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

const FONT_REGULAR: &str = "CpHelv";
const FONT_BOLD: &str = "CpHelvB";
const FONT_SCRIPT: &str = "CpScript";
const FONT_SCRIPT_BOLD: &str = "CpScriptB";

/// Face a field is set in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFace {
    Standard,
    StandardBold,
    Script,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldContent {
    Plain(String),
    Rich(Vec<StyledSegment>),
}

impl FieldContent {
    pub fn plain_text(&self) -> String {
        match self {
            FieldContent::Plain(text) => text.clone(),
            FieldContent::Rich(segments) => to_plain_text(segments),
        }
    }
}

/// One template field to fill.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldJob {
    pub name: &'static str,
    pub content: FieldContent,
    pub face: FieldFace,
    pub nominal_size: f32,
}

/// Independently formatted dates. Each one falls back to
/// `DATE_NOT_AVAILABLE` on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedDates {
    pub event: String,
    pub issued: String,
    pub issued_ordinal: String,
    pub created: String,
}

pub fn format_dates(request: &CertificateRequest) -> (FormattedDates, Vec<RenderWarning>) {
    let mut warnings = Vec::new();
    let mut format = |field: &'static str, raw: &str, styles: &[DateStyle]| -> Vec<String> {
        let formatted: Option<Vec<String>> =
            styles.iter().map(|style| format_date(raw, *style)).collect();
        match formatted {
            Some(values) => values,
            None => {
                warnings.push(RenderWarning::DateFormat {
                    field,
                    raw: raw.to_string(),
                });
                vec![DATE_NOT_AVAILABLE.to_string(); styles.len()]
            }
        }
    };
    let event = format("eventDate", &request.event_date, &[DateStyle::Long]);
    let issued = format(
        "issuedDate",
        &request.issued_date,
        &[DateStyle::Long, DateStyle::Ordinal],
    );
    let created = format("createdAt", &request.created_at, &[DateStyle::Long]);
    let dates = FormattedDates {
        event: event.concat(),
        issued: issued[0].clone(),
        issued_ordinal: issued[1].clone(),
        created: created.concat(),
    };
    (dates, warnings)
}

/// The fixed field table. Conditional fields are left out when their value
/// does not apply to this certificate.
pub fn plan_fields(request: &CertificateRequest, dates: &FormattedDates) -> Vec<FieldJob> {
    let job = |name: &'static str, text: &str, face: FieldFace, nominal_size: f32| FieldJob {
        name,
        content: FieldContent::Plain(text.trim().to_string()),
        face,
        nominal_size,
    };
    let body = compose(request, &dates.event, &dates.issued_ordinal);

    let mut jobs = vec![
        job("PARTICIPANT_NAME", &request.participant_name, FieldFace::Script, 28.0),
        FieldJob {
            name: "CERTIFICATE_BODY",
            content: FieldContent::Rich(body),
            face: FieldFace::Script,
            nominal_size: 12.0,
        },
    ];
    if request.cert_type() == CertType::Recognition {
        jobs.push(job(
            "EVENT_ROLE",
            request.recognition_role(),
            FieldFace::StandardBold,
            12.0,
        ));
    }
    jobs.extend([
        job("EVENT_NAME", &request.event_name, FieldFace::Script, 20.0),
        job("EVENT_VENUE", &request.event_venue, FieldFace::Standard, 11.0),
        job("EVENT_VENUE2", &request.event_venue, FieldFace::Standard, 11.0),
        job("PARTICIPANT_ROLE", &request.participant_role, FieldFace::Standard, 11.0),
        job("PARTICIPANT_SCHOOL", &request.participant_school, FieldFace::Standard, 11.0),
        job("PARTICIPANT_UNIT", &request.participant_unit, FieldFace::Standard, 11.0),
        job("EVENT_DATE", &dates.event, FieldFace::Standard, 11.0),
        job("EVENT_DATE2", &dates.event, FieldFace::Standard, 11.0),
        job("ISSUED_DATE", &dates.issued, FieldFace::Standard, 11.0),
        job("ISSUED_DATE2", &dates.issued, FieldFace::Standard, 11.0),
        job("DURATION", request.duration().unwrap_or(""), FieldFace::Standard, 11.0),
    ]);
    if let Some(units) = request.cpd_units() {
        jobs.push(job("CPD_UNITS", units, FieldFace::StandardBold, 11.0));
    }
    if let Some(prc) = request.prc_number() {
        jobs.push(job("PRC_NUMBER", prc, FieldFace::Standard, 10.0));
    }
    jobs.extend([
        job("CERTIFICATE_NUMBER", &request.certificate_number, FieldFace::Standard, 9.0),
        job("CREATED_DATE", &dates.created, FieldFace::Standard, 9.0),
        job("ISSUER_NAME", &request.issuer_name, FieldFace::StandardBold, 12.0),
    ]);
    jobs
}

#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub bytes: Vec<u8>,
    pub template: PathBuf,
    pub warnings: Vec<RenderWarning>,
    pub metrics: RenderMetrics,
}

#[derive(Debug, Clone)]
pub struct RenderedFile {
    pub path: PathBuf,
    pub output: RenderOutput,
}

/// Fonts available to one render, with their document object ids.
struct RenderFonts {
    helvetica: LoObjectId,
    helvetica_bold: LoObjectId,
    script: Option<(EmbeddedFont, LoObjectId)>,
    script_bold: Option<(EmbeddedFont, LoObjectId)>,
}

impl RenderFonts {
    fn resource_id(&self, name: &str) -> Option<LoObjectId> {
        match name {
            FONT_REGULAR => Some(self.helvetica),
            FONT_BOLD => Some(self.helvetica_bold),
            FONT_SCRIPT => self.script.as_ref().map(|(_, id)| *id),
            FONT_SCRIPT_BOLD => self.script_bold.as_ref().map(|(_, id)| *id),
            _ => None,
        }
    }

    fn bold_mode(&self, cfg: &LayoutConfig) -> BoldMode {
        if self.script_bold.is_some() {
            BoldMode::Font
        } else {
            BoldMode::FauxOffset {
                offset: cfg.faux_bold_offset,
            }
        }
    }
}

fn embed_font(
    doc: &mut LoDocument,
    path: &Path,
    warnings: &mut Vec<RenderWarning>,
) -> Option<(EmbeddedFont, LoObjectId)> {
    match EmbeddedFont::from_path(path) {
        Ok(font) => {
            let id = add_embedded_font(doc, &font);
            debug!(font = %font.name, path = %path.display(), "embedded script font");
            Some((font, id))
        }
        Err(err) => {
            let warning = RenderWarning::FontEmbed {
                path: path.to_path_buf(),
                reason: err.to_string(),
            };
            warn!(%warning, "script font unavailable; script fields use native form fill");
            warnings.push(warning);
            None
        }
    }
}

/// File name for a rendered certificate: `<number>_<name>.pdf` with anything
/// outside `[A-Za-z0-9]` in the name (and path-unsafe characters in the
/// number) replaced by `_`.
pub fn output_file_name(request: &CertificateRequest) -> String {
    let number: String = request
        .certificate_number
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let name: String = request
        .participant_name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_{}.pdf", number, name)
}

pub struct CertificateRenderer {
    resolver: TemplateResolver,
    render: RenderConfig,
    layout: LayoutConfig,
}

impl CertificateRenderer {
    pub fn new(render: RenderConfig, layout: LayoutConfig) -> Self {
        Self {
            resolver: TemplateResolver::from_config(&render),
            render,
            layout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.render.clone(), config.layout)
    }

    pub fn resolver(&self) -> &TemplateResolver {
        &self.resolver
    }

    pub fn render_to_bytes(
        &self,
        request: &CertificateRequest,
    ) -> Result<RenderOutput, CertPressError> {
        self.render_document(request)
    }

    /// Renders and writes `<output_dir>/<number>_<name>.pdf`. Nothing is
    /// written unless serialization succeeded.
    pub fn render_to_file(
        &self,
        request: &CertificateRequest,
    ) -> Result<RenderedFile, CertPressError> {
        let output = self.render_document(request)?;
        fs::create_dir_all(&self.render.output_dir)?;
        let path = self.render.output_dir.join(output_file_name(request));
        fs::write(&path, &output.bytes)?;
        info!(
            path = %path.display(),
            bytes = output.bytes.len(),
            "certificate written"
        );
        Ok(RenderedFile { path, output })
    }

    fn render_document(
        &self,
        request: &CertificateRequest,
    ) -> Result<RenderOutput, CertPressError> {
        let started = Instant::now();
        let template = self
            .resolver
            .resolve(&request.cert_type, request.cpd_units.as_deref())?;
        let template_bytes =
            fs::read(&template).map_err(|e| CertPressError::generation("load template", e))?;
        let mut doc = load_document(&template_bytes)
            .map_err(|e| CertPressError::generation("load template", e))?;
        info!(
            certificate = %request.certificate_number,
            cert_type = request.cert_type().as_str(),
            template = %template.display(),
            "rendering certificate"
        );

        let mut warnings = Vec::new();
        let fonts = RenderFonts {
            helvetica: add_standard_font(&mut doc, StandardFont::Helvetica),
            helvetica_bold: add_standard_font(&mut doc, StandardFont::HelveticaBold),
            script: embed_font(&mut doc, &self.render.font_path, &mut warnings),
            script_bold: match &self.render.bold_font_path {
                Some(path) => embed_font(&mut doc, path, &mut warnings),
                None => None,
            },
        };

        let (dates, date_warnings) = format_dates(request);
        for warning in &date_warnings {
            warn!(%warning, "date replaced with placeholder");
        }
        warnings.extend(date_warnings);

        let form = AcroForm::read(&doc);
        let mut metrics = RenderMetrics::default();
        let mut canvases: BTreeMap<LoObjectId, Canvas> = BTreeMap::new();
        for job in plan_fields(request, &dates) {
            let Some(field) = form
                .field(job.name)
                .filter(|f| f.primary_widget().is_some())
            else {
                let warning = RenderWarning::FieldNotFound {
                    field: job.name.to_string(),
                };
                warn!(%warning, "skipping field");
                warnings.push(warning);
                metrics.fields_skipped += 1;
                continue;
            };
            let field_metrics = self
                .fill_field(&mut doc, &fonts, field, &job, &mut canvases)
                .map_err(|e| CertPressError::generation("layout", e))?;
            metrics.record(field_metrics);
        }

        for (page_id, canvas) in &canvases {
            if canvas.is_empty() {
                continue;
            }
            for name in canvas.font_resources() {
                if let Some(font_id) = fonts.resource_id(&name) {
                    add_page_resource(&mut doc, *page_id, "Font", &name, font_id)
                        .map_err(|e| CertPressError::generation("layout", e))?;
                }
            }
            let content = canvas.to_content();
            if content.replaced_chars > 0 {
                debug!(
                    replaced = content.replaced_chars,
                    "characters outside WinAnsi replaced"
                );
            }
            append_page_content(&mut doc, *page_id, content.bytes)
                .map_err(|e| CertPressError::generation("layout", e))?;
        }

        let stats =
            acroform::flatten(&mut doc).map_err(|e| CertPressError::generation("flatten", e))?;
        metrics.widgets_flattened = stats.widgets_flattened;
        let bytes =
            save_document(&mut doc).map_err(|e| CertPressError::generation("serialize", e))?;
        metrics.output_bytes = bytes.len();
        metrics.render_ms = started.elapsed().as_secs_f64() * 1000.0;
        info!(
            certificate = %request.certificate_number,
            drawn = metrics.fields_drawn,
            native = metrics.fields_native,
            skipped = metrics.fields_skipped,
            bytes = metrics.output_bytes,
            "certificate rendered"
        );
        Ok(RenderOutput {
            bytes,
            template,
            warnings,
            metrics,
        })
    }

    fn fill_field(
        &self,
        doc: &mut LoDocument,
        fonts: &RenderFonts,
        field: &FormField,
        job: &FieldJob,
        canvases: &mut BTreeMap<LoObjectId, Canvas>,
    ) -> Result<FieldMetrics, CertPressError> {
        let nominal = Pt::from_f32(job.nominal_size);
        let script = fonts.script.as_ref().map(|(font, _)| font);
        if job.face == FieldFace::Script && script.is_none() {
            let text = job.content.plain_text();
            acroform::fill_native(doc, field, &text, fonts.helvetica, nominal, &self.layout)?;
            debug!(field = job.name, "filled natively");
            return Ok(FieldMetrics {
                field: job.name.to_string(),
                font_size: job.nominal_size,
                line_count: 1,
                shrink_steps: 0,
                native: true,
            });
        }

        let helvetica = StandardFont::Helvetica;
        let helvetica_bold = StandardFont::HelveticaBold;
        let (measure, regular_resource): (&dyn TextMeasure, &str) = match (job.face, script) {
            (FieldFace::Script, Some(font)) => (font as &dyn TextMeasure, FONT_SCRIPT),
            (FieldFace::StandardBold, _) => (&helvetica_bold as &dyn TextMeasure, FONT_BOLD),
            _ => (&helvetica as &dyn TextMeasure, FONT_REGULAR),
        };
        let bold_mode = fonts.bold_mode(&self.layout);
        let (bold_measure, bold_resource): (&dyn TextMeasure, &str) =
            match (&fonts.script_bold, job.face) {
                (Some((font, _)), FieldFace::Script) => (font as &dyn TextMeasure, FONT_SCRIPT_BOLD),
                _ => (measure, regular_resource),
            };

        let mut result: Option<FieldLayout> = None;
        for widget in &field.widgets {
            let Some(page_id) = widget.page_id else {
                continue;
            };
            let layout = match &job.content {
                FieldContent::Rich(segments) => layout::layout_rich(
                    &widget.rect,
                    segments,
                    RichFonts {
                        regular: measure,
                        bold: bold_measure,
                    },
                    nominal,
                    field.align(),
                    &self.layout,
                ),
                FieldContent::Plain(text) if field.is_multiline() => layout::layout_wrapped(
                    &widget.rect,
                    text,
                    measure,
                    nominal,
                    field.align(),
                    &self.layout,
                ),
                FieldContent::Plain(text) => layout::layout_single_line(
                    &widget.rect,
                    text,
                    measure,
                    nominal,
                    field.align(),
                    &self.layout,
                ),
            };
            debug!(
                field = job.name,
                size = layout.font_size.to_f32(),
                lines = layout.lines.len(),
                shrink_steps = layout.shrink_steps,
                truncated = layout.truncated,
                "field laid out"
            );
            let canvas = canvases.entry(page_id).or_default();
            layout::draw(
                canvas,
                &layout,
                DrawFonts {
                    regular: regular_resource,
                    bold: bold_resource,
                },
                bold_mode,
                self.layout.text_color,
            );
            result.get_or_insert(layout);
        }
        acroform::clear_field(doc, field)?;

        Ok(match result {
            Some(layout) => FieldMetrics {
                field: job.name.to_string(),
                font_size: layout.font_size.to_f32(),
                line_count: layout.lines.len(),
                shrink_steps: layout.shrink_steps,
                native: false,
            },
            None => FieldMetrics {
                field: job.name.to_string(),
                font_size: job.nominal_size,
                ..FieldMetrics::default()
            },
        })
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{request, temp_dir, write_template};
    use super::*;
    use crate::acroform::fixtures::{FieldSpec, form_document};
    use crate::config::RenderConfig;
    use crate::pdf::load_document;

    fn renderer(dir: &Path) -> CertificateRenderer {
        let render = RenderConfig {
            templates_dir: dir.to_path_buf(),
            default_template: dir.join("participation.pdf"),
            font_path: dir.join("missing-script.ttf"),
            bold_font_path: None,
            output_dir: dir.join("out"),
        };
        CertificateRenderer::new(render, LayoutConfig::default())
    }

    fn job_names(jobs: &[FieldJob]) -> Vec<&'static str> {
        jobs.iter().map(|j| j.name).collect()
    }

    #[test]
    fn dates_are_formatted_independently() {
        let mut req = request();
        req.created_at = "not a date".to_string();
        let (dates, warnings) = format_dates(&req);
        assert_eq!(dates.event, "January 5, 2025");
        assert_eq!(dates.issued, "January 6, 2025");
        assert_eq!(dates.issued_ordinal, "6th day of January 2025");
        assert_eq!(dates.created, DATE_NOT_AVAILABLE);
        assert_eq!(
            warnings,
            vec![RenderWarning::DateFormat {
                field: "createdAt",
                raw: "not a date".to_string()
            }]
        );
    }

    #[test]
    fn conditional_fields_follow_type_and_sentinels() {
        let req = request();
        let (dates, _) = format_dates(&req);
        let names = job_names(&plan_fields(&req, &dates));
        assert!(!names.contains(&"EVENT_ROLE"));
        assert!(!names.contains(&"CPD_UNITS"));
        assert!(!names.contains(&"PRC_NUMBER"));
        assert!(names.contains(&"EVENT_VENUE2"));

        let mut recognition = request();
        recognition.cert_type = "recognition".to_string();
        recognition.cpd_units = Some("3.0".to_string());
        recognition.prc_number = Some("0012345".to_string());
        let jobs = plan_fields(&recognition, &dates);
        let names = job_names(&jobs);
        assert!(names.contains(&"EVENT_ROLE"));
        assert!(names.contains(&"CPD_UNITS"));
        assert!(names.contains(&"PRC_NUMBER"));
        let body = jobs
            .iter()
            .find(|j| j.name == "CERTIFICATE_BODY")
            .expect("body");
        assert!(matches!(body.content, FieldContent::Rich(_)));
    }

    #[test]
    fn missing_script_font_falls_back_to_native_fill() {
        let dir = temp_dir("native");
        write_template(&dir, "participation.pdf");
        let output = renderer(&dir).render_to_bytes(&request()).expect("render");

        assert!(output
            .warnings
            .iter()
            .any(|w| matches!(w, RenderWarning::FontEmbed { .. })));
        assert_eq!(output.metrics.fields_native, 3);
        assert_eq!(output.metrics.fields_drawn, 3);
        assert!(output.metrics.fields_skipped > 0);
        assert_eq!(output.metrics.widgets_flattened, 3);

        let doc = load_document(&output.bytes).expect("reload");
        assert!(AcroForm::read(&doc).is_empty());
        let page_id = crate::pdf::first_page_id(&doc).expect("page");
        let content = doc.get_page_content(page_id).expect("content");
        let content = String::from_utf8_lossy(&content);
        assert!(content.contains("(CERT-2025-0042) Tj"));
        assert!(content.contains("(January 6, 2025) Tj"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn absent_fields_are_skipped_with_warnings() {
        let dir = temp_dir("skip");
        write_template(&dir, "participation.pdf");
        let output = renderer(&dir).render_to_bytes(&request()).expect("render");
        let missing: Vec<String> = output
            .warnings
            .iter()
            .filter_map(|w| match w {
                RenderWarning::FieldNotFound { field } => Some(field.clone()),
                _ => None,
            })
            .collect();
        assert!(missing.contains(&"DURATION".to_string()));
        assert!(missing.contains(&"ISSUER_NAME".to_string()));
        assert!(!missing.contains(&"CERTIFICATE_NUMBER".to_string()));
        assert_eq!(output.metrics.fields_skipped, missing.len());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn rendering_twice_makes_the_same_layout_decisions() {
        let dir = temp_dir("deterministic");
        write_template(&dir, "participation.pdf");
        let renderer = renderer(&dir);
        let a = renderer.render_to_bytes(&request()).expect("first");
        let b = renderer.render_to_bytes(&request()).expect("second");
        assert_eq!(a.metrics.fields, b.metrics.fields);
        assert_eq!(a.bytes.len(), b.bytes.len());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn render_to_file_uses_number_and_sanitized_name() {
        let dir = temp_dir("file");
        write_template(&dir, "participation.pdf");
        let mut req = request();
        req.participant_name = "María  dela Cruz-Santos".to_string();
        let rendered = renderer(&dir).render_to_file(&req).expect("render");
        assert_eq!(
            rendered.path,
            dir.join("out").join("CERT-2025-0042_Mar_a__dela_Cruz_Santos.pdf")
        );
        let on_disk = std::fs::read(&rendered.path).expect("read output");
        assert_eq!(on_disk, rendered.output.bytes);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_template_writes_nothing() {
        let dir = temp_dir("no_template");
        let err = renderer(&dir).render_to_file(&request()).expect_err("no template");
        assert!(matches!(err, CertPressError::TemplateNotFound { .. }));
        assert!(!dir.join("out").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    /// The `Tf` operator in effect for the first text object showing `needle`.
    fn tf_before(content: &str, needle: &str) -> String {
        let at = content.find(needle).expect("text drawn");
        content[..at]
            .lines()
            .rev()
            .find(|line| line.ends_with(" Tf"))
            .expect("font set")
            .to_string()
    }

    fn field_size(output: &RenderOutput, name: &str) -> f32 {
        output
            .metrics
            .fields
            .iter()
            .find(|f| f.field == name)
            .map(|f| f.font_size)
            .expect("field metrics")
    }

    #[test]
    fn each_field_is_drawn_at_its_laid_out_size() {
        let dir = temp_dir("sizes");
        let (mut doc, _) = form_document(&[
            FieldSpec::new("CREATED_DATE", [400.0, 20.0, 580.0, 36.0]),
            FieldSpec::new("ISSUER_NAME", [320.0, 120.0, 560.0, 150.0]),
            FieldSpec::new("CERTIFICATE_NUMBER", [400.0, 40.0, 580.0, 56.0]),
        ]);
        std::fs::write(
            dir.join("participation.pdf"),
            save_document(&mut doc).expect("save"),
        )
        .expect("write template");

        let output = renderer(&dir).render_to_bytes(&request()).expect("render");
        assert_eq!(field_size(&output, "CREATED_DATE"), 9.0);
        assert_eq!(field_size(&output, "ISSUER_NAME"), 12.0);
        assert_eq!(field_size(&output, "CERTIFICATE_NUMBER"), 9.0);

        let doc = load_document(&output.bytes).expect("reload");
        let page_id = crate::pdf::first_page_id(&doc).expect("page");
        let content = doc.get_page_content(page_id).expect("content");
        let content = String::from_utf8_lossy(&content);
        assert_eq!(tf_before(&content, "(January 6, 2025) Tj"), "/CpHelv 9 Tf");
        assert_eq!(tf_before(&content, "(Dr. Jose Cruz) Tj"), "/CpHelvB 12 Tf");
        assert_eq!(tf_before(&content, "(CERT-2025-0042) Tj"), "/CpHelv 9 Tf");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    #[ignore = "needs DejaVu Sans at /usr/share/fonts/truetype/dejavu"]
    fn script_font_draws_body_with_faux_bold() {
        let font_path = Path::new("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf");
        assert!(font_path.exists(), "missing {}", font_path.display());
        let dir = temp_dir("script");
        write_template(&dir, "participation.pdf");
        let mut renderer = renderer(&dir);
        renderer.render.font_path = font_path.to_path_buf();
        let output = renderer.render_to_bytes(&request()).expect("render");
        assert_eq!(output.metrics.fields_native, 0);
        let doc = load_document(&output.bytes).expect("reload");
        let page_id = crate::pdf::first_page_id(&doc).expect("page");
        let content = doc.get_page_content(page_id).expect("content");
        let content = String::from_utf8_lossy(&content);
        assert!(content.contains("/CpScript 28 Tf"));
        let body_size = field_size(&output, "CERTIFICATE_BODY");
        assert_eq!(
            tf_before(&content, "(Division) Tj"),
            format!("/CpScript {} Tf", crate::types::fmt(body_size))
        );
        // Bold words are drawn three times in faux-bold mode.
        assert_eq!(content.matches("(Division) Tj").count(), 3);
        assert!(content.contains("(Division Science Fair) Tj"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
