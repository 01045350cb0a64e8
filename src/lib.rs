//! Certificate document production: fills PDF form templates with auto-fitted
//! text, flattens them and applies a visible, cryptographic signature.
//!
//! The pipeline is synchronous and keeps no shared state between calls. A
//! host service can hold one [`CertificateRenderer`] and one [`PdfSigner`]
//! and call them from any number of worker threads.

mod acroform;
mod bulk;
mod canvas;
mod compose;
mod config;
mod dates;
mod error;
mod font;
mod layout;
mod metrics;
mod model;
mod pdf;
mod pdfinspect;
mod render;
mod sign;
mod template;
mod types;
mod winansi;

pub use acroform::{AcroForm, FlattenStats, FormField, Widget};
pub use bulk::{BulkSignOutcome, BulkSignReport, IssuedCertificate, sign_all, signed_path};
pub use canvas::{Canvas, Command, ContentStream};
pub use compose::{compose, to_plain_text};
pub use config::{Config, LayoutConfig, RenderConfig, SigningConfig};
pub use dates::{DATE_NOT_AVAILABLE, DateStyle, format_date, parse_date};
pub use error::{CertPressError, RenderWarning};
pub use font::{EmbeddedFont, StandardFont, TextMeasure};
pub use layout::{
    Align, BoldMode, DrawFonts, FieldLayout, LayoutLine, PlacedRun, RichFonts, TextAtom, draw,
    flatten_segments, layout_rich, layout_single_line, layout_wrapped, measure_rich,
};
pub use metrics::{FieldMetrics, RenderMetrics};
pub use model::{CertType, CertificateRequest, StyledSegment, has_cpd_units};
pub use pdfinspect::{
    PdfInspectError, PdfInspectErrorCode, PdfInspectReport, inspect_pdf_bytes, inspect_pdf_path,
};
pub use render::{
    CertificateRenderer, FieldContent, FieldFace, FieldJob, FormattedDates, RenderOutput,
    RenderedFile, format_dates, output_file_name, plan_fields,
};
pub use sign::{PdfSigner, SignedDocument};
pub use template::{
    APPEARANCE_TEMPLATE, PARTICIPATION_TEMPLATE, RECOGNITION_NO_CPD_TEMPLATE,
    RECOGNITION_TEMPLATE, TemplateResolver,
};
pub use types::{Color, Pt, Rect};

pub type Result<T> = std::result::Result<T, CertPressError>;
