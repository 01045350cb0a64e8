use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldMetrics {
    pub field: String,
    pub font_size: f32,
    pub line_count: usize,
    pub shrink_steps: u32,
    pub native: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderMetrics {
    pub fields: Vec<FieldMetrics>,
    pub fields_drawn: usize,
    pub fields_skipped: usize,
    pub fields_native: usize,
    pub total_shrink_steps: u32,
    pub widgets_flattened: usize,
    pub render_ms: f64,
    pub output_bytes: usize,
}

impl RenderMetrics {
    pub(crate) fn record(&mut self, field: FieldMetrics) {
        if field.native {
            self.fields_native += 1;
        } else {
            self.fields_drawn += 1;
        }
        self.total_shrink_steps += field.shrink_steps;
        self.fields.push(field);
    }
}
