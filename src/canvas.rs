use crate::types::{Color, Pt, fmt, fmt_pt};
use crate::winansi;

/// Drawing operations in PDF user space (origin bottom-left). Coordinates are
/// used as-is; a `DrawString` position is the text baseline.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SaveState,
    RestoreState,
    SetFillColor(Color),
    // Resource name under the page's /Font dictionary.
    SetFontName(String),
    SetFontSize(Pt),
    DrawString {
        x: Pt,
        y: Pt,
        text: String,
    },
    DrawImage {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
        resource_id: String,
    },
}

fn default_font_size() -> Pt {
    Pt::from_f32(12.0)
}

#[derive(Debug, Clone)]
struct GraphicsState {
    fill_color: Option<Color>,
    font_size: Pt,
    font_name: String,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            fill_color: None,
            font_size: default_font_size(),
            font_name: String::new(),
        }
    }
}

/// Records commands for one content stream that is later appended to a page.
#[derive(Debug, Default)]
pub struct Canvas {
    commands: Vec<Command>,
    state_stack: Vec<GraphicsState>,
    current_state: GraphicsState,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_state(&mut self) {
        self.state_stack.push(self.current_state.clone());
        self.commands.push(Command::SaveState);
    }

    pub fn restore_state(&mut self) {
        if let Some(state) = self.state_stack.pop() {
            self.current_state = state;
            self.commands.push(Command::RestoreState);
        }
    }

    pub fn set_fill_color(&mut self, color: Color) {
        if self.current_state.fill_color == Some(color) {
            return;
        }
        self.current_state.fill_color = Some(color);
        self.commands.push(Command::SetFillColor(color));
    }

    pub fn set_font_name(&mut self, name: &str) {
        if self.current_state.font_name == name {
            return;
        }
        self.current_state.font_name = name.to_string();
        self.commands
            .push(Command::SetFontName(self.current_state.font_name.clone()));
    }

    pub fn set_font_size(&mut self, size: Pt) {
        if self.current_state.font_size == size {
            return;
        }
        self.current_state.font_size = size;
        self.commands.push(Command::SetFontSize(size));
    }

    pub fn draw_string(&mut self, x: Pt, y: Pt, text: impl Into<String>) {
        self.commands.push(Command::DrawString {
            x,
            y,
            text: text.into(),
        });
    }

    pub fn draw_image(
        &mut self,
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
        resource_id: impl Into<String>,
    ) {
        self.commands.push(Command::DrawImage {
            x,
            y,
            width,
            height,
            resource_id: resource_id.into(),
        });
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Resource names of every font the recorded text uses.
    pub fn font_resources(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for cmd in &self.commands {
            if let Command::SetFontName(name) = cmd {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
        }
        out
    }

    /// Serializes the recording as content-stream operators. The stream is
    /// wrapped in `q`/`Q` so it cannot leak state into whatever follows it.
    pub fn to_content(&self) -> ContentStream {
        render_commands(&self.commands)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContentStream {
    pub bytes: Vec<u8>,
    /// Characters outside WinAnsi that were replaced with `?`.
    pub replaced_chars: usize,
}

fn render_commands(commands: &[Command]) -> ContentStream {
    let mut out = String::from("q\n");
    let mut replaced_chars = 0usize;
    // Mirrors the canvas state stack so a restore brings back the font the
    // recorder believes is current.
    let mut current_font_size = default_font_size();
    let mut current_font_name: Option<&str> = None;
    let mut saved: Vec<(Pt, Option<&str>)> = Vec::new();

    for cmd in commands {
        match cmd {
            Command::SaveState => {
                saved.push((current_font_size, current_font_name));
                out.push_str("q\n");
            }
            Command::RestoreState => {
                if let Some((size, name)) = saved.pop() {
                    current_font_size = size;
                    current_font_name = name;
                }
                out.push_str("Q\n");
            }
            Command::SetFillColor(color) => {
                out.push_str(&format!(
                    "{} {} {} rg\n",
                    fmt(color.r),
                    fmt(color.g),
                    fmt(color.b)
                ));
            }
            Command::SetFontName(name) => current_font_name = Some(name.as_str()),
            Command::SetFontSize(size) => current_font_size = *size,
            Command::DrawString { x, y, text } => {
                let Some(resource) = current_font_name else {
                    continue;
                };
                let (bytes, replaced) = winansi::encode_lossy(text);
                replaced_chars += replaced;
                out.push_str("BT\n");
                out.push_str(&format!("/{} {} Tf\n", resource, fmt_pt(current_font_size)));
                out.push_str(&format!("{} {} Td\n", fmt_pt(*x), fmt_pt(*y)));
                out.push('(');
                out.push_str(&winansi::pdf_literal(&bytes));
                out.push_str(") Tj\nET\n");
            }
            Command::DrawImage {
                x,
                y,
                width,
                height,
                resource_id,
            } => {
                out.push_str("q\n");
                out.push_str(&format!(
                    "{} 0 0 {} {} {} cm\n",
                    fmt_pt(*width),
                    fmt_pt(*height),
                    fmt_pt(*x),
                    fmt_pt(*y)
                ));
                out.push_str(&format!("/{} Do\n", resource_id));
                out.push_str("Q\n");
            }
        }
    }
    out.push_str("Q\n");
    ContentStream {
        bytes: out.into_bytes(),
        replaced_chars,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_string_emits_positioned_text_object() {
        let mut canvas = Canvas::new();
        canvas.set_font_name("F1");
        canvas.set_font_size(Pt::from_f32(14.5));
        canvas.draw_string(Pt::from_f32(100.0), Pt::from_f32(200.25), "Maria (Ria)");
        let content = String::from_utf8(canvas.to_content().bytes).expect("ascii");
        assert_eq!(
            content,
            "q\nBT\n/F1 14.5 Tf\n100 200.25 Td\n(Maria \\(Ria\\)) Tj\nET\nQ\n"
        );
    }

    #[test]
    fn redundant_state_changes_are_not_recorded() {
        let mut canvas = Canvas::new();
        canvas.set_font_name("F1");
        canvas.set_font_name("F1");
        canvas.set_font_size(Pt::from_f32(10.0));
        canvas.set_font_size(Pt::from_f32(10.0));
        canvas.set_fill_color(Color::BLACK);
        canvas.set_fill_color(Color::BLACK);
        assert_eq!(canvas.commands().len(), 3);
        assert_eq!(canvas.font_resources(), vec!["F1".to_string()]);
    }

    #[test]
    fn text_without_font_is_skipped_and_images_are_scaled() {
        let mut canvas = Canvas::new();
        canvas.draw_string(Pt::ZERO, Pt::ZERO, "orphan");
        canvas.draw_image(
            Pt::from_f32(10.0),
            Pt::from_f32(20.0),
            Pt::from_f32(90.0),
            Pt::from_f32(40.0),
            "Im1",
        );
        let content = String::from_utf8(canvas.to_content().bytes).expect("ascii");
        assert!(!content.contains("orphan"));
        assert!(content.contains("90 0 0 40 10 20 cm\n/Im1 Do\n"));
    }

    #[test]
    fn restore_state_restores_tracked_font() {
        let mut canvas = Canvas::new();
        canvas.set_font_name("F1");
        canvas.save_state();
        canvas.set_font_name("F2");
        canvas.restore_state();
        canvas.set_font_name("F1");
        assert_eq!(
            canvas.commands(),
            &[
                Command::SetFontName("F1".to_string()),
                Command::SaveState,
                Command::SetFontName("F2".to_string()),
                Command::RestoreState,
            ]
        );
    }

    #[test]
    fn font_size_after_restore_matches_recorded_state() {
        let mut canvas = Canvas::new();
        canvas.save_state();
        canvas.set_font_name("F1");
        canvas.set_font_size(Pt::from_f32(28.0));
        canvas.draw_string(Pt::ZERO, Pt::ZERO, "Name");
        canvas.restore_state();
        canvas.save_state();
        canvas.set_font_name("F1");
        canvas.set_font_size(Pt::from_f32(12.0));
        canvas.draw_string(Pt::ZERO, Pt::ZERO, "Body");
        canvas.restore_state();
        let content = String::from_utf8(canvas.to_content().bytes).expect("ascii");
        assert!(content.contains("/F1 28 Tf\n0 0 Td\n(Name) Tj"));
        assert!(content.contains("/F1 12 Tf\n0 0 Td\n(Body) Tj"));
    }

    #[test]
    fn unencodable_characters_are_counted() {
        let mut canvas = Canvas::new();
        canvas.set_font_name("F1");
        canvas.draw_string(Pt::ZERO, Pt::ZERO, "\u{4E2D}\u{6587}");
        assert_eq!(canvas.to_content().replaced_chars, 2);
    }
}
