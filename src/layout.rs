//! Field layout: fitting plain strings and styled paragraphs into a form
//! widget rectangle. Everything here is pure arithmetic over `Pt`; the only
//! side effect is `draw`, which records commands onto a `Canvas`.

use crate::canvas::Canvas;
use crate::config::LayoutConfig;
use crate::font::TextMeasure;
use crate::model::StyledSegment;
use crate::types::{Color, Pt, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    /// Maps an AcroForm `/Q` quadding value.
    pub fn from_quadding(q: i64) -> Self {
        match q {
            1 => Align::Center,
            2 => Align::Right,
            _ => Align::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoldMode {
    /// Bold words are drawn three times, nudged by `offset` right and up.
    FauxOffset { offset: Pt },
    /// Bold words are drawn once with a real bold font resource.
    Font,
}

/// One whitespace-delimited word. `glued` marks a word that continues the
/// previous one across a segment boundary with no whitespace between them
/// (`2025` followed by `, at`), so the two are kept on one line and drawn
/// without a space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextAtom {
    pub text: String,
    pub bold: bool,
    pub glued: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutLine {
    pub atoms: Vec<TextAtom>,
    pub width: Pt,
}

/// One string to draw at a baseline position.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedRun {
    pub x: Pt,
    pub y: Pt,
    pub text: String,
    pub bold: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldLayout {
    pub font_size: Pt,
    pub line_height: Pt,
    pub total_height: Pt,
    pub lines: Vec<LayoutLine>,
    pub runs: Vec<PlacedRun>,
    pub shrink_steps: u32,
    pub truncated: bool,
}

/// Regular and bold measurement for rich paragraphs. In faux-bold mode both
/// point at the same font, since bold words are drawn with the regular face.
#[derive(Clone, Copy)]
pub struct RichFonts<'a> {
    pub regular: &'a dyn TextMeasure,
    pub bold: &'a dyn TextMeasure,
}

impl<'a> RichFonts<'a> {
    pub fn single(font: &'a dyn TextMeasure) -> Self {
        Self {
            regular: font,
            bold: font,
        }
    }

    fn atom_width(&self, atom: &TextAtom, size: Pt) -> Pt {
        if atom.bold {
            self.bold.text_width(&atom.text, size)
        } else {
            self.regular.text_width(&atom.text, size)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Overflow {
    /// Cut an over-wide word to its longest fitting prefix.
    Truncate,
    /// Let an over-wide word sit alone on its line.
    OwnLine,
}

/// Splits every segment at whitespace. Words never cross segment boundaries
/// and keep their segment's weight.
pub fn flatten_segments(segments: &[StyledSegment]) -> Vec<TextAtom> {
    let mut atoms: Vec<TextAtom> = Vec::new();
    let mut boundary_space = true;
    for segment in segments {
        let text = segment.text.as_str();
        if text.is_empty() {
            continue;
        }
        let starts_with_space = text.starts_with(char::is_whitespace);
        for (idx, word) in text.split_whitespace().enumerate() {
            atoms.push(TextAtom {
                text: word.to_string(),
                bold: segment.is_bold,
                glued: idx == 0 && !starts_with_space && !boundary_space,
            });
        }
        boundary_space = text.trim().is_empty() || text.ends_with(char::is_whitespace);
    }
    atoms
}

/// Joins atoms back into text: one space between words, none before a glued
/// atom.
pub fn atoms_text(atoms: &[TextAtom]) -> String {
    let mut out = String::new();
    for (idx, atom) in atoms.iter().enumerate() {
        if idx > 0 && !atom.glued {
            out.push(' ');
        }
        out.push_str(&atom.text);
    }
    out
}

fn plain_atoms(text: &str) -> Vec<TextAtom> {
    text.split_whitespace()
        .map(|word| TextAtom {
            text: word.to_string(),
            bold: false,
            glued: false,
        })
        .collect()
}

/// Groups glued atoms into the units line breaking works with.
fn words(atoms: &[TextAtom]) -> Vec<&[TextAtom]> {
    let mut out = Vec::new();
    let mut start = 0;
    for idx in 1..=atoms.len() {
        if idx == atoms.len() || !atoms[idx].glued {
            if start < idx {
                out.push(&atoms[start..idx]);
            }
            start = idx;
        }
    }
    out
}

fn break_lines(
    atoms: &[TextAtom],
    fonts: RichFonts<'_>,
    size: Pt,
    max_width: Pt,
    overflow: Overflow,
) -> (Vec<LayoutLine>, bool) {
    let space = fonts.regular.space_width(size);
    let mut lines = Vec::new();
    let mut current: Vec<TextAtom> = Vec::new();
    let mut current_width = Pt::ZERO;
    let mut truncated = false;

    for word in words(atoms) {
        let mut word = word.to_vec();
        let mut width: Pt = word.iter().map(|a| fonts.atom_width(a, size)).sum();
        if width > max_width && overflow == Overflow::Truncate && word.len() == 1 {
            truncated = true;
            let Some(prefix) = longest_fitting_prefix(&word[0], fonts, size, max_width) else {
                continue;
            };
            width = fonts.atom_width(&prefix, size);
            word = vec![prefix];
        }

        if current.is_empty() {
            current_width = width;
        } else if current_width + space + width <= max_width {
            current_width += space + width;
        } else {
            lines.push(LayoutLine {
                atoms: std::mem::take(&mut current),
                width: current_width,
            });
            current_width = width;
        }
        current.extend(word);
    }
    if !current.is_empty() {
        lines.push(LayoutLine {
            atoms: current,
            width: current_width,
        });
    }
    (lines, truncated)
}

fn longest_fitting_prefix(
    atom: &TextAtom,
    fonts: RichFonts<'_>,
    size: Pt,
    max_width: Pt,
) -> Option<TextAtom> {
    let mut best = None;
    for (idx, ch) in atom.text.char_indices() {
        let end = idx + ch.len_utf8();
        let candidate = TextAtom {
            text: atom.text[..end].to_string(),
            bold: atom.bold,
            glued: atom.glued,
        };
        if fonts.atom_width(&candidate, size) > max_width {
            break;
        }
        best = Some(candidate);
    }
    best
}

fn line_x(rect: &Rect, line_width: Pt, align: Align, cfg: &LayoutConfig) -> Pt {
    let half_pad = cfg.horizontal_padding.mul_ratio(1, 2);
    match align {
        Align::Left => rect.x + half_pad,
        Align::Center => rect.x + (rect.width - line_width).mul_ratio(1, 2),
        Align::Right => rect.right() - half_pad - line_width,
    }
}

/// Vertically centers `lines` in `rect` and turns them into draw runs. Plain
/// lines become one run each; rich lines get one run per word so weight can
/// change mid-line.
#[allow(clippy::too_many_arguments)]
fn place_lines(
    rect: &Rect,
    lines: &[LayoutLine],
    fonts: RichFonts<'_>,
    size: Pt,
    line_height: Pt,
    align: Align,
    per_atom: bool,
    cfg: &LayoutConfig,
) -> Vec<PlacedRun> {
    let total = line_height * lines.len() as i32;
    let first_baseline =
        rect.center_y() + total.mul_ratio(1, 2) - line_height * cfg.baseline_factor;
    let space = fonts.regular.space_width(size);
    let mut runs = Vec::new();
    let mut baseline = first_baseline;
    for line in lines {
        let mut x = line_x(rect, line.width, align, cfg);
        if per_atom {
            for (idx, atom) in line.atoms.iter().enumerate() {
                if idx > 0 && !atom.glued {
                    x += space;
                }
                runs.push(PlacedRun {
                    x,
                    y: baseline,
                    text: atom.text.clone(),
                    bold: atom.bold,
                });
                x += fonts.atom_width(atom, size);
            }
        } else {
            runs.push(PlacedRun {
                x,
                y: baseline,
                text: atoms_text(&line.atoms),
                bold: false,
            });
        }
        baseline -= line_height;
    }
    runs
}

/// Mode 1: one line, shrunk in `effective_shrink_step` increments until it fits the
/// padded width or reaches the single-line floor.
pub fn layout_single_line(
    rect: &Rect,
    text: &str,
    font: &dyn TextMeasure,
    nominal: Pt,
    align: Align,
    cfg: &LayoutConfig,
) -> FieldLayout {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let available = rect.width - cfg.horizontal_padding;
    let floor = cfg.single_line_floor(nominal);
    let mut size = nominal;
    let mut shrink_steps = 0u32;
    let mut width = font.text_width(&text, size);
    while width > available && size > floor {
        size = (size - cfg.effective_shrink_step()).max(floor);
        shrink_steps += 1;
        width = font.text_width(&text, size);
    }

    let mut lines = Vec::new();
    let mut runs = Vec::new();
    if !text.is_empty() {
        let x = line_x(rect, width, align, cfg);
        let y = rect.center_y() - size * cfg.cap_center_factor;
        runs.push(PlacedRun {
            x,
            y,
            text: text.clone(),
            bold: false,
        });
        lines.push(LayoutLine {
            atoms: vec![TextAtom {
                text,
                bold: false,
                glued: false,
            }],
            width,
        });
    }
    FieldLayout {
        font_size: size,
        line_height: size,
        total_height: if lines.is_empty() { Pt::ZERO } else { size },
        lines,
        runs,
        shrink_steps,
        truncated: false,
    }
}

/// Mode 2, plain: greedy word wrap at a fixed size. Words wider than the
/// padded width are cut to their longest fitting prefix.
pub fn layout_wrapped(
    rect: &Rect,
    text: &str,
    font: &dyn TextMeasure,
    size: Pt,
    align: Align,
    cfg: &LayoutConfig,
) -> FieldLayout {
    let fonts = RichFonts::single(font);
    let available = rect.width - cfg.horizontal_padding;
    let atoms = plain_atoms(text);
    let (lines, truncated) = break_lines(&atoms, fonts, size, available, Overflow::Truncate);
    let line_height = size * cfg.wrap_line_height_factor;
    let runs = place_lines(rect, &lines, fonts, size, line_height, align, false, cfg);
    FieldLayout {
        font_size: size,
        line_height,
        total_height: line_height * lines.len() as i32,
        lines,
        runs,
        shrink_steps: 0,
        truncated,
    }
}

/// Height of `atoms` wrapped to `width` at `size`.
pub fn measure_rich(
    atoms: &[TextAtom],
    fonts: RichFonts<'_>,
    size: Pt,
    width: Pt,
    cfg: &LayoutConfig,
) -> Pt {
    let (lines, _) = break_lines(atoms, fonts, size, width, Overflow::OwnLine);
    size * cfg.rich_line_height_factor * lines.len() as i32
}

/// Mode 2, rich: wraps mixed-weight words and shrinks the size until the
/// block fits the padded height or the rich floor is reached. Wrapping is
/// redone at every candidate size.
pub fn layout_rich(
    rect: &Rect,
    segments: &[StyledSegment],
    fonts: RichFonts<'_>,
    nominal: Pt,
    align: Align,
    cfg: &LayoutConfig,
) -> FieldLayout {
    let atoms = flatten_segments(segments);
    let available_width = rect.width - cfg.horizontal_padding;
    let available_height = rect.height - cfg.vertical_padding;
    let floor = cfg.rich_min_font_size;
    let mut size = nominal;
    let mut shrink_steps = 0u32;
    while measure_rich(&atoms, fonts, size, available_width, cfg) > available_height
        && size > floor
    {
        size = (size - cfg.effective_shrink_step()).max(floor);
        shrink_steps += 1;
    }

    let (lines, _) = break_lines(&atoms, fonts, size, available_width, Overflow::OwnLine);
    let line_height = size * cfg.rich_line_height_factor;
    let runs = place_lines(rect, &lines, fonts, size, line_height, align, true, cfg);
    FieldLayout {
        font_size: size,
        line_height,
        total_height: line_height * lines.len() as i32,
        lines,
        runs,
        shrink_steps,
        truncated: false,
    }
}

/// Font resource names a layout is drawn with.
#[derive(Debug, Clone, Copy)]
pub struct DrawFonts<'a> {
    pub regular: &'a str,
    pub bold: &'a str,
}

pub fn draw(
    canvas: &mut Canvas,
    layout: &FieldLayout,
    fonts: DrawFonts<'_>,
    bold_mode: BoldMode,
    color: Color,
) {
    if layout.runs.is_empty() {
        return;
    }
    canvas.save_state();
    canvas.set_fill_color(color);
    canvas.set_font_size(layout.font_size);
    for run in &layout.runs {
        if !run.bold {
            canvas.set_font_name(fonts.regular);
            canvas.draw_string(run.x, run.y, run.text.as_str());
            continue;
        }
        match bold_mode {
            BoldMode::Font => {
                canvas.set_font_name(fonts.bold);
                canvas.draw_string(run.x, run.y, run.text.as_str());
            }
            BoldMode::FauxOffset { offset } => {
                canvas.set_font_name(fonts.regular);
                canvas.draw_string(run.x, run.y, run.text.as_str());
                canvas.draw_string(run.x + offset, run.y, run.text.as_str());
                canvas.draw_string(run.x, run.y + offset, run.text.as_str());
            }
        }
    }
    canvas.restore_state();
}
