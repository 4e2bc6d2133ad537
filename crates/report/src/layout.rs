use anyhow::{anyhow, Result};
use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 25.0;
const BODY_SIZE: f32 = 11.0;
const PT_TO_MM: f32 = 0.3528;

/// Top-to-bottom text cursor over an A4 document. Starts a new page when the
/// cursor reaches the bottom margin.
pub struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
    pages: usize,
}

impl PageWriter {
    pub fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Page 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| anyhow!("Failed to load Helvetica: {:?}", e))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| anyhow!("Failed to load Helvetica-Bold: {:?}", e))?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT - MARGIN,
            pages: 1,
        })
    }

    pub fn page_break(&mut self) {
        self.pages += 1;
        let (page, layer) = self.doc.add_page(
            Mm(PAGE_WIDTH),
            Mm(PAGE_HEIGHT),
            format!("Page {}", self.pages),
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn advance(&mut self, size: f32) {
        let line_height = size * PT_TO_MM * 1.5;
        if self.y - line_height < MARGIN {
            self.page_break();
        }
        self.y -= line_height;
    }

    fn put(&self, text: &str, size: f32, x: f32, bold: bool) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.use_text(sanitize(text), size, Mm(x), Mm(self.y), font);
    }

    pub fn title(&mut self, text: &str) {
        self.advance(24.0);
        self.put(text, 24.0, MARGIN, true);
        self.space(10.0);
    }

    pub fn heading(&mut self, text: &str) {
        self.space(4.0);
        self.advance(16.0);
        self.put(text, 16.0, MARGIN, true);
        self.space(3.0);
    }

    pub fn subheading(&mut self, text: &str) {
        self.space(2.0);
        self.advance(13.0);
        self.put(text, 13.0, MARGIN, true);
    }

    pub fn paragraph(&mut self, text: &str) {
        let width = chars_per_line(BODY_SIZE, PAGE_WIDTH - 2.0 * MARGIN);
        for line in wrap(text, width) {
            self.advance(BODY_SIZE);
            self.put(&line, BODY_SIZE, MARGIN, false);
        }
        self.space(2.0);
    }

    /// Bold label column followed by a wrapped value column.
    pub fn field(&mut self, label: &str, value: &str) {
        let label_width = 55.0;
        let width = chars_per_line(BODY_SIZE, PAGE_WIDTH - 2.0 * MARGIN - label_width);
        for (i, line) in wrap(value, width).into_iter().enumerate() {
            self.advance(BODY_SIZE);
            if i == 0 {
                self.put(label, BODY_SIZE, MARGIN, true);
            }
            self.put(&line, BODY_SIZE, MARGIN + label_width, false);
        }
    }

    /// Fixed-column table; cells are truncated to their column.
    pub fn table(&mut self, columns: &[(&str, f32)], rows: &[Vec<String>]) {
        self.advance(BODY_SIZE);
        let mut x = MARGIN;
        for (name, width) in columns {
            self.put(name, BODY_SIZE, x, true);
            x += width;
        }
        for row in rows {
            self.advance(BODY_SIZE);
            let mut x = MARGIN;
            for ((_, width), cell) in columns.iter().zip(row) {
                let max = chars_per_line(BODY_SIZE, *width - 2.0);
                let cell: String = cell.chars().take(max).collect();
                self.put(&cell, BODY_SIZE, x, false);
                x += width;
            }
        }
        self.space(3.0);
    }

    pub fn space(&mut self, mm: f32) {
        self.y -= mm;
    }

    pub fn save(self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .map_err(|e| anyhow!("Failed to create {}: {}", path.display(), e))?;
        self.doc
            .save(&mut BufWriter::new(file))
            .map_err(|e| anyhow!("Failed to write PDF {}: {:?}", path.display(), e))
    }
}

/// Rough Helvetica capacity: average glyph is about half the font size wide.
fn chars_per_line(size: f32, width_mm: f32) -> usize {
    let glyph_mm = size * PT_TO_MM * 0.5;
    ((width_mm / glyph_mm).floor() as usize).max(1)
}

/// Greedy word wrap. Paragraph breaks in the input are kept; words longer than
/// a line are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for para in text.lines() {
        let mut current = String::new();
        for word in para.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                lines.push(word.drain(..width).collect());
            }
            let word: String = word.into_iter().collect();
            if word.is_empty() {
                continue;
            }

            let word_len = word.chars().count();
            let needed = if current.is_empty() {
                word_len
            } else {
                current.chars().count() + 1 + word_len
            };
            if needed > width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&word);
        }
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Only printable ASCII goes through the builtin fonts; anything else becomes '?'.
fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect()
}

pub fn thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if n < 0 { format!("-{}", out) } else { out }
}

pub fn money(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    format!("${}.{:02}", thousands(cents / 100), (cents % 100).abs())
}

pub fn percent(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}

/// "medical_response" -> "Medical Response"
pub fn title_case(s: &str) -> String {
    s.split(|c: char| c == '_' || c == ' ')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
