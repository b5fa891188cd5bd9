//! Renderer instances: bind one entry, then report the rendered extent.
//!
//! Heights are only known after `bind` returns, because text height depends on
//! how the content wraps at the current width. The controller never asks for a
//! height before binding.

use std::sync::Arc;

use log::trace;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::entry::{Entry, Variant};

/// Text shown for a Text entry with nothing to display.
pub const FALLBACK_TEXT: &str = "Fallback Text";

/// Built-in fallback image, drawn for every Image entry.
pub const FALLBACK_IMAGE_ART: &str = include_str!("../assets/fallback_image.txt");

// ---------------------------------------------------------------------------
// RenderTemplate: shared construction parameters for renderer instances
// ---------------------------------------------------------------------------

/// Parameters every renderer instance is built and re-activated with.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTemplate {
    /// Available width in columns.
    pub width: usize,
    /// Extent of one displayed line.
    pub line_height: f64,
    /// Fallback image, one string per row.
    pub image_art: Arc<[String]>,
}

impl RenderTemplate {
    pub fn new(width: usize, line_height: f64) -> Self {
        Self {
            width: width.max(1),
            line_height,
            image_art: art_from_str(FALLBACK_IMAGE_ART),
        }
    }

    pub fn with_image_art(mut self, art: &str) -> Self {
        self.image_art = art_from_str(art);
        self
    }
}

impl Default for RenderTemplate {
    fn default() -> Self {
        Self::new(80, 1.0)
    }
}

/// Split art text into rows, dropping trailing blank rows.
pub fn art_from_str(art: &str) -> Arc<[String]> {
    let mut rows: Vec<String> = art.lines().map(|l| l.trim_end().to_string()).collect();
    while rows.last().is_some_and(|r| r.is_empty()) {
        rows.pop();
    }
    rows.into()
}

// ---------------------------------------------------------------------------
// Bind capability
// ---------------------------------------------------------------------------

/// The capability shared by all renderer variants.
pub trait Bind {
    /// Record `index` as this instance's identity and display `entry`.
    fn bind(&mut self, index: usize, entry: &Entry);

    /// Entry index currently displayed, `None` before the first bind.
    fn index(&self) -> Option<usize>;

    /// Rendered extent along the scroll axis.
    fn height(&self) -> f64;

    /// Displayed rows, already fitted to the template width.
    fn lines(&self) -> &[String];
}

#[derive(Debug)]
pub struct TextRenderer {
    index: Option<usize>,
    lines: Vec<String>,
    width: usize,
    line_height: f64,
    showing_fallback: bool,
}

impl TextRenderer {
    pub fn new(template: &RenderTemplate) -> Self {
        Self {
            index: None,
            lines: Vec::new(),
            width: template.width,
            line_height: template.line_height,
            showing_fallback: false,
        }
    }

    pub fn is_showing_fallback(&self) -> bool {
        self.showing_fallback
    }

    fn apply_template(&mut self, template: &RenderTemplate) {
        self.width = template.width;
        self.line_height = template.line_height;
    }

    fn set_text(&mut self, content: &str) {
        self.lines = wrap(content, self.width);
    }
}

impl Bind for TextRenderer {
    fn bind(&mut self, index: usize, entry: &Entry) {
        self.index = Some(index);
        let valid = entry.variant == Variant::Text && entry.is_valid();
        self.showing_fallback = !valid;
        if valid {
            self.set_text(&entry.content);
        } else {
            trace!("text[{index}]: invalid entry, showing fallback");
            self.set_text(FALLBACK_TEXT);
        }
    }

    fn index(&self) -> Option<usize> {
        self.index
    }

    fn height(&self) -> f64 {
        self.lines.len() as f64 * self.line_height
    }

    fn lines(&self) -> &[String] {
        &self.lines
    }
}

#[derive(Debug)]
pub struct ImageRenderer {
    index: Option<usize>,
    art: Arc<[String]>,
    lines: Vec<String>,
    width: usize,
    line_height: f64,
}

impl ImageRenderer {
    pub fn new(template: &RenderTemplate) -> Self {
        Self {
            index: None,
            art: Arc::clone(&template.image_art),
            lines: Vec::new(),
            width: template.width,
            line_height: template.line_height,
        }
    }

    fn apply_template(&mut self, template: &RenderTemplate) {
        self.art = Arc::clone(&template.image_art);
        self.width = template.width;
        self.line_height = template.line_height;
    }
}

impl Bind for ImageRenderer {
    fn bind(&mut self, index: usize, _entry: &Entry) {
        self.index = Some(index);
        // TODO: decode `entry.content` as an image path once an image backend
        // is wired in; until then every Image entry shows the fallback art.
        self.lines = self
            .art
            .iter()
            .map(|row| truncate_to_width(row, self.width))
            .collect();
    }

    fn index(&self) -> Option<usize> {
        self.index
    }

    fn height(&self) -> f64 {
        self.lines.len() as f64 * self.line_height
    }

    fn lines(&self) -> &[String] {
        &self.lines
    }
}

/// A renderer instance, tagged by the variant it displays.
#[derive(Debug)]
pub enum Renderer {
    Text(TextRenderer),
    Image(ImageRenderer),
}

impl Renderer {
    pub fn new(variant: Variant, template: &RenderTemplate) -> Self {
        match variant {
            Variant::Text => Renderer::Text(TextRenderer::new(template)),
            Variant::Image => Renderer::Image(ImageRenderer::new(template)),
        }
    }

    pub fn variant(&self) -> Variant {
        match self {
            Renderer::Text(_) => Variant::Text,
            Renderer::Image(_) => Variant::Image,
        }
    }

    /// Adopt new template parameters. Takes effect on the next `bind`.
    pub fn apply_template(&mut self, template: &RenderTemplate) {
        match self {
            Renderer::Text(r) => r.apply_template(template),
            Renderer::Image(r) => r.apply_template(template),
        }
    }

    fn as_bind(&self) -> &dyn Bind {
        match self {
            Renderer::Text(r) => r,
            Renderer::Image(r) => r,
        }
    }
}

impl Bind for Renderer {
    fn bind(&mut self, index: usize, entry: &Entry) {
        match self {
            Renderer::Text(r) => r.bind(index, entry),
            Renderer::Image(r) => r.bind(index, entry),
        }
    }

    fn index(&self) -> Option<usize> {
        self.as_bind().index()
    }

    fn height(&self) -> f64 {
        self.as_bind().height()
    }

    fn lines(&self) -> &[String] {
        self.as_bind().lines()
    }
}

// ---------------------------------------------------------------------------
// Text layout
// ---------------------------------------------------------------------------

/// Word-wrap `text` to `width` display columns.
///
/// Explicit newlines start a new row. Words wider than `width` are broken at
/// character boundaries. Always returns at least one row.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();

    for paragraph in text.split('\n') {
        let mut row = String::new();
        let mut row_w = 0usize;

        for word in paragraph.split_whitespace() {
            let word_w = word.width();
            let sep = usize::from(row_w > 0);

            if row_w + sep + word_w <= width {
                if sep == 1 {
                    row.push(' ');
                }
                row.push_str(word);
                row_w += sep + word_w;
                continue;
            }

            if row_w > 0 {
                rows.push(std::mem::take(&mut row));
                row_w = 0;
            }

            if word_w <= width {
                row.push_str(word);
                row_w = word_w;
                continue;
            }

            for ch in word.chars() {
                let ch_w = ch.width().unwrap_or(0);
                if row_w + ch_w > width && row_w > 0 {
                    rows.push(std::mem::take(&mut row));
                    row_w = 0;
                }
                row.push(ch);
                row_w += ch_w;
            }
        }

        rows.push(row);
    }

    rows
}

/// Cut `s` so its display width does not exceed `width`.
pub fn truncate_to_width(s: &str, width: usize) -> String {
    let mut out = String::new();
    let mut w = 0usize;
    for ch in s.chars() {
        let ch_w = ch.width().unwrap_or(0);
        if w + ch_w > width {
            break;
        }
        out.push(ch);
        w += ch_w;
    }
    out
}
