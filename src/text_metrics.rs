use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

// Loaded font faces only; per-label widths are memoised by each layout run.
static FONT_BOOK: Lazy<Mutex<FontBook>> = Lazy::new(|| Mutex::new(FontBook::new()));

/// Measures `text` with the first matching system font. `None` when no face
/// can be resolved.
pub fn measure_text_width(text: &str, font_size: f32, font_family: &str, bold: bool) -> Option<f32> {
    if text.is_empty() || font_size <= 0.0 {
        return Some(0.0);
    }
    let mut book = FONT_BOOK.lock().ok()?;
    let face = book.face(font_family, bold)?;
    face.measure(text, font_size)
}

struct FontBook {
    db: Database,
    loaded_system_fonts: bool,
    faces: HashMap<(String, bool), Option<LoadedFace>>,
}

impl FontBook {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            faces: HashMap::new(),
        }
    }

    fn face(&mut self, font_family: &str, bold: bool) -> Option<&mut LoadedFace> {
        let key = (normalize_family_key(font_family), bold);
        if !self.faces.contains_key(&key) {
            let loaded = self.load(&key.0, bold);
            self.faces.insert(key.clone(), loaded);
        }
        self.faces.get_mut(&key).and_then(|face| face.as_mut())
    }

    fn load(&mut self, font_family: &str, bold: bool) -> Option<LoadedFace> {
        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        let names: Vec<&str> = font_family
            .split(',')
            .map(|part| part.trim().trim_matches('"').trim_matches('\''))
            .filter(|part| !part.is_empty())
            .collect();
        let mut families: Vec<Family<'_>> = names.iter().map(|name| generic_family(name)).collect();
        if families.is_empty() {
            families.push(Family::SansSerif);
        }

        let query = Query {
            families: &families,
            weight: if bold { Weight::BOLD } else { Weight::NORMAL },
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        self.db
            .with_face_data(id, |data, index| LoadedFace::parse(data.to_vec(), index))
            .flatten()
    }
}

fn generic_family(name: &str) -> Family<'_> {
    match name.to_ascii_lowercase().as_str() {
        "serif" => Family::Serif,
        "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => Family::SansSerif,
        "monospace" | "ui-monospace" => Family::Monospace,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        _ => Family::Name(name),
    }
}

fn normalize_family_key(font_family: &str) -> String {
    let trimmed = font_family.trim();
    if trimmed.is_empty() {
        "sans-serif".to_string()
    } else {
        trimmed.to_string()
    }
}

struct LoadedFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: u16,
    advances: HashMap<char, Option<u16>>,
}

impl LoadedFace {
    fn parse(data: Vec<u8>, index: u32) -> Option<Self> {
        let units_per_em = Face::parse(&data, index).ok()?.units_per_em().max(1);
        Some(Self {
            data,
            index,
            units_per_em,
            advances: HashMap::new(),
        })
    }

    fn measure(&mut self, text: &str, font_size: f32) -> Option<f32> {
        let face = Face::parse(&self.data, self.index).ok()?;
        let scale = font_size / self.units_per_em as f32;
        let fallback = font_size * 0.56;
        let mut width = 0.0f32;
        for ch in text.chars().filter(|ch| *ch != '\n') {
            let advance = *self.advances.entry(ch).or_insert_with(|| {
                face.glyph_index(ch)
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
            });
            width += match advance {
                Some(units) if units > 0 => units as f32 * scale,
                _ => fallback,
            };
        }
        Some(width.max(0.0))
    }
}
