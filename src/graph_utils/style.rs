use serde::{Deserialize, Serialize};

/// Visual weight of a node on the canvas.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    #[default]
    Planet,
    Moon,
}

impl NodeKind {
    /// Radius in world units used for drawing and hit testing.
    pub fn radius(self) -> f32 {
        match self {
            NodeKind::Planet => 28.0,
            NodeKind::Moon => 16.0,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkStyle {
    #[default]
    Solid,
    Dashed,
}

/// Category of the note a node was derived from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteCategory {
    Idea,
    Code,
    Design,
    Meeting,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CategoryStyle {
    pub icon: &'static str,
    pub color: &'static str,
}

impl NoteCategory {
    pub const ALL: [NoteCategory; 4] = [
        NoteCategory::Idea,
        NoteCategory::Code,
        NoteCategory::Design,
        NoteCategory::Meeting,
    ];

    pub fn style(self) -> CategoryStyle {
        match self {
            NoteCategory::Idea => CategoryStyle { icon: "lightbulb", color: "#FFD166" },
            NoteCategory::Code => CategoryStyle { icon: "code", color: "#118AB2" },
            NoteCategory::Design => CategoryStyle { icon: "palette", color: "#EF476F" },
            NoteCategory::Meeting => CategoryStyle { icon: "groups", color: "#06D6A0" },
        }
    }
}

// Colours handed out to uncategorised notes
pub const PALETTE: [&str; 6] = ["#FFD166", "#06D6A0", "#118AB2", "#EF476F", "#073B4C", "#8338EC"];

/// Pick a palette colour from the first character of a note id.
pub fn palette_color_for(key: &str) -> &'static str {
    let first = key.chars().next().map(|c| c as usize).unwrap_or(0);
    PALETTE[first % PALETTE.len()]
}

/// Glyph drawn inside a node for a named icon. Unknown names fall back to a dot.
pub fn icon_glyph(icon: &str) -> &'static str {
    match icon {
        "lightbulb" => "💡",
        "code" => "⌨",
        "palette" => "🎨",
        "groups" => "👥",
        "star" => "★",
        "hub" => "◎",
        "book" => "📖",
        _ => "●",
    }
}
