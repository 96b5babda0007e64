//! Text measurement and fitting for legend labels (Plotters has no text metrics without a
//! loaded font, so widths are estimated).

/// Average glyph width as a fraction of the font size for a sans face.
const GLYPH_WIDTH_RATIO: f32 = 0.60;

/// Heuristic pixel width of `text` at `font_px`.
pub fn estimate_text_width_px(text: &str, font_px: u32) -> u32 {
    (text.chars().count() as f32 * font_px as f32 * GLYPH_WIDTH_RATIO).ceil() as u32
}

/// Longest prefix (plus `…`) of `text` that fits in `max_px`.
pub fn truncate_to_width(text: &str, font_px: u32, max_px: u32) -> String {
    if estimate_text_width_px(text, font_px) <= max_px {
        return text.to_string();
    }
    let chars: Vec<char> = text.chars().collect();
    let mut keep = chars.len();
    while keep > 0 {
        keep -= 1;
        let candidate: String = chars[..keep].iter().collect::<String>() + "…";
        if estimate_text_width_px(&candidate, font_px) <= max_px {
            return candidate;
        }
    }
    String::new()
}

/// Greedy word wrap to `max_px`; single words that are too long are truncated.
pub fn wrap_text_to_width(text: &str, font_px: u32, max_px: u32) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        let candidate = if cur.is_empty() {
            word.to_string()
        } else {
            format!("{cur} {word}")
        };
        if estimate_text_width_px(&candidate, font_px) <= max_px {
            cur = candidate;
            continue;
        }
        if !cur.is_empty() {
            lines.push(std::mem::take(&mut cur));
        }
        cur = truncate_to_width(word, font_px, max_px);
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_on_word_boundaries() {
        // 10px font -> ~6px per char; 66px fits 10 chars
        let lines = wrap_text_to_width("Lower Monumental-Chinook", 10, 66);
        assert_eq!(lines, vec!["Lower".to_string(), "Monumenta…".to_string()]);
    }

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_to_width("Wells", 10, 60), "Wells");
        assert_eq!(wrap_text_to_width("Wells Dam", 10, 60), vec!["Wells Dam".to_string()]);
    }
}
