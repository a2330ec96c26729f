// src/notify/format.rs
//! Telegram HTML rendering for offers. Pure functions, no I/O.

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::types::{preview, Offer};

/// Telegram limits (in characters) for photo captions and text messages.
pub const CAPTION_MAX_CHARS: usize = 1024;
pub const MESSAGE_MAX_CHARS: usize = 4096;

const LINK_LABEL: &str = "Ver oferta";
const NO_IMAGE_NOTE: &str = "(imagem indisponível)";
const TITLE_ELLIPSIS: &str = "…";
/// Upstream price strings are short; anything longer is junk we cut.
const PRICE_MAX_CHARS: usize = 64;

/// `<b>title</b>\nprice\n<a href="url">Ver oferta</a>`, at most [`CAPTION_MAX_CHARS`].
pub fn format_caption(offer: &Offer) -> String {
    render(offer, CAPTION_MAX_CHARS)
}

/// Caption layout plus a note that the image could not be sent.
pub fn format_fallback_text(offer: &Offer) -> String {
    let note = format!("\n<i>{NO_IMAGE_NOTE}</i>");
    let body = render(offer, MESSAGE_MAX_CHARS - note.chars().count());
    format!("{body}{note}")
}

/// Title is cut first; the link line goes only when it cannot fit next to
/// the shortest possible head. Cuts happen on raw text, before escaping.
fn render(offer: &Offer, max_chars: usize) -> String {
    let price = encode_text(&preview(offer.price_display.trim(), PRICE_MAX_CHARS)).to_string();
    let mut link = link_line(offer);
    let min_head = head(TITLE_ELLIPSIS, &price).chars().count();
    if !link.is_empty() && min_head + 1 + link.chars().count() > max_chars {
        link.clear();
    }
    let budget = if link.is_empty() {
        max_chars
    } else {
        max_chars - link.chars().count() - 1
    };
    let top = shorten_head(offer.title.trim(), &price, budget);
    if link.is_empty() {
        top
    } else {
        format!("{top}\n{link}")
    }
}

fn head(title_html: &str, price_html: &str) -> String {
    format!("<b>{title_html}</b>\n{price_html}")
}

fn link_line(offer: &Offer) -> String {
    let url = offer.url.trim();
    if url.is_empty() {
        return String::new();
    }
    format!(
        "<a href=\"{}\">{LINK_LABEL}</a>",
        encode_double_quoted_attribute(url)
    )
}

/// Cut the raw title until the escaped head fits, so no entity gets split.
/// An empty title cut always fits: the price is bounded.
fn shorten_head(title: &str, price: &str, budget: usize) -> String {
    let full = head(&encode_text(title), price);
    if full.chars().count() <= budget {
        return full;
    }
    let mut title_chars = budget.min(title.chars().count());
    loop {
        let cut: String = title.chars().take(title_chars).collect();
        let shortened = head(&format!("{}{TITLE_ELLIPSIS}", encode_text(&cut)), price);
        if shortened.chars().count() <= budget || title_chars == 0 {
            return shortened;
        }
        title_chars = title_chars.saturating_sub(16);
    }
}
