// src/sources/fields.rs
//! Declarative field probing for loosely-typed upstream JSON.
//!
//! Each logical field has an ordered list of candidate keys; the first key
//! holding a usable value wins. Tables are per source, see the contract
//! tests at the bottom for the response shapes they are known to cover.

use serde_json::Value;

pub const DEFAULT_CURRENCY: &str = "R$";

#[derive(Debug, Clone, Copy)]
pub struct FieldTable {
    pub id: &'static [&'static str],
    pub title: &'static [&'static str],
    /// Numeric price candidates (JSON number or numeric string).
    pub price_numeric: &'static [&'static str],
    /// Divisor applied to the numeric price (public search uses 1/100000 units).
    pub price_scale: f64,
    /// Already formatted price strings, used only when no numeric price exists.
    pub price_text: &'static [&'static str],
    pub url: &'static [&'static str],
    pub image: &'static [&'static str],
}

pub const AFFILIATE_FIELDS: FieldTable = FieldTable {
    id: &["itemId", "item_id", "productId", "id"],
    title: &["productName", "name", "title"],
    price_numeric: &["priceMin", "price", "priceMax"],
    price_scale: 1.0,
    price_text: &["priceDisplay", "priceText", "priceFormatted"],
    url: &["offerLink", "productLink", "link", "url"],
    image: &["imageUrl", "image_url", "image"],
};

pub const PUBLIC_FIELDS: FieldTable = FieldTable {
    id: &["itemid", "item_id"],
    title: &["name", "title"],
    price_numeric: &["price", "price_min", "price_max"],
    price_scale: 100_000.0,
    price_text: &["price_display"],
    url: &[],
    image: &["image"],
};

/// Shop id for public-search items (part of the public offer identity).
pub const PUBLIC_SHOP_ID: &[&str] = &["shopid", "shop_id"];

/// Where the affiliate node list may live, in priority order.
pub const AFFILIATE_NODE_PATHS: &[&[&str]] = &[
    &["data", "productOfferV2", "nodes"],
    &["data", "productOffer", "nodes"],
    &["data", "nodes"],
];

/// First non-empty string (numbers are rendered as integers/decimals).
pub fn probe_str(node: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match node.get(*k)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

pub fn probe_number(node: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| match node.get(*k)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
    .filter(|v| v.is_finite())
}

/// numeric price ⇒ "R$ 12.90"; else a pre-formatted string; else "R$ 0.00".
pub fn format_price(node: &Value, table: &FieldTable) -> String {
    if let Some(raw) = probe_number(node, table.price_numeric) {
        let scale = if table.price_scale > 0.0 { table.price_scale } else { 1.0 };
        return format!("{DEFAULT_CURRENCY} {:.2}", raw / scale);
    }
    probe_str(node, table.price_text).unwrap_or_else(|| format!("{DEFAULT_CURRENCY} 0.00"))
}

/// Follow the first path that resolves to an array.
pub fn probe_nodes<'a>(root: &'a Value, paths: &[&[&str]]) -> Option<&'a Vec<Value>> {
    paths.iter().find_map(|path| {
        let mut cur = root;
        for seg in path.iter() {
            cur = cur.get(*seg)?;
        }
        cur.as_array()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn affiliate_v2_shape() {
        let node = json!({
            "itemId": 22345678901u64,
            "productName": "Fone Bluetooth",
            "priceMin": "49.9",
            "offerLink": "https://s.shopee.com.br/abc",
            "imageUrl": "https://cf.shopee.com.br/file/x"
        });
        let t = &AFFILIATE_FIELDS;
        assert_eq!(probe_str(&node, t.id).as_deref(), Some("22345678901"));
        assert_eq!(probe_str(&node, t.title).as_deref(), Some("Fone Bluetooth"));
        assert_eq!(format_price(&node, t), "R$ 49.90");
        assert_eq!(probe_str(&node, t.url).as_deref(), Some("https://s.shopee.com.br/abc"));
    }

    #[test]
    fn affiliate_legacy_shape_uses_aliases() {
        let node = json!({
            "productId": "777",
            "name": "Caneca",
            "priceDisplay": "R$ 19,90",
            "productLink": "https://shopee.com.br/p/777",
            "image": "https://img/777"
        });
        let t = &AFFILIATE_FIELDS;
        assert_eq!(probe_str(&node, t.id).as_deref(), Some("777"));
        assert_eq!(probe_str(&node, t.title).as_deref(), Some("Caneca"));
        assert_eq!(format_price(&node, t), "R$ 19,90");
        assert_eq!(probe_str(&node, t.image).as_deref(), Some("https://img/777"));
    }

    #[test]
    fn earlier_alias_wins_and_blank_values_are_skipped() {
        let node = json!({"itemId": "", "item_id": "2", "id": "3"});
        assert_eq!(probe_str(&node, AFFILIATE_FIELDS.id).as_deref(), Some("2"));
    }

    #[test]
    fn public_price_is_scaled() {
        let node = json!({"itemid": 9, "shopid": 55, "name": "Boneca", "price": 1_299_000});
        assert_eq!(format_price(&node, &PUBLIC_FIELDS), "R$ 12.99");
    }

    #[test]
    fn missing_price_defaults_to_zero() {
        assert_eq!(format_price(&json!({}), &AFFILIATE_FIELDS), "R$ 0.00");
        assert_eq!(format_price(&json!({"price": "n/a"}), &AFFILIATE_FIELDS), "R$ 0.00");
    }

    #[test]
    fn node_paths_are_probed_in_order() {
        let v2 = json!({"data": {"productOfferV2": {"nodes": [1, 2]}}});
        let old = json!({"data": {"productOffer": {"nodes": [1]}}});
        let none = json!({"data": {"productOfferV2": null}});
        assert_eq!(probe_nodes(&v2, AFFILIATE_NODE_PATHS).map(Vec::len), Some(2));
        assert_eq!(probe_nodes(&old, AFFILIATE_NODE_PATHS).map(Vec::len), Some(1));
        assert!(probe_nodes(&none, AFFILIATE_NODE_PATHS).is_none());
    }
}
