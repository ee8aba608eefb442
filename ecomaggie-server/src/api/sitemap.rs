//! GET /sitemap.xml

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::{TimeZone, Utc};

use crate::db;
use crate::state::AppState;

const STATIC_PAGES: &[&str] = &["/", "/products", "/supply", "/about"];

pub async fn sitemap(State(state): State<AppState>) -> Response {
    let products = match db::products::sitemap_entries(&state.pool).await {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(%e, "Failed to load products for sitemap");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    (
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        render_sitemap(&state.site_url, &products),
    )
        .into_response()
}

/// Render the sitemap for `(product_id, updated_at)` pairs
pub fn render_sitemap(site_url: &str, products: &[(i64, i64)]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for page in STATIC_PAGES {
        push_url(&mut xml, &format!("{site_url}{page}"), None);
    }
    for (id, updated_at) in products {
        let lastmod = Utc
            .timestamp_millis_opt(*updated_at)
            .single()
            .map(|t| t.format("%Y-%m-%d").to_string());
        push_url(&mut xml, &format!("{site_url}/products/{id}"), lastmod.as_deref());
    }
    xml.push_str("</urlset>\n");
    xml
}

fn push_url(xml: &mut String, loc: &str, lastmod: Option<&str>) {
    xml.push_str("  <url><loc>");
    xml.push_str(&escape_xml(loc));
    xml.push_str("</loc>");
    if let Some(lastmod) = lastmod {
        xml.push_str("<lastmod>");
        xml.push_str(lastmod);
        xml.push_str("</lastmod>");
    }
    xml.push_str("</url>\n");
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_static_and_products() {
        // 2026-10-18T00:00:00Z
        let xml = render_sitemap("https://ecomaggie.id", &[(42, 1_792_281_600_000)]);
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<url><loc>https://ecomaggie.id/</loc></url>"));
        assert!(xml.contains("<loc>https://ecomaggie.id/products</loc>"));
        assert!(xml.contains(
            "<url><loc>https://ecomaggie.id/products/42</loc><lastmod>2026-10-18</lastmod></url>"
        ));
        assert!(xml.trim_end().ends_with("</urlset>"));
    }

    #[test]
    fn test_locations_escaped() {
        let xml = render_sitemap("https://shop.test/?a=1&b=<2>", &[]);
        assert!(xml.contains("https://shop.test/?a=1&amp;b=&lt;2&gt;/products"));
        assert!(!xml.contains("a=1&b"));
    }

    #[test]
    fn test_escape_quotes() {
        assert_eq!(escape_xml(r#"a"b'c"#), "a&quot;b&apos;c");
    }
}
