//! Share links and QR payloads for resolved derived assets.
//!
//! Both derivations are pure: the same locator always yields the same URL
//! and the same QR bytes, so clients may cache them indefinitely.

use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};

use crate::config::QrConfig;

/// Public URL for a derived-asset locator.
pub fn share_link(base_url: &str, locator: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        locator.trim_start_matches('/')
    )
}

/// Render a URL as an SVG QR code. Deterministic for a given URL and
/// configuration.
pub fn qr_code_for(url: &str, config: &QrConfig) -> Result<Vec<u8>, qrcode::types::QrError> {
    let code = QrCode::with_error_correction_level(url.as_bytes(), EcLevel::M)?;
    let svg = code
        .render::<svg::Color>()
        .min_dimensions(config.min_width, config.min_width)
        .quiet_zone(config.quiet_zone)
        .dark_color(svg::Color(&config.dark_color))
        .light_color(svg::Color(&config.light_color))
        .build();
    Ok(svg.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_link_normalizes_separators() {
        assert_eq!(
            share_link("https://cdn.example.com/derived/", "/ab12cd34ef56"),
            "https://cdn.example.com/derived/ab12cd34ef56"
        );
        assert_eq!(
            share_link("https://cdn.example.com/derived", "ab12cd34ef56"),
            "https://cdn.example.com/derived/ab12cd34ef56"
        );
    }

    #[test]
    fn qr_payload_is_byte_identical_across_calls() {
        let config = QrConfig::default();
        let url = "https://cdn.example.com/derived/ab12cd34ef56";
        let first = qr_code_for(url, &config).unwrap();
        let second = qr_code_for(url, &config).unwrap();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn different_urls_yield_different_payloads() {
        let config = QrConfig::default();
        let a = qr_code_for("https://example.com/a", &config).unwrap();
        let b = qr_code_for("https://example.com/b", &config).unwrap();
        assert_ne!(a, b);
    }
}
