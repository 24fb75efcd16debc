//! Bundled font for headless rendering.
//!
//! plotters' `ab_glyph` text backend only knows fonts that were registered with it, so
//! the DejaVu Sans face is compiled into the binary and registered under the family
//! name used by every text element of a plot. Registration happens once per process.

use std::sync::OnceLock;

use log::debug;
use plotters::style::{register_font, FontStyle};

use crate::errors::PlotError;

/// Embedded font at compile time
static BUNDLED_FONT_BYTES: &[u8] = include_bytes!("../fonts/DejaVuSans.ttf");

/// Font family every text element is drawn with
pub const FONT_FAMILY: &str = "sans-serif";

static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();

/// Registers the bundled font with plotters if that has not happened yet.
///
/// # Errors
/// `PlotError::Drawing` if the embedded font data cannot be parsed.
pub fn ensure_registered() -> Result<(), PlotError> {
    REGISTERED
        .get_or_init(|| {
            debug!("registering bundled font as `{FONT_FAMILY}`");
            register_font(FONT_FAMILY, FontStyle::Normal, BUNDLED_FONT_BYTES)
                .map_err(|_| "bundled font data is not a valid font".to_string())
        })
        .clone()
        .map_err(PlotError::Drawing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_is_idempotent() {
        assert!(ensure_registered().is_ok());
        assert!(ensure_registered().is_ok());
    }

    #[test]
    fn test_bundled_font_is_a_truetype_file() {
        assert!(BUNDLED_FONT_BYTES.starts_with(&[0x00, 0x01, 0x00, 0x00]));
    }
}
