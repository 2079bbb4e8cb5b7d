//! blobscope-export: Pure format serializers (sans-IO)
//!
//! Converts segmentation output into overlay formats. Currently supports
//! SVG; raster overlays live in `blobscope_pipeline::overlay`.

pub mod svg;

pub use svg::{SvgMetadata, to_overlay_svg};
