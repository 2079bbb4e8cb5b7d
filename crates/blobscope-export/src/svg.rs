//! SVG export serializer.
//!
//! Converts a component list into an SVG overlay with one `<circle>`
//! element per component, using the [`svg`] crate for document
//! construction, XML escaping, and attribute formatting.
//!
//! Circles sit at the component centroid with the radius of a disc of
//! equal area, in the pixel coordinate space of the source image, so the
//! overlay can be layered directly over it.
//!
//! Optional [`SvgMetadata`] embeds `<title>` and `<desc>` elements for
//! accessibility and to help file managers identify exported files.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::{Circle, Description, Element, Group, Title};
use svg::node::{Node, Text};

use blobscope_pipeline::overlay::equivalent_radius;
use blobscope_pipeline::{Component, Dimensions};

/// Stroke color of overlay circles.
pub const STROKE_COLOR: &str = "#00ff00";

/// Stroke width of overlay circles, in pixels.
pub const STROKE_WIDTH: u32 = 2;

/// Metadata to embed in the SVG document.
///
/// All fields are optional. When present, a `<title>` and/or `<desc>`
/// element is emitted immediately after the opening `<svg>` tag.
///
/// Text values are XML-escaped automatically by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the source image filename (without extension).
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    ///
    /// Typically the classification and component count.
    pub description: Option<&'a str>,

    /// Serialized segmentation configuration, emitted inside a
    /// `<metadata>` element wrapped in a namespaced
    /// `<blobscope:config>` element so exported files carry the
    /// settings that produced them.
    pub config_json: Option<&'a str>,
}

/// Serialize components into an SVG overlay.
///
/// The document's `width`, `height`, and `viewBox` match `dimensions`.
/// Components are emitted in input order inside `<g id="components">`,
/// each circle carrying `data-area` and `data-vertices` attributes.
/// An empty component list still yields a valid document.
#[must_use]
pub fn to_overlay_svg(
    components: &[Component],
    dimensions: Dimensions,
    metadata: &SvgMetadata<'_>,
) -> String {
    let w = dimensions.width;
    let h = dimensions.height;
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(config_json) = metadata.config_json {
        let mut config_el = Element::new("blobscope:config");
        config_el.assign("xmlns:blobscope", "urn:blobscope:config:1");
        config_el.append(Text::new(config_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(config_el);
        doc = doc.add(metadata_el);
    }

    if !components.is_empty() {
        let mut group = Group::new()
            .set("id", "components")
            .set("fill", "none")
            .set("stroke", STROKE_COLOR)
            .set("stroke-width", STROKE_WIDTH);
        for component in components {
            group = group.add(circle(component));
        }
        doc = doc.add(group);
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

fn circle(component: &Component) -> Circle {
    Circle::new()
        .set("cx", component.centroid.x)
        .set("cy", component.centroid.y)
        .set("r", equivalent_radius(component.area))
        .set("data-area", component.area)
        .set("data-vertices", component.vertex_count)
}
