//! QuakeML 1.2 output format.

use seiswave_types::{Catalog, DOWNLOADED_NAMESPACE, Event};
use std::io::Write;

use crate::formatter::xml_escape;
use crate::{FormatError, Formatter};

const QUAKEML_NAMESPACE: &str = "http://quakeml.org/xmlns/quakeml/1.2";
const BED_NAMESPACE: &str = "http://quakeml.org/xmlns/bed/1.2";
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Writes a catalog as QuakeML.
///
/// Each event carries its download flag as
/// `<ns0:downloaded>True|False</ns0:downloaded>` in the
/// [`DOWNLOADED_NAMESPACE`] namespace.
#[derive(Debug, Clone)]
pub struct QuakeMlFormatter {
    catalog_id: String,
}

impl Default for QuakeMlFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl QuakeMlFormatter {
    /// Creates a formatter with the default catalog identifier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            catalog_id: "smi:local/catalog".to_string(),
        }
    }

    /// Sets the `publicID` of the `eventParameters` element.
    #[must_use]
    pub fn with_catalog_id(mut self, id: impl Into<String>) -> Self {
        self.catalog_id = id.into();
        self
    }

    fn write_event<W: Write>(event: &Event, writer: &mut W) -> Result<(), FormatError> {
        let id = xml_escape(&event.resource_id);
        let origin_id = format!("{id}/origin");
        let magnitude_id = format!("{id}/magnitude");

        writeln!(writer, "    <event publicID=\"{id}\">")?;
        writeln!(writer, "      <preferredOriginID>{origin_id}</preferredOriginID>")?;
        if event.magnitude.is_some() {
            writeln!(
                writer,
                "      <preferredMagnitudeID>{magnitude_id}</preferredMagnitudeID>"
            )?;
        }
        if let Some(description) = &event.description {
            writeln!(writer, "      <description>")?;
            writeln!(writer, "        <text>{}</text>", xml_escape(description))?;
            writeln!(writer, "        <type>region name</type>")?;
            writeln!(writer, "      </description>")?;
        }

        writeln!(writer, "      <origin publicID=\"{origin_id}\">")?;
        writeln!(
            writer,
            "        <time>\n          <value>{}</value>\n        </time>",
            event.origin_time.format(TIME_FORMAT)
        )?;
        writeln!(
            writer,
            "        <latitude>\n          <value>{}</value>\n        </latitude>",
            event.latitude
        )?;
        writeln!(
            writer,
            "        <longitude>\n          <value>{}</value>\n        </longitude>",
            event.longitude
        )?;
        if let Some(depth_km) = event.depth_km {
            // QuakeML depths are in meters
            writeln!(
                writer,
                "        <depth>\n          <value>{}</value>\n        </depth>",
                depth_km * 1000.0
            )?;
        }
        writeln!(writer, "      </origin>")?;

        if let Some(magnitude) = event.magnitude {
            writeln!(writer, "      <magnitude publicID=\"{magnitude_id}\">")?;
            writeln!(
                writer,
                "        <mag>\n          <value>{magnitude}</value>\n        </mag>"
            )?;
            if let Some(kind) = &event.magnitude_type {
                writeln!(writer, "        <type>{}</type>", xml_escape(kind))?;
            }
            writeln!(writer, "        <originID>{origin_id}</originID>")?;
            writeln!(writer, "      </magnitude>")?;
        }

        writeln!(
            writer,
            "      <ns0:downloaded>{}</ns0:downloaded>",
            if event.downloaded { "True" } else { "False" }
        )?;
        writeln!(writer, "    </event>")?;
        Ok(())
    }
}

impl Formatter<Catalog> for QuakeMlFormatter {
    fn write<W: Write + Send>(&self, catalog: &Catalog, mut writer: W) -> Result<(), FormatError> {
        writeln!(writer, "<?xml version='1.0' encoding='utf-8'?>")?;
        writeln!(
            writer,
            "<q:quakeml xmlns:q=\"{QUAKEML_NAMESPACE}\" xmlns=\"{BED_NAMESPACE}\" xmlns:ns0=\"{DOWNLOADED_NAMESPACE}\">"
        )?;
        writeln!(
            writer,
            "  <eventParameters publicID=\"{}\">",
            xml_escape(&self.catalog_id)
        )?;
        for event in catalog {
            Self::write_event(event, &mut writer)?;
        }
        writeln!(writer, "  </eventParameters>")?;
        writeln!(writer, "</q:quakeml>")?;
        Ok(())
    }

    fn extension(&self) -> &str {
        "xml"
    }
}
