//! JSON output format.

use serde::Serialize;
use std::io::Write;

use crate::{FormatError, Formatter};

/// JSON formatter for any serializable value.
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    /// Whether to pretty-print.
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new compact JSON formatter.
    #[must_use]
    pub const fn new() -> Self {
        Self { pretty: false }
    }

    /// Sets whether to pretty-print output.
    #[must_use]
    pub const fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl<T: Serialize + ?Sized> Formatter<T> for JsonFormatter {
    fn write<W: Write + Send>(&self, value: &T, mut writer: W) -> Result<(), FormatError> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut writer, value)?;
        } else {
            serde_json::to_writer(&mut writer, value)?;
        }
        writeln!(writer)?;
        Ok(())
    }

    fn extension(&self) -> &str {
        "json"
    }
}
