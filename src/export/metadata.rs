//! Suggested filename and MIME type for a finding-aid download.

use std::fmt;
use std::str::FromStr;

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use crate::error::Error;
use crate::model::Resource;

/// Output formats a finding aid can be requested in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Xml,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xml => "xml",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn mimetype(self) -> &'static str {
        match self {
            ExportFormat::Xml => "application/xml",
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xml" => Ok(ExportFormat::Xml),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportMetadata {
    pub filename: String,
    pub mimetype: String,
}

impl ExportMetadata {
    /// Value for a `Content-Disposition` response header.
    pub fn content_disposition(&self) -> String {
        let encoded = utf8_percent_encode(&self.filename, NON_ALPHANUMERIC);
        format!("attachment; filename*=UTF-8''{encoded}")
    }
}

/// Filename and MIME type for exporting `resource` as `format`.
///
/// The filename is the call number with whitespace replaced by `_`, followed
/// by `_ead.<ext>`. Resources without a call number fall back to their id.
pub fn export_metadata(resource: &Resource, format: ExportFormat) -> ExportMetadata {
    let call_number = resource.call_number();
    let stem = if call_number.trim().is_empty() {
        format!("resource_{}", resource.id)
    } else {
        call_number.split_whitespace().collect::<Vec<_>>().join("_")
    };
    ExportMetadata {
        filename: format!("{stem}_ead.{}", format.extension()),
        mimetype: format.mimetype().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_from_call_number() {
        let mut resource = Resource::new("Smith Papers");
        resource.id_0 = Some("851234 Aa 2".into());
        let meta = export_metadata(&resource, ExportFormat::Xml);
        assert_eq!(meta.filename, "851234_Aa_2_ead.xml");
        assert_eq!(meta.mimetype, "application/xml");
    }

    #[test]
    fn test_filename_fallback() {
        let mut resource = Resource::new("Untitled");
        resource.id = 42;
        let meta = export_metadata(&resource, "PDF".parse().unwrap());
        assert_eq!(meta.filename, "resource_42_ead.pdf");
        assert_eq!(meta.mimetype, "application/pdf");
    }

    #[test]
    fn test_content_disposition() {
        let meta = ExportMetadata {
            filename: "Aa 2_ead.xml".into(),
            mimetype: "application/xml".into(),
        };
        assert_eq!(
            meta.content_disposition(),
            "attachment; filename*=UTF-8''Aa%202%5Fead%2Exml"
        );
    }

    #[test]
    fn test_unknown_format() {
        assert!(matches!(
            "docx".parse::<ExportFormat>(),
            Err(Error::UnsupportedFormat(f)) if f == "docx"
        ));
    }
}
