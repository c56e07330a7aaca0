//! Parsing of the detector's single-line output.

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::form_urlencoded;

use crate::{error::FileError, FileResult};

/// What the detector reported for one file.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DetectionResult {
    /// Mime mode, e.g. `text/html; charset=us-ascii`.
    Mime {
        mime_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        charset: Option<String>,
    },
    /// General mode, one element per comma-separated description.
    Types { types: Vec<String> },
}

/// Splits `stdout` at the first `separator` and parses the value part.
///
/// The echoed path is everything before the separator and is discarded. No attempt is
/// made to judge whether the reported types are plausible.
///
/// # Errors
///
/// [`FileError::MalformedOutput`] if the separator is missing, or if mime mode yields an
/// empty mime type.
pub fn parse_output(stdout: &str, separator: char, mime: bool) -> FileResult<DetectionResult> {
    let Some(index) = stdout.find(separator) else {
        return Err(FileError::MalformedOutput {
            output: stdout.to_string(),
            reason: "separator not found",
        });
    };
    let values = &stdout[index + separator.len_utf8()..];

    let result = if mime {
        parse_mime(stdout, values)?
    } else {
        DetectionResult::Types {
            types: values.split(',').map(|t| t.trim().to_string()).collect(),
        }
    };

    debug!("parsed {:?}", result);
    Ok(result)
}

fn parse_mime(stdout: &str, values: &str) -> FileResult<DetectionResult> {
    let mut tokens = values.split(';');
    let mime_type = tokens.next().unwrap_or_default().trim();
    if mime_type.is_empty() {
        return Err(FileError::MalformedOutput {
            output: stdout.to_string(),
            reason: "empty mime type",
        });
    }

    let charset = tokens.next().and_then(|extra| {
        form_urlencoded::parse(extra.trim().as_bytes())
            .find(|(key, _)| key == "charset")
            .map(|(_, value)| value.into_owned())
    });

    Ok(DetectionResult::Mime {
        mime_type: mime_type.to_string(),
        charset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(values: &[&str]) -> DetectionResult {
        DetectionResult::Types {
            types: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    #[test]
    fn test_parse_mime_with_charset() {
        let result =
            parse_output("/tmp/index.html:text/html; charset=us-ascii\n", ':', true).unwrap();

        assert_eq!(
            result,
            DetectionResult::Mime {
                mime_type: "text/html".to_string(),
                charset: Some("us-ascii".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_mime_without_charset() {
        let result = parse_output("/tmp/a.bin:application/octet-stream\n", ':', true).unwrap();

        assert_eq!(
            result,
            DetectionResult::Mime {
                mime_type: "application/octet-stream".to_string(),
                charset: None,
            }
        );
    }

    #[test]
    fn test_parse_mime_charset_is_decoded() {
        let result = parse_output("x;text/plain; charset=utf%2D8", ';', true).unwrap();

        assert!(matches!(
            result,
            DetectionResult::Mime { charset: Some(ref c), .. } if c == "utf-8"
        ));
    }

    #[test]
    fn test_parse_mime_other_parameter() {
        let result = parse_output("x:text/plain; format=flowed", ':', true).unwrap();

        assert!(matches!(
            result,
            DetectionResult::Mime { charset: None, .. }
        ));
    }

    #[test]
    fn test_parse_single_type() {
        let result = parse_output("/tmp/notes.txt:ASCII text\n", ':', false).unwrap();
        assert_eq!(result, types(&["ASCII text"]));
    }

    #[test]
    fn test_parse_multiple_types_in_order() {
        let output = "/tmp/photo.jpg:JPEG image data, JFIF standard 1.01, resolution (DPI), density 72x72\n";
        let result = parse_output(output, ':', false).unwrap();

        assert_eq!(
            result,
            types(&[
                "JPEG image data",
                "JFIF standard 1.01",
                "resolution (DPI)",
                "density 72x72"
            ])
        );
    }

    #[test]
    fn test_parse_uses_first_separator_only() {
        let result = parse_output("/tmp/a:b.txt;ASCII text; odd", ';', false).unwrap();
        assert_eq!(result, types(&["ASCII text; odd"]));
    }

    #[test]
    fn test_parse_keeps_empty_tokens() {
        let result = parse_output("x:data,, more", ':', false).unwrap();
        assert_eq!(result, types(&["data", "", "more"]));
    }

    #[test]
    fn test_parse_missing_separator() {
        let err = parse_output("cannot open `x'", ':', false).unwrap_err();
        assert!(matches!(
            err,
            FileError::MalformedOutput {
                reason: "separator not found",
                ..
            }
        ));
    }

    #[test]
    fn test_parse_empty_mime_type() {
        let err = parse_output("x: ; charset=binary", ':', true).unwrap_err();
        assert!(matches!(
            err,
            FileError::MalformedOutput {
                reason: "empty mime type",
                ..
            }
        ));
    }

    #[test]
    fn test_serialize_results() {
        let mime = DetectionResult::Mime {
            mime_type: "text/html".to_string(),
            charset: Some("us-ascii".to_string()),
        };
        assert_eq!(
            serde_json::to_string(&mime).unwrap(),
            r#"{"mime_type":"text/html","charset":"us-ascii"}"#
        );
        assert_eq!(
            serde_json::to_string(&types(&["ASCII text"])).unwrap(),
            r#"{"types":["ASCII text"]}"#
        );
    }
}
