use std::{
    fmt::Display,
    sync::{LazyLock, PoisonError, RwLock},
};

use filekit_core::parse::DetectionResult;
use nu_ansi_term::Color;

pub static COLOR: LazyLock<RwLock<bool>> = LazyLock::new(|| RwLock::new(true));

pub fn set_color(enabled: bool) {
    *COLOR.write().unwrap_or_else(PoisonError::into_inner) = enabled;
}

pub struct Colored<T: Display>(pub Color, pub T);

impl<T: Display> Display for Colored<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let color = COLOR.read().unwrap_or_else(PoisonError::into_inner);
        if *color {
            write!(f, "{}", self.0.prefix())?;
            self.1.fmt(f)?;
            write!(f, "{}", self.0.suffix())
        } else {
            self.1.fmt(f)
        }
    }
}

/// Renders a result the way `file` itself would print it.
pub fn describe(result: &DetectionResult) -> String {
    match result {
        DetectionResult::Mime {
            mime_type,
            charset: Some(charset),
        } => format!("{mime_type}; charset={charset}"),
        DetectionResult::Mime {
            mime_type,
            charset: None,
        } => mime_type.clone(),
        DetectionResult::Types { types } => types.join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        let mime = DetectionResult::Mime {
            mime_type: "text/html".to_string(),
            charset: Some("us-ascii".to_string()),
        };
        assert_eq!(describe(&mime), "text/html; charset=us-ascii");

        let types = DetectionResult::Types {
            types: vec!["ASCII text".to_string(), "with CRLF line terminators".to_string()],
        };
        assert_eq!(describe(&types), "ASCII text, with CRLF line terminators");
    }

    #[test]
    fn test_colored_without_color() {
        set_color(false);
        assert_eq!(Colored(Color::Red, "plain").to_string(), "plain");
        set_color(true);
    }
}
