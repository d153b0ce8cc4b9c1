//! Named edit intents reported by the rendering layer.

use crate::canvas::Reorder;
use crate::error::{EngineError, EngineResult};
use crate::shapes::TextAlign;
use serde_json::Value;

/// A discrete editing intent.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ToggleBold,
    ToggleItalic,
    ToggleUnderline,
    SetFontSize(f64),
    SetFontFamily(String),
    /// Font color of the active text box.
    SetTextFill(String),
    SetTextAlign(TextAlign),
    AddBullets,
    AddText,
    AddRectangle,
    AddCircle,
    AddLine,
    AddImage { src: String },
    /// Fill color of the active non-text object.
    ShapeFill(String),
    Delete,
    Reorder(Reorder),
    Clear,
    Copy,
    Cut,
    Paste,
    Undo,
    Redo,
}

/// Lowercase and drop separators so `add-text`, `add_text` and `addText` match.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl Action {
    /// Resolve an action name and payload.
    ///
    /// Unknown names give `Ok(None)`. A known name with a missing or
    /// ill-typed payload gives `InvalidPayload`.
    pub fn parse(name: &str, payload: Option<&Value>) -> EngineResult<Option<Self>> {
        let action = match normalize(name).as_str() {
            "bold" => Action::ToggleBold,
            "italic" => Action::ToggleItalic,
            "underline" => Action::ToggleUnderline,
            "fontsize" => Action::SetFontSize(number_payload("font-size", payload)?),
            "fontfamily" => Action::SetFontFamily(string_payload("font-family", payload, "value")?),
            "fill" => Action::SetTextFill(string_payload("fill", payload, "value")?),
            "textalign" => {
                let value = string_payload("text-align", payload, "value")?;
                let align = TextAlign::parse(&value).ok_or_else(|| EngineError::InvalidPayload {
                    action: "text-align",
                    reason: format!("unknown alignment '{value}'"),
                })?;
                Action::SetTextAlign(align)
            }
            "addbullets" => Action::AddBullets,
            "addtext" => Action::AddText,
            "addrect" | "addrectangle" => Action::AddRectangle,
            "addcircle" => Action::AddCircle,
            "addline" => Action::AddLine,
            "addimage" => Action::AddImage {
                src: string_payload("add-image", payload, "src")?,
            },
            "shapefill" => Action::ShapeFill(string_payload("shape-fill", payload, "value")?),
            "delete" | "deleteobject" => Action::Delete,
            "bringforward" => Action::Reorder(Reorder::Forward),
            "sendbackward" => Action::Reorder(Reorder::Backward),
            "clear" => Action::Clear,
            "copy" => Action::Copy,
            "cut" => Action::Cut,
            "paste" => Action::Paste,
            "undo" => Action::Undo,
            "redo" => Action::Redo,
            _ => return Ok(None),
        };
        Ok(Some(action))
    }

    /// Canonical kebab-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Action::ToggleBold => "bold",
            Action::ToggleItalic => "italic",
            Action::ToggleUnderline => "underline",
            Action::SetFontSize(_) => "font-size",
            Action::SetFontFamily(_) => "font-family",
            Action::SetTextFill(_) => "fill",
            Action::SetTextAlign(_) => "text-align",
            Action::AddBullets => "add-bullets",
            Action::AddText => "add-text",
            Action::AddRectangle => "add-rectangle",
            Action::AddCircle => "add-circle",
            Action::AddLine => "add-line",
            Action::AddImage { .. } => "add-image",
            Action::ShapeFill(_) => "shape-fill",
            Action::Delete => "delete",
            Action::Reorder(Reorder::Forward) => "bring-forward",
            Action::Reorder(Reorder::Backward) => "send-backward",
            Action::Clear => "clear",
            Action::Copy => "copy",
            Action::Cut => "cut",
            Action::Paste => "paste",
            Action::Undo => "undo",
            Action::Redo => "redo",
        }
    }

    /// Whether the action may change the document or history.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Action::Copy)
    }
}

/// Unwrap `{"<key>": x}` or `{"value": x}` payload objects.
fn unwrap_payload<'a>(payload: &'a Value, key: &str) -> &'a Value {
    match payload {
        Value::Object(fields) => fields
            .get(key)
            .or_else(|| fields.get("value"))
            .unwrap_or(payload),
        _ => payload,
    }
}

fn string_payload(action: &'static str, payload: Option<&Value>, key: &str) -> EngineResult<String> {
    let Some(payload) = payload else {
        return Err(EngineError::InvalidPayload {
            action,
            reason: "payload required".to_string(),
        });
    };
    match unwrap_payload(payload, key) {
        Value::String(value) if !value.is_empty() => Ok(value.clone()),
        other => Err(EngineError::InvalidPayload {
            action,
            reason: format!("expected a non-empty string, got {other}"),
        }),
    }
}

fn number_payload(action: &'static str, payload: Option<&Value>) -> EngineResult<f64> {
    let invalid = |reason: String| EngineError::InvalidPayload { action, reason };
    let Some(payload) = payload else {
        return Err(invalid("payload required".to_string()));
    };
    let number = match unwrap_payload(payload, "value") {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n.is_finite() && n > 0.0 => Ok(n),
        _ => Err(invalid(format!("expected a positive number, got {payload}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(name: &str, payload: Option<Value>) -> EngineResult<Option<Action>> {
        Action::parse(name, payload.as_ref())
    }

    #[test]
    fn test_name_styles_are_equivalent() {
        for name in ["add-text", "addText", "add_text", "ADD-TEXT"] {
            assert_eq!(parse(name, None).unwrap(), Some(Action::AddText));
        }
        assert_eq!(parse("addRect", None).unwrap(), Some(Action::AddRectangle));
        assert_eq!(parse("add-rectangle", None).unwrap(), Some(Action::AddRectangle));
        assert_eq!(parse("deleteObject", None).unwrap(), Some(Action::Delete));
        assert_eq!(
            parse("bringForward", None).unwrap(),
            Some(Action::Reorder(Reorder::Forward))
        );
    }

    #[test]
    fn test_unknown_name_is_none() {
        assert_eq!(parse("rotate-3d", Some(json!(42))).unwrap(), None);
    }

    #[test]
    fn test_font_size_payloads() {
        assert_eq!(parse("fontSize", Some(json!(18))).unwrap(), Some(Action::SetFontSize(18.0)));
        assert_eq!(parse("font-size", Some(json!("24"))).unwrap(), Some(Action::SetFontSize(24.0)));
        assert_eq!(
            parse("font-size", Some(json!({"value": 12}))).unwrap(),
            Some(Action::SetFontSize(12.0))
        );
        assert!(matches!(
            parse("font-size", None),
            Err(EngineError::InvalidPayload { action: "font-size", .. })
        ));
        assert!(matches!(
            parse("font-size", Some(json!("large"))),
            Err(EngineError::InvalidPayload { .. })
        ));
        assert!(matches!(
            parse("font-size", Some(json!(-3))),
            Err(EngineError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn test_string_payloads() {
        assert_eq!(
            parse("fontFamily", Some(json!("Georgia"))).unwrap(),
            Some(Action::SetFontFamily("Georgia".into()))
        );
        assert_eq!(
            parse("textAlign", Some(json!("justify"))).unwrap(),
            Some(Action::SetTextAlign(TextAlign::Justify))
        );
        assert!(parse("textAlign", Some(json!("middle"))).is_err());
        assert!(parse("shapeFill", Some(json!(""))).is_err());
        assert!(parse("fill", Some(json!(3))).is_err());
    }

    #[test]
    fn test_add_image_payload() {
        let expected = Some(Action::AddImage {
            src: "https://example.com/me.png".into(),
        });
        assert_eq!(parse("addImage", Some(json!("https://example.com/me.png"))).unwrap(), expected);
        assert_eq!(
            parse("add-image", Some(json!({"src": "https://example.com/me.png"}))).unwrap(),
            expected
        );
        assert!(parse("add-image", None).is_err());
    }

    #[test]
    fn test_canonical_names_parse_back() {
        let actions = [
            Action::ToggleBold,
            Action::AddBullets,
            Action::AddLine,
            Action::Delete,
            Action::Reorder(Reorder::Backward),
            Action::Clear,
            Action::Cut,
            Action::Redo,
        ];
        for action in actions {
            assert_eq!(parse(action.name(), None).unwrap(), Some(action));
        }
    }

    #[test]
    fn test_copy_is_not_mutating() {
        assert!(!Action::Copy.is_mutating());
        assert!(Action::Paste.is_mutating());
    }
}
