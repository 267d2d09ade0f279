use std::collections::BTreeMap;
use std::fmt::Write;

use serde::Serialize;

use crate::errors::InteractionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkKind {
    Rect,
    Circle,
    Path,
    Line,
    Text,
}

impl MarkKind {
    fn tag(&self) -> &'static str {
        match self {
            MarkKind::Rect => "rect",
            MarkKind::Circle => "circle",
            MarkKind::Path => "path",
            MarkKind::Line => "line",
            MarkKind::Text => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mark {
    pub id: String,
    pub kind: MarkKind,
    pub class: String,
    pub attrs: BTreeMap<String, String>,
    pub text: Option<String>,
}

impl Mark {
    pub fn new(kind: MarkKind, class: &str) -> Self {
        Self {
            id: String::new(),
            kind,
            class: class.to_string(),
            attrs: BTreeMap::new(),
            text: None,
        }
    }

    pub fn attr(mut self, name: &str, value: impl ToString) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    /// Numeric attribute rounded to two decimals so output is stable.
    pub fn num(self, name: &str, value: f64) -> Self {
        self.attr(name, fmt_num(value))
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Marks with a data-bearing class, i.e. not axes, labels or placeholders.
    pub fn is_data(&self) -> bool {
        self.class.split_whitespace().any(|c| c == "datum")
    }
}

/// The single floating hover overlay.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tooltip {
    pub visible: bool,
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub target: Option<String>,
}

/// Retained drawing surface, cleared and repopulated on every redraw.
#[derive(Debug, Clone, Serialize)]
pub struct Surface {
    pub width: f64,
    pub height: f64,
    marks: Vec<Mark>,
    hover: BTreeMap<String, String>,
    tooltip: Tooltip,
    counters: BTreeMap<String, usize>,
    redraws: u64,
}

impl Surface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            marks: Vec::new(),
            hover: BTreeMap::new(),
            tooltip: Tooltip::default(),
            counters: BTreeMap::new(),
            redraws: 0,
        }
    }

    pub fn clear(&mut self) {
        self.marks.clear();
        self.hover.clear();
        self.counters.clear();
        self.tooltip = Tooltip::default();
        self.redraws += 1;
    }

    /// Adds a mark, assigning it an identifier of the form `<role>-<n>`.
    pub fn push(&mut self, role: &str, mut mark: Mark) -> String {
        let counter = self.counters.entry(role.to_string()).or_insert(0);
        mark.id = format!("{role}-{counter}");
        *counter += 1;
        let id = mark.id.clone();
        self.marks.push(mark);
        id
    }

    /// Adds a mark that shows `text` in the tooltip while hovered.
    pub fn push_hoverable(&mut self, role: &str, mark: Mark, text: String) -> String {
        let id = self.push(role, mark);
        self.hover.insert(id.clone(), text);
        id
    }

    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    pub fn data_marks(&self) -> impl Iterator<Item = &Mark> {
        self.marks.iter().filter(|m| m.is_data())
    }

    pub fn tooltip(&self) -> &Tooltip {
        &self.tooltip
    }

    pub fn redraws(&self) -> u64 {
        self.redraws
    }

    pub fn pointer_enter(&mut self, id: &str, x: f64, y: f64) -> Result<(), InteractionError> {
        let text = self
            .hover
            .get(id)
            .ok_or_else(|| InteractionError::UnknownMark { id: id.to_string() })?;
        self.tooltip = Tooltip {
            visible: true,
            x: x + 10.0,
            y: y - 28.0,
            text: text.clone(),
            target: Some(id.to_string()),
        };
        Ok(())
    }

    /// Hides the tooltip if it belongs to `id`; leaving any other mark is ignored.
    ///
    /// Returns whether the tooltip was hidden.
    pub fn pointer_leave(&mut self, id: &str) -> bool {
        let owned = self.tooltip.target.as_deref() == Some(id);
        if owned {
            self.tooltip = Tooltip::default();
        }
        owned
    }

    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = fmt_num(self.width),
            h = fmt_num(self.height)
        );
        for mark in &self.marks {
            let _ = write!(
                out,
                r#"  <{} id="{}" class="{}""#,
                mark.kind.tag(),
                escape(&mark.id),
                escape(&mark.class)
            );
            for (name, value) in &mark.attrs {
                let _ = write!(out, r#" {}="{}""#, name, escape(value));
            }
            let title = self.hover.get(&mark.id);
            match (&mark.text, title) {
                (None, None) => {
                    let _ = writeln!(out, "/>");
                }
                (text, title) => {
                    let _ = write!(out, ">");
                    if let Some(title) = title {
                        let _ = write!(out, "<title>{}</title>", escape(title));
                    }
                    if let Some(text) = text {
                        let _ = write!(out, "{}", escape(text));
                    }
                    let _ = writeln!(out, "</{}>", mark.kind.tag());
                }
            }
        }
        if self.tooltip.visible {
            self.write_tooltip(&mut out);
        }
        let _ = writeln!(out, "</svg>");
        out
    }

    fn write_tooltip(&self, out: &mut String) {
        let lines: Vec<&str> = self.tooltip.text.lines().collect();
        let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let _ = writeln!(
            out,
            r#"  <g class="tooltip" transform="translate({},{})">"#,
            fmt_num(self.tooltip.x),
            fmt_num(self.tooltip.y)
        );
        let _ = writeln!(
            out,
            r##"    <rect width="{}" height="{}" rx="4" fill="#ffffff" stroke="#999999"/>"##,
            fmt_num(longest as f64 * 7.0 + 12.0),
            fmt_num(lines.len() as f64 * 16.0 + 8.0)
        );
        for (i, line) in lines.iter().enumerate() {
            let _ = writeln!(
                out,
                r#"    <text x="6" y="{}" font-size="12">{}</text>"#,
                fmt_num(18.0 + i as f64 * 16.0),
                escape(line)
            );
        }
        let _ = writeln!(out, "  </g>");
    }
}

pub fn fmt_num(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        "0".to_string()
    } else {
        format!("{rounded}")
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar() -> Mark {
        Mark::new(MarkKind::Rect, "bar datum")
            .num("x", 10.0)
            .num("y", 20.0)
    }

    #[test]
    fn ids_are_numbered_per_role() {
        let mut surface = Surface::new(800.0, 500.0);
        assert_eq!(surface.push("bar", bar()), "bar-0");
        assert_eq!(surface.push("bar", bar()), "bar-1");
        assert_eq!(surface.push("axis", Mark::new(MarkKind::Line, "axis")), "axis-0");
        assert_eq!(surface.data_marks().count(), 2);
    }

    #[test]
    fn clear_resets_ids_and_tooltip() {
        let mut surface = Surface::new(800.0, 500.0);
        let id = surface.push_hoverable("bar", bar(), "Count: 3".to_string());
        surface.pointer_enter(&id, 5.0, 5.0).unwrap();
        surface.clear();
        assert!(surface.marks().is_empty());
        assert!(!surface.tooltip().visible);
        assert_eq!(surface.push("bar", bar()), "bar-0");
        assert_eq!(surface.redraws(), 1);
    }

    #[test]
    fn one_tooltip_follows_latest_hover() {
        let mut surface = Surface::new(800.0, 500.0);
        let first = surface.push_hoverable("dot", bar(), "first".to_string());
        let second = surface.push_hoverable("dot", bar(), "second".to_string());

        surface.pointer_enter(&first, 100.0, 100.0).unwrap();
        surface.pointer_enter(&second, 200.0, 200.0).unwrap();
        assert_eq!(surface.tooltip().text, "second");
        assert_eq!(surface.tooltip().x, 210.0);

        assert!(!surface.pointer_leave(&first));
        assert!(surface.tooltip().visible);
        assert!(surface.pointer_leave(&second));
        assert!(!surface.tooltip().visible);
        assert_eq!(surface.to_svg().matches("class=\"tooltip\"").count(), 0);
    }

    #[test]
    fn hover_on_unknown_mark_is_rejected() {
        let mut surface = Surface::new(800.0, 500.0);
        surface.push("axis", Mark::new(MarkKind::Line, "axis"));
        assert_eq!(
            surface.pointer_enter("axis-0", 0.0, 0.0),
            Err(InteractionError::UnknownMark {
                id: "axis-0".to_string()
            })
        );
    }

    #[test]
    fn svg_escapes_text_and_embeds_titles() {
        let mut surface = Surface::new(800.0, 500.0);
        surface.push("label", Mark::new(MarkKind::Text, "label").text("A & B"));
        surface.push_hoverable("dot", bar(), "x < 1".to_string());
        let svg = surface.to_svg();
        assert!(svg.contains("A &amp; B"));
        assert!(svg.contains("<title>x &lt; 1</title>"));
        assert!(svg.starts_with("<svg"));
    }

    #[test]
    fn numbers_are_rounded() {
        assert_eq!(fmt_num(1.0), "1");
        assert_eq!(fmt_num(1.23456), "1.23");
        assert_eq!(fmt_num(-0.001), "0");
    }
}
