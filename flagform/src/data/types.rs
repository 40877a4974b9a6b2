//! Widget kinds and the component type registry.
//!
//! Every schema node declares a `type` string. The registry maps that string
//! to a [`WidgetKind`]. Authored schemas contain aliases and a few long-lived
//! misspellings (`toogle`, `checkBox`); all of them are listed in
//! [`WIDGET_TABLE`] and nowhere else.

use serde::Serialize;

/// Renderable widget kinds understood by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WidgetKind {
    /// Clickable button, including two-state toggle buttons.
    Button,
    /// Titled card grouping one configuration region.
    Card,
    /// Boolean checkbox.
    Checkbox,
    /// Container whose children can be folded away.
    Collapsible,
    /// Plain layout container.
    Container,
    /// Date (and time) selector.
    DatePicker,
    /// Single choice from a list of options.
    Dropdown,
    /// Section heading.
    Heading,
    /// Static text.
    Text,
    /// Free text input.
    TextInput,
    /// On/off switch.
    Toggle,
}

/// Alias table: `(type string, widget kind)`.
pub const WIDGET_TABLE: &[(&str, WidgetKind)] = &[
    // Structural
    ("card", WidgetKind::Card),
    ("collapsible", WidgetKind::Collapsible),
    ("container", WidgetKind::Container),
    ("containerCollapsible", WidgetKind::Collapsible),
    // Form
    ("button", WidgetKind::Button),
    ("toggleButton", WidgetKind::Button),
    ("dropdown", WidgetKind::Dropdown),
    ("radioGroup", WidgetKind::Dropdown),
    ("toggle", WidgetKind::Toggle),
    ("toogle", WidgetKind::Toggle),
    ("checkbox", WidgetKind::Checkbox),
    ("checkBox", WidgetKind::Checkbox),
    ("input", WidgetKind::TextInput),
    ("date", WidgetKind::DatePicker),
    ("datePicker", WidgetKind::DatePicker),
    ("dropdownDatePicker", WidgetKind::DatePicker),
    // Text
    ("heading", WidgetKind::Heading),
    ("text", WidgetKind::Text),
    ("toogleReference", WidgetKind::Text),
    // Custom group widgets render as plain containers
    ("customCloseSessionByMembership", WidgetKind::Container),
    ("customGeoFence", WidgetKind::Container),
    ("customYappyDeviceManager", WidgetKind::Container),
];

/// Resolve a declared `type` string to its widget kind.
///
/// Matching is exact; unknown names yield `None`.
pub fn resolve_type(type_name: &str) -> Option<WidgetKind> {
    WIDGET_TABLE
        .iter()
        .find(|(alias, _)| *alias == type_name)
        .map(|(_, kind)| *kind)
}

impl WidgetKind {
    /// Whether this widget lays out child nodes.
    pub fn is_layout(self) -> bool {
        matches!(
            self,
            WidgetKind::Card | WidgetKind::Collapsible | WidgetKind::Container
        )
    }

    /// All type strings that resolve to this kind, in table order.
    pub fn aliases(self) -> impl Iterator<Item = &'static str> {
        WIDGET_TABLE
            .iter()
            .filter(move |(_, kind)| *kind == self)
            .map(|(alias, _)| *alias)
    }
}
