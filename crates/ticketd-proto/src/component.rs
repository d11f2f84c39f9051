//! Message components: action rows, buttons and select menus.
//!
//! Components are only ever sent by the daemon, so they implement
//! `Serialize` and not `Deserialize`. The wire format tags every component
//! with a numeric `type`, which is why serialization is written by hand.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Button colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonStyle {
    /// Blurple.
    Primary,
    /// Grey.
    Secondary,
    /// Green.
    Success,
    /// Red.
    Danger,
}

impl ButtonStyle {
    fn wire(self) -> u8 {
        match self {
            Self::Primary => 1,
            Self::Secondary => 2,
            Self::Success => 3,
            Self::Danger => 4,
        }
    }
}

/// An emoji attached to a button or select option.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Emoji {
    /// A unicode emoji such as `🔒`.
    Unicode(String),
    /// A custom guild emoji referenced by id.
    Custom(u64),
}

impl Serialize for Emoji {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Self::Unicode(name) => map.serialize_entry("name", name)?,
            Self::Custom(id) => map.serialize_entry("id", &id.to_string())?,
        }
        map.end()
    }
}

/// A clickable button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// Routing id echoed back when clicked.
    pub custom_id: String,
    /// Visible label.
    pub label: String,
    /// Optional emoji shown before the label.
    pub emoji: Option<Emoji>,
    /// Colour.
    pub style: ButtonStyle,
    /// Greyed out and unclickable.
    pub disabled: bool,
}

impl Button {
    /// An enabled button with no emoji.
    pub fn new(custom_id: impl Into<String>, label: impl Into<String>, style: ButtonStyle) -> Self {
        Self {
            custom_id: custom_id.into(),
            label: label.into(),
            emoji: None,
            style,
            disabled: false,
        }
    }

    /// Attach an emoji.
    pub fn with_emoji(mut self, emoji: Emoji) -> Self {
        self.emoji = Some(emoji);
        self
    }

    /// Mark the button disabled.
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

/// One entry of a select menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    /// Visible label.
    pub label: String,
    /// Value delivered in the interaction when chosen.
    pub value: String,
    /// Secondary text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional emoji.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<Emoji>,
}

/// A string select menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectMenu {
    /// Routing id echoed back on selection.
    pub custom_id: String,
    /// Text shown while nothing is selected.
    pub placeholder: Option<String>,
    /// Choices.
    pub options: Vec<SelectOption>,
}

/// A component that can live inside an action row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    /// Component type 2.
    Button(Button),
    /// Component type 3.
    Select(SelectMenu),
}

impl Component {
    /// The routing id of this component.
    pub fn custom_id(&self) -> &str {
        match self {
            Self::Button(b) => &b.custom_id,
            Self::Select(s) => &s.custom_id,
        }
    }
}

impl Serialize for Component {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            Self::Button(b) => {
                map.serialize_entry("type", &2u8)?;
                map.serialize_entry("custom_id", &b.custom_id)?;
                map.serialize_entry("label", &b.label)?;
                map.serialize_entry("style", &b.style.wire())?;
                if let Some(emoji) = &b.emoji {
                    map.serialize_entry("emoji", emoji)?;
                }
                if b.disabled {
                    map.serialize_entry("disabled", &true)?;
                }
            }
            Self::Select(s) => {
                map.serialize_entry("type", &3u8)?;
                map.serialize_entry("custom_id", &s.custom_id)?;
                if let Some(placeholder) = &s.placeholder {
                    map.serialize_entry("placeholder", placeholder)?;
                }
                map.serialize_entry("options", &s.options)?;
            }
        }
        map.end()
    }
}

/// A horizontal row of components (component type 1).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionRow {
    /// Components in display order.
    pub components: Vec<Component>,
}

impl ActionRow {
    /// A row of buttons.
    pub fn buttons(buttons: impl IntoIterator<Item = Button>) -> Self {
        Self {
            components: buttons.into_iter().map(Component::Button).collect(),
        }
    }

    /// A row holding a single select menu.
    pub fn select(menu: SelectMenu) -> Self {
        Self {
            components: vec![Component::Select(menu)],
        }
    }

    /// Routing ids of every component in the row.
    pub fn custom_ids(&self) -> Vec<&str> {
        self.components.iter().map(Component::custom_id).collect()
    }
}

impl Serialize for ActionRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("type", &1u8)?;
        map.serialize_entry("components", &self.components)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn button_row_wire_shape() {
        let row = ActionRow::buttons([
            Button::new("ticket_close", "Fechar", ButtonStyle::Secondary)
                .with_emoji(Emoji::Unicode("🔒".into())),
            Button::new("ticket_delete", "Excluir", ButtonStyle::Danger)
                .with_emoji(Emoji::Custom(123456789012345678)),
        ]);
        let v = serde_json::to_value(&row).unwrap();
        assert_eq!(
            v,
            json!({
                "type": 1,
                "components": [
                    { "type": 2, "custom_id": "ticket_close", "label": "Fechar", "style": 2,
                      "emoji": { "name": "🔒" } },
                    { "type": 2, "custom_id": "ticket_delete", "label": "Excluir", "style": 4,
                      "emoji": { "id": "123456789012345678" } }
                ]
            })
        );
    }

    #[test]
    fn disabled_flag_only_when_set() {
        let v = serde_json::to_value(Component::Button(
            Button::new("disabled1", "Fechando...", ButtonStyle::Secondary).disabled(),
        ))
        .unwrap();
        assert_eq!(v["disabled"], true);
    }

    #[test]
    fn select_menu_wire_shape() {
        let row = ActionRow::select(SelectMenu {
            custom_id: "ticket_select".into(),
            placeholder: Some("Escolha".into()),
            options: vec![SelectOption {
                label: "Suporte".into(),
                value: "suporte".into(),
                description: None,
                emoji: None,
            }],
        });
        let v = serde_json::to_value(&row).unwrap();
        assert_eq!(v["components"][0]["type"], 3);
        assert_eq!(v["components"][0]["options"][0]["value"], "suporte");
        assert!(v["components"][0]["options"][0].get("description").is_none());
        assert_eq!(row.custom_ids(), vec!["ticket_select"]);
    }
}
