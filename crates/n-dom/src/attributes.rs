// SPDX-License-Identifier: MIT
//
// Typed element attributes.
//
// Markup hands us `(name, value)` string pairs. They are folded, in order,
// onto a default record. Unknown names are ignored and malformed values
// fall back to the zero value for the field, so a bad attribute can never
// fail document construction.

use std::fmt;
use std::str::FromStr;

// ─── Attribute names ────────────────────────────────────────────────────────

/// Every attribute key the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrName {
    Display,
    Position,
    Flex,
    FlexDirection,
    Focusable,
    Color,
    BackgroundColor,
    Width,
    MaxWidth,
    MinWidth,
    Height,
    MaxHeight,
    MinHeight,
    Border,
    VCenter,
    HCenter,
    Top,
    Left,
    Id,
    TextAlign,
    Writable,
    TextType,
    ZIndex,
    Overflow,
}

impl AttrName {
    pub const ALL: [Self; 24] = [
        Self::Display,
        Self::Position,
        Self::Flex,
        Self::FlexDirection,
        Self::Focusable,
        Self::Color,
        Self::BackgroundColor,
        Self::Width,
        Self::MaxWidth,
        Self::MinWidth,
        Self::Height,
        Self::MaxHeight,
        Self::MinHeight,
        Self::Border,
        Self::VCenter,
        Self::HCenter,
        Self::Top,
        Self::Left,
        Self::Id,
        Self::TextAlign,
        Self::Writable,
        Self::TextType,
        Self::ZIndex,
        Self::Overflow,
    ];

    /// The markup spelling of this key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Display => "display",
            Self::Position => "position",
            Self::Flex => "flex",
            Self::FlexDirection => "flex-direction",
            Self::Focusable => "focusable",
            Self::Color => "color",
            Self::BackgroundColor => "background-color",
            Self::Width => "width",
            Self::MaxWidth => "max-width",
            Self::MinWidth => "min-width",
            Self::Height => "height",
            Self::MaxHeight => "max-height",
            Self::MinHeight => "min-height",
            Self::Border => "border",
            Self::VCenter => "vcenter",
            Self::HCenter => "hcenter",
            Self::Top => "top",
            Self::Left => "left",
            Self::Id => "id",
            Self::TextAlign => "text-align",
            Self::Writable => "writable",
            Self::TextType => "text-type",
            Self::ZIndex => "z-index",
            Self::Overflow => "overflow",
        }
    }
}

/// Returned when a string is not a known attribute key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAttr;

impl FromStr for AttrName {
    type Err = UnknownAttr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or(UnknownAttr)
    }
}

impl fmt::Display for AttrName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes a child receives from its parent. Nothing else propagates.
pub const INHERITED: [AttrName; 2] = [AttrName::Color, AttrName::BackgroundColor];

// ─── Keyword enums ──────────────────────────────────────────────────────────

/// Declares a keyword enum whose first listed variant is the fallback for
/// unrecognized input.
macro_rules! keyword_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $default:ident = $default_kw:literal $(, $variant:ident = $kw:literal)* $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub enum $name {
            #[default]
            $default,
            $($variant,)*
        }

        impl $name {
            /// Parse a keyword, falling back to the default variant.
            #[must_use]
            pub fn from_keyword(s: &str) -> Self {
                match s {
                    $($kw => Self::$variant,)*
                    _ => Self::$default,
                }
            }

            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    Self::$default => $default_kw,
                    $(Self::$variant => $kw,)*
                }
            }
        }
    };
}

keyword_enum! {
    /// Which layout strategy positions and paints an element.
    Display { Block = "block", Flex = "flex", Absolute = "absolute" }
}

keyword_enum! {
    Position { Relative = "relative", Absolute = "absolute" }
}

keyword_enum! {
    /// Main axis and placement order of a flex container.
    FlexDirection {
        Row = "row",
        RowReverse = "row-reverse",
        Column = "column",
        ColumnReverse = "column-reverse",
    }
}

keyword_enum! {
    TextAlign { Left = "left", Center = "center", Right = "right" }
}

keyword_enum! {
    TextType {
        Text = "text",
        Password = "password",
        Number = "number",
        Email = "email",
        Tel = "tel",
        Url = "url",
    }
}

keyword_enum! {
    Overflow { Hidden = "hidden", Scroll = "scroll" }
}

impl FlexDirection {
    /// Whether children are distributed along the vertical axis.
    #[must_use]
    pub const fn is_column(self) -> bool {
        matches!(self, Self::Column | Self::ColumnReverse)
    }

    #[must_use]
    pub const fn is_reverse(self) -> bool {
        matches!(self, Self::RowReverse | Self::ColumnReverse)
    }
}

// ─── Value parsers ──────────────────────────────────────────────────────────

/// Boolean spellings accepted by markup. Anything else is `false`.
#[must_use]
pub fn parse_bool(s: &str) -> bool {
    matches!(s, "1" | "t" | "T" | "TRUE" | "true" | "True")
}

/// Signed decimal with an optional leading `+`. Anything else is 0.
#[must_use]
pub fn parse_int(s: &str) -> i32 {
    s.parse().unwrap_or(0)
}

fn parse_u8(s: &str) -> u8 {
    s.parse().unwrap_or(0)
}

// ─── Attributes ─────────────────────────────────────────────────────────────

/// The flat attribute record carried by every element.
///
/// `Default` is the all-zero record. Elements built from markup start from
/// [`element_defaults`](Self::element_defaults) instead.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct Attributes {
    pub display: Display,
    pub position: Position,
    pub flex: i32,
    pub flex_direction: FlexDirection,
    pub focusable: bool,
    pub color: i32,
    pub background_color: i32,
    pub width: i32,
    pub max_width: i32,
    pub min_width: i32,
    pub height: i32,
    pub max_height: i32,
    pub min_height: i32,
    pub border: bool,
    pub vcenter: bool,
    pub hcenter: bool,
    pub top: i32,
    pub left: i32,
    pub id: String,
    pub text_align: TextAlign,
    pub writable: bool,
    pub text_type: TextType,
    pub z_index: u8,
    pub overflow: Overflow,
}

impl Attributes {
    /// Starting record for markup-built elements: zero except `flex = 1`.
    #[must_use]
    pub fn element_defaults() -> Self {
        Self {
            flex: 1,
            ..Self::default()
        }
    }

    /// Fold `pairs` onto the zero record.
    #[must_use]
    pub fn parse<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut attrs = Self::default();
        attrs.apply(pairs);
        attrs
    }

    /// Fold `pairs` onto this record in order. Later pairs win.
    pub fn apply<'a, I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (name, value) in pairs {
            self.set_raw(name, value);
        }
    }

    /// Apply one raw pair. Unknown names are a no-op.
    pub fn set_raw(&mut self, name: &str, value: &str) {
        if let Ok(name) = name.parse() {
            self.set(name, value);
        }
    }

    /// Apply one typed pair.
    pub fn set(&mut self, name: AttrName, value: &str) {
        match name {
            AttrName::Display => self.display = Display::from_keyword(value),
            AttrName::Position => self.position = Position::from_keyword(value),
            AttrName::Flex => self.flex = parse_int(value),
            AttrName::FlexDirection => self.flex_direction = FlexDirection::from_keyword(value),
            AttrName::Focusable => self.focusable = parse_bool(value),
            AttrName::Color => self.color = parse_int(value),
            AttrName::BackgroundColor => self.background_color = parse_int(value),
            AttrName::Width => self.width = parse_int(value),
            AttrName::MaxWidth => self.max_width = parse_int(value),
            AttrName::MinWidth => self.min_width = parse_int(value),
            AttrName::Height => self.height = parse_int(value),
            AttrName::MaxHeight => self.max_height = parse_int(value),
            AttrName::MinHeight => self.min_height = parse_int(value),
            AttrName::Border => self.border = parse_bool(value),
            AttrName::VCenter => self.vcenter = parse_bool(value),
            AttrName::HCenter => self.hcenter = parse_bool(value),
            AttrName::Top => self.top = parse_int(value),
            AttrName::Left => self.left = parse_int(value),
            AttrName::Id => value.clone_into(&mut self.id),
            AttrName::TextAlign => self.text_align = TextAlign::from_keyword(value),
            AttrName::Writable => self.writable = parse_bool(value),
            AttrName::TextType => self.text_type = TextType::from_keyword(value),
            AttrName::ZIndex => self.z_index = parse_u8(value),
            AttrName::Overflow => self.overflow = Overflow::from_keyword(value),
        }
    }

    /// Copy the [`INHERITED`] fields from `parent`.
    pub fn inherit_from(&mut self, parent: &Self) {
        for name in INHERITED {
            match name {
                AttrName::Color => self.color = parent.color,
                AttrName::BackgroundColor => self.background_color = parent.background_color,
                _ => {}
            }
        }
    }

    /// Size along the main axis of a container with `direction`.
    #[must_use]
    pub const fn main_size(&self, direction: FlexDirection) -> i32 {
        if direction.is_column() { self.height } else { self.width }
    }

    #[must_use]
    pub const fn main_min(&self, direction: FlexDirection) -> i32 {
        if direction.is_column() { self.min_height } else { self.min_width }
    }

    #[must_use]
    pub const fn main_max(&self, direction: FlexDirection) -> i32 {
        if direction.is_column() { self.max_height } else { self.max_width }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
