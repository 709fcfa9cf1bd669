//! Display identities for pipeline components.
//!
//! Each component label maps to a color and a nesting depth. The depth
//! controls how far trace lines for that component are indented.

use std::fmt;
use std::str::FromStr;

use hashbrown::HashMap;
use thiserror::Error;

/// Component labels used by the built-in identity table.
pub mod labels {
    /// The compiler driving a run.
    pub const COMPILER: &str = "Compiler";
    /// A single compilation.
    pub const COMPILATION: &str = "Compilation";
    /// Factory for context modules.
    pub const CONTEXT_MODULE_FACTORY: &str = "Context Module Factory";
    /// Factory for normal modules.
    pub const NORMAL_MODULE_FACTORY: &str = "Normal Module Factory";
    /// The resolver factory.
    pub const RESOLVER: &str = "Resolver";
    /// A parser created for one module type.
    pub const PARSER: &str = "Parser";
    /// Renders the runtime bootstrap.
    pub const MAIN_TEMPLATE: &str = "MainTemplate";
    /// Renders non-entry chunks.
    pub const CHUNK_TEMPLATE: &str = "ChunkTemplate";
    /// Renders hot-update chunks.
    pub const HOT_UPDATE_CHUNK_TEMPLATE: &str = "HotUpdateChunkTemplate";
    /// Renders JavaScript and JSON modules.
    pub const JAVASCRIPT_MODULE_TEMPLATE: &str = "JavaScriptModuleTemplate";
    /// Renders WebAssembly modules.
    pub const WEBASSEMBLY_MODULE_TEMPLATE: &str = "WebAssemblyModuleTemplate";
}

/// Error parsing a `#RRGGBB` color.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid hex color '{0}': expected #RRGGBB")]
pub struct ParseColorError(pub String);

/// A 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Creates a color from its channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for Rgb {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseColorError(s.to_owned());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
        };
        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// How a component is drawn in trace output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    /// Color of the trace line.
    pub color: Rgb,
    /// Nesting level; each level indents the line by four spaces.
    pub depth: usize,
}

/// Fallback for labels absent from the table.
pub const DEFAULT_IDENTITY: Identity = Identity {
    color: Rgb::new(0xA3, 0xDE, 0x83),
    depth: 0,
};

/// Label to identity lookup with a default for unknown labels.
#[derive(Debug, Clone)]
pub struct IdentityTable {
    entries: HashMap<String, Identity>,
    default: Identity,
}

impl IdentityTable {
    /// A table with no entries; every label resolves to `default`.
    #[must_use]
    pub fn empty(default: Identity) -> Self {
        Self {
            entries: HashMap::new(),
            default,
        }
    }

    /// The built-in table covering the pipeline's components.
    #[must_use]
    pub fn builtin() -> Self {
        use labels::*;

        [
            (COMPILER, "#F12D2D", 0),
            (COMPILATION, "#FF9A3C", 1),
            (RESOLVER, "#5AC8D8", 1),
            (NORMAL_MODULE_FACTORY, "#FC5185", 1),
            (CONTEXT_MODULE_FACTORY, "#FFDE25", 1),
            (MAIN_TEMPLATE, "#EFE891", 2),
            (CHUNK_TEMPLATE, "#50E3C2", 2),
            (HOT_UPDATE_CHUNK_TEMPLATE, "#D5FFFB", 2),
            (JAVASCRIPT_MODULE_TEMPLATE, "#239D60", 2),
            (WEBASSEMBLY_MODULE_TEMPLATE, "#D1F386", 2),
            (PARSER, "#00BBF0", 2),
        ]
        .into_iter()
        .fold(Self::empty(DEFAULT_IDENTITY), |table, (label, color, depth)| {
            table.with_identity(label, color, depth)
        })
    }

    /// Adds or replaces the identity for `label`.
    ///
    /// A malformed color keeps the default color but still applies `depth`.
    #[must_use]
    pub fn with_identity(mut self, label: impl Into<String>, color: &str, depth: usize) -> Self {
        let label = label.into();
        let color = match color.parse::<Rgb>() {
            Ok(color) => color,
            Err(err) => {
                tracing::warn!(label = %label, error = %err, "using default trace color");
                self.default.color
            }
        };
        self.entries.insert(label, Identity { color, depth });
        self
    }

    /// Identity for `label`, or the default.
    #[must_use]
    pub fn resolve(&self, label: &str) -> Identity {
        self.entries.get(label).copied().unwrap_or(self.default)
    }

    /// Whether `label` has its own entry.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.entries.contains_key(label)
    }

    /// The identity used for labels without an entry.
    #[must_use]
    pub fn default_identity(&self) -> Identity {
        self.default
    }
}

impl Default for IdentityTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!("#A3DE83".parse::<Rgb>(), Ok(Rgb::new(0xA3, 0xDE, 0x83)));
        assert_eq!("#ff0080".parse::<Rgb>(), Ok(Rgb::new(0xFF, 0x00, 0x80)));
    }

    #[test]
    fn rejects_malformed_colors() {
        for bad in ["A3DE83", "#A3DE8", "#A3DE833", "#GGGGGG", "", "#+F+F+F"] {
            assert!(bad.parse::<Rgb>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn display_round_trips_through_parse() {
        let color = Rgb::new(0x12, 0xAB, 0xEF);
        assert_eq!(color.to_string(), "#12ABEF");
        assert_eq!(color.to_string().parse::<Rgb>(), Ok(color));
    }

    #[test]
    fn builtin_table_nests_components() {
        let table = IdentityTable::builtin();

        assert_eq!(table.resolve(labels::COMPILER).depth, 0);
        assert_eq!(table.resolve(labels::COMPILATION).depth, 1);
        assert_eq!(table.resolve(labels::PARSER).depth, 2);
        assert_eq!(
            table.resolve(labels::COMPILER).color,
            Rgb::new(0xF1, 0x2D, 0x2D)
        );
    }

    #[test]
    fn unknown_label_resolves_to_default() {
        let table = IdentityTable::builtin();

        assert!(!table.contains("Mystery"));
        assert_eq!(table.resolve("Mystery"), DEFAULT_IDENTITY);
    }

    #[test]
    fn malformed_color_falls_back_to_default_color() {
        let table = IdentityTable::empty(DEFAULT_IDENTITY).with_identity("Odd", "red", 3);

        let identity = table.resolve("Odd");
        assert_eq!(identity.color, DEFAULT_IDENTITY.color);
        assert_eq!(identity.depth, 3);
    }
}
