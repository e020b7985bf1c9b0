use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeystrokeError {
    #[error("empty keystroke")]
    Empty,

    #[error("unknown key '{0}'")]
    UnknownKey(String),

    #[error("keystroke '{0}' has no key, only modifiers")]
    MissingKey(String),
}

/// Physical key, independent of modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Printable character, always stored lowercase
    Char(char),
    Tab,
    Enter,
    Backspace,
    Delete,
    Escape,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
}

impl Key {
    /// Printable key; letters are folded to lowercase so Shift is carried by the modifiers
    pub fn char(c: char) -> Self {
        Key::Char(c.to_ascii_lowercase())
    }

    fn parse(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Some(Key::char(c));
        }
        let key = match name.to_ascii_lowercase().as_str() {
            "tab" => Key::Tab,
            "enter" | "return" => Key::Enter,
            "backspace" => Key::Backspace,
            "delete" | "del" => Key::Delete,
            "esc" | "escape" => Key::Escape,
            "left" | "arrowleft" => Key::Left,
            "right" | "arrowright" => Key::Right,
            "up" | "arrowup" => Key::Up,
            "down" | "arrowdown" => Key::Down,
            "home" => Key::Home,
            "end" => Key::End,
            "space" => Key::Char(' '),
            _ => return None,
        };
        Some(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(' ') => f.write_str("Space"),
            Key::Char(c) => write!(f, "{}", c.to_ascii_uppercase()),
            Key::Tab => f.write_str("Tab"),
            Key::Enter => f.write_str("Enter"),
            Key::Backspace => f.write_str("Backspace"),
            Key::Delete => f.write_str("Delete"),
            Key::Escape => f.write_str("Esc"),
            Key::Left => f.write_str("Left"),
            Key::Right => f.write_str("Right"),
            Key::Up => f.write_str("Up"),
            Key::Down => f.write_str("Down"),
            Key::Home => f.write_str("Home"),
            Key::End => f.write_str("End"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }
}

/// A key plus the exact set of modifiers held with it.
///
/// Keystrokes compare exactly: `Alt+Tab` is not `Tab`, and neither is `Ctrl+Tab`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Keystroke {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl Keystroke {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::NONE)
    }
}

impl FromStr for Keystroke {
    type Err = KeystrokeError;

    /// Parse strings like `Tab`, `Shift+Tab` or `ctrl+alt+b` (case-insensitive)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(KeystrokeError::Empty);
        }

        let mut modifiers = Modifiers::NONE;
        let mut key = None;
        for part in s.split('+').map(str::trim) {
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => modifiers.ctrl = true,
                "alt" | "option" => modifiers.alt = true,
                "shift" => modifiers.shift = true,
                "meta" | "cmd" | "super" => modifiers.meta = true,
                _ => {
                    key = Some(
                        Key::parse(part)
                            .ok_or_else(|| KeystrokeError::UnknownKey(part.to_string()))?,
                    )
                }
            }
        }

        let key = key.ok_or_else(|| KeystrokeError::MissingKey(s.to_string()))?;
        Ok(Keystroke::new(key, modifiers))
    }
}

impl fmt::Display for Keystroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Modifiers {
            ctrl,
            alt,
            shift,
            meta,
        } = self.modifiers;
        for (held, name) in [(ctrl, "Ctrl"), (alt, "Alt"), (shift, "Shift"), (meta, "Meta")] {
            if held {
                write!(f, "{name}+")?;
            }
        }
        write!(f, "{}", self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Tab", Keystroke::plain(Key::Tab))]
    #[case("Shift+Tab", Keystroke::new(Key::Tab, Modifiers::NONE.with_shift()))]
    #[case("alt + shift + tab", Keystroke::new(Key::Tab, Modifiers::NONE.with_alt().with_shift()))]
    #[case("Ctrl+B", Keystroke::new(Key::Char('b'), Modifiers::NONE.with_ctrl()))]
    #[case("cmd+space", Keystroke::new(Key::Char(' '), Modifiers::NONE.with_meta()))]
    fn test_parse_keystroke(#[case] input: &str, #[case] expected: Keystroke) {
        assert_eq!(input.parse::<Keystroke>(), Ok(expected));
    }

    #[rstest]
    #[case("", KeystrokeError::Empty)]
    #[case("Shift+", KeystrokeError::UnknownKey(String::new()))]
    #[case("Ctrl+Shift", KeystrokeError::MissingKey("Ctrl+Shift".to_string()))]
    #[case("Hyper+Tab", KeystrokeError::UnknownKey("Hyper".to_string()))]
    fn test_parse_keystroke_errors(#[case] input: &str, #[case] expected: KeystrokeError) {
        assert_eq!(input.parse::<Keystroke>(), Err(expected));
    }

    #[test]
    fn test_display_is_parseable() {
        let keystroke = Keystroke::new(Key::Char('n'), Modifiers::NONE.with_ctrl().with_shift());

        assert_eq!(keystroke.to_string(), "Ctrl+Shift+N");
        assert_eq!(keystroke.to_string().parse::<Keystroke>(), Ok(keystroke));
    }

    #[test]
    fn test_alt_tab_is_not_tab() {
        let alt_tab: Keystroke = "Alt+Tab".parse().unwrap();
        assert_ne!(alt_tab, Keystroke::plain(Key::Tab));
    }
}
