use serde::{Deserialize, Serialize};

/// Modifier flags for a synthesized key press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub command: bool,
    pub shift: bool,
    pub option: bool,
    pub control: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        command: false,
        shift: false,
        option: false,
        control: false,
    };

    pub fn cmd() -> Self {
        Modifiers {
            command: true,
            ..Self::NONE
        }
    }

    pub fn cmd_shift() -> Self {
        Modifiers {
            command: true,
            shift: true,
            ..Self::NONE
        }
    }

    pub fn cmd_option() -> Self {
        Modifiers {
            command: true,
            option: true,
            ..Self::NONE
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

/// A physical key identifier (macOS virtual key code).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyCode(pub u16);

/// A logical key plus the modifiers it is pressed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCommand {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

/// Resolves a symbol (single printable character or named key such as
/// `"return"`, `"down"`, `"f5"`) to a key command. Shifted characters
/// resolve to their base key with an implied Shift. Returns `None` for
/// symbols with no physical key on the target layout.
pub fn lookup(symbol: &str, modifiers: Modifiers) -> Option<KeyCommand> {
    let mut chars = symbol.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        let (code, shifted) = char_key(c)?;
        let modifiers = if shifted {
            modifiers.with_shift()
        } else {
            modifiers
        };
        return Some(KeyCommand {
            code: KeyCode(code),
            modifiers,
        });
    }
    named_key(symbol).map(|code| KeyCommand {
        code: KeyCode(code),
        modifiers,
    })
}

/// Key code for a printable character, with whether Shift is implied.
fn char_key(c: char) -> Option<(u16, bool)> {
    if c.is_ascii_uppercase() {
        let (code, _) = char_key(c.to_ascii_lowercase())?;
        return Some((code, true));
    }
    let code = match c {
        'a' => 0,
        's' => 1,
        'd' => 2,
        'f' => 3,
        'h' => 4,
        'g' => 5,
        'z' => 6,
        'x' => 7,
        'c' => 8,
        'v' => 9,
        'b' => 11,
        'q' => 12,
        'w' => 13,
        'e' => 14,
        'r' => 15,
        'y' => 16,
        't' => 17,
        '1' => 18,
        '2' => 19,
        '3' => 20,
        '4' => 21,
        '6' => 22,
        '5' => 23,
        '=' => 24,
        '9' => 25,
        '7' => 26,
        '-' => 27,
        '8' => 28,
        '0' => 29,
        ']' => 30,
        'o' => 31,
        'u' => 32,
        '[' => 33,
        'i' => 34,
        'p' => 35,
        'l' => 37,
        'j' => 38,
        '\'' => 39,
        'k' => 40,
        ';' => 41,
        '\\' => 42,
        ',' => 43,
        '/' => 44,
        'n' => 45,
        'm' => 46,
        '.' => 47,
        '`' => 50,
        ' ' => 49,
        '\t' => 48,
        '\n' => 36,
        _ => return shifted_char_key(c),
    };
    Some((code, false))
}

/// Characters reachable only through Shift on the base layout.
fn shifted_char_key(c: char) -> Option<(u16, bool)> {
    let base = match c {
        '!' => '1',
        '@' => '2',
        '#' => '3',
        '$' => '4',
        '%' => '5',
        '^' => '6',
        '&' => '7',
        '*' => '8',
        '(' => '9',
        ')' => '0',
        '_' => '-',
        '+' => '=',
        '{' => '[',
        '}' => ']',
        '|' => '\\',
        ':' => ';',
        '"' => '\'',
        '<' => ',',
        '>' => '.',
        '?' => '/',
        '~' => '`',
        _ => return None,
    };
    let (code, _) = char_key(base)?;
    Some((code, true))
}

fn named_key(name: &str) -> Option<u16> {
    let code = match name.to_ascii_lowercase().as_str() {
        "return" | "enter" => 36,
        "tab" => 48,
        "space" => 49,
        "escape" | "esc" => 53,
        "backspace" | "delete" => 51,
        "forward_delete" => 117,
        "home" => 115,
        "end" => 119,
        "page_up" => 116,
        "page_down" => 121,
        "left" => 123,
        "right" => 124,
        "down" => 125,
        "up" => 126,
        "help" => 114,
        "caps_lock" => 57,
        "keypad_enter" => 76,
        "f1" => 122,
        "f2" => 120,
        "f3" => 99,
        "f4" => 118,
        "f5" => 96,
        "f6" => 97,
        "f7" => 98,
        "f8" => 100,
        "f9" => 101,
        "f10" => 109,
        "f11" => 103,
        "f12" => 111,
        _ => return None,
    };
    Some(code)
}
