//! Symbolic key vocabulary → OS key codes.
//!
//! The wire carries normalized lowercase names: single printable
//! characters, a small set of named specials, and `f1`..`f24`. Anything
//! else resolves to `None` and the event is dropped.

use enigo::Key;

/// Resolve a symbolic key name to an injectable key.
pub fn lookup(name: &str) -> Option<Key> {
    // Single printable character
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if !c.is_control() {
            return Some(Key::Unicode(c));
        }
        return None;
    }

    match name {
        "esc" => Some(Key::Escape),
        "tab" => Some(Key::Tab),
        "backspace" => Some(Key::Backspace),
        "enter" => Some(Key::Return),
        "space" => Some(Key::Space),
        "left" => Some(Key::LeftArrow),
        "right" => Some(Key::RightArrow),
        "up" => Some(Key::UpArrow),
        "down" => Some(Key::DownArrow),
        "shift" => Some(Key::Shift),
        "ctrl" => Some(Key::Control),
        "alt" => Some(Key::Alt),
        "cmd" => Some(Key::Meta),
        "delete" => Some(Key::Delete),
        _ => function_key(name),
    }
}

fn function_key(name: &str) -> Option<Key> {
    let n: u8 = name.strip_prefix('f')?.parse().ok()?;
    let key = match n {
        1 => Key::F1,
        2 => Key::F2,
        3 => Key::F3,
        4 => Key::F4,
        5 => Key::F5,
        6 => Key::F6,
        7 => Key::F7,
        8 => Key::F8,
        9 => Key::F9,
        10 => Key::F10,
        11 => Key::F11,
        12 => Key::F12,
        13 => Key::F13,
        14 => Key::F14,
        15 => Key::F15,
        16 => Key::F16,
        17 => Key::F17,
        18 => Key::F18,
        19 => Key::F19,
        20 => Key::F20,
        21 => Key::F21,
        22 => Key::F22,
        23 => Key::F23,
        24 => Key::F24,
        _ => return None,
    };
    Some(key)
}
