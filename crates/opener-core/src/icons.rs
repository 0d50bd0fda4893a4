//! Compiled-in visual tables: collection icons, the project color palette and
//! generated record ids.

use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconOption {
    pub key: &'static str,
    pub label: &'static str,
}

const fn icon(key: &'static str, label: &'static str) -> IconOption {
    IconOption { key, label }
}

/// Collection icons offered to the user, already in display order.
pub const ICON_OPTIONS: &[IconOption] = &[
    icon("AppWindow", "App Window"),
    icon("Book", "Book"),
    icon("Box", "Box"),
    icon("Bug", "Bug"),
    icon("Calendar", "Calendar"),
    icon("Clock", "Clock"),
    icon("Cloud", "Cloud"),
    icon("Code", "Code"),
    icon("ComputerChip", "Computer Chip"),
    icon("ExclamationMark", "Exclamation Mark"),
    icon("Folder", "Folder"),
    icon("Gear", "Gear"),
    icon("Globe", "Globe"),
    icon("Hammer", "Hammer"),
    icon("Heart", "Heart"),
    icon("House", "House"),
    icon("Layers", "Layers"),
    icon("Lock", "Lock"),
    icon("Mobile", "Mobile"),
    icon("QuestionMark", "Question Mark"),
    icon("Rocket", "Rocket"),
    icon("Star", "Star"),
    icon("Tag", "Tag"),
    icon("Terminal", "Terminal"),
    icon("Wrench", "Wrench"),
];

pub fn icon_option(key: &str) -> Option<&'static IconOption> {
    ICON_OPTIONS.iter().find(|option| option.key == key)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconColor {
    pub name: &'static str,
    pub value: &'static str,
}

const fn color(name: &'static str, value: &'static str) -> IconColor {
    IconColor { name, value }
}

/// Colors that keep white initials readable.
pub const ICON_COLORS: &[IconColor] = &[
    color("Red", "#E53935"),
    color("Pink", "#D81B60"),
    color("Purple", "#8E24AA"),
    color("Deep Purple", "#5E35B1"),
    color("Indigo", "#3949AB"),
    color("Blue", "#1E88E5"),
    color("Teal", "#00897B"),
    color("Green", "#43A047"),
    color("Orange", "#FB8C00"),
    color("Deep Orange", "#F4511E"),
    color("Brown", "#6D4C41"),
    color("Blue Grey", "#546E7A"),
];

pub fn random_icon_color() -> &'static str {
    random_icon_color_with_rng(&mut rand::rng())
}

pub fn random_icon_color_with_rng<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    ICON_COLORS[rng.random_range(0..ICON_COLORS.len())].value
}

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// `<prefix>_<millis>_<6 base36 chars>`, e.g. `coll_1718000000000_k3x9qa`.
pub fn generate_id(prefix: &str, now_ms: i64) -> String {
    generate_id_with_rng(prefix, now_ms, &mut rand::rng())
}

pub fn generate_id_with_rng<R: Rng + ?Sized>(prefix: &str, now_ms: i64, rng: &mut R) -> String {
    let suffix: String = (0..6)
        .map(|_| char::from(ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())]))
        .collect();
    format!("{prefix}_{now_ms}_{suffix}")
}
