//! Category lists and identifiers of the catalog

pub const BASE_URL: &str = "https://www.myabandonware.com";

/// Initials of the by-name listing, `$` groups names starting with a symbol
pub const NAME_INITIALS: &str = "$0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub const FIRST_YEAR: u16 = 1978;
pub const LAST_YEAR: u16 = 2017;

pub const PLATFORMS: &[&str] = &[
    "amiga",
    "amiga-cd32",
    "cpc",
    "apple2",
    "apple2gs",
    "atari-8-bit",
    "atari-st",
    "colecovision",
    "commodore-16-plus4",
    "c64",
    "dos",
    "dragon-3264",
    "game-gear",
    "genesis",
    "linux",
    "mac",
    "msx",
    "pc88",
    "pc98",
    "sega-32x",
    "sega-cd",
    "sega-master-system",
    "vic-20",
    "windows",
    "win3x",
    "zx-spectrum",
];

/// Genre slugs as used in URLs, `{name}-{id}`
pub const GENRES: &[&str] = &[
    "action-1",
    "adventure-2",
    "educational-3",
    "puzzle-9",
    "racing-4",
    "rpg-5",
    "simulation-7",
    "sports-8",
    "strategy-6",
];

/// Numeric id of a platform in search URLs
#[must_use]
pub fn platform_id(platform: &str) -> Option<u32> {
    let id = match platform {
        "amiga" => 8,
        "amiga-cd32" => 9,
        "cpc" => 10,
        "apple2" => 13,
        "apple2gs" => 14,
        "atari-8-bit" => 19,
        "atari-st" => 20,
        "colecovision" => 31,
        "commodore-16-plus4" => 33,
        "c64" => 34,
        "dos" => 1,
        "dragon-3264" => 37,
        "game-gear" => 52,
        "genesis" => 56,
        "linux" => 3,
        "mac" => 2,
        "msx" => 63,
        "pc88" => 86,
        "pc98" => 87,
        "sega-32x" => 101,
        "sega-cd" => 102,
        "sega-master-system" => 103,
        "vic-20" => 125,
        "windows" => 4,
        "win3x" => 5,
        "zx-spectrum" => 138,
        _ => return None,
    };
    Some(id)
}
