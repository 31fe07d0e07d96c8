//! This module holds the static signature tables the built-in plugins match against.
//! Keeping them as plain data means new signatures are a one-line change and the
//! plugin code never needs to move.

/// Page fragments that identify parked, suspended or placeholder sites.
/// Matching is case-sensitive.
pub static PARKING_SIGNATURES: &[&str] = &[
    "this domain is not serviced by dnsdun.com. Please contact us.",
    "Buy this domain",
    "404 Not Found",
    "parked-content.godaddy.com",
    "Sponsored Listings",
    "Parkingcrew",
    "Freenom",
    "This is the default welcome page used to test the correct operation of the Apache2 server",
    "Sorry, this page doesn't exist.",
    "WEBSITE DELETED",
    "Website is sleeping",
    "PHPMyAdmin installation",
    "Account Suspended",
    "You have successfully installed the OpenLiteSpeed Web Server!",
    "under construction",
    "Website is Under Maintenance",
    "buydomains.com",
    "Page cannot be displayed",
    "This site is temporarily unavailable.",
    "Error. Page cannot be displayed.",
    "Website is no longer available",
];

/// File extensions worth flagging when they show up in a page.
pub static FILE_EXTENSION_SIGNATURES: &[&str] =
    &[".tar.gz", ".zip", ".7z", ".rar", ".exe", ".sql", ".db", ".bin"];

/// Keywords worth flagging when they show up in a page.
pub static KEYWORD_SIGNATURES: &[&str] = &[
    "backup", "hidden", "admin", "login", "database", "leak", "scam", "temp",
];

/// Marker that a page might be an auto-generated directory listing.
pub const INDEX_MARKER: &str = "Index of ";

/// Listings that mention `cgi-bin` get one extra line of slack.
pub const CGI_BIN_MARKER: &str = "cgi-bin";

/// Directory listings shorter than this are never considered real indexes.
pub const MIN_INDEX_LINES: usize = 10;

/// A web server whose directory listings have a known minimum size.
#[derive(Debug, Clone, Copy)]
pub struct IndexServer {
    pub name: &'static str,
    pub min_lines: usize,
}

/// Checked in order; the first server named in the page or `Server` header wins.
pub static INDEX_SERVERS: &[IndexServer] = &[
    IndexServer { name: "Apache", min_lines: 15 },
    IndexServer { name: "nginx", min_lines: 15 },
    IndexServer { name: "LiteSpeed", min_lines: 10 },
];
