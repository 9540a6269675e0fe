//! Built-in collection and page copy.

pub const SHARED_LINKS: &[&str] = &[
    "https://i.imgur.com/6n3gTAp.png",
    "https://i.imgur.com/6wY4sTQ.png",
    "https://i.imgur.com/EN8EgZS.png",
    "https://i.imgur.com/5AWe35G.png",
    "https://i.imgur.com/NATHOLc.jpeg",
    "https://i.imgur.com/PZ1s6Fe.jpeg",
    "https://i.imgur.com/xjdi25t.jpeg",
    "https://i.imgur.com/4lA2V3f.jpeg",
];

pub const PROFILE_PHOTO: &str = "https://i.imgur.com/Syh4bbe.png";

pub const OWNER: &str = "Mark Natad";
pub const CONTACT_EMAIL: &str = "mark.natad@aol.com";

pub const TAGLINE: &str = "VISUAL EXPLORER - CREATIVE REPOSITORY";
pub const COLLECTION_HEADING: &str = "THE COLLECTION";
pub const PROFILE_HEADING: &str = "PROFESSIONAL PROFILE";
pub const CONTACT_HEADING: &str = "GET IN TOUCH";
pub const DIRECT_LINE_HEADING: &str = "DIRECT LINE";

pub const ABOUT_HEADLINE: &str = "I am an inspiring graphic designer with a niche on minimalistic \
designs but do cater client customizations and preferences.";

pub const ABOUT_BODY: &str = "My philosophy centers around the subtraction of noise to find the \
essence of a brand. Every pixel is intentional, every space is considered.";

pub const ABOUT_COLUMNS: &[(&str, &[&str])] = &[
    ("AESTHETICS", &["MINIMALISM", "VISUAL ARCHIVING", "DIGITAL SPACES"]),
    ("FOCUS", &["IDENTITY DESIGN", "MARKETING DESIGNS", "ART DIRECTION"]),
    ("TOOLS", &["CANVA", "ADOBE", "NANO BANANA"]),
];

pub const FOOTER_TAGLINE: &str = "VISUAL CURATED SPACE";
pub const COPYRIGHT_YEAR: u32 = 2024;
