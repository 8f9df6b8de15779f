//! Word lists driving span filtering and type classification.

use nexus_core::models::EntityType;

/// Capitalized words that never start or form an entity on their own.
pub const STOP_WORDS: &[&str] = &[
    "A", "An", "The", "This", "That", "These", "Those", "What", "Which", "Where", "When", "Why",
    "How", "Who", "Whom", "I", "We", "You", "He", "She", "It", "They", "His", "Her", "Its",
    "Their", "Our", "My", "Your", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday",
    "Saturday", "Sunday", "January", "February", "March", "April", "May", "June", "July",
    "August", "September", "October", "November", "December", "Today", "Tomorrow",
    "Yesterday", "Next", "Last", "Every", "All", "Some", "Any", "Each", "First", "Second",
    "Third", "New", "But", "And", "Or", "For", "With", "From", "About", "After", "Before",
    "During", "Until", "In", "On", "At", "By", "Of", "To", "If", "Then", "So", "Also", "However",
    "Meanwhile", "Later", "Yes", "No", "Not", "Please", "Thanks", "Hi", "Hello", "Dear", "Note",
];

/// Honorifics. A span following one is a person; the title itself is dropped.
pub const TITLES: &[&str] = &[
    "Mr", "Mrs", "Ms", "Miss", "Dr", "Prof", "Professor", "Sir", "Dame", "Mx",
];

pub const ORG_SUFFIXES: &[&str] = &[
    "Inc", "LLC", "Ltd", "Corp", "Corporation", "Company", "Co", "Group", "Holdings",
    "Partners", "Association", "Foundation", "Institute", "University", "College", "Bank",
    "Labs", "Lab", "Industries", "Enterprises", "Systems", "Technologies", "Software",
    "Agency", "Council", "Ministry", "Department", "GmbH", "AG", "SA", "PLC",
];

pub const LOCATION_SUFFIXES: &[&str] = &[
    "Street", "Avenue", "Boulevard", "Road", "Lane", "City", "Town", "Village", "County",
    "State", "Province", "Country", "Island", "Islands", "Valley", "River", "Lake",
    "Mountain", "Mountains", "Bay", "Harbor", "Park",
];

/// Well-known places recognized without a suffix.
pub const PLACES: &[&str] = &[
    "Berlin", "London", "Paris", "Tokyo", "Madrid", "Rome", "Vienna", "Zurich", "Amsterdam",
    "Dublin", "Boston", "Chicago", "Seattle", "Austin", "Toronto", "Sydney", "Singapore",
    "New York", "San Francisco", "Los Angeles", "Europe", "Asia", "Africa", "America",
    "Germany", "France", "Japan", "Spain", "Italy", "Canada", "China", "India", "Brazil",
];

/// Well-known technologies recognized without context.
pub const TECHNOLOGIES: &[&str] = &[
    "Rust", "Python", "Java", "JavaScript", "TypeScript", "Go", "Kotlin", "Swift", "Linux",
    "Kubernetes", "Docker", "PostgreSQL", "MySQL", "SQLite", "Redis", "Kafka", "GraphQL",
    "React", "Tokio", "WebAssembly",
];

/// Verbs that mark the preceding single-word span as a person.
pub const PERSON_VERBS: &[&str] = &[
    "said", "says", "works", "worked", "joined", "founded", "co-founded", "manages", "managed",
    "leads", "led", "wrote", "met", "told", "asked", "built", "created", "designed",
    "developed", "hired", "moved", "lives", "lived", "is", "was",
];

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

pub fn is_title(word: &str) -> bool {
    TITLES.contains(&word.trim_end_matches('.'))
}

/// Type implied by the surface form alone, if any.
pub fn classify_surface(surface: &str) -> Option<EntityType> {
    let last = surface.split_whitespace().last().unwrap_or(surface);
    let last = last.trim_end_matches('.');
    if ORG_SUFFIXES.contains(&last) {
        return Some(EntityType::Organization);
    }
    if LOCATION_SUFFIXES.contains(&last) || PLACES.contains(&surface) {
        return Some(EntityType::Location);
    }
    if TECHNOLOGIES.contains(&surface) {
        return Some(EntityType::Technology);
    }
    // All-caps acronyms of three or more letters read as organizations.
    if !surface.contains(' ')
        && surface.chars().count() >= 3
        && surface.chars().all(|c| c.is_ascii_uppercase() || c == '&')
    {
        return Some(EntityType::Organization);
    }
    None
}
