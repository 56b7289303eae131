// Heroku-style names ("damp-dew-7942") used as the DNS label of the public IP.
// They only need to be unlikely to collide, not unique.

use crate::error::{DeployError, Result};
use lazy_static::lazy_static;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use regex::Regex;

const ADJECTIVES: &[&str] = &[
    "aged", "ancient", "autumn", "billowing", "bitter", "black", "blue", "bold",
    "broad", "broken", "calm", "cold", "cool", "crimson", "curly", "damp",
    "dark", "dawn", "delicate", "divine", "dry", "empty", "falling", "fancy",
    "flat", "floral", "fragrant", "frosty", "gentle", "green", "hidden", "holy",
    "icy", "jolly", "late", "lingering", "little", "lively", "long", "lucky",
    "misty", "morning", "muddy", "mute", "nameless", "noisy", "odd", "old",
    "orange", "patient", "plain", "polished", "proud", "purple", "quiet", "rapid",
    "raspy", "red", "restless", "rough", "round", "royal", "shiny", "shrill",
    "shy", "silent", "small", "snowy", "soft", "solitary", "sparkling", "spring",
    "square", "steep", "still", "summer", "super", "sweet", "throbbing", "tight",
    "tiny", "twilight", "wandering", "weathered", "white", "wild", "winter", "wispy",
    "withered", "yellow", "young",
];

const NOUNS: &[&str] = &[
    "art", "band", "bar", "base", "bird", "block", "boat", "bonus",
    "bread", "breeze", "brook", "bush", "butterfly", "cake", "cell", "cherry",
    "cloud", "credit", "darkness", "dawn", "dew", "disk", "dream", "dust",
    "feather", "field", "fire", "firefly", "flower", "fog", "forest", "frog",
    "frost", "glade", "glitter", "grass", "hall", "hat", "haze", "heart",
    "hill", "king", "lab", "lake", "leaf", "limit", "math", "meadow",
    "mode", "moon", "morning", "mountain", "mouse", "mud", "night", "paper",
    "pine", "poetry", "pond", "queen", "rain", "recipe", "resonance", "rice",
    "river", "salad", "scene", "sea", "shadow", "shape", "silence", "sky",
    "smoke", "snow", "snowflake", "sound", "star", "sun", "sunset", "surf",
    "term", "thunder", "tooth", "tree", "truth", "union", "unit", "violet",
    "voice", "water", "waterfall", "wave", "wildflower", "wind", "wood",
];

const DIGITS: &[u8] = b"0123456789";
const DEFAULT_TOKEN_LENGTH: usize = 4;

lazy_static! {
    // Azure public IP DNS labels
    static ref DNS_LABEL_RE: Regex = Regex::new(r"^[a-z][a-z0-9-]{1,61}[a-z0-9]$").unwrap();
}

pub struct NameGenerator<R: Rng = StdRng> {
    rng: R,
    token_length: usize,
}

impl NameGenerator<StdRng> {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }
}

#[cfg(test)]
impl NameGenerator<StdRng> {
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }
}

#[cfg(test)]
impl<R: Rng> NameGenerator<R> {
    pub fn token_length(mut self, len: usize) -> Self {
        self.token_length = len;
        self
    }
}

impl<R: Rng> NameGenerator<R> {
    pub fn from_rng(rng: R) -> Self {
        NameGenerator {
            rng,
            token_length: DEFAULT_TOKEN_LENGTH,
        }
    }

    /// adjective-noun-token, token being `token_length` random digits (dropped when 0)
    pub fn haikunate(&mut self) -> String {
        // both lists are non-empty constants
        let adjective = ADJECTIVES.choose(&mut self.rng).unwrap_or(&"quiet");
        let noun = NOUNS.choose(&mut self.rng).unwrap_or(&"pond");

        let token: String = (0..self.token_length)
            .map(|_| DIGITS[self.rng.gen_range(0..DIGITS.len())] as char)
            .collect();

        match token.is_empty() {
            true => format!("{}-{}", adjective, noun),
            false => format!("{}-{}-{}", adjective, noun, token),
        }
    }
}

pub fn validate_dns_label(label: &str) -> Result<()> {
    match DNS_LABEL_RE.is_match(label) {
        true => Ok(()),
        false => Err(DeployError::InvalidDnsLabel(label.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    lazy_static! {
        static ref PATTERN: Regex = Regex::new(r"^[a-z]+-[a-z]+-[0-9]+$").unwrap();
    }

    #[test]
    fn names_are_two_words_and_a_number() {
        let mut gen = NameGenerator::new();
        for _ in 0..200 {
            let name = gen.haikunate();
            assert!(PATTERN.is_match(&name), "bad name {}", name);
            assert!(validate_dns_label(&name).is_ok(), "not a dns label: {}", name);
        }
    }

    #[test]
    fn same_seed_same_names() {
        let mut a = NameGenerator::with_seed(79);
        let mut b = NameGenerator::with_seed(79);
        for _ in 0..10 {
            assert_eq!(a.haikunate(), b.haikunate());
        }
    }

    #[test]
    fn token_length_is_honoured() {
        let mut gen = NameGenerator::with_seed(1).token_length(2);
        let name = gen.haikunate();
        assert_eq!(name.rsplit('-').next().unwrap().len(), 2);

        let mut gen = NameGenerator::with_seed(1).token_length(0);
        assert_eq!(gen.haikunate().matches('-').count(), 1);
    }

    #[test]
    fn dns_labels() {
        assert!(validate_dns_label("damp-dew-79").is_ok());
        assert!(validate_dns_label("Damp-dew").is_err());
        assert!(validate_dns_label("7damp").is_err());
        assert!(validate_dns_label("damp-").is_err());
        assert!(validate_dns_label("a").is_err());
        assert!(validate_dns_label(&"a".repeat(64)).is_err());
    }
}
