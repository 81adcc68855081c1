//! Turns a plain model caption into a Holmesian narration: whole-word
//! substitution over a fixed vocabulary, then a randomly drawn intro and
//! outro around the rewritten body.

use phf::phf_map;
use rand::Rng;

/// Lowercase word -> replacement phrase. Lookup happens after trailing
/// `,` / `.` are stripped and the token is lowercased.
static REPLACEMENTS: phf::Map<&'static str, &'static str> = phf_map! {
    // ---- People ----
    "dog" => "hound",
    "dogs" => "hounds",
    "cat" => "feline companion",
    "cats" => "feline companions",
    "bird" => "avian companion",
    "birds" => "avian companions",
    "man" => "gentleman",
    "men" => "gentlemen",
    "woman" => "lady",
    "women" => "ladies",
    "boys" => "lads",
    "boy" => "lad",
    "girl" => "maiden",
    "girls" => "maids",
    "child" => "youth",
    "children" => "young ones",
    "person" => "individual of interest",
    "people" => "various passersby",
    "crowd" => "assembly of onlookers",

    // ---- Actions / Verbs ----
    "running" => "in swift pursuit",
    "walking" => "taking measured strides",
    "standing" => "stationed with deliberate poise",
    "sitting" => "resting in quiet contemplation",
    "talking" => "engaged in hushed discourse",
    "laughing" => "expressing a moment of levity",
    "smiling" => "bearing a subtle expression of warmth",
    "looking" => "fixing one's gaze with intent",
    "pointing" => "gesturing with purposeful direction",
    "holding" => "grasping with notable care",
    "playing" => "engaged in curious amusement",
    "jumping" => "springing forth with unexpected vigor",
    "working" => "occupied with some industrious task",

    // ---- Objects ----
    "car" => "motorised carriage",
    "bike" => "mechanical velocipede",
    "bicycle" => "two-wheeled contraption",
    "ball" => "spherical object of diversion",
    "bag" => "carried satchel",
    "phone" => "telephonic device",
    "camera" => "photographic apparatus",
    "book" => "well-worn volume",
    "hat" => "notable headwear",

    // ---- Locations / Environments ----
    "beach" => "windswept shore",
    "street" => "fog-laden lane",
    "road" => "lonely thoroughfare",
    "park" => "quiet public green",
    "forest" => "shadowed woodland",
    "city" => "bustling metropolis",
    "house" => "residence of uncertain history",
    "room" => "chamber of modest proportion",
    "yard" => "narrow courtyard",
    "river" => "meandering waterway",

    // ---- Atmosphere / Adjectives ----
    "beautiful" => "most striking in its appearance",
    "dark" => "shrouded in somber gloom",
    "bright" => "lit with uncommon clarity",
    "large" => "of considerable magnitude",
    "small" => "modest in scale",
    "happy" => "in unusually pleasant spirits",
    "old" => "weathered by time",
    "new" => "freshly appointed",

    // ---- Extra stylistic swaps ----
    "near" => "in the immediate vicinity of",
    "beside" => "adjacent to",
    "behind" => "situated just beyond",
    "before" => "presented directly before",
    "with" => "accompanied by",
};

static INTROS: [&str; 5] = [
    "Upon my keen observation,",
    "It was immediately apparent to my trained eye that",
    "After a brief yet thorough inspection, I deduced that",
    "From even the faintest clues, one might surmise",
    "To the ordinary passerby it may seem trivial, yet I perceived that",
];

static OUTROS: [&str; 4] = [
    " — a detail insignificant to most, yet crucial to the discerning mind.",
    " — a sight which, though mundane, whispered of deeper implications.",
    " — revealing a subtle narrative hidden beneath the everyday scene.",
    " — an occurrence that beckons further inquiry to the vigilant observer.",
];

/// Draw the framing clauses. Isolated so tests can seed the rng and pin
/// the draw; the intro is drawn first.
pub fn choose_templates<R: Rng + ?Sized>(rng: &mut R) -> (&'static str, &'static str) {
    let intro = INTROS[rng.gen_range(0..INTROS.len())];
    let outro = OUTROS[rng.gen_range(0..OUTROS.len())];
    (intro, outro)
}

/// The pure word-for-word rewrite, no framing. Only trailing commas and
/// periods are stripped, mid-token punctuation stays as the model wrote it.
/// Stripped punctuation is not reattached after a replacement.
pub fn stylize_body(caption: &str) -> String {
    let new_words: Vec<&str> = caption
        .split_whitespace()
        .map(|w| {
            let stripped = w.trim_end_matches([',', '.']);
            match REPLACEMENTS.get(stripped.to_lowercase().as_str()) {
                Some(replacement) => *replacement,
                None => stripped,
            }
        })
        .collect();
    new_words.join(" ")
}

/// Full stylization: rewritten body wrapped in a randomly chosen intro and
/// outro. An empty caption still gets framed (intro, a stray double space,
/// outro), that is expected.
pub fn stylize<R: Rng + ?Sized>(caption: &str, rng: &mut R) -> String {
    let (intro, outro) = choose_templates(rng);
    format!("{} {}{}", intro, stylize_body(caption), outro)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_known_words_are_replaced() {
        assert_eq!(
            stylize_body("a dog running on the beach"),
            "a hound in swift pursuit on the windswept shore"
        );
    }

    #[test]
    fn test_unknown_words_are_kept() {
        assert_eq!(stylize_body("an umbrella by the door"), "an umbrella by the door");
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(stylize_body("Dog"), "hound");
        assert_eq!(stylize_body("BEACH"), "windswept shore");
    }

    #[test]
    fn test_trailing_punctuation_is_stripped_before_lookup() {
        // the period is removed before lookup and never reattached
        assert_eq!(stylize_body("Man."), "gentleman");
        assert_eq!(stylize_body("a cat, on a chair."), "a feline companion on a chair");
    }

    #[test]
    fn test_mid_token_punctuation_is_untouched() {
        assert_eq!(stylize_body("a well-dressed man"), "a well-dressed gentleman");
        assert_eq!(stylize_body("dog-house"), "dog-house");
    }

    #[test]
    fn test_output_is_framed_by_fixed_templates() {
        let mut rng = StdRng::seed_from_u64(42);
        for caption in ["a dog running on the beach", "nothing notable", ""] {
            let out = stylize(caption, &mut rng);
            assert!(
                INTROS.iter().any(|intro| out.starts_with(intro)),
                "unexpected intro in: {}",
                out
            );
            assert!(
                OUTROS.iter().any(|outro| out.ends_with(outro)),
                "unexpected outro in: {}",
                out
            );
        }
    }

    #[test]
    fn test_fixed_seed_is_deterministic() {
        let a = stylize("a man holding a book", &mut StdRng::seed_from_u64(7));
        let b = stylize("a man holding a book", &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_end_to_end_shape() {
        let mut rng = StdRng::seed_from_u64(0);
        let (intro, outro) = choose_templates(&mut StdRng::seed_from_u64(0));
        let out = stylize("a dog running on the beach", &mut rng);
        assert_eq!(
            out,
            format!("{} a hound in swift pursuit on the windswept shore{}", intro, outro)
        );
    }

    #[test]
    fn test_empty_caption_keeps_the_double_space() {
        let (intro, outro) = choose_templates(&mut StdRng::seed_from_u64(3));
        let out = stylize("", &mut StdRng::seed_from_u64(3));
        // empty body, the space after the intro and the one leading the
        // outro stay next to each other
        assert_eq!(out, format!("{} {}", intro, outro));
        assert!(out.contains("  "));
    }
}
