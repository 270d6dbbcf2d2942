//! Artifact stripping for scraped comment text.
//!
//! Rules run in a fixed order; later rules assume earlier artifacts are gone
//! (links are collapsed before platform references are stripped, emphasis is
//! stripped after hashtags, and so on).

use once_cell::sync::Lazy;
use regex::Regex;

/// Shortest cleaned text worth keeping, in characters.
pub const MIN_CLEAN_LEN: usize = 20;

/// Cleaned text must keep at least this share of the original length.
pub const MIN_SURVIVAL_RATIO: f64 = 0.3;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static cleaning pattern")
}

// 1. acknowledgments
static LEADING_ACK: Lazy<Regex> = Lazy::new(|| {
    re(r"(?im)^[ \t]*edit[ \t]*\d*[ \t]*:[ \t]*(?:thanks?|thank you|ty)\b[^.!?\n]*[.!?]+[ \t]*")
});
static EDIT_SECTION: Lazy<Regex> = Lazy::new(|| re(r"(?im)\bedit[ \t]*\d*[ \t]*:.*$"));
static THANKS_SECTION: Lazy<Regex> = Lazy::new(|| {
    re(r"(?im)\b(?:thanks?|thank you)[ \t]+(?:for[ \t]+the[ \t]+(?:gold|silver|platinum|awards?)|kind[ \t]+stranger).*$")
});

// 2. image / gif embeds
static IMAGE_EMBED: Lazy<Regex> = Lazy::new(|| re(r"!\[[^\]]*\]\([^)]*\)"));
static GIF_LINK: Lazy<Regex> = Lazy::new(|| re(r"(?i)\[gif\]\([^)]*\)"));

// 3. links
static MD_LINK: Lazy<Regex> = Lazy::new(|| re(r"\[([^\]]*)\]\([^)]*\)"));
static BARE_URL: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b(?:https?://|www\.)\S+"));

// 4. platform references
static PLATFORM_REF: Lazy<Regex> = Lazy::new(|| re(r"(?i)/?\b[ru]/\w+"));

// 5. emoji and pictographs, including joiners and variation selectors
static EMOJI: Lazy<Regex> = Lazy::new(|| {
    re(r"[\p{Extended_Pictographic}\x{10000}-\x{10FFFF}\x{2600}-\x{27BF}\x{2B00}-\x{2BFF}\x{FE0E}\x{FE0F}\x{200D}\x{20E3}]")
});

// 6. hashtags
static HASHTAG: Lazy<Regex> = Lazy::new(|| re(r"#\w+"));

// 7. markdown emphasis / headings
static EMPHASIS: Lazy<Regex> = Lazy::new(|| re(r"[*_]+"));
static HEADING: Lazy<Regex> = Lazy::new(|| re(r"#{1,6}\s"));

// 8. empty remnants
static EMPTY_BRACKETS: Lazy<Regex> = Lazy::new(|| re(r"\[\s*\]"));
static EMPTY_PARENS: Lazy<Regex> = Lazy::new(|| re(r"\(\s*\)"));

// 9. punctuation runs
static BANG_RUN: Lazy<Regex> = Lazy::new(|| re(r"([!?]){3,}"));
static DOT_RUN: Lazy<Regex> = Lazy::new(|| re(r"\.{3,}"));

// 10. whitespace
static WHITESPACE: Lazy<Regex> = Lazy::new(|| re(r"\s+"));

// 11. dangling ellipsis
static TRAILING_ELLIPSIS: Lazy<Regex> = Lazy::new(|| re(r"(?:\s*\.\.\.)+\s*$"));

/// Strip formatting and platform artifacts from a candidate text.
///
/// Returns `None` when nothing usable survives: the result is shorter than
/// [`MIN_CLEAN_LEN`] characters, or less than [`MIN_SURVIVAL_RATIO`] of the
/// original length survived (a proxy for "mostly artifact"). The ratio guard
/// can drop legitimately short but heavily decorated text; that is accepted.
pub fn clean(text: &str) -> Option<String> {
    let original_len = text.chars().count();

    let mut s = LEADING_ACK.replace_all(text, "").into_owned();
    s = EDIT_SECTION.replace_all(&s, "").into_owned();
    s = THANKS_SECTION.replace_all(&s, "").into_owned();

    s = IMAGE_EMBED.replace_all(&s, "").into_owned();
    s = GIF_LINK.replace_all(&s, "").into_owned();

    s = MD_LINK.replace_all(&s, "$1").into_owned();
    s = BARE_URL.replace_all(&s, "").into_owned();

    s = PLATFORM_REF.replace_all(&s, "").into_owned();

    s = EMOJI.replace_all(&s, "").into_owned();

    s = HASHTAG.replace_all(&s, "").into_owned();

    s = EMPHASIS.replace_all(&s, "").into_owned();
    s = HEADING.replace_all(&s, "").into_owned();

    s = EMPTY_BRACKETS.replace_all(&s, "").into_owned();
    s = EMPTY_PARENS.replace_all(&s, "").into_owned();

    s = BANG_RUN.replace_all(&s, "$1$1").into_owned();
    s = DOT_RUN.replace_all(&s, "...").into_owned();

    s = WHITESPACE.replace_all(&s, " ").trim().to_string();

    s = TRAILING_ELLIPSIS.replace(&s, "").trim().to_string();

    let len = s.chars().count();
    if len < MIN_CLEAN_LEN {
        return None;
    }
    if (len as f64) < (original_len as f64) * MIN_SURVIVAL_RATIO {
        return None;
    }
    Some(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_thanks_clause_removed() {
        let out = clean("Edit: thanks for the gold! You look like a thumb with a bad haircut lol");
        assert_eq!(out.as_deref(), Some("You look like a thumb with a bad haircut lol"));
    }

    #[test]
    fn test_trailing_edit_section_removed() {
        let out = clean("Your forehead has its own weather system and zip code\nEDIT: wow this blew up");
        assert_eq!(out.as_deref(), Some("Your forehead has its own weather system and zip code"));
    }

    #[test]
    fn test_award_thanks_removed_to_end_of_line() {
        let out = clean("You look like a discount mannequin with a grudge. Thanks for the silver kind people");
        assert_eq!(out.as_deref(), Some("You look like a discount mannequin with a grudge."));
    }

    #[test]
    fn test_gif_only_input_fails() {
        assert_eq!(clean("![gif](url) :) "), None);
    }

    #[test]
    fn test_markdown_link_keeps_text() {
        let out = clean("You look like [this guy](https://imgur.com/abc) after a long divorce");
        assert_eq!(out.as_deref(), Some("You look like this guy after a long divorce"));
    }

    #[test]
    fn test_urls_and_platform_refs_removed() {
        let out = clean("Post this on r/funny, u/some_user would agree your beard is a bird nest https://x.io/y");
        let out = out.unwrap();
        assert!(!out.contains("r/funny"));
        assert!(!out.contains("u/some"));
        assert!(!out.contains("http"));
        assert!(out.contains("your beard is a bird nest"));
    }

    #[test]
    fn test_slash_inside_word_is_not_a_platform_ref() {
        let out = clean("Your hair/beard combo looks like a lost hedgehog");
        assert_eq!(out.as_deref(), Some("Your hair/beard combo looks like a lost hedgehog"));
    }

    #[test]
    fn test_emoji_and_hashtags_removed() {
        let out = clean("Your smile looks like a broken piano 😂😂 #roasted ❤️").unwrap();
        assert_eq!(out, "Your smile looks like a broken piano");
    }

    #[test]
    fn test_bmp_pictographs_removed() {
        let out = clean("You look like a thumb with a bad haircut ⌛⌚").unwrap();
        assert_eq!(out, "You look like a thumb with a bad haircut");
        let out = clean("⏰ Your alarm clock ▶️ should have let you sleep through this photo").unwrap();
        assert_eq!(out, "Your alarm clock should have let you sleep through this photo");
    }

    #[test]
    fn test_emphasis_and_headings_removed() {
        let out = clean("## **Your** nose _casts_ a shadow on your entire chin").unwrap();
        assert_eq!(out, "Your nose casts a shadow on your entire chin");
    }

    #[test]
    fn test_punctuation_runs_collapsed() {
        let out = clean("Did your barber hate you?????? Your hairline says yes!!!!").unwrap();
        assert_eq!(out, "Did your barber hate you?? Your hairline says yes!!");
        let out = clean("Your eyebrows are having an argument..... and losing").unwrap();
        assert_eq!(out, "Your eyebrows are having an argument... and losing");
    }

    #[test]
    fn test_trailing_ellipsis_removed() {
        let out = clean("Your teeth are like stars, yellow and far apart.....").unwrap();
        assert_eq!(out, "Your teeth are like stars, yellow and far apart");
    }

    #[test]
    fn test_whitespace_collapsed() {
        let out = clean("  Your   jaw\n\nlooks like\tit was drawn   with a ruler  ").unwrap();
        assert_eq!(out, "Your jaw looks like it was drawn with a ruler");
    }

    #[test]
    fn test_over_stripped_text_fails_ratio_guard() {
        let mut text = String::from("You look like a wet sock okay ");
        for i in 0..10 {
            text.push_str(&format!("https://example.com/really/long/path/{i} "));
        }
        assert_eq!(clean(&text), None);
    }

    #[test]
    fn test_too_short_fails() {
        assert_eq!(clean("lol ok"), None);
    }

    #[test]
    fn test_plain_text_is_fixed_point() {
        let texts = [
            "I bet you work a 9-5 and still live with your mom",
            "Your hairline is running away from your face faster than your dad did",
            "You look like the before picture in a shampoo ad",
        ];
        for t in texts {
            let once = clean(t).unwrap();
            assert_eq!(once, t);
            assert_eq!(clean(&once).as_deref(), Some(once.as_str()));
        }
    }

    #[test]
    fn test_clean_is_idempotent_on_its_output() {
        let messy = [
            "Edit: thanks for the gold! You look like a thumb with a bad haircut lol",
            "**Your** face is proof that god has a sense of humor!!!! 😂 #roastme",
            "You look like [a lamp](http://a.b/c) that gave up on life... ...",
            "Your eyebrows...... are on a different time zone than your eyes\nEdit: typo",
        ];
        for m in messy {
            let once = clean(m).unwrap();
            assert_eq!(clean(&once).as_deref(), Some(once.as_str()), "input: {m}");
        }
    }
}
