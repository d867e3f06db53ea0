//! Small text helpers shared by the parser, organizer and figure matcher.

use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

/// CamelCase terms such as model names ("AttentionNet", "DeepMind").
static CAMEL_CASE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z][a-z]*(?:[A-Z][a-z]*)+)\b").unwrap());

/// Page number embedded in extracted image file names ("page4_img1.png").
static PAGE_TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)page[_\s-]*(\d+)").unwrap());

/// Markup characters that must not survive anywhere in a slide title.
const TITLE_MARKUP_CHARS: &[char] = &['*', '#', '`'];

/// Emphasis markers stripped only at word edges (`__Bold__`, `_em_`).
const EDGE_EMPHASIS_CHARS: &[char] = &['_'];

/// Jaccard similarity of two strings' whitespace-separated word sets.
///
/// Returns 0.0 when either side has no words.
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let words_a: HashSet<&str> = a.split_whitespace().collect();
    let words_b: HashSet<&str> = b.split_whitespace().collect();

    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    let intersection = words_a.intersection(&words_b).count() as f64;
    let union = words_a.union(&words_b).count() as f64;

    intersection / union
}

/// Strip markup tokens from a title and collapse its whitespace.
///
/// A trailing colon left over from label syntax ("**Title:**") is dropped.
pub fn clean_title(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|c| !TITLE_MARKUP_CHARS.contains(c))
        .collect();

    stripped
        .split_whitespace()
        .map(|word| word.trim_matches(EDGE_EMPHASIS_CHARS))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches(':')
        .trim()
        .to_string()
}

/// Shorten a title to its first `max_words` words plus "..." when it is
/// longer than `max_chars` characters and has more than `max_words` words.
pub fn compact_title(title: &str, max_chars: usize, max_words: usize) -> String {
    if title.chars().count() <= max_chars {
        return title.to_string();
    }

    let words: Vec<&str> = title.split_whitespace().collect();
    if words.len() <= max_words {
        return title.to_string();
    }

    format!("{}...", words[..max_words].join(" "))
}

/// Paper-specific keywords: lowercased CamelCase terms longer than four
/// characters, in first-seen order without duplicates.
pub fn paper_keywords(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    CAMEL_CASE_REGEX
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|term| term.chars().count() > 4)
        .map(str::to_lowercase)
        .filter(|term| seen.insert(term.clone()))
        .collect()
}

/// Extract a page number from a `page<N>` token in a file name.
pub fn page_from_file_name(path: &Path) -> Option<u32> {
    let name = path.file_name()?.to_string_lossy();
    PAGE_TOKEN_REGEX
        .captures(&name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jaccard_similarity() {
        assert_eq!(jaccard_similarity("model architecture", "model architecture"), 1.0);
        assert_eq!(jaccard_similarity("amazing grace", "grace amazing"), 1.0);
        assert_eq!(
            jaccard_similarity("model architecture", "proposed architecture design"),
            0.25
        );
        assert_eq!(jaccard_similarity("results", "conclusion"), 0.0);
        assert_eq!(jaccard_similarity("", "results"), 0.0);
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("**Model Architecture**"), "Model Architecture");
        assert_eq!(clean_title("## Results:"), "Results");
        assert_eq!(clean_title("  Training   Setup  "), "Training Setup");
    }

    #[test]
    fn test_clean_title_keeps_inner_underscores() {
        assert_eq!(clean_title("Methods_v2"), "Methods_v2");
        assert_eq!(clean_title("__Ablation__ on res_block _depth_"), "Ablation on res_block depth");
        assert_eq!(clean_title("Intro _ Outline"), "Intro Outline");
    }

    #[test]
    fn test_compact_title() {
        let long = "A Very Long Title About Deep Attention Recurrent Q Networks For Games";
        assert_eq!(compact_title(long, 50, 5), "A Very Long Title About...");
        assert_eq!(compact_title("Short Title", 50, 5), "Short Title");

        // Long but few words: left alone
        let few_words = "Supercalifragilisticexpialidocious Hyperparameterization";
        assert_eq!(compact_title(few_words, 50, 5), few_words);
    }

    #[test]
    fn test_paper_keywords() {
        let text = "We propose AttentionNet. AttentionNet beats DeepMind and ResNet on Atari.";
        assert_eq!(paper_keywords(text), vec!["attentionnet", "deepmind", "resnet"]);
    }

    #[test]
    fn test_paper_keywords_skips_short_terms() {
        // "GoNet" is exactly 5 characters, "AbC" is too short
        assert_eq!(paper_keywords("AbC and GoNet"), vec!["gonet"]);
    }

    #[test]
    fn test_page_from_file_name() {
        assert_eq!(page_from_file_name(Path::new("out/page4_img1.png")), Some(4));
        assert_eq!(page_from_file_name(Path::new("Page_12_full.png")), Some(12));
        assert_eq!(page_from_file_name(Path::new("figure_1.png")), None);
    }
}
