//! Licence plate extraction across several national numbering schemes.

use regex::Regex;

use super::patterns::{PLATE_HU_CLASSIC, PLATE_HU_EU, PLATE_LETTERS_DIGITS_LETTERS};

/// One plate numbering scheme. The plate is the concatenation of all
/// participating capture groups, separators dropped.
#[derive(Debug, Clone)]
pub struct PlateGrammar {
    pub name: &'static str,
    pub pattern: Regex,
}

impl PlateGrammar {
    pub fn new(name: &'static str, pattern: &Regex) -> Self {
        Self {
            name,
            pattern: pattern.clone(),
        }
    }
}

/// Ordered grammar list; new schemes are appended without touching callers.
#[derive(Debug, Clone)]
pub struct PlateMatcher {
    grammars: Vec<PlateGrammar>,
}

#[derive(Debug)]
struct Hit {
    start: usize,
    end: usize,
    plate: String,
}

impl PlateMatcher {
    pub fn new(grammars: Vec<PlateGrammar>) -> Self {
        Self { grammars }
    }

    pub fn push(&mut self, grammar: PlateGrammar) {
        self.grammars.push(grammar);
    }

    /// Distinct plates in order of first appearance.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let mut hits: Vec<Hit> = self
            .grammars
            .iter()
            .flat_map(|g| {
                g.pattern.captures_iter(text).filter_map(|caps| {
                    let whole = caps.get(0)?;
                    let plate: String = caps
                        .iter()
                        .skip(1)
                        .flatten()
                        .map(|m| m.as_str())
                        .collect();
                    Some(Hit {
                        start: whole.start(),
                        end: whole.end(),
                        plate,
                    })
                })
            })
            .collect();

        // Earliest first; on a tie the longer match wins
        hits.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

        let mut plates: Vec<String> = Vec::new();
        let mut covered = 0;
        for hit in hits {
            if hit.start < covered {
                continue;
            }
            covered = hit.end;
            if !plates.contains(&hit.plate) {
                plates.push(hit.plate);
            }
        }
        plates
    }
}

impl Default for PlateMatcher {
    fn default() -> Self {
        Self::new(vec![
            PlateGrammar::new("hu-eu", &PLATE_HU_EU),
            PlateGrammar::new("hu-classic", &PLATE_HU_CLASSIC),
            PlateGrammar::new("letters-digits-letters", &PLATE_LETTERS_DIGITS_LETTERS),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mixed_schemes_in_order() {
        let text = "Vontató: ABC-123 (H)\nPótkocsi: AA BC-456\nXYZ 98-KL\n";
        assert_eq!(
            PlateMatcher::default().extract(text),
            vec!["ABC123", "AABC456", "XYZ98KL"]
        );
    }

    #[test]
    fn test_duplicates_collapse() {
        let text = "ABC-123\nABC 123\nABC123\nDEF-456\nABC-123";
        assert_eq!(PlateMatcher::default().extract(text), vec!["ABC123", "DEF456"]);
    }

    #[test]
    fn test_extraction_is_stable_under_repetition() {
        let matcher = PlateMatcher::default();
        let text = "KLM-321\nAB CD-123\nKLM-321\n";
        let once = matcher.extract(text);
        let doubled = matcher.extract(&format!("{text}{text}"));
        assert_eq!(once, matcher.extract(text));
        assert_eq!(once, doubled);
    }

    #[test]
    fn test_non_plates_ignored() {
        let text = "UE-A-12345/2026\n1 A 8,000\nVV 19,000 19,000\nM1 12+500\n";
        assert!(PlateMatcher::default().extract(text).is_empty());
    }

    #[test]
    fn test_custom_grammar_appended() {
        let mut matcher = PlateMatcher::default();
        let diplomatic = Regex::new(r"\b(CD)[ -]?(\d{4})\b").unwrap();
        matcher.push(PlateGrammar::new("diplomatic", &diplomatic));
        assert_eq!(matcher.extract("CD 1234"), vec!["CD1234"]);
    }
}
