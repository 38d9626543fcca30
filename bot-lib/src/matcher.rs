//! Fuzzy matching of free text against school names.
//!
//! Scores are 0-100 and don't depend on word order: both sides are lowercased, stripped of
//! punctuation and have their words sorted before being compared.

use ahash::AHashSet;
use itertools::Itertools;

/// Anything scoring below this isn't offered to the user.
pub const ACCEPT_THRESHOLD: u8 = 50;
/// At most this many candidates are offered, which is also how many number reactions we add.
pub const MAX_CANDIDATES: usize = 5;

const STOP_WORDS: [&str; 7] = ["of", "the", "and", "at", "for", "in", "de"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub name: String,
    pub score: u8,
}

/// Lowercase alphanumeric words, in their original order.
fn words(input: &str) -> Vec<String> {
    input
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

fn token_sort(words: &[String]) -> String {
    words.iter().sorted().join(" ")
}

/// Token sort similarity between two strings, 0-100.
pub fn token_sort_score(query: &str, candidate: &str) -> u8 {
    let query = token_sort(&words(query));
    let candidate = token_sort(&words(candidate));

    if query.is_empty() || candidate.is_empty() {
        return 0;
    }

    (strsim::sorensen_dice(&query, &candidate) * 100.0).round() as u8
}

/// Whether a single word query is the initials of the candidate, eg. MIT.
fn is_acronym_of(query: &[String], candidate: &[String]) -> bool {
    let [query] = query else {
        return false;
    };

    if query.chars().count() < 2 || candidate.len() < 2 {
        return false;
    }

    let initials = |skip_stop_words: bool| -> String {
        candidate
            .iter()
            .filter(|word| !skip_stop_words || !STOP_WORDS.contains(&word.as_str()))
            .filter_map(|word| word.chars().next())
            .collect()
    };

    *query == initials(true) || *query == initials(false)
}

/// A one word query naming the school's web domain, eg. `mit` for `mit.edu`.
const DOMAIN_SCORE: u8 = 100;
/// A one word query made of the school's initials. Below [`DOMAIN_SCORE`] since many schools
/// share their initials.
const INITIALS_SCORE: u8 = 90;

/// Something `query` can be matched against.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub name: &'a str,
    /// Web domains, eg. `mit.edu`.
    pub domains: &'a [String],
}

impl<'a> From<&'a str> for Candidate<'a> {
    fn from(name: &'a str) -> Self {
        Candidate { name, domains: &[] }
    }
}

fn is_domain_of(query: &[String], domains: &[String]) -> bool {
    let [query] = query else {
        return false;
    };

    domains.iter().any(|domain| {
        let domain = domain.trim().to_lowercase();
        let domain = domain.strip_prefix("www.").unwrap_or(&domain);

        domain.split('.').next() == Some(query.as_str())
    })
}

/// Scores `query` against a candidate.
pub fn score<'a>(query: &str, candidate: impl Into<Candidate<'a>>) -> u8 {
    let candidate = candidate.into();
    let query_words = words(query);

    if is_domain_of(&query_words, candidate.domains) {
        return DOMAIN_SCORE;
    }

    if is_acronym_of(&query_words, &words(candidate.name)) {
        return INITIALS_SCORE;
    }

    token_sort_score(query, candidate.name)
}

/// The best candidates for `query`, highest score first.
///
/// Only candidates scoring at least [`ACCEPT_THRESHOLD`] are kept, and at most
/// [`MAX_CANDIDATES`] of them. Equal scores are ordered by plain similarity, then by name so the
/// output is stable. Empty when nothing is close enough.
pub fn best_matches<'a, C: Into<Candidate<'a>>>(
    query: &str,
    candidates: impl IntoIterator<Item = C>,
) -> Vec<Match> {
    let mut seen = AHashSet::new();

    let matches = candidates
        .into_iter()
        .map(Into::into)
        .filter(|candidate: &Candidate| seen.insert(candidate.name))
        .map(|candidate| {
            (
                score(query, candidate),
                token_sort_score(query, candidate.name),
                candidate.name,
            )
        })
        .filter(|(score, ..)| *score >= ACCEPT_THRESHOLD)
        .sorted_by(|l, r| {
            r.0.cmp(&l.0)
                .then_with(|| r.1.cmp(&l.1))
                .then_with(|| l.2.cmp(r.2))
        })
        .take(MAX_CANDIDATES)
        .map(|(score, _, name)| Match {
            name: name.to_owned(),
            score,
        })
        .collect_vec();

    tracing::debug!("{} schools matched `{}`", matches.len(), query);

    matches
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schools::test_catalog;

    #[test]
    fn acronym_finds_mit() {
        let catalog = test_catalog();
        let matches = best_matches("MIT", catalog.names());

        let mit = matches
            .iter()
            .find(|m| m.name == "Massachusetts Institute of Technology")
            .unwrap();

        assert!(mit.score >= ACCEPT_THRESHOLD);
    }

    #[test]
    fn domain_beats_shared_initials() {
        let schools = [
            ("Madras Institute of Technology", "mitindia.edu"),
            ("Maharaja Institute of Technology", "mitmysore.in"),
            ("Maharashtra Institute of Technology", "mitpune.edu.in"),
            ("Manipal Institute of Technology", "manipal.edu"),
            ("Mapua Institute of Technology", "mapua.edu.ph"),
            ("Massachusetts Institute of Technology", "mit.edu"),
        ];
        let domains = schools.map(|(_, domain)| vec![domain.to_owned()]);
        let candidates = schools
            .iter()
            .zip(&domains)
            .map(|(&(name, _), domains)| Candidate { name, domains });

        let matches = best_matches("MIT", candidates);

        assert_eq!(matches.len(), MAX_CANDIDATES);
        assert_eq!(
            matches[0],
            Match {
                name: "Massachusetts Institute of Technology".to_owned(),
                score: 100,
            }
        );
        assert!(matches[1..].iter().all(|m| m.score == 90));
    }

    #[test]
    fn domain_needs_the_whole_label() {
        let domains = vec!["www.mit.edu".to_owned()];
        let candidate = Candidate {
            name: "Massachusetts Institute of Technology",
            domains: &domains,
        };

        assert_eq!(score("mit", candidate), 100);
        assert!(score("mi", candidate) < ACCEPT_THRESHOLD);
        assert_eq!(score("MIT", "Massachusetts Institute of Technology"), 90);
    }

    #[test]
    fn nonsense_matches_nothing() {
        let catalog = test_catalog();

        assert!(best_matches("xyzzyqqq", catalog.names()).is_empty());
        assert!(best_matches("", catalog.names()).is_empty());
        assert!(best_matches("  ?! ", catalog.names()).is_empty());
    }

    #[test]
    fn typo_still_ranks_first() {
        let catalog = test_catalog();
        let matches = best_matches("stanford universty", catalog.names());

        assert_eq!(matches[0].name, "Stanford University");
    }

    #[test]
    fn partial_name_is_accepted() {
        let catalog = test_catalog();
        let matches = best_matches("harvard", catalog.names());

        assert_eq!(matches[0].name, "Harvard University");
        assert!(matches[0].score >= ACCEPT_THRESHOLD);
    }

    #[test]
    fn word_order_does_not_matter() {
        assert_eq!(
            token_sort_score("oxford university of", "University of Oxford"),
            100
        );
        assert_eq!(
            score("Tokyo, University of", "University of Tokyo"),
            score("University of Tokyo", "University of Tokyo")
        );
    }

    #[test]
    fn truncated_and_sorted() {
        let catalog = test_catalog();
        let matches = best_matches("university", catalog.names());

        assert_eq!(matches.len(), MAX_CANDIDATES);
        assert!(matches.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(matches.iter().all(|m| m.score >= ACCEPT_THRESHOLD));
    }

    #[test]
    fn stable_across_calls() {
        let catalog = test_catalog();

        let first = best_matches("college london", catalog.names());
        let second = best_matches("college london", catalog.names());

        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn duplicates_are_scored_once() {
        let names = ["Hogwarts Academy", "Hogwarts Academy", "Harvard University"];
        let matches = best_matches("hogwarts", names);

        assert_eq!(
            matches,
            vec![Match {
                name: "Hogwarts Academy".to_owned(),
                score: score("hogwarts", "Hogwarts Academy"),
            }]
        );
    }

    #[test]
    fn single_letter_is_not_an_acronym() {
        assert!(!is_acronym_of(&words("m"), &words("Massachusetts Institute")));
        assert!(is_acronym_of(&words("ucl"), &words("University College London")));
        assert!(is_acronym_of(&words("miot"), &words("Massachusetts Institute of Technology")));
    }
}
