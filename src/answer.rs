//! Free-text answer evaluation and match-token generation.
//!
//! A guess is judged correct when every match token of the question occurs
//! somewhere in the normalized guess. Tokens may match inside other words
//! ("cat" matches "category"); short tokens can therefore produce false
//! positives. This leniency is kept on purpose.

/// Characters stripped from a guess before matching.
const GUESS_PUNCTUATION: &[char] = &[
  '.', ',', '/', '#', '!', '$', '%', '^', '&', '*', ';', ':', '{', '}', '=', '-', '_', '`', '~', '(', ')',
];

/// Separator for bank answers that carry an explicit match list: `answer%%%match`.
const ANSWER_MATCH_SEPARATOR: &str = "%%%";

/// English stop words dropped when generating match tokens for bank questions.
const STOP_WORDS: &[&str] = &[
  "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours", "yourself",
  "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself", "it", "its", "itself",
  "they", "them", "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that",
  "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
  "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or", "because", "as",
  "until", "while", "of", "at", "by", "for", "with", "about", "against", "between", "into", "through",
  "during", "before", "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off",
  "over", "under", "again", "further", "then", "once", "here", "there", "when", "where", "why", "how",
  "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no", "nor", "not",
  "only", "own", "same", "so", "than", "too", "very", "s", "t", "can", "will", "just", "don", "should",
  "now", "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "couldn", "didn", "doesn", "hadn",
  "hasn", "haven", "isn", "ma", "mightn", "mustn", "needn", "shan", "shouldn", "wasn", "weren", "won",
  "wouldn",
];

/// Strip the guess punctuation set and lower-case.
pub fn normalize_guess(raw: &str) -> String {
  raw
    .chars()
    .filter(|c| !GUESS_PUNCTUATION.contains(c))
    .collect::<String>()
    .to_lowercase()
}

/// Default match tokens for an answer: lower-cased, split on whitespace.
pub fn match_tokens_from_answer(answer: &str) -> Vec<String> {
  answer.to_lowercase().split_whitespace().map(str::to_string).collect()
}

/// True iff every token is a substring of the normalized guess.
pub fn evaluate_guess(match_tokens: &[String], raw_guess: &str) -> bool {
  let guess = normalize_guess(raw_guess);
  match_tokens.iter().all(|token| guess.contains(token.as_str()))
}

/// Split a bank answer into display text and match tokens.
///
/// `"The Liver"` yields `("The Liver", ["liver"])`; `"Apollo 13%%%apollo"`
/// yields `("Apollo 13", ["apollo"])`.
pub fn generate_match(answer: &str) -> (String, Vec<String>) {
  if let Some((display, explicit)) = answer.rsplit_once(ANSWER_MATCH_SEPARATOR) {
    return (display.to_string(), match_tokens_from_answer(explicit));
  }

  let tokens = answer
    .split_whitespace()
    .map(|word| word.trim_matches(|c: char| !is_word_char(c)).to_lowercase())
    .filter(|word| !word.is_empty() && !STOP_WORDS.contains(&word.as_str()))
    .collect();
  (answer.to_string(), tokens)
}

fn is_word_char(c: char) -> bool {
  c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
  use super::*;

  fn tokens(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
  }

  #[test]
  fn accepts_answer_embedded_in_sentence() {
    assert!(evaluate_guess(&tokens(&["paris"]), "I think it's paris, right?"));
  }

  #[test]
  fn rejects_guess_missing_a_token() {
    assert!(!evaluate_guess(&tokens(&["mount", "everest"]), "everest"));
  }

  #[test]
  fn token_may_match_inside_a_longer_word() {
    assert!(evaluate_guess(&tokens(&["cat"]), "category"));
  }

  #[test]
  fn token_order_does_not_matter() {
    assert!(evaluate_guess(&tokens(&["edward", "scissorhands"]), "Scissorhands, Edward"));
  }

  #[test]
  fn normalization_strips_listed_punctuation_only() {
    assert_eq!(normalize_guess("Mount-Everest! (8,848m)"), "mounteverest 8848m");
    assert_eq!(normalize_guess("What's up?"), "what's up?");
  }

  #[test]
  fn punctuation_inside_guess_is_ignored_for_matching() {
    assert!(evaluate_guess(&tokens(&["apollo", "13"]), "A.P.O.L.L.O 1-3"));
  }

  #[test]
  fn answer_tokens_are_lowercased_whitespace_split() {
    assert_eq!(match_tokens_from_answer("  Lake   Victoria "), tokens(&["lake", "victoria"]));
  }

  #[test]
  fn generated_match_drops_stop_words_and_edge_punctuation() {
    let (answer, match_tokens) = generate_match("The Palace of Versailles.");
    assert_eq!(answer, "The Palace of Versailles.");
    assert_eq!(match_tokens, tokens(&["palace", "versailles"]));
  }

  #[test]
  fn generated_match_drops_contraction_fragments() {
    let (_, match_tokens) = generate_match("O Brother, Where Art Thou?");
    assert_eq!(match_tokens, tokens(&["brother", "art", "thou"]));
    let (_, match_tokens) = generate_match("Y Tu Mama Tambien");
    assert_eq!(match_tokens, tokens(&["tu", "mama", "tambien"]));
  }

  #[test]
  fn explicit_match_after_separator_wins() {
    let (answer, match_tokens) = generate_match("Apollo 13%%%Apollo");
    assert_eq!(answer, "Apollo 13");
    assert_eq!(match_tokens, tokens(&["apollo"]));
  }
}
