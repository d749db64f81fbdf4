//! Seed data for the local question bank.

use crate::config::QuestionCfg;
use crate::domain::Category;

const SCIENCE: i64 = 1;
const ART: i64 = 2;
const GEOGRAPHY: i64 = 3;
const HISTORY: i64 = 4;
const ENTERTAINMENT: i64 = 5;
const SPORTS: i64 = 6;

/// Built-in categories so the quiz is playable without a trivia API.
pub fn seed_categories() -> Vec<Category> {
  [
    (SCIENCE, "Science"),
    (ART, "Art"),
    (GEOGRAPHY, "Geography"),
    (HISTORY, "History"),
    (ENTERTAINMENT, "Entertainment"),
    (SPORTS, "Sports"),
  ]
  .into_iter()
  .map(|(id, kind)| Category { id, kind: kind.into() })
  .collect()
}

/// Built-in questions: (id, question, answer, category, difficulty).
pub fn seed_questions() -> Vec<QuestionCfg> {
  let rows: [(i64, &str, &str, i64, u8); 24] = [
    (1, "Whose autobiography is entitled 'I Know Why the Caged Bird Sings'?", "Maya Angelou", HISTORY, 2),
    (2, "What boxer's original name is Cassius Clay?", "Muhammad Ali", HISTORY, 1),
    (3, "What movie earned Tom Hanks his third straight Oscar nomination, in 1996?", "Apollo 13", ENTERTAINMENT, 4),
    (4, "What actor did author Anne Rice first denounce, then praise in the role of her beloved Lestat?", "Tom Cruise", ENTERTAINMENT, 4),
    (5, "What was the title of the 1990 fantasy directed by Tim Burton about a young man with multi-bladed appendages?", "Edward Scissorhands", ENTERTAINMENT, 3),
    (6, "Which is the only team to play in every soccer World Cup tournament?", "Brazil", SPORTS, 3),
    (7, "Which country won the first ever soccer World Cup in 1930?", "Uruguay", SPORTS, 4),
    (8, "Who invented Peanut Butter?", "George Washington Carver", HISTORY, 2),
    (9, "What is the largest lake in Africa?", "Lake Victoria", GEOGRAPHY, 2),
    (10, "In which royal palace would you find the Hall of Mirrors?", "The Palace of Versailles", GEOGRAPHY, 3),
    (11, "The Taj Mahal is located in which Indian city?", "Agra", GEOGRAPHY, 2),
    (12, "Which Dutch graphic artist, initials M C, was a creator of optical illusions?", "Escher", ART, 1),
    (13, "La Giaconda is better known as what?", "Mona Lisa", ART, 3),
    (14, "How many paintings did Van Gogh sell in his lifetime?", "One", ART, 4),
    (15, "Which American artist was a pioneer of Abstract Expressionism, and a leading exponent of action painting?", "Jackson Pollock", ART, 2),
    (16, "What is the heaviest organ in the human body?", "The Liver", SCIENCE, 4),
    (17, "Who discovered penicillin?", "Alexander Fleming", SCIENCE, 3),
    (18, "Hematology is a branch of medicine involving the study of what?", "Blood", SCIENCE, 4),
    (19, "Which dung beetle was worshipped by the ancient Egyptians?", "Scarab", HISTORY, 4),
    (20, "What is the capital of Chile?", "Santiago", GEOGRAPHY, 1),
    (21, "What is the highest mountain in Britain?", "Ben Nevis", GEOGRAPHY, 3),
    (22, "What is the smallest country in the world?", "Vatican City", GEOGRAPHY, 2),
    (23, "Alberta is a province of which country?", "Canada", GEOGRAPHY, 1),
    (24, "Which planet is known as the Red Planet?", "Mars", SCIENCE, 1),
  ];

  rows
    .into_iter()
    .map(|(id, question, answer, category, difficulty)| QuestionCfg {
      id: Some(id),
      question: question.into(),
      answer: answer.into(),
      category,
      difficulty: Some(difficulty),
    })
    .collect()
}
