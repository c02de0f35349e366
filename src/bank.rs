//! Static question bank used when model generation is unavailable.
//!
//! Lookups are deterministic and case-insensitive. Unknown topics fall back
//! to the javascript set so the assessment flow always has material.
//! Operators can add more topics via the agent config file.

use std::collections::HashMap;

use tracing::{error, info};

use crate::config::BankTopicCfg;
use crate::domain::{AssessmentQuestion, Difficulty};

const BASELINE_TOPIC: &str = "javascript";
const BANK_SIZE: usize = 10;

struct BankQuestion {
  question: &'static str,
  options: [&'static str; 4],
  correct: u32,
  difficulty: Difficulty,
  explanation: &'static str,
}

macro_rules! q {
  ($question:expr, $options:expr, $correct:expr, $difficulty:expr, $explanation:expr) => {
    BankQuestion {
      question: $question,
      options: $options,
      correct: $correct,
      difficulty: $difficulty,
      explanation: $explanation,
    }
  };
}

const JAVASCRIPT_BANK: &[BankQuestion] = &[
  q!("What is the correct way to declare a variable in JavaScript?", ["var x = 5;", "variable x = 5;", "v x = 5;", "declare x = 5;"], 0, Difficulty::Easy, "The 'var' keyword is used to declare variables in JavaScript."),
  q!("Which method is used to add an element to the end of an array?", ["push()", "pop()", "shift()", "unshift()"], 0, Difficulty::Easy, "The push() method adds one or more elements to the end of an array."),
  q!("What does the 'this' keyword refer to in JavaScript?", ["The current function", "The current object", "The global object", "The parent object"], 1, Difficulty::Medium, "The 'this' keyword refers to the object that is currently executing the function."),
  q!("Which operator is used for strict equality comparison?", ["==", "===", "!=", "!=="], 1, Difficulty::Medium, "The === operator performs strict equality comparison without type coercion."),
  q!("What is a closure in JavaScript?", ["A function that returns another function", "A function that has access to variables in its outer scope", "A function that takes no parameters", "A function that always returns the same value"], 1, Difficulty::Hard, "A closure is a function that has access to variables in its outer (enclosing) scope even after the outer function returns."),
  q!("Which method is used to create a new array from an existing array?", ["slice()", "splice()", "split()", "join()"], 0, Difficulty::Easy, "The slice() method returns a shallow copy of a portion of an array into a new array."),
  q!("What is the purpose of the 'use strict' directive?", ["To enable strict mode", "To disable strict mode", "To import strict functions", "To export strict variables"], 0, Difficulty::Medium, "The 'use strict' directive enables strict mode, which helps catch common coding mistakes."),
  q!("Which method is used to handle asynchronous operations in modern JavaScript?", ["callback", "promise", "async/await", "All of the above"], 3, Difficulty::Hard, "All three methods (callbacks, promises, and async/await) are used to handle asynchronous operations."),
  q!("What is the difference between 'let' and 'var'?", ["No difference", "let has block scope, var has function scope", "var has block scope, let has function scope", "let is faster than var"], 1, Difficulty::Medium, "let has block scope while var has function scope, and let is not hoisted."),
  q!("Which method is used to iterate over array elements?", ["for loop", "forEach()", "map()", "All of the above"], 3, Difficulty::Easy, "All three methods can be used to iterate over array elements, each with different use cases."),
];

const REACT_BANK: &[BankQuestion] = &[
  q!("What is React?", ["A database", "A JavaScript library for building user interfaces", "A server-side framework", "A programming language"], 1, Difficulty::Easy, "React is a JavaScript library for building user interfaces, particularly web applications."),
  q!("What is JSX?", ["A JavaScript extension", "A syntax extension for JavaScript", "A new programming language", "A CSS framework"], 1, Difficulty::Easy, "JSX is a syntax extension for JavaScript that allows you to write HTML-like code in JavaScript."),
  q!("What is a component in React?", ["A function or class that returns JSX", "A database table", "A CSS file", "A JavaScript variable"], 0, Difficulty::Medium, "A React component is a function or class that returns JSX and can be reused throughout the application."),
  q!("What is the purpose of useState hook?", ["To manage state in functional components", "To create new components", "To handle events", "To fetch data"], 0, Difficulty::Medium, "useState is a React hook that allows you to add state to functional components."),
  q!("What is the virtual DOM?", ["A real DOM element", "A JavaScript representation of the DOM", "A CSS framework", "A database"], 1, Difficulty::Hard, "The virtual DOM is a JavaScript representation of the real DOM that React uses for efficient updates."),
  q!("Which method is called when a component is first rendered?", ["componentDidMount", "componentWillMount", "useEffect", "All of the above"], 3, Difficulty::Medium, "All three methods can be used to handle component mounting, depending on the component type."),
  q!("What is props in React?", ["A CSS property", "Data passed from parent to child components", "A JavaScript function", "A database query"], 1, Difficulty::Easy, "Props are data passed from parent components to child components in React."),
  q!("What is the purpose of useEffect hook?", ["To manage state", "To handle side effects", "To create components", "To handle events"], 1, Difficulty::Hard, "useEffect is used to handle side effects in functional components, such as data fetching or subscriptions."),
  q!("What is the difference between controlled and uncontrolled components?", ["No difference", "Controlled components have their state managed by React", "Uncontrolled components are faster", "Controlled components are always better"], 1, Difficulty::Hard, "Controlled components have their state managed by React, while uncontrolled components manage their own state."),
  q!("What is the purpose of keys in React lists?", ["To style elements", "To help React identify which items have changed", "To add event handlers", "To create animations"], 1, Difficulty::Medium, "Keys help React identify which items have changed, been added, or removed in lists."),
];

const PYTHON_BANK: &[BankQuestion] = &[
  q!("Which keyword is used to define a function in Python?", ["func", "def", "function", "lambda"], 1, Difficulty::Easy, "The 'def' keyword starts a function definition in Python."),
  q!("What is the output of len([1, 2, 3])?", ["2", "3", "4", "TypeError"], 1, Difficulty::Easy, "len() returns the number of items in a container, here 3."),
  q!("Which of these literals creates a dictionary?", ["[1, 2]", "(1, 2)", "{'a': 1}", "{1, 2}"], 2, Difficulty::Easy, "Curly braces with key: value pairs create a dict; without pairs they create a set."),
  q!("What does [x * 2 for x in range(3)] evaluate to?", ["[0, 2, 4]", "[2, 4, 6]", "[0, 1, 2]", "[1, 2, 3]"], 0, Difficulty::Medium, "range(3) yields 0, 1 and 2, and the comprehension doubles each element."),
  q!("How do you open a file so it is closed automatically?", ["open(path).close()", "with open(path) as f:", "try: open(path)", "file(path, auto=True)"], 1, Difficulty::Medium, "The 'with' statement closes the file when the block exits, even on error."),
  q!("What is the difference between a list and a tuple?", ["No difference", "Lists are mutable, tuples are immutable", "Tuples are mutable, lists are immutable", "Tuples can only hold numbers"], 1, Difficulty::Medium, "Lists can be modified in place while tuples cannot be changed after creation."),
  q!("Which statement handles exceptions in Python?", ["try/except", "catch/throw", "on error", "rescue"], 0, Difficulty::Medium, "Python wraps risky code in try and handles failures in except blocks."),
  q!("What is the Global Interpreter Lock (GIL)?", ["A file locking API", "A mutex that lets only one thread run Python bytecode at a time", "A database lock", "A syntax rule"], 1, Difficulty::Hard, "CPython's GIL allows only one thread to execute Python bytecode at a time."),
  q!("What does calling a generator function return?", ["A list of all values", "The first yielded value", "A generator iterator", "None"], 2, Difficulty::Hard, "Calling a generator function returns a generator object; values are produced lazily by yield."),
  q!("When are default argument values evaluated?", ["On every call", "Once per thread", "Lazily on first use", "Once, when the def statement runs"], 3, Difficulty::Hard, "Default values are evaluated once at definition time, which is why mutable defaults are shared between calls."),
];

fn builtin_bank(topic: &str) -> Option<&'static [BankQuestion]> {
  match topic {
    BASELINE_TOPIC => Some(JAVASCRIPT_BANK),
    "react" => Some(REACT_BANK),
    "python" => Some(PYTHON_BANK),
    _ => None,
  }
}

fn to_questions(bank: &[BankQuestion]) -> Vec<AssessmentQuestion> {
  bank.iter().enumerate()
    .map(|(i, q)| AssessmentQuestion {
      id: (i + 1) as u32,
      question: q.question.to_string(),
      options: q.options.iter().map(|o| o.to_string()).collect(),
      correct_index: q.correct,
      difficulty: q.difficulty,
      explanation: q.explanation.to_string(),
    })
    .collect()
}

/// Built-in question sets plus any extra topics loaded from the agent
/// config. Lookup never fails: unknown topics get the baseline set.
#[derive(Clone, Default)]
pub struct QuestionBank {
  extra: HashMap<String, Vec<AssessmentQuestion>>,
}

impl QuestionBank {
  /// Load operator-provided topics. A topic must carry exactly ten
  /// well-formed questions or it is skipped whole.
  pub fn from_config(banks: &[BankTopicCfg]) -> Self {
    let mut extra = HashMap::new();
    for bank in banks {
      let key = bank.topic.trim().to_lowercase();
      if key.is_empty() {
        error!(target: "assessment", "Skipping config bank with blank topic");
        continue;
      }
      match convert_config_bank(bank) {
        Ok(questions) => {
          info!(target: "assessment", topic = %key, "Loaded question bank from config");
          extra.insert(key, questions);
        }
        Err(reason) => {
          error!(target: "assessment", topic = %key, %reason, "Skipping invalid config bank");
        }
      }
    }
    Self { extra }
  }

  /// Ten questions for the topic, ids 1..=10. Config topics shadow the
  /// built-ins; anything unrecognized resolves to the baseline set.
  pub fn questions_for(&self, topic: &str) -> Vec<AssessmentQuestion> {
    let key = topic.trim().to_lowercase();
    if let Some(questions) = self.extra.get(&key) {
      return questions.clone();
    }
    let bank = builtin_bank(&key).unwrap_or(JAVASCRIPT_BANK);
    to_questions(bank)
  }
}

fn convert_config_bank(bank: &BankTopicCfg) -> Result<Vec<AssessmentQuestion>, String> {
  if bank.questions.len() != BANK_SIZE {
    return Err(format!("expected {} questions, found {}", BANK_SIZE, bank.questions.len()));
  }
  let mut out = Vec::with_capacity(BANK_SIZE);
  for (i, q) in bank.questions.iter().enumerate() {
    if q.question.trim().is_empty() {
      return Err(format!("question {} has no text", i + 1));
    }
    if q.options.len() != 4 {
      return Err(format!("question {} needs 4 options, found {}", i + 1, q.options.len()));
    }
    if q.correct > 3 {
      return Err(format!("question {} has correct index {} out of range", i + 1, q.correct));
    }
    let difficulty = Difficulty::parse(&q.difficulty)
      .ok_or_else(|| format!("question {} has unknown difficulty '{}'", i + 1, q.difficulty))?;
    out.push(AssessmentQuestion {
      id: (i + 1) as u32,
      question: q.question.clone(),
      options: q.options.clone(),
      correct_index: q.correct,
      difficulty,
      explanation: q.explanation.clone(),
    });
  }
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::BankQuestionCfg;

  #[test]
  fn lookup_is_case_insensitive() {
    let bank = QuestionBank::default();
    let upper = bank.questions_for("REACT");
    let lower = bank.questions_for("react");
    assert_eq!(upper.len(), 10);
    assert_eq!(upper, lower);
    assert_eq!(upper[0].question, "What is React?");
  }

  #[test]
  fn unknown_topic_falls_back_to_the_baseline_set() {
    let bank = QuestionBank::default();
    let unknown = bank.questions_for("quantum basket weaving");
    let baseline = bank.questions_for("javascript");
    assert_eq!(unknown, baseline);
  }

  #[test]
  fn builtin_banks_are_well_formed() {
    let bank = QuestionBank::default();
    for topic in ["javascript", "react", "python"] {
      let questions = bank.questions_for(topic);
      assert_eq!(questions.len(), 10, "{topic}");
      for (i, q) in questions.iter().enumerate() {
        assert_eq!(q.id, (i + 1) as u32);
        assert_eq!(q.options.len(), 4);
        assert!(q.correct_index <= 3);
        assert!(!q.question.is_empty());
      }
    }
  }

  #[test]
  fn javascript_bank_difficulty_mix() {
    let questions = QuestionBank::default().questions_for("javascript");
    let count = |d: Difficulty| questions.iter().filter(|q| q.difficulty == d).count();
    assert_eq!(count(Difficulty::Easy), 4);
    assert_eq!(count(Difficulty::Medium), 4);
    assert_eq!(count(Difficulty::Hard), 2);
  }

  fn config_question() -> BankQuestionCfg {
    BankQuestionCfg {
      question: "What is ownership?".into(),
      options: vec!["A GC".into(), "A compile-time memory model".into(), "A syntax rule".into(), "A linter".into()],
      correct: 1,
      difficulty: "Medium".into(),
      explanation: "Ownership moves and borrows are checked at compile time.".into(),
    }
  }

  #[test]
  fn config_topics_shadow_builtins_and_invalid_ones_are_skipped() {
    let good = BankTopicCfg {
      topic: "Rust".into(),
      questions: vec![config_question(); 10],
    };
    let mut bad_question = config_question();
    bad_question.correct = 7;
    let bad = BankTopicCfg {
      topic: "go".into(),
      questions: vec![bad_question; 10],
    };
    let short = BankTopicCfg {
      topic: "zig".into(),
      questions: vec![config_question(); 9],
    };

    let bank = QuestionBank::from_config(&[good, bad, short]);

    let rust = bank.questions_for("RUST");
    assert_eq!(rust.len(), 10);
    assert_eq!(rust[0].question, "What is ownership?");
    assert_eq!(rust[3].id, 4);

    // Rejected topics resolve to the baseline instead.
    assert_eq!(bank.questions_for("go"), bank.questions_for("javascript"));
    assert_eq!(bank.questions_for("zig"), bank.questions_for("javascript"));
  }
}
