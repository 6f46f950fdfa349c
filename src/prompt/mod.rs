// src/prompt/mod.rs

//! Operator prompting
//!
//! Ingestion needs operator input at two points (long-form description on
//! first ingestion, changelog lines for a new version), plus menu
//! selection in the CLI. The orchestrator takes the capability as a trait
//! object so it can run against a terminal or a scripted answer queue.

use crate::error::{Error, Result};
use dialoguer::{Input, Select};
use std::collections::VecDeque;

/// Blocking operator input. Each call suspends ingestion until answered.
pub trait Prompter {
    /// Ask for a single line of text, with an optional default answer.
    fn ask_text(&mut self, message: &str, default: Option<&str>) -> Result<String>;

    /// Ask for a sequence of lines, terminated by an empty answer.
    fn ask_lines(&mut self, message: &str) -> Result<Vec<String>>;

    /// Ask to pick one of `choices`; returns the chosen index.
    fn ask_choice(&mut self, message: &str, choices: &[String]) -> Result<usize>;
}

/// Interactive prompter for a real terminal.
#[derive(Debug, Default)]
pub struct ConsolePrompter;

impl Prompter for ConsolePrompter {
    fn ask_text(&mut self, message: &str, default: Option<&str>) -> Result<String> {
        let mut input = Input::<String>::new();
        input.with_prompt(message).allow_empty(true);
        if let Some(default) = default {
            input.default(default.to_string());
        }
        let answer = input
            .interact_text()
            .map_err(|e| Error::Prompt(e.to_string()))?;
        Ok(answer.trim().to_string())
    }

    fn ask_lines(&mut self, message: &str) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        loop {
            let answer = Input::<String>::new()
                .with_prompt(message)
                .allow_empty(true)
                .interact_text()
                .map_err(|e| Error::Prompt(e.to_string()))?;
            let answer = answer.trim();
            if answer.is_empty() {
                break;
            }
            lines.push(answer.to_string());
        }
        Ok(lines)
    }

    fn ask_choice(&mut self, message: &str, choices: &[String]) -> Result<usize> {
        Select::new()
            .with_prompt(message)
            .items(choices)
            .default(0)
            .interact()
            .map_err(|e| Error::Prompt(e.to_string()))
    }
}

/// Prompter with pre-seeded answers, for tests and scripted runs.
///
/// Answering from an empty queue is an error, which doubles as an
/// assertion that a flow issued no prompt.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    texts: VecDeque<String>,
    lines: VecDeque<Vec<String>>,
    choices: VecDeque<usize>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&mut self, answer: &str) {
        self.texts.push_back(answer.to_string());
    }

    pub fn push_lines(&mut self, answers: &[&str]) {
        self.lines
            .push_back(answers.iter().map(|s| s.to_string()).collect());
    }

    pub fn push_choice(&mut self, index: usize) {
        self.choices.push_back(index);
    }
}

impl Prompter for ScriptedPrompter {
    fn ask_text(&mut self, message: &str, _default: Option<&str>) -> Result<String> {
        self.texts
            .pop_front()
            .ok_or_else(|| Error::Prompt(format!("no scripted answer for: {}", message)))
    }

    fn ask_lines(&mut self, message: &str) -> Result<Vec<String>> {
        self.lines
            .pop_front()
            .ok_or_else(|| Error::Prompt(format!("no scripted answer for: {}", message)))
    }

    fn ask_choice(&mut self, message: &str, choices: &[String]) -> Result<usize> {
        let index = self
            .choices
            .pop_front()
            .ok_or_else(|| Error::Prompt(format!("no scripted answer for: {}", message)))?;
        if index >= choices.len() {
            return Err(Error::Prompt(format!(
                "scripted choice {} out of range for {} options",
                index,
                choices.len()
            )));
        }
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_answers_in_order() {
        let mut prompter = ScriptedPrompter::new();
        prompter.push_text("first");
        prompter.push_text("second");
        prompter.push_lines(&["a", "b"]);
        prompter.push_choice(1);

        assert_eq!(prompter.ask_text("q", None).unwrap(), "first");
        assert_eq!(prompter.ask_text("q", None).unwrap(), "second");
        assert_eq!(prompter.ask_lines("q").unwrap(), vec!["a", "b"]);
        assert_eq!(
            prompter
                .ask_choice("q", &["x".to_string(), "y".to_string()])
                .unwrap(),
            1
        );
    }

    #[test]
    fn test_exhausted_queue_is_an_error() {
        let mut prompter = ScriptedPrompter::new();
        assert!(matches!(
            prompter.ask_text("q", None),
            Err(Error::Prompt(_))
        ));
        assert!(matches!(prompter.ask_lines("q"), Err(Error::Prompt(_))));
    }

    #[test]
    fn test_out_of_range_choice_is_an_error() {
        let mut prompter = ScriptedPrompter::new();
        prompter.push_choice(5);
        let result = prompter.ask_choice("q", &["only".to_string()]);
        assert!(matches!(result, Err(Error::Prompt(_))));
    }
}
