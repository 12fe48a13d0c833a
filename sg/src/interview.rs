//! Interactive answer collection for `sg clarify`

use colored::*;
use eyre::{Result, eyre};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::pipeline::{AnswerMap, ClarificationQuestion};

/// Answer used for a question when the reply is blank
///
/// Whitespace-only replies count as blank.
pub fn resolve_answer(reply: &str, question: &ClarificationQuestion) -> String {
    let reply = reply.trim();
    if reply.is_empty() {
        question.suggested_answer.clone()
    } else {
        reply.to_string()
    }
}

/// Every question answered with its suggestion
pub fn suggested_answers(questions: &[ClarificationQuestion]) -> AnswerMap {
    questions
        .iter()
        .map(|q| (q.id, q.suggested_answer.clone()))
        .collect()
}

fn print_question(question: &ClarificationQuestion, position: usize, total: usize) {
    println!();
    println!(
        "{} {}",
        format!("[{}/{}]", position, total).bold(),
        question.category.to_string().cyan()
    );
    println!("{}", question.question.bold());
    if !question.context.is_empty() {
        println!("{}", question.context.dimmed());
    }
    println!("{} {}", "Suggested:".dimmed(), question.suggested_answer.dimmed());
}

/// Put each question to the user and collect answers
///
/// With `accept_suggested` nothing is read and every suggestion is taken.
/// An empty reply takes the suggestion for that question. Ctrl-C or Ctrl-D
/// cancels the whole interview.
pub fn collect_answers(questions: &[ClarificationQuestion], accept_suggested: bool) -> Result<AnswerMap> {
    debug!(count = questions.len(), accept_suggested, "collect_answers: called");
    if accept_suggested {
        for (i, question) in questions.iter().enumerate() {
            print_question(question, i + 1, questions.len());
        }
        return Ok(suggested_answers(questions));
    }

    let mut rl = DefaultEditor::new().map_err(|e| eyre!("Failed to initialize readline: {}", e))?;
    let mut answers = AnswerMap::new();

    for (i, question) in questions.iter().enumerate() {
        print_question(question, i + 1, questions.len());
        match rl.readline(&format!("{} ", ">".bright_green())) {
            Ok(line) => {
                let answer = resolve_answer(&line, question);
                debug!(id = question.id, "collect_answers: answered");
                answers.insert(question.id, answer);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                debug!("collect_answers: cancelled");
                return Err(eyre!("Clarification cancelled"));
            }
            Err(e) => return Err(eyre!("Failed to read answer: {}", e)),
        }
    }

    Ok(answers)
}
