//! Console prompt answering interactive sync questions

use crate::diff::{Absence, Decider, Decision, ObjectKind};
use crate::types::{Side, SyncError};
use camino::Utf8Path;
use console::{style, Term};

/// Unanswerable questions are asked this many times before giving up
const MAX_ASKS: usize = 3;

/// [`Decider`] that asks on the terminal
pub struct ConsolePrompt {
    term: Term,
}

impl ConsolePrompt {
    /// Prompt on stderr
    ///
    /// Fails unless stderr is a terminal: a redirected stream reads back
    /// empty answers, which would accept every default unasked.
    pub fn open() -> Result<Self, SyncError> {
        Self::for_term(Term::stderr())
    }

    pub fn for_term(term: Term) -> Result<Self, SyncError> {
        if !term.is_term() {
            return Err(SyncError::Config(
                "Interactive sync needs a terminal to ask on; use another --sync-direction".to_string(),
            ));
        }
        Ok(Self { term })
    }

    fn ask(&self, question: &str) -> Result<String, SyncError> {
        self.term
            .write_str(&format!("{} {} ", style("?").yellow().bold(), question))?;
        Ok(self.term.read_line()?)
    }
}

impl Decider for ConsolePrompt {
    fn decide(&mut self, absence: &Absence) -> Result<Decision, SyncError> {
        let present = match absence.missing {
            Side::Remote => "local",
            Side::Local => "remote",
        };
        let question = format!(
            "{} {} only exists on the {} side. [c]reate on the other side or [d]elete?",
            kind_label(absence.kind),
            style(&absence.path).cyan(),
            present
        );

        for _ in 0..MAX_ASKS {
            if let Some(decision) = parse_decision(&self.ask(&question)?) {
                return Ok(decision);
            }
            self.term.write_line("Please answer 'c' or 'd'.")?;
        }
        Err(SyncError::Config(format!(
            "No decision given for {}",
            absence.path
        )))
    }

    fn confirm_restore(&mut self, path: &Utf8Path, kind: ObjectKind) -> Result<bool, SyncError> {
        let question = format!("Copy {} {}? [Y/n]", kind_label(kind), style(path).cyan());
        for _ in 0..MAX_ASKS {
            if let Some(answer) = parse_yes_no(&self.ask(&question)?, true) {
                return Ok(answer);
            }
            self.term.write_line("Please answer 'y' or 'n'.")?;
        }
        Ok(false)
    }
}

fn kind_label(kind: ObjectKind) -> &'static str {
    match kind {
        ObjectKind::File => "File",
        ObjectKind::Dir => "Folder",
    }
}

/// Parse a create/delete answer
fn parse_decision(answer: &str) -> Option<Decision> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "c" | "create" => Some(Decision::Create),
        "d" | "delete" => Some(Decision::Delete),
        _ => None,
    }
}

/// Parse a yes/no answer, an empty answer meaning `default`
fn parse_yes_no(answer: &str, default: bool) -> Option<bool> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}
