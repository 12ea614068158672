//! Operator-driven brains and the terminal interactor
//!
//! Every decision is put to the person at the terminal, which makes the CLI
//! usable for walking through a workflow or recording experience without
//! any external decision service.

use async_trait::async_trait;
use console::style;
use deskpilot_core::interactor::{NEW_REQUEST_TEXT, WELCOME_TEXT};
use deskpilot_core::{
    Action, AgentSignal, AppDecision, AppWindow, Brain, Decision, DecisionRequest, Error,
    HostDecision, Interactor, Notice, Result,
};
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use serde_json::Value;

fn prompt_error(e: dialoguer::Error) -> Error {
    Error::Input(e.to_string())
}

fn ask(prompt: &str) -> Result<String> {
    Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .map(|s| s.trim().to_string())
        .map_err(prompt_error)
}

/// Split "a; b; c" into plan steps
fn parse_plan(text: &str) -> Vec<String> {
    text.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// JSON arguments, or plain text wrapped as `{"text": ...}`
fn parse_args(text: &str) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| serde_json::json!({ "text": text }))
}

fn show_request(request: &DecisionRequest) {
    println!();
    println!("{} {}", style("Request:").bold().cyan(), request.request);
    if !request.plan.is_empty() {
        println!("{}", style("Plan:").bold());
        for (i, step) in request.plan.iter().enumerate() {
            println!("  {}. {}", i + 1, step);
        }
    }
    for example in &request.examples {
        println!("{}", style(example).dim());
    }
}

/// Host brain asking the operator to pick a window
pub struct OperatorHostBrain;

#[async_trait]
impl Brain<HostDecision> for OperatorHostBrain {
    async fn decide(&self, request: &DecisionRequest) -> Result<Decision<HostDecision>> {
        show_request(request);
        let windows: Vec<AppWindow> = serde_json::from_value(request.control_info.clone())?;

        let mut items: Vec<String> = windows
            .iter()
            .map(|w| format!("[{}] {} {}", w.label, w.title, style(&w.process_name).dim()))
            .collect();
        items.push("None of these".to_string());

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Select the application")
            .items(&items)
            .default(0)
            .interact()
            .map_err(prompt_error)?;

        let decision = match windows.get(selection) {
            Some(window) => {
                let plan = parse_plan(&ask("Plan (steps separated by ';')")?);
                HostDecision::select(window.label.clone()).with_plan(plan)
            }
            None => HostDecision::none("No listed application fits the request"),
        };
        Ok(Decision::free(decision))
    }
}

const SIGNALS: [(&str, AgentSignal); 4] = [
    ("Continue", AgentSignal::Continue),
    ("Finish", AgentSignal::Finish),
    ("Abandon (needs a new request)", AgentSignal::Abandon),
    ("Fail", AgentSignal::Fail),
];

/// App brain asking the operator for the next action
pub struct OperatorAppBrain;

#[async_trait]
impl Brain<AppDecision> for OperatorAppBrain {
    async fn decide(&self, request: &DecisionRequest) -> Result<Decision<AppDecision>> {
        show_request(request);
        if let Some(last) = request.action_history.last() {
            println!("{} {}", style("Last result:").bold(), last["Results"]);
        }
        if !request.current_state.is_null() {
            println!("{}", style(request.current_state.to_string()).dim());
        }

        let function = ask("Action (empty for none)")?;
        let mut action = Action::new(function);
        if !action.is_noop() {
            let target = ask("Target control")?;
            if !target.is_empty() {
                action = action.with_target(target);
            }
            action = action.with_args(parse_args(&ask("Arguments")?));
        }

        let labels: Vec<&str> = SIGNALS.iter().map(|(label, _)| *label).collect();
        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("After this action")
            .items(&labels)
            .default(0)
            .interact()
            .map_err(prompt_error)?;

        let decision = AppDecision::act(action).with_signal(SIGNALS[selection].1);
        Ok(Decision::free(decision))
    }
}

/// Interactor prompting on the terminal
pub struct TerminalInteractor {
    /// Request given on the command line, used instead of the first prompt
    initial: Option<String>,
}

impl TerminalInteractor {
    pub fn new(initial: Option<String>) -> Self {
        Self { initial }
    }
}

impl Interactor for TerminalInteractor {
    fn first_request(&mut self) -> Result<String> {
        if let Some(request) = self.initial.take() {
            return Ok(request);
        }
        println!("{}", style(WELCOME_TEXT).bold());
        ask("Request")
    }

    fn new_request(&mut self) -> Result<String> {
        println!();
        println!("{}", style(NEW_REQUEST_TEXT).bold());
        ask("Request")
    }

    fn confirm_experience_save(&mut self) -> Result<bool> {
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Save this session as experience?")
            .default(false)
            .interact()
            .map_err(prompt_error)
    }

    fn notify(&mut self, message: &str, notice: Notice) {
        match notice {
            Notice::Info => println!("{}", style(message).green()),
            Notice::Cost => println!("{}", style(message).yellow()),
            Notice::Warning => println!("{}", style(message).red()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plan() {
        assert_eq!(parse_plan(" open file; type hello ;; "), vec!["open file", "type hello"]);
        assert!(parse_plan("").is_empty());
    }

    #[test]
    fn test_parse_args() {
        assert_eq!(parse_args(""), Value::Null);
        assert_eq!(parse_args(r#"{"keys": "^s"}"#)["keys"], "^s");
        assert_eq!(parse_args("hello world")["text"], "hello world");
    }

    #[test]
    fn test_initial_request_skips_prompt() {
        let mut interactor = TerminalInteractor::new(Some("Open Notepad".into()));
        assert_eq!(interactor.first_request().unwrap(), "Open Notepad");
    }
}
