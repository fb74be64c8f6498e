//! Interactive terminal chat over a [`ChatSession`].

use reedline::{DefaultPrompt, DefaultPromptSegment, Reedline, Signal};

use crate::models::models_for;
use crate::session::ChatSession;

/// What the user sees in place of a secret.
const MASK: &str = "••••••••••••••••••••";

const HELP: &str = "\
Commands:
  /key add <secret> [name]   store an API key
  /key list                  list stored keys (* marks the selected one)
  /key use <id>              select a key
  /key rm <id>               remove a key
  /key rename <id> <name>    rename a key
  /prompt [text]             show or set the system prompt
  /prompt --clear            remove the system prompt
  /model [id]                show or set the model
  /models                    list models for the provider
  /usage                     show token totals
  /clear                     clear the conversation and totals
  /help                      show this help
  /quit                      leave
Anything else is sent as a message.";

// ============================================================================
// Commands
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptAction {
    Show,
    Set(String),
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    KeyAdd { secret: String, name: Option<String> },
    KeyList,
    KeyUse(String),
    KeyRemove(String),
    KeyRename { id: String, name: String },
    Prompt(PromptAction),
    Model(Option<String>),
    Models,
    Usage,
    Clear,
    Help,
    Quit,
    Message(String),
    /// A malformed command, with the text to show instead.
    Invalid(String),
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if !line.starts_with('/') {
            return Some(Command::Message(line.to_string()));
        }

        let (head, rest) = split_word(line);
        let command = match head {
            "/key" => parse_key(rest),
            "/prompt" => match rest {
                "" => Command::Prompt(PromptAction::Show),
                "--clear" => Command::Prompt(PromptAction::Clear),
                text => Command::Prompt(PromptAction::Set(text.to_string())),
            },
            "/model" => Command::Model((!rest.is_empty()).then(|| rest.to_string())),
            "/models" => Command::Models,
            "/usage" => Command::Usage,
            "/clear" => Command::Clear,
            "/help" => Command::Help,
            "/quit" | "/exit" => Command::Quit,
            other => Command::Invalid(format!("Unknown command: {other} (try /help)")),
        };
        Some(command)
    }
}

fn parse_key(args: &str) -> Command {
    let (sub, rest) = split_word(args);
    match sub {
        "" | "list" => Command::KeyList,
        "add" => {
            let (secret, name) = split_word(rest);
            if secret.is_empty() {
                return Command::Invalid("Usage: /key add <secret> [name]".to_string());
            }
            Command::KeyAdd {
                secret: secret.to_string(),
                name: (!name.is_empty()).then(|| name.to_string()),
            }
        }
        "use" if !rest.is_empty() => Command::KeyUse(rest.to_string()),
        "rm" if !rest.is_empty() => Command::KeyRemove(rest.to_string()),
        "rename" => match split_word(rest) {
            (id, name) if !id.is_empty() && !name.is_empty() => Command::KeyRename {
                id: id.to_string(),
                name: name.to_string(),
            },
            _ => Command::Invalid("Usage: /key rename <id> <name>".to_string()),
        },
        "use" | "rm" => Command::Invalid(format!("Usage: /key {sub} <id>")),
        other => Command::Invalid(format!("Unknown key command: {other} (try /help)")),
    }
}

/// Split off the first whitespace-delimited word; the remainder is trimmed.
fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim();
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (s, ""),
    }
}

// ============================================================================
// Execution
// ============================================================================

/// Run a command against the session and return the text to print.
pub async fn execute(session: &mut ChatSession, command: Command) -> String {
    let provider = session.provider();
    let store = session.store().clone();

    match command {
        Command::KeyAdd { secret, name } => match store.add_key(provider, &secret, name.as_deref()) {
            Some(id) => format!("Added key {id}"),
            None => "Could not store the key".to_string(),
        },
        Command::KeyList => {
            let keys = store.list_keys(provider);
            if keys.is_empty() {
                return format!("No {provider} keys stored. Add one with /key add <secret>");
            }
            let selected = store.get_selected_key_id(provider);
            keys.iter()
                .map(|k| {
                    let marker = if selected.as_deref() == Some(k.id.as_str()) {
                        '*'
                    } else {
                        ' '
                    };
                    format!("{marker} {}  {}  {MASK}", k.id, k.name)
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
        Command::KeyUse(id) => {
            if !has_key(session, &id) {
                return format!("No key with id {id}");
            }
            store.set_selected_key_id(provider, Some(&id));
            format!("Using key {id}")
        }
        Command::KeyRemove(id) => {
            if !has_key(session, &id) {
                return format!("No key with id {id}");
            }
            store.remove_key(provider, &id);
            format!("Removed key {id}")
        }
        Command::KeyRename { id, name } => {
            if !has_key(session, &id) {
                return format!("No key with id {id}");
            }
            store.rename_key(provider, &id, &name);
            format!("Renamed key {id}")
        }
        Command::Prompt(PromptAction::Show) => {
            let prompt = store.get_system_prompt(provider);
            if prompt.is_empty() {
                "(no system prompt)".to_string()
            } else {
                prompt
            }
        }
        Command::Prompt(PromptAction::Set(text)) => {
            store.set_system_prompt(provider, &text);
            "System prompt set".to_string()
        }
        Command::Prompt(PromptAction::Clear) => {
            store.set_system_prompt(provider, "");
            "System prompt cleared".to_string()
        }
        Command::Model(None) => session
            .model()
            .map(|m| format!("Using {m}"))
            .unwrap_or_else(|| "No model selected".to_string()),
        Command::Model(Some(id)) => {
            let known = models_for(provider).iter().any(|m| m.id == id);
            session.set_model(Some(id.clone()));
            if known {
                format!("Using {id}")
            } else {
                format!("Using {id} (not in the {provider} catalog)")
            }
        }
        Command::Models => models_for(provider)
            .iter()
            .map(|m| {
                let marker = if session.model() == Some(m.id) { '*' } else { ' ' };
                format!("{marker} {:<26}{}", m.id, m.name)
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Command::Usage => {
            let usage = session.usage();
            format!(
                "Input: {}  Output: {}  Total: {}",
                usage.prompt_token_count, usage.candidates_token_count, usage.total_token_count
            )
        }
        Command::Clear => {
            session.clear();
            "Conversation cleared".to_string()
        }
        Command::Help => HELP.to_string(),
        Command::Quit => String::new(),
        Command::Message(text) => match session.send_message(text).await {
            Ok(reply) => reply.content.clone(),
            Err(e) => e.to_string(),
        },
        Command::Invalid(message) => message,
    }
}

fn has_key(session: &ChatSession, id: &str) -> bool {
    session
        .store()
        .list_keys(session.provider())
        .iter()
        .any(|k| k.id == id)
}

/// Read lines until `/quit`, Ctrl-C or Ctrl-D.
///
/// Needs a multi-threaded runtime: line editing blocks the current worker.
pub async fn run(session: &mut ChatSession) -> anyhow::Result<()> {
    let mut editor = Reedline::create();
    let prompt = DefaultPrompt::new(
        DefaultPromptSegment::Basic(session.provider().to_string()),
        DefaultPromptSegment::Empty,
    );

    println!(
        "Chatting with {} using {}. Type /help for commands.",
        session.provider(),
        session.model().unwrap_or("no model")
    );
    if !session.has_api_key() {
        println!("No API key yet. Add one with /key add <secret> [name]");
    }

    loop {
        let signal = tokio::task::block_in_place(|| editor.read_line(&prompt))?;
        let Signal::Success(line) = signal else {
            break;
        };
        let Some(command) = Command::parse(&line) else {
            continue;
        };
        if command == Command::Quit {
            break;
        }
        println!("{}", execute(session, command).await);
    }

    Ok(())
}
