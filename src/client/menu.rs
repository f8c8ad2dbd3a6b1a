//! Sequential command loop over a fixed menu of tool invocations.
use std::io;

use console::Term;
use serde_json::{Map, Value};
use tracing::info;

use super::{render, ClientError, ClientSession, ToolClient};

/// Entries of the command menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    ShowLogs,
    SearchEntries,
    ListEntries,
    ServerStatus,
    Exit,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 5] = [
        MenuChoice::ShowLogs,
        MenuChoice::SearchEntries,
        MenuChoice::ListEntries,
        MenuChoice::ServerStatus,
        MenuChoice::Exit,
    ];

    /// Parse a menu number; blank input selects the first entry.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Some(MenuChoice::ShowLogs);
        }
        let number: usize = input.parse().ok()?;
        Self::ALL.get(number.checked_sub(1)?).copied()
    }

    pub const fn number(self) -> usize {
        match self {
            MenuChoice::ShowLogs => 1,
            MenuChoice::SearchEntries => 2,
            MenuChoice::ListEntries => 3,
            MenuChoice::ServerStatus => 4,
            MenuChoice::Exit => 5,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            MenuChoice::ShowLogs => "Show recent logs",
            MenuChoice::SearchEntries => "Search crontab entries",
            MenuChoice::ListEntries => "List crontab entries",
            MenuChoice::ServerStatus => "Check server status",
            MenuChoice::Exit => "Exit",
        }
    }

    /// Tool invoked by this entry; `None` for [`MenuChoice::Exit`].
    pub const fn tool_name(self) -> Option<&'static str> {
        match self {
            MenuChoice::ShowLogs => Some("show_scheduled_task_summary"),
            MenuChoice::SearchEntries => Some("search_crontab_entries"),
            MenuChoice::ListEntries => Some("fetch_crontab_entries"),
            MenuChoice::ServerStatus => Some("check_server_status"),
            MenuChoice::Exit => None,
        }
    }

    const fn result_title(self) -> &'static str {
        match self {
            MenuChoice::ShowLogs => "Recent Logs",
            MenuChoice::SearchEntries => "Search Results",
            MenuChoice::ListEntries => "Crontab Entries",
            MenuChoice::ServerStatus => "Server Status",
            MenuChoice::Exit => "",
        }
    }
}

/// Source of user input for the command loop.
pub trait Prompter {
    /// Show `message` and read one line; `None` at end of input.
    fn prompt(&mut self, message: &str) -> io::Result<Option<String>>;
}

/// Reads from the terminal, or line by line from stdin when it is not a tty.
pub struct ConsolePrompter {
    term: Term,
}

impl ConsolePrompter {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }
}

impl Default for ConsolePrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for ConsolePrompter {
    fn prompt(&mut self, message: &str) -> io::Result<Option<String>> {
        self.term.write_str(&format!("{message}: "))?;
        if self.term.is_term() {
            return self.term.read_line().map(Some);
        }
        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Run the menu until the user exits or input ends. Returns the number of tool calls made.
///
/// Invocation failures are rendered and the loop continues; only input errors end it early.
pub async fn command_loop(
    session: &mut ClientSession,
    api: &ToolClient,
    prompter: &mut dyn Prompter,
) -> Result<u32, ClientError> {
    session.enter_command_loop();
    let mut invocations = 0;

    loop {
        render::menu();
        let Some(input) = prompter.prompt("Enter command number [1/2/3/4/5] (1)")? else {
            break;
        };
        let Some(choice) = MenuChoice::parse(&input) else {
            render::error(&format!("'{}' is not a menu option", input.trim()));
            continue;
        };
        let Some(tool) = choice.tool_name() else {
            break;
        };

        let mut params = Map::new();
        if choice == MenuChoice::SearchEntries {
            let Some(term) = prompter.prompt("Enter search term")? else {
                break;
            };
            let term = term.trim();
            if term.is_empty() {
                render::error("search term must not be empty");
                continue;
            }
            render::progress(&format!(
                "Searching for crontab entries containing '{term}'..."
            ));
            params.insert("search_term".to_string(), Value::String(term.to_string()));
        } else {
            render::progress(&format!("Calling {tool}..."));
        }

        info!(target: "crontab_explorer::client", tool, "Menu invocation");
        invocations += 1;
        match api.invoke(tool, &params).await {
            Ok(output) => render::envelope(choice.result_title(), &output),
            Err(err) => render::client_error(&err),
        }
    }

    render::goodbye();
    session.terminate();
    Ok(invocations)
}
