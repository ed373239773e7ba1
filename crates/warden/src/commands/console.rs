//! Console command - interactive session registry.
//!
//! Drives an in-memory [`SessionRegistry`] whose users are plain names. The
//! registry reads time from a [`ManualClock`], so expiry can be explored with
//! `advance` instead of waiting.

use anyhow::Result;
use chrono::TimeDelta;
use clap::Args;
use console::{Style, Term, style};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use warden_session::{Clock, Expiry, Lifetime, ManualClock, RegistryConfig, SessionRegistry};

use super::Context;

/// Arguments for the console command.
#[derive(Args, Debug)]
pub struct ConsoleArgs {
    /// Session lifetime in minutes, or "never" (overrides config)
    #[arg(long)]
    pub lifetime: Option<Lifetime>,

    /// Generated id length (overrides config)
    #[arg(long)]
    pub id_length: Option<usize>,
}

/// Run the console command.
pub fn run(args: ConsoleArgs, ctx: &Context) -> Result<()> {
    let mut config = ctx.loaded.config.registry_config()?;
    if let Some(lifetime) = args.lifetime {
        config.lifetime = lifetime;
    }
    if let Some(id_length) = args.id_length {
        config.id_length = id_length;
    }

    let state = ConsoleState::new(config)?;
    Repl::new(state, ctx.verbose)?.run()
}

/// What the loop should do after a command.
#[derive(Debug, PartialEq)]
pub enum Reply {
    /// Print a result.
    Text(String),
    /// Print a de-emphasized note.
    Note(String),
    /// Print an error.
    Error(String),
    /// Clear the screen.
    Clear,
    /// Print help.
    Help,
    /// Leave the console.
    Exit,
}

/// Registry plus the clock that drives it.
pub struct ConsoleState {
    registry: SessionRegistry<String, ManualClock>,
    clock: ManualClock,
}

impl ConsoleState {
    /// Create console state with a clock frozen at the current time.
    pub fn new(config: RegistryConfig) -> Result<Self> {
        let clock = ManualClock::starting_now();
        let registry = SessionRegistry::with_clock(config, clock.clone())?;
        Ok(Self { registry, clock })
    }

    /// Execute one console line.
    pub fn execute(&mut self, line: &str) -> Reply {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts.first().copied().unwrap_or("");
        let args = &parts[1.min(parts.len())..];

        match (cmd, args) {
            ("", _) => Reply::Note("Type help for available commands".to_string()),
            ("quit" | "q" | "exit", _) => Reply::Exit,
            ("help" | "h" | "?", _) => Reply::Help,
            ("cls", _) => Reply::Clear,
            ("start", [_, ..]) => {
                let name = args.join(" ");
                match self.registry.start(name) {
                    Ok(id) => Reply::Text(id),
                    Err(e) => Reply::Error(e.to_string()),
                }
            }
            ("validate", [id]) => match self.registry.validate(id) {
                Some(user) => Reply::Text(format!("valid: {}", user)),
                None => Reply::Text("invalid".to_string()),
            },
            ("renew", [id]) => found(self.registry.renew(id), "renewed"),
            ("end", [id]) => found(self.registry.end(id), "ended"),
            ("user", [id]) => match self.registry.get_user(id) {
                Some(user) => Reply::Text(user.clone()),
                None => not_found(),
            },
            ("update", [id, _, ..]) => {
                let name = args[1..].join(" ");
                found(self.registry.update_user(id, name), "updated")
            }
            ("lookup", [_, ..]) => {
                let name = args.join(" ");
                match self.registry.get_session_id(&name) {
                    Some(id) => Reply::Text(id.to_string()),
                    None => not_found(),
                }
            }
            ("list", []) => self.list(),
            ("purge", []) => {
                Reply::Text(format!("purged {}", self.registry.purge_expired()))
            }
            ("destroy", []) => {
                let count = self.registry.len();
                self.registry.destroy_all();
                Reply::Text(format!("destroyed {}", count))
            }
            ("stats", []) => {
                let stats = self.registry.stats();
                Reply::Text(format!(
                    "sessions: {}  expired: {}  lifetime: {}  id_length: {}",
                    stats.sessions, stats.expired, stats.lifetime, stats.id_length
                ))
            }
            ("advance", [minutes]) => match minutes.parse::<f64>().ok().and_then(minutes_delta) {
                Some(delta) => {
                    self.clock.advance(delta);
                    Reply::Text(format!("now {}", self.clock_now()))
                }
                None => Reply::Error(format!("not a number of minutes: {}", minutes)),
            },
            ("now", []) => Reply::Text(self.clock_now()),
            ("lifetime", []) => Reply::Text(self.registry.lifetime().to_string()),
            ("lifetime", [value]) => match value
                .parse::<Lifetime>()
                .and_then(|lifetime| self.registry.set_lifetime(lifetime))
            {
                Ok(()) => Reply::Text(format!("lifetime {}", self.registry.lifetime())),
                Err(e) => Reply::Error(e.to_string()),
            },
            ("idlen", []) => Reply::Text(self.registry.id_length().to_string()),
            ("idlen", [value]) => match value.parse::<usize>() {
                Ok(n) => match self.registry.set_id_length(n) {
                    Ok(()) => Reply::Text(format!("id length {}", n)),
                    Err(e) => Reply::Error(e.to_string()),
                },
                Err(_) => Reply::Error(format!("not a length: {}", value)),
            },
            (
                "start" | "validate" | "renew" | "end" | "user" | "update" | "lookup" | "list"
                | "purge" | "destroy" | "stats" | "advance" | "now" | "lifetime" | "idlen",
                _,
            ) => Reply::Error(format!("Wrong arguments for {}; type help for usage", cmd)),
            _ => Reply::Error(format!("Unknown command: {}", cmd)),
        }
    }

    fn list(&self) -> Reply {
        if self.registry.is_empty() {
            return Reply::Note("No sessions".to_string());
        }

        let now = self.clock.now();
        let lines: Vec<String> = self
            .registry
            .get_all()
            .map(|session| {
                let expiry = match session.expires_at() {
                    Expiry::Never => "never".to_string(),
                    Expiry::At(at) if session.is_expired_at(now) => {
                        format!("expired {}", at.format("%Y-%m-%d %H:%M:%S"))
                    }
                    Expiry::At(at) => format!("expires {}", at.format("%Y-%m-%d %H:%M:%S")),
                };
                format!("{}  {}  ({})", session.id(), session.user(), expiry)
            })
            .collect();
        Reply::Text(lines.join("\n"))
    }

    fn clock_now(&self) -> String {
        self.clock.now().format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Convert fractional minutes to a delta, or `None` if out of range.
fn minutes_delta(minutes: f64) -> Option<TimeDelta> {
    let millis = (minutes * 60_000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    TimeDelta::try_milliseconds(millis as i64)
}

fn found(hit: bool, message: &str) -> Reply {
    if hit {
        Reply::Text(message.to_string())
    } else {
        not_found()
    }
}

fn not_found() -> Reply {
    Reply::Text("not found".to_string())
}

/// Line editor loop around a [`ConsoleState`].
struct Repl {
    state: ConsoleState,
    editor: Editor<(), DefaultHistory>,
    term: Term,
    verbose: bool,
}

impl Repl {
    fn new(state: ConsoleState, verbose: bool) -> Result<Self> {
        let config = Config::builder()
            .history_ignore_space(true)
            .auto_add_history(true)
            .build();

        let editor = Editor::with_config(config)?;

        Ok(Self {
            state,
            editor,
            term: Term::stdout(),
            verbose,
        })
    }

    fn run(&mut self) -> Result<()> {
        self.print_welcome();

        loop {
            match self.editor.readline("warden> ") {
                Ok(line) => match self.state.execute(line.trim()) {
                    Reply::Text(text) => println!("{}", text),
                    Reply::Note(text) => self.print_dim(&text),
                    Reply::Error(text) => self.print_error(&text),
                    Reply::Clear => self.term.clear_screen()?,
                    Reply::Help => self.print_help(),
                    Reply::Exit => break,
                },
                Err(ReadlineError::Interrupted) => {
                    println!();
                    self.print_dim("(Interrupted - type quit to exit)");
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(e) => {
                    self.print_error(&format!("Input error: {}", e));
                    break;
                }
            }
        }

        if self.verbose {
            let stats = self.state.registry.stats();
            self.print_dim(&format!("{} sessions discarded", stats.sessions));
        }
        self.print_dim("Goodbye!");
        Ok(())
    }

    fn print_welcome(&self) {
        let dim = Style::new().dim();
        let config = self.state.registry.config();
        println!();
        println!("{}", style("Warden Console").bold().cyan());
        println!("{}", dim.apply_to("─".repeat(40)));
        println!(
            "{}",
            dim.apply_to(format!(
                "lifetime {}, id length {}",
                config.lifetime, config.id_length
            ))
        );
        println!(
            "{}",
            dim.apply_to("Type help for commands, Ctrl+D to exit.")
        );
        println!();
    }

    fn print_help(&self) {
        let dim = Style::new().dim();
        let cmd = |c: &str| style(c.to_string()).cyan();
        println!();
        println!("{}", style("Available Commands").bold());
        println!("{}", dim.apply_to("─".repeat(40)));
        println!("  {}  - Start a session for a user", cmd("start <name>"));
        println!("  {}  - Validate (and renew) a session", cmd("validate <id>"));
        println!("  {}  - Renew a session", cmd("renew <id>"));
        println!("  {}  - End a session", cmd("end <id>"));
        println!("  {}  - Show a session's user", cmd("user <id>"));
        println!("  {}  - Replace a session's user", cmd("update <id> <name>"));
        println!("  {}  - Find the session for a user", cmd("lookup <name>"));
        println!("  {}  - List all sessions", cmd("list"));
        println!("  {}  - Remove expired sessions", cmd("purge"));
        println!("  {}  - Remove all sessions", cmd("destroy"));
        println!("  {}  - Show registry statistics", cmd("stats"));
        println!("  {}  - Move the clock forward", cmd("advance <minutes>"));
        println!("  {}  - Show the clock", cmd("now"));
        println!("  {}  - Show or set the lifetime", cmd("lifetime [minutes|never]"));
        println!("  {}  - Show or set the id length", cmd("idlen [n]"));
        println!("  {}  - Clear the screen", cmd("cls"));
        println!("  {}  - Exit the console", cmd("quit, q"));
        println!();
    }

    fn print_dim(&self, text: &str) {
        println!("{}", Style::new().dim().apply_to(text));
    }

    fn print_error(&self, text: &str) {
        eprintln!("{}", Style::new().red().apply_to(text));
    }
}
