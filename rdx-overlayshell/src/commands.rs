//! Parses shell input lines into commands.

use overlayclock::common::Target;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimerAction {
    Start,
    Stop,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CountdownAction {
    Start { minutes: f64 },
    Stop,
    Reset,
}

/// One line of operator input.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Timer(TimerAction),
    Countdown(CountdownAction),
    Toggle(Target),
    Message {
        text: String,
        color: Option<String>,
        duration: Option<f64>,
    },
    Clear,
    Event {
        event_type: String,
        duration: Option<f64>,
    },
    State,
    Watch(bool),
    Help,
    Exit,
    Empty,
}

pub const HELP: &[(&str, &str)] = &[
    ("timer start|stop|reset", "Controls the count-up timer."),
    ("countdown start <MIN>", "Starts a countdown of MIN minutes (fractions allowed)."),
    ("countdown stop|reset", "Stops or zeroes the countdown."),
    ("toggle timer|countdown", "Flips an element's visibility."),
    ("message [--color C] [--duration S] <TEXT>", "Shows (and speaks) a message."),
    ("clear", "Hides the current message."),
    ("event <TYPE> [S]", "Triggers a visual event such as confetti or glitch."),
    ("state", "Prints the current overlay state."),
    ("watch on|off", "Prints control events as they happen."),
    ("exit", "Quits the shell."),
];

fn parse_number(raw: &str, what: &str) -> Result<f64, String> {
    raw.parse::<f64>()
        .map_err(|_| format!("'{}' is not a valid number of {}.", raw, what))
}

/// Parses one input line.
///
/// Errors are user-facing usage messages.
pub fn parse(line: &str) -> Result<ShellCommand, String> {
    let args = line.split_whitespace().collect::<Vec<_>>();
    let Some(command) = args.first() else {
        return Ok(ShellCommand::Empty);
    };

    match *command {
        "timer" => match args.get(1) {
            Some(&"start") => Ok(ShellCommand::Timer(TimerAction::Start)),
            Some(&"stop") => Ok(ShellCommand::Timer(TimerAction::Stop)),
            Some(&"reset") => Ok(ShellCommand::Timer(TimerAction::Reset)),
            _ => Err("Usage: timer start|stop|reset".to_string()),
        },
        "countdown" => match args.get(1) {
            Some(&"start") => {
                let raw = args.get(2).ok_or("Usage: countdown start <MINUTES>")?;
                let minutes = parse_number(raw, "minutes")?;
                Ok(ShellCommand::Countdown(CountdownAction::Start { minutes }))
            }
            Some(&"stop") => Ok(ShellCommand::Countdown(CountdownAction::Stop)),
            Some(&"reset") => Ok(ShellCommand::Countdown(CountdownAction::Reset)),
            _ => Err("Usage: countdown start <MINUTES> | stop | reset".to_string()),
        },
        "toggle" => args
            .get(1)
            .and_then(|name| Target::parse(name))
            .map(ShellCommand::Toggle)
            .ok_or_else(|| "Usage: toggle timer|countdown".to_string()),
        "message" => parse_message(&args[1..]),
        "clear" => Ok(ShellCommand::Clear),
        "event" => {
            let event_type = args.get(1).ok_or("Usage: event <TYPE> [SECONDS]")?;
            let duration = args
                .get(2)
                .map(|raw| parse_number(raw, "seconds"))
                .transpose()?;
            Ok(ShellCommand::Event {
                event_type: event_type.to_string(),
                duration,
            })
        }
        "state" => Ok(ShellCommand::State),
        "watch" => match args.get(1) {
            Some(&"on") => Ok(ShellCommand::Watch(true)),
            Some(&"off") => Ok(ShellCommand::Watch(false)),
            _ => Err("Usage: watch on|off".to_string()),
        },
        "help" => Ok(ShellCommand::Help),
        "exit" | "quit" => Ok(ShellCommand::Exit),
        _ => Err(format!("Unknown command: '{}'. Type 'help'.", line.trim())),
    }
}

fn parse_message(args: &[&str]) -> Result<ShellCommand, String> {
    const USAGE: &str = "Usage: message [--color C] [--duration S] <TEXT>";
    let mut color = None;
    let mut duration = None;
    let mut rest = args;
    loop {
        match rest {
            ["--color", value, tail @ ..] => {
                color = Some(value.to_string());
                rest = tail;
            }
            ["--duration", value, tail @ ..] => {
                duration = Some(parse_number(value, "seconds")?);
                rest = tail;
            }
            ["--color" | "--duration"] => return Err(USAGE.to_string()),
            _ => break,
        }
    }
    if rest.is_empty() {
        return Err(USAGE.to_string());
    }
    Ok(ShellCommand::Message {
        text: rest.join(" "),
        color,
        duration,
    })
}
