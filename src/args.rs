//! Command-line argument parsing and processing.
//!
//! Hand-parsed rather than generated: the surface is small and the help and
//! version output go through the same box-drawing logger as everything else.

use crate::commands::schedule::ScheduleParams;
use crate::trigger::Meridiem;

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the daemon.
    Run { debug_enabled: bool },
    /// Store (or replace) an alarm and arm it.
    ScheduleCommand { params: ScheduleParams },
    /// Disable an alarm and disarm its trigger pair.
    CancelCommand { id: String },
    /// Print the stored alarms.
    ListCommand,
    /// Ask a running daemon to re-arm everything from the store.
    RearmCommand,
    /// Print the sound manifest, optionally one category.
    SoundsCommand { category: Option<String> },
    /// Display help information and exit.
    ShowHelp,
    /// Display version information and exit.
    ShowVersion,
    /// Show help due to unknown or malformed arguments and exit.
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parses command-line arguments into a `CliAction`.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut debug_enabled = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut unknown_arg_found = false;
        let mut command: Option<&str> = None;
        let mut command_idx = 0;

        for (idx, arg) in args_vec.iter().enumerate() {
            match arg.as_str() {
                "--debug" | "-d" => debug_enabled = true,
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                other if !other.starts_with('-') => {
                    command = Some(other);
                    command_idx = idx;
                    break;
                }
                _ => {
                    unknown_arg_found = true;
                    break;
                }
            }
        }

        let action = if display_version {
            CliAction::ShowVersion
        } else if display_help {
            CliAction::ShowHelp
        } else if unknown_arg_found {
            error_action()
        } else {
            match command {
                None | Some("run") => CliAction::Run { debug_enabled },
                Some("schedule") => match parse_schedule(&args_vec[command_idx + 1..]) {
                    Some(params) => CliAction::ScheduleCommand { params },
                    None => error_action(),
                },
                Some("cancel") => match args_vec.get(command_idx + 1) {
                    Some(id) if !id.starts_with('-') => CliAction::CancelCommand {
                        id: id.to_string(),
                    },
                    _ => error_action(),
                },
                Some("list") => CliAction::ListCommand,
                Some("rearm") => CliAction::RearmCommand,
                Some("sounds") => CliAction::SoundsCommand {
                    category: args_vec
                        .get(command_idx + 1)
                        .filter(|a| !a.starts_with('-'))
                        .cloned(),
                },
                Some(_) => error_action(),
            }
        };

        ParsedArgs { action }
    }

    /// Convenience method to parse from std::env::args()
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

fn error_action() -> CliAction {
    CliAction::ShowHelpDueToError
}

/// Parse `schedule --id N --time H:MM --period AM|PM [--sound KEY]
/// [--theme NAME] [--repeat d1,d2,...]`.
fn parse_schedule(args: &[String]) -> Option<ScheduleParams> {
    let mut id: Option<String> = None;
    let mut time: Option<(u32, u32)> = None;
    let mut meridiem: Option<Meridiem> = None;
    let mut sound: Option<String> = None;
    let mut theme: Option<String> = None;
    let mut repeat_days: Vec<String> = Vec::new();

    let mut idx = 0;
    while idx < args.len() {
        let value = args.get(idx + 1);
        match args[idx].as_str() {
            "--id" => id = Some(value?.to_string()),
            "--time" => time = parse_clock_time(value?),
            "--period" => meridiem = value?.parse().ok(),
            "--sound" => sound = Some(value?.to_string()),
            "--theme" => theme = Some(value?.to_string()),
            "--repeat" => {
                repeat_days = value?
                    .split(',')
                    .filter(|d| !d.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            _ => return None,
        }
        idx += 2;
    }

    let (hour, minute) = time?;
    Some(ScheduleParams {
        id: id?,
        hour,
        minute,
        meridiem: meridiem?,
        sound,
        theme,
        repeat_days,
    })
}

/// `H:MM` on the 12-hour clock. Range checking happens at resolution time.
fn parse_clock_time(raw: &str) -> Option<(u32, u32)> {
    let (hour, minute) = raw.split_once(':')?;
    Some((hour.parse().ok()?, minute.parse().ok()?))
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("dawnr [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("run                    Run the alarm daemon (default)");
    log_indented!("schedule --id <n> --time <H:MM> --period <AM|PM>");
    log_indented!("         [--sound <key>] [--theme <name>] [--repeat <d1,d2>]");
    log_indented!("                       Store an alarm and arm its triggers");
    log_indented!("cancel <id>            Disable an alarm and disarm it");
    log_indented!("list                   Print the stored alarms");
    log_indented!("rearm                  Re-arm every enabled alarm");
    log_indented!("sounds [category]      List the available alarm sounds");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_no_args() {
        let parsed = ParsedArgs::parse(vec!["dawnr"]);
        assert_eq!(
            parsed.action,
            CliAction::Run {
                debug_enabled: false
            }
        );
    }

    #[test]
    fn test_parse_debug_flag() {
        let parsed = ParsedArgs::parse(vec!["dawnr", "--debug"]);
        assert_eq!(
            parsed.action,
            CliAction::Run {
                debug_enabled: true
            }
        );
    }

    #[test]
    fn test_parse_run_subcommand_with_debug() {
        let parsed = ParsedArgs::parse(vec!["dawnr", "-d", "run"]);
        assert_eq!(
            parsed.action,
            CliAction::Run {
                debug_enabled: true
            }
        );
    }

    #[test]
    fn test_parse_help_and_version() {
        assert_eq!(
            ParsedArgs::parse(vec!["dawnr", "--help"]).action,
            CliAction::ShowHelp
        );
        assert_eq!(
            ParsedArgs::parse(vec!["dawnr", "-V"]).action,
            CliAction::ShowVersion
        );
    }

    #[test]
    fn test_parse_unknown_flag_shows_help() {
        assert_eq!(
            ParsedArgs::parse(vec!["dawnr", "--frobnicate"]).action,
            CliAction::ShowHelpDueToError
        );
        assert_eq!(
            ParsedArgs::parse(vec!["dawnr", "explode"]).action,
            CliAction::ShowHelpDueToError
        );
    }

    #[test]
    fn test_parse_full_schedule_command() {
        let parsed = ParsedArgs::parse(vec![
            "dawnr", "schedule", "--id", "41", "--time", "7:00", "--period", "am", "--sound",
            "naturalsound_birds", "--theme", "dawn", "--repeat", "mon,tue",
        ]);
        assert_eq!(
            parsed.action,
            CliAction::ScheduleCommand {
                params: ScheduleParams {
                    id: "41".to_string(),
                    hour: 7,
                    minute: 0,
                    meridiem: Meridiem::Am,
                    sound: Some("naturalsound_birds".to_string()),
                    theme: Some("dawn".to_string()),
                    repeat_days: vec!["mon".to_string(), "tue".to_string()],
                }
            }
        );
    }

    #[test]
    fn test_parse_schedule_missing_period_is_an_error() {
        let parsed = ParsedArgs::parse(vec!["dawnr", "schedule", "--id", "1", "--time", "7:00"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_schedule_malformed_time_is_an_error() {
        let parsed = ParsedArgs::parse(vec![
            "dawnr", "schedule", "--id", "1", "--time", "seven", "--period", "AM",
        ]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_cancel_requires_id() {
        assert_eq!(
            ParsedArgs::parse(vec!["dawnr", "cancel", "3"]).action,
            CliAction::CancelCommand {
                id: "3".to_string()
            }
        );
        assert_eq!(
            ParsedArgs::parse(vec!["dawnr", "cancel"]).action,
            CliAction::ShowHelpDueToError
        );
    }

    #[test]
    fn test_parse_sounds_with_and_without_category() {
        assert_eq!(
            ParsedArgs::parse(vec!["dawnr", "sounds"]).action,
            CliAction::SoundsCommand { category: None }
        );
        assert_eq!(
            ParsedArgs::parse(vec!["dawnr", "sounds", "Ambience"]).action,
            CliAction::SoundsCommand {
                category: Some("Ambience".to_string())
            }
        );
    }
}
