//! dawnr: a wake-light alarm daemon.
//!
//! Binary entry point: parses arguments and dispatches to the daemon or to
//! one of the one-shot commands.

use anyhow::Result;

use dawnr::Dawnr;
use dawnr::args::{self, CliAction, ParsedArgs};
use dawnr::{commands, log_error_exit};

fn main() {
    let result = dispatch(ParsedArgs::from_env().action);
    if let Err(e) = result {
        log_error_exit!("{e:#}");
        std::process::exit(1);
    }
}

fn dispatch(action: CliAction) -> Result<()> {
    match action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelp | CliAction::ShowHelpDueToError => {
            args::display_help();
            Ok(())
        }
        CliAction::Run { debug_enabled } => Dawnr::new(debug_enabled).run(),
        CliAction::ScheduleCommand { params } => {
            commands::schedule::handle_schedule_command(params)
        }
        CliAction::CancelCommand { id } => commands::cancel::handle_cancel_command(&id),
        CliAction::ListCommand => commands::list::handle_list_command(),
        CliAction::RearmCommand => commands::rearm::handle_rearm_command(),
        CliAction::SoundsCommand { category } => {
            commands::sounds::handle_sounds_command(category.as_deref())
        }
    }
}
