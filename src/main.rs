use clap::{App, AppSettings};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let matches = App::new("clearcoin")
        .about("Clearcoin transaction clearing CLI tools.")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(clearcoin_lib::commands::simulation_command())
        .get_matches();

    if let Some(ref matches) = matches.subcommand_matches("simulate") {
        clearcoin_lib::commands::run_simulation_command(&matches)
    } else {
        panic!("Should report help.");
    }
}
