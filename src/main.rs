//! CLI entry point: no arguments launches the interactive debugger, one
//! argument loads and runs a binary to completion.

use std::io::Write as _;
use std::process::ExitCode;

use synacor_vm::io_channel::StdinChannel;
use synacor_vm::{Debugger, VmError};

fn main() -> ExitCode {
    env_logger::init();

    let result = match std::env::args().nth(1) {
        None => {
            Debugger::new().run_shell();
            Ok(())
        }
        Some(path) => run_binary(&path),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("\n --- EXCEPTION ---\n{e}");
            ExitCode::FAILURE
        }
    }
}

fn run_binary(path: &str) -> Result<(), VmError> {
    let mut vm = synacor_vm::Vm::new();

    print!("Loading binary... ");
    let _ = std::io::stdout().flush();
    let words = vm.load_binary(path)?;
    println!("{words} words");

    println!("Executing...\n");
    // Plain stdin: no escape-character interception outside the debugger.
    let mut io = StdinChannel::new();
    vm.run(&mut io)?;

    println!("\n\nExecution completed...");
    Ok(())
}
