//! Terminal prompts used by the interactive commands.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

static WAITING: AtomicBool = AtomicBool::new(false);
static HANDLER: Once = Once::new();

/// Installs the Ctrl-C handler once.
///
/// While [`wait_for_enter`] is blocked, Ctrl-C ends the process with status 0.
/// At any other time it is left to the foreground git child, which receives
/// it too.
fn install_interrupt_handler() {
    HANDLER.call_once(|| {
        let result = ctrlc::set_handler(|| {
            if WAITING.load(Ordering::SeqCst) {
                eprintln!();
                std::process::exit(0);
            }
        });
        if let Err(e) = result {
            tracing::debug!("cannot install interrupt handler: {e}");
        }
    });
}

/// Prints `message` and waits for Enter.
///
/// Returns `false` when the user aborted (end of input). An interrupt while
/// waiting exits the process cleanly.
///
/// # Errors
///
/// Returns an error if the terminal cannot be read or written.
pub fn wait_for_enter(message: &str) -> io::Result<bool> {
    install_interrupt_handler();
    let stdin = io::stdin();
    let mut stderr = io::stderr();
    WAITING.store(true, Ordering::SeqCst);
    let answered = read_confirmation(message, &mut stdin.lock(), &mut stderr);
    WAITING.store(false, Ordering::SeqCst);
    answered
}

fn read_confirmation(
    message: &str,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> io::Result<bool> {
    write!(output, "{message}")?;
    output.flush()?;
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) => Ok(false),
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(false),
        Err(e) => Err(e),
    }
}
