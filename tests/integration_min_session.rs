// Drives the compiled binary through a PTY so the real event loop and
// crossterm input handling are exercised end to end.
//
// Needs a pseudo terminal, so it is Unix-only and ignored by default.
// Run manually via: `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

#[test]
#[ignore]
fn minimal_session_completes_and_exits() -> Result<(), Box<dyn std::error::Error>> {
    let bin = assert_cmd::cargo::cargo_bin("typewise");
    let cmd = format!("{} -p hi -s 0", bin.display());

    let mut p = spawn(cmd)?;

    // let the app enter the alternate screen
    std::thread::sleep(Duration::from_millis(200));

    p.send("hi")?;
    std::thread::sleep(Duration::from_millis(100));

    // Ctrl+F finishes, Ctrl+C quits from the results screen
    p.send("\x06")?;
    std::thread::sleep(Duration::from_millis(200));
    p.send("\x03")?;

    p.expect(Eof)?;
    Ok(())
}
