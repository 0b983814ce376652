// PTY tests of the dangerwrite binary: a word-goal session that is saved
// on quit, and an idle session with one-second thresholds whose text is
// deleted before the file is written.
//
// They need a terminal, so they only build on Unix and are ignored by
// default: `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

#[test]
#[ignore]
fn word_goal_session_writes_file_and_exits() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("draft.txt");

    let bin = assert_cmd::cargo::cargo_bin("dangerwrite");
    let cmd = format!("{} --words 2 {}", bin.display(), file.display());

    let mut p = spawn(cmd)?;

    // Give the app a moment to initialize the terminal/alternate screen
    std::thread::sleep(Duration::from_millis(200));

    // Two words reaches the goal, which ends the session quietly
    p.send("hi there")?;
    std::thread::sleep(Duration::from_millis(200));

    // Ctrl+Q quits and saves
    p.send("\x11")?;
    p.expect(Eof)?;

    assert_eq!(std::fs::read_to_string(&file)?, "hi there");
    Ok(())
}

#[test]
#[ignore]
fn inactivity_deletes_session_text_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("draft.txt");
    std::fs::write(&file, "keep me\n")?;

    let bin = assert_cmd::cargo::cargo_bin("dangerwrite");
    let cmd = format!(
        "{} --timer 5 --inactivity 1 --countdown 1 {}",
        bin.display(),
        file.display()
    );

    let mut p = spawn(cmd)?;
    std::thread::sleep(Duration::from_millis(200));
    p.send("gone soon")?;

    // 1s threshold + 1s countdown, plus tick alignment slack
    std::thread::sleep(Duration::from_millis(3500));

    p.send("\x11")?;
    p.expect(Eof)?;

    assert_eq!(std::fs::read_to_string(&file)?, "keep me\n");
    Ok(())
}
