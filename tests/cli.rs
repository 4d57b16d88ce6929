use std::io;
use std::process::{Command, Output};

fn myshell(args: &[&str]) -> io::Result<Output> {
    let home = tempfile::tempdir()?;
    Command::new(env!("CARGO_BIN_EXE_myshell"))
        .args(["-q", "-n", "--no-rc"])
        .args(args)
        .env("HOME", home.path())
        .env("PATH", "/bin:/usr/bin")
        .output()
}

#[test]
fn test_exit_code_is_propagated() -> io::Result<()> {
    let output = myshell(&["-c", "exit 3"])?;
    assert_eq!(output.status.code(), Some(3));
    Ok(())
}

#[test]
fn test_unknown_command_is_127() -> io::Result<()> {
    let output = myshell(&["-c", "zz_not_a_cmd"])?;
    assert_eq!(output.status.code(), Some(127));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Command not found"));
    Ok(())
}

#[test]
fn test_echo_expands_variables() -> io::Result<()> {
    let output = myshell(&["-c", "echo home=$HOME"])?;
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("home=/"));
    Ok(())
}

#[test]
fn test_external_command_output() -> io::Result<()> {
    let output = myshell(&["-c", "sh -c 'exit'"])?;
    assert_eq!(output.status.code(), Some(0));
    Ok(())
}

#[test]
fn test_bad_flag_exits_2() -> io::Result<()> {
    let output = myshell(&["--bogus"])?;
    assert_eq!(output.status.code(), Some(2));
    Ok(())
}

#[test]
fn test_rc_file_runs_first() -> io::Result<()> {
    let home = tempfile::tempdir()?;
    std::fs::write(home.path().join(".myshellrc"), "# rc\nexport GREETING=hi\n")?;
    let output = Command::new(env!("CARGO_BIN_EXE_myshell"))
        .args(["-q", "-n", "-c", "echo $GREETING"])
        .env("HOME", home.path())
        .output()?;
    assert_eq!(String::from_utf8_lossy(&output.stdout), "hi\n");
    Ok(())
}

#[test]
fn test_log_file_is_written() -> io::Result<()> {
    let home = tempfile::tempdir()?;
    let output = Command::new(env!("CARGO_BIN_EXE_myshell"))
        .args(["-q", "--no-rc", "-c", "zz_not_a_cmd"])
        .env("HOME", home.path())
        .output()?;
    assert_eq!(output.status.code(), Some(127));
    let log = std::fs::read_to_string(home.path().join(".myshell.log"))?;
    assert!(log.contains("ERROR: Error in"));
    Ok(())
}
