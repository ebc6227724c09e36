use assert_cmd::cargo::cargo_bin_cmd;

#[test]
fn missing_credential_exits_before_any_call() -> color_eyre::Result<()> {
    let mut cmd = cargo_bin_cmd!("gemini");
    let output = cmd
        .args(["generate", "Explain recursion"])
        .env_remove("GEMINI_API_KEY")
        .env("GEMINI_API_BASE", "http://127.0.0.1:9")
        .output()?;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("GEMINI_API_KEY environment variable is not set"), "{stderr}");
    Ok(())
}

#[test]
fn invalid_arguments_win_over_missing_credential() -> color_eyre::Result<()> {
    let mut cmd = cargo_bin_cmd!("gemini");
    let output = cmd
        .args(["image", "cube", "--count", "many"])
        .env_remove("GEMINI_API_KEY")
        .output()?;

    assert_eq!(output.status.code(), Some(1));
    assert!(!String::from_utf8_lossy(&output.stderr).contains("GEMINI_API_KEY"));
    Ok(())
}

#[test]
fn help_goes_to_stdout() {
    let mut cmd = cargo_bin_cmd!("gemini");
    let assert = cmd.arg("help").assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert!(stdout.contains("Usage: gemini <command> [options]"));
}

#[test]
fn unknown_or_missing_command_fails() {
    cargo_bin_cmd!("gemini").arg("paint").assert().code(1);
    cargo_bin_cmd!("gemini").assert().code(1);
}

#[test]
fn ask_gemini_rejects_too_many_images() -> color_eyre::Result<()> {
    let images: Vec<String> = (0..11).map(|i| format!("shot{i}.png")).collect();
    let mut cmd = cargo_bin_cmd!("ask-gemini");
    let output = cmd
        .args(&images)
        .arg("compare these")
        .env_remove("GEMINI_API_KEY")
        .output()?;

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("You provided 11 images."));
    Ok(())
}

#[test]
fn ask_gemini_help_goes_to_stdout() {
    for flag in ["--help", "-h"] {
        let mut cmd = cargo_bin_cmd!("ask-gemini");
        let assert = cmd.arg(flag).env_remove("GEMINI_API_KEY").assert().success();
        let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
        assert!(stdout.contains("Usage: ask-gemini"), "{flag}: {stdout}");
    }
}
