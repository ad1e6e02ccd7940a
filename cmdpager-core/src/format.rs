use cmdpager_bash_runner::CommandOutput;

/// Render captured output as the combined block that is measured and
/// paginated.
pub fn format_command_output(output: &CommandOutput) -> String {
    format!(
        "STDOUT:\n{}\n\nSTDERR:\n{}\n\nReturn code: {}",
        output.stdout,
        output.stderr,
        output.exit_code()
    )
}
