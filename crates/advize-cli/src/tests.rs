use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["advize-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_profile_command() {
    let cli = Cli::try_parse_from(["advize-cli", "profile", "@natgeo"])
        .expect("expected valid cli args");

    match cli.command {
        Some(Commands::Profile { input }) => assert_eq!(input, "@natgeo"),
        other => panic!("expected profile command, got {other:?}"),
    }
}

#[test]
fn parses_post_command() {
    let cli = Cli::try_parse_from([
        "advize-cli",
        "post",
        "https://www.instagram.com/p/C1a2B3c4D5e/",
    ])
    .expect("expected valid cli args");

    assert!(matches!(cli.command, Some(Commands::Post { .. })));
}

#[test]
fn raw_results_type_defaults_to_details() {
    let cli = Cli::try_parse_from(["advize-cli", "raw", "https://www.instagram.com/natgeo/"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Raw {
            results_type: ResultsType::Details,
            ..
        })
    ));
}

#[test]
fn raw_accepts_posts_results_type() {
    let cli = Cli::try_parse_from([
        "advize-cli",
        "raw",
        "https://www.instagram.com/p/C1a2B3c4D5e/",
        "--results-type",
        "posts",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Raw {
            results_type: ResultsType::Posts,
            ..
        })
    ));
}

#[test]
fn raw_rejects_unknown_results_type() {
    let result = Cli::try_parse_from([
        "advize-cli",
        "raw",
        "https://www.instagram.com/natgeo/",
        "--results-type",
        "stories",
    ]);
    assert!(result.is_err());
}

#[test]
fn handle_command_succeeds_for_profile_url() {
    assert!(scrape::run_handle("https://www.instagram.com/natgeo/?hl=en").is_ok());
}

#[test]
fn handle_command_fails_for_foreign_url() {
    assert!(scrape::run_handle("https://example.com/natgeo").is_err());
}
